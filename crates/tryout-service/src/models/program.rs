//! 项目（Program）相关实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 学习项目
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Program {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub description: Option<String>,
    /// 展示用时长文案，例如 "3 bulan"
    #[sqlx(default)]
    pub duration: Option<String>,
    /// 价格（整数卢比）
    pub price: i64,
    #[sqlx(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 项目日程（Agenda）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Schedule {
    pub id: i64,
    pub program_id: i64,
    pub title: String,
    #[sqlx(default)]
    pub description: Option<String>,
    pub schedule_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// 学习资料（Materi）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Material {
    pub id: i64,
    pub program_id: i64,
    pub section_id: i32,
    pub title: String,
    #[sqlx(default)]
    pub content: Option<String>,
    #[sqlx(default)]
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 项目报名记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
    pub id: i64,
    pub user_id: i64,
    pub program_id: i64,
    pub ticket_code: String,
    pub created_at: DateTime<Utc>,
}
