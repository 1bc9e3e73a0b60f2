//! 题库相关实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 考试类别
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExamCategory {
    pub id: i64,
    pub name: String,
}

/// 题目分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// 题组（Soal）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Soal {
    pub id: i64,
    pub title: String,
    #[sqlx(default)]
    pub description: Option<String>,
    /// 作答时长（分钟），0 表示不限时
    pub duration_minutes: i32,
    #[sqlx(default)]
    pub exam_category_id: Option<i64>,
    #[sqlx(default)]
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 附带类别信息的题组
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoalDetail {
    #[serde(flatten)]
    pub soal: Soal,
    pub exam_category: Option<ExamCategory>,
    pub category: Option<Category>,
}

/// 题目（含正确答案，仅服务端评分和答案解析使用）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub soal_id: i64,
    pub question: String,
    #[sqlx(default)]
    pub image: Option<String>,
    /// 正确选项标签，小写
    pub correct: String,
}

/// 题目选项
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub label: String,
    pub content: String,
}

/// 对外展示的选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionView {
    pub label: String,
    pub content: String,
}

impl From<&QuestionOption> for OptionView {
    fn from(option: &QuestionOption) -> Self {
        Self {
            label: option.label.clone(),
            content: option.content.clone(),
        }
    }
}

/// 作答历史（Riwayat）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct History {
    pub id: i64,
    pub user_id: i64,
    pub soal_id: i64,
    pub score: i32,
    /// 原样保存的作答数组
    pub answers: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryWithSoal {
    #[serde(flatten)]
    pub history: History,
    pub soal: Soal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHistory {
    pub user_id: i64,
    pub soal_id: i64,
    pub score: i32,
    pub answers: serde_json::Value,
}

/// 评分与反馈
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feedback {
    pub id: i64,
    pub soal_id: i64,
    #[sqlx(default)]
    pub user_id: Option<i64>,
    pub rating: i32,
    #[sqlx(default)]
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub soal_id: i64,
    pub user_id: Option<i64>,
    pub rating: i32,
    pub feedback: Option<String>,
}
