//! 项目仓储
//!
//! 项目、日程、学习资料、报名与用户行为记录

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::traits::ProgramRepositoryTrait;
use crate::error::{ApiError, Result};
use crate::models::{Material, Program, Registration, Schedule};

/// 项目仓储
pub struct ProgramRepository {
    pool: PgPool,
}

impl ProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count_programs(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM programs")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn list_programs(&self, offset: i64, limit: i64) -> Result<Vec<Program>> {
        let programs = sqlx::query_as::<_, Program>(
            r#"
            SELECT id, name, description, duration, price, image_url, created_at
            FROM programs
            ORDER BY created_at DESC, id DESC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(programs)
    }

    pub async fn get_program(&self, id: i64) -> Result<Option<Program>> {
        let program = sqlx::query_as::<_, Program>(
            r#"
            SELECT id, name, description, duration, price, image_url, created_at
            FROM programs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(program)
    }

    pub async fn list_schedules(&self, program_id: i64) -> Result<Vec<Schedule>> {
        let schedules = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT id, program_id, title, description, schedule_date, created_at
            FROM schedules
            WHERE program_id = $1
            ORDER BY schedule_date ASC, id ASC
            "#,
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(schedules)
    }

    pub async fn list_materials(&self, program_id: i64) -> Result<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>(
            r#"
            SELECT id, program_id, section_id, title, content, file_url, created_at
            FROM materials
            WHERE program_id = $1
            ORDER BY section_id ASC, id ASC
            "#,
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(materials)
    }

    pub async fn record_activity(
        &self,
        user_id: i64,
        program_id: i64,
        activity_type: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_activities (user_id, program_id, activity_type) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(program_id)
        .bind(activity_type)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn is_registered(&self, user_id: i64, program_id: i64) -> Result<bool> {
        let registered: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_registrations WHERE user_id = $1 AND program_id = $2)",
        )
        .bind(user_id)
        .bind(program_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(registered)
    }

    /// 报名：校验未报名、核销报名码、写入报名记录，全部在一个事务内
    pub async fn register_with_ticket(
        &self,
        user_id: i64,
        program_id: i64,
        ticket_code: &str,
    ) -> Result<Registration> {
        let mut tx = self.pool.begin().await?;

        let program_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM programs WHERE id = $1)")
                .bind(program_id)
                .fetch_one(&mut *tx)
                .await?;
        if !program_exists {
            return Err(ApiError::ProgramNotFound(program_id));
        }

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_registrations WHERE user_id = $1 AND program_id = $2)",
        )
        .bind(user_id)
        .bind(program_id)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Err(ApiError::AlreadyRegistered);
        }

        let consumed: Option<i64> = sqlx::query_scalar(
            "DELETE FROM tickets_available WHERE program_id = $1 AND ticket_code = $2 RETURNING id",
        )
        .bind(program_id)
        .bind(ticket_code)
        .fetch_optional(&mut *tx)
        .await?;
        if consumed.is_none() {
            return Err(ApiError::TicketNotFound);
        }

        let registration = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO user_registrations (user_id, program_id, ticket_code)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, program_id, ticket_code, created_at
            "#,
        )
        .bind(user_id)
        .bind(program_id)
        .bind(ticket_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e.as_database_error() {
            // 并发报名时由唯一约束兜底
            Some(db) if db.is_unique_violation() => ApiError::AlreadyRegistered,
            _ => ApiError::Database(e),
        })?;

        tx.commit().await?;

        info!(user_id, program_id, "用户报名成功");
        Ok(registration)
    }
}

#[async_trait]
impl ProgramRepositoryTrait for ProgramRepository {
    async fn count_programs(&self) -> Result<i64> {
        self.count_programs().await
    }

    async fn list_programs(&self, offset: i64, limit: i64) -> Result<Vec<Program>> {
        self.list_programs(offset, limit).await
    }

    async fn get_program(&self, id: i64) -> Result<Option<Program>> {
        self.get_program(id).await
    }

    async fn list_schedules(&self, program_id: i64) -> Result<Vec<Schedule>> {
        self.list_schedules(program_id).await
    }

    async fn list_materials(&self, program_id: i64) -> Result<Vec<Material>> {
        self.list_materials(program_id).await
    }

    async fn record_activity(
        &self,
        user_id: i64,
        program_id: i64,
        activity_type: &str,
    ) -> Result<()> {
        self.record_activity(user_id, program_id, activity_type)
            .await
    }

    async fn is_registered(&self, user_id: i64, program_id: i64) -> Result<bool> {
        self.is_registered(user_id, program_id).await
    }

    async fn register_with_ticket(
        &self,
        user_id: i64,
        program_id: i64,
        ticket_code: &str,
    ) -> Result<Registration> {
        self.register_with_ticket(user_id, program_id, ticket_code)
            .await
    }
}
