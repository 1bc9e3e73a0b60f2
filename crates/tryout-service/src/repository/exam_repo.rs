//! 限时作答仓储
//!
//! 作答会话与逐题答案的数据访问，交卷在单个事务内完成

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::info;

use super::traits::ExamRepositoryTrait;
use crate::error::{ApiError, Result};
use crate::models::{ExamAttempt, FinishOutcome, UserAnswer};
use crate::scoring::{ChosenAnswer, percentage_score};

const ATTEMPT_COLUMNS: &str = "id, user_id, soal_id, started_at, expires_at, finished_at, score";
const ANSWER_COLUMNS: &str = "id, attempt_id, user_id, question_id, answer, submitted_at";

/// 限时作答仓储
pub struct ExamRepository {
    pool: PgPool,
}

impl ExamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 同一用户同一题组最多一个未交卷会话，由部分唯一索引保证
    pub async fn start_or_resume(
        &self,
        user_id: i64,
        soal_id: i64,
        duration_minutes: i32,
    ) -> Result<ExamAttempt> {
        let expires_at =
            (duration_minutes > 0).then(|| Utc::now() + Duration::minutes(duration_minutes as i64));

        let created = sqlx::query_as::<_, ExamAttempt>(&format!(
            r#"
            INSERT INTO exam_attempts (user_id, soal_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, soal_id) WHERE finished_at IS NULL DO NOTHING
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(soal_id)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(attempt) = created {
            info!(attempt_id = attempt.id, user_id, soal_id, "作答会话已创建");
            return Ok(attempt);
        }

        let open = sqlx::query_as::<_, ExamAttempt>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM exam_attempts
            WHERE user_id = $1 AND soal_id = $2 AND finished_at IS NULL
            "#
        ))
        .bind(user_id)
        .bind(soal_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(open)
    }

    pub async fn get_attempt(&self, id: i64) -> Result<Option<ExamAttempt>> {
        let attempt = sqlx::query_as::<_, ExamAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM exam_attempts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    pub async fn question_in_soal(&self, question_id: i64, soal_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM questions WHERE id = $1 AND soal_id = $2)",
        )
        .bind(question_id)
        .bind(soal_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn list_answers(&self, attempt_id: i64) -> Result<Vec<UserAnswer>> {
        let answers = sqlx::query_as::<_, UserAnswer>(&format!(
            "SELECT {ANSWER_COLUMNS} FROM user_answers WHERE attempt_id = $1 ORDER BY question_id ASC"
        ))
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    /// 用户在该题组最近一次会话中对某题的答案
    pub async fn find_latest_answer(
        &self,
        user_id: i64,
        soal_id: i64,
        question_id: i64,
    ) -> Result<Option<UserAnswer>> {
        let answer = sqlx::query_as::<_, UserAnswer>(
            r#"
            SELECT ua.id, ua.attempt_id, ua.user_id, ua.question_id, ua.answer, ua.submitted_at
            FROM user_answers ua
            JOIN exam_attempts ea ON ea.id = ua.attempt_id
            WHERE ua.user_id = $1 AND ea.soal_id = $2 AND ua.question_id = $3
            ORDER BY ea.started_at DESC, ua.submitted_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(soal_id)
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(answer)
    }

    pub async fn upsert_answer(
        &self,
        attempt_id: i64,
        user_id: i64,
        question_id: i64,
        answer: &str,
    ) -> Result<UserAnswer> {
        let saved = sqlx::query_as::<_, UserAnswer>(&format!(
            r#"
            INSERT INTO user_answers (attempt_id, user_id, question_id, answer)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (attempt_id, question_id)
            DO UPDATE SET answer = EXCLUDED.answer, submitted_at = NOW()
            RETURNING {ANSWER_COLUMNS}
            "#
        ))
        .bind(attempt_id)
        .bind(user_id)
        .bind(question_id)
        .bind(answer)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    pub async fn delete_answer(&self, attempt_id: i64, question_id: i64) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM user_answers WHERE attempt_id = $1 AND question_id = $2")
                .bind(attempt_id)
                .bind(question_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 交卷：锁定会话、评分、标记完成并写入历史
    ///
    /// 已交卷的会话直接返回首次结果，不重复写历史。
    pub async fn finish_attempt(&self, attempt_id: i64) -> Result<FinishOutcome> {
        let mut tx = self.pool.begin().await?;

        let attempt = sqlx::query_as::<_, ExamAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM exam_attempts WHERE id = $1 FOR UPDATE"
        ))
        .bind(attempt_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::AttemptNotFound(attempt_id))?;

        let key: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, correct FROM questions WHERE soal_id = $1 ORDER BY id ASC")
                .bind(attempt.soal_id)
                .fetch_all(&mut *tx)
                .await?;

        let answers: Vec<ChosenAnswer> = sqlx::query_as::<_, (i64, String)>(
            "SELECT question_id, answer FROM user_answers WHERE attempt_id = $1 ORDER BY question_id ASC",
        )
        .bind(attempt_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(question_id, answer)| ChosenAnswer {
            question_id,
            chosen: Some(answer),
        })
        .collect();

        let key_refs: Vec<(i64, &str)> = key.iter().map(|(id, c)| (*id, c.as_str())).collect();
        let result = percentage_score(&key_refs, &answers)
            .ok_or(ApiError::QuestionsNotFound(attempt.soal_id))?;

        if attempt.is_finished() {
            tx.rollback().await?;
            return Ok(FinishOutcome {
                attempt,
                correct: result.correct as i64,
                total: result.total as i64,
                already_finished: true,
            });
        }

        let finished = sqlx::query_as::<_, ExamAttempt>(&format!(
            r#"
            UPDATE exam_attempts
            SET finished_at = NOW(), score = $2
            WHERE id = $1
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(attempt_id)
        .bind(result.score)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO history (user_id, soal_id, score, answers) VALUES ($1, $2, $3, $4)")
            .bind(finished.user_id)
            .bind(finished.soal_id)
            .bind(result.score)
            .bind(serde_json::to_value(&answers)?)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            attempt_id,
            user_id = finished.user_id,
            score = result.score,
            "作答会话已交卷"
        );

        Ok(FinishOutcome {
            attempt: finished,
            correct: result.correct as i64,
            total: result.total as i64,
            already_finished: false,
        })
    }
}

#[async_trait]
impl ExamRepositoryTrait for ExamRepository {
    async fn start_or_resume(
        &self,
        user_id: i64,
        soal_id: i64,
        duration_minutes: i32,
    ) -> Result<ExamAttempt> {
        self.start_or_resume(user_id, soal_id, duration_minutes).await
    }

    async fn get_attempt(&self, id: i64) -> Result<Option<ExamAttempt>> {
        self.get_attempt(id).await
    }

    async fn question_in_soal(&self, question_id: i64, soal_id: i64) -> Result<bool> {
        self.question_in_soal(question_id, soal_id).await
    }

    async fn list_answers(&self, attempt_id: i64) -> Result<Vec<UserAnswer>> {
        self.list_answers(attempt_id).await
    }

    async fn find_latest_answer(
        &self,
        user_id: i64,
        soal_id: i64,
        question_id: i64,
    ) -> Result<Option<UserAnswer>> {
        self.find_latest_answer(user_id, soal_id, question_id).await
    }

    async fn upsert_answer(
        &self,
        attempt_id: i64,
        user_id: i64,
        question_id: i64,
        answer: &str,
    ) -> Result<UserAnswer> {
        self.upsert_answer(attempt_id, user_id, question_id, answer)
            .await
    }

    async fn delete_answer(&self, attempt_id: i64, question_id: i64) -> Result<bool> {
        self.delete_answer(attempt_id, question_id).await
    }

    async fn finish_attempt(&self, attempt_id: i64) -> Result<FinishOutcome> {
        self.finish_attempt(attempt_id).await
    }
}
