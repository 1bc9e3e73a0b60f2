//! Tryout 仓储
//!
//! 项目 Tryout、题目、项目题库历史与逐题作答结果

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::traits::TryoutRepositoryTrait;
use crate::error::{ApiError, Result};
use crate::models::{
    NewProgramHistory, ProgramHistory, ProgramHistoryWithTryout, SubmittedAttempt, Tryout,
    TryoutAnswerInput, TryoutQuestion, TryoutResult,
};
use crate::scoring::{AnswerStatus, normalize_label, summarize_tryout};

const TRYOUT_COLUMNS: &str = "id, program_id, name, is_active, total_questions, duration_minutes, \
     exam_category, is_free, price, created_at";
const QUESTION_COLUMNS: &str = "id, tryout_id, question_text, option_a, option_b, option_c, \
     option_d, option_e, correct_answer";
const RESULT_COLUMNS: &str = "id, user_id, tryout_id, attempt_number, question_id, user_answer, \
     correct_answer, created_at";

/// Tryout 仓储
pub struct TryoutRepository {
    pool: PgPool,
}

impl TryoutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `active_only` 时按 id 排序，否则按创建时间倒序
    pub async fn list_tryouts(&self, program_id: i64, active_only: bool) -> Result<Vec<Tryout>> {
        let sql = if active_only {
            format!(
                "SELECT {TRYOUT_COLUMNS} FROM tryouts WHERE program_id = $1 AND is_active = TRUE ORDER BY id ASC"
            )
        } else {
            format!(
                "SELECT {TRYOUT_COLUMNS} FROM tryouts WHERE program_id = $1 ORDER BY created_at DESC, id DESC"
            )
        };

        let tryouts = sqlx::query_as::<_, Tryout>(&sql)
            .bind(program_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tryouts)
    }

    pub async fn get_tryout(&self, id: i64) -> Result<Option<Tryout>> {
        let tryout = sqlx::query_as::<_, Tryout>(&format!(
            "SELECT {TRYOUT_COLUMNS} FROM tryouts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tryout)
    }

    pub async fn list_questions(&self, tryout_id: i64) -> Result<Vec<TryoutQuestion>> {
        let questions = sqlx::query_as::<_, TryoutQuestion>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM tryout_questions WHERE tryout_id = $1 ORDER BY id ASC"
        ))
        .bind(tryout_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    pub async fn create_history(&self, history: NewProgramHistory) -> Result<ProgramHistory> {
        let created = sqlx::query_as::<_, ProgramHistory>(
            r#"
            INSERT INTO program_histories (user_id, tryout_id, score, answers)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, tryout_id, score, answers, created_at
            "#,
        )
        .bind(history.user_id)
        .bind(history.tryout_id)
        .bind(history.score)
        .bind(&history.answers)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn list_histories_with_tryout(
        &self,
        user_id: i64,
        tryout_id: i64,
    ) -> Result<Vec<ProgramHistoryWithTryout>> {
        let Some(tryout) = self.get_tryout(tryout_id).await? else {
            return Ok(Vec::new());
        };

        let histories = sqlx::query_as::<_, ProgramHistory>(
            r#"
            SELECT id, user_id, tryout_id, score, answers, created_at
            FROM program_histories
            WHERE user_id = $1 AND tryout_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(tryout_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(histories
            .into_iter()
            .map(|history| ProgramHistoryWithTryout {
                history,
                soal: tryout.clone(),
            })
            .collect())
    }

    /// 提交一次 Tryout
    ///
    /// 锁定 Tryout 行后分配 attempt_number，保证并发提交不会拿到相同编号。
    /// 未作答的题目同样落一行，user_answer 为 null。
    pub async fn submit_attempt(
        &self,
        user_id: i64,
        tryout_id: i64,
        answers: Vec<TryoutAnswerInput>,
    ) -> Result<SubmittedAttempt> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM tryouts WHERE id = $1 FOR UPDATE")
                .bind(tryout_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(ApiError::TryoutNotFound(tryout_id));
        }

        let questions: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, correct_answer FROM tryout_questions WHERE tryout_id = $1 ORDER BY id ASC",
        )
        .bind(tryout_id)
        .fetch_all(&mut *tx)
        .await?;
        if questions.is_empty() {
            return Err(ApiError::QuestionsNotFound(tryout_id));
        }

        let attempt_number: i32 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(attempt_number), 0) + 1
            FROM user_tryout_results
            WHERE user_id = $1 AND tryout_id = $2
            "#,
        )
        .bind(user_id)
        .bind(tryout_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut results = Vec::with_capacity(questions.len());
        for (question_id, correct_answer) in &questions {
            let user_answer = answers
                .iter()
                .find(|a| a.question_id == *question_id)
                .and_then(|a| a.user_answer.as_deref())
                .map(normalize_label)
                .filter(|a| !a.is_empty());

            let row = sqlx::query_as::<_, TryoutResult>(&format!(
                r#"
                INSERT INTO user_tryout_results
                    (user_id, tryout_id, attempt_number, question_id, user_answer, correct_answer)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {RESULT_COLUMNS}
                "#
            ))
            .bind(user_id)
            .bind(tryout_id)
            .bind(attempt_number)
            .bind(question_id)
            .bind(user_answer)
            .bind(correct_answer)
            .fetch_one(&mut *tx)
            .await?;

            results.push(row);
        }

        tx.commit().await?;

        let summary = summarize_tryout(
            results
                .iter()
                .map(|r| AnswerStatus::classify(r.user_answer.as_deref(), &r.correct_answer)),
        );

        info!(
            user_id,
            tryout_id,
            attempt_number,
            score = summary.score,
            "Tryout 已提交"
        );

        Ok(SubmittedAttempt {
            attempt_number,
            results,
            summary,
        })
    }

    pub async fn list_results(&self, user_id: i64, tryout_id: i64) -> Result<Vec<TryoutResult>> {
        let results = sqlx::query_as::<_, TryoutResult>(&format!(
            r#"
            SELECT {RESULT_COLUMNS}
            FROM user_tryout_results
            WHERE user_id = $1 AND tryout_id = $2
            ORDER BY attempt_number ASC, question_id ASC
            "#
        ))
        .bind(user_id)
        .bind(tryout_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }
}

#[async_trait]
impl TryoutRepositoryTrait for TryoutRepository {
    async fn list_tryouts(&self, program_id: i64, active_only: bool) -> Result<Vec<Tryout>> {
        self.list_tryouts(program_id, active_only).await
    }

    async fn get_tryout(&self, id: i64) -> Result<Option<Tryout>> {
        self.get_tryout(id).await
    }

    async fn list_questions(&self, tryout_id: i64) -> Result<Vec<TryoutQuestion>> {
        self.list_questions(tryout_id).await
    }

    async fn create_history(&self, history: NewProgramHistory) -> Result<ProgramHistory> {
        self.create_history(history).await
    }

    async fn list_histories_with_tryout(
        &self,
        user_id: i64,
        tryout_id: i64,
    ) -> Result<Vec<ProgramHistoryWithTryout>> {
        self.list_histories_with_tryout(user_id, tryout_id).await
    }

    async fn submit_attempt(
        &self,
        user_id: i64,
        tryout_id: i64,
        answers: Vec<TryoutAnswerInput>,
    ) -> Result<SubmittedAttempt> {
        self.submit_attempt(user_id, tryout_id, answers).await
    }

    async fn list_results(&self, user_id: i64, tryout_id: i64) -> Result<Vec<TryoutResult>> {
        self.list_results(user_id, tryout_id).await
    }
}
