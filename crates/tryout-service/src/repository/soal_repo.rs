//! 题库仓储
//!
//! 题组、题目、选项、作答历史与评分反馈的数据访问

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::SoalRepositoryTrait;
use crate::error::Result;
use crate::models::{
    Category, ExamCategory, Feedback, History, HistoryWithSoal, NewFeedback, NewHistory, Question,
    QuestionOption, Soal, SoalDetail,
};

const SOAL_COLUMNS: &str =
    "id, title, description, duration_minutes, exam_category_id, category_id, created_at";

/// 题组与类别的联表行
#[derive(Debug, sqlx::FromRow)]
struct SoalRow {
    id: i64,
    title: String,
    description: Option<String>,
    duration_minutes: i32,
    exam_category_id: Option<i64>,
    category_id: Option<i64>,
    created_at: DateTime<Utc>,
    exam_category_name: Option<String>,
    category_name: Option<String>,
}

impl From<SoalRow> for SoalDetail {
    fn from(row: SoalRow) -> Self {
        let exam_category = row
            .exam_category_id
            .zip(row.exam_category_name)
            .map(|(id, name)| ExamCategory { id, name });
        let category = row
            .category_id
            .zip(row.category_name)
            .map(|(id, name)| Category { id, name });

        Self {
            soal: Soal {
                id: row.id,
                title: row.title,
                description: row.description,
                duration_minutes: row.duration_minutes,
                exam_category_id: row.exam_category_id,
                category_id: row.category_id,
                created_at: row.created_at,
            },
            exam_category,
            category,
        }
    }
}

/// 题库仓储
pub struct SoalRepository {
    pool: PgPool,
}

impl SoalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 题组 ====================

    pub async fn list_soal(
        &self,
        category_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<SoalDetail>> {
        let rows = sqlx::query_as::<_, SoalRow>(
            r#"
            SELECT s.id, s.title, s.description, s.duration_minutes,
                   s.exam_category_id, s.category_id, s.created_at,
                   ec.name AS exam_category_name, c.name AS category_name
            FROM soal s
            LEFT JOIN exam_categories ec ON ec.id = s.exam_category_id
            LEFT JOIN categories c ON c.id = s.category_id
            WHERE ($1::BIGINT IS NULL OR s.category_id = $1)
            ORDER BY s.id ASC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(category_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SoalDetail::from).collect())
    }

    pub async fn count_soal(&self, category_id: Option<i64>) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM soal WHERE ($1::BIGINT IS NULL OR category_id = $1)",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    pub async fn get_soal(&self, id: i64) -> Result<Option<SoalDetail>> {
        let row = sqlx::query_as::<_, SoalRow>(
            r#"
            SELECT s.id, s.title, s.description, s.duration_minutes,
                   s.exam_category_id, s.category_id, s.created_at,
                   ec.name AS exam_category_name, c.name AS category_name
            FROM soal s
            LEFT JOIN exam_categories ec ON ec.id = s.exam_category_id
            LEFT JOIN categories c ON c.id = s.category_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SoalDetail::from))
    }

    async fn soal_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, Soal>> {
        let soal = sqlx::query_as::<_, Soal>(&format!(
            "SELECT {SOAL_COLUMNS} FROM soal WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(soal.into_iter().map(|s| (s.id, s)).collect())
    }

    // ==================== 题目与选项 ====================

    pub async fn list_questions(&self, soal_id: i64) -> Result<Vec<Question>> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, soal_id, question, image, correct
            FROM questions
            WHERE soal_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(soal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    pub async fn list_options(&self, question_ids: &[i64]) -> Result<Vec<QuestionOption>> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }

        let options = sqlx::query_as::<_, QuestionOption>(
            r#"
            SELECT id, question_id, label, content
            FROM options
            WHERE question_id = ANY($1)
            ORDER BY question_id ASC, label ASC
            "#,
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(options)
    }

    // ==================== 作答历史 ====================

    pub async fn create_history(&self, history: NewHistory) -> Result<History> {
        let created = sqlx::query_as::<_, History>(
            r#"
            INSERT INTO history (user_id, soal_id, score, answers)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, soal_id, score, answers, created_at
            "#,
        )
        .bind(history.user_id)
        .bind(history.soal_id)
        .bind(history.score)
        .bind(&history.answers)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn find_latest_history(&self, user_id: i64, soal_id: i64) -> Result<Option<History>> {
        let history = sqlx::query_as::<_, History>(
            r#"
            SELECT id, user_id, soal_id, score, answers, created_at
            FROM history
            WHERE user_id = $1 AND soal_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(soal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(history)
    }

    pub async fn list_histories(&self, user_id: i64, soal_id: i64) -> Result<Vec<History>> {
        let histories = sqlx::query_as::<_, History>(
            r#"
            SELECT id, user_id, soal_id, score, answers, created_at
            FROM history
            WHERE user_id = $1 AND soal_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(soal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(histories)
    }

    pub async fn list_histories_with_soal(
        &self,
        user_id: i64,
        soal_id: i64,
    ) -> Result<Vec<HistoryWithSoal>> {
        let histories = self.list_histories(user_id, soal_id).await?;
        self.attach_soal(histories).await
    }

    pub async fn list_histories_below(&self, score: i32) -> Result<Vec<HistoryWithSoal>> {
        let histories = sqlx::query_as::<_, History>(
            r#"
            SELECT id, user_id, soal_id, score, answers, created_at
            FROM history
            WHERE score < $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(score)
        .fetch_all(&self.pool)
        .await?;

        self.attach_soal(histories).await
    }

    async fn attach_soal(&self, histories: Vec<History>) -> Result<Vec<HistoryWithSoal>> {
        let mut ids: Vec<i64> = histories.iter().map(|h| h.soal_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let soal = self.soal_by_ids(&ids).await?;

        Ok(histories
            .into_iter()
            .filter_map(|history| {
                let soal = soal.get(&history.soal_id)?.clone();
                Some(HistoryWithSoal { history, soal })
            })
            .collect())
    }

    // ==================== 评分反馈 ====================

    pub async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback> {
        let created = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (soal_id, user_id, rating, feedback)
            VALUES ($1, $2, $3, $4)
            RETURNING id, soal_id, user_id, rating, feedback, created_at
            "#,
        )
        .bind(feedback.soal_id)
        .bind(feedback.user_id)
        .bind(feedback.rating)
        .bind(&feedback.feedback)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn list_feedback(&self, soal_id: i64) -> Result<Vec<Feedback>> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, soal_id, user_id, rating, feedback, created_at
            FROM feedback
            WHERE soal_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(soal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(feedback)
    }
}

#[async_trait]
impl SoalRepositoryTrait for SoalRepository {
    async fn list_soal(
        &self,
        category_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<SoalDetail>> {
        self.list_soal(category_id, offset, limit).await
    }

    async fn count_soal(&self, category_id: Option<i64>) -> Result<i64> {
        self.count_soal(category_id).await
    }

    async fn get_soal(&self, id: i64) -> Result<Option<SoalDetail>> {
        self.get_soal(id).await
    }

    async fn list_questions(&self, soal_id: i64) -> Result<Vec<Question>> {
        self.list_questions(soal_id).await
    }

    async fn list_options(&self, question_ids: &[i64]) -> Result<Vec<QuestionOption>> {
        self.list_options(question_ids).await
    }

    async fn create_history(&self, history: NewHistory) -> Result<History> {
        self.create_history(history).await
    }

    async fn find_latest_history(&self, user_id: i64, soal_id: i64) -> Result<Option<History>> {
        self.find_latest_history(user_id, soal_id).await
    }

    async fn list_histories(&self, user_id: i64, soal_id: i64) -> Result<Vec<History>> {
        self.list_histories(user_id, soal_id).await
    }

    async fn list_histories_with_soal(
        &self,
        user_id: i64,
        soal_id: i64,
    ) -> Result<Vec<HistoryWithSoal>> {
        self.list_histories_with_soal(user_id, soal_id).await
    }

    async fn list_histories_below(&self, score: i32) -> Result<Vec<HistoryWithSoal>> {
        self.list_histories_below(score).await
    }

    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback> {
        self.create_feedback(feedback).await
    }

    async fn list_feedback(&self, soal_id: i64) -> Result<Vec<Feedback>> {
        self.list_feedback(soal_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(exam_category: Option<(i64, &str)>, category: Option<(i64, &str)>) -> SoalRow {
        SoalRow {
            id: 1,
            title: "TPS Penalaran Umum".into(),
            description: None,
            duration_minutes: 30,
            exam_category_id: exam_category.map(|(id, _)| id),
            category_id: category.map(|(id, _)| id),
            created_at: Utc::now(),
            exam_category_name: exam_category.map(|(_, n)| n.to_string()),
            category_name: category.map(|(_, n)| n.to_string()),
        }
    }

    #[test]
    fn test_soal_row_embeds_categories() {
        let detail = SoalDetail::from(row(Some((2, "UTBK")), Some((5, "Matematika"))));
        assert_eq!(detail.soal.id, 1);
        assert_eq!(detail.exam_category.unwrap().name, "UTBK");
        assert_eq!(detail.category.unwrap().id, 5);
    }

    #[test]
    fn test_soal_row_without_categories() {
        let detail = SoalDetail::from(row(None, None));
        assert!(detail.exam_category.is_none());
        assert!(detail.category.is_none());

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["title"], "TPS Penalaran Umum");
        assert!(json["category"].is_null());
    }
}
