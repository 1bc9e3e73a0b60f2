//! 响应 DTO 定义
//!
//! 题库与项目接口沿用各自既有的响应结构，新增接口统一使用 [`ApiResponse`]。

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    ExamAttempt, Feedback, OptionView, Program, Question, QuestionOption, SoalDetail, Tryout,
    TryoutQuestion, UserAnswer,
};
use crate::pagination::PageInfo;
use crate::scoring::{AnswerStatus, TryoutSummary};

/// API 统一响应
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "Berhasil")
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// 创建成功响应（无数据）
    pub fn success_empty(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

/// 项目接口的状态信封 `{status, message, errors, data}`
#[derive(Debug, Serialize)]
pub struct StatusEnvelope<T> {
    pub status: u16,
    pub message: String,
    pub errors: Option<serde_json::Value>,
    pub data: Option<T>,
}

impl<T> StatusEnvelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            errors: None,
            data: Some(data),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND.as_u16(),
            message: message.into(),
            errors: None,
            data: None,
        }
    }
}

// ==================== 题库 ====================

#[derive(Debug, Serialize)]
pub struct SoalListResponse {
    pub data: Vec<SoalDetail>,
    pub pagination: PageInfo,
}

/// 对作答者展示的题目，不含正确答案
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub question: String,
    pub image: Option<String>,
    pub options: Vec<OptionView>,
}

impl QuestionView {
    /// 把选项挂到所属题目下，保持题目顺序
    pub fn assemble(questions: Vec<Question>, options: &[QuestionOption]) -> Vec<Self> {
        questions
            .into_iter()
            .map(|q| Self {
                options: options
                    .iter()
                    .filter(|o| o.question_id == q.id)
                    .map(OptionView::from)
                    .collect(),
                id: q.id,
                question: q.question,
                image: q.image,
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct SoalWithQuestions {
    #[serde(flatten)]
    pub soal: SoalDetail,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub message: String,
    pub score: i32,
}

/// `{status: "sukses", data}`
#[derive(Debug, Serialize)]
pub struct StatusData<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T> StatusData<T> {
    pub fn sukses(data: T) -> Self {
        Self {
            status: "sukses",
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerKeyItem {
    pub id: i64,
    pub question: String,
    pub correct: String,
}

#[derive(Debug, Serialize)]
pub struct RatingSavedResponse {
    pub message: String,
    #[serde(rename = "newRating")]
    pub new_rating: Feedback,
}

#[derive(Debug, Serialize)]
pub struct FeedbackSavedResponse {
    pub message: String,
    #[serde(rename = "newFeedback")]
    pub new_feedback: Feedback,
}

#[derive(Debug, Serialize)]
pub struct MessageData<T> {
    pub message: String,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct SuccessData<T> {
    pub success: bool,
    pub data: T,
}

// ==================== 限时作答 ====================

#[derive(Debug, Serialize)]
pub struct ExamPayload {
    pub title: String,
    /// 时长（分钟）
    pub duration: i32,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Serialize)]
pub struct ExamStartResponse {
    pub id: i64,
    pub soal_id: i64,
    pub started_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub exam: ExamPayload,
    pub answers: Vec<UserAnswer>,
}

impl ExamStartResponse {
    pub fn new(attempt: ExamAttempt, exam: ExamPayload, answers: Vec<UserAnswer>) -> Self {
        Self {
            id: attempt.id,
            soal_id: attempt.soal_id,
            started_at: attempt.started_at,
            expires_at: attempt.expires_at,
            finished_at: attempt.finished_at,
            exam,
            answers,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FinishExamResponse {
    pub attemption_id: i64,
    pub score: i32,
    pub correct: i64,
    pub total: i64,
    pub already_finished: bool,
    pub finished_at: Option<DateTime<Utc>>,
}

// ==================== 项目 ====================

#[derive(Debug, Serialize)]
pub struct ProgramPage {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub programs: Vec<Program>,
}

#[derive(Debug, Serialize)]
pub struct ProgramQuestionView {
    pub id: i64,
    pub question: String,
    pub options: Vec<OptionView>,
}

impl From<&TryoutQuestion> for ProgramQuestionView {
    fn from(q: &TryoutQuestion) -> Self {
        Self {
            id: q.id,
            question: q.question_text.clone(),
            options: q.options(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TryoutWithQuestions {
    #[serde(flatten)]
    pub tryout: Tryout,
    pub questions: Vec<ProgramQuestionView>,
}

#[derive(Debug, Serialize)]
pub struct ProgramAnswerKeyItem {
    pub id: i64,
    pub question: String,
    pub correct: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Serialize)]
pub struct ProgramAnswerKey {
    #[serde(rename = "soalId")]
    pub soal_id: i64,
    pub title: String,
    pub answers: Vec<ProgramAnswerKeyItem>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationStatus {
    pub registered: bool,
}

// ==================== Tryout 成绩 ====================

#[derive(Debug, Serialize)]
pub struct TryoutSubmitResponse {
    pub attempt_number: i32,
    pub summary: TryoutSummary,
}

/// 历次提交概览
#[derive(Debug, Serialize)]
pub struct AttemptOverview {
    pub attempt_number: i32,
    pub correct: u32,
    pub wrong: u32,
    pub empty: u32,
    pub score: i32,
}

impl AttemptOverview {
    pub fn new(attempt_number: i32, summary: &TryoutSummary) -> Self {
        Self {
            attempt_number,
            correct: summary.correct,
            wrong: summary.wrong,
            empty: summary.empty,
            score: summary.score,
        }
    }
}

/// 单题成绩
#[derive(Debug, Serialize)]
pub struct QuestionResult {
    pub id: i64,
    pub question_text: String,
    pub options: Vec<OptionView>,
    pub correct_answer: String,
    pub user_answer: Option<String>,
    pub status: AnswerStatus,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct TryoutResultResponse {
    pub attempt_number: i32,
    pub summary: TryoutSummary,
    pub questions: Vec<QuestionResult>,
}

#[derive(Debug, Serialize)]
pub struct TryoutAnswerKeyResponse {
    pub tryout_id: i64,
    pub name: String,
    pub attempt_number: i32,
    pub questions: Vec<QuestionResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_envelope_shape() {
        let json = serde_json::to_value(StatusEnvelope::<()>::not_found("Program tidak ditemukan"))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": 404,
                "message": "Program tidak ditemukan",
                "errors": null,
                "data": null
            })
        );
    }

    #[test]
    fn test_question_view_hides_correct_answer() {
        let questions = vec![Question {
            id: 1,
            soal_id: 9,
            question: "Ibu kota Indonesia?".into(),
            image: None,
            correct: "b".into(),
        }];
        let options = vec![
            QuestionOption {
                id: 10,
                question_id: 1,
                label: "a".into(),
                content: "Bandung".into(),
            },
            QuestionOption {
                id: 11,
                question_id: 2,
                label: "a".into(),
                content: "lain".into(),
            },
        ];

        let views = QuestionView::assemble(questions, &options);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].options.len(), 1);

        let json = serde_json::to_value(&views[0]).unwrap();
        assert!(json.get("correct").is_none());
    }

    #[test]
    fn test_renamed_fields() {
        let key = ProgramAnswerKey {
            soal_id: 3,
            title: "Tryout 1".into(),
            answers: vec![],
        };
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["soalId"], 3);
    }
}
