//! 接口错误类型定义
//!
//! 所有 handler 返回的错误最终都会转换成统一的 JSON 错误信封。

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tryout_shared::error::SharedError;

/// 接口错误类型
///
/// `Display` 输出直接作为响应体的 message 返回给前端，
/// 因此面向用户的文案沿用平台的印尼语提示。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("Tidak terautentikasi: {0}")]
    Unauthorized(String),
    #[error("Akses ditolak: {0}")]
    Forbidden(String),

    // 参数校验
    #[error("Validasi gagal: {0}")]
    Validation(String),
    #[error("user_id diperlukan")]
    MissingUserId,

    // 资源不存在
    #[error("Soal tidak ditemukan: {0}")]
    SoalNotFound(i64),
    #[error("Tidak ada pertanyaan untuk soal_id ini: {0}")]
    QuestionsNotFound(i64),
    #[error("Pertanyaan tidak ditemukan: {0}")]
    QuestionNotFound(i64),
    #[error("Riwayat tidak ditemukan")]
    HistoryNotFound,
    #[error("Program tidak ditemukan")]
    ProgramNotFound(i64),
    #[error("Tryout tidak ditemukan: {0}")]
    TryoutNotFound(i64),
    #[error("Sesi ujian tidak ditemukan: {0}")]
    AttemptNotFound(i64),
    #[error("Jawaban tidak ditemukan")]
    AnswerNotFound,
    #[error("Kode tiket tidak valid atau sudah digunakan")]
    TicketNotFound,
    #[error("Data tidak ditemukan: {0}")]
    NotFound(String),

    // 业务冲突
    #[error("Anda sudah terdaftar di program ini")]
    AlreadyRegistered,
    #[error("Sesi ujian sudah selesai")]
    AttemptFinished,
    #[error("Waktu ujian sudah habis")]
    AttemptExpired,
    #[error("Anda belum menyelesaikan tryout ini")]
    NotCompleted,

    // 系统错误
    #[error("Kesalahan database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Kesalahan internal: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::NotCompleted => StatusCode::FORBIDDEN,

            Self::Validation(_) | Self::MissingUserId => StatusCode::BAD_REQUEST,

            Self::SoalNotFound(_)
            | Self::QuestionsNotFound(_)
            | Self::QuestionNotFound(_)
            | Self::HistoryNotFound
            | Self::ProgramNotFound(_)
            | Self::TryoutNotFound(_)
            | Self::AttemptNotFound(_)
            | Self::AnswerNotFound
            | Self::TicketNotFound
            | Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::AlreadyRegistered | Self::AttemptFinished | Self::AttemptExpired => {
                StatusCode::CONFLICT
            }

            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::MissingUserId => "USER_ID_REQUIRED",
            Self::SoalNotFound(_) => "SOAL_NOT_FOUND",
            Self::QuestionsNotFound(_) => "QUESTIONS_NOT_FOUND",
            Self::QuestionNotFound(_) => "QUESTION_NOT_FOUND",
            Self::HistoryNotFound => "HISTORY_NOT_FOUND",
            Self::ProgramNotFound(_) => "PROGRAM_NOT_FOUND",
            Self::TryoutNotFound(_) => "TRYOUT_NOT_FOUND",
            Self::AttemptNotFound(_) => "ATTEMPT_NOT_FOUND",
            Self::AnswerNotFound => "ANSWER_NOT_FOUND",
            Self::TicketNotFound => "TICKET_NOT_FOUND",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::AttemptFinished => "ATTEMPT_FINISHED",
            Self::AttemptExpired => "ATTEMPT_EXPIRED",
            Self::NotCompleted => "NOT_COMPLETED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "Terjadi kesalahan pada server, silakan coba lagi".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "Terjadi kesalahan pada server, silakan coba lagi".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 从 JSON 序列化错误转换
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON 处理错误: {}", err))
    }
}

impl From<SharedError> for ApiError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::Database(e) => Self::Database(e),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
