//! DTO 模块
//!
//! 请求体、查询参数与响应体结构。字段保持 snake_case，
//! 少数历史字段（soalId、perPage、newRating 等）显式重命名。

pub mod request;
pub mod response;

pub use request::{
    DeleteAnswerRequest, FinishExamRequest, HistoryQuery, ProgramListQuery,
    RegisterProgramRequest, SaveAnswerRequest, SoalListQuery, SoalRatingRequest,
    StartExamRequest, SubmitAnswersRequest, SubmitRatingRequest, SubmitTryoutRequest,
    TryoutListQuery, TryoutResultQuery, UserQuery, UserRatingRequest,
};
pub use response::{
    AnswerKeyItem, ApiResponse, AttemptOverview, DataResponse, ExamPayload, ExamStartResponse,
    FeedbackSavedResponse, FinishExamResponse, MessageData, ProgramAnswerKey,
    ProgramAnswerKeyItem, ProgramPage, ProgramQuestionView, QuestionResult, QuestionView,
    RatingSavedResponse, RegistrationStatus, ScoreResponse, SoalListResponse, SoalWithQuestions,
    StatusData, StatusEnvelope, SuccessData, TryoutAnswerKeyResponse, TryoutResultResponse,
    TryoutSubmitResponse, TryoutWithQuestions,
};
