//! 限时作答 API 处理器
//!
//! 会话在服务端计时：截止时间（加 30 秒宽限）之后的写入一律拒绝，
//! 交卷在仓储层的事务中完成且可重复调用。

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::{info, warn};
use tryout_shared::observability::metrics;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, DeleteAnswerRequest, ExamPayload, ExamStartResponse, FinishExamRequest,
        FinishExamResponse, QuestionView, SaveAnswerRequest, StartExamRequest, UserQuery,
    },
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::{CurrentUser, resolve_user_id},
    models::{ExamAttempt, UserAnswer},
    scoring::normalize_label,
    state::AppState,
};

/// 取出属于该用户和题组的会话，不存在或不匹配一律视为不存在
async fn owned_attempt(
    state: &AppState,
    attempt_id: i64,
    user_id: i64,
    soal_id: i64,
) -> Result<ExamAttempt, ApiError> {
    state
        .repos
        .exam
        .get_attempt(attempt_id)
        .await?
        .filter(|a| a.belongs_to(user_id, soal_id))
        .ok_or(ApiError::AttemptNotFound(attempt_id))
}

/// 可写入答案的会话：未交卷且未超时
async fn writable_attempt(
    state: &AppState,
    attempt_id: i64,
    user_id: i64,
    soal_id: i64,
) -> Result<ExamAttempt, ApiError> {
    let attempt = owned_attempt(state, attempt_id, user_id, soal_id).await?;

    if attempt.is_finished() {
        return Err(ApiError::AttemptFinished);
    }
    if attempt.is_expired(Utc::now()) {
        warn!(attempt_id, user_id, "作答会话已超时，拒绝写入");
        return Err(ApiError::AttemptExpired);
    }

    Ok(attempt)
}

/// 开始或继续作答
///
/// POST /student/exam/{id}/start
pub async fn start_exam(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(soal_id): ApiPath<i64>,
    ApiJson(req): ApiJson<StartExamRequest>,
) -> Result<Json<ExamStartResponse>, ApiError> {
    let user_id = resolve_user_id(current, req.user_id)?;

    let soal = state
        .repos
        .soal
        .get_soal(soal_id)
        .await?
        .ok_or(ApiError::SoalNotFound(soal_id))?
        .soal;

    let questions = state.repos.soal.list_questions(soal_id).await?;
    if questions.is_empty() {
        return Err(ApiError::QuestionsNotFound(soal_id));
    }
    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    let options = state.repos.soal.list_options(&ids).await?;

    let attempt = state
        .repos
        .exam
        .start_or_resume(user_id, soal_id, soal.duration_minutes)
        .await?;
    let answers = state.repos.exam.list_answers(attempt.id).await?;

    info!(attempt_id = attempt.id, user_id, soal_id, "作答会话开始");

    Ok(Json(ExamStartResponse::new(
        attempt,
        ExamPayload {
            title: soal.title,
            duration: soal.duration_minutes,
            questions: QuestionView::assemble(questions, &options),
        },
        answers,
    )))
}

/// 获取某题已保存的答案
///
/// GET /student/exam/{id}/answer/{question_id}?user_id
pub async fn get_answer(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath((soal_id, question_id)): ApiPath<(i64, i64)>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<ApiResponse<UserAnswer>>, ApiError> {
    let user_id = resolve_user_id(current, query.user_id)?;

    let answer = state
        .repos
        .exam
        .find_latest_answer(user_id, soal_id, question_id)
        .await?
        .ok_or(ApiError::AnswerNotFound)?;

    Ok(Json(ApiResponse::success(answer)))
}

/// 保存单题答案（新增与修改语义相同）
///
/// POST  /student/exam/{id}/answer/insert
/// PATCH /student/exam/{id}/answer/update
pub async fn save_answer(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(soal_id): ApiPath<i64>,
    ApiJson(req): ApiJson<SaveAnswerRequest>,
) -> Result<Json<ApiResponse<UserAnswer>>, ApiError> {
    req.validate()?;
    let user_id = resolve_user_id(current, req.user_id)?;

    let attempt = writable_attempt(&state, req.attemption_id, user_id, soal_id).await?;

    if !state
        .repos
        .exam
        .question_in_soal(req.question_id, soal_id)
        .await?
    {
        return Err(ApiError::QuestionNotFound(req.question_id));
    }

    let answer = normalize_label(&req.answer);
    let saved = state
        .repos
        .exam
        .upsert_answer(attempt.id, user_id, req.question_id, &answer)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        saved,
        "Jawaban tersimpan",
    )))
}

/// 删除单题答案
///
/// DELETE /student/exam/{id}/answer/delete
pub async fn delete_answer(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(soal_id): ApiPath<i64>,
    ApiJson(req): ApiJson<DeleteAnswerRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let user_id = resolve_user_id(current, req.user_id)?;

    let attempt = writable_attempt(&state, req.attemption_id, user_id, soal_id).await?;

    let deleted = state
        .repos
        .exam
        .delete_answer(attempt.id, req.question_id)
        .await?;
    if !deleted {
        return Err(ApiError::AnswerNotFound);
    }

    Ok(Json(ApiResponse::<()>::success_empty("Jawaban dihapus")))
}

/// 交卷
///
/// POST /student/exam/{id}/finish
pub async fn finish_exam(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(soal_id): ApiPath<i64>,
    ApiJson(req): ApiJson<FinishExamRequest>,
) -> Result<Json<ApiResponse<FinishExamResponse>>, ApiError> {
    let user_id = resolve_user_id(current, req.user_id)?;

    // 超时后仍允许交卷
    owned_attempt(&state, req.attemption_id, user_id, soal_id).await?;

    let outcome = state.repos.exam.finish_attempt(req.attemption_id).await?;
    let score = outcome.attempt.score.unwrap_or_default();

    if !outcome.already_finished {
        metrics::record_answer_submission("exam", "finished", Some(score as f64));
    }

    Ok(Json(ApiResponse::success_with_message(
        FinishExamResponse {
            attemption_id: outcome.attempt.id,
            score,
            correct: outcome.correct,
            total: outcome.total,
            already_finished: outcome.already_finished,
            finished_at: outcome.attempt.finished_at,
        },
        "Ujian selesai",
    )))
}
