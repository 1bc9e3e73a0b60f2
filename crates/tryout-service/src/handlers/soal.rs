//! 题库 API 处理器
//!
//! 题组列表与详情、作答题目、整套提交评分、答案解析

use axum::{Json, extract::State};
use tracing::info;
use tryout_shared::observability::metrics;
use validator::Validate;

use crate::{
    dto::{
        AnswerKeyItem, QuestionView, ScoreResponse, SoalListQuery, SoalListResponse,
        SoalWithQuestions, SubmitAnswersRequest,
    },
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::{CurrentUser, resolve_user_id},
    models::{NewHistory, SoalDetail},
    pagination::{DEFAULT_SOAL_PER_PAGE, PageInfo, PageRequest},
    scoring::percentage_score,
    state::AppState,
};

/// 获取题组列表（分页，可按分类过滤）
///
/// GET /api/soal?page&perPage&category_id
pub async fn list_soal(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SoalListQuery>,
) -> Result<Json<SoalListResponse>, ApiError> {
    let page = PageRequest::strict(query.page, query.per_page, DEFAULT_SOAL_PER_PAGE)?;

    let total = state.repos.soal.count_soal(query.category_id).await?;
    let data = state
        .repos
        .soal
        .list_soal(query.category_id, page.offset(), page.size)
        .await?;

    Ok(Json(SoalListResponse {
        data,
        pagination: PageInfo::new(total, page.size, page.page),
    }))
}

/// 获取题组详情
///
/// GET /api/soal/{id}
pub async fn get_soal(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SoalDetail>, ApiError> {
    let soal = state
        .repos
        .soal
        .get_soal(id)
        .await?
        .ok_or(ApiError::SoalNotFound(id))?;

    Ok(Json(soal))
}

/// 获取题组及其题目、选项（不含正确答案）
///
/// GET /api/soali/{soal_id}
pub async fn get_soal_with_questions(
    State(state): State<AppState>,
    ApiPath(soal_id): ApiPath<i64>,
) -> Result<Json<SoalWithQuestions>, ApiError> {
    let soal = state
        .repos
        .soal
        .get_soal(soal_id)
        .await?
        .ok_or(ApiError::SoalNotFound(soal_id))?;

    let questions = state.repos.soal.list_questions(soal_id).await?;
    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    let options = state.repos.soal.list_options(&ids).await?;

    Ok(Json(SoalWithQuestions {
        soal,
        questions: QuestionView::assemble(questions, &options),
    }))
}

/// 提交整套答案并评分
///
/// POST /api/answers
pub async fn submit_answers(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<SubmitAnswersRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    req.validate()?;

    let answers = req.answers.as_deref().ok_or_else(|| {
        ApiError::Validation("user_id, soal_id, dan answers wajib diisi".into())
    })?;
    let soal_id = req.parse_soal_id()?;
    let user_id = resolve_user_id(current, req.user_id)?;

    let questions = state.repos.soal.list_questions(soal_id).await?;
    let key: Vec<(i64, &str)> = questions
        .iter()
        .map(|q| (q.id, q.correct.as_str()))
        .collect();
    let result = percentage_score(&key, answers).ok_or(ApiError::QuestionsNotFound(soal_id))?;

    state
        .repos
        .soal
        .create_history(NewHistory {
            user_id,
            soal_id,
            score: result.score,
            answers: serde_json::to_value(answers)?,
        })
        .await?;

    metrics::record_answer_submission("soal", "saved", Some(result.score as f64));
    info!(user_id, soal_id, score = result.score, "答案已提交");

    Ok(Json(ScoreResponse {
        message: "Jawaban berhasil disimpan".to_string(),
        score: result.score,
    }))
}

/// 答案解析
///
/// GET /api/soal/kunci_jawaban/{id}
pub async fn answer_key(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<AnswerKeyItem>>, ApiError> {
    if state.repos.soal.get_soal(id).await?.is_none() {
        return Err(ApiError::SoalNotFound(id));
    }

    let answers = state
        .repos
        .soal
        .list_questions(id)
        .await?
        .into_iter()
        .map(|q| AnswerKeyItem {
            id: q.id,
            question: q.question,
            correct: q.correct,
        })
        .collect();

    Ok(Json(answers))
}
