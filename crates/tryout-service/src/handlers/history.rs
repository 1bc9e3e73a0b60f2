//! 作答历史（Riwayat）API 处理器

use axum::{Json, extract::State};

use crate::{
    dto::{HistoryQuery, StatusData, UserQuery},
    error::ApiError,
    extract::{ApiPath, ApiQuery},
    middleware::{CurrentUser, resolve_user_id},
    models::{History, HistoryWithSoal},
    state::AppState,
};

/// 低分阈值
const LOW_SCORE_THRESHOLD: i32 = 50;

/// 用户在某题组的最近一次作答
///
/// GET /api/riwayat/{soal_id}?user_id
pub async fn latest_history(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(soal_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<StatusData<History>>, ApiError> {
    let user_id = resolve_user_id(current, query.user_id)?;

    let history = state
        .repos
        .soal
        .find_latest_history(user_id, soal_id)
        .await?
        .ok_or(ApiError::HistoryNotFound)?;

    Ok(Json(StatusData::sukses(history)))
}

/// 用户在某题组的全部作答
///
/// GET /api/history?user_id&soalId
pub async fn list_history(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<Vec<History>>, ApiError> {
    let soal_id = query
        .soal_id
        .ok_or_else(|| ApiError::Validation("user_id dan soalId diperlukan".into()))?;
    let user_id = resolve_user_id(current, query.user_id)?;

    let histories = state.repos.soal.list_histories(user_id, soal_id).await?;
    if histories.is_empty() {
        return Err(ApiError::HistoryNotFound);
    }

    Ok(Json(histories))
}

/// 用户在某题组的全部作答，附带题组信息
///
/// GET /api/historya/{soal_id}?user_id
pub async fn list_history_with_soal(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(soal_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<HistoryWithSoal>>, ApiError> {
    let user_id = resolve_user_id(current, query.user_id)?;

    let histories = state
        .repos
        .soal
        .list_histories_with_soal(user_id, soal_id)
        .await?;
    if histories.is_empty() {
        return Err(ApiError::HistoryNotFound);
    }

    Ok(Json(histories))
}

/// 全部低于 50 分的作答
///
/// GET /api/historyall
pub async fn list_low_scores(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryWithSoal>>, ApiError> {
    let histories = state
        .repos
        .soal
        .list_histories_below(LOW_SCORE_THRESHOLD)
        .await?;
    if histories.is_empty() {
        return Err(ApiError::NotFound(
            "Tidak ada riwayat dengan skor di bawah 50".into(),
        ));
    }

    Ok(Json(histories))
}
