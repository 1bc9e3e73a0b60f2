//! 评分与反馈 API 处理器

use axum::{Json, extract::State};
use tracing::info;
use tryout_shared::observability::metrics;
use validator::Validate;

use crate::{
    dto::{
        FeedbackSavedResponse, MessageData, RatingSavedResponse, SoalRatingRequest,
        SubmitRatingRequest, UserRatingRequest,
    },
    error::ApiError,
    extract::{ApiJson, ApiPath},
    middleware::{CurrentUser, resolve_user_id},
    models::{Feedback, NewFeedback},
    state::AppState,
};

const RATING_RANGE_MESSAGE: &str = "Rating harus antara 1 dan 5";

async fn ensure_soal_exists(state: &AppState, soal_id: i64) -> Result<(), ApiError> {
    match state.repos.soal.get_soal(soal_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::SoalNotFound(soal_id)),
    }
}

async fn save_feedback(state: &AppState, feedback: NewFeedback) -> Result<Feedback, ApiError> {
    let rating = feedback.rating;
    let saved = state.repos.soal.create_feedback(feedback).await?;

    metrics::record_feedback(rating);
    info!(feedback_id = saved.id, soal_id = saved.soal_id, rating, "评分已保存");
    Ok(saved)
}

/// 为题组评分（可匿名）
///
/// POST /api/soal/rating/{id}
pub async fn rate_soal(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(soal_id): ApiPath<i64>,
    ApiJson(req): ApiJson<SoalRatingRequest>,
) -> Result<Json<RatingSavedResponse>, ApiError> {
    ensure_soal_exists(&state, soal_id).await?;

    req.validate()?;
    let rating = req
        .rating
        .ok_or_else(|| ApiError::Validation(RATING_RANGE_MESSAGE.into()))?;

    let saved = save_feedback(
        &state,
        NewFeedback {
            soal_id,
            user_id: current.0.map(|u| u.user_id),
            rating,
            feedback: req.feedback,
        },
    )
    .await?;

    Ok(Json(RatingSavedResponse {
        message: "Rating berhasil disimpan".to_string(),
        new_rating: saved,
    }))
}

/// 提交评分与反馈
///
/// POST /submit-rating
pub async fn submit_rating(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<SubmitRatingRequest>,
) -> Result<Json<FeedbackSavedResponse>, ApiError> {
    let missing = || ApiError::Validation("soal_id, user_id, atau rating tidak ada".into());
    let soal_id = req.soal_id.ok_or_else(missing)?;
    let rating = req.rating.ok_or_else(missing)?;
    let user_id = resolve_user_id(current, req.user_id)?;
    req.validate()?;

    ensure_soal_exists(&state, soal_id).await?;

    let saved = save_feedback(
        &state,
        NewFeedback {
            soal_id,
            user_id: Some(user_id),
            rating,
            feedback: req.feedback,
        },
    )
    .await?;

    Ok(Json(FeedbackSavedResponse {
        message: "Rating dan feedback berhasil disimpan".to_string(),
        new_feedback: saved,
    }))
}

/// 获取题组的全部反馈
///
/// GET /feedback/{soal_id}
pub async fn list_feedback(
    State(state): State<AppState>,
    ApiPath(soal_id): ApiPath<i64>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    let feedback = state.repos.soal.list_feedback(soal_id).await?;
    Ok(Json(feedback))
}

/// 用户为题组评分
///
/// POST /rating/{id}
pub async fn rate_soal_as_user(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(soal_id): ApiPath<i64>,
    ApiJson(req): ApiJson<UserRatingRequest>,
) -> Result<Json<MessageData<Feedback>>, ApiError> {
    let user_id = resolve_user_id(current, req.user_id)?;
    req.validate()?;
    let rating = req
        .rating
        .ok_or_else(|| ApiError::Validation(RATING_RANGE_MESSAGE.into()))?;

    ensure_soal_exists(&state, soal_id).await?;

    let saved = save_feedback(
        &state,
        NewFeedback {
            soal_id,
            user_id: Some(user_id),
            rating,
            feedback: req.feedback,
        },
    )
    .await?;

    Ok(Json(MessageData {
        message: "Rating berhasil disimpan".to_string(),
        data: saved,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::models::NewFeedback;
    use crate::test_support::{MockRepos, feedback, get, json_request, sample_soal, send};

    fn repos_with_soal() -> MockRepos {
        let mut repos = MockRepos::new();
        repos
            .soal
            .expect_get_soal()
            .returning(|id| Ok(Some(sample_soal(id))));
        repos
    }

    #[tokio::test]
    async fn test_rate_soal_anonymously() {
        let mut repos = repos_with_soal();
        repos
            .soal
            .expect_create_feedback()
            .withf(|f: &NewFeedback| f.user_id.is_none() && f.rating == 4)
            .returning(|f| Ok(feedback(1, f)));

        let (status, body) = send(
            repos.into_app(),
            json_request(
                Method::POST,
                "/api/soal/rating/2",
                json!({"rating": 4, "feedback": "Mantap"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Rating berhasil disimpan");
        assert_eq!(body["newRating"]["rating"], 4);
        assert_eq!(body["newRating"]["feedback"], "Mantap");
    }

    #[tokio::test]
    async fn test_rate_missing_soal_is_not_found() {
        let mut repos = MockRepos::new();
        repos.soal.expect_get_soal().returning(|_| Ok(None));
        repos.soal.expect_create_feedback().never();

        let (status, _) = send(
            repos.into_app(),
            json_request(Method::POST, "/api/soal/rating/2", json!({"rating": 4})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rating_bounds_enforced() {
        for rating in [0, 6] {
            let mut repos = repos_with_soal();
            repos.soal.expect_create_feedback().never();

            let (status, body) = send(
                repos.into_app(),
                json_request(
                    Method::POST,
                    "/rating/2",
                    json!({"rating": rating, "user_id": 3}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "rating={rating}");
            assert_eq!(body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_user_rating_requires_user_id() {
        let (status, body) = send(
            MockRepos::new().into_app(),
            json_request(Method::POST, "/rating/2", json!({"rating": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "USER_ID_REQUIRED");
    }

    #[tokio::test]
    async fn test_user_rating_saved() {
        let mut repos = repos_with_soal();
        repos
            .soal
            .expect_create_feedback()
            .withf(|f: &NewFeedback| f.user_id == Some(3) && f.soal_id == 2)
            .returning(|f| Ok(feedback(8, f)));

        let (status, body) = send(
            repos.into_app(),
            json_request(Method::POST, "/rating/2", json!({"rating": 5, "user_id": 3})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], 8);
    }

    #[tokio::test]
    async fn test_submit_rating_requires_fields() {
        let (status, _) = send(
            MockRepos::new().into_app(),
            json_request(Method::POST, "/submit-rating", json!({"user_id": 1, "rating": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submit_rating_saved() {
        let mut repos = repos_with_soal();
        repos
            .soal
            .expect_create_feedback()
            .returning(|f| Ok(feedback(2, f)));

        let (status, body) = send(
            repos.into_app(),
            json_request(
                Method::POST,
                "/submit-rating",
                json!({"soal_id": 2, "user_id": 1, "rating": 3, "feedback": "ok"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Rating dan feedback berhasil disimpan");
        assert_eq!(body["newFeedback"]["user_id"], 1);
    }

    #[tokio::test]
    async fn test_list_feedback() {
        let mut repos = MockRepos::new();
        repos.soal.expect_list_feedback().returning(|soal_id| {
            Ok(vec![feedback(
                1,
                NewFeedback {
                    soal_id,
                    user_id: None,
                    rating: 5,
                    feedback: None,
                },
            )])
        });

        let (status, body) = send(repos.into_app(), get("/feedback/2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
