//! 项目 Tryout API 处理器
//!
//! 项目题库（百分制）与 Tryout 成绩（+4 / -1 / 0）两套流程。

use std::collections::{BTreeMap, HashMap};

use axum::{Json, extract::State};
use tracing::info;
use tryout_shared::observability::metrics;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, AttemptOverview, DataResponse, ProgramAnswerKey, ProgramAnswerKeyItem,
        ProgramQuestionView, QuestionResult, ScoreResponse, SubmitAnswersRequest,
        SubmitTryoutRequest, TryoutAnswerKeyResponse, TryoutListQuery, TryoutResultQuery,
        TryoutResultResponse, TryoutSubmitResponse, TryoutWithQuestions, UserQuery,
    },
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::{CurrentUser, resolve_user_id},
    models::{NewProgramHistory, ProgramHistoryWithTryout, Tryout, TryoutQuestion, TryoutResult},
    scoring::{AnswerStatus, percentage_score, summarize_tryout},
    state::AppState,
};

async fn load_tryout(state: &AppState, id: i64) -> Result<Tryout, ApiError> {
    state
        .repos
        .tryout
        .get_tryout(id)
        .await?
        .ok_or(ApiError::TryoutNotFound(id))
}

/// 逐行对照某一次提交，题目集合以提交时写入的结果行为准
fn grade_attempt(questions: &[TryoutQuestion], rows: &[&TryoutResult]) -> Vec<QuestionResult> {
    let by_id: HashMap<i64, &TryoutQuestion> = questions.iter().map(|q| (q.id, q)).collect();

    rows.iter()
        .map(|row| {
            let question = by_id.get(&row.question_id);
            let status = AnswerStatus::classify(row.user_answer.as_deref(), &row.correct_answer);

            QuestionResult {
                id: row.question_id,
                question_text: question
                    .map(|q| q.question_text.clone())
                    .unwrap_or_default(),
                options: question.map(|q| q.options()).unwrap_or_default(),
                correct_answer: row.correct_answer.clone(),
                user_answer: row.user_answer.clone(),
                status,
                is_correct: status == AnswerStatus::Correct,
            }
        })
        .collect()
}

/// 结果行按 attempt_number 分组
fn group_by_attempt(results: &[TryoutResult]) -> BTreeMap<i32, Vec<&TryoutResult>> {
    let mut grouped: BTreeMap<i32, Vec<&TryoutResult>> = BTreeMap::new();
    for row in results {
        grouped.entry(row.attempt_number).or_default().push(row);
    }
    grouped
}

// ==================== 项目题库 ====================

/// 项目下的 Tryout 列表
///
/// GET /programs/tryout/{program_id}?active_only
pub async fn list_tryouts(
    State(state): State<AppState>,
    ApiPath(program_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<TryoutListQuery>,
) -> Result<Json<DataResponse<Vec<Tryout>>>, ApiError> {
    let data = state
        .repos
        .tryout
        .list_tryouts(program_id, query.active_only.unwrap_or(false))
        .await?;

    Ok(Json(DataResponse { data }))
}

/// GET /programs/tryout/detail/{id}
pub async fn tryout_detail(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Tryout>, ApiError> {
    Ok(Json(load_tryout(&state, id).await?))
}

/// Tryout 及其题目（不含正确答案）
///
/// GET /programs/soali/{soal_id}
pub async fn tryout_with_questions(
    State(state): State<AppState>,
    ApiPath(soal_id): ApiPath<i64>,
) -> Result<Json<TryoutWithQuestions>, ApiError> {
    let tryout = load_tryout(&state, soal_id).await?;
    let questions = state.repos.tryout.list_questions(soal_id).await?;

    Ok(Json(TryoutWithQuestions {
        tryout,
        questions: questions.iter().map(ProgramQuestionView::from).collect(),
    }))
}

/// 提交项目题库答案并按百分制评分
///
/// POST /programs/answers
pub async fn submit_program_answers(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<SubmitAnswersRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    req.validate()?;

    let answers = req.answers.as_deref().ok_or_else(|| {
        ApiError::Validation("user_id, soal_id, dan answers wajib diisi".into())
    })?;
    let tryout_id = req.parse_soal_id()?;
    let user_id = resolve_user_id(current, req.user_id)?;

    let questions = state.repos.tryout.list_questions(tryout_id).await?;
    let key: Vec<(i64, &str)> = questions
        .iter()
        .map(|q| (q.id, q.correct_answer.as_str()))
        .collect();
    let result =
        percentage_score(&key, answers).ok_or(ApiError::QuestionsNotFound(tryout_id))?;

    state
        .repos
        .tryout
        .create_history(NewProgramHistory {
            user_id,
            tryout_id,
            score: result.score,
            answers: serde_json::to_value(answers)?,
        })
        .await?;

    metrics::record_answer_submission("program", "saved", Some(result.score as f64));
    info!(user_id, tryout_id, score = result.score, "项目题库答案已提交");

    Ok(Json(ScoreResponse {
        message: "Jawaban berhasil disimpan".to_string(),
        score: result.score,
    }))
}

/// 项目题库作答历史
///
/// GET /programs/historya/{soal_id}?user_id
pub async fn program_histories(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(soal_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<ProgramHistoryWithTryout>>, ApiError> {
    let user_id = resolve_user_id(current, query.user_id)?;

    let histories = state
        .repos
        .tryout
        .list_histories_with_tryout(user_id, soal_id)
        .await?;
    if histories.is_empty() {
        return Err(ApiError::HistoryNotFound);
    }

    Ok(Json(histories))
}

/// 项目题库答案解析
///
/// GET /programs/soal/kunci_jawaban/{id}
pub async fn program_answer_key(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ProgramAnswerKey>, ApiError> {
    let tryout = load_tryout(&state, id).await?;
    let questions = state.repos.tryout.list_questions(id).await?;

    let answers = questions
        .iter()
        .map(|q| ProgramAnswerKeyItem {
            id: q.id,
            question: q.question_text.clone(),
            correct: q.correct_answer.clone(),
            options: q.options(),
        })
        .collect();

    Ok(Json(ProgramAnswerKey {
        soal_id: tryout.id,
        title: tryout.name,
        answers,
    }))
}

// ==================== Tryout 成绩 ====================

/// 提交一次 Tryout
///
/// POST /tryouts/{id}/submit
pub async fn submit_tryout(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(tryout_id): ApiPath<i64>,
    ApiJson(req): ApiJson<SubmitTryoutRequest>,
) -> Result<Json<ApiResponse<TryoutSubmitResponse>>, ApiError> {
    req.validate()?;
    let user_id = resolve_user_id(current, req.user_id)?;

    let submitted = state
        .repos
        .tryout
        .submit_attempt(user_id, tryout_id, req.answers)
        .await?;

    metrics::record_answer_submission(
        "tryout",
        "submitted",
        Some(submitted.summary.percentage),
    );

    Ok(Json(ApiResponse::success_with_message(
        TryoutSubmitResponse {
            attempt_number: submitted.attempt_number,
            summary: submitted.summary,
        },
        "Tryout berhasil dikumpulkan",
    )))
}

/// 历次提交概览，按 attempt_number 升序
///
/// GET /tryouts/{id}/attempts?user_id
pub async fn list_attempts(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(tryout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<ApiResponse<Vec<AttemptOverview>>>, ApiError> {
    let user_id = resolve_user_id(current, query.user_id)?;

    let results = state.repos.tryout.list_results(user_id, tryout_id).await?;
    let attempts = group_by_attempt(&results)
        .into_iter()
        .map(|(attempt_number, rows)| {
            let summary = summarize_tryout(rows.iter().map(|r| {
                AnswerStatus::classify(r.user_answer.as_deref(), &r.correct_answer)
            }));
            AttemptOverview::new(attempt_number, &summary)
        })
        .collect();

    Ok(Json(ApiResponse::success(attempts)))
}

/// 单次提交的逐题成绩，缺省取最近一次
///
/// GET /tryouts/{id}/results?user_id&attempt
pub async fn attempt_results(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(tryout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<TryoutResultQuery>,
) -> Result<Json<ApiResponse<TryoutResultResponse>>, ApiError> {
    let user_id = resolve_user_id(current, query.user_id)?;

    let results = state.repos.tryout.list_results(user_id, tryout_id).await?;
    let grouped = group_by_attempt(&results);

    let selected = match query.attempt {
        Some(n) => grouped.get_key_value(&n),
        None => grouped.last_key_value(),
    };
    let Some((&attempt_number, rows)) = selected else {
        return Err(ApiError::NotFound("Hasil tryout tidak ditemukan".into()));
    };

    let questions = state.repos.tryout.list_questions(tryout_id).await?;
    let graded = grade_attempt(&questions, rows);
    let summary = summarize_tryout(graded.iter().map(|q| q.status));

    Ok(Json(ApiResponse::success(TryoutResultResponse {
        attempt_number,
        summary,
        questions: graded,
    })))
}

/// 答案解析，至少提交过一次才可查看
///
/// GET /tryouts/{id}/answer-key?user_id
pub async fn tryout_answer_key(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(tryout_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<ApiResponse<TryoutAnswerKeyResponse>>, ApiError> {
    let user_id = resolve_user_id(current, query.user_id)?;
    let tryout = load_tryout(&state, tryout_id).await?;

    let results = state.repos.tryout.list_results(user_id, tryout_id).await?;
    let grouped = group_by_attempt(&results);
    let Some((&attempt_number, rows)) = grouped.last_key_value() else {
        return Err(ApiError::NotCompleted);
    };

    let questions = state.repos.tryout.list_questions(tryout_id).await?;

    Ok(Json(ApiResponse::success(TryoutAnswerKeyResponse {
        tryout_id: tryout.id,
        name: tryout.name,
        attempt_number,
        questions: grade_attempt(&questions, rows),
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use mockall::predicate::*;
    use serde_json::json;

    use crate::models::{NewProgramHistory, SubmittedAttempt, TryoutAnswerInput};
    use crate::scoring::{AnswerStatus, summarize_tryout};
    use crate::test_support::{
        MockRepos, get, json_request, program_history, send, tryout, tryout_question,
        tryout_result,
    };

    #[tokio::test]
    async fn test_list_tryouts_active_only() {
        let mut repos = MockRepos::new();
        repos
            .tryout
            .expect_list_tryouts()
            .with(eq(3), eq(true))
            .returning(|program_id, _| Ok(vec![tryout(1, program_id)]));

        let (status, body) =
            send(repos.into_app(), get("/programs/tryout/3?active_only=true")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["program_id"], 3);
    }

    #[tokio::test]
    async fn test_tryout_detail_not_found() {
        let mut repos = MockRepos::new();
        repos.tryout.expect_get_tryout().returning(|_| Ok(None));

        let (status, body) = send(repos.into_app(), get("/programs/tryout/detail/9")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "TRYOUT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_soali_hides_correct_answers() {
        let mut repos = MockRepos::new();
        repos
            .tryout
            .expect_get_tryout()
            .returning(|id| Ok(Some(tryout(id, 1))));
        repos
            .tryout
            .expect_list_questions()
            .returning(|tryout_id| Ok(vec![tryout_question(1, tryout_id, "b")]));

        let (status, body) = send(repos.into_app(), get("/programs/soali/4")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 4);
        let question = &body["questions"][0];
        assert!(question.get("correct_answer").is_none());
        assert_eq!(question["options"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_submit_program_answers() {
        let mut repos = MockRepos::new();
        repos.tryout.expect_list_questions().with(eq(4)).returning(|tryout_id| {
            Ok(vec![
                tryout_question(1, tryout_id, "a"),
                tryout_question(2, tryout_id, "b"),
            ])
        });
        repos
            .tryout
            .expect_create_history()
            .withf(|h: &NewProgramHistory| h.user_id == 7 && h.tryout_id == 4 && h.score == 50)
            .times(1)
            .returning(|h| Ok(program_history(1, h.user_id, h.tryout_id, h.score)));

        let (status, body) = send(
            repos.into_app(),
            json_request(
                Method::POST,
                "/programs/answers",
                json!({
                    "user_id": 7,
                    "soal_id": 4,
                    "answers": [
                        {"question_id": 1, "chosen": "A"},
                        {"question_id": 2, "chosen": "c"}
                    ]
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 50);
    }

    #[tokio::test]
    async fn test_program_histories_empty() {
        let mut repos = MockRepos::new();
        repos
            .tryout
            .expect_list_histories_with_tryout()
            .returning(|_, _| Ok(vec![]));

        let (status, _) = send(repos.into_app(), get("/programs/historya/4?user_id=7")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            send(MockRepos::new().into_app(), get("/programs/historya/4")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "USER_ID_REQUIRED");
    }

    #[tokio::test]
    async fn test_program_answer_key() {
        let mut repos = MockRepos::new();
        repos
            .tryout
            .expect_get_tryout()
            .returning(|id| Ok(Some(tryout(id, 1))));
        repos
            .tryout
            .expect_list_questions()
            .returning(|tryout_id| Ok(vec![tryout_question(1, tryout_id, "d")]));
        let app = repos.into_app();

        let (status, body) = send(app.clone(), get("/programs/soal/kunci_jawaban/4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["soalId"], 4);
        assert_eq!(body["answers"][0]["correct"], "d");

        let (status, _) = send(app, get("/programs/soal/kunci_jawaban/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_submit_tryout() {
        let mut repos = MockRepos::new();
        repos
            .tryout
            .expect_submit_attempt()
            .withf(|user_id, tryout_id, answers: &Vec<TryoutAnswerInput>| {
                *user_id == 7 && *tryout_id == 4 && answers.len() == 2
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(SubmittedAttempt {
                    attempt_number: 2,
                    results: vec![],
                    summary: summarize_tryout([AnswerStatus::Correct, AnswerStatus::Wrong]),
                })
            });

        let (status, body) = send(
            repos.into_app(),
            json_request(
                Method::POST,
                "/tryouts/4/submit",
                json!({
                    "user_id": 7,
                    "answers": [
                        {"question_id": 1, "user_answer": "a"},
                        {"question_id": 2, "user_answer": null}
                    ]
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["attempt_number"], 2);
        assert_eq!(body["data"]["summary"]["score"], 3);
        assert_eq!(body["data"]["summary"]["max_score"], 8);
    }

    #[tokio::test]
    async fn test_attempts_grouped_ascending() {
        let mut repos = MockRepos::new();
        repos.tryout.expect_list_results().returning(|user_id, tryout_id| {
            Ok(vec![
                tryout_result(1, user_id, tryout_id, 1, 1, Some("a"), "a"),
                tryout_result(2, user_id, tryout_id, 1, 2, None, "b"),
                tryout_result(3, user_id, tryout_id, 2, 1, Some("a"), "a"),
                tryout_result(4, user_id, tryout_id, 2, 2, Some("b"), "b"),
            ])
        });

        let (status, body) = send(repos.into_app(), get("/tryouts/4/attempts?user_id=7")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!([
                {"attempt_number": 1, "correct": 1, "wrong": 0, "empty": 1, "score": 4},
                {"attempt_number": 2, "correct": 2, "wrong": 0, "empty": 0, "score": 8}
            ])
        );
    }

    #[tokio::test]
    async fn test_results_default_to_latest_attempt() {
        let mut repos = MockRepos::new();
        repos.tryout.expect_list_results().returning(|user_id, tryout_id| {
            Ok(vec![
                tryout_result(1, user_id, tryout_id, 1, 1, Some("b"), "a"),
                tryout_result(2, user_id, tryout_id, 2, 1, Some("a"), "a"),
            ])
        });
        repos
            .tryout
            .expect_list_questions()
            .returning(|tryout_id| Ok(vec![tryout_question(1, tryout_id, "a")]));
        let app = repos.into_app();

        let (status, body) = send(app.clone(), get("/tryouts/4/results?user_id=7")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["attempt_number"], 2);
        assert_eq!(body["data"]["questions"][0]["status"], "correct");

        let (status, body) = send(app.clone(), get("/tryouts/4/results?user_id=7&attempt=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["questions"][0]["status"], "wrong");
        assert_eq!(body["data"]["summary"]["score"], -1);

        let (status, _) = send(app, get("/tryouts/4/results?user_id=7&attempt=9")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_answer_key_requires_completed_attempt() {
        let mut repos = MockRepos::new();
        repos
            .tryout
            .expect_get_tryout()
            .returning(|id| Ok(Some(tryout(id, 1))));
        repos.tryout.expect_list_results().returning(|_, _| Ok(vec![]));

        let (status, body) = send(repos.into_app(), get("/tryouts/4/answer-key?user_id=7")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "NOT_COMPLETED");
    }

    #[tokio::test]
    async fn test_results_ignore_questions_added_after_submission() {
        let mut repos = MockRepos::new();
        repos.tryout.expect_list_results().returning(|user_id, tryout_id| {
            Ok(vec![tryout_result(1, user_id, tryout_id, 1, 1, Some("a"), "a")])
        });
        repos.tryout.expect_list_questions().returning(|tryout_id| {
            Ok(vec![
                tryout_question(1, tryout_id, "a"),
                tryout_question(2, tryout_id, "b"),
            ])
        });
        let app = repos.into_app();

        let (status, overview) = send(app.clone(), get("/tryouts/4/attempts?user_id=7")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(app, get("/tryouts/4/results?user_id=7&attempt=1")).await;
        assert_eq!(status, StatusCode::OK);

        let summary = &body["data"]["summary"];
        assert_eq!(body["data"]["questions"].as_array().map(Vec::len), Some(1));
        assert_eq!(summary["correct"], overview["data"][0]["correct"]);
        assert_eq!(summary["empty"], overview["data"][0]["empty"]);
        assert_eq!(summary["score"], overview["data"][0]["score"]);
        assert_eq!(summary["empty"], 0);
        assert_eq!(summary["max_score"], 4);
    }

    #[tokio::test]
    async fn test_answer_key_after_attempt() {
        let mut repos = MockRepos::new();
        repos
            .tryout
            .expect_get_tryout()
            .returning(|id| Ok(Some(tryout(id, 1))));
        repos.tryout.expect_list_results().returning(|user_id, tryout_id| {
            Ok(vec![tryout_result(1, user_id, tryout_id, 1, 1, Some("c"), "a")])
        });
        repos
            .tryout
            .expect_list_questions()
            .returning(|tryout_id| Ok(vec![tryout_question(1, tryout_id, "a")]));

        let (status, body) = send(repos.into_app(), get("/tryouts/4/answer-key?user_id=7")).await;

        assert_eq!(status, StatusCode::OK);
        let question = &body["data"]["questions"][0];
        assert_eq!(question["correct_answer"], "a");
        assert_eq!(question["user_answer"], "c");
        assert_eq!(question["is_correct"], false);
    }
}
