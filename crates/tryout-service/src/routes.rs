//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射。同一路径位置的参数统一命名为 `{id}`。

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::{
    handlers,
    middleware::{auth_middleware, security_headers},
    state::AppState,
};

/// 独立题库：题组、提交、历史、评分
fn soal_routes() -> Router<AppState> {
    Router::new()
        // 题组
        .route("/api/soal", get(handlers::soal::list_soal))
        .route("/api/soal/{id}", get(handlers::soal::get_soal))
        .route(
            "/api/soali/{id}",
            get(handlers::soal::get_soal_with_questions),
        )
        .route(
            "/api/soal/kunci_jawaban/{id}",
            get(handlers::soal::answer_key),
        )
        .route("/api/answers", post(handlers::soal::submit_answers))
        // 作答历史
        .route(
            "/api/riwayat/{id}",
            get(handlers::history::latest_history),
        )
        .route("/api/history", get(handlers::history::list_history))
        .route(
            "/api/historya/{id}",
            get(handlers::history::list_history_with_soal),
        )
        .route("/api/historyall", get(handlers::history::list_low_scores))
        // 评分与反馈
        .route(
            "/api/soal/rating/{id}",
            post(handlers::feedback::rate_soal),
        )
        .route("/submit-rating", post(handlers::feedback::submit_rating))
        .route("/feedback/{id}", get(handlers::feedback::list_feedback))
        .route("/rating/{id}", post(handlers::feedback::rate_soal_as_user))
}

/// 限时作答
fn exam_routes() -> Router<AppState> {
    Router::new()
        .route("/student/exam/{id}/start", post(handlers::exam::start_exam))
        .route(
            "/student/exam/{id}/answer/{question_id}",
            get(handlers::exam::get_answer),
        )
        .route(
            "/student/exam/{id}/answer/insert",
            post(handlers::exam::save_answer),
        )
        .route(
            "/student/exam/{id}/answer/update",
            patch(handlers::exam::save_answer),
        )
        .route(
            "/student/exam/{id}/answer/delete",
            delete(handlers::exam::delete_answer),
        )
        .route(
            "/student/exam/{id}/finish",
            post(handlers::exam::finish_exam),
        )
}

/// 项目目录、项目题库与 Tryout 成绩
fn program_routes() -> Router<AppState> {
    Router::new()
        // 项目
        .route("/programs", get(handlers::program::list_programs))
        .route("/programs/{id}", get(handlers::program::get_program))
        .route(
            "/programs/{id}/agenda",
            get(handlers::program::program_agenda),
        )
        .route(
            "/programs/{id}/register",
            post(handlers::program::register_program),
        )
        .route(
            "/programs/{id}/registration",
            get(handlers::program::registration_status),
        )
        .route("/materi/{id}", get(handlers::program::program_materials))
        // 项目题库
        .route("/programs/tryout/{id}", get(handlers::tryout::list_tryouts))
        .route(
            "/programs/tryout/detail/{id}",
            get(handlers::tryout::tryout_detail),
        )
        .route(
            "/programs/soali/{id}",
            get(handlers::tryout::tryout_with_questions),
        )
        .route(
            "/programs/answers",
            post(handlers::tryout::submit_program_answers),
        )
        .route(
            "/programs/historya/{id}",
            get(handlers::tryout::program_histories),
        )
        .route(
            "/programs/soal/kunci_jawaban/{id}",
            get(handlers::tryout::program_answer_key),
        )
        // Tryout 成绩
        .route("/tryouts/{id}/submit", post(handlers::tryout::submit_tryout))
        .route(
            "/tryouts/{id}/attempts",
            get(handlers::tryout::list_attempts),
        )
        .route(
            "/tryouts/{id}/results",
            get(handlers::tryout::attempt_results),
        )
        .route(
            "/tryouts/{id}/answer-key",
            get(handlers::tryout::tryout_answer_key),
        )
}

/// 全部业务路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(soal_routes())
        .merge(exam_routes())
        .merge(program_routes())
}

/// 构建应用路由（不含 CORS、压缩、超时等外层中间件）
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::misc::welcome))
        .route("/health", get(handlers::misc::health_check))
        .merge(api_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}
