//! 项目（Program）API 处理器
//!
//! 项目列表、详情、日程、资料，以及报名码报名。

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};
use tryout_shared::observability::metrics;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, ProgramListQuery, ProgramPage, RegisterProgramRequest, RegistrationStatus,
        StatusEnvelope, SuccessData, UserQuery,
    },
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::{CurrentUser, resolve_user_id},
    models::{Material, Program, Registration, Schedule},
    pagination::{DEFAULT_PROGRAM_PAGE_SIZE, PageRequest, total_pages},
    state::AppState,
};

/// 获取项目列表
///
/// GET /programs?page&page_size
pub async fn list_programs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProgramListQuery>,
) -> Result<Json<StatusEnvelope<ProgramPage>>, ApiError> {
    let page = PageRequest::lenient(
        query.page.as_deref(),
        query.page_size.as_deref(),
        DEFAULT_PROGRAM_PAGE_SIZE,
    );

    let total = state.repos.program.count_programs().await?;
    let programs = state
        .repos
        .program
        .list_programs(page.offset(), page.size)
        .await?;

    Ok(Json(StatusEnvelope::ok(
        "Berhasil mendapatkan list program",
        ProgramPage {
            page: page.page,
            page_size: page.size,
            total,
            total_pages: total_pages(total, page.size),
            programs,
        },
    )))
}

/// 获取项目详情，携带 user_id 时记录一次浏览
///
/// GET /programs/{id}?user_id
pub async fn get_program(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Response, ApiError> {
    let Some(program) = state.repos.program.get_program(id).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(StatusEnvelope::<Program>::not_found("Program tidak ditemukan")),
        )
            .into_response());
    };

    let viewer = current.0.map(|u| u.user_id).or(query.user_id);
    if let Some(user_id) = viewer {
        // 浏览记录失败不影响响应
        if let Err(e) = state
            .repos
            .program
            .record_activity(user_id, id, "view")
            .await
        {
            warn!(user_id, program_id = id, error = %e, "记录浏览行为失败");
        }
    }

    Ok(Json(StatusEnvelope::ok("Berhasil mendapatkan data program", program)).into_response())
}

/// 项目日程
///
/// GET /programs/{id}/agenda
pub async fn program_agenda(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<StatusEnvelope<Vec<Schedule>>>, ApiError> {
    let schedules = state.repos.program.list_schedules(id).await?;

    Ok(Json(StatusEnvelope::ok(
        "Berhasil mendapatkan agenda program",
        schedules,
    )))
}

/// 学习资料
///
/// GET /materi/{program_id}
pub async fn program_materials(
    State(state): State<AppState>,
    ApiPath(program_id): ApiPath<i64>,
) -> Result<Json<SuccessData<Vec<Material>>>, ApiError> {
    let data = state.repos.program.list_materials(program_id).await?;
    Ok(Json(SuccessData {
        success: true,
        data,
    }))
}

/// 使用报名码报名
///
/// POST /programs/{id}/register
pub async fn register_program(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(program_id): ApiPath<i64>,
    ApiJson(req): ApiJson<RegisterProgramRequest>,
) -> Result<Json<ApiResponse<Registration>>, ApiError> {
    req.validate()?;
    let user_id = resolve_user_id(current, req.user_id)?;

    let result = state
        .repos
        .program
        .register_with_ticket(user_id, program_id, req.ticket_code.trim())
        .await;

    match result {
        Ok(registration) => {
            metrics::record_registration("registered");
            info!(user_id, program_id, "项目报名成功");
            Ok(Json(ApiResponse::success_with_message(
                registration,
                "Pendaftaran program berhasil",
            )))
        }
        Err(e) => {
            metrics::record_registration(e.error_code());
            Err(e)
        }
    }
}

/// 查询报名状态
///
/// GET /programs/{id}/registration?user_id
pub async fn registration_status(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(program_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<ApiResponse<RegistrationStatus>>, ApiError> {
    let user_id = resolve_user_id(current, query.user_id)?;

    let registered = state
        .repos
        .program
        .is_registered(user_id, program_id)
        .await?;

    Ok(Json(ApiResponse::success(RegistrationStatus { registered })))
}
