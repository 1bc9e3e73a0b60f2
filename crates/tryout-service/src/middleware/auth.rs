//! Token 认证中间件
//!
//! 校验 Bearer Token 并将当前用户注入请求扩展。未携带 Token 的请求
//! 按匿名处理，除非配置要求强制认证。

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// 无需认证的路由
const PUBLIC_PATHS: [&str; 3] = ["/", "/health", "/ready"];

/// 已认证用户
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// 当前请求的用户（匿名请求为 None）
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthUser>().copied()))
    }
}

/// 认证中间件
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let Some(verifier) = state.jwt_verifier.as_ref() else {
        return next.run(request).await;
    };

    match token {
        Some(token) => {
            let user_id = match verifier.verify(token) {
                Ok(claims) => claims.user_id(),
                Err(e) => return e.into_response(),
            };
            let Some(user_id) = user_id else {
                return ApiError::Unauthorized("Token tidak memuat user id".to_string())
                    .into_response();
            };
            request.extensions_mut().insert(AuthUser { user_id });
            next.run(request).await
        }
        None if state.auth_required => {
            ApiError::Unauthorized("Token diperlukan".to_string()).into_response()
        }
        None => next.run(request).await,
    }
}

/// 确定本次操作的用户 ID
///
/// 已认证时请求中携带的 user_id 必须与 Token 一致，缺省则取 Token 中的值；
/// 匿名请求必须显式携带 user_id。
pub fn resolve_user_id(current: CurrentUser, supplied: Option<i64>) -> Result<i64> {
    match (current.0, supplied) {
        (Some(user), Some(id)) if user.user_id != id => Err(ApiError::Forbidden(
            "user_id tidak sesuai dengan token".to_string(),
        )),
        (Some(user), _) => Ok(user.user_id),
        (None, Some(id)) => Ok(id),
        (None, None) => Err(ApiError::MissingUserId),
    }
}
