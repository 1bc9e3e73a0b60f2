//! 中间件模块
//!
//! 提供 Token 校验和 HTTP 安全头中间件

mod auth;
mod security;

pub use auth::{AuthUser, CurrentUser, auth_middleware, resolve_user_id};
pub use security::security_headers;
