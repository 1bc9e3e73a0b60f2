//! 认证模块
//!
//! Token 由外部认证服务签发，这里只负责校验。

pub mod jwt;

pub use jwt::{Claims, ClaimsUser, JwtVerifier};
