//! Tryout 服务
//!
//! 为在线模拟考试平台提供 REST API。
//!
//! ## 核心功能
//!
//! - **题库**：题组、题目、选项的查询，整套提交按百分制评分
//! - **限时作答**：服务端计时的作答会话，逐题保存答案，交卷评分
//! - **作答历史**：按用户和题组查询历史成绩
//! - **评分反馈**：对题组打分并留言
//! - **项目**：项目目录、日程、资料、报名码报名
//! - **Tryout**：项目下的模拟考试，按 +4 / -1 / 0 计分，可多次提交
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `models`: 与数据库表对应的实体
//! - `repository`: 数据访问层（trait + PostgreSQL 实现）
//! - `scoring` / `pagination`: 纯计算逻辑
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态

pub mod auth;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod routes;
pub mod scoring;
pub mod state;

/// 服务名，用于配置加载、日志和指标
pub const SERVICE_NAME: &str = "tryout-service";

pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::{AppState, Repositories};
