//! 应用状态定义

use std::sync::Arc;

use sqlx::PgPool;
use tryout_shared::config::AuthConfig;

use crate::auth::JwtVerifier;
use crate::repository::{
    ExamRepository, ExamRepositoryTrait, ProgramRepository, ProgramRepositoryTrait,
    SoalRepository, SoalRepositoryTrait, TryoutRepository, TryoutRepositoryTrait,
};

/// 仓储集合
#[derive(Clone)]
pub struct Repositories {
    pub soal: Arc<dyn SoalRepositoryTrait>,
    pub exam: Arc<dyn ExamRepositoryTrait>,
    pub program: Arc<dyn ProgramRepositoryTrait>,
    pub tryout: Arc<dyn TryoutRepositoryTrait>,
}

impl Repositories {
    /// 基于 PostgreSQL 连接池创建全部仓储
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            soal: Arc::new(SoalRepository::new(pool.clone())),
            exam: Arc::new(ExamRepository::new(pool.clone())),
            program: Arc::new(ProgramRepository::new(pool.clone())),
            tryout: Arc::new(TryoutRepository::new(pool)),
        }
    }
}

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    /// 未配置密钥时为 None，Token 不做校验
    pub jwt_verifier: Option<Arc<JwtVerifier>>,
    pub auth_required: bool,
}

impl AppState {
    pub fn new(pool: PgPool, auth: &AuthConfig) -> Self {
        Self::with_repositories(Repositories::postgres(pool), auth)
    }

    pub fn with_repositories(repos: Repositories, auth: &AuthConfig) -> Self {
        Self {
            repos,
            jwt_verifier: JwtVerifier::from_config(auth).map(Arc::new),
            auth_required: auth.required,
        }
    }
}
