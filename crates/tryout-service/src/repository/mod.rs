//! 数据访问层
//!
//! 每个仓储对外暴露 trait，handler 只依赖 trait，便于 mock 测试。

mod exam_repo;
mod program_repo;
mod soal_repo;
mod traits;
mod tryout_repo;

pub use exam_repo::ExamRepository;
pub use program_repo::ProgramRepository;
pub use soal_repo::SoalRepository;
pub use traits::{
    ExamRepositoryTrait, ProgramRepositoryTrait, SoalRepositoryTrait, TryoutRepositoryTrait,
};
pub use tryout_repo::TryoutRepository;

#[cfg(test)]
pub use traits::{
    MockExamRepositoryTrait, MockProgramRepositoryTrait, MockSoalRepositoryTrait,
    MockTryoutRepositoryTrait,
};
