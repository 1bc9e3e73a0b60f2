//! 仓储 Trait 定义

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    ExamAttempt, Feedback, FinishOutcome, History, HistoryWithSoal, Material, NewFeedback,
    NewHistory, NewProgramHistory, Program, ProgramHistory, ProgramHistoryWithTryout, Question,
    QuestionOption, Registration, Schedule, SoalDetail, SubmittedAttempt, Tryout,
    TryoutAnswerInput, TryoutQuestion, TryoutResult, UserAnswer,
};

/// 题库仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SoalRepositoryTrait: Send + Sync {
    // 题组
    async fn list_soal(
        &self,
        category_id: Option<i64>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<SoalDetail>>;
    async fn count_soal(&self, category_id: Option<i64>) -> Result<i64>;
    async fn get_soal(&self, id: i64) -> Result<Option<SoalDetail>>;

    // 题目与选项
    async fn list_questions(&self, soal_id: i64) -> Result<Vec<Question>>;
    async fn list_options(&self, question_ids: &[i64]) -> Result<Vec<QuestionOption>>;

    // 作答历史
    async fn create_history(&self, history: NewHistory) -> Result<History>;
    async fn find_latest_history(&self, user_id: i64, soal_id: i64) -> Result<Option<History>>;
    async fn list_histories(&self, user_id: i64, soal_id: i64) -> Result<Vec<History>>;
    async fn list_histories_with_soal(
        &self,
        user_id: i64,
        soal_id: i64,
    ) -> Result<Vec<HistoryWithSoal>>;
    async fn list_histories_below(&self, score: i32) -> Result<Vec<HistoryWithSoal>>;

    // 评分反馈
    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback>;
    async fn list_feedback(&self, soal_id: i64) -> Result<Vec<Feedback>>;
}

/// 限时作答仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExamRepositoryTrait: Send + Sync {
    /// 返回用户在该题组下未交卷的会话，没有则新建
    async fn start_or_resume(
        &self,
        user_id: i64,
        soal_id: i64,
        duration_minutes: i32,
    ) -> Result<ExamAttempt>;
    async fn get_attempt(&self, id: i64) -> Result<Option<ExamAttempt>>;
    async fn question_in_soal(&self, question_id: i64, soal_id: i64) -> Result<bool>;
    async fn list_answers(&self, attempt_id: i64) -> Result<Vec<UserAnswer>>;
    async fn find_latest_answer(
        &self,
        user_id: i64,
        soal_id: i64,
        question_id: i64,
    ) -> Result<Option<UserAnswer>>;
    async fn upsert_answer(
        &self,
        attempt_id: i64,
        user_id: i64,
        question_id: i64,
        answer: &str,
    ) -> Result<UserAnswer>;
    async fn delete_answer(&self, attempt_id: i64, question_id: i64) -> Result<bool>;
    /// 在单个事务中评分、交卷并写入历史
    async fn finish_attempt(&self, attempt_id: i64) -> Result<FinishOutcome>;
}

/// 项目仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgramRepositoryTrait: Send + Sync {
    async fn count_programs(&self) -> Result<i64>;
    async fn list_programs(&self, offset: i64, limit: i64) -> Result<Vec<Program>>;
    async fn get_program(&self, id: i64) -> Result<Option<Program>>;
    async fn list_schedules(&self, program_id: i64) -> Result<Vec<Schedule>>;
    async fn list_materials(&self, program_id: i64) -> Result<Vec<Material>>;
    async fn record_activity(&self, user_id: i64, program_id: i64, activity_type: &str)
    -> Result<()>;
    async fn is_registered(&self, user_id: i64, program_id: i64) -> Result<bool>;
    /// 在单个事务中核销报名码并写入报名记录
    async fn register_with_ticket(
        &self,
        user_id: i64,
        program_id: i64,
        ticket_code: &str,
    ) -> Result<Registration>;
}

/// Tryout 仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TryoutRepositoryTrait: Send + Sync {
    async fn list_tryouts(&self, program_id: i64, active_only: bool) -> Result<Vec<Tryout>>;
    async fn get_tryout(&self, id: i64) -> Result<Option<Tryout>>;
    async fn list_questions(&self, tryout_id: i64) -> Result<Vec<TryoutQuestion>>;
    async fn create_history(&self, history: NewProgramHistory) -> Result<ProgramHistory>;
    async fn list_histories_with_tryout(
        &self,
        user_id: i64,
        tryout_id: i64,
    ) -> Result<Vec<ProgramHistoryWithTryout>>;
    /// 分配下一个 attempt_number 并逐题写入结果
    async fn submit_attempt(
        &self,
        user_id: i64,
        tryout_id: i64,
        answers: Vec<TryoutAnswerInput>,
    ) -> Result<SubmittedAttempt>;
    /// 用户在该 Tryout 下的全部结果行，按 attempt_number、question_id 排序
    async fn list_results(&self, user_id: i64, tryout_id: i64) -> Result<Vec<TryoutResult>>;
}
