//! 实体模型
//!
//! 与数据库表一一对应的结构体，字段名即 JSON 字段名。

mod attempt;
mod program;
mod soal;
mod tryout;

pub use attempt::{ExamAttempt, FinishOutcome, UserAnswer};
pub use program::{Material, Program, Registration, Schedule};
pub use soal::{
    Category, ExamCategory, Feedback, History, HistoryWithSoal, NewFeedback, NewHistory,
    OptionView, Question, QuestionOption, Soal, SoalDetail,
};
pub use tryout::{
    NewProgramHistory, ProgramHistory, ProgramHistoryWithTryout, SubmittedAttempt, Tryout,
    TryoutAnswerInput, TryoutQuestion, TryoutResult,
};
