//! HTTP 请求处理器模块

pub mod exam;
pub mod feedback;
pub mod history;
pub mod misc;
pub mod program;
pub mod soal;
pub mod tryout;
