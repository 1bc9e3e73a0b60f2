//! 项目 Tryout 相关实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OptionView;
use crate::scoring::TryoutSummary;

/// 项目下的模拟考试
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tryout {
    pub id: i64,
    pub program_id: i64,
    pub name: String,
    pub is_active: bool,
    pub total_questions: i32,
    pub duration_minutes: i32,
    #[sqlx(default)]
    pub exam_category: Option<String>,
    pub is_free: bool,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

/// Tryout 题目，选项按列存储
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TryoutQuestion {
    pub id: i64,
    pub tryout_id: i64,
    pub question_text: String,
    #[sqlx(default)]
    pub option_a: Option<String>,
    #[sqlx(default)]
    pub option_b: Option<String>,
    #[sqlx(default)]
    pub option_c: Option<String>,
    #[sqlx(default)]
    pub option_d: Option<String>,
    #[sqlx(default)]
    pub option_e: Option<String>,
    pub correct_answer: String,
}

impl TryoutQuestion {
    /// 非空选项，按标签 a..e 排列
    pub fn options(&self) -> Vec<OptionView> {
        [
            ("a", &self.option_a),
            ("b", &self.option_b),
            ("c", &self.option_c),
            ("d", &self.option_d),
            ("e", &self.option_e),
        ]
        .into_iter()
        .filter_map(|(label, content)| {
            content.as_ref().map(|c| OptionView {
                label: label.to_string(),
                content: c.clone(),
            })
        })
        .collect()
    }
}

/// 项目题库作答历史
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProgramHistory {
    pub id: i64,
    pub user_id: i64,
    pub tryout_id: i64,
    pub score: i32,
    pub answers: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramHistoryWithTryout {
    #[serde(flatten)]
    pub history: ProgramHistory,
    pub soal: Tryout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProgramHistory {
    pub user_id: i64,
    pub tryout_id: i64,
    pub score: i32,
    pub answers: serde_json::Value,
}

/// Tryout 提交中的单题答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryoutAnswerInput {
    pub question_id: i64,
    #[serde(default)]
    pub user_answer: Option<String>,
}

/// 每次提交每道题一行
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TryoutResult {
    pub id: i64,
    pub user_id: i64,
    pub tryout_id: i64,
    pub attempt_number: i32,
    pub question_id: i64,
    #[sqlx(default)]
    pub user_answer: Option<String>,
    /// 提交时的正确答案快照
    pub correct_answer: String,
    pub created_at: DateTime<Utc>,
}

/// 提交结果
#[derive(Debug, Clone)]
pub struct SubmittedAttempt {
    pub attempt_number: i32,
    pub results: Vec<TryoutResult>,
    pub summary: TryoutSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_skip_missing_columns() {
        let question = TryoutQuestion {
            id: 1,
            tryout_id: 1,
            question_text: "2 + 2 = ?".into(),
            option_a: Some("3".into()),
            option_b: Some("4".into()),
            option_c: None,
            option_d: Some("5".into()),
            option_e: None,
            correct_answer: "b".into(),
        };

        let options = question.options();
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "d"]);
        assert_eq!(options[1].content, "4");
    }
}
