//! 评分规则
//!
//! 题库按正确率计百分制分数；项目 Tryout 按 +4 / -1 / 0 计分。

use serde::{Deserialize, Serialize};

/// 提交的单题作答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub chosen: Option<String>,
}

/// 百分制评分结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentageScore {
    pub score: i32,
    pub correct: usize,
    pub total: usize,
}

/// 选项标签统一为去空白的小写形式
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

fn label_matches(chosen: Option<&str>, correct: &str) -> bool {
    match chosen.map(str::trim) {
        Some(c) if !c.is_empty() => c.eq_ignore_ascii_case(correct.trim()),
        _ => false,
    }
}

/// 按正确率计分：`round(100 × correct / total)`
///
/// `key` 为 (题目 ID, 正确选项)。同一题多次作答只取第一条。
/// 题目为空时返回 None。
pub fn percentage_score(key: &[(i64, &str)], answers: &[ChosenAnswer]) -> Option<PercentageScore> {
    if key.is_empty() {
        return None;
    }

    let correct = key
        .iter()
        .filter(|(question_id, expected)| {
            answers
                .iter()
                .find(|a| a.question_id == *question_id)
                .is_some_and(|a| label_matches(a.chosen.as_deref(), expected))
        })
        .count();

    let total = key.len();
    let score = (100.0 * correct as f64 / total as f64).round() as i32;

    Some(PercentageScore {
        score,
        correct,
        total,
    })
}

/// Tryout 单题判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    Correct,
    Wrong,
    Empty,
}

impl AnswerStatus {
    pub fn classify(user_answer: Option<&str>, correct_answer: &str) -> Self {
        match user_answer.map(str::trim) {
            None | Some("") => Self::Empty,
            Some(answer) if answer.eq_ignore_ascii_case(correct_answer.trim()) => Self::Correct,
            Some(_) => Self::Wrong,
        }
    }

    pub fn points(self) -> i32 {
        match self {
            Self::Correct => 4,
            Self::Wrong => -1,
            Self::Empty => 0,
        }
    }
}

/// Tryout 成绩汇总
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TryoutSummary {
    pub correct: u32,
    pub wrong: u32,
    pub empty: u32,
    pub score: i32,
    pub max_score: i32,
    pub percentage: f64,
}

pub fn summarize_tryout<I>(statuses: I) -> TryoutSummary
where
    I: IntoIterator<Item = AnswerStatus>,
{
    let (mut correct, mut wrong, mut empty) = (0u32, 0u32, 0u32);
    for status in statuses {
        match status {
            AnswerStatus::Correct => correct += 1,
            AnswerStatus::Wrong => wrong += 1,
            AnswerStatus::Empty => empty += 1,
        }
    }

    let score = correct as i32 * AnswerStatus::Correct.points()
        + wrong as i32 * AnswerStatus::Wrong.points();
    let max_score = (correct + wrong + empty) as i32 * AnswerStatus::Correct.points();
    let percentage = if max_score == 0 {
        0.0
    } else {
        (score as f64 / max_score as f64 * 10_000.0).round() / 100.0
    };

    TryoutSummary {
        correct,
        wrong,
        empty,
        score,
        max_score,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question_id: i64, chosen: &str) -> ChosenAnswer {
        ChosenAnswer {
            question_id,
            chosen: Some(chosen.to_string()),
        }
    }

    #[test]
    fn test_percentage_score_rounds() {
        let key = [(1, "a"), (2, "b"), (3, "c")];

        let all = percentage_score(&key, &[answer(1, "a"), answer(2, "b"), answer(3, "c")]).unwrap();
        assert_eq!(all.score, 100);

        let two = percentage_score(&key, &[answer(1, "a"), answer(2, "b"), answer(3, "d")]).unwrap();
        assert_eq!(two.score, 67);
        assert_eq!(two.correct, 2);

        let one = percentage_score(&key, &[answer(1, "a")]).unwrap();
        assert_eq!(one.score, 33);
    }

    #[test]
    fn test_percentage_score_property() {
        for total in 1..=12usize {
            let key: Vec<(i64, &str)> = (0..total as i64).map(|id| (id, "a")).collect();
            for correct in 0..=total {
                let answers: Vec<ChosenAnswer> = (0..total as i64)
                    .map(|id| answer(id, if (id as usize) < correct { "a" } else { "b" }))
                    .collect();
                let result = percentage_score(&key, &answers).unwrap();
                let expected = (100.0 * correct as f64 / total as f64).round() as i32;
                assert_eq!(result.score, expected, "total={total} correct={correct}");
            }
        }
    }

    #[test]
    fn test_percentage_score_empty_key() {
        assert!(percentage_score(&[], &[answer(1, "a")]).is_none());
    }

    #[test]
    fn test_first_matching_answer_wins() {
        let key = [(1, "a")];
        let result = percentage_score(&key, &[answer(1, "b"), answer(1, "a")]).unwrap();
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_label_comparison_ignores_case_and_whitespace() {
        let key = [(1, "c"), (2, "d")];
        let answers = vec![
            answer(1, " C "),
            ChosenAnswer {
                question_id: 2,
                chosen: None,
            },
        ];
        let result = percentage_score(&key, &answers).unwrap();
        assert_eq!(result.correct, 1);
        assert_eq!(result.score, 50);
    }

    #[test]
    fn test_unknown_questions_ignored() {
        let key = [(1, "a"), (2, "a")];
        let result = percentage_score(&key, &[answer(99, "a"), answer(2, "a")]).unwrap();
        assert_eq!(result.score, 50);
    }

    #[test]
    fn test_classify_answer() {
        assert_eq!(AnswerStatus::classify(Some("a"), "A"), AnswerStatus::Correct);
        assert_eq!(AnswerStatus::classify(Some("b"), "a"), AnswerStatus::Wrong);
        assert_eq!(AnswerStatus::classify(Some("  "), "a"), AnswerStatus::Empty);
        assert_eq!(AnswerStatus::classify(None, "a"), AnswerStatus::Empty);
    }

    #[test]
    fn test_summarize_tryout() {
        use AnswerStatus::*;
        let summary = summarize_tryout([Correct, Correct, Wrong, Empty]);

        assert_eq!(summary.correct, 2);
        assert_eq!(summary.wrong, 1);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.score, 7);
        assert_eq!(summary.max_score, 16);
        assert_eq!(summary.percentage, 43.75);
    }

    #[test]
    fn test_summarize_tryout_rounds_percentage_to_two_decimals() {
        use AnswerStatus::*;
        let summary = summarize_tryout([Correct, Empty, Empty]);
        assert_eq!(summary.score, 4);
        assert_eq!(summary.max_score, 12);
        assert_eq!(summary.percentage, 33.33);

        let summary = summarize_tryout([Wrong, Wrong]);
        assert_eq!(summary.score, -2);
        assert_eq!(summary.percentage, -25.0);
    }

    #[test]
    fn test_summarize_empty_tryout() {
        let summary = summarize_tryout(Vec::new());
        assert_eq!(summary.max_score, 0);
        assert_eq!(summary.percentage, 0.0);
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label(" B\n"), "b");
    }
}
