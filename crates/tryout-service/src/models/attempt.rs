//! 限时作答会话

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 作答会话（Attemption）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExamAttempt {
    pub id: i64,
    pub user_id: i64,
    pub soal_id: i64,
    pub started_at: DateTime<Utc>,
    /// 截止时间（null 表示不限时）
    #[sqlx(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[sqlx(default)]
    pub score: Option<i32>,
}

impl ExamAttempt {
    /// 截止后仍接受写入的宽限时间
    pub const GRACE_SECONDS: i64 = 30;

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// 超过截止时间加宽限期即视为过期
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|t| now > t + Duration::seconds(Self::GRACE_SECONDS))
    }

    pub fn belongs_to(&self, user_id: i64, soal_id: i64) -> bool {
        self.user_id == user_id && self.soal_id == soal_id
    }
}

/// 会话中保存的单题答案
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAnswer {
    pub id: i64,
    pub attempt_id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub answer: String,
    pub submitted_at: DateTime<Utc>,
}

/// 交卷结果
#[derive(Debug, Clone)]
pub struct FinishOutcome {
    pub attempt: ExamAttempt,
    pub correct: i64,
    pub total: i64,
    /// 重复交卷时为 true，分数取首次结果
    pub already_finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(expires_at: Option<DateTime<Utc>>) -> ExamAttempt {
        ExamAttempt {
            id: 1,
            user_id: 7,
            soal_id: 3,
            started_at: Utc::now(),
            expires_at,
            finished_at: None,
            score: None,
        }
    }

    #[test]
    fn test_expiry_honours_grace_period() {
        let deadline = Utc::now();
        let a = attempt(Some(deadline));

        assert!(!a.is_expired(deadline + Duration::seconds(10)));
        assert!(!a.is_expired(deadline + Duration::seconds(30)));
        assert!(a.is_expired(deadline + Duration::seconds(31)));
    }

    #[test]
    fn test_untimed_attempt_never_expires() {
        let a = attempt(None);
        assert!(!a.is_expired(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn test_belongs_to() {
        let a = attempt(None);
        assert!(a.belongs_to(7, 3));
        assert!(!a.belongs_to(8, 3));
        assert!(!a.belongs_to(7, 4));
    }
}
