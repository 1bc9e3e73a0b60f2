//! 请求 DTO 定义

use serde::Deserialize;
use validator::Validate;

use crate::error::{ApiError, Result};
use crate::models::TryoutAnswerInput;
use crate::scoring::ChosenAnswer;

/// 题组列表查询参数
#[derive(Debug, Default, Deserialize)]
pub struct SoalListQuery {
    pub page: Option<i64>,
    #[serde(rename = "perPage")]
    pub per_page: Option<i64>,
    pub category_id: Option<i64>,
}

/// 仅携带 user_id 的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<i64>,
}

/// `/api/history` 查询参数
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub user_id: Option<i64>,
    #[serde(rename = "soalId")]
    pub soal_id: Option<i64>,
}

/// 提交整套答案
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswersRequest {
    pub user_id: Option<i64>,
    /// 数字或数字字符串
    pub soal_id: Option<serde_json::Value>,
    #[validate(length(max = 1000, message = "Jawaban terlalu banyak"))]
    pub answers: Option<Vec<ChosenAnswer>>,
}

impl SubmitAnswersRequest {
    /// 解析 soal_id，缺失或非数字返回 400
    pub fn parse_soal_id(&self) -> Result<i64> {
        let value = self.soal_id.as_ref().ok_or_else(|| {
            ApiError::Validation("user_id, soal_id, dan answers wajib diisi".into())
        })?;

        let parsed = match value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };

        parsed
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::Validation("soal_id tidak valid".into()))
    }
}

/// 匿名评分
#[derive(Debug, Deserialize, Validate)]
pub struct SoalRatingRequest {
    #[validate(range(min = 1, max = 5, message = "Rating harus antara 1 dan 5"))]
    pub rating: Option<i32>,
    #[validate(length(max = 2000, message = "Feedback maksimal 2000 karakter"))]
    pub feedback: Option<String>,
}

/// `/submit-rating` 请求体
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRatingRequest {
    pub soal_id: Option<i64>,
    pub user_id: Option<i64>,
    #[validate(range(min = 1, max = 5, message = "Rating harus antara 1 dan 5"))]
    pub rating: Option<i32>,
    #[validate(length(max = 2000, message = "Feedback maksimal 2000 karakter"))]
    pub feedback: Option<String>,
}

/// `/rating/{id}` 请求体
#[derive(Debug, Deserialize, Validate)]
pub struct UserRatingRequest {
    pub user_id: Option<i64>,
    #[validate(range(min = 1, max = 5, message = "Rating harus antara 1 dan 5"))]
    pub rating: Option<i32>,
    #[validate(length(max = 2000, message = "Feedback maksimal 2000 karakter"))]
    pub feedback: Option<String>,
}

/// 开始或继续限时作答
#[derive(Debug, Default, Deserialize)]
pub struct StartExamRequest {
    pub user_id: Option<i64>,
}

/// 保存单题答案（新增与修改共用）
#[derive(Debug, Deserialize, Validate)]
pub struct SaveAnswerRequest {
    /// 客户端持有的答案 ID，仅作参考，以 (attemption_id, question_id) 为准
    pub answer_id: Option<i64>,
    pub user_id: Option<i64>,
    pub question_id: i64,
    #[validate(length(min = 1, max = 16, message = "Jawaban tidak valid"))]
    pub answer: String,
    pub attemption_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAnswerRequest {
    pub answer_id: Option<i64>,
    pub user_id: Option<i64>,
    pub question_id: i64,
    pub attemption_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct FinishExamRequest {
    pub user_id: Option<i64>,
    pub attemption_id: i64,
}

/// 项目列表查询参数，非法值回退为默认值
#[derive(Debug, Default, Deserialize)]
pub struct ProgramListQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TryoutListQuery {
    pub active_only: Option<bool>,
}

/// 使用报名码报名项目
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterProgramRequest {
    pub user_id: Option<i64>,
    #[validate(length(min = 1, max = 64, message = "Kode tiket wajib diisi"))]
    pub ticket_code: String,
}

/// 提交 Tryout
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitTryoutRequest {
    pub user_id: Option<i64>,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Jawaban terlalu banyak"))]
    pub answers: Vec<TryoutAnswerInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TryoutResultQuery {
    pub user_id: Option<i64>,
    /// 缺省取最近一次
    pub attempt: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(soal_id: serde_json::Value) -> SubmitAnswersRequest {
        serde_json::from_value(serde_json::json!({
            "user_id": 1,
            "soal_id": soal_id,
            "answers": [{"question_id": 1, "chosen": "a"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_soal_id_accepts_number_and_numeric_string() {
        assert_eq!(submit(serde_json::json!(12)).parse_soal_id().unwrap(), 12);
        assert_eq!(submit(serde_json::json!(" 12 ")).parse_soal_id().unwrap(), 12);
    }

    #[test]
    fn test_soal_id_rejects_garbage() {
        for value in [serde_json::json!("abc"), serde_json::json!(true), serde_json::json!(0)] {
            let err = submit(value).parse_soal_id().unwrap_err();
            assert_eq!(err.error_code(), "VALIDATION_ERROR");
        }
    }

    #[test]
    fn test_rating_bounds() {
        for (rating, ok) in [(0, false), (1, true), (5, true), (6, false)] {
            let req = UserRatingRequest {
                user_id: Some(1),
                rating: Some(rating),
                feedback: None,
            };
            assert_eq!(req.validate().is_ok(), ok, "rating={rating}");
        }
    }

    #[test]
    fn test_save_answer_requires_label() {
        let req = SaveAnswerRequest {
            answer_id: None,
            user_id: Some(1),
            question_id: 3,
            answer: String::new(),
            attemption_id: 9,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_query_renames() {
        let query: SoalListQuery =
            serde_json::from_value(serde_json::json!({"page": 2, "perPage": 5})).unwrap();
        assert_eq!(query.per_page, Some(5));

        let query: HistoryQuery =
            serde_json::from_value(serde_json::json!({"user_id": 1, "soalId": 4})).unwrap();
        assert_eq!(query.soal_id, Some(4));
    }
}
