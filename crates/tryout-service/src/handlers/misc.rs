use axum::Json;
use serde_json::{Value, json};

/// GET /
pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Selamat datang di API" }))
}

/// 存活探针
///
/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": crate::SERVICE_NAME
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_message() {
        let Json(body) = tokio_test::block_on(welcome());
        assert_eq!(body["message"], "Selamat datang di API");
    }

    #[test]
    fn test_health_reports_service_name() {
        let Json(body) = tokio_test::block_on(health_check());
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], crate::SERVICE_NAME);
    }
}
