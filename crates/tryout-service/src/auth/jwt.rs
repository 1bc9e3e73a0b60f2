//! JWT Token 校验
//!
//! 只支持 HS256，密钥与认证服务共享。

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tryout_shared::config::AuthConfig;

use crate::error::ApiError;

/// Token 中嵌套的用户信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimsUser {
    /// 数字或字符串形式的用户 ID
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JWT Claims（Token 载荷）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub user: Option<ClaimsUser>,
    /// 过期时间（Unix 秒）
    pub exp: i64,
}

impl Claims {
    /// 解析数字用户 ID：优先 `sub`，其次 `user.id`
    pub fn user_id(&self) -> Option<i64> {
        if let Some(id) = self.sub.as_deref().and_then(|s| s.trim().parse().ok()) {
            return Some(id);
        }

        match self.user.as_ref()?.id.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// JWT 校验器
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// 根据配置创建校验器，未配置密钥时返回 None
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        let secret = config.jwt_secret.as_deref()?;
        Some(Self::new(secret, config.audience.as_deref()))
    }

    /// 验证并解析 Token
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("Token kedaluwarsa".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    ApiError::Unauthorized("Tanda tangan token tidak valid".to_string())
                }
                _ => ApiError::Unauthorized(format!("Token tidak valid: {}", e)),
            },
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "tryout-test-secret";

    fn sign(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        (Utc::now() + Duration::hours(1)).timestamp()
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = JwtVerifier::new(SECRET, None);
        let token = sign(&serde_json::json!({"sub": "15", "exp": future_exp()}), SECRET);

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.user_id(), Some(15));
    }

    #[test]
    fn test_token_with_audience_accepted_when_not_configured() {
        let verifier = JwtVerifier::new(SECRET, None);
        let token = sign(
            &serde_json::json!({"sub": "15", "aud": "authenticated", "exp": future_exp()}),
            SECRET,
        );
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn test_audience_mismatch_rejected() {
        let verifier = JwtVerifier::new(SECRET, Some("authenticated"));
        let token = sign(
            &serde_json::json!({"sub": "15", "aud": "anon", "exp": future_exp()}),
            SECRET,
        );
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = JwtVerifier::new(SECRET, None);
        let exp = (Utc::now() - Duration::hours(2)).timestamp();
        let token = sign(&serde_json::json!({"sub": "15", "exp": exp}), SECRET);

        let err = verifier.verify(&token).unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");
        assert!(err.to_string().contains("kedaluwarsa"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = JwtVerifier::new(SECRET, None);
        let token = sign(&serde_json::json!({"sub": "15", "exp": future_exp()}), "other-secret");
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let verifier = JwtVerifier::new(SECRET, None);
        assert!(verifier.verify("invalid.token.here").is_err());
    }

    #[test]
    fn test_user_id_falls_back_to_nested_user() {
        let claims = Claims {
            sub: Some("a1b2c3-uuid".into()),
            user: Some(ClaimsUser {
                id: Some(serde_json::json!(27)),
            }),
            exp: future_exp(),
        };
        assert_eq!(claims.user_id(), Some(27));

        let claims = Claims {
            sub: None,
            user: Some(ClaimsUser {
                id: Some(serde_json::json!("31")),
            }),
            exp: future_exp(),
        };
        assert_eq!(claims.user_id(), Some(31));

        let claims = Claims {
            sub: Some("not-a-number".into()),
            user: None,
            exp: future_exp(),
        };
        assert_eq!(claims.user_id(), None);
    }

    #[test]
    fn test_from_config_requires_secret() {
        assert!(JwtVerifier::from_config(&AuthConfig::default()).is_none());

        let config = AuthConfig {
            jwt_secret: Some(SECRET.into()),
            ..Default::default()
        };
        assert!(JwtVerifier::from_config(&config).is_some());
    }
}
