use axum::http::HeaderMap;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Who a verified token speaks for. The `type` tag is embedded in the claims
/// so one verification routine serves all four issuance paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Subject {
    User { user_id: String, email: String },
    Admin { admin_id: String, username: String },
    Owner { owner_id: String, username: String },
    Property { property_id: String, username: String },
}

impl Subject {
    /// Token lifetime in seconds, per subject type.
    fn ttl_secs(&self) -> i64 {
        match self {
            Subject::User { .. } => 24 * 3600,
            Subject::Admin { .. } => 24 * 3600,
            Subject::Owner { .. } => 24 * 3600,
            Subject::Property { .. } => 24 * 3600,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    subject: Subject,
    exp: i64,
}

pub fn issue_token(subject: &Subject, secret: &str) -> Result<String, AppError> {
    let claims = Claims {
        subject: subject.clone(),
        exp: Utc::now().timestamp() + subject.ttl_secs(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Subject, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Unauthorized - Token has expired".to_string())
        }
        _ => AppError::Forbidden("Forbidden - Invalid token".to_string()),
    })?;
    Ok(data.claims.subject)
}

/// Pull the bearer token off the Authorization header and verify it.
pub fn bearer_subject(headers: &HeaderMap, secret: &str) -> Result<Subject, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Unauthorized - No token provided or invalid format".to_string())
    })?;

    verify_token(token, secret)
}

/// Same as [`bearer_subject`] but only accepts admin tokens.
pub fn bearer_admin(headers: &HeaderMap, secret: &str) -> Result<(String, String), AppError> {
    match bearer_subject(headers, secret)? {
        Subject::Admin { admin_id, username } => Ok((admin_id, username)),
        _ => Err(AppError::Forbidden(
            "Forbidden - Admin access required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_property_subject() {
        let subject = Subject::Property {
            property_id: "prop-1".to_string(),
            username: "seaview_hut".to_string(),
        };
        let token = issue_token(&subject, "test-secret").unwrap();
        assert_eq!(verify_token(&token, "test-secret").unwrap(), subject);
    }

    #[test]
    fn rejects_wrong_secret_as_forbidden() {
        let subject = Subject::Admin {
            admin_id: "adm-1".to_string(),
            username: "root".to_string(),
        };
        let token = issue_token(&subject, "secret-a").unwrap();
        match verify_token(&token, "secret-b") {
            Err(AppError::Forbidden(_)) => {}
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let claims = Claims {
            subject: Subject::User {
                user_id: "u-1".to_string(),
                email: "a@b.c".to_string(),
            },
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        match verify_token(&token, "test-secret") {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("expired")),
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }
}
