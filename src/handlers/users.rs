use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{self, Subject};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;
use crate::services::email::{generate_code, EmailPurpose};
use crate::state::AppState;

const CODE_TTL_MINUTES: i64 = 10;

fn user_json(user: &User) -> Value {
    json!({
        "user_id": user.user_id,
        "name": user.name,
        "email": user.email,
        "phone_number": user.phone_number,
        "cnic": user.cnic,
        "is_email_verified": user.is_email_verified,
        "created_at": user.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

fn user_token(state: &AppState, user: &User) -> Result<String, AppError> {
    let subject = Subject::User {
        user_id: user.user_id.clone(),
        email: user.email.clone().unwrap_or_default(),
    };
    auth::issue_token(&subject, &state.config.jwt_secret)
}

// POST /api/users/signup/send-code
#[derive(Deserialize)]
pub struct SendSignupCodeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub cnic: Option<String>,
}

pub async fn send_signup_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendSignupCodeRequest>,
) -> Result<Json<Value>, AppError> {
    let email = body.email.as_deref().map(str::trim).unwrap_or("");
    let phone_number = body.phone_number.as_deref().map(str::trim).unwrap_or("");
    let password = body.password.as_deref().unwrap_or("");
    if email.is_empty() || phone_number.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Missing required fields: email, phone_number, password".to_string(),
        ));
    }

    if let Some(cnic) = body.cnic.as_deref() {
        if cnic.len() != 13 || !cnic.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::Validation(
                "Invalid CNIC: must be exactly 13 digits".to_string(),
            ));
        }
    }

    let code = generate_code();
    let expires = Utc::now().naive_utc() + Duration::minutes(CODE_TTL_MINUTES);
    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))?;

    let user_id = {
        let db = state.db.lock().unwrap();
        match queries::get_user_by_email(&db, email)? {
            Some(existing) if existing.is_email_verified => {
                return Err(AppError::Validation(
                    "Email already registered and verified".to_string(),
                ));
            }
            Some(existing) => {
                queries::update_signup_user(
                    &db,
                    &existing.user_id,
                    body.name.as_deref(),
                    phone_number,
                    &password_hash,
                    body.cnic.as_deref(),
                    &code,
                    &expires,
                )?;
                existing.user_id
            }
            None => {
                let user_id = Uuid::new_v4().to_string();
                queries::create_signup_user(
                    &db,
                    &user_id,
                    body.name.as_deref(),
                    email,
                    phone_number,
                    &password_hash,
                    body.cnic.as_deref(),
                    &code,
                    &expires,
                )?;
                user_id
            }
        }
    };

    // The code is only usable if the mail actually went out.
    if let Err(e) = state.email.send_code(email, &code, EmailPurpose::Signup).await {
        tracing::error!("failed to send signup code to {email}: {e:#}");
        let db = state.db.lock().unwrap();
        queries::clear_verification_code(&db, &user_id)?;
        return Err(AppError::Email(
            "Failed to send verification email. Please try again.".to_string(),
        ));
    }

    Ok(Json(json!({
        "message": "Verification code sent to your email",
        "email": email,
    })))
}

// POST /api/users/signup/verify-code
#[derive(Deserialize)]
pub struct VerifySignupCodeRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

pub async fn verify_signup_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifySignupCodeRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (email, code) = match (body.email.as_deref(), body.code.as_deref()) {
        (Some(e), Some(c)) if !e.is_empty() && !c.is_empty() => (e, c),
        _ => {
            return Err(AppError::Validation(
                "Email and verification code are required".to_string(),
            ))
        }
    };

    let db = state.db.lock().unwrap();

    let mut user = queries::get_user_by_email(&db, email)?
        .filter(|u| u.verification_code.as_deref() == Some(code))
        .ok_or_else(|| AppError::Validation("Invalid verification code".to_string()))?;

    let expired = user
        .verification_code_expires
        .map(|exp| Utc::now().naive_utc() > exp)
        .unwrap_or(true);
    if expired {
        return Err(AppError::Validation(
            "Verification code has expired".to_string(),
        ));
    }

    queries::mark_user_verified(&db, &user.user_id)?;
    user.is_email_verified = true;

    let token = user_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": user_json(&user),
            "token": token,
        })),
    ))
}

// POST /api/users/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let (email, password) = match (body.email.as_deref(), body.password.as_deref()) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ))
        }
    };

    let db = state.db.lock().unwrap();

    let user = queries::get_user_by_email(&db, email)?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if !user.is_email_verified {
        return Err(AppError::Unauthorized(
            "Please verify your email before logging in".to_string(),
        ));
    }

    let hash = user.password.as_deref().unwrap_or("");
    let matches = bcrypt::verify(password, hash).unwrap_or(false);
    if !matches {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = user_token(&state, &user)?;

    Ok(Json(json!({
        "message": "Login successful",
        "user": user_json(&user),
        "token": token,
    })))
}

// POST /api/users/forgot-password/send-code
#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

pub async fn send_reset_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let email = body
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

    let code = generate_code();
    let expires = Utc::now().naive_utc() + Duration::minutes(CODE_TTL_MINUTES);

    let user_id = {
        let db = state.db.lock().unwrap();
        let user = queries::get_user_by_email(&db, email)?
            .ok_or_else(|| AppError::NotFound("User with this email does not exist".to_string()))?;

        if !user.is_email_verified {
            return Err(AppError::Validation(
                "Email is not verified. Please complete registration first.".to_string(),
            ));
        }

        queries::set_reset_code(&db, &user.user_id, &code, &expires)?;
        user.user_id
    };

    if let Err(e) = state
        .email
        .send_code(email, &code, EmailPurpose::PasswordReset)
        .await
    {
        tracing::error!("failed to send reset code to {email}: {e:#}");
        let db = state.db.lock().unwrap();
        queries::clear_reset_code(&db, &user_id)?;
        return Err(AppError::Email(
            "Failed to send password reset email. Please try again.".to_string(),
        ));
    }

    Ok(Json(json!({
        "message": "Password reset code sent to your email",
        "email": email,
    })))
}

// POST /api/users/forgot-password/verify-code
#[derive(Deserialize)]
pub struct VerifyResetCodeRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

fn check_reset_code(user: &User, code: &str) -> Result<(), AppError> {
    if user.reset_password_code.as_deref() != Some(code) {
        return Err(AppError::Validation("Invalid reset code".to_string()));
    }
    let expired = user
        .reset_password_expires
        .map(|exp| Utc::now().naive_utc() > exp)
        .unwrap_or(true);
    if expired {
        return Err(AppError::Validation("Reset code has expired".to_string()));
    }
    Ok(())
}

pub async fn verify_reset_code(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyResetCodeRequest>,
) -> Result<Json<Value>, AppError> {
    let (email, code) = match (body.email.as_deref(), body.code.as_deref()) {
        (Some(e), Some(c)) if !e.is_empty() && !c.is_empty() => (e, c),
        _ => {
            return Err(AppError::Validation(
                "Email and reset code are required".to_string(),
            ))
        }
    };

    let db = state.db.lock().unwrap();

    let user = queries::get_user_by_email(&db, email)?
        .ok_or_else(|| AppError::Validation("Invalid reset code".to_string()))?;
    check_reset_code(&user, code)?;

    Ok(Json(json!({
        "message": "Reset code verified successfully",
        "email": email,
        "canResetPassword": true,
    })))
}

// POST /api/users/forgot-password/reset
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub code: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: Option<String>,
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let (email, code, password, confirm) = match (
        body.email.as_deref(),
        body.code.as_deref(),
        body.password.as_deref(),
        body.confirm_password.as_deref(),
    ) {
        (Some(e), Some(c), Some(p), Some(cp))
            if !e.is_empty() && !c.is_empty() && !p.is_empty() && !cp.is_empty() =>
        {
            (e, c, p, cp)
        }
        _ => return Err(AppError::Validation("All fields are required".to_string())),
    };

    if password != confirm {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters long".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();

    let user = queries::get_user_by_email(&db, email)?
        .ok_or_else(|| AppError::Validation("Invalid reset code".to_string()))?;
    check_reset_code(&user, code)?;

    let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))?;
    queries::update_user_password(&db, &user.user_id, &password_hash)?;

    Ok(Json(json!({ "message": "Password reset successfully" })))
}
