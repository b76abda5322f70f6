use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, MessageResponse, ProfileResponse, RegisterRequest,
            RegisterResponse, UserSnapshot,
        },
        jwt::{AuthUser, JwtKeys},
        password::{generate_verification_token, hash_password, verify_password},
        repo::{NewUser, User},
        validate::{is_valid_email, is_valid_phone, normalize_phone, validate_password},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify/:token", get(verify_email))
        .route("/profile", get(profile))
        .route("/logout", post(logout))
}

fn require_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::Validation(format!("{} is required", name))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let first_name = require_field(payload.first_name, "firstName")?;
    let last_name = require_field(payload.last_name, "lastName")?;
    let email = require_field(payload.email, "email")?;
    let phone = require_field(payload.phone, "phone")?;
    let password = require_field(payload.password, "password")?;

    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email format");
        return Err(ApiError::Validation("Invalid email format".into()));
    }
    if !is_valid_phone(&phone) {
        warn!("invalid phone format");
        return Err(ApiError::Validation("Invalid phone number format".into()));
    }
    validate_password(&password).map_err(|reason| ApiError::Validation(reason.into()))?;
    let phone = normalize_phone(&phone);

    if let Some(existing) = User::find_by_email_or_phone(&state.db, &email, &phone).await? {
        let message = if existing.email == email {
            "Email already registered"
        } else {
            "Phone number already registered"
        };
        warn!(email = %email, "duplicate registration");
        return Err(ApiError::Conflict(message.into()));
    }

    let password_hash = hash_password(&password)?;
    let verification_token = generate_verification_token();

    let user = User::create(
        &state.db,
        &NewUser {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email,
            phone,
            password_hash,
            verification_token,
            newsletter_subscribed: payload.newsletter,
        },
    )
    .await?;

    // Best-effort: a broken mail transport must not undo the registration.
    let token = user.verification_token.as_deref().unwrap_or_default();
    if let Err(e) = state
        .mailer
        .send_verification(&user.email, &user.first_name, token)
        .await
    {
        warn!(error = %e, user_id = %user.id, "verification email failed");
    }

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account created successfully. Please check your email for verification."
                .into(),
            user_id: user.id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (email, password) = match (non_empty(payload.email), non_empty(payload.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => {
            return Err(ApiError::Validation(
                "Email and password are required".into(),
            ))
        }
    };
    let email = email.trim().to_lowercase();

    // Unknown email and wrong password share one message so a caller cannot
    // probe which emails are registered.
    let mut user = match User::find_by_email(&state.db, &email).await? {
        Some(user) => user,
        None => {
            warn!(email = %email, "login with unknown email");
            return Err(ApiError::Unauthorized("Invalid email or password".into()));
        }
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthorized("Invalid email or password".into()));
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login on deactivated account");
        return Err(ApiError::Unauthorized("Account is deactivated".into()));
    }

    user.last_login = Some(User::touch_last_login(&state.db, user.id).await?);

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, payload.remember)?;

    info!(user_id = %user.id, remember = payload.remember, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        user: UserSnapshot::from(user),
        redirect_url: "/dashboard.html".into(),
    }))
}

#[instrument(skip(state, token))]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = User::find_by_verification_token(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::InvalidToken("Invalid verification token".into()))?;

    User::mark_verified(&state.db, user.id).await?;

    info!(user_id = %user.id, "email verified");
    Ok(Json(MessageResponse {
        message: "Email verified successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ProfileResponse {
        user: UserSnapshot::from(user),
    }))
}

/// Stateless: the token stays valid until it expires on its own. There is no
/// server-side revocation list.
#[instrument]
pub async fn logout(AuthUser(user_id): AuthUser) -> Json<MessageResponse> {
    info!(user_id = %user_id, "user logged out");
    Json(MessageResponse {
        message: "Logged out successfully".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_payload() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Asha".into()),
            last_name: Some("Verma".into()),
            email: Some("a@x.com".into()),
            phone: Some("9876543210".into()),
            password: Some("abcd1234".into()),
            newsletter: false,
        }
    }

    // These exercise the validation paths, which return before the lazy pool
    // in AppState::fake() would ever be used.

    #[tokio::test]
    async fn register_names_the_missing_field() {
        let state = AppState::fake();
        let payload = RegisterRequest {
            first_name: None,
            ..register_payload()
        };
        let err = register(State(state), Json(payload)).await.unwrap_err();
        match err {
            ApiError::Validation(message) => assert_eq!(message, "firstName is required"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn register_treats_blank_as_missing() {
        let state = AppState::fake();
        let payload = RegisterRequest {
            password: Some("   ".into()),
            ..register_payload()
        };
        let err = register(State(state), Json(payload)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "password is required"));
    }

    #[tokio::test]
    async fn register_rejects_bad_email_shape() {
        let state = AppState::fake();
        let payload = RegisterRequest {
            email: Some("not-an-email".into()),
            ..register_payload()
        };
        let err = register(State(state), Json(payload)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "Invalid email format"));
    }

    #[tokio::test]
    async fn register_rejects_bad_phone_shape() {
        let state = AppState::fake();
        let payload = RegisterRequest {
            phone: Some("12345".into()),
            ..register_payload()
        };
        let err = register(State(state), Json(payload)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "Invalid phone number format"));
    }

    #[tokio::test]
    async fn register_reports_password_reason() {
        let state = AppState::fake();
        let payload = RegisterRequest {
            password: Some("longenough".into()),
            ..register_payload()
        };
        let err = register(State(state), Json(payload)).await.unwrap_err();
        assert!(
            matches!(err, ApiError::Validation(m) if m == "Password must contain at least one number")
        );
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let state = AppState::fake();
        let payload = LoginRequest {
            email: Some("a@x.com".into()),
            password: None,
            remember: false,
        };
        let err = login(State(state), Json(payload)).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "Email and password are required"));
    }
}
