use axum::{extract::State, Extension, Json};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    google,
    jwt::{create_token_pair, hash_token, verify_token, TokenPair, TokenType},
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::dto::{
    AnonymousAuthResponse, AnonymousRequest, AuthResponse, GoogleSignInRequest, LoginRequest,
    RefreshRequest, RegisterRequest, UserResponse,
};
use crate::error::{AppError, AppResult};
use crate::models::user::User;
use crate::AppState;

/// Resolve an optional timezone to a stored value, rejecting unknown names.
fn stored_timezone(timezone: Option<&str>) -> AppResult<String> {
    match timezone {
        None => Ok("UTC".into()),
        Some(tz) if tz.parse::<chrono_tz::Tz>().is_ok() => Ok(tz.to_string()),
        Some(tz) => Err(AppError::Validation(format!("Unknown timezone: {}", tz))),
    }
}

async fn store_refresh_token(
    db: &sqlx::PgPool,
    user_id: Uuid,
    raw_refresh_token: &str,
    ttl_secs: i64,
    parent_token_id: Option<Uuid>,
) -> AppResult<Uuid> {
    let token_hash = hash_token(raw_refresh_token);
    let expires_at = Utc::now() + Duration::seconds(ttl_secs);
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, parent_token_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&token_hash)
    .bind(expires_at)
    .bind(parent_token_id)
    .execute(db)
    .await?;

    Ok(id)
}

/// Create a token pair AND persist the refresh token hash in the DB.
async fn issue_token_pair(
    db: &sqlx::PgPool,
    user_id: Uuid,
    email: &str,
    config: &crate::config::Config,
    parent_token_id: Option<Uuid>,
) -> AppResult<TokenPair> {
    let tokens = create_token_pair(user_id, email, config)?;
    store_refresh_token(
        db,
        user_id,
        &tokens.refresh_token,
        config.jwt_refresh_ttl_secs,
        parent_token_id,
    )
    .await?;
    Ok(tokens)
}

/// Revoke all active refresh tokens for a user.
async fn revoke_all_user_tokens(db: &sqlx::PgPool, user_id: Uuid) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = true, revoked_at = NOW()
        WHERE user_id = $1 AND revoked = false
        "#,
    )
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(())
}

fn auth_response(tokens: TokenPair, user: User) -> AuthResponse {
    AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: user.into(),
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let timezone = stored_timezone(body.timezone.as_deref())?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_one(&state.db)
        .await?;

    if existing > 0 {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let pwd_hash = hash_password(&body.password)?;

    // If guest_token provided, upgrade the anonymous account in place so its
    // entries carry over.
    if let Some(guest_token) = body.guest_token {
        let upgraded = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                email = $2, password_hash = $3, name = $4, timezone = $5,
                is_guest = false, guest_token = NULL, updated_at = NOW()
            WHERE guest_token = $1 AND is_guest = true
            RETURNING *
            "#,
        )
        .bind(guest_token)
        .bind(&body.email)
        .bind(&pwd_hash)
        .bind(&body.name)
        .bind(&timezone)
        .fetch_optional(&state.db)
        .await?;

        if let Some(user) = upgraded {
            let tokens =
                issue_token_pair(&state.db, user.id, &body.email, &state.config, None).await?;
            return Ok(Json(auth_response(tokens, user)));
        }
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, password_hash, name, timezone)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.email)
    .bind(&pwd_hash)
    .bind(&body.name)
    .bind(&timezone)
    .fetch_one(&state.db)
    .await?;

    let tokens = issue_token_pair(&state.db, user.id, &body.email, &state.config, None).await?;
    Ok(Json(auth_response(tokens, user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND is_guest = false")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let password_hash = user.password_hash.as_deref().ok_or(AppError::Unauthorized)?;
    if !verify_password(&body.password, password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let email = user.email.clone().unwrap_or_default();
    let tokens = issue_token_pair(&state.db, user.id, &email, &state.config, None).await?;
    Ok(Json(auth_response(tokens, user)))
}

pub async fn anonymous(
    State(state): State<AppState>,
    Json(body): Json<AnonymousRequest>,
) -> AppResult<Json<AnonymousAuthResponse>> {
    let timezone = stored_timezone(body.timezone.as_deref())?;
    let guest_token = Uuid::new_v4();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, is_guest, guest_token, timezone)
        VALUES ($1, $2, true, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("Guest")
    .bind(guest_token)
    .bind(&timezone)
    .fetch_one(&state.db)
    .await?;

    let tokens = issue_token_pair(&state.db, user.id, "", &state.config, None).await?;

    Ok(Json(AnonymousAuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        guest_token,
        user: user.into(),
    }))
}

pub async fn google_sign_in(
    State(state): State<AppState>,
    Json(body): Json<GoogleSignInRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if state.config.google_client_id.is_empty() {
        return Err(AppError::Validation(
            "Federated sign-in is not configured".into(),
        ));
    }

    let claims = google::verify_id_token(&body.id_token, &state.config.google_client_id)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Google ID token verification failed");
            AppError::Unauthorized
        })?;

    // Link order: by google_sub first, then by verified email, else create.
    let mut user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE google_sub = $1")
        .bind(&claims.sub)
        .fetch_optional(&state.db)
        .await?;

    if user.is_none() {
        if let Some(email) = &claims.email {
            user = sqlx::query_as::<_, User>(
                r#"
                UPDATE users SET google_sub = $2, updated_at = NOW()
                WHERE email = $1 AND is_guest = false
                RETURNING *
                "#,
            )
            .bind(email)
            .bind(&claims.sub)
            .fetch_optional(&state.db)
            .await?;
        }
    }

    let user = match user {
        Some(user) => user,
        None => {
            let timezone = stored_timezone(body.timezone.as_deref())?;
            let name = claims.name.clone().unwrap_or_else(|| "User".into());
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (id, email, google_sub, name, avatar_url, timezone)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&claims.email)
            .bind(&claims.sub)
            .bind(&name)
            .bind(&claims.picture)
            .bind(&timezone)
            .fetch_one(&state.db)
            .await?
        }
    };

    let email = user.email.clone().unwrap_or_default();
    let tokens = issue_token_pair(&state.db, user.id, &email, &state.config, None).await?;
    Ok(Json(auth_response(tokens, user)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let token_data = verify_token(&body.refresh_token, &state.config)?;

    if token_data.claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized);
    }

    let token_hash = hash_token(&body.refresh_token);

    let stored = sqlx::query_as::<_, (Uuid, Uuid, bool)>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE token_hash = $1
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::Unauthorized)?;

    let (stored_id, stored_user_id, revoked) = stored;

    // Reuse detection: a revoked token being presented means the family leaked.
    if revoked {
        tracing::warn!(
            user_id = %stored_user_id,
            token_id = %stored_id,
            "Refresh token reuse detected, revoking all tokens for user"
        );
        revoke_all_user_tokens(&state.db, stored_user_id).await?;
        return Err(AppError::Unauthorized);
    }

    if stored_user_id != token_data.claims.sub {
        return Err(AppError::Unauthorized);
    }

    // Single-use rotation.
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = true, revoked_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(stored_id)
    .execute(&state.db)
    .await?;

    let tokens = issue_token_pair(
        &state.db,
        token_data.claims.sub,
        &token_data.claims.email,
        &state.config,
        Some(stored_id),
    )
    .await?;
    Ok(Json(tokens))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    revoke_all_user_tokens(&state.db, auth_user.id).await?;
    Ok(Json(serde_json::json!({ "message": "Logged out successfully" })))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserResponse>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_timezone_defaults_to_utc() {
        assert_eq!(stored_timezone(None).unwrap(), "UTC");
        assert_eq!(
            stored_timezone(Some("America/New_York")).unwrap(),
            "America/New_York"
        );
        assert!(stored_timezone(Some("Nowhere/Else")).is_err());
    }
}
