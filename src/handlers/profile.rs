use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{ProfileResponse, UpdateProfileRequest};
use crate::error::{AppError, AppResult};
use crate::models::user::User;
use crate::AppState;

/// GET /api/profile — initial form state comes from the auth-provider user
/// record (also what a client-side reset reverts to).
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ProfileResponse>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

/// PUT /api/profile — persists to the user record and then to the mirrored
/// profile document. The two writes are sequential and uncoordinated; see
/// DESIGN.md on the drift question.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    body.validate_timezone().map_err(AppError::Validation)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            avatar_url = COALESCE($3, avatar_url),
            timezone = COALESCE($4, timezone),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(&body.display_name)
    .bind(&body.photo_url)
    .bind(&body.timezone)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("User not found".into()))?;

    write_profile_mirror(&state.db, &user).await?;

    Ok(Json(user.into()))
}

/// Mirror the user record's display name/photo into the profile meta row.
pub async fn write_profile_mirror(db: &sqlx::PgPool, user: &User) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, display_name, photo_url, updated_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (user_id) DO UPDATE SET
            display_name = $2,
            photo_url = $3,
            updated_at = NOW()
        "#,
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.avatar_url)
    .execute(db)
    .await?;
    Ok(())
}
