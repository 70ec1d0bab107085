use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::AvatarUploadResponse;
use crate::error::{AppError, AppResult};
use crate::handlers::profile::write_profile_mirror;
use crate::models::avatar::Avatar;
use crate::models::user::User;
use crate::AppState;

const ALLOWED_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// POST /api/profile/avatar — multipart image upload. The blob lands under
/// a per-user, timestamp-namespaced key; the resolved public URL is
/// persisted to the user record and profile mirror immediately (auto-save).
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> AppResult<Json<AvatarUploadResponse>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {}", e)))?
        .ok_or_else(|| AppError::Validation("No file provided".into()))?;

    let content_type = field.content_type().unwrap_or("").to_string();
    if !ALLOWED_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid file type: {}",
            content_type
        )));
    }

    let file_name = field.file_name().unwrap_or("avatar").to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Upload failed: {}", e)))?;

    if data.len() > state.config.max_avatar_bytes {
        return Err(AppError::Validation(format!(
            "Image exceeds the {} byte limit",
            state.config.max_avatar_bytes
        )));
    }

    let avatar_id = Uuid::new_v4();
    let object_key = format!(
        "avatars/{}/{}_{}",
        auth_user.id,
        Utc::now().timestamp_millis(),
        file_name
    );

    sqlx::query(
        r#"
        INSERT INTO avatars (id, user_id, object_key, content_type, data)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(avatar_id)
    .bind(auth_user.id)
    .bind(&object_key)
    .bind(&content_type)
    .bind(data.as_ref())
    .execute(&state.db)
    .await?;

    let url = format!(
        "{}/avatars/{}/{}",
        state.config.public_base_url, auth_user.id, avatar_id
    );

    // Auto-save the resolved URL, as the client did on upload completion.
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET avatar_url = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(&url)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("User not found".into()))?;

    write_profile_mirror(&state.db, &user).await?;

    tracing::info!(user_id = %auth_user.id, key = %object_key, size = data.len(), "Avatar stored");

    Ok(Json(AvatarUploadResponse {
        url,
        content_type,
        size: data.len(),
    }))
}

/// GET /avatars/{user_id}/{avatar_id} — public, stable URL for a stored
/// blob, served with its recorded content type.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path((user_id, avatar_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let avatar = sqlx::query_as::<_, Avatar>(
        "SELECT * FROM avatars WHERE id = $1 AND user_id = $2",
    )
    .bind(avatar_id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Avatar not found".into()))?;

    Ok(([(header::CONTENT_TYPE, avatar.content_type)], avatar.data))
}
