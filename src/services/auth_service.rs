use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{LoginRequest, RegisterRequest, UpdateProfileRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        password,
        role,
    } = payload;

    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Username, email, and password required".to_string(),
        ));
    }

    if Users::find()
        .filter(UserCol::Username.eq(username.as_str()))
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username taken".to_string()));
    }

    if Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role.unwrap_or(Role::Attendee)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Account created",
        user_from_entity(user),
        None,
    ))
}

pub async fn login_user(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<User>> {
    let LoginRequest { username, password } = payload;

    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password required".to_string(),
        ));
    }

    // The identifier may be either the username or the email.
    let user = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Username.eq(username.as_str()))
                .add(UserCol::Email.eq(username.as_str())),
        )
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::InvalidCredentials),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::InvalidCredentials);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged in",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, user_id: Uuid) -> AppResult<User> {
    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    Ok(user_from_entity(user))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if payload.username.is_none() && payload.email.is_none() {
        return Ok(ApiResponse::success(
            "Profile updated",
            user_from_entity(existing),
            Some(Meta::empty()),
        ));
    }

    let mut active: UserActive = existing.into();

    if let Some(username) = payload.username {
        let taken = Users::find()
            .filter(UserCol::Username.eq(username.as_str()))
            .filter(UserCol::Id.ne(user.user_id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        active.username = Set(username);
    }

    if let Some(email) = payload.email {
        let taken = Users::find()
            .filter(UserCol::Email.eq(email.as_str()))
            .filter(UserCol::Id.ne(user.user_id))
            .one(&state.orm)
            .await?;
        if taken.is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        active.email = Set(email);
    }

    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Profile updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
