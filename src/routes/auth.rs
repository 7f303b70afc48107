use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    dto::auth::{LoginRequest, RegisterRequest, UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, SESSION_USER_ID_KEY, establish_session},
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me).patch(update_profile))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<User>),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "Duplicate username or email")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = auth_service::register_user(&state, payload).await?;
    // A fresh account is logged in right away, like the original client expects.
    if let Some(user) = resp.data.as_ref() {
        establish_session(&session, user.id, user.role).await?;
    }
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<User>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    if let Some(user) = resp.data.as_ref() {
        establish_session(&session, user.id, user.role).await?;
    }
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout", body = ApiResponse<serde_json::Value>)
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn logout(session: Session) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    Ok(Json(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user, or null data when anonymous", body = ApiResponse<User>)
    ),
    tag = "Auth"
)]
pub async fn me(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ApiResponse<User>>> {
    let user_id: Option<Uuid> = session
        .get(SESSION_USER_ID_KEY)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let Some(user_id) = user_id else {
        return Ok(Json(ApiResponse {
            message: "Anonymous".to_string(),
            data: None,
            meta: Some(Meta::empty()),
        }));
    };

    let user = auth_service::current_user(&state, user_id).await?;
    Ok(Json(ApiResponse::success("OK", user, Some(Meta::empty()))))
}

#[utoipa::path(
    patch,
    path = "/api/auth/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Update profile", body = ApiResponse<User>),
        (status = 409, description = "Duplicate username or email")
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
