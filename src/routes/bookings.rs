use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::bookings::{BookingList, CreateBookingRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Booking,
    response::ApiResponse,
    routes::params::BookingListQuery,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/{id}", get(get_booking).delete(cancel_booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Create booking", body = ApiResponse<Booking>),
        (status = 400, description = "Invalid ticket count"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Capacity exceeded")
    ),
    security(("session_cookie" = [])),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Booking>>)> {
    let resp = booking_service::create_booking(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "pending, confirmed, cancelled")
    ),
    responses(
        (status = 200, description = "The caller's bookings", body = ApiResponse<BookingList>)
    ),
    security(("session_cookie" = [])),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::list_bookings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Get booking", body = ApiResponse<Booking>),
        (status = 403, description = "Owner or admin only"),
        (status = 404, description = "Not Found")
    ),
    security(("session_cookie" = [])),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::get_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Cancel booking, freeing its capacity"),
        (status = 403, description = "Owner or admin only"),
        (status = 404, description = "Not Found")
    ),
    security(("session_cookie" = [])),
    tag = "Bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = booking_service::cancel_booking(&state, &user, id).await?;
    Ok(Json(resp))
}
