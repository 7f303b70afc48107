use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::bookings::ProcessPaymentRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Booking,
    response::ApiResponse,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/process", post(process_payment))
}

// Mock payment processing: no gateway, the booking is confirmed directly.
#[utoipa::path(
    post,
    path = "/api/payments/process",
    request_body = ProcessPaymentRequest,
    responses(
        (status = 200, description = "Booking confirmed", body = ApiResponse<Booking>),
        (status = 400, description = "Booking is cancelled"),
        (status = 404, description = "Booking not found")
    ),
    security(("session_cookie" = [])),
    tag = "Payments"
)]
pub async fn process_payment(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ProcessPaymentRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::confirm_booking(&state, payload.booking_id).await?;
    Ok(Json(resp))
}
