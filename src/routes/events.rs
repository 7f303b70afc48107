use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::events::{CreateEventRequest, EventList, UpdateEventRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Event,
    response::ApiResponse,
    routes::params::EventQuery,
    services::event_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route(
            "/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search title and description"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("min_price" = Option<i64>, Query, description = "Minimum price"),
        ("max_price" = Option<i64>, Query, description = "Maximum price"),
        ("sort_by" = Option<String>, Query, description = "created_at, date, price, title"),
        ("sort_order" = Option<String>, Query, description = "asc, desc")
    ),
    responses(
        (status = 200, description = "List events", body = ApiResponse<EventList>)
    ),
    tag = "Events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> AppResult<Json<ApiResponse<EventList>>> {
    let resp = event_service::list_events(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Get event", body = ApiResponse<Event>),
        (status = 404, description = "Event not found")
    ),
    tag = "Events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Event>>> {
    let resp = event_service::get_event(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Create event", body = ApiResponse<Event>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Organizer or admin only")
    ),
    security(("session_cookie" = [])),
    tag = "Events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Event>>)> {
    let resp = event_service::create_event(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = ApiResponse<Event>),
        (status = 403, description = "Owner or admin only"),
        (status = 404, description = "Not Found")
    ),
    security(("session_cookie" = [])),
    tag = "Events"
)]
pub async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> AppResult<Json<ApiResponse<Event>>> {
    let resp = event_service::update_event(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Deleted event and its bookings and reviews"),
        (status = 403, description = "Owner or admin only"),
        (status = 404, description = "Not Found")
    ),
    security(("session_cookie" = [])),
    tag = "Events"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = event_service::delete_event(&state, &user, id).await?;
    Ok(Json(resp))
}
