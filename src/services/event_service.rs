use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::events::{CreateEventRequest, EventList, UpdateEventRequest},
    entity::{
        categories::Entity as Categories,
        events::{ActiveModel as EventActive, Column as EventCol, Entity as Events, Model as EventModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_organizer, ensure_owner_or_admin},
    models::Event,
    response::{ApiResponse, Meta},
    routes::params::{EventQuery, EventSortBy, SortOrder},
    state::AppState,
};

pub async fn list_events(state: &AppState, query: EventQuery) -> AppResult<ApiResponse<EventList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(EventCol::Title).ilike(pattern.clone()))
                .add(Expr::col(EventCol::Description).ilike(pattern)),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(EventCol::CategoryId.eq(category_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(EventCol::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(EventCol::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(EventSortBy::Date);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Asc);
    let sort_col = match sort_by {
        EventSortBy::CreatedAt => EventCol::CreatedAt,
        EventSortBy::Date => EventCol::Date,
        EventSortBy::Price => EventCol::Price,
        EventSortBy::Title => EventCol::Title,
    };

    let mut finder = Events::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(event_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Events", EventList { items }, Some(meta)))
}

pub async fn get_event(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Event>> {
    let event = Events::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(event_from_entity);
    let event = match event {
        Some(e) => e,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Event", event, None))
}

pub async fn create_event(
    state: &AppState,
    user: &AuthUser,
    payload: CreateEventRequest,
) -> AppResult<ApiResponse<Event>> {
    ensure_organizer(user)?;

    if payload.title.trim().is_empty() || payload.location.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Missing required fields: title, location, date".to_string(),
        ));
    }

    let date = parse_event_date(&payload.date)?;
    let price = payload.price.unwrap_or(0);
    let capacity = payload.capacity.unwrap_or(100);

    if price < 0 {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }
    if capacity <= 0 {
        return Err(AppError::BadRequest(
            "capacity must be greater than 0".to_string(),
        ));
    }

    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }

    let event = EventActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        description: Set(payload.description),
        date: Set(date.into()),
        location: Set(payload.location),
        price: Set(price),
        capacity: Set(capacity),
        organizer_id: Set(user.user_id),
        category_id: Set(payload.category_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "event_create",
        Some("events"),
        Some(serde_json::json!({ "event_id": event.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Event created",
        event_from_entity(event),
        Some(Meta::empty()),
    ))
}

pub async fn update_event(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateEventRequest,
) -> AppResult<ApiResponse<Event>> {
    let existing = Events::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(e) => e,
        None => return Err(AppError::NotFound),
    };

    ensure_owner_or_admin(user, existing.organizer_id)?;

    // Validate everything before touching the row.
    let date = payload.date.as_deref().map(parse_event_date).transpose()?;
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price must not be negative".to_string()));
        }
    }
    if let Some(capacity) = payload.capacity {
        if capacity <= 0 {
            return Err(AppError::BadRequest(
                "capacity must be greater than 0".to_string(),
            ));
        }
    }
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }

    let mut active: EventActive = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(date) = date {
        active.date = Set(date.into());
    }
    if let Some(location) = payload.location {
        active.location = Set(location);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(capacity) = payload.capacity {
        active.capacity = Set(capacity);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }

    let event = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "event_update",
        Some("events"),
        Some(serde_json::json!({ "event_id": event.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        event_from_entity(event),
        Some(Meta::empty()),
    ))
}

pub async fn delete_event(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Events::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(e) => e,
        None => return Err(AppError::NotFound),
    };

    ensure_owner_or_admin(user, existing.organizer_id)?;

    // Bookings and reviews go with the event (ON DELETE CASCADE).
    Events::delete_by_id(id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "event_delete",
        Some("events"),
        Some(serde_json::json!({ "event_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Event deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Accepts RFC 3339, a bare `YYYY-MM-DDTHH:MM:SS`, or a date-only
/// `YYYY-MM-DD` (midnight UTC), mirroring what the browser client sends.
pub fn parse_event_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    Err(AppError::BadRequest(
        "Invalid date format. Use YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS".to_string(),
    ))
}

async fn ensure_category_exists(state: &AppState, category_id: Uuid) -> AppResult<()> {
    if Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("category not found".to_string()));
    }
    Ok(())
}

pub fn event_from_entity(model: EventModel) -> Event {
    Event {
        id: model.id,
        title: model.title,
        description: model.description,
        date: model.date.with_timezone(&Utc),
        location: model.location,
        price: model.price,
        capacity: model.capacity,
        organizer_id: model.organizer_id,
        category_id: model.category_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
