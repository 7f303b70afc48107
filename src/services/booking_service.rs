use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::{BookingList, CreateBookingRequest},
    entity::{
        bookings::{
            ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings,
            Model as BookingModel,
        },
        events::Entity as Events,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::{Booking, BookingStatus},
    response::{ApiResponse, Meta},
    routes::params::BookingListQuery,
    state::AppState,
};

/// Atomic check-and-reserve. The event row is locked `FOR UPDATE` for the
/// duration of the transaction, so concurrent bookings against the same
/// event serialize on the capacity check: two requests racing for the last
/// seats cannot both observe it free. Returning early drops the
/// transaction and rolls everything back.
pub async fn create_booking(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    if payload.tickets_count < 1 {
        return Err(AppError::BadRequest(
            "tickets_count must be at least 1".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let event = Events::find_by_id(payload.event_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let event = match event {
        Some(e) => e,
        None => return Err(AppError::NotFound),
    };

    let reserved = reserved_tickets(&txn, event.id).await?;
    let available = event.capacity as i64 - reserved;
    if (payload.tickets_count as i64) > available {
        return Err(AppError::CapacityExceeded {
            requested: payload.tickets_count,
            available: available.max(0),
        });
    }

    let total_price = event.price * payload.tickets_count as i64;

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        event_id: Set(event.id),
        tickets_count: Set(payload.tickets_count),
        total_price: Set(total_price),
        status: Set(BookingStatus::Pending),
        special_requests: Set(payload.special_requests),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_create",
        Some("bookings"),
        Some(serde_json::json!({
            "booking_id": booking.id,
            "event_id": booking.event_id,
            "tickets_count": booking.tickets_count,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Booking created",
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

/// Invoked by the payments stub. `pending -> confirmed`; confirming an
/// already-confirmed booking is a no-op, a cancelled booking stays
/// cancelled.
pub async fn confirm_booking(state: &AppState, booking_id: Uuid) -> AppResult<ApiResponse<Booking>> {
    let txn = state.orm.begin().await?;

    let booking = Bookings::find_by_id(booking_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let booking = match booking {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };

    let booking = match booking.status {
        BookingStatus::Confirmed => booking,
        BookingStatus::Cancelled => {
            return Err(AppError::BadRequest(
                "Booking has been cancelled".to_string(),
            ));
        }
        BookingStatus::Pending => {
            let mut active: BookingActive = booking.into();
            active.status = Set(BookingStatus::Confirmed);
            active.update(&txn).await?
        }
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(booking.user_id),
        "booking_confirm",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment successful",
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

/// Owner or admin only. Cancelled bookings stop counting against the
/// event's capacity.
pub async fn cancel_booking(
    state: &AppState,
    user: &AuthUser,
    booking_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let booking = Bookings::find_by_id(booking_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let booking = match booking {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };

    ensure_owner_or_admin(user, booking.user_id)?;

    if booking.status != BookingStatus::Cancelled {
        let mut active: BookingActive = booking.into();
        active.status = Set(BookingStatus::Cancelled);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "booking_cancel",
        Some("bookings"),
        Some(serde_json::json!({ "booking_id": booking_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Booking cancelled",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(BookingCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(BookingCol::Status.eq(status));
    }

    let finder = Bookings::find()
        .filter(condition)
        .order_by_desc(BookingCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", BookingList { items }, Some(meta)))
}

pub async fn get_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    let booking = Bookings::find_by_id(id).one(&state.orm).await?;
    let booking = match booking {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };

    ensure_owner_or_admin(user, booking.user_id)?;

    Ok(ApiResponse::success(
        "OK",
        booking_from_entity(booking),
        Some(Meta::empty()),
    ))
}

/// Sum of ticket counts across the event's pending and confirmed bookings.
/// Callers that need the figure to be stable must hold the event row lock.
async fn reserved_tickets<C: sea_orm::ConnectionTrait>(conn: &C, event_id: Uuid) -> AppResult<i64> {
    let reserved = Bookings::find()
        .select_only()
        .column_as(BookingCol::TicketsCount.sum(), "reserved")
        .filter(BookingCol::EventId.eq(event_id))
        .filter(BookingCol::Status.ne(BookingStatus::Cancelled))
        .into_tuple::<Option<i64>>()
        .one(conn)
        .await?
        .flatten();
    Ok(reserved.unwrap_or(0))
}

pub fn booking_from_entity(model: BookingModel) -> Booking {
    Booking {
        id: model.id,
        user_id: model.user_id,
        event_id: model.event_id,
        tickets_count: model.tickets_count,
        total_price: model.total_price,
        status: model.status,
        special_requests: model.special_requests,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
