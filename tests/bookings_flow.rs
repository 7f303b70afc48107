use axum_ticketing_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        auth::{LoginRequest, RegisterRequest},
        bookings::CreateBookingRequest,
        events::CreateEventRequest,
        reviews::CreateReviewRequest,
    },
    entity::{bookings::Column as BookingCol, reviews::Column as ReviewCol, Bookings, Reviews},
    error::AppError,
    middleware::auth::AuthUser,
    models::{BookingStatus, Role, User},
    services::{auth_service, booking_service, event_service, review_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

// Each test creates its own users and events (unique names per run), so the
// flows stay independent even when cargo runs them in parallel.

#[tokio::test]
async fn booking_capacity_and_lifecycle_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let organizer = register(&state, "organizer", Role::Organizer).await?;
    let alice = register(&state, "alice", Role::Attendee).await?;
    let bob = register(&state, "bob", Role::Attendee).await?;

    let event = create_event(&state, &organizer, 3, 1000).await?;

    // Alice takes two of the three seats.
    let first = booking_service::create_booking(
        &state,
        &auth(&alice),
        CreateBookingRequest {
            event_id: event,
            tickets_count: 2,
            special_requests: Some("aisle seats".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(first.total_price, 2000);
    assert_eq!(first.status, BookingStatus::Pending);

    // Two more would overbook.
    let err = booking_service::create_booking(
        &state,
        &auth(&bob),
        CreateBookingRequest {
            event_id: event,
            tickets_count: 2,
            special_requests: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::CapacityExceeded {
            requested: 2,
            available: 1
        }
    ));

    // The last seat is still bookable.
    let second = booking_service::create_booking(
        &state,
        &auth(&bob),
        CreateBookingRequest {
            event_id: event,
            tickets_count: 1,
            special_requests: None,
        },
    )
    .await?
    .data
    .unwrap();

    // Cancelling Alice's booking frees her two seats.
    booking_service::cancel_booking(&state, &auth(&alice), first.id).await?;
    let third = booking_service::create_booking(
        &state,
        &auth(&bob),
        CreateBookingRequest {
            event_id: event,
            tickets_count: 2,
            special_requests: None,
        },
    )
    .await?
    .data
    .unwrap();

    // Payment confirms, and confirming twice is a no-op.
    let confirmed = booking_service::confirm_booking(&state, third.id)
        .await?
        .data
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    let again = booking_service::confirm_booking(&state, third.id)
        .await?
        .data
        .unwrap();
    assert_eq!(again.status, BookingStatus::Confirmed);

    // A cancelled booking cannot be confirmed.
    booking_service::cancel_booking(&state, &auth(&bob), second.id).await?;
    let err = booking_service::confirm_booking(&state, second.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Bob may not cancel what is not his.
    let err = booking_service::cancel_booking(&state, &auth(&bob), first.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[tokio::test]
async fn concurrent_bookings_cannot_overbook() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let organizer = register(&state, "organizer", Role::Organizer).await?;
    let alice = register(&state, "alice", Role::Attendee).await?;
    let bob = register(&state, "bob", Role::Attendee).await?;

    let event = create_event(&state, &organizer, 1, 500).await?;

    let request = |_| CreateBookingRequest {
        event_id: event,
        tickets_count: 1,
        special_requests: None,
    };

    let auth_alice = auth(&alice);
    let auth_bob = auth(&bob);
    let (a, b) = tokio::join!(
        booking_service::create_booking(&state, &auth_alice, request(())),
        booking_service::create_booking(&state, &auth_bob, request(())),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one of two racing bookings must win");

    let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(failure, AppError::CapacityExceeded { .. }));

    Ok(())
}

#[tokio::test]
async fn deleting_an_event_cascades_to_bookings_and_reviews() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let organizer = register(&state, "organizer", Role::Organizer).await?;
    let alice = register(&state, "alice", Role::Attendee).await?;

    let event = create_event(&state, &organizer, 10, 1000).await?;

    booking_service::create_booking(
        &state,
        &auth(&alice),
        CreateBookingRequest {
            event_id: event,
            tickets_count: 1,
            special_requests: None,
        },
    )
    .await?;
    review_service::create_review(
        &state,
        &auth(&alice),
        CreateReviewRequest {
            event_id: event,
            rating: 4,
            comment: Some("great venue".into()),
        },
    )
    .await?;

    event_service::delete_event(&state, &auth(&organizer), event).await?;

    let orphan_bookings = Bookings::find()
        .filter(BookingCol::EventId.eq(event))
        .count(&state.orm)
        .await?;
    let orphan_reviews = Reviews::find()
        .filter(ReviewCol::EventId.eq(event))
        .count(&state.orm)
        .await?;
    assert_eq!(orphan_bookings, 0);
    assert_eq!(orphan_reviews, 0);

    Ok(())
}

#[tokio::test]
async fn review_rating_must_be_in_range() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let organizer = register(&state, "organizer", Role::Organizer).await?;
    let alice = register(&state, "alice", Role::Attendee).await?;
    let event = create_event(&state, &organizer, 5, 1000).await?;

    let err = review_service::create_review(
        &state,
        &auth(&alice),
        CreateReviewRequest {
            event_id: event,
            rating: 6,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let review = review_service::create_review(
        &state,
        &auth(&alice),
        CreateReviewRequest {
            event_id: event,
            rating: 3,
            comment: None,
        },
    )
    .await?
    .data
    .unwrap();

    let listed = review_service::list_reviews_for_event(&state, event)
        .await?
        .data
        .unwrap();
    assert!(listed.items.iter().any(|r| r.id == review.id));

    Ok(())
}

#[tokio::test]
async fn register_then_login_identifies_the_same_user() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let suffix = Uuid::new_v4().simple().to_string();
    let username = format!("carol_{suffix}");
    let email = format!("carol_{suffix}@example.com");

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            username: username.clone(),
            email: email.clone(),
            password: "sup3rsecret".into(),
            role: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(registered.role, Role::Attendee);

    // Login works with the username and with the email.
    let by_username = auth_service::login_user(
        &state,
        LoginRequest {
            username: username.clone(),
            password: "sup3rsecret".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(by_username.id, registered.id);

    let by_email = auth_service::login_user(
        &state,
        LoginRequest {
            username: email,
            password: "sup3rsecret".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(by_email.id, registered.id);

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            username,
            password: "wrong".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    Ok(())
}

// Allow skipping when no DB is configured in the environment.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    Ok(Some(AppState { pool, orm }))
}

async fn register(state: &AppState, name: &str, role: Role) -> anyhow::Result<User> {
    let suffix = Uuid::new_v4().simple().to_string();
    let user = auth_service::register_user(
        state,
        RegisterRequest {
            username: format!("{name}_{suffix}"),
            email: format!("{name}_{suffix}@example.com"),
            password: "testpass123".into(),
            role: Some(role),
        },
    )
    .await?
    .data
    .unwrap();
    Ok(user)
}

async fn create_event(
    state: &AppState,
    organizer: &User,
    capacity: i32,
    price: i64,
) -> anyhow::Result<Uuid> {
    let event = event_service::create_event(
        state,
        &auth(organizer),
        CreateEventRequest {
            title: format!("Test Event {}", Uuid::new_v4().simple()),
            description: Some("An event for testing".into()),
            date: "2031-06-01".into(),
            location: "Test Hall".into(),
            price: Some(price),
            capacity: Some(capacity),
            category_id: None,
        },
    )
    .await?
    .data
    .unwrap();
    Ok(event.id)
}

fn auth(user: &User) -> AuthUser {
    AuthUser {
        user_id: user.id,
        role: user.role,
    }
}
