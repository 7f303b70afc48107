use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, RegisterRequest, UpdateProfileRequest},
        bookings::{BookingList, CreateBookingRequest, ProcessPaymentRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        events::{CreateEventRequest, EventList, UpdateEventRequest},
        reviews::{CreateReviewRequest, ReviewList},
    },
    models::{Booking, BookingStatus, Category, Event, Review, Role, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, bookings, categories, events, health, params, payments, reviews},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        // The session id cookie set by /api/auth/login.
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("id"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_profile,
        events::list_events,
        events::get_event,
        events::create_event,
        events::update_event,
        events::delete_event,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::cancel_booking,
        payments::process_payment,
        reviews::create_review,
        reviews::list_event_reviews,
        admin::list_all_bookings,
        admin::list_users
    ),
    components(
        schemas(
            User,
            Role,
            Event,
            Category,
            Booking,
            BookingStatus,
            Review,
            RegisterRequest,
            LoginRequest,
            UpdateProfileRequest,
            CreateEventRequest,
            UpdateEventRequest,
            EventList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CreateBookingRequest,
            ProcessPaymentRequest,
            BookingList,
            CreateReviewRequest,
            ReviewList,
            admin::UserList,
            params::Pagination,
            params::EventQuery,
            params::BookingListQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Event>,
            ApiResponse<EventList>,
            ApiResponse<Booking>,
            ApiResponse<BookingList>,
            ApiResponse<ReviewList>
        )
    ),
    security(
        ("session_cookie" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and session endpoints"),
        (name = "Events", description = "Event catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Bookings", description = "Booking endpoints"),
        (name = "Payments", description = "Payment stub endpoints"),
        (name = "Reviews", description = "Review endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
