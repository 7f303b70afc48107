pub mod admin_service;
pub mod auth_service;
pub mod booking_service;
pub mod category_service;
pub mod event_service;
pub mod review_service;
