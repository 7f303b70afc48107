use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Booking;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub event_id: Uuid,
    pub tickets_count: i32,
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessPaymentRequest {
    pub booking_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}
