use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Event;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date: String,
    pub location: String,
    pub price: Option<i64>,
    pub capacity: Option<i32>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub price: Option<i64>,
    pub capacity: Option<i32>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventList {
    pub items: Vec<Event>,
}
