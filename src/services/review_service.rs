use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::reviews::{CreateReviewRequest, ReviewList},
    entity::{
        events::Entity as Events,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews, Model as ReviewModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "rating must be an integer between 1 and 5".to_string(),
        ));
    }

    if Events::find_by_id(payload.event_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        event_id: Set(payload.event_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_create",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id, "event_id": review.event_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Review created",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

pub async fn list_reviews_for_event(
    state: &AppState,
    event_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    let items = Reviews::find()
        .filter(ReviewCol::EventId.eq(event_id))
        .order_by_desc(ReviewCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::empty()),
    ))
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        user_id: model.user_id,
        event_id: model.event_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
