use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::{Json, http::StatusCode, response::IntoResponse};
use tracing::info;

use crate::{
    AppState,
    error::ApiError,
    models::{Booking, BookingRequest, ClassView},
};

#[derive(Debug, serde::Deserialize)]
pub struct ClassesQuery {
    #[serde(alias = "timezone")]
    pub tz: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct BookingsQuery {
    pub email: Option<String>,
}

#[utoipa::path(get, path = "/", tag = "studio")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Fitness Studio Booking API",
        "endpoints": {
            "/classes": "List classes, optionally in another timezone (?tz=)",
            "/bookings": "Book a class (POST) or list bookings (GET, ?email=)",
            "/book": "Book a class (POST, same body as /bookings)"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "studio")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "studio")]
pub async fn healthz_ready(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "classes": state.catalog.sessions().len(),
    }))
}

#[utoipa::path(
    get,
    path = "/classes",
    params(
        ("tz" = Option<String>, Query, description = "IANA timezone to display start times in (defaults to the studio timezone)")
    ),
    responses(
        (status = 200, description = "List of classes", body = [ClassView]),
        (status = 400, description = "Unknown timezone", body = crate::models::ErrorBody)
    ),
    tag = "studio"
)]
pub async fn list_classes(
    State(state): State<AppState>,
    query: Result<Query<ClassesQuery>, QueryRejection>,
) -> Result<Json<Vec<ClassView>>, ApiError> {
    let Query(query) = query?;
    let timezone = query
        .tz
        .unwrap_or_else(|| state.catalog.reference_timezone().name().to_string());

    let scheduled = state.catalog.list_sessions(&timezone)?;
    let counts = state.ledger.snapshot_counts();
    let classes: Vec<ClassView> = scheduled
        .iter()
        .map(|class| {
            let booked = counts.get(&class.session.id).copied().unwrap_or_default();
            ClassView::new(class, booked)
        })
        .collect();

    info!("Returned {} classes in timezone {timezone}", classes.len());
    Ok(Json(classes))
}

#[utoipa::path(
    post,
    path = "/bookings",
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Invalid email or malformed request", body = crate::models::ErrorBody),
        (status = 404, description = "Class not found", body = crate::models::ErrorBody),
        (status = 409, description = "Already booked or no slots available", body = crate::models::ErrorBody)
    ),
    tag = "studio"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let booking = state.ledger.book(&request)?;
    info!(
        booking_id = booking.id,
        "Booking created: {} -> {}", booking.email, booking.class_name
    );
    Ok((StatusCode::CREATED, Json(booking)))
}

#[utoipa::path(
    get,
    path = "/bookings",
    params(
        ("email" = Option<String>, Query, description = "Only return bookings made with this email")
    ),
    responses(
        (status = 200, description = "List of bookings", body = [Booking]),
        (status = 400, description = "Invalid email", body = crate::models::ErrorBody)
    ),
    tag = "studio"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    query: Result<Query<BookingsQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let Query(query) = query?;
    let bookings = state.ledger.list_bookings(query.email.as_deref())?;
    info!(
        "Returned {} bookings for email={}",
        bookings.len(),
        query.email.as_deref().unwrap_or("*")
    );
    Ok(Json(bookings))
}
