use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use jetshare_core::jetshare::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use jetshare_core::{
    BookingQuery, ClientScope, DataClient, JetShareOffer, NewOffer, OfferQuery, OfferStatus,
    Session, UserStats,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::extract::{
    rule, uuid_field, validate_not_blank, validate_status, ValidatedJson, ValidatedQuery,
};
use crate::middleware::require_session;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_offer_terms"))]
pub struct CreateOfferRequest {
    pub flight_date: DateTime<Utc>,
    #[validate(custom(function = "validate_not_blank"))]
    pub departure_location: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub arrival_location: String,
    pub aircraft_model: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub total_seats: i32,
    /// Defaults to `total_seats`.
    #[validate(range(min = 0, max = 100))]
    pub available_seats: Option<i32>,
    #[validate(range(exclusive_min = 0.0))]
    pub total_flight_cost: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub requested_share_amount: f64,
}

fn validate_offer_terms(req: &CreateOfferRequest) -> Result<(), ValidationError> {
    if req
        .departure_location
        .trim()
        .eq_ignore_ascii_case(req.arrival_location.trim())
    {
        return Err(rule("route", "departure and arrival locations must differ"));
    }
    if req.requested_share_amount > req.total_flight_cost {
        return Err(rule("share", "requested share cannot exceed the total flight cost"));
    }
    if req.available_seats.is_some_and(|seats| seats > req.total_seats) {
        return Err(rule("seats", "available seats cannot exceed total seats"));
    }
    if req.flight_date <= Utc::now() {
        return Err(rule("flight_date", "flight date must be in the future"));
    }
    Ok(())
}

impl From<CreateOfferRequest> for NewOffer {
    fn from(req: CreateOfferRequest) -> Self {
        NewOffer {
            flight_date: req.flight_date,
            departure_location: req.departure_location.trim().to_string(),
            arrival_location: req.arrival_location.trim().to_string(),
            aircraft_model: req.aircraft_model.filter(|m| !m.trim().is_empty()),
            available_seats: req.available_seats.unwrap_or(req.total_seats),
            total_seats: req.total_seats,
            total_flight_cost: req.total_flight_cost,
            requested_share_amount: req.requested_share_amount,
        }
    }
}

/// Body of acceptOffer and cancelOffer.
#[derive(Debug, Deserialize, Validate)]
pub struct OfferActionRequest {
    #[serde(deserialize_with = "uuid_field")]
    pub offer_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OffersParams {
    pub departure_location: Option<String>,
    pub arrival_location: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BookingsParams {
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

fn location(filter: Option<String>) -> Option<String> {
    filter
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

impl From<OffersParams> for OfferQuery {
    fn from(params: OffersParams) -> Self {
        OfferQuery {
            departure_location: location(params.departure_location),
            arrival_location: location(params.arrival_location),
            limit: params.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT),
            offset: params.offset.unwrap_or(0),
        }
    }
}

impl TryFrom<BookingsParams> for BookingQuery {
    type Error = AppError;

    fn try_from(params: BookingsParams) -> Result<Self, Self::Error> {
        let status = params
            .status
            .as_deref()
            .map(str::parse::<OfferStatus>)
            .transpose()
            .map_err(|e| AppError::validation(format!("status: {}", e)))?;

        Ok(BookingQuery {
            status,
            limit: params.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT),
            offset: params.offset.unwrap_or(0),
        })
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<JetShareOffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OffersResponse {
    pub success: bool,
    pub offers: Vec<JetShareOffer>,
}

#[derive(Debug, Serialize)]
pub struct BookingsResponse {
    pub success: bool,
    pub bookings: Vec<JetShareOffer>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: UserStats,
}

// ============================================================================
// Routes
// ============================================================================

/// Every JetShare route needs a signed-in user.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/jetshare/createOffer", post(create_offer))
        .route("/api/jetshare/acceptOffer", post(accept_offer))
        .route("/api/jetshare/cancelOffer", post(cancel_offer))
        .route("/api/jetshare/getOffers", get(get_offers))
        .route("/api/jetshare/getBookings", get(get_bookings))
        .route("/api/jetshare/stats", get(stats))
        .route_layer(middleware::from_fn_with_state(state, require_session))
}

fn user_client(state: &AppState, session: &Session) -> Arc<dyn DataClient> {
    state.clients.client(ClientScope::User(session.clone()))
}

/// POST /api/jetshare/createOffer
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ValidatedJson(req): ValidatedJson<CreateOfferRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer = user_client(&state, &session)
        .create_offer(&session.user_id, req.into())
        .await
        .map_err(AppError::upstream("Failed to create offer"))?;

    tracing::info!("User {} published offer {}", session.user_id, offer.id);
    Ok(Json(OfferResponse {
        success: true,
        offer: Some(offer),
        message: None,
    }))
}

/// POST /api/jetshare/acceptOffer
pub async fn accept_offer(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ValidatedJson(req): ValidatedJson<OfferActionRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer_id = req.offer_id;
    let accepted = user_client(&state, &session)
        .accept_offer(&session.user_id, offer_id)
        .await
        .map_err(AppError::upstream("Failed to accept offer"))?;

    let response = match accepted {
        Some(offer) => {
            tracing::info!("User {} accepted offer {}", session.user_id, offer_id);
            OfferResponse {
                success: true,
                offer: Some(offer),
                message: None,
            }
        }
        None => OfferResponse {
            success: false,
            offer: None,
            message: Some("Offer is no longer available".to_string()),
        },
    };

    Ok(Json(response))
}

/// POST /api/jetshare/cancelOffer
/// Only the owner can cancel, and only while the offer is open or accepted.
pub async fn cancel_offer(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ValidatedJson(req): ValidatedJson<OfferActionRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer_id = req.offer_id;
    let cancelled = user_client(&state, &session)
        .cancel_offer(&session.user_id, offer_id)
        .await
        .map_err(AppError::upstream("Failed to cancel offer"))?;

    let message = if cancelled {
        tracing::info!("User {} cancelled offer {}", session.user_id, offer_id);
        "Offer cancelled"
    } else {
        "Offer not found or cannot be cancelled"
    };

    Ok(Json(OfferResponse {
        success: cancelled,
        offer: None,
        message: Some(message.to_string()),
    }))
}

/// GET /api/jetshare/getOffers
/// Open offers from other users, soonest flight first.
pub async fn get_offers(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ValidatedQuery(params): ValidatedQuery<OffersParams>,
) -> Result<Json<OffersResponse>, AppError> {
    let query = OfferQuery::from(params);
    let offers = user_client(&state, &session)
        .list_offers(&session.user_id, &query)
        .await
        .map_err(AppError::upstream("Failed to fetch offers"))?;

    Ok(Json(OffersResponse {
        success: true,
        offers,
    }))
}

/// GET /api/jetshare/getBookings
pub async fn get_bookings(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ValidatedQuery(params): ValidatedQuery<BookingsParams>,
) -> Result<Json<BookingsResponse>, AppError> {
    let query = BookingQuery::try_from(params)?;
    let bookings = user_client(&state, &session)
        .list_bookings(&session.user_id, &query)
        .await
        .map_err(AppError::upstream("Failed to fetch bookings"))?;

    Ok(Json(BookingsResponse {
        success: true,
        bookings,
    }))
}

/// GET /api/jetshare/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = user_client(&state, &session)
        .user_stats(&session.user_id)
        .await
        .map_err(AppError::upstream("Failed to fetch stats"))?;

    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
