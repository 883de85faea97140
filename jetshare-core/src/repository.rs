use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::embedding::{EmbeddingRecord, QueryResponse, VectorQuery};
use crate::fleet::{Airport, Jet};
use crate::identity::ClientScope;
use crate::jetshare::{BookingQuery, JetShareOffer, NewOffer, OfferQuery, UserStats};
use crate::simulation::SimulationRun;

/// Failure talking to a backing service.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("request to {service} failed: {message}")]
    Transport { service: &'static str, message: String },
    #[error("{service} returned {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("could not decode {service} response: {message}")]
    Decode { service: &'static str, message: String },
    #[error("{service} is not configured: {message}")]
    Configuration { service: &'static str, message: String },
    #[error("operation requires an authenticated user")]
    MissingUser,
    #[error("{0}")]
    Rejected(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Read-only reference data: jets and airports.
#[async_trait]
pub trait FleetRepository: Send + Sync {
    /// Jets ordered by manufacturer, then model.
    async fn list_jets(&self) -> RepositoryResult<Vec<Jet>>;

    /// Airports ordered by city.
    async fn list_airports(&self) -> RepositoryResult<Vec<Airport>>;
}

/// Flight-share offers and the bookings they turn into.
///
/// Every method acts on behalf of `user_id`; implementations must not let a
/// caller mutate an offer they are not allowed to touch.
#[async_trait]
pub trait JetShareRepository: Send + Sync {
    async fn create_offer(&self, user_id: &str, offer: NewOffer) -> RepositoryResult<JetShareOffer>;

    /// Returns the accepted offer, or `None` if it is not open or belongs to the caller.
    async fn accept_offer(&self, user_id: &str, offer_id: Uuid)
        -> RepositoryResult<Option<JetShareOffer>>;

    /// Returns `true` when the offer was owned by the caller and still cancellable.
    async fn cancel_offer(&self, user_id: &str, offer_id: Uuid) -> RepositoryResult<bool>;

    /// Open offers from other users, soonest flight first.
    async fn list_offers(&self, user_id: &str, query: &OfferQuery)
        -> RepositoryResult<Vec<JetShareOffer>>;

    /// Offers the caller created or accepted, newest first.
    async fn list_bookings(&self, user_id: &str, query: &BookingQuery)
        -> RepositoryResult<Vec<JetShareOffer>>;

    async fn user_stats(&self, user_id: &str) -> RepositoryResult<UserStats>;
}

#[async_trait]
pub trait SimulationRepository: Send + Sync {
    /// Most recent runs first.
    async fn list_runs(&self, limit: u32) -> RepositoryResult<Vec<SimulationRun>>;
}

/// Everything a scoped data client can do.
pub trait DataClient: FleetRepository + JetShareRepository + SimulationRepository {}

impl<T> DataClient for T where T: FleetRepository + JetShareRepository + SimulationRepository {}

/// Single entry point for acquiring data clients. Handlers state the
/// capability they need; the factory decides which credentials that means.
pub trait ClientFactory: Send + Sync {
    fn client(&self, scope: ClientScope) -> Arc<dyn DataClient>;
}

/// Similarity index over embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, record: EmbeddingRecord, namespace: Option<&str>) -> RepositoryResult<()>;

    async fn query(&self, query: &VectorQuery) -> RepositoryResult<QueryResponse>;

    async fn delete(&self, id: &str, namespace: Option<&str>) -> RepositoryResult<()>;
}
