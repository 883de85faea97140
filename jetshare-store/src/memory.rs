//! In-process backend used for local development and tests.
//!
//! Mirrors the hosted services closely enough to exercise the API end to end,
//! including row-level security: anonymous clients only see reference data,
//! user clients only see offers they take part in (plus the open marketplace),
//! and privileged clients see everything.

use async_trait::async_trait;
use jetshare_core::embedding::{cosine_similarity, metadata_matches};
use jetshare_core::fleet::{sort_airports, sort_jets};
use jetshare_core::jetshare::OfferStatus;
use jetshare_core::{
    Airport, BookingQuery, ClientFactory, ClientScope, DataClient, EmbeddingRecord,
    FleetRepository, Jet, JetShareOffer, JetShareRepository, NewOffer, OfferQuery, QueryResponse,
    RepositoryError, RepositoryResult, ScoredVector, SimulationRepository, SimulationRun,
    UserStats, VectorIndex, VectorQuery,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const SERVICE: &str = "memory";

/// Initial contents for a [`MemoryStore`].
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub jets: Vec<Jet>,
    #[serde(default)]
    pub airports: Vec<Airport>,
    #[serde(default)]
    pub offers: Vec<JetShareOffer>,
    #[serde(default)]
    pub simulations: Vec<SimulationRun>,
}

#[derive(Default)]
pub struct MemoryStore {
    jets: RwLock<Vec<Jet>>,
    airports: RwLock<Vec<Airport>>,
    offers: RwLock<Vec<JetShareOffer>>,
    simulations: RwLock<Vec<SimulationRun>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Self {
        Self {
            jets: RwLock::new(seed.jets),
            airports: RwLock::new(seed.airports),
            offers: RwLock::new(seed.offers),
            simulations: RwLock::new(seed.simulations),
        }
    }

    pub async fn from_seed_file(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await.map_err(|e| RepositoryError::Configuration {
            service: SERVICE,
            message: format!("cannot read seed file {}: {}", path.display(), e),
        })?;
        let seed: Seed = serde_json::from_slice(&raw).map_err(|e| RepositoryError::Decode {
            service: SERVICE,
            message: format!("invalid seed file {}: {}", path.display(), e),
        })?;

        tracing::info!(
            "Seeded memory backend from {}: {} jets, {} airports, {} offers",
            path.display(),
            seed.jets.len(),
            seed.airports.len(),
            seed.offers.len()
        );
        Ok(Self::from_seed(seed))
    }

    pub async fn insert_jet(&self, jet: Jet) {
        self.jets.write().await.push(jet);
    }

    pub async fn insert_airport(&self, airport: Airport) {
        self.airports.write().await.push(airport);
    }

    pub async fn insert_offer(&self, offer: JetShareOffer) {
        self.offers.write().await.push(offer);
    }

    pub async fn insert_simulation(&self, run: SimulationRun) {
        self.simulations.write().await.push(run);
    }

    pub async fn offer(&self, id: Uuid) -> Option<JetShareOffer> {
        self.offers.read().await.iter().find(|o| o.id == id).cloned()
    }
}

pub struct MemoryFactory {
    store: Arc<MemoryStore>,
}

impl MemoryFactory {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

impl ClientFactory for MemoryFactory {
    fn client(&self, scope: ClientScope) -> Arc<dyn DataClient> {
        Arc::new(MemoryClient {
            store: self.store.clone(),
            scope,
        })
    }
}

pub struct MemoryClient {
    store: Arc<MemoryStore>,
    scope: ClientScope,
}

impl MemoryClient {
    fn can_see(&self, offer: &JetShareOffer) -> bool {
        match &self.scope {
            ClientScope::Privileged => true,
            ClientScope::User(session) => {
                offer.involves(&session.user_id) || offer.status == OfferStatus::Open
            }
            ClientScope::Anonymous => false,
        }
    }

    /// Writes must come from the session holder, or from a privileged client.
    fn authorize_write(&self, user_id: &str) -> RepositoryResult<()> {
        match &self.scope {
            ClientScope::Privileged => Ok(()),
            ClientScope::User(session) if session.user_id == user_id => Ok(()),
            ClientScope::User(_) => Err(RepositoryError::Rejected(
                "row-level security policy violation".to_string(),
            )),
            ClientScope::Anonymous => Err(RepositoryError::MissingUser),
        }
    }

    async fn visible_offers(&self) -> Vec<JetShareOffer> {
        self.store
            .offers
            .read()
            .await
            .iter()
            .filter(|o| self.can_see(o))
            .cloned()
            .collect()
    }
}

fn page<T>(items: Vec<T>, limit: u32, offset: u32) -> Vec<T> {
    items
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

#[async_trait]
impl FleetRepository for MemoryClient {
    async fn list_jets(&self) -> RepositoryResult<Vec<Jet>> {
        let mut jets = self.store.jets.read().await.clone();
        sort_jets(&mut jets);
        Ok(jets)
    }

    async fn list_airports(&self) -> RepositoryResult<Vec<Airport>> {
        let mut airports = self.store.airports.read().await.clone();
        sort_airports(&mut airports);
        Ok(airports)
    }
}

#[async_trait]
impl JetShareRepository for MemoryClient {
    async fn create_offer(&self, user_id: &str, offer: NewOffer) -> RepositoryResult<JetShareOffer> {
        self.authorize_write(user_id)?;
        let offer = JetShareOffer::new(user_id, offer);
        self.store.offers.write().await.push(offer.clone());
        Ok(offer)
    }

    async fn accept_offer(
        &self,
        user_id: &str,
        offer_id: Uuid,
    ) -> RepositoryResult<Option<JetShareOffer>> {
        self.authorize_write(user_id)?;
        let mut offers = self.store.offers.write().await;
        let accepted = offers
            .iter_mut()
            .find(|o| o.id == offer_id && o.can_be_accepted_by(user_id))
            .map(|offer| {
                offer.accept(user_id);
                offer.clone()
            });
        Ok(accepted)
    }

    async fn cancel_offer(&self, user_id: &str, offer_id: Uuid) -> RepositoryResult<bool> {
        self.authorize_write(user_id)?;
        let mut offers = self.store.offers.write().await;
        match offers
            .iter_mut()
            .find(|o| o.id == offer_id && o.can_be_cancelled_by(user_id))
        {
            Some(offer) => {
                offer.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_offers(
        &self,
        user_id: &str,
        query: &OfferQuery,
    ) -> RepositoryResult<Vec<JetShareOffer>> {
        let mut offers: Vec<_> = self
            .visible_offers()
            .await
            .into_iter()
            .filter(|o| query.matches(user_id, o))
            .collect();
        offers.sort_by_key(|o| o.flight_date);
        Ok(page(offers, query.limit, query.offset))
    }

    async fn list_bookings(
        &self,
        user_id: &str,
        query: &BookingQuery,
    ) -> RepositoryResult<Vec<JetShareOffer>> {
        let mut bookings: Vec<_> = self
            .visible_offers()
            .await
            .into_iter()
            .filter(|o| query.matches(user_id, o))
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(bookings, query.limit, query.offset))
    }

    async fn user_stats(&self, user_id: &str) -> RepositoryResult<UserStats> {
        let offers = self.visible_offers().await;
        Ok(UserStats::from_offers(user_id, &offers))
    }
}

#[async_trait]
impl SimulationRepository for MemoryClient {
    async fn list_runs(&self, limit: u32) -> RepositoryResult<Vec<SimulationRun>> {
        let mut runs: Vec<_> = self
            .store
            .simulations
            .read()
            .await
            .iter()
            .filter(|run| match &self.scope {
                ClientScope::Privileged => true,
                ClientScope::User(session) => run.user_id.as_deref() == Some(session.user_id.as_str()),
                ClientScope::Anonymous => false,
            })
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs.truncate(limit as usize);
        Ok(runs)
    }
}

#[derive(Default)]
struct IndexState {
    dimension: Option<usize>,
    namespaces: HashMap<String, HashMap<String, EmbeddingRecord>>,
}

/// Exact-search vector index. Every namespace shares the dimension of the
/// first vector written.
#[derive(Default)]
pub struct MemoryVectorIndex {
    state: RwLock<IndexState>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, namespace: Option<&str>) -> usize {
        self.state
            .read()
            .await
            .namespaces
            .get(namespace.unwrap_or_default())
            .map_or(0, |ns| ns.len())
    }
}

fn dimension_mismatch(expected: usize, actual: usize) -> RepositoryError {
    RepositoryError::Api {
        service: SERVICE,
        status: 400,
        message: format!(
            "Vector dimension {} does not match the dimension of the index {}",
            actual, expected
        ),
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, record: EmbeddingRecord, namespace: Option<&str>) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        match state.dimension {
            Some(dim) if dim != record.values.len() => {
                return Err(dimension_mismatch(dim, record.values.len()));
            }
            None => state.dimension = Some(record.values.len()),
            _ => {}
        }

        state
            .namespaces
            .entry(namespace.unwrap_or_default().to_string())
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn query(&self, query: &VectorQuery) -> RepositoryResult<QueryResponse> {
        let state = self.state.read().await;
        if let Some(dim) = state.dimension {
            if dim != query.vector.len() {
                return Err(dimension_mismatch(dim, query.vector.len()));
            }
        }

        let namespace = query.namespace.clone().unwrap_or_default();
        let mut matches: Vec<ScoredVector> = state
            .namespaces
            .get(&namespace)
            .into_iter()
            .flat_map(|ns| ns.values())
            .filter(|record| {
                query
                    .filter
                    .as_ref()
                    .map_or(true, |f| metadata_matches(f, record.metadata.as_ref()))
            })
            .map(|record| ScoredVector {
                id: record.id.clone(),
                score: f64::from(cosine_similarity(&query.vector, &record.values)),
                // the hosted index reports an empty list when values are not requested
                values: Some(if query.include_values { record.values.clone() } else { Vec::new() }),
                metadata: if query.include_metadata { record.metadata.clone() } else { None },
                ..ScoredVector::default()
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(query.top_k as usize);

        Ok(QueryResponse {
            matches,
            namespace: Some(namespace),
            ..QueryResponse::default()
        })
    }

    async fn delete(&self, id: &str, namespace: Option<&str>) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if let Some(ns) = state.namespaces.get_mut(namespace.unwrap_or_default()) {
            ns.remove(id);
        }
        Ok(())
    }
}
