pub mod fleet;
pub mod jetshare;
pub mod embedding;
pub mod simulation;
pub mod identity;
pub mod repository;

pub use fleet::{Airport, Jet};
pub use jetshare::{
    BookingQuery, JetShareOffer, NewOffer, OfferQuery, OfferStatus, StatsRow, UserStats,
};
pub use embedding::{EmbeddingRecord, QueryResponse, ScoredVector, VectorQuery};
pub use simulation::SimulationRun;
pub use identity::{ClientScope, Session};
pub use repository::{
    ClientFactory, DataClient, FleetRepository, JetShareRepository, RepositoryError,
    RepositoryResult, SimulationRepository, VectorIndex,
};
