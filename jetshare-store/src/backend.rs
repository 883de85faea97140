use jetshare_core::{ClientFactory, RepositoryError, RepositoryResult, VectorIndex};
use std::sync::Arc;

use crate::app_config::{BackendKind, Config};
use crate::memory::{MemoryFactory, MemoryStore, MemoryVectorIndex};
use crate::pinecone::{PineconeIndex, UnconfiguredIndex};
use crate::supabase::SupabaseFactory;

/// The external services a running API talks to.
#[derive(Clone)]
pub struct Backends {
    pub clients: Arc<dyn ClientFactory>,
    pub vectors: Arc<dyn VectorIndex>,
}

impl Backends {
    pub async fn from_config(config: &Config) -> RepositoryResult<Self> {
        match config.backend.kind {
            BackendKind::Supabase => {
                tracing::info!("Using Supabase at {}", config.supabase.url);
                let vectors: Arc<dyn VectorIndex> = match PineconeIndex::new(&config.pinecone) {
                    Ok(index) => Arc::new(index),
                    Err(RepositoryError::Configuration { message, .. }) => {
                        tracing::warn!("Pinecone disabled, embedding routes will fail: {}", message);
                        Arc::new(UnconfiguredIndex::new(message))
                    }
                    Err(e) => return Err(e),
                };
                Ok(Self {
                    clients: Arc::new(SupabaseFactory::new(&config.supabase)?),
                    vectors,
                })
            }
            BackendKind::Memory => {
                let store = match &config.backend.seed_file {
                    Some(path) => MemoryStore::from_seed_file(path).await?,
                    None => MemoryStore::new(),
                };
                tracing::warn!("Using in-memory backend; data is lost on restart");
                Ok(Self::in_memory(Arc::new(store)))
            }
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            clients: Arc::new(MemoryFactory::new(store)),
            vectors: Arc::new(MemoryVectorIndex::new()),
        }
    }
}
