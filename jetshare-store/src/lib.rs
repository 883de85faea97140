pub mod app_config;
pub mod backend;
pub mod memory;
pub mod pinecone;
pub mod supabase;

mod fleet_repo;
mod http;
mod jetshare_repo;
mod simulation_repo;

pub use backend::Backends;
pub use memory::{MemoryFactory, MemoryStore, MemoryVectorIndex};
pub use pinecone::{PineconeIndex, UnconfiguredIndex};
pub use supabase::{SupabaseClient, SupabaseFactory};
