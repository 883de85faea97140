use async_trait::async_trait;
use jetshare_core::{RepositoryResult, SimulationRepository, SimulationRun};
use reqwest::Method;

use crate::http;
use crate::supabase::{SupabaseClient, SERVICE};

#[async_trait]
impl SimulationRepository for SupabaseClient {
    async fn list_runs(&self, limit: u32) -> RepositoryResult<Vec<SimulationRun>> {
        let request = self.table(Method::GET, "simulation_history").query(&[
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]);

        http::send_json(SERVICE, request).await
    }
}
