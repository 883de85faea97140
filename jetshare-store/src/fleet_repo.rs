use async_trait::async_trait;
use jetshare_core::{Airport, FleetRepository, Jet, RepositoryResult};
use reqwest::Method;

use crate::http;
use crate::supabase::{SupabaseClient, SERVICE};

#[async_trait]
impl FleetRepository for SupabaseClient {
    async fn list_jets(&self) -> RepositoryResult<Vec<Jet>> {
        let request = self
            .table(Method::GET, "jets")
            .query(&[("select", "*"), ("order", "manufacturer.asc,model.asc")]);

        http::send_json(SERVICE, request).await
    }

    async fn list_airports(&self) -> RepositoryResult<Vec<Airport>> {
        let request = self
            .table(Method::GET, "airports")
            .query(&[("select", "code,name,city,country"), ("order", "city.asc")]);

        http::send_json(SERVICE, request).await
    }
}
