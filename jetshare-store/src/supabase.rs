use jetshare_core::{ClientFactory, ClientScope, DataClient, RepositoryResult};
use reqwest::{Method, RequestBuilder};
use std::sync::Arc;

use crate::app_config::SupabaseConfig;
use crate::http;

pub(crate) const SERVICE: &str = "supabase";

/// Hands out PostgREST clients carrying the credentials for a scope.
pub struct SupabaseFactory {
    http: reqwest::Client,
    rest_url: String,
    anon_key: String,
    service_role_key: String,
}

impl SupabaseFactory {
    pub fn new(config: &SupabaseConfig) -> RepositoryResult<Self> {
        let http = http::build_client(SERVICE, config.request_timeout_secs)?;
        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    pub fn scoped(&self, scope: &ClientScope) -> SupabaseClient {
        let (api_key, bearer) = match scope {
            ClientScope::Anonymous => (self.anon_key.clone(), self.anon_key.clone()),
            ClientScope::User(session) => (self.anon_key.clone(), session.access_token.clone()),
            ClientScope::Privileged => (self.service_role_key.clone(), self.service_role_key.clone()),
        };

        SupabaseClient {
            http: self.http.clone(),
            rest_url: self.rest_url.clone(),
            api_key,
            bearer,
            scope: scope.label(),
        }
    }
}

impl ClientFactory for SupabaseFactory {
    fn client(&self, scope: ClientScope) -> Arc<dyn DataClient> {
        Arc::new(self.scoped(&scope))
    }
}

/// A PostgREST client bound to one set of credentials.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
    bearer: String,
    scope: &'static str,
}

impl SupabaseClient {
    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub(crate) fn table(&self, method: Method, table: &str) -> RequestBuilder {
        tracing::debug!("supabase {} {} ({} scope)", method, table, self.scope);
        self.http
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    /// Mutations that should echo the affected rows back.
    pub(crate) fn returning(&self, method: Method, table: &str) -> RequestBuilder {
        self.table(method, table)
            .header("Prefer", "return=representation")
    }
}

/// Quotes a value for use inside a PostgREST logical filter such as `or=(..)`.
pub(crate) fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
