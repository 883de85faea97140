use async_trait::async_trait;
use jetshare_core::{
    EmbeddingRecord, QueryResponse, RepositoryError, RepositoryResult, VectorIndex, VectorQuery,
};
use serde::Serialize;

use crate::app_config::PineconeConfig;
use crate::http;

const SERVICE: &str = "pinecone";
const API_VERSION: &str = "2024-10";

#[derive(Debug, Serialize)]
struct UpsertBody<'a> {
    vectors: [&'a EmbeddingRecord; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeleteBody<'a> {
    ids: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

/// Data-plane client for one Pinecone index.
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    http: reqwest::Client,
    host: String,
    api_key: String,
}

impl PineconeIndex {
    pub fn new(config: &PineconeConfig) -> RepositoryResult<Self> {
        if config.api_key.is_empty() || config.index_host.is_empty() {
            return Err(RepositoryError::Configuration {
                service: SERVICE,
                message: "api_key and index_host are required".to_string(),
            });
        }

        Ok(Self {
            http: http::build_client(SERVICE, config.request_timeout_secs)?,
            host: normalize_host(&config.index_host),
            api_key: config.api_key.clone(),
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, record: EmbeddingRecord, namespace: Option<&str>) -> RepositoryResult<()> {
        let body = UpsertBody {
            vectors: [&record],
            namespace,
        };
        http::send(SERVICE, self.post("/vectors/upsert").json(&body)).await?;
        tracing::debug!("Upserted embedding {} into namespace {:?}", record.id, namespace);
        Ok(())
    }

    async fn query(&self, query: &VectorQuery) -> RepositoryResult<QueryResponse> {
        http::send_json(SERVICE, self.post("/query").json(query)).await
    }

    async fn delete(&self, id: &str, namespace: Option<&str>) -> RepositoryResult<()> {
        let body = DeleteBody { ids: [id], namespace };
        http::send(SERVICE, self.post("/vectors/delete").json(&body)).await?;
        Ok(())
    }
}

/// Stands in for the index when no Pinecone credentials are configured, so
/// the rest of the API still serves and the embedding routes fail per call.
#[derive(Debug, Clone)]
pub struct UnconfiguredIndex {
    reason: String,
}

impl UnconfiguredIndex {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> RepositoryError {
        RepositoryError::Configuration {
            service: SERVICE,
            message: self.reason.clone(),
        }
    }
}

#[async_trait]
impl VectorIndex for UnconfiguredIndex {
    async fn upsert(&self, _record: EmbeddingRecord, _namespace: Option<&str>) -> RepositoryResult<()> {
        Err(self.error())
    }

    async fn query(&self, _query: &VectorQuery) -> RepositoryResult<QueryResponse> {
        Err(self.error())
    }

    async fn delete(&self, _id: &str, _namespace: Option<&str>) -> RepositoryResult<()> {
        Err(self.error())
    }
}
