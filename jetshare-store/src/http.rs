use jetshare_core::{RepositoryError, RepositoryResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) fn build_client(service: &'static str, timeout_secs: u64) -> RepositoryResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RepositoryError::Configuration {
            service,
            message: e.to_string(),
        })
}

/// Sends the request and fails on any non-2xx status, carrying the upstream message.
pub(crate) async fn send(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> RepositoryResult<reqwest::Response> {
    let response = request.send().await.map_err(|e| {
        tracing::error!("{} request failed: {}", service, e);
        RepositoryError::Transport {
            service,
            message: e.to_string(),
        }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = upstream_message(&body).unwrap_or_else(|| {
        if body.is_empty() {
            status.canonical_reason().unwrap_or("unknown error").to_string()
        } else {
            body.clone()
        }
    });

    tracing::error!(status = status.as_u16(), message = %message, "{} returned an error", service);

    Err(RepositoryError::Api {
        service,
        status: status.as_u16(),
        message,
    })
}

pub(crate) async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> RepositoryResult<T> {
    let response = send(service, request).await?;
    response.json::<T>().await.map_err(|e| RepositoryError::Decode {
        service,
        message: e.to_string(),
    })
}

/// Pulls a human-readable message out of an error body. Both PostgREST
/// (`{"message": ..}`) and Pinecone (`{"error": {"message": ..}}`) shapes are understood.
fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error").and_then(|e| e.get("message")))
        .or_else(|| value.get("error"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
