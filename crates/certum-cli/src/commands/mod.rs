//! Subcommand implementations and the shared HTTP plumbing they use.

pub mod holder;
pub mod issue;
pub mod keys;
pub mod metadata;
pub mod record;
pub mod revoke;
pub mod status;
pub mod verify;

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Default API endpoint of a local node.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9001";

/// Error body returned by the node.
#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
    kind: String,
}

/// Join an endpoint and an API path.
pub fn api_url(endpoint: &str, path: &str) -> String {
    format!("{}/api/v1/{}", endpoint.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send a request, failing with a readable message if the node is down.
async fn send(request: reqwest::RequestBuilder, endpoint: &str) -> anyhow::Result<reqwest::Response> {
    let request = request.build()?;
    tracing::debug!(method = %request.method(), url = %request.url(), "sending request");
    reqwest::Client::new().execute(request).await.map_err(|e| {
        anyhow::anyhow!(
            "could not reach node at {}: {}\nIs the node running? Start it with: certum-node",
            endpoint,
            e
        )
    })
}

/// Decode a successful response, or turn the node's error body into an error.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response, action: &str) -> anyhow::Result<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    match resp.json::<ErrorResponse>().await {
        Ok(err) => anyhow::bail!("{} failed (HTTP {}, {}): {}", action, status, err.kind, err.error),
        Err(_) => anyhow::bail!("{} failed (HTTP {})", action, status),
    }
}

/// GET `path` and decode the JSON body.
pub async fn get_json<T: DeserializeOwned>(endpoint: &str, path: &str, action: &str) -> anyhow::Result<T> {
    let resp = send(reqwest::Client::new().get(api_url(endpoint, path)), endpoint).await?;
    read_json(resp, action).await
}

/// POST `body` to `path` and decode the JSON reply.
pub async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
    endpoint: &str,
    path: &str,
    body: &B,
    action: &str,
) -> anyhow::Result<T> {
    let resp = send(
        reqwest::Client::new().post(api_url(endpoint, path)).json(body),
        endpoint,
    )
    .await?;
    read_json(resp, action).await
}
