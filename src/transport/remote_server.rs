use async_trait::async_trait;
use reqwest::{header::ACCEPT, StatusCode};
use tracing::trace;
use url::{ParseError, Url};

use super::interface::Transport;
use crate::error::{ClientError, ErrorDetails, ErrorLayer, Result};

/// reqwest won't return an error for an unhappy status code itself; someone
/// would need to call `Response::error_for_status`, so anything coming out of
/// reqwest directly is a connect/read level problem that might go away.
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> ClientError {
        ClientError::Transport(ErrorDetails {
            layer: ErrorLayer::ServerLayer,
            message: err.to_string(),
        })
    }
}

impl From<ParseError> for ClientError {
    fn from(err: ParseError) -> ClientError {
        ClientError::Transport(ErrorDetails {
            layer: ErrorLayer::BadInput,
            message: err.to_string(),
        })
    }
}

#[derive(Debug)]
struct RemoteServer {
    server_base_url: Url,
    client: reqwest::Client,
}

/// Map a non-success status onto the error layer callers retry on: a 5xx is
/// the server's problem and may clear up, anything else means the request or
/// the data it names is wrong.
fn status_error(status: StatusCode) -> Option<ClientError> {
    if status.is_success() {
        return None;
    }
    let layer = if status.is_server_error() {
        ErrorLayer::ServerLayer
    } else {
        ErrorLayer::DataLayer
    };
    Some(ClientError::Transport(ErrorDetails {
        layer,
        message: format!("Server status of {}", status),
    }))
}

async fn get_json(client: &reqwest::Client, url: Url) -> Result<reqwest::Response> {
    let res = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    match status_error(res.status()) {
        Some(err) => Err(err),
        None => Ok(res),
    }
}

#[async_trait]
impl Transport for RemoteServer {
    fn describe(&self) -> String {
        format!("remote {}", self.server_base_url)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let full_url = self.server_base_url.join(url)?;
        trace!(url = %full_url, "fetch");
        let raw_str = get_json(&self.client, full_url).await?.text().await?;
        Ok(raw_str)
    }
}

/// The base URL should end in a `/` if it has a path component; relative
/// request URLs are resolved against it with normal URL join semantics.
pub fn make_remote_server(server_base_url: Url) -> Result<Box<dyn Transport + Send + Sync>> {
    if server_base_url.cannot_be_a_base() {
        return Err(ClientError::Transport(ErrorDetails {
            layer: ErrorLayer::BadInput,
            message: format!("not usable as a base URL: {}", server_base_url),
        }));
    }

    Ok(Box::new(RemoteServer {
        server_base_url,
        client: reqwest::Client::new(),
    }))
}
