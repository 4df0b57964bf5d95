use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tracing::trace;

use super::interface::Transport;
use crate::error::{ClientError, ErrorDetails, ErrorLayer, Result};

#[derive(Clone, Debug)]
enum CannedResponse {
    Body(String),
    Status(u16),
}

/// Transport that answers from a fixed map of URL to response body.  Every
/// fetch is recorded (including failed ones) so that the order in which a
/// session issued its requests can be checked afterwards.
#[derive(Clone, Debug, Default)]
pub struct CannedServer {
    responses: HashMap<String, CannedResponse>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), CannedResponse::Body(body.to_string()));
        self
    }

    /// Make `url` fail the way a non-success HTTP status would.
    pub fn fail(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), CannedResponse::Status(status));
        self
    }

    /// Shared handle on the fetch log; it stays valid after the server has
    /// been boxed up and handed to a session.
    pub fn fetch_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.fetched.clone()
    }
}

#[async_trait]
impl Transport for CannedServer {
    fn describe(&self) -> String {
        format!("canned ({} urls)", self.responses.len())
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        trace!(url, "canned fetch");
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(url.to_string());
        }

        match self.responses.get(url) {
            Some(CannedResponse::Body(body)) => Ok(body.clone()),
            Some(CannedResponse::Status(status)) => Err(ClientError::Transport(ErrorDetails {
                layer: if *status >= 500 {
                    ErrorLayer::ServerLayer
                } else {
                    ErrorLayer::DataLayer
                },
                message: format!("Server status of {}", status),
            })),
            None => Err(ClientError::Transport(ErrorDetails {
                layer: ErrorLayer::DataLayer,
                message: format!("Server status of 404 for {}", url),
            })),
        }
    }
}

pub fn make_canned_server(responses: &[(&str, &str)]) -> CannedServer {
    responses
        .iter()
        .fold(CannedServer::new(), |server, (url, body)| {
            server.respond(url, body)
        })
}
