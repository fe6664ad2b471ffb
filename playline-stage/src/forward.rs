//! Downstream forwarding client for the chain topology

use playline_common::api::{ChainRequest, ErrorResponse};
use playline_common::model::AccumulatedResult;
use playline_common::{Error, Result, TransportKind};
use std::time::Duration;

/// A failed forward call
#[derive(Debug)]
pub enum ForwardError {
    /// The downstream hop answered with a structured error; propagated
    /// unchanged (same status, same body) to our own caller.
    Upstream { status: u16, body: ErrorResponse },
    /// The downstream hop could not be reached or spoke garbage
    Transport(Error),
}

/// Posts chain hops to the single configured downstream stage
pub struct ForwardClient {
    client: reqwest::Client,
    url: String,
}

impl ForwardClient {
    pub fn new(next_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("cannot build forward client: {}", e)))?;
        Ok(Self {
            client,
            url: format!("{}/process", next_url.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn forward(
        &self,
        request: &ChainRequest,
    ) -> std::result::Result<AccumulatedResult, ForwardError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ForwardError::Transport(transport_error(&e)))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<AccumulatedResult>()
                .await
                .map_err(|e| ForwardError::Transport(transport_error(&e)))
        } else {
            match response.json::<ErrorResponse>().await {
                Ok(body) => Err(ForwardError::Upstream {
                    status: status.as_u16(),
                    body,
                }),
                Err(_) => Err(ForwardError::Transport(Error::Transport {
                    kind: TransportKind::Protocol,
                    message: format!("downstream returned HTTP {} with unreadable body", status),
                })),
            }
        }
    }
}

fn transport_error(e: &reqwest::Error) -> Error {
    let kind = if e.is_timeout() {
        TransportKind::Timeout
    } else if e.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Protocol
    };
    Error::Transport {
        kind,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_url_normalization() {
        let client = ForwardClient::new("http://localhost:5003/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url(), "http://localhost:5003/process");
    }
}
