//! Chain-forwarding entry client
//!
//! The driver talks only to the first stage. Each stage service computes
//! its own result, appends it to the accumulated map, and forwards the
//! whole request to the next stage; the final stage replies with the
//! completed accumulation, which flows back through every hop.

use playline_common::api::ChainRequest;
use playline_common::config::PipelineConfig;
use playline_common::model::{AccumulatedResult, StageName, StreamRecord};
use playline_common::Result;

use super::{build_client, decode_response, post_json};

pub struct ChainClient {
    client: reqwest::Client,
    config: PipelineConfig,
}

impl ChainClient {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }

    fn entry_url(&self) -> String {
        format!(
            "{}/process",
            self.config.endpoint(StageName::Counting).base_url()
        )
    }

    /// Run the whole pipeline through the forwarding chain. One request in,
    /// the fully accumulated result out.
    pub async fn run(&self, records: &[StreamRecord]) -> Result<AccumulatedResult> {
        let request = ChainRequest {
            records: records.to_vec(),
            accumulated: AccumulatedResult::new(),
        };
        let response = post_json(
            &self.client,
            &self.entry_url(),
            &request,
            &self.config.retry,
        )
        .await?;
        decode_response(StageName::Counting, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_enters_at_counting() {
        let client = ChainClient::new(PipelineConfig::default()).unwrap();
        assert_eq!(client.entry_url(), "http://127.0.0.1:5001/process");
    }
}
