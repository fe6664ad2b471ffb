//! HTTP+JSON transport binding
//!
//! One POST per stage against that stage's service endpoint, plain JSON
//! bodies in both directions.

use async_trait::async_trait;
use playline_common::api::{RecommendRequest, RecordsRequest};
use playline_common::config::PipelineConfig;
use playline_common::model::{StageName, StageResult};
use playline_common::Result;
use playline_engine::{StagePayload, StageTransport};

use super::{build_client, decode_response, post_json, stage_result_from_value};

pub struct HttpJsonTransport {
    client: reqwest::Client,
    config: PipelineConfig,
}

impl HttpJsonTransport {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }

    fn url(&self, stage: StageName) -> String {
        format!("{}/{}", self.config.endpoint(stage).base_url(), stage)
    }
}

#[async_trait]
impl StageTransport for HttpJsonTransport {
    async fn invoke(&self, stage: StageName, payload: StagePayload) -> Result<StageResult> {
        let url = self.url(stage);
        let response = match payload {
            StagePayload::Records(records) => {
                post_json(
                    &self.client,
                    &url,
                    &RecordsRequest { records },
                    &self.config.retry,
                )
                .await?
            }
            StagePayload::Recommend {
                play_counts,
                user_stats,
            } => {
                post_json(
                    &self.client,
                    &url,
                    &RecommendRequest {
                        play_counts,
                        user_stats,
                    },
                    &self.config.retry,
                )
                .await?
            }
        };
        let value: serde_json::Value = decode_response(stage, response).await?;
        stage_result_from_value(stage, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_urls() {
        let transport = HttpJsonTransport::new(PipelineConfig::default()).unwrap();
        assert_eq!(
            transport.url(StageName::Counting),
            "http://127.0.0.1:5001/counting"
        );
        assert_eq!(
            transport.url(StageName::Recommendation),
            "http://127.0.0.1:5007/recommendation"
        );
    }
}
