use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, error, info};
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    error::{DeskError, Result},
    input::ClaimInput,
    model::RoutingDecision,
};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// The external claim classification backend.
///
/// Implementations report every failure of `classify` as `SubmissionFailed` and every
/// failure of the read operations as `FetchFailed`. No retries happen at this layer.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// `POST /submit-claim`
    async fn classify(&self, input: &ClaimInput) -> Result<RoutingDecision>;

    /// `GET /adjuster-dashboard[?team=...]`. `None` lists every decision.
    async fn list_decisions(&self, team: Option<&str>) -> Result<Vec<RoutingDecision>>;

    /// `GET /claim/{claim_id}`
    async fn get_claim(&self, claim_id: &str) -> Result<RoutingDecision>;

    /// `GET /healthz`
    async fn health(&self) -> Result<()>;
}

/// HTTP implementation of ClassificationService
#[derive(Clone)]
pub struct HttpClassificationService {
    client: Client,
    config: ClientConfig,
}

impl HttpClassificationService {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DeskError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends `request` tagged with a fresh correlation id and decodes a JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> std::result::Result<T, reqwest::Error> {
        let correlation_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "backend_request",
            operation = operation,
            correlation_id = %correlation_id
        );

        async move {
            debug!("Sending request");
            let response = request
                .header(CORRELATION_HEADER, &correlation_id)
                .send()
                .await?
                .error_for_status()?;
            debug!(status = %response.status(), "Received response");
            response.json::<T>().await
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl ClassificationService for HttpClassificationService {
    async fn classify(&self, input: &ClaimInput) -> Result<RoutingDecision> {
        let request = self.client.post(self.config.endpoint("submit-claim")).json(input);

        let decision: RoutingDecision = self.send("submit_claim", request).await.map_err(|e| {
            error!(error = %e, "Error submitting claim");
            DeskError::SubmissionFailed(e.to_string())
        })?;

        info!(
            claim_id = %decision.claim_id(),
            team = %decision.assigned_team(),
            urgency = %decision.urgency(),
            "Claim classified"
        );
        Ok(decision)
    }

    async fn list_decisions(&self, team: Option<&str>) -> Result<Vec<RoutingDecision>> {
        let url = match team {
            Some(team) => format!(
                "{}?team={}",
                self.config.endpoint("adjuster-dashboard"),
                urlencoding::encode(team)
            ),
            None => self.config.endpoint("adjuster-dashboard"),
        };

        let decisions: Vec<RoutingDecision> = self
            .send("adjuster_dashboard", self.client.get(url))
            .await
            .map_err(|e| {
                error!(error = %e, team = ?team, "Error fetching adjuster dashboard");
                DeskError::FetchFailed(e.to_string())
            })?;

        info!(team = ?team, count = decisions.len(), "Fetched decisions");
        Ok(decisions)
    }

    async fn get_claim(&self, claim_id: &str) -> Result<RoutingDecision> {
        let url = self
            .config
            .endpoint(&format!("claim/{}", urlencoding::encode(claim_id)));

        self.send("get_claim", self.client.get(url))
            .await
            .map_err(|e| {
                error!(error = %e, claim_id = %claim_id, "Error fetching claim");
                DeskError::FetchFailed(e.to_string())
            })
    }

    async fn health(&self) -> Result<()> {
        let _: serde_json::Value = self
            .send("healthz", self.client.get(self.config.endpoint("healthz")))
            .await
            .map_err(|e| DeskError::FetchFailed(e.to_string()))?;
        Ok(())
    }
}
