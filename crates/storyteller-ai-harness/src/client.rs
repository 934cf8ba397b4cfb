use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::content::{Role, Turn};
use crate::errors::ClientError;
use crate::model::{ClientMode, Credential};
use crate::stub::{DEFAULT_STUB_DELAY, StubResponder};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::vendors::gemini::{
    GeminiClientConfig, GenerateContentRequest, GenerationOutcome, classify_generation,
    remote_failure,
};

/// Session-bound client that owns the transcript.
///
/// Every player turn is appended before its exchange starts and removed
/// again if the exchange fails, so at rest the transcript only holds turns
/// that were actually exchanged with the model.
///
/// The client does not serialize callers: running two `submit_turn` calls at
/// once interleaves their transcript edits. Callers gate submissions with
/// their own busy flag.
pub struct GenerationClient {
    session_id: uuid::Uuid,
    credential: Credential,
    mode: ClientMode,
    transport: Arc<dyn HttpTransport>,
    config: GeminiClientConfig,
    stub: StubResponder,
    history: Mutex<Vec<Turn>>,
}

impl GenerationClient {
    /// Starts a builder with live mode, a blank credential and the default
    /// transport.
    pub fn builder() -> GenerationClientBuilder {
        GenerationClientBuilder::default()
    }

    /// Session id used to correlate log lines.
    pub fn session_id(&self) -> uuid::Uuid {
        self.session_id
    }

    pub fn mode(&self) -> ClientMode {
        self.mode
    }

    /// Replaces the transcript with a copy of `seed`.
    pub fn initialize_history(&self, seed: &[Turn]) {
        *self.lock_history() = seed.to_vec();
        debug!(session_id = %self.session_id, turns = seed.len() as u64, "transcript initialized");
    }

    /// Returns a copy of the current transcript.
    pub fn get_history(&self) -> Vec<Turn> {
        self.lock_history().clone()
    }

    /// Submits one player utterance and returns the narrator's continuation.
    ///
    /// Blocked, empty and early-terminated responses are returned as
    /// explanatory narration rather than errors. On any error after the
    /// player turn was appended, that turn is removed before returning.
    pub async fn submit_turn(&self, prompt: &str, model_id: &str) -> Result<String, ClientError> {
        if prompt.trim().is_empty() {
            return Err(ClientError::InvalidInput("prompt must not be empty".into()));
        }
        self.lock_history().push(Turn::user(prompt));

        if self.mode == ClientMode::Stub {
            let reply = self.stub.respond().await;
            debug!(event = "generation.stubbed", session_id = %self.session_id);
            self.lock_history().push(Turn::model(reply.clone()));
            return Ok(reply);
        }

        match self.exchange(model_id).await {
            Ok(outcome) => {
                let text = outcome.narration();
                info!(
                    event = "generation.completed",
                    session_id = %self.session_id,
                    model = %model_id,
                    outcome = outcome.kind()
                );
                self.lock_history().push(Turn::model(text.clone()));
                Ok(text)
            }
            Err(err) => {
                let retracted = self.retract_pending_user_turn();
                warn!(
                    event = "generation.failed",
                    session_id = %self.session_id,
                    model = %model_id,
                    retracted,
                    error = %err
                );
                Err(err)
            }
        }
    }

    async fn exchange(&self, model_id: &str) -> Result<GenerationOutcome, ClientError> {
        if !self.credential.is_usable() {
            return Err(ClientError::MissingCredential);
        }
        let model_id = model_id.trim();
        if model_id.is_empty() {
            return Err(ClientError::MissingModel);
        }

        let (body, turns) = {
            let history = self.lock_history();
            let body = serde_json::to_value(GenerateContentRequest {
                contents: &history,
            })
            .map_err(|e| ClientError::InvalidInput(format!("failed to encode transcript: {e}")))?;
            (body, history.len())
        };
        debug!(
            event = "generation.request_started",
            session_id = %self.session_id,
            model = %model_id,
            turns = turns as u64
        );

        let reply = self
            .transport
            .post_json(&self.config.generate_url(model_id), &self.credential, &body)
            .await?;
        if !reply.is_success() {
            return Err(remote_failure(&reply));
        }
        classify_generation(&reply.body)
    }

    /// Drops the trailing turn only if it is still a player turn.
    fn retract_pending_user_turn(&self) -> bool {
        let mut history = self.lock_history();
        if history.last().is_some_and(|turn| turn.role == Role::User) {
            history.pop();
            true
        } else {
            false
        }
    }

    fn lock_history(&self) -> MutexGuard<'_, Vec<Turn>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builder for [`GenerationClient`].
pub struct GenerationClientBuilder {
    credential: Credential,
    mode: ClientMode,
    transport: Option<Arc<dyn HttpTransport>>,
    config: GeminiClientConfig,
    stub_delay: Duration,
}

impl Default for GenerationClientBuilder {
    fn default() -> Self {
        Self {
            credential: Credential::default(),
            mode: ClientMode::Live,
            transport: None,
            config: GeminiClientConfig::default(),
            stub_delay: DEFAULT_STUB_DELAY,
        }
    }
}

impl GenerationClientBuilder {
    pub fn credential(mut self, credential: impl Into<Credential>) -> Self {
        self.credential = credential.into();
        self
    }

    pub fn mode(mut self, mode: ClientMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replaces the default reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn gemini_config(mut self, config: GeminiClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Latency simulated in stub mode.
    pub fn stub_delay(mut self, delay: Duration) -> Self {
        self.stub_delay = delay;
        self
    }

    /// Builds the client. A missing credential only logs a warning.
    pub fn build(self) -> Result<GenerationClient, ClientError> {
        if !self.credential.is_usable() {
            warn!(
                event = "client.credential_missing",
                mode = ?self.mode,
                "no usable API key configured; live generation will fail until one is set"
            );
        }
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.config.timeout)?),
        };
        Ok(GenerationClient {
            session_id: uuid::Uuid::new_v4(),
            credential: self.credential,
            mode: self.mode,
            transport,
            config: self.config,
            stub: StubResponder::new(self.stub_delay),
            history: Mutex::new(Vec::new()),
        })
    }
}
