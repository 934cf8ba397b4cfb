//! Play-session orchestration: catalog loading policy and the turn gate.
//!
//! All page-level state lives in one [`AppState`] owned by [`StoryApp`]. The
//! state mutex is only held between suspension points, never across one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storyteller_ai_harness::{CatalogEntry, CatalogSource, ClientError, GenerationClient, Turn};
use tracing::{debug, info, warn};

use crate::cache::CatalogCache;

/// Catalog loading lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    LoadingModels,
    Ready,
    NoModelsAvailable,
}

/// Result of a `load_models` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A load was already running; nothing happened.
    Ignored,
    /// Served from the cache without contacting the remote catalog.
    FromCache(usize),
    /// Fetched from the remote catalog.
    Fetched(usize),
    /// The fetch failed or returned nothing.
    NoModels,
}

/// Result of a `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A generation was already outstanding; the prompt was dropped.
    Ignored,
    Replied(String),
    Failed(ClientError),
}

/// Everything the front end renders besides the transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub load_state: LoadState,
    /// Selectable models in display order.
    pub models: Vec<CatalogEntry>,
    pub selected_model: Option<String>,
    /// Whether model-dependent controls are usable.
    pub models_enabled: bool,
    pub is_loading_models: bool,
    pub is_generating: bool,
    /// Message of the most recent failure, cleared when a new action starts.
    pub last_error: Option<String>,
}

/// Composes the generation client, the catalog source and the catalog cache.
pub struct StoryApp {
    state: Mutex<AppState>,
    client: GenerationClient,
    cache: CatalogCache,
    catalog: Arc<dyn CatalogSource>,
    preferred_model: Option<String>,
}

impl StoryApp {
    pub fn new(
        client: GenerationClient,
        cache: CatalogCache,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        Self {
            state: Mutex::new(AppState::default()),
            client,
            cache,
            catalog,
            preferred_model: None,
        }
    }

    /// Model to select after a load when the catalog lists it.
    pub fn with_preferred_model(mut self, model: Option<String>) -> Self {
        self.preferred_model = model.filter(|m| !m.trim().is_empty());
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.lock_state().clone()
    }

    /// Snapshot of the transcript.
    pub fn history(&self) -> Vec<Turn> {
        self.client.get_history()
    }

    /// Seeds the transcript, typically with the opening narration.
    pub fn start_story(&self, seed: &[Turn]) {
        self.client.initialize_history(seed);
    }

    /// Selects a model from the loaded catalog.
    pub fn select_model(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.lock_state();
        if !state.models.iter().any(|m| m.id == id) {
            return Err(ClientError::InvalidInput(format!("unknown model: {id}")));
        }
        state.selected_model = Some(id.to_string());
        Ok(())
    }

    /// Loads the model catalog, cache first unless `force_refresh`.
    ///
    /// A call made while another load is running returns
    /// `LoadOutcome::Ignored` without touching the cache or the network.
    pub async fn load_models(&self, force_refresh: bool) -> LoadOutcome {
        {
            let mut state = self.lock_state();
            if state.is_loading_models {
                debug!(event = "catalog.load_ignored", force_refresh);
                return LoadOutcome::Ignored;
            }
            state.is_loading_models = true;
            state.load_state = LoadState::LoadingModels;
            state.models_enabled = false;
            state.last_error = None;
        }

        if !force_refresh {
            match self.cache.get().await {
                Ok(Some(entries)) => {
                    let count = entries.len();
                    info!(event = "catalog.served_from_cache", entries = count as u64);
                    self.populate(entries);
                    self.mark_ready();
                    return LoadOutcome::FromCache(count);
                }
                Ok(None) => debug!(event = "cache.miss"),
                Err(err) => warn!(event = "cache.read_failed", error = %err),
            }
        }

        match self.catalog.list_catalog().await {
            Ok(entries) if !entries.is_empty() => {
                let count = entries.len();
                self.populate(entries.clone());
                if let Err(err) = self.cache.put(&entries).await {
                    warn!(event = "cache.write_failed", error = %err);
                    self.lock_state().last_error =
                        Some(format!("model list could not be cached: {err}"));
                }
                self.mark_ready();
                LoadOutcome::Fetched(count)
            }
            Ok(_) => {
                self.mark_no_models("no text-generation models are available for this API key");
                LoadOutcome::NoModels
            }
            Err(err) => {
                warn!(event = "catalog.load_failed", error = %err);
                self.mark_no_models(&err.to_string());
                LoadOutcome::NoModels
            }
        }
    }

    /// Sends one player action through the generation client.
    ///
    /// Dropped with `SubmitOutcome::Ignored` while a previous action is still
    /// outstanding.
    pub async fn submit(&self, prompt: &str) -> SubmitOutcome {
        let model = {
            let mut state = self.lock_state();
            if state.is_generating {
                debug!(event = "generation.submit_ignored");
                return SubmitOutcome::Ignored;
            }
            state.is_generating = true;
            state.last_error = None;
            state.selected_model.clone().unwrap_or_default()
        };

        let result = self.client.submit_turn(prompt, &model).await;

        let mut state = self.lock_state();
        state.is_generating = false;
        match result {
            Ok(text) => SubmitOutcome::Replied(text),
            Err(err) => {
                state.last_error = Some(err.to_string());
                SubmitOutcome::Failed(err)
            }
        }
    }

    fn populate(&self, entries: Vec<CatalogEntry>) {
        let mut state = self.lock_state();
        let selected = pick_selection(
            &entries,
            state.selected_model.as_deref(),
            self.preferred_model.as_deref(),
        );
        state.models = entries;
        state.selected_model = selected;
    }

    fn mark_ready(&self) {
        let mut state = self.lock_state();
        state.load_state = LoadState::Ready;
        state.models_enabled = true;
        state.is_loading_models = false;
    }

    fn mark_no_models(&self, message: &str) {
        let mut state = self.lock_state();
        state.load_state = LoadState::NoModelsAvailable;
        state.models.clear();
        state.selected_model = None;
        state.models_enabled = false;
        state.is_loading_models = false;
        state.last_error = Some(message.to_string());
    }

    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps the current selection when still listed, then tries the preferred
/// model, then the first entry.
fn pick_selection(
    entries: &[CatalogEntry],
    current: Option<&str>,
    preferred: Option<&str>,
) -> Option<String> {
    let listed = |id: &str| entries.iter().any(|e| e.id == id);
    current
        .filter(|id| listed(id))
        .or(preferred.filter(|id| listed(id)))
        .map(str::to_string)
        .or_else(|| entries.first().map(|e| e.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::store::{MemoryRecordStore, RecordStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use storyteller_ai_harness::{
        ClientMode, Credential, HttpReply, HttpTransport, Role, StubCatalog,
    };
    use tokio::sync::Notify;

    fn entry(id: &str, name: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.into(),
            display_name: name.into(),
            description: String::new(),
            tier: None,
        }
    }

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            entry("gemini-1.5-flash-latest", "Gemini 1.5 Flash"),
            entry("gemini-1.5-pro-latest", "Gemini 1.5 Pro"),
        ]
    }

    #[derive(Default)]
    struct Gate {
        started: Notify,
        release: Notify,
    }

    struct FakeCatalog {
        result: Result<Vec<CatalogEntry>, ClientError>,
        calls: AtomicUsize,
        gate: Option<Arc<Gate>>,
    }

    impl FakeCatalog {
        fn returning(result: Result<Vec<CatalogEntry>, ClientError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
                gate: None,
            })
        }

        fn gated(gate: Arc<Gate>) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(catalog()),
                calls: AtomicUsize::new(0),
                gate: Some(gate),
            })
        }
    }

    #[async_trait::async_trait]
    impl CatalogSource for FakeCatalog {
        async fn list_catalog(&self) -> Result<Vec<CatalogEntry>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.started.notify_one();
                gate.release.notified().await;
            }
            self.result.clone()
        }
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl RecordStore for BrokenStore {
        async fn read(&self, _key: &str) -> Result<Option<serde_json::Value>, StoreError> {
            Err(StoreError::Unavailable("disk on fire".into()))
        }

        async fn write(&self, _key: &str, _value: serde_json::Value) -> Result<(), StoreError> {
            Err(StoreError::OperationFailed("disk on fire".into()))
        }
    }

    struct GatedTransport {
        gate: Arc<Gate>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl HttpTransport for GatedTransport {
        async fn get(&self, _url: &str, _credential: &Credential) -> Result<HttpReply, ClientError> {
            unreachable!("catalog is faked")
        }

        async fn post_json(
            &self,
            _url: &str,
            _credential: &Credential,
            _body: &serde_json::Value,
        ) -> Result<HttpReply, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.started.notify_one();
            self.gate.release.notified().await;
            Ok(HttpReply {
                status: 200,
                status_text: "OK".into(),
                body: serde_json::json!({
                    "candidates": [{"content": {"parts": [{"text": "The torch flickers."}]}, "finishReason": "STOP"}]
                })
                .to_string(),
            })
        }
    }

    fn stub_client() -> GenerationClient {
        GenerationClient::builder()
            .mode(ClientMode::Stub)
            .stub_delay(Duration::ZERO)
            .build()
            .expect("client")
    }

    fn app_with(source: Arc<dyn CatalogSource>, store: Arc<dyn RecordStore>) -> StoryApp {
        StoryApp::new(stub_client(), CatalogCache::new(store), source)
    }

    #[tokio::test]
    async fn cached_catalog_skips_remote_fetch() {
        let store = Arc::new(MemoryRecordStore::new());
        CatalogCache::new(store.clone()).put(&catalog()).await.unwrap();
        let source = FakeCatalog::returning(Ok(vec![entry("other", "Other")]));
        let app = app_with(source.clone(), store);

        assert_eq!(app.load_models(false).await, LoadOutcome::FromCache(2));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        let state = app.state();
        assert_eq!(state.load_state, LoadState::Ready);
        assert!(state.models_enabled);
        assert!(!state.is_loading_models);
        assert_eq!(state.models, catalog());
    }

    #[tokio::test]
    async fn forced_refresh_always_fetches_and_rewrites_cache() {
        let store = Arc::new(MemoryRecordStore::new());
        let cache = CatalogCache::new(store.clone());
        cache.put(&[entry("stale", "Stale")]).await.unwrap();
        let source = FakeCatalog::returning(Ok(catalog()));
        let app = app_with(source.clone(), store);

        assert_eq!(app.load_models(true).await, LoadOutcome::Fetched(2));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get().await.unwrap(), Some(catalog()));
    }

    #[tokio::test]
    async fn cache_miss_fetches_and_writes_back() {
        let store = Arc::new(MemoryRecordStore::new());
        let source = FakeCatalog::returning(Ok(catalog()));
        let app = app_with(source.clone(), store.clone());

        assert_eq!(app.load_models(false).await, LoadOutcome::Fetched(2));
        assert_eq!(app.load_models(false).await, LoadOutcome::FromCache(2));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            app.state().selected_model.as_deref(),
            Some("gemini-1.5-flash-latest")
        );
    }

    #[tokio::test]
    async fn second_load_while_pending_is_ignored() {
        let gate = Arc::new(Gate::default());
        let source = FakeCatalog::gated(gate.clone());
        let app = app_with(source.clone(), Arc::new(MemoryRecordStore::new()));

        let (first, second) = tokio::join!(app.load_models(true), async {
            gate.started.notified().await;
            assert!(app.state().is_loading_models);
            assert!(!app.state().models_enabled);
            let outcome = app.load_models(true).await;
            gate.release.notify_one();
            outcome
        });

        assert_eq!(first, LoadOutcome::Fetched(2));
        assert_eq!(second, LoadOutcome::Ignored);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn storage_failures_do_not_abort_a_successful_fetch() {
        let source = FakeCatalog::returning(Ok(catalog()));
        let app = app_with(source.clone(), Arc::new(BrokenStore));

        assert_eq!(app.load_models(false).await, LoadOutcome::Fetched(2));
        let state = app.state();
        assert_eq!(state.load_state, LoadState::Ready);
        assert!(state.models_enabled);
        assert!(
            state
                .last_error
                .as_deref()
                .is_some_and(|e| e.contains("could not be cached"))
        );
    }

    #[tokio::test]
    async fn empty_or_failed_fetch_leaves_models_unavailable() {
        let empty = app_with(
            FakeCatalog::returning(Ok(vec![])),
            Arc::new(MemoryRecordStore::new()),
        );
        assert_eq!(empty.load_models(false).await, LoadOutcome::NoModels);
        let state = empty.state();
        assert_eq!(state.load_state, LoadState::NoModelsAvailable);
        assert!(!state.models_enabled);
        assert!(state.last_error.is_some());

        let failing = app_with(
            FakeCatalog::returning(Err(ClientError::MissingCredential)),
            Arc::new(MemoryRecordStore::new()),
        );
        assert_eq!(failing.load_models(false).await, LoadOutcome::NoModels);
        let state = failing.state();
        assert_eq!(state.load_state, LoadState::NoModelsAvailable);
        assert!(!state.is_loading_models);
        assert_eq!(
            state.last_error,
            Some(ClientError::MissingCredential.to_string())
        );
    }

    #[tokio::test]
    async fn selection_prefers_current_then_configured_model() {
        let store = Arc::new(MemoryRecordStore::new());
        let app = app_with(FakeCatalog::returning(Ok(catalog())), store)
            .with_preferred_model(Some("gemini-1.5-pro-latest".into()));

        app.load_models(false).await;
        assert_eq!(
            app.state().selected_model.as_deref(),
            Some("gemini-1.5-pro-latest")
        );

        app.select_model("gemini-1.5-flash-latest").unwrap();
        app.load_models(true).await;
        assert_eq!(
            app.state().selected_model.as_deref(),
            Some("gemini-1.5-flash-latest")
        );

        assert!(matches!(
            app.select_model("gpt-4"),
            Err(ClientError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn submit_while_generating_is_ignored() {
        let gate = Arc::new(Gate::default());
        let transport = Arc::new(GatedTransport {
            gate: gate.clone(),
            calls: AtomicUsize::new(0),
        });
        let client = GenerationClient::builder()
            .credential("AIza-test")
            .transport(transport.clone())
            .build()
            .unwrap();
        let app = StoryApp::new(
            client,
            CatalogCache::new(Arc::new(MemoryRecordStore::new())),
            FakeCatalog::returning(Ok(catalog())),
        );
        app.load_models(false).await;

        let (first, second) = tokio::join!(app.submit("light the torch"), async {
            gate.started.notified().await;
            assert!(app.state().is_generating);
            let outcome = app.submit("run away").await;
            gate.release.notify_one();
            outcome
        });

        assert_eq!(first, SubmitOutcome::Replied("The torch flickers.".into()));
        assert_eq!(second, SubmitOutcome::Ignored);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(!app.state().is_generating);
        assert_eq!(
            app.history(),
            vec![Turn::user("light the torch"), Turn::model("The torch flickers.")]
        );
    }

    #[tokio::test]
    async fn failed_submit_reports_error_and_keeps_transcript_consistent() {
        let client = GenerationClient::builder()
            .credential("AIza-test")
            .transport(Arc::new(GatedTransport {
                gate: Arc::new(Gate::default()),
                calls: AtomicUsize::new(0),
            }))
            .build()
            .unwrap();
        let app = StoryApp::new(
            client,
            CatalogCache::new(Arc::new(MemoryRecordStore::new())),
            FakeCatalog::returning(Ok(vec![])),
        );
        app.start_story(&[Turn::model("Once upon a time.")]);

        let outcome = app.submit("go north").await;
        assert_eq!(outcome, SubmitOutcome::Failed(ClientError::MissingModel));
        assert_eq!(app.history(), vec![Turn::model("Once upon a time.")]);
        assert_eq!(
            app.state().last_error,
            Some(ClientError::MissingModel.to_string())
        );
    }

    #[tokio::test]
    async fn stub_session_runs_fully_offline() {
        let app = app_with(Arc::new(StubCatalog), Arc::new(MemoryRecordStore::new()));
        app.start_story(&[Turn::model("The tavern is loud.")]);
        assert!(matches!(app.load_models(false).await, LoadOutcome::Fetched(_)));

        let SubmitOutcome::Replied(text) = app.submit("order an ale").await else {
            panic!("stub submit should reply");
        };
        let history = app.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[1].role, Role::User);
        assert_eq!(history[2].text(), text);
    }

    #[test]
    fn pick_selection_falls_back_to_first_entry() {
        let entries = catalog();
        assert_eq!(
            pick_selection(&entries, Some("gone"), Some("also-gone")).as_deref(),
            Some("gemini-1.5-flash-latest")
        );
        assert_eq!(pick_selection(&[], Some("gone"), None), None);
    }
}
