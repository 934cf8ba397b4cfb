//! Interactive text adventure in the terminal, narrated by a Gemini model.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use storyteller_ai_harness::{
    CatalogClient, CatalogSource, ClientMode, GenerationClient, HttpTransport, ReqwestTransport,
    StubCatalog,
};
use storyteller_core::{
    AppConfig, CatalogCache, FileRecordStore, LoadOutcome, MemoryRecordStore, RecordStore,
    StoryApp, SubmitOutcome, config, observability,
};
use tokio::io::{AsyncBufReadExt, BufReader};

mod commands;
mod story;

use commands::Command;

#[derive(Parser)]
#[command(name = "storyteller")]
#[command(about = "Interactive text adventure narrated by a Gemini model", long_about = None)]
struct Cli {
    /// Use canned local replies instead of the API
    #[arg(long)]
    stub: bool,
    /// Ignore the cached model list and fetch a fresh one
    #[arg(long)]
    refresh_models: bool,
    /// Model to select when the catalog lists it
    #[arg(long)]
    model: Option<String>,
    /// Directory for the model-list cache
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Keep the cache in memory only
    #[arg(long)]
    ephemeral: bool,
}

impl Cli {
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if self.stub {
            config.mode = ClientMode::Stub;
        }
        if let Some(model) = &self.model {
            config.preferred_model = Some(model.clone());
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        config
    }
}

fn build_app(config: &AppConfig, ephemeral: bool) -> Result<StoryApp> {
    let store: Arc<dyn RecordStore> = if ephemeral {
        Arc::new(MemoryRecordStore::new())
    } else {
        Arc::new(FileRecordStore::new(config.data_dir.clone()))
    };
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(config.http_timeout)?);
    let catalog: Arc<dyn CatalogSource> = match config.mode {
        ClientMode::Stub => Arc::new(StubCatalog),
        ClientMode::Live => Arc::new(CatalogClient::new(
            config.api_key.clone(),
            transport.clone(),
            config.gemini_config(),
        )),
    };
    let client = GenerationClient::builder()
        .credential(config.api_key.clone())
        .mode(config.mode)
        .transport(transport)
        .gemini_config(config.gemini_config())
        .stub_delay(config.stub_delay)
        .build()?;
    Ok(StoryApp::new(client, CatalogCache::new(store), catalog)
        .with_preferred_model(config.preferred_model.clone()))
}

fn report_load(app: &StoryApp, outcome: LoadOutcome) {
    let state = app.state();
    match outcome {
        LoadOutcome::Ignored => println!("(the model list is already loading)"),
        LoadOutcome::FromCache(n) | LoadOutcome::Fetched(n) => {
            let model = state.selected_model.as_deref().unwrap_or("none");
            println!("({n} models available, using {model})");
            if let Some(warning) = &state.last_error {
                eprintln!("warning: {warning}");
            }
        }
        LoadOutcome::NoModels => {
            let reason = state.last_error.as_deref().unwrap_or("unknown error");
            println!("(no models available: {reason})");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    config::init();
    observability::init_observability();
    let cli = Cli::parse();
    let config = cli.apply(AppConfig::from_env());

    let app = build_app(&config, cli.ephemeral)?;
    tracing::info!(event = "session.started", mode = ?config.mode);
    app.start_story(&story::opening_turns());
    println!("{}\n", story::OPENING_NARRATION);
    report_load(&app, app.load_models(cli.refresh_models).await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{}", commands::HELP),
            Command::Models => {
                let state = app.state();
                println!(
                    "{}",
                    story::render_models(&state.models, state.selected_model.as_deref())
                );
            }
            Command::Model(id) => match app.select_model(&id) {
                Ok(()) => println!("(now narrating with {id})"),
                Err(err) => eprintln!("{err}"),
            },
            Command::Refresh => report_load(&app, app.load_models(true).await),
            Command::History => {
                for turn in app.history() {
                    println!("{}\n", story::render_turn(&turn));
                }
            }
            Command::Unknown(text) => eprintln!("unknown command: {text} (try /help)"),
            Command::Action(prompt) => match app.submit(&prompt).await {
                SubmitOutcome::Replied(text) => println!("\n{text}\n"),
                SubmitOutcome::Failed(err) => eprintln!("{err}"),
                SubmitOutcome::Ignored => eprintln!("(still waiting for the narrator)"),
            },
        }
    }
    Ok(())
}
