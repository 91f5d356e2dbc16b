//! Command-line interface parsing and dispatch.

pub mod model_list;
pub mod say;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

use crate::api::HttpBackend;
use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::core::config::data::path_display;
use crate::core::config::ConfigStore;
use crate::core::session::ChatSession;
use crate::ui::appearance::detect_preferred_appearance;
use crate::ui::chat_loop::run_chat;
use crate::ui::palette::Palette;

const LOG_ENV: &str = "PARLEY_LOG";

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "A terminal chat client for OpenAI-compatible servers")]
#[command(version, long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
))]
#[command(
    long_about = "Parley talks to any server that implements the OpenAI chat completions \
and model listing endpoints.\n\n\
Settings (API key, base URL, default model, system prompt, accent color, temperature) \
are stored in settings.json in the user config directory. Use 'parley set' or /set to change them.\n\n\
Environment Variables:\n\
  PARLEY_LOG        Log filter written to stderr (default: warn)\n\
  GTK_PREFER_DARK   Force dark (1) or light (0) colors\n\
  NO_COLOR          Disable colored output"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this run instead of the configured default
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Read and write settings at this path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat loop (default)
    Chat,
    /// Fetch and print the models the server offers
    Models,
    /// Send a single prompt and print the reply
    Say {
        /// Prompt text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        prompt: Vec<String>,
    },
    /// Change one setting and save it
    Set {
        /// api-key, base-url, default-model, system-prompt, accent-color or temperature
        key: String,
        /// New value; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let store = match args.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::default_location()?,
    };

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Set { key, value } => {
            let mut settings = store.try_load()?;
            let value = value.join(" ");
            settings.set_field(&key, &value)?;
            store.save(&settings)?;
            println!(
                "✅ Set {key} in {}",
                path_display(store.settings_path())
            );
            Ok(())
        }
        Commands::Models => {
            let session = open_session(store, args.model)?;
            list_models(session).await
        }
        Commands::Say { prompt } => {
            let session = open_session(store, args.model)?;
            run_say(session, prompt.join(" ")).await
        }
        Commands::Chat => {
            let session = open_session(store, args.model)?;
            let appearance = detect_preferred_appearance();
            let palette = Palette::detect(session.settings().accent(), appearance);
            run_chat(session, palette).await
        }
    }
}

fn open_session(store: ConfigStore, model: Option<String>) -> Result<ChatSession, Box<dyn Error>> {
    let backend = HttpBackend::new()?;
    let mut session = ChatSession::open(store, Arc::new(backend), Handle::current());
    if let Some(model) = model {
        session.select_model(model);
    }
    Ok(session)
}
