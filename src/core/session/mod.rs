//! The process-wide chat session: conversation, settings snapshot, model
//! list and per-slot request status.
//!
//! All methods run on the thread that owns the session. Network work is
//! handed to the [`RequestScheduler`]; its completions come back through
//! [`ChatSession::poll`] or [`ChatSession::next_update`], which are the only
//! places results are applied.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::api::models::filter_models;
use crate::api::{ApiBackend, ApiError, ChatMessage, ChatRequest, Endpoint, ModelInfo};
use crate::core::config::{ConfigError, ConfigStore, Settings};
use crate::core::message::Message;
use crate::core::scheduler::{RequestScheduler, Slot, Ticket};
use crate::utils::url::effective_base_url;

pub const STATUS_READY: &str = "Ready";
pub const STATUS_FETCHING_MODELS: &str = "Fetching models...";
pub const STATUS_SENDING: &str = "Sending request...";
pub const STATUS_DONE: &str = "Done";

/// Results delivered back from the scheduler.
#[derive(Debug)]
pub enum SessionEvent {
    ModelsLoaded(Result<Vec<ModelInfo>, ApiError>),
    ReplyReceived(Result<String, ApiError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    InFlight,
    Done,
    Failed,
}

/// State, status line and last failure of one request slot.
#[derive(Debug, Clone)]
pub struct SlotStatus {
    pub state: SlotState,
    pub message: String,
    pub last_error: Option<ApiError>,
}

impl Default for SlotStatus {
    fn default() -> Self {
        Self {
            state: SlotState::Idle,
            message: STATUS_READY.to_string(),
            last_error: None,
        }
    }
}

impl SlotStatus {
    fn start(&mut self, message: &str) {
        self.state = SlotState::InFlight;
        self.message = message.to_string();
    }

    fn finish(&mut self, message: String) {
        self.state = SlotState::Done;
        self.message = message;
        self.last_error = None;
    }

    fn fail(&mut self, error: ApiError) {
        self.state = SlotState::Failed;
        self.message = format!("Failed: {error}");
        self.last_error = Some(error);
    }
}

#[derive(Debug)]
pub enum SessionError {
    /// Rejected before any request was made.
    InvalidInput(String),
    /// Saving settings failed.
    Config(ConfigError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidInput(reason) => write!(f, "{reason}"),
            SessionError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for SessionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SessionError::InvalidInput(_) => None,
            SessionError::Config(err) => Some(err),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err)
    }
}

pub struct ChatSession {
    settings: Settings,
    store: Option<ConfigStore>,
    backend: Arc<dyn ApiBackend>,
    scheduler: RequestScheduler<SessionEvent>,
    conversation: Vec<Message>,
    models: Vec<ModelInfo>,
    selected_model: Option<String>,
    models_status: SlotStatus,
    chat_status: SlotStatus,
}

impl ChatSession {
    /// A session with no backing store; settings live only in memory.
    pub fn new(settings: Settings, backend: Arc<dyn ApiBackend>, runtime: Handle) -> Self {
        Self {
            settings,
            store: None,
            backend,
            scheduler: RequestScheduler::new(runtime),
            conversation: Vec::new(),
            models: Vec::new(),
            selected_model: None,
            models_status: SlotStatus::default(),
            chat_status: SlotStatus::default(),
        }
    }

    /// Loads settings and the model cache from `store` and keeps it for saves.
    pub fn open(store: ConfigStore, backend: Arc<dyn ApiBackend>, runtime: Handle) -> Self {
        let settings = store.load();
        let mut session = Self::new(settings, backend, runtime);
        session.models = store.load_model_cache();
        session.store = Some(store);
        session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the in-memory settings. The conversation is left alone and
    /// requests already in flight keep the endpoint they were sent with.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Normalizes, persists (when a store is attached) and adopts `settings`.
    pub fn save_settings(&mut self, settings: Settings) -> Result<(), SessionError> {
        let saved = match &self.store {
            Some(store) => store.save(&settings)?,
            None => settings.normalized(),
        };
        info!("settings updated");
        self.settings = saved;
        Ok(())
    }

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn filtered_models(&self, query: &str) -> Vec<&ModelInfo> {
        filter_models(&self.models, query)
    }

    pub fn select_model(&mut self, model: impl Into<String>) {
        let model = model.into().trim().to_string();
        self.selected_model = (!model.is_empty()).then_some(model);
    }

    /// The explicitly selected model, else the configured default.
    pub fn active_model(&self) -> Option<&str> {
        self.selected_model
            .as_deref()
            .or_else(|| {
                let default = self.settings.default_model.trim();
                (!default.is_empty()).then_some(default)
            })
    }

    pub fn status(&self, slot: Slot) -> &SlotStatus {
        match slot {
            Slot::Models => &self.models_status,
            Slot::Chat => &self.chat_status,
        }
    }

    fn status_mut(&mut self, slot: Slot) -> &mut SlotStatus {
        match slot {
            Slot::Models => &mut self.models_status,
            Slot::Chat => &mut self.chat_status,
        }
    }

    fn endpoint(&self) -> Endpoint {
        Endpoint::new(
            effective_base_url(&self.settings.base_url),
            self.settings.api_key.trim(),
        )
    }

    /// Requests the model list. A fetch already outstanding is superseded.
    pub fn fetch_models(&mut self) -> Ticket {
        let backend = Arc::clone(&self.backend);
        let endpoint = self.endpoint();
        self.models_status.start(STATUS_FETCHING_MODELS);
        self.scheduler.submit(
            Slot::Models,
            async move { backend.list_models(&endpoint).await },
            SessionEvent::ModelsLoaded,
        )
    }

    /// Appends `text` as a user message and requests a reply to the whole
    /// conversation. A reply already outstanding is superseded.
    pub fn send_user_message(&mut self, text: &str) -> Result<Ticket, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::InvalidInput(
                "Please enter a message".to_string(),
            ));
        }
        let Some(model) = self.active_model().map(str::to_owned) else {
            return Err(SessionError::InvalidInput(
                "Please select or enter a model".to_string(),
            ));
        };

        self.conversation.push(Message::user(text));
        let request = self.build_chat_request(model);

        let backend = Arc::clone(&self.backend);
        let endpoint = self.endpoint();
        self.chat_status.start(STATUS_SENDING);
        Ok(self.scheduler.submit(
            Slot::Chat,
            async move { backend.chat_completion(&endpoint, &request).await },
            SessionEvent::ReplyReceived,
        ))
    }

    fn build_chat_request(&self, model: String) -> ChatRequest {
        let system_prompt = self.settings.system_prompt.trim();
        let mut messages = Vec::with_capacity(self.conversation.len() + 1);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::from(&Message::system(system_prompt)));
        }
        messages.extend(self.conversation.iter().map(ChatMessage::from));
        ChatRequest {
            model,
            messages,
            temperature: self.settings.temperature,
        }
    }

    /// Whether the latest request for `slot` is still outstanding.
    pub fn is_busy(&self, slot: Slot) -> bool {
        self.scheduler.is_pending(slot)
    }

    /// Applies every completion that is already available. Returns whether
    /// anything changed.
    pub fn poll(&mut self) -> bool {
        let events = self.scheduler.drain();
        let changed = !events.is_empty();
        for event in events {
            self.apply(event);
        }
        changed
    }

    /// Waits for the next current completion, applies it and reports which
    /// slot changed.
    pub async fn next_update(&mut self) -> Option<Slot> {
        let event = self.scheduler.next().await?;
        Some(self.apply(event))
    }

    fn apply(&mut self, event: SessionEvent) -> Slot {
        match event {
            SessionEvent::ModelsLoaded(Ok(models)) => {
                let count = models.len();
                self.models = models;
                if let Some(store) = &self.store {
                    if let Err(err) = store.save_model_cache(&self.models) {
                        warn!(error = %err, "could not write model cache");
                    }
                }
                if self.active_model().is_none() {
                    self.selected_model = self.models.first().map(|model| model.id.clone());
                }
                self.models_status.finish(format!("Fetched {count} model(s)"));
                Slot::Models
            }
            SessionEvent::ReplyReceived(Ok(content)) => {
                self.conversation.push(Message::assistant(content));
                self.chat_status.finish(STATUS_DONE.to_string());
                Slot::Chat
            }
            SessionEvent::ModelsLoaded(Err(error)) => self.record_failure(Slot::Models, error),
            SessionEvent::ReplyReceived(Err(error)) => self.record_failure(Slot::Chat, error),
        }
    }

    fn record_failure(&mut self, slot: Slot, error: ApiError) -> Slot {
        warn!(slot = slot.as_str(), error = %error, "request failed");
        self.status_mut(slot).fail(error);
        slot
    }

    /// Stops outstanding requests. Called once at process exit.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}
