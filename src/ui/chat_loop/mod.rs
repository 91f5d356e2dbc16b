//! Line-oriented interactive loop.
//!
//! Input lines and scheduler completions are awaited together; whichever
//! arrives first is handled, then everything the session changed since the
//! previous redraw is printed.

use std::error::Error;
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::commands::{process_input, CommandResult};
use crate::core::scheduler::Slot;
use crate::core::session::{ChatSession, SlotState, STATUS_DONE};
use crate::ui::palette::Palette;

/// Remembers what has already been shown so each redraw only prints changes.
pub struct Transcript {
    palette: Palette,
    shown_messages: usize,
    shown_models_status: String,
    shown_chat_status: String,
}

impl Transcript {
    pub fn new(session: &ChatSession, palette: Palette) -> Self {
        Self {
            palette,
            shown_messages: session.conversation().len(),
            shown_models_status: session.status(Slot::Models).message.clone(),
            shown_chat_status: session.status(Slot::Chat).message.clone(),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Lines describing what changed in `session` since the last call.
    pub fn render_changes(&mut self, session: &ChatSession) -> Vec<String> {
        let mut lines = Vec::new();

        let models = session.status(Slot::Models);
        if models.message != self.shown_models_status {
            self.shown_models_status = models.message.clone();
            lines.push(self.status_line(models.state, &models.message));
            if models.state == SlotState::Done {
                lines.extend(session.models().iter().map(|model| format!("  {}", model.id)));
            }
        }

        let chat = session.status(Slot::Chat);
        if chat.message != self.shown_chat_status {
            self.shown_chat_status = chat.message.clone();
            if chat.message != STATUS_DONE {
                lines.push(self.status_line(chat.state, &chat.message));
            }
        }

        // User lines are already on screen as typed input.
        for message in &session.conversation()[self.shown_messages..] {
            if message.is_assistant() {
                lines.push(format!("{} {}", self.palette.accent("assistant>"), message.content));
            }
        }
        self.shown_messages = session.conversation().len();

        lines
    }

    fn status_line(&self, state: SlotState, message: &str) -> String {
        if state == SlotState::Failed {
            self.palette.error(message)
        } else {
            self.palette.dim(message)
        }
    }
}

pub async fn run_chat(mut session: ChatSession, palette: Palette) -> Result<(), Box<dyn Error>> {
    let mut transcript = Transcript::new(&session, palette);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();

    writeln!(
        stdout,
        "{}",
        transcript.palette().dim(&format!(
            "Chatting with {}. Type /help for commands.",
            session.active_model().unwrap_or("no model yet")
        ))
    )?;

    loop {
        write!(stdout, "{} ", transcript.palette().accent("you>"))?;
        stdout.flush()?;

        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    // EOF
                    writeln!(stdout)?;
                    break;
                };
                match process_input(&mut session, &line) {
                    CommandResult::Continue => {}
                    CommandResult::Notice(text) => writeln!(stdout, "{text}")?,
                    CommandResult::Quit => break,
                    CommandResult::ProcessAsMessage(text) => {
                        if text.trim().is_empty() {
                            continue;
                        }
                        if let Err(err) = session.send_user_message(&text) {
                            writeln!(stdout, "{}", transcript.palette().error(&err.to_string()))?;
                        }
                    }
                }
            }
            update = session.next_update() => {
                let Some(slot) = update else {
                    break;
                };
                debug!(slot = slot.as_str(), "applied completion");
                writeln!(stdout)?;
            }
        }

        for line in transcript.render_changes(&session) {
            writeln!(stdout, "{line}")?;
        }
    }

    session.shutdown();
    Ok(())
}
