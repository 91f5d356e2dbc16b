//! Model listing command.

use std::error::Error;

use crate::core::scheduler::Slot;
use crate::core::session::{ChatSession, SlotState};
use crate::utils::url::effective_base_url;

pub async fn list_models(mut session: ChatSession) -> Result<(), Box<dyn Error>> {
    let server = effective_base_url(&session.settings().base_url);
    session.fetch_models();

    while let Some(slot) = session.next_update().await {
        if slot == Slot::Models {
            break;
        }
    }
    session.shutdown();

    let status = session.status(Slot::Models);
    if status.state == SlotState::Failed {
        return Err(status.message.clone().into());
    }

    println!("Available models on {server}");
    if session.models().is_empty() {
        println!("No models found.");
    }
    let active = session.active_model().map(str::to_owned);
    for model in session.models() {
        if active.as_deref() == Some(model.id.as_str()) {
            println!("* {}", model.id);
        } else {
            println!("  {}", model.id);
        }
    }
    Ok(())
}
