//! One-shot "say" command: send a prompt, print the reply, exit.

use std::error::Error;

use crate::core::scheduler::Slot;
use crate::core::session::{ChatSession, SlotState};

pub async fn run_say(mut session: ChatSession, prompt: String) -> Result<(), Box<dyn Error>> {
    session.send_user_message(&prompt)?;
    let reply = wait_for_reply(&mut session).await;
    session.shutdown();
    println!("{}", reply?);
    Ok(())
}

async fn wait_for_reply(session: &mut ChatSession) -> Result<String, Box<dyn Error>> {
    while let Some(slot) = session.next_update().await {
        if slot != Slot::Chat {
            continue;
        }
        let status = session.status(Slot::Chat);
        if status.state == SlotState::Failed {
            return Err(status.message.clone().into());
        }
        let reply = session
            .conversation()
            .last()
            .filter(|message| message.is_assistant())
            .map(|message| message.content.clone());
        return reply.ok_or_else(|| "no reply received".into());
    }
    Err("request was cancelled".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::utils::test_utils::{create_test_session, StaticBackend};

    #[tokio::test]
    async fn reply_text_is_returned() {
        let mut session = create_test_session(StaticBackend::new(&[], "Four."));
        session.send_user_message("2+2?").unwrap();
        assert_eq!(wait_for_reply(&mut session).await.unwrap(), "Four.");
    }

    #[tokio::test]
    async fn failure_surfaces_status_message() {
        let mut session = create_test_session(StaticBackend {
            models: Ok(Vec::new()),
            reply: Err(ApiError::network("could not connect")),
        });
        session.send_user_message("hello").unwrap();
        let err = wait_for_reply(&mut session).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed: Network error: could not connect");
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        let session = create_test_session(StaticBackend::new(&[], "unused"));
        let err = run_say(session, "   ".to_string()).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a message");
    }
}
