//! Runs API calls on the worker runtime and hands their results back to the
//! thread that owns session state.
//!
//! Each submission belongs to a [`Slot`]. Submitting again for a slot
//! supersedes whatever was outstanding there: the older task keeps running
//! and its completion still arrives on the channel, but the draining side
//! drops it without running its completion handler. Completion handlers only
//! ever run inside [`RequestScheduler::drain`] or [`RequestScheduler::next`],
//! i.e. on the caller's thread.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ApiError;

/// Independent request lanes. At most one submission per slot is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Models,
    Chat,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Models => "models",
            Slot::Chat => "chat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub slot: Slot,
    pub id: u64,
}

type Deliver<E> = Box<dyn FnOnce() -> E + Send>;

struct Completion<E> {
    ticket: Ticket,
    deliver: Deliver<E>,
}

pub struct RequestScheduler<E> {
    runtime: Handle,
    tx: mpsc::UnboundedSender<Completion<E>>,
    rx: mpsc::UnboundedReceiver<Completion<E>>,
    current: HashMap<Slot, u64>,
    next_id: u64,
    shutdown: CancellationToken,
}

impl<E: 'static> RequestScheduler<E> {
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            tx,
            rx,
            current: HashMap::new(),
            next_id: 0,
            shutdown: CancellationToken::new(),
        }
    }

    /// Starts `work` on the worker runtime. When it finishes, `on_complete`
    /// receives its result during a later `drain`/`next` call, unless a newer
    /// submission for the same slot has been made in the meantime.
    ///
    /// A panic inside `work` reaches `on_complete` as [`ApiError::Internal`].
    pub fn submit<T, W, C>(&mut self, slot: Slot, work: W, on_complete: C) -> Ticket
    where
        T: Send + 'static,
        W: Future<Output = Result<T, ApiError>> + Send + 'static,
        C: FnOnce(Result<T, ApiError>) -> E + Send + 'static,
    {
        self.next_id += 1;
        let ticket = Ticket {
            slot,
            id: self.next_id,
        };
        if let Some(previous) = self.current.insert(slot, ticket.id) {
            debug!(slot = slot.as_str(), previous, id = ticket.id, "superseding request");
        } else {
            debug!(slot = slot.as_str(), id = ticket.id, "submitting request");
        }

        let tx = self.tx.clone();
        let cancel = self.shutdown.clone();
        let worker = self.runtime.spawn(work);
        let abort = worker.abort_handle();

        self.runtime.spawn(async move {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    abort.abort();
                    return;
                }
                joined = worker => joined.unwrap_or_else(|err| Err(join_failure(err))),
            };
            let deliver: Deliver<E> = Box::new(move || on_complete(outcome));
            // The receiver only goes away with the scheduler itself.
            let _ = tx.send(Completion { ticket, deliver });
        });

        ticket
    }

    /// Applies every completion that has already arrived, without waiting.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(event) = self.accept(completion) {
                events.push(event);
            }
        }
        events
    }

    /// Waits for the next current completion, skipping stale ones.
    pub async fn next(&mut self) -> Option<E> {
        loop {
            let completion = self.rx.recv().await?;
            if let Some(event) = self.accept(completion) {
                return Some(event);
            }
        }
    }

    /// Whether the latest submission for `slot` has not completed yet.
    pub fn is_pending(&self, slot: Slot) -> bool {
        self.current.contains_key(&slot)
    }

    /// Aborts outstanding work. Completions not yet drained are dropped.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn accept(&mut self, completion: Completion<E>) -> Option<E> {
        let Completion { ticket, deliver } = completion;
        if self.current.get(&ticket.slot) == Some(&ticket.id) {
            self.current.remove(&ticket.slot);
            Some(deliver())
        } else {
            debug!(
                slot = ticket.slot.as_str(),
                id = ticket.id,
                "discarding stale completion"
            );
            None
        }
    }
}

impl<E> Drop for RequestScheduler<E> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn join_failure(err: JoinError) -> ApiError {
    let message = if err.is_panic() {
        format!("request worker panicked: {}", panic_message(err.into_panic()))
    } else {
        "request worker was cancelled".to_string()
    };
    ApiError::Internal { message }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn scheduler() -> RequestScheduler<(Slot, Result<u32, ApiError>)> {
        RequestScheduler::new(Handle::current())
    }

    async fn gated(rx: oneshot::Receiver<u32>) -> Result<u32, ApiError> {
        rx.await
            .map_err(|_| ApiError::network("gate dropped"))
    }

    #[tokio::test]
    async fn delivers_exactly_one_completion() {
        let mut scheduler = scheduler();
        let ticket = scheduler.submit(Slot::Models, async { Ok(7) }, |r| (Slot::Models, r));

        assert_eq!(ticket.slot, Slot::Models);
        assert!(scheduler.is_pending(Slot::Models));

        let (slot, result) = scheduler.next().await.expect("completion");
        assert_eq!(slot, Slot::Models);
        assert_eq!(result.unwrap(), 7);
        assert!(!scheduler.is_pending(Slot::Models));

        let extra = tokio::time::timeout(Duration::from_millis(50), scheduler.next()).await;
        assert!(extra.is_err(), "no second completion expected");
    }

    #[tokio::test]
    async fn late_completion_of_superseded_request_is_discarded() {
        let mut scheduler = scheduler();
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();

        scheduler.submit(Slot::Chat, gated(first_rx), |r| (Slot::Chat, r));
        scheduler.submit(Slot::Chat, gated(second_rx), |r| (Slot::Chat, r));

        second_tx.send(2).unwrap();
        let (_, result) = scheduler.next().await.expect("second completion");
        assert_eq!(result.unwrap(), 2);

        first_tx.send(1).unwrap();
        let late = tokio::time::timeout(Duration::from_millis(100), scheduler.next()).await;
        assert!(late.is_err(), "stale completion must not be delivered");
        assert!(scheduler.drain().is_empty());
    }

    #[tokio::test]
    async fn early_completion_of_superseded_request_is_discarded() {
        let mut scheduler = scheduler();
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();

        scheduler.submit(Slot::Models, gated(first_rx), |r| (Slot::Models, r));
        scheduler.submit(Slot::Models, gated(second_rx), |r| (Slot::Models, r));

        first_tx.send(1).unwrap();
        second_tx.send(2).unwrap();

        let (_, result) = scheduler.next().await.expect("completion");
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn slots_are_independent() {
        let mut scheduler = scheduler();
        scheduler.submit(Slot::Models, async { Ok(1) }, |r| (Slot::Models, r));
        scheduler.submit(Slot::Chat, async { Ok(2) }, |r| (Slot::Chat, r));

        let mut seen = Vec::new();
        for _ in 0..2 {
            let (slot, result) = scheduler.next().await.expect("completion");
            seen.push((slot, result.unwrap()));
        }
        seen.sort_by_key(|(_, value)| *value);
        assert_eq!(seen, vec![(Slot::Models, 1), (Slot::Chat, 2)]);
    }

    #[tokio::test]
    async fn panics_become_internal_failures() {
        let mut scheduler = scheduler();
        scheduler.submit(
            Slot::Chat,
            async {
                let value: Option<u32> = None;
                Ok::<u32, ApiError>(value.expect("worker blew up"))
            },
            |r| (Slot::Chat, r),
        );

        let (_, result) = scheduler.next().await.expect("completion");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("worker blew up"));
    }

    #[tokio::test]
    async fn drain_does_not_wait() {
        let mut scheduler = scheduler();
        let (_gate_tx, gate_rx) = oneshot::channel();
        scheduler.submit(Slot::Models, gated(gate_rx), |r| (Slot::Models, r));

        assert!(scheduler.drain().is_empty());
        assert!(scheduler.is_pending(Slot::Models));
    }

    #[tokio::test]
    async fn shutdown_aborts_outstanding_work() {
        let mut scheduler = scheduler();
        let (mut gate_tx, gate_rx) = oneshot::channel();
        scheduler.submit(Slot::Chat, gated(gate_rx), |r| (Slot::Chat, r));

        scheduler.shutdown();

        tokio::time::timeout(Duration::from_secs(1), gate_tx.closed())
            .await
            .expect("aborted worker drops its receiver");
    }
}
