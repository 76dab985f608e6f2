//! Per-conversation sequential dispatch.
//!
//! `KeyedDispatcher` owns one worker task per active conversation. Each
//! worker drains a bounded mpsc queue, so inputs for a conversation are
//! handled strictly in arrival order while different conversations run in
//! parallel. Idle workers retire themselves; the next input spawns a fresh
//! one. [`KeyedDispatcher::try_dispatch`] reports a full queue as
//! [`DispatchError::Busy`] instead of waiting for room.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use mintbot_types::session::ConversationId;

use crate::session::Input;

/// Queued inputs per conversation before `dispatch` applies backpressure.
pub const QUEUE_DEPTH: usize = 32;

/// How long a worker waits for input before retiring.
pub const WORKER_IDLE: Duration = Duration::from_secs(300);

/// Handles one input of type `I` for one conversation, replying through `S`.
pub trait InputHandler<S, I = Input>: Send + Sync + 'static {
    fn handle_input(
        &self,
        id: ConversationId,
        input: I,
        sink: &S,
    ) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatcher is shutting down")]
    Shutdown,

    #[error("no worker accepted the input for conversation {0}")]
    Unavailable(ConversationId),

    #[error("conversation {0} has too many queued inputs")]
    Busy(ConversationId),
}

struct Job<S, I> {
    input: I,
    sink: S,
    done: Option<oneshot::Sender<()>>,
}

type Workers<S, I> = DashMap<ConversationId, mpsc::Sender<Job<S, I>>>;

/// Routes inputs to per-conversation worker tasks.
pub struct KeyedDispatcher<H, S, I = Input> {
    handler: Arc<H>,
    workers: Arc<Workers<S, I>>,
    cancel: CancellationToken,
    idle: Duration,
}

impl<H, S, I> Clone for KeyedDispatcher<H, S, I> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            workers: Arc::clone(&self.workers),
            cancel: self.cancel.clone(),
            idle: self.idle,
        }
    }
}

impl<H, S, I> KeyedDispatcher<H, S, I>
where
    H: InputHandler<S, I>,
    S: Send + Sync + 'static,
    I: Send + 'static,
{
    pub fn new(handler: Arc<H>, cancel: CancellationToken) -> Self {
        Self::with_idle(handler, cancel, WORKER_IDLE)
    }

    pub fn with_idle(handler: Arc<H>, cancel: CancellationToken, idle: Duration) -> Self {
        Self {
            handler,
            workers: Arc::new(DashMap::new()),
            cancel,
            idle,
        }
    }

    /// Number of live workers.
    #[cfg(test)]
    fn active_workers(&self) -> usize {
        self.workers.len()
    }

    /// Queue `input` for `id` without waiting, neither for queue space nor
    /// for the input to be handled.
    ///
    /// Returns [`DispatchError::Busy`] when the conversation's queue is full;
    /// other conversations are unaffected.
    pub fn try_dispatch(&self, id: ConversationId, input: I, sink: S) -> Result<(), DispatchError> {
        let mut job = Job {
            input,
            sink,
            done: None,
        };
        // A worker may retire between lookup and send; retry once with a
        // fresh worker.
        for _ in 0..2 {
            if self.cancel.is_cancelled() {
                return Err(DispatchError::Shutdown);
            }
            let sender = self.sender_for(id);
            match sender.try_send(job) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::TrySendError::Full(_)) => return Err(DispatchError::Busy(id)),
                Err(mpsc::error::TrySendError::Closed(returned)) => {
                    self.workers
                        .remove_if(&id, |_, current| current.same_channel(&sender));
                    job = returned;
                }
            }
        }
        Err(DispatchError::Unavailable(id))
    }

    /// Queue `input` for `id` and wait until it has been handled.
    pub async fn dispatch_and_wait(
        &self,
        id: ConversationId,
        input: I,
        sink: S,
    ) -> Result<(), DispatchError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.enqueue(
            id,
            Job {
                input,
                sink,
                done: Some(done_tx),
            },
        )
        .await?;
        done_rx.await.map_err(|_| DispatchError::Shutdown)
    }

    async fn enqueue(&self, id: ConversationId, mut job: Job<S, I>) -> Result<(), DispatchError> {
        // A worker may retire between lookup and send; retry once with a
        // fresh worker.
        for _ in 0..2 {
            if self.cancel.is_cancelled() {
                return Err(DispatchError::Shutdown);
            }
            let sender = self.sender_for(id);
            match sender.send(job).await {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(returned)) => {
                    self.workers
                        .remove_if(&id, |_, current| current.same_channel(&sender));
                    job = returned;
                }
            }
        }
        Err(DispatchError::Unavailable(id))
    }

    fn sender_for(&self, id: ConversationId) -> mpsc::Sender<Job<S, I>> {
        self.workers
            .entry(id)
            .or_insert_with(|| self.spawn_worker(id))
            .value()
            .clone()
    }

    fn spawn_worker(&self, id: ConversationId) -> mpsc::Sender<Job<S, I>> {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let worker = Worker {
            id,
            handler: Arc::clone(&self.handler),
            workers: Arc::clone(&self.workers),
            cancel: self.cancel.clone(),
            idle: self.idle,
        };
        tokio::spawn(worker.run(rx, tx.clone()));
        tracing::debug!(conversation = %id, "worker spawned");
        tx
    }
}

struct Worker<H, S, I> {
    id: ConversationId,
    handler: Arc<H>,
    workers: Arc<Workers<S, I>>,
    cancel: CancellationToken,
    idle: Duration,
}

impl<H, S, I> Worker<H, S, I>
where
    H: InputHandler<S, I>,
    S: Send + Sync + 'static,
    I: Send + 'static,
{
    async fn run(self, mut rx: mpsc::Receiver<Job<S, I>>, own: mpsc::Sender<Job<S, I>>) {
        // Only the map holds a sender; keep a weak handle for identity checks.
        let own = own.downgrade();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                next = tokio::time::timeout(self.idle, rx.recv()) => match next {
                    Ok(Some(job)) => self.process(job).await,
                    Ok(None) => break,
                    Err(_) => {
                        let retired = self.workers.remove_if(&self.id, |_, current| {
                            own.upgrade().is_some_and(|own| current.same_channel(&own))
                                && rx.is_empty()
                        });
                        if retired.is_some() {
                            break;
                        }
                    }
                },
            }
        }

        // Anything queued before retirement is still handled, in order.
        rx.close();
        while let Some(job) = rx.recv().await {
            if self.cancel.is_cancelled() {
                break;
            }
            self.process(job).await;
        }
        tracing::debug!(conversation = %self.id, "worker retired");
    }

    async fn process(&self, job: Job<S, I>) {
        self.handler.handle_input(self.id, job.input, &job.sink).await;
        if let Some(done) = job.done {
            let _ = done.send(());
        }
    }
}
