//! # Larder Runtime
//!
//! Runtime implementation for the Larder reducer architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Cancellation Registry**: Tracks long-lived effects (live queries, timers) by id
//!
//! ## Example
//!
//! ```ignore
//! use larder_runtime::Store;
//!
//! let store = Store::new(initial_state, reducer, environment);
//!
//! // Send an action
//! store.send(Action::Bootstrap).await?;
//!
//! // Read state
//! let ready = store.state(|s| s.session.ready).await;
//! ```

use larder_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

use futures::StreamExt;
use futures::future::{AbortHandle, Abortable};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects spawned by
/// one action to finish.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(InventoryAction::AddItem { name, quantity }).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle and its internal tracking half
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running for this handle
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    ///
    /// Returns once the effect counter reaches zero. Long-lived streams keep
    /// the counter above zero until they end or are cancelled.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics
/// or is aborted.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Internal: running cancellable tasks keyed by [`EffectId`]
///
/// Tasks are registered before they are spawned and release their own entry
/// when they finish, so the registry never holds finished tasks.
#[derive(Default)]
struct CancellationRegistry {
    next_token: AtomicU64,
    tasks: Mutex<HashMap<EffectId, Vec<(u64, AbortHandle)>>>,
}

impl CancellationRegistry {
    fn register(&self, id: EffectId, handle: AbortHandle) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .push((token, handle));
        token
    }

    fn release(&self, id: EffectId, token: u64) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = tasks.get_mut(&id) {
            entries.retain(|(t, _)| *t != token);
            if entries.is_empty() {
                tasks.remove(&id);
            }
        }
    }

    /// Abort every task registered under `id`, returning how many were aborted
    fn cancel(&self, id: EffectId) -> usize {
        let removed = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        removed.map_or(0, |entries| {
            for (_, handle) in &entries {
                handle.abort();
            }
            entries.len()
        })
    }

    fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        drained
            .into_iter()
            .map(|(_, entries)| {
                for (_, handle) in &entries {
                    handle.abort();
                }
                entries.len()
            })
            .sum()
    }

    fn active(&self, id: EffectId) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map_or(0, Vec::len)
    }
}

/// Releases a task's registry entry when the task ends
struct ReleaseGuard {
    registry: Arc<CancellationRegistry>,
    id: EffectId,
    token: u64,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.registry.release(self.id, self.token);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Abortable, AbortHandle, Arc, AtomicBool, AtomicCounterGuard, AtomicUsize,
        CancellationRegistry, DecrementGuard, Duration, Effect, EffectHandle, EffectId,
        EffectTracking, Ordering, Reducer, ReleaseGuard, RwLock, StoreError, StreamExt,
    };
    use tokio::sync::{broadcast, watch};

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (client logic)
    /// 3. Environment (injected collaborators)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        cancellations: Arc<CancellationRegistry>,
        /// Action broadcast channel for observing actions produced by effects.
        action_broadcast: broadcast::Sender<A>,
        /// Monotonic revision bumped after every reduced action.
        revisions: Arc<watch::Sender<u64>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast channel buffers 16 actions; use
        /// [`Store::with_broadcast_capacity`] for chattier observers.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
        }

        /// Create a new Store with custom action broadcast capacity
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity);
            let (revisions, _) = watch::channel(0);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                cancellations: Arc::new(CancellationRegistry::default()),
                action_broadcast,
                revisions: Arc::new(revisions),
            }
        }

        /// Initiate graceful shutdown of the store
        ///
        /// This method:
        /// 1. Sets the shutdown flag (rejecting new actions)
        /// 2. Aborts every cancellable effect (live queries, timers)
        /// 3. Waits for the remaining effects to complete (with timeout)
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let aborted = self.cancellations.cancel_all();
            if aborted > 0 {
                tracing::debug!(aborted, "Aborted cancellable effects");
            }

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Bumps the revision counter
        /// 4. Starts the returned effects; they may produce more actions
        ///
        /// `send()` returns after starting effect execution, not completion.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            self.revisions.send_modify(|revision| *revision += 1);

            for effect in effects {
                self.execute_effect_internal(effect, &tracking, None);
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, then returns the
        /// first effect-produced action matching `predicate`.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Watch the state revision counter
        ///
        /// The value increases after every reduced action, so a renderer can
        /// await `changed()` and redraw from [`Store::state`].
        #[must_use]
        pub fn watch_revisions(&self) -> watch::Receiver<u64> {
            self.revisions.subscribe()
        }

        /// Number of running tasks registered under a cancellation id
        #[must_use]
        pub fn active_effects(&self, id: EffectId) -> usize {
            self.cancellations.active(id)
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Spawn one effect task with completion tracking
        ///
        /// When `scope` is set the task is registered in the cancellation
        /// registry before it starts, so a later `Effect::Cancel` always finds it.
        fn spawn_tracked<F>(&self, tracking: &EffectTracking, scope: Option<EffectId>, task: F)
        where
            F: std::future::Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            let guard = DecrementGuard(tracking.clone());

            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            match scope {
                None => {
                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending_guard = pending_guard;
                        task.await;
                    });
                },
                Some(id) => {
                    let (abort_handle, registration) = AbortHandle::new_pair();
                    let token = self.cancellations.register(id, abort_handle);
                    let release = ReleaseGuard {
                        registry: Arc::clone(&self.cancellations),
                        id,
                        token,
                    };

                    tokio::spawn(async move {
                        let _guard = guard;
                        let _pending_guard = pending_guard;
                        let _release = release;

                        if Abortable::new(task, registration).await.is_err() {
                            tracing::trace!(effect_id = %id, "Effect cancelled");
                        }
                    });
                },
            }
        }

        /// Execute an effect with tracking
        ///
        /// # Effect Types
        ///
        /// - `None`: No-op
        /// - `Future`: Executes async computation, sends resulting action if `Some`
        /// - `Delay`: Waits for duration, then sends action
        /// - `Stream`: Sends every item, in order, until the stream ends
        /// - `Parallel`: Executes effects concurrently
        /// - `Sequential`: Executes effects in order, waiting for each to complete
        /// - `Cancellable`: Aborts any running effect with the same id, then runs under it
        /// - `Cancel`: Aborts every running effect with the id
        ///
        /// Reducer panics propagate. Effect failures are isolated in their task.
        #[allow(clippy::too_many_lines)]
        fn execute_effect_internal(
            &self,
            effect: Effect<A>,
            tracking: &EffectTracking,
            scope: Option<EffectId>,
        ) where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                    let store = self.clone();
                    self.spawn_tracked(tracking, scope, async move {
                        if let Some(action) = fut.await {
                            let _ = store.action_broadcast.send(action.clone());
                            let _ = store.send(action).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);

                    let store = self.clone();
                    self.spawn_tracked(tracking, scope, async move {
                        tokio::time::sleep(duration).await;
                        let _ = store.action_broadcast.send((*action).clone());
                        let _ = store.send(*action).await;
                    });
                },
                Effect::Stream(mut stream) => {
                    tracing::trace!("Executing Effect::Stream");
                    metrics::counter!("store.effects.executed", "type" => "stream").increment(1);

                    let store = self.clone();
                    self.spawn_tracked(tracking, scope, async move {
                        let mut items = 0_u64;
                        while let Some(action) = stream.next().await {
                            items += 1;
                            let _ = store.action_broadcast.send(action.clone());
                            if store.send(action).await.is_err() {
                                break;
                            }
                        }
                        metrics::counter!("store.effects.stream_items").increment(items);
                        tracing::trace!(items, "Effect::Stream completed");
                    });
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);

                    for effect in effects {
                        self.execute_effect_internal(effect, tracking, scope);
                    }
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    tracing::trace!("Executing Effect::Sequential with {} effects", effect_count);
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);

                    let store = self.clone();
                    self.spawn_tracked(tracking, scope, async move {
                        for effect in effects {
                            // Each step gets its own tracking so we can wait for it
                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute_effect_internal(effect, &step_tracking, scope);
                            step.wait().await;
                        }
                        tracing::trace!(effect_count, "Effect::Sequential completed");
                    });
                },
                Effect::Cancellable { id, effect } => {
                    let replaced = self.cancellations.cancel(id);
                    if replaced > 0 {
                        tracing::debug!(effect_id = %id, replaced, "Replacing running effect");
                        metrics::counter!("store.effects.cancelled").increment(replaced as u64);
                    }
                    self.execute_effect_internal(*effect, tracking, Some(id));
                },
                Effect::Cancel(id) => {
                    let cancelled = self.cancellations.cancel(id);
                    tracing::debug!(effect_id = %id, cancelled, "Cancelled effects");
                    metrics::counter!("store.effects.cancelled").increment(cancelled as u64);
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                cancellations: Arc::clone(&self.cancellations),
                action_broadcast: self.action_broadcast.clone(),
                revisions: Arc::clone(&self.revisions),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
