use crate::error::FetchError;
use crate::net::{Incoming, Transport};
use crossbeam_channel::Sender;
use overview_core::{Endpoint, EventQuery, ViewState, EVENTS_KEY};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Polling,
    Stopped,
}

#[derive(Debug, Default)]
struct Selection {
    generation: u64,
    query: Option<EventQuery>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything a fetch continuation needs. Cloned into the polling task.
#[derive(Clone)]
struct Shared {
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<ViewState>>,
    selection: Arc<Mutex<Selection>>,
    notifier: Option<Sender<Incoming>>,
    cancel: CancellationToken,
}

impl Shared {
    fn notify(&self, inc: Incoming) {
        if let Some(tx) = &self.notifier {
            // observer gone: nothing to tell
            let _ = tx.send(inc);
        }
    }

    fn report(&self, endpoint: &Endpoint, err: FetchError) {
        tracing::warn!(%endpoint, kind = ?err.kind(), error = %err, "fetch failed");
        self.notify(Incoming::failed(endpoint.to_string(), err));
    }

    /// `None` once cancelled; a cancelled fetch never reaches the state.
    async fn fetch(&self, endpoint: &Endpoint) -> Option<Result<Value, FetchError>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.transport.get_json(endpoint) => Some(result),
        }
    }

    fn merge_response(&self, endpoint: &Endpoint, result: Result<Value, FetchError>) -> bool {
        let patch = match result.and_then(|body| expect_object(endpoint, body)) {
            Ok(patch) => patch,
            Err(err) => {
                self.report(endpoint, err);
                return false;
            }
        };
        let mut state = lock(&self.state);
        // stop() cancels under this lock, so nothing is written after it returns
        if self.cancel.is_cancelled() {
            return false;
        }
        let keys = state.merge_from(patch);
        drop(state);
        tracing::debug!(%endpoint, ?keys, "merged response");
        self.notify(Incoming::merged(endpoint.to_string(), keys));
        true
    }

    fn assign_events(
        &self,
        endpoint: &Endpoint,
        generation: u64,
        result: Result<Value, FetchError>,
    ) -> bool {
        let events = match result.and_then(|body| extract_events(endpoint, body)) {
            Ok(events) => events,
            Err(err) => {
                self.report(endpoint, err);
                return false;
            }
        };

        // Selection stays locked through the write so a newer selection
        // cannot land between the check and the assignment.
        let selection = lock(&self.selection);
        if selection.generation != generation {
            drop(selection);
            tracing::debug!(%endpoint, generation, "discarding events for superseded selection");
            self.notify(Incoming::stale_events(endpoint.to_string()));
            return false;
        }
        let mut state = lock(&self.state);
        if self.cancel.is_cancelled() {
            return false;
        }
        let count = events.len();
        state.set_events(events);
        drop(state);
        drop(selection);

        tracing::debug!(%endpoint, count, "events replaced");
        self.notify(Incoming::events(endpoint.to_string(), count));
        true
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_object(endpoint: &Endpoint, body: Value) -> Result<Map<String, Value>, FetchError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(FetchError::body(
            endpoint,
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
    }
}

fn extract_events(endpoint: &Endpoint, body: Value) -> Result<Vec<Value>, FetchError> {
    let mut map = expect_object(endpoint, body)?;
    match map.remove(EVENTS_KEY) {
        Some(Value::Array(events)) => Ok(events),
        Some(other) => Err(FetchError::body(
            endpoint,
            format!("`events` should be an array, got {}", json_kind(&other)),
        )),
        None => Err(FetchError::body(endpoint, "missing `events`")),
    }
}

/// Keeps a [`ViewState`] fresh for a render surface.
///
/// Metadata is fetched once by [`initialize`](Self::initialize). State is
/// polled by a background task started with
/// [`start_polling`](Self::start_polling): each cycle waits for its request to
/// finish before sleeping for the interval, so at most one state request is in
/// flight. Events are fetched on demand by
/// [`fetch_events`](Self::fetch_events); only the most recent selection may
/// write `events`.
///
/// None of the operations return errors. Failures are logged and, when a
/// notifier is attached, published as [`Incoming`] notifications; the view
/// state keeps its previous values.
///
/// Dropping the view model stops polling.
pub struct PollingViewModel {
    shared: Shared,
    phase: Mutex<Phase>,
}

impl PollingViewModel {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            shared: Shared {
                transport,
                state: Arc::new(Mutex::new(ViewState::new())),
                selection: Arc::new(Mutex::new(Selection::default())),
                notifier: None,
                cancel: CancellationToken::new(),
            },
            phase: Mutex::new(Phase::Idle),
        }
    }

    pub fn with_notifier(mut self, tx: Sender<Incoming>) -> Self {
        self.shared.notifier = Some(tx);
        self
    }

    /// One-shot metadata fetch, merged into the view state.
    pub async fn initialize(&self) {
        let endpoint = Endpoint::Metadata;
        if let Some(result) = self.shared.fetch(&endpoint).await {
            self.shared.merge_response(&endpoint, result);
        }
    }

    /// Spawns the polling task on the current tokio runtime. Returns `false`
    /// if polling is already active, the view model was stopped, or there is
    /// no runtime to spawn on.
    pub fn start_polling(&self, interval: Duration) -> bool {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime; not starting polling");
            return false;
        };
        let mut phase = lock(&self.phase);
        match *phase {
            Phase::Idle => {}
            Phase::Polling => {
                tracing::warn!("polling already active");
                return false;
            }
            Phase::Stopped => {
                tracing::warn!("view model stopped; not starting polling");
                return false;
            }
        }
        *phase = Phase::Polling;
        drop(phase);

        tracing::info!(?interval, "polling started");
        handle.spawn(poll_loop(self.shared.clone(), interval));
        true
    }

    /// Fetches events for one node of an execution and makes that pair the
    /// current selection. A response that arrives after a newer selection was
    /// made is dropped.
    pub async fn fetch_events(&self, execution_id: &str, node_instance_id: &str) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        let query = EventQuery::new(execution_id, node_instance_id);
        let generation = {
            let mut selection = lock(&self.shared.selection);
            selection.generation = selection.generation.wrapping_add(1);
            selection.query = Some(query.clone());
            selection.generation
        };

        let endpoint = Endpoint::Events(query);
        let Some(result) = self.shared.fetch(&endpoint).await else {
            return;
        };
        self.shared.assign_events(&endpoint, generation, result);
    }

    /// Cancels polling and any in-flight fetch. Idempotent; `Stopped` is final.
    pub fn stop(&self) {
        let mut phase = lock(&self.phase);
        if *phase == Phase::Stopped {
            return;
        }
        *phase = Phase::Stopped;
        drop(phase);

        {
            let _state = lock(&self.shared.state);
            self.shared.cancel.cancel();
        }
        tracing::info!("view model stopped");
        self.shared.notify(Incoming::stopped());
    }

    pub fn snapshot(&self) -> ViewState {
        lock(&self.shared.state).clone()
    }

    pub fn selection(&self) -> Option<EventQuery> {
        lock(&self.shared.selection).query.clone()
    }

    pub fn phase(&self) -> Phase {
        *lock(&self.phase)
    }

    pub fn is_polling(&self) -> bool {
        self.phase() == Phase::Polling
    }
}

impl Drop for PollingViewModel {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(shared: Shared, interval: Duration) {
    let endpoint = Endpoint::State;
    let mut cycle: u64 = 0;
    loop {
        cycle = cycle.wrapping_add(1);
        let Some(result) = shared.fetch(&endpoint).await else {
            break;
        };
        let ok = shared.merge_response(&endpoint, result);
        tracing::trace!(cycle, ok, "poll cycle finished");

        // next cycle is scheduled only once this one has completed
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    tracing::debug!(cycles = cycle, "polling loop exited");
}
