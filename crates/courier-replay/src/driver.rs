//! Single-owner task hosting the projection.
//!
//! The [`EventReducer`] lives inside one tokio task. Callers talk to it
//! through [`DriverHandle`]; every command runs to completion, including
//! the backend round trips it triggers, before the next is taken.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use courier_projection::{
    EventReducer, GroupedItem, ProjectionConfig, ProjectionEvent, SearchFilter, SearchSection,
    SweepHandle,
};

use crate::backend::MemoryBackend;
use crate::error::{ReplayError, Result};

/// Commands sent *to* the driver task.
#[derive(Debug)]
pub enum DriverCommand {
    /// Feed a backend event.
    Event(ProjectionEvent),
    /// Run a search and return the sectioned view.
    Search {
        query: String,
        filter: SearchFilter,
        reply: oneshot::Sender<Vec<SearchSection>>,
    },
    /// Current ordered, grouped view.
    Snapshot(oneshot::Sender<Arc<[GroupedItem]>>),
    /// Delete every listed entity.
    DeleteAll {
        reply: oneshot::Sender<SweepHandle>,
    },
    Shutdown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub events_applied: usize,
    pub requests_answered: usize,
    pub sweeps_completed: usize,
}

pub struct DriverHandle {
    cmd_tx: mpsc::Sender<DriverCommand>,
    revision_rx: watch::Receiver<u64>,
    task: JoinHandle<DriverStats>,
}

/// Spawn the driver task and request the initial bulk load.
pub fn spawn_driver(
    config: ProjectionConfig,
    backend: MemoryBackend,
    capacity: usize,
) -> DriverHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel::<DriverCommand>(capacity.max(1));
    let (revision_tx, revision_rx) = watch::channel(0u64);

    let mut reducer = EventReducer::new(config);
    reducer.subscribe(Box::new(move |revision| {
        revision_tx.send_replace(revision);
    }));

    let task = tokio::spawn(run(reducer, backend, cmd_rx));

    DriverHandle {
        cmd_tx,
        revision_rx,
        task,
    }
}

async fn run(
    mut reducer: EventReducer,
    mut backend: MemoryBackend,
    mut cmd_rx: mpsc::Receiver<DriverCommand>,
) -> DriverStats {
    let mut stats = DriverStats::default();
    info!(
        screen = %reducer.config().screen,
        records = backend.len(),
        "Projection driver started"
    );

    reducer.request_bulk_load();
    pump(&mut reducer, &mut backend, &mut stats);

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            DriverCommand::Event(event) => {
                backend.observe(&event);
                let outcome = reducer.apply(event);
                stats.events_applied += 1;
                stats.sweeps_completed += outcome.sweeps_completed.len();
                pump(&mut reducer, &mut backend, &mut stats);
            }
            DriverCommand::Search {
                query,
                filter,
                reply,
            } => {
                reducer.current_search_view(&query, filter);
                pump(&mut reducer, &mut backend, &mut stats);
                let sections = reducer.current_search_view(&query, filter);
                if reply.send(sections).is_err() {
                    debug!("Search caller went away");
                }
            }
            DriverCommand::Snapshot(reply) => {
                let _ = reply.send(reducer.current_ordered_grouped_view());
            }
            DriverCommand::DeleteAll { reply } => {
                let handle = reducer.begin_delete_all_sweep();
                if handle.pending == 0 {
                    stats.sweeps_completed += 1;
                }
                pump(&mut reducer, &mut backend, &mut stats);
                let _ = reply.send(handle);
            }
            DriverCommand::Shutdown => {
                info!("Projection driver shutting down");
                break;
            }
        }
    }

    if reducer.sweeps().active_count() > 0 {
        warn!(
            running = reducer.sweeps().active_count(),
            "Driver stopped with delete sweeps still running"
        );
    }
    stats
}

/// Answer queued requests until the reducer stops asking.
fn pump(reducer: &mut EventReducer, backend: &mut MemoryBackend, stats: &mut DriverStats) {
    loop {
        let requests = reducer.drain_requests();
        if requests.is_empty() {
            return;
        }
        for request in requests {
            stats.requests_answered += 1;
            if let Some(answer) = backend.answer(&request) {
                let outcome = reducer.apply(answer);
                stats.sweeps_completed += outcome.sweeps_completed.len();
            }
        }
    }
}

impl DriverHandle {
    pub async fn send(&self, event: ProjectionEvent) -> Result<()> {
        self.cmd_tx
            .send(DriverCommand::Event(event))
            .await
            .map_err(|_| ReplayError::DriverStopped)
    }

    pub async fn search(&self, query: &str, filter: SearchFilter) -> Result<Vec<SearchSection>> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(DriverCommand::Search {
                query: query.to_string(),
                filter,
                reply,
            })
            .await
            .map_err(|_| ReplayError::DriverStopped)?;
        rx.await.map_err(|_| ReplayError::DriverStopped)
    }

    pub async fn snapshot(&self) -> Result<Arc<[GroupedItem]>> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(DriverCommand::Snapshot(reply))
            .await
            .map_err(|_| ReplayError::DriverStopped)?;
        rx.await.map_err(|_| ReplayError::DriverStopped)
    }

    pub async fn delete_all(&self) -> Result<SweepHandle> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(DriverCommand::DeleteAll { reply })
            .await
            .map_err(|_| ReplayError::DriverStopped)?;
        rx.await.map_err(|_| ReplayError::DriverStopped)
    }

    /// Latest committed revision of the projection.
    pub fn revision(&self) -> u64 {
        *self.revision_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_rx.clone()
    }

    /// Stop the task and collect its counters.
    pub async fn shutdown(self) -> Result<DriverStats> {
        // The task may already have stopped; the join below still reports.
        let _ = self.cmd_tx.send(DriverCommand::Shutdown).await;
        self.task.await.map_err(|_| ReplayError::DriverStopped)
    }
}
