//! Background thread that applies index updates
//!
//! Hosts that cannot await (UI event loops, sync callbacks) push
//! [`IndexCommand`]s onto a queue. A dedicated thread with its own tokio
//! runtime drains the queue against a [`SearchSession`] and reports each
//! outcome as an [`IndexEvent`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use taskdeck_core::{EntityKind, WorkspaceId, WorkspaceSnapshot};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SessionError};
use crate::session::{ReindexOutcome, ReindexReport, SearchSession};

const QUEUE_CAPACITY: usize = 1024;

/// Commands sent from the host to the worker
#[derive(Debug)]
pub enum IndexCommand {
    /// A workspace's entities changed; carries the full current snapshot
    EntitiesChanged { snapshot: WorkspaceSnapshot },
    EntitiesRemoved {
        workspace_id: WorkspaceId,
        kind: EntityKind,
        ids: Vec<String>,
    },
    WorkspaceRemoved { workspace_id: WorkspaceId },
    ReindexAll,
    Shutdown,
}

/// Events sent from the worker back to the host
#[derive(Debug, Clone)]
pub enum IndexEvent {
    WorkspaceIndexed {
        workspace_id: WorkspaceId,
        outcome: ReindexOutcome,
    },
    EntitiesRemoved {
        workspace_id: WorkspaceId,
        kind: EntityKind,
        removed: usize,
    },
    WorkspaceRemoved {
        workspace_id: WorkspaceId,
        removed: usize,
    },
    ReindexCompleted { report: ReindexReport },
    Failed {
        workspace_id: Option<WorkspaceId>,
        message: String,
    },
}

/// Handle to the worker thread; dropping it stops the thread
pub struct IndexWorker {
    cmd_tx: Sender<IndexCommand>,
    event_rx: Receiver<IndexEvent>,
    thread: Option<JoinHandle<()>>,
}

impl IndexWorker {
    pub fn spawn(session: Arc<SearchSession>) -> Result<Self> {
        let (cmd_tx, cmd_rx) = bounded::<IndexCommand>(QUEUE_CAPACITY);
        let (event_tx, event_rx) = bounded::<IndexEvent>(QUEUE_CAPACITY);

        let rt = Builder::new_current_thread().enable_all().build().map_err(|e| {
            error!("Failed to create index worker runtime: {}", e);
            SessionError::Io(e)
        })?;

        let thread = thread::Builder::new()
            .name("taskdeck-index".to_string())
            .spawn(move || worker_loop(rt, session, cmd_rx, event_tx))
            .map_err(|e| {
                error!("Failed to spawn index worker: {}", e);
                SessionError::Io(e)
            })?;

        Ok(Self {
            cmd_tx,
            event_rx,
            thread: Some(thread),
        })
    }

    /// Queue a command without blocking
    pub fn send(&self, cmd: IndexCommand) -> Result<()> {
        self.cmd_tx.try_send(cmd).map_err(|e| match e {
            TrySendError::Full(_) => SessionError::QueueFull,
            TrySendError::Disconnected(_) => SessionError::WorkerStopped,
        })
    }

    pub fn try_recv(&self) -> Option<IndexEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<IndexEvent>> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SessionError::WorkerStopped),
        }
    }
}

impl Drop for IndexWorker {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(IndexCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Index worker panicked");
            }
        }
    }
}

fn worker_loop(
    rt: Runtime,
    session: Arc<SearchSession>,
    cmd_rx: Receiver<IndexCommand>,
    event_tx: Sender<IndexEvent>,
) {
    rt.block_on(async move {
        info!("Index worker started");

        // Block waiting for commands, then take whatever else is queued
        while let Ok(first) = cmd_rx.recv() {
            let mut batch = vec![first];
            batch.extend(cmd_rx.try_iter());

            let stop = match batch
                .iter()
                .position(|cmd| matches!(cmd, IndexCommand::Shutdown))
            {
                Some(at) => {
                    let dropped = batch.len() - at - 1;
                    if dropped > 0 {
                        debug!("Dropping {} commands queued after shutdown", dropped);
                    }
                    batch.truncate(at);
                    true
                }
                None => false,
            };

            for cmd in coalesce(batch) {
                if let Some(event) = process_command(&session, cmd).await {
                    if event_tx.try_send(event).is_err() {
                        warn!("Index event queue full, dropping event");
                    }
                }
            }

            if stop {
                break;
            }
        }

        info!("Index worker stopped");
    });
}

/// Collapse runs of `EntitiesChanged` to the newest snapshot per workspace
///
/// Only adjacent change commands are merged; any other command in between
/// keeps its position relative to the changes around it.
pub fn coalesce(commands: Vec<IndexCommand>) -> Vec<IndexCommand> {
    let mut out: Vec<IndexCommand> = Vec::with_capacity(commands.len());
    let mut run_start = 0;

    for cmd in commands {
        match cmd {
            IndexCommand::EntitiesChanged { snapshot } => {
                let id = &snapshot.workspace.id;
                if let Some(pos) = out[run_start..].iter().position(|queued| {
                    matches!(queued, IndexCommand::EntitiesChanged { snapshot: s } if s.workspace.id == *id)
                }) {
                    debug!("Coalescing queued changes for workspace {}", id);
                    out.remove(run_start + pos);
                }
                out.push(IndexCommand::EntitiesChanged { snapshot });
            }
            other => {
                out.push(other);
                run_start = out.len();
            }
        }
    }
    out
}

async fn process_command(session: &SearchSession, cmd: IndexCommand) -> Option<IndexEvent> {
    match cmd {
        IndexCommand::EntitiesChanged { snapshot } => {
            let workspace_id = snapshot.workspace.id.clone();
            match session.index_snapshot(snapshot).await {
                Ok(outcome) => Some(IndexEvent::WorkspaceIndexed {
                    workspace_id,
                    outcome,
                }),
                Err(e) => Some(IndexEvent::Failed {
                    workspace_id: Some(workspace_id),
                    message: e.to_string(),
                }),
            }
        }

        IndexCommand::EntitiesRemoved {
            workspace_id,
            kind,
            ids,
        } => {
            let removed = session.remove_entities(&workspace_id, kind, &ids).await;
            Some(IndexEvent::EntitiesRemoved {
                workspace_id,
                kind,
                removed,
            })
        }

        IndexCommand::WorkspaceRemoved { workspace_id } => {
            let removed = session.remove_workspace(&workspace_id).await;
            Some(IndexEvent::WorkspaceRemoved {
                workspace_id,
                removed,
            })
        }

        IndexCommand::ReindexAll => {
            let report = session.reindex_all().await;
            Some(IndexEvent::ReindexCompleted { report })
        }

        IndexCommand::Shutdown => None,
    }
}
