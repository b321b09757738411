use std::{collections::VecDeque, sync::Arc};

use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    time::{sleep, Duration},
};
use tracing::debug;

use crate::{
    config::Settings,
    core::log::QsoLog,
    engine::{
        lookup::LookupSource,
        registry::{Registry, ResolvedHandler},
        sections::{AnalyzeInput, Analysis, SectionEngine},
    },
    operation::Operation,
    qso::Qso,
};

/// Failures talking to the scoring worker.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// The worker stopped or dropped the reply.
    #[error("scoring runtime channel closed")]
    ChannelClosed,
    /// The blocking analysis task did not complete.
    #[error("analysis worker failed: {0}")]
    Worker(String),
}

/// Worker tuning.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Quiet period after an analyze request before computing; requests
    /// arriving meanwhile share one pass over the newest snapshot.
    pub debounce_ms: u64,
    /// Command queue capacity.
    pub queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            queue_bound: 64,
        }
    }
}

/// Owned snapshot for one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    /// Log entries in order.
    pub qsos: Vec<Qso>,
    /// Operation the log starts under.
    pub operation: Operation,
    /// User settings.
    pub settings: Settings,
    /// Keep deleted entries in the output.
    pub show_deleted_qsos: bool,
}

impl AnalyzeRequest {
    /// Snapshot of every entry in `log`.
    pub fn from_log(log: &QsoLog, operation: Operation, settings: Settings) -> Self {
        Self {
            qsos: log.qsos().to_vec(),
            operation,
            settings,
            show_deleted_qsos: false,
        }
    }
}

/// Cloneable handle to a running scoring worker.
#[derive(Clone)]
pub struct ScoringHandle {
    cmd_tx: mpsc::Sender<Command>,
}

enum Command {
    Analyze {
        request: AnalyzeRequest,
        resp: oneshot::Sender<Result<Arc<Analysis>, RuntimeError>>,
    },
    Resolve {
        operation: Operation,
        settings: Settings,
        resp: oneshot::Sender<Vec<ResolvedHandler>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Starts the scoring worker on the current tokio runtime.
pub fn spawn_scoring(
    registry: Arc<Registry>,
    lookup: Arc<dyn LookupSource>,
    config: RuntimeConfig,
) -> ScoringHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.queue_bound.max(1));

    tokio::spawn(async move {
        let mut deferred: VecDeque<Command> = VecDeque::new();

        loop {
            let cmd = match deferred.pop_front() {
                Some(cmd) => cmd,
                None => match cmd_rx.recv().await {
                    Some(cmd) => cmd,
                    None => break,
                },
            };

            match cmd {
                Command::Analyze { request, resp } => {
                    let mut latest = request;
                    let mut waiters = vec![resp];

                    if config.debounce_ms > 0 {
                        sleep(Duration::from_millis(config.debounce_ms)).await;
                    }
                    while let Ok(next) = cmd_rx.try_recv() {
                        match next {
                            Command::Analyze { request, resp } => {
                                latest = request;
                                waiters.push(resp);
                            }
                            other => deferred.push_back(other),
                        }
                    }

                    debug!(coalesced = waiters.len(), qsos = latest.qsos.len(), "running analysis");
                    let result =
                        run_analysis(Arc::clone(&registry), Arc::clone(&lookup), latest).await;
                    for waiter in waiters {
                        let _ = waiter.send(result.clone());
                    }
                }
                Command::Resolve {
                    operation,
                    settings,
                    resp,
                } => {
                    let _ = resp.send(registry.resolve_handlers(&operation, &settings));
                }
                Command::Shutdown { resp } => {
                    let _ = resp.send(());
                    break;
                }
            }
        }
    });

    ScoringHandle { cmd_tx }
}

async fn run_analysis(
    registry: Arc<Registry>,
    lookup: Arc<dyn LookupSource>,
    request: AnalyzeRequest,
) -> Result<Arc<Analysis>, RuntimeError> {
    tokio::task::spawn_blocking(move || {
        let input = AnalyzeInput {
            qsos: &request.qsos,
            operation: &request.operation,
            settings: &request.settings,
            show_deleted_qsos: request.show_deleted_qsos,
        };
        let engine = SectionEngine::new(&registry).with_lookup(lookup.as_ref());
        Arc::new(engine.analyze(&input))
    })
    .await
    .map_err(|e| RuntimeError::Worker(format!("join error: {e}")))
}

impl ScoringHandle {
    /// Analyzes `request`, possibly together with requests queued behind it.
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<Arc<Analysis>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Analyze { request, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Handlers that would score a log under `operation`.
    pub async fn resolve_handlers(
        &self,
        operation: Operation,
        settings: Settings,
    ) -> Result<Vec<ResolvedHandler>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Resolve {
                operation,
                settings,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stops the worker after earlier commands finish.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}
