use std::io;
use std::time::Duration;

use sqlnav_adapters::DriverBackend;
use sqlnav_core::catalog_navigator::NodeId;
use sqlnav_core::connection_manager::{ConnectionBackend, ConnectionParams};
use sqlnav_core::session::{Session, SessionSnapshot};
use sqlnav_core::settings::Settings;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerRequest {
    Connect(ConnectionParams),
    ExpandNode(NodeId),
    SelectNode(NodeId),
    Execute(String),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Connected {
        snapshot: SessionSnapshot,
        latency: Duration,
    },
    ConnectFailed(String),
    /// `editor_text` is set when the action rewrote the editor (table preview).
    Updated {
        snapshot: SessionSnapshot,
        editor_text: Option<String>,
    },
}

/// Applies requests to the session one at a time, in arrival order, and
/// answers each with exactly one event. Ends on `Shutdown` or when either
/// channel closes.
pub async fn serve<B>(
    mut session: Session<B>,
    mut requests: UnboundedReceiver<WorkerRequest>,
    events: UnboundedSender<WorkerEvent>,
) where
    B: ConnectionBackend,
{
    while let Some(request) = requests.recv().await {
        let event = match request {
            WorkerRequest::Connect(params) => match session.connect(&params).await {
                Ok(latency) => WorkerEvent::Connected {
                    snapshot: session.snapshot(),
                    latency,
                },
                Err(error) => WorkerEvent::ConnectFailed(error.to_string()),
            },
            WorkerRequest::ExpandNode(id) => {
                session.expand_node(&id).await;
                WorkerEvent::Updated {
                    snapshot: session.snapshot(),
                    editor_text: None,
                }
            }
            WorkerRequest::SelectNode(id) => {
                let rewrites_editor = matches!(id, NodeId::Table { .. });
                session.select_node(&id).await;
                WorkerEvent::Updated {
                    snapshot: session.snapshot(),
                    editor_text: rewrites_editor.then(|| session.editor_text().to_string()),
                }
            }
            WorkerRequest::Execute(sql) => {
                session.execute(sql).await;
                WorkerEvent::Updated {
                    snapshot: session.snapshot(),
                    editor_text: None,
                }
            }
            WorkerRequest::Shutdown => {
                if let Err(error) = session.disconnect().await {
                    warn!(%error, "disconnect on shutdown failed");
                }
                break;
            }
        };

        if events.send(event).is_err() {
            debug!("ui side of the worker channel closed");
            break;
        }
    }
    info!("database worker stopped");
}

/// UI-side handle: owns the runtime the worker task runs on.
#[derive(Debug)]
pub struct DbWorker {
    runtime: Runtime,
    requests: UnboundedSender<WorkerRequest>,
    events: UnboundedReceiver<WorkerEvent>,
    pending: usize,
}

impl DbWorker {
    pub fn spawn(settings: &Settings) -> io::Result<Self> {
        Self::spawn_with(DriverBackend::default(), settings)
    }

    pub fn spawn_with<B>(backend: B, settings: &Settings) -> io::Result<Self>
    where
        B: ConnectionBackend + 'static,
    {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("sqlnav-db")
            .enable_all()
            .build()?;
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        runtime.spawn(serve(Session::new(backend, settings), request_rx, event_tx));

        Ok(Self {
            runtime,
            requests: request_tx,
            events: event_rx,
            pending: 0,
        })
    }

    /// Returns `false` once the worker has stopped.
    pub fn send(&mut self, request: WorkerRequest) -> bool {
        let sent = self.requests.send(request).is_ok();
        if sent {
            self.pending += 1;
        }
        sent
    }

    pub fn try_recv(&mut self) -> Option<WorkerEvent> {
        let event = self.events.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(event)
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending > 0
    }

    pub fn shutdown(self) {
        let _ = self.requests.send(WorkerRequest::Shutdown);
        self.runtime.shutdown_timeout(SHUTDOWN_GRACE);
    }
}
