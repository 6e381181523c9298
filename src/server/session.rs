//! One control-socket connection
//!
//! A session reads a single command, resolves it against a snapshot fetched
//! for that command alone, answers or dispatches a delete, and ends. The
//! handler never reads a second command from the same connection.

use crate::config::ServerConfig;
use crate::k8s::{PodBackend, PodRef};
use crate::Result;
use bytes::BytesMut;
use kubedoom_common::{encode_record, Command, RecordLayout, READ_BUFFER_SIZE};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The client closed, failed or stayed silent before sending a command
    Disconnected,
    /// Records were written for the snapshot
    Listed { records: usize, skipped: usize },
    /// A delete was issued for the first pod matching the identifier
    Dispatched { pod: PodRef },
    NoMatch { id: i32 },
    /// The request was not a command; nothing was done
    Ignored { request: String },
    /// The request was a malformed command
    Rejected { reason: String },
    /// The snapshot could not be fetched
    Unavailable { reason: String },
}

pub struct SessionHandler {
    backend: Arc<dyn PodBackend>,
    layout: RecordLayout,
    read_timeout: Duration,
}

impl SessionHandler {
    pub fn new(backend: Arc<dyn PodBackend>, config: &ServerConfig) -> Self {
        Self {
            backend,
            layout: config.record_layout(),
            read_timeout: config.read_timeout(),
        }
    }

    /// Serve one connection to completion.
    ///
    /// Only a failed write of the listing is returned as an error; every other
    /// problem ends the session with an outcome describing it.
    pub async fn handle<S>(&self, mut stream: S) -> Result<SessionOutcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(request) = self.read_request(&mut stream).await else {
            return Ok(SessionOutcome::Disconnected);
        };
        debug!("Received: {:?}", request.trim());

        let command = match Command::parse(&request) {
            Ok(command) => command,
            Err(e) => {
                warn!("Rejecting request: {}", e);
                return Ok(SessionOutcome::Rejected {
                    reason: e.to_string(),
                });
            }
        };

        match command {
            Command::List => self.list(&mut stream).await,
            Command::Kill(id) => Ok(self.kill(id).await),
            Command::Unrecognized(request) => {
                debug!("Ignoring unrecognized request {:?}", request);
                Ok(SessionOutcome::Ignored { request })
            }
        }
    }

    async fn read_request<S>(&self, stream: &mut S) -> Option<String>
    where
        S: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        match tokio::time::timeout(self.read_timeout, stream.read(&mut buf)).await {
            Ok(Ok(0)) => {
                debug!("Client closed before sending a command");
                None
            }
            Ok(Ok(n)) => Some(String::from_utf8_lossy(&buf[..n]).into_owned()),
            Ok(Err(e)) => {
                debug!("Read failed: {}", e);
                None
            }
            Err(_) => {
                debug!("No command within {:?}", self.read_timeout);
                None
            }
        }
    }

    async fn snapshot(&self) -> std::result::Result<Vec<PodRef>, SessionOutcome> {
        self.backend.list_pods().await.map_err(|e| {
            warn!("Could not list pods: {}", e);
            SessionOutcome::Unavailable {
                reason: e.to_string(),
            }
        })
    }

    async fn list<S>(&self, stream: &mut S) -> Result<SessionOutcome>
    where
        S: AsyncWrite + Unpin,
    {
        let pods = match self.snapshot().await {
            Ok(pods) => pods,
            Err(outcome) => return Ok(outcome),
        };

        let mut response = BytesMut::with_capacity(pods.len() * self.layout.width);
        let mut skipped = 0;

        for pod in &pods {
            let name = pod.to_string();
            match encode_record(&name, &self.layout) {
                Some(record) => response.extend_from_slice(&record),
                None => {
                    warn!(
                        "Leaving {} out of the listing: longer than {} bytes",
                        name, self.layout.width
                    );
                    skipped += 1;
                }
            }
        }

        stream.write_all(&response).await?;
        stream.shutdown().await?;

        let records = pods.len() - skipped;
        debug!("Listed {} pods", records);
        Ok(SessionOutcome::Listed { records, skipped })
    }

    async fn kill(&self, id: i32) -> SessionOutcome {
        let pods = match self.snapshot().await {
            Ok(pods) => pods,
            Err(outcome) => return outcome,
        };

        // Earliest listed pod wins a hash collision
        let Some(pod) = pods.into_iter().find(|pod| pod.id() == id) else {
            debug!("No pod with identifier {}", id);
            return SessionOutcome::NoMatch { id };
        };

        info!("Killing pod {} (id {})", pod, id);

        let backend = Arc::clone(&self.backend);
        let target = pod.clone();
        tokio::spawn(async move {
            if let Err(e) = backend.delete_pod(&target).await {
                warn!("Failed to delete pod {}: {}", target, e);
            }
        });

        SessionOutcome::Dispatched { pod }
    }
}
