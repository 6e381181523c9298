//! Control-socket server
//!
//! The game connects to a Unix domain socket once per request. The acceptor
//! binds the socket for the lifetime of the process and hands every
//! connection to its own task, so a stalled client never holds up the next.

pub mod session;

pub use session::{SessionHandler, SessionOutcome};

use crate::config::ServerConfig;
use crate::k8s::PodBackend;
use crate::{KubedoomError, Result};
use std::future::Future;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::UnixListener;
use tracing::{debug, info, warn};

pub struct Server {
    listener: UnixListener,
    socket_path: PathBuf,
    handler: Arc<SessionHandler>,
    sessions: AtomicU64,
}

impl Server {
    /// Bind the control socket, replacing a stale socket file left behind by
    /// a previous run
    pub fn bind(config: &ServerConfig, backend: Arc<dyn PodBackend>) -> Result<Self> {
        let socket_path = config.socket_path.clone();
        remove_stale_socket(&socket_path)?;

        let listener =
            UnixListener::bind(&socket_path).map_err(|source| KubedoomError::BindFailed {
                path: socket_path.clone(),
                source,
            })?;

        info!("Listening on {}", socket_path.display());

        Ok(Self {
            listener,
            socket_path,
            handler: Arc::new(SessionHandler::new(backend, config)),
            sessions: AtomicU64::new(0),
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept connections until accepting fails
    pub async fn run(&self) -> Result<()> {
        loop {
            let (stream, _) = self
                .listener
                .accept()
                .await
                .map_err(KubedoomError::AcceptFailed)?;

            let session = self.sessions.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("Accepted session {}", session);

            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                match handler.handle(stream).await {
                    Ok(outcome) => debug!("Session {} finished: {:?}", session, outcome),
                    Err(e) => warn!("Session {} failed: {}", session, e),
                }
            });
        }
    }

    /// Serve until `shutdown` completes, then remove the socket file
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let result = tokio::select! {
            result = self.run() => result,
            _ = shutdown => {
                info!("Shutdown signal received");
                Ok(())
            }
        };

        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            debug!("Could not remove {}: {}", self.socket_path.display(), e);
        }

        result
    }
}

fn remove_stale_socket(path: &Path) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(KubedoomError::BindFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.file_type().is_socket() {
        return Err(KubedoomError::SocketPathInUse(path.to_path_buf()));
    }

    // A socket somebody still answers on belongs to a live server
    if std::os::unix::net::UnixStream::connect(path).is_ok() {
        return Err(KubedoomError::SocketPathInUse(path.to_path_buf()));
    }

    debug!("Removing stale socket {}", path.display());
    std::fs::remove_file(path)?;
    Ok(())
}
