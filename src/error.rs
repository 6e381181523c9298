use kubedoom_common::ParseError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubedoomError {
    #[error("Could not bind control socket {path}: {source}")]
    BindFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to replace {0}: path exists and is not a socket")]
    SocketPathInUse(PathBuf),

    #[error("Failed to accept connection: {0}")]
    AcceptFailed(#[source] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("Command `{command}` failed with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Command `{command}` timed out after {timeout:?}")]
    CommandTimedOut { command: String, timeout: Duration },

    #[error("Could not start `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed pod name: {0:?}")]
    MalformedPodName(String),

    #[error("Kubernetes error: {0}")]
    KubernetesError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KubedoomError>;
