pub mod cli;
pub mod config;
pub mod control;
pub mod error;
pub mod k8s;
pub mod launcher;
pub mod server;

pub use error::{KubedoomError, Result};
pub use kubedoom_common as protocol;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
