pub mod backend;
pub mod client;
pub mod kubectl;
pub mod types;

pub use backend::{connect, PodBackend};
pub use client::K8sClient;
pub use kubectl::Kubectl;
pub use types::PodRef;
