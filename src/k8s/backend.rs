use crate::config::{BackendConfig, BackendKind};
use crate::k8s::{K8sClient, Kubectl, PodRef};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of workload snapshots and sink for delete requests.
///
/// Implementations hold no per-request state; every call goes to the cluster.
#[async_trait]
pub trait PodBackend: Send + Sync {
    /// All pods across all namespaces, in the order the cluster reports them
    async fn list_pods(&self) -> Result<Vec<PodRef>>;

    /// Delete one pod. Deleting a pod that is already gone is not an error.
    async fn delete_pod(&self, pod: &PodRef) -> Result<()>;
}

/// Build the backend selected by `config`
pub async fn connect(config: &BackendConfig) -> Result<Arc<dyn PodBackend>> {
    let backend: Arc<dyn PodBackend> = match config.kind {
        BackendKind::Kubectl => Arc::new(Kubectl::new(
            config.kubectl.clone(),
            config.command_timeout(),
        )),
        BackendKind::Api => Arc::new(K8sClient::try_default(config.command_timeout()).await?),
    };
    Ok(backend)
}
