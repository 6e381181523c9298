use crate::k8s::{PodBackend, PodRef};
use crate::{KubedoomError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, ListParams};
use kube::{Api, Client};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Pod backend talking to the API server through the in-cluster or
/// kubeconfig credentials
pub struct K8sClient {
    client: Client,
    timeout: Duration,
}

impl K8sClient {
    pub async fn try_default(timeout: Duration) -> Result<Self> {
        debug!("Initializing Kubernetes client");

        let client = Client::try_default().await.map_err(|e| {
            KubedoomError::KubernetesError(format!("Failed to create K8s client: {}", e))
        })?;

        info!("Successfully connected to Kubernetes cluster");

        Ok(Self { client, timeout })
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn pods_all(&self) -> Api<Pod> {
        Api::all(self.client.clone())
    }

    async fn bounded<T, F>(&self, what: String, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => {
                result.map_err(|e| KubedoomError::KubernetesError(format!("{}: {}", what, e)))
            }
            Err(_) => Err(KubedoomError::CommandTimedOut {
                command: what,
                timeout: self.timeout,
            }),
        }
    }
}

fn is_not_found(e: &kube::Error) -> bool {
    matches!(e, kube::Error::Api(response) if response.code == 404)
}

#[async_trait]
impl PodBackend for K8sClient {
    async fn list_pods(&self) -> Result<Vec<PodRef>> {
        let pods = self.pods_all();
        let pod_list = self
            .bounded(
                "Failed to list pods".to_string(),
                pods.list(&ListParams::default()),
            )
            .await?;

        Ok(pod_list.items.iter().filter_map(PodRef::from_k8s_pod).collect())
    }

    async fn delete_pod(&self, pod: &PodRef) -> Result<()> {
        let pods = self.pods(&pod.namespace);
        let what = format!("Failed to delete pod {}", pod);

        let deleted = tokio::time::timeout(
            self.timeout,
            pods.delete(&pod.name, &DeleteParams::default()),
        )
        .await;

        match deleted {
            Ok(Ok(_)) => {
                info!("Deleted pod {}", pod);
                Ok(())
            }
            Ok(Err(e)) if is_not_found(&e) => {
                debug!("Pod {} was already gone", pod);
                Ok(())
            }
            Ok(Err(e)) => Err(KubedoomError::KubernetesError(format!("{}: {}", what, e))),
            Err(_) => Err(KubedoomError::CommandTimedOut {
                command: what,
                timeout: self.timeout,
            }),
        }
    }
}
