//! Pod backend that shells out to `kubectl`

use crate::k8s::{PodBackend, PodRef};
use crate::{KubedoomError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Renders every pod as `namespace/name` followed by a space
const POD_LIST_TEMPLATE: &str =
    "--template={{range .items}}{{.metadata.namespace}}/{{.metadata.name}} {{end}}";

pub struct Kubectl {
    binary: PathBuf,
    timeout: Duration,
}

impl Kubectl {
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    fn describe(&self, args: &[&str]) -> String {
        let mut command = self.binary.display().to_string();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }

    /// Run kubectl with `args` and return its stdout
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        let command = self.describe(args);
        debug!("Running {}", command);

        let mut child = Command::new(&self.binary);
        child.args(args).stdin(Stdio::null()).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, child.output())
            .await
            .map_err(|_| KubedoomError::CommandTimedOut {
                command: command.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| KubedoomError::Launch {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(KubedoomError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

fn list_args() -> [&'static str; 6] {
    ["get", "pods", "-A", "-o", "go-template", POD_LIST_TEMPLATE]
}

fn delete_args(pod: &PodRef) -> [&str; 5] {
    ["delete", "pod", &pod.name, "--namespace", &pod.namespace]
}

/// Parse the whitespace separated `namespace/name` tokens of a pod listing
pub fn parse_pod_list(output: &str) -> Result<Vec<PodRef>> {
    output.split_whitespace().map(str::parse).collect()
}

#[async_trait]
impl PodBackend for Kubectl {
    async fn list_pods(&self) -> Result<Vec<PodRef>> {
        let stdout = self.run(&list_args()).await?;
        let stdout = String::from_utf8(stdout).map_err(|e| {
            KubedoomError::MalformedPodName(String::from_utf8_lossy(e.as_bytes()).into_owned())
        })?;

        let pods = parse_pod_list(&stdout)?;
        debug!("kubectl listed {} pods", pods.len());
        Ok(pods)
    }

    async fn delete_pod(&self, pod: &PodRef) -> Result<()> {
        match self.run(&delete_args(pod)).await {
            Ok(_) => {
                info!("Deleted pod {}", pod);
                Ok(())
            }
            Err(KubedoomError::CommandFailed { stderr, .. }) if stderr.contains("NotFound") => {
                debug!("Pod {} was already gone", pod);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
