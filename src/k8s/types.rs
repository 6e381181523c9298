use crate::KubedoomError;
use kubedoom_common::pod_id;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A pod addressed by namespace and name, written `namespace/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
}

impl PodRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn from_k8s_pod(pod: &k8s_openapi::api::core::v1::Pod) -> Option<Self> {
        let metadata = &pod.metadata;
        Some(Self::new(
            metadata.namespace.clone()?,
            metadata.name.clone()?,
        ))
    }

    /// Identifier the game shows for this pod
    pub fn id(&self) -> i32 {
        pod_id(&self.to_string())
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for PodRef {
    type Err = KubedoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || KubedoomError::MalformedPodName(s.to_string());

        if s.chars().any(char::is_whitespace) {
            return Err(malformed());
        }

        let (namespace, name) = s.split_once('/').ok_or_else(malformed)?;
        if namespace.is_empty() || name.is_empty() {
            return Err(malformed());
        }

        Ok(Self::new(namespace, name))
    }
}
