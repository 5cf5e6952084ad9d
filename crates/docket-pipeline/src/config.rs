use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the [`UpdateExecutor`](crate::executor::UpdateExecutor).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Upper bound on a single store call. An elapsed call is reported as a
    /// store failure and its write is abandoned.
    pub store_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
        }
    }
}

/// Whether writes to a collection must carry an entity tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtagPolicy {
    /// Every write must supply `If-Match`.
    Required,
    /// `If-Match` is checked when supplied, or when the request asks for it.
    #[default]
    Optional,
}

impl EtagPolicy {
    /// Whether verification is mandatory for a request. `forced` reflects a
    /// per-request opt-in such as the `checkEtag` query parameter.
    pub fn requires_check(&self, forced: bool) -> bool {
        forced || matches!(self, Self::Required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_executor_config() {
        assert_eq!(ExecutorConfig::default().store_timeout, Duration::from_secs(10));
    }

    #[test]
    fn etag_policy() {
        assert!(EtagPolicy::Required.requires_check(false));
        assert!(!EtagPolicy::Optional.requires_check(false));
        assert!(EtagPolicy::Optional.requires_check(true));
        assert_eq!(EtagPolicy::default(), EtagPolicy::Optional);
    }
}
