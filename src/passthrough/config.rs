//! Tunables for a [`PassthroughContext`](super::context::PassthroughContext).

use crate::correlation::CorrelationConfig;

/// Configuration folded into [`PassthroughContext::with_config`](super::context::PassthroughContext::with_config).
///
/// Mirrors how the teacher threads a single `*Config` struct through its
/// manager constructors rather than taking each tunable as a loose
/// constructor argument.
#[derive(Debug, Clone)]
pub struct PassthroughConfig {
    /// Settings for the request/response correlation manager (timeout,
    /// cleanup interval, pending-request capacity, tracing).
    pub correlation: CorrelationConfig,
    /// The `_meta.source` value stamped onto every outbound message
    /// (spec.md §4.5 step 2/6). Defaults to `"passthrough-server"`.
    pub source_tag: String,
}

impl Default for PassthroughConfig {
    fn default() -> Self {
        Self {
            correlation: CorrelationConfig::default(),
            source_tag: "passthrough-server".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_source_tag_matches_spec() {
        assert_eq!(PassthroughConfig::default().source_tag, "passthrough-server");
    }
}
