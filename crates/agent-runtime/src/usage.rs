//! Token usage accounting

use agent_llm::TokenUsage;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Accumulates token usage over many completions.
///
/// Shared as `Arc<UsageTracker>` between every component that calls the
/// provider during a run.
#[derive(Debug, Default)]
pub struct UsageTracker {
    input_tokens: AtomicUsize,
    output_tokens: AtomicUsize,
    requests: AtomicUsize,
}

impl UsageTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the usage of one completion
    pub fn record(&self, usage: TokenUsage) {
        self.input_tokens
            .fetch_add(usage.input_tokens, Ordering::Relaxed);
        self.output_tokens
            .fetch_add(usage.output_tokens, Ordering::Relaxed);
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Usage recorded so far
    pub fn total(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
        }
    }

    /// Number of completions recorded
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record() {
        let tracker = UsageTracker::new();
        assert_eq!(tracker.total().total(), 0);

        tracker.record(TokenUsage {
            input_tokens: 120,
            output_tokens: 30,
        });
        tracker.record(TokenUsage {
            input_tokens: 80,
            output_tokens: 20,
        });

        assert_eq!(tracker.requests(), 2);
        assert_eq!(tracker.total().input_tokens, 200);
        assert_eq!(tracker.total().output_tokens, 50);
        assert_eq!(tracker.total().total(), 250);
    }
}
