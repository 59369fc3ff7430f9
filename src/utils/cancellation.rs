// src/utils/cancellation.rs - Cooperative cancellation and run deadline
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crate::error::{MatchError, MatchResult};
use crate::models::stats_models::MatchStage;

/// Shared between the caller and both stages. Checked once per source row;
/// when it never fires, stage outputs are unaffected.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    started: Instant,
    deadline: Option<Duration>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            started: Instant::now(),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(timeout),
            ..Self::new()
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self, stage: MatchStage) -> MatchResult<()> {
        if self.is_cancelled() {
            return Err(MatchError::Cancelled { stage });
        }
        if let Some(deadline) = self.deadline {
            let elapsed = self.started.elapsed();
            if elapsed > deadline {
                // stop sibling workers without each re-reading the clock
                self.cancel();
                return Err(MatchError::DeadlineExceeded { stage, elapsed });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_passes() {
        let token = CancellationToken::new();
        assert!(token.check(MatchStage::TopToSfdc).is_ok());
    }

    #[test]
    fn test_cancel_is_seen_by_clones() {
        let token = CancellationToken::new();
        let worker_view = token.clone();
        token.cancel();
        assert!(matches!(
            worker_view.check(MatchStage::SfdcToSap),
            Err(MatchError::Cancelled { stage: MatchStage::SfdcToSap })
        ));
    }

    #[test]
    fn test_expired_deadline() {
        let token = CancellationToken::with_timeout(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(
            token.check(MatchStage::TopToSfdc),
            Err(MatchError::DeadlineExceeded { .. })
        ));
        // later checks report plain cancellation
        assert!(matches!(
            token.check(MatchStage::TopToSfdc),
            Err(MatchError::Cancelled { .. })
        ));
    }
}
