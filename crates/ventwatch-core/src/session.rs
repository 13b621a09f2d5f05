// ── Auth session tracking ──
//
// A single 401 can be a cold-start hiccup on the function app, so the
// session is only revoked after `threshold` consecutive rejected cycles,
// and only for API-key auth. Requests inside a cycle (one refresh, one
// command) only note their outcome; `settle()` turns the cycle into a
// single verdict. One accepted request clears the whole cycle.
// Revocation is sticky until `reset()`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use ventwatch_api::auth::AuthStrategy;

/// Result of settling a cycle that saw a 401 and no success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    /// Rejected, but below the threshold (or not an API-key session).
    Rejected { consecutive: u32 },
    /// This cycle crossed the threshold; the credential should be
    /// forgotten.
    Revoked { consecutive: u32 },
}

#[derive(Debug)]
pub struct Session {
    strategy: AuthStrategy,
    threshold: u32,
    consecutive: AtomicU32,
    revoked: AtomicBool,
    cycle_accepted: AtomicBool,
    cycle_rejected: AtomicBool,
}

impl Session {
    pub fn new(strategy: AuthStrategy, threshold: u32) -> Self {
        Self {
            strategy,
            threshold: threshold.max(1),
            consecutive: AtomicU32::new(0),
            revoked: AtomicBool::new(false),
            cycle_accepted: AtomicBool::new(false),
            cycle_rejected: AtomicBool::new(false),
        }
    }

    pub fn strategy(&self) -> AuthStrategy {
        self.strategy
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    /// Rejected cycles in a row.
    pub fn consecutive_rejections(&self) -> u32 {
        self.consecutive.load(Ordering::Acquire)
    }

    pub fn note_accepted(&self) {
        self.cycle_accepted.store(true, Ordering::Release);
    }

    pub fn note_unauthorized(&self) {
        self.cycle_rejected.store(true, Ordering::Release);
    }

    /// Close the current cycle. Returns a verdict only when the cycle saw
    /// a 401 and no accepted request.
    pub fn settle(&self) -> Option<AuthVerdict> {
        let accepted = self.cycle_accepted.swap(false, Ordering::AcqRel);
        let rejected = self.cycle_rejected.swap(false, Ordering::AcqRel);

        if accepted {
            self.consecutive.store(0, Ordering::Release);
            return None;
        }
        if !rejected {
            return None;
        }

        let consecutive = self.consecutive.fetch_add(1, Ordering::AcqRel) + 1;
        if self.strategy == AuthStrategy::ApiKey && consecutive >= self.threshold {
            self.revoked.store(true, Ordering::Release);
            Some(AuthVerdict::Revoked { consecutive })
        } else {
            Some(AuthVerdict::Rejected { consecutive })
        }
    }

    /// Start over, e.g. after the user supplied a new key.
    pub fn reset(&self) {
        self.consecutive.store(0, Ordering::Release);
        self.revoked.store(false, Ordering::Release);
        self.cycle_accepted.store(false, Ordering::Release);
        self.cycle_rejected.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_cycle(session: &Session, requests: usize) -> Option<AuthVerdict> {
        for _ in 0..requests {
            session.note_unauthorized();
        }
        session.settle()
    }

    #[test]
    fn many_rejections_in_one_cycle_count_once() {
        let session = Session::new(AuthStrategy::ApiKey, 2);
        assert_eq!(
            rejected_cycle(&session, 5),
            Some(AuthVerdict::Rejected { consecutive: 1 })
        );
        assert!(!session.is_revoked());
        assert_eq!(
            rejected_cycle(&session, 5),
            Some(AuthVerdict::Revoked { consecutive: 2 })
        );
        assert!(session.is_revoked());
    }

    #[test]
    fn one_accepted_request_clears_the_cycle() {
        let session = Session::new(AuthStrategy::ApiKey, 2);
        rejected_cycle(&session, 1);

        session.note_unauthorized();
        session.note_accepted();
        session.note_unauthorized();
        assert_eq!(session.settle(), None);
        assert_eq!(session.consecutive_rejections(), 0);
        assert!(!session.is_revoked());
    }

    #[test]
    fn quiet_cycle_changes_nothing() {
        let session = Session::new(AuthStrategy::ApiKey, 2);
        rejected_cycle(&session, 1);
        assert_eq!(session.settle(), None);
        assert_eq!(session.consecutive_rejections(), 1);
    }

    #[test]
    fn bearer_sessions_are_never_revoked() {
        let session = Session::new(AuthStrategy::Bearer, 2);
        for _ in 0..5 {
            rejected_cycle(&session, 3);
        }
        assert!(!session.is_revoked());
        assert_eq!(session.consecutive_rejections(), 5);
    }

    #[test]
    fn reset_clears_revocation() {
        let session = Session::new(AuthStrategy::ApiKey, 1);
        rejected_cycle(&session, 1);
        assert!(session.is_revoked());
        session.reset();
        assert!(!session.is_revoked());
        assert_eq!(session.consecutive_rejections(), 0);
    }
}
