//! Authorization resolver.
//!
//! Local mode decides on the spot by comparing the scanned UID with the
//! reference UID. Remote mode defers: the UID is sent to the host and
//! remembered as the single [`PendingRequest`] until a decision line arrives.

use tokio::time::Instant;
use tollgate_core::{CanonicalUid, Outcome};
use tracing::{debug, warn};

use crate::config::AuthMode;

/// The UID most recently sent to the host, awaiting its decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub uid: CanonicalUid,
    pub sent_at: Instant,
}

impl PendingRequest {
    pub fn new(uid: CanonicalUid, sent_at: Instant) -> Self {
        Self { uid, sent_at }
    }
}

/// Result of resolving a freshly scanned card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Decided immediately.
    Decided(Outcome),

    /// Forward this UID to the host; the decision arrives later.
    Deferred(CanonicalUid),
}

/// Authorization resolver, fixed to one mode for its lifetime.
#[derive(Debug)]
pub enum Resolver {
    Local { reference: CanonicalUid },
    Remote { pending: Option<PendingRequest> },
}

impl Resolver {
    pub fn new(mode: &AuthMode) -> Self {
        match mode {
            AuthMode::Local { reference } => Resolver::Local {
                reference: reference.clone(),
            },
            AuthMode::Remote => Resolver::Remote { pending: None },
        }
    }

    /// Resolve a scanned card.
    ///
    /// Local comparison is constant-time. Remote never decides here; the
    /// caller sends the returned UID and then calls [`mark_sent`](Self::mark_sent).
    pub fn resolve(&self, uid: &CanonicalUid) -> Resolution {
        match self {
            Resolver::Local { reference } => {
                let outcome = Outcome::from_match(reference == uid);
                debug!(uid = %uid, outcome = %outcome, "Resolved against reference UID");
                Resolution::Decided(outcome)
            }
            Resolver::Remote { .. } => Resolution::Deferred(uid.clone()),
        }
    }

    /// Record that `uid` was sent to the host, replacing any older request.
    ///
    /// Returns the replaced request. Has no effect in Local mode.
    pub fn mark_sent(&mut self, uid: CanonicalUid, now: Instant) -> Option<PendingRequest> {
        match self {
            Resolver::Local { .. } => None,
            Resolver::Remote { pending } => {
                let replaced = pending.replace(PendingRequest::new(uid, now));
                if let Some(old) = &replaced {
                    warn!(
                        uid = %old.uid,
                        waited_ms = now.duration_since(old.sent_at).as_millis() as u64,
                        "Pending request replaced before the host replied"
                    );
                }
                replaced
            }
        }
    }

    /// Take the pending request a host decision applies to.
    pub fn take_pending(&mut self) -> Option<PendingRequest> {
        match self {
            Resolver::Local { .. } => None,
            Resolver::Remote { pending } => pending.take(),
        }
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        match self {
            Resolver::Local { .. } => None,
            Resolver::Remote { pending } => pending.as_ref(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Resolver::Remote { .. })
    }
}
