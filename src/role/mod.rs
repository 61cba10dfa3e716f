use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The controlling/controlled role of the local agent for one ICE session.
///
/// The role is negotiated per session, not per candidate, so every pair built
/// for the session holds a clone of the same handle and observes role changes
/// (e.g. after an ICE role conflict is resolved) as soon as they happen.
#[derive(Clone, Debug, Default)]
pub struct AgentRole {
    controlling: Arc<AtomicBool>,
}

impl AgentRole {
    pub fn new(controlling: bool) -> Self {
        Self {
            controlling: Arc::new(AtomicBool::new(controlling)),
        }
    }

    /// Reports whether the local agent currently holds the controlling role.
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    /// Flips the session role. Visible to every clone of this handle.
    pub fn set_controlling(&self, controlling: bool) {
        self.controlling.store(controlling, Ordering::SeqCst);
    }
}
