use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::candidate::{Candidate, CandidateType};
use crate::error::*;
use crate::role::AgentRole;

/// Represent the ICE candidate pair state.
///
/// The agent sets all of the pairs in each check list to the Frozen state
/// when the list is computed, hence the default. `Succeeded` and `Failed`
/// are terminal; the pair itself never polices transitions, the scheduler
/// driving the checks does.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CandidatePairState {
    /// Means a check for this pair is withheld until a pair sharing its
    /// foundation succeeds.
    #[default]
    #[serde(rename = "frozen")]
    Frozen,

    /// Means a check has not been performed for this pair.
    #[serde(rename = "waiting")]
    Waiting,

    /// Means a check has been sent for this pair, but the transaction is in progress.
    #[serde(rename = "in-progress")]
    InProgress,

    /// Means a check for this pair was already done and produced a successful result.
    #[serde(rename = "succeeded")]
    Succeeded,

    /// Means a check for this pair was already done and failed, either never producing any response
    /// or producing an unrecoverable failure response.
    #[serde(rename = "failed")]
    Failed,
}

impl fmt::Display for CandidatePairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Frozen => "frozen",
            Self::Waiting => "waiting",
            Self::InProgress => "in-progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };

        write!(f, "{s}")
    }
}

/// Represents a combination of a local and remote candidate.
///
/// Connectivity in ICE is always verified by pairs: checks are sent from the
/// local candidate of a pair to the remote candidate of a pair. The pair is a
/// passive holder; the scheduler that runs the checks owns every state
/// transition.
pub struct CandidatePair {
    local: Arc<Candidate>,
    remote: Arc<Candidate>,
    /// Snapshot taken at construction with the role held at that time. A
    /// later role flip is visible through `controlling_candidate()` but is
    /// never re-priced here.
    priority: u64,
    state: CandidatePairState,
    role: AgentRole,
}

impl fmt::Debug for CandidatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prio {} state {} (local, prio {}) {} <-> {} (remote, prio {})",
            self.priority(),
            self.state(),
            self.local.priority(),
            self.local,
            self.remote,
            self.remote.priority(),
        )
    }
}

impl fmt::Display for CandidatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prio {} state {} (local, prio {}) {} <-> {} (remote, prio {})",
            self.priority(),
            self.state(),
            self.local.priority(),
            self.local,
            self.remote,
            self.remote.priority(),
        )
    }
}

impl PartialEq for CandidatePair {
    /// Pairs are the same pair iff they wrap the same two candidate
    /// instances, regardless of lifecycle progress. Two structurally equal
    /// candidates allocated separately do not make equal pairs.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.local, &other.local) && Arc::ptr_eq(&self.remote, &other.remote)
    }
}

impl CandidatePair {
    /// Creates a pair mapping `local` to `remote`.
    ///
    /// The pair priority is computed here, once, from both candidate
    /// priorities and the role currently held; it never changes afterwards.
    /// Candidates still carrying an unspecified type are incomplete and are
    /// rejected rather than priced.
    pub fn new(local: Arc<Candidate>, remote: Arc<Candidate>, role: AgentRole) -> Result<Self> {
        if local.candidate_type() == CandidateType::Unspecified
            || remote.candidate_type() == CandidateType::Unspecified
        {
            return Err(Error::ErrUnspecifiedCandidateType);
        }

        let priority = compute_priority(local.priority(), remote.priority(), role.is_controlling());

        Ok(Self {
            local,
            remote,
            priority,
            state: CandidatePairState::Frozen,
            role,
        })
    }

    /// Returns the pair priority computed at construction.
    pub fn priority(&self) -> u64 {
        self.priority
    }

    /// Returns the foundation of this pair: the local candidate's foundation
    /// concatenated with the remote candidate's. Only pairs with unique
    /// foundations are tested initially; when a check for one of them
    /// succeeds, the pairs sharing its foundation are unfrozen.
    pub fn foundation(&self) -> String {
        format!("{}{}", self.local.foundation(), self.remote.foundation())
    }

    /// Returns the local candidate of this pair.
    pub fn local(&self) -> Arc<Candidate> {
        Arc::clone(&self.local)
    }

    /// Returns the remote candidate of this pair.
    pub fn remote(&self) -> Arc<Candidate> {
        Arc::clone(&self.remote)
    }

    /// Re-points the local candidate. Reserved for check-list maintenance;
    /// the frozen priority is left untouched.
    pub(crate) fn set_local(&mut self, local: Arc<Candidate>) {
        self.local = local;
    }

    /// Re-points the remote candidate. Reserved for check-list maintenance;
    /// the frozen priority is left untouched.
    pub(crate) fn set_remote(&mut self, remote: Arc<Candidate>) {
        self.remote = remote;
    }

    /// Returns the state this pair is currently in.
    pub fn state(&self) -> CandidatePairState {
        self.state
    }

    /// Sets the pair state. Should only be called by the scheduler driving
    /// the ICE procedures; no transition is validated here.
    pub fn set_state(&mut self, state: CandidatePairState) {
        self.state = state;
    }

    /// Determines whether this pair is still frozen.
    pub fn is_frozen(&self) -> bool {
        self.state == CandidatePairState::Frozen
    }

    /// Returns the candidate in this pair that belongs to the controlling
    /// agent. The role is read live on every call and may have flipped since
    /// the pair priority was computed.
    pub fn controlling_candidate(&self) -> Arc<Candidate> {
        if self.role.is_controlling() {
            self.local()
        } else {
            self.remote()
        }
    }

    /// Returns the candidate in this pair that belongs to the controlled
    /// agent. Like `controlling_candidate`, resolved live, never cached.
    pub fn controlled_candidate(&self) -> Arc<Candidate> {
        if self.role.is_controlling() {
            self.remote()
        } else {
            self.local()
        }
    }

    /// Returns the component this pair belongs to.
    pub fn component(&self) -> u16 {
        self.local.component()
    }
}

/// RFC 5245 - 5.7.2.  Computing Pair Priority and Ordering Pairs
/// Let G be the priority for the candidate provided by the controlling
/// agent.  Let D be the priority for the candidate provided by the
/// controlled agent.
/// pair priority = 2^32*MIN(G,D) + 2*MAX(G,D) + (G>D?1:0)
fn compute_priority(local_priority: u32, remote_priority: u32, controlling: bool) -> u64 {
    let (g, d) = if controlling {
        (local_priority, remote_priority)
    } else {
        (remote_priority, local_priority)
    };

    (1 << 32_u64) * u64::from(std::cmp::min(g, d))
        + 2 * u64::from(std::cmp::max(g, d))
        + u64::from(g > d)
}

/// Orders pairs by decreasing pair priority, so that a sort puts the most
/// attractive pair first. Pairs with identical priority compare `Equal`; the
/// ordering amongst them is arbitrary, as the RFC allows.
pub fn by_priority(a: &CandidatePair, b: &CandidatePair) -> Ordering {
    b.priority().cmp(&a.priority())
}
