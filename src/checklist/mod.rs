
use std::collections::HashSet;
use std::sync::Arc;

use crate::candidate::candidate_pair::{CandidatePair, CandidatePairState, by_priority};
use crate::candidate::{Candidate, CandidateType};
use crate::error::*;
use crate::role::AgentRole;

/// The ordered set of candidate pairs an agent actually tests.
///
/// The check list owns the pairs for one session and keeps them sorted in
/// decreasing pair priority. It applies the freeze/unfreeze bookkeeping of
/// RFC 5245 5.7.4; deciding *when* to dispatch a check, and running the STUN
/// transaction itself, stays with the caller. Every state scan here runs
/// under one `&mut self` borrow, so a success report cannot race the sibling
/// unfreeze it triggers.
pub struct CheckList {
    role: AgentRole,
    local_candidates: Vec<Arc<Candidate>>,
    remote_candidates: Vec<Arc<Candidate>>,
    pairs: Vec<CandidatePair>,
}

impl CheckList {
    /// Creates an empty check list for a session holding the given role.
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            local_candidates: vec![],
            remote_candidates: vec![],
            pairs: vec![],
        }
    }

    /// Adds a new local candidate and pairs it with every known remote
    /// candidate of the same component. Duplicates are ignored.
    pub fn add_local_candidate(&mut self, c: Arc<Candidate>) -> Result<()> {
        for cand in &self.local_candidates {
            if cand.equal(&c) {
                return Ok(());
            }
        }

        self.local_candidates.push(Arc::clone(&c));

        let remotes = self.remote_candidates.clone();
        for remote in remotes {
            if remote.component() == c.component() {
                self.add_pair(Arc::clone(&c), remote)?;
            }
        }

        Ok(())
    }

    /// Adds a new remote candidate and pairs it with every known local
    /// candidate of the same component. Duplicates are ignored.
    pub fn add_remote_candidate(&mut self, c: Arc<Candidate>) -> Result<()> {
        for cand in &self.remote_candidates {
            if cand.equal(&c) {
                return Ok(());
            }
        }

        self.remote_candidates.push(Arc::clone(&c));

        let locals = self.local_candidates.clone();
        for local in locals {
            if local.component() == c.component() {
                self.add_pair(local, Arc::clone(&c))?;
            }
        }

        Ok(())
    }

    fn add_pair(&mut self, local: Arc<Candidate>, remote: Arc<Candidate>) -> Result<()> {
        let pair = CandidatePair::new(local, remote, self.role.clone())?;
        log::debug!("added pair: {pair}");

        self.pairs.push(pair);
        self.pairs.sort_by(by_priority);

        Ok(())
    }

    /// Returns the pairs, sorted in decreasing pair priority.
    pub fn pairs(&self) -> &[CandidatePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Finds the index of the pair wrapping these two transport endpoints.
    pub fn find_pair(&self, local: &Candidate, remote: &Candidate) -> Option<usize> {
        self.pairs
            .iter()
            .position(|p| p.local().equal(local) && p.remote().equal(remote))
    }

    /// Computes the initial pair states: for every foundation the
    /// best-priority pair moves from frozen to waiting, the rest of the
    /// group stays frozen until a sibling succeeds.
    pub fn unfreeze(&mut self) {
        let mut seen = HashSet::new();

        for pair in &mut self.pairs {
            if !seen.insert(pair.foundation()) {
                continue;
            }
            if pair.is_frozen() {
                log::trace!("unfreezing pair: {pair}");
                pair.set_state(CandidatePairState::Waiting);
            }
        }
    }

    /// Sets the state of the pair at `index`. Transition legality is the
    /// scheduler's concern, not checked here.
    pub fn set_pair_state(&mut self, index: usize, state: CandidatePairState) -> Result<()> {
        let pair = self
            .pairs
            .get_mut(index)
            .ok_or(Error::ErrUnknownCandidatePair)?;

        log::trace!("pair {pair} -> {state}");
        pair.set_state(state);

        Ok(())
    }

    /// Records a successful check for the pair at `index` and unfreezes
    /// every frozen pair sharing its foundation.
    pub fn report_success(&mut self, index: usize) -> Result<()> {
        let pair = self
            .pairs
            .get_mut(index)
            .ok_or(Error::ErrUnknownCandidatePair)?;

        pair.set_state(CandidatePairState::Succeeded);
        let foundation = pair.foundation();
        log::debug!("pair succeeded: {pair}");

        for (i, pair) in self.pairs.iter_mut().enumerate() {
            if i != index && pair.is_frozen() && pair.foundation() == foundation {
                log::trace!("unfreezing sibling pair: {pair}");
                pair.set_state(CandidatePairState::Waiting);
            }
        }

        Ok(())
    }

    /// Records a definitively failed check for the pair at `index`.
    pub fn report_failure(&mut self, index: usize) -> Result<()> {
        let pair = self
            .pairs
            .get_mut(index)
            .ok_or(Error::ErrUnknownCandidatePair)?;

        pair.set_state(CandidatePairState::Failed);
        log::debug!("pair failed: {pair}");

        Ok(())
    }

    /// Returns the best-priority pair that has already succeeded, if any.
    pub fn best_succeeded_pair(&self) -> Option<&CandidatePair> {
        self.pairs
            .iter()
            .find(|p| p.state() == CandidatePairState::Succeeded)
    }

    /// Re-points pairs holding a peer reflexive candidate at the candidate
    /// later gathered or signaled for the same transport address, on either
    /// side of the pair. Pair priorities stay as computed at construction.
    pub fn promote_peer_reflexive(&mut self, resolved: Arc<Candidate>) {
        for cand in self
            .local_candidates
            .iter_mut()
            .chain(self.remote_candidates.iter_mut())
        {
            if supersedes(&resolved, cand) {
                *cand = Arc::clone(&resolved);
            }
        }

        for pair in &mut self.pairs {
            if supersedes(&resolved, &pair.local()) {
                log::debug!("promoting peer reflexive local of pair: {pair}");
                pair.set_local(Arc::clone(&resolved));
            }
            if supersedes(&resolved, &pair.remote()) {
                log::debug!("promoting peer reflexive remote of pair: {pair}");
                pair.set_remote(Arc::clone(&resolved));
            }
        }
    }
}

fn supersedes(resolved: &Candidate, prflx: &Candidate) -> bool {
    prflx.candidate_type() == CandidateType::PeerReflexive
        && prflx.address() == resolved.address()
        && prflx.port() == resolved.port()
}
