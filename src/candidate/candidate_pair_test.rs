use std::cmp::Ordering;
use std::sync::Arc;

use super::*;
use crate::candidate::candidate_host::CandidateHostConfig;
use crate::candidate::candidate_pair::*;
use crate::candidate::candidate_peer_reflexive::CandidatePeerReflexiveConfig;
use crate::candidate::candidate_relay::CandidateRelayConfig;
use crate::candidate::candidate_server_reflexive::CandidateServerReflexiveConfig;
use crate::error::*;
use crate::role::AgentRole;

pub(crate) fn host_candidate() -> Result<Candidate> {
    CandidateHostConfig {
        base_config: CandidateConfig {
            address: "0.0.0.0".to_owned(),
            component: COMPONENT_RTP,
            ..Default::default()
        },
    }
    .new_candidate_host()
}

pub(crate) fn prflx_candidate() -> Result<Candidate> {
    CandidatePeerReflexiveConfig {
        base_config: CandidateConfig {
            address: "0.0.0.0".to_owned(),
            component: COMPONENT_RTP,
            ..Default::default()
        },
        ..Default::default()
    }
    .new_candidate_peer_reflexive()
}

pub(crate) fn srflx_candidate() -> Result<Candidate> {
    CandidateServerReflexiveConfig {
        base_config: CandidateConfig {
            address: "0.0.0.0".to_owned(),
            component: COMPONENT_RTP,
            ..Default::default()
        },
        ..Default::default()
    }
    .new_candidate_server_reflexive()
}

pub(crate) fn relay_candidate() -> Result<Candidate> {
    CandidateRelayConfig {
        base_config: CandidateConfig {
            address: "0.0.0.0".to_owned(),
            component: COMPONENT_RTP,
            ..Default::default()
        },
        ..Default::default()
    }
    .new_candidate_relay()
}

fn priority_candidate(priority: u32) -> Result<Candidate> {
    CandidateHostConfig {
        base_config: CandidateConfig {
            address: "0.0.0.0".to_owned(),
            component: COMPONENT_RTP,
            priority,
            ..Default::default()
        },
    }
    .new_candidate_host()
}

fn foundation_candidate(foundation: &str) -> Result<Candidate> {
    CandidateHostConfig {
        base_config: CandidateConfig {
            address: "0.0.0.0".to_owned(),
            component: COMPONENT_RTP,
            foundation: foundation.to_owned(),
            ..Default::default()
        },
    }
    .new_candidate_host()
}

#[test]
fn test_candidate_pair_priority() -> Result<()> {
    let tests = vec![
        (
            CandidatePair::new(
                Arc::new(host_candidate()?),
                Arc::new(host_candidate()?),
                AgentRole::new(false),
            )?,
            9151314442783293438,
        ),
        (
            CandidatePair::new(
                Arc::new(host_candidate()?),
                Arc::new(host_candidate()?),
                AgentRole::new(true),
            )?,
            9151314442783293438,
        ),
        (
            CandidatePair::new(
                Arc::new(host_candidate()?),
                Arc::new(prflx_candidate()?),
                AgentRole::new(true),
            )?,
            7998392938176446463,
        ),
        (
            CandidatePair::new(
                Arc::new(host_candidate()?),
                Arc::new(prflx_candidate()?),
                AgentRole::new(false),
            )?,
            7998392938176446462,
        ),
        (
            CandidatePair::new(
                Arc::new(host_candidate()?),
                Arc::new(srflx_candidate()?),
                AgentRole::new(true),
            )?,
            7277816997797167103,
        ),
        (
            CandidatePair::new(
                Arc::new(host_candidate()?),
                Arc::new(srflx_candidate()?),
                AgentRole::new(false),
            )?,
            7277816997797167102,
        ),
        (
            CandidatePair::new(
                Arc::new(host_candidate()?),
                Arc::new(relay_candidate()?),
                AgentRole::new(true),
            )?,
            72057594004373503,
        ),
        (
            CandidatePair::new(
                Arc::new(host_candidate()?),
                Arc::new(relay_candidate()?),
                AgentRole::new(false),
            )?,
            72057594004373502,
        ),
    ];

    for (pair, want) in tests {
        let got = pair.priority();
        assert_eq!(
            got, want,
            "CandidatePair({pair}).priority() = {got}, want {want}"
        );
    }

    Ok(())
}

#[test]
fn test_candidate_pair_priority_role_sensitivity() -> Result<()> {
    // G=100 on the controlling side, D=50: the tie bit is set.
    let pair = CandidatePair::new(
        Arc::new(priority_candidate(100)?),
        Arc::new(priority_candidate(50)?),
        AgentRole::new(true),
    )?;
    assert_eq!(pair.priority(), 214748365001);

    // Same raw values with the controlling side holding 50: tie bit clear.
    let pair = CandidatePair::new(
        Arc::new(priority_candidate(50)?),
        Arc::new(priority_candidate(100)?),
        AgentRole::new(true),
    )?;
    assert_eq!(pair.priority(), 214748365000);

    // Both agents compute the identical value for the same pair: swapping
    // which side is local swaps the role flag with it.
    let ours = CandidatePair::new(
        Arc::new(priority_candidate(100)?),
        Arc::new(priority_candidate(50)?),
        AgentRole::new(true),
    )?;
    let theirs = CandidatePair::new(
        Arc::new(priority_candidate(50)?),
        Arc::new(priority_candidate(100)?),
        AgentRole::new(false),
    )?;
    assert_eq!(ours.priority(), theirs.priority());

    Ok(())
}

#[test]
fn test_candidate_pair_priority_uniqueness() -> Result<()> {
    // Distinct (min, max, tie) triples give distinct priorities; the local
    // side is controlling throughout, so G is the local priority.
    let gd = vec![(100, 50), (50, 100), (101, 50), (100, 51)];

    let mut priorities = vec![];
    for (g, d) in gd {
        let pair = CandidatePair::new(
            Arc::new(priority_candidate(g)?),
            Arc::new(priority_candidate(d)?),
            AgentRole::new(true),
        )?;
        priorities.push(pair.priority());
    }

    for i in 0..priorities.len() {
        for j in i + 1..priorities.len() {
            assert_ne!(
                priorities[i], priorities[j],
                "priorities[{i}] collided with priorities[{j}]"
            );
        }
    }

    Ok(())
}

#[test]
fn test_candidate_pair_equality() -> Result<()> {
    let local = Arc::new(host_candidate()?);
    let remote = Arc::new(srflx_candidate()?);

    let pair_a = CandidatePair::new(Arc::clone(&local), Arc::clone(&remote), AgentRole::new(true))?;
    let mut pair_b =
        CandidatePair::new(Arc::clone(&local), Arc::clone(&remote), AgentRole::new(false))?;

    assert_eq!(pair_a, pair_b, "Expected {pair_a} to equal {pair_b}");

    // Lifecycle progress never changes pair identity.
    pair_b.set_state(CandidatePairState::Succeeded);
    assert_eq!(pair_a, pair_b, "Expected {pair_a} to equal {pair_b}");

    // Structurally identical candidates allocated separately are different
    // instances, so the pairs differ.
    let pair_c = CandidatePair::new(
        Arc::new(host_candidate()?),
        Arc::clone(&remote),
        AgentRole::new(true),
    )?;
    assert_ne!(pair_a, pair_c, "Expected {pair_a} to differ from {pair_c}");

    Ok(())
}

#[test]
fn test_candidate_pair_foundation() -> Result<()> {
    let h1 = Arc::new(foundation_candidate("H1")?);
    let r9 = Arc::new(foundation_candidate("R9")?);

    let pair = CandidatePair::new(Arc::clone(&h1), Arc::clone(&r9), AgentRole::new(true))?;
    assert_eq!(pair.foundation(), "H1R9");

    let swapped = CandidatePair::new(r9, h1, AgentRole::new(true))?;
    assert_eq!(swapped.foundation(), "R9H1");
    assert_ne!(pair.foundation(), swapped.foundation());

    Ok(())
}

#[test]
fn test_candidate_pair_state() -> Result<()> {
    let mut pair = CandidatePair::new(
        Arc::new(host_candidate()?),
        Arc::new(host_candidate()?),
        AgentRole::new(true),
    )?;

    assert_eq!(pair.state(), CandidatePairState::Frozen);
    assert!(pair.is_frozen());

    pair.set_state(CandidatePairState::Waiting);
    assert_eq!(pair.state(), CandidatePairState::Waiting);
    assert!(!pair.is_frozen());

    pair.set_state(CandidatePairState::InProgress);
    assert_eq!(pair.state(), CandidatePairState::InProgress);

    pair.set_state(CandidatePairState::Succeeded);
    assert!(!pair.is_frozen());

    Ok(())
}

#[test]
fn test_candidate_pair_ordering() -> Result<()> {
    let pair = |local: u32, remote: u32, controlling: bool| -> Result<CandidatePair> {
        CandidatePair::new(
            Arc::new(priority_candidate(local)?),
            Arc::new(priority_candidate(remote)?),
            AgentRole::new(controlling),
        )
    };

    let mut pairs = vec![
        pair(1, 2, true)?,
        pair(100, 50, true)?,
        pair(500, 500, true)?,
        pair(100, 50, false)?,
    ];

    pairs.sort_by(by_priority);

    let got: Vec<u64> = pairs.iter().map(|p| p.priority()).collect();
    assert_eq!(
        got,
        vec![2147483649000, 214748365001, 214748365000, 4294967300]
    );
    for w in got.windows(2) {
        assert!(w[0] >= w[1], "not descending: {got:?}");
    }

    // Mirrored pairs carry identical priorities and compare as equals; their
    // relative order is left to the sort.
    let ours = pair(100, 50, true)?;
    let theirs = pair(50, 100, false)?;
    assert_eq!(by_priority(&ours, &theirs), Ordering::Equal);

    Ok(())
}

#[test]
fn test_candidate_pair_role_resolution() -> Result<()> {
    let local = Arc::new(host_candidate()?);
    let remote = Arc::new(srflx_candidate()?);
    let role = AgentRole::new(true);

    let pair = CandidatePair::new(Arc::clone(&local), Arc::clone(&remote), role.clone())?;

    assert!(Arc::ptr_eq(&pair.controlling_candidate(), &local));
    assert!(Arc::ptr_eq(&pair.controlled_candidate(), &remote));

    let frozen_priority = pair.priority();

    // Conflict resolution flipped the session role after construction.
    role.set_controlling(false);

    assert!(Arc::ptr_eq(&pair.controlling_candidate(), &remote));
    assert!(Arc::ptr_eq(&pair.controlled_candidate(), &local));

    // The pair keeps the priority computed under the old role.
    assert_eq!(pair.priority(), frozen_priority);

    Ok(())
}

#[test]
fn test_candidate_pair_unspecified_candidate() -> Result<()> {
    let result = CandidatePair::new(
        Arc::new(Candidate::default()),
        Arc::new(host_candidate()?),
        AgentRole::new(true),
    );
    assert_eq!(result.err(), Some(Error::ErrUnspecifiedCandidateType));

    let result = CandidatePair::new(
        Arc::new(host_candidate()?),
        Arc::new(Candidate::default()),
        AgentRole::new(true),
    );
    assert_eq!(result.err(), Some(Error::ErrUnspecifiedCandidateType));

    Ok(())
}

#[test]
fn test_candidate_pair_state_serialization() -> Result<()> {
    let tests = vec![
        (CandidatePairState::Frozen, "\"frozen\""),
        (CandidatePairState::Waiting, "\"waiting\""),
        (CandidatePairState::InProgress, "\"in-progress\""),
        (CandidatePairState::Succeeded, "\"succeeded\""),
        (CandidatePairState::Failed, "\"failed\""),
    ];

    for (state, want) in tests {
        let got = serde_json::to_string(&state).expect("serialize state");
        assert_eq!(got, want, "{state} serialized to {got}, want {want}");
    }

    Ok(())
}

#[test]
fn test_candidate_pair_display() -> Result<()> {
    let pair = CandidatePair::new(
        Arc::new(host_candidate()?),
        Arc::new(relay_candidate()?),
        AgentRole::new(true),
    )?;

    let s = pair.to_string();
    assert!(s.contains("state frozen"), "unexpected rendering: {s}");
    assert!(
        s.contains(&format!("prio {}", pair.priority())),
        "unexpected rendering: {s}"
    );

    Ok(())
}

#[test]
fn test_candidate_pair_component() -> Result<()> {
    let pair = CandidatePair::new(
        Arc::new(host_candidate()?),
        Arc::new(host_candidate()?),
        AgentRole::new(true),
    )?;
    assert_eq!(pair.component(), COMPONENT_RTP);

    Ok(())
}
