use crate::domain::powers::{power_for_track, Power};
use crate::domain::test_state_helpers as fixtures;
use crate::errors::domain::RejectKind;

#[test]
fn small_table_track() {
    for n in [5, 6] {
        assert_eq!(power_for_track(1, n), None);
        assert_eq!(power_for_track(2, n), None);
        assert_eq!(power_for_track(3, n), Some(Power::Peek));
        assert_eq!(power_for_track(4, n), Some(Power::Execution));
        assert_eq!(power_for_track(5, n), Some(Power::Execution));
    }
}

#[test]
fn mid_table_track() {
    for n in [7, 8] {
        assert_eq!(power_for_track(1, n), None);
        assert_eq!(power_for_track(2, n), Some(Power::Investigate));
        assert_eq!(power_for_track(3, n), Some(Power::SpecialElection));
        assert_eq!(power_for_track(4, n), Some(Power::Execution));
        assert_eq!(power_for_track(5, n), Some(Power::Execution));
    }
}

#[test]
fn large_table_track() {
    for n in [9, 10] {
        assert_eq!(power_for_track(1, n), Some(Power::Investigate));
        assert_eq!(power_for_track(2, n), Some(Power::Investigate));
        assert_eq!(power_for_track(3, n), Some(Power::SpecialElection));
        assert_eq!(power_for_track(4, n), Some(Power::Execution));
        assert_eq!(power_for_track(5, n), Some(Power::Execution));
    }
}

#[test]
fn zero_and_overflow_counts_unlock_nothing() {
    assert_eq!(power_for_track(0, 5), None);
    assert_eq!(power_for_track(6, 10), None);
}

#[test]
fn investigate_rejects_dead_and_repeat_targets() {
    let (mut state, ids) = fixtures::started(7, 11);
    let president = state.current_president().map(|p| p.id).unwrap();
    let target = *ids.iter().find(|id| **id != president).unwrap();

    state.test_set_phase(crate::domain::state::Phase::ExecutivePower);
    state.test_set_power(Some(Power::Investigate));
    state.execute_investigate(president, target).unwrap();

    // Same target cannot be investigated twice. The first investigation
    // rotated the presidency, so restore the original seat first.
    let seat = state
        .players()
        .iter()
        .position(|p| p.id == president)
        .unwrap();
    state.test_set_president_index(seat);
    state.test_set_phase(crate::domain::state::Phase::ExecutivePower);
    state.test_set_power(Some(Power::Investigate));
    let err = state.execute_investigate(president, target).unwrap_err();
    assert_eq!(err.kind, RejectKind::AlreadyInvestigated);

    let dead = *ids
        .iter()
        .find(|id| **id != president && **id != target)
        .unwrap();
    state.test_kill_player(dead);
    let err = state.execute_investigate(president, dead).unwrap_err();
    assert_eq!(err.kind, RejectKind::DeadPlayer);
}

#[test]
fn special_election_rejects_self_target() {
    let (mut state, _ids) = fixtures::started(7, 12);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.test_set_phase(crate::domain::state::Phase::ExecutivePower);
    state.test_set_power(Some(Power::SpecialElection));
    let err = state.execute_special_election(president, president).unwrap_err();
    assert_eq!(err.kind, RejectKind::SelfTarget);
}

#[test]
fn power_must_match_the_unlocked_one() {
    let (mut state, ids) = fixtures::started(5, 13);
    let president = state.current_president().map(|p| p.id).unwrap();
    let target = *ids.iter().find(|id| **id != president).unwrap();
    state.test_set_phase(crate::domain::state::Phase::ExecutivePower);
    state.test_set_power(Some(Power::Peek));
    let err = state.execute_execution(president, target).unwrap_err();
    assert_eq!(err.kind, RejectKind::BadRequest);
}
