use uuid::Uuid;

use crate::domain::policies::{PolicyKind, WinReason, DECK_SIZE};
use crate::domain::powers::Power;
use crate::domain::roles::Team;
use crate::domain::state::{
    DisconnectOutcome, ElectionOutcome, GameState, Phase, VetoOutcome,
};
use crate::domain::test_state_helpers as fixtures;
use crate::domain::PlayerId;
use crate::errors::domain::RejectKind;

#[test]
fn lobby_rejects_duplicate_names_and_overflow() {
    let (mut state, _) = fixtures::lobby(10, 1);
    let err = state.add_player("player-3", None, false).unwrap_err();
    assert_eq!(err.kind, RejectKind::RoomFull);

    let (mut state, _) = fixtures::lobby(4, 1);
    let err = state.add_player("player-2", None, false).unwrap_err();
    assert_eq!(err.kind, RejectKind::DuplicateName);
    let err = state.add_player("   ", None, false).unwrap_err();
    assert_eq!(err.kind, RejectKind::InvalidName);
}

#[test]
fn first_human_becomes_host_and_hosting_migrates() {
    let mut state = GameState::with_seed("R".into(), "r".into(), 2);
    let bot = state.add_player("bot", None, true).unwrap();
    let alice = state.add_player("alice", None, false).unwrap();
    let bea = state.add_player("bea", None, false).unwrap();
    assert_eq!(state.host_id(), Some(alice));

    let (_, new_host) = state.remove_player(alice).unwrap();
    assert_eq!(new_host, Some(bea));
    assert_eq!(state.host_id(), Some(bea));
    assert!(state.player(bot).is_some());
}

#[test]
fn start_game_requires_host_and_player_count() {
    let (mut state, ids) = fixtures::lobby(5, 3);
    let err = state.start_game(ids[1]).unwrap_err();
    assert_eq!(err.kind, RejectKind::NotHost);

    let (mut state, ids) = fixtures::lobby(4, 3);
    let err = state.start_game(ids[0]).unwrap_err();
    assert_eq!(err.kind, RejectKind::PlayerCountOutOfRange);

    let (mut state, ids) = fixtures::lobby(5, 3);
    state.start_game(ids[0]).unwrap();
    assert_eq!(state.phase(), Phase::RoleReveal);
    assert!(state.started());
    assert!(state.current_president().is_some());
    assert!(state.players().iter().all(|p| p.role.is_some()));
    assert_eq!(state.deck_size(), DECK_SIZE);
}

#[test]
fn nomination_validates_caller_and_targets() {
    let (mut state, ids) = fixtures::started(5, 4);
    let president = state.current_president().map(|p| p.id).unwrap();
    let other = *ids.iter().find(|id| **id != president).unwrap();

    let err = state.nominate_cabinet_chief(other, president).unwrap_err();
    assert_eq!(err.kind, RejectKind::NotPresident);

    let err = state
        .nominate_cabinet_chief(president, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.kind, RejectKind::PlayerNotFound);

    state.nominate_cabinet_chief(president, other).unwrap();
    assert_eq!(state.phase(), Phase::Election);
    assert_eq!(state.nominated_cabinet_chief(), Some(other));
}

#[test]
fn term_limit_applies_only_above_five_alive() {
    let (mut state, _ids) = fixtures::started(6, 5);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.president_draw_cards(president).unwrap();
    state.president_discard_card(president, 0).unwrap();
    state.cabinet_chief_enact_policy(chief, 0).unwrap();

    // Six alive: the previous chief is barred.
    if state.phase() == Phase::Nomination {
        let president = state.current_president().map(|p| p.id).unwrap();
        if president != chief {
            let err = state.nominate_cabinet_chief(president, chief).unwrap_err();
            assert_eq!(err.kind, RejectKind::TermLimited);
        }
        // With one player dead the table drops to five and the bar lifts.
        let victim = state
            .players()
            .iter()
            .find(|p| p.id != president && p.id != chief && p.is_alive())
            .map(|p| p.id)
            .unwrap();
        state.test_kill_player(victim);
        assert_eq!(state.alive_count(), 5);
        if president != chief {
            state.nominate_cabinet_chief(president, chief).unwrap();
        }
    }
}

#[test]
fn majority_boundary_three_of_five_approves() {
    let (mut state, ids) = fixtures::started(5, 6);
    let president = state.current_president().map(|p| p.id).unwrap();
    let nominee = *ids.iter().find(|id| **id != president).unwrap();
    state.nominate_cabinet_chief(president, nominee).unwrap();

    for (i, id) in ids.iter().enumerate() {
        state.cast_vote(*id, i < 3).unwrap();
    }
    match state.count_votes().unwrap() {
        ElectionOutcome::Approved { ja, nein, .. } => {
            assert_eq!((ja, nein), (3, 2));
        }
        other => panic!("expected approval, got {other:?}"),
    }
    assert_eq!(state.phase(), Phase::LegislativePresident);
    assert_eq!(state.cabinet_chief(), Some(nominee));
    assert_eq!(state.failed_governments(), 0);
}

#[test]
fn two_of_five_fails_and_rotates_presidency() {
    let (mut state, ids) = fixtures::started(5, 7);
    let president = state.current_president().map(|p| p.id).unwrap();
    let nominee = *ids.iter().find(|id| **id != president).unwrap();
    state.nominate_cabinet_chief(president, nominee).unwrap();

    for (i, id) in ids.iter().enumerate() {
        state.cast_vote(*id, i < 2).unwrap();
    }
    match state.count_votes().unwrap() {
        ElectionOutcome::Rejected {
            failed_governments, ..
        } => assert_eq!(failed_governments, 1),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(state.phase(), Phase::Nomination);
    let next = state.current_president().map(|p| p.id).unwrap();
    assert_ne!(next, president);
    assert_eq!(state.cabinet_chief(), None);
}

#[test]
fn revote_overwrites_and_dead_players_cannot_vote() {
    let (mut state, ids) = fixtures::started(5, 8);
    let president = state.current_president().map(|p| p.id).unwrap();
    let nominee = *ids.iter().find(|id| **id != president).unwrap();
    state.nominate_cabinet_chief(president, nominee).unwrap();

    state.cast_vote(ids[0], false).unwrap();
    state.cast_vote(ids[0], true).unwrap();
    assert_eq!(state.votes()[&ids[0]], true);
    assert_eq!(state.votes().len(), 1);

    state.test_kill_player(ids[4]);
    let err = state.cast_vote(ids[4], true).unwrap_err();
    assert_eq!(err.kind, RejectKind::DeadPlayer);
}

#[test]
fn tally_waits_for_every_living_voter() {
    let (mut state, ids) = fixtures::started(5, 9);
    let president = state.current_president().map(|p| p.id).unwrap();
    let nominee = *ids.iter().find(|id| **id != president).unwrap();
    state.nominate_cabinet_chief(president, nominee).unwrap();
    state.cast_vote(ids[0], true).unwrap();
    let err = state.count_votes().unwrap_err();
    assert_eq!(err.kind, RejectKind::VotesPending);
}

#[test]
fn third_failed_election_triggers_chaos_once() {
    let (mut state, _) = fixtures::started(5, 10);

    for round in 1..=3u8 {
        let president = state.current_president().map(|p| p.id).unwrap();
        let nominee = fixtures::eligible_nominee(&state);
        state.nominate_cabinet_chief(president, nominee).unwrap();
        let voters: Vec<PlayerId> = state.players().iter().map(|p| p.id).collect();
        for v in voters {
            state.cast_vote(v, false).unwrap();
        }
        let outcome = state.count_votes().unwrap();
        if round < 3 {
            assert!(matches!(outcome, ElectionOutcome::Rejected { .. }));
            assert_eq!(state.failed_governments(), round);
        } else {
            let ElectionOutcome::Chaos { chaos, .. } = outcome else {
                panic!("third rejection must descend into chaos");
            };
            assert!(!chaos.game_over);
            assert_eq!(state.failed_governments(), 0);
            assert_eq!(
                state.reform_policies() + state.syndicate_policies(),
                1,
                "chaos enacts exactly one card"
            );
            assert_eq!(state.phase(), Phase::Nomination);
        }
    }
    assert_eq!(state.total_cards(), DECK_SIZE);
}

#[test]
fn chaos_keeps_the_term_limit_on_the_last_elected_chief() {
    let (mut state, _) = fixtures::started(6, 31);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.president_draw_cards(president).unwrap();
    state.president_discard_card(president, 0).unwrap();
    state.cabinet_chief_enact_policy(chief, 0).unwrap();
    if state.phase() != Phase::Nomination {
        return; // a power interrupted the round, covered elsewhere
    }
    assert_eq!(state.previous_cabinet_chief(), Some(chief));

    state.test_set_failed_governments(2);
    let president = state.current_president().map(|p| p.id).unwrap();
    let nominee = fixtures::eligible_nominee(&state);
    state.nominate_cabinet_chief(president, nominee).unwrap();
    let voters: Vec<PlayerId> = state.players().iter().map(|p| p.id).collect();
    for v in voters {
        state.cast_vote(v, false).unwrap();
    }
    let outcome = state.count_votes().unwrap();
    assert!(matches!(outcome, ElectionOutcome::Chaos { .. }));

    // No government formed during chaos, so the books don't change.
    assert_eq!(state.previous_cabinet_chief(), Some(chief));
    let president = state.current_president().map(|p| p.id).unwrap();
    if president != chief {
        let err = state.nominate_cabinet_chief(president, chief).unwrap_err();
        assert_eq!(err.kind, RejectKind::TermLimited);
    }
}

#[test]
fn legislative_session_draws_three_then_two() {
    let (mut state, _) = fixtures::started(5, 12);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();

    let cards = state.president_draw_cards(president).unwrap();
    assert_eq!(cards.len(), 3);
    assert_eq!(state.hand().len(), 3);
    let err = state.president_draw_cards(president).unwrap_err();
    assert_eq!(err.kind, RejectKind::BadRequest);

    let err = state.president_discard_card(president, 3).unwrap_err();
    assert_eq!(err.kind, RejectKind::CardIndexOutOfRange);

    state.president_discard_card(president, 1).unwrap();
    assert_eq!(state.phase(), Phase::LegislativeCabinet);
    assert_eq!(state.hand().len(), 2);
    assert_eq!(state.total_cards(), DECK_SIZE);
}

#[test]
fn enact_uses_the_selected_index_not_its_complement() {
    let (mut state, _) = fixtures::started(5, 13);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.president_draw_cards(president).unwrap();
    state.president_discard_card(president, 0).unwrap();

    state.test_set_hand(vec![
        fixtures::reform_card("X-REFORM"),
        fixtures::syndicate_card("X-SYN"),
    ]);
    let before_discard = state.discard_size();
    let outcome = state.cabinet_chief_enact_policy(chief, 0).unwrap();

    assert_eq!(outcome.enacted.kind, PolicyKind::Reform);
    assert_eq!(outcome.enacted.id, "X-REFORM");
    assert_eq!(state.reform_policies(), 1);
    assert_eq!(state.syndicate_policies(), 0);
    assert_eq!(state.discard_size(), before_discard + 1);
    assert!(state
        .test_discard()
        .iter()
        .any(|c| c.id == "X-SYN"));
}

#[test]
fn syndicate_enactment_unlocks_the_tracked_power() {
    let (mut state, _) = fixtures::started(5, 14);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.president_draw_cards(president).unwrap();
    state.president_discard_card(president, 0).unwrap();

    state.test_set_policies(0, 2);
    state.test_set_hand(vec![
        fixtures::syndicate_card("Y-SYN"),
        fixtures::reform_card("Y-REFORM"),
    ]);
    let outcome = state.cabinet_chief_enact_policy(chief, 0).unwrap();
    assert_eq!(outcome.power, Some(Power::Peek));
    assert_eq!(state.phase(), Phase::ExecutivePower);
    assert_eq!(state.current_power(), Some(Power::Peek));
}

#[test]
fn reform_enactment_never_fires_a_power() {
    let (mut state, _) = fixtures::started(9, 15);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.president_draw_cards(president).unwrap();
    state.president_discard_card(president, 0).unwrap();

    state.test_set_hand(vec![
        fixtures::reform_card("Z-REFORM"),
        fixtures::syndicate_card("Z-SYN"),
    ]);
    let outcome = state.cabinet_chief_enact_policy(chief, 0).unwrap();
    assert_eq!(outcome.power, None);
    assert_eq!(state.phase(), Phase::Nomination);
}

#[test]
fn track_completion_ends_the_game() {
    let (mut state, _) = fixtures::started(5, 16);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.president_draw_cards(president).unwrap();
    state.president_discard_card(president, 0).unwrap();

    state.test_set_policies(4, 0);
    state.test_set_hand(vec![
        fixtures::reform_card("W-REFORM"),
        fixtures::syndicate_card("W-SYN"),
    ]);
    let outcome = state.cabinet_chief_enact_policy(chief, 0).unwrap();
    assert!(outcome.game_over);
    assert_eq!(state.phase(), Phase::GameOver);
    assert_eq!(state.winner(), Some(Team::Reformers));
    assert_eq!(state.win_reason(), Some(WinReason::ReformTrack));
}

#[test]
fn kingpin_elected_late_ends_the_game() {
    let (mut state, _) = fixtures::started(5, 17);
    state.test_set_policies(0, 3);
    let kingpin = state
        .players()
        .iter()
        .find(|p| p.role.is_some_and(|r| r.is_kingpin()))
        .map(|p| p.id)
        .unwrap();

    // Make sure the kingpin is not the sitting president.
    let seat = state
        .players()
        .iter()
        .position(|p| p.id != kingpin)
        .unwrap();
    state.test_set_president_index(seat);
    let president = state.current_president().map(|p| p.id).unwrap();

    state.nominate_cabinet_chief(president, kingpin).unwrap();
    let voters: Vec<PlayerId> = state.players().iter().map(|p| p.id).collect();
    for v in voters {
        state.cast_vote(v, true).unwrap();
    }
    match state.count_votes().unwrap() {
        ElectionOutcome::Approved { instant_win, .. } => assert!(instant_win),
        other => panic!("expected approval, got {other:?}"),
    }
    assert!(state.game_over());
    assert_eq!(state.winner(), Some(Team::Syndicate));
    assert_eq!(state.win_reason(), Some(WinReason::KingpinElected));
}

#[test]
fn executing_the_kingpin_wins_for_reformers() {
    let (mut state, _) = fixtures::started(7, 18);
    let kingpin = state
        .players()
        .iter()
        .find(|p| p.role.is_some_and(|r| r.is_kingpin()))
        .map(|p| p.id)
        .unwrap();
    let seat = state
        .players()
        .iter()
        .position(|p| p.id != kingpin)
        .unwrap();
    state.test_set_president_index(seat);
    let president = state.current_president().map(|p| p.id).unwrap();

    state.test_set_phase(Phase::ExecutivePower);
    state.test_set_power(Some(Power::Execution));
    let outcome = state.execute_execution(president, kingpin).unwrap();
    assert!(outcome.was_kingpin);
    assert!(outcome.game_over);
    assert_eq!(state.winner(), Some(Team::Reformers));
    assert_eq!(state.win_reason(), Some(WinReason::KingpinExecuted));
    assert!(state.player(kingpin).unwrap().is_dead);
}

#[test]
fn execution_of_a_regular_continues_play() {
    let (mut state, ids) = fixtures::started(7, 19);
    let president = state.current_president().map(|p| p.id).unwrap();
    let target = *ids
        .iter()
        .find(|id| {
            **id != president
                && state
                    .player(**id)
                    .and_then(|p| p.role)
                    .is_some_and(|r| !r.is_kingpin())
        })
        .unwrap();

    state.test_set_phase(Phase::ExecutivePower);
    state.test_set_power(Some(Power::Execution));
    let outcome = state.execute_execution(president, target).unwrap();
    assert!(!outcome.game_over);
    assert_eq!(state.phase(), Phase::Nomination);
    assert_eq!(state.alive_count(), 6);
}

#[test]
fn investigation_records_knowledge_on_the_investigator() {
    let (mut state, ids) = fixtures::started(7, 20);
    let president = state.current_president().map(|p| p.id).unwrap();
    let target = *ids.iter().find(|id| **id != president).unwrap();

    state.test_set_phase(Phase::ExecutivePower);
    state.test_set_power(Some(Power::Investigate));
    let outcome = state.execute_investigate(president, target).unwrap();
    assert_eq!(outcome.target, target);
    assert!(state.player(target).unwrap().was_investigated);
    assert!(state
        .player(president)
        .unwrap()
        .known_teams
        .contains(&target));
    assert_eq!(state.phase(), Phase::Nomination);
}

#[test]
fn peek_reveals_three_cards_without_moving_them() {
    let (mut state, _) = fixtures::started(5, 21);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.test_set_phase(Phase::ExecutivePower);
    state.test_set_power(Some(Power::Peek));
    let before = state.deck_size();
    let outcome = state.execute_peek(president).unwrap();
    assert_eq!(outcome.cards.len(), 3);
    assert_eq!(state.deck_size(), before);
    let top: Vec<&str> = state
        .test_deck()
        .iter()
        .take(3)
        .map(|c| c.id.as_str())
        .collect();
    let seen: Vec<&str> = outcome.cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(seen, top);
}

#[test]
fn special_election_overrides_the_next_presidency_once() {
    let (mut state, ids) = fixtures::started(7, 22);
    let president = state.current_president().map(|p| p.id).unwrap();
    let target = *ids.iter().find(|id| **id != president).unwrap();

    state.test_set_phase(Phase::ExecutivePower);
    state.test_set_power(Some(Power::SpecialElection));
    let outcome = state.execute_special_election(president, target).unwrap();
    assert_eq!(outcome.next_president, target);
    assert_eq!(state.current_president().map(|p| p.id), Some(target));
    assert_eq!(state.phase(), Phase::Nomination);

    // The following rotation reverts to table order.
    let target_seat = state.players().iter().position(|p| p.id == target).unwrap();
    let expected_next = state.players()
        [(target_seat + 1) % state.players().len()]
    .id;
    let nominee = fixtures::eligible_nominee(&state);
    state.nominate_cabinet_chief(target, nominee).unwrap();
    let voters: Vec<PlayerId> = state.players().iter().map(|p| p.id).collect();
    for v in voters {
        state.cast_vote(v, false).unwrap();
    }
    state.count_votes().unwrap();
    assert_eq!(state.current_president().map(|p| p.id), Some(expected_next));
}

#[test]
fn veto_flow_request_refuse_then_enact() {
    let (mut state, _) = fixtures::started(5, 23);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.president_draw_cards(president).unwrap();

    // Locked until five syndicate policies.
    state.president_discard_card(president, 0).unwrap();
    let err = state.request_veto(chief).unwrap_err();
    assert_eq!(err.kind, RejectKind::VetoLocked);

    state.test_set_veto_unlocked(true);
    state.request_veto(chief).unwrap();
    assert_eq!(state.phase(), Phase::VetoDecision);

    let outcome = state.respond_to_veto(president, false).unwrap();
    assert!(matches!(outcome, VetoOutcome::Refused));
    assert_eq!(state.phase(), Phase::LegislativeCabinet);
    assert_eq!(state.hand().len(), 2);

    // No second ask this round.
    let err = state.request_veto(chief).unwrap_err();
    assert_eq!(err.kind, RejectKind::VetoLocked);

    state.cabinet_chief_enact_policy(chief, 1).unwrap();
    assert_eq!(state.total_cards(), DECK_SIZE);
}

#[test]
fn accepted_veto_discards_both_and_counts_as_failure() {
    let (mut state, _) = fixtures::started(5, 24);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.president_draw_cards(president).unwrap();
    state.president_discard_card(president, 0).unwrap();
    state.test_set_veto_unlocked(true);
    state.request_veto(chief).unwrap();

    let outcome = state.respond_to_veto(president, true).unwrap();
    match outcome {
        VetoOutcome::Accepted {
            failed_governments,
            chaos,
        } => {
            assert_eq!(failed_governments, 1);
            assert!(chaos.is_none());
        }
        other => panic!("expected acceptance, got {other:?}"),
    }
    assert!(state.hand().is_empty());
    assert_eq!(state.phase(), Phase::Nomination);
    assert_eq!(state.total_cards(), DECK_SIZE);
}

#[test]
fn accepted_veto_at_two_failures_triggers_chaos() {
    let (mut state, _) = fixtures::started(5, 25);
    let chief = fixtures::eligible_nominee(&state);
    fixtures::elect(&mut state, chief);
    let president = state.current_president().map(|p| p.id).unwrap();
    state.president_draw_cards(president).unwrap();
    state.president_discard_card(president, 0).unwrap();
    state.test_set_veto_unlocked(true);
    state.test_set_failed_governments(2);
    state.request_veto(chief).unwrap();

    let outcome = state.respond_to_veto(president, true).unwrap();
    let VetoOutcome::Accepted { chaos: Some(_), .. } = outcome else {
        panic!("expected chaos, got {outcome:?}");
    };
    assert_eq!(state.failed_governments(), 0);
    assert_eq!(state.total_cards(), DECK_SIZE);
}

#[test]
fn presidency_skips_dead_players_and_wraps() {
    let (mut state, ids) = fixtures::started(5, 26);
    // Kill everyone but two, then force rotation between the survivors.
    let survivors = [ids[1], ids[3]];
    for id in &ids {
        if !survivors.contains(id) {
            state.test_kill_player(*id);
        }
    }
    state.test_set_president_index(1);

    for _ in 0..4 {
        let president = state.current_president().map(|p| p.id).unwrap();
        assert!(survivors.contains(&president));
        let other = *survivors.iter().find(|id| **id != president).unwrap();
        state.nominate_cabinet_chief(president, other).unwrap();
        state.cast_vote(survivors[0], false).unwrap();
        state.cast_vote(survivors[1], false).unwrap();
        state.count_votes().unwrap();
        if state.game_over() {
            return;
        }
        let next = state.current_president().map(|p| p.id).unwrap();
        assert_ne!(next, president, "rotation must move between survivors");
    }
}

#[test]
fn disconnect_before_start_removes_after_start_unbinds() {
    let mut state = GameState::with_seed("R".into(), "r".into(), 27);
    let conn = Uuid::new_v4();
    let alice = state.add_player("alice", Some(conn), false).unwrap();
    for i in 0..4 {
        state.add_player(&format!("bot-{i}"), None, true).unwrap();
    }

    match state.handle_disconnect(conn) {
        DisconnectOutcome::Removed { player, .. } => assert_eq!(player.id, alice),
        other => panic!("expected removal, got {other:?}"),
    }
    assert!(state.player(alice).is_none());

    let conn2 = Uuid::new_v4();
    let bea = state.add_player("bea", Some(conn2), false).unwrap();
    state.start_game(bea).unwrap();
    match state.handle_disconnect(conn2) {
        DisconnectOutcome::Unbound { player_id } => assert_eq!(player_id, bea),
        other => panic!("expected unbind, got {other:?}"),
    }
    assert!(state.player(bea).is_some());
    assert!(state.player(bea).unwrap().conn_id.is_none());
}

#[test]
fn rejoin_mid_election_preserves_tally_and_allows_voting() {
    let mut state = GameState::with_seed("R".into(), "r".into(), 28);
    let conn = Uuid::new_v4();
    let alice = state.add_player("alice", Some(conn), false).unwrap();
    let mut bots = Vec::new();
    for i in 0..4 {
        bots.push(state.add_player(&format!("bot-{i}"), None, true).unwrap());
    }
    state.start_game(alice).unwrap();
    state.begin_nomination().unwrap();

    let president = state.current_president().map(|p| p.id).unwrap();
    let nominee = state
        .players()
        .iter()
        .find(|p| p.id != president)
        .map(|p| p.id)
        .unwrap();
    state.nominate_cabinet_chief(president, nominee).unwrap();
    state.cast_vote(bots[0], true).unwrap();
    state.cast_vote(bots[1], false).unwrap();

    state.handle_disconnect(conn);
    let conn2 = Uuid::new_v4();
    state.bind_connection(alice, conn2).unwrap();

    assert_eq!(state.phase(), Phase::Election);
    assert_eq!(state.votes().len(), 2);
    state.cast_vote(alice, true).unwrap();
    assert_eq!(state.votes().len(), 3);
}

#[test]
fn conservation_holds_across_many_rounds() {
    let (mut state, _) = fixtures::started(5, 29);
    for _ in 0..8 {
        if state.game_over() {
            break;
        }
        if state.phase() != Phase::Nomination {
            break;
        }
        let chief = fixtures::eligible_nominee(&state);
        fixtures::elect(&mut state, chief);
        let president = state.current_president().map(|p| p.id).unwrap();
        state.president_draw_cards(president).unwrap();
        assert_eq!(state.total_cards(), DECK_SIZE);
        state.president_discard_card(president, 0).unwrap();
        assert_eq!(state.total_cards(), DECK_SIZE);
        state.cabinet_chief_enact_policy(chief, 0).unwrap();
        assert_eq!(state.total_cards(), DECK_SIZE);
        if state.phase() == Phase::ExecutivePower {
            break; // power handling covered in dedicated tests
        }
    }
}
