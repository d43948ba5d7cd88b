//! Cross-component maintenance scenarios.

use crate::mocks::{seed_game, session_for, RecordingProcessor};
use crate::store::Store;
use crate::tick::{run_tick, TickConfig};
use crate::{activity, readiness};
use gambit_types::{
    OrderFlag, OrderSet, UnixTime, UserId, UserKind, Vote, YearFlag, DAY_SECS, YEAR_SECS,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const NOW: UnixTime = 50 * YEAR_SECS;

fn days_ago(days: u64) -> UnixTime {
    NOW - days * DAY_SECS
}

fn completed_and_ready() -> OrderSet {
    let mut orders = OrderSet::only(OrderFlag::COMPLETED);
    orders.insert(OrderFlag::READY);
    orders
}

#[test]
fn full_tick_touches_every_component() {
    let mut store = Store::default();

    // A draw-bound game and an all-ready game.
    let (draw_game, draw_users) = seed_game(&mut store, 3, 0);
    let (ready_game, ready_users) = seed_game(&mut store, 2, 0);

    let mut txn = store.begin();
    for user in &draw_users {
        txn.members
            .get_mut(&(draw_game, *user))
            .expect("member")
            .votes
            .insert(Vote::Draw);
    }
    for user in &ready_users {
        txn.members.get_mut(&(ready_game, *user)).expect("member").orders = completed_and_ready();
    }

    // An idle session, a stale notice, an expiring phase and a fresh miss.
    let subject = draw_users[0];
    let mut session = session_for(subject);
    session.last_request = days_ago(1);
    session.hits = 3;
    txn.sessions.insert(subject, session);
    txn.add_notice(subject, false, days_ago(10), "stale notice");
    txn.record_turn_date(subject, days_ago(366));
    txn.record_turn_date(subject, days_ago(30));
    txn.record_missed_turn(subject, days_ago(2), false, false, false, false);
    txn.commit().expect("seed");

    let mut processor = RecordingProcessor::default();
    let report = run_tick(&mut store, &mut processor, &TickConfig::default(), NOW).expect("tick");

    assert_eq!(report.notices_swept, 1);
    assert_eq!(report.sessions_reaped, 1);
    assert_eq!(report.hits_flushed, 3);
    assert_eq!(report.phases_expired, 1);
    assert_eq!(report.users_rated, 1);
    assert_eq!(report.votes_resolved, 1);
    assert_eq!(report.games_advanced, 1);
    assert_eq!(report.votes_failed + report.advances_failed, 0);

    assert_eq!(processor.applied, vec![(draw_game, Vote::Draw)]);
    assert_eq!(processor.advanced, vec![ready_game]);
    assert!(store.tables().games[&draw_game].phase.is_finished());
}

#[test]
fn reliability_divides_by_post_expiry_count() {
    // The ordering guarantee: activity tracking commits before the rating
    // recalculation reads the yearly phase count.
    let mut store = Store::default();
    let mut txn = store.begin();
    let user = txn.add_user(UserKind::Human);
    txn.record_turn_date(user, days_ago(366)); // expires this tick
    txn.record_turn_date(user, days_ago(10));
    txn.record_missed_turn(user, days_ago(2), false, false, false, false);
    txn.commit().expect("seed");

    let mut processor = RecordingProcessor::default();
    run_tick(&mut store, &mut processor, &TickConfig::default(), NOW).expect("tick");

    // With the stale phase expired the divisor is 1, so one recent miss
    // wipes the whole ratio: 100 * max(0, (1 - 1/1) - 0.11) = 0. Had the
    // rating used the pre-expiry count of 2 it would have been 39.
    let rating = store.tables().users[&user].reliability_rating;
    assert!(rating.abs() < 1e-9, "rating {rating} used a stale divisor");
}

#[test]
fn vote_finished_game_does_not_also_advance() {
    let mut store = Store::default();
    let (game, users) = seed_game(&mut store, 2, 0);
    let mut txn = store.begin();
    for user in &users {
        let member = txn.members.get_mut(&(game, *user)).expect("member");
        member.votes.insert(Vote::Draw);
        member.orders = completed_and_ready();
    }
    txn.commit().expect("seed");

    let mut processor = RecordingProcessor::default();
    let report = run_tick(&mut store, &mut processor, &TickConfig::default(), NOW).expect("tick");

    assert_eq!(report.votes_resolved, 1);
    assert_eq!(report.games_advanced, 0);
    assert!(processor.advanced.is_empty());
}

#[test]
fn rejected_advance_is_isolated_and_retryable() {
    let mut store = Store::default();
    let (stuck, stuck_users) = seed_game(&mut store, 2, 0);
    let (fine, fine_users) = seed_game(&mut store, 2, 0);
    let mut txn = store.begin();
    for user in &stuck_users {
        txn.members.get_mut(&(stuck, *user)).expect("member").orders = completed_and_ready();
    }
    for user in &fine_users {
        txn.members.get_mut(&(fine, *user)).expect("member").orders = completed_and_ready();
    }
    txn.commit().expect("seed");

    let mut processor = RecordingProcessor::default();
    processor.fail_games.insert(stuck);
    let report = run_tick(&mut store, &mut processor, &TickConfig::default(), NOW).expect("tick");
    assert_eq!(report.games_advanced, 1);
    assert_eq!(report.advances_failed, 1);

    // The stuck game kept its order state and qualifies again next tick.
    assert_eq!(readiness::find_ready(store.tables()), vec![stuck]);

    processor.fail_games.clear();
    let report = run_tick(&mut store, &mut processor, &TickConfig::default(), NOW).expect("retry");
    assert_eq!(report.games_advanced, 1);
    assert_eq!(report.advances_failed, 0);

    // Both games advanced; their members owe new orders, so neither
    // qualifies again until flags come back.
    assert!(readiness::find_ready(store.tables()).is_empty());
}

#[test]
fn tick_aborts_cleanly_on_storage_failure() {
    let mut store = Store::default();
    let mut txn = store.begin();
    let user = txn.add_user(UserKind::Human);
    txn.add_notice(user, false, days_ago(30), "stale");
    txn.commit().expect("seed");

    store.fail_next_commit();
    let mut processor = RecordingProcessor::default();
    let err = run_tick(&mut store, &mut processor, &TickConfig::default(), NOW).unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(store.tables().notices.len(), 1);

    run_tick(&mut store, &mut processor, &TickConfig::default(), NOW).expect("retry");
    assert!(store.tables().notices.is_empty());
}

#[test]
fn repeated_incremental_updates_match_full_recompute() {
    let user_count = 10u64;
    let mut rng = StdRng::seed_from_u64(42);

    // A year and a half of phase completions, in time order (ids must stay
    // monotonic with event time for the boundary scan).
    let start = NOW - 550 * DAY_SECS;
    let mut events: Vec<(UserId, UnixTime)> = Vec::new();
    let mut t = start;
    while t < NOW {
        t += rng.gen_range(1..=6 * 60 * 60);
        events.push((UserId(rng.gen_range(1..=user_count)), t));
    }

    let mut incremental = Store::default();
    let mut full = Store::default();
    for store in [&mut incremental, &mut full] {
        let mut txn = store.begin();
        for _ in 0..user_count {
            txn.add_user(UserKind::Human);
        }
        txn.commit().expect("seed users");
    }

    // The incremental store sees a maintenance pass every 30 days while
    // events stream in; the reference store gets everything at once and a
    // single full recompute at the end.
    let mut inserted = 0usize;
    let mut checkpoint = start + 30 * DAY_SECS;
    while checkpoint <= NOW {
        let mut txn = incremental.begin();
        while inserted < events.len() && events[inserted].1 <= checkpoint {
            let (user, when) = events[inserted];
            txn.record_turn_date(user, when);
            inserted += 1;
        }
        txn.commit().expect("stream events");
        activity::incremental_update(&mut incremental, checkpoint).expect("incremental");
        checkpoint += 30 * DAY_SECS;
    }
    let mut txn = incremental.begin();
    for (user, when) in &events[inserted..] {
        txn.record_turn_date(*user, *when);
    }
    txn.commit().expect("stream tail");
    activity::incremental_update(&mut incremental, NOW).expect("final incremental");

    let mut txn = full.begin();
    for (user, when) in &events {
        txn.record_turn_date(*user, *when);
    }
    txn.commit().expect("bulk insert");
    activity::recalculate_all(&mut full, NOW).expect("full recompute");

    for id in 1..=user_count {
        let user = UserId(id);
        assert_eq!(
            incremental.tables().users[&user].yearly_phase_count,
            full.tables().users[&user].yearly_phase_count,
            "counts diverge for {user:?}"
        );
    }

    // And the flag invariant holds: the count is exactly the fresh events.
    for (id, user) in &incremental.tables().users {
        let fresh = incremental
            .tables()
            .turn_dates
            .values()
            .filter(|event| event.user == *id && event.flag == YearFlag::Fresh)
            .count();
        assert_eq!(user.yearly_phase_count as usize, fresh);
    }
}
