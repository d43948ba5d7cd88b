//! Deterministic synthetic gameplay for standalone runs.
//!
//! The daemon has no real platform behind it yet, so between ticks it feeds
//! the store a stream of plausible events: session traffic, phase
//! completions, missed turns, votes, order submissions and notices. The
//! stream is a pure function of the configured seed, so two runs with the
//! same seed and tick times replay identically.

use crate::config::LoadConfig;
use gambit_engine::Store;
use gambit_types::{
    GameId, GamePhase, MessageId, OrderFlag, OrderSet, Session, StoreError, UnixTime, UserId,
    UserKind, VariantId, Vote, DAY_SECS,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

pub struct LoadGenerator {
    rng: StdRng,
    humans: Vec<UserId>,
    bots: Vec<UserId>,
    games: Vec<GameId>,
    forum_head: u64,
}

impl LoadGenerator {
    /// Seed the store with a populated platform: users with a year of phase
    /// history behind them, bots, seated games and live sessions.
    pub fn seed(config: &LoadConfig, store: &mut Store, now: UnixTime) -> Result<Self, StoreError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut txn = store.begin();

        let humans: Vec<UserId> = (0..config.users)
            .map(|_| txn.add_user(UserKind::Human))
            .collect();
        let bots: Vec<UserId> = (0..config.bots)
            .map(|_| txn.add_user(UserKind::Bot))
            .collect();

        // Backfill up to a year of phase completions per human, plus the
        // occasional miss, so the first activity and reliability passes have
        // something to chew on. Events go in oldest first to keep ids
        // monotonic with event time.
        let mut history: Vec<(UserId, UnixTime, bool)> = Vec::new();
        for user in &humans {
            for _ in 0..rng.gen_range(0..40) {
                let when = now.saturating_sub(rng.gen_range(0..400) * DAY_SECS);
                history.push((*user, when, rng.gen_bool(0.08)));
            }
        }
        history.sort_by_key(|(_, when, _)| *when);
        for (user, when, missed) in history {
            if missed {
                txn.record_missed_turn(user, when, rng.gen_bool(0.5), false, false, false);
            } else {
                txn.record_turn_date(user, when);
            }
        }

        let mut games = Vec::with_capacity(config.games);
        for _ in 0..config.games {
            games.push(Self::open_game(&mut txn, &mut rng, &humans, &bots));
        }

        for user in &humans {
            if rng.gen_bool(0.5) {
                txn.sessions.insert(*user, Self::session(&mut rng, *user, now));
            }
        }

        txn.commit()?;
        Ok(Self {
            rng,
            humans,
            bots,
            games,
            forum_head: 1,
        })
    }

    /// The newest message on the synthetic discussion board.
    pub fn forum_head(&self) -> Option<MessageId> {
        Some(MessageId(self.forum_head))
    }

    /// Generate one inter-tick slice of platform activity.
    pub fn step(&mut self, store: &mut Store, now: UnixTime) -> Result<(), StoreError> {
        let mut txn = store.begin();

        // Finished games drop out of rotation; a replacement opens so the
        // vote and readiness paths stay busy.
        self.games
            .retain(|game| txn.games.get(game).is_some_and(|game| !game.phase.is_finished()));
        while self.games.len() < 2 {
            self.games
                .push(Self::open_game(&mut txn, &mut self.rng, &self.humans, &self.bots));
        }

        for user in self.humans.clone() {
            if self.rng.gen_bool(0.4) {
                if !txn.sessions.contains_key(&user) {
                    let session = Self::session(&mut self.rng, user, now);
                    txn.sessions.insert(user, session);
                }
                if let Some(session) = txn.sessions.get_mut(&user) {
                    session.last_request = now;
                    session.hits += self.rng.gen_range(1..8);
                }
            }
            if self.rng.gen_bool(0.1) {
                txn.record_turn_date(user, now);
            }
            if self.rng.gen_bool(0.02) {
                let live_game = self.rng.gen_bool(0.5);
                txn.record_missed_turn(user, now, live_game, false, false, false);
            }
            if self.rng.gen_bool(0.05) {
                let keep = self.rng.gen_bool(0.2);
                txn.add_notice(user, keep, now, "your turn is due");
            }
        }

        // Bots keep their orders current; humans drift toward readiness and
        // occasionally agitate for a draw or pause.
        for game in self.games.clone() {
            let cast_vote = self.rng.gen_bool(0.1);
            let vote = match self.rng.gen_range(0..3) {
                0 => Vote::Draw,
                1 => Vote::Pause,
                _ => Vote::Cancel,
            };
            let members: Vec<UserId> = txn.members_of(game).map(|member| member.user).collect();
            for user in members {
                let submit = self.rng.gen_bool(0.35);
                let ready = self.rng.gen_bool(0.25);
                let member = match txn.members.get_mut(&(game, user)) {
                    Some(member) => member,
                    None => continue,
                };
                if submit {
                    member.orders = OrderSet::only(OrderFlag::COMPLETED);
                    if ready {
                        member.orders.insert(OrderFlag::READY);
                    }
                }
                if cast_vote && self.rng.gen_bool(0.6) {
                    member.votes.insert(vote);
                }
            }
        }

        self.forum_head += self.rng.gen_range(0..5);
        txn.commit()?;
        debug!(games = self.games.len(), forum_head = self.forum_head, "load step applied");
        Ok(())
    }

    fn open_game(
        tables: &mut gambit_engine::Tables,
        rng: &mut StdRng,
        humans: &[UserId],
        bots: &[UserId],
    ) -> GameId {
        let game = tables.add_game(VariantId(rng.gen_range(1..=3)), GamePhase::Diplomacy);
        if humans.is_empty() {
            return game;
        }
        let seats = rng.gen_range(3..=7).min(humans.len());
        let start = rng.gen_range(0..humans.len());
        for i in 0..seats {
            tables.add_member(game, humans[(start + i) % humans.len()]);
        }
        if !bots.is_empty() && rng.gen_bool(0.3) {
            tables.add_member(game, bots[rng.gen_range(0..bots.len())]);
        }
        game
    }

    fn session(rng: &mut StdRng, user: UserId, now: UnixTime) -> Session {
        Session {
            user,
            last_request: now,
            hits: 0,
            ip: format!("198.51.100.{}", rng.gen_range(1..255)),
            user_agent: "Mozilla/5.0 (synthetic)".into(),
            cookie_code: format!("c{:08x}", rng.gen::<u32>()),
            browser_fingerprint: format!("f{:08x}", rng.gen::<u32>()),
        }
    }
}
