use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

use serde_json::Value;
use uuid::Uuid;

use crate::room::Player;
use crate::websocket::{LeaderboardEntry, ServerMessage};
use crate::words;

/// Maximum number of players allowed in a room
pub const MAX_PLAYERS: usize = 10;

/// Points awarded for a first-time correct guess.
pub const GUESSER_POINTS: u32 = 5;

/// Points the drawer earns for every distinct correct guesser.
pub const DRAWER_POINTS: u32 = 3;

/// Classification of one chat line against the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The drawer talking; never compared against the word.
    Narration,
    /// Plain chat or a wrong guess; relayed verbatim.
    Chat,
    /// A correct guess that was already rewarded this round.
    Repeat,
    /// First correct guess by this player this round.
    Correct { round_over: bool },
}

/// State of one game room. Owned by the registry behind a per-room lock;
/// every mutation happens through these methods while that lock is held.
#[derive(Debug)]
pub struct Room {
    word: String,
    password: Option<String>,
    players: BTreeMap<Uuid, Player>,
    scores: BTreeMap<Uuid, u32>,
    drawer: Option<Uuid>,
    timer: u32,
    timer_gen: u64,
    guessed: HashSet<Uuid>,
    history: Vec<Value>,
}

impl Room {
    pub fn new(password: Option<String>) -> Self {
        Self {
            word: words::random_word().to_string(),
            password,
            players: BTreeMap::new(),
            scores: BTreeMap::new(),
            drawer: None,
            timer: 0,
            timer_gen: 0,
            guessed: HashSet::new(),
            history: Vec::new(),
        }
    }

    // --- membership ---

    /// Add a player, initializing their score on first join.
    /// Returns false when the room is at capacity.
    pub fn add_player(&mut self, id: Uuid, player: Player) -> bool {
        if self.is_full() {
            return false;
        }
        self.players.insert(id, player);
        self.scores.entry(id).or_insert(0);
        true
    }

    /// Remove a player together with their score and guess record.
    /// The drawer slot is left untouched; callers rotate the round when the
    /// departing player was drawing.
    pub fn remove_player(&mut self, id: &Uuid) -> Option<Player> {
        self.scores.remove(id);
        self.guessed.remove(id);
        self.players.remove(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn nickname(&self, id: &Uuid) -> Option<&str> {
        self.players.get(id).map(|p| p.nickname())
    }

    pub fn password_matches(&self, supplied: Option<&str>) -> bool {
        match &self.password {
            None => true,
            Some(password) => supplied == Some(password.as_str()),
        }
    }

    pub fn locked(&self) -> bool {
        self.password.is_some()
    }

    // --- round state ---

    pub fn word(&self) -> &str {
        &self.word
    }

    /// Word length in letters, not bytes.
    pub fn word_len(&self) -> usize {
        self.word.chars().count()
    }

    pub fn drawer(&self) -> Option<Uuid> {
        self.drawer
    }

    pub fn set_drawer(&mut self, id: Uuid) {
        self.drawer = Some(id);
    }

    pub fn clear_drawer(&mut self) {
        self.drawer = None;
    }

    /// Reset per-round state for a fresh word. Scores persist.
    pub fn begin_round(&mut self, word: String) {
        self.word = word;
        self.history.clear();
        self.guessed.clear();
    }

    /// Round-robin successor of the current drawer in stable id order,
    /// wrapping past the last player. With no previous drawer the first
    /// player is chosen. Also correct when the previous drawer already left:
    /// the next id in order takes the turn.
    pub fn next_drawer(&self) -> Option<Uuid> {
        match self.drawer {
            Some(current) => self
                .players
                .range((Bound::Excluded(current), Bound::Unbounded))
                .next()
                .map(|(id, _)| *id)
                .or_else(|| self.players.keys().next().copied()),
            None => self.players.keys().next().copied(),
        }
    }

    // --- countdown ---

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn timer_gen(&self) -> u64 {
        self.timer_gen
    }

    /// Invalidate the running countdown task, if any. The task compares its
    /// generation against this counter on every tick and exits on mismatch.
    pub fn cancel_timer(&mut self) {
        self.timer_gen = self.timer_gen.wrapping_add(1);
    }

    /// Cancel any previous countdown and arm a new one. Returns the
    /// generation the new countdown task must hold.
    pub fn arm_timer(&mut self, seconds: u32) -> u64 {
        self.cancel_timer();
        self.timer = seconds;
        self.timer_gen
    }

    /// One second elapsed; returns the remaining time.
    pub fn tick(&mut self) -> u32 {
        self.timer = self.timer.saturating_sub(1);
        self.timer
    }

    // --- guessing ---

    /// Classify a chat line. A first-time correct guess also applies its
    /// scoring side effects: the guesser earns their bonus and is recorded
    /// for the round, while the drawer earns one bonus per distinct guesser.
    pub fn evaluate_guess(&mut self, sender: Uuid, text: &str) -> GuessOutcome {
        let Some(drawer) = self.drawer else {
            // no active round, nothing to guess
            return GuessOutcome::Chat;
        };
        if drawer == sender {
            return GuessOutcome::Narration;
        }
        if text.trim().to_lowercase() != self.word.to_lowercase() {
            return GuessOutcome::Chat;
        }
        if self.guessed.contains(&sender) {
            return GuessOutcome::Repeat;
        }

        self.guessed.insert(sender);
        *self.scores.entry(sender).or_insert(0) += GUESSER_POINTS;
        *self.scores.entry(drawer).or_insert(0) += DRAWER_POINTS;

        GuessOutcome::Correct {
            round_over: self.guessed.len() >= self.player_count().saturating_sub(1),
        }
    }

    pub fn guessed_count(&self) -> usize {
        self.guessed.len()
    }

    pub fn score(&self, id: &Uuid) -> u32 {
        self.scores.get(id).copied().unwrap_or(0)
    }

    /// Scores of all present players, highest first.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .iter()
            .map(|(id, player)| LeaderboardEntry {
                nickname: player.nickname().to_string(),
                score: self.score(id),
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    // --- drawing history ---

    pub fn history(&self) -> &[Value] {
        &self.history
    }

    pub fn push_stroke(&mut self, stroke: Value) {
        self.history.push(stroke);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // --- fan-out ---

    pub fn player_ids(&self) -> Vec<Uuid> {
        self.players.keys().copied().collect()
    }

    /// Send a message to every player in the room.
    pub fn broadcast(&self, message: &ServerMessage) {
        for player in self.players.values() {
            let _ = player.send(message);
        }
    }

    /// Send a message to every player except one (draw relays skip the
    /// drawer who produced the stroke).
    pub fn broadcast_except(&self, except: &Uuid, message: &ServerMessage) {
        for (id, player) in self.players.iter() {
            if id != except {
                let _ = player.send(message);
            }
        }
    }

    /// Send a message to a single player.
    pub fn send_to(&self, id: &Uuid, message: &ServerMessage) {
        if let Some(player) = self.players.get(id) {
            let _ = player.send(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Message;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn player(nickname: &str) -> (Player, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Player::new(nickname.to_string(), tx), rx)
    }

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_new_room_has_word() {
        let room = Room::new(None);
        assert!(!room.word().is_empty());
        assert_eq!(room.player_count(), 0);
        assert!(room.drawer().is_none());
    }

    #[test]
    fn test_add_remove_player_tracks_scores() {
        let mut room = Room::new(None);
        let (alice, _rx) = player("alice");

        assert!(room.add_player(id(1), alice));
        assert_eq!(room.player_count(), 1);
        assert_eq!(room.score(&id(1)), 0);

        room.remove_player(&id(1));
        assert_eq!(room.player_count(), 0);
        assert_eq!(room.score(&id(1)), 0);
    }

    #[test]
    fn test_room_capacity() {
        let mut room = Room::new(None);
        for n in 0..MAX_PLAYERS {
            let (p, _rx) = player(&format!("p{}", n));
            assert!(room.add_player(id(n as u128), p));
        }
        let (extra, _rx) = player("extra");
        assert!(!room.add_player(id(99), extra));
        assert_eq!(room.player_count(), MAX_PLAYERS);
    }

    #[test]
    fn test_password_matching() {
        let open = Room::new(None);
        assert!(open.password_matches(None));
        assert!(open.password_matches(Some("anything")));
        assert!(!open.locked());

        let locked = Room::new(Some("hunter2".to_string()));
        assert!(locked.locked());
        assert!(locked.password_matches(Some("hunter2")));
        assert!(!locked.password_matches(Some("wrong")));
        assert!(!locked.password_matches(None));
    }

    #[test]
    fn test_first_drawer_is_first_in_stable_order() {
        let mut room = Room::new(None);
        for n in [3u128, 1, 2] {
            let (p, _rx) = player(&format!("p{}", n));
            room.add_player(id(n), p);
        }
        assert_eq!(room.next_drawer(), Some(id(1)));
    }

    #[test]
    fn test_drawer_rotation_is_round_robin() {
        let mut room = Room::new(None);
        for n in 1..=3u128 {
            let (p, _rx) = player(&format!("p{}", n));
            room.add_player(id(n), p);
        }

        room.set_drawer(id(2));
        assert_eq!(room.next_drawer(), Some(id(3)));

        room.set_drawer(id(3));
        assert_eq!(room.next_drawer(), Some(id(1)));
    }

    #[test]
    fn test_rotation_skips_departed_drawer() {
        let mut room = Room::new(None);
        for n in 1..=3u128 {
            let (p, _rx) = player(&format!("p{}", n));
            room.add_player(id(n), p);
        }
        room.set_drawer(id(2));
        room.remove_player(&id(2));

        assert_eq!(room.next_drawer(), Some(id(3)));
    }

    #[test]
    fn test_begin_round_resets_round_state_but_not_scores() {
        let mut room = Room::new(None);
        for n in 1..=2u128 {
            let (p, _rx) = player(&format!("p{}", n));
            room.add_player(id(n), p);
        }
        room.set_drawer(id(1));
        room.begin_round("ev".to_string());
        room.push_stroke(serde_json::json!({"x": 1}));
        assert_eq!(room.evaluate_guess(id(2), "ev"), GuessOutcome::Correct { round_over: true });

        room.begin_round("masa".to_string());
        assert!(room.history().is_empty());
        assert_eq!(room.guessed_count(), 0);
        // scores persist across rounds
        assert_eq!(room.score(&id(2)), GUESSER_POINTS);
        assert_eq!(room.score(&id(1)), DRAWER_POINTS);
    }

    #[test]
    fn test_guess_classification_order() {
        let mut room = Room::new(None);
        for n in 1..=3u128 {
            let (p, _rx) = player(&format!("p{}", n));
            room.add_player(id(n), p);
        }
        room.set_drawer(id(1));
        room.begin_round("ev".to_string());

        // drawer narration is never compared against the word
        assert_eq!(room.evaluate_guess(id(1), "ev"), GuessOutcome::Narration);
        assert_eq!(room.score(&id(1)), 0);

        // wrong guess is plain chat
        assert_eq!(room.evaluate_guess(id(2), "kedi"), GuessOutcome::Chat);

        // case-insensitive, trimmed match
        assert_eq!(
            room.evaluate_guess(id(2), "  Ev "),
            GuessOutcome::Correct { round_over: false }
        );
        assert_eq!(room.score(&id(2)), GUESSER_POINTS);
        assert_eq!(room.score(&id(1)), DRAWER_POINTS);

        // repeat guess is not rewarded again
        assert_eq!(room.evaluate_guess(id(2), "ev"), GuessOutcome::Repeat);
        assert_eq!(room.score(&id(2)), GUESSER_POINTS);

        // last non-drawer guessing ends the round
        assert_eq!(
            room.evaluate_guess(id(3), "EV"),
            GuessOutcome::Correct { round_over: true }
        );
        // drawer earned one bonus per distinct guesser
        assert_eq!(room.score(&id(1)), 2 * DRAWER_POINTS);
    }

    #[test]
    fn test_guessed_never_exceeds_non_drawer_count() {
        let mut room = Room::new(None);
        for n in 1..=3u128 {
            let (p, _rx) = player(&format!("p{}", n));
            room.add_player(id(n), p);
        }
        room.set_drawer(id(1));
        room.begin_round("ev".to_string());

        for sender in [id(2), id(3), id(2), id(3)] {
            room.evaluate_guess(sender, "ev");
            assert!(room.guessed_count() <= room.player_count() - 1);
        }
    }

    #[test]
    fn test_no_scoring_without_active_round() {
        let mut room = Room::new(None);
        let (p, _rx) = player("alice");
        room.add_player(id(1), p);
        room.begin_round("ev".to_string());

        assert_eq!(room.evaluate_guess(id(1), "ev"), GuessOutcome::Chat);
        assert_eq!(room.score(&id(1)), 0);
    }

    #[test]
    fn test_leaderboard_sorted_descending() {
        let mut room = Room::new(None);
        for n in 1..=3u128 {
            let (p, _rx) = player(&format!("p{}", n));
            room.add_player(id(n), p);
        }
        room.set_drawer(id(1));
        room.begin_round("ev".to_string());
        room.evaluate_guess(id(3), "ev");

        let board = room.leaderboard();
        assert_eq!(board[0].nickname, "p3");
        assert_eq!(board[0].score, GUESSER_POINTS);
        assert_eq!(board[1].nickname, "p1");
        assert_eq!(board[1].score, DRAWER_POINTS);
        assert_eq!(board[2].score, 0);
    }

    #[test]
    fn test_timer_generation_cancellation() {
        let mut room = Room::new(None);
        let gen = room.arm_timer(60);
        assert_eq!(room.timer(), 60);
        assert_eq!(room.timer_gen(), gen);

        assert_eq!(room.tick(), 59);

        room.cancel_timer();
        assert_ne!(room.timer_gen(), gen);
    }

    #[test]
    fn test_broadcast_except_skips_sender() {
        let mut room = Room::new(None);
        let (alice, mut alice_rx) = player("alice");
        let (bob, mut bob_rx) = player("bob");
        room.add_player(id(1), alice);
        room.add_player(id(2), bob);

        room.broadcast_except(&id(1), &ServerMessage::ClearCanvas);

        assert!(alice_rx.try_recv().is_err());
        assert!(bob_rx.try_recv().is_ok());
    }

    #[test]
    fn test_send_to_reaches_single_player() {
        let mut room = Room::new(None);
        let (alice, mut alice_rx) = player("alice");
        let (bob, mut bob_rx) = player("bob");
        room.add_player(id(1), alice);
        room.add_player(id(2), bob);

        room.send_to(&id(2), &ServerMessage::ClearCanvas);

        assert!(alice_rx.try_recv().is_err());
        assert!(bob_rx.try_recv().is_ok());
    }
}
