//! Session orchestration and scheduled effects.

use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    deck::{build_deck, Card, FaceKey},
    outcome::{self, Outcome},
    score::{PlayerProfile, ScoreRecord, ScoreStore},
    session::engine::{MatchEngine, RevealOutcome},
    timer::TimerService,
    video::{ClockVideo, VideoCue},
};

/// Lifecycle of one play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Deck dealt, waiting for the player to start.
    Idle,
    /// Cards are live and the clip is racing.
    Started,
    /// The grid was cleared; outcome and score are being settled.
    Resolving,
    /// Session finished and classified.
    Over,
}

/// Errors raised by session transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `start` was requested outside of `Idle`.
    #[error("session already started")]
    AlreadyStarted,
    /// A deck can only be dealt while the session is idle.
    #[error("deck can only be dealt while idle")]
    NotIdle,
}

/// Delayed effects the controller may owe the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskKind {
    HidePreview,
    ResolveMismatch,
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTask {
    kind: TaskKind,
    due: Instant,
}

/// One card as the interface should draw it.
#[derive(Debug, Clone)]
pub struct CardView {
    /// Slot id used for reveal requests.
    pub id: usize,
    /// Face symbol.
    pub face: FaceKey,
    /// Whether the face is visible right now.
    pub face_up: bool,
    /// Whether the card belongs to a matched pair.
    pub matched: bool,
}

/// Immutable view of the session for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Cards in grid order.
    pub cards: Vec<CardView>,
    /// Elapsed play time as of the last tick.
    pub elapsed: Duration,
    /// Current lifecycle phase.
    pub phase: SessionPhase,
    /// Classified result, present once the session is over.
    pub outcome: Option<Outcome>,
    /// Whether the clip finished before the player.
    pub ai_finished_first: bool,
    /// Playhead reading of the opponent clip.
    pub video: VideoCue,
}

/// Owner of the session state machine.
///
/// All delayed effects live here as named, deadline-based tasks fired
/// from [`SessionController::tick_at`] and cancelled wholesale on
/// [`SessionController::reset`], so no stale effect can touch a later
/// session.
pub struct SessionController {
    engine: MatchEngine,
    timer: TimerService,
    video: ClockVideo,
    store: ScoreStore,
    profile: PlayerProfile,
    faces: Vec<String>,
    video_duration_secs: f64,
    preview: Duration,
    mismatch_delay: Duration,
    phase: SessionPhase,
    ai_finished_first: bool,
    outcome: Option<Outcome>,
    tasks: Vec<ScheduledTask>,
}

impl SessionController {
    /// Build a controller with a freshly shuffled deck.
    pub fn new(config: &AppConfig, store: ScoreStore, profile: PlayerProfile) -> Self {
        let faces = config.faces();
        let engine = MatchEngine::new(build_deck(&faces));
        Self {
            engine,
            timer: TimerService::new(),
            video: ClockVideo::new(config.video_duration_secs),
            store,
            profile,
            faces,
            video_duration_secs: config.video_duration_secs,
            preview: config.preview(),
            mismatch_delay: config.mismatch_delay(),
            phase: SessionPhase::Idle,
            ai_finished_first: false,
            outcome: None,
            tasks: Vec::new(),
        }
    }

    /// Replace the idle deck with a prebuilt one.
    pub fn deal(&mut self, cards: Vec<Card>) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::NotIdle);
        }
        self.engine.reset(cards);
        Ok(())
    }

    /// Start the session now.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.start_at(Instant::now())
    }

    /// Start the session as of the given instant.
    ///
    /// The whole deck is revealed for the preview window and hidden by
    /// the scheduled task. An empty deck finishes immediately.
    pub fn start_at(&mut self, now: Instant) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        self.phase = SessionPhase::Started;
        self.ai_finished_first = false;
        self.outcome = None;
        self.engine.start();
        self.timer.start_at(now);
        self.video.rewind();
        self.video.play_at(now);
        self.engine.show_all();
        self.schedule(TaskKind::HidePreview, now + self.preview);
        if self.engine.is_complete() {
            self.finish_at(now);
        }
        Ok(())
    }

    /// Request a card reveal now.
    pub fn reveal(&mut self, id: usize) -> RevealOutcome {
        self.reveal_at(id, Instant::now())
    }

    /// Request a card reveal as of the given instant.
    pub fn reveal_at(&mut self, id: usize, now: Instant) -> RevealOutcome {
        if self.phase != SessionPhase::Started {
            return RevealOutcome::Rejected;
        }
        let result = self.engine.reveal(id);
        match result {
            RevealOutcome::Mismatched(first, second) => {
                debug!("Mismatch between cards {first} and {second}");
                self.schedule(TaskKind::ResolveMismatch, now + self.mismatch_delay);
            }
            RevealOutcome::Matched { complete: true } => {
                self.finish_at(now);
            }
            _ => {}
        }
        result
    }

    /// Record that the opponent clip reached its end.
    ///
    /// Only meaningful while playing; the flag latches once.
    pub fn video_ended(&mut self) {
        if self.phase == SessionPhase::Started && !self.ai_finished_first {
            self.ai_finished_first = true;
            debug!("Opponent clip finished before the player");
        }
    }

    /// Advance the session clock now.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Advance the session clock to the given instant.
    ///
    /// Fires every scheduled task whose deadline has passed, in
    /// deadline order, and polls the clip for its ended edge.
    pub fn tick_at(&mut self, now: Instant) {
        self.timer.tick_at(now);

        let mut due = Vec::new();
        self.tasks.retain(|task| {
            if task.due <= now {
                due.push(*task);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|task| task.due);
        for task in due {
            self.fire(task.kind);
        }

        if self.phase == SessionPhase::Started && self.video.has_ended_at(now) {
            self.video_ended();
        }
    }

    /// Abandon the current session and deal a fresh shuffled deck.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.timer.reset();
        self.video = ClockVideo::new(self.video_duration_secs);
        self.engine.reset(build_deck(&self.faces));
        self.phase = SessionPhase::Idle;
        self.ai_finished_first = false;
        self.outcome = None;
    }

    /// Render-ready view of the session now.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_at(Instant::now())
    }

    /// Render-ready view of the session as of the given instant.
    pub fn snapshot_at(&self, now: Instant) -> SessionSnapshot {
        let cards = self
            .engine
            .cards()
            .iter()
            .map(|card| CardView {
                id: card.id,
                face: card.face.clone(),
                face_up: card.flipped,
                matched: self.engine.is_matched(card.id),
            })
            .collect();
        SessionSnapshot {
            cards,
            elapsed: self.timer.elapsed(),
            phase: self.phase,
            outcome: self.outcome,
            ai_finished_first: self.ai_finished_first,
            video: self.video.cue_at(now),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Classified result, present once the session is over.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Leaderboard sorted fastest first.
    pub fn scores(&self) -> Vec<ScoreRecord> {
        self.store.list()
    }

    /// Delete a leaderboard entry.
    pub fn remove_score(&self, index: usize) -> anyhow::Result<Vec<ScoreRecord>> {
        self.store.remove_at(index)
    }

    /// Rewrite a leaderboard entry.
    pub fn update_score(&self, index: usize, record: ScoreRecord) -> anyhow::Result<Vec<ScoreRecord>> {
        self.store.replace_at(index, record)
    }

    /// Identity attached to new score records.
    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    /// Replace and persist the player identity.
    pub fn set_profile(&mut self, profile: PlayerProfile) {
        if let Err(err) = self.store.save_profile(&profile) {
            warn!("Failed to persist profile: {err}");
        }
        self.profile = profile;
    }

    fn schedule(&mut self, kind: TaskKind, due: Instant) {
        self.tasks.push(ScheduledTask { kind, due });
    }

    fn fire(&mut self, kind: TaskKind) {
        match kind {
            TaskKind::HidePreview => self.engine.hide_unmatched(),
            TaskKind::ResolveMismatch => self.engine.resolve_mismatch(),
        }
    }

    /// Settle the finished session: freeze the clocks, classify, persist.
    fn finish_at(&mut self, now: Instant) {
        self.phase = SessionPhase::Resolving;
        self.tasks.clear();
        self.timer.stop_at(now);
        self.video.pause_at(now);
        let cue = self.video.cue_at(now);
        let result = outcome::resolve(self.ai_finished_first, cue.position, cue.duration);
        self.outcome = Some(result);

        let record = ScoreRecord {
            name: self.profile.name.clone(),
            institution: self.profile.institution.clone(),
            email: self.profile.email.clone(),
            time: self.timer.elapsed().as_millis() as u64,
            result,
            date: Utc::now(),
        };
        if let Err(err) = self.store.append(record) {
            warn!("Failed to persist score: {err}");
        }
        self.phase = SessionPhase::Over;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn test_config(root: &std::path::Path, video_duration_secs: f64) -> AppConfig {
        AppConfig {
            data_root: root.to_path_buf(),
            face_count: 2,
            video_duration_secs,
            preview_ms: 3000,
            mismatch_ms: 1000,
            tick_ms: 100,
        }
    }

    fn controller_with(video_duration_secs: f64) -> (SessionController, TempDir) {
        let dir = tempdir().expect("tempdir");
        let config = test_config(dir.path(), video_duration_secs);
        let store = ScoreStore::new(dir.path());
        let profile = PlayerProfile {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            institution: "Analytical Society".to_string(),
        };
        let mut controller = SessionController::new(&config, store, profile);
        // Fixed layout: ids 0/2 share "a", ids 1/3 share "b".
        controller
            .deal(vec![
                Card::new(0, "a"),
                Card::new(1, "b"),
                Card::new(2, "a"),
                Card::new(3, "b"),
            ])
            .expect("deal while idle");
        (controller, dir)
    }

    fn past_preview(controller: &mut SessionController, origin: Instant) -> Instant {
        let after = origin + Duration::from_millis(3100);
        controller.tick_at(after);
        after
    }

    #[test]
    fn start_twice_is_an_error() {
        let (mut controller, _dir) = controller_with(90.0);
        let origin = Instant::now();
        controller.start_at(origin).expect("first start");
        assert!(matches!(
            controller.start_at(origin),
            Err(SessionError::AlreadyStarted)
        ));
    }

    #[test]
    fn deal_outside_idle_is_an_error() {
        let (mut controller, _dir) = controller_with(90.0);
        controller.start_at(Instant::now()).expect("start");
        assert!(matches!(
            controller.deal(vec![Card::new(0, "x")]),
            Err(SessionError::NotIdle)
        ));
    }

    #[test]
    fn preview_reveals_then_hides_the_deck() {
        let (mut controller, _dir) = controller_with(90.0);
        let origin = Instant::now();
        controller.start_at(origin).expect("start");

        let snapshot = controller.snapshot_at(origin);
        assert!(snapshot.cards.iter().all(|card| card.face_up));

        // Reveals during the preview window are backpressured away.
        assert_eq!(controller.reveal_at(0, origin), RevealOutcome::Rejected);

        controller.tick_at(origin + Duration::from_millis(2900));
        let snapshot = controller.snapshot_at(origin + Duration::from_millis(2900));
        assert!(snapshot.cards.iter().all(|card| card.face_up));

        let after = past_preview(&mut controller, origin);
        let snapshot = controller.snapshot_at(after);
        assert!(snapshot.cards.iter().all(|card| !card.face_up));
    }

    #[test]
    fn mismatch_flips_back_after_the_delay() {
        let (mut controller, _dir) = controller_with(90.0);
        let origin = Instant::now();
        controller.start_at(origin).expect("start");
        let after = past_preview(&mut controller, origin);

        assert_eq!(controller.reveal_at(0, after), RevealOutcome::Flipped);
        assert_eq!(
            controller.reveal_at(1, after),
            RevealOutcome::Mismatched(0, 1)
        );

        let early = after + Duration::from_millis(900);
        controller.tick_at(early);
        let snapshot = controller.snapshot_at(early);
        assert!(snapshot.cards[0].face_up);
        assert!(snapshot.cards[1].face_up);

        let late = after + Duration::from_millis(1100);
        controller.tick_at(late);
        let snapshot = controller.snapshot_at(late);
        assert!(!snapshot.cards[0].face_up);
        assert!(!snapshot.cards[1].face_up);
    }

    #[test]
    fn clearing_the_grid_wins_and_persists() {
        let (mut controller, _dir) = controller_with(90.0);
        let origin = Instant::now();
        controller.start_at(origin).expect("start");
        let after = past_preview(&mut controller, origin);

        controller.reveal_at(0, after);
        controller.reveal_at(2, after);
        controller.reveal_at(1, after);
        let finish = origin + Duration::from_secs(10);
        assert_eq!(
            controller.reveal_at(3, finish),
            RevealOutcome::Matched { complete: true }
        );

        assert_eq!(controller.phase(), SessionPhase::Over);
        assert_eq!(controller.outcome(), Some(Outcome::Win));

        let board = controller.scores();
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].name, "Ada");
        assert_eq!(board[0].time, 10_000);
        assert_eq!(board[0].result, Outcome::Win);
    }

    #[test]
    fn three_pair_deck_plays_through_to_over() {
        let (mut controller, _dir) = controller_with(90.0);
        // Fixed layout: 0/3 share "a", 1/4 share "b", 2/5 share "c".
        controller
            .deal(vec![
                Card::new(0, "a"),
                Card::new(1, "b"),
                Card::new(2, "c"),
                Card::new(3, "a"),
                Card::new(4, "b"),
                Card::new(5, "c"),
            ])
            .expect("deal while idle");
        let origin = Instant::now();
        controller.start_at(origin).expect("start");
        let after = past_preview(&mut controller, origin);

        controller.reveal_at(0, after);
        assert_eq!(
            controller.reveal_at(3, after),
            RevealOutcome::Matched { complete: false }
        );
        let snapshot = controller.snapshot_at(after);
        assert_eq!(snapshot.cards.iter().filter(|card| card.matched).count(), 2);

        controller.reveal_at(1, after);
        controller.reveal_at(4, after);
        controller.reveal_at(2, after);
        assert_eq!(
            controller.reveal_at(5, after),
            RevealOutcome::Matched { complete: true }
        );
        assert_eq!(controller.phase(), SessionPhase::Over);
    }

    #[test]
    fn finishing_inside_the_window_draws() {
        let (mut controller, _dir) = controller_with(12.0);
        let origin = Instant::now();
        controller.start_at(origin).expect("start");
        let after = past_preview(&mut controller, origin);

        controller.reveal_at(0, after);
        controller.reveal_at(2, after);
        controller.reveal_at(1, after);
        let finish = origin + Duration::from_millis(10_500);
        controller.reveal_at(3, finish);

        assert_eq!(controller.outcome(), Some(Outcome::Draw));
    }

    #[test]
    fn clip_finishing_first_loses() {
        let (mut controller, _dir) = controller_with(5.0);
        let origin = Instant::now();
        controller.start_at(origin).expect("start");
        past_preview(&mut controller, origin);

        // Past the clip's end; the tick latches the flag.
        let ended = origin + Duration::from_secs(6);
        controller.tick_at(ended);
        assert!(controller.snapshot_at(ended).ai_finished_first);

        controller.reveal_at(0, ended);
        controller.reveal_at(2, ended);
        controller.reveal_at(1, ended);
        controller.reveal_at(3, ended);

        assert_eq!(controller.phase(), SessionPhase::Over);
        assert_eq!(controller.outcome(), Some(Outcome::Lose));
    }

    #[test]
    fn empty_deck_finishes_immediately() {
        let (mut controller, _dir) = controller_with(90.0);
        controller.deal(Vec::new()).expect("deal empty");
        controller.start_at(Instant::now()).expect("start");
        assert_eq!(controller.phase(), SessionPhase::Over);
        assert_eq!(controller.outcome(), Some(Outcome::Win));
    }

    #[test]
    fn reset_cancels_scheduled_tasks() {
        let (mut controller, _dir) = controller_with(90.0);
        let origin = Instant::now();
        controller.start_at(origin).expect("start");
        let after = past_preview(&mut controller, origin);
        controller.reveal_at(0, after);
        controller.reveal_at(1, after);

        controller.reset();
        assert_eq!(controller.phase(), SessionPhase::Idle);

        // The mismatch deadline passing must not disturb the fresh deck.
        controller.tick_at(after + Duration::from_secs(5));
        let snapshot = controller.snapshot_at(after + Duration::from_secs(5));
        assert_eq!(snapshot.elapsed, Duration::ZERO);
        assert!(snapshot.cards.iter().all(|card| !card.face_up));
        assert_eq!(controller.reveal_at(0, after), RevealOutcome::Rejected);
    }

    #[test]
    fn video_end_flag_latches_once() {
        let (mut controller, _dir) = controller_with(90.0);
        controller.start_at(Instant::now()).expect("start");
        controller.video_ended();
        controller.video_ended();
        assert!(controller.snapshot_at(Instant::now()).ai_finished_first);
    }

    #[test]
    fn profile_updates_are_persisted() {
        let (mut controller, dir) = controller_with(90.0);
        let profile = PlayerProfile {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            institution: "Navy".to_string(),
        };
        controller.set_profile(profile.clone());
        assert_eq!(controller.profile(), &profile);

        let store = ScoreStore::new(dir.path());
        assert_eq!(store.load_profile(), Some(profile));
    }
}
