//! Game session state machine
//!
//! Owns the tracked objects, the possession accumulator and the game clock.
//! The caller pulls a frame, reads the wall clock, and calls [`GameSession::tick`];
//! presentation and audio consume the returned payload and cue events.
//!
//! Phases: `Waiting` -> (START) -> `Playing` -> (duration elapsed) -> `Waiting`.
//! Game over is resolved inside the tick that ends the game, so it has no
//! phase of its own: a caller sees the `GameOver` cue and the one-shot
//! [`GameSummary`] on that tick. QUIT ends the session from any phase.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::config::{ConfigError, GameConfig};
use crate::feed::frame::PositionFrame;
use crate::game::constants::clock::FULL_CIRCLE_DEGREES;
use crate::game::match_result::{determine_result, GameSummary};
use crate::game::possession::{PossessionAccumulator, Scores, Side};
use crate::game::side_change::{SideChange, SideChangeDetector};
use crate::game::tracked_object::TrackedObject;
use crate::util::vec3::Vector3;

/// Cue events raised in one call; rarely more than a handful
pub type CueEvents = SmallVec<[CueEvent; 4]>;

/// Game phase as seen by presentation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for a START event
    Waiting,
    /// Game clock running, possession accumulating
    Playing,
    /// Session ended by QUIT
    Terminated,
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::Waiting
    }
}

/// Semantic triggers for audio and presentation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CueEvent {
    /// Game accepted a START; presentation runs its countdown
    CountdownStart,
    /// An object crossed onto the positive side
    SwooshToPositive,
    /// An object crossed onto the negative side
    SwooshToNegative,
    /// Game clock ran out
    GameOver,
}

impl CueEvent {
    /// Audio cue for a side change, if it was a crossing
    pub fn for_side_change(change: SideChange) -> Option<Self> {
        match change {
            SideChange::ToPositive => Some(CueEvent::SwooshToPositive),
            SideChange::ToNegative => Some(CueEvent::SwooshToNegative),
            SideChange::None => None,
        }
    }
}

/// Input accepted by the session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InputEvent {
    /// Start a game (only acted on while waiting)
    Start,
    /// End the session
    Quit,
}

impl InputEvent {
    /// Map a key name to an input: `g` starts, `q` or escape quits
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "g" | "G" => Some(InputEvent::Start),
            "q" | "Q" | "\u{1b}" | "esc" | "escape" => Some(InputEvent::Quit),
            _ => None,
        }
    }
}

/// Session errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session has been terminated")]
    Terminated,
}

/// One object's position for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectPosition {
    pub name: String,
    pub position: Vector3,
    /// Coordinate on the game axis; the sign gives the side
    pub side: f64,
    /// Whether the marker was seen this tick
    pub visible: bool,
}

/// Everything presentation needs to draw one tick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderPayload {
    pub phase: GamePhase,
    pub positions: Vec<ObjectPosition>,
    /// Remaining time as a clock hand angle (360 = full game left)
    pub clock_angle_degrees: Option<f64>,
    /// Present while playing and on the tick a game ends
    pub scores: Option<Scores>,
}

/// Per-tick tracking counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub visible: usize,
    pub occluded: usize,
    /// Crossings ignored because the object jumped too far
    pub glitches: usize,
}

/// Result of one tick
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub payload: RenderPayload,
    pub cues: CueEvents,
    /// Set only on the tick the game ended
    pub summary: Option<GameSummary>,
    pub stats: TickStats,
}

/// Wall-clock bookkeeping for a running game
#[derive(Debug, Clone, Copy)]
struct GameClock {
    started: Instant,
    last_update: Instant,
}

impl GameClock {
    fn start(now: Instant) -> Self {
        Self {
            started: now,
            last_update: now,
        }
    }

    fn elapsed(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started).as_secs_f64()
    }

    /// Seconds since the last update, advancing the update mark to `now`
    fn advance(&mut self, now: Instant) -> f64 {
        let delta = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        delta
    }
}

#[derive(Debug, Clone, Copy)]
enum PhaseState {
    Waiting,
    Playing(GameClock),
    Terminated,
}

/// A possession game session
pub struct GameSession {
    objects: Vec<TrackedObject>,
    axis: usize,
    game_duration_seconds: f64,
    detector: SideChangeDetector,
    accumulator: PossessionAccumulator,
    state: PhaseState,
    tick: u64,
    games_completed: u64,
}

impl GameSession {
    /// Build a session from validated configuration; objects start at the origin
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        info!(
            "Tracking {} object(s) {:?} on axis {}, {}s games",
            config.objects.len(),
            config.objects,
            config.axis,
            config.game_duration_seconds
        );

        Ok(Self {
            objects: config.objects.iter().map(TrackedObject::new).collect(),
            axis: config.axis,
            game_duration_seconds: config.game_duration_seconds,
            detector: SideChangeDetector::new(config.velocity_glitch_threshold),
            accumulator: PossessionAccumulator::new(),
            state: PhaseState::Waiting,
            tick: 0,
            games_completed: 0,
        })
    }

    /// Current phase
    pub fn phase(&self) -> GamePhase {
        match self.state {
            PhaseState::Waiting => GamePhase::Waiting,
            PhaseState::Playing(_) => GamePhase::Playing,
            PhaseState::Terminated => GamePhase::Terminated,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, PhaseState::Terminated)
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    pub fn accumulator(&self) -> &PossessionAccumulator {
        &self.accumulator
    }

    pub fn scores(&self) -> Scores {
        self.accumulator.scores()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn games_completed(&self) -> u64 {
        self.games_completed
    }

    /// Seconds until the running game ends, `None` when not playing
    pub fn remaining(&self, now: Instant) -> Option<f64> {
        match &self.state {
            PhaseState::Playing(clock) => {
                Some((self.game_duration_seconds - clock.elapsed(now)).max(0.0))
            }
            _ => None,
        }
    }

    /// Place every object from an initial frame without touching phase or clock
    pub fn prime(&mut self, frame: &PositionFrame) {
        for object in &mut self.objects {
            object.update(frame.get(&object.name));
            debug!("{} starts at {:?}", object.name, object.current_position());
        }
    }

    /// Apply an input event
    ///
    /// START while waiting zeroes possession, starts the clock at `now` and
    /// cues the countdown; START in any other phase is ignored. QUIT ends the
    /// session.
    pub fn handle_input(&mut self, event: InputEvent, now: Instant) -> Result<CueEvents, SessionError> {
        let mut cues = CueEvents::new();

        match (event, self.state) {
            (_, PhaseState::Terminated) => return Err(SessionError::Terminated),
            (InputEvent::Quit, _) => {
                info!("Quit after {} game(s)", self.games_completed);
                self.state = PhaseState::Terminated;
            }
            (InputEvent::Start, PhaseState::Waiting) => {
                self.accumulator.reset();
                self.state = PhaseState::Playing(GameClock::start(now));
                cues.push(CueEvent::CountdownStart);
                info!("Game ON");
            }
            (InputEvent::Start, PhaseState::Playing(_)) => {
                debug!("Ignoring start while a game is running");
            }
        }

        Ok(cues)
    }

    /// Advance the session by one frame observed at `now`
    pub fn tick(&mut self, frame: &PositionFrame, now: Instant) -> Result<TickOutput, SessionError> {
        if self.is_terminated() {
            return Err(SessionError::Terminated);
        }
        self.tick += 1;

        let mut stats = TickStats::default();
        for object in &mut self.objects {
            if object.update(frame.get(&object.name)) {
                stats.visible += 1;
            } else {
                stats.occluded += 1;
                debug!("{} occluded", object.name);
            }
        }

        let axis = self.axis;
        let mut cues = CueEvents::new();
        let mut summary = None;
        let mut scores = None;
        let mut clock_angle_degrees = None;

        if let PhaseState::Playing(mut clock) = self.state {
            let elapsed = clock.advance(now);
            self.accumulator
                .integrate(self.objects.iter().map(|o| o.side(axis)), elapsed);

            for object in &self.objects {
                match Side::of(object.side(axis)) {
                    Some(Side::Positive) => debug!("{} +", object.name),
                    Some(Side::Negative) => debug!("{} -", object.name),
                    None => {}
                }

                // Frozen objects keep their last displacement and are judged on it again
                if self.detector.is_glitch(object) {
                    stats.glitches += 1;
                }
                if let Some(cue) = CueEvent::for_side_change(self.detector.detect_change(object, axis)) {
                    cues.push(cue);
                }
            }

            let game_time = clock.elapsed(now);
            let remaining = (self.game_duration_seconds - game_time).max(0.0);
            clock_angle_degrees = Some(FULL_CIRCLE_DEGREES * remaining / self.game_duration_seconds);
            scores = Some(self.accumulator.scores());
            self.state = PhaseState::Playing(clock);

            if game_time >= self.game_duration_seconds {
                summary = Some(self.finish_game(game_time));
                cues.push(CueEvent::GameOver);
            }
        }

        let payload = RenderPayload {
            phase: self.phase(),
            positions: self
                .objects
                .iter()
                .map(|o| ObjectPosition {
                    name: o.name.clone(),
                    position: o.current_position(),
                    side: o.side(axis),
                    visible: o.is_visible(),
                })
                .collect(),
            clock_angle_degrees,
            scores,
        };

        Ok(TickOutput {
            payload,
            cues,
            summary,
            stats,
        })
    }

    /// Playing -> Waiting once the clock runs out, producing the summary
    fn finish_game(&mut self, game_time: f64) -> GameSummary {
        let summary = determine_result(&self.accumulator, game_time);
        self.games_completed += 1;

        info!(
            "Game over: positive {} / negative {} ({:.2}s / {:.2}s) - {}",
            summary.positive_score,
            summary.negative_score,
            summary.accumulated_positive_time,
            summary.accumulated_negative_time,
            summary.headline()
        );
        if !summary.time_recorded {
            info!("No time recorded");
        }

        self.state = PhaseState::Waiting;
        summary
    }
}
