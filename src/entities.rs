/// All game entity types: pure data, no logic.

use std::rc::Rc;

use serde::Deserialize;

use crate::config::{GameConfig, Level};

// ── Questions ─────────────────────────────────────────────────────────────────

/// One trivia question as stored in the question file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub choices: Vec<String>,
    /// Must equal one of `choices` exactly.
    pub answer: String,
}

impl Question {
    pub fn is_answerable(&self) -> bool {
        self.choices.iter().any(|c| c == &self.answer)
    }
}

// ── Session outcome ───────────────────────────────────────────────────────────

/// The three ways a play session ends.  Each one is announced to the player
/// and followed by a full reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    NoMoreQuestions,
    Victory,
    GameOver,
}

impl SessionEnd {
    pub fn message(&self, win_target: u32) -> String {
        match self {
            SessionEnd::NoMoreQuestions => "No more questions!".to_string(),
            SessionEnd::Victory => {
                format!("You Win! You answered {} correctly!", win_target)
            }
            SessionEnd::GameOver => "Game Over! Try again.".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameStatus {
    Playing,
    /// The state has already been reset; the simulation stays frozen until
    /// the player dismisses the notice.
    Announcing(SessionEnd),
}

/// Where the current wave is in its question → answers → transition cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    AwaitingQuestion,
    /// Question text visible, reveal timer pending.
    QuestionShown,
    /// Enemies falling; projectile/enemy collisions are live.
    AnswersActive,
    /// Wave resolved, next-question timer pending.
    Transition,
}

// ── Timers ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    RevealAnswers,
    NextQuestion,
}

/// A one-shot continuation on the session clock.
#[derive(Clone, Debug, PartialEq)]
pub struct Timer {
    pub id: u64,
    /// Generation of the session that scheduled this timer.
    pub session: u64,
    pub due_ms: u64,
    pub action: TimerAction,
}

// ── Player, projectiles, enemies ──────────────────────────────────────────────

/// Positions are in world units (the play area is `world_width` ×
/// `world_height`, y grows downward).
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    /// Horizontal velocity applied during the last tick.
    pub vx: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    /// Negative = upward.
    pub vy: f32,
}

/// Floating answer text.  Owned by its enemy so the two live and die together.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub x: f32,
    /// Bottom edge of the text block.
    pub y: f32,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    /// The answer choice this enemy stands for.
    pub answer: String,
    pub label: Label,
}

/// Keyboard state sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    /// True only on the frame the fire key went down.
    pub fire_pressed: bool,
}

// ── Master game state ─────────────────────────────────────────────────────────

/// The entire game state.  Cloneable so pure update functions can
/// return a new copy without mutating the original.
#[derive(Clone, Debug)]
pub struct QuizGameState {
    /// Session question list, shuffled once at session start.
    pub questions: Rc<[Question]>,
    pub current_question: usize,
    /// Text of the question on screen, if any.
    pub question_text: Option<String>,
    pub lives: u32,
    pub correct_answers: u32,
    pub win_target: u32,
    pub player: Player,
    pub projectiles: Vec<Projectile>,
    pub enemies: Vec<Enemy>,
    pub timers: Vec<Timer>,
    pub phase: WavePhase,
    pub status: GameStatus,
    /// Session generation; bumped on every restart.
    pub session: u64,
    /// Milliseconds of simulated time since the session started.
    pub clock_ms: u64,
    /// Next id handed out to a projectile, enemy or timer.
    pub next_id: u64,
    pub level: Level,
    pub config: GameConfig,
}

impl QuizGameState {
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current_question)
    }
}
