/// Pure game-logic functions.
///
/// Every public function takes an immutable reference to the current
/// `QuizGameState` (and, where a shuffle or a restart can happen, an RNG
/// handle) and returns a brand-new `QuizGameState`.  Side effects are limited
/// to the injected RNG and log records.

use std::rc::Rc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{GameConfig, Level};
use crate::entities::{
    Enemy, GameStatus, InputState, Label, Player, Projectile, Question, QuizGameState,
    SessionEnd, Timer, TimerAction, WavePhase,
};
use crate::questions::QuestionBank;

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build the first session for a bank and show its first question.
pub fn init_state(
    bank: &QuestionBank,
    config: GameConfig,
    level: Level,
    rng: &mut impl Rng,
) -> QuizGameState {
    new_session(bank.questions(), config, level, 0, GameStatus::Playing, rng)
}

fn new_session(
    questions: &[Question],
    config: GameConfig,
    level: Level,
    session: u64,
    status: GameStatus,
    rng: &mut impl Rng,
) -> QuizGameState {
    let mut shuffled = questions.to_vec();
    shuffled.shuffle(rng);
    log::info!(
        "session {}: {} questions, level {}",
        session,
        shuffled.len(),
        level.as_str()
    );

    let state = QuizGameState {
        questions: Rc::from(shuffled),
        current_question: 0,
        question_text: None,
        lives: config.lives,
        correct_answers: 0,
        win_target: config.win_target,
        player: Player {
            x: config.world_width / 2.0,
            y: config.player_y,
            vx: 0.0,
        },
        projectiles: Vec::new(),
        enemies: Vec::new(),
        timers: Vec::new(),
        phase: WavePhase::AwaitingQuestion,
        status,
        session,
        clock_ms: 0,
        next_id: 0,
        level,
        config,
    };
    show_question(&state, rng)
}

/// End the current session with `outcome` and start a fresh one.  The new
/// state carries the outcome in its status until `acknowledge` is called.
pub fn restart(state: &QuizGameState, outcome: SessionEnd, rng: &mut impl Rng) -> QuizGameState {
    log::info!(
        "session {} ended: {:?} (score {}, lives {})",
        state.session,
        outcome,
        state.correct_answers,
        state.lives
    );
    new_session(
        &state.questions,
        state.config,
        state.level,
        state.session + 1,
        GameStatus::Announcing(outcome),
        rng,
    )
}

/// Dismiss the end-of-session notice and let the simulation run again.
pub fn acknowledge(state: &QuizGameState) -> QuizGameState {
    QuizGameState {
        status: GameStatus::Playing,
        ..state.clone()
    }
}

// ── Wave state machine ──────────────────────────────────────────────────────

/// Evenly spaced horizontal positions for `n` choices across `width`.
pub fn answer_positions(width: f32, n: usize) -> Vec<f32> {
    let spacing = width / (n as f32 + 1.0);
    (0..n).map(|i| spacing * (i as f32 + 1.0)).collect()
}

fn schedule(state: &mut QuizGameState, delay_ms: u64, action: TimerAction) -> u64 {
    let id = state.next_id;
    state.next_id += 1;
    state.timers.push(Timer {
        id,
        session: state.session,
        due_ms: state.clock_ms + delay_ms,
        action,
    });
    id
}

/// Display the current question and schedule its choices.  Ends the session
/// when the index has run past the question list.
pub fn show_question(state: &QuizGameState, rng: &mut impl Rng) -> QuizGameState {
    let mut next = QuizGameState {
        enemies: Vec::new(),
        ..state.clone()
    };

    let Some(text) = next.current().map(|q| q.text.clone()) else {
        return restart(&next, SessionEnd::NoMoreQuestions, rng);
    };
    log::debug!(
        "session {}: question {} of {}: {}",
        next.session,
        next.current_question + 1,
        next.questions.len(),
        text
    );

    next.question_text = Some(text);
    next.phase = WavePhase::QuestionShown;
    let delay = next.config.reveal_delay_ms;
    schedule(&mut next, delay, TimerAction::RevealAnswers);
    next
}

/// Spawn one falling enemy per choice of the current question, each with
/// its answer label, and arm projectile collisions.
pub fn spawn_answers(state: &QuizGameState, rng: &mut impl Rng) -> QuizGameState {
    let Some(question) = state.current() else {
        return state.clone();
    };

    let mut choices = question.choices.clone();
    choices.shuffle(rng);

    let cfg = state.config;
    let vy = cfg.enemy_fall_speed * state.level.fall_speed_scale();
    let positions = answer_positions(cfg.world_width, choices.len());

    let mut next = state.clone();
    next.enemies = Vec::with_capacity(choices.len());
    for (answer, x) in choices.into_iter().zip(positions) {
        let id = next.next_id;
        next.next_id += 1;
        next.enemies.push(Enemy {
            id,
            x,
            y: cfg.enemy_start_y,
            vy,
            label: Label {
                x,
                y: cfg.enemy_start_y - cfg.label_offset,
                text: answer.clone(),
            },
            answer,
        });
    }
    next.phase = WavePhase::AnswersActive;
    next
}

/// Resolve a projectile hitting an enemy.
pub fn check_answer(
    state: &QuizGameState,
    projectile_id: u64,
    enemy_id: u64,
    rng: &mut impl Rng,
) -> QuizGameState {
    let mut next = state.clone();
    next.projectiles.retain(|p| p.id != projectile_id);

    let hit_answer = next
        .enemies
        .iter()
        .find(|e| e.id == enemy_id)
        .map(|e| e.answer.clone());
    let Some(hit_answer) = hit_answer else {
        return next;
    };
    let correct = next.current().is_some_and(|q| q.answer == hit_answer);

    if !correct {
        log::debug!("session {}: wrong answer", next.session);
        return lose_life(&next, Some(enemy_id), rng);
    }

    next.correct_answers += 1;
    log::debug!(
        "session {}: correct answer ({}/{})",
        next.session,
        next.correct_answers,
        next.win_target
    );
    if next.correct_answers >= next.win_target {
        return restart(&next, SessionEnd::Victory, rng);
    }
    wave_transition(&next)
}

/// Remove `enemy_id` (with its label) if given and take a life.
pub fn lose_life(state: &QuizGameState, enemy_id: Option<u64>, rng: &mut impl Rng) -> QuizGameState {
    let mut next = state.clone();
    if let Some(id) = enemy_id {
        next.enemies.retain(|e| e.id != id);
    }

    next.lives = next.lives.saturating_sub(1);
    log::debug!("session {}: life lost, {} left", next.session, next.lives);
    if next.lives == 0 {
        return restart(&next, SessionEnd::GameOver, rng);
    }
    wave_transition(&next)
}

/// Clear the wave and schedule the next question.
pub fn wave_transition(state: &QuizGameState) -> QuizGameState {
    let mut next = QuizGameState {
        enemies: Vec::new(),
        phase: WavePhase::Transition,
        ..state.clone()
    };
    let delay = next.config.transition_delay_ms;
    schedule(&mut next, delay, TimerAction::NextQuestion);
    next
}

// ── Timers ──────────────────────────────────────────────────────────────────

/// Fire one pending timer by id.  Timers scheduled by an earlier session are
/// discarded without effect.
pub fn fire_timer(state: &QuizGameState, timer_id: u64, rng: &mut impl Rng) -> QuizGameState {
    let mut next = state.clone();
    let Some(pos) = next.timers.iter().position(|t| t.id == timer_id) else {
        return next;
    };
    let timer = next.timers.remove(pos);

    if timer.session != next.session {
        log::debug!(
            "dropping {:?} timer from session {} (current {})",
            timer.action,
            timer.session,
            next.session
        );
        return next;
    }

    match timer.action {
        TimerAction::RevealAnswers => spawn_answers(&next, rng),
        TimerAction::NextQuestion => {
            next.current_question += 1;
            show_question(&next, rng)
        }
    }
}

/// Fire every timer due at the current clock, earliest first.  Stops early if
/// a firing ends the session.
fn fire_due_timers(state: &QuizGameState, rng: &mut impl Rng) -> QuizGameState {
    let session = state.session;
    let mut next = state.clone();
    loop {
        let due = next
            .timers
            .iter()
            .filter(|t| t.due_ms <= next.clock_ms)
            .min_by_key(|t| (t.due_ms, t.id))
            .map(|t| t.id);
        let Some(id) = due else {
            return next;
        };
        next = fire_timer(&next, id, rng);
        if next.session != session {
            return next;
        }
    }
}

// ── Input-driven state transitions (pure) ───────────────────────────────────

fn steer(state: &QuizGameState, vx: f32, dt_ms: u64) -> QuizGameState {
    let cfg = &state.config;
    let dt = dt_ms as f32 / 1000.0;
    let half = cfg.player_half_width;
    let x = (state.player.x + vx * dt)
        .min(cfg.world_width - half)
        .max(half);
    QuizGameState {
        player: Player {
            x,
            vx,
            ..state.player.clone()
        },
        ..state.clone()
    }
}

pub fn move_player_left(state: &QuizGameState, dt_ms: u64) -> QuizGameState {
    steer(state, -state.config.player_speed, dt_ms)
}

pub fn move_player_right(state: &QuizGameState, dt_ms: u64) -> QuizGameState {
    steer(state, state.config.player_speed, dt_ms)
}

/// Fire a projectile straight up from the ship.
pub fn player_shoot(state: &QuizGameState) -> QuizGameState {
    let mut next = state.clone();
    let id = next.next_id;
    next.next_id += 1;
    next.projectiles.push(Projectile {
        id,
        x: state.player.x,
        y: state.player.y - state.config.muzzle_offset,
        vy: -state.config.projectile_speed,
    });
    next
}

// ── Per-frame tick ──────────────────────────────────────────────────────────

fn overlaps(p: &Projectile, e: &Enemy, cfg: &GameConfig) -> bool {
    (p.x - e.x).abs() <= cfg.projectile_half_width + cfg.enemy_half_width
        && (p.y - e.y).abs() <= cfg.projectile_half_height + cfg.enemy_half_height
}

/// Advance the simulation by `dt_ms` milliseconds.
///
/// Order: due timers, player input, motion, projectile/enemy collisions,
/// then label tracking and the bottom-line miss check.  Nothing moves while
/// an end-of-session notice is up.
pub fn tick(
    state: &QuizGameState,
    input: InputState,
    dt_ms: u64,
    rng: &mut impl Rng,
) -> QuizGameState {
    if state.status != GameStatus::Playing {
        return state.clone();
    }

    // ── 1. Clock & timers ────────────────────────────────────────────────────
    let mut next = state.clone();
    next.clock_ms += dt_ms;
    next = fire_due_timers(&next, rng);
    if next.session != state.session {
        return next;
    }

    // ── 2. Player input ──────────────────────────────────────────────────────
    next = if input.left {
        move_player_left(&next, dt_ms)
    } else if input.right {
        move_player_right(&next, dt_ms)
    } else {
        steer(&next, 0.0, dt_ms)
    };
    if input.fire_pressed {
        next = player_shoot(&next);
    }

    // ── 3. Motion ────────────────────────────────────────────────────────────
    let dt = dt_ms as f32 / 1000.0;
    for p in &mut next.projectiles {
        p.y += p.vy * dt;
    }
    for e in &mut next.enemies {
        e.y += e.vy * dt;
    }
    if next.config.despawn_offscreen_projectiles {
        let half = next.config.projectile_half_height;
        next.projectiles.retain(|p| p.y + half >= 0.0);
    }

    // ── 4. Collisions: projectiles ↔ enemies ─────────────────────────────────
    if next.phase == WavePhase::AnswersActive {
        let hit = next.projectiles.iter().find_map(|p| {
            next.enemies
                .iter()
                .find(|e| overlaps(p, e, &next.config))
                .map(|e| (p.id, e.id))
        });
        if let Some((projectile_id, enemy_id)) = hit {
            return check_answer(&next, projectile_id, enemy_id, rng);
        }
    }

    // ── 5. Labels follow enemies; enemies past the line are misses ───────────
    let offset = next.config.label_offset;
    for e in &mut next.enemies {
        e.label.x = e.x;
        e.label.y = e.y - offset;
    }
    let missed = next
        .enemies
        .iter()
        .find(|e| e.y > next.config.miss_line_y)
        .map(|e| e.id);
    if let Some(enemy_id) = missed {
        log::debug!("session {}: answers reached the bottom", next.session);
        return lose_life(&next, Some(enemy_id), rng);
    }

    next
}
