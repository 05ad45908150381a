/// Rendering layer.  All terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// game state.  No game logic is performed; this module only translates
/// world coordinates into terminal cells and state into terminal commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use quiz_shooter::config::Level;
use quiz_shooter::entities::{Enemy, GameStatus, Projectile, QuizGameState, SessionEnd};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LIVES: Color = Color::Red;
const C_QUESTION: Color = Color::Yellow;
const C_PLAYER: Color = Color::White;
const C_ENEMY: Color = Color::Green;
const C_LABEL: Color = Color::White;
const C_PROJECTILE: Color = Color::Cyan;
const C_HINT: Color = Color::DarkGrey;

/// Left edge of the question text block, in world units.
const QUESTION_X: f32 = 200.0;
const QUESTION_Y: f32 = 60.0;
const QUESTION_WRAP: f32 = 400.0;

/// Extra label wrap width beyond the enemy's own width, in world units.
const LABEL_WRAP_PAD: f32 = 20.0;

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Terminal area the world is projected onto: columns 1..width-1 inside the
/// side walls, rows 2..height-2 between the top and bottom bars.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    fn inner_width(&self) -> f32 {
        self.width.saturating_sub(2).max(1) as f32
    }

    fn inner_height(&self) -> f32 {
        self.height.saturating_sub(4).max(1) as f32
    }

    /// Map a world position to a terminal cell, clamped to the play area.
    pub fn cell(&self, state: &QuizGameState, x: f32, y: f32) -> (u16, u16) {
        let cfg = &state.config;
        let max_col = self.width.saturating_sub(2).max(1);
        let max_row = self.height.saturating_sub(3).max(2);
        let col = 1.0 + (x / cfg.world_width * self.inner_width()).floor();
        let row = 2.0 + (y / cfg.world_height * self.inner_height()).floor();
        (
            (col.max(1.0) as u16).min(max_col),
            (row.max(2.0) as u16).min(max_row),
        )
    }

    /// Convert a world-space width to a column count (at least `min`).
    pub fn columns(&self, state: &QuizGameState, world_width: f32, min: usize) -> usize {
        let cols = (world_width / state.config.world_width * self.inner_width()).floor() as usize;
        cols.max(min)
    }
}

/// Greedy word wrap.  Words longer than `width` are split across lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let line_len = line.chars().count();
        if line_len > 0 && line_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, state: &QuizGameState, view: Viewport) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, view)?;
    draw_hud(out, state, view)?;
    draw_question(out, state, view)?;

    for enemy in &state.enemies {
        draw_enemy(out, state, enemy, view)?;
    }
    for projectile in &state.projectiles {
        draw_projectile(out, state, projectile, view)?;
    }

    draw_player(out, state, view)?;
    draw_controls_hint(out, view)?;

    if let GameStatus::Announcing(outcome) = state.status {
        draw_announcement(out, state, outcome, view)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: Viewport) -> std::io::Result<()> {
    let w = view.width as usize;
    let h = view.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, state: &QuizGameState, view: Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LIVES))?;
    out.queue(Print(format!("Lives: {}", state.lives)))?;

    let (level_str, level_color) = match state.level {
        Level::Easy => ("[ EASY ]", Color::Green),
        Level::Medium => ("[ MEDIUM ]", Color::Yellow),
        Level::Hard => ("[ HARD ]", Color::Red),
    };
    let lx = (view.width / 2).saturating_sub(level_str.len() as u16 / 2);
    out.queue(cursor::MoveTo(lx, 0))?;
    out.queue(style::SetForegroundColor(level_color))?;
    out.queue(Print(level_str))?;

    let score_str = format!("Score: {}/{}", state.correct_answers, state.win_target);
    let sx = view
        .width
        .saturating_sub(score_str.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(sx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(&score_str))?;

    Ok(())
}

fn draw_question<W: Write>(out: &mut W, state: &QuizGameState, view: Viewport) -> std::io::Result<()> {
    let Some(text) = &state.question_text else {
        return Ok(());
    };
    let (col, row) = view.cell(state, QUESTION_X, QUESTION_Y);
    let wrap = view.columns(state, QUESTION_WRAP, 10);
    let bottom = view.height.saturating_sub(3);

    out.queue(style::SetForegroundColor(C_QUESTION))?;
    for (i, line) in wrap_text(&format!("Q: {}", text), wrap).iter().enumerate() {
        let r = row + i as u16;
        if r > bottom {
            break;
        }
        out.queue(cursor::MoveTo(col, r))?;
        out.queue(Print(line))?;
    }
    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_player<W: Write>(out: &mut W, state: &QuizGameState, view: Viewport) -> std::io::Result<()> {
    //   ▲       ← row y      (tip)
    //  /█\      ← row y+1    (fuselage + wings)
    let (col, row) = view.cell(state, state.player.x, state.player.y);
    out.queue(style::SetForegroundColor(C_PLAYER))?;

    out.queue(cursor::MoveTo(col, row))?;
    out.queue(Print("▲"))?;

    let wing_row = row + 1;
    if wing_row < view.height.saturating_sub(2) {
        out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), wing_row))?;
        out.queue(Print("/█\\"))?;
    }

    Ok(())
}

fn draw_enemy<W: Write>(
    out: &mut W,
    state: &QuizGameState,
    enemy: &Enemy,
    view: Viewport,
) -> std::io::Result<()> {
    let (col, row) = view.cell(state, enemy.x, enemy.y);
    out.queue(style::SetForegroundColor(C_ENEMY))?;
    out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row))?;
    out.queue(Print("«◎»"))?;

    // Label: bottom-centre anchored at the label position, wrapping upward.
    let wrap_world = state.config.enemy_half_width * 2.0 + LABEL_WRAP_PAD;
    let wrap = view.columns(state, wrap_world, 6);
    let lines = wrap_text(&enemy.label.text, wrap);
    let (label_col, label_row) = view.cell(state, enemy.label.x, enemy.label.y);
    let label_row = label_row.min(row.saturating_sub(1));

    out.queue(style::SetForegroundColor(C_LABEL))?;
    for (i, line) in lines.iter().rev().enumerate() {
        let Some(r) = label_row.checked_sub(i as u16) else {
            break;
        };
        if r < 2 {
            break;
        }
        let len = line.chars().count() as u16;
        let c = label_col.saturating_sub(len / 2).max(1);
        out.queue(cursor::MoveTo(c, r))?;
        out.queue(Print(line))?;
    }
    Ok(())
}

fn draw_projectile<W: Write>(
    out: &mut W,
    state: &QuizGameState,
    projectile: &Projectile,
    view: Viewport,
) -> std::io::Result<()> {
    if projectile.y < 0.0 {
        return Ok(());
    }
    let (col, row) = view.cell(state, projectile.x, projectile.y);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(C_PROJECTILE))?;
    out.queue(Print("║"))?;
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, view: Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("← → / A D : Move   SPACE : Shoot   Q : Quit"))?;
    Ok(())
}

// ── End-of-session overlay ────────────────────────────────────────────────────

fn draw_announcement<W: Write>(
    out: &mut W,
    state: &QuizGameState,
    outcome: SessionEnd,
    view: Viewport,
) -> std::io::Result<()> {
    let message = outcome.message(state.win_target);
    let color = match outcome {
        SessionEnd::Victory => Color::Green,
        SessionEnd::GameOver => Color::Red,
        SessionEnd::NoMoreQuestions => Color::Yellow,
    };

    let inner = message.chars().count() + 4;
    let lines = [
        format!("╔{}╗", "═".repeat(inner)),
        format!("║  {}  ║", message),
        format!("╚{}╝", "═".repeat(inner)),
    ];

    let cx = view.width / 2;
    let start_row = (view.height / 2).saturating_sub(2);

    out.queue(style::SetForegroundColor(color))?;
    for (i, line) in lines.iter().enumerate() {
        let col = cx.saturating_sub(line.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(Print(line))?;
    }

    let hint = "ENTER - Play Again   M - Menu   Q - Quit";
    let col = cx.saturating_sub(hint.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, start_row + lines.len() as u16))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print(hint))?;

    Ok(())
}
