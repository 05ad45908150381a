mod display;

use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal,
    ExecutableCommand, QueueableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use quiz_shooter::compute::{acknowledge, init_state, tick};
use quiz_shooter::config::{GameConfig, Level};
use quiz_shooter::entities::{GameStatus, InputState};
use quiz_shooter::logging;
use quiz_shooter::questions::QuestionBank;

use display::Viewport;

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

/// Longest simulated step; a stalled terminal must not teleport enemies
/// past the miss line.
const MAX_STEP_MS: u64 = 100;

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 4 frames (≈133 ms) is
/// always refreshed before expiry.
const HOLD_WINDOW: u64 = 4;

/// Arcade trivia: shoot the falling answer to each question.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Question bank (JSON array of {question, choices, answer}).
    /// Defaults to the built-in bank.
    #[arg(short, long)]
    questions: Option<PathBuf>,

    /// JSON file overriding gameplay constants
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start straight away at this difficulty (easy, medium, hard)
    #[arg(short, long, value_parser = parse_level)]
    level: Option<Level>,

    /// Seed for question and choice shuffling
    #[arg(long)]
    seed: Option<u64>,

    /// Write log records to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_level(s: &str) -> Result<Level, String> {
    Level::from_str(s).ok_or_else(|| format!("unknown level {s:?} (expected easy, medium or hard)"))
}

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

/// What a key `Press` asks the game loop to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PressAction {
    Quit,
    Menu,
    Acknowledge,
    Fire,
    Ignore,
}

/// Records a `Press` in `key_frame` and classifies it.
///
/// Terminals without key-release reporting deliver OS key-repeat as more
/// `Press` events.  A press only counts as fresh when the key was not
/// already held on the previous frame, so holding Space fires once and
/// cannot dismiss a notice that appears while it is still down.
fn classify_press(
    key_frame: &mut HashMap<KeyCode, u64>,
    code: KeyCode,
    modifiers: KeyModifiers,
    announcing: bool,
    frame: u64,
) -> PressAction {
    let fresh = !is_held(key_frame, &code, frame.saturating_sub(1));
    key_frame.insert(code, frame);

    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return PressAction::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            return PressAction::Quit;
        }
        _ => {}
    }
    if !fresh {
        return PressAction::Ignore;
    }

    if announcing {
        match code {
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') | KeyCode::Char('R') => {
                PressAction::Acknowledge
            }
            KeyCode::Char('m') | KeyCode::Char('M') => PressAction::Menu,
            _ => PressAction::Ignore,
        }
    } else if code == KeyCode::Char(' ') {
        PressAction::Fire
    } else {
        PressAction::Ignore
    }
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start(Level),
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    bank: &QuestionBank,
    config: &GameConfig,
) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  QUIZ  SHOOTER  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(6),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    let goal = format!(
        "{} questions loaded — answer {} correctly to win",
        bank.len(),
        config.win_target
    );
    out.queue(cursor::MoveTo(
        cx.saturating_sub(goal.chars().count() as u16 / 2),
        cy.saturating_sub(5),
    ))?;
    out.queue(style::SetForegroundColor(Color::Yellow))?;
    out.queue(Print(&goal))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(10), cy.saturating_sub(3)))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("Select difficulty:"))?;

    let options: &[(&str, &str, Color, &str)] = &[
        ("1", "Easy  ", Color::Green,  "Answers drift down slowly"),
        ("2", "Medium", Color::Yellow, "Arcade pace"),
        ("3", "Hard  ", Color::Red,    "Think fast!"),
    ];

    for (i, (key, label, color, desc)) in options.iter().enumerate() {
        let row = cy.saturating_sub(1) + i as u16;
        out.queue(cursor::MoveTo(cx.saturating_sub(10), row))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!("[{}] ", key)))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(format!("{:<8}", label)))?;
        out.queue(style::SetForegroundColor(Color::DarkGrey))?;
        out.queue(Print(format!(" — {}", desc)))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(10), cy + 3))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print(format!(
        "Lives: {}   Wrong answer or a miss costs one",
        config.lives
    )))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(10), cy + 5))?;
    out.queue(Print("← → / A D : Move   SPACE : Shoot   Q : Quit"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        if let Ok(Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. })) = rx.recv() {
            match code {
                KeyCode::Char('1') => return Ok(MenuResult::Start(Level::Easy)),
                KeyCode::Char('2') => return Ok(MenuResult::Start(Level::Medium)),
                KeyCode::Char('3') => return Ok(MenuResult::Start(Level::Hard)),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            }
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Returns `true` → quit program,  `false` → back to menu.
///
/// Movement keys use a `key_frame` map recording the frame of the last
/// press/repeat event, so Space + A/D can be held together.  Firing and
/// dismissing a notice go through `classify_press`, which ignores key-repeat.
fn game_loop<W: Write>(
    out: &mut W,
    bank: &QuestionBank,
    config: GameConfig,
    level: Level,
    rng: &mut StdRng,
    rx: &mpsc::Receiver<Event>,
) -> std::io::Result<bool> {
    let mut state = init_state(bank, config, level, rng);

    // Maps each held key → the frame it was last seen (press or repeat).
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;
        let mut fire_pressed = false;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent { code, kind, modifiers, .. })) = rx.try_recv() {
            match kind {
                KeyEventKind::Press => {
                    let announcing = matches!(state.status, GameStatus::Announcing(_));
                    match classify_press(&mut key_frame, code, modifiers, announcing, frame) {
                        PressAction::Quit => return Ok(true),
                        PressAction::Menu => return Ok(false),
                        PressAction::Acknowledge => {
                            state = acknowledge(&state);
                            last_tick = Instant::now();
                        }
                        PressAction::Fire => fire_pressed = true,
                        PressAction::Ignore => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        // ── Advance the simulation ────────────────────────────────────────────
        if state.status == GameStatus::Playing {
            let left = is_held(&key_frame, &KeyCode::Left, frame)
                || is_held(&key_frame, &KeyCode::Char('a'), frame)
                || is_held(&key_frame, &KeyCode::Char('A'), frame);
            let right = is_held(&key_frame, &KeyCode::Right, frame)
                || is_held(&key_frame, &KeyCode::Char('d'), frame)
                || is_held(&key_frame, &KeyCode::Char('D'), frame);

            let input = InputState {
                left,
                right,
                fire_pressed,
            };
            let dt_ms = u64::try_from(last_tick.elapsed().as_millis())
                .unwrap_or(MAX_STEP_MS)
                .min(MAX_STEP_MS);
            last_tick = Instant::now();
            state = tick(&state, input, dt_ms, rng);
        }

        let (width, height) = terminal::size()?;
        display::render(out, &state, Viewport { width, height })?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.log_file.as_deref())
        .context("failed to open log file")?;

    let bank = match &args.questions {
        Some(path) => QuestionBank::load(path)
            .with_context(|| format!("loading questions from {}", path.display()))?,
        None => QuestionBank::embedded().context("loading built-in questions")?,
    };
    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GameConfig::default(),
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = run(&mut out, &rx, &bank, config, args.level, &mut rng);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result.context("terminal I/O failed")
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    bank: &QuestionBank,
    config: GameConfig,
    mut preset: Option<Level>,
    rng: &mut StdRng,
) -> std::io::Result<()> {
    loop {
        let level = match preset.take() {
            Some(level) => level,
            None => match show_menu(out, rx, bank, &config)? {
                MenuResult::Quit => break,
                MenuResult::Start(level) => level,
            },
        };
        if game_loop(out, bank, config, level, rng, rx)? {
            break;
        }
        // Otherwise loop back to the menu
    }
    Ok(())
}
