use quiz_shooter::compute::*;
use quiz_shooter::config::{GameConfig, Level};
use quiz_shooter::entities::*;
use quiz_shooter::questions::QuestionBank;

use rand::rngs::StdRng;
use rand::SeedableRng;

const IDLE: InputState = InputState {
    left: false,
    right: false,
    fire_pressed: false,
};

fn make_bank(n: usize) -> QuestionBank {
    let questions = (0..n)
        .map(|i| Question {
            text: format!("Question {}", i),
            choices: vec![
                format!("right {}", i),
                format!("wrong {}a", i),
                format!("wrong {}b", i),
            ],
            answer: format!("right {}", i),
        })
        .collect();
    QuestionBank::new(questions).unwrap()
}

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn make_state(n: usize) -> QuizGameState {
    init_state(&make_bank(n), GameConfig::default(), Level::Medium, &mut seeded_rng())
}

/// Advance past the 2 s reveal delay so the answers are falling.
fn reveal(state: &QuizGameState, rng: &mut StdRng) -> QuizGameState {
    tick(state, IDLE, 2000, rng)
}

/// Drop a stationary projectile on the enemy carrying `answer` and run a
/// zero-length tick so the collision resolves.
fn shoot_answer(state: &QuizGameState, answer: &str, rng: &mut StdRng) -> QuizGameState {
    let enemy = state
        .enemies
        .iter()
        .find(|e| e.answer == answer)
        .expect("no enemy carries that answer");
    let mut s = state.clone();
    s.projectiles.push(Projectile {
        id: u64::MAX,
        x: enemy.x,
        y: enemy.y,
        vy: 0.0,
    });
    tick(&s, IDLE, 0, rng)
}

fn current_answer(state: &QuizGameState) -> String {
    state.current().unwrap().answer.clone()
}

fn wrong_answer(state: &QuizGameState) -> String {
    let answer = current_answer(state);
    state
        .enemies
        .iter()
        .map(|e| e.answer.clone())
        .find(|a| *a != answer)
        .unwrap()
}

// ── init_state ────────────────────────────────────────────────────────────────

#[test]
fn init_state_starts_fresh_session() {
    let s = make_state(5);
    assert_eq!(s.lives, 3);
    assert_eq!(s.correct_answers, 0);
    assert_eq!(s.win_target, 10);
    assert_eq!(s.current_question, 0);
    assert_eq!(s.session, 0);
    assert_eq!(s.status, GameStatus::Playing);
    assert_eq!(s.player.x, 400.0);
    assert_eq!(s.player.y, 550.0);
    assert!(s.enemies.is_empty());
    assert!(s.projectiles.is_empty());
}

#[test]
fn init_state_shows_first_question_immediately() {
    let s = make_state(5);
    assert_eq!(s.phase, WavePhase::QuestionShown);
    assert_eq!(s.question_text.as_deref(), Some(s.current().unwrap().text.as_str()));
    assert_eq!(s.timers.len(), 1);
    assert_eq!(s.timers[0].action, TimerAction::RevealAnswers);
    assert_eq!(s.timers[0].due_ms, 2000);
}

#[test]
fn init_state_shuffle_is_seed_deterministic() {
    let a = make_state(8);
    let b = make_state(8);
    let texts = |s: &QuizGameState| s.questions.iter().map(|q| q.text.clone()).collect::<Vec<_>>();
    assert_eq!(texts(&a), texts(&b));
    assert_eq!(a.questions.len(), 8);
}

// ── reveal timing ─────────────────────────────────────────────────────────────

#[test]
fn answers_do_not_appear_before_reveal_delay() {
    let mut rng = seeded_rng();
    let s = tick(&make_state(3), IDLE, 1999, &mut rng);
    assert!(s.enemies.is_empty());
    assert_eq!(s.phase, WavePhase::QuestionShown);
}

#[test]
fn answers_appear_after_reveal_delay() {
    let mut rng = seeded_rng();
    let s = reveal(&make_state(3), &mut rng);
    assert_eq!(s.enemies.len(), 3);
    assert_eq!(s.phase, WavePhase::AnswersActive);
    assert!(s.timers.is_empty());
}

// ── spawn_answers ─────────────────────────────────────────────────────────────

#[test]
fn answer_positions_are_evenly_spaced() {
    assert_eq!(answer_positions(800.0, 3), vec![200.0, 400.0, 600.0]);
    assert_eq!(answer_positions(800.0, 4), vec![160.0, 320.0, 480.0, 640.0]);
    assert!(answer_positions(800.0, 0).is_empty());
}

#[test]
fn spawn_answers_one_enemy_per_choice_with_label() {
    let bank = QuestionBank::new(vec![Question {
        text: "Capital of France?".into(),
        choices: vec!["Paris".into(), "Lyon".into(), "Nice".into(), "Lille".into()],
        answer: "Paris".into(),
    }])
    .unwrap();
    let mut rng = seeded_rng();
    let s = init_state(&bank, GameConfig::default(), Level::Medium, &mut rng);
    let s = spawn_answers(&s, &mut rng);

    assert_eq!(s.enemies.len(), 4);
    let mut xs: Vec<f32> = s.enemies.iter().map(|e| e.x).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(xs, vec![160.0, 320.0, 480.0, 640.0]);

    let mut answers: Vec<&str> = s.enemies.iter().map(|e| e.answer.as_str()).collect();
    answers.sort();
    assert_eq!(answers, vec!["Lille", "Lyon", "Nice", "Paris"]);

    for e in &s.enemies {
        assert_eq!(e.y, 200.0);
        assert_eq!(e.vy, 40.0);
        assert_eq!(e.label.text, e.answer);
        assert_eq!(e.label.x, e.x);
        assert_eq!(e.label.y, 150.0); // 50 above the enemy
    }
}

#[test]
fn spawn_answers_does_not_touch_question_bank() {
    let mut rng = seeded_rng();
    let s = make_state(1);
    let before = s.current().unwrap().choices.clone();
    let s2 = spawn_answers(&s, &mut rng);
    assert_eq!(s2.current().unwrap().choices, before);
}

#[test]
fn fall_speed_follows_level() {
    let mut rng = seeded_rng();
    let bank = make_bank(1);
    let easy = spawn_answers(&init_state(&bank, GameConfig::default(), Level::Easy, &mut rng), &mut rng);
    let hard = spawn_answers(&init_state(&bank, GameConfig::default(), Level::Hard, &mut rng), &mut rng);
    assert!(easy.enemies.iter().all(|e| e.vy == 30.0));
    assert!(hard.enemies.iter().all(|e| e.vy == 60.0));
}

// ── tick: enemies & labels ────────────────────────────────────────────────────

#[test]
fn tick_enemies_fall_and_labels_follow() {
    let mut rng = seeded_rng();
    let s = reveal(&make_state(3), &mut rng);
    // spawned at 200, then fell 40 units/s for 2 s in the same tick
    for e in &s.enemies {
        assert_eq!(e.y, 280.0);
        assert_eq!(e.label.x, e.x);
        assert_eq!(e.label.y, e.y - 50.0);
    }
    let s2 = tick(&s, IDLE, 500, &mut rng);
    for e in &s2.enemies {
        assert_eq!(e.y, 300.0);
        assert_eq!(e.label.y, 250.0);
    }
}

#[test]
fn tick_enemy_past_miss_line_costs_one_life() {
    let mut rng = seeded_rng();
    let s = reveal(&make_state(3), &mut rng);
    let s2 = tick(&s, IDLE, 8000, &mut rng); // 280 + 320 = 600 > 580
    assert_eq!(s2.lives, 2);
    assert!(s2.enemies.is_empty());
    assert_eq!(s2.phase, WavePhase::Transition);
}

#[test]
fn tick_enemy_on_miss_line_is_not_a_miss() {
    let mut rng = seeded_rng();
    let s = reveal(&make_state(3), &mut rng);
    let s2 = tick(&s, IDLE, 7500, &mut rng); // 280 + 300 = 580, not past it
    assert_eq!(s2.lives, 3);
    assert_eq!(s2.enemies.len(), 3);
}

#[test]
fn tick_is_frozen_while_announcing() {
    let mut rng = seeded_rng();
    let s = restart(&make_state(3), SessionEnd::GameOver, &mut rng);
    let s2 = tick(&s, IDLE, 5000, &mut rng);
    assert_eq!(s2.clock_ms, s.clock_ms);
    assert!(s2.enemies.is_empty());
    assert_eq!(s2.status, GameStatus::Announcing(SessionEnd::GameOver));
}

#[test]
fn acknowledge_resumes_play() {
    let mut rng = seeded_rng();
    let s = restart(&make_state(3), SessionEnd::Victory, &mut rng);
    let s = acknowledge(&s);
    assert_eq!(s.status, GameStatus::Playing);
    let s = reveal(&s, &mut rng);
    assert_eq!(s.enemies.len(), 3);
}

// ── player movement ───────────────────────────────────────────────────────────

#[test]
fn move_left_normal() {
    let s = make_state(1); // x=400
    let s2 = move_player_left(&s, 1000);
    assert_eq!(s2.player.x, 200.0);
    assert_eq!(s2.player.vx, -200.0);
}

#[test]
fn move_right_normal() {
    let s = make_state(1);
    let s2 = move_player_right(&s, 500);
    assert_eq!(s2.player.x, 500.0);
}

#[test]
fn move_left_clamps_at_world_edge() {
    let mut s = make_state(1);
    s.player.x = 20.0;
    let s2 = move_player_left(&s, 1000);
    assert_eq!(s2.player.x, 16.0); // half the ship width
}

#[test]
fn move_right_clamps_at_world_edge() {
    let mut s = make_state(1);
    s.player.x = 790.0;
    let s2 = move_player_right(&s, 1000);
    assert_eq!(s2.player.x, 784.0);
}

#[test]
fn move_does_not_mutate_original() {
    let s = make_state(1);
    let _s2 = move_player_left(&s, 100);
    let _s3 = move_player_right(&s, 100);
    assert_eq!(s.player.x, 400.0);
}

#[test]
fn tick_left_wins_when_both_held() {
    let mut rng = seeded_rng();
    let input = InputState {
        left: true,
        right: true,
        fire_pressed: false,
    };
    let s2 = tick(&make_state(1), input, 100, &mut rng);
    assert_eq!(s2.player.x, 380.0);
}

#[test]
fn tick_no_input_stops_player() {
    let mut rng = seeded_rng();
    let mut s = make_state(1);
    s.player.vx = 200.0;
    let s2 = tick(&s, IDLE, 100, &mut rng);
    assert_eq!(s2.player.x, 400.0);
    assert_eq!(s2.player.vx, 0.0);
}

// ── shooting ──────────────────────────────────────────────────────────────────

#[test]
fn shoot_adds_projectile_above_player() {
    let s = make_state(1);
    let s2 = player_shoot(&s);
    assert_eq!(s2.projectiles.len(), 1);
    let p = &s2.projectiles[0];
    assert_eq!(p.x, 400.0);
    assert_eq!(p.y, 530.0);
    assert_eq!(p.vy, -400.0);
}

#[test]
fn shoot_does_not_mutate_original() {
    let s = make_state(1);
    let _ = player_shoot(&s);
    assert!(s.projectiles.is_empty());
}

#[test]
fn tick_fire_press_spawns_and_moves_projectile() {
    let mut rng = seeded_rng();
    let input = InputState {
        left: false,
        right: false,
        fire_pressed: true,
    };
    let s2 = tick(&make_state(1), input, 100, &mut rng);
    assert_eq!(s2.projectiles.len(), 1);
    assert_eq!(s2.projectiles[0].y, 490.0);

    // Without a fresh press nothing new is fired
    let s3 = tick(&s2, IDLE, 100, &mut rng);
    assert_eq!(s3.projectiles.len(), 1);
    assert_eq!(s3.projectiles[0].y, 450.0);
}

#[test]
fn tick_projectile_discarded_above_world() {
    let mut rng = seeded_rng();
    let mut s = make_state(1);
    s.projectiles.push(Projectile { id: 90, x: 100.0, y: 5.0, vy: -400.0 });
    s.projectiles.push(Projectile { id: 91, x: 100.0, y: 100.0, vy: -400.0 });
    let s2 = tick(&s, IDLE, 100, &mut rng);
    assert_eq!(s2.projectiles.len(), 1);
    assert_eq!(s2.projectiles[0].id, 91);
}

#[test]
fn tick_projectile_kept_when_despawn_disabled() {
    let mut rng = seeded_rng();
    let config = GameConfig {
        despawn_offscreen_projectiles: false,
        ..GameConfig::default()
    };
    let mut s = init_state(&make_bank(1), config, Level::Medium, &mut rng);
    s.projectiles.push(Projectile { id: 90, x: 100.0, y: 5.0, vy: -400.0 });
    let s2 = tick(&s, IDLE, 100, &mut rng);
    assert_eq!(s2.projectiles.len(), 1);
    assert_eq!(s2.projectiles[0].y, -35.0);
}

// ── check_answer ──────────────────────────────────────────────────────────────

#[test]
fn correct_hit_scores_and_transitions() {
    let mut rng = seeded_rng();
    let s = reveal(&make_state(3), &mut rng);
    let answer = current_answer(&s);
    let s2 = shoot_answer(&s, &answer, &mut rng);

    assert_eq!(s2.correct_answers, 1);
    assert_eq!(s2.lives, 3);
    assert!(s2.projectiles.is_empty());
    assert!(s2.enemies.is_empty());
    assert_eq!(s2.phase, WavePhase::Transition);
    assert_eq!(s2.timers.len(), 1);
    assert_eq!(s2.timers[0].action, TimerAction::NextQuestion);
    assert_eq!(s2.timers[0].due_ms, s2.clock_ms + 1000);
}

#[test]
fn wrong_hit_costs_life_and_transitions() {
    let mut rng = seeded_rng();
    let s = reveal(&make_state(3), &mut rng);
    let wrong = wrong_answer(&s);
    let s2 = shoot_answer(&s, &wrong, &mut rng);

    assert_eq!(s2.correct_answers, 0);
    assert_eq!(s2.lives, 2);
    assert!(s2.projectiles.is_empty());
    assert!(s2.enemies.is_empty());
    assert_eq!(s2.phase, WavePhase::Transition);
}

#[test]
fn answer_match_is_exact() {
    let bank = QuestionBank::new(vec![Question {
        text: "Capital of France?".into(),
        choices: vec!["Paris".into(), "paris".into()],
        answer: "Paris".into(),
    }])
    .unwrap();
    let mut rng = seeded_rng();
    let s = init_state(&bank, GameConfig::default(), Level::Medium, &mut rng);
    let s = reveal(&s, &mut rng);
    let s2 = shoot_answer(&s, "paris", &mut rng);
    assert_eq!(s2.lives, 2);
    assert_eq!(s2.correct_answers, 0);
}

#[test]
fn check_answer_with_unknown_enemy_only_removes_projectile() {
    let mut rng = seeded_rng();
    let mut s = reveal(&make_state(3), &mut rng);
    s.projectiles.push(Projectile { id: 77, x: 0.0, y: 0.0, vy: 0.0 });
    let s2 = check_answer(&s, 77, 12345, &mut rng);
    assert!(s2.projectiles.is_empty());
    assert_eq!(s2.enemies.len(), 3);
    assert_eq!(s2.lives, 3);
}

#[test]
fn collisions_ignored_outside_answer_phase() {
    let mut rng = seeded_rng();
    let mut s = reveal(&make_state(3), &mut rng);
    s.phase = WavePhase::Transition;
    let answer = current_answer(&s);
    let s2 = shoot_answer(&s, &answer, &mut rng);
    assert_eq!(s2.correct_answers, 0);
    assert_eq!(s2.projectiles.len(), 1);
}

#[test]
fn victory_regardless_of_lives() {
    let mut rng = seeded_rng();
    let mut s = reveal(&make_state(3), &mut rng);
    s.lives = 1;
    s.correct_answers = 9;
    let answer = current_answer(&s);
    let s2 = shoot_answer(&s, &answer, &mut rng);
    assert_eq!(s2.status, GameStatus::Announcing(SessionEnd::Victory));
    assert_eq!(s2.lives, 3);
    assert_eq!(s2.correct_answers, 0);
}

#[test]
fn configured_win_target_is_honoured() {
    let mut rng = seeded_rng();
    let config = GameConfig {
        win_target: 1,
        ..GameConfig::default()
    };
    let s = init_state(&make_bank(3), config, Level::Medium, &mut rng);
    let s = reveal(&s, &mut rng);
    let answer = current_answer(&s);
    let s2 = shoot_answer(&s, &answer, &mut rng);
    assert_eq!(s2.status, GameStatus::Announcing(SessionEnd::Victory));
}

// ── lose_life ─────────────────────────────────────────────────────────────────

#[test]
fn lose_life_without_enemy() {
    let mut rng = seeded_rng();
    let s = make_state(3);
    let s2 = lose_life(&s, None, &mut rng);
    assert_eq!(s2.lives, 2);
    assert_eq!(s2.phase, WavePhase::Transition);
}

#[test]
fn lose_last_life_is_game_over() {
    let mut rng = seeded_rng();
    let mut s = make_state(3);
    s.lives = 1;
    s.correct_answers = 7;
    let s2 = lose_life(&s, None, &mut rng);
    assert_eq!(s2.status, GameStatus::Announcing(SessionEnd::GameOver));
    assert_eq!(s2.lives, 3);
    assert_eq!(s2.correct_answers, 0);
    assert_eq!(s2.session, 1);
}

// ── wave_transition & timers ──────────────────────────────────────────────────

#[test]
fn next_question_after_transition_delay() {
    let mut rng = seeded_rng();
    let s = reveal(&make_state(3), &mut rng);
    let s = wave_transition(&s);
    assert!(s.enemies.is_empty());

    let early = tick(&s, IDLE, 999, &mut rng);
    assert_eq!(early.current_question, 0);
    assert_eq!(early.phase, WavePhase::Transition);

    let s2 = tick(&s, IDLE, 1000, &mut rng);
    assert_eq!(s2.current_question, 1);
    assert_eq!(s2.phase, WavePhase::QuestionShown);
    assert_eq!(s2.question_text.as_deref(), Some(s2.questions[1].text.as_str()));
}

#[test]
fn stale_session_timer_is_ignored() {
    let mut rng = seeded_rng();
    let mut s = make_state(3);
    // Pretend a restart happened after the reveal timer was scheduled
    s.session = 1;
    let s2 = tick(&s, IDLE, 2000, &mut rng);
    assert!(s2.enemies.is_empty());
    assert!(s2.timers.is_empty());
    assert_eq!(s2.phase, WavePhase::QuestionShown);
}

#[test]
fn restart_drops_pending_timers() {
    let mut rng = seeded_rng();
    let s = wave_transition(&reveal(&make_state(3), &mut rng));
    let s2 = restart(&s, SessionEnd::GameOver, &mut rng);
    assert_eq!(s2.session, 1);
    assert_eq!(s2.timers.len(), 1);
    assert!(s2.timers.iter().all(|t| t.session == 1));
    assert_eq!(s2.timers[0].action, TimerAction::RevealAnswers);
}

#[test]
fn fire_timer_unknown_id_is_noop() {
    let mut rng = seeded_rng();
    let s = make_state(3);
    let s2 = fire_timer(&s, 9999, &mut rng);
    assert_eq!(s2.timers, s.timers);
    assert_eq!(s2.phase, s.phase);
}

// ── full-session scenarios ────────────────────────────────────────────────────

#[test]
fn ten_correct_answers_win_and_reset() {
    let mut rng = seeded_rng();
    let mut s = make_state(10);

    for i in 0..10u32 {
        s = reveal(&s, &mut rng);
        assert_eq!(s.phase, WavePhase::AnswersActive);
        let answer = current_answer(&s);
        s = shoot_answer(&s, &answer, &mut rng);
        if i < 9 {
            assert_eq!(s.correct_answers, i + 1);
            s = tick(&s, IDLE, 1000, &mut rng);
            assert_eq!(s.current_question, (i + 1) as usize);
        }
    }

    assert_eq!(s.status, GameStatus::Announcing(SessionEnd::Victory));
    assert_eq!(s.lives, 3);
    assert_eq!(s.correct_answers, 0);
    assert_eq!(s.current_question, 0);
    assert_eq!(s.session, 1);
}

#[test]
fn three_misses_end_the_game() {
    let mut rng = seeded_rng();
    let mut s = make_state(10);

    for expected_lives in [2, 1] {
        s = reveal(&s, &mut rng);
        s = tick(&s, IDLE, 8000, &mut rng);
        assert_eq!(s.lives, expected_lives);
        assert_eq!(s.status, GameStatus::Playing);
        s = tick(&s, IDLE, 1000, &mut rng);
    }

    s = reveal(&s, &mut rng);
    s = tick(&s, IDLE, 8000, &mut rng);
    assert_eq!(s.status, GameStatus::Announcing(SessionEnd::GameOver));
    assert_eq!(s.lives, 3);
    assert_eq!(s.correct_answers, 0);
    assert_eq!(s.current_question, 0);
}

#[test]
fn running_out_of_questions_resets() {
    let mut rng = seeded_rng();
    let mut s = make_state(2);

    for _ in 0..2 {
        s = reveal(&s, &mut rng);
        let answer = current_answer(&s);
        s = shoot_answer(&s, &answer, &mut rng);
        assert_eq!(s.status, GameStatus::Playing);
        s = tick(&s, IDLE, 1000, &mut rng);
    }

    assert_eq!(s.status, GameStatus::Announcing(SessionEnd::NoMoreQuestions));
    assert_eq!(s.lives, 3);
    assert_eq!(s.correct_answers, 0);
    assert_eq!(s.current_question, 0);
    assert_eq!(s.questions.len(), 2);
}

#[test]
fn correct_answers_never_decrease_within_session() {
    let mut rng = seeded_rng();
    let mut s = make_state(6);
    let mut last = 0;

    for round in 0..6 {
        s = reveal(&s, &mut rng);
        let pick = if round % 2 == 0 { current_answer(&s) } else { wrong_answer(&s) };
        s = shoot_answer(&s, &pick, &mut rng);
        if s.session != 0 {
            break;
        }
        assert!(s.correct_answers >= last);
        last = s.correct_answers;
        s = tick(&s, IDLE, 1000, &mut rng);
    }
    assert_eq!(last, 3);
}
