use rand::rngs::StdRng;
use rand::SeedableRng;

use sysoverride::challenge::{ChallengeKind, ChallengePayload};
use sysoverride::events::GameEvent;
use sysoverride::game::Game;
use sysoverride::mechanics::ChallengePhase;
use sysoverride::mission::{DifficultyTier, LanguageMode};

/// Integration tests for whole-mission workflows: challenge
/// interleaving, pause semantics, breach accumulation, and the
/// terminal transitions.

fn seeded_game(seed: u64) -> Game {
    let mut game = Game::with_rng(
        LanguageMode::Code,
        DifficultyTier::Medium,
        StdRng::seed_from_u64(seed),
    );
    game.start();
    game
}

fn type_current_phrase(game: &mut Game) {
    let phrase = game.typing.target.clone();
    for c in phrase.chars() {
        game.on_char(c);
    }
}

#[test]
fn mission_success_end_to_end() {
    let mut game = seeded_game(21);
    let rx = game.subscribe();

    // 20 phrases at +5 each fill the meter without any challenge help
    for _ in 0..20 {
        assert!(game.is_running());
        type_current_phrase(&mut game);
    }

    assert!(game.mission.complete);
    assert_eq!(game.mission.progress, 100);
    assert!(!game.is_running());

    let events: Vec<GameEvent> = rx.try_iter().collect();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::MissionComplete { .. })));

    // All four informational windows unlocked on the way up
    let unlocks = events
        .iter()
        .filter(|e| matches!(e, GameEvent::WindowUnlocked { .. }))
        .count();
    assert_eq!(unlocks, 4);
}

#[test]
fn mission_failure_by_breaches_end_to_end() {
    let mut game = seeded_game(22);
    let rx = game.subscribe();

    // Fail three breach-penalized challenges in a row
    for expected_count in 1..=3u8 {
        game.open_challenge(ChallengeKind::Intrusion);
        game.on_char('x');
        game.submit_challenge();
        assert_eq!(game.mechanics.breaches, expected_count);
    }

    assert!(game.mechanics.game_over);
    assert!(!game.is_running());

    let events: Vec<GameEvent> = rx.try_iter().collect();
    assert!(events.contains(&GameEvent::GameOver));
    assert!(events.contains(&GameEvent::SecurityBreach { count: 3 }));

    // Terminal until explicit reset: typing does nothing now
    type_current_phrase(&mut game);
    assert_eq!(game.mission.progress, 0);

    // Retry clears the slate
    game.retry();
    assert!(game.is_running());
    assert_eq!(game.mechanics.breaches, 0);
    type_current_phrase(&mut game);
    assert_eq!(game.mission.progress, 5);
}

#[test]
fn challenge_rewards_feed_the_progress_meter() {
    let mut game = seeded_game(23);

    // Get the bruteforce password and answer it exactly
    game.open_challenge(ChallengeKind::Bruteforce);
    let password = {
        let active = game.mechanics.active.as_ref().unwrap();
        match &active.challenge.payload {
            ChallengePayload::Bruteforce { password } => password.clone(),
            _ => unreachable!(),
        }
    };
    for c in password.chars() {
        game.on_char(c);
    }
    game.submit_challenge();
    assert_eq!(game.mission.progress, 10);

    // A wrong bruteforce answer forfeits the reward, nothing else
    game.open_challenge(ChallengeKind::Bruteforce);
    game.on_char('?');
    game.submit_challenge();
    assert_eq!(game.mission.progress, 10);
    assert_eq!(game.mechanics.breaches, 0);
}

#[test]
fn portscan_memorize_then_recall_exact_match() {
    let mut game = seeded_game(24);

    game.open_challenge(ChallengeKind::Portscan);
    let target = {
        let active = game.mechanics.active.as_ref().unwrap();
        assert_eq!(active.phase, ChallengePhase::Memorize);
        match &active.challenge.payload {
            ChallengePayload::Portscan { ip, port } => format!("{ip}:{port}"),
            _ => unreachable!(),
        }
    };

    // Let the memorize window lapse
    for _ in 0..8 {
        game.on_tick(1_000);
    }
    assert_eq!(
        game.mechanics.active.as_ref().unwrap().phase,
        ChallengePhase::Recall
    );

    for c in target.chars() {
        game.on_char(c);
    }
    game.submit_challenge();

    assert!(game.mechanics.active.is_none());
    assert_eq!(game.mission.progress, 8);
}

#[test]
fn pause_suspends_mission_clock_challenge_and_patch() {
    let mut game = seeded_game(25);

    // Stall into a running patch
    let first = game.typing.target.chars().next().unwrap();
    game.on_char(first);
    game.on_tick(6_000);
    assert!(game.typing.patch.is_some());
    let patch_before = game.typing.patch.unwrap();

    game.toggle_pause();
    let clock_before = game.seconds_remaining;
    let elapsed_before = game.typing.elapsed_ms;

    // A minute of wall time passes; nothing logical moves
    for _ in 0..600 {
        game.on_tick(100);
    }

    assert_eq!(game.seconds_remaining, clock_before);
    assert_eq!(game.typing.elapsed_ms, elapsed_before);
    assert_eq!(game.typing.patch.unwrap(), patch_before);

    // No new challenge can start while paused
    game.open_challenge(ChallengeKind::Firewall);
    assert!(game.mechanics.active.is_none());

    game.toggle_pause();
    game.on_tick(1_000);
    assert_eq!(game.seconds_remaining, clock_before - 1);
}

#[test]
fn abort_then_new_mission_sees_no_stale_timers() {
    let mut game = seeded_game(26);
    game.open_challenge(ChallengeKind::Virus);
    game.on_tick(3_000);
    game.abort();

    // Fresh mission on the same Game value
    game.retry();
    assert!(game.mechanics.active.is_none());
    assert_eq!(game.seconds_remaining, 180);

    // Time moves the new mission only
    game.on_tick(5_000);
    assert_eq!(game.seconds_remaining, 175);
    assert!(game.mechanics.active.is_none());
}

#[test]
fn error_state_keeps_buffer_until_corrected() {
    let mut game = seeded_game(27);
    let phrase = game.typing.target.clone();
    let first = phrase.chars().next().unwrap();

    game.on_char(first);
    game.on_char('\u{00a7}'); // never appears in the code bank
    assert!(!game.typing.correct);
    assert_eq!(game.typing.buffer.chars().count(), 2);

    game.on_backspace();
    assert!(game.typing.correct);
    assert_eq!(game.typing.buffer.chars().count(), 1);
}

#[test]
fn wpm_formula_holds_through_the_public_surface() {
    let mut game = seeded_game(28);

    // 25 chars over 30 seconds: (25/5) / 0.5min = 10 wpm
    for _ in 0..5 {
        for c in ['a', 'b', 'c', 'd', 'e'] {
            game.on_char(c);
            game.on_backspace();
        }
    }
    game.typing.elapsed_ms = 30_000;
    game.on_char('z');
    game.on_backspace();

    // 26 chars, 30s: round(5.2 / 0.5) = 10
    assert_eq!(game.mission.typing_speed, 10);
}
