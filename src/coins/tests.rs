use super::*;
use crate::events::SessionEvent;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

const WIDTH: u32 = 960;
const HEIGHT: u32 = 720;

fn create_game(now: Instant) -> CoinGame<StdRng> {
    CoinGame::with_rng(WIDTH, HEIGHT, StdRng::seed_from_u64(7), now)
}

fn coin_at(x: f32, y: f32) -> Coin {
    Coin {
        x,
        y,
        radius: COIN_RADIUS,
        collected: false,
    }
}

#[test]
fn test_initial_state() {
    let start = Instant::now();
    let game = create_game(start);
    let state = game.state();

    assert_eq!(state.score, 0);
    assert!(state.coins.is_empty());
    assert_eq!(state.phase, GamePhase::Playing);
    assert_eq!((state.ball.x, state.ball.y), (480.0, 25.0));
    assert_eq!(state.ball.vx.abs(), 3.0);
    assert_eq!(state.ball.vy, 3.0);
    assert_eq!(state.ball.radius, 20.0);
}

#[test]
fn test_ball_moves_each_frame() {
    let start = Instant::now();
    let mut game = create_game(start);
    game.state_mut().ball.vx = 3.0;

    game.update(start);

    let ball = &game.state().ball;
    assert_eq!((ball.x, ball.y), (483.0, 28.0));
}

#[test]
fn test_ball_reflects_off_right_wall() {
    let start = Instant::now();
    let mut game = create_game(start);
    {
        let ball = &mut game.state_mut().ball;
        ball.x = 938.0;
        ball.vx = 3.0;
    }

    game.update(start);

    let ball = &game.state().ball;
    assert_eq!(ball.vx, -3.0);
    assert_eq!(ball.x, 940.0);
}

#[test]
fn test_ball_reflects_off_left_and_top_walls() {
    let start = Instant::now();
    let mut game = create_game(start);
    {
        let ball = &mut game.state_mut().ball;
        ball.x = 21.0;
        ball.y = 21.0;
        ball.vx = -3.0;
        ball.vy = -3.0;
    }

    game.update(start);

    let ball = &game.state().ball;
    assert_eq!((ball.vx, ball.vy), (3.0, 3.0));
    assert_eq!((ball.x, ball.y), (20.0, 20.0));
}

#[test]
fn test_ball_stays_inside_arena() {
    let start = Instant::now();
    let mut game = create_game(start);

    for _ in 0..2_000 {
        game.update(start);
        let ball = &game.state().ball;
        assert!(ball.x >= ball.radius && ball.x <= WIDTH as f32 - ball.radius);
        assert!(ball.y >= ball.radius && ball.y <= HEIGHT as f32 - ball.radius);
    }
}

#[test]
fn test_coin_spawns_after_interval() {
    let start = Instant::now();
    let mut game = create_game(start);

    assert!(game.update(start + Duration::from_secs(2)).is_empty());

    let later = start + Duration::from_millis(2_001);
    let events = game.update(later);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], SessionEvent::CoinSpawned { .. }));

    let coin = &game.state().coins[0];
    assert!(coin.x >= 30.0 && coin.x <= 930.0);
    assert!(coin.y >= 30.0 && coin.y <= 690.0);
    assert_eq!(coin.radius, 25.0);
    assert_eq!(game.state().last_spawn, later);
}

#[test]
fn test_reset_restarts_spawn_clock() {
    let start = Instant::now();
    let mut game = create_game(start);
    game.state_mut().score = 4;
    game.state_mut().coins.push(coin_at(100.0, 100.0));

    let resumed = start + Duration::from_secs(10);
    game.reset(resumed);

    let state = game.state();
    assert_eq!(state.score, 0);
    assert!(state.coins.is_empty());
    assert_eq!(state.phase, GamePhase::Playing);
    assert_eq!(state.last_spawn, resumed);
    assert_eq!((state.ball.x, state.ball.y), (480.0, 25.0));

    assert!(game.update(resumed + Duration::from_secs(1)).is_empty());
}

#[test]
fn test_collision_boundary_is_strict() {
    assert!(collides(124.9, 100.0, 100.0, 100.0, 25.0));
    assert!(!collides(125.0, 100.0, 100.0, 100.0, 25.0));
    assert!(!collides(100.0, 75.0, 100.0, 100.0, 25.0));
}

#[test]
fn test_point_collects_at_most_one_coin() {
    let start = Instant::now();
    let mut game = create_game(start);
    game.state_mut().coins = vec![coin_at(200.0, 200.0), coin_at(205.0, 200.0)];

    let events = game.register_contacts(&[(202.0, 200.0)], start);

    assert_eq!(events, vec![SessionEvent::CoinCollected { score: 1 }]);
    assert_eq!(game.state().coins, vec![coin_at(205.0, 200.0)]);
}

#[test]
fn test_collecting_is_idempotent() {
    let start = Instant::now();
    let mut game = create_game(start);
    game.state_mut().coins = vec![coin_at(300.0, 300.0)];

    let points = [(300.0, 300.0), (301.0, 301.0)];
    game.register_contacts(&points, start);
    game.register_contacts(&points, start);

    assert_eq!(game.state().score, 1);
    assert!(game.state().coins.is_empty());
}

#[test]
fn test_touching_ball_ends_game() {
    let start = Instant::now();
    let mut game = create_game(start);
    game.state_mut().coins = vec![coin_at(600.0, 600.0)];

    let (bx, by) = (game.state().ball.x, game.state().ball.y);
    let hit = start + Duration::from_millis(100);
    let events = game.register_contacts(&[(bx + 5.0, by), (600.0, 600.0)], hit);

    assert_eq!(events, vec![SessionEvent::GameOver { score: 0 }]);
    assert_eq!(game.state().phase, GamePhase::GameOver { since: hit });
    // Contacts after the game ended are ignored
    assert_eq!(game.state().coins.len(), 1);
    assert!(game.register_contacts(&[(600.0, 600.0)], hit).is_empty());
}

#[test]
fn test_game_over_freezes_updates() {
    let start = Instant::now();
    let mut game = create_game(start);
    let (bx, by) = (game.state().ball.x, game.state().ball.y);
    game.register_contacts(&[(bx, by)], start);

    let frozen = game.state().clone();
    assert!(game.update(start + Duration::from_secs(3)).is_empty());
    assert_eq!(game.state(), &frozen);
}

#[test]
fn test_restart_after_delay() {
    let start = Instant::now();
    let mut game = create_game(start);
    game.state_mut().score = 4;
    game.state_mut().coins = vec![coin_at(100.0, 100.0)];
    let (bx, by) = (game.state().ball.x, game.state().ball.y);

    let hit = start + Duration::from_secs(1);
    game.register_contacts(&[(bx, by)], hit);

    assert_eq!(game.countdown(hit), Some(5));
    assert_eq!(game.countdown(hit + Duration::from_millis(300)), Some(4));
    assert_eq!(game.countdown(hit + Duration::from_millis(4_999)), Some(0));

    assert!(game.update(hit + Duration::from_millis(4_999)).is_empty());
    assert!(game.is_over());

    let restart = hit + RESTART_DELAY;
    assert_eq!(game.update(restart), vec![SessionEvent::GameRestarted]);

    let state = game.state();
    assert_eq!(state.phase, GamePhase::Playing);
    assert_eq!(state.score, 0);
    assert!(state.coins.is_empty());
    assert_eq!((state.ball.x, state.ball.y), (480.0, 25.0));
    assert_eq!(state.last_spawn, restart);
    assert_eq!(game.countdown(restart), None);
}

#[test]
fn test_launch_direction_varies() {
    let start = Instant::now();
    let directions: Vec<f32> = (0..32)
        .map(|seed| {
            CoinGame::with_rng(WIDTH, HEIGHT, StdRng::seed_from_u64(seed), start)
                .state()
                .ball
                .vx
        })
        .collect();

    assert!(directions.contains(&3.0));
    assert!(directions.contains(&-3.0));
}
