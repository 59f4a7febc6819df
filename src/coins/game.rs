use crate::events::SessionEvent;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const COIN_RADIUS: f32 = 25.0;
pub const BALL_RADIUS: f32 = 20.0;
pub const BALL_SPEED: f32 = 3.0;
/// Distance from the arena edge kept free of coin centres
pub const COIN_MARGIN: u32 = 30;
/// Height of the ball centre at the start of a round
pub const BALL_START_Y: f32 = 25.0;
pub const COIN_SPAWN_INTERVAL: Duration = Duration::from_secs(2);
pub const RESTART_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub collected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    GameOver { since: Instant },
}

/// Everything one round of the coin game owns
#[derive(Debug, Clone, PartialEq)]
pub struct CoinGameState {
    pub score: u32,
    pub coins: Vec<Coin>,
    pub ball: Ball,
    pub phase: GamePhase,
    pub last_spawn: Instant,
}

/// Strict containment: a point exactly on the rim does not touch
pub fn collides(px: f32, py: f32, cx: f32, cy: f32, radius: f32) -> bool {
    let dx = px - cx;
    let dy = py - cy;
    (dx * dx + dy * dy).sqrt() < radius
}

/// Coin collection game with a bouncing ball that ends the round on contact.
/// Positions and velocities are in pixels of the `width` x `height` arena;
/// the ball moves a fixed step per frame.
pub struct CoinGame<R: Rng = StdRng> {
    width: f32,
    height: f32,
    rng: R,
    state: CoinGameState,
}

impl CoinGame<StdRng> {
    pub fn new(width: u32, height: u32, now: Instant) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy(), now)
    }
}

impl<R: Rng> CoinGame<R> {
    pub fn with_rng(width: u32, height: u32, mut rng: R, now: Instant) -> Self {
        let (width, height) = (width as f32, height as f32);
        let state = fresh_state(width, &mut rng, now);
        info!("Coin game started on a {}x{} arena", width, height);
        Self {
            width,
            height,
            rng,
            state,
        }
    }

    pub fn state(&self) -> &CoinGameState {
        &self.state
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state.phase, GamePhase::GameOver { .. })
    }

    /// Start a fresh round whose spawn clock begins at `now`
    pub fn reset(&mut self, now: Instant) {
        self.state = fresh_state(self.width, &mut self.rng, now);
        debug!("Coin game reset");
    }

    /// Advance one frame: restart after the game-over delay, otherwise move
    /// the ball and spawn a coin when the spawn interval has passed
    pub fn update(&mut self, now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if let GamePhase::GameOver { since } = self.state.phase {
            if now.saturating_duration_since(since) >= RESTART_DELAY {
                self.state = fresh_state(self.width, &mut self.rng, now);
                events.push(SessionEvent::GameRestarted);
            }
            return events;
        }

        self.step_ball();

        if now.saturating_duration_since(self.state.last_spawn) > COIN_SPAWN_INTERVAL {
            let coin = self.spawn_coin();
            events.push(SessionEvent::CoinSpawned {
                x: coin.x,
                y: coin.y,
            });
            self.state.coins.push(coin);
            self.state.last_spawn = now;
        }

        events
    }

    fn step_ball(&mut self) {
        let ball = &mut self.state.ball;
        ball.x += ball.vx;
        ball.y += ball.vy;

        if ball.x - ball.radius <= 0.0 {
            ball.vx = ball.vx.abs();
        } else if ball.x + ball.radius >= self.width {
            ball.vx = -ball.vx.abs();
        }
        ball.x = clamp_axis(ball.x, ball.radius, self.width);

        if ball.y - ball.radius <= 0.0 {
            ball.vy = ball.vy.abs();
        } else if ball.y + ball.radius >= self.height {
            ball.vy = -ball.vy.abs();
        }
        ball.y = clamp_axis(ball.y, ball.radius, self.height);
    }

    fn spawn_coin(&mut self) -> Coin {
        let max_x = (self.width as u32).saturating_sub(COIN_MARGIN).max(COIN_MARGIN);
        let max_y = (self.height as u32).saturating_sub(COIN_MARGIN).max(COIN_MARGIN);
        Coin {
            x: self.rng.gen_range(COIN_MARGIN..=max_x) as f32,
            y: self.rng.gen_range(COIN_MARGIN..=max_y) as f32,
            radius: COIN_RADIUS,
            collected: false,
        }
    }

    /// Test hand landmark positions against coins and the ball. Each point
    /// collects at most one coin, then ends the game if it touches the ball.
    /// Nothing happens once the game is over.
    pub fn register_contacts(&mut self, points: &[(f32, f32)], now: Instant) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        for &(px, py) in points {
            if self.is_over() {
                break;
            }

            let hit = self
                .state
                .coins
                .iter()
                .position(|coin| !coin.collected && collides(px, py, coin.x, coin.y, coin.radius));
            if let Some(index) = hit {
                self.state.coins.remove(index);
                self.state.score += 1;
                debug!("Coin collected, score {}", self.state.score);
                events.push(SessionEvent::CoinCollected {
                    score: self.state.score,
                });
            }

            let ball = &self.state.ball;
            if collides(px, py, ball.x.trunc(), ball.y.trunc(), ball.radius) {
                self.state.phase = GamePhase::GameOver { since: now };
                events.push(SessionEvent::GameOver {
                    score: self.state.score,
                });
            }
        }

        events
    }

    /// Whole seconds left before the restart, while the game is over
    pub fn countdown(&self, now: Instant) -> Option<u64> {
        match self.state.phase {
            GamePhase::Playing => None,
            GamePhase::GameOver { since } => {
                let remaining = RESTART_DELAY.saturating_sub(now.saturating_duration_since(since));
                Some(remaining.as_secs())
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut CoinGameState {
        &mut self.state
    }
}

fn fresh_state<R: Rng>(width: f32, rng: &mut R, now: Instant) -> CoinGameState {
    let vx = if rng.gen_bool(0.5) {
        BALL_SPEED
    } else {
        -BALL_SPEED
    };

    CoinGameState {
        score: 0,
        coins: Vec::new(),
        ball: Ball {
            x: (width / 2.0).floor(),
            y: BALL_START_Y,
            vx,
            vy: BALL_SPEED,
            radius: BALL_RADIUS,
        },
        phase: GamePhase::Playing,
        last_spawn: now,
    }
}

fn clamp_axis(value: f32, radius: f32, extent: f32) -> f32 {
    value.min(extent - radius).max(radius)
}
