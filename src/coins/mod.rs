mod game;
#[cfg(test)]
mod tests;

pub use game::{
    collides, Ball, Coin, CoinGame, CoinGameState, GamePhase, BALL_RADIUS, BALL_SPEED,
    BALL_START_Y, COIN_MARGIN, COIN_RADIUS, COIN_SPAWN_INTERVAL, RESTART_DELAY,
};
