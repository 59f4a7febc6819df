use crate::coins::CoinGameState;
use crate::hands::{DetectedHand, HandSide, HAND_CONNECTIONS};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut,
    draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use std::fs;
use tracing::{debug, warn};

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
const CYAN: Rgb<u8> = Rgb([0, 255, 255]);
const GOLD: Rgb<u8> = Rgb([0, 215, 255]);

const JOINT_RADIUS: i32 = 3;

/// Draws hand skeletons, game elements and status text onto frames.
/// Text needs a TrueType font; without one only shapes are drawn.
pub struct OverlayRenderer {
    font: Option<Font<'static>>,
}

impl OverlayRenderer {
    /// Load the overlay font, warning once and drawing no text if it fails
    pub fn load(font_path: &str) -> Self {
        let font = match fs::read(font_path) {
            Ok(data) => match Font::try_from_vec(data) {
                Some(font) => {
                    debug!("Loaded overlay font {}", font_path);
                    Some(font)
                }
                None => {
                    warn!("Failed to parse font file '{}'; overlay text disabled", font_path);
                    None
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read font file '{}': {}; overlay text disabled",
                    font_path, e
                );
                None
            }
        };

        Self { font }
    }

    /// Renderer that draws shapes only
    pub fn without_text() -> Self {
        Self { font: None }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn text(&self, image: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: Rgb<u8>) {
        if let Some(font) = &self.font {
            draw_text_mut(image, color, x, y, Scale::uniform(size), font, text);
        }
    }

    fn text_width(&self, text: &str, size: f32) -> (i32, i32) {
        match &self.font {
            Some(font) => text_size(Scale::uniform(size), font, text),
            None => (0, 0),
        }
    }

    /// Skeleton, finger count near the wrist and, in piano mode, the side
    pub fn draw_hand(
        &self,
        image: &mut RgbImage,
        hand: &DetectedHand,
        finger_count: usize,
        side_label: Option<HandSide>,
    ) {
        let (width, height) = image.dimensions();
        let points = hand.pixel_points(width, height);

        for (a, b) in HAND_CONNECTIONS {
            draw_line_segment_mut(image, points[a], points[b], RED);
        }
        for &(x, y) in &points {
            draw_filled_circle_mut(image, (x as i32, y as i32), JOINT_RADIUS, GREEN);
        }

        let (cx, cy) = (points[0].0 as i32, points[0].1 as i32);
        if let Some(side) = side_label {
            let label = side.as_str().to_uppercase();
            self.text(image, &label, cx - 40, cy - 95, 38.0, CYAN);
        }
        self.text(
            image,
            &format!("{} fingers", finger_count),
            cx - 50,
            cy - 55,
            32.0,
            GREEN,
        );
    }

    /// Coins, ball and score box
    pub fn draw_coin_game(&self, image: &mut RgbImage, state: &CoinGameState) {
        for coin in &state.coins {
            let center = (coin.x as i32, coin.y as i32);
            let radius = coin.radius as i32;
            draw_filled_circle_mut(image, center, radius, YELLOW);
            for rim in 0..3 {
                draw_hollow_circle_mut(image, center, radius - rim, GOLD);
            }
        }

        let ball = &state.ball;
        let center = (ball.x as i32, ball.y as i32);
        let radius = ball.radius as i32;
        draw_filled_circle_mut(image, center, radius, BLACK);
        for rim in 0..2 {
            draw_hollow_circle_mut(image, center, radius - rim, WHITE);
        }

        self.draw_score(image, state.score);
    }

    fn draw_score(&self, image: &mut RgbImage, score: u32) {
        let text = format!("Score: {}", score);
        let (text_width, text_height) = self.text_width(&text, 38.0);
        let x = image.width() as i32 - text_width - 20;
        let y = 50 - text_height;

        draw_filled_rect_mut(
            image,
            Rect::at(x - 10, y - 10).of_size((text_width + 20).max(1) as u32, (text_height + 20).max(1) as u32),
            BLACK,
        );
        self.text(image, &text, x, y, 38.0, WHITE);
    }

    /// Centered restart countdown
    pub fn draw_game_over(&self, image: &mut RgbImage, countdown: u64) {
        let text = format!("GAME OVER - Restarting in {}s", countdown);
        let (text_width, text_height) = self.text_width(&text, 48.0);
        let x = (image.width() as i32 - text_width) / 2;
        let y = image.height() as i32 / 2 - text_height;

        draw_filled_rect_mut(
            image,
            Rect::at(x - 20, y - 20).of_size((text_width + 40).max(1) as u32, (text_height + 40).max(1) as u32),
            BLACK,
        );
        self.text(image, &text, x, y, 48.0, RED);
    }

    /// Finger and hand totals, shown when the coin game is off
    pub fn draw_totals(&self, image: &mut RgbImage, total_fingers: usize, hands: usize) {
        draw_filled_rect_mut(image, Rect::at(10, 10).of_size(390, 90), BLACK);
        self.text(
            image,
            &format!("Total fingers: {}", total_fingers),
            20,
            18,
            44.0,
            YELLOW,
        );
        self.text(image, &format!("Hands: {}", hands), 20, 62, 30.0, CYAN);
    }

    /// "Camera: i/n" in the bottom-left corner, with the switch hint when
    /// there is more than one camera
    pub fn draw_camera_status(&self, image: &mut RgbImage, current: usize, count: usize) {
        let bottom = image.height() as i32;
        let mut text = format!("Camera: {}/{}", current + 1, count);
        if count > 1 {
            text.push_str(" (d/a or arrows to switch)");
        }

        draw_filled_rect_mut(image, Rect::at(10, bottom - 80).of_size(390, 70), BLACK);
        self.text(image, &text, 15, bottom - 68, 20.0, WHITE);
    }

    pub fn draw_no_hands(&self, image: &mut RgbImage) {
        let bottom = image.height() as i32;
        self.text(image, "No hands detected", 10, bottom - 45, 32.0, RED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins::{Ball, Coin, CoinGameState, GamePhase};
    use crate::hands::fixtures::hand_with_fingers;
    use std::time::Instant;

    fn blank() -> RgbImage {
        RgbImage::from_pixel(320, 240, Rgb([128, 128, 128]))
    }

    #[test]
    fn test_missing_font_disables_text() {
        let renderer = OverlayRenderer::load("/nonexistent/font.ttf");
        assert!(!renderer.has_font());

        let mut image = blank();
        renderer.draw_no_hands(&mut image);
        assert_eq!(image, blank());
    }

    #[test]
    fn test_score_text_is_white() {
        let font_path = crate::config::FingerplayConfig::default().display.font_path;
        let renderer = OverlayRenderer::load(&font_path);
        if !renderer.has_font() {
            eprintln!("Skipping score colour check: overlay font not installed");
            return;
        }

        let mut image = blank();
        renderer.draw_score(&mut image, 12);

        let score_area: Vec<&Rgb<u8>> = (0..80)
            .flat_map(|y| (160..320).map(move |x| (x, y)))
            .map(|(x, y)| image.get_pixel(x, y))
            .collect();
        assert!(score_area.iter().all(|p| p[0] == p[1] && p[1] == p[2]));
        assert!(score_area.iter().any(|p| p[0] > 200));
    }

    #[test]
    fn test_draw_hand_marks_joints() {
        let renderer = OverlayRenderer::without_text();
        let hand = hand_with_fingers(HandSide::Right, [true; 5]);
        let mut image = blank();

        renderer.draw_hand(&mut image, &hand, 5, Some(HandSide::Right));

        let (x, y) = hand.landmarks[0].to_pixels(320, 240);
        assert_eq!(*image.get_pixel(x as u32, y as u32), GREEN);
    }

    #[test]
    fn test_draw_coin_game() {
        let renderer = OverlayRenderer::without_text();
        let state = CoinGameState {
            score: 2,
            coins: vec![Coin {
                x: 60.0,
                y: 60.0,
                radius: 25.0,
                collected: false,
            }],
            ball: Ball {
                x: 200.0,
                y: 150.0,
                vx: 3.0,
                vy: 3.0,
                radius: 20.0,
            },
            phase: GamePhase::Playing,
            last_spawn: Instant::now(),
        };
        let mut image = blank();

        renderer.draw_coin_game(&mut image, &state);

        assert_eq!(*image.get_pixel(60, 60), YELLOW);
        assert_eq!(*image.get_pixel(35, 60), GOLD);
        assert_eq!(*image.get_pixel(85, 60), GOLD);
        assert_eq!(*image.get_pixel(200, 150), BLACK);
        assert_eq!(GOLD, Rgb([0, 215, 255]));
    }

    #[test]
    fn test_status_panels_stay_in_bounds() {
        let renderer = OverlayRenderer::without_text();
        let mut image = blank();

        renderer.draw_totals(&mut image, 7, 2);
        renderer.draw_camera_status(&mut image, 0, 3);
        renderer.draw_game_over(&mut image, 4);

        assert_eq!(*image.get_pixel(20, 20), BLACK);
        assert_eq!(*image.get_pixel(20, 200), BLACK);
    }
}
