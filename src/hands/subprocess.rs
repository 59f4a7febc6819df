use super::detector::HandDetector;
use super::landmarks::{DetectedHand, HandSide, Landmark, LANDMARK_COUNT};
use crate::config::InferenceConfig;
use crate::error::InferenceError;
use image::RgbImage;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, info, warn};

const READY_LINE: &str = "READY";

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    handedness: String,
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionResponse {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Hand detector backed by a MediaPipe helper process.
///
/// Each frame is written to the helper's stdin as three little-endian `u32`
/// values (width, height, channels) followed by the raw RGB bytes. The helper
/// answers with one JSON line `{"hands": [...], "error": null}`. On startup
/// it prints `READY` once the model is loaded.
pub struct SubprocessDetector {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    min_confidence: f32,
    max_hands: usize,
}

impl SubprocessDetector {
    pub fn spawn(config: &InferenceConfig) -> Result<Self, InferenceError> {
        info!(
            "Starting hand detector helper: {} {} (gpu: {})",
            config.python, config.script, config.gpu_mode
        );

        let mut command = Command::new(&config.python);
        command
            .arg(&config.script)
            .arg("--max-hands")
            .arg(config.max_hands.to_string())
            .arg("--min-confidence")
            .arg(config.min_confidence.to_string());
        if config.gpu_mode {
            command.arg("--gpu");
        }

        let mut process = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| InferenceError::Startup {
                details: format!("failed to launch {}: {}", config.python, e),
            })?;

        let pipes = process.stdin.take().zip(process.stdout.take());
        let (stdin, stdout) = match pipes {
            Some(pipes) => pipes,
            None => {
                let _ = process.kill();
                return Err(InferenceError::Startup {
                    details: "helper pipes unavailable".to_string(),
                });
            }
        };

        let mut detector = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            min_confidence: config.min_confidence,
            max_hands: config.max_hands as usize,
        };

        let ready = detector.read_line().map_err(|e| InferenceError::Startup {
            details: format!("helper did not start: {}", e),
        })?;
        if ready.trim() != READY_LINE {
            return Err(InferenceError::Startup {
                details: format!("helper did not signal ready, got: {}", ready.trim()),
            });
        }

        info!("Hand detector helper ready");
        Ok(detector)
    }

    fn read_line(&mut self) -> Result<String, InferenceError> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line)?;
        if read == 0 {
            return Err(InferenceError::Protocol {
                details: "helper closed its output".to_string(),
            });
        }
        Ok(line)
    }

    fn send_frame(&mut self, frame: &RgbImage) -> Result<(), InferenceError> {
        let (width, height) = frame.dimensions();
        self.stdin.write_all(&width.to_le_bytes())?;
        self.stdin.write_all(&height.to_le_bytes())?;
        self.stdin.write_all(&3u32.to_le_bytes())?;
        self.stdin.write_all(frame.as_raw())?;
        self.stdin.flush()?;
        Ok(())
    }
}

impl HandDetector for SubprocessDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<DetectedHand>, InferenceError> {
        self.send_frame(frame)?;
        let line = self.read_line()?;
        parse_response(&line, self.min_confidence, self.max_hands)
    }
}

impl Drop for SubprocessDetector {
    fn drop(&mut self) {
        if let Err(e) = self.process.kill() {
            debug!("Hand detector helper already exited: {}", e);
        }
        let _ = self.process.wait();
    }
}

/// Decode one helper response line into detected hands
pub(crate) fn parse_response(
    line: &str,
    min_confidence: f32,
    max_hands: usize,
) -> Result<Vec<DetectedHand>, InferenceError> {
    let response: DetectionResponse = serde_json::from_str(line.trim())?;

    if let Some(error) = response.error {
        return Err(InferenceError::Remote(error));
    }

    let mut hands = Vec::with_capacity(response.hands.len());
    for hand in response.hands {
        if hand.score < min_confidence {
            continue;
        }

        let Some(label) = HandSide::from_label(&hand.handedness) else {
            warn!("Ignoring hand with unknown handedness '{}'", hand.handedness);
            continue;
        };

        if hand.landmarks.len() != LANDMARK_COUNT {
            warn!(
                "Expected {} landmarks, got {}",
                LANDMARK_COUNT,
                hand.landmarks.len()
            );
            continue;
        }

        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (slot, lm) in landmarks.iter_mut().zip(&hand.landmarks) {
            *slot = Landmark {
                x: lm.x,
                y: lm.y,
                z: lm.z,
            };
        }

        hands.push(DetectedHand {
            landmarks,
            label,
            score: hand.score,
        });

        if max_hands > 0 && hands.len() == max_hands {
            break;
        }
    }

    Ok(hands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_json(handedness: &str, score: f32, landmark_count: usize) -> String {
        let landmarks: Vec<String> = (0..landmark_count)
            .map(|i| format!("{{\"x\":{},\"y\":0.5,\"z\":0.0}}", i as f32 / 40.0))
            .collect();
        format!(
            "{{\"handedness\":\"{}\",\"score\":{},\"landmarks\":[{}]}}",
            handedness,
            score,
            landmarks.join(",")
        )
    }

    #[test]
    fn test_parse_response_keeps_confident_hands() {
        let line = format!(
            "{{\"hands\":[{},{}]}}\n",
            hand_json("Left", 0.9, 21),
            hand_json("Right", 0.2, 21)
        );

        let hands = parse_response(&line, 0.5, 2).unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].label, HandSide::Left);
        assert_eq!(hands[0].landmarks[4].x, 0.1);
    }

    #[test]
    fn test_parse_response_skips_malformed_hands() {
        let line = format!(
            "{{\"hands\":[{},{}]}}",
            hand_json("Right", 0.9, 5),
            hand_json("Ambidextrous", 0.9, 21)
        );

        assert!(parse_response(&line, 0.5, 2).unwrap().is_empty());
    }

    #[test]
    fn test_parse_response_respects_max_hands() {
        let line = format!(
            "{{\"hands\":[{},{},{}]}}",
            hand_json("Right", 0.9, 21),
            hand_json("Left", 0.9, 21),
            hand_json("Right", 0.9, 21)
        );

        assert_eq!(parse_response(&line, 0.5, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_response_reports_helper_error() {
        let result = parse_response("{\"hands\":[],\"error\":\"bad frame\"}", 0.5, 2);
        assert!(matches!(result, Err(InferenceError::Remote(msg)) if msg == "bad frame"));
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        assert!(matches!(
            parse_response("not json", 0.5, 2),
            Err(InferenceError::Json(_))
        ));
    }

    #[test]
    fn test_spawn_missing_interpreter() {
        let config = InferenceConfig {
            python: "/nonexistent/fingerplay-python".to_string(),
            ..InferenceConfig::default()
        };

        assert!(matches!(
            SubprocessDetector::spawn(&config),
            Err(InferenceError::Startup { .. })
        ));
    }

    #[cfg(unix)]
    fn shell_helper(dir: &tempfile::TempDir, body: &str) -> InferenceConfig {
        let path = dir.path().join("helper.sh");
        std::fs::write(&path, body).unwrap();
        InferenceConfig {
            python: "sh".to_string(),
            script: path.to_string_lossy().into_owned(),
            min_confidence: 0.5,
            max_hands: 2,
            ..InferenceConfig::default()
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_handshake_and_detect_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let response = format!("{{\"hands\":[{}],\"error\":null}}", hand_json("Left", 0.9, 21));
        // A 4x2 frame is a 12 byte header plus 24 bytes of RGB
        let script = format!(
            "[ \"$*\" = \"--max-hands 2 --min-confidence 0.5 --gpu\" ] || exit 3\n\
             echo READY\n\
             head -c 36 > /dev/null\n\
             printf '%s\\n' '{}'\n\
             cat > /dev/null\n",
            response
        );
        let mut config = shell_helper(&dir, &script);
        config.gpu_mode = true;

        let mut detector = SubprocessDetector::spawn(&config).unwrap();
        let hands = detector.detect(&RgbImage::new(4, 2)).unwrap();

        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].label, HandSide::Left);
        assert_eq!(hands[0].landmarks[4].x, 0.1);
        assert_eq!(hands[0].score, 0.9);
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_rejects_helper_without_ready() {
        let dir = tempfile::TempDir::new().unwrap();

        let config = shell_helper(&dir, "echo LOADING\ncat > /dev/null\n");
        assert!(matches!(
            SubprocessDetector::spawn(&config),
            Err(InferenceError::Startup { details }) if details.contains("LOADING")
        ));

        let config = shell_helper(&dir, "exit 1\n");
        assert!(matches!(
            SubprocessDetector::spawn(&config),
            Err(InferenceError::Startup { .. })
        ));
    }

    #[test]
    fn test_default_script_is_shipped() {
        let script = InferenceConfig::default().script;
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(&script);
        let source = std::fs::read_to_string(path).unwrap();

        assert!(source.contains("READY"));
        assert!(source.contains("--max-hands"));
        assert!(source.contains("--min-confidence"));
        assert!(source.contains("--gpu"));
    }
}
