use super::landmarks::DetectedHand;
use crate::config::InferenceConfig;
use crate::error::InferenceError;
use image::RgbImage;
use std::collections::VecDeque;
use tracing::{info, warn};

/// Finds hands and their landmarks in a frame
pub trait HandDetector: Send {
    /// Detect hands in an RGB frame. Calls may be slow; there is no timeout.
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<DetectedHand>, InferenceError>;
}

/// Start a detector with the configured settings, retrying once with default
/// settings if that fails. The helper interpreter and script are kept for
/// the retry since they locate the helper rather than tune it.
pub fn initialize_detector<F>(
    config: &InferenceConfig,
    mut factory: F,
) -> Result<Box<dyn HandDetector>, InferenceError>
where
    F: FnMut(&InferenceConfig) -> Result<Box<dyn HandDetector>, InferenceError>,
{
    match factory(config) {
        Ok(detector) => Ok(detector),
        Err(e) => {
            warn!("Hand detector failed to start ({}), retrying with defaults", e);

            let fallback = InferenceConfig {
                python: config.python.clone(),
                script: config.script.clone(),
                ..InferenceConfig::default()
            };

            let detector = factory(&fallback)?;
            info!("Hand detector started with default settings");
            Ok(detector)
        }
    }
}

/// Detector that replays queued results, for tests and demos
#[derive(Default)]
pub struct ScriptedDetector {
    script: VecDeque<Result<Vec<DetectedHand>, InferenceError>>,
    repeat_last: Option<Vec<DetectedHand>>,
    calls: usize,
}

impl ScriptedDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the hands returned for one frame
    pub fn push_frame(&mut self, hands: Vec<DetectedHand>) -> &mut Self {
        self.script.push_back(Ok(hands));
        self
    }

    /// Queue a per-frame inference failure
    pub fn push_error<S: Into<String>>(&mut self, message: S) -> &mut Self {
        self.script
            .push_back(Err(InferenceError::Remote(message.into())));
        self
    }

    /// Once the queue is empty keep returning these hands instead of none
    pub fn repeat(&mut self, hands: Vec<DetectedHand>) -> &mut Self {
        self.repeat_last = Some(hands);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl HandDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<DetectedHand>, InferenceError> {
        self.calls += 1;
        match self.script.pop_front() {
            Some(result) => result,
            None => Ok(self.repeat_last.clone().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hands::fixtures::hand_with_fingers;
    use crate::hands::HandSide;

    #[test]
    fn test_scripted_detector_replays_in_order() {
        let mut detector = ScriptedDetector::new();
        detector
            .push_frame(vec![hand_with_fingers(HandSide::Left, [true; 5])])
            .push_error("model crashed")
            .push_frame(Vec::new());

        let frame = RgbImage::new(4, 4);
        assert_eq!(detector.detect(&frame).unwrap().len(), 1);
        assert!(matches!(
            detector.detect(&frame),
            Err(InferenceError::Remote(_))
        ));
        assert!(detector.detect(&frame).unwrap().is_empty());
        assert!(detector.detect(&frame).unwrap().is_empty());
        assert_eq!(detector.calls(), 4);
    }

    #[test]
    fn test_initialize_detector_retries_with_defaults() {
        let config = InferenceConfig {
            gpu_mode: true,
            max_hands: 4,
            python: "/opt/venv/bin/python".to_string(),
            ..InferenceConfig::default()
        };

        let mut seen = Vec::new();
        let result = initialize_detector(&config, |attempt| {
            seen.push(attempt.clone());
            if attempt.gpu_mode {
                Err(InferenceError::Startup {
                    details: "no GPU delegate".to_string(),
                })
            } else {
                Ok(Box::new(ScriptedDetector::new()) as Box<dyn HandDetector>)
            }
        });

        assert!(result.is_ok());
        assert_eq!(seen.len(), 2);
        assert!(!seen[1].gpu_mode);
        assert_eq!(seen[1].max_hands, InferenceConfig::default().max_hands);
        assert_eq!(seen[1].python, "/opt/venv/bin/python");
    }

    #[test]
    fn test_initialize_detector_second_failure_is_fatal() {
        let config = InferenceConfig::default();
        let mut attempts = 0;

        let result = initialize_detector(&config, |_| {
            attempts += 1;
            Err(InferenceError::Startup {
                details: "helper missing".to_string(),
            })
        });

        assert!(matches!(result, Err(InferenceError::Startup { .. })));
        assert_eq!(attempts, 2);
    }
}
