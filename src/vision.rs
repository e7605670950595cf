//! Object-detection announcements for the patient camera view.
//!
//! The detector is a black box. This module decides what to say about its
//! output and how often: at most one announcement per delay window, about
//! the largest confident object, with a rough distance from its pixel size.

use std::sync::Arc;

use crate::config::PrismConfig;
use crate::platform::{Detection, Frame, ObjectDetector, Platform, PlatformError};

pub const STARTED_MESSAGE: &str = "Object detection started. Please wait while the model loads.";
pub const MODEL_READY_MESSAGE: &str = "Model loaded. Starting camera.";
pub const CAMERA_READY_MESSAGE: &str = "Camera is ready. Detecting objects. Tap the button again to stop.";
pub const STOPPED_MESSAGE: &str = "Object detection stopped.";
pub const PERMISSION_DENIED_MESSAGE: &str =
    "Camera access denied. Please enable camera permissions in your browser settings.";
pub const FAILED_MESSAGE: &str = "An error occurred during object detection.";

/// Estimated distance in metres, formatted to one decimal.
/// `None` for a degenerate box.
pub fn estimate_distance(detection: &Detection, reference_px: f32) -> Option<String> {
    let size = detection.bbox[2].max(detection.bbox[3]);
    if size.is_nan() || size <= 0.0 {
        return None;
    }
    Some(format!("{:.1}", reference_px / size))
}

/// Overlay text drawn next to a box: `chair (1.5m) 87%`.
pub fn overlay_label(detection: &Detection, reference_px: f32) -> String {
    let distance = estimate_distance(detection, reference_px).unwrap_or_else(|| "?".into());
    format!(
        "{} ({}m) {}%",
        detection.class,
        distance,
        (detection.score * 100.0).round() as i32
    )
}

/// Throttled choice of what to announce.
#[derive(Debug, Clone)]
pub struct DetectionAnnouncer {
    min_score: f32,
    delay_ms: u64,
    reference_px: f32,
    last_announced_at: Option<u64>,
}

impl DetectionAnnouncer {
    pub fn new(config: &PrismConfig) -> Self {
        Self {
            min_score: config.detection_min_score,
            delay_ms: config.announcement_delay_ms,
            reference_px: config.distance_reference_px,
            last_announced_at: None,
        }
    }

    fn ready(&self, now_ms: u64) -> bool {
        match self.last_announced_at {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.delay_ms,
        }
    }

    /// Message for this frame's detections, if one is due. The throttle
    /// window only restarts when something is actually announced.
    pub fn observe(&mut self, now_ms: u64, detections: &[Detection]) -> Option<String> {
        if !self.ready(now_ms) {
            return None;
        }

        let (primary, distance) = detections
            .iter()
            .filter(|d| d.score > self.min_score)
            .filter_map(|d| estimate_distance(d, self.reference_px).map(|m| (d, m)))
            .max_by(|(a, _), (b, _)| a.area().total_cmp(&b.area()))?;

        self.last_announced_at = Some(now_ms);
        Some(format!("{} is {} meters away", primary.class, distance))
    }

    pub fn reset(&mut self) {
        self.last_announced_at = None;
    }
}

/// What one processed frame produced.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub labels: Vec<String>,
    pub announcement: Option<String>,
}

/// A running camera session.
pub struct DetectionSession {
    platform: Platform,
    detector: Arc<dyn ObjectDetector>,
    announcer: DetectionAnnouncer,
    reference_px: f32,
    active: bool,
}

impl DetectionSession {
    pub fn new(platform: Platform, detector: Arc<dyn ObjectDetector>, config: &PrismConfig) -> Self {
        Self {
            platform,
            detector,
            announcer: DetectionAnnouncer::new(config),
            reference_px: config.distance_reference_px,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.announcer.reset();
        self.platform.say(STARTED_MESSAGE);
        self.platform.say(MODEL_READY_MESSAGE);
        self.platform.say(CAMERA_READY_MESSAGE);
        tracing::info!("Object detection session started");
    }

    /// Run the detector on one frame and speak any due announcement.
    /// A detector failure ends the session.
    pub fn process_frame(&mut self, now_ms: u64, frame: &Frame) -> Result<FrameReport, PlatformError> {
        if !self.active {
            return Ok(FrameReport {
                labels: Vec::new(),
                announcement: None,
            });
        }

        let detections = match self.detector.detect(frame) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "Object detection failed");
                let message = match e {
                    PlatformError::PermissionDenied(_) => PERMISSION_DENIED_MESSAGE,
                    _ => FAILED_MESSAGE,
                };
                self.platform.say(message);
                self.stop();
                return Err(e);
            }
        };

        let labels = detections
            .iter()
            .map(|d| overlay_label(d, self.reference_px))
            .collect();
        let announcement = self.announcer.observe(now_ms, &detections);
        if let Some(text) = &announcement {
            self.platform.say(text);
        }
        Ok(FrameReport {
            labels,
            announcement,
        })
    }

    /// Returns whether a session was running.
    pub fn stop(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.platform.say(STOPPED_MESSAGE);
        tracing::info!("Object detection session stopped");
        true
    }
}
