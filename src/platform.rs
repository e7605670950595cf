//! Host platform collaborators.
//!
//! Speech synthesis, speech recognition, geolocation and object detection
//! are provided by the embedding front-end. The core only sees these
//! traits, which keeps every flow testable with the fakes in [`testing`].

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Speech recognition not supported")]
    RecognitionUnsupported,

    #[error("Speech recognition failed: {0}")]
    Recognition(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Object detector failed: {0}")]
    Detector(String),
}

/// Wall clock. Injected so schedule lookups are deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Calendar date in UTC, used for stored message dates.
    fn today_utc(&self) -> NaiveDate;
}

/// Local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn today_utc(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// How an utterance ended. Being cut off by a newer utterance is a normal
/// outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    Finished,
    Interrupted,
}

pub trait SpeechOutput: Send + Sync {
    /// Speak `text`, cancelling anything currently being spoken.
    /// Returns once the utterance finishes or is superseded.
    fn speak(&self, text: &str) -> Result<SpeechOutcome, PlatformError>;

    /// Stop any utterance in progress.
    fn stop(&self);
}

pub trait SpeechRecognizer: Send + Sync {
    /// Listen for a single utterance and return its transcript.
    fn listen_once(&self) -> Result<String, PlatformError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

pub trait Geolocation: Send + Sync {
    /// Current position, or `None` when denied or unavailable.
    fn current_position(&self) -> Option<Coordinates>;
}

/// One camera frame handed to the detector as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A detected object. `bbox` is `[x, y, width, height]` in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub score: f32,
    pub bbox: [f32; 4],
}

impl Detection {
    pub fn area(&self) -> f32 {
        self.bbox[2] * self.bbox[3]
    }
}

/// Pretrained object detector, treated as a stateless function.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, PlatformError>;
}

/// The collaborators a dashboard session talks to.
///
/// The object detector is not part of the bundle; it is only needed while
/// a detection session runs and is handed to `vision` directly.
#[derive(Clone)]
pub struct Platform {
    pub clock: Arc<dyn Clock>,
    pub speech: Arc<dyn SpeechOutput>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub location: Arc<dyn Geolocation>,
}

impl Platform {
    /// Bundle the host services with the local wall clock.
    pub fn new(
        speech: Arc<dyn SpeechOutput>,
        recognizer: Arc<dyn SpeechRecognizer>,
        location: Arc<dyn Geolocation>,
    ) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            speech,
            recognizer,
            location,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn say(&self, text: &str) {
        announce(self.speech.as_ref(), text);
    }
}

/// Speak and swallow the outcome. Announcements are best-effort: a
/// failing synthesizer must never abort the flow that triggered them.
pub fn announce(speech: &dyn SpeechOutput, text: &str) {
    match speech.speak(text) {
        Ok(SpeechOutcome::Finished) => {}
        Ok(SpeechOutcome::Interrupted) => {
            tracing::debug!("Announcement interrupted");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Announcement failed");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn announce_swallows_synthesis_failure() {
        let speech = RecordingSpeech::failing();
        announce(&speech, "hello");
        assert_eq!(speech.spoken(), vec!["hello".to_string()]);
    }

    #[test]
    fn detection_area_is_width_times_height() {
        let d = Detection {
            class: "chair".into(),
            score: 0.9,
            bbox: [10.0, 20.0, 30.0, 40.0],
        };
        assert_eq!(d.area(), 1200.0);
    }

    #[test]
    fn scripted_recognizer_errors_when_exhausted() {
        let rec = ScriptedRecognizer::with(&["one"]);
        assert_eq!(rec.listen_once().unwrap(), "one");
        assert!(rec.listen_once().is_err());
    }

    #[test]
    fn platform_say_goes_through_speech() {
        let (platform, speech) = fake_platform(
            ScriptedRecognizer::default(),
            None,
            FixedClock::at("2026-03-01", "08:00:00"),
        );
        platform.say("hello");
        assert_eq!(speech.last().as_deref(), Some("hello"));
        assert_eq!(platform.clock.now().to_string(), "2026-03-01 08:00:00");
    }

    #[test]
    fn system_clock_is_close_to_local_now() {
        let delta = Local::now().naive_local() - SystemClock.now();
        assert!(delta.num_seconds().abs() < 5);
    }

    #[test]
    fn fixed_clock_utc_date_follows_offset() {
        let ahead = FixedClock::at("2026-03-02", "01:30:00").with_utc_offset(5);
        assert_eq!(ahead.today_utc(), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        let behind = FixedClock::at("2026-03-01", "22:00:00").with_utc_offset(-4);
        assert_eq!(behind.today_utc(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(
            FixedClock::at("2026-03-01", "12:00:00").today_utc(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
    }
}
