// ============================================================
// Layer 2 — Recognition Controller
// ============================================================
// Owns the drawing for the current attempt and decides when to
// recognize it.
//
//   Idle ──stroke──▶ Capturing ──request / timer──▶ Recognizing
//    ▲                  ▲                               │
//    │                  └──── failure / stale result ───┤
//    └───────────────── success ────────────────────────┘
//
// Recognition runs on a worker thread over a snapshot of the
// drawing. The worker reports back through a channel owned by the
// controller; the session loop drains it with `poll` or `wait`.
// Every completion carries its job id and the drawing revision it
// was taken from, so a result for a drawing that has since changed
// is dropped instead of applied.
//
// The in-flight job is tracked apart from the state: `clear` always
// returns the state to Idle, while a second job still cannot start
// until the first one has reported back.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::data::normalizer::{ImageNormalizer, NormalizationError};
use crate::domain::{
    bitmap::{NormalizedBitmap, Prediction},
    drawing::{Drawing, Rect, Stroke},
    traits::{ClassifierError, DigitClassifier},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionState {
    /// Nothing drawn, or the drawing has been recognized.
    Idle,
    /// Strokes present, no prediction for them yet.
    Capturing,
    /// A worker is classifying a snapshot of the current drawing.
    Recognizing { job: u64 },
}

#[derive(Debug, Error)]
pub enum RecognitionFailure {
    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("recognition worker panicked: {0}")]
    WorkerPanicked(String),
}

/// What `request_recognition` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Started { job: u64 },
    AlreadyRunning,
    EmptyDrawing,
}

/// A worker result after it has been applied to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Recognized(Prediction),
    Failed(String),
    /// The drawing changed while the job ran.
    Discarded,
}

struct Completion {
    job:      u64,
    revision: u64,
    outcome:  Result<Prediction, RecognitionFailure>,
}

pub struct RecognitionController {
    classifier: Arc<dyn DigitClassifier>,
    normalizer: ImageNormalizer,
    drawing:    Drawing,
    revision:   u64,
    state:      RecognitionState,
    prediction: Option<Prediction>,
    in_flight:  Option<u64>,
    next_job:   u64,
    tx:         Sender<Completion>,
    rx:         Receiver<Completion>,
}

impl RecognitionController {
    pub fn new(classifier: Arc<dyn DigitClassifier>, normalizer: ImageNormalizer, canvas: Rect) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            classifier,
            normalizer,
            drawing: Drawing::new(canvas),
            revision: 0,
            state: RecognitionState::Idle,
            prediction: None,
            in_flight: None,
            next_job: 1,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> RecognitionState {
        self.state
    }

    /// True while a worker job has not reported back, even if the
    /// drawing it was started on has since been cleared.
    pub fn is_recognizing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn prediction(&self) -> Option<Prediction> {
        self.prediction
    }

    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    /// Commit a finished stroke. Empty strokes are ignored.
    pub fn add_stroke(&mut self, stroke: Stroke) {
        if stroke.is_empty() {
            return;
        }
        self.drawing.commit(stroke);
        self.touch();
    }

    /// Swap in a whole drawing, e.g. one loaded from disk.
    pub fn replace_drawing(&mut self, drawing: Drawing) {
        self.drawing = drawing;
        self.touch();
    }

    /// Discard the drawing and prediction and return to Idle. A job
    /// already in flight still blocks new requests; its result is
    /// dropped when it arrives.
    pub fn clear(&mut self) {
        let had_content = !self.drawing.is_empty() || self.prediction.is_some();
        self.drawing.clear();
        self.prediction = None;
        if had_content {
            self.revision += 1;
        }
        self.state = RecognitionState::Idle;
        tracing::debug!("Drawing cleared (revision {})", self.revision);
    }

    /// Start classifying a snapshot of the drawing on a worker thread.
    pub fn request_recognition(&mut self) -> RequestOutcome {
        if self.is_recognizing() {
            tracing::debug!("Recognition already running, request ignored");
            return RequestOutcome::AlreadyRunning;
        }
        if self.drawing.is_empty() {
            return RequestOutcome::EmptyDrawing;
        }

        let job      = self.next_job;
        self.next_job += 1;
        self.in_flight = Some(job);
        self.state     = RecognitionState::Recognizing { job };

        let snapshot   = self.drawing.clone();
        let revision   = self.revision;
        let classifier = Arc::clone(&self.classifier);
        let normalizer = self.normalizer.clone();
        let tx         = self.tx.clone();

        tracing::info!("Recognition job {} started ({} strokes)", job, snapshot.strokes().len());

        thread::spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                recognize(&normalizer, classifier.as_ref(), &snapshot)
            }))
            .unwrap_or_else(|payload| Err(RecognitionFailure::WorkerPanicked(panic_message(payload))));

            // The controller may be gone; nobody is left to care.
            let _ = tx.send(Completion { job, revision, outcome });
        });

        RequestOutcome::Started { job }
    }

    /// Normalize the current drawing the way a recognition job would.
    pub fn preview(&self) -> Result<NormalizedBitmap, NormalizationError> {
        self.normalizer.normalize(&self.drawing, self.classifier.input_shape())
    }

    /// Timer hook: recognize if idle over an unrecognized drawing.
    pub fn on_tick(&mut self) -> bool {
        if self.is_recognizing() || self.prediction.is_some() || self.drawing.is_empty() {
            return false;
        }
        tracing::debug!("Inactivity timer fired");
        matches!(self.request_recognition(), RequestOutcome::Started { .. })
    }

    /// Apply every completion that has already arrived.
    pub fn poll(&mut self) -> Vec<RecognitionEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            events.extend(self.apply(completion));
        }
        events
    }

    /// Block up to `timeout` for the in-flight job.
    pub fn wait(&mut self, timeout: Duration) -> Option<RecognitionEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => self.apply(completion),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn touch(&mut self) {
        self.revision  += 1;
        self.prediction = None;
        if !matches!(self.state, RecognitionState::Recognizing { .. }) {
            self.state = self.resting_state();
        }
    }

    fn resting_state(&self) -> RecognitionState {
        if self.drawing.is_empty() {
            RecognitionState::Idle
        } else {
            RecognitionState::Capturing
        }
    }

    fn apply(&mut self, completion: Completion) -> Option<RecognitionEvent> {
        let Some(job) = self.in_flight else {
            tracing::debug!("Completion for job {} with nothing in flight", completion.job);
            return None;
        };
        if job != completion.job {
            tracing::debug!("Completion for job {} ignored, job {} in flight", completion.job, job);
            return None;
        }

        self.in_flight = None;
        self.state     = self.resting_state();

        if completion.revision != self.revision {
            tracing::info!("Recognition job {} discarded: drawing changed", job);
            return Some(RecognitionEvent::Discarded);
        }

        match completion.outcome {
            Ok(prediction) => {
                tracing::info!(
                    "Recognition job {} finished: {} (p={:.3})",
                    job,
                    prediction.digit(),
                    prediction.confidence(),
                );
                self.prediction = Some(prediction);
                self.state      = RecognitionState::Idle;
                Some(RecognitionEvent::Recognized(prediction))
            }
            Err(failure) => {
                tracing::warn!("Recognition job {} failed: {}", job, failure);
                self.prediction = None;
                Some(RecognitionEvent::Failed(failure.to_string()))
            }
        }
    }
}

/// Normalize to the classifier's input shape and classify.
pub fn recognize(
    normalizer: &ImageNormalizer,
    classifier: &dyn DigitClassifier,
    drawing:    &Drawing,
) -> Result<Prediction, RecognitionFailure> {
    let bitmap: NormalizedBitmap = normalizer.normalize(drawing, classifier.input_shape())?;
    Ok(classifier.classify(&bitmap)?)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ─── Inactivity Timer ─────────────────────────────────────────────────────────

/// Fixed-period repeating trigger, driven by the caller's clock.
#[derive(Debug, Clone)]
pub struct InactivityTimer {
    period:    Duration,
    next_fire: Instant,
}

impl InactivityTimer {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self { period, next_fire: now + period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// True once per elapsed period; re-arms itself when it fires.
    pub fn due(&mut self, now: Instant) -> bool {
        if now < self.next_fire {
            return false;
        }
        self.next_fire = now + self.period;
        true
    }

    /// Time left before the next tick.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next_fire.saturating_duration_since(now)
    }
}
