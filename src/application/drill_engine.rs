// ============================================================
// Layer 2 — Drill Engine
// ============================================================
// Generates single-digit arithmetic exercises and grades the
// recognized answer against them.
//
//   add       a ∈ [0, 9], b ∈ [0, 9 − a]
//   subtract  a ∈ [0, 9], b ∈ [0, a]
//   multiply  two independent draws in [0, 9], redrawn until a·b ≤ 9
//
// Moving to the next exercise emits ClearCanvas on a typed channel;
// whoever owns the drawing listens and wipes it.

use rand::{rngs::StdRng, Rng};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::domain::exercise::{Exercise, Feedback, OperationKind, MAX_RESULT};

/// Upper bound on multiplication redraws. Acceptance is 23/100 per
/// pair, so reaching it means the source of randomness is broken.
const MAX_PRODUCT_ATTEMPTS: usize = 1000;

/// Draw one exercise for `operation`.
pub fn generate<R: Rng + ?Sized>(operation: OperationKind, rng: &mut R) -> Exercise {
    let (a, b) = match operation {
        OperationKind::Add => {
            let a = rng.gen_range(0..=MAX_RESULT);
            (a, rng.gen_range(0..=MAX_RESULT - a))
        }
        OperationKind::Subtract => {
            let a = rng.gen_range(0..=MAX_RESULT);
            (a, rng.gen_range(0..=a))
        }
        OperationKind::Multiply => {
            let (pair, attempts) = sample_product_pair(|| rng.gen_range(0..=MAX_RESULT));
            tracing::trace!("Multiplication pair accepted after {} attempt(s)", attempts);
            pair
        }
    };

    let exercise = Exercise::new(a, b, operation);
    tracing::debug!("Generated exercise {}", exercise);
    exercise
}

/// Rejection-sample (a, b) from `draw` until a·b ≤ 9.
///
/// Returns the accepted pair and how many pairs were drawn.
pub fn sample_product_pair(mut draw: impl FnMut() -> i32) -> ((i32, i32), usize) {
    for attempt in 1..=MAX_PRODUCT_ATTEMPTS {
        let a = draw();
        let b = draw();
        if a * b <= MAX_RESULT {
            return ((a, b), attempt);
        }
    }
    tracing::warn!("No product pair within {} draws, using 0 x 0", MAX_PRODUCT_ATTEMPTS);
    ((0, 0), MAX_PRODUCT_ATTEMPTS)
}

/// Grade the recognized text against `exercise`. Pure.
pub fn check(exercise: &Exercise, predicted: Option<&str>) -> Feedback {
    let raw = match predicted.map(str::trim) {
        None | Some("") => return Feedback::Empty,
        Some(raw)       => raw,
    };

    let expected = exercise.correct_result;
    match raw.parse::<i32>() {
        Err(_)                          => Feedback::Unparseable(raw.to_string()),
        Ok(given) if given == expected  => Feedback::Correct(given),
        Ok(given)                       => Feedback::Incorrect { given, expected },
    }
}

// ─── Clear-canvas signal ──────────────────────────────────────────────────────

/// Request to wipe the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearCanvas;

/// Sending half of the clear-canvas channel.
#[derive(Debug, Clone)]
pub struct ClearSignal(Sender<ClearCanvas>);

impl ClearSignal {
    pub fn channel() -> (ClearSignal, Receiver<ClearCanvas>) {
        let (tx, rx) = mpsc::channel();
        (ClearSignal(tx), rx)
    }

    pub fn emit(&self) {
        if self.0.send(ClearCanvas).is_err() {
            tracing::debug!("Clear-canvas signal has no listener");
        }
    }
}

// ─── Drill Engine ─────────────────────────────────────────────────────────────

/// What the learner has produced for the current exercise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptState {
    pub predicted_digit: Option<String>,
    pub feedback:        Option<Feedback>,
}

pub struct DrillEngine<R = StdRng> {
    operation:    OperationKind,
    exercise:     Exercise,
    attempt:      AttemptState,
    rng:          R,
    clear_signal: ClearSignal,
}

impl<R: Rng> DrillEngine<R> {
    pub fn new(operation: OperationKind, mut rng: R, clear_signal: ClearSignal) -> Self {
        let exercise = generate(operation, &mut rng);
        Self {
            operation,
            exercise,
            attempt: AttemptState::default(),
            rng,
            clear_signal,
        }
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn attempt(&self) -> &AttemptState {
        &self.attempt
    }

    /// Store the recognizer's latest reading. A new reading makes
    /// any earlier feedback stale.
    pub fn record_prediction(&mut self, digit: Option<String>) {
        self.attempt.predicted_digit = digit;
        self.attempt.feedback        = None;
    }

    pub fn check_answer(&mut self) -> &Feedback {
        let feedback = check(&self.exercise, self.attempt.predicted_digit.as_deref());
        tracing::info!("Checked {} = {:?}: {:?}", self.exercise, self.attempt.predicted_digit, feedback);
        self.attempt.feedback.insert(feedback)
    }

    /// New exercise for `operation`, fresh attempt, and a clear-canvas signal.
    pub fn next(&mut self, operation: OperationKind) -> Exercise {
        self.operation = operation;
        self.exercise  = generate(operation, &mut self.rng);
        self.attempt   = AttemptState::default();
        self.clear_signal.emit();
        self.exercise
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn engine(operation: OperationKind) -> (DrillEngine<StdRng>, Receiver<ClearCanvas>) {
        let (signal, rx) = ClearSignal::channel();
        (DrillEngine::new(operation, StdRng::seed_from_u64(7), signal), rx)
    }

    #[test]
    fn test_generated_exercises_are_always_well_formed() {
        for (seed, op) in OperationKind::ALL.into_iter().enumerate() {
            let mut rng = StdRng::seed_from_u64(seed as u64 + 100);
            for _ in 0..5000 {
                let ex = generate(op, &mut rng);
                assert!(ex.is_well_formed(), "{op}: {ex:?}");
                assert_eq!(ex.operation, op);
            }
        }
    }

    #[test]
    fn test_generation_covers_every_result() {
        let mut rng  = StdRng::seed_from_u64(5);
        let mut seen = [false; 10];
        for _ in 0..2000 {
            seen[generate(OperationKind::Add, &mut rng).correct_result as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_product_sampling_terminates_quickly() {
        let mut rng   = StdRng::seed_from_u64(11);
        let mut worst = 0;
        for _ in 0..5000 {
            let (_, attempts) = sample_product_pair(|| rng.gen_range(0..=9));
            worst = worst.max(attempts);
        }
        assert!(worst < MAX_PRODUCT_ATTEMPTS);
    }

    #[test]
    fn test_product_sampling_rejects_then_accepts() {
        let mut script = [4, 3, 4, 2].into_iter();
        let (pair, attempts) = sample_product_pair(|| script.next().unwrap());
        assert_eq!(pair,     (4, 2));
        assert_eq!(attempts, 2);
    }

    #[test]
    fn test_check_scenarios() {
        let add = Exercise::new(2, 2, OperationKind::Add);
        let sub = Exercise::new(5, 3, OperationKind::Subtract);
        let odd = Exercise::new(7, 1, OperationKind::Add);

        assert_eq!(check(&add, Some("4")), Feedback::Correct(4));
        assert_eq!(check(&sub, Some("")),  Feedback::Empty);
        assert_eq!(check(&sub, None),      Feedback::Empty);
        assert_eq!(check(&odd, Some("x")), Feedback::Unparseable("x".into()));
        assert_eq!(check(&add, Some("5")), Feedback::Incorrect { given: 5, expected: 4 });
    }

    #[test]
    fn test_check_trims_and_is_pure() {
        let ex = Exercise::new(3, 3, OperationKind::Multiply);
        assert_eq!(check(&ex, Some("   ")), Feedback::Empty);
        assert_eq!(check(&ex, Some(" 9 ")), Feedback::Correct(9));
        assert_eq!(check(&ex, Some("9")),   check(&ex, Some("9")));
    }

    #[test]
    fn test_next_resets_attempt_and_emits_clear() {
        let (mut engine, rx) = engine(OperationKind::Add);
        engine.record_prediction(Some("3".into()));
        engine.check_answer();
        assert!(engine.attempt().feedback.is_some());

        let ex = engine.next(OperationKind::Subtract);
        assert_eq!(ex.operation,         OperationKind::Subtract);
        assert_eq!(engine.operation(),   OperationKind::Subtract);
        assert_eq!(engine.attempt(),     &AttemptState::default());
        assert_eq!(rx.try_recv(),        Ok(ClearCanvas));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_new_prediction_drops_old_feedback() {
        let (mut engine, _rx) = engine(OperationKind::Multiply);
        engine.check_answer();
        assert_eq!(engine.attempt().feedback, Some(Feedback::Empty));

        engine.record_prediction(Some("1".into()));
        assert_eq!(engine.attempt().feedback, None);
    }

    #[test]
    fn test_emit_without_listener_is_harmless() {
        let (signal, rx) = ClearSignal::channel();
        drop(rx);
        signal.emit();
    }
}
