// ============================================================
// Layer 2 — Drill Session
// ============================================================
// The interactive loop behind `aula-write drill`. Stands in for
// the touch screen: strokes are typed as point lists or loaded
// from drawing files.
//
//   stdin thread ──lines──▶ ┌────────────┐
//                           │ main loop  │──▶ RecognitionController ──▶ worker
//   clear channel ────────▶ │ (this file)│◀── completions
//   inactivity timer ─────▶ └────────────┘──▶ DrillEngine
//
// All state lives on the loop's thread; the only other threads are
// the stdin reader and the recognition workers.

use anyhow::Result;
use rand::{rngs::StdRng, Rng};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use crate::application::{
    chat_use_case::Conversation,
    drill_engine::{ClearCanvas, DrillEngine},
    recognition::{InactivityTimer, RecognitionController, RecognitionEvent, RequestOutcome},
};
use crate::data::loader::load_drawing;
use crate::domain::drawing::{Point, Stroke};

/// How long the loop waits for input before servicing timers.
const LOOP_TICK: Duration = Duration::from_millis(100);

pub const HELP: &str = "\
Commands:
  stroke x,y x,y ...   draw one stroke (optional pressure: x,y,p)
  load <file.json>     replace the drawing with a saved one
  recognize            read the drawing now
  check                grade the recognized answer
  next                 new exercise, clears the drawing
  clear                wipe the drawing
  show                 print what the classifier sees
  ask <question>       ask the teaching assistant
  help                 this text
  quit                 leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Stroke(Vec<Point>),
    Load(PathBuf),
    Recognize,
    Check,
    Next,
    Clear,
    Show,
    Ask(String),
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines give `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None               => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "stroke" | "s" => Command::Stroke(parse_points(rest)?),
            "load" => {
                if rest.is_empty() {
                    return Err("load needs a file path".into());
                }
                Command::Load(PathBuf::from(rest))
            }
            "recognize" | "r" => Command::Recognize,
            "check" | "c"     => Command::Check,
            "next" | "n"      => Command::Next,
            "clear"           => Command::Clear,
            "show"            => Command::Show,
            "ask"             => Command::Ask(rest.to_string()),
            "help" | "?"      => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command '{other}', type 'help'")),
        };
        Ok(Some(command))
    }
}

/// `x,y` or `x,y,pressure` tokens separated by whitespace.
fn parse_points(text: &str) -> Result<Vec<Point>, String> {
    let points = text
        .split_whitespace()
        .map(|token| {
            let parts: Vec<f32> = token
                .split(',')
                .map(|n| n.trim().parse::<f32>())
                .collect::<Result<_, _>>()
                .map_err(|_| format!("bad point '{token}'"))?;
            match parts.as_slice() {
                [x, y]    => Ok(Point::new(*x, *y)),
                [x, y, p] => Ok(Point::with_pressure(*x, *y, *p)),
                _         => Err(format!("bad point '{token}', expected x,y")),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    if points.is_empty() {
        return Err("stroke needs at least one x,y point".into());
    }
    Ok(points)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct DrillSession<R = StdRng> {
    controller:   RecognitionController,
    engine:       DrillEngine<R>,
    clear_rx:     Receiver<ClearCanvas>,
    timer:        InactivityTimer,
    conversation: Option<Conversation>,
    stroke_width: f32,
}

impl<R: Rng> DrillSession<R> {
    pub fn new(
        controller:   RecognitionController,
        engine:       DrillEngine<R>,
        clear_rx:     Receiver<ClearCanvas>,
        timer:        InactivityTimer,
        conversation: Option<Conversation>,
        stroke_width: f32,
    ) -> Self {
        Self { controller, engine, clear_rx, timer, conversation, stroke_width }
    }

    pub fn controller(&self) -> &RecognitionController {
        &self.controller
    }

    pub fn engine(&self) -> &DrillEngine<R> {
        &self.engine
    }

    /// Drive the session from stdin until `quit` or end of input.
    pub fn run(mut self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let input = spawn_stdin_reader();

        tracing::info!("Drill session started: {}", self.engine.operation());
        self.print_exercise(&mut out)?;
        writeln!(out, "Type 'help' for commands.")?;

        loop {
            match input.recv_timeout(LOOP_TICK) {
                Ok(line) => match Command::parse(&line) {
                    Ok(Some(cmd)) => {
                        if self.handle(cmd, &mut out)? == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(msg) => writeln!(out, "{msg}")?,
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.pump(Instant::now(), &mut out)?;
        }

        tracing::info!("Drill session ended");
        Ok(())
    }

    /// Service everything that isn't user input: finished
    /// recognitions, the inactivity timer and clear requests.
    pub fn pump(&mut self, now: Instant, out: &mut dyn Write) -> Result<()> {
        for event in self.controller.poll() {
            self.report(event, out)?;
        }
        if self.timer.due(now) && self.controller.on_tick() {
            writeln!(out, "(recognizing...)")?;
        }
        self.drain_clear();
        Ok(())
    }

    pub fn handle(&mut self, cmd: Command, out: &mut dyn Write) -> Result<Flow> {
        match cmd {
            Command::Stroke(points) => {
                self.controller.add_stroke(Stroke::new(points, self.stroke_width));
                self.engine.record_prediction(None);
                writeln!(out, "{} stroke(s) on the canvas", self.controller.drawing().strokes().len())?;
            }
            Command::Load(path) => match load_drawing(&path) {
                Ok(drawing) => {
                    self.controller.replace_drawing(drawing);
                    self.engine.record_prediction(None);
                    writeln!(out, "Loaded {} stroke(s)", self.controller.drawing().strokes().len())?;
                }
                Err(e) => writeln!(out, "Could not load drawing: {e:#}")?,
            },
            Command::Recognize => match self.controller.request_recognition() {
                RequestOutcome::Started { .. } => writeln!(out, "Recognizing...")?,
                RequestOutcome::AlreadyRunning => writeln!(out, "Still recognizing, please wait")?,
                RequestOutcome::EmptyDrawing   => writeln!(out, "Nothing drawn yet")?,
            },
            Command::Check => {
                let feedback = self.engine.check_answer();
                writeln!(out, "{feedback}")?;
            }
            Command::Next => {
                self.engine.next(self.engine.operation());
                self.drain_clear();
                self.print_exercise(out)?;
            }
            Command::Clear => {
                self.controller.clear();
                self.engine.record_prediction(None);
                writeln!(out, "Canvas cleared")?;
            }
            Command::Show => self.show(out)?,
            Command::Ask(question) => self.ask(&question, out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn report(&mut self, event: RecognitionEvent, out: &mut dyn Write) -> Result<()> {
        match event {
            RecognitionEvent::Recognized(prediction) => {
                self.engine.record_prediction(Some(prediction.as_answer()));
                writeln!(out, "Recognized: {}", prediction.digit())?;
            }
            RecognitionEvent::Failed(_) => {
                self.engine.record_prediction(None);
                writeln!(out, "Could not read the drawing, try again")?;
            }
            RecognitionEvent::Discarded => {}
        }
        Ok(())
    }

    fn drain_clear(&mut self) {
        while self.clear_rx.try_recv().is_ok() {
            self.controller.clear();
        }
    }

    fn show(&self, out: &mut dyn Write) -> Result<()> {
        match self.controller.preview() {
            Ok(bitmap) => writeln!(out, "{}", bitmap.ascii_preview())?,
            Err(e)     => writeln!(out, "Nothing to show: {e}")?,
        }
        Ok(())
    }

    fn ask(&mut self, question: &str, out: &mut dyn Write) -> Result<()> {
        let Some(conversation) = self.conversation.as_mut() else {
            writeln!(out, "The assistant is not available in this session")?;
            return Ok(());
        };
        if let Some(reply) = conversation.ask(question) {
            writeln!(out, "Assistant: {}", reply.text)?;
            if let Some(video) = &reply.video_url {
                writeln!(out, "  video: {video}")?;
            }
            if let Some(audio) = &reply.audio_url {
                writeln!(out, "  audio: {audio}")?;
            }
        }
        Ok(())
    }

    fn print_exercise(&self, out: &mut dyn Write) -> Result<()> {
        write!(out, "\n{}", self.engine.exercise().render_vertical())?;
        Ok(())
    }
}

/// Forward stdin lines over a channel so the loop never blocks on input.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::drill_engine::{check, ClearSignal};
    use crate::data::normalizer::{ImageNormalizer, NormalizerSettings};
    use crate::domain::bitmap::{BitmapShape, NormalizedBitmap, Prediction};
    use crate::domain::drawing::Rect;
    use crate::domain::exercise::{Feedback, OperationKind};
    use crate::domain::traits::{ClassifierError, DigitClassifier};
    use rand::SeedableRng;
    use std::sync::Arc;

    struct AlwaysFour;

    impl DigitClassifier for AlwaysFour {
        fn input_shape(&self) -> BitmapShape {
            BitmapShape::MODEL_DEFAULT
        }

        fn classify(&self, _bitmap: &NormalizedBitmap) -> Result<Prediction, ClassifierError> {
            Ok(Prediction::new(4, 0.8).unwrap())
        }
    }

    fn session(period: Duration) -> DrillSession<StdRng> {
        let (signal, clear_rx) = ClearSignal::channel();
        let controller = RecognitionController::new(
            Arc::new(AlwaysFour),
            ImageNormalizer::new(NormalizerSettings::default()),
            Rect::from_size(200.0, 200.0),
        );
        let engine = DrillEngine::new(OperationKind::Add, StdRng::seed_from_u64(3), signal);
        let timer  = InactivityTimer::new(period, Instant::now());
        DrillSession::new(controller, engine, clear_rx, timer, None, 30.0)
    }

    fn stroke() -> Command {
        Command::parse("stroke 100,40 100,160").unwrap().unwrap()
    }

    /// Pump until the engine holds a prediction or five seconds pass.
    fn settle(s: &mut DrillSession<StdRng>, out: &mut Vec<u8>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while s.engine().attempt().predicted_digit.is_none() && Instant::now() < deadline {
            s.pump(Instant::now(), out).unwrap();
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   "), Ok(None));
        assert_eq!(Command::parse("check"),  Ok(Some(Command::Check)));
        assert_eq!(Command::parse("N"),      Ok(Some(Command::Next)));
        assert_eq!(Command::parse("quit"),   Ok(Some(Command::Quit)));
        assert_eq!(
            Command::parse("ask what is a sum?"),
            Ok(Some(Command::Ask("what is a sum?".into())))
        );
        assert_eq!(
            Command::parse("load drawings/four.json"),
            Ok(Some(Command::Load(PathBuf::from("drawings/four.json"))))
        );
        assert!(Command::parse("load").is_err());
        assert!(Command::parse("dance").is_err());
    }

    #[test]
    fn test_parse_stroke_points() {
        assert_eq!(
            Command::parse("stroke 1,2 3.5,4,0.5"),
            Ok(Some(Command::Stroke(vec![Point::new(1.0, 2.0), Point::with_pressure(3.5, 4.0, 0.5)])))
        );
        assert!(Command::parse("stroke").is_err());
        assert!(Command::parse("stroke 1;2").is_err());
        assert!(Command::parse("stroke 1,2,3,4").is_err());
    }

    #[test]
    fn test_recognize_then_check() {
        let mut s   = session(Duration::from_secs(3600));
        let mut out = Vec::new();

        s.handle(stroke(), &mut out).unwrap();
        s.handle(Command::Recognize, &mut out).unwrap();
        settle(&mut s, &mut out);
        assert_eq!(s.engine().attempt().predicted_digit.as_deref(), Some("4"));

        s.handle(Command::Check, &mut out).unwrap();
        let expected = check(s.engine().exercise(), Some("4"));
        assert_eq!(s.engine().attempt().feedback.as_ref(), Some(&expected));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Recognized: 4"));
    }

    #[test]
    fn test_check_without_drawing_is_empty() {
        let mut s   = session(Duration::from_secs(3600));
        let mut out = Vec::new();
        s.handle(Command::Check, &mut out).unwrap();
        assert_eq!(s.engine().attempt().feedback, Some(Feedback::Empty));
    }

    #[test]
    fn test_inactivity_timer_triggers_recognition() {
        let mut s   = session(Duration::from_millis(1));
        let mut out = Vec::new();
        s.handle(stroke(), &mut out).unwrap();

        thread::sleep(Duration::from_millis(5));
        settle(&mut s, &mut out);
        assert_eq!(s.engine().attempt().predicted_digit.as_deref(), Some("4"));
    }

    #[test]
    fn test_next_clears_canvas_and_prediction() {
        let mut s   = session(Duration::from_secs(3600));
        let mut out = Vec::new();
        s.handle(stroke(), &mut out).unwrap();
        s.handle(Command::Recognize, &mut out).unwrap();
        settle(&mut s, &mut out);

        s.handle(Command::Next, &mut out).unwrap();
        assert!(s.controller().drawing().is_empty());
        assert!(s.controller().prediction().is_none());
        assert!(s.engine().attempt().predicted_digit.is_none());
    }

    #[test]
    fn test_new_stroke_drops_prediction() {
        let mut s   = session(Duration::from_secs(3600));
        let mut out = Vec::new();
        s.handle(stroke(), &mut out).unwrap();
        s.handle(Command::Recognize, &mut out).unwrap();
        settle(&mut s, &mut out);

        s.handle(stroke(), &mut out).unwrap();
        assert!(s.engine().attempt().predicted_digit.is_none());
        assert!(s.controller().prediction().is_none());
    }

    #[test]
    fn test_show_and_ask_without_assistant() {
        let mut s   = session(Duration::from_secs(3600));
        let mut out = Vec::new();
        s.handle(Command::Show, &mut out).unwrap();
        s.handle(stroke(), &mut out).unwrap();
        s.handle(Command::Show, &mut out).unwrap();
        s.handle(Command::Ask("hi".into()), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Nothing to show"));
        assert!(text.contains('@'));
        assert!(text.contains("not available"));
    }

    #[test]
    fn test_quit_ends_loop() {
        let mut s = session(Duration::from_secs(3600));
        assert_eq!(s.handle(Command::Quit, &mut Vec::new()).unwrap(), Flow::Quit);
    }
}
