// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// use case. Only this layer prints results for the user.
//
//   train      — fit the digit classifier on IDX files
//   recognize  — classify one saved drawing
//   drill      — interactive exercise session
//   ask        — one question to the teaching assistant
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use std::{path::PathBuf, sync::Arc, time::Instant};

use commands::{AskArgs, Commands, DrillArgs, RecognizeArgs, TrainArgs};

use crate::application::{
    chat_use_case::Conversation,
    drill_engine::{ClearSignal, DrillEngine},
    drill_session::DrillSession,
    recognition::{InactivityTimer, RecognitionController},
    recognize_use_case::RecognizeUseCase,
    train_use_case::TrainUseCase,
};
use crate::data::normalizer::ImageNormalizer;
use crate::domain::traits::DigitClassifier;
use crate::infra::{
    chat_client::ChatClient,
    checkpoint::CheckpointManager,
    config::{AppConfig, ChatSettings},
};
use crate::ml::inferencer::BurnDigitClassifier;

#[derive(Parser, Debug)]
#[command(
    name = "aula-write",
    version = "0.1.0",
    about = "Handwritten-digit arithmetic drills with a teaching assistant."
)]
pub struct Cli {
    /// JSON settings file; built-in defaults when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = AppConfig::load(self.config.as_deref())?;
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Recognize(args) => run_recognize(&config, args),
            Commands::Drill(args)     => run_drill(config, args),
            Commands::Ask(args)       => run_ask(&config, args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on IDX files in: {}", args.data_dir);

    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Checkpoint saved.");
    Ok(())
}

fn run_recognize(config: &AppConfig, args: RecognizeArgs) -> Result<()> {
    let checkpoint_dir = args.checkpoint_dir.unwrap_or_else(|| config.model.checkpoint_dir.clone());
    let classifier     = load_classifier(&checkpoint_dir)?;

    let use_case = RecognizeUseCase::new(classifier, ImageNormalizer::new(config.normalizer));
    let report   = use_case.execute(&args.drawing, args.dump.as_deref())?;

    println!("Recognized digit: {}", report.prediction.digit());
    if let Some(dump) = &args.dump {
        println!("Normalized bitmap written to {}", dump.display());
    }
    Ok(())
}

fn run_drill(mut config: AppConfig, args: DrillArgs) -> Result<()> {
    if let Some(dir) = args.checkpoint_dir {
        config.model.checkpoint_dir = dir;
    }
    if let Some(secs) = args.auto_recognize_secs {
        config.recognition.auto_recognize_secs = secs;
    }
    if let Some(url) = args.chat_url {
        config.chat.base_url = url;
    }

    let classifier = load_classifier(&config.model.checkpoint_dir)?;
    let controller = RecognitionController::new(
        classifier,
        ImageNormalizer::new(config.normalizer),
        config.canvas.bounds(),
    );

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    };
    let (signal, clear_rx) = ClearSignal::channel();
    let engine = DrillEngine::new(args.operation, rng, signal);
    let timer  = InactivityTimer::new(config.recognition.period(), Instant::now());

    let conversation = if args.no_chat { None } else { open_conversation(&config.chat) };

    DrillSession::new(controller, engine, clear_rx, timer, conversation, config.canvas.stroke_width).run()
}

fn run_ask(config: &AppConfig, args: AskArgs) -> Result<()> {
    let mut settings = config.chat.clone();
    if let Some(url) = args.chat_url {
        settings.base_url = url;
    }
    let client = ChatClient::new(&settings)?;

    if args.health {
        let status = client.health().context("The assistant did not answer the health probe")?;
        println!("{}: {}", client.base_url(), status);
        return Ok(());
    }

    let question = args.question.unwrap_or_default();
    let answer   = client
        .ask(&question)
        .with_context(|| format!("Could not get an answer from {}", client.base_url()))?;

    println!("\nAnswer: {}", answer.text);
    if let Some(video) = &answer.video_url {
        println!("Video:  {video}");
    }
    if let Some(audio) = &answer.audio_url {
        println!("Audio:  {audio}");
    }
    Ok(())
}

/// Loaded once per process; any failure here ends the program.
fn load_classifier(checkpoint_dir: &str) -> Result<Arc<dyn DigitClassifier>> {
    let ckpt       = CheckpointManager::new(checkpoint_dir);
    let classifier = BurnDigitClassifier::from_checkpoint(&ckpt)
        .with_context(|| format!("Cannot load the digit model from '{checkpoint_dir}'"))?;
    Ok(Arc::new(classifier))
}

fn open_conversation(settings: &ChatSettings) -> Option<Conversation> {
    match ChatClient::new(settings) {
        Ok(client) => Some(Conversation::new(Box::new(client))),
        Err(e) => {
            tracing::warn!("Assistant disabled: {}", e);
            None
        }
    }
}
