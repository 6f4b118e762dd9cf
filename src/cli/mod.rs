// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and prints results.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`      — fine-tunes the dual classifier
//   2. `evaluate`   — scores a saved checkpoint
//   3. `preprocess` — writes the cleaned corpus

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PreprocessArgs, TrainArgs};

use crate::application::{
    evaluate_use_case::EvaluateUseCase,
    preprocess_use_case::{preview, PreprocessUseCase},
    train_use_case::TrainUseCase,
};
use crate::domain::task::Task;

#[derive(Parser, Debug)]
#[command(
    name = "faux-hate",
    version,
    about = "Detect hate speech and fake news with two LoRA-tuned BERT encoders."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)      => run_train(args),
            Commands::Evaluate(args)   => run_evaluate(args),
            Commands::Preprocess(args) => run_preprocess(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on '{}'", args.data);

    let summary = TrainUseCase::new(args.into()).execute()?;

    let best = &summary.best;
    println!(
        "Training complete ({} epochs). Best epoch {}: Hate F1 {:.4}, Fake F1 {:.4}",
        summary.epochs, best.epoch, best.hate_f1, best.fake_f1
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let eval = EvaluateUseCase::new(args.into()).execute()?;

    for task in Task::ALL {
        println!("{} Classification Report:", task.title());
        println!("{}", eval.report(task));
    }
    println!(
        "Hate F1: {:.4}, Fake F1: {:.4}, Hate Acc: {:.4}, Fake Acc: {:.4}",
        eval.hate_f1(), eval.fake_f1(), eval.hate_accuracy(), eval.fake_accuracy(),
    );
    Ok(())
}

fn run_preprocess(args: PreprocessArgs) -> Result<()> {
    let use_case = PreprocessUseCase::new(args.data, args.output.clone(), args.text_column)
        .with_extra_stopwords(args.extra_stopwords);
    let table = use_case.execute()?;

    println!("{}", preview(&table, args.head));
    println!("\n[{} rows x {} columns] written to {}", table.rows.len(), table.headers.len(), args.output);
    Ok(())
}
