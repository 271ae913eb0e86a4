//! Calorie predictor - Main Entry Point
//!
//! Trains the models on the exercise and calories datasets, then predicts
//! from command-line flags or the interactive form.

use calorie_predictor::cli::{cmd_info, cmd_interactive, cmd_predict, cmd_train, Cli, Commands, WorkoutForm};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calorie_predictor=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Train { json }) => {
            cmd_train(&cli.data, json)?;
        }
        Some(Commands::Predict {
            gender,
            age,
            height,
            weight,
            duration,
            heart_rate,
            body_temp,
            activity,
            save,
            save_model,
            history,
        }) => {
            let form = WorkoutForm {
                gender,
                age,
                height,
                weight,
                duration,
                heart_rate,
                body_temp,
                activity,
            };
            cmd_predict(&cli.data, form, save.then_some(save_model), &history)?;
        }
        Some(Commands::Info) => {
            cmd_info(&cli.data)?;
        }
        None => {
            cmd_interactive(&cli.data)?;
        }
    }

    Ok(())
}
