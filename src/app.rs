//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the forecasting pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, ForecastArgs, RunArgs, SampleArgs};
use crate::error::AppError;
use crate::eval::CvConfig;
use crate::io::{ModelFile, write_forecast_csv, write_model_json, write_series_csv};

pub mod pipeline;

/// Entry point for the `gasfc` binary.
pub fn run() -> Result<(), AppError> {
    // `gasfc` and `gasfc --no-cv` behave like `gasfc run ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Forecast(args) => handle_forecast(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    tracing::info!(data = %args.data.display(), cutoff = %config.cutoff, seed = config.seed, "starting run");
    let run = pipeline::run_pipeline(&args.data, &config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.series, &run.split, &run.fitted)
    );
    println!("{}", crate::report::format_evaluation(&run.evaluation));

    if let (Some(summary), Some(cv)) = (&run.cv, &config.cross_validation) {
        println!("{}", crate::report::format_cv_summary(summary, cv, args.cv_rows));
    }

    if args.plot {
        let plot = crate::plot::render_forecast_plot(
            run.series.observations(),
            &run.forecast,
            Some(run.split.cutoff),
            args.width,
            args.height,
        );
        println!("{plot}");
    }

    if let Some(path) = &args.export {
        write_forecast_csv(path, &run.forecast, Some(&run.split))?;
    }
    if let Some(path) = &args.export_model {
        write_model_json(path, &ModelFile::new(run.fitted.clone(), run.windows.clone()))?;
    }

    Ok(())
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let forecast = pipeline::forecast_from_model_file(&args.model, args.periods, args.seed)?;
    println!("{}", crate::report::format_forecast_table(&forecast));
    if let Some(path) = &args.export {
        write_forecast_csv(path, &forecast, None)?;
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let series = pipeline::synthetic_series(args.start, args.end, args.seed)?;
    write_series_csv(&args.out, &series)?;
    println!("Wrote {} months to {}", series.len(), args.out.display());
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> pipeline::RunConfig {
    pipeline::RunConfig {
        cross_validation: (!args.no_cv).then(CvConfig::default),
        ..pipeline::RunConfig::new(args.cutoff, args.seed)
    }
}

/// Rewrite argv so `gasfc` defaults to `gasfc run`.
///
/// Rules:
/// - `gasfc`                      -> `gasfc run`
/// - `gasfc --no-cv ...`          -> `gasfc run --no-cv ...`
/// - `gasfc --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "forecast" | "sample");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_run() {
        assert_eq!(rewrite_args(argv(&["gasfc"])), argv(&["gasfc", "run"]));
        assert_eq!(
            rewrite_args(argv(&["gasfc", "--no-cv", "--plot"])),
            argv(&["gasfc", "run", "--no-cv", "--plot"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        for args in [
            argv(&["gasfc", "--help"]),
            argv(&["gasfc", "-V"]),
            argv(&["gasfc", "sample", "--out", "x.csv"]),
            argv(&["gasfc", "forecast", "--model", "m.json"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    #[test]
    fn no_cv_flag_disables_cross_validation() {
        let cli = crate::cli::Cli::parse_from(rewrite_args(argv(&["gasfc", "--no-cv"])));
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(run_config_from_args(&args).cross_validation.is_none());
    }
}
