//! Tempo forecast entry point: CLI wiring and config-driven season run.

use std::path::Path;
use std::process;

use chrono::NaiveDate;
use tracing::{info, warn};

use tempo_forecast::config::PredictorConfig;
use tempo_forecast::evaluation::EvaluationReport;
use tempo_forecast::horizon::{Horizon, MergeOutcome, PredictionLedger};
use tempo_forecast::io::export::{export_confusion, export_predictions, load_ledger, save_ledger};
use tempo_forecast::logging;
use tempo_forecast::synthetic::SeasonGenerator;
use tempo_forecast::tempo::TempoPredictor;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    predictions_out: Option<String>,
    confusion_out: Option<String>,
    ledger: Option<String>,
    today: Option<NaiveDate>,
}

fn print_help() {
    eprintln!("tempo-forecast: day-ahead Tempo color predictor");
    eprintln!();
    eprintln!("Usage: tempo-forecast [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load configuration from TOML file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        PredictorConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override synthetic season seed");
    eprintln!("  --predictions-out <path> Export daily predictions to CSV");
    eprintln!("  --confusion-out <path>   Export confusion matrix to CSV");
    eprintln!("  --ledger <path>          Merge J-1/J-2/J-3 predictions into a CSV ledger");
    eprintln!("  --today <YYYY-MM-DD>     Reference day for horizons (default: first unknown day)");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
}

/// Returns the value following flag `args[*i]`, or exits.
fn flag_value(args: &[String], i: &mut usize, what: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {} requires {what}", args[*i - 1]);
        process::exit(1);
    }
    args[*i].clone()
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        seed_override: None,
        predictions_out: None,
        confusion_out: None,
        ledger: None,
        today: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => cli.config_path = Some(flag_value(&args, &mut i, "a path argument")),
            "--preset" => cli.preset = Some(flag_value(&args, &mut i, "a name argument")),
            "--seed" => {
                let value = flag_value(&args, &mut i, "a u64 argument");
                if let Ok(s) = value.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{value}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--predictions-out" => {
                cli.predictions_out = Some(flag_value(&args, &mut i, "a path argument"));
            }
            "--confusion-out" => {
                cli.confusion_out = Some(flag_value(&args, &mut i, "a path argument"));
            }
            "--ledger" => cli.ledger = Some(flag_value(&args, &mut i, "a path argument")),
            "--today" => {
                let value = flag_value(&args, &mut i, "a YYYY-MM-DD argument");
                if let Ok(d) = value.parse::<NaiveDate>() {
                    cli.today = Some(d);
                } else {
                    eprintln!("error: --today value \"{value}\" is not a valid YYYY-MM-DD date");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Unwraps `result` or prints the error and exits.
fn or_exit<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    })
}

fn main() {
    logging::init();
    let cli = parse_args();

    // --config takes priority, then --preset, then baseline default
    let mut config = if let Some(ref path) = cli.config_path {
        or_exit(PredictorConfig::from_toml_file(Path::new(path)))
    } else if let Some(ref name) = cli.preset {
        or_exit(PredictorConfig::from_preset(name))
    } else {
        PredictorConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        config.synthetic.seed = seed;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let season = or_exit(config.season());
    let params = or_exit(config.predictor_params());

    let generated = SeasonGenerator::new(season, params.quota, &config.synthetic).generate();
    let known_days = generated.known_days();
    let records = if known_days == 0 {
        warn!("no revealed history, using realized production as forecast");
        generated.records.clone()
    } else {
        let (model, records) = or_exit(generated.with_production_forecast());
        info!(
            wind = ?model.wind.coefficients,
            solar = ?model.solar.coefficients,
            "fitted production model"
        );
        records
    };

    let predictor = or_exit(TempoPredictor::with_history(
        season,
        &generated.history,
        &records,
        params,
    ));
    let predictions = predictor.predict();
    let matrix = predictor.confusion_matrix();
    let report = EvaluationReport::from_matrix(&matrix);

    let today = cli.today.unwrap_or_else(|| {
        records
            .get(known_days)
            .map_or(season.end(), |r| r.date)
    });

    println!(
        "Season {} ..= {}: {} days, {} with known color, seed {}",
        season.start(),
        season.end(),
        records.len(),
        known_days,
        config.synthetic.seed
    );
    for p in &predictions {
        println!("{p}");
    }

    println!("\nUpcoming (today = {today}):");
    for p in predictions.iter().filter(|p| p.date > today) {
        if let Some(horizon) = Horizon::between(today, p.date) {
            println!("{horizon} {} {}", p.date, p.predicted_color);
        }
    }

    println!("\n{matrix}");
    println!("\n{report}");

    if let Some(ref path) = cli.predictions_out {
        if let Err(e) = export_predictions(&predictions, Path::new(path)) {
            eprintln!("error: failed to write predictions CSV: {e}");
            process::exit(1);
        }
        eprintln!("Predictions written to {path}");
    }

    if let Some(ref path) = cli.confusion_out {
        if let Err(e) = export_confusion(&matrix, Path::new(path)) {
            eprintln!("error: failed to write confusion CSV: {e}");
            process::exit(1);
        }
        eprintln!("Confusion matrix written to {path}");
    }

    if let Some(ref path) = cli.ledger {
        let path = Path::new(path);
        let mut ledger = or_exit(load_ledger(path));
        let outcome = ledger.merge(PredictionLedger::from_run(today, &predictions));
        if outcome != MergeOutcome::Unchanged {
            or_exit(save_ledger(&ledger, path));
        }
        eprintln!("Ledger {}: {} rows", path.display(), ledger.len());
    }
}
