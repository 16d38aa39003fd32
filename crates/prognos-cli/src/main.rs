use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use serde::Serialize;

use prognos_classifiers::{BacteriaPredictor, HospitalPredictor};
use prognos_cli::config::{load_server_config, ServerConfig};
use prognos_cli::server;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("PROGNOS_LOG", "error,prognos=info"))
        .init();

    let matches = Command::new("prognos")
        .version(clap::crate_version!())
        .about("\u{1FA7A} prognos - tabular readmission and microbiome classifiers over HTTP")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Load both models and serve the prediction endpoints")
                .arg(
                    Arg::new("config")
                        .help("Path to server JSON configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .env("PROGNOS_BIND")
                        .help("Address to listen on, e.g. 0.0.0.0:8000")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Hostname),
                )
                .arg(
                    Arg::new("data_dir")
                        .long("data-dir")
                        .env("PROGNOS_DATA_DIR")
                        .help("Working directory uploaded files are written to")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("hospital_model")
                        .long("hospital-model")
                        .env("PROGNOS_HOSPITAL_MODEL")
                        .help("Readmission XGBoost model (*.json)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("bacteria_model")
                        .long("bacteria-model")
                        .env("PROGNOS_BACTERIA_MODEL")
                        .help("16S abundance XGBoost model (*.json)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("taxonomy")
                        .long("taxonomy")
                        .env("PROGNOS_TAXONOMY")
                        .help("CSV mapping OTU codes to taxonomy strings")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("max_upload_age")
                        .long("max-upload-age")
                        .env("PROGNOS_MAX_UPLOAD_AGE")
                        .help("Delete persisted uploads older than this many seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("no_cors")
                        .long("no-cors")
                        .help("Do not send CORS headers.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Run one of the prediction pipelines on a local CSV file")
                .arg(
                    Arg::new("model")
                        .help("Which pipeline to run")
                        .required(true)
                        .value_parser(["hospital", "bacteria"]),
                )
                .arg(
                    Arg::new("input")
                        .help("Path to the input CSV file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Server JSON configuration naming the model files")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Path to write the JSON result. Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("serve", sub_m)) => handle_serve(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn config_from(path: Option<&PathBuf>) -> Result<ServerConfig> {
    match path {
        Some(path) => {
            log::info!("[Prognos::Config] Using config: {:?}", path);
            load_server_config(path)
        }
        None => {
            log::info!("[Prognos::Config] No config provided; using defaults.");
            Ok(ServerConfig::default())
        }
    }
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let mut config = config_from(matches.get_one::<PathBuf>("config"))?;
    config.apply_overrides(matches);
    log::debug!(
        "[Prognos::Config] Effective config:\n{}",
        serde_json::to_string_pretty(&config).unwrap_or_default()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    match runtime.block_on(server::serve(config)) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Server failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output: {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let pipeline = matches
        .get_one::<String>("model")
        .map(String::as_str)
        .unwrap_or("hospital");
    let input: &PathBuf = matches
        .get_one("input")
        .context("input CSV is required")?;
    let output: Option<&PathBuf> = matches.get_one("output_file");
    let config = config_from(matches.get_one::<PathBuf>("config"))?;

    let result = match pipeline {
        "hospital" => {
            let predictor = HospitalPredictor::from_model_path(&config.hospital_model)?;
            predictor
                .predict_path(input)
                .map_err(anyhow::Error::from)
                .and_then(|report| write_json(&report, output))
        }
        "bacteria" => {
            let predictor =
                BacteriaPredictor::from_paths(&config.bacteria_model, &config.taxonomy)?;
            predictor
                .predict_path(input)
                .map_err(anyhow::Error::from)
                .and_then(|report| write_json(&report, output))
        }
        other => anyhow::bail!("Unknown pipeline: {}", other),
    };

    match result {
        Ok(()) => {
            log::info!("[Prognos::Predict] Wrote {} predictions for {:?}", pipeline, input);
            Ok(())
        }
        Err(e) => {
            log::error!("Prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
