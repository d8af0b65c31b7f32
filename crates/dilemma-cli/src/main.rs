use std::env;
use std::process::ExitCode;

use contracts::EpisodeConfig;
use dilemma_core::journal::JsonLogStore;
use dilemma_core::persona::scripted_personas;
use dilemma_core::{run_episode, DilemmaEnv};

fn print_usage() {
    println!("dilemma-cli <command>");
    println!("commands:");
    println!("  run <config.json> [storage_dir]");
    println!("    runs one scripted episode and writes log_env.json under storage_dir");
    println!("    default storage_dir: results");
    println!("  default-config [scenario]");
    println!("    prints a ready-to-edit episode config (default scenario: pg_base)");
}

fn load_config(path: &str) -> Result<EpisodeConfig, String> {
    let raw = std::fs::read_to_string(path).map_err(|err| format!("failed to read {path}: {err}"))?;
    let config: EpisodeConfig =
        serde_json::from_str(&raw).map_err(|err| format!("invalid config {path}: {err}"))?;
    config
        .validate()
        .map_err(|err| format!("invalid config {path}: {err}"))?;
    Ok(config)
}

fn run_command(args: &[String]) -> Result<(), String> {
    let config_path = args.get(2).ok_or_else(|| "missing config path".to_string())?;
    let config = load_config(config_path)?;
    let storage_dir = args.get(3).map(String::as_str).unwrap_or("results");

    let store = JsonLogStore::open(storage_dir)
        .map_err(|err| format!("failed to open log store in {storage_dir}: {err}"))?;
    let log_path = store.path().to_path_buf();

    let mut personas =
        scripted_personas(&config).map_err(|err| format!("cannot build personas: {err}"))?;
    let scenario = config.scenario.clone();
    let mut env = DilemmaEnv::new(config, Some(store))
        .map_err(|err| format!("cannot build environment: {err}"))?;

    let summary = run_episode(&mut env, &mut personas)
        .map_err(|err| format!("episode failed: {err}"))?;

    println!(
        "scenario={} rounds={} min_agents={} max_rounds={}",
        scenario, summary.rounds_played, summary.terminations.min_agents,
        summary.terminations.max_rounds
    );
    for (agent, payoff) in &summary.acc_payoffs {
        println!("  {agent} acc_payoff={payoff:.2}");
    }
    println!("log written to {}", log_path.display());
    Ok(())
}

fn default_config_command(args: &[String]) -> Result<(), String> {
    let scenario = args.get(2).map(String::as_str).unwrap_or("pg_base");
    let mut config = EpisodeConfig::default();
    config.scenario = scenario.to_string();
    config
        .validate()
        .map_err(|err| format!("invalid scenario: {err}"))?;
    let encoded = serde_json::to_string_pretty(&config)
        .map_err(|err| format!("failed to encode config: {err}"))?;
    println!("{encoded}");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("run") => run_command(&args),
        Some("default-config") => default_config_command(&args),
        _ => {
            print_usage();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
