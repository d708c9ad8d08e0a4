//! Replay a scripted conversation through the engine, offline.
//!
//! Reads one student utterance per line (blank lines and `#` comments are
//! skipped) from FILE, or stdin when no file is given, and prints the step,
//! phase and emotional state after every turn.
//!
//! ```bash
//! cargo run --bin replay -- script.txt
//! cargo run --bin replay -- --transcript --config engine.yaml < script.txt
//! ```

use std::io::Read;

use anyhow::{bail, Context};
use eqcoach::config::{EngineConfig, SessionConfig};
use eqcoach::dialogue::build_transcript;
use eqcoach::engine::CoachingEngine;

struct Args {
    script: Option<String>,
    config: Option<String>,
    transcript: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        script: None,
        config: None,
        transcript: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--transcript" => args.transcript = true,
            "--config" => {
                args.config = Some(iter.next().context("--config needs a path")?);
            }
            "-h" | "--help" => {
                println!("usage: replay [--config FILE] [--transcript] [SCRIPT]");
                std::process::exit(0);
            }
            flag if flag.starts_with('-') => bail!("unknown flag: {flag}"),
            _ if args.script.is_some() => bail!("only one script may be given"),
            script => args.script = Some(script.to_string()),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config {path}"))?,
        None => EngineConfig::load()?,
    };

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let utterances: Vec<&str> = script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    let engine = CoachingEngine::standalone(config)?;
    let mut state = engine.init_session(&SessionConfig::default())?;

    for (turn, utterance) in utterances.iter().enumerate() {
        if engine.is_complete(&state) {
            println!("session complete; {} line(s) left unplayed", utterances.len() - turn);
            break;
        }
        state = engine.run_turn(utterance, &state).await?;
        println!(
            "turn {:>2} -> {:<32} [{}] {}",
            state.turn_count,
            state.step_id,
            state.phase,
            state.emotional.summary()
        );
    }

    println!("{}", state.progress_summary());
    if args.transcript {
        let transcript = build_transcript(&state, None, None);
        println!("{}", serde_json::to_string_pretty(&transcript)?);
    }
    Ok(())
}
