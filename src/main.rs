//! text2speech command line entry point
//!
//! Synthesizes the given text with the configured engine and prints the
//! path of every produced audio chunk, in playback order.

use anyhow::{bail, Context};
use log::{error, info};
use serde_json::Value;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use text2speech::config::{Settings, TtsConfig};
use text2speech::SynthesisPipeline;

const USAGE: &str = "Usage: text2speech [--debug] [--config FILE] [--lang L] [--voice V] \
[--listen] [--clear-cache] TEXT...";

#[derive(Debug, Default)]
struct Args {
    debug: bool,
    config: Option<PathBuf>,
    lang: Option<String>,
    voice: Option<String>,
    listen: bool,
    clear_cache: bool,
    text: Vec<String>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut args = Args::default();

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--debug" | "-d" => args.debug = true,
            "--listen" => args.listen = true,
            "--clear-cache" => args.clear_cache = true,
            "--config" => args.config = Some(value(&mut raw, &arg)?.into()),
            "--lang" => args.lang = Some(value(&mut raw, &arg)?),
            "--voice" => args.voice = Some(value(&mut raw, &arg)?),
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            "--" => args.text.extend(raw.by_ref()),
            s if s.starts_with("--") => bail!("Unknown option {}\n{}", s, USAGE),
            other => args.text.push(other.to_string()),
        }
    }
    Ok(args)
}

fn value(raw: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    match raw.next() {
        Some(v) => Ok(v),
        None => bail!("{} needs a value\n{}", flag, USAGE),
    }
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    if args.debug {
        // Debug mode: write to text2speech.log
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("text2speech.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open text2speech.log for debug logging: {}", e);
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }
        info!(
            "text2speech version {} starting (debug mode)",
            text2speech::VERSION
        );
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    if let Err(e) = run(args) {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;

    let mut config = match &args.config {
        Some(path) => TtsConfig::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => TtsConfig::default(),
    };
    if args.lang.is_some() || args.voice.is_some() {
        let mut section = config.section()?;
        if let Some(lang) = &args.lang {
            section.insert("lang".to_string(), Value::String(lang.clone()));
        }
        if let Some(voice) = &args.voice {
            section.insert("voice".to_string(), Value::String(voice.clone()));
        }
        config = config.with_section(section);
    }

    let pipeline = SynthesisPipeline::from_config(&config, &settings)
        .with_context(|| format!("starting {} engine", config.module))?;

    if args.clear_cache {
        let removed = pipeline.clear_cache().context("clearing cache")?;
        info!("Removed {} cached files", removed);
        if args.text.is_empty() {
            return Ok(());
        }
    }

    let text = if args.text.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading text from stdin")?;
        text
    } else {
        args.text.join(" ")
    };
    if text.trim().is_empty() {
        bail!("Nothing to say\n{}", USAGE);
    }

    let utterance = pipeline.utterance(text);
    pipeline.execute(&utterance, None, args.listen)?;
    while let Some(item) = pipeline.deliver() {
        println!("{}", item.path.display());
    }
    Ok(())
}
