// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use crate::app_config::Config;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod errors;
mod file_utils;
mod jp_text;
mod providers;
mod translation;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

/// honyaku - AI-powered batch translation for preprocessed Japanese text
///
/// Reads a text file produced by the preprocessing stage, translates it in
/// concurrent batches through a remote LLM service, and writes the ordered
/// translated text, bilingual review pairs and error log.
#[derive(Parser, Debug)]
#[command(name = "honyaku")]
#[command(version = "1.0.0")]
#[command(about = "AI-powered batch translation for preprocessed Japanese text")]
#[command(long_about = "honyaku translates preprocessed Japanese text in concurrent batches using a remote LLM service.

EXAMPLES:
    honyaku preprocessed.txt                    # Translate using default config
    honyaku -c rules.json preprocessed.txt      # Use a specific config file
    honyaku -o out preprocessed.txt             # Write outputs into ./out
    honyaku --log-level debug preprocessed.txt  # Verbose logging

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config-path. If the config file doesn't
    exist, a default one will be created automatically; set your API key
    there before running again.")]
struct CommandLineOptions {
    /// Input text file with preprocessed source lines
    #[arg(value_name = "INPUT_FILE")]
    input_file: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Output directory for translated text, review pairs and error log
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    // Load the config, creating a default one on first run
    let config = if file_utils::FileManager::file_exists(&cli.config_path) {
        Config::from_file(&cli.config_path)?
    } else {
        let config = Config::default();
        config
            .to_file(&cli.config_path)
            .with_context(|| format!("Failed to create default config at {}", cli.config_path))?;
        info!(
            "Created default configuration at {}; set your API key there and run again",
            cli.config_path
        );
        config
    };

    // Command-line log level wins over the config file
    let effective_level = cli
        .log_level
        .map(app_config::LogLevel::from)
        .unwrap_or_else(|| config.log_level.clone());
    log::set_max_level(level_filter(&effective_level));

    let controller = Controller::with_config(config)?;
    let report = controller.run(&cli.input_file, &cli.output_dir).await?;

    println!("{}", report.summary());

    Ok(())
}
