use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::Path;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::translation::{RunOutcome, RunReport, Translator};

// @module: Application controller for translation runs

/// Name of the ordered translated text output file
const TRANSLATED_TEXT_FILE: &str = "translated_text.txt";

/// Name of the bilingual review output file
const REVIEW_PAIRS_FILE: &str = "review_pairs.txt";

/// Name of the appended error log file
const ERROR_LOG_FILE: &str = "error_log.txt";

/// Main application controller driving one translation run end to end
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Translate the given input file and persist the outputs.
    ///
    /// Reads the preprocessed source lines, runs the batch translation with a
    /// progress bar, writes the translated text, review pairs and error log
    /// into `output_dir`, and returns the run report. Outputs are written
    /// even when the run aborts, so partial results are never lost.
    pub async fn run(&self, input_file: &Path, output_dir: &Path) -> Result<RunReport> {
        let lines = FileManager::read_lines(input_file)?;
        info!("Read {} source lines from {:?}", lines.len(), input_file);

        let translator = Translator::new(self.config.clone())?;

        // Batch count is only known once the registry is built, so the bar
        // length is set from the first progress callback.
        let progress_bar = ProgressBar::new(0);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let report = translator
            .run_with_progress(&lines, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await;

        progress_bar.finish_with_message("Translation complete");

        self.write_outputs(&report, output_dir)?;

        info!("{}", report.summary());

        if let RunOutcome::Aborted(reason) = &report.outcome {
            return Err(anyhow!("Translation run aborted: {}", reason));
        }

        Ok(report)
    }

    /// Persist the run outputs into the output directory
    pub fn write_outputs(&self, report: &RunReport, output_dir: &Path) -> Result<()> {
        FileManager::ensure_dir(output_dir)?;

        FileManager::write_to_file(
            output_dir.join(TRANSLATED_TEXT_FILE),
            &report.translated.concat(),
        )?;

        if !report.review_pairs.is_empty() {
            FileManager::write_to_file(
                output_dir.join(REVIEW_PAIRS_FILE),
                &report.review_pairs.concat(),
            )?;
        }

        let error_log_path = output_dir.join(ERROR_LOG_FILE);
        for entry in &report.error_log {
            FileManager::append_to_log_file(&error_log_path, entry)?;
        }

        info!("Translated text has been written to {:?}", output_dir.join(TRANSLATED_TEXT_FILE));
        if !report.error_log.is_empty() {
            info!("Errors have been written to {:?}", error_log_path);
        }

        Ok(())
    }
}
