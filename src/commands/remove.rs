use crate::batch::{expand_inputs, BatchInputs, Destination, Outcome, PageRemovalBatch, SkipReason};
use crate::config::Config;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Answers from command-line flags, falling back to a stdin prompt for
/// anything not given.
pub struct PromptInputs<R> {
    pages: Option<String>,
    password: Option<String>,
    reader: R,
}

impl<R: BufRead> PromptInputs<R> {
    pub fn new(pages: Option<String>, password: Option<String>, reader: R) -> Self {
        Self {
            pages,
            password,
            reader,
        }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        eprint!("{}: ", question);
        io::stderr().flush().ok();

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let answer = line.trim();
                (!answer.is_empty()).then(|| answer.to_string())
            }
        }
    }
}

impl<R: BufRead> BatchInputs for PromptInputs<R> {
    fn pages(&mut self, source: &Path) -> Option<String> {
        if let Some(pages) = &self.pages {
            return Some(pages.clone());
        }
        self.ask(&format!(
            "Pages to remove from {} (comma-separated)",
            display_name(source)
        ))
    }

    fn password(&mut self, source: &Path) -> Option<String> {
        if let Some(password) = &self.password {
            return Some(password.clone());
        }
        self.ask(&format!("Password for {}", display_name(source)))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn run(
    config: &Config,
    inputs: &[PathBuf],
    pages: Option<String>,
    output_dir: Option<PathBuf>,
    password: Option<String>,
) -> Result<()> {
    let destination = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            Destination::Directory(dir)
        }
        None => Destination::Suffix(config.modified_suffix.clone()),
    };

    let sources = expand_inputs(inputs);
    if sources.is_empty() {
        anyhow::bail!("No PDF files found");
    }

    let batch = PageRemovalBatch {
        destination,
        unlocked_prefix: config.unlocked_prefix.clone(),
    };
    let stdin = io::stdin();
    let mut prompt = PromptInputs::new(pages, password, stdin.lock());
    let report = batch.run(&sources, &mut prompt);

    for doc in &report.documents {
        match &doc.outcome {
            Outcome::Written(path) => {
                println!("{} -> {}", doc.source.display(), path.display())
            }
            Outcome::Skipped(SkipReason::NoPagesGiven) => {
                println!("{}: skipped, no pages selected", doc.source.display())
            }
            Outcome::Skipped(SkipReason::NoPassword) => {
                println!("{}: skipped, password required", doc.source.display())
            }
            Outcome::Failed(err) => println!("{}: error: {}", doc.source.display(), err),
        }
    }

    println!(
        "\n{} written, {} skipped, {} failed.",
        report.written(),
        report.skipped(),
        report.failed()
    );

    if report.failed() > 0 {
        anyhow::bail!("{} of {} file(s) failed", report.failed(), sources.len());
    }
    Ok(())
}
