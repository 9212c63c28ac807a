// ABOUTME: Platewise CLI - compare meal photo analyses across providers from the terminal
// ABOUTME: Runs a comparison, prints every outcome, and records the chosen answers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Compare every provider with a credential (plus on-device)
//! platewise analyze lunch.jpg
//!
//! # Only ask two providers, then keep Claude's answer
//! platewise analyze lunch.jpg --only claude,gemini --choose claude
//!
//! # A single provider
//! platewise analyze lunch.jpg --provider openai
//!
//! # Machine-readable report
//! platewise analyze lunch.jpg --json
//!
//! # Which providers would run
//! platewise providers
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use platewise::comparison::{ComparisonReport, Orchestrator};
use platewise::credentials::env_var_name;
use platewise::logging::LoggingConfig;
use platewise::selection::{self, InMemoryFeedbackSink, Selection};
use platewise_core::{AnalysisRequest, ProviderId};
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "platewise",
    version,
    about = "Multi-provider meal photo analysis",
    long_about = "Sends a meal photo to every configured vision provider at once and compares their calorie estimates."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a meal photo
    Analyze {
        /// Path to the photo (JPEG, PNG, WebP, GIF or BMP)
        image: PathBuf,

        /// Restrict the comparison to these providers (comma-separated)
        #[arg(long, value_delimiter = ',', conflicts_with = "provider")]
        only: Vec<ProviderId>,

        /// Analyze with a single provider instead of comparing
        #[arg(long)]
        provider: Option<ProviderId>,

        /// Providers whose answers to keep (comma-separated)
        #[arg(long, value_delimiter = ',')]
        choose: Vec<ProviderId>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which providers are eligible
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging = logging.with_level("debug");
    }
    logging.init()?;

    let orchestrator = Orchestrator::from_env()?;

    match cli.command {
        Command::Analyze {
            image,
            only,
            provider,
            choose,
            json,
        } => analyze(&orchestrator, image, &only, provider, &choose, json).await,
        Command::Providers => {
            providers(&orchestrator);
            Ok(())
        }
    }
}

async fn analyze(
    orchestrator: &Orchestrator,
    image: PathBuf,
    only: &[ProviderId],
    provider: Option<ProviderId>,
    choose: &[ProviderId],
    json: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    let request = AnalysisRequest::new(bytes).with_captured_at(chrono::Utc::now());
    info!(path = %image.display(), "Analyzing meal photo");

    let report = match provider {
        Some(provider) => ComparisonReport::from_outcomes(
            vec![orchestrator.analyze_with(provider, &request).await],
            request.captured_at(),
        ),
        None if only.is_empty() => orchestrator.compare_all(&request).await,
        None => orchestrator.compare(&request, only).await,
    };

    let selection = report.select(choose)?;

    if json {
        let output = json!({
            "report": report,
            "selection": selection,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&report);
        print_selection(&selection);
    }

    let sink = InMemoryFeedbackSink::new();
    selection::submit(selection, &sink).await?;

    match report.failure_summary() {
        Some(summary) => Err(anyhow!("Every provider failed:\n{summary}")),
        None if report.total() == 0 => Err(anyhow!("No provider was eligible")),
        None => Ok(()),
    }
}

fn print_report(report: &ComparisonReport) {
    for success in &report.successes {
        let result = &success.result;
        println!(
            "{:<14} {:>6.2}s  {} - {} kcal [{}]",
            success.provider.display_name(),
            success.elapsed.as_secs_f64(),
            result.food_name,
            result.calorie_estimate,
            result.rating_category().display_name(),
        );
        if !result.reasoning.is_empty() {
            println!("{:<24}{}", "", result.reasoning);
        }
    }
    for failure in &report.failures {
        println!(
            "{:<14} {:>6.2}s  failed: {}",
            failure.provider.display_name(),
            failure.elapsed.as_secs_f64(),
            failure.error.description(),
        );
    }
}

fn print_selection(selection: &Selection) {
    for meal in &selection.meals {
        println!(
            "Saved {} ({} kcal, {}) from {}",
            meal.food_name,
            meal.calorie_estimate,
            meal.rating,
            meal.provider.display_name()
        );
    }
}

fn providers(orchestrator: &Orchestrator) {
    let eligible = orchestrator.eligible_providers();
    for provider in ProviderId::ALL {
        let status = match (provider, eligible.contains(&provider)) {
            (ProviderId::OnDevice, _) if orchestrator.on_device().is_available() => {
                "ready".to_owned()
            }
            (ProviderId::OnDevice, _) => "no model asset".to_owned(),
            (_, true) => "ready".to_owned(),
            (_, false) => format!(
                "set {} to enable",
                env_var_name(provider).unwrap_or("a credential")
            ),
        };
        println!(
            "{:<14} {:<28} {}",
            provider.display_name(),
            orchestrator.config().model_name(provider),
            status
        );
    }
}
