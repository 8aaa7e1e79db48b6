// src/main.rs

mod cli;
mod config;
mod estimator;
mod model;
mod parser;
mod repo;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use config::EstimatorConfig;
use env_logger::{Builder, Env};
use estimator::Estimator;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use repo::Repo;
use report::{DeveloperReport, ReportWriter, Summary, HOURS_PER_DAY, HOURS_PER_WEEK};
use std::collections::HashMap;
use std::process::ExitCode;
use std::time::Instant;

const LOG_ENV: &str = "COMMIT_HOURS_LOG";

fn main() -> ExitCode {
    Builder::from_env(Env::new().filter_or(LOG_ENV, "warn")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let repo = Repo::open(&args.repo)?;
    let estimator = match &args.config {
        Some(path) => Estimator::new(EstimatorConfig::load(path)?),
        None => Estimator::default(),
    };
    let writer = ReportWriter::new(&args.output)?;

    println!("Repository: {}", repo.path().display());
    println!("Output directory: {}", writer.dir().display());

    let authors = repo.authors().context("failed to list authors")?;
    println!("Found {} developers", authors.len());

    // A name shared by several emails gets one report per email, named after the email.
    let mut name_count: HashMap<&str, usize> = HashMap::new();
    for author in &authors {
        *name_count.entry(author.name.as_str()).or_default() += 1;
    }

    let bar = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(authors.len() as u64)
    };
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);

    let mut developers = Vec::new();
    for author in &authors {
        bar.set_message(author.name.clone());

        let raw = repo.log_for(author).with_context(|| format!("failed to read history of {}", author))?;
        let commits = parser::parse(&raw);
        if commits.is_empty() {
            warn!("no commits found for {}", author);
            bar.inc(1);
            continue;
        }

        let estimated = estimator.estimate_all(commits);
        let report = DeveloperReport::assemble(&author.name, &estimated);
        let filename_base = if name_count[author.name.as_str()] > 1 { &author.email } else { &author.name };
        let path = writer.write_developer(&report, filename_base)?;

        bar.suspend(|| {
            println!(
                "{}: {} commits, {:.2}h -> {}",
                author.name,
                report.total_commits,
                report.total_hours,
                path.display()
            )
        });
        developers.push(report.totals());
        bar.inc(1);
    }
    bar.finish_and_clear();

    let summary = Summary::new(developers, chrono::Utc::now());
    let summary_path = writer.write_summary(&summary)?;

    println!("Processed {} developers in {:.2?}", summary.total_developers, start_time.elapsed());
    println!("Grand Total Hours: {:.2}h", summary.grand_total_hours);
    println!("Grand Total Days: {:.2} days", summary.grand_total_hours / HOURS_PER_DAY);
    println!("Grand Total Weeks: {:.2} weeks", summary.grand_total_hours / HOURS_PER_WEEK);
    println!("Summary saved to: {}", summary_path.display());

    Ok(())
}
