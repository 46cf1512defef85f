// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::time::Instant;
use tracing::{info, warn};
use weighted_bisect::bisect::{analyse_files, dataset_files};
use weighted_bisect::cli::{Args, Command, CurveArgs};
use weighted_bisect::model::{load_case_stats, save_json, CaseStats};
use weighted_bisect::simulate::{simulate, SimulationConfig};
use weighted_bisect::stats::{target_buckets, Summary};
use weighted_bisect::{analyzer, logging, RegFunc, WeightFunction};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(logging::default_level(args.verbose, args.quiet));
    let start_time = Instant::now();

    match args.command {
        Command::Collect { repo, output, name } => {
            let mut dataset = analyzer::analyze(&repo)
                .with_context(|| format!("failed to analyze repository {}", repo.display()))?;
            if name.is_some() {
                dataset.name = name;
            }
            println!(
                "Collected {} commits and {} reverts.",
                dataset.order.len(),
                dataset.reverts.len()
            );
            dataset.save(&output)?;
        }
        Command::Analyse { input, output, metric, profile, curve } => {
            let weights = match profile {
                Some(profile) => WeightFunction::Profile(profile),
                None => WeightFunction::new(metric, regression_curve(&curve)?),
            };
            if weights.evaluates_undefined_zero() {
                warn!("weight curve is undefined at x = 0 and is evaluated there for each window start");
            }

            let files = dataset_files(&input)?;
            info!("Analysing {} dataset files with {:?}", files.len(), weights);
            let analyses = analyse_files(&files, &weights);

            let cases: Vec<CaseStats> = analyses.into_iter().flat_map(|a| a.cases).collect();
            println!("{}", Summary::from_cases(&cases));
            save_json(&output, &cases)?;
        }
        Command::Stats { inputs, buckets } => {
            for path in inputs {
                let cases = load_case_stats(&path)?;
                let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
                println!("Statistics for: {name}");
                println!("{}", Summary::from_cases(&cases));
                let counts: Vec<String> = target_buckets(&cases, buckets).iter().map(usize::to_string).collect();
                println!("Buckets: {}", counts.join(", "));
            }
        }
        Command::Simulate { max_commits, max_lines, runs, seed } => {
            let report = simulate(&SimulationConfig { max_commits, max_lines, runs, seed })?;
            println!("{report}");
        }
    }

    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn regression_curve(args: &CurveArgs) -> Result<Option<RegFunc>> {
    if let Some(path) = &args.regfunc {
        let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let curve: RegFunc = serde_json::from_str(&text)
            .with_context(|| format!("malformed curve descriptor {}", path.display()))?;
        return Ok(Some(curve.validate()?));
    }

    match args.curve {
        Some(kind) => {
            let curve = RegFunc::new(kind, args.coefficients.clone(), args.negative_power).validate()?;
            info!("Weighting with {curve}");
            Ok(Some(curve))
        }
        None => Ok(None),
    }
}
