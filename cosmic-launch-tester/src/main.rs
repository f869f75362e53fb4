mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{get_scenario, list_scenarios};
use common::split_csv;
use logic::{
    LogicTester, OddsAggregate, OddsRecord, SeedInfo, aggregate_odds, resolve_seed_inputs,
    run_odds_analysis, validate_odds_targets,
};

/// Odds trials per destination and seed for each requested iteration.
const TRIALS_PER_ITERATION: usize = 100;
/// Floor applied to odds trials in acceptance mode.
const ACCEPTANCE_TRIALS: usize = 2_000;

#[derive(Debug, Parser)]
#[command(name = "cosmic-launch-tester", version = "0.1.0")]
#[command(about = "Automated logic testing and odds analysis for Cosmic Launch")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated, decimal or 0x-hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Run the odds acceptance sweep (forces at least 2000 trials per destination)
    #[arg(long)]
    acceptance: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let seeds: Vec<u64> = seed_infos.iter().map(|s| s.seed).collect();
    if args.verbose {
        let labels: Vec<&str> = seed_infos.iter().map(|s| s.label.as_str()).collect();
        println!("🌱 Seeds: {}", labels.join(", "));
    }

    let all_results = run_logic_scenarios(&args, &scenarios, &seeds);
    let odds_trials = compute_odds_trials(&args);
    let (odds_records, odds_aggregates) = gather_odds(&args, &seed_infos, odds_trials)?;

    write_reports(
        &args,
        &all_results,
        odds_records.as_deref(),
        odds_aggregates.as_deref(),
        start_time,
    )?;

    if let Some(aggregates) = odds_aggregates.as_ref() {
        validate_odds_targets(aggregates)?;
    }

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:20} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🚀 Cosmic Launch Automated Tester".bright_cyan().bold());
    println!("{}", "=================================".cyan());
}

fn compute_odds_trials(args: &Args) -> usize {
    let base = args.iterations.saturating_mul(TRIALS_PER_ITERATION);
    if args.acceptance {
        if base < ACCEPTANCE_TRIALS {
            println!(
                "🔁 Acceptance mode enabled: increasing odds trials from {base} to {ACCEPTANCE_TRIALS}"
            );
        } else {
            println!("🔁 Acceptance mode enabled: using {base} odds trials");
        }
        base.max(ACCEPTANCE_TRIALS)
    } else {
        base
    }
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
) -> Vec<logic::ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let logic_tester = LogicTester::new(args.verbose);
    let mut results = Vec::new();

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

type OddsSummary = (Option<Vec<OddsRecord>>, Option<Vec<OddsAggregate>>);

fn gather_odds(args: &Args, seed_infos: &[SeedInfo], trials: usize) -> Result<OddsSummary> {
    let require_odds = args.acceptance || matches!(args.report.as_str(), "console" | "csv");
    if !require_odds || trials == 0 {
        return Ok((None, None));
    }
    let records = run_odds_analysis(seed_infos, trials)?;
    let aggregates = aggregate_odds(&records);
    Ok((Some(records), Some(aggregates)))
}

fn write_reports(
    args: &Args,
    results: &[logic::ScenarioResult],
    odds_records: Option<&[OddsRecord]>,
    odds_aggregates: Option<&[OddsAggregate]>,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Cosmic Launch Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => {
            if let Some(records) = odds_records {
                logic::reports::generate_csv_report(&mut output_target, records)?;
            } else {
                writeln!(&mut output_target, "[]")?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    odds_aggregates.unwrap_or(&[]),
                    duration,
                )?;
            }
        }
    }

    if args.report != "json" && args.report != "csv" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
