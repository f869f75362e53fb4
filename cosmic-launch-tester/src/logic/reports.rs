use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use super::odds::{OddsAggregate, OddsRecord};
use crate::common::report_timestamp;

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[OddsAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if !aggregates.is_empty() {
        writeln!(out, "{}", "🎯 Odds Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "==============".yellow())?;
        writeln!(
            out,
            "{:<9} {:>8} {:>9} {:>9} {:>9} {:>9} {:>8}",
            "body", "trials", "p", "observed", "E[ret]", "ret", "spread"
        )?;
        for agg in aggregates {
            let line = format!(
                "{:<9} {:>8} {:>9.4} {:>9.4} {:>9.3} {:>9.3} {:>8.4}",
                agg.destination.name(),
                agg.trials,
                agg.strike_probability,
                agg.observed_win_rate,
                agg.expected_return,
                agg.observed_return,
                agg.max_spread_deviation
            );
            if agg.win_rate_ok() && agg.spread_ok() {
                writeln!(out, "{line}")?;
            } else {
                writeln!(out, "{}", line.red())?;
            }
        }
    }

    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Cosmic Launch Logic Test Results\n")?;
    writeln!(out, "_Generated {}_\n", report_timestamp())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {} {} (seed {})\n", status, result.scenario_name, result.seed)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, records: &[OddsRecord]) -> Result<()> {
    writeln!(out, "destination,seed,trials,wins,losses,net")?;
    for record in records {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            record.destination.name(),
            record.seed,
            record.trials,
            record.wins,
            record.losses(),
            record.net.cents()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::SeedInfo;
    use crate::logic::odds::{aggregate_odds, run_odds_analysis};

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            seed: 7,
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 2 (seed 8): boom".to_string()]
            },
            average_duration: Duration::from_millis(1),
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn markdown_lists_failures() {
        let text = render(|out| generate_markdown_report(out, &[sample_result(false)]));
        assert!(text.starts_with("# Cosmic Launch Logic Test Results"));
        assert!(text.contains("- **Failed**: 1"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn csv_has_one_row_per_record() {
        let records = run_odds_analysis(&[SeedInfo::from_numeric(3)], 20).unwrap();
        let text = render(|out| generate_csv_report(out, &records));
        assert_eq!(text.lines().count(), 1 + 8);
        assert!(text.lines().nth(1).unwrap().starts_with("Mercury,3,20,"));
    }

    #[test]
    fn console_includes_odds_table() {
        let records = run_odds_analysis(&[SeedInfo::from_numeric(3)], 20).unwrap();
        let aggregates = aggregate_odds(&records);
        let text = render(|out| {
            generate_console_report(out, &[sample_result(true)], &aggregates, Duration::ZERO)
        });
        assert!(text.contains("Odds Summary"));
        assert!(text.contains("Neptune"));
    }
}
