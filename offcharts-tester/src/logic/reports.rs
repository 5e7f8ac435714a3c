use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    #[allow(clippy::cast_precision_loss)]
    let rate = (passed as f64 / results.len() as f64) * 100.0;
    rate
}

fn mean_score(result: &ScenarioResult) -> Option<f64> {
    if result.scores.is_empty() {
        return None;
    }
    let total: u32 = result.scores.iter().sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = f64::from(total) / result.scores.len() as f64;
    Some(mean)
}

fn short_fingerprint(result: &ScenarioResult) -> &str {
    result.fingerprint.get(..12).unwrap_or(&result.fingerprint)
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Scenario Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total runs: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
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
            "{status} {} [{} {}]",
            result.scenario_name.bold(),
            result.date_key,
            result.variant
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if let Some(mean) = mean_score(result) {
            writeln!(out, "   Mean score: {mean:.1}")?;
        }
        if !result.scores.is_empty() {
            writeln!(out, "   Fingerprint: {}", short_fingerprint(result))?;
        }
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Off the Charts Scenario Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    writeln!(out, "| | Scenario | Puzzle | Variant | Iterations | Mean score | Avg time |")?;
    writeln!(out, "|---|---|---|---|---|---|---|")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        let mean = mean_score(result).map_or_else(|| "-".to_string(), |m| format!("{m:.1}"));
        writeln!(
            out,
            "| {status} | {} | {} | {} | {}/{} | {mean} | {:?} |",
            result.scenario_name,
            result.date_key,
            result.variant,
            result.successful_iterations,
            result.iterations_run,
            result.average_duration
        )?;
    }

    let failed: Vec<&ScenarioResult> = results.iter().filter(|r| !r.passed).collect();
    if !failed.is_empty() {
        writeln!(out, "\n## Failures\n")?;
        for result in failed {
            writeln!(
                out,
                "### {} ({} {})\n",
                result.scenario_name, result.date_key, result.variant
            )?;
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use offcharts_game::Variant;

    fn sample(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            date_key: "2025-12-10-v1".to_string(),
            variant: Variant::Pair,
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 2 (seed 1338): game should be complete".to_string()]
            },
            average_duration: Duration::from_millis(3),
            scores: if passed { vec![50, 61] } else { vec![50] },
            fingerprint: "0123456789abcdef".to_string(),
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        let out: &mut dyn Write = &mut buffer;
        f(out).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_lists_failures_and_means() {
        colored::control::set_override(false);
        let text = render(|out| {
            generate_console_report(out, &[sample(true), sample(false)], Duration::from_secs(1))
        });
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("Mean score: 55.5"));
        assert!(text.contains("Fingerprint: 0123456789ab"));
        assert!(text.contains("game should be complete"));
    }

    #[test]
    fn json_report_is_an_array() {
        let text = render(|out| generate_json_report(out, &[sample(true)]));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["scenario_name"], "Smoke Test");
        assert_eq!(value[0]["scores"], serde_json::json!([50, 61]));
    }

    #[test]
    fn markdown_report_has_table_and_failures() {
        let text = render(|out| generate_markdown_report(out, &[sample(true), sample(false)]));
        assert!(text.starts_with("# Off the Charts Scenario Results"));
        assert!(text.contains("| ✅ | Smoke Test | 2025-12-10-v1 | pair | 2/2 | 55.5 |"));
        assert!(text.contains("## Failures"));
    }
}
