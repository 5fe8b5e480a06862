//! Run summary and verification output.
//!
//! Line rendering is kept separate from printing so it can be tested without
//! a terminal. Color is applied only when printing.

use colored::Colorize;
use sdkref_core::{GenerationResult, RunTotals, VerificationReport};

fn sdk_line(key: &str, result: &GenerationResult) -> String {
    let mut line = format!(
        "  {key:<32} generated {:>3}  failed {:>3}",
        result.generated, result.failed
    );
    if !result.failed_versions.is_empty() {
        line.push_str(&format!("  ({})", result.failed_versions.join(", ")));
    }
    line
}

/// Plain-text summary lines: one per SDK, then the totals.
#[must_use]
pub fn summary_lines(totals: &RunTotals) -> Vec<String> {
    let mut lines: Vec<String> = totals
        .sdks
        .iter()
        .map(|(key, result)| sdk_line(key, result))
        .collect();
    lines.push(format!(
        "Total: {} generated, {} failed",
        totals.generated(),
        totals.failed()
    ));
    lines
}

/// Print the run summary to stdout.
pub fn print_summary(totals: &RunTotals) {
    println!();
    println!("{}", "SDK reference generation summary".bold());
    let lines = summary_lines(totals);
    let (total, per_sdk) = lines.split_last().map_or((None, &[][..]), |(t, rest)| (Some(t), rest));
    for line in per_sdk {
        println!("{line}");
    }
    if let Some(total) = total {
        if totals.failed() == 0 {
            println!("{}", total.green());
        } else {
            println!("{}", total.yellow());
        }
    }
}

/// Print an abort notice for the SDK that stopped the run.
pub fn print_abort(sdk: &str, reason: &str, failed_versions: &[String]) {
    eprintln!(
        "{} {sdk}: {reason} ({})",
        "Aborted".red().bold(),
        failed_versions.join(", ")
    );
}

/// Print verification findings; warnings before errors.
pub fn print_verification(report: &VerificationReport, docs_json_errors: &[String]) {
    for warning in &report.warnings {
        eprintln!("{} {warning}", "warning:".yellow());
    }
    for error in report.errors.iter().chain(docs_json_errors) {
        eprintln!("{} {error}", "error:".red());
    }
    println!(
        "Verified {} pages across {} SDKs and {} versions",
        report.stats.total_pages, report.stats.total_sdks, report.stats.total_versions
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines() {
        // Given: one clean SDK and one with a failed version
        let mut totals = RunTotals::default();
        let mut cli = GenerationResult::default();
        cli.record_success();
        totals.record("cli", cli);
        let mut python = GenerationResult::default();
        python.record_success();
        python.record_success();
        python.record_failure("v2.1.0");
        totals.record("python-sdk", python);

        // When
        let lines = summary_lines(&totals);

        // Then
        assert_eq!(lines.len(), 3);
        assert!(lines[0].trim_start().starts_with("cli"));
        assert!(lines[0].contains("generated   1"));
        assert!(lines[1].ends_with("(v2.1.0)"));
        assert_eq!(lines[2], "Total: 3 generated, 1 failed");
    }

    #[test]
    fn test_empty_run_still_has_totals() {
        let lines = summary_lines(&RunTotals::default());
        assert_eq!(lines, vec!["Total: 0 generated, 0 failed"]);
    }
}
