//! Report Module
//!
//! End-of-run summary for batch operations.

use crate::batch::BatchResult;
use crate::progress::{format_bytes, format_duration};
use console::style;
use std::time::Duration;

pub fn print_summary_report(
    result: &BatchResult,
    duration: Duration,
    input_bytes: u64,
    output_bytes: u64,
    operation_name: &str,
) {
    let finished = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  📊 {:<56} ║", format!("{} Summary", operation_name));
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  📁 Textures:          {:>10}                            ║", result.total);
    println!(
        "║  ✅ Converted:         {:>10}                            ║",
        style(result.succeeded).green()
    );
    println!(
        "║  ❌ Failed:            {:>10}                            ║",
        style(result.failed).red()
    );
    println!(
        "║  ⏭️  Skipped:           {:>10}                            ║",
        style(result.skipped).yellow()
    );
    println!(
        "║  📈 Success Rate:      {:>9.1}%                            ║",
        result.success_rate()
    );
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!(
        "║  💾 Source Size:       {:>10}                            ║",
        format_bytes(input_bytes)
    );
    println!(
        "║  💾 Texture Size:      {:>10}                            ║",
        format_bytes(output_bytes)
    );
    println!(
        "║  ⏱️  Total Time:        {:>10}                            ║",
        format_duration(duration)
    );
    println!("║  🕒 Finished:   {:>20}                         ║", finished.to_string());
    println!("╚══════════════════════════════════════════════════════════════╝");

    if !result.errors.is_empty() {
        println!();
        println!("{}", style("❌ Failed textures:").red().bold());
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for (path, error) in &result.errors {
            println!("   {} → {}", path.display(), error);
        }
    }
}

pub fn print_simple_summary(result: &BatchResult) {
    println!(
        "\n✅ Complete: {} converted, {} failed, {} skipped (total: {})",
        result.succeeded, result.failed, result.skipped, result.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_print_simple_summary_no_panic() {
        let mut result = BatchResult::new();
        result.success();
        result.fail(PathBuf::from("brick_normal.png"), "exit code 1".to_string());
        print_simple_summary(&result);
    }

    #[test]
    fn test_print_summary_report_no_panic() {
        let mut result = BatchResult::new();
        result.success();
        result.skip();
        result.fail(PathBuf::from("wood_disp.exr"), "maketx: bad header".to_string());
        print_summary_report(&result, Duration::from_secs(3), 4096, 8192, "Texture Conversion");
    }

    #[test]
    fn test_print_summary_report_empty() {
        print_summary_report(&BatchResult::new(), Duration::ZERO, 0, 0, "Texture Conversion");
    }
}
