//! Console rendering of the presentation channels.

use colored::Colorize;

use signals_bus::PublishReport;
use signals_channels::HudSignal;
use signals_kernel::Thresholds;
use signals_runtime::SignalPipeline;

/// A pipeline whose language, avatar and HUD channels print to stdout, plus
/// an in-memory ledger.
pub fn console_pipeline(thresholds: Thresholds) -> SignalPipeline {
    SignalPipeline::builder(thresholds)
        .with_language(|line| println!("  {}", line.green()))
        .with_avatar_debug(|line| println!("  {}", line.magenta()))
        .with_hud(|sig| println!("  {}", hud_line(sig).blue()))
        .with_ledger()
        .build()
}

fn hud_line(sig: &HudSignal) -> String {
    match serde_json::to_string(sig) {
        Ok(json) => format!("[HUD] {json}"),
        Err(e) => format!("[HUD] <unrenderable: {e}>"),
    }
}

/// Print subscriber faults from `report`, if any.
pub fn print_faults(report: &PublishReport) {
    for fault in &report.faults {
        println!(
            "  {} {} on {}: {}",
            "⚠".yellow().bold(),
            fault.token.to_string().yellow(),
            report.kind.label(),
            fault.cause
        );
    }
}
