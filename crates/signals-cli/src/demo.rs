//! `signals demo` – plays the reference scenario through console channels.

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use signals_kernel::Thresholds;
use signals_runtime::{DEMO_CONTEXT, reference_scenario};

use crate::console::{console_pipeline, print_faults};

/// Number of ledger entries printed after the run.
const LEDGER_SAMPLE: usize = 5;

/// Run every phase unless `shutdown` is raised between them.  `pace`
/// replaces the scripted pauses when set.
pub fn run(thresholds: Thresholds, pace: Option<Duration>, shutdown: Arc<AtomicBool>) {
    let pipeline = console_pipeline(thresholds);

    for phase in reference_scenario() {
        if shutdown.load(Ordering::SeqCst) {
            println!("{}", "  Demo interrupted.".yellow());
            break;
        }
        println!("\n{}", format!("--- {} ---", phase.title).bold());
        for report in phase.run(pipeline.machine(), DEMO_CONTEXT) {
            print_faults(&report);
        }
        std::thread::sleep(pace.unwrap_or(phase.pause));
    }

    let Some(ledger) = pipeline.ledger() else {
        return;
    };
    println!(
        "\n{} ({} of {} entries)",
        "--- Demo complete. Ledger sample ---".bold(),
        LEDGER_SAMPLE.min(ledger.len()),
        ledger.len()
    );
    match ledger.to_json_pretty(LEDGER_SAMPLE) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("{}: {}", "Ledger error".red(), e),
    }
}
