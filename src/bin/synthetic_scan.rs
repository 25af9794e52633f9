use anyhow::{Context, Result};
use log::info;

use swv_peak::synthetic::SyntheticScan;
use swv_peak::{analyze_series, PipelineConfig, SampleSeries};

/// Usage: `synthetic_scan [points] [seed] [noise]`
fn parse_args() -> Result<SyntheticScan> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut scan = SyntheticScan::default();
    if let Some(points) = args.first() {
        scan.points = points
            .parse()
            .with_context(|| format!("points: '{points}' is not an integer"))?;
    }
    if let Some(seed) = args.get(1) {
        scan.seed = seed
            .parse()
            .with_context(|| format!("seed: '{seed}' is not an integer"))?;
    }
    if let Some(noise) = args.get(2) {
        scan.noise = noise
            .parse()
            .with_context(|| format!("noise: '{noise}' is not a number"))?;
    }
    Ok(scan)
}

fn main() -> Result<()> {
    env_logger::init();

    let scan = parse_args()?;
    info!(
        "generating {} samples, peak at {} V, drift slope {}, noise {} (seed {})",
        scan.points, scan.peak_center, scan.drift_slope, scan.noise, scan.seed
    );

    let series = SampleSeries::from_measurements(scan.measurements())
        .context("normalising synthetic measurements")?;
    let result = analyze_series(&series, &PipelineConfig::default())?;

    let summary = result.summary();
    info!(
        "corrected peak {} (approximate {}), {} baseline iteration(s)",
        summary.final_peak, summary.approximate_peak, summary.baseline_iterations
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("serialising summary")?
    );
    Ok(())
}
