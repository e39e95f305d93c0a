use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use env_logger::Builder;
use log::info;

use dslab_battery::{
    format_charge, BatteryUsageEstimator, BatteryUsageStats, CpuPowerCalculator, EstimatorConfig, PowerComponent,
    PowerProfile, UsageDuration, UsageSample,
};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Estimates battery drain of apps from CPU usage counters
struct Args {
    /// Path to YAML file with device power profile
    #[arg(short, long)]
    profile: PathBuf,

    /// Path to YAML or JSON file with a list of app usage samples
    #[arg(short, long)]
    usage: PathBuf,

    /// Path to YAML file with estimator configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to produced JSON file with estimation results (prints a report if not set)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log a detailed breakdown of each estimation
    #[arg(short, long)]
    verbose: bool,
}

fn invalid_data(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message)
}

fn load_samples(path: &Path) -> Result<Vec<UsageSample>, String> {
    let data = std::fs::read_to_string(path).map_err(|e| format!("Can't read file {}: {}", path.display(), e))?;
    let is_json = path.extension().map_or(false, |ext| ext == "json");
    if is_json {
        serde_json::from_str(&data).map_err(|e| format!("Can't parse JSON from file {}: {}", path.display(), e))
    } else {
        serde_yaml::from_str(&data).map_err(|e| format!("Can't parse YAML from file {}: {}", path.display(), e))
    }
}

fn print_report(stats: &BatteryUsageStats) {
    println!(
        "{:>8} {:>12} {:>12} {:>12}  {}",
        "uid", "cpu mAh", "cpu ms", "fg ms", "highest drain"
    );
    for app in stats.apps() {
        println!(
            "{:>8} {:>12} {:>12} {:>12}  {}",
            app.uid(),
            format_charge(app.consumed_power(PowerComponent::Cpu)),
            app.usage_duration_ms(UsageDuration::Cpu),
            app.usage_duration_ms(UsageDuration::CpuForeground),
            app.package_with_highest_drain().unwrap_or("-")
        );
    }
    println!("total: {} mAh", format_charge(stats.total_consumed_power()));
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let profile = PowerProfile::from_file(&args.profile.to_string_lossy()).map_err(invalid_data)?;
    let config = match &args.config {
        Some(path) => EstimatorConfig::from_file(&path.to_string_lossy()).map_err(invalid_data)?,
        None => EstimatorConfig::default(),
    };
    let config = if args.verbose { config.verbose(true) } else { config };
    let samples = load_samples(&args.usage).map_err(invalid_data)?;
    info!(
        "loaded power profile with {} cpu clusters and {} usage samples",
        profile.num_cpu_clusters(),
        samples.len()
    );

    let estimator =
        BatteryUsageEstimator::new().calculator(Box::new(CpuPowerCalculator::with_config(Arc::new(profile), config)));
    let stats = estimator.estimate(&samples);

    match args.output {
        Some(path) => std::fs::File::create(path)?.write_all(
            serde_json::to_string_pretty(&stats)
                .map_err(|e| invalid_data(e.to_string()))?
                .as_bytes(),
        ),
        None => {
            print_report(&stats);
            Ok(())
        }
    }
}
