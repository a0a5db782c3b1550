use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use urban_sim_core::simulation::NoClimate;
use urban_sim_core::{
    Celsius, CellMask, FallbackPolicy, FieldSummary, LandGrid, LandUse, Simulation,
    SimulationError, SimulationParams, SimulationResult, Submission,
};

/// Urban planning simulation with configurable inputs
#[derive(Parser, Debug)]
#[command(name = "urban-sim")]
#[command(about = "Heat, energy and waste simulation over a land-use grid", long_about = None)]
struct Args {
    /// Builder submission (JSON) or text grid, one row of codes (l, d, b, g, e) per line
    #[arg(short, long)]
    grid: PathBuf,

    /// Ambient temperature in °C (climate lookup is not available offline)
    #[arg(short, long)]
    ambient: Option<f64>,

    /// Parameter document (JSON); missing fields keep their defaults
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Retrofit mask, one row per line, `1` or `x` marks a cool-roof retrofit
    #[arg(short, long)]
    retrofit: Option<PathBuf>,

    /// Write the full result as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Draw the fallback ambient temperature from a seeded range instead of the fixed default
    #[arg(short, long)]
    seed: Option<u64>,

    /// Lower bound of the seeded fallback range in °C
    #[arg(long, default_value_t = 5.0)]
    seed_min: f64,

    /// Upper bound of the seeded fallback range in °C
    #[arg(long, default_value_t = 25.0)]
    seed_max: f64,
}

/// Grid input as given on the command line
enum Plan {
    Submission(Submission),
    Grid(LandGrid),
}

fn read_plan(path: &Path) -> Result<Plan, SimulationError> {
    let text = std::fs::read_to_string(path).map_err(|e| SimulationError::Io(e.to_string()))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json")
        || text.trim_start().starts_with('{');
    if is_json {
        Submission::from_json(&text).map(Plan::Submission)
    } else {
        LandGrid::parse(&text).map(Plan::Grid)
    }
}

fn read_params(args: &Args) -> Result<SimulationParams, SimulationError> {
    let mut params = match &args.params {
        Some(path) => SimulationParams::load(path)?,
        None => SimulationParams::default(),
    };
    if let Some(seed) = args.seed {
        let (min, max) = match (Celsius::finite(args.seed_min), Celsius::finite(args.seed_max)) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                return Err(SimulationError::InvalidParameter(format!(
                    "seed range [{}, {}] is not a temperature range",
                    args.seed_min, args.seed_max
                )))
            }
        };
        params.fallback = FallbackPolicy::Seeded { seed, min, max };
    }
    Ok(params)
}

fn run(args: &Args) -> Result<SimulationResult, SimulationError> {
    let simulation = Simulation::new(read_params(args)?)?;
    let retrofit = args
        .retrofit
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path)
                .map_err(|e| SimulationError::Io(e.to_string()))
                .and_then(|text| CellMask::parse(&text))
        })
        .transpose()?;

    match read_plan(&args.grid)? {
        Plan::Submission(submission) if args.ambient.is_none() => {
            simulation.run_submission(&submission, &NoClimate, retrofit.as_ref())
        }
        Plan::Submission(submission) => {
            let grid = submission.to_grid()?;
            simulation.run(&grid, args.ambient, retrofit.as_ref())
        }
        Plan::Grid(grid) => simulation.run(&grid, args.ambient, retrofit.as_ref()),
    }
}

fn print_summary(name: &str, unit: &str, summary: &FieldSummary) {
    println!(
        "  {:<12} min {:>10.3}  max {:>10.3}  mean {:>10.3}  total {:>12.3} {}",
        name, summary.min, summary.max, summary.mean, summary.total, unit
    );
}

fn print_report(result: &SimulationResult) {
    let meta = &result.metadata;
    println!("=== Urban Simulation ===\n");
    println!(
        "Grid {}x{}, ambient {} ({:?}), {} unknown codes, {} retrofitted cells",
        meta.width,
        meta.height,
        meta.ambient,
        meta.ambient_source,
        meta.unknown_codes,
        meta.retrofitted_cells
    );

    println!("\nComposition:");
    for land_use in LandUse::ALL {
        println!(
            "  {:<24} {:>6.1}%",
            land_use.label(),
            result.composition.get(&land_use).copied().unwrap_or(0.0)
        );
    }

    println!("\nFields:");
    print_summary("temperature", "°C", &result.temperature.summary);
    print_summary("energy", "kWh/day", &result.energy.demand.summary());
    print_summary("smoothed", "", &result.energy.smoothed_summary);
    print_summary("load", "", &result.load.load.summary());
    print_summary("waste", "kg", &result.waste.waste.summary());

    let energy = &result.energy.stats;
    println!("\nEnergy:");
    println!("  total demand      {:>10.2} kWh/day", energy.total);
    for (land_use, demand) in &energy.by_type {
        if demand.count > 0 && demand.total > 0.0 {
            println!(
                "  {:<17} {:>10.2} kWh/day over {} cells (avg {:.2})",
                land_use.label(),
                demand.total,
                demand.count,
                demand.average
            );
        }
    }
    println!("  efficiency ratio  {:>10.3}", energy.efficiency_ratio);

    let load = &result.load.stats;
    println!("\nInfrastructure load:");
    println!(
        "  max {:.2}, mean {:.2}, variance {:.3}, grid efficiency {:.4}",
        load.max_load, load.mean_load, load.variance, load.grid_efficiency
    );

    let waste = &result.waste.stats;
    println!("\nWaste:");
    println!(
        "  generated {:.2} kg, after transport {:.2} kg (drift {:.2e})",
        waste.generated_total, waste.total, waste.mass_drift
    );
    println!(
        "  max {:.2} kg, mean {:.2} kg, efficiency {:.4}",
        waste.max, waste.mean, waste.efficiency
    );
    println!(
        "\nHeat residual after {} steps: {:.3e} °C",
        meta.heat_steps, result.temperature.residual
    );
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let result = match run(&args) {
        Ok(result) => result,
        Err(e) => {
            error!("Simulation failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    print_report(&result);

    if let Some(path) = &args.output {
        if let Err(e) = result.save(path) {
            error!("Could not write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        info!("Result written to {}", path.display());
    }

    ExitCode::SUCCESS
}
