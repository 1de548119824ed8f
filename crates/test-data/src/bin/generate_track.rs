//! Writes a synthetic activity as GPX.
//!
//! Run with:
//! ```
//! cargo run -p test-data --bin generate-track -- ride.gpx --sport cycling
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gpst::calculate_additional_data;
use test_data::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Sport {
    Cycling,
    Running,
}

#[derive(Parser, Debug)]
#[command(about = "Generate a synthetic activity track")]
struct Args {
    /// GPX file to write
    out_file: PathBuf,

    #[arg(long, value_enum, default_value_t = Sport::Cycling)]
    sport: Sport,

    /// Target distance in meters
    #[arg(long, default_value_t = 10_000.0)]
    distance: f64,

    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Run the derived-metrics calculator and print the summary
    #[arg(long)]
    calculate: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let generator = TrackGenerator::for_region(
        Region::BOULDER,
        ElevationGenerator::foothills(args.seed as u32),
    )
    .with_distance(args.distance);

    let mut generated = match args.sport {
        Sport::Cycling => generator.generate(&CyclistProfile::default(), &mut rng),
        Sport::Running => generator.generate(&RunnerProfile::default(), &mut rng),
    };

    if args.calculate {
        calculate_additional_data(&mut generated.track);
        println!("{}", serde_json::to_string_pretty(generated.track.summary())?);
    }

    gpst::write_track(&generated.track, &args.out_file)?;

    tracing::info!("Generated {}", generated.track);
    tracing::info!("  Samples: {}", generated.samples);
    tracing::info!("  Distance: {:.0} m", generated.true_distance);
    tracing::info!("  Dropouts: {}", generated.dropouts);

    Ok(())
}
