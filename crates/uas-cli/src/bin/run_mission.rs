//! Fly a full sortie against the simulated autopilot.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uas_cli::{parse_target, run_sortie, LandingOutcome, PredeterminedTargets, SortiePlan};
use uas_core::Coordinate;
use uas_flight::{AirdropApproach, Flight, FlightConfig, SimController};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Land mission, loaded during preflight
    #[arg(long, default_value = "landing_mission.txt")]
    land: PathBuf,

    #[arg(long, default_value = "geofence.txt")]
    geofence: PathBuf,

    #[arg(long, default_value = "takeoff_mission.txt")]
    takeoff: PathBuf,

    #[arg(long, default_value = "detect_mission.txt")]
    detect: PathBuf,

    /// Base mission the airdrop approach is spliced into
    #[arg(long, default_value = "airdrop_mission.txt")]
    airdrop: PathBuf,

    /// Home as lat,lon[,alt]; current position when omitted
    #[arg(long, value_parser = parse_target)]
    home: Option<Coordinate>,

    /// Airdrop target as lat,lon[,alt]. Repeat for several targets
    #[arg(long = "target", value_parser = parse_target)]
    targets: Vec<Coordinate>,

    /// Detect mission waypoint where the detect zone starts
    #[arg(long, default_value_t = 1)]
    detect_waypoint: u16,

    /// Airdrop file index the approach is inserted at
    #[arg(long, default_value_t = 0)]
    target_index: u16,

    /// Drop altitude in meters
    #[arg(long, default_value_t = 75.0)]
    altitude: f64,

    /// Course over the target, degrees from north
    #[arg(long, default_value_t = 282.0)]
    heading: f64,

    /// Entry and exit distance from the target, meters
    #[arg(long, default_value_t = 100.0)]
    buffer: f64,

    /// Print each airdrop mission as JSON once the sortie ends
    #[arg(long)]
    dump_airdrop: bool,

    /// Emit log lines as JSON objects
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(args.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.json_logs).then(tracing_subscriber::fmt::layer))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("uas_flight=debug".parse()?)
            .add_directive("uas_cli=info".parse()?))
        .init();

    let targets = if args.targets.is_empty() {
        vec![Coordinate::from_dms((38.0, 18.0, 56.0), (-76.0, 33.0, 6.0), 0.0)]
    } else {
        args.targets.clone()
    };

    let plan = SortiePlan {
        land_file: args.land,
        geofence_file: args.geofence,
        takeoff_file: args.takeoff,
        detect_file: args.detect,
        airdrop_file: args.airdrop,
        home: args.home,
        detect_waypoint: args.detect_waypoint,
        target_index: args.target_index,
        drop_altitude_m: args.altitude,
        approach: AirdropApproach {
            heading_deg: args.heading,
            buffer_distance_m: args.buffer,
        },
    };

    let config = FlightConfig::from_env();
    tracing::info!("Starting sortie with {} target(s), {:?}", targets.len(), config);

    let mut flight = Flight::with_config(SimController::new(), config);
    let mut detector = PredeterminedTargets::new(targets);

    let report = match run_sortie(&mut flight, &plan, &mut detector).await {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Sortie aborted: {}", flight.decode_error(err.code()));
            return Err(err.into());
        }
    };

    match report.landing {
        LandingOutcome::Handoff => println!("Sortie complete, land mission active"),
        LandingOutcome::Recovered { code } => println!(
            "Sortie complete, land mission resent after {}",
            flight.decode_error(code)
        ),
    }

    if args.dump_airdrop {
        println!("{}", serde_json::to_string_pretty(&report.airdrop_missions)?);
    }

    Ok(())
}
