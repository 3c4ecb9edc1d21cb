//! One complete sortie: preflight, takeoff, detect, airdrop runs, landing.

use std::path::PathBuf;

use tokio::time::sleep;
use uas_core::{Coordinate, FlightMode, MissionItem};
use uas_flight::{AirdropApproach, Controller, Flight, FlightError};

use crate::detection::TargetDetector;

/// Mission files and airdrop parameters for a sortie.
#[derive(Debug, Clone)]
pub struct SortiePlan {
    pub land_file: PathBuf,
    pub geofence_file: PathBuf,
    pub takeoff_file: PathBuf,
    pub detect_file: PathBuf,
    pub airdrop_file: PathBuf,
    pub home: Option<Coordinate>,
    /// Waypoint of the detect mission where the detect zone starts
    pub detect_waypoint: u16,
    /// Where the approach is spliced into the airdrop file mission
    pub target_index: u16,
    pub drop_altitude_m: f64,
    pub approach: AirdropApproach,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandingOutcome {
    /// Land mission handed over normally
    Handoff,
    /// Handoff failed with this code; land mission was resent blind
    Recovered { code: u16 },
}

#[derive(Debug, Clone)]
pub struct SortieReport {
    pub targets: Vec<Coordinate>,
    /// Airdrop mission as built for each target, in flight order
    pub airdrop_missions: Vec<Vec<MissionItem>>,
    pub landing: LandingOutcome,
}

/// Fly `plan` with `flight`.
///
/// Any fault before the landing handoff ends the sortie and is returned.
/// A failed landing handoff is not: after the configured recovery delay the
/// land mission and AUTO are sent once more without checking the result.
pub async fn run_sortie<C, D>(
    flight: &mut Flight<C>,
    plan: &SortiePlan,
    detector: &mut D,
) -> Result<SortieReport, FlightError>
where
    C: Controller,
    D: TargetDetector,
{
    flight
        .preflight_check(&plan.land_file, &plan.geofence_file, plan.home)
        .await?;
    flight.append_detect_mission(Some(plan.detect_file.as_path()))?;
    flight.takeoff(&plan.takeoff_file).await?;

    // takeoff -> detect
    flight.wait_and_send_next_mission().await?;

    let timeout = flight.config().advance_timeout;
    if let Err(err) = flight
        .detect_mission()
        .wait_for_waypoint_reached(plan.detect_waypoint, timeout)
        .await
    {
        tracing::warn!("Detect zone not confirmed: {}", flight.decode_error(err.code()));
    }

    let targets = detector.detect_targets();
    tracing::info!("Detected {} targets", targets.len());

    let mut airdrop_missions = Vec::with_capacity(targets.len());
    for target in &targets {
        flight.build_airdrop_mission(
            *target,
            &plan.airdrop_file,
            plan.target_index,
            plan.drop_altitude_m,
            plan.approach,
        )?;
        airdrop_missions.push(flight.airdrop_mission().items().to_vec());
        flight.append_airdrop_mission();

        flight.wait_and_send_next_mission().await?;
    }

    let landing = match flight.wait_and_send_next_mission().await {
        Ok(()) => LandingOutcome::Handoff,
        Err(err) => {
            let code = err.code();
            tracing::error!("Landing handoff failed: {}", flight.decode_error(code));

            sleep(flight.config().recovery_delay).await;

            tracing::warn!("Resending land mission");
            if let Err(err) = flight.land_mission().send_mission().await {
                tracing::debug!("Land resend: {}", err);
            }
            if let Err(err) = flight.controller().set_mode(FlightMode::Auto).await {
                tracing::debug!("AUTO after land resend: {}", err);
            }
            LandingOutcome::Recovered { code }
        }
    };

    Ok(SortieReport {
        targets,
        airdrop_missions,
        landing,
    })
}
