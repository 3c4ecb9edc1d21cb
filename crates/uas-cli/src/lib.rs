//! UAS CLI - mission driver for the flight manager.
//!
//! - `run_mission`: flies one full sortie (preflight, takeoff, detect,
//!   airdrop runs, landing) against the simulated autopilot

pub mod detection;
pub mod sortie;

pub use detection::{parse_target, PredeterminedTargets, TargetDetector};
pub use sortie::{run_sortie, LandingOutcome, SortiePlan, SortieReport};
