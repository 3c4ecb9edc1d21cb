//! UAS flight manager - mission sequencing over a flight controller link.
//!
//! [`Flight`] owns one [`Controller`] session and the role missions of a
//! sortie (takeoff, detect, airdrop, land, geofence). It gates takeoff on a
//! preflight check, builds airdrop runs around a target, and hands control
//! from one queued mission to the next once the vehicle reaches the final
//! waypoint of the active one.

pub mod config;
pub mod controller;
pub mod error;
pub mod flight;
pub mod mission;
pub mod sim;

pub use config::FlightConfig;
pub use controller::{Controller, ControllerError, TIMEOUT_ERROR};
pub use error::{FlightError, ManagerError, ProtocolError};
pub use flight::{AirdropApproach, Flight, MissionRole};
pub use mission::{Mission, MissionError};
pub use sim::{SimCommand, SimController, SimOperation};
