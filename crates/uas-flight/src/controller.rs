//! Flight controller capability interface.
//!
//! The telemetry session, command encoding and the mission transfer
//! protocol live behind this trait. The flight manager only sequences calls.

use std::future::Future;
use uas_core::{Coordinate, FlightMode, MissionItem, MissionType};

/// Code reported when the controller does not answer in time.
pub const TIMEOUT_ERROR: u16 = 101;

/// Controller-layer faults, codes 100-199.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("timed out waiting for {operation}")]
    Timeout { operation: &'static str },
    #[error("{operation} rejected by autopilot: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
    #[error("mode {0} not supported by autopilot")]
    UnsupportedMode(FlightMode),
    #[error("telemetry link lost: {0}")]
    LinkLost(String),
    #[error("{mission_type:?} mission upload failed: {reason}")]
    UploadFailed {
        mission_type: MissionType,
        reason: String,
    },
}

impl ControllerError {
    pub fn code(&self) -> u16 {
        match self {
            ControllerError::Timeout { .. } => TIMEOUT_ERROR,
            ControllerError::Rejected { .. } => 102,
            ControllerError::UnsupportedMode(_) => 103,
            ControllerError::LinkLost(_) => 104,
            ControllerError::UploadFailed { .. } => 105,
        }
    }

    /// Text for a numeric controller code.
    pub fn describe(code: u16) -> String {
        let name = match code {
            TIMEOUT_ERROR => "TIMEOUT ERROR",
            102 => "COMMAND REJECTED ERROR",
            103 => "UNSUPPORTED MODE ERROR",
            104 => "LINK LOST ERROR",
            105 => "MISSION UPLOAD ERROR",
            _ => "UNKNOWN CONTROLLER ERROR",
        };
        format!("{name} ({code})")
    }
}

/// A remote flight controller session.
///
/// Every call is a single request/acknowledge exchange with the autopilot.
/// Implementations report rejected or unanswered requests as
/// [`ControllerError`]s and never retry on their own.
pub trait Controller: Send + Sync {
    /// Fix the home position. `None` uses the vehicle's current position.
    fn set_home(
        &self,
        home: Option<Coordinate>,
    ) -> impl Future<Output = Result<(), ControllerError>> + Send;

    fn set_mode(&self, mode: FlightMode) -> impl Future<Output = Result<(), ControllerError>> + Send;

    fn arm(&self) -> impl Future<Output = Result<(), ControllerError>> + Send;

    fn enable_geofence(&self) -> impl Future<Output = Result<(), ControllerError>> + Send;

    /// Replace the resident mission of `mission_type` with `items`.
    fn upload_mission(
        &self,
        mission_type: MissionType,
        items: &[MissionItem],
    ) -> impl Future<Output = Result<(), ControllerError>> + Send;

    fn clear_mission(
        &self,
        mission_type: MissionType,
    ) -> impl Future<Output = Result<(), ControllerError>> + Send;

    /// Latest waypoint the vehicle reported reaching since the last upload
    /// or clear, if any.
    fn reached_waypoint(&self)
        -> impl Future<Output = Result<Option<u16>, ControllerError>> + Send;

    fn decode_error(&self, code: u16) -> String {
        ControllerError::describe(code)
    }
}
