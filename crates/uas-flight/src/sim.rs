//! In-memory stand-in for an autopilot.
//!
//! Records every command it receives, fails on request, and walks the
//! uploaded normal mission one waypoint per poll while armed in AUTO.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uas_core::{Coordinate, FlightMode, MissionItem, MissionType};

use crate::controller::{Controller, ControllerError};

/// A command as received by the simulated autopilot.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCommand {
    SetHome(Option<Coordinate>),
    SetMode(FlightMode),
    Arm,
    EnableGeofence,
    Upload {
        mission_type: MissionType,
        items: usize,
    },
    Clear(MissionType),
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOperation {
    SetHome,
    SetMode,
    Arm,
    EnableGeofence,
    Upload,
    Clear,
    ReachedWaypoint,
}

#[derive(Debug)]
struct SimState {
    mode: FlightMode,
    armed: bool,
    home: Option<Coordinate>,
    geofence_enabled: bool,
    missions: HashMap<MissionType, Vec<MissionItem>>,
    reached: Option<u16>,
    stalled: bool,
    failures: HashMap<SimOperation, ControllerError>,
    log: Vec<SimCommand>,
}

#[derive(Debug)]
pub struct SimController {
    state: Mutex<SimState>,
}

impl Default for SimController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                mode: FlightMode::Manual,
                armed: false,
                home: None,
                geofence_enabled: false,
                missions: HashMap::new(),
                reached: None,
                stalled: false,
                failures: HashMap::new(),
                log: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next call of `operation` with `error`.
    pub fn fail_next(&self, operation: SimOperation, error: ControllerError) {
        self.state().failures.insert(operation, error);
    }

    /// Stop (or resume) waypoint progress.
    pub fn stall(&self, stalled: bool) {
        self.state().stalled = stalled;
    }

    pub fn command_log(&self) -> Vec<SimCommand> {
        self.state().log.clone()
    }

    pub fn mode(&self) -> FlightMode {
        self.state().mode
    }

    pub fn is_armed(&self) -> bool {
        self.state().armed
    }

    pub fn home(&self) -> Option<Coordinate> {
        self.state().home
    }

    pub fn geofence_enabled(&self) -> bool {
        self.state().geofence_enabled
    }

    /// Items currently resident for `mission_type`.
    pub fn uploaded(&self, mission_type: MissionType) -> Vec<MissionItem> {
        self.state()
            .missions
            .get(&mission_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl SimState {
    fn take_failure(&mut self, operation: SimOperation) -> Result<(), ControllerError> {
        match self.failures.remove(&operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn record(&mut self, operation: SimOperation, command: SimCommand) -> Result<(), ControllerError> {
        self.log.push(command);
        self.take_failure(operation)
    }

    fn advance(&mut self) -> Option<u16> {
        if self.stalled || !self.armed || self.mode != FlightMode::Auto {
            return self.reached;
        }
        let len = match self.missions.get(&MissionType::Normal) {
            Some(items) if !items.is_empty() => items.len(),
            _ => return self.reached,
        };
        let last = u16::try_from(len - 1).unwrap_or(u16::MAX);
        let next = self.reached.map_or(0, |seq| seq.saturating_add(1));
        self.reached = Some(next.min(last));
        self.reached
    }
}

impl Controller for SimController {
    async fn set_home(&self, home: Option<Coordinate>) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.record(SimOperation::SetHome, SimCommand::SetHome(home))?;
        state.home = home;
        Ok(())
    }

    async fn set_mode(&self, mode: FlightMode) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.record(SimOperation::SetMode, SimCommand::SetMode(mode))?;
        state.mode = mode;
        Ok(())
    }

    async fn arm(&self) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.record(SimOperation::Arm, SimCommand::Arm)?;
        state.armed = true;
        Ok(())
    }

    async fn enable_geofence(&self) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.record(SimOperation::EnableGeofence, SimCommand::EnableGeofence)?;
        if !state.missions.contains_key(&MissionType::Geofence) {
            return Err(ControllerError::Rejected {
                operation: "enable geofence",
                reason: "no fence uploaded".to_string(),
            });
        }
        state.geofence_enabled = true;
        Ok(())
    }

    async fn upload_mission(
        &self,
        mission_type: MissionType,
        items: &[MissionItem],
    ) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.record(
            SimOperation::Upload,
            SimCommand::Upload {
                mission_type,
                items: items.len(),
            },
        )?;
        state.missions.insert(mission_type, items.to_vec());
        if mission_type == MissionType::Normal {
            state.reached = None;
        }
        Ok(())
    }

    async fn clear_mission(&self, mission_type: MissionType) -> Result<(), ControllerError> {
        let mut state = self.state();
        state.record(SimOperation::Clear, SimCommand::Clear(mission_type))?;
        state.missions.remove(&mission_type);
        if mission_type == MissionType::Normal {
            state.reached = None;
        }
        Ok(())
    }

    async fn reached_waypoint(&self) -> Result<Option<u16>, ControllerError> {
        let mut state = self.state();
        state.take_failure(SimOperation::ReachedWaypoint)?;
        Ok(state.advance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(count: u16) -> Vec<MissionItem> {
        (0..count)
            .map(|seq| MissionItem::waypoint(seq, Coordinate::new(0.0, 0.0, 30.0)))
            .collect()
    }

    #[tokio::test]
    async fn no_progress_until_armed_in_auto() {
        let sim = SimController::new();
        sim.upload_mission(MissionType::Normal, &items(3)).await.unwrap();
        assert_eq!(sim.reached_waypoint().await.unwrap(), None);

        sim.set_mode(FlightMode::Auto).await.unwrap();
        assert_eq!(sim.reached_waypoint().await.unwrap(), None);

        sim.arm().await.unwrap();
        assert_eq!(sim.reached_waypoint().await.unwrap(), Some(0));
        assert_eq!(sim.reached_waypoint().await.unwrap(), Some(1));
        assert_eq!(sim.reached_waypoint().await.unwrap(), Some(2));
        assert_eq!(sim.reached_waypoint().await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn upload_resets_progress() {
        let sim = SimController::new();
        sim.set_mode(FlightMode::Auto).await.unwrap();
        sim.arm().await.unwrap();
        sim.upload_mission(MissionType::Normal, &items(2)).await.unwrap();
        sim.reached_waypoint().await.unwrap();
        sim.reached_waypoint().await.unwrap();

        sim.upload_mission(MissionType::Normal, &items(2)).await.unwrap();
        assert_eq!(sim.reached_waypoint().await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn injected_failure_fires_once_and_is_logged() {
        let sim = SimController::new();
        sim.fail_next(
            SimOperation::Arm,
            ControllerError::Rejected {
                operation: "arm",
                reason: "prearm check".to_string(),
            },
        );

        assert!(sim.arm().await.is_err());
        assert!(!sim.is_armed());
        assert!(sim.arm().await.is_ok());
        assert_eq!(sim.command_log(), vec![SimCommand::Arm, SimCommand::Arm]);
    }

    #[tokio::test]
    async fn geofence_requires_uploaded_fence() {
        let sim = SimController::new();
        let err = sim.enable_geofence().await.unwrap_err();
        assert_eq!(err.code(), 102);

        sim.upload_mission(MissionType::Geofence, &items(4)).await.unwrap();
        sim.enable_geofence().await.unwrap();
        assert!(sim.geofence_enabled());
    }
}
