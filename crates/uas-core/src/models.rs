//! Core data models for mission items and flight modes.

use crate::coordinate::Coordinate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// MAVLink command codes used by the mission sequencer.
pub mod mav_cmd {
    pub const NAV_WAYPOINT: u16 = 16;
    pub const NAV_LAND: u16 = 21;
    pub const NAV_TAKEOFF: u16 = 22;
}

/// Semantic type of an uploaded mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionType {
    /// Regular navigation mission
    #[default]
    Normal,
    /// Geofence boundary, enforced independently of the normal mission
    Geofence,
}

/// Coordinate frame of a mission item (MAV_FRAME).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionFrame {
    Global,
    LocalNed,
    Mission,
    GlobalRelativeAlt,
    LocalEnu,
    GlobalInt,
    GlobalRelativeAltInt,
    GlobalTerrainAlt,
    GlobalTerrainAltInt,
}

impl MissionFrame {
    pub fn code(self) -> u8 {
        match self {
            MissionFrame::Global => 0,
            MissionFrame::LocalNed => 1,
            MissionFrame::Mission => 2,
            MissionFrame::GlobalRelativeAlt => 3,
            MissionFrame::LocalEnu => 4,
            MissionFrame::GlobalInt => 5,
            MissionFrame::GlobalRelativeAltInt => 6,
            MissionFrame::GlobalTerrainAlt => 10,
            MissionFrame::GlobalTerrainAltInt => 11,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let frame = match code {
            0 => MissionFrame::Global,
            1 => MissionFrame::LocalNed,
            2 => MissionFrame::Mission,
            3 => MissionFrame::GlobalRelativeAlt,
            4 => MissionFrame::LocalEnu,
            5 => MissionFrame::GlobalInt,
            6 => MissionFrame::GlobalRelativeAltInt,
            10 => MissionFrame::GlobalTerrainAlt,
            11 => MissionFrame::GlobalTerrainAltInt,
            _ => return None,
        };
        Some(frame)
    }
}

/// One command record of a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionItem {
    pub seq: u16,
    pub frame: MissionFrame,
    pub command: u16,
    pub current: bool,
    pub auto_continue: bool,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub param1: f32,
    #[serde(default)]
    pub param2: f32,
    #[serde(default)]
    pub param3: f32,
    #[serde(default)]
    pub param4: f32,
}

impl MissionItem {
    /// A plain "navigate to waypoint" item in the relative-altitude frame.
    pub fn waypoint(seq: u16, coordinate: Coordinate) -> Self {
        Self {
            seq,
            frame: MissionFrame::GlobalRelativeAlt,
            command: mav_cmd::NAV_WAYPOINT,
            current: false,
            auto_continue: true,
            coordinate,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
        }
    }
}

impl std::fmt::Display for MissionItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} cmd={} frame={} {}",
            self.seq,
            self.command,
            self.frame.code(),
            self.coordinate
        )
    }
}

/// Autopilot flight modes the sequencer switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlightMode {
    Manual,
    /// Fly the uploaded mission
    Auto,
    Guided,
    Loiter,
    /// Return to launch
    Rtl,
}

impl FlightMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FlightMode::Manual => "MANUAL",
            FlightMode::Auto => "AUTO",
            FlightMode::Guided => "GUIDED",
            FlightMode::Loiter => "LOITER",
            FlightMode::Rtl => "RTL",
        }
    }
}

impl std::fmt::Display for FlightMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown flight mode: {0}")]
pub struct ParseModeError(pub String);

impl FromStr for FlightMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MANUAL" => Ok(FlightMode::Manual),
            "AUTO" => Ok(FlightMode::Auto),
            "GUIDED" => Ok(FlightMode::Guided),
            "LOITER" => Ok(FlightMode::Loiter),
            "RTL" => Ok(FlightMode::Rtl),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
