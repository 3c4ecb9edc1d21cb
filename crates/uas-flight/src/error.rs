//! Fault taxonomy of the flight manager.
//!
//! Faults are carried as a tagged [`FlightError`]. The numeric ranges only
//! appear at the text boundary ([`FlightError::code`] and the decoders):
//!
//! | range     | source                          |
//! |-----------|---------------------------------|
//! | 100-199   | controller                      |
//! | 200-299   | flight protocol                 |
//! | 300-399   | flight manager                  |
//! | other     | mission layer, passed through   |

use crate::controller::ControllerError;
use crate::mission::MissionError;

/// Vehicle/mission-level semantic faults, codes 200-299.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("mission has no items")]
    EmptyMission,
    #[error("mission sequence not contiguous at index {index} (found seq {found})")]
    SequenceGap { index: usize, found: u16 },
    #[error("no mission queued")]
    QueueEmpty,
}

impl ProtocolError {
    pub fn code(&self) -> u16 {
        match self {
            ProtocolError::EmptyMission => 201,
            ProtocolError::SequenceGap { .. } => 202,
            ProtocolError::QueueEmpty => 203,
        }
    }

    pub fn describe(code: u16) -> String {
        let name = match code {
            201 => "EMPTY MISSION ERROR",
            202 => "SEQUENCE GAP ERROR",
            203 => "MISSION QUEUE EMPTY ERROR",
            _ => "UNKNOWN FLIGHT ERROR",
        };
        format!("{name} ({code})")
    }
}

/// Flight manager faults, codes 300-399.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ManagerError {
    #[error("preflight check has not completed")]
    PreflightCheck,
    #[error("detect mission is empty and no file was given")]
    DetectLoad,
}

impl ManagerError {
    pub const PREFLIGHT_CHECK_ERROR: u16 = 301;
    pub const DETECT_LOAD_ERROR: u16 = 302;

    pub fn code(self) -> u16 {
        match self {
            ManagerError::PreflightCheck => Self::PREFLIGHT_CHECK_ERROR,
            ManagerError::DetectLoad => Self::DETECT_LOAD_ERROR,
        }
    }

    pub fn describe(code: u16) -> Option<String> {
        let name = match code {
            Self::PREFLIGHT_CHECK_ERROR => "PREFLIGHT CHECK ERROR",
            Self::DETECT_LOAD_ERROR => "DETECT LOAD ERROR",
            _ => return None,
        };
        Some(format!("{name} ({code})"))
    }
}

/// Any fault a flight operation can report.
#[derive(Debug, thiserror::Error)]
pub enum FlightError {
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Manager(#[from] ManagerError),
    #[error(transparent)]
    Mission(#[from] MissionError),
}

impl FlightError {
    /// Numeric code for this fault.
    pub fn code(&self) -> u16 {
        match self {
            FlightError::Controller(err) => err.code(),
            FlightError::Protocol(err) => err.code(),
            FlightError::Manager(err) => err.code(),
            FlightError::Mission(err) => err.code(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FlightError::Controller(ControllerError::Timeout { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uas_core::MissionFileError;

    #[test]
    fn codes_stay_inside_their_ranges() {
        let faults = [
            FlightError::from(ControllerError::LinkLost("serial closed".into())),
            FlightError::from(ProtocolError::QueueEmpty),
            FlightError::from(ManagerError::DetectLoad),
            FlightError::from(MissionError::File(MissionFileError::MissingHeader)),
        ];
        let codes: Vec<u16> = faults.iter().map(FlightError::code).collect();

        assert!((100..200).contains(&codes[0]));
        assert!((200..300).contains(&codes[1]));
        assert!((300..400).contains(&codes[2]));
        assert!(!(100..400).contains(&codes[3]));
    }

    #[test]
    fn manager_codes_match_table() {
        assert_eq!(ManagerError::PreflightCheck.code(), 301);
        assert_eq!(ManagerError::DetectLoad.code(), 302);
        assert_eq!(
            ManagerError::describe(301).as_deref(),
            Some("PREFLIGHT CHECK ERROR (301)")
        );
        assert!(ManagerError::describe(399).is_none());
    }

    #[test]
    fn timeout_detection() {
        let err = FlightError::from(ControllerError::Timeout {
            operation: "waypoint reached",
        });
        assert!(err.is_timeout());
        assert!(!FlightError::from(ProtocolError::EmptyMission).is_timeout());
    }
}
