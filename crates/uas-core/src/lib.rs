pub mod coordinate;
pub mod mission_file;
pub mod models;

pub use coordinate::{Coordinate, EARTH_RADIUS_M};
pub use mission_file::{load_mission_file, parse_mission, MissionFileError, MissionSlice};
pub use models::{mav_cmd, FlightMode, MissionFrame, MissionItem, MissionType, ParseModeError};
