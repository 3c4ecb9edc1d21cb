//! A mission bound to a flight controller.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use uas_core::{load_mission_file, MissionFileError, MissionItem, MissionSlice, MissionType};

use crate::controller::{Controller, ControllerError};
use crate::error::{FlightError, ProtocolError};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Mission-layer faults. Their codes sit outside the controller, protocol
/// and manager ranges and are passed through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error(transparent)]
    File(#[from] MissionFileError),
    #[error("cannot place item at seq {seq} in mission of {len} items")]
    InsertOutOfRange { seq: usize, len: usize },
}

impl MissionError {
    pub fn code(&self) -> u16 {
        match self {
            MissionError::File(MissionFileError::Io { .. }) => 401,
            MissionError::File(
                MissionFileError::MissingHeader
                | MissionFileError::Malformed { .. }
                | MissionFileError::UnknownFrame { .. },
            ) => 402,
            MissionError::File(
                MissionFileError::RangeOutOfBounds { .. }
                | MissionFileError::SequenceOverflow { .. },
            ) => 403,
            MissionError::InsertOutOfRange { .. } => 404,
        }
    }
}

/// An ordered, uploadable sequence of items of one [`MissionType`].
///
/// Items are kept numbered `0..len`; loads and inserts preserve that.
pub struct Mission<C> {
    controller: Arc<C>,
    mission_type: MissionType,
    items: Vec<MissionItem>,
    poll_interval: Duration,
}

impl<C: Controller> Mission<C> {
    /// An empty normal mission.
    pub fn new(controller: Arc<C>) -> Self {
        Self::with_type(controller, MissionType::Normal)
    }

    pub fn with_type(controller: Arc<C>, mission_type: MissionType) -> Self {
        Self {
            controller,
            mission_type,
            items: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Interval between waypoint polls, at least 1 ms.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn mission_type(&self) -> MissionType {
        self.mission_type
    }

    pub fn items(&self) -> &[MissionItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Load a window of a mission file.
    ///
    /// The loaded items replace every item numbered `slice.first_seq` or
    /// higher, so a full load replaces the mission and a suffix load extends
    /// a prefix. `first_seq` may not leave a gap after the current items.
    /// Nothing changes if the file cannot be read or sliced.
    pub fn load_mission_from_file(
        &mut self,
        path: impl AsRef<Path>,
        slice: MissionSlice,
    ) -> Result<(), MissionError> {
        let path = path.as_ref();
        let first_seq = usize::from(slice.first_seq);
        if first_seq > self.items.len() {
            return Err(MissionError::InsertOutOfRange {
                seq: first_seq,
                len: self.items.len(),
            });
        }

        let loaded = slice.apply(load_mission_file(path)?)?;
        tracing::debug!(
            "Loaded {} items from {} at seq {}",
            loaded.len(),
            path.display(),
            first_seq
        );

        self.items.truncate(first_seq);
        self.items.extend(loaded);
        Ok(())
    }

    /// Insert `item` at `item.seq`, shifting later items up by one.
    pub fn add_mission_item(&mut self, item: MissionItem) -> Result<(), MissionError> {
        let index = usize::from(item.seq);
        if index > self.items.len() {
            return Err(MissionError::InsertOutOfRange {
                seq: index,
                len: self.items.len(),
            });
        }

        self.items.insert(index, item);
        for later in self.items.iter_mut().skip(index + 1) {
            later.seq += 1;
        }
        Ok(())
    }

    /// Upload the mission to the controller, replacing whatever of this
    /// type was resident.
    ///
    /// Loads and inserts keep items numbered `0..len`; the sequence check
    /// guards the wire contract anyway.
    pub async fn send_mission(&self) -> Result<(), FlightError> {
        if self.items.is_empty() {
            return Err(ProtocolError::EmptyMission.into());
        }
        if let Some((index, item)) = self
            .items
            .iter()
            .enumerate()
            .find(|(index, item)| usize::from(item.seq) != *index)
        {
            return Err(ProtocolError::SequenceGap {
                index,
                found: item.seq,
            }
            .into());
        }

        tracing::info!(
            "Uploading {:?} mission ({} items)",
            self.mission_type,
            self.items.len()
        );
        self.controller
            .upload_mission(self.mission_type, &self.items)
            .await?;
        Ok(())
    }

    /// Remove this mission type's uploaded items from the controller.
    pub async fn clear_mission(&self) -> Result<(), FlightError> {
        tracing::debug!("Clearing {:?} mission", self.mission_type);
        self.controller.clear_mission(self.mission_type).await?;
        Ok(())
    }

    /// Poll until the controller reports waypoint `index` reached.
    ///
    /// Only the deadline ends the wait early; a controller fault during a
    /// poll is returned as is.
    pub async fn wait_for_waypoint_reached(
        &self,
        index: u16,
        timeout: Duration,
    ) -> Result<(), FlightError> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(reached) = self.controller.reached_waypoint().await? {
                if reached >= index {
                    tracing::debug!("Waypoint {} reached", reached);
                    return Ok(());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!("Timed out after {:?} waiting for waypoint {}", timeout, index);
                return Err(ControllerError::Timeout {
                    operation: "waypoint reached",
                }
                .into());
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

impl<C> std::fmt::Debug for Mission<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mission")
            .field("mission_type", &self.mission_type)
            .field("items", &self.items.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimCommand, SimController};
    use std::path::PathBuf;
    use uas_core::{Coordinate, FlightMode};

    fn write_mission(name: &str, count: usize) -> PathBuf {
        let mut text = String::from("QGC WPL 110\n");
        for i in 0..count {
            text.push_str(&format!(
                "{i}\t0\t3\t16\t0\t0\t0\t0\t{}\t-76.5\t30.0\t1\n",
                38.0 + i as f64 * 0.001
            ));
        }
        let path = std::env::temp_dir().join(format!(
            "uas-mission-{}-{}.txt",
            name,
            std::process::id()
        ));
        std::fs::write(&path, text).expect("write mission file");
        path
    }

    fn seqs(mission: &Mission<SimController>) -> Vec<u16> {
        mission.items().iter().map(|item| item.seq).collect()
    }

    #[test]
    fn full_load_replaces_existing_items() {
        let path = write_mission("replace", 3);
        let mut mission = Mission::new(Arc::new(SimController::new()));

        mission.load_mission_from_file(&path, MissionSlice::full()).unwrap();
        mission.load_mission_from_file(&path, MissionSlice::full()).unwrap();

        assert_eq!(mission.len(), 3);
        assert_eq!(seqs(&mission), vec![0, 1, 2]);
    }

    #[test]
    fn suffix_load_extends_prefix() {
        let path = write_mission("suffix", 4);
        let mut mission = Mission::new(Arc::new(SimController::new()));

        mission.load_mission_from_file(&path, MissionSlice::prefix(2)).unwrap();
        mission
            .load_mission_from_file(&path, MissionSlice::suffix(2, 2))
            .unwrap();

        assert_eq!(seqs(&mission), vec![0, 1, 2, 3]);
    }

    #[test]
    fn load_refuses_gap_after_existing_items() {
        let path = write_mission("gap", 2);
        let mut mission = Mission::new(Arc::new(SimController::new()));

        let err = mission
            .load_mission_from_file(&path, MissionSlice::suffix(0, 5))
            .unwrap_err();
        assert!(matches!(err, MissionError::InsertOutOfRange { seq: 5, len: 0 }));
        assert!(mission.is_empty());
    }

    #[test]
    fn failed_load_leaves_mission_untouched() {
        let path = write_mission("untouched", 2);
        let mut mission = Mission::new(Arc::new(SimController::new()));
        mission.load_mission_from_file(&path, MissionSlice::full()).unwrap();

        let missing = std::env::temp_dir().join("uas-mission-does-not-exist.txt");
        let err = mission
            .load_mission_from_file(&missing, MissionSlice::full())
            .unwrap_err();
        assert_eq!(err.code(), 401);
        assert_eq!(mission.len(), 2);
    }

    #[test]
    fn insert_shifts_later_items() {
        let path = write_mission("insert", 2);
        let mut mission = Mission::new(Arc::new(SimController::new()));
        mission.load_mission_from_file(&path, MissionSlice::full()).unwrap();

        let item = MissionItem::waypoint(1, Coordinate::new(1.0, 1.0, 10.0));
        mission.add_mission_item(item.clone()).unwrap();

        assert_eq!(seqs(&mission), vec![0, 1, 2]);
        assert_eq!(mission.items()[1].coordinate, item.coordinate);
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut mission = Mission::new(Arc::new(SimController::new()));
        let err = mission
            .add_mission_item(MissionItem::waypoint(1, Coordinate::new(0.0, 0.0, 0.0)))
            .unwrap_err();
        assert_eq!(err.code(), 404);
    }

    #[tokio::test]
    async fn empty_mission_is_not_uploaded() {
        let controller = Arc::new(SimController::new());
        let mission = Mission::new(controller.clone());

        let err = mission.send_mission().await.unwrap_err();
        assert!(matches!(
            err,
            FlightError::Protocol(ProtocolError::EmptyMission)
        ));
        assert!(controller.command_log().is_empty());
    }

    #[tokio::test]
    async fn gapped_mission_is_not_uploaded() {
        let path = write_mission("gapped", 3);
        let controller = Arc::new(SimController::new());
        let mut mission = Mission::new(controller.clone());
        mission.load_mission_from_file(&path, MissionSlice::full()).unwrap();
        mission.items[2].seq = 5;

        let err = mission.send_mission().await.unwrap_err();

        assert!(matches!(
            err,
            FlightError::Protocol(ProtocolError::SequenceGap { index: 2, found: 5 })
        ));
        assert_eq!(err.code(), 202);
        assert!(controller.command_log().is_empty());
    }

    #[tokio::test]
    async fn geofence_upload_is_tagged() {
        let path = write_mission("fence", 4);
        let controller = Arc::new(SimController::new());
        let mut fence = Mission::with_type(controller.clone(), MissionType::Geofence);
        fence.load_mission_from_file(&path, MissionSlice::full()).unwrap();

        fence.send_mission().await.unwrap();

        assert_eq!(
            controller.command_log(),
            vec![SimCommand::Upload {
                mission_type: MissionType::Geofence,
                items: 4
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_final_waypoint() {
        let path = write_mission("wait", 3);
        let controller = Arc::new(SimController::new());
        let mut mission = Mission::new(controller.clone());
        mission.load_mission_from_file(&path, MissionSlice::full()).unwrap();
        mission.send_mission().await.unwrap();
        controller.set_mode(FlightMode::Auto).await.unwrap();
        controller.arm().await.unwrap();

        mission
            .wait_for_waypoint_reached(2, Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(controller.reached_waypoint().await.unwrap(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_poll_interval_still_sleeps_between_polls() {
        let path = write_mission("zero-poll", 3);
        let controller = Arc::new(SimController::new());
        controller.stall(true);
        let mut mission =
            Mission::new(controller.clone()).with_poll_interval(Duration::ZERO);
        mission.load_mission_from_file(&path, MissionSlice::full()).unwrap();
        assert_eq!(mission.poll_interval, MIN_POLL_INTERVAL);

        let err = mission
            .wait_for_waypoint_reached(2, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_times_out_when_vehicle_stalls() {
        let path = write_mission("stall", 3);
        let controller = Arc::new(SimController::new());
        controller.stall(true);
        let mut mission = Mission::new(controller.clone());
        mission.load_mission_from_file(&path, MissionSlice::full()).unwrap();

        let started = Instant::now();
        let err = mission
            .wait_for_waypoint_reached(2, Duration::from_secs(30))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.code(), crate::TIMEOUT_ERROR);
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
