//! Mission sequencing for one sortie.
//!
//! The queue holds the missions still to be flown, in order. Its head is the
//! mission resident on the controller. [`Flight::wait_and_send_next_mission`]
//! pops the head once its final waypoint is reached and uploads whatever is
//! next; once the queue runs dry the land mission is next.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use uas_core::{Coordinate, FlightMode, MissionItem, MissionSlice, MissionType};

use crate::config::FlightConfig;
use crate::controller::Controller;
use crate::error::{FlightError, ManagerError, ProtocolError};
use crate::mission::{Mission, MissionError};

/// Role of a queued mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionRole {
    Takeoff,
    Detect,
    Airdrop,
    /// Loaded from a file by [`Flight::append_mission`]
    AdHoc,
}

enum QueueEntry<C> {
    Takeoff,
    Detect,
    Airdrop,
    AdHoc(Mission<C>),
}

impl<C> QueueEntry<C> {
    fn role(&self) -> MissionRole {
        match self {
            QueueEntry::Takeoff => MissionRole::Takeoff,
            QueueEntry::Detect => MissionRole::Detect,
            QueueEntry::Airdrop => MissionRole::Airdrop,
            QueueEntry::AdHoc(_) => MissionRole::AdHoc,
        }
    }
}

/// Geometry of the pass flown over an airdrop target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirdropApproach {
    /// Course flown over the target, degrees from north
    pub heading_deg: f64,
    /// Distance of the entry and exit points from the target, meters
    pub buffer_distance_m: f64,
}

impl Default for AirdropApproach {
    fn default() -> Self {
        Self {
            heading_deg: 0.0,
            buffer_distance_m: 100.0,
        }
    }
}

/// Flight manager for one session with a vehicle.
pub struct Flight<C> {
    controller: Arc<C>,
    config: FlightConfig,
    preflight_check_done: bool,
    takeoff_mission: Mission<C>,
    detect_mission: Mission<C>,
    land_mission: Mission<C>,
    airdrop_mission: Mission<C>,
    geofence: Mission<C>,
    queue: VecDeque<QueueEntry<C>>,
}

impl<C: Controller> Flight<C> {
    pub fn new(controller: C) -> Self {
        Self::with_config(controller, FlightConfig::default())
    }

    /// Build a session. The queue starts with the takeoff mission.
    pub fn with_config(controller: C, config: FlightConfig) -> Self {
        let controller = Arc::new(controller);
        let mission = |mission_type| {
            Mission::with_type(controller.clone(), mission_type)
                .with_poll_interval(config.poll_interval)
        };

        Self {
            takeoff_mission: mission(MissionType::Normal),
            detect_mission: mission(MissionType::Normal),
            land_mission: mission(MissionType::Normal),
            airdrop_mission: mission(MissionType::Normal),
            geofence: mission(MissionType::Geofence),
            queue: VecDeque::from([QueueEntry::Takeoff]),
            preflight_check_done: false,
            controller,
            config,
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    pub fn preflight_check_done(&self) -> bool {
        self.preflight_check_done
    }

    pub fn takeoff_mission(&self) -> &Mission<C> {
        &self.takeoff_mission
    }

    pub fn detect_mission(&self) -> &Mission<C> {
        &self.detect_mission
    }

    pub fn land_mission(&self) -> &Mission<C> {
        &self.land_mission
    }

    pub fn airdrop_mission(&self) -> &Mission<C> {
        &self.airdrop_mission
    }

    pub fn geofence(&self) -> &Mission<C> {
        &self.geofence
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Roles of the queued missions, head first.
    pub fn queued_roles(&self) -> Vec<MissionRole> {
        self.queue.iter().map(QueueEntry::role).collect()
    }

    /// Render a numeric fault code. Never fails and never touches state.
    pub fn decode_error(&self, code: u16) -> String {
        match code {
            0 => "SUCCESS (0)".to_string(),
            100..=199 => self.controller.decode_error(code),
            200..=299 => ProtocolError::describe(code),
            300..=399 => ManagerError::describe(code)
                .unwrap_or_else(|| format!("UNKNOWN ERROR ({code})")),
            _ => format!("UNKNOWN ERROR ({code})"),
        }
    }

    /// Fix home, load and upload the geofence, load the land mission and
    /// enable fence enforcement, stopping at the first failure.
    ///
    /// Takeoff is only allowed once this has succeeded.
    pub async fn preflight_check(
        &mut self,
        land_mission_file: impl AsRef<Path>,
        geofence_file: impl AsRef<Path>,
        home: Option<Coordinate>,
    ) -> Result<(), FlightError> {
        match home {
            Some(home) => tracing::info!("Setting home to {}", home),
            None => tracing::info!("Setting home to current position"),
        }
        self.controller.set_home(home).await?;

        self.geofence
            .load_mission_from_file(geofence_file, MissionSlice::full())?;
        tracing::info!("Sending geofence");
        self.geofence.send_mission().await?;

        self.land_mission
            .load_mission_from_file(land_mission_file, MissionSlice::full())?;

        tracing::info!("Enabling geofence");
        self.controller.enable_geofence().await?;

        self.preflight_check_done = true;
        tracing::info!("Preflight check complete");
        Ok(())
    }

    /// Upload the takeoff mission, switch to AUTO and arm.
    pub async fn takeoff(&mut self, takeoff_mission_file: impl AsRef<Path>) -> Result<(), FlightError> {
        if !self.preflight_check_done {
            return Err(ManagerError::PreflightCheck.into());
        }

        self.takeoff_mission
            .load_mission_from_file(takeoff_mission_file, MissionSlice::full())?;

        tracing::info!("Sending takeoff mission");
        self.takeoff_mission.send_mission().await?;

        // let the upload settle on the autopilot before changing mode
        sleep(self.config.settle_delay).await;

        tracing::info!("Setting mode to {}", FlightMode::Auto);
        self.controller.set_mode(FlightMode::Auto).await?;

        tracing::info!("Arming drone");
        self.controller.arm().await?;
        Ok(())
    }

    /// Build the airdrop mission around `target`.
    ///
    /// Items `[0, target_index)` come from the file, then an entry point,
    /// the target and an exit point on the `approach` heading, then the rest
    /// of the file renumbered after them. The target is flown at `altitude`.
    /// A failure can leave the airdrop mission partially built.
    pub fn build_airdrop_mission(
        &mut self,
        target: Coordinate,
        airdrop_mission_file: impl AsRef<Path>,
        target_index: u16,
        altitude: f64,
        approach: AirdropApproach,
    ) -> Result<(), FlightError> {
        let file = airdrop_mission_file.as_ref();
        let insert_at = usize::from(target_index);

        self.airdrop_mission
            .load_mission_from_file(file, MissionSlice::prefix(insert_at))?;

        let target = target.with_altitude(altitude);
        let entry = target.offset_coordinate(approach.buffer_distance_m, approach.heading_deg);
        let exit =
            target.offset_coordinate(approach.buffer_distance_m, approach.heading_deg + 180.0);

        let resume_seq = target_index
            .checked_add(3)
            .ok_or(MissionError::InsertOutOfRange {
                seq: insert_at + 3,
                len: self.airdrop_mission.len(),
            })?;

        for (offset, (label, coordinate)) in [("entry", entry), ("target", target), ("exit", exit)]
            .into_iter()
            .enumerate()
        {
            let item = MissionItem::waypoint(target_index + offset as u16, coordinate);
            tracing::debug!("Inserting {} waypoint {}", label, item);
            self.airdrop_mission.add_mission_item(item)?;
        }

        self.airdrop_mission
            .load_mission_from_file(file, MissionSlice::suffix(insert_at, resume_seq))?;

        tracing::info!(
            "Built airdrop mission for {} ({} items)",
            target,
            self.airdrop_mission.len()
        );
        Ok(())
    }

    /// Queue the airdrop mission as currently built.
    pub fn append_airdrop_mission(&mut self) {
        self.queue.push_back(QueueEntry::Airdrop);
    }

    /// Queue the detect mission, loading it from `detect_mission_file` only
    /// if it has no items yet.
    pub fn append_detect_mission(
        &mut self,
        detect_mission_file: Option<&Path>,
    ) -> Result<(), FlightError> {
        if self.detect_mission.is_empty() {
            let file = detect_mission_file.ok_or(ManagerError::DetectLoad)?;
            self.detect_mission
                .load_mission_from_file(file, MissionSlice::full())?;
        }

        self.queue.push_back(QueueEntry::Detect);
        Ok(())
    }

    /// Load a fresh mission from `mission_file` and queue it.
    pub fn append_mission(&mut self, mission_file: impl AsRef<Path>) -> Result<(), FlightError> {
        let mut mission = Mission::new(self.controller.clone())
            .with_poll_interval(self.config.poll_interval);
        mission.load_mission_from_file(mission_file, MissionSlice::full())?;

        self.queue.push_back(QueueEntry::AdHoc(mission));
        Ok(())
    }

    /// Wait for the active mission to finish, then hand over to the next.
    ///
    /// The head of the queue is popped as the active mission. Once the
    /// vehicle reports its final waypoint the active mission is cleared, the
    /// next one (new head, or the land mission when the queue is empty) is
    /// uploaded and AUTO is forced. A timeout returns straight away with the
    /// active mission still resident and the next one still queued.
    pub async fn wait_and_send_next_mission(&mut self) -> Result<(), FlightError> {
        let current = self.queue.pop_front().ok_or(ProtocolError::QueueEmpty)?;
        let current_mission = self.entry_mission(&current);

        let next_mission = match self.queue.front() {
            None => {
                tracing::info!("No more missions, queueing land mission");
                &self.land_mission
            }
            Some(entry) => {
                tracing::info!("Queueing next mission in list ({:?})", entry.role());
                self.entry_mission(entry)
            }
        };

        let final_index = current_mission
            .len()
            .checked_sub(1)
            .and_then(|index| u16::try_from(index).ok())
            .ok_or(ProtocolError::EmptyMission)?;

        current_mission
            .wait_for_waypoint_reached(final_index, self.config.advance_timeout)
            .await?;

        if let Err(err) = current_mission.clear_mission().await {
            tracing::warn!("Failed to clear {:?} mission: {}", current.role(), err);
        }

        let sent = next_mission.send_mission().await;

        self.controller.set_mode(FlightMode::Auto).await?;

        sent
    }

    fn entry_mission<'a>(&'a self, entry: &'a QueueEntry<C>) -> &'a Mission<C> {
        match entry {
            QueueEntry::Takeoff => &self.takeoff_mission,
            QueueEntry::Detect => &self.detect_mission,
            QueueEntry::Airdrop => &self.airdrop_mission,
            QueueEntry::AdHoc(mission) => mission,
        }
    }
}
