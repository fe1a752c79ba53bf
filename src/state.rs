//! The boat's shared world model.
//!
//! [`BoatState`] is built once at startup and passed by `&mut` to every
//! mode on the control thread.  The only piece other threads touch is the
//! command queue, reached through a [`CommandSender`].

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::commands::{Command, CommandQueue, CommandSender};
use crate::app::ports::{StorageError, StoragePort};
use crate::config::BoatConfig;
use crate::control::pid::Gains;
use crate::error::{Error, Result};
use crate::fsm::{AutoMode, BoatMode, NavMode, RcMode};
use crate::navigation::{GpsFix, Location, Orientation, WaypointAction, Waypoints};
use crate::safety::FaultSet;

const RECORD_NAMESPACE: &str = "boat";
const LATEST_KEY: &str = "latest";
const MAX_RECORD_SIZE: usize = 2048;

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// The persisted projection of [`BoatState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoatRecord {
    pub sequence: u32,
    pub record_time_ms: u64,
    pub last_contact_ms: u64,
    pub last_rc_ms: u64,
    pub current_waypoint: u32,
    pub waypoint_strength: f64,
    pub waypoint_action: WaypointAction,
    pub last_fix: GpsFix,
    pub launch_point: Location,
    pub faults: String,
    pub boat_mode: BoatMode,
    pub nav_mode: NavMode,
    pub auto_mode: AutoMode,
    pub rc_mode: RcMode,
    pub k: Gains,
}

fn record_key(sequence: u32) -> String {
    format!("record.{sequence}")
}

// ---------------------------------------------------------------------------
// BoatState
// ---------------------------------------------------------------------------

pub struct BoatState {
    // --- Timing ---
    /// Start of the current control frame.
    pub record_time: Duration,
    /// Last time an operator command was applied.
    pub last_contact: Duration,
    /// Last frame with a live RC link.
    pub last_rc: Duration,

    // --- Modes ---
    pub boat_mode: BoatMode,
    pub nav_mode: NavMode,
    pub auto_mode: AutoMode,
    pub rc_mode: RcMode,

    pub faults: FaultSet,
    /// Helm gains shared by every steering mode.
    pub k: Gains,

    // --- Navigation ---
    pub waypoints: Waypoints,
    pub waypoint_strength: f64,
    pub launch_point: Location,
    /// Last point Anchor mode latched.
    pub anchor_point: Location,
    pub last_fix: GpsFix,
    pub orientation: Orientation,

    pub config: BoatConfig,

    commands: Arc<CommandQueue>,
    store: Box<dyn StoragePort>,
    sequence: u32,
}

impl BoatState {
    pub fn new(config: BoatConfig, store: Box<dyn StoragePort>) -> Self {
        Self {
            record_time: Duration::ZERO,
            last_contact: Duration::ZERO,
            last_rc: Duration::ZERO,

            boat_mode: BoatMode::None,
            nav_mode: NavMode::None,
            auto_mode: AutoMode::None,
            rc_mode: RcMode::None,

            faults: FaultSet::new(),
            k: config.gains,

            waypoints: Waypoints::default(),
            waypoint_strength: 0.0,
            launch_point: Location::default(),
            anchor_point: Location::default(),
            last_fix: GpsFix::default(),
            orientation: Orientation::default(),

            config,

            commands: Arc::new(CommandQueue::new()),
            store,
            sequence: 0,
        }
    }

    // ── Faults ────────────────────────────────────────────────

    pub fn insert_fault(&mut self, name: &str) -> bool {
        self.faults.insert(name)
    }

    pub fn remove_fault(&mut self, name: &str) -> bool {
        self.faults.remove(name)
    }

    pub fn has_fault(&self, name: &str) -> bool {
        self.faults.contains(name)
    }

    pub fn fault_count(&self) -> usize {
        self.faults.count()
    }

    pub fn fault_string(&self) -> &str {
        self.faults.as_str()
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    // ── Commands ──────────────────────────────────────────────

    /// Handle for threads that enqueue commands.
    pub fn command_sender(&self) -> CommandSender {
        CommandSender::new(Arc::clone(&self.commands))
    }

    /// Queue a command from the control thread.
    pub fn push_cmd(&self, name: &str, args: Value) -> bool {
        self.command_sender().push_cmd(name, args)
    }

    pub fn command_cnt(&self) -> usize {
        self.commands.len()
    }

    /// Take the oldest pending command without applying it.
    pub fn pop_cmd(&mut self) -> Option<Command> {
        self.commands.pop()
    }

    /// Apply one command and stamp `last_contact` on success.
    pub fn execute_cmd(&mut self, cmd: &Command) -> bool {
        match cmd.execute(self) {
            Ok(()) => {
                info!("Executed command {}", cmd.name());
                self.last_contact = self.record_time;
                true
            }
            Err(e) => {
                warn!("Command {} failed: {e}", cmd.name());
                false
            }
        }
    }

    /// Drain and apply up to `n` commands (`0` = all queued).
    /// Returns how many succeeded.
    pub fn execute_cmds(&mut self, n: usize) -> usize {
        let budget = if n == 0 { self.command_cnt() } else { n };
        let mut succeeded = 0;
        for _ in 0..budget {
            let Some(cmd) = self.pop_cmd() else { break };
            if self.execute_cmd(&cmd) {
                succeeded += 1;
            }
        }
        succeeded
    }

    pub fn flush_cmds(&mut self) {
        let dropped = self.commands.clear();
        if dropped > 0 {
            info!("Flushed {dropped} queued commands");
        }
    }

    // ── Persistence ───────────────────────────────────────────

    pub fn to_record(&self) -> BoatRecord {
        BoatRecord {
            sequence: self.sequence,
            record_time_ms: self.record_time.as_millis() as u64,
            last_contact_ms: self.last_contact.as_millis() as u64,
            last_rc_ms: self.last_rc.as_millis() as u64,
            current_waypoint: self.waypoints.current() as u32,
            waypoint_strength: self.waypoint_strength,
            waypoint_action: self.waypoints.action(),
            last_fix: self.last_fix,
            launch_point: self.launch_point,
            faults: self.faults.as_str().to_string(),
            boat_mode: self.boat_mode,
            nav_mode: self.nav_mode,
            auto_mode: self.auto_mode,
            rc_mode: self.rc_mode,
            k: self.k,
        }
    }

    fn apply_record(&mut self, record: BoatRecord) {
        self.sequence = record.sequence;
        self.record_time = Duration::from_millis(record.record_time_ms);
        self.last_contact = Duration::from_millis(record.last_contact_ms);
        self.last_rc = Duration::from_millis(record.last_rc_ms);
        self.waypoints.set_current(i64::from(record.current_waypoint));
        self.waypoint_strength = record.waypoint_strength;
        self.waypoints.set_action(record.waypoint_action);
        self.last_fix = record.last_fix;
        self.launch_point = record.launch_point;
        self.faults = FaultSet::from_fault_string(&record.faults);
        self.boat_mode = record.boat_mode;
        self.nav_mode = record.nav_mode;
        self.auto_mode = record.auto_mode;
        self.rc_mode = record.rc_mode;
        if record.k.is_valid() {
            self.k = record.k;
        }
    }

    /// Load the newest persisted record into this state.
    pub fn load_last_record(&mut self) -> Result<()> {
        let mut buf = [0u8; 4];
        let n = self.store.read(RECORD_NAMESPACE, LATEST_KEY, &mut buf)?;
        if n != buf.len() {
            return Err(Error::Record("latest pointer truncated"));
        }
        let sequence = u32::from_le_bytes(buf);

        let mut buf = vec![0u8; MAX_RECORD_SIZE];
        let n = self
            .store
            .read(RECORD_NAMESPACE, &record_key(sequence), &mut buf)?;
        let record: BoatRecord = postcard::from_bytes(&buf[..n])?;
        self.apply_record(record);
        Ok(())
    }

    fn store_record(&mut self, sequence: u32) -> Result<()> {
        self.sequence = sequence;
        let bytes = postcard::to_allocvec(&self.to_record())?;
        if bytes.len() > MAX_RECORD_SIZE {
            return Err(Error::Storage(StorageError::Full));
        }
        self.store
            .write(RECORD_NAMESPACE, &record_key(sequence), &bytes)?;
        self.store
            .write(RECORD_NAMESPACE, LATEST_KEY, &sequence.to_le_bytes())?;
        Ok(())
    }

    /// Restore the newest record.  Returns false (state untouched) if no
    /// usable record exists.
    pub fn get_last_record(&mut self) -> bool {
        match self.load_last_record() {
            Ok(()) => {
                info!("Restored state record {}", self.sequence);
                true
            }
            Err(e) => {
                warn!("No usable state record: {e}");
                false
            }
        }
    }

    /// Persist the current state as a new record.
    pub fn append_record(&mut self) -> bool {
        let next = if self.store.exists(RECORD_NAMESPACE, LATEST_KEY) {
            self.sequence.wrapping_add(1)
        } else {
            0
        };
        self.store_record(next)
            .inspect_err(|e| warn!("append_record failed: {e}"))
            .is_ok()
    }

    /// Overwrite the newest record with the current state.
    pub fn write_record(&mut self) -> bool {
        self.store_record(self.sequence)
            .inspect_err(|e| warn!("write_record failed: {e}"))
            .is_ok()
    }
}
