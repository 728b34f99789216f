// src/firmware/mod.rs - Printer-firmware accessor API and event types
pub mod sim;

/// Motion axes the panel can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
    E,
}

/// Buzzer tunes, played through the firmware's speaker driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tune {
    PowerOn,
    HeaterTimeout,
    FilamentOut,
    Sos,
    ProbingFailed,
}

/// Print-job timer notifications from the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started,
    Paused,
    Stopped,
}

/// Removable-media notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    Inserted,
    Removed,
    Error,
}

/// Reasons the firmware raises a user-confirmation prompt while paused or
/// pausing. Parsed from the firmware's prompt text at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptReason {
    PrintPaused,
    NozzleParked,
    HeaterTimeout,
    ReheatDone,
    FilamentPurging,
}

/// Status-line notifications the controller reacts to. A closed set: the
/// string matching lives in [`StatusUpdate::from_status_line`] so the state
/// machine never sees raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Ready,
    ProbingFailed,
    PrintPaused,
    PrintAborted,
    Reheating,
    ExtruderHeating,
    BedHeating,
    EepromVersionMismatch,
}

/// Asynchronous firmware-side callbacks, delivered to the controller task
/// over a channel and applied between panel commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirmwareEvent {
    Timer(TimerEvent),
    Media(MediaEvent),
    Confirmation(PromptReason),
    Status(StatusUpdate),
    FilamentRunout,
    PowerLossRecovery,
    PrintComplete,
    Killed,
}

impl PromptReason {
    /// Map a firmware confirmation-prompt string onto the typed event set.
    /// The literal texts are the firmware's notification contract.
    pub fn from_prompt(msg: &str) -> Option<Self> {
        match msg {
            "Print Paused" => Some(Self::PrintPaused),
            "Nozzle Parked" => Some(Self::NozzleParked),
            "Heater Timeout" => Some(Self::HeaterTimeout),
            "Reheat Done" => Some(Self::ReheatDone),
            "Filament Purging..." => Some(Self::FilamentPurging),
            _ => None,
        }
    }
}

impl StatusUpdate {
    /// Map a firmware status line onto the typed event set. The ready
    /// message carries the machine name as a prefix, so that one is matched
    /// by suffix.
    pub fn from_status_line(msg: &str, machine_name: &str) -> Option<Self> {
        if let Some(rest) = msg.strip_prefix(machine_name) {
            if rest.trim() == "Ready." {
                return Some(Self::Ready);
            }
        }
        match msg {
            "Probing Failed" => Some(Self::ProbingFailed),
            "Print Paused" => Some(Self::PrintPaused),
            "Print Aborted" => Some(Self::PrintAborted),
            "Reheating..." => Some(Self::Reheating),
            "E Heating..." => Some(Self::ExtruderHeating),
            "Bed Heating..." => Some(Self::BedHeating),
            "EEPROM Version Error" => Some(Self::EepromVersionMismatch),
            _ => None,
        }
    }
}

/// The firmware accessor surface this controller drives.
///
/// All calls are synchronous and their effects are visible immediately; the
/// controller treats the API as best-effort and never surfaces secondary
/// failures back to the panel, so the methods are infallible by contract.
/// Implementations log what they cannot honour.
pub trait FirmwareApi {
    // Temperatures (single hotend, index 0, plus the bed).
    fn hotend_temp(&self) -> f32;
    fn hotend_target(&self) -> f32;
    fn bed_temp(&self) -> f32;
    fn bed_target(&self) -> f32;
    fn set_hotend_target(&mut self, celsius: f32);
    fn set_bed_target(&mut self, celsius: f32);

    // Part-cooling fan 0.
    fn fan_percent(&self) -> u8;
    fn set_fan_percent(&mut self, percent: u8);

    // Motion.
    fn axis_position(&self, axis: Axis) -> f32;
    /// Command an absolute move on one axis and settle there.
    fn set_axis_position(&mut self, axis: Axis, mm: f32);
    /// Immediate small Z nudge without replanning the motion queue.
    fn babystep_z(&mut self, mm: f32);
    fn set_soft_endstops(&mut self, enabled: bool);
    fn is_position_known(&self) -> bool;
    fn is_z_position_known(&self) -> bool;
    fn disable_steppers(&mut self);

    // Print job.
    fn is_printing(&self) -> bool;
    fn is_printing_from_media(&self) -> bool;
    fn progress_percent(&self) -> u8;
    fn elapsed_seconds(&self) -> u64;
    fn feedrate_percent(&self) -> u16;
    fn set_feedrate_percent(&mut self, percent: u16);
    fn start_print(&mut self, path: &str);
    fn pause_print(&mut self);
    fn resume_print(&mut self);
    fn stop_print(&mut self);
    /// Generic "user pressed continue" acknowledgement (M108).
    fn set_user_confirmed(&mut self);
    fn kill(&mut self);

    // Command queue.
    fn inject_commands(&mut self, gcode: &str);
    fn is_queue_empty(&self) -> bool;

    // Bed leveling mesh and probe offset.
    fn mesh_point(&self, x: u8, y: u8) -> f32;
    fn set_mesh_point(&mut self, x: u8, y: u8, z: f32);
    fn z_offset(&self) -> f32;
    fn set_z_offset(&mut self, mm: f32);

    fn play_tune(&mut self, tune: Tune);
}
