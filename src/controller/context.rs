// src/controller/context.rs - Controller state owned by the dispatch task
use crate::config::PanelKindConfig;

/// Coarse printer state tracked on behalf of the panel. Mutated only by the
/// controller's own transition code, from panel commands and firmware events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrinterState {
    #[default]
    Idle,
    Printing,
    Pausing,
    Paused,
    Stopping,
    Probing,
    ResumingFromPowerOutage,
}

/// Why the current pause is being held. Meaningful only while paused; decides
/// whether "resume" maps to a firmware resume or a user-confirmed signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseState {
    #[default]
    Idle,
    HeaterTimedOut,
    PurgingFilament,
}

/// Per-heater progress toward its target, reported to the panel as heating /
/// heating-done notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaterState {
    #[default]
    Off,
    TempSet,
    TempReached,
}

/// Sticky fault reported on the next firmware-info request in place of the
/// version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastError {
    #[default]
    None,
    AbnormalBedTemp,
    AbnormalHotendTemp,
    NoSdCard,
    PowerLoss,
    EepromMismatch,
    FilamentRunout,
}

/// Panel hardware revision. The two revisions frame a few commands
/// differently, so when unconfigured we probe and lock in the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelKind {
    #[default]
    Unknown,
    Standard,
    New,
}

impl From<PanelKindConfig> for PanelKind {
    fn from(kind: PanelKindConfig) -> Self {
        match kind {
            PanelKindConfig::Auto => PanelKind::Unknown,
            PanelKindConfig::Standard => PanelKind::Standard,
            PanelKindConfig::New => PanelKind::New,
        }
    }
}

/// Mesh cell focused on the panel's leveling screen. The sentinel means
/// "nothing selected"; re-selecting the same cell triggers a physical visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedMeshPoint {
    pub x: u8,
    pub y: u8,
}

impl SelectedMeshPoint {
    pub const NONE: Self = Self { x: 99, y: 99 };

    pub fn clear(&mut self) {
        *self = Self::NONE;
    }

    pub fn is(&self, x: u8, y: u8) -> bool {
        self.x == x && self.y == y
    }
}

/// All mutable controller state, passed to every dispatcher. Single-threaded
/// by construction: the controller task owns it exclusively.
#[derive(Debug, Clone)]
pub struct ControllerContext {
    pub printer_state: PrinterState,
    pub pause_state: PauseState,
    pub hotend_state: HeaterState,
    pub hotbed_state: HeaterState,
    pub last_error: LastError,
    pub panel_kind: PanelKind,
    pub selected_mesh_point: SelectedMeshPoint,

    /// Cumulative babystepped Z shift applied during the current print.
    /// Distinct from the persisted probe offset, which is only edited idle.
    pub live_z_offset: f32,

    /// Most recent file or navigation token selected on the panel, stored
    /// without its leading slash.
    pub file_selection: String,

    /// Consecutive out-of-range heater readings, one slot per heater.
    pub hotend_fault_ticks: u8,
    pub hotbed_fault_ticks: u8,
}

impl ControllerContext {
    pub fn new(panel_kind: PanelKind) -> Self {
        Self {
            printer_state: PrinterState::Idle,
            pause_state: PauseState::Idle,
            hotend_state: HeaterState::Off,
            hotbed_state: HeaterState::Off,
            last_error: LastError::None,
            panel_kind,
            selected_mesh_point: SelectedMeshPoint::NONE,
            live_z_offset: 0.0,
            file_selection: String::new(),
            hotend_fault_ticks: 0,
            hotbed_fault_ticks: 0,
        }
    }

    /// Take the pending error, if any, clearing it.
    pub fn take_last_error(&mut self) -> Option<LastError> {
        match self.last_error {
            LastError::None => None,
            err => {
                self.last_error = LastError::None;
                Some(err)
            }
        }
    }
}
