// src/firmware/sim.rs - Simulated firmware backing bench runs and tests
use super::{Axis, FirmwareApi, FirmwareEvent, TimerEvent, Tune};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Observable state of the simulated printer. Tests reach in through
/// [`SimFirmware::with`] to arrange preconditions and assert side effects.
#[derive(Debug, Default)]
pub struct SimState {
    pub hotend_temp: f32,
    pub hotend_target: f32,
    pub bed_temp: f32,
    pub bed_target: f32,
    pub fan_percent: u8,

    pub positions: HashMap<Axis, f32>,
    pub soft_endstops: bool,
    pub position_known: bool,
    pub z_position_known: bool,
    pub steppers_disabled: bool,

    pub printing: bool,
    pub printing_from_media: bool,
    pub progress_percent: u8,
    pub elapsed_seconds: u64,
    pub feedrate_percent: u16,
    pub queue_empty: bool,

    pub mesh: HashMap<(u8, u8), f32>,
    pub z_offset: f32,

    // Call logs, in call order.
    pub injected: Vec<String>,
    pub moves: Vec<(Axis, f32)>,
    pub babysteps: Vec<f32>,
    pub tunes: Vec<Tune>,
    pub started_prints: Vec<String>,
    pub pause_requests: u32,
    pub resume_requests: u32,
    pub stop_requests: u32,
    pub user_confirms: u32,
    pub killed: bool,
}

/// Cheap-clone handle over the shared simulator state, optionally wired to
/// the controller's event channel so job-control calls echo back the timer
/// events a real firmware would raise.
#[derive(Clone)]
pub struct SimFirmware {
    inner: Arc<Mutex<SimState>>,
    events: Option<mpsc::UnboundedSender<FirmwareEvent>>,
}

impl SimFirmware {
    pub fn new() -> Self {
        let state = SimState {
            hotend_temp: 22.0,
            bed_temp: 22.0,
            soft_endstops: true,
            feedrate_percent: 100,
            queue_empty: true,
            ..SimState::default()
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
            events: None,
        }
    }

    /// Wire job-control calls to the controller's event channel.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<FirmwareEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run a closure against the shared state.
    pub fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        let mut state = self.inner.lock().expect("sim state poisoned");
        f(&mut state)
    }

    fn emit(&self, event: FirmwareEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

impl Default for SimFirmware {
    fn default() -> Self {
        Self::new()
    }
}

impl FirmwareApi for SimFirmware {
    fn hotend_temp(&self) -> f32 {
        self.with(|s| s.hotend_temp)
    }
    fn hotend_target(&self) -> f32 {
        self.with(|s| s.hotend_target)
    }
    fn bed_temp(&self) -> f32 {
        self.with(|s| s.bed_temp)
    }
    fn bed_target(&self) -> f32 {
        self.with(|s| s.bed_target)
    }
    fn set_hotend_target(&mut self, celsius: f32) {
        self.with(|s| s.hotend_target = celsius);
    }
    fn set_bed_target(&mut self, celsius: f32) {
        self.with(|s| s.bed_target = celsius);
    }

    fn fan_percent(&self) -> u8 {
        self.with(|s| s.fan_percent)
    }
    fn set_fan_percent(&mut self, percent: u8) {
        self.with(|s| s.fan_percent = percent);
    }

    fn axis_position(&self, axis: Axis) -> f32 {
        self.with(|s| s.positions.get(&axis).copied().unwrap_or(0.0))
    }
    fn set_axis_position(&mut self, axis: Axis, mm: f32) {
        self.with(|s| {
            s.positions.insert(axis, mm);
            s.moves.push((axis, mm));
        });
    }
    fn babystep_z(&mut self, mm: f32) {
        self.with(|s| s.babysteps.push(mm));
    }
    fn set_soft_endstops(&mut self, enabled: bool) {
        self.with(|s| s.soft_endstops = enabled);
    }
    fn is_position_known(&self) -> bool {
        self.with(|s| s.position_known)
    }
    fn is_z_position_known(&self) -> bool {
        self.with(|s| s.z_position_known)
    }
    fn disable_steppers(&mut self) {
        self.with(|s| s.steppers_disabled = true);
    }

    fn is_printing(&self) -> bool {
        self.with(|s| s.printing)
    }
    fn is_printing_from_media(&self) -> bool {
        self.with(|s| s.printing_from_media)
    }
    fn progress_percent(&self) -> u8 {
        self.with(|s| s.progress_percent)
    }
    fn elapsed_seconds(&self) -> u64 {
        self.with(|s| s.elapsed_seconds)
    }
    fn feedrate_percent(&self) -> u16 {
        self.with(|s| s.feedrate_percent)
    }
    fn set_feedrate_percent(&mut self, percent: u16) {
        self.with(|s| s.feedrate_percent = percent);
    }

    fn start_print(&mut self, path: &str) {
        tracing::info!("sim: start print {}", path);
        self.with(|s| {
            s.printing = true;
            s.printing_from_media = true;
            s.progress_percent = 0;
            s.elapsed_seconds = 0;
            s.started_prints.push(path.to_string());
        });
        self.emit(FirmwareEvent::Timer(TimerEvent::Started));
    }
    fn pause_print(&mut self) {
        self.with(|s| s.pause_requests += 1);
        self.emit(FirmwareEvent::Timer(TimerEvent::Paused));
    }
    fn resume_print(&mut self) {
        self.with(|s| s.resume_requests += 1);
        self.emit(FirmwareEvent::Timer(TimerEvent::Started));
    }
    fn stop_print(&mut self) {
        self.with(|s| {
            s.stop_requests += 1;
            s.printing = false;
            s.printing_from_media = false;
        });
        self.emit(FirmwareEvent::Timer(TimerEvent::Stopped));
    }
    fn set_user_confirmed(&mut self) {
        self.with(|s| s.user_confirms += 1);
    }
    fn kill(&mut self) {
        tracing::error!("sim: kill requested from panel");
        self.with(|s| s.killed = true);
    }

    fn inject_commands(&mut self, gcode: &str) {
        self.with(|s| s.injected.push(gcode.to_string()));
    }
    fn is_queue_empty(&self) -> bool {
        self.with(|s| s.queue_empty)
    }

    fn mesh_point(&self, x: u8, y: u8) -> f32 {
        self.with(|s| s.mesh.get(&(x, y)).copied().unwrap_or(0.0))
    }
    fn set_mesh_point(&mut self, x: u8, y: u8, z: f32) {
        self.with(|s| {
            s.mesh.insert((x, y), z);
        });
    }
    fn z_offset(&self) -> f32 {
        self.with(|s| s.z_offset)
    }
    fn set_z_offset(&mut self, mm: f32) {
        self.with(|s| s.z_offset = mm);
    }

    fn play_tune(&mut self, tune: Tune) {
        self.with(|s| s.tunes.push(tune));
    }
}
