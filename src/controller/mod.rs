// src/controller/mod.rs - Panel controller: dispatch, state machine, supervision
pub mod context;
mod info;
mod actions;
mod process;
pub mod routing;

use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::file_navigator::{FileNavigator, MediaStore};
use crate::firmware::{
    FirmwareApi, FirmwareEvent, MediaEvent, PromptReason, StatusUpdate, TimerEvent, Tune,
};
use crate::panel::messages::*;
use crate::panel::{PanelCommand, PanelLink};
use context::{ControllerContext, HeaterState, LastError, PanelKind, PauseState, PrinterState};
use routing::{DispatchGroup, route};

/// Heater sanity sweep cadence.
pub const HEATER_CHECK_INTERVAL: Duration = Duration::from_millis(500);
/// Consecutive faulted sweeps before a temperature is reported abnormal.
const HEATER_FAULT_TICKS: u8 = 5;
/// File-list entries per page.
const FILE_LIST_PAGE: usize = 4;
/// Largest physical Z correction applied per adjustment call.
const MAX_Z_NUDGE_MM: f32 = 0.05;

// Opaque firmware command sequences. G/M-code semantics live firmware-side;
// these strings are the only coupling.
const CMD_ENABLE_LEVELING: &str = "M501\nM420 S1 V1";
const CMD_SAVE_SETTINGS: &str = "M500";
const CMD_RESTORE_SETTINGS: &str = "M501\nM420 S1";
const CMD_SAVE_MESH_AND_PARK: &str = "M500\nG27";
const CMD_RAISE_AFTER_PROBE_FAIL: &str = "G1 Z50 F500";
const CMD_HOME_ALL: &str = "G28";
const CMD_AUTO_LEVEL: &str = "G28\nG29";
const CMD_CANCEL_POWER_LOSS: &str = "M1000 C";
const CMD_RESUME_POWER_LOSS: &str = "M1000";
const CMD_POWER_LOSS_HOME: &str = "G28 X Y R5\nG28 Z";
const CMD_LOAD_FILAMENT: &str = "M83\nG0 E50 F700\nM82";
const CMD_UNLOAD_FILAMENT: &str = "M83\nG0 E-50 F1200\nM82";

/// Bridges the Chiron TFT panel to the printer firmware: assembles panel
/// requests, routes them to the info/action/process dispatchers, and keeps
/// the panel-facing printer state machine in step with firmware events.
///
/// Owned by a single task; handlers run to completion before the next line
/// is read, so commands are handled strictly in arrival order.
pub struct PanelController<F, M> {
    config: Config,
    firmware: F,
    link: PanelLink,
    navigator: FileNavigator<M>,
    ctx: ControllerContext,
}

impl<F: FirmwareApi, M: MediaStore> PanelController<F, M> {
    pub fn new(config: Config, firmware: F, link: PanelLink, navigator: FileNavigator<M>) -> Self {
        let ctx = ControllerContext::new(PanelKind::from(config.panel.kind));
        Self {
            config,
            firmware,
            link,
            navigator,
            ctx,
        }
    }

    pub fn context(&self) -> &ControllerContext {
        &self.ctx
    }

    pub fn firmware(&self) -> &F {
        &self.firmware
    }

    /// Boot handshake: wait out the panel's splash animation, probe the
    /// panel revision when it is not configured, then announce the reset
    /// and readiness.
    pub async fn startup(&mut self) {
        tokio::time::sleep(Duration::from_millis(self.config.panel.boot_delay_ms)).await;

        if self.ctx.panel_kind == PanelKind::Unknown {
            tracing::info!("panel type not configured, probing");
            self.link.send_line(TEST_FOR_STANDARD_PANEL);
            self.link.send_line(TEST_FOR_NEW_PANEL);
        }

        self.link.send_line(MSG_MAIN_BOARD_HAS_RESET);

        // Leveling stays enabled; Z homing parks the nozzle above the bed,
        // so soft endstops are only toggled around the moves that need it.
        self.firmware.inject_commands(CMD_ENABLE_LEVELING);
        self.firmware.play_tune(Tune::PowerOn);

        self.link.send_line(MSG_READY);
    }

    /// Main loop: panel bytes, firmware events and the heater sweep,
    /// multiplexed on one task. Runs until both channels close.
    pub async fn run(
        mut self,
        mut bytes_rx: mpsc::UnboundedReceiver<Vec<u8>>,
        mut events_rx: mpsc::UnboundedReceiver<FirmwareEvent>,
    ) {
        self.startup().await;

        let mut heater_tick = tokio::time::interval(HEATER_CHECK_INTERVAL);
        heater_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                chunk = bytes_rx.recv() => {
                    let Some(chunk) = chunk else {
                        tracing::info!("panel byte stream closed, controller exiting");
                        break;
                    };
                    self.link.push_bytes(&chunk);
                    while let Some(cmd) = self.link.try_read_line() {
                        self.process_panel_request(cmd).await;
                    }
                }
                event = events_rx.recv() => {
                    let Some(event) = event else {
                        tracing::info!("firmware event channel closed, controller exiting");
                        break;
                    };
                    self.handle_event(event);
                }
                _ = heater_tick.tick() => self.check_heaters(),
            }
        }
    }

    /// Route one complete panel line. Unroutable requests get the empty
    /// acknowledgement; while the panel revision is still unknown, lines
    /// without an `A` code are fed to the detection matcher instead.
    pub async fn process_panel_request(&mut self, cmd: PanelCommand) {
        match cmd.code() {
            Some(code) => match route(code) {
                Some(DispatchGroup::Info) => self.panel_info(&cmd, code).await,
                Some(DispatchGroup::Action) => self.panel_action(&cmd, code).await,
                Some(DispatchGroup::Process) => self.panel_process(&cmd, code),
                None => self.link.send_empty_line(),
            },
            None => {
                if self.ctx.panel_kind == PanelKind::Unknown {
                    self.detect_panel(&cmd);
                    return;
                }
                self.link.send_empty_line();
            }
        }
    }

    /// A standard panel answers the `SIZE` probe with `SXY 480 320`; a new
    /// panel answers `J200` with an `[0]=0` register dump.
    fn detect_panel(&mut self, cmd: &PanelCommand) {
        if let Some(pos) = cmd.find_token('S') {
            if cmd.char_at(pos + 1) == Some('X') && cmd.char_at(pos + 2) == Some('Y') {
                self.ctx.panel_kind = PanelKind::Standard;
                tracing::info!("standard panel detected");
            }
            return;
        }
        if let Some(pos) = cmd.find_token('[') {
            if cmd.char_at(pos + 1) == Some('0') && cmd.char_at(pos + 2) == Some(']') {
                self.ctx.panel_kind = PanelKind::New;
                tracing::info!("new panel detected");
            }
        }
    }

    /// Apply one firmware-side callback to the state machine.
    pub fn handle_event(&mut self, event: FirmwareEvent) {
        tracing::debug!("firmware event {:?} in state {:?}", event, self.ctx.printer_state);
        match event {
            FirmwareEvent::Timer(TimerEvent::Started) => {
                self.ctx.live_z_offset = 0.0;
                self.ctx.pause_state = PauseState::Idle;
                // Recovery homing may park above the bed limit.
                self.firmware.set_soft_endstops(false);
                self.ctx.printer_state = PrinterState::Printing;
                self.link.send_line(MSG_PRINT_FROM_SD_CARD);
            }
            FirmwareEvent::Timer(TimerEvent::Paused) => {
                if self.ctx.printer_state == PrinterState::Printing {
                    self.ctx.printer_state = PrinterState::Pausing;
                }
            }
            FirmwareEvent::Timer(TimerEvent::Stopped) => {
                if self.ctx.printer_state != PrinterState::Idle {
                    self.ctx.printer_state = PrinterState::Stopping;
                    self.link.send_line(MSG_PRINT_COMPLETE);
                }
                self.firmware.set_soft_endstops(true);
            }
            FirmwareEvent::Status(update) => self.on_status(update),
            FirmwareEvent::Confirmation(reason) => self.on_confirmation(reason),
            FirmwareEvent::Media(MediaEvent::Inserted) => {
                self.link.send_line(MSG_SD_CARD_INSERTED)
            }
            FirmwareEvent::Media(MediaEvent::Removed) => self.link.send_line(MSG_SD_CARD_REMOVED),
            FirmwareEvent::Media(MediaEvent::Error) => {
                self.ctx.last_error = LastError::NoSdCard;
                self.link.send_line(MSG_NO_SD_CARD);
            }
            FirmwareEvent::FilamentRunout => {
                self.ctx.last_error = LastError::FilamentRunout;
                self.link.send_line(if self.firmware.is_printing_from_media() {
                    MSG_FILAMENT_OUT_ALERT
                } else {
                    MSG_FILAMENT_OUT_BLOCK
                });
                self.firmware.play_tune(Tune::FilamentOut);
            }
            FirmwareEvent::PowerLossRecovery => {
                self.ctx.printer_state = PrinterState::ResumingFromPowerOutage;
                self.ctx.last_error = LastError::PowerLoss;
                self.firmware.play_tune(Tune::Sos);
                tracing::warn!("power-loss recovery pending, waiting for panel resume");
            }
            FirmwareEvent::PrintComplete => {
                self.link.send_line(MSG_PRINT_COMPLETE);
                self.ctx.printer_state = PrinterState::Idle;
                self.firmware.set_soft_endstops(true);
            }
            FirmwareEvent::Killed => self.link.send_line(MSG_KILL_LCD),
        }
    }

    fn on_status(&mut self, update: StatusUpdate) {
        match (self.ctx.printer_state, update) {
            (PrinterState::Probing, StatusUpdate::Ready) => {
                // Probe pass finished: persist the mesh and park.
                self.firmware.inject_commands(CMD_SAVE_MESH_AND_PARK);
                self.link.send_line(MSG_PROBING_COMPLETE);
                self.ctx.printer_state = PrinterState::Idle;
                self.ctx.selected_mesh_point.clear();
                return;
            }
            (PrinterState::Probing, StatusUpdate::ProbingFailed) => {
                // Don't save a bad mesh; lift the probe clear of the bed.
                self.firmware.play_tune(Tune::ProbingFailed);
                self.firmware.inject_commands(CMD_RAISE_AFTER_PROBE_FAIL);
                self.link.send_line(MSG_PROBING_COMPLETE);
                self.ctx.printer_state = PrinterState::Idle;
                self.ctx.selected_mesh_point.clear();
                return;
            }
            (PrinterState::Printing, StatusUpdate::Reheating) => {
                self.link.send_line(MSG_PAUSED);
                return;
            }
            (PrinterState::Pausing, StatusUpdate::PrintPaused) => {
                self.link.send_line(MSG_PAUSED);
                self.ctx.printer_state = PrinterState::Paused;
                self.ctx.pause_state = PauseState::Idle;
                return;
            }
            (PrinterState::Stopping, StatusUpdate::PrintAborted) => {
                self.link.send_line(MSG_STOP);
                self.ctx.printer_state = PrinterState::Idle;
                return;
            }
            _ => {}
        }

        // Heater progress notices are state-independent.
        match update {
            StatusUpdate::ExtruderHeating => {
                self.link.send_line(MSG_NOZZLE_HEATING);
                self.ctx.hotend_state = HeaterState::TempSet;
            }
            StatusUpdate::BedHeating => {
                self.link.send_line(MSG_BED_HEATING);
                self.ctx.hotbed_state = HeaterState::TempSet;
            }
            StatusUpdate::EepromVersionMismatch => {
                self.ctx.last_error = LastError::EepromMismatch;
            }
            _ => {}
        }
    }

    fn on_confirmation(&mut self, reason: PromptReason) {
        match self.ctx.printer_state {
            PrinterState::Pausing => {
                if matches!(reason, PromptReason::PrintPaused | PromptReason::NozzleParked) {
                    self.link.send_line(MSG_PAUSED);
                    self.ctx.printer_state = PrinterState::Paused;
                    self.ctx.pause_state = PauseState::Idle;
                }
            }
            PrinterState::Printing
            | PrinterState::Paused
            | PrinterState::ResumingFromPowerOutage => {
                let outage = self.ctx.printer_state == PrinterState::ResumingFromPowerOutage;
                match reason {
                    PromptReason::HeaterTimeout => {
                        self.ctx.pause_state = PauseState::HeaterTimedOut;
                        if !outage {
                            self.ctx.printer_state = PrinterState::Paused;
                        }
                        self.link.send_line(MSG_PAUSED);
                        self.firmware.play_tune(Tune::HeaterTimeout);
                    }
                    PromptReason::ReheatDone => {
                        self.ctx.pause_state = PauseState::Idle;
                        if !outage {
                            self.ctx.printer_state = PrinterState::Paused;
                        }
                        self.link.send_line(MSG_PAUSED);
                    }
                    PromptReason::FilamentPurging => {
                        self.ctx.pause_state = PauseState::PurgingFilament;
                        if !outage {
                            self.ctx.printer_state = PrinterState::Paused;
                        }
                        self.link.send_line(MSG_PAUSED);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    /// Periodic heater sanity sweep. A reading outside the configured limits
    /// must persist for [`HEATER_FAULT_TICKS`] consecutive sweeps before the
    /// panel is alerted; one good reading resets the count.
    pub fn check_heaters(&mut self) {
        let heaters = &self.config.heaters;

        let hotend = self.firmware.hotend_temp();
        if hotend < heaters.hotend_min || hotend > heaters.hotend_max {
            self.ctx.hotend_fault_ticks = self.ctx.hotend_fault_ticks.saturating_add(1);
            if self.ctx.hotend_fault_ticks == HEATER_FAULT_TICKS {
                self.link.send_line(MSG_NOZZLE_TEMP_ABNORMAL);
                self.ctx.last_error = LastError::AbnormalHotendTemp;
                tracing::error!("hotend temp abnormal: {:.1}C", hotend);
            }
        } else {
            self.ctx.hotend_fault_ticks = 0;
        }

        let bed = self.firmware.bed_temp();
        if bed < heaters.bed_min || bed > heaters.bed_max {
            self.ctx.hotbed_fault_ticks = self.ctx.hotbed_fault_ticks.saturating_add(1);
            if self.ctx.hotbed_fault_ticks == HEATER_FAULT_TICKS {
                self.link.send_line(MSG_BED_TEMP_ABNORMAL);
                self.ctx.last_error = LastError::AbnormalBedTemp;
                tracing::error!("bed temp abnormal: {:.1}C", bed);
            }
        } else {
            self.ctx.hotbed_fault_ticks = 0;
        }

        if self.ctx.hotend_state != HeaterState::TempReached
            && (hotend - self.firmware.hotend_target()).abs() <= heaters.temp_window
        {
            self.link.send_line(MSG_NOZZLE_HEATING_DONE);
            self.ctx.hotend_state = HeaterState::TempReached;
        }

        if self.ctx.hotbed_state != HeaterState::TempReached
            && (bed - self.firmware.bed_target()).abs() <= heaters.bed_temp_window
        {
            self.link.send_line(MSG_BED_HEATING_DONE);
            self.ctx.hotbed_state = HeaterState::TempReached;
        }
    }
}
