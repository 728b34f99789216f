// src/controller/actions.rs - One-shot panel commands (A9-A28)
use super::context::{HeaterState, PanelKind, PauseState, PrinterState};
use super::{
    CMD_CANCEL_POWER_LOSS, CMD_HOME_ALL, CMD_LOAD_FILAMENT, CMD_POWER_LOSS_HOME,
    CMD_RESUME_POWER_LOSS, CMD_UNLOAD_FILAMENT, PanelController,
};
use crate::file_navigator::MediaStore;
use crate::firmware::{Axis, FirmwareApi};
use crate::panel::PanelCommand;
use crate::panel::messages::*;
use std::time::Duration;

impl<F: FirmwareApi, M: MediaStore> PanelController<F, M> {
    /// One-shot commands. Guard behavior while printing is deliberately
    /// per-command (some reply, some are silent); it mirrors what each panel
    /// screen expects and is pinned by the tests.
    pub(super) async fn panel_action(&mut self, cmd: &PanelCommand, code: u8) {
        match code {
            // A9: pause, only meaningful for a media print.
            9 => {
                if self.firmware.is_printing_from_media() {
                    self.link.send_line(MSG_PAUSE);
                    self.firmware.pause_print();
                    self.ctx.printer_state = PrinterState::Pausing;
                } else {
                    self.link.send_line(MSG_STOP);
                }
            }

            // A10: resume. A plain pause resumes the job; a heater-timeout
            // or purge hold instead wants the generic user-confirmed signal,
            // which re-enters the firmware's own pause flow.
            10 => {
                if self.ctx.pause_state == PauseState::Idle
                    || self.ctx.printer_state == PrinterState::ResumingFromPowerOutage
                {
                    self.firmware.resume_print();
                } else {
                    self.firmware.set_user_confirmed();
                }
            }

            // A11: stop. Outside a media print this cancels any pending
            // power-loss recovery and settles back to idle.
            11 => {
                if self.firmware.is_printing_from_media() {
                    self.ctx.printer_state = PrinterState::Stopping;
                    self.firmware.stop_print();
                } else {
                    if self.ctx.printer_state == PrinterState::ResumingFromPowerOutage {
                        self.firmware.inject_commands(CMD_CANCEL_POWER_LOSS);
                    }
                    self.link.send_line(MSG_STOP);
                    self.ctx.printer_state = PrinterState::Idle;
                }
            }

            12 => self.firmware.kill(),

            13 => self.select_file(cmd).await,

            // A14: start the selected file. Starting over a pending recovery
            // abandons the recovery first.
            14 => {
                if self.ctx.printer_state == PrinterState::ResumingFromPowerOutage {
                    self.firmware.inject_commands(CMD_CANCEL_POWER_LOSS);
                    self.ctx.printer_state = PrinterState::Idle;
                }
                if self.ctx.file_selection.is_empty() {
                    tracing::warn!("start-print request with no file selected");
                    return;
                }
                let path = format!("/{}", self.ctx.file_selection);
                self.firmware.start_print(&path);
                self.link.send_line(MSG_PRINT_FROM_SD_CARD);
            }

            // A15: resume from power outage: home to restore Z, then hand
            // over to the firmware's recovery flow.
            15 => {
                if self.ctx.printer_state == PrinterState::ResumingFromPowerOutage {
                    self.firmware.inject_commands(CMD_POWER_LOSS_HOME);
                    self.firmware.inject_commands(CMD_RESUME_POWER_LOSS);
                }
            }

            // A16: hotend target. The panel uses both `S` and `C` prefixes
            // for what is the same set operation.
            16 => {
                let target = cmd.float_after(5);
                self.ctx.hotend_state = if target != 0.0 {
                    HeaterState::TempSet
                } else {
                    HeaterState::Off
                };
                if matches!(cmd.char_at(4), Some('S') | Some('C')) {
                    self.firmware.set_hotend_target(target);
                }
            }

            17 => {
                let target = cmd.float_after(5);
                self.ctx.hotbed_state = if target != 0.0 {
                    HeaterState::TempSet
                } else {
                    HeaterState::Off
                };
                if cmd.char_at(4) == Some('S') {
                    self.firmware.set_bed_target(target);
                }
            }

            18 => {
                if cmd.char_at(4) == Some('S') {
                    let percent = cmd.float_after(5).clamp(0.0, 100.0) as u8;
                    self.firmware.set_fan_percent(percent);
                }
            }

            19 => {
                if !self.firmware.is_printing() {
                    self.firmware.disable_steppers();
                    self.link.send_line(MSG_READY);
                }
            }

            // A20: combined feedrate read/write, split on whether the panel
            // supplied a value.
            20 => {
                if cmd.char_at(4) == Some('S') {
                    let percent = cmd.int_after(5).clamp(0, u16::MAX as i32) as u16;
                    self.firmware.set_feedrate_percent(percent);
                } else {
                    let reply = format!("A20V {}", self.firmware.feedrate_percent());
                    self.link.send_line(&reply);
                }
            }

            // A21: home one axis or all.
            21 => {
                if !self.firmware.is_printing() {
                    match cmd.char_at(4) {
                        Some('X') => self.firmware.inject_commands("G28X"),
                        Some('Y') => self.firmware.inject_commands("G28Y"),
                        Some('Z') => self.firmware.inject_commands("G28Z"),
                        Some('C') => self.firmware.inject_commands(CMD_HOME_ALL),
                        _ => {}
                    }
                }
            }

            22 => self.jog_axis(cmd),

            23 => {
                if !self.firmware.is_printing() {
                    let presets = self.config.presets.clone();
                    self.firmware.set_bed_target(presets.preheat1_bed);
                    self.firmware.set_hotend_target(presets.preheat1_hotend);
                    self.link.send_empty_line();
                    self.ctx.hotbed_state = HeaterState::TempSet;
                    self.ctx.hotend_state = HeaterState::TempSet;
                }
            }

            24 => {
                if !self.firmware.is_printing() {
                    let presets = self.config.presets.clone();
                    self.firmware.set_bed_target(presets.preheat2_bed);
                    self.firmware.set_hotend_target(presets.preheat2_hotend);
                    self.link.send_empty_line();
                    self.ctx.hotbed_state = HeaterState::TempSet;
                    self.ctx.hotend_state = HeaterState::TempSet;
                }
            }

            25 => {
                if !self.firmware.is_printing() {
                    self.firmware.set_hotend_target(0.0);
                    self.firmware.set_bed_target(0.0);
                    self.link.send_line(MSG_READY);
                    self.ctx.hotbed_state = HeaterState::Off;
                    self.ctx.hotend_state = HeaterState::Off;
                }
            }

            // A26: give a freshly inserted card time to settle, then rewind
            // the listing cursor to the root.
            26 => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                self.navigator.reset();
            }

            // A27: servo angle adjust; this machine has no probe servo.
            27 => {}

            // A28: filament sensor toggle; accepted but firmware-managed.
            28 => {
                if !self.firmware.is_printing() {
                    self.link.send_empty_line();
                }
            }

            _ => {}
        }
    }

    /// A13: the panel sent a listing token back. A leading `/` selects a
    /// file, `<` climbs out of the current folder, anything else descends
    /// into the named folder.
    async fn select_file(&mut self, cmd: &PanelCommand) {
        let token = cmd.arg_from(4).to_string();
        match token.chars().next() {
            Some('/') => {
                self.ctx.file_selection = token[1..].to_string();
                tracing::debug!("file selected: {}", self.ctx.file_selection);
                self.link.send_line(MSG_SD_FILE_OPEN_SUCCESS);
            }
            Some('<') => {
                self.navigator.up_dir();
                self.link.send_line(MSG_SD_FILE_OPEN_FAILED);
                self.send_file_list(0).await;
            }
            Some(_) => {
                // The new panel appends a .GCO tag to folder tokens.
                let folder = if self.ctx.panel_kind == PanelKind::New {
                    token.strip_suffix(".GCO").unwrap_or(&token).to_string()
                } else {
                    token.clone()
                };
                self.ctx.file_selection = folder.clone();
                self.navigator.change_dir(&folder);
                self.link.send_line(MSG_SD_FILE_OPEN_FAILED);
                self.send_file_list(0).await;
            }
            None => self.link.send_line(MSG_SD_FILE_OPEN_FAILED),
        }
    }

    /// A22: manual move. X/Y/Z jog by a signed delta; the E axis instead
    /// runs the fast load/unload macros because jog feed rates are far too
    /// slow for filament handling.
    fn jog_axis(&mut self, cmd: &PanelCommand) {
        if self.firmware.is_printing() {
            return;
        }

        let Some((axis, pos)) = ['X', 'Y', 'Z', 'E']
            .iter()
            .find_map(|&c| cmd.find_token(c).map(|p| (c, p)))
        else {
            return;
        };
        let delta = cmd.float_after(pos + 1);

        match axis {
            'E' => {
                if self.firmware.hotend_temp() < self.config.heaters.extrude_min_temp {
                    tracing::warn!("filament move refused: hotend below extrude minimum");
                    return;
                }
                if !self.firmware.is_queue_empty() {
                    return;
                }
                self.firmware.inject_commands(if delta > 0.0 {
                    CMD_LOAD_FILAMENT
                } else {
                    CMD_UNLOAD_FILAMENT
                });
            }
            'X' | 'Y' | 'Z' => {
                let axis = match axis {
                    'X' => Axis::X,
                    'Y' => Axis::Y,
                    _ => Axis::Z,
                };
                self.firmware.set_soft_endstops(true);
                let target = self.firmware.axis_position(axis) + delta;
                self.firmware.set_axis_position(axis, target);
            }
            _ => unreachable!(),
        }
    }
}
