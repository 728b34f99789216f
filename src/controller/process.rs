// src/controller/process.rs - Stateful leveling operations (A29-A36)
use super::context::{PrinterState, SelectedMeshPoint};
use super::{
    CMD_AUTO_LEVEL, CMD_HOME_ALL, CMD_RESTORE_SETTINGS, CMD_SAVE_SETTINGS, MAX_Z_NUDGE_MM,
    PanelController,
};
use crate::file_navigator::MediaStore;
use crate::firmware::{Axis, FirmwareApi};
use crate::panel::PanelCommand;
use crate::panel::messages::*;

impl<F: FirmwareApi, M: MediaStore> PanelController<F, M> {
    pub(super) fn panel_process(&mut self, cmd: &PanelCommand, code: u8) {
        match code {
            29 => self.read_mesh_point(cmd),

            // A30: start auto leveling. Probing is only entered from idle;
            // the panel also sends A30 without `S` just to open the menu.
            30 => {
                if cmd.find_token('S').is_some() {
                    if self.ctx.printer_state != PrinterState::Idle {
                        self.link.send_line(MSG_PROBING_NOT_ALLOWED);
                    } else {
                        self.link.send_line(MSG_START_PROBING);
                        self.firmware.inject_commands(CMD_AUTO_LEVEL);
                        self.ctx.printer_state = PrinterState::Probing;
                    }
                } else {
                    self.link.send_line(MSG_START_PROBING);
                }
            }

            31 => self.adjust_all_points(cmd),

            // A32: clear leveling beep flag. Dead letter in the panel
            // firmware; accepted and ignored.
            32 => {}

            34 => self.adjust_single_point(cmd),

            // A35 is unassigned in the request map.
            35 => {}

            // A36: new-panel leveling entry quirk.
            36 => self.link.send_line(MSG_START_PROBING),

            _ => {}
        }
    }

    fn mesh_coords(&self, cmd: &PanelCommand) -> (u8, u8) {
        let coord = |token| {
            cmd.find_token(token)
                .map(|p| cmd.int_after(p + 1))
                .unwrap_or(0)
                .clamp(0, u8::MAX as i32) as u8
        };
        (coord('X'), coord('Y'))
    }

    /// A29: report the stored value of one mesh cell. Re-selecting the cell
    /// that is already selected means "take me there": raise Z, travel to
    /// the cell's bed coordinate, then drop to Z0 for a paper check.
    fn read_mesh_point(&mut self, cmd: &PanelCommand) {
        let (x, y) = self.mesh_coords(cmd);
        let z = self.firmware.mesh_point(x, y);
        let reply = format!("A29V {:.2}", z * 100.0);
        self.link.send_line(&reply);

        if self.firmware.is_printing() {
            return;
        }
        self.firmware.set_soft_endstops(true);

        if self.ctx.selected_mesh_point.is(x, y) {
            if !self.firmware.is_position_known() {
                self.firmware.inject_commands(CMD_HOME_ALL);
            }
            if self.firmware.is_position_known() {
                let mesh = &self.config.mesh;
                tracing::debug!("visiting mesh point ({}, {})", x, y);
                self.firmware.set_axis_position(Axis::Z, 3.0);
                self.firmware
                    .set_axis_position(Axis::X, mesh.origin_x + mesh.pitch * x as f32);
                self.firmware
                    .set_axis_position(Axis::Y, mesh.origin_y + mesh.pitch * y as f32);
                self.firmware.set_axis_position(Axis::Z, 0.0);
            }
        }
        self.ctx.selected_mesh_point = SelectedMeshPoint { x, y };
    }

    /// A31: whole-mesh offset operations, keyed by a single-character
    /// sub-command. While printing, `S` babysteps the head (clamped per
    /// call) and accumulates the full delta into the live offset; while
    /// idle it shifts every cell and the persisted probe offset.
    fn adjust_all_points(&mut self, cmd: &PanelCommand) {
        if cmd.find_token('C').is_some() {
            // Abandon edits: reload persisted settings, re-enable leveling.
            if !self.firmware.is_printing() {
                self.firmware.inject_commands(CMD_RESTORE_SETTINGS);
                self.ctx.selected_mesh_point.clear();
                tracing::info!("mesh changes abandoned");
            }
        } else if cmd.find_token('D').is_some() {
            // Save: lift the nozzle first so the head is clear of the bed.
            if !self.firmware.is_printing() {
                self.firmware.set_axis_position(Axis::Z, 1.0);
                self.firmware.inject_commands(CMD_SAVE_SETTINGS);
                self.ctx.selected_mesh_point.clear();
                tracing::info!("mesh changes saved");
            }
        } else if cmd.find_token('G').is_some() {
            if self.firmware.is_printing() {
                let reply = format!("A31V {:.2}", self.ctx.live_z_offset);
                self.link.send_line(&reply);
            } else {
                let reply = format!("A31V {:.2}", self.firmware.z_offset());
                self.link.send_line(&reply);
                self.ctx.selected_mesh_point.clear();
            }
        } else if let Some(pos) = cmd.find_token('S') {
            let shift = cmd.float_after(pos + 1);
            self.firmware.set_soft_endstops(false);

            if self.firmware.is_printing() {
                if self.firmware.is_z_position_known() {
                    let step = shift.clamp(-MAX_Z_NUDGE_MM, MAX_Z_NUDGE_MM);
                    tracing::debug!(
                        "live Z offset {:.2} -> {:.2} (babystep {:.2})",
                        self.ctx.live_z_offset,
                        self.ctx.live_z_offset + shift,
                        step
                    );
                    self.firmware.babystep_z(step);
                    self.ctx.live_z_offset += shift;
                }
                let reply = format!("A31V {:.2}", self.ctx.live_z_offset);
                self.link.send_line(&reply);
            } else {
                let mesh = self.config.mesh.clone();
                for x in 0..mesh.grid_x {
                    for y in 0..mesh.grid_y {
                        let current = self.firmware.mesh_point(x, y);
                        let shifted = (current + shift).clamp(mesh.cell_floor, mesh.cell_ceiling);
                        self.firmware.set_mesh_point(x, y, shifted);
                    }
                }
                let offset = self.firmware.z_offset() + shift;
                self.firmware.set_z_offset(offset);
                let reply = format!("A31V {:.2}", self.firmware.z_offset());
                self.link.send_line(&reply);

                if self.firmware.is_z_position_known() {
                    let z = self.firmware.axis_position(Axis::Z);
                    let step = shift.clamp(-MAX_Z_NUDGE_MM, MAX_Z_NUDGE_MM);
                    self.firmware.set_axis_position(Axis::Z, z + step);
                }
            }
        }
    }

    /// A34: write one mesh cell (value arrives scaled x100), or `C` to
    /// restore persisted settings. When the edited cell is the one the head
    /// is parked on, mirror the edit with a clamped physical Z nudge so the
    /// operator sees the change.
    fn adjust_single_point(&mut self, cmd: &PanelCommand) {
        if cmd.char_at(3) == Some('C') {
            self.firmware.inject_commands(CMD_RESTORE_SETTINGS);
            self.ctx.selected_mesh_point.clear();
            return;
        }

        let (x, y) = self.mesh_coords(cmd);
        let Some(vpos) = cmd.find_token('V') else {
            return;
        };
        let new_value = cmd.float_after(vpos + 1) / 100.0;

        let current = self.firmware.mesh_point(x, y);
        self.firmware.set_mesh_point(x, y, new_value);

        if matches!(
            self.ctx.printer_state,
            PrinterState::Idle | PrinterState::Probing
        ) && self.ctx.selected_mesh_point.is(x, y)
        {
            // The panel steps values in 0.05 mm presses, so the physical
            // correction is clamped to one press per call.
            self.firmware.set_soft_endstops(false);
            let z = self.firmware.axis_position(Axis::Z);
            let step = (new_value - current).clamp(-MAX_Z_NUDGE_MM, MAX_Z_NUDGE_MM);
            self.firmware.set_axis_position(Axis::Z, z + step);
        }
    }
}
