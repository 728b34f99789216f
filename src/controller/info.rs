// src/controller/info.rs - Read-only panel queries (A0-A8, A33)
use super::context::LastError;
use super::{FILE_LIST_PAGE, PanelController};
use crate::file_navigator::MediaStore;
use crate::firmware::{Axis, FirmwareApi};
use crate::panel::PanelCommand;
use crate::panel::messages::*;
use std::time::Duration;

impl<F: FirmwareApi, M: MediaStore> PanelController<F, M> {
    /// Value queries. None of these mutate printer state; each formats a
    /// single reply line.
    pub(super) async fn panel_info(&mut self, cmd: &PanelCommand, code: u8) {
        match code {
            // A0-A3: current and target temperatures.
            0 => {
                let reply = format!("A0V {:.2}", self.firmware.hotend_temp());
                self.link.send_line(&reply);
            }
            1 => {
                let reply = format!("A1V {:.2}", self.firmware.hotend_target());
                self.link.send_line(&reply);
            }
            2 => {
                let reply = format!("A2V {:.2}", self.firmware.bed_temp());
                self.link.send_line(&reply);
            }
            3 => {
                let reply = format!("A3V {:.2}", self.firmware.bed_target());
                self.link.send_line(&reply);
            }

            4 => {
                let reply = format!("A4V {}", self.firmware.fan_percent());
                self.link.send_line(&reply);
            }

            5 => {
                let reply = format!(
                    "A5V X: {:.2} Y: {:.2} Z: {:.2}",
                    self.firmware.axis_position(Axis::X),
                    self.firmware.axis_position(Axis::Y),
                    self.firmware.axis_position(Axis::Z),
                );
                self.link.send_line(&reply);
            }

            // A6: progress is only meaningful for a media print.
            6 => {
                if self.firmware.is_printing_from_media() {
                    let reply = format!("A6V {:02}", self.firmware.progress_percent());
                    self.link.send_line(&reply);
                } else {
                    self.link.send_line("A6V ---");
                }
            }

            7 => {
                let minutes = self.firmware.elapsed_seconds() / 60;
                let reply = format!("A7V {:02}:{:02}", minutes / 60, minutes % 60);
                self.link.send_line(&reply);
            }

            // A8: file listing page. One bounded retry for a card that is
            // still mounting; the delay stalls the dispatch loop, which is
            // acceptable because it is bounded and rare.
            8 => {
                if !self.navigator.is_media_present().await {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                if !self.navigator.is_media_present().await {
                    self.link.send_line(MSG_NO_SD_CARD);
                } else if cmd.char_at(3) == Some('S') {
                    let start = cmd.int_after(4).max(0) as usize;
                    self.send_file_list(start).await;
                }
            }

            // A33: build version, or the pending fault if one is recorded.
            33 => {
                let body = match self.ctx.take_last_error() {
                    Some(err) => error_text(err).to_string(),
                    None => self.config.machine.version.clone(),
                };
                let reply = format!("{MSG_FIRMWARE_INFO}{body}");
                self.link.send_line(&reply);
            }

            _ => {}
        }
    }

    pub(super) async fn send_file_list(&mut self, start: usize) {
        self.link.send_line(MSG_FILE_LIST_START);
        for row in self.navigator.page(start, FILE_LIST_PAGE).await {
            self.link.send_line(&row.token);
            self.link.send_line(&row.display);
        }
        self.link.send_line(MSG_FILE_LIST_END);
    }
}

fn error_text(err: LastError) -> &'static str {
    match err {
        LastError::AbnormalBedTemp => MSG_ERROR_BED_TEMP,
        LastError::AbnormalHotendTemp => MSG_ERROR_HOTEND_TEMP,
        LastError::NoSdCard => MSG_ERROR_SD_CARD,
        LastError::PowerLoss => MSG_ERROR_POWER_LOSS,
        LastError::EepromMismatch => MSG_ERROR_EEPROM,
        LastError::FilamentRunout => MSG_ERROR_FILAMENT_OUT,
        LastError::None => "",
    }
}
