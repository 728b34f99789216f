// Shared test rig: controller over simulated firmware and in-memory media,
// with the outbound panel lines captured for assertions.
#![allow(dead_code)] // not every test crate exercises the whole rig

use chiron_panel::config::{Config, PanelKindConfig};
use chiron_panel::controller::PanelController;
use chiron_panel::file_navigator::{FileNavigator, MemoryMediaStore};
use chiron_panel::firmware::FirmwareEvent;
use chiron_panel::firmware::sim::SimFirmware;
use chiron_panel::panel::{PanelCommand, PanelLink};
use tokio::sync::mpsc;

pub struct Rig {
    pub controller: PanelController<SimFirmware, MemoryMediaStore>,
    pub sim: SimFirmware,
    pub out: mpsc::UnboundedReceiver<String>,
}

impl Rig {
    /// Rig with a known panel type and a small card image.
    pub fn new() -> Self {
        let mut media = MemoryMediaStore::new();
        media
            .add_file("", "benchy.gco")
            .add_file("", "vase.gcode")
            .add_dir("", "calibration")
            .add_file("calibration", "cube.gco");
        Self::build(media, PanelKindConfig::Standard)
    }

    pub fn with_media(media: MemoryMediaStore) -> Self {
        Self::build(media, PanelKindConfig::Standard)
    }

    pub fn with_panel_kind(kind: PanelKindConfig) -> Self {
        Self::build(MemoryMediaStore::new(), kind)
    }

    fn build(media: MemoryMediaStore, kind: PanelKindConfig) -> Self {
        let mut config = Config::default();
        config.panel.kind = kind;
        let (link, out) = PanelLink::new();
        let sim = SimFirmware::new();
        let controller =
            PanelController::new(config, sim.clone(), link, FileNavigator::new(media));
        Self {
            controller,
            sim,
            out,
        }
    }

    /// Dispatch one panel line.
    pub async fn send(&mut self, line: &str) {
        self.controller
            .process_panel_request(PanelCommand::new(line))
            .await;
    }

    /// Deliver one firmware-side event.
    pub fn fire(&mut self, event: FirmwareEvent) {
        self.controller.handle_event(event);
    }

    /// Everything sent to the panel so far, newline-stripped, oldest first.
    pub fn replies(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(raw) = self.out.try_recv() {
            lines.push(raw.trim_end_matches("\r\n").to_string());
        }
        lines
    }

    pub fn last_reply(&mut self) -> Option<String> {
        self.replies().pop()
    }

    pub fn assert_no_reply(&mut self) {
        let replies = self.replies();
        assert!(replies.is_empty(), "unexpected replies: {replies:?}");
    }
}
