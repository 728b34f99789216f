// Wire-level protocol behavior: routing, reply formats, detection.
mod common;

use chiron_panel::config::PanelKindConfig;
use chiron_panel::controller::context::PanelKind;
use chiron_panel::file_navigator::MemoryMediaStore;
use chiron_panel::firmware::{FirmwareEvent, MediaEvent};
use common::Rig;

#[tokio::test]
async fn info_replies_carry_the_request_code_prefix() {
    let mut rig = Rig::new();
    for code in 0..=7 {
        rig.send(&format!("A{code}")).await;
        let reply = rig.last_reply().unwrap();
        assert!(
            reply.starts_with(&format!("A{code}V")),
            "A{code} replied {reply:?}"
        );
    }
}

#[tokio::test]
async fn temperature_queries_report_firmware_values() {
    let mut rig = Rig::new();
    rig.sim.with(|s| {
        s.hotend_temp = 205.5;
        s.hotend_target = 210.0;
        s.bed_temp = 59.4;
        s.bed_target = 60.0;
    });
    rig.send("A0").await;
    assert_eq!(rig.last_reply().unwrap(), "A0V 205.50");
    rig.send("A1").await;
    assert_eq!(rig.last_reply().unwrap(), "A1V 210.00");
    rig.send("A2").await;
    assert_eq!(rig.last_reply().unwrap(), "A2V 59.40");
    rig.send("A3").await;
    assert_eq!(rig.last_reply().unwrap(), "A3V 60.00");
}

#[tokio::test]
async fn progress_is_a_placeholder_without_a_media_print() {
    let mut rig = Rig::new();
    rig.send("A6").await;
    assert_eq!(rig.last_reply().unwrap(), "A6V ---");

    rig.sim.with(|s| {
        s.printing_from_media = true;
        s.progress_percent = 7;
    });
    rig.send("A6").await;
    assert_eq!(rig.last_reply().unwrap(), "A6V 07");
}

#[tokio::test]
async fn print_time_is_zero_padded_hours_and_minutes() {
    let mut rig = Rig::new();
    rig.sim.with(|s| s.elapsed_seconds = 3723); // 62 minutes
    rig.send("A7").await;
    assert_eq!(rig.last_reply().unwrap(), "A7V 01:02");
}

#[tokio::test(start_paused = true)]
async fn file_list_reports_missing_card() {
    let mut rig = Rig::with_media(MemoryMediaStore::absent());
    rig.send("A8 S0").await;
    assert_eq!(rig.last_reply().unwrap(), "J02");
}

#[tokio::test]
async fn file_list_page_is_framed() {
    let mut rig = Rig::new();
    rig.send("A8 S0").await;
    let replies = rig.replies();
    assert_eq!(replies.first().unwrap(), "FN ");
    assert_eq!(replies.last().unwrap(), "END");
    // Folders first, then files, token line before display line.
    assert_eq!(replies[1], "calibration");
    assert_eq!(replies[2], "calibration/");
    assert_eq!(replies[3], "/benchy.gco");
    assert_eq!(replies[4], "benchy.gco");
}

#[tokio::test]
async fn firmware_info_reports_version_then_pending_error_once() {
    let mut rig = Rig::new();
    rig.send("A33").await;
    assert_eq!(rig.last_reply().unwrap(), "J33 2.1.2");

    rig.fire(FirmwareEvent::Media(MediaEvent::Error));
    assert_eq!(rig.last_reply().unwrap(), "J02");
    rig.send("A33").await;
    assert_eq!(rig.last_reply().unwrap(), "J33 Error: no SD card");

    // The error is consumed by the read.
    rig.send("A33").await;
    assert_eq!(rig.last_reply().unwrap(), "J33 2.1.2");
}

#[tokio::test]
async fn feedrate_is_a_combined_read_write_command() {
    let mut rig = Rig::new();
    rig.send("A20").await;
    assert_eq!(rig.last_reply().unwrap(), "A20V 100");

    rig.send("A20 S150").await;
    rig.assert_no_reply();
    assert_eq!(rig.sim.with(|s| s.feedrate_percent), 150);

    rig.send("A20").await;
    assert_eq!(rig.last_reply().unwrap(), "A20V 150");
}

#[tokio::test]
async fn unroutable_codes_get_the_empty_acknowledgement() {
    let mut rig = Rig::new();
    rig.send("A99").await;
    assert_eq!(rig.last_reply().unwrap(), "");
    rig.send("A37").await;
    assert_eq!(rig.last_reply().unwrap(), "");
}

#[tokio::test]
async fn codeless_lines_get_the_empty_acknowledgement_once_the_panel_is_known() {
    let mut rig = Rig::new();
    rig.send("garbage line").await;
    assert_eq!(rig.last_reply().unwrap(), "");
}

#[tokio::test]
async fn standard_panel_is_detected_from_the_size_response() {
    let mut rig = Rig::with_panel_kind(PanelKindConfig::Auto);
    rig.send("SXY 480 320").await;
    // Detection consumes the line without acknowledging it.
    rig.assert_no_reply();
    assert_eq!(rig.controller.context().panel_kind, PanelKind::Standard);
}

#[tokio::test]
async fn new_panel_is_detected_from_the_register_dump() {
    let mut rig = Rig::with_panel_kind(PanelKindConfig::Auto);
    rig.send("[0]=0").await;
    rig.assert_no_reply();
    assert_eq!(rig.controller.context().panel_kind, PanelKind::New);
}

#[tokio::test]
async fn coordinate_query_labels_all_axes() {
    let mut rig = Rig::new();
    rig.sim.with(|s| {
        s.positions.insert(chiron_panel::firmware::Axis::X, 110.0);
        s.positions.insert(chiron_panel::firmware::Axis::Y, 205.0);
        s.positions.insert(chiron_panel::firmware::Axis::Z, 1.2);
    });
    rig.send("A5").await;
    assert_eq!(rig.last_reply().unwrap(), "A5V X: 110.00 Y: 205.00 Z: 1.20");
}
