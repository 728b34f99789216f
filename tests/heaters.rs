// Heater supervision: fault validation ticks and heating-done notices.
mod common;

use chiron_panel::controller::context::HeaterState;
use common::Rig;

#[tokio::test]
async fn heating_done_is_reported_once() {
    let mut rig = Rig::new();
    rig.sim.with(|s| {
        s.hotend_temp = 199.5;
        s.hotend_target = 200.0;
    });
    rig.send("A16 S200").await;
    rig.replies();

    rig.controller.check_heaters();
    let replies = rig.replies();
    assert!(replies.contains(&"J07".to_string()), "got {replies:?}");
    assert_eq!(rig.controller.context().hotend_state, HeaterState::TempReached);

    rig.controller.check_heaters();
    let replies = rig.replies();
    assert!(!replies.contains(&"J07".to_string()), "got {replies:?}");
}

#[tokio::test]
async fn bed_heating_done_uses_its_own_window() {
    let mut rig = Rig::new();
    rig.sim.with(|s| {
        s.bed_temp = 59.2;
        s.bed_target = 60.0;
    });
    rig.send("A17 S60").await;
    rig.controller.check_heaters();
    assert!(rig.replies().contains(&"J09".to_string()));
    assert_eq!(rig.controller.context().hotbed_state, HeaterState::TempReached);
}

#[tokio::test]
async fn hotend_fault_needs_five_consecutive_bad_sweeps() {
    let mut rig = Rig::new();
    rig.sim.with(|s| s.hotend_temp = 300.0);

    for _ in 0..4 {
        rig.controller.check_heaters();
    }
    assert!(!rig.replies().contains(&"J10".to_string()));

    rig.controller.check_heaters();
    assert!(rig.replies().contains(&"J10".to_string()));

    // The fault is surfaced through the firmware-info channel too.
    rig.send("A33").await;
    assert_eq!(rig.last_reply().unwrap(), "J33 Error: hotend temp abnormal");
}

#[tokio::test]
async fn one_good_reading_resets_the_fault_count() {
    let mut rig = Rig::new();
    rig.sim.with(|s| s.hotend_temp = 300.0);
    for _ in 0..4 {
        rig.controller.check_heaters();
    }
    rig.sim.with(|s| s.hotend_temp = 210.0);
    rig.controller.check_heaters();
    rig.sim.with(|s| s.hotend_temp = 300.0);
    for _ in 0..4 {
        rig.controller.check_heaters();
    }
    assert!(!rig.replies().contains(&"J10".to_string()));
}

#[tokio::test]
async fn bed_fault_is_reported_with_its_own_error() {
    let mut rig = Rig::new();
    rig.sim.with(|s| s.bed_temp = 150.0);
    for _ in 0..5 {
        rig.controller.check_heaters();
    }
    assert!(rig.replies().contains(&"J10".to_string()));
    rig.send("A33").await;
    assert_eq!(rig.last_reply().unwrap(), "J33 Error: bed temp abnormal");
}
