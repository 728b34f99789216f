// Printer state machine scenarios: pause/resume, stop, probing, power loss.
mod common;

use chiron_panel::controller::context::{PauseState, PrinterState};
use chiron_panel::firmware::{
    FirmwareEvent, PromptReason, StatusUpdate, TimerEvent, Tune,
};
use common::Rig;

#[tokio::test]
async fn pause_resume_round_trip() {
    let mut rig = Rig::new();

    // Select and start a file.
    rig.send("A13 /benchy.gco").await;
    assert_eq!(rig.last_reply().unwrap(), "J20");
    rig.send("A14").await;
    assert_eq!(rig.sim.with(|s| s.started_prints.clone()), vec!["/benchy.gco"]);
    assert_eq!(rig.last_reply().unwrap(), "J04");

    // Firmware confirms the job timer started.
    rig.fire(FirmwareEvent::Timer(TimerEvent::Started));
    assert_eq!(rig.controller.context().printer_state, PrinterState::Printing);
    assert_eq!(rig.last_reply().unwrap(), "J04");

    // Panel pauses; the transition completes on the firmware's paused status.
    rig.send("A9").await;
    assert_eq!(rig.controller.context().printer_state, PrinterState::Pausing);
    assert_eq!(rig.sim.with(|s| s.pause_requests), 1);

    rig.fire(FirmwareEvent::Timer(TimerEvent::Paused));
    assert_eq!(rig.controller.context().printer_state, PrinterState::Pausing);

    rig.fire(FirmwareEvent::Status(StatusUpdate::PrintPaused));
    assert_eq!(rig.controller.context().printer_state, PrinterState::Paused);
    assert_eq!(rig.controller.context().pause_state, PauseState::Idle);
    assert_eq!(rig.last_reply().unwrap(), "J18");

    // Resume goes through the firmware resume entry point.
    rig.send("A10").await;
    assert_eq!(rig.sim.with(|s| s.resume_requests), 1);
    rig.fire(FirmwareEvent::Timer(TimerEvent::Started));
    assert_eq!(rig.controller.context().printer_state, PrinterState::Printing);
}

#[tokio::test]
async fn heater_timeout_reroutes_resume_to_user_confirmed() {
    let mut rig = Rig::new();
    rig.send("A13 /benchy.gco").await;
    rig.send("A14").await;
    rig.fire(FirmwareEvent::Timer(TimerEvent::Started));
    rig.replies();

    rig.fire(FirmwareEvent::Confirmation(PromptReason::HeaterTimeout));
    assert_eq!(rig.controller.context().printer_state, PrinterState::Paused);
    assert_eq!(
        rig.controller.context().pause_state,
        PauseState::HeaterTimedOut
    );
    assert_eq!(rig.last_reply().unwrap(), "J18");
    assert_eq!(rig.sim.with(|s| s.tunes.clone()), vec![Tune::HeaterTimeout]);

    // Resume must not call the resume entry point mid-timeout.
    rig.send("A10").await;
    assert_eq!(rig.sim.with(|s| s.resume_requests), 0);
    assert_eq!(rig.sim.with(|s| s.user_confirms), 1);

    // Reheat completion restores the plain-pause resume path.
    rig.fire(FirmwareEvent::Confirmation(PromptReason::ReheatDone));
    assert_eq!(rig.controller.context().pause_state, PauseState::Idle);
    rig.send("A10").await;
    assert_eq!(rig.sim.with(|s| s.resume_requests), 1);
}

#[tokio::test]
async fn filament_purging_holds_the_pause_substate() {
    let mut rig = Rig::new();
    rig.send("A13 /benchy.gco").await;
    rig.send("A14").await;
    rig.fire(FirmwareEvent::Timer(TimerEvent::Started));
    rig.replies();

    rig.fire(FirmwareEvent::Confirmation(PromptReason::FilamentPurging));
    assert_eq!(
        rig.controller.context().pause_state,
        PauseState::PurgingFilament
    );
    rig.send("A10").await;
    assert_eq!(rig.sim.with(|s| s.user_confirms), 1);
    assert_eq!(rig.sim.with(|s| s.resume_requests), 0);
}

#[tokio::test]
async fn stop_goes_through_stopping_until_the_abort_status() {
    let mut rig = Rig::new();
    rig.send("A13 /benchy.gco").await;
    rig.send("A14").await;
    rig.fire(FirmwareEvent::Timer(TimerEvent::Started));
    rig.replies();

    rig.send("A11").await;
    assert_eq!(rig.controller.context().printer_state, PrinterState::Stopping);
    assert_eq!(rig.sim.with(|s| s.stop_requests), 1);

    rig.fire(FirmwareEvent::Status(StatusUpdate::PrintAborted));
    assert_eq!(rig.controller.context().printer_state, PrinterState::Idle);
    assert_eq!(rig.last_reply().unwrap(), "J16");
}

#[tokio::test]
async fn stop_while_idle_just_acknowledges() {
    let mut rig = Rig::new();
    rig.send("A11").await;
    assert_eq!(rig.controller.context().printer_state, PrinterState::Idle);
    assert_eq!(rig.sim.with(|s| s.stop_requests), 0);
    assert_eq!(rig.last_reply().unwrap(), "J16");
}

#[tokio::test]
async fn timer_stop_event_parks_in_stopping_and_restores_endstops() {
    let mut rig = Rig::new();
    rig.fire(FirmwareEvent::Timer(TimerEvent::Started));
    assert!(!rig.sim.with(|s| s.soft_endstops));

    rig.fire(FirmwareEvent::Timer(TimerEvent::Stopped));
    assert_eq!(rig.controller.context().printer_state, PrinterState::Stopping);
    assert!(rig.sim.with(|s| s.soft_endstops));
}

#[tokio::test]
async fn start_print_requires_a_selection() {
    let mut rig = Rig::new();
    rig.send("A14").await;
    assert!(rig.sim.with(|s| s.started_prints.is_empty()));
    rig.assert_no_reply();
}

#[tokio::test]
async fn power_outage_recovery_resume_homes_then_recovers() {
    let mut rig = Rig::new();
    rig.fire(FirmwareEvent::PowerLossRecovery);
    assert_eq!(
        rig.controller.context().printer_state,
        PrinterState::ResumingFromPowerOutage
    );
    assert_eq!(rig.sim.with(|s| s.tunes.clone()), vec![Tune::Sos]);

    rig.send("A15").await;
    let injected = rig.sim.with(|s| s.injected.clone());
    assert_eq!(injected, vec!["G28 X Y R5\nG28 Z", "M1000"]);
}

#[tokio::test]
async fn stopping_a_pending_recovery_cancels_it() {
    let mut rig = Rig::new();
    rig.fire(FirmwareEvent::PowerLossRecovery);
    rig.replies();

    rig.send("A11").await;
    assert_eq!(rig.controller.context().printer_state, PrinterState::Idle);
    assert!(
        rig.sim
            .with(|s| s.injected.contains(&"M1000 C".to_string()))
    );
    assert_eq!(rig.last_reply().unwrap(), "J16");
}

#[tokio::test]
async fn starting_fresh_over_a_pending_recovery_cancels_it_first() {
    let mut rig = Rig::new();
    rig.fire(FirmwareEvent::PowerLossRecovery);
    rig.replies();

    rig.send("A13 /benchy.gco").await;
    rig.send("A14").await;
    assert!(
        rig.sim
            .with(|s| s.injected.contains(&"M1000 C".to_string()))
    );
    assert_eq!(rig.sim.with(|s| s.started_prints.clone()), vec!["/benchy.gco"]);
}

#[tokio::test]
async fn probing_success_saves_the_mesh_and_parks() {
    let mut rig = Rig::new();
    rig.send("A30 S").await;
    assert_eq!(rig.controller.context().printer_state, PrinterState::Probing);
    assert_eq!(rig.last_reply().unwrap(), "J24");

    rig.fire(FirmwareEvent::Status(StatusUpdate::Ready));
    assert_eq!(rig.controller.context().printer_state, PrinterState::Idle);
    assert_eq!(rig.last_reply().unwrap(), "J25");
    assert!(
        rig.sim
            .with(|s| s.injected.contains(&"M500\nG27".to_string()))
    );
}

#[tokio::test]
async fn probing_failure_raises_the_probe_and_alarms() {
    let mut rig = Rig::new();
    rig.send("A30 S").await;
    rig.replies();

    rig.fire(FirmwareEvent::Status(StatusUpdate::ProbingFailed));
    assert_eq!(rig.controller.context().printer_state, PrinterState::Idle);
    assert_eq!(rig.last_reply().unwrap(), "J25");
    assert_eq!(rig.sim.with(|s| s.tunes.clone()), vec![Tune::ProbingFailed]);
    assert!(
        rig.sim
            .with(|s| s.injected.contains(&"G1 Z50 F500".to_string()))
    );
}

#[tokio::test]
async fn pause_outside_a_media_print_reports_stop() {
    let mut rig = Rig::new();
    rig.send("A9").await;
    assert_eq!(rig.last_reply().unwrap(), "J16");
    assert_eq!(rig.sim.with(|s| s.pause_requests), 0);
}

#[tokio::test]
async fn kill_is_forwarded_unconditionally() {
    let mut rig = Rig::new();
    rig.fire(FirmwareEvent::Timer(TimerEvent::Started));
    rig.send("A12").await;
    assert!(rig.sim.with(|s| s.killed));
}
