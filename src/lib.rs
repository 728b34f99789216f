//! Host-side controller for the Anycubic Chiron TFT touch panel.
//!
//! Speaks the panel's line-oriented `A<nn>` serial protocol, tracks the
//! panel-facing printer state machine, and drives the printer firmware
//! through the [`firmware::FirmwareApi`] accessor trait.

pub mod config;
pub mod controller;
pub mod file_navigator;
pub mod firmware;
pub mod panel;

pub use config::Config;
pub use controller::PanelController;
pub use controller::context::{
    ControllerContext, HeaterState, LastError, PanelKind, PauseState, PrinterState,
};
pub use controller::routing::{DispatchGroup, route};
pub use firmware::{FirmwareApi, FirmwareEvent};
pub use panel::{PanelCommand, PanelLink};
