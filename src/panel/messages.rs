//! Panel notification tokens.
//!
//! The Chiron TFT firmware recognises a fixed table of `J`-prefixed codes on
//! its receive side. These are a wire contract with the panel and must not be
//! renumbered.

pub const MSG_SD_CARD_INSERTED: &str = "J00";
pub const MSG_SD_CARD_REMOVED: &str = "J01";
pub const MSG_NO_SD_CARD: &str = "J02";
pub const MSG_PRINT_FROM_SD_CARD: &str = "J04";
pub const MSG_PAUSE: &str = "J05";
pub const MSG_NOZZLE_HEATING: &str = "J06";
pub const MSG_NOZZLE_HEATING_DONE: &str = "J07";
pub const MSG_BED_HEATING: &str = "J08";
pub const MSG_BED_HEATING_DONE: &str = "J09";
pub const MSG_NOZZLE_TEMP_ABNORMAL: &str = "J10";
pub const MSG_BED_TEMP_ABNORMAL: &str = "J10";
pub const MSG_KILL_LCD: &str = "J11";
pub const MSG_READY: &str = "J12";
pub const MSG_PRINT_COMPLETE: &str = "J14";
pub const MSG_FILAMENT_OUT_ALERT: &str = "J15";
pub const MSG_STOP: &str = "J16";
pub const MSG_MAIN_BOARD_HAS_RESET: &str = "J17";
pub const MSG_PAUSED: &str = "J18";
pub const MSG_SD_FILE_OPEN_SUCCESS: &str = "J20";
pub const MSG_SD_FILE_OPEN_FAILED: &str = "J21";
pub const MSG_FILAMENT_OUT_BLOCK: &str = "J23";
pub const MSG_START_PROBING: &str = "J24";
pub const MSG_PROBING_COMPLETE: &str = "J25";
pub const MSG_PROBING_NOT_ALLOWED: &str = "J26";

/// File-listing frame markers.
pub const MSG_FILE_LIST_START: &str = "FN ";
pub const MSG_FILE_LIST_END: &str = "END";

/// Firmware-info reply prefix (the panel asks with `A33`, we answer `J33`).
pub const MSG_FIRMWARE_INFO: &str = "J33 ";

// Error lines reported through the A33/J33 channel in place of the version
// string while a fault is pending.
pub const MSG_ERROR_BED_TEMP: &str = "Error: bed temp abnormal";
pub const MSG_ERROR_HOTEND_TEMP: &str = "Error: hotend temp abnormal";
pub const MSG_ERROR_SD_CARD: &str = "Error: no SD card";
pub const MSG_ERROR_POWER_LOSS: &str = "Error: power loss detected";
pub const MSG_ERROR_EEPROM: &str = "Error: EEPROM version mismatch";
pub const MSG_ERROR_FILAMENT_OUT: &str = "Error: filament runout";

// Panel-type probes and log notices used during auto-detection. A standard
// panel answers `SIZE` with `SXY 480 320`; a new panel answers `J200` with a
// `[0]=0 .. [19]=0` dump.
pub const TEST_FOR_STANDARD_PANEL: &str = "SIZE";
pub const TEST_FOR_NEW_PANEL: &str = "J200";
