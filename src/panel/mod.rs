pub mod link;
pub mod messages;

pub use link::{MAX_CMND_LEN, PanelCommand, PanelLink};
