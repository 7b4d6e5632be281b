pub mod command;

pub use command::{Command, Response, StatusInfo, TrackedInfo};
