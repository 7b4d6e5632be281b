mod action;
mod condition;
mod engine;
mod geometry;
mod monitor;
mod pattern;
mod rules;
mod tracker;

pub use action::*;
pub use condition::*;
pub use engine::*;
pub use geometry::*;
pub use monitor::*;
pub use pattern::*;
pub use rules::*;
pub use tracker::*;

pub type WindowId = u64;
