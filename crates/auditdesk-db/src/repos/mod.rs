//! Repository methods, one module per table.

pub mod activity;
pub mod audit;
pub mod evidence;
pub mod item;
pub mod template;
