pub mod activity;
pub mod dispatch;
pub mod evidence;
pub mod import;
pub mod latest;
pub mod set;
pub mod show;
pub mod stats;
pub mod submit;
