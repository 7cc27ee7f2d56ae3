pub mod actions;
pub mod categories;
pub mod log;
pub mod status;
