pub mod convert;
pub mod dashboard;
pub mod setup;
pub mod ticker;
pub mod ui;
