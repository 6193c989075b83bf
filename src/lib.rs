pub mod app;
pub mod attachment;
pub mod components;
pub mod config;
pub mod destinations;
pub mod driver;
pub mod error;
pub mod form;
pub mod report;
pub mod site;
pub mod tui;
pub mod types;
pub mod utils;
pub mod workflow;
