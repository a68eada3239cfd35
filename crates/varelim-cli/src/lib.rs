pub mod config;
pub mod input;
pub mod logging;
pub mod network_file;
pub mod render;
pub mod report;
pub mod runner;
