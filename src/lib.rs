pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod report;
pub mod types;
pub mod util;
