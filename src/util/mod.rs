pub mod command;
pub mod prompt;
