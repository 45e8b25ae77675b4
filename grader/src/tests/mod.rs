pub mod common;
pub mod database;
pub mod queue;
