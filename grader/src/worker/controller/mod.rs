pub mod grading_worker;
pub mod worker_controller;
