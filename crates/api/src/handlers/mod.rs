pub mod tasks;
pub mod telemetry;
