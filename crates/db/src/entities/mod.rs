pub mod audit_log;
pub mod task;
pub mod user;
