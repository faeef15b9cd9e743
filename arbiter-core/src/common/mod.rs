//! Small shared utilities used across the arbitration, execution, and budget
//! cores that don't belong to any single subsystem module.

pub mod duration_serde;
