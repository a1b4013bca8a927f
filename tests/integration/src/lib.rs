//! Cross-crate integration tests for the FieldLink node
//!
//! This test suite validates:
//! - Sampling cycles end to end, from scripted devices to published frames
//! - Hot-plug recovery through the periodic reconnect sweep
//! - Retry exhaustion and the baseline reset that follows it
//! - Location reporting cadence and on-demand reports
//! - Platform requests answered while both workers pause
//! - Serialization of telemetry and location publishes on one transport

pub mod test_utils;

#[cfg(test)]
mod sampling_scenarios;

#[cfg(test)]
mod location_scenarios;

#[cfg(test)]
mod platform_requests;

#[cfg(test)]
mod shared_delivery_tests;
