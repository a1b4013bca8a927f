//! Named worker threads for the long-lived reporting loops.
//!
//! Sampling and location reporting each run on their own OS thread: both
//! block on hardware and on the transport, so they are not scheduled as
//! cooperative tasks.

use crate::error::{CoreError, Result};
use std::thread::{self, JoinHandle};
use tracing::info;

/// Spawn `body` on a dedicated thread named `name`.
pub fn spawn_worker<F>(name: &str, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map_err(|source| CoreError::WorkerSpawn {
            name: name.to_string(),
            source,
        })?;

    info!(worker = name, "Worker started");
    Ok(handle)
}
