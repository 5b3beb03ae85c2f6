//! Background control loops, one per active mode.
//!
//! - Mapping thread: landmark capture at a fixed interval
//! - Navigation thread: localization, obstacle and instruction deadlines

mod mapping;
mod navigation;

pub use mapping::MappingThread;
pub use navigation::{NavigationThread, apply_event};

use std::thread::{self, JoinHandle};

use crate::error::Result;

/// Spawn a mapping loop on a named thread.
pub fn spawn_mapping(mut worker: MappingThread) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("mapping".into())
        .spawn(move || worker.run())?;
    Ok(handle)
}

/// Spawn a navigation loop on a named thread.
pub fn spawn_navigation(mut worker: NavigationThread) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("navigation".into())
        .spawn(move || worker.run())?;
    Ok(handle)
}
