//! Fire-and-forget notifications to the site's IRC bot.
//!
//! Callers queue lines through a [`NotifyHandle`]; a [`RelayWriter`] task
//! delivers them. Delivery problems never reach the caller.

mod handle;
mod relay;

pub use handle::NotifyHandle;
pub use relay::RelayWriter;

use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::IrcConfig;

/// Create the relay system.
///
/// Returns a disabled handle and no writer when the relay is off or has no
/// address. Otherwise the writer must be spawned as a background task.
pub fn create_relay_system(config: &IrcConfig, buffer_size: usize) -> (NotifyHandle, Option<RelayWriter>) {
    let addr = match (&config.relay_addr, config.enabled) {
        (Some(addr), true) => addr.clone(),
        _ => return (NotifyHandle::disabled(), None),
    };
    let (tx, rx) = mpsc::channel(buffer_size);
    let writer = RelayWriter::new(rx, addr, Duration::from_secs(config.connect_timeout_secs));
    (NotifyHandle::new(tx), Some(writer))
}
