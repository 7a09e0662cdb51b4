//! Command queue between UI tasks and the control loop.
//!
//! Uses an `embassy-sync` bounded MPMC channel so button, web and serial
//! handlers running on other tasks can hand commands to the synchronous
//! control loop without heap allocation or shared mutable state.
//!
//! ```text
//! ┌──────────────┐ AppCommand ┌──────────────┐
//! │  UI / web    │───────────▶│ Control Loop │
//! │  handlers    │            │ (drain/tick) │
//! └──────────────┘            └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::commands::AppCommand;

/// Channel depth for inbound commands.
const CMD_DEPTH: usize = 8;

/// Inbound command channel: UI tasks → control loop.
pub static CMD_CHANNEL: Channel<CriticalSectionRawMutex, AppCommand, CMD_DEPTH> = Channel::new();

/// Enqueue a command. Returns `false` (and logs) when the queue is full.
pub fn submit(cmd: AppCommand) -> bool {
    match CMD_CHANNEL.try_send(cmd) {
        Ok(()) => true,
        Err(_) => {
            warn!("command queue full, dropping {:?}", cmd);
            false
        }
    }
}

/// Pop the next queued command, if any.
pub fn next() -> Option<AppCommand> {
    CMD_CHANNEL.try_receive().ok()
}
