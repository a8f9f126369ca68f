//! Application command handlers for chatrec.
//!
//! This module organizes command handling into separate submodules, each responsible for a specific
//! application command.
//!
//! # Commands
//! - `chat`: Interactive chat window with audio record/playback (default)
//! - `list_devices`: List available audio input and output devices
//! - `logs`: Display recent log entries

pub mod chat;
pub mod list_devices;
pub mod logs;

pub use chat::handle_chat;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
