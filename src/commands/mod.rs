//! Application command handlers for wavetide.
//!
//! # Commands
//! - `live`: Scrolling waveform of the microphone (default)
//! - `simulate`: Same display fed by a synthetic voice
//! - `list_devices`: List available audio input devices
//! - `config`: Open configuration file in user's preferred editor
//! - `logs`: Display recent log entries

pub mod config;
pub mod list_devices;
pub mod live;
pub mod logs;
pub mod session;
pub mod simulate;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use live::handle_live;
pub use logs::handle_logs;
pub use session::run_session;
pub use simulate::{handle_simulate, SimulateOptions};
