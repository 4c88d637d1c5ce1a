pub mod connection;
mod machine;

pub use connection::DeviceConnectionState;
pub use machine::{
    Effect, MirrorEvent, MirrorState, PROMPT_CONNECTED, PROMPT_WAITING, PROMPT_WAKEUP,
    StateConfig, StatusEvent,
};
