//! Frame capture: the reader worker and what it needs.
//!
//! | Module   | Purpose                                             |
//! |----------|-----------------------------------------------------|
//! | `delay`  | Tiered request pacing with a normal-tier crossing   |
//! | `decode` | Size check and optional zstd decompression          |
//! | `reader` | The reader task and its request/event messages      |

pub mod decode;
pub mod delay;
pub mod reader;

pub use decode::{DecodedFrame, FrameDecoder};
pub use delay::{DelayConfig, DelayState};
pub use reader::{DisconnectReason, FrameReader, ReaderConfig, ReaderEvent, ReaderRequest};
