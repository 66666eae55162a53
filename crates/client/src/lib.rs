mod client;
mod error;
mod frame;
mod session;
mod slot;

pub use client::{ClientConfig, StreamClient, StreamHandle};
pub use error::{Result, StreamError};
pub use frame::{classify, FrameDecoder, FrameEvent, DONE_SENTINEL};
pub use session::{Session, SessionState, StreamEvent};
pub use slot::QuerySlot;
