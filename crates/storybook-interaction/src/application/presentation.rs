//! Presentation boundary.
//!
//! The engine pushes a [`Frame`] after every transition; the host draws it.
//! Hosts never write engine state; they send intents through an
//! `EngineHandle` instead.

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::phase::Frame;

/// Renders engine state. Called on the engine task; must not block.
pub trait Presentation: Send + Sync {
    /// Draws `frame`.
    fn render(&self, frame: &Frame);
}

/// Forwards frames to an async consumer over an unbounded channel.
#[derive(Debug)]
pub struct ChannelPresentation {
    frames: mpsc::UnboundedSender<Frame>,
}

impl ChannelPresentation {
    /// Creates the presentation and the receiving end of its frame stream.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (frames, receiver) = mpsc::unbounded_channel();
        (Self { frames }, receiver)
    }
}

impl Presentation for ChannelPresentation {
    fn render(&self, frame: &Frame) {
        if self.frames.send(frame.clone()).is_err() {
            debug!(phase = ?frame.phase, "frame dropped, no consumer");
        }
    }
}
