use crate::frame::FrameBuffer;

/// Receives a notification after every redraw, with the fresh frame.
///
/// Implementations push the image to whatever is displaying it, a remote
/// viewer usually. Exactly one call follows each redraw.
pub trait ViewSink {
    fn frame_ready(&mut self, frame: &FrameBuffer) -> anyhow::Result<()>;
}

/// Sink that drops every notification.
pub struct NullSink;

impl ViewSink for NullSink {
    fn frame_ready(&mut self, _frame: &FrameBuffer) -> anyhow::Result<()> {
        Ok(())
    }
}
