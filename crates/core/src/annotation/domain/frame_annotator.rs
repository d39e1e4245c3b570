use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for marking regions on a frame.
///
/// Implementations draw in place.
pub trait FrameAnnotator: Send {
    fn outline(
        &self,
        frame: &mut Frame,
        regions: &[Region],
        color: [u8; 3],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
