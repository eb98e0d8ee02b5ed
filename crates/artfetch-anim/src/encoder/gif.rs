//! GIF backend: decode every frame up front, then hand the whole ordered
//! sequence to the multi-frame writer in one call.

use std::fs;
use std::path::Path;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use tracing::debug;

use crate::archive::FrameDescriptor;
use crate::error::AnimError;

pub(super) fn encode_to(frames: &[FrameDescriptor], output: &Path) -> Result<(), AnimError> {
    let mut rendered = Vec::with_capacity(frames.len());
    for frame in frames {
        let image = image::open(&frame.path)
            .map_err(|e| AnimError::FrameDecode {
                file: frame.path.clone(),
                source: e,
            })?
            .into_rgba8();
        let delay = Delay::from_numer_denom_ms(frame.delay_ms, 1);
        rendered.push(Frame::from_parts(image, 0, 0, delay));
    }
    debug!(frames = rendered.len(), output = %output.display(), "writing gif");

    let file = fs::File::create(output).map_err(|e| AnimError::io(output, e))?;
    let mut encoder = GifEncoder::new(file);
    encoder
        .set_repeat(Repeat::Infinite)
        .map_err(|e| AnimError::Gif { source: e })?;
    encoder
        .encode_frames(rendered)
        .map_err(|e| AnimError::Gif { source: e })?;
    Ok(())
}
