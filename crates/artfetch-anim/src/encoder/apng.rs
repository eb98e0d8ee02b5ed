//! Animated-PNG backend: frames are appended to the builder one at a time
//! with their millisecond delays, then the container is serialized once.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::archive::FrameDescriptor;
use crate::error::AnimError;

pub(super) fn encode_to(frames: &[FrameDescriptor], output: &Path) -> Result<(), AnimError> {
    // The container requires uniform dimensions; the first frame sets them.
    let first = decode_rgba(&frames[0])?;
    let (width, height) = first.dimensions();
    debug!(
        frames = frames.len(),
        width, height,
        output = %output.display(),
        "writing animated png"
    );

    let file = fs::File::create(output).map_err(|e| AnimError::io(output, e))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder
        .set_animated(frames.len() as u32, 0)
        .map_err(|e| AnimError::Png { source: e })?;
    let mut writer = encoder
        .write_header()
        .map_err(|e| AnimError::Png { source: e })?;

    for (index, frame) in frames.iter().enumerate() {
        let image = if index == 0 {
            first.clone()
        } else {
            decode_rgba(frame)?
        };
        if image.dimensions() != (width, height) {
            let (got_w, got_h) = image.dimensions();
            return Err(AnimError::FrameSizeMismatch {
                file: frame.path.clone(),
                got_w,
                got_h,
                want_w: width,
                want_h: height,
            });
        }

        let numerator = u16::try_from(frame.delay_ms).unwrap_or(u16::MAX);
        writer
            .set_frame_delay(numerator, 1000)
            .map_err(|e| AnimError::Png { source: e })?;
        writer
            .write_image_data(image.as_raw())
            .map_err(|e| AnimError::Png { source: e })?;
    }

    writer.finish().map_err(|e| AnimError::Png { source: e })?;
    Ok(())
}

fn decode_rgba(frame: &FrameDescriptor) -> Result<image::RgbaImage, AnimError> {
    Ok(image::open(&frame.path)
        .map_err(|e| AnimError::FrameDecode {
            file: frame.path.clone(),
            source: e,
        })?
        .into_rgba8())
}
