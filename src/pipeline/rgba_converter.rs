use yuv::{YuvPackedImage, YuvRange, YuvStandardMatrix, yuyv422_to_rgba};

use crate::{
    error::{KeyerError, KeyerResult},
    types::{ColorFormat, ColorFrame},
};

/// Writes `frame` as RGBA8 into `dst`, which must hold exactly
/// `width * height * 4` bytes.
pub fn copy_color_frame(frame: &ColorFrame, dst: &mut [u8]) -> KeyerResult<()> {
    let expected_dst = frame.width as usize * frame.height as usize * 4;
    if dst.len() != expected_dst {
        return Err(KeyerError::BufferTooSmall {
            what: "RGBA destination",
            expected: expected_dst,
            actual: dst.len(),
        });
    }

    let expected_src =
        frame.width as usize * frame.height as usize * frame.format.bytes_per_pixel();
    if frame.data.len() < expected_src {
        return Err(KeyerError::BufferTooSmall {
            what: frame.format.label(),
            expected: expected_src,
            actual: frame.data.len(),
        });
    }

    let data = &frame.data[..expected_src];
    match frame.format {
        ColorFormat::Rgba => dst.copy_from_slice(data),
        ColorFormat::Bgra => bgra_to_rgba(data, dst),
        ColorFormat::Yuyv => yuyv_to_rgba(data, frame.width, frame.height, dst)?,
    }
    Ok(())
}

fn bgra_to_rgba(data: &[u8], dst: &mut [u8]) {
    for (out, src) in dst.chunks_exact_mut(4).zip(data.chunks_exact(4)) {
        out[0] = src[2];
        out[1] = src[1];
        out[2] = src[0];
        out[3] = src[3];
    }
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32, dst: &mut [u8]) -> KeyerResult<()> {
    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    yuyv422_to_rgba(
        &packed,
        dst,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| KeyerError::conversion(format!("YUYV422→RGBA failed: {err:?}")))
}
