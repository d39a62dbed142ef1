//! Presentation blit: logical frame buffer -> physical surface
//!
//! Nearest-neighbour only. No filtering, no gamma, no colour conversion; the
//! four bytes of the chosen source pixel are copied verbatim.

use super::frame_buffer::{FrameView, FrameViewMut, BYTES_PER_PIXEL};

/// Source coordinate for destination coordinate `d` when `src_len` pixels are
/// stretched across `dst_len`. Equivalent to `floor(d / dst_len * src_len)`
/// but exact, so the same destination always samples the same source pixel.
#[inline]
fn nearest(d: u32, src_len: u32, dst_len: u32) -> u32 {
    ((u64::from(d) * u64::from(src_len)) / u64::from(dst_len)) as u32
}

/// Copy `src` into `dst`, resampling to the destination size.
///
/// A destination with zero width or height is skipped entirely. When the
/// sizes match this is a plain row copy, which gives the same bytes as the
/// general path.
pub fn blit_scaled(src: FrameView<'_>, dst: &mut FrameViewMut<'_>) {
    if dst.is_empty() || src.width() == 0 || src.height() == 0 {
        return;
    }
    let dst_w = dst.width();
    let dst_h = dst.height();

    if src.width() == dst_w && src.height() == dst_h {
        for y in 0..dst_h {
            dst.row_mut(y).copy_from_slice(src.row(y));
        }
        return;
    }

    for dy in 0..dst_h {
        let src_row = src.row(nearest(dy, src.height(), dst_h));
        let dst_row = dst.row_mut(dy);
        for (dx, out) in dst_row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let sx = nearest(dx as u32, src.width(), dst_w) as usize * BYTES_PER_PIXEL;
            out.copy_from_slice(&src_row[sx..sx + BYTES_PER_PIXEL]);
        }
    }
}
