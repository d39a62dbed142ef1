use crate::display::FrameViewMut;

/// Scrolling blue/green gradient.
///
/// Every visible byte of every row is written, top to bottom, as
/// `[x + offset_x, y + offset_y, 0, 0]` truncated to bytes.
pub fn render_gradient(frame: &mut FrameViewMut<'_>, offset_x: i32, offset_y: i32) {
    for (y, row) in frame.rows_mut().enumerate() {
        let green = (y as i32).wrapping_add(offset_y) as u8;
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let blue = (x as i32).wrapping_add(offset_x) as u8;
            px.copy_from_slice(&[blue, green, 0, 0]);
        }
    }
}
