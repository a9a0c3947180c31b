//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Anchor;

/// Offset of an item placed inside a container along one axis.
///
/// Negative when the item is larger than the container and not anchored at
/// the start. Centering rounds toward negative infinity so an odd leftover
/// pixel lands on the end side.
///
/// # Examples
/// ```
/// # use imagequery::imaging::{Anchor, aligned_offset};
/// assert_eq!(aligned_offset(100, 40, Anchor::Start), 0);
/// assert_eq!(aligned_offset(100, 40, Anchor::Center), 30);
/// assert_eq!(aligned_offset(100, 40, Anchor::End), 60);
/// assert_eq!(aligned_offset(40, 100, Anchor::Center), -30);
/// ```
pub fn aligned_offset(container: u32, item: u32, anchor: Anchor) -> i64 {
    let free = container as i64 - item as i64;
    match anchor {
        Anchor::Start => 0,
        Anchor::Center => free.div_euclid(2),
        Anchor::End => free,
    }
}

/// Height that keeps the source aspect ratio at `target_width`.
///
/// Never returns zero.
pub fn proportional_height(source: (u32, u32), target_width: u32) -> u32 {
    let (src_w, src_h) = source;
    let h = (src_h as f64 * target_width as f64 / src_w as f64).round() as u32;
    h.max(1)
}

/// Largest region of `source` with the aspect ratio of `target`.
///
/// Cropping this region (centered) and resizing it to `target` is the same
/// cover-then-crop result as scaling up first, without ever allocating an
/// image larger than the source or the target. One side always matches the
/// source; the other is rounded and clamped to `1..=source`.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
pub fn cover_region(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    // Compare aspect ratios without floating point: src_w/src_h vs tgt_w/tgt_h.
    if src_w as u64 * tgt_h as u64 > tgt_w as u64 * src_h as u64 {
        // Source is wider: keep full height, trim the sides
        let w = (src_h as f64 * tgt_w as f64 / tgt_h as f64).round() as u32;
        (w.clamp(1, src_w), src_h)
    } else {
        // Source is taller (or equal): keep full width, trim top and bottom
        let h = (src_w as f64 * tgt_h as f64 / tgt_w as f64).round() as u32;
        (src_w, h.clamp(1, src_h))
    }
}

/// Top-left corner of a centered `region` crop out of `container`.
pub fn center_crop_origin(container: (u32, u32), region: (u32, u32)) -> (u32, u32) {
    let x = aligned_offset(container.0, region.0, Anchor::Center).max(0) as u32;
    let y = aligned_offset(container.1, region.1, Anchor::Center).max(0) as u32;
    (x, y)
}

/// Whether a `width`×`height` rectangle at (`x`, `y`) lies inside `bounds`.
pub fn rect_within(bounds: (u32, u32), x: u32, y: u32, width: u32, height: u32) -> bool {
    x.checked_add(width).is_some_and(|right| right <= bounds.0)
        && y.checked_add(height).is_some_and(|bottom| bottom <= bounds.1)
}
