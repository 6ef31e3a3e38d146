//! Tile filename codec.
//!
//! A tile's on-disk name encodes its full identity:
//! `<part>_<canvasW>x<canvasH>.<posX>,<posY>.<width>x<height>.png`.
//! Decoding is strict; anything that is not exactly this shape (including
//! `status.txt` and other bookkeeping files sharing the tier directories)
//! is rejected rather than treated as a tile.

use inkwave_doc_model::{TileKey, TileRegion};

pub fn encode(key: &TileKey) -> String {
    format!(
        "{}_{}x{}.{},{}.{}x{}.png",
        key.part, key.canvas_w, key.canvas_h, key.pos_x, key.pos_y, key.width, key.height
    )
}

pub fn decode(name: &str) -> Option<TileKey> {
    let rest = name.strip_suffix(".png")?;

    let (part, rest) = rest.split_once('_')?;

    let mut fields = rest.splitn(3, '.');
    let canvas = fields.next()?;
    let pos = fields.next()?;
    let extent = fields.next()?;

    let (canvas_w, canvas_h) = canvas.split_once('x')?;
    let (pos_x, pos_y) = pos.split_once(',')?;
    let (width, height) = extent.split_once('x')?;

    Some(TileKey {
        part: part.parse().ok()?,
        canvas_w: canvas_w.parse().ok()?,
        canvas_h: canvas_h.parse().ok()?,
        pos_x: pos_x.parse().ok()?,
        pos_y: pos_y.parse().ok()?,
        width: width.parse().ok()?,
        height: height.parse().ok()?,
    })
}

/// Whether the tile named `name` overlaps `region`.
///
/// Names that do not decode never intersect. Rectangles are half-open, so a
/// tile that only touches the region's edge is not affected. The interval
/// arithmetic runs in `i64`: a region extent of `i32::MAX` must not wrap.
pub fn intersects(name: &str, region: &TileRegion) -> bool {
    let Some(key) = decode(name) else {
        return false;
    };

    if !region.covers_all_parts() && key.part != region.part {
        return false;
    }

    overlaps(key.pos_x, key.width, region.x, region.width)
        && overlaps(key.pos_y, key.height, region.y, region.height)
}

fn overlaps(a_start: i32, a_len: i32, b_start: i32, b_len: i32) -> bool {
    let (a_start, a_len) = (i64::from(a_start), i64::from(a_len));
    let (b_start, b_len) = (i64::from(b_start), i64::from(b_len));

    a_start < b_start + b_len && b_start < a_start + a_len
}
