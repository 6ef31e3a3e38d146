use serde::{Deserialize, Serialize};

/// Part index that matches every part of a document.
pub const PART_ANY: i32 = -1;

/// Identity of a rendered tile: the document part it belongs to, the pixel
/// dimensions of the rendered bitmap, and the document-space rectangle
/// (origin and extent, in document units) it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub part: i32,
    pub canvas_w: i32,
    pub canvas_h: i32,
    pub pos_x: i32,
    pub pos_y: i32,
    pub width: i32,
    pub height: i32,
}

impl TileKey {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        part: i32,
        canvas_w: i32,
        canvas_h: i32,
        pos_x: i32,
        pos_y: i32,
        width: i32,
        height: i32,
    ) -> Self {
        Self { part, canvas_w, canvas_h, pos_x, pos_y, width, height }
    }
}

/// A document-space rectangle targeted by an invalidation, with `part`
/// selecting one document part or [`PART_ANY`] for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRegion {
    pub part: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl TileRegion {
    pub fn new(part: i32, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { part, x, y, width, height }
    }

    /// The region covering every tile of every part.
    pub fn everything() -> Self {
        Self { part: PART_ANY, x: 0, y: 0, width: i32::MAX, height: i32::MAX }
    }

    pub fn covers_all_parts(&self) -> bool {
        self.part == PART_ANY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_spans_all_parts_from_origin() {
        let region = TileRegion::everything();

        assert!(region.covers_all_parts());
        assert_eq!((region.x, region.y), (0, 0));
        assert_eq!((region.width, region.height), (i32::MAX, i32::MAX));
    }

    #[test]
    fn tile_key_round_trips_through_serde() {
        let key = TileKey::new(2, 256, 256, 3840, 7680, 3840, 3840);

        let json = serde_json::to_string(&key).expect("serialize tile key");
        let back: TileKey = serde_json::from_str(&json).expect("deserialize tile key");

        assert_eq!(back, key);
    }

    #[test]
    fn keys_differing_only_in_extent_are_distinct() {
        let a = TileKey::new(0, 256, 256, 0, 0, 3840, 3840);
        let b = TileKey { height: 1920, ..a };

        assert_ne!(a, b);
    }
}
