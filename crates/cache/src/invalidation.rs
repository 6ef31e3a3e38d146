//! Invalidation bookkeeping and wire-command parsing.
//!
//! Tiles in the editing overlay are removed the moment a region is
//! invalidated; tiles in the persistent tier are instead recorded here and
//! deleted when the document is saved. Until then the ledger hides them
//! from lookups.

use inkwave_doc_model::TileRegion;
use std::collections::HashSet;

/// Persistent-tier tile names scheduled for deletion at the next save.
///
/// Membership is additive: names only leave the ledger through [`take`]
/// during the save transition.
///
/// [`take`]: Ledger::take
#[derive(Debug, Default)]
pub struct Ledger {
    names: HashSet<String>,
}

impl Ledger {
    pub fn schedule(&mut self, name: String) {
        self.names.insert(name);
    }

    /// Whether `name` is hidden from lookups.
    pub fn hides(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Empty the ledger, yielding the names to delete.
    pub fn take(&mut self) -> HashSet<String> {
        std::mem::take(&mut self.names)
    }
}

/// Parse an `invalidatetiles:` protocol line into the region it targets.
///
/// Two forms are understood, with `part` supplied by the session since the
/// wire carries none:
///
/// * `invalidatetiles: EMPTY` invalidates everything, on every part;
/// * `invalidatetiles: <width> <height> <x> <y>` invalidates one region
///   (dimensions precede position on the wire).
///
/// Anything else, including a wrong token count or a non-integer field,
/// yields `None`.
pub fn parse_command(part: i32, msg: &str) -> Option<TileRegion> {
    let tokens: Vec<&str> = msg.split_whitespace().collect();

    debug_assert_eq!(tokens.first().copied(), Some("invalidatetiles:"));

    match tokens.as_slice() {
        [_, "EMPTY"] => Some(TileRegion::everything()),
        [_, width, height, x, y] => {
            let width = width.parse().ok()?;
            let height = height.parse().ok()?;
            let x = x.parse().ok()?;
            let y = y.parse().ok()?;

            Some(TileRegion::new(part, x, y, width, height))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwave_doc_model::PART_ANY;

    #[test]
    fn ledger_membership_is_additive_until_taken() {
        let mut ledger = Ledger::default();

        ledger.schedule("0_256x256.0,0.3840x3840.png".to_owned());
        ledger.schedule("0_256x256.0,0.3840x3840.png".to_owned());
        ledger.schedule("1_256x256.0,0.3840x3840.png".to_owned());

        assert!(ledger.hides("0_256x256.0,0.3840x3840.png"));
        assert!(!ledger.hides("2_256x256.0,0.3840x3840.png"));

        let drained = ledger.take();
        assert_eq!(drained.len(), 2);
        assert!(ledger.is_empty());
        assert!(!ledger.hides("0_256x256.0,0.3840x3840.png"));
    }

    #[test]
    fn empty_form_targets_every_part() {
        let region = parse_command(4, "invalidatetiles: EMPTY").expect("EMPTY parses");

        assert_eq!(region.part, PART_ANY);
        assert_eq!((region.width, region.height), (i32::MAX, i32::MAX));
    }

    #[test]
    fn four_integer_form_is_width_height_then_position() {
        let region =
            parse_command(2, "invalidatetiles: 3840 1920 100 200").expect("region parses");

        assert_eq!(region, TileRegion::new(2, 100, 200, 3840, 1920));
    }

    #[test]
    fn surplus_whitespace_is_tolerated() {
        let region =
            parse_command(0, "invalidatetiles:   3840  1920  100  200 ").expect("region parses");

        assert_eq!(region, TileRegion::new(0, 100, 200, 3840, 1920));
    }

    #[test]
    fn wrong_token_count_is_ignored() {
        assert_eq!(parse_command(0, "invalidatetiles: 3840 1920 100"), None);
        assert_eq!(parse_command(0, "invalidatetiles: 3840 1920 100 200 300"), None);
        assert_eq!(parse_command(0, "invalidatetiles:"), None);
    }

    #[test]
    fn non_integer_fields_are_ignored() {
        assert_eq!(parse_command(0, "invalidatetiles: 3840 1920 100 wat"), None);
        assert_eq!(parse_command(0, "invalidatetiles: 38.4 1920 100 200"), None);
    }
}
