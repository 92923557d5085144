//! Vertical block merging.
//!
//! Layout models routinely split one paragraph into two stacked
//! detections. The merger rejoins detections that share a column (left
//! and right edges within tolerance) and are vertically adjacent or
//! lightly overlapping. A single sweep in model-output order; each
//! detection is consumed by at most one merge chain.

use crate::extractors::layout::LayoutRegion;

/// Merge vertically adjacent, column-aligned regions.
///
/// Two regions `i` and `j` (`j > i`, neither consumed) merge when
/// `|x0_i - x0_j| < tolerance`, `|x1_i - x1_j| < tolerance` and
/// `0 < |y1_i - y0_j| < 2 * tolerance`. Merging extends `i` downward
/// (`y1_i = max(y1_i, y1_j)`) and consumes `j`, so chains of stacked
/// detections collapse into one region.
///
/// # Examples
///
/// ```
/// use page_oxide::extractors::layout::LayoutRegion;
/// use page_oxide::fusion::merge_vertical_regions;
/// use page_oxide::geometry::BBox;
/// use page_oxide::model::BlockKind;
///
/// let a = LayoutRegion { kind: BlockKind::Text, bbox: BBox::new(0.0, 0.0, 100.0, 50.0), score: 0.9 };
/// let b = LayoutRegion { kind: BlockKind::Text, bbox: BBox::new(0.0, 55.0, 100.0, 110.0), score: 0.8 };
/// let merged = merge_vertical_regions(vec![a, b], 15.0);
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].bbox, BBox::new(0.0, 0.0, 100.0, 110.0));
/// ```
pub fn merge_vertical_regions(regions: Vec<LayoutRegion>, tolerance: f32) -> Vec<LayoutRegion> {
    let mut consumed = vec![false; regions.len()];
    let mut merged = Vec::with_capacity(regions.len());

    for i in 0..regions.len() {
        if consumed[i] {
            continue;
        }
        let mut current = regions[i].clone();
        for (j, other) in regions.iter().enumerate().skip(i + 1) {
            if consumed[j] {
                continue;
            }
            let same_column = (current.bbox.x0 - other.bbox.x0).abs() < tolerance
                && (current.bbox.x1 - other.bbox.x1).abs() < tolerance;
            if !same_column {
                continue;
            }
            let gap = (current.bbox.y1 - other.bbox.y0).abs();
            if gap > 0.0 && gap < 2.0 * tolerance {
                current.bbox.y1 = current.bbox.y1.max(other.bbox.y1);
                consumed[j] = true;
            }
        }
        merged.push(current);
        consumed[i] = true;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::model::BlockKind;

    fn region(x0: f32, y0: f32, x1: f32, y1: f32) -> LayoutRegion {
        LayoutRegion {
            kind: BlockKind::Text,
            bbox: BBox::new(x0, y0, x1, y1),
            score: 0.9,
        }
    }

    #[test]
    fn test_adjacent_same_column_merge() {
        // Gap of 5 < 2 * 15
        let merged = merge_vertical_regions(
            vec![region(0.0, 0.0, 100.0, 50.0), region(0.0, 55.0, 100.0, 110.0)],
            15.0,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bbox, BBox::new(0.0, 0.0, 100.0, 110.0));
    }

    #[test]
    fn test_different_columns_not_merged() {
        let merged = merge_vertical_regions(
            vec![region(0.0, 0.0, 100.0, 50.0), region(120.0, 55.0, 220.0, 110.0)],
            15.0,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_large_gap_not_merged() {
        let merged = merge_vertical_regions(
            vec![region(0.0, 0.0, 100.0, 50.0), region(0.0, 90.0, 100.0, 140.0)],
            15.0,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_chain_of_three() {
        let merged = merge_vertical_regions(
            vec![
                region(0.0, 0.0, 100.0, 50.0),
                region(0.0, 55.0, 100.0, 110.0),
                region(0.0, 115.0, 100.0, 170.0),
            ],
            15.0,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bbox.y1, 170.0);
    }

    #[test]
    fn test_consumed_region_not_reused() {
        // The middle region merges into the first; the third would also
        // match the middle one but must only be compared against the
        // extended first region.
        let merged = merge_vertical_regions(
            vec![
                region(0.0, 0.0, 100.0, 50.0),
                region(0.0, 52.0, 100.0, 100.0),
                region(0.0, 300.0, 100.0, 350.0),
            ],
            15.0,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_order_preserved() {
        let merged = merge_vertical_regions(
            vec![region(200.0, 0.0, 300.0, 50.0), region(0.0, 0.0, 100.0, 50.0)],
            15.0,
        );
        assert_eq!(merged[0].bbox.x0, 200.0);
        assert_eq!(merged[1].bbox.x0, 0.0);
    }

    #[test]
    fn test_keeps_first_region_kind_and_score() {
        let mut a = region(0.0, 0.0, 100.0, 50.0);
        a.kind = BlockKind::List;
        a.score = 0.7;
        let merged = merge_vertical_regions(vec![a, region(0.0, 55.0, 100.0, 110.0)], 15.0);
        assert_eq!(merged[0].kind, BlockKind::List);
        assert_eq!(merged[0].score, 0.7);
    }
}
