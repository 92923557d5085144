//! Bottom-up line clustering.
//!
//! Words are sorted by `(y0, x0)` and swept in order; a new line opens
//! whenever the vertical distance to the previous word's top edge reaches
//! the threshold. The same sweep is reused at a finer threshold to split
//! a sentence's words into the visual lines it wraps across.

use crate::geometry::BBox;
use crate::model::{Line, Word};
use std::cmp::Ordering;

/// Sort indices of `boxes` by `(y0, x0)` ascending.
fn sweep_order(boxes: &[BBox]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        boxes[a]
            .y0
            .partial_cmp(&boxes[b].y0)
            .unwrap_or(Ordering::Equal)
            .then(boxes[a].x0.partial_cmp(&boxes[b].x0).unwrap_or(Ordering::Equal))
    });
    order
}

/// Group boxes into visual rows.
///
/// Returns groups of indices into `boxes`, each group in sweep order.
/// The sweep compares each box's `y0` against the previous box's `y0`
/// (not the row's first), which tolerates slowly drifting baselines.
pub(crate) fn cluster_rows(boxes: &[BBox], y_threshold: f32) -> Vec<Vec<usize>> {
    if boxes.is_empty() {
        return vec![];
    }
    let order = sweep_order(boxes);
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut last_y: Option<f32> = None;
    for idx in order {
        let y = boxes[idx].y0;
        match last_y {
            Some(prev) if (y - prev).abs() >= y_threshold => {
                if !current.is_empty() {
                    rows.push(std::mem::take(&mut current));
                }
                current.push(idx);
            },
            _ => current.push(idx),
        }
        last_y = Some(y);
    }
    if !current.is_empty() {
        rows.push(current);
    }
    rows
}

/// Cluster the fused word stream into baseline lines.
///
/// Each resulting [`Line`] references its member words by index into
/// `words`; its text is the member texts joined with single spaces and
/// its bbox the tight cover of the member boxes.
///
/// The operation is idempotent: clustering the lines' own words again
/// reproduces the same grouping.
///
/// # Examples
///
/// ```
/// use page_oxide::fusion::cluster_into_lines;
/// use page_oxide::geometry::BBox;
/// use page_oxide::model::Word;
///
/// let words = vec![
///     Word::ocr("Hello", BBox::new(10.0, 10.0, 40.0, 20.0)),
///     Word::ocr("world", BBox::new(45.0, 10.0, 80.0, 20.0)),
///     Word::ocr("Below", BBox::new(10.0, 30.0, 45.0, 40.0)),
/// ];
/// let lines = cluster_into_lines(&words, 5.0);
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines[0].text, "Hello world");
/// assert_eq!(lines[0].bbox, BBox::new(10.0, 10.0, 80.0, 20.0));
/// ```
pub fn cluster_into_lines(words: &[Word], y_threshold: f32) -> Vec<Line> {
    let boxes: Vec<BBox> = words.iter().map(|w| w.bbox).collect();
    cluster_rows(&boxes, y_threshold)
        .into_iter()
        .map(|row| {
            let text = row
                .iter()
                .map(|&i| words[i].text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let bbox = BBox::cover(row.iter().map(|&i| words[i].bbox))
                .unwrap_or_else(BBox::zero);
            Line {
                text,
                bbox,
                words: row,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> Word {
        Word::ocr(text, BBox::new(x0, y0, x1, y1))
    }

    #[test]
    fn test_empty_input() {
        assert!(cluster_into_lines(&[], 5.0).is_empty());
    }

    #[test]
    fn test_single_line_left_to_right() {
        // Unsorted input: the sweep must reorder by x within the line.
        let words = vec![
            word("world", 45.0, 10.0, 80.0, 20.0),
            word("Hello", 10.0, 10.0, 40.0, 20.0),
        ];
        let lines = cluster_into_lines(&words, 5.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello world");
        assert_eq!(lines[0].words, vec![1, 0]);
    }

    #[test]
    fn test_threshold_opens_new_line() {
        let words = vec![
            word("a", 0.0, 0.0, 5.0, 8.0),
            word("b", 0.0, 4.9, 5.0, 12.0),
            word("c", 0.0, 10.0, 5.0, 18.0),
        ];
        // 0.0 -> 4.9 is under the threshold, 4.9 -> 10.0 is over
        let lines = cluster_into_lines(&words, 5.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "a b");
        assert_eq!(lines[1].text, "c");
    }

    #[test]
    fn test_tight_bbox_cover() {
        let words = vec![
            word("x", 10.0, 11.0, 20.0, 19.0),
            word("y", 30.0, 10.0, 50.0, 21.0),
        ];
        let lines = cluster_into_lines(&words, 5.0);
        assert_eq!(lines[0].bbox, BBox::new(10.0, 10.0, 50.0, 21.0));
    }

    #[test]
    fn test_idempotent() {
        let words = vec![
            word("Hello", 10.0, 10.0, 40.0, 20.0),
            word("world", 45.0, 10.5, 80.0, 20.0),
            word("Gamma", 10.0, 25.0, 45.0, 35.0),
        ];
        let first = cluster_into_lines(&words, 5.0);
        // Re-cluster the words each line selected; grouping must not change.
        for line in &first {
            let members: Vec<Word> = line.words.iter().map(|&i| words[i].clone()).collect();
            let again = cluster_into_lines(&members, 5.0);
            assert_eq!(again.len(), 1);
            assert_eq!(again[0].text, line.text);
            assert_eq!(again[0].bbox, line.bbox);
        }
    }
}
