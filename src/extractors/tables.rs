//! Stream-flavour table detection.
//!
//! Detects tabular regions from whitespace alignment alone, the way
//! stream-mode table extractors work on born-digital PDFs: consecutive
//! visual rows whose words line up on at least two shared column stops
//! form a table. Each detected table is persisted as CSV and HTML; a
//! failed write degrades that path to `None` and never fails the page.

use crate::export::OutputDirs;
use crate::fusion::lines::cluster_rows;
use crate::geometry::BBox;
use crate::model::{TableData, Word};
use std::path::Path;

/// Minimum shared column stops for two rows to read as the same table.
const MIN_SHARED_COLUMNS: usize = 2;

/// Minimum consecutive aligned rows to form a table.
const MIN_TABLE_ROWS: usize = 2;

/// One visual row: indices into the page word slice, sorted left to right.
struct Row {
    words: Vec<usize>,
    stops: Vec<f32>,
}

/// Detect tables on a page and persist each as CSV + HTML.
pub fn extract_tables(
    words: &[Word],
    page_num: usize,
    dirs: &OutputDirs,
    row_threshold: f32,
    column_tolerance: f32,
) -> Vec<TableData> {
    let boxes: Vec<BBox> = words.iter().map(|w| w.bbox).collect();
    let rows: Vec<Row> = cluster_rows(&boxes, row_threshold)
        .into_iter()
        .map(|mut indices| {
            indices.sort_by(|&a, &b| {
                boxes[a]
                    .x0
                    .partial_cmp(&boxes[b].x0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let stops = indices.iter().map(|&i| boxes[i].x0).collect();
            Row {
                words: indices,
                stops,
            }
        })
        .collect();

    let mut tables = Vec::new();
    let mut start = 0;
    while start < rows.len() {
        let mut end = start;
        while end + 1 < rows.len()
            && shared_columns(&rows[end].stops, &rows[end + 1].stops, column_tolerance)
                >= MIN_SHARED_COLUMNS
        {
            end += 1;
        }
        let run = &rows[start..=end];
        if run.len() >= MIN_TABLE_ROWS && run.iter().all(|r| r.words.len() >= 2) {
            let table_num = tables.len() + 1;
            tables.push(build_table(run, words, page_num, table_num, dirs, column_tolerance));
        }
        start = end + 1;
    }
    log::debug!("Detected {} tables on page {}", tables.len(), page_num);
    tables
}

/// Count stops of `a` that have a counterpart in `b` within tolerance.
fn shared_columns(a: &[f32], b: &[f32], tolerance: f32) -> usize {
    a.iter()
        .filter(|&&x| b.iter().any(|&y| (x - y).abs() < tolerance))
        .count()
}

/// Cluster the run's stops into column anchors, sorted left to right.
fn column_anchors(run: &[Row], tolerance: f32) -> Vec<f32> {
    let mut stops: Vec<f32> = run.iter().flat_map(|r| r.stops.iter().copied()).collect();
    stops.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut anchors: Vec<f32> = Vec::new();
    for stop in stops {
        match anchors.last() {
            Some(&last) if (stop - last).abs() < tolerance => {},
            _ => anchors.push(stop),
        }
    }
    anchors
}

fn build_table(
    run: &[Row],
    words: &[Word],
    page_num: usize,
    table_num: usize,
    dirs: &OutputDirs,
    tolerance: f32,
) -> TableData {
    let anchors = column_anchors(run, tolerance);
    let mut grid: Vec<Vec<String>> = Vec::with_capacity(run.len());
    for row in run {
        let mut cells = vec![String::new(); anchors.len()];
        for &word_index in &row.words {
            let word = &words[word_index];
            let column = nearest_anchor(&anchors, word.bbox.x0);
            if !cells[column].is_empty() {
                cells[column].push(' ');
            }
            cells[column].push_str(&word.text);
        }
        grid.push(cells);
    }

    let bbox = BBox::cover(
        run.iter()
            .flat_map(|r| r.words.iter().map(|&i| words[i].bbox)),
    )
    .unwrap_or_else(BBox::zero);

    let csv_path = dirs
        .tables
        .join(format!("page{}_table{}.csv", page_num, table_num));
    let csv_path = write_csv(&csv_path, &grid).map(|()| csv_path).map_err(|e| {
        log::warn!("Failed to write table CSV: {}", e);
    });
    let html_path = dirs
        .htmltables
        .join(format!("page{}_table{}.html", page_num, table_num));
    let html_path = write_html(&html_path, &grid).map(|()| html_path).map_err(|e| {
        log::warn!("Failed to write table HTML: {}", e);
    });

    TableData {
        csv_path: csv_path.ok(),
        html_path: html_path.ok(),
        rows: grid,
        bbox,
    }
}

fn nearest_anchor(anchors: &[f32], x: f32) -> usize {
    anchors
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn write_csv(path: &Path, grid: &[Vec<String>]) -> std::result::Result<(), String> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
    for row in grid {
        writer.write_record(row).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}

fn write_html(path: &Path, grid: &[Vec<String>]) -> std::result::Result<(), String> {
    let mut html = String::from("<table>\n");
    for row in grid {
        html.push_str("  <tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&escape_html(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    std::fs::write(path, html).map_err(|e| e.to_string())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x0: f32, y0: f32) -> Word {
        Word::ocr(text, BBox::new(x0, y0, x0 + 30.0, y0 + 10.0))
    }

    fn dirs() -> (tempfile::TempDir, OutputDirs) {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = OutputDirs::create(tmp.path(), "doc").unwrap();
        (tmp, dirs)
    }

    #[test]
    fn test_grid_of_words_is_a_table() {
        let words = vec![
            word("Name", 10.0, 10.0),
            word("Price", 100.0, 10.0),
            word("Apple", 10.0, 30.0),
            word("2.50", 100.0, 30.0),
            word("Pear", 10.0, 50.0),
            word("3.10", 100.0, 50.0),
        ];
        let (_tmp, dirs) = dirs();
        let tables = extract_tables(&words, 1, &dirs, 5.0, 15.0);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0], vec!["Name", "Price"]);
        assert_eq!(table.rows[2], vec!["Pear", "3.10"]);
        assert!(table.csv_path.as_ref().unwrap().exists());
        assert!(table.html_path.as_ref().unwrap().exists());
    }

    #[test]
    fn test_prose_is_not_a_table() {
        // Staggered words with no repeated column stops
        let words = vec![
            word("Once", 10.0, 10.0),
            word("upon", 48.0, 10.0),
            word("a", 90.0, 10.0),
            word("time", 30.0, 30.0),
            word("there", 75.0, 30.0),
            word("was", 130.0, 30.0),
        ];
        let (_tmp, dirs) = dirs();
        // Tight tolerance: the two rows share no column stops
        let tables = extract_tables(&words, 1, &dirs, 5.0, 10.0);
        assert!(tables.is_empty());
    }

    #[test]
    fn test_single_row_is_not_a_table() {
        let words = vec![word("a", 10.0, 10.0), word("b", 100.0, 10.0)];
        let (_tmp, dirs) = dirs();
        assert!(extract_tables(&words, 1, &dirs, 5.0, 15.0).is_empty());
    }

    #[test]
    fn test_table_bbox_covers_cells() {
        let words = vec![
            word("a", 10.0, 10.0),
            word("b", 100.0, 10.0),
            word("c", 10.0, 30.0),
            word("d", 100.0, 30.0),
        ];
        let (_tmp, dirs) = dirs();
        let tables = extract_tables(&words, 1, &dirs, 5.0, 15.0);
        assert_eq!(tables[0].bbox, BBox::new(10.0, 10.0, 130.0, 40.0));
    }

    #[test]
    fn test_html_escapes_cells() {
        let words = vec![
            word("a<b", 10.0, 10.0),
            word("x", 100.0, 10.0),
            word("c", 10.0, 30.0),
            word("d", 100.0, 30.0),
        ];
        let (_tmp, dirs) = dirs();
        let tables = extract_tables(&words, 1, &dirs, 5.0, 15.0);
        let html = std::fs::read_to_string(tables[0].html_path.as_ref().unwrap()).unwrap();
        assert!(html.contains("a&lt;b"));
    }
}
