// Pipe-table column alignment.
//
// Pads the cells of every Markdown table so the pipes line up. Operates on
// text only; a table is a run of at least two consecutive lines starting
// with `|`, outside fenced code.

use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-+:?$").expect("valid regex"));

/// Align the columns of every pipe table in `text`.
///
/// Aligned tables end with a newline. Aligning already-aligned text returns
/// it unchanged.
pub fn align_tables(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut block: Vec<&str> = Vec::new();
    let mut fence: Option<(char, usize)> = None;

    for line in text.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);

        if let Some(open) = fence {
            if closes_fence(content, open) {
                fence = None;
            }
            out.push_str(line);
            continue;
        }

        if content.starts_with('|') {
            block.push(line);
            continue;
        }

        flush(&mut block, &mut out);
        fence = opens_fence(content);
        out.push_str(line);
    }
    flush(&mut block, &mut out);
    out
}

fn flush(block: &mut Vec<&str>, out: &mut String) {
    if block.len() < 2 {
        for line in block.iter() {
            out.push_str(line);
        }
    } else {
        let lines: Vec<&str> = block
            .iter()
            .map(|line| line.strip_suffix('\n').unwrap_or(line))
            .collect();
        out.push_str(&align_block(&lines));
    }
    block.clear();
}

fn opens_fence(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some((marker, len))
}

fn closes_fence(line: &str, (marker, len): (char, usize)) -> bool {
    let trimmed = line.trim();
    let run = trimmed.chars().take_while(|c| *c == marker).count();
    run >= len && run == trimmed.chars().count()
}

fn align_block(lines: &[&str]) -> String {
    let rows: Vec<Vec<String>> = lines.iter().map(|line| split_row(line)).collect();
    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);

    let mut widths = vec![3; column_count];
    for row in rows.iter().filter(|row| !is_separator(row)) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in &rows {
        let separator = is_separator(row);
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                if separator {
                    separator_cell(cell, *width)
                } else {
                    pad(cell, *width)
                }
            })
            .collect();
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
    }
    out
}

fn is_separator(row: &[String]) -> bool {
    row.iter().all(|cell| SEPARATOR_CELL.is_match(cell))
}

fn separator_cell(cell: &str, width: usize) -> String {
    let left = cell.starts_with(':');
    let right = cell.len() > 1 && cell.ends_with(':');
    let dashes = width
        .saturating_sub(usize::from(left) + usize::from(right))
        .max(1);
    format!(
        "{}{}{}",
        if left { ":" } else { "" },
        "-".repeat(dashes),
        if right { ":" } else { "" }
    )
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{cell}{}", " ".repeat(width.saturating_sub(len)))
}

/// Split a table line into trimmed cells on pipes not escaped by a
/// backslash.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut backslashes = 0;
    for c in line.trim().chars() {
        if c == '|' && backslashes % 2 == 0 {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
    }
    cells.push(current);

    // Drop the empty cells outside the leading and trailing pipes.
    if cells.first().is_some_and(|c| c.trim().is_empty()) {
        cells.remove(0);
    }
    if cells.len() > 1 && cells.last().is_some_and(|c| c.trim().is_empty()) {
        cells.pop();
    }
    cells.into_iter().map(|c| c.trim().to_string()).collect()
}
