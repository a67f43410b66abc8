// Table classification: Markdown pipe table or raw HTML.
//
// A pipe table needs a heading row and cannot express merged data cells.
// The same heading-row rule drives the extractor's row selection and the
// table rules' separator placement.

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::dom::{
    descendants_by_tag, element_children, get_attr, is_tag, parent, previous_element_sibling,
    tag_name, text_content,
};

/// Classification of one `<table>`.
#[derive(Debug, Clone)]
pub struct TableClassification {
    pub heading_rows: Vec<Handle>,
    pub data_rows: Vec<Handle>,
    pub has_merged_data_cell: bool,
    pub is_convertible: bool,
    pub row_count: usize,
    /// Cells in the first row.
    pub column_count: usize,
}

impl TableClassification {
    pub fn classify(table: &Handle) -> Self {
        let all_rows = rows(table);
        let first_is_heading = all_rows.first().is_some_and(is_heading_row);
        let has_merged_data_cell = has_merged_data_cell(table);
        let column_count = all_rows.first().map_or(0, |row| cells(row).len());
        let row_count = all_rows.len();

        let (heading_rows, data_rows): (Vec<Handle>, Vec<Handle>) =
            all_rows.into_iter().partition(is_heading_row);

        Self {
            heading_rows,
            data_rows,
            has_merged_data_cell,
            is_convertible: first_is_heading && !has_merged_data_cell,
            row_count,
            column_count,
        }
    }
}

/// Rows in HTML `table.rows` order: `<thead>` rows, then direct and `<tbody>`
/// rows in tree order, then `<tfoot>` rows.
pub(crate) fn rows(table: &Handle) -> Vec<Handle> {
    let sections = element_children(table);
    let section_rows = |tag: &str| -> Vec<Handle> {
        sections
            .iter()
            .filter(|s| is_tag(s, tag))
            .flat_map(|s| element_children(s).into_iter().filter(|r| is_tag(r, "tr")))
            .collect()
    };

    let mut out = section_rows("thead");
    for child in &sections {
        match tag_name(child) {
            Some("tr") => out.push(child.clone()),
            Some("tbody") => out.extend(
                element_children(child)
                    .into_iter()
                    .filter(|r| is_tag(r, "tr")),
            ),
            _ => {}
        }
    }
    out.extend(section_rows("tfoot"));
    out
}

/// The first row in `rows` order, found without collecting the rest.
fn first_row(table: &Handle) -> Option<Handle> {
    let sections = table.children.borrow();
    let first_in = |tag: &str| {
        sections
            .iter()
            .filter(|s| is_tag(s, tag))
            .find_map(first_tr)
    };
    let first = first_in("thead")
        .or_else(|| {
            sections.iter().find_map(|child| match tag_name(child) {
                Some("tr") => Some(child.clone()),
                Some("tbody") => first_tr(child),
                _ => None,
            })
        })
        .or_else(|| first_in("tfoot"));
    first
}

fn first_tr(section: &Handle) -> Option<Handle> {
    section
        .children
        .borrow()
        .iter()
        .find(|r| is_tag(r, "tr"))
        .cloned()
}

/// Whether `row` opens its table and is a heading row: the row a pipe
/// table's separator line follows.
pub(crate) fn is_first_heading_row(row: &Handle) -> bool {
    table_of(row)
        .and_then(|table| first_row(&table))
        .is_some_and(|first| Rc::ptr_eq(&first, row))
        && is_heading_row(row)
}

/// The nearest enclosing `<table>` of a row.
pub(crate) fn table_of(row: &Handle) -> Option<Handle> {
    let section = parent(row)?;
    if is_tag(&section, "table") {
        return Some(section);
    }
    parent(&section).filter(|t| is_tag(t, "table"))
}

fn cells(row: &Handle) -> Vec<Handle> {
    element_children(row)
        .into_iter()
        .filter(|c| is_tag(c, "td") || is_tag(c, "th"))
        .collect()
}

/// A row is a heading row when it sits in `<thead>`, or when it opens the
/// table (or its first `<tbody>`) and consists only of `<th>` cells.
pub(crate) fn is_heading_row(row: &Handle) -> bool {
    let Some(section) = parent(row) else {
        return false;
    };
    if is_tag(&section, "thead") {
        return true;
    }
    let opens_section = section
        .children
        .borrow()
        .iter()
        .find(|c| tag_name(c).is_some())
        .is_some_and(|first| Rc::ptr_eq(first, row));
    let cells = element_children(row);
    opens_section
        && (is_tag(&section, "table") || is_first_tbody(&section))
        && !cells.is_empty()
        && cells.iter().all(|c| is_tag(c, "th"))
}

fn is_first_tbody(section: &Handle) -> bool {
    if !is_tag(section, "tbody") {
        return false;
    }
    match previous_element_sibling(section) {
        None => true,
        Some(prev) => is_tag(&prev, "thead") && text_content(&prev).trim().is_empty(),
    }
}

fn has_merged_data_cell(table: &Handle) -> bool {
    descendants_by_tag(table, "td").iter().any(|cell| {
        let span = |name: &str| {
            get_attr(cell, name)
                .and_then(|v| parse_leading_int(&v))
                .unwrap_or(1)
        };
        span("colspan") > 1 || span("rowspan") > 1
    })
}

/// Integer prefix of `s` after leading whitespace, like JavaScript's
/// `parseInt(s, 10)`.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
