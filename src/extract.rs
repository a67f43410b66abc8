// Selection → HTML string.
//
// A selection inside a single table is rebuilt as a clean table holding the
// heading rows and only the data rows the selection touches, so that a
// partial drag across cells still converts to a pipe table with its header.

use tracing::debug;

use crate::dom::{inner_html, outer_html, SelectionRange};
use crate::table::TableClassification;

/// HTML for the selected region, or `None` when nothing is selected.
pub fn extract_html<R: SelectionRange + ?Sized>(range: &R) -> Option<String> {
    if range.is_collapsed() {
        debug!("selection is collapsed");
        return None;
    }

    let html = match range.common_table_ancestor() {
        Some(table) => table_selection_html(range, &table),
        None => inner_html(&range.clone_contents()),
    };

    if html.trim().is_empty() {
        debug!("selection is blank");
        return None;
    }
    Some(html)
}

fn table_selection_html<R: SelectionRange + ?Sized>(
    range: &R,
    table: &markup5ever_rcdom::Handle,
) -> String {
    let classification = TableClassification::classify(table);
    let heading: String = classification.heading_rows.iter().map(outer_html).collect();
    let data: String = classification
        .data_rows
        .iter()
        .filter(|row| range.intersects_node(row))
        .map(outer_html)
        .collect();

    let mut html = String::from("<table>");
    if !heading.is_empty() {
        html.push_str(&format!("<thead>{heading}</thead>"));
    }
    if !data.is_empty() {
        html.push_str(&format!("<tbody>{data}</tbody>"));
    }
    html.push_str("</table>");
    html
}
