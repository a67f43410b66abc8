// Benchmarks for selection conversion.

use criterion::{criterion_group, criterion_main, Criterion};
use super_copy::{align_tables, convert_html, copy_selection, ConversionOptions, Page, Settings};

fn bench_simple(c: &mut Criterion) {
    let html = "<h1>Hello</h1><p>This is a <strong>simple</strong> document.</p>";
    let options = ConversionOptions::new();
    c.bench_function("simple_document", |b| {
        b.iter(|| convert_html(html, &options, None));
    });
}

fn bench_table_selection(c: &mut Criterion) {
    let mut html = String::from("<table><tr><th>Name</th><th>Value</th></tr>");
    for i in 0..200 {
        html.push_str(&format!("<tr><td>row {i}</td><td>{}</td></tr>", i * 7));
    }
    html.push_str("</table>");
    let page = Page::parse(&html, "https://example.com/").with_title("Bench");
    let range = page.select_between("row 50", "row 150").expect("rows present");
    let settings = Settings::new();
    c.bench_function("table_selection", |b| {
        b.iter(|| copy_selection(&range, &page, &settings));
    });
}

fn bench_long_table(c: &mut Criterion) {
    let mut html = String::from("<table><tr><th>Name</th><th>Value</th></tr>");
    for i in 0..2000 {
        html.push_str(&format!("<tr><td>row {i}</td><td>{}</td></tr>", i * 7));
    }
    html.push_str("</table>");
    let options = ConversionOptions::new();
    c.bench_function("long_table", |b| {
        b.iter(|| convert_html(&html, &options, None));
    });
}

fn bench_align(c: &mut Criterion) {
    let mut text = String::from("| a | b |\n| --- | --- |\n");
    for i in 0..500 {
        text.push_str(&format!("| {i} | {} |\n", "x".repeat(i % 17)));
    }
    c.bench_function("align_tables", |b| {
        b.iter(|| align_tables(&text));
    });
}

criterion_group!(
    benches,
    bench_simple,
    bench_table_selection,
    bench_long_table,
    bench_align
);
criterion_main!(benches);
