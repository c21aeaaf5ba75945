//! Wire framing benchmarks
//!
//! Measures performance of:
//! - Header block construction
//! - Full document serialization
//! - XML synthesis for structured sources

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use indexfeed_core::xml::XmlBuilder;
use indexfeed_core::{Document, HeaderFramer, HeaderOptions, HeaderVersion, ParserHint};

const SMALL_DOC: &str = "<html><head><title>Small</title></head><body>A short page.</body></html>";

fn generate_large_doc(paragraphs: usize) -> String {
    let mut doc = String::from("<html><head><title>Large</title></head><body>\n");
    for i in 0..paragraphs {
        doc.push_str(&format!(
            "<p>Paragraph {} with enough words to look like real prose, \
             including some non-ASCII text: naïve café résumé.</p>\n",
            i
        ));
    }
    doc.push_str("</body></html>\n");
    doc
}

fn bench_header_framing(c: &mut Criterion) {
    let mut group = c.benchmark_group("header_framing");
    let options = HeaderOptions {
        url: Some("/var/www/docs/index.html".to_string()),
        mime_type: Some("text/html".to_string()),
        parser_hint: Some(ParserHint::Html),
        ..Default::default()
    };

    for version in [HeaderVersion::Legacy, HeaderVersion::Current] {
        let framer = HeaderFramer::new(version);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", version)),
            &options,
            |b, options| {
                b.iter(|| framer.frame(black_box(SMALL_DOC.as_bytes()), black_box(options)));
            },
        );
    }

    group.finish();
}

fn bench_document_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_serialization");
    let framer = HeaderFramer::default();

    for (name, content) in &[("small", SMALL_DOC.to_string()), ("large", generate_large_doc(500))] {
        let doc = Document::new("/docs/page.html", content.as_bytes(), "text/html")
            .with_parser(ParserHint::Html);
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &doc, |b, doc| {
            b.iter(|| black_box(doc).serialize_for_wire(&framer));
        });
    }

    group.finish();
}

fn bench_xml_synthesis(c: &mut Criterion) {
    let columns: Vec<(String, String)> = (0..20)
        .map(|i| (format!("column_{}", i), format!("value <{}> & more", i)))
        .collect();

    c.bench_function("xml_row_document", |b| {
        b.iter(|| {
            let mut xml = XmlBuilder::new();
            xml.start_tag("movies", &[]).start_tag("body", &[]);
            for (name, value) in black_box(&columns) {
                xml.element(name, value);
            }
            xml.finish()
        });
    });
}

criterion_group!(
    benches,
    bench_header_framing,
    bench_document_serialization,
    bench_xml_synthesis
);
criterion_main!(benches);
