use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion};
use pdf_engine::Document;

/// A catalog and page tree packed into a single object stream, so the
/// benchmark exercises `ObjectStream` expansion rather than plain
/// indirect-object scanning.
fn object_stream_pdf() -> Vec<u8> {
    let contents = "%PDF-1.5\n\
4 0 obj<</Type/ObjStm/N 2/First 9/Length 74>>stream\n\
1 0 2 30\n\
<</Type/Catalog/Pages 2 0 R>> <</Type/Pages/Kids[3 0 R]/Count 1>>\n\
endstream endobj\n\
3 0 obj<</Type/Page/Parent 2 0 R>>endobj\n\
xref\n\
0 1\n\
0000000000 65535 f\n\
3 2\n\
0000000153 00000 n\n\
0000000009 00000 n\n\
trailer\n\
<</Root 1 0 R/Size 5>>\n\
startxref\n\
194\n\
%%EOF";
    contents.as_bytes().to_vec()
}

fn bench_object_stream_parse(c: &mut Criterion) {
    let buffer = object_stream_pdf();

    c.bench_function("object_stream_parse", |b| {
        b.iter(|| {
            let _ = Document::load_from(Cursor::new(&buffer));
        })
    });
}

criterion_group!(benches, bench_object_stream_parse);
criterion_main!(benches);
