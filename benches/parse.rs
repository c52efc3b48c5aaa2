use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion};
use pdf_engine::Document;

fn sample_pdf() -> Vec<u8> {
    let body = "%PDF-1.5\n\
1 0 obj<</Type/Pages/Kids[5 0 R]/Count 1/Resources 3 0 R/MediaBox[0 0 595 842]>>endobj\n\
2 0 obj<</Type/Font/Subtype/Type1/BaseFont/Courier>>endobj\n\
3 0 obj<</Font<</F1 2 0 R>>>>endobj\n\
5 0 obj<</Type/Page/Parent 1 0 R/Contents 4 0 R>>endobj\n\
6 0 obj<</Type/Catalog/Pages 1 0 R>>endobj\n\
4 0 obj<</Length 45>>stream\n\
BT /F1 48 Tf 100 600 Td (Hello World!) Tj ET\n\
endstream endobj\n";
    let xref = format!(
        "xref\n0 7\n\
         0000000000 65535 f\n\
         0000000009 00000 n\n\
         0000000096 00000 n\n\
         0000000155 00000 n\n\
         0000000290 00000 n\n\
         0000000191 00000 n\n\
         0000000247 00000 n\n\
         trailer\n<</Root 6 0 R/Size 7>>\nstartxref\n{}\n%%EOF",
        body.len()
    );
    format!("{body}{xref}").into_bytes()
}

fn bench_load(c: &mut Criterion) {
    let buffer = sample_pdf();

    c.bench_function("load", |b| {
        b.iter(|| {
            Document::load_from(Cursor::new(&buffer)).unwrap();
        })
    });
}

criterion_group!(benches, bench_load);
criterion_main!(benches);
