use std::fs::File;
use std::io::{Cursor, Read};

use criterion::{criterion_group, criterion_main, Criterion};
use pdf_engine::Document;

fn bench_load_encrypted(c: &mut Criterion) {
    let path = "assets/encrypted.pdf";
    if !std::path::Path::new(path).exists() {
        return;
    }
    let mut buffer = Vec::new();
    File::open(path).unwrap().read_to_end(&mut buffer).unwrap();

    c.bench_function("load_encrypted", |b| {
        b.iter(|| {
            let _ = Document::load_from_with_password(Cursor::new(&buffer), "");
        })
    });
}

criterion_group!(benches, bench_load_encrypted);
criterion_main!(benches);
