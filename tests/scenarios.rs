//! End-to-end scenarios exercising the raw-parse / decode / semantic-build
//! pipeline through the public API, one file per spec-style example: a
//! clean decode, a reference cycle, tail salvage, an encrypted round trip,
//! an object stream, and an inline image payload.

use std::collections::BTreeMap;

use pdf_engine::config::{DecodeParallelism, ResourceBudget, ScanLimits};
use pdf_engine::decode::{decode_document, CancellationToken};
use pdf_engine::semantic::SemanticDocument;
use pdf_engine::{Document, Error, Object};

/// Builds a minimal well-formed PDF out of `(number, generation, body)`
/// triples, computing every xref offset itself so test bodies only have
/// to write object content. Bodies are raw bytes, not `String`, so a
/// stream's binary payload survives untouched.
fn build_pdf(objects: &[(u32, u16, Vec<u8>)], trailer_body: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.7\n");

    let mut offsets: BTreeMap<u32, (usize, u16)> = BTreeMap::new();
    let max_id = objects.iter().map(|(n, _, _)| *n).max().unwrap_or(0);
    for (num, gen, body) in objects {
        offsets.insert(*num, (buf.len(), *gen));
        buf.extend_from_slice(format!("{num} {gen} obj").as_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(b"endobj\n");
    }

    let xref_offset = buf.len();
    buf.extend_from_slice(format!("xref\n0 {}\n", max_id + 1).as_bytes());
    buf.extend_from_slice(b"0000000000 65535 f \n");
    for n in 1..=max_id {
        match offsets.get(&n) {
            Some((offset, gen)) => buf.extend_from_slice(format!("{offset:010} {gen:05} n \n").as_bytes()),
            None => buf.extend_from_slice(b"0000000000 65535 f \n"),
        }
    }
    buf.extend_from_slice(format!("trailer\n<<{trailer_body}>>\nstartxref\n{xref_offset}\n%%EOF").as_bytes());
    buf
}

/// A single page document whose content stream is `content_body`, wrapped
/// with the catalog/pages/page boilerplate every scenario below needs.
fn page_objects(content_obj: u32, content_body: Vec<u8>) -> Vec<(u32, u16, Vec<u8>)> {
    vec![
        (1, 0, b"<</Type/Catalog/Pages 2 0 R>>".to_vec()),
        (2, 0, b"<</Type/Pages/Kids[3 0 R]/Count 1>>".to_vec()),
        (3, 0, format!("<</Type/Page/Parent 2 0 R/Contents {content_obj} 0 R>>").into_bytes()),
        (content_obj, 0, content_body),
    ]
}

fn stream_object(dict_extra: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = format!("<</Length {}{dict_extra}>>stream\n", payload.len()).into_bytes();
    body.extend_from_slice(payload);
    body.extend_from_slice(b"\nendstream");
    body
}

// S1 — a single stream filtered with ASCIIHexDecode decodes to its plain-text payload.
#[test]
fn ascii_hex_stream_decodes_to_plain_text() {
    let payload = b"48656c6c6f20776f726c64>"; // "Hello world" + optional EOD marker
    let objects = page_objects(4, stream_object("/Filter/ASCIIHexDecode", payload));
    let bytes = build_pdf(&objects, "/Root 1 0 R/Size 5");

    let raw = Document::load_mem(&bytes).unwrap();
    let cancel = CancellationToken::new();
    let decoded = decode_document(raw, &ResourceBudget::default(), &DecodeParallelism::Fixed(1), &cancel).unwrap();

    let content = decoded.content((4, 0)).expect("stream 4 0 decoded");
    assert_eq!(content, b"Hello world");
}

// S2 — two objects that only reference each other never deadlock the
// reference resolver; they report a cycle instead.
#[test]
fn mutually_referencing_objects_report_a_cycle_instead_of_hanging() {
    let objects: Vec<(u32, u16, Vec<u8>)> = vec![
        (1, 0, b"2 0 R".to_vec()),
        (2, 0, b"1 0 R".to_vec()),
        (3, 0, b"<</Type/Catalog/Pages 4 0 R>>".to_vec()),
        (4, 0, b"<</Type/Pages/Kids[]/Count 0>>".to_vec()),
    ];
    let bytes = build_pdf(&objects, "/Root 3 0 R/Size 5");

    let doc = Document::load_mem(&bytes).unwrap();
    let err = doc.dereference_deep(&Object::Reference((1, 0)), 50).unwrap_err();
    assert!(matches!(err, Error::ReferenceCycle((1, 0)) | Error::ReferenceCycle((2, 0))));
}

// S3 — when startxref/xref is garbage, tail salvage rebuilds the
// directory from `N G obj` headers and keeps the newest Catalog as Root.
#[test]
fn tail_salvage_picks_the_newest_catalog_as_root() {
    let mut content = Vec::new();
    content.extend(b"%PDF-1.7\n");
    content.extend(b"1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");
    content.extend(b"2 0 obj<</Type/Pages/Kids[]/Count 0>>endobj\n");
    // A later incremental update supersedes the original catalog.
    content.extend(b"5 0 obj<</Type/Catalog/Pages 6 0 R>>endobj\n");
    content.extend(b"6 0 obj<</Type/Pages/Kids[]/Count 0>>endobj\n");
    content.extend(b"xref\nthis is not a real xref table\ntrailer<<>>\nstartxref\n0\n%%EOF");

    let doc = Document::load_mem(&content).unwrap();
    let root = doc.trailer.get(b"Root").and_then(Object::as_reference).unwrap();
    assert_eq!(root, (5, 0));
    assert!(doc.get_dictionary(root).unwrap().has_type(b"Catalog"));
}

// S4 — an AES-128 encrypted document only decodes with the right user
// password, and the recovered content stream is the genuine plaintext.
#[test]
fn encrypted_document_round_trips_with_the_right_password() {
    let bytes = std::fs::read("tests/fixtures/encrypted_aes128.pdf").unwrap();

    let raw = Document::load_mem_with_password(&bytes, "secret").unwrap();
    let cancel = CancellationToken::new();
    let decoded = decode_document(raw, &ResourceBudget::default(), &DecodeParallelism::Fixed(1), &cancel).unwrap();

    let content = decoded.content((5, 0)).expect("content stream 5 0 decoded");
    assert!(String::from_utf8_lossy(content).contains("Secret Text"));
}

#[test]
fn encrypted_document_rejects_the_wrong_password() {
    let bytes = std::fs::read("tests/fixtures/encrypted_aes128.pdf").unwrap();
    let err = Document::load_mem_with_password(&bytes, "not the password").unwrap_err();
    assert!(matches!(err, Error::InvalidPassword | Error::Decryption(_)));
}

// S5 — an outline entry stashed inside an uncompressed object stream is
// still reachable after the semantic build expands it.
#[test]
fn outline_entry_inside_an_object_stream_is_reachable() {
    let member = b"<</Title(First Entry)>>";
    let header = b"10 0"; // one pair: object 10 at relative offset 0
    let mut objstm_content = header.to_vec();
    objstm_content.extend_from_slice(member);

    let mut objstm_body = format!("<</Type/ObjStm/N 1/First {}/Length {}>>stream\n", header.len(), objstm_content.len()).into_bytes();
    objstm_body.extend_from_slice(&objstm_content);
    objstm_body.extend_from_slice(b"\nendstream");

    let objects: Vec<(u32, u16, Vec<u8>)> = vec![
        (1, 0, b"<</Type/Catalog/Pages 2 0 R/Outlines 4 0 R>>".to_vec()),
        (2, 0, b"<</Type/Pages/Kids[3 0 R]/Count 1>>".to_vec()),
        (3, 0, b"<</Type/Page/Parent 2 0 R>>".to_vec()),
        (4, 0, b"<</Type/Outlines/First 10 0 R>>".to_vec()),
        (5, 0, objstm_body),
    ];
    let bytes = build_pdf(&objects, "/Root 1 0 R/Size 6");

    let raw = Document::load_mem(&bytes).unwrap();
    assert!(raw.get_dictionary((10, 0)).unwrap().has(b"Title"));

    let cancel = CancellationToken::new();
    let decoded = decode_document(raw, &ResourceBudget::default(), &DecodeParallelism::Fixed(1), &cancel).unwrap();
    let semantic = SemanticDocument::build(decoded, &ScanLimits::default()).unwrap();

    assert_eq!(semantic.outlines.len(), 1);
    assert_eq!(semantic.outlines[0].title, "First Entry");
}

// S6 — an inline image whose binary payload happens to contain the
// literal bytes `EI` is not truncated at the fake terminator.
#[test]
fn inline_image_payload_survives_embedded_ei_bytes() {
    let mut stream_body = Vec::new();
    stream_body.extend_from_slice(b"q\nBI /W 1 /H 1 /BPC 8 /CS /G ID ");
    let payload_start = stream_body.len();
    stream_body.extend_from_slice(b"\xffEI\xffrest of the payload\n");
    stream_body.extend_from_slice(b"EI\nQ\n");

    let objects = page_objects(4, stream_object("", &stream_body));
    let bytes = build_pdf(&objects, "/Root 1 0 R/Size 5");

    let raw = Document::load_mem(&bytes).unwrap();
    let cancel = CancellationToken::new();
    let decoded = decode_document(raw, &ResourceBudget::default(), &DecodeParallelism::Fixed(1), &cancel).unwrap();
    let content = decoded.content((4, 0)).expect("content stream 4 0 decoded");

    let (payload, _next) = pdf_engine::parser::inline_image_payload(&content[payload_start..]).unwrap();
    assert_eq!(payload, b"\xffEI\xffrest of the payload".to_vec());
}
