//! A PDF 1.x/2.0 parsing and decoding engine core.
//!
//! The pipeline has three tiers (scanner → xref/object loader → filter
//! decode → semantic view):
//!
//! - [`Document`] (the Raw tier): the object map, trailer, and
//!   cross-reference directory produced by [`document`]/[`reader`], with
//!   object streams expanded but stream content left filter-encoded.
//! - [`decode::DecodedDocument`] (the Decoded tier): every stream object's
//!   filter chain applied, bounded by a [`config::ResourceBudget`] and run
//!   in parallel across a configurable worker pool.
//! - [`semantic::SemanticDocument`] (the Semantic tier): the page list,
//!   outlines, and form fields flattened out of the Decoded tier's object
//!   graph, with inherited attributes resolved.
//!
//! [`config::ParserConfig`] ties recovery policy, resource limits, decode
//! parallelism, and tracing together for callers that want the whole
//! pipeline at once via [`parse_with_config`].

pub mod config;
pub mod decode;
mod destinations;
pub mod document;
pub mod encryption;
pub mod error;
pub mod filters;
pub mod object;
pub mod object_stream;
pub mod parser;
pub mod reader;
pub mod recovery;
pub mod semantic;
pub mod xref;

pub use config::ParserConfig;
pub use decode::{decode_document, CancellationToken, DecodedDocument};
pub use destinations::Destination;
pub use document::Document;
pub use error::Error;
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};
pub use reader::PdfMetadata;
pub use semantic::SemanticDocument;

/// The result type returned by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Runs the whole pipeline — raw parse, decode, semantic build — honoring
/// `config`'s recovery policy, resource budget, decode parallelism, and
/// tracer (§6 "the supplemental entry point a CLI front-end drives").
///
/// Equivalent to calling [`Document::load_mem`] followed by
/// [`decode::decode_document`] and [`semantic::SemanticDocument::build`],
/// except that the configured [`config::Tracer`] observes all three spans
/// and `config.budget.max_parse_time` bounds the whole call, not just the
/// decode stage.
pub fn parse_with_config(buffer: &[u8], config: &ParserConfig) -> Result<semantic::SemanticDocument> {
    let deadline = std::time::Instant::now() + config.budget.max_parse_time;
    let _parse_span = config.tracer.enter(config::Span::Parse);

    let raw = {
        let _span = config.tracer.enter(config::Span::RawParse);
        reader::Reader {
            buffer,
            document: Document::new(),
            encryption_state: None,
            recovery: config.recovery.same_kind(),
            raw_objects: std::collections::HashMap::new(),
            password: config.password.clone(),
        }
        .read(None)?
    };

    if std::time::Instant::now() > deadline {
        return Err(Error::ParseTimeout(config.budget.max_parse_time));
    }

    let decoded = {
        let _span = config.tracer.enter(config::Span::Decode);
        let cancel = CancellationToken::new();
        decode_document(raw, &config.budget, &config.decode_parallelism, &cancel)?
    };

    if std::time::Instant::now() > deadline {
        return Err(Error::ParseTimeout(config.budget.max_parse_time));
    }

    let _span = config.tracer.enter(config::Span::SemanticBuild);
    semantic::SemanticDocument::build(decoded, &config.limits)
}
