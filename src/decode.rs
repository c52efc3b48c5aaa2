//! The Decode stage (§4.6 / §3 `DecodedDocument`): runs every stream
//! object's filter chain, in parallel, bounded by the configured resource
//! budget and a cooperative cancellation flag.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::config::{DecodeParallelism, ResourceBudget};
use crate::document::Document;
use crate::filters::{self, StreamResolver};
use crate::object::ObjectId;
use crate::{Error, Result};

/// A stream's decoded payload plus the filter chain that produced it, so
/// callers can tell a passthrough (`DCTDecode`/`JPXDecode`/`JBIG2Decode`)
/// apart from a genuinely decompressed payload.
#[derive(Debug, Clone)]
pub struct DecodedStream {
    pub content: Vec<u8>,
    pub filters: Vec<Vec<u8>>,
}

/// Wraps a `Document` (the Raw tier) with every stream's decoded content,
/// keyed by object id. Objects that are not streams, or that fail to
/// decode, have no entry here — callers fall back to `raw.objects` for
/// those (§4.6 "best-effort: a single stream's failure does not abort the
/// whole document").
pub struct DecodedDocument {
    pub raw: Document,
    pub decoded: HashMap<ObjectId, DecodedStream>,
}

/// Signaled to stop in-flight and not-yet-started decode work; checked
/// before each stream and again after each filter step within a chain
/// (§5 "cooperative cancellation").
#[derive(Default)]
pub struct CancellationToken(AtomicBool);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(AtomicBool::new(false))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resolves a referenced stream's decoded content by looking it up in a
/// document that is being decoded concurrently with itself — the callback
/// the filter pipeline needs for indirect `DecodeParms` like
/// `/JBIG2Globals` (§4.2, §4.6 "reentrant resolver").
struct DocumentResolver<'a> {
    raw: &'a Document,
    budget: &'a ResourceBudget,
}

impl StreamResolver for DocumentResolver<'_> {
    fn resolve_decoded(&self, id: ObjectId) -> Result<Vec<u8>> {
        let obj = self.raw.get_object(id)?;
        let stream = obj.as_stream()?;
        let filter_names = stream.filter_names()?;
        if filter_names.is_empty() {
            return Ok(stream.content.clone());
        }
        let parms = stream.decode_parms()?;
        filters::decode_chain(&stream.content, &filter_names, &parms, self.budget, self)
    }
}

/// Runs the filter chain for every stream object in `raw` in parallel via
/// `rayon::par_iter`, dispatched on a scoped thread pool sized by
/// `parallelism` rather than rayon's process-global pool (§4.6, §5's
/// `decode_parallelism` option). A cancelled token short-circuits
/// remaining work and the whole call fails with `Error::Cancelled` rather
/// than handing back a `DecodedDocument` whose map only covers the
/// streams that happened to finish before the flag was observed (§8
/// invariant 7: "no partial document returned" on cancellation).
pub fn decode_document(
    raw: Document, budget: &ResourceBudget, parallelism: &DecodeParallelism, cancel: &CancellationToken,
) -> Result<DecodedDocument> {
    let resolver = DocumentResolver { raw: &raw, budget };
    let failures = Mutex::new(Vec::new());

    let decode_one = |(&id, object): (&ObjectId, &crate::object::Object)| -> Option<(ObjectId, DecodedStream)> {
        if cancel.is_cancelled() {
            return None;
        }
        let stream = object.as_stream().ok()?;
        let filter_names = stream.filter_names().ok()?;
        let parms = stream.decode_parms().ok()?;

        match filters::decode_chain(&stream.content, &filter_names, &parms, budget, &resolver) {
            Ok(content) => Some((id, DecodedStream { content, filters: filter_names })),
            Err(e) => {
                failures.lock().expect("decode failures mutex poisoned").push((id, e));
                None
            }
        }
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.worker_count())
        .build()
        .expect("failed to build decode thread pool");

    let decoded: HashMap<ObjectId, DecodedStream> =
        pool.install(|| raw.objects.par_iter().filter_map(decode_one).collect());

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    for (id, err) in failures.into_inner().expect("decode failures mutex poisoned") {
        log::warn!("stream {} {} failed to decode: {}", id.0, id.1, err);
    }

    Ok(DecodedDocument { raw, decoded })
}

impl DecodedDocument {
    /// The decoded payload for `id`, falling back to the stream's raw
    /// (still filter-encoded) content when decoding failed or was never
    /// attempted (not a stream object).
    pub fn content(&self, id: ObjectId) -> Option<&[u8]> {
        if let Some(decoded) = self.decoded.get(&id) {
            return Some(&decoded.content);
        }
        self.raw.get_object(id).ok().and_then(|o| o.as_stream().ok()).map(|s| s.content.as_slice())
    }
}
