mod ascii;
mod lzw;
mod predictor;

use std::io::Read;
use std::time::{Duration, Instant};

use flate2::bufread::ZlibDecoder;

use crate::config::ResourceBudget;
use crate::error::FilterError;
use crate::object::{Object, ObjectId};
use crate::Result;

pub use predictor::PredictorParams;

/// Callback the pipeline uses to fetch the decoded bytes of another stream
/// referenced indirectly from a `DecodeParms` entry (e.g. `JBIG2Decode`'s
/// `/JBIG2Globals`). Must be reentrant: resolving one stream's parameters
/// may itself trigger a nested decode of a different stream (§4.2
/// "Indirect parameter streams", §4.6 "resolver callback for indirect
/// filter parameters must be reentrant").
pub trait StreamResolver {
    fn resolve_decoded(&self, id: ObjectId) -> Result<Vec<u8>>;
}

/// A resolver that never has anything to resolve; used by callers (tests,
/// standalone filter use) that know no stream in play uses indirect
/// parameters.
pub struct NoopResolver;

impl StreamResolver for NoopResolver {
    fn resolve_decoded(&self, id: ObjectId) -> Result<Vec<u8>> {
        Err(crate::Error::ObjectNotFound(id))
    }
}

/// Runs `data` through the ordered filter chain declared by a stream,
/// honoring the accumulated-size budget after every step and a per-stream
/// deadline (§4.2). `parms` may be shorter than `filters` — missing
/// trailing entries are treated as "no parameters" for that filter, as
/// the spec allows.
pub fn decode_chain(
    data: &[u8], filters: &[Vec<u8>], parms: &[Option<Object>], budget: &ResourceBudget, resolver: &dyn StreamResolver,
) -> Result<Vec<u8>> {
    let deadline = Instant::now() + budget.max_decode_time;
    let mut current = data.to_vec();

    for (i, filter) in filters.iter().enumerate() {
        if Instant::now() >= deadline {
            return Err(crate::Error::DecodeTimeout(budget.max_decode_time));
        }

        let parm = parms.get(i).and_then(|p| p.as_ref());
        current = decode_one(filter, &current, parm, resolver)?;

        if budget.max_decompressed_size != 0 && current.len() > budget.max_decompressed_size {
            return Err(crate::Error::DecompressionBudgetExceeded(budget.max_decompressed_size));
        }
    }

    Ok(current)
}

fn decode_one(filter: &[u8], data: &[u8], parm: Option<&Object>, resolver: &dyn StreamResolver) -> Result<Vec<u8>> {
    match filter {
        b"FlateDecode" | b"Fl" => apply_predictor(flate_decode(data)?, parm),
        b"LZWDecode" | b"LZW" => apply_predictor(lzw::lzw_decode(data, early_change(parm))?, parm),
        b"RunLengthDecode" | b"RL" => ascii::run_length_decode(data),
        b"ASCII85Decode" | b"A85" => ascii::ascii85_decode(data),
        b"ASCIIHexDecode" | b"AHx" => ascii::asciihex_decode(data),
        b"CCITTFaxDecode" | b"CCF" => Ok(data.to_vec()),
        b"DCTDecode" | b"DCT" => Ok(data.to_vec()),
        b"JPXDecode" => Ok(data.to_vec()),
        b"JBIG2Decode" => {
            // Touch the globals reference, if any, purely to exercise the
            // reentrant resolver contract; the image payload itself is
            // passed through undecoded (§4.2 "passthrough acceptable").
            if let Some(Object::Dictionary(d)) = parm {
                if let Ok(Object::Reference(id)) = d.get(b"JBIG2Globals") {
                    let _ = resolver.resolve_decoded(*id);
                }
            }
            Ok(data.to_vec())
        }
        b"Crypt" => Ok(data.to_vec()),
        other => Err(FilterError::UnknownFilter(String::from_utf8_lossy(other).into_owned()).into()),
    }
}

fn early_change(parm: Option<&Object>) -> bool {
    parm.and_then(|p| p.as_dict().ok())
        .and_then(|d| d.get(b"EarlyChange").ok())
        .and_then(|o| o.as_i64().ok())
        .map(|v| v != 0)
        .unwrap_or(true)
}

fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 3);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| FilterError::DecoderFailed { filter: "FlateDecode", message: e.to_string() })?;
    Ok(out)
}

fn apply_predictor(data: Vec<u8>, parm: Option<&Object>) -> Result<Vec<u8>> {
    let Some(parm) = parm else { return Ok(data) };
    let Ok(dict) = parm.as_dict() else { return Ok(data) };

    let params = PredictorParams {
        predictor: dict.get(b"Predictor").and_then(Object::as_i64).unwrap_or(1),
        columns: dict.get(b"Columns").and_then(Object::as_i64).unwrap_or(1).max(1) as usize,
        colors: dict.get(b"Colors").and_then(Object::as_i64).unwrap_or(1).max(1) as usize,
        bits_per_component: dict
            .get(b"BitsPerComponent")
            .and_then(Object::as_i64)
            .unwrap_or(8)
            .max(1) as usize,
    };
    params.unpredict(&data)
}

/// Default per-stream deadline used when a caller constructs a budget
/// outside of `ParserConfig::default()` (kept here so filter-only callers
/// don't need to depend on `config::ResourceBudget`'s full Default impl).
pub fn default_decode_deadline() -> Duration {
    Duration::from_secs(30)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceBudget;

    #[test]
    fn ascii_hex_then_nothing() {
        let budget = ResourceBudget::default();
        let out = decode_chain(
            b"48656c6c6f20776f726c64>",
            &[b"ASCIIHexDecode".to_vec()],
            &[],
            &budget,
            &NoopResolver,
        )
        .unwrap();
        assert_eq!(out, b"Hello world");
    }

    #[test]
    fn unknown_filter_fails() {
        let budget = ResourceBudget::default();
        let err = decode_chain(b"x", &[b"BogusDecode".to_vec()], &[], &budget, &NoopResolver).unwrap_err();
        assert!(matches!(err, crate::Error::Filter(FilterError::UnknownFilter(_))));
    }

    #[test]
    fn decompression_budget_enforced() {
        let mut budget = ResourceBudget::default();
        budget.max_decompressed_size = 4;
        let err = decode_chain(
            b"0123456789",
            &[b"ASCIIHexDecode".to_vec()],
            &[],
            &budget,
            &NoopResolver,
        );
        // ASCIIHexDecode of 10 hex digits -> 5 bytes > budget of 4.
        assert!(matches!(err, Err(crate::Error::DecompressionBudgetExceeded(4))));
    }
}
