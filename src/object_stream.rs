use std::collections::BTreeMap;

use crate::config::ResourceBudget;
use crate::error::ParseError;
use crate::filters::{self, NoopResolver};
use crate::object::{Object, ObjectId};
use crate::parser::{self, ParserInput};
use crate::Result;

/// A decompressed `/Type /ObjStm` container: every embedded object keyed
/// by `(number, 0)` — object streams never hold objects at a non-zero
/// generation (§4.3 type-2 xref rows, §3 invariant 6).
pub struct ObjectStream {
    pub objects: BTreeMap<ObjectId, Object>,
}

impl ObjectStream {
    /// Decompresses `stream`'s content (if not already) and parses its
    /// header of `/N` `objNum offset` integer pairs followed by the
    /// objects themselves, starting at byte `/First` (§4.4).
    pub fn new(stream: &mut crate::object::Stream) -> Result<Self> {
        if stream.allows_compression {
            let filters = stream.filter_names()?;
            let parms = stream.decode_parms()?;
            if !filters.is_empty() {
                let budget = ResourceBudget::default();
                stream.content = filters::decode_chain(&stream.content, &filters, &parms, &budget, &NoopResolver)?;
                stream.allows_compression = false;
            }
        }

        let n = stream
            .dict
            .get(b"N")
            .and_then(Object::as_i64)
            .map_err(|_| ParseError::InvalidIndirectObject)? as usize;
        let first = stream
            .dict
            .get(b"First")
            .and_then(Object::as_i64)
            .map_err(|_| ParseError::InvalidIndirectObject)? as usize;

        let header_input = ParserInput::new_extra(&stream.content, "objstm header");
        let header = parser::object_stream_header(header_input, n).ok_or(ParseError::InvalidIndirectObject)?;

        let mut objects = BTreeMap::new();
        for (i, &(obj_num, relative_offset)) in header.iter().enumerate() {
            let start = first + relative_offset;
            if start > stream.content.len() {
                continue;
            }
            let end = header
                .get(i + 1)
                .map(|&(_, next_offset)| first + next_offset)
                .unwrap_or(stream.content.len())
                .min(stream.content.len());
            if end < start {
                continue;
            }

            let slice = &stream.content[start..end];
            if let Some(obj) = parser::object(ParserInput::new_extra(slice, "objstm member")) {
                objects.insert((obj_num, 0), obj);
            }
        }

        Ok(ObjectStream { objects })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Dictionary, Stream};

    #[test]
    fn parses_two_embedded_objects() {
        let body = b"1 0 5 3 (a)(bee)";
        let mut dict = Dictionary::new();
        dict.set("N", 2i64);
        dict.set("First", 8i64);
        dict.set("Type", Object::Name(b"ObjStm".to_vec()));
        let mut stream = Stream::new(dict, body.to_vec());
        stream.allows_compression = false;

        let obj_stream = ObjectStream::new(&mut stream).unwrap();
        assert_eq!(obj_stream.objects.len(), 2);
        assert_eq!(obj_stream.objects.get(&(1, 0)), Some(&Object::string_literal(b"a".to_vec())));
        assert_eq!(obj_stream.objects.get(&(5, 0)), Some(&Object::string_literal(b"bee".to_vec())));
    }
}
