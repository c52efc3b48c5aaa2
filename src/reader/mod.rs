mod encrypted;
mod load;
mod metadata;
mod object_loader;

#[cfg(test)]
mod tests;

use log::{error, warn};
use std::cmp;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::encryption::EncryptionState;
use crate::error::{ParseError, XrefError};
use crate::object_stream::ObjectStream;
use crate::parser::{self, ParserInput};
use crate::recovery::RecoveryStrategy;
use crate::xref::{Xref, XrefEntry};
use crate::{Document, Error, Object, Result};

pub use metadata::PdfMetadata;

pub(crate) type FilterFunc = fn((u32, u16), &mut Object) -> Option<((u32, u16), Object)>;

pub struct Reader<'a> {
    pub buffer: &'a [u8],
    pub document: Document,
    pub encryption_state: Option<EncryptionState>,
    pub recovery: RecoveryStrategy,
    pub password: Option<String>, // Password for encrypted PDFs
    /// Undecrypted bytes of every indirect object read so far, keyed by id.
    /// Populated lazily as objects are scanned; the encryption dictionary
    /// and object streams are read from here before any key is available.
    pub raw_objects: std::collections::HashMap<(u32, u16), Vec<u8>>,
}

/// Maximum allowed embedding of literal strings.
pub const MAX_BRACKET: usize = 100;

impl Reader<'_> {
    /// An empty reader used only where a `&Reader` is needed to satisfy a
    /// fallback code path (e.g. the stream-xref lookup inside
    /// `xref_and_trailer`) that a test never actually exercises.
    #[cfg(test)]
    pub(crate) fn scratch() -> Reader<'static> {
        Reader {
            buffer: &[],
            document: Document::new(),
            encryption_state: None,
            recovery: crate::recovery::RecoveryStrategy::default(),
            raw_objects: std::collections::HashMap::new(),
            password: None,
        }
    }

    /// Read whole document.
    pub fn read(mut self, filter_func: Option<FilterFunc>) -> Result<Document> {
        let offset = self.buffer.windows(5).position(|w| w == b"%PDF-").unwrap_or(0);
        self.buffer = &self.buffer[offset..];

        // The document structure can be expressed in PEG as:
        //   document <- header indirect_object* xref trailer xref_start
        let version =
            parser::header(ParserInput::new_extra(self.buffer, "header")).ok_or(ParseError::InvalidFileHeader)?;

        //The binary_mark is in line 2 after the pdf version. If at other line number, then will be declared as invalid pdf.
        if let Some(pos) = self.buffer.iter().position(|&byte| byte == b'\n') {
            if let Some(binary_mark) =
                parser::binary_mark(ParserInput::new_extra(&self.buffer[pos + 1..], "binary_mark"))
            {
                if binary_mark.iter().all(|&byte| byte >= 128) {
                    self.document.binary_mark = binary_mark;
                }
            }
        }

        let primary: Result<_> = (|| {
            let xref_start = Self::get_xref_start(self.buffer)?;
            if xref_start > self.buffer.len() {
                return Err(Error::Xref(XrefError::Start));
            }
            parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[xref_start..], "xref"), &self)
                .map(|result| (xref_start, result))
        })();

        let (mut xref, mut trailer) = match primary {
            Ok((xref_start, result)) => {
                self.document.xref_start = xref_start;
                result
            }
            Err(err) if !self.recovery.is_strict() => self.salvage(err)?,
            Err(err) => return Err(err),
        };

        // Hybrid-reference file (PDF 1.5): the main trailer may carry
        // /XRefStm pointing at a cross-reference stream holding the
        // compressed-object entries a classical xref table can't express,
        // even when the document has no /Prev section at all.
        Self::merge_xref_stream(&mut xref, &mut trailer, self.buffer, &self)?;

        // Read previous Xrefs of linearized or incremental updated document.
        let mut already_seen = HashSet::new();
        let mut prev_xref_start = trailer.remove(b"Prev");
        while let Some(prev) = prev_xref_start.and_then(|offset| offset.as_i64().ok()) {
            if already_seen.contains(&prev) {
                break;
            }
            already_seen.insert(prev);
            if prev < 0 || prev as usize > self.buffer.len() {
                return Err(Error::Xref(XrefError::PrevStart));
            }

            let (prev_xref, mut prev_trailer) =
                parser::xref_and_trailer(ParserInput::new_extra(&self.buffer[prev as usize..], ""), &self)?;
            xref.merge(prev_xref);
            Self::merge_xref_stream(&mut xref, &mut prev_trailer, self.buffer, &self)?;

            prev_xref_start = prev_trailer.get(b"Prev").cloned().ok();
        }
        let xref_entry_count = xref.max_id().checked_add(1).ok_or(ParseError::InvalidXref)?;
        if xref.size != xref_entry_count {
            warn!(
                "Size entry of trailer dictionary is {}, correct value is {}.",
                xref.size, xref_entry_count
            );
            xref.size = xref_entry_count;
        }

        self.document.version = version;
        self.document.max_id = xref.size - 1;
        self.document.trailer = trailer;
        self.document.reference_table = xref;

        // Check if encrypted
        let is_encrypted = self.document.trailer.get(b"Encrypt").is_ok();

        if is_encrypted {
            // For encrypted PDFs, use a special loading strategy
            self.load_encrypted_document(filter_func)?;
        } else {
            // For non-encrypted PDFs, use the normal loading
            self.load_objects_raw(filter_func)?;
        }

        Ok(self.document)
    }

    fn load_objects_raw(&mut self, filter_func: Option<FilterFunc>) -> Result<()> {
        let is_encrypted = self.document.trailer.get(b"Encrypt").is_ok();
        let zero_length_streams = Mutex::new(vec![]);
        let object_streams = Mutex::new(vec![]);

        let entries_filter_map = |(_, entry): (&_, &_)| {
            if let XrefEntry::Normal { offset, .. } = *entry {
                // read_object now handles decryption internally
                let result = self.read_object(offset as usize, None, &mut HashSet::new());
                let (object_id, mut object) = match result {
                    Ok(obj) => obj,
                    Err(e) => {
                        // Log error but continue
                        if is_encrypted {
                            // Expected for some encrypted objects - but log which ones
                            warn!("Skipping encrypted object at offset {}: {:?}", offset, e);
                        } else {
                            error!("Object load error at offset {}: {e:?}", offset);
                        }
                        return None;
                    }
                };
                if let Some(filter_func) = filter_func {
                    filter_func(object_id, &mut object)?;
                }

                if let Ok(ref mut stream) = object.as_stream_mut() {
                    if stream.dict.has_type(b"ObjStm") && !is_encrypted {
                        let obj_stream = ObjectStream::new(stream).ok()?;
                        let mut object_streams = object_streams.lock().expect("object_streams mutex poisoned");
                        if let Some(filter_func) = filter_func {
                            let objects: BTreeMap<(u32, u16), Object> = obj_stream
                                .objects
                                .into_iter()
                                .filter_map(|(object_id, mut object)| filter_func(object_id, &mut object))
                                .collect();
                            object_streams.extend(objects);
                        } else {
                            object_streams.extend(obj_stream.objects);
                        }
                    } else if stream.content.is_empty() {
                        let mut zero_length_streams =
                            zero_length_streams.lock().expect("zero_length_streams mutex poisoned");
                        zero_length_streams.push(object_id);
                    }
                }

                Some((object_id, object))
            } else {
                None
            }
        };

        self.document.objects = self
            .document
            .reference_table
            .entries
            .par_iter()
            .filter_map(entries_filter_map)
            .collect();

        // Per PDF spec, first definition wins for duplicate object IDs.
        // See https://github.com/J-F-Liu/lopdf/issues/160
        for (id, entry) in object_streams.into_inner().expect("object_streams mutex poisoned") {
            self.document.objects.entry(id).or_insert(entry);
        }

        for object_id in zero_length_streams.into_inner().expect("zero_length_streams mutex poisoned") {
            let _ = self.read_stream_content(object_id);
        }

        Ok(())
    }

    /// Tail salvage (§4.3 step 5): rebuilds a minimal directory by
    /// scanning the whole input for `N G obj` headers, used when the
    /// primary `startxref`/trailer resolution fails and recovery allows
    /// it. The rebuilt trailer's `/Root` is the last `/Type /Catalog`
    /// object found, matching "the newest `/Root` ... discovered".
    fn salvage(&mut self, cause: Error) -> Result<(Xref, crate::object::Dictionary)> {
        warn!("primary xref resolution failed ({cause}), attempting tail salvage");
        let headers = parser::salvage_headers(self.buffer);
        if headers.is_empty() {
            return Err(Error::Xref(XrefError::SalvageFailed));
        }
        let xref = Xref::from_salvaged_headers(headers.iter().copied());

        let mut trailer = crate::object::Dictionary::new();
        for &(id, offset) in &headers {
            let Ok((_, object)) = self.read_object(offset as usize, Some(id), &mut HashSet::new()) else { continue };
            let Ok(dict) = object.as_dict() else { continue };
            if dict.has_type(b"Catalog") {
                trailer.set("Root", Object::Reference(id));
            } else if dict.has_type(b"Info") {
                trailer.set("Info", Object::Reference(id));
            }
        }
        if !trailer.has(b"Root") {
            return Err(Error::Xref(XrefError::SalvageFailed));
        }
        Ok((xref, trailer))
    }

    /// Consumes `trailer`'s `/XRefStm`, if present, and merges the
    /// cross-reference stream it points at into `xref`. Hybrid-reference
    /// files carry this alongside a classical xref table/trailer so that
    /// readers that don't understand xref streams still get a usable
    /// (if compressed-object-blind) document; a reader that does
    /// understand them must also merge the stream's entries.
    fn merge_xref_stream(xref: &mut Xref, trailer: &mut crate::object::Dictionary, buffer: &[u8], reader: &Reader) -> Result<()> {
        let Some(offset) = trailer.remove(b"XRefStm").and_then(|offset| offset.as_i64().ok()) else {
            return Ok(());
        };
        if offset < 0 || offset as usize > buffer.len() {
            return Err(Error::Xref(XrefError::StreamStart));
        }
        let (xrefstm_xref, _) = parser::xref_and_trailer(ParserInput::new_extra(&buffer[offset as usize..], ""), reader)?;
        xref.merge(xrefstm_xref);
        Ok(())
    }

    fn get_xref_start(buffer: &[u8]) -> Result<usize> {
        // §4.3 step 1 / §6: "%%EOF marker appears within the last 32 KiB".
        const TAIL_WINDOW: usize = 32 * 1024;
        let seek_pos = buffer.len() - cmp::min(buffer.len(), TAIL_WINDOW);
        Self::search_substring(buffer, b"%%EOF", seek_pos)
            .and_then(|eof_pos| if eof_pos > 25 { Some(eof_pos) } else { None })
            .and_then(|eof_pos| Self::search_substring(buffer, b"startxref", eof_pos - 25))
            .ok_or(Error::Xref(XrefError::Start))
            .and_then(|xref_pos| {
                if xref_pos <= buffer.len() {
                    match parser::xref_start(ParserInput::new_extra(&buffer[xref_pos..], "xref")) {
                        Some(startxref) => Ok(startxref as usize),
                        None => Err(Error::Xref(XrefError::Start)),
                    }
                } else {
                    Err(Error::Xref(XrefError::Start))
                }
            })
    }

    pub(crate) fn search_substring(buffer: &[u8], pattern: &[u8], start_pos: usize) -> Option<usize> {
        buffer
            .get(start_pos..)?
            .windows(pattern.len())
            .rposition(|window| window == pattern)
            .map(|pos| start_pos + pos)
    }
}
