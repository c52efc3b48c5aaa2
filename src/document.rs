//! The Raw document (§4.5 Raw IR / §3 `RawDocument`): an object map plus
//! trailer, version, and cross-reference directory, with no filter
//! decoding applied to stream content beyond what object-stream expansion
//! structurally requires.

use std::collections::{BTreeMap, HashSet};

use crate::encryption::EncryptionState;
use crate::error::ParseError;
use crate::object::{Dictionary, Object, ObjectId};
use crate::xref::Xref;
use crate::{Error, Result};

/// The object map, trailer, and cross-reference directory produced by the
/// object loader (§4.4) from a single PDF byte stream. Every `Object` it
/// holds is exactly as scanned: stream content is the literal source
/// bytes unless the stream is an object stream, whose content must be
/// expanded eagerly because the indirect objects it carries cannot
/// otherwise be discovered (§4.4 "object streams are structural").
#[derive(Debug, Clone)]
pub struct Document {
    pub version: String,
    pub max_id: u32,
    pub binary_mark: Vec<u8>,
    pub xref_start: usize,
    pub trailer: Dictionary,
    pub reference_table: Xref,
    pub objects: BTreeMap<ObjectId, Object>,
    pub encryption_state: Option<EncryptionState>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            version: String::new(),
            max_id: 0,
            binary_mark: Vec::new(),
            xref_start: 0,
            trailer: Dictionary::new(),
            reference_table: Xref::default(),
            objects: BTreeMap::new(),
            encryption_state: None,
        }
    }

    pub fn get_object(&self, id: ObjectId) -> Result<&Object> {
        self.objects.get(&id).ok_or(Error::ObjectNotFound(id))
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects.get_mut(&id).ok_or(Error::ObjectNotFound(id))
    }

    pub fn get_dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        self.get_object(id)?.as_dict()
    }

    /// Resolves `obj` one level: a `Reference` yields the object it points
    /// at (with its own id), anything else yields itself unchanged. Does
    /// not chase chains of references — callers needing that use
    /// `dereference_deep` (§3 invariant 4: "downward-only pointers", a
    /// chain is never expected to recurse more than a few hops).
    pub fn dereference<'a>(&'a self, obj: &'a Object) -> Result<(Option<ObjectId>, &'a Object)> {
        match obj {
            Object::Reference(id) => self.get_object(*id).map(|o| (Some(*id), o)),
            other => Ok((None, other)),
        }
    }

    /// Follows a chain of `Reference`s to the first non-reference object,
    /// bounded by `max_depth` and cycle detection (§8 invariant: reference
    /// cycles never loop the loader forever).
    pub fn dereference_deep<'a>(&'a self, obj: &'a Object, max_depth: usize) -> Result<&'a Object> {
        let mut current = obj;
        let mut seen = HashSet::new();
        let mut depth = 0;
        while let Object::Reference(id) = current {
            if !seen.insert(*id) {
                return Err(Error::ReferenceCycle(*id));
            }
            depth += 1;
            if depth > max_depth {
                return Err(Error::ReferenceDepthExceeded(max_depth));
            }
            current = self.get_object(*id)?;
        }
        Ok(current)
    }

    /// Checks whether `password` authenticates against this document's
    /// `/Encrypt` dictionary. An unencrypted document authenticates any
    /// password, including the empty one (the common "owner left the user
    /// password blank" case).
    pub fn authenticate_password(&self, password: &str) -> Result<()> {
        if self.trailer.get(b"Encrypt").is_err() {
            return Ok(());
        }
        crate::encryption::EncryptionState::decode(self, password).map(|_| ())
    }

    /// The Info-dictionary fields (§3 "`RawDocument` ... exposes
    /// `metadata()`"), best-effort: a missing or malformed `/Info` yields
    /// `None` for every field rather than an error.
    pub fn metadata(&self) -> crate::reader::PdfMetadata {
        let info = self
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| o.as_reference().ok())
            .and_then(|id| self.get_object(id).ok())
            .and_then(|o| o.as_dict().ok());

        let field = |key: &[u8]| -> Option<String> {
            let dict = info?;
            match dict.get(key).ok()? {
                Object::String(bytes, _) => Some(decode_pdf_text_string(bytes)),
                _ => None,
            }
        };

        crate::reader::PdfMetadata {
            title: field(b"Title"),
            author: field(b"Author"),
            subject: field(b"Subject"),
            keywords: field(b"Keywords"),
            creator: field(b"Creator"),
            producer: field(b"Producer"),
            creation_date: field(b"CreationDate"),
            modification_date: field(b"ModDate"),
            page_count: self.page_count(),
            version: self.version.clone(),
        }
    }

    fn page_count(&self) -> u32 {
        let Ok(root) = self.trailer.get(b"Root").and_then(Object::as_reference) else { return 0 };
        let Ok(catalog) = self.get_dictionary(root) else { return 0 };
        let Ok(pages_ref) = catalog.get(b"Pages").and_then(Object::as_reference) else { return 0 };
        self.pages_tree_count(pages_ref, &mut HashSet::new()).unwrap_or(0)
    }

    fn pages_tree_count(&self, id: ObjectId, seen: &mut HashSet<ObjectId>) -> Result<u32> {
        if !seen.insert(id) {
            return Err(Error::ReferenceCycle(id));
        }
        let dict = self.get_dictionary(id)?;
        match dict.get_type() {
            Ok(b"Page") => Ok(1),
            Ok(b"Pages") => {
                if let Ok(count) = dict.get(b"Count").and_then(Object::as_i64) {
                    if count >= 0 {
                        return Ok(count as u32);
                    }
                }
                let kids = dict.get(b"Kids").and_then(Object::as_array).map_err(|_| ParseError::InvalidIndirectObject)?;
                let mut total = 0;
                for kid in kids {
                    if let Ok(kid_ref) = kid.as_reference() {
                        total += self.pages_tree_count(kid_ref, seen).unwrap_or(0);
                    }
                }
                Ok(total)
            }
            _ => Ok(1),
        }
    }
}

/// Decodes a PDF text string per §7.9.2.2: UTF-16BE with a leading BOM, or
/// PDFDocEncoding (approximated here as Latin-1/bytes-as-codepoints, which
/// covers the ASCII-compatible subset nearly every real document uses)
/// otherwise.
pub(crate) fn decode_pdf_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..].chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Stream;

    #[test]
    fn dereference_follows_one_hop() {
        let mut doc = Document::new();
        doc.objects.insert((1, 0), Object::Integer(42));
        let (id, obj) = doc.dereference(&Object::Reference((1, 0))).unwrap();
        assert_eq!(id, Some((1, 0)));
        assert_eq!(obj.as_i64().unwrap(), 42);
    }

    #[test]
    fn dereference_deep_detects_cycle() {
        let mut doc = Document::new();
        doc.objects.insert((1, 0), Object::Reference((2, 0)));
        doc.objects.insert((2, 0), Object::Reference((1, 0)));
        let err = doc.dereference_deep(&Object::Reference((1, 0)), 10).unwrap_err();
        assert!(matches!(err, Error::ReferenceCycle(_)));
    }

    #[test]
    fn unencrypted_document_authenticates_any_password() {
        let doc = Document::new();
        assert!(doc.authenticate_password("whatever").is_ok());
    }

    #[test]
    fn get_dictionary_rejects_non_dictionary_objects() {
        let mut doc = Document::new();
        doc.objects.insert((1, 0), Object::Integer(1));
        assert!(doc.get_dictionary((1, 0)).is_err());
        doc.objects.insert((2, 0), Object::Stream(Stream::new(Dictionary::new(), vec![])));
        assert!(doc.get_dictionary((2, 0)).is_ok());
    }
}
