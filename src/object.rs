use std::fmt;

use indexmap::IndexMap;

use crate::error::Error;
use crate::Result;

/// `(object number, generation)`. Generation `65535` together with object
/// number `0` denotes the head of the free list and is never a valid
/// in-use reference.
pub type ObjectId = (u32, u16);

/// Whether a `String` object was written with literal `( )` or hex `< >`
/// delimiters in the source. Preserved so a re-serializer can round-trip
/// the original form, and so callers distinguish UTF-16BE BOM-prefixed
/// literal strings from hex-encoded binary payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringFormat {
    Literal,
    Hexadecimal,
}

/// The raw object variants of §3's data model. Every variant is cheap to
/// clone except `Stream`, whose content and dictionary are the two fields
/// that actually own bytes.
#[derive(Debug, Clone)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    String(Vec<u8>, StringFormat),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Reference(ObjectId),
    Stream(Stream),
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        use Object::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Real(a), Real(b)) => a.to_bits() == b.to_bits(),
            (Name(a), Name(b)) => a == b,
            (String(a, fa), String(b, fb)) => a == b && fa == fb,
            (Array(a), Array(b)) => a == b,
            (Dictionary(a), Dictionary(b)) => a == b,
            (Reference(a), Reference(b)) => a == b,
            (Stream(a), Stream(b)) => a == b,
            _ => false,
        }
    }
}

impl Object {
    pub fn string_literal<S: Into<Vec<u8>>>(s: S) -> Self {
        Object::String(s.into(), StringFormat::Literal)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Object::Boolean(b) => Ok(*b),
            _ => Err(type_mismatch("Boolean", self)),
        }
    }

    /// Returns the integer value, truncating a `Real` if necessary. The
    /// spec requires that the integer/float discriminator be observable,
    /// so prefer `as_i64_exact` when that distinction matters.
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Object::Integer(n) => Ok(*n),
            Object::Real(f) => Ok(*f as i64),
            _ => Err(type_mismatch("Number", self)),
        }
    }

    pub fn as_i64_exact(&self) -> Result<i64> {
        match self {
            Object::Integer(n) => Ok(*n),
            _ => Err(type_mismatch("Integer", self)),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Object::Integer(n) => Ok(*n as f64),
            Object::Real(f) => Ok(*f),
            _ => Err(type_mismatch("Number", self)),
        }
    }

    pub fn as_name(&self) -> Result<&[u8]> {
        match self {
            Object::Name(n) => Ok(n),
            _ => Err(type_mismatch("Name", self)),
        }
    }

    pub fn as_name_str(&self) -> Result<&str> {
        self.as_name()
            .and_then(|n| std::str::from_utf8(n).map_err(|_| type_mismatch("Name", self)))
    }

    /// Accepts either a `Name` or a `String` — many dictionary entries in
    /// the wild are written as one where the spec says the other.
    pub fn as_str(&self) -> Result<&[u8]> {
        match self {
            Object::Name(n) => Ok(n),
            Object::String(s, _) => Ok(s),
            _ => Err(type_mismatch("Name or String", self)),
        }
    }

    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Object::String(s, _) => Ok(s),
            _ => Err(type_mismatch("String", self)),
        }
    }

    pub fn as_array(&self) -> Result<&[Object]> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(type_mismatch("Array", self)),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Object>> {
        match self {
            Object::Array(a) => Ok(a),
            _ => Err(Error::TypeMismatch { expected: "Array", found: "other" }),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&s.dict),
            _ => Err(type_mismatch("Dictionary", self)),
        }
    }

    pub fn as_dict_mut(&mut self) -> Result<&mut Dictionary> {
        match self {
            Object::Dictionary(d) => Ok(d),
            Object::Stream(s) => Ok(&mut s.dict),
            _ => Err(Error::TypeMismatch { expected: "Dictionary", found: "other" }),
        }
    }

    pub fn as_reference(&self) -> Result<ObjectId> {
        match self {
            Object::Reference(id) => Ok(*id),
            _ => Err(type_mismatch("Reference", self)),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(type_mismatch("Stream", self)),
        }
    }

    pub fn as_stream_mut(&mut self) -> Result<&mut Stream> {
        match self {
            Object::Stream(s) => Ok(s),
            _ => Err(Error::TypeMismatch { expected: "Stream", found: "other" }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::String(..) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Reference(_) => "Reference",
            Object::Stream(_) => "Stream",
        }
    }
}

fn type_mismatch(expected: &'static str, found: &Object) -> Error {
    Error::TypeMismatch { expected, found: found.type_name() }
}

macro_rules! object_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Object {
            fn from(v: $ty) -> Self {
                Object::$variant(v.into())
            }
        }
    };
}

object_from!(bool, Boolean);
object_from!(i64, Integer);
object_from!(i32, Integer);
object_from!(f64, Real);
object_from!(Dictionary, Dictionary);
object_from!(Stream, Stream);

impl From<f32> for Object {
    fn from(v: f32) -> Self {
        Object::Real(v as f64)
    }
}

impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::Array(v)
    }
}

/// Insertion-ordered mapping from PDF name to object.
///
/// Key order is a first-class part of the value (§3 invariant 2, §9
/// "Ordered map"): two dictionaries with the same key/value pairs but
/// different write order are *not* considered interchangeable by a
/// re-serializer, though `PartialEq` here compares by content only (order
/// is exposed separately via `iter`/`keys` for callers that need it).
#[derive(Debug, Clone, Default)]
pub struct Dictionary(IndexMap<Vec<u8>, Object>);

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().all(|(k, v)| other.0.get(k) == Some(v))
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary(IndexMap::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sets `key`, moving it to the end of iteration order if it already
    /// existed — matches `IndexMap::insert` semantics, which is what the
    /// "insertion order of the most recent write" invariant requires.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        let key = key.into();
        self.0.shift_remove(&key);
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: &[u8]) -> Result<&Object> {
        self.0
            .get(key)
            .ok_or_else(|| Error::DictKeyNotFound(String::from_utf8_lossy(key).into_owned()))
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Result<&mut Object> {
        self.0
            .get_mut(key)
            .ok_or_else(|| Error::DictKeyNotFound(String::from_utf8_lossy(key).into_owned()))
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Object)> {
        self.0.iter().map(|(k, v)| (k.as_slice(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.0.keys().map(|k| k.as_slice())
    }

    /// Value of `/Type`, if present, as a bare slice (e.g. `b"Page"`).
    pub fn get_type(&self) -> Result<&[u8]> {
        self.get(b"Type").and_then(Object::as_name)
    }

    pub fn has_type(&self, expected: &[u8]) -> bool {
        self.get_type().map(|t| t == expected).unwrap_or(false)
    }
}

/// A stream object: a dictionary plus the bytes it governs. Cloning a
/// `Stream` clones both (§9 "Stream ownership").
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub content: Vec<u8>,
    /// Absolute byte offset of the first content byte in the source
    /// buffer, recorded by the scanner so the loader can re-slice the
    /// payload once `/Length` resolves (it may itself be an indirect
    /// reference, resolved after the dictionary is already parsed).
    pub start_position: Option<usize>,
    /// `true` once `content` holds the literal source bytes and has not
    /// yet been run through the filter pipeline.
    pub allows_compression: bool,
}

impl Stream {
    pub fn new(dict: Dictionary, content: Vec<u8>) -> Self {
        Stream { dict, content, start_position: None, allows_compression: true }
    }

    pub fn with_start_position(mut self, pos: usize) -> Self {
        self.start_position = Some(pos);
        self
    }

    pub fn set_content(&mut self, content: Vec<u8>) {
        self.content = content;
        self.start_position = None;
    }

    /// Ordered list of filter names declared in `/Filter`, normalizing the
    /// single-name-vs-array forms the spec allows.
    pub fn filter_names(&self) -> Result<Vec<Vec<u8>>> {
        match self.dict.get(b"Filter") {
            Ok(Object::Name(n)) => Ok(vec![n.clone()]),
            Ok(Object::Array(arr)) => arr.iter().map(|o| o.as_name().map(|n| n.to_vec())).collect(),
            Ok(_) => Err(Error::InvalidStream("/Filter is neither a Name nor an Array".into())),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Ordered list of per-filter parameter dictionaries, `None` where a
    /// filter declares no parameters of its own.
    pub fn decode_parms(&self) -> Result<Vec<Option<Object>>> {
        let parms = self.dict.get(b"DecodeParms").or_else(|_| self.dict.get(b"DP"));
        match parms {
            Ok(obj @ (Object::Dictionary(_) | Object::Reference(_))) => Ok(vec![Some(obj.clone())]),
            Ok(Object::Array(arr)) => Ok(arr
                .iter()
                .map(|o| if o.is_null() { None } else { Some(o.clone()) })
                .collect()),
            Ok(Object::Null) | Err(_) => Ok(Vec::new()),
            Ok(_) => Err(Error::InvalidStream("/DecodeParms is of an unsupported type".into())),
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringFormat::Literal => write!(f, "literal"),
            StringFormat::Hexadecimal => write!(f, "hexadecimal"),
        }
    }
}
