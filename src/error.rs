use std::fmt;
use std::io;
use std::num::TryFromIntError;

use crate::ObjectId;

/// Top-level error returned by every fallible operation in the crate.
///
/// Variants map onto the taxonomy kinds (Structural / Semantic / Resource /
/// Security / Filter / Cancelled); several wrap a more specific nested enum
/// so callers can match narrowly without the top level becoming unwieldy.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid file header")]
    InvalidFileHeader,

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("xref error: {0}")]
    Xref(#[from] XrefError),

    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("decryption error: {0}")]
    Decryption(#[from] DecryptionError),

    #[error("invalid password")]
    InvalidPassword,

    #[error("object {}.{} not found", .0.0, .0.1)]
    ObjectNotFound(ObjectId),

    #[error("missing xref entry")]
    MissingXrefEntry,

    #[error("invalid offset {0}")]
    InvalidOffset(usize),

    #[error("reference cycle detected resolving object {}.{}", .0.0, .0.1)]
    ReferenceCycle(ObjectId),

    #[error("reference chain exceeded maximum depth ({0})")]
    ReferenceDepthExceeded(usize),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    #[error("dictionary key {0:?} not found")]
    DictKeyNotFound(String),

    #[error("invalid stream: {0}")]
    InvalidStream(String),

    #[error("numeric cast failed: {0}")]
    NumericCast(String),

    #[error("missing required catalog entry {0}")]
    MissingCatalogEntry(&'static str),

    #[error("invalid page tree: {0}")]
    InvalidPageTree(String),

    #[error("decompressed stream exceeded the {0}-byte budget")]
    DecompressionBudgetExceeded(usize),

    #[error("decode deadline exceeded after {0:?}")]
    DecodeTimeout(std::time::Duration),

    #[error("parse deadline exceeded after {0:?}")]
    ParseTimeout(std::time::Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("unsupported encryption variant: {0}")]
    UnsupportedEncryption(String),

    #[error("metadata decryption forbidden by document permissions")]
    MetadataDecryptionForbidden,

    #[error("unimplemented: {0}")]
    Unimplemented(&'static str),
}

impl From<TryFromIntError> for Error {
    fn from(e: TryFromIntError) -> Self {
        Error::NumericCast(e.to_string())
    }
}

/// Structural-parse failure kinds (scanner, object loader).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed token at offset {0}")]
    MalformedToken(usize),

    #[error("unbalanced container")]
    UnbalancedContainer,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid indirect object header")]
    InvalidIndirectObject,

    #[error("invalid xref section")]
    InvalidXref,

    #[error("missing %%EOF marker")]
    MissingEof,

    #[error("string literal exceeded maximum nesting depth")]
    StringNestingTooDeep,

    #[error("container exceeded maximum depth")]
    MaxDepthExceeded,

    #[error("scanner limit exceeded: {0}")]
    LimitExceeded(&'static str),
}

/// Cross-reference specific failure kinds.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum XrefError {
    #[error("could not locate startxref / %%EOF")]
    Start,

    #[error("invalid /Prev offset")]
    PrevStart,

    #[error("invalid /XRefStm offset")]
    StreamStart,

    #[error("xref chain exceeded maximum depth ({0})")]
    ChainTooDeep(usize),

    #[error("xref stream has an invalid /W array")]
    InvalidWidths,

    #[error("no object headers found during tail salvage")]
    SalvageFailed,
}

/// Filter-pipeline failure kinds.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter {0:?}")]
    UnknownFilter(String),

    #[error("{filter} failed: {message}")]
    DecoderFailed { filter: &'static str, message: String },

    #[error("{0} predictor is not supported")]
    UnsupportedPredictor(i64),

    #[error("indirect filter parameter could not be resolved")]
    UnresolvedIndirectParam,
}

/// Security-handler failure kinds.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("incorrect password")]
    IncorrectPassword,

    #[error("unsupported security handler revision {0}")]
    UnsupportedRevision(i64),

    #[error("malformed encryption dictionary: {0}")]
    MalformedDictionary(&'static str),

    #[error("missing /ID in trailer")]
    MissingId,

    #[error("AES payload is not a multiple of the block size")]
    InvalidBlockLength,

    #[error("PKCS#5/7 unpadding failed")]
    UnpadFailed,
}

/// A byte offset plus optional object context, attached to every error the
/// recovery strategy is consulted about. Not an error itself: used as the
/// input to `RecoveryPolicy::decide` and retained in accumulated
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub object: Option<ObjectId>,
    pub component: Component,
}

impl Location {
    pub fn new(offset: usize, component: Component) -> Self {
        Location { offset, object: None, component }
    }

    pub fn with_object(mut self, id: ObjectId) -> Self {
        self.object = Some(id);
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object {
            Some((num, gen)) => write!(f, "{} @ offset {} (object {} {})", self.component, self.offset, num, gen),
            None => write!(f, "{} @ offset {}", self.component, self.offset),
        }
    }
}

/// Which component raised the recoverable condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Scanner,
    Xref,
    ObjectLoader,
    Decode,
    Semantic,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Component::Scanner => "scanner",
            Component::Xref => "xref",
            Component::ObjectLoader => "object loader",
            Component::Decode => "decode",
            Component::Semantic => "semantic builder",
        };
        f.write_str(s)
    }
}

/// A single recorded diagnostic: the location plus the error that would
/// have propagated had the recovery policy not intervened.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}
