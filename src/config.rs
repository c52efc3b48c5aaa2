use std::time::Duration;

use crate::recovery::RecoveryStrategy;

/// Scanner-level size/depth caps (§4.1 "Limits"). `0` disables the check,
/// matching the spec's "all optional, 0 = disabled" wording.
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    pub max_string_length: usize,
    pub max_array_depth: usize,
    pub max_dict_depth: usize,
    pub max_stream_payload: usize,
    pub max_stream_scan_window: usize,
    pub max_inline_image_length: usize,
    pub max_name_length: usize,
    pub max_number_text_length: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        ScanLimits {
            max_string_length: 0,
            max_array_depth: 256,
            max_dict_depth: 256,
            max_stream_payload: 0,
            max_stream_scan_window: 0,
            max_inline_image_length: 0,
            max_name_length: 0,
            max_number_text_length: 0,
        }
    }
}

/// Resource/time budgets spanning the xref resolver, object loader, and
/// decode stage (§5, §6's option table, §8 invariant 5).
#[derive(Debug, Clone, Copy)]
pub struct ResourceBudget {
    pub max_decompressed_size: usize,
    pub max_decode_time: Duration,
    pub max_parse_time: Duration,
    pub max_indirect_depth: usize,
    pub max_xref_chain: usize,
    pub max_array_size: usize,
    pub max_dict_size: usize,
}

impl Default for ResourceBudget {
    fn default() -> Self {
        ResourceBudget {
            max_decompressed_size: 100 * 1024 * 1024,
            max_decode_time: Duration::from_secs(30),
            max_parse_time: Duration::from_secs(5 * 60),
            max_indirect_depth: 100,
            max_xref_chain: 50,
            max_array_size: 0,
            max_dict_size: 0,
        }
    }
}

/// Four spans a `Tracer` may be asked to emit, one per pipeline stage plus
/// the wrapping `parse` span (§6's option table entry for `tracer`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    RawParse,
    Decode,
    SemanticBuild,
    Parse,
}

impl Span {
    pub fn name(&self) -> &'static str {
        match self {
            Span::RawParse => "raw_parse",
            Span::Decode => "decode",
            Span::SemanticBuild => "semantic_build",
            Span::Parse => "parse",
        }
    }
}

/// An opaque guard returned by `Tracer::enter`; dropping it ends the span.
/// The no-op tracer's guard does nothing.
pub trait SpanGuard {}
impl SpanGuard for () {}

/// Optional span-emitting hook (§6). The default `NullTracer` observes
/// nothing; callers that want timing/structured-logging integration
/// implement this trait over their own tracing stack (e.g. the `tracing`
/// crate's spans, or a metrics counter).
pub trait Tracer: Send + Sync {
    fn enter(&self, span: Span) -> Box<dyn SpanGuard>;
}

#[derive(Default)]
pub struct NullTracer;

impl Tracer for NullTracer {
    fn enter(&self, _span: Span) -> Box<dyn SpanGuard> {
        Box::new(())
    }
}

/// A tracer that forwards each span enter/exit to the `log` facade at
/// `debug` level; useful as a zero-dependency default beyond `NullTracer`
/// when a caller wants *some* visibility without wiring up `tracing`.
pub struct LoggingTracer;

struct LogGuard(&'static str);
impl SpanGuard for LogGuard {}
impl Drop for LogGuard {
    fn drop(&mut self) {
        log::debug!("exiting span {}", self.0);
    }
}

impl Tracer for LoggingTracer {
    fn enter(&self, span: Span) -> Box<dyn SpanGuard> {
        log::debug!("entering span {}", span.name());
        Box::new(LogGuard(span.name()))
    }
}

/// Degree of parallelism for the Decode stage (§4.6, §5).
#[derive(Debug, Clone, Copy)]
pub enum DecodeParallelism {
    /// `min(hardware-concurrency, configured-limit)`, the spec's default.
    HardwareConcurrency,
    Fixed(usize),
}

impl DecodeParallelism {
    pub fn worker_count(&self) -> usize {
        match self {
            DecodeParallelism::HardwareConcurrency => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            DecodeParallelism::Fixed(n) => (*n).max(1),
        }
    }
}

impl Default for DecodeParallelism {
    fn default() -> Self {
        DecodeParallelism::HardwareConcurrency
    }
}

/// The full set of recognized CLI/front-end options from spec.md §6's
/// table — no other options are honored by the core.
pub struct ParserConfig {
    pub password: Option<String>,
    pub recovery: RecoveryStrategy,
    pub budget: ResourceBudget,
    pub limits: ScanLimits,
    pub decode_parallelism: DecodeParallelism,
    pub tracer: Box<dyn Tracer>,
}

impl std::fmt::Debug for ParserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserConfig")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("recovery", &self.recovery)
            .field("budget", &self.budget)
            .field("limits", &self.limits)
            .field("decode_parallelism", &self.decode_parallelism)
            .finish()
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            password: None,
            recovery: RecoveryStrategy::default(),
            budget: ResourceBudget::default(),
            limits: ScanLimits::default(),
            decode_parallelism: DecodeParallelism::default(),
            tracer: Box::new(NullTracer),
        }
    }
}
