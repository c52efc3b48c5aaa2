use std::sync::Mutex;

use crate::error::{Component, Diagnostic, Location};

/// The action a recovery strategy returns for a given malformed construct
/// (§4.1 "Recovery", §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Propagate the error to the caller; parsing of the current document
    /// stops.
    Fail,
    /// Swallow the error and attempt to produce the next token/entry.
    Skip,
    /// Synthesize a plausible continuation (closing brackets at EOF,
    /// partial string/stream content) rather than failing outright.
    Fix,
    /// Propagate the error but also record it via the accumulator.
    Warn,
}

/// A pluggable decision point consulted by the scanner, xref resolver,
/// object loader, and decode stage on every recoverable condition.
/// §4.9/§9: "a decision function, not a mechanism for unwinding" — callers
/// own the unwind; the strategy only classifies.
pub trait RecoveryPolicy: Send + Sync {
    fn decide(&self, location: Location, message: &str) -> Action;

    /// Diagnostics accumulated so far, if this policy tracks them. The
    /// built-in `Strict`/`Lenient` policies return an empty slice;
    /// `Accumulating` overrides this.
    fn diagnostics(&self) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Always fails. Used when the caller wants byte-exact conformance and no
/// silent repair.
#[derive(Debug, Default, Clone, Copy)]
pub struct Strict;

impl RecoveryPolicy for Strict {
    fn decide(&self, _location: Location, _message: &str) -> Action {
        Action::Fail
    }
}

/// Returns `Fix` for the categories spec.md §4.1/§4.3 call out as
/// recoverable (unclosed containers/strings/streams at EOF, a bad xref
/// section that can fall back to tail salvage), `Skip` for everything
/// else so the scanner/loader can keep making forward progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lenient;

impl Lenient {
    fn is_fixable(location: &Location) -> bool {
        matches!(location.component, Component::Scanner | Component::Xref)
    }
}

impl RecoveryPolicy for Lenient {
    fn decide(&self, location: Location, _message: &str) -> Action {
        if Self::is_fixable(&location) {
            Action::Fix
        } else {
            Action::Skip
        }
    }
}

/// Wraps another strategy and records every decision's location/message
/// for later retrieval, without altering what the wrapped strategy
/// returns (§4.9).
pub struct Accumulating<P> {
    inner: P,
    log: Mutex<Vec<Diagnostic>>,
}

impl<P: RecoveryPolicy> Accumulating<P> {
    pub fn new(inner: P) -> Self {
        Accumulating { inner, log: Mutex::new(Vec::new()) }
    }
}

impl<P: RecoveryPolicy> RecoveryPolicy for Accumulating<P> {
    fn decide(&self, location: Location, message: &str) -> Action {
        let action = self.inner.decide(location, message);
        let mut log = self.log.lock().expect("diagnostics mutex poisoned");
        log.push(Diagnostic { location, message: message.to_string() });
        action
    }

    fn diagnostics(&self) -> Vec<Diagnostic> {
        self.log.lock().expect("diagnostics mutex poisoned").clone()
    }
}

/// The three built-in strategies named in spec.md §4.9 and exposed as a
/// CLI-selectable option in §6 (`recovery = Strict|Lenient|Accumulating`).
/// `Accumulating` wraps `Lenient` by default, matching the common case of
/// "repair and tell me what you repaired".
pub enum RecoveryStrategy {
    Strict(Strict),
    Lenient(Lenient),
    Accumulating(Accumulating<Lenient>),
}

impl Default for RecoveryStrategy {
    fn default() -> Self {
        RecoveryStrategy::Lenient(Lenient)
    }
}

impl RecoveryPolicy for RecoveryStrategy {
    fn decide(&self, location: Location, message: &str) -> Action {
        match self {
            RecoveryStrategy::Strict(p) => p.decide(location, message),
            RecoveryStrategy::Lenient(p) => p.decide(location, message),
            RecoveryStrategy::Accumulating(p) => p.decide(location, message),
        }
    }

    fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            RecoveryStrategy::Strict(p) => p.diagnostics(),
            RecoveryStrategy::Lenient(p) => p.diagnostics(),
            RecoveryStrategy::Accumulating(p) => p.diagnostics(),
        }
    }
}

impl RecoveryStrategy {
    /// `true` for `Strict` (and an `Accumulating` wrapping it), meaning a
    /// component that hits a recoverable condition should propagate
    /// rather than fall back (§4.3 step 5, §7 "xref resolver: ... fall
    /// back to tail salvage when recovery ≠ Strict; otherwise propagate").
    pub fn is_strict(&self) -> bool {
        matches!(self, RecoveryStrategy::Strict(_))
    }

    /// A fresh instance of the same kind. `Accumulating`'s diagnostic log
    /// cannot be cloned (it lives behind a `Mutex`), so callers that need
    /// to pass a `RecoveryStrategy` by value without taking ownership of
    /// the original use this instead of `Clone`.
    pub fn same_kind(&self) -> RecoveryStrategy {
        match self {
            RecoveryStrategy::Strict(_) => RecoveryStrategy::Strict(Strict),
            RecoveryStrategy::Lenient(_) => RecoveryStrategy::Lenient(Lenient),
            RecoveryStrategy::Accumulating(_) => RecoveryStrategy::Accumulating(Accumulating::new(Lenient)),
        }
    }
}

impl std::fmt::Debug for RecoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecoveryStrategy::Strict(_) => "Strict",
            RecoveryStrategy::Lenient(_) => "Lenient",
            RecoveryStrategy::Accumulating(_) => "Accumulating",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::new(0, Component::Scanner)
    }

    #[test]
    fn strict_always_fails() {
        assert_eq!(Strict.decide(loc(), "x"), Action::Fail);
    }

    #[test]
    fn lenient_fixes_scanner_errors() {
        assert_eq!(Lenient.decide(loc(), "x"), Action::Fix);
        assert_eq!(Lenient.decide(Location::new(0, Component::Semantic), "x"), Action::Skip);
    }

    #[test]
    fn accumulating_records_without_changing_decision() {
        let policy = Accumulating::new(Lenient);
        assert_eq!(policy.decide(loc(), "boom"), Action::Fix);
        let diags = policy.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "boom");
    }
}
