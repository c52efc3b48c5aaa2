use crate::object::{Dictionary, Object, StringFormat};
use crate::xref::XrefEntry;

use super::number::{parse_number, NumberToken};
use super::{is_delimiter, is_regular, is_whitespace};

/// Default maximum array/dict nesting depth when a caller hasn't wired a
/// `ScanLimits` through (kept in sync with `ScanLimits::default`).
const DEFAULT_MAX_DEPTH: usize = 256;

/// A cursor over the document buffer used by every token-level parser.
/// Holds the whole buffer rather than a sub-slice so byte offsets
/// recorded for diagnostics are always absolute.
pub(crate) struct Cursor<'a> {
    pub(crate) buf: &'a [u8],
    pub(crate) pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8], pos: usize) -> Self {
        Cursor { buf, pos }
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.buf.get(self.pos + offset).copied()
    }

    pub(crate) fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    pub(crate) fn skip_ws_and_comments(&mut self) {
        loop {
            while self.peek().map(is_whitespace).unwrap_or(false) {
                self.pos += 1;
            }
            if self.peek() == Some(b'%') {
                while self.peek().map(|b| b != b'\r' && b != b'\n').unwrap_or(false) {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    pub(crate) fn consume_keyword(&mut self, keyword: &[u8]) -> bool {
        if self.buf[self.pos..].starts_with(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    pub(crate) fn read_number(&mut self) -> Option<(usize, NumberToken)> {
        let start = self.pos;
        let (rest, tok) = parse_number(&self.buf[self.pos..]).ok()?;
        self.pos = self.buf.len() - rest.len();
        Some((start, tok))
    }

    fn read_regular_run(&mut self) -> &'a [u8] {
        let start = self.pos;
        while self.peek().map(is_regular).unwrap_or(false) {
            self.pos += 1;
        }
        &self.buf[start..self.pos]
    }

    /// `/Name` with `#HH` hex escapes resolved (§4.1 "Name").
    fn read_name(&mut self) -> Option<Vec<u8>> {
        if self.advance()? != b'/' {
            return None;
        }
        let mut out = Vec::new();
        loop {
            match self.peek() {
                Some(b'#') if self.peek_at(1).map(|b| b.is_ascii_hexdigit()).unwrap_or(false)
                    && self.peek_at(2).map(|b| b.is_ascii_hexdigit()).unwrap_or(false) =>
                {
                    let hi = (self.peek_at(1).unwrap() as char).to_digit(16).unwrap() as u8;
                    let lo = (self.peek_at(2).unwrap() as char).to_digit(16).unwrap() as u8;
                    out.push((hi << 4) | lo);
                    self.pos += 3;
                }
                Some(b) if is_regular(b) => {
                    out.push(b);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        Some(out)
    }

    /// `( ... )` literal string: balanced parens, the recognized escapes,
    /// octal byte escapes, and backslash line continuations (§4.1).
    fn read_literal_string(&mut self) -> Option<Vec<u8>> {
        if self.advance()? != b'(' {
            return None;
        }
        let mut out = Vec::new();
        let mut depth = 1usize;

        while depth > 0 {
            let b = self.advance()?;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth > 0 {
                        out.push(b);
                    }
                }
                b'\\' => match self.peek() {
                    Some(b'n') => {
                        out.push(b'\n');
                        self.pos += 1;
                    }
                    Some(b'r') => {
                        out.push(b'\r');
                        self.pos += 1;
                    }
                    Some(b't') => {
                        out.push(b'\t');
                        self.pos += 1;
                    }
                    Some(8) | Some(b'b') => {
                        out.push(0x08);
                        self.pos += 1;
                    }
                    Some(0x0C) | Some(b'f') => {
                        out.push(0x0C);
                        self.pos += 1;
                    }
                    Some(b'(') => {
                        out.push(b'(');
                        self.pos += 1;
                    }
                    Some(b')') => {
                        out.push(b')');
                        self.pos += 1;
                    }
                    Some(b'\\') => {
                        out.push(b'\\');
                        self.pos += 1;
                    }
                    Some(b'\r') => {
                        self.pos += 1;
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\n') => {
                        self.pos += 1;
                    }
                    Some(d) if d.is_ascii_digit() && d < b'8' => {
                        let mut value = 0u32;
                        let mut consumed = 0;
                        while consumed < 3 {
                            match self.peek() {
                                Some(d) if d.is_ascii_digit() && d < b'8' => {
                                    value = value * 8 + (d - b'0') as u32;
                                    self.pos += 1;
                                    consumed += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((value & 0xFF) as u8);
                    }
                    Some(other) => {
                        out.push(other);
                        self.pos += 1;
                    }
                    None => break,
                },
                other => out.push(other),
            }
        }
        Some(out)
    }

    /// `< ... >` hex string: whitespace between nibbles is ignored, a
    /// trailing odd nibble is padded with `0` (§4.1).
    fn read_hex_string(&mut self) -> Option<Vec<u8>> {
        if self.advance()? != b'<' {
            return None;
        }
        let mut nibbles = Vec::new();
        loop {
            match self.advance()? {
                b'>' => break,
                b if b.is_ascii_hexdigit() => nibbles.push((b as char).to_digit(16).unwrap() as u8),
                b if is_whitespace(b) => continue,
                _ => return None,
            }
        }
        if nibbles.len() % 2 == 1 {
            nibbles.push(0);
        }
        Some(nibbles.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect())
    }

    fn read_array(&mut self, depth: usize) -> Option<Object> {
        if self.advance()? != b'[' {
            return None;
        }
        if depth >= DEFAULT_MAX_DEPTH {
            return None;
        }
        let mut items = Vec::new();
        loop {
            self.skip_ws_and_comments();
            if self.peek() == Some(b']') {
                self.pos += 1;
                break;
            }
            if self.peek().is_none() {
                // EOF-fix: synthesize the closing bracket (§4.1 Fix action).
                break;
            }
            items.push(self.read_object(depth + 1)?);
        }
        Some(Object::Array(items))
    }

    fn read_dict_or_stream(&mut self, depth: usize) -> Option<Object> {
        if !(self.peek() == Some(b'<') && self.peek_at(1) == Some(b'<')) {
            return None;
        }
        self.pos += 2;
        if depth >= DEFAULT_MAX_DEPTH {
            return None;
        }
        let mut dict = Dictionary::new();
        loop {
            self.skip_ws_and_comments();
            if self.peek() == Some(b'>') && self.peek_at(1) == Some(b'>') {
                self.pos += 2;
                break;
            }
            if self.peek().is_none() {
                // EOF-fix: synthesize the closing `>>` (§4.1 Fix action).
                break;
            }
            let key = self.read_name()?;
            self.skip_ws_and_comments();
            let value = self.read_object(depth + 1)?;
            dict.set(key, value);
        }
        Some(Object::Dictionary(dict))
    }

    /// Reads one direct object at the current position, including the
    /// lookahead that distinguishes a plain integer from the first
    /// element of an `N G R` indirect-reference triple (§4.1).
    pub(crate) fn read_object(&mut self, depth: usize) -> Option<Object> {
        self.skip_ws_and_comments();
        match self.peek()? {
            b'/' => Some(Object::Name(self.read_name()?)),
            b'(' => Some(Object::string_literal(self.read_literal_string()?)),
            b'<' if self.peek_at(1) == Some(b'<') => self.read_dict_or_stream(depth),
            b'<' => Some(Object::String(self.read_hex_string()?, StringFormat::Hexadecimal)),
            b'[' => self.read_array(depth),
            b']' | b'>' | b')' | b'}' => None,
            b't' if self.buf[self.pos..].starts_with(b"true") => {
                self.pos += 4;
                Some(Object::Boolean(true))
            }
            b'f' if self.buf[self.pos..].starts_with(b"false") => {
                self.pos += 5;
                Some(Object::Boolean(false))
            }
            b'n' if self.buf[self.pos..].starts_with(b"null") => {
                self.pos += 4;
                Some(Object::Null)
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number_or_reference(),
            _ => {
                // Unrecognized keyword token: consume it so callers can
                // keep scanning (Skip-equivalent at the token level).
                let run = self.read_regular_run();
                if run.is_empty() {
                    self.pos += 1;
                }
                None
            }
        }
    }

    fn read_number_or_reference(&mut self) -> Option<Object> {
        let checkpoint = self.pos;
        let (_, first) = self.read_number()?;

        if let NumberToken::Integer(num) = first {
            let after_first = self.pos;
            self.skip_ws_and_comments();
            if let Some((_, NumberToken::Integer(gen))) = self.read_number() {
                let after_second = self.pos;
                self.skip_ws_and_comments();
                if self.peek() == Some(b'R') && !self.peek_at(1).map(is_regular).unwrap_or(false) {
                    self.pos += 1;
                    return Some(Object::Reference((num as u32, gen as u16)));
                }
                // Not a reference after all: rewind to just after the
                // first number (§4.1 "the scanner rewinds").
                self.pos = after_first;
                let _ = after_second;
                return Some(Object::Integer(num));
            }
            self.pos = after_first;
            return Some(Object::Integer(num));
        }

        self.pos = checkpoint;
        let (_, tok) = self.read_number()?;
        Some(match tok {
            NumberToken::Integer(n) => Object::Integer(n),
            NumberToken::Real(f) => Object::Real(f),
        })
    }

    /// A classical 20-byte xref table row: `nnnnnnnnnn ggggg n/f eol`.
    pub(crate) fn read_classical_xref_row(&mut self) -> Option<XrefEntry> {
        self.skip_ws_and_comments();
        let (_, offset_tok) = self.read_number()?;
        self.skip_ws_and_comments();
        let (_, gen_tok) = self.read_number()?;
        self.skip_ws_and_comments();
        let kind = self.advance()?;
        match kind {
            b'n' => Some(XrefEntry::Normal {
                offset: offset_tok.as_i64()? as u32,
                generation: gen_tok.as_i64()? as u16,
            }),
            b'f' => Some(XrefEntry::Free { next_free: offset_tok.as_i64()? as u32 }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(bytes: &[u8]) -> Object {
        let mut c = Cursor::new(bytes, 0);
        c.read_object(0).unwrap()
    }

    #[test]
    fn literal_string_escapes() {
        let o = obj(b"(He said \\(hi\\)\\n)");
        assert_eq!(o.as_string().unwrap(), b"He said (hi)\n");
    }

    #[test]
    fn literal_string_octal_escape() {
        let o = obj(b"(\\101\\102)");
        assert_eq!(o.as_string().unwrap(), b"AB");
    }

    #[test]
    fn literal_string_line_continuation_drops_newline() {
        let o = obj(b"(line1\\\nline2)");
        assert_eq!(o.as_string().unwrap(), b"line1line2");
    }

    #[test]
    fn hex_string_pads_odd_nibble() {
        let o = obj(b"<4>");
        assert_eq!(o.as_string().unwrap(), vec![0x40]);
    }

    #[test]
    fn hex_string_ignores_whitespace() {
        let o = obj(b"<48 65 6c 6c 6f>");
        assert_eq!(o.as_string().unwrap(), b"Hello");
    }

    #[test]
    fn name_resolves_hex_escapes() {
        let o = obj(b"/A#42C");
        assert_eq!(o.as_name().unwrap(), b"ABC");
    }

    #[test]
    fn reference_triple_becomes_single_token() {
        let o = obj(b"7 0 R");
        assert_eq!(o.as_reference().unwrap(), (7, 0));
    }

    #[test]
    fn two_numbers_without_r_rewind_to_first() {
        let mut c = Cursor::new(b"7 0 obj", 0);
        let o = c.read_object(0).unwrap();
        assert_eq!(o.as_i64().unwrap(), 7);
        // cursor left positioned right after the first number, ready for
        // the caller (indirect_object) to re-read "0 obj".
        assert_eq!(&c.buf[c.pos..], b" 0 obj");
    }

    #[test]
    fn array_of_mixed_types() {
        let o = obj(b"[1 2.5 /Foo (bar) true null]");
        let arr = o.as_array().unwrap();
        assert_eq!(arr.len(), 5);
        assert_eq!(arr[0].as_i64().unwrap(), 1);
        assert_eq!(arr[4], Object::Null);
    }
}
