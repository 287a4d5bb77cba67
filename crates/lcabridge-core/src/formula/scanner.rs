//! Balanced-parenthesis scanner for marker pseudo-calls
//!
//! Arguments of a marker call may themselves contain parentheses and quoted
//! text, so calls are located by tracking nesting depth rather than with a
//! single regular expression.
//!
//! Copyright (c) 2025 lcabridge Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};

/// One `Marker(args)` occurrence; offsets are byte offsets into the scanned text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerCall {
    pub start: usize,
    pub end: usize,
    pub args: Vec<String>,
}

/// Finds calls of one marker name, matched case-insensitively
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    marker: String,
}

impl MarkerScanner {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// All top-level calls of the marker in `text`, in order
    ///
    /// # Errors
    ///
    /// `FormulaSyntaxAmbiguity` when a call's parentheses or quotes never
    /// close.
    pub fn find_calls(&self, text: &str) -> Result<Vec<MarkerCall>> {
        let bytes = text.as_bytes();
        let mut calls = Vec::new();
        let mut quote: Option<u8> = None;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            if let Some(q) = quote {
                if b == q {
                    quote = None;
                }
                i += 1;
                continue;
            }
            if b == b'\'' || b == b'"' {
                quote = Some(b);
                i += 1;
                continue;
            }
            if let Some(open) = self.match_marker_at(text, i) {
                let call = self.read_call(text, i, open)?;
                i = call.end;
                calls.push(call);
                continue;
            }
            i += 1;
        }
        Ok(calls)
    }

    /// Byte offset of the opening parenthesis when the marker starts at `start`
    fn match_marker_at(&self, text: &str, start: usize) -> Option<usize> {
        let end = start + self.marker.len();
        if end > text.len() || !text.is_char_boundary(end) || !text.is_char_boundary(start) {
            return None;
        }
        if !text[start..end].eq_ignore_ascii_case(&self.marker) {
            return None;
        }
        let preceded_by_identifier = text[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
        if preceded_by_identifier {
            return None;
        }
        let rest = &text[end..];
        let offset = rest.len() - rest.trim_start().len();
        rest.trim_start()
            .starts_with('(')
            .then_some(end + offset)
    }

    fn read_call(&self, text: &str, start: usize, open: usize) -> Result<MarkerCall> {
        let bytes = text.as_bytes();
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut args = Vec::new();
        let mut arg_start = open + 1;

        for (i, &b) in bytes.iter().enumerate().skip(open) {
            if let Some(q) = quote {
                if b == q {
                    quote = None;
                }
                continue;
            }
            match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        args.push(text[arg_start..i].trim().to_string());
                        if args.len() == 1 && args[0].is_empty() {
                            args.clear();
                        }
                        return Ok(MarkerCall {
                            start,
                            end: i + 1,
                            args,
                        });
                    }
                }
                b',' if depth == 1 => {
                    args.push(text[arg_start..i].trim().to_string());
                    arg_start = i + 1;
                }
                _ => {}
            }
        }

        let message = if quote.is_some() {
            format!("unterminated quote in {} call", self.marker)
        } else {
            format!("unbalanced parentheses in {} call", self.marker)
        };
        Err(Error::formula_syntax(text, start, message))
    }
}

/// Strip one pair of matching quotes
pub fn unquote(arg: &str) -> &str {
    let arg = arg.trim();
    for q in ['\'', '"'] {
        if let Some(inner) = arg.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)) {
            return inner;
        }
    }
    arg
}
