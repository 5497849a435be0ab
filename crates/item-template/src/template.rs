//! `$NAME` template parsing and substitution.
//!
//! Supported syntax:
//! - `$NAME` - placeholder, where `NAME` matches `[_A-Za-z][_A-Za-z0-9]*`
//! - `${NAME}` - braced placeholder, for names directly followed by identifier characters
//! - `$$` - a literal `$`
//!
//! Any other use of `$` is an invalid placeholder and is rejected when the
//! template is parsed. Unknown names are only detected at substitution time,
//! since the set of available values belongs to the caller.

use crate::error::TemplateError;
use std::fs;
use std::path::Path;

/// Label used for templates that were not loaded from a file.
const INLINE_SOURCE: &str = "<inline>";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed item template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Load and parse a template from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut template = Self::parse(&text)?;
        template.source = path.display().to_string();
        Ok(template)
    }

    /// Parse a template from a string.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            if c != '$' {
                literal.push(c);
                continue;
            }

            match chars.peek().map(|&(_, next)| next) {
                Some('$') => {
                    chars.next();
                    literal.push('$');
                }
                Some('{') => {
                    chars.next();
                    let name = take_identifier(&mut chars);
                    match chars.next() {
                        Some((_, '}')) if !name.is_empty() => {
                            flush_literal(&mut literal, &mut segments);
                            segments.push(Segment::Placeholder(name));
                        }
                        _ => return Err(invalid_placeholder(text, offset)),
                    }
                }
                Some(next) if is_identifier_start(next) => {
                    let name = take_identifier(&mut chars);
                    flush_literal(&mut literal, &mut segments);
                    segments.push(Segment::Placeholder(name));
                }
                _ => return Err(invalid_placeholder(text, offset)),
            }
        }
        flush_literal(&mut literal, &mut segments);

        Ok(Self {
            source: INLINE_SOURCE.to_string(),
            segments,
        })
    }

    /// Where the template was loaded from (the file path, or `<inline>`).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of appearance, duplicates included.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder using `lookup`.
    ///
    /// Fails on the first placeholder for which `lookup` returns `None`.
    pub fn substitute<F>(&self, lookup: F) -> Result<String, TemplateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => {
                    let value = lookup(name)
                        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.clone()))?;
                    rendered.push_str(&value);
                }
            }
        }
        Ok(rendered)
    }
}

fn flush_literal(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_identifier_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

fn take_identifier<I>(chars: &mut std::iter::Peekable<I>) -> String
where
    I: Iterator<Item = (usize, char)>,
{
    let mut name = String::new();
    if let Some(&(_, c)) = chars.peek() {
        if !is_identifier_start(c) {
            return name;
        }
    }
    while let Some(&(_, c)) = chars.peek() {
        if !is_identifier_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

/// Build an `InvalidPlaceholder` error with a 1-based line and column for `offset`.
fn invalid_placeholder(text: &str, offset: usize) -> TemplateError {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = text[line_start..offset].chars().count() + 1;
    TemplateError::InvalidPlaceholder { line, column }
}
