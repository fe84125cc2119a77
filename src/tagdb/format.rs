//! # The Format Mini-Language
//!
//! Renders database entries through a small template language, one line per
//! requested entry:
//!
//! - `%id(WIDTH, "FILL")`: the entry's id, right-aligned to WIDTH with FILL
//!   (defaults 0 and `"0"`). With `use_real_ids` the id is the requested
//!   database index, otherwise the 0-based position in the request list.
//! - `%data(WIDTH, "FILL")`: the entry text wrapped in literal double
//!   quotes, left-aligned (defaults 0 and `" "`).
//! - `%tags("SEP")`: the entry's tags joined by SEP, in stored order.
//! - `%attrs("SEP1", "SEP2")`: `key SEP1 value` pairs joined by SEP2, in
//!   insertion order.
//!
//! Templates are parsed once into a segment list and rendered once per
//! entry. Parsing never fails: text that doesn't form a well-formed macro
//! stays literal. Each macro kind binds to its FIRST well-formed occurrence;
//! every occurrence of that exact text is substituted, while a same-kind
//! occurrence spelled differently (say `%id(4)` after `%id(3)`) stays
//! literal. FILL must be exactly one character; an empty FILL keeps the
//! default.

use crate::error::Result;
use crate::model::Document;

/// Used when the caller supplies no template.
pub const DEFAULT_FORMAT: &str = r#"[%id(3)] "%data()" (%tags(", ")) (%attrs(": ","; "))"#;

#[derive(Debug, Clone, PartialEq)]
enum Macro {
    Id { width: usize, fill: char },
    Data { width: usize, fill: char },
    Tags { sep: String },
    Attrs { key_sep: String, pair_sep: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MacroKind {
    Id,
    Data,
    Tags,
    Attrs,
}

impl MacroKind {
    const ALL: [MacroKind; 4] = [MacroKind::Id, MacroKind::Data, MacroKind::Tags, MacroKind::Attrs];

    fn prefix(self) -> &'static str {
        match self {
            MacroKind::Id => "%id(",
            MacroKind::Data => "%data(",
            MacroKind::Tags => "%tags(",
            MacroKind::Attrs => "%attrs(",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Macro(Macro),
}

/// A parsed format template, ready to render any number of entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string. Never fails; malformed macros pass through
    /// as literal text.
    pub fn parse(input: &str) -> Template {
        // Bind each macro kind to its first well-formed occurrence.
        let mut bound: Vec<(String, Macro)> = Vec::new();
        for kind in MacroKind::ALL {
            if let Some((raw, mac)) = find_first(input, kind) {
                bound.push((raw, mac));
            }
        }

        // Split the template wherever a bound spelling occurs.
        let mut segments = Vec::new();
        let mut rest = input;
        loop {
            let hit = bound
                .iter()
                .filter_map(|(raw, mac)| rest.find(raw.as_str()).map(|pos| (pos, raw, mac)))
                .min_by_key(|(pos, raw, _)| (*pos, std::cmp::Reverse(raw.len())));
            match hit {
                Some((pos, raw, mac)) => {
                    if pos > 0 {
                        segments.push(Segment::Literal(rest[..pos].to_string()));
                    }
                    segments.push(Segment::Macro(mac.clone()));
                    rest = &rest[pos + raw.len()..];
                }
                None => {
                    if !rest.is_empty() {
                        segments.push(Segment::Literal(rest.to_string()));
                    }
                    break;
                }
            }
        }
        Template { segments }
    }

    /// Render one line per requested id, joined by newline.
    ///
    /// Ids resolve with negative-index semantics; an id that doesn't resolve
    /// fails with `IndexOutOfRange` naming the offending value. The `%id`
    /// substitution embeds the raw requested id when `use_real_ids` is set,
    /// otherwise the position within `ids` counting from 0.
    pub fn render(&self, doc: &Document, ids: &[i64], use_real_ids: bool) -> Result<String> {
        let mut lines = Vec::with_capacity(ids.len());
        for (position, &id) in ids.iter().enumerate() {
            let entry = doc.entry_at(id)?;
            let mut line = String::new();
            for segment in &self.segments {
                match segment {
                    Segment::Literal(text) => line.push_str(text),
                    Segment::Macro(Macro::Id { width, fill }) => {
                        let shown = if use_real_ids { id } else { position as i64 };
                        line.push_str(&pad_start(&shown.to_string(), *width, *fill));
                    }
                    Segment::Macro(Macro::Data { width, fill }) => {
                        let quoted = format!("\"{}\"", entry.text);
                        line.push_str(&pad_end(&quoted, *width, *fill));
                    }
                    Segment::Macro(Macro::Tags { sep }) => {
                        line.push_str(&entry.tags.join(sep));
                    }
                    Segment::Macro(Macro::Attrs { key_sep, pair_sep }) => {
                        let pairs: Vec<String> = entry
                            .attrs
                            .iter()
                            .map(|(key, value)| format!("{}{}{}", key, key_sep, value))
                            .collect();
                        line.push_str(&pairs.join(pair_sep));
                    }
                }
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}

/// Scan for the first well-formed occurrence of `kind`, returning its exact
/// spelling and parsed form.
fn find_first(input: &str, kind: MacroKind) -> Option<(String, Macro)> {
    let prefix = kind.prefix();
    for (i, _) in input.char_indices() {
        if input[i..].starts_with(prefix) {
            if let Some((mac, len)) = parse_macro(&input[i..], kind) {
                return Some((input[i..i + len].to_string(), mac));
            }
        }
    }
    None
}

/// Try to parse one macro of `kind` at the start of `s`. Returns the macro
/// and the number of bytes it spans.
fn parse_macro(s: &str, kind: MacroKind) -> Option<(Macro, usize)> {
    let mut cur = Cursor::new(s);
    cur.eat(kind.prefix())?;
    let mac = match kind {
        MacroKind::Id => {
            let (width, fill) = parse_width_and_fill(&mut cur, '0')?;
            Macro::Id { width, fill }
        }
        MacroKind::Data => {
            let (width, fill) = parse_width_and_fill(&mut cur, ' ')?;
            Macro::Data { width, fill }
        }
        MacroKind::Tags => {
            let sep = cur.eat_quoted()?.to_string();
            Macro::Tags { sep }
        }
        MacroKind::Attrs => {
            let key_sep = cur.eat_quoted()?.to_string();
            cur.eat(",")?;
            cur.eat_whitespace();
            let pair_sep = cur.eat_quoted()?.to_string();
            Macro::Attrs { key_sep, pair_sep }
        }
    };
    cur.eat(")")?;
    Some((mac, cur.consumed))
}

/// `WIDTH` then an optional `, "FILL"`. An absent or empty fill keeps
/// `default_fill`; anything longer than one character disqualifies the
/// candidate.
fn parse_width_and_fill(cur: &mut Cursor, default_fill: char) -> Option<(usize, char)> {
    let digits = cur.eat_digits();
    let width = if digits.is_empty() {
        0
    } else {
        digits.parse().ok()?
    };
    let mut fill = default_fill;
    if cur.eat(",").is_some() {
        cur.eat_whitespace();
        let quoted = cur.eat_quoted()?;
        let mut chars = quoted.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {}
            (Some(c), None) => fill = c,
            _ => return None,
        }
    }
    Some((width, fill))
}

struct Cursor<'a> {
    rest: &'a str,
    consumed: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s, consumed: 0 }
    }

    fn eat(&mut self, token: &str) -> Option<()> {
        if self.rest.starts_with(token) {
            self.advance(token.len());
            Some(())
        } else {
            None
        }
    }

    fn eat_digits(&mut self) -> &'a str {
        let rest = self.rest;
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        self.advance(end);
        &rest[..end]
    }

    fn eat_whitespace(&mut self) {
        let end = self
            .rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(self.rest.len());
        self.advance(end);
    }

    /// A double-quoted span; the content may be empty but not contain `"`.
    fn eat_quoted(&mut self) -> Option<&'a str> {
        self.eat("\"")?;
        let rest = self.rest;
        let end = rest.find('"')?;
        self.advance(end + 1);
        Some(&rest[..end])
    }

    fn advance(&mut self, bytes: usize) {
        self.rest = &self.rest[bytes..];
        self.consumed += bytes;
    }
}

fn pad_start(value: &str, width: usize, fill: char) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let mut out = String::with_capacity(width);
    for _ in 0..width - len {
        out.push(fill);
    }
    out.push_str(value);
    out
}

fn pad_end(value: &str, width: usize, fill: char) -> String {
    let len = value.chars().count();
    let mut out = String::from(value);
    for _ in 0..width.saturating_sub(len) {
        out.push(fill);
    }
    out
}
