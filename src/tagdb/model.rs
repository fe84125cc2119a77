//! # Domain Model: Documents, Entries and Attribute Values
//!
//! A [`Document`] is the whole persisted unit for one database: the allowed-tag
//! vocabulary, two behavior flags, the ordered entry list, and the format
//! version of the writer. An [`Entry`] is one record: free text, an ordered tag
//! set, and an ordered attribute map of scalar [`AttrValue`]s.
//!
//! ## Ordering Contract
//!
//! The source of truth for both tags and attributes is **insertion order**:
//!
//! - Tags behave as a set (duplicates are dropped, first occurrence wins) but
//!   iterate in the order they were supplied. `%tags` rendering depends on
//!   this, so the order is part of the format contract, not an accident.
//! - Attributes iterate in insertion order; writing an existing key replaces
//!   the value in place without moving the key.
//!
//! ## Wire Format
//!
//! Entries serialize as 3-element arrays (`[text, [tags...], {attrs...}]`) and
//! attribute values as plain JSON scalars, so database files stay readable and
//! diffable. Anything outside the four scalar kinds fails deserialization.

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{Result, TagdbError};

/// The document format version this build writes.
pub const FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A scalar attribute value: string, integer, float or boolean.
///
/// This is a closed union; attribute values are never nested JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl AttrValue {
    /// Coerce a raw input string into a value.
    ///
    /// Trial order is fixed: integer, else float, else boolean literal
    /// (`true`/`false`, any case), else string.
    pub fn parse(input: &str) -> Self {
        if let Ok(n) = input.parse::<i64>() {
            return AttrValue::Int(n);
        }
        if let Ok(f) = input.parse::<f64>() {
            return AttrValue::Float(f);
        }
        if input.eq_ignore_ascii_case("true") {
            AttrValue::Bool(true)
        } else if input.eq_ignore_ascii_case("false") {
            AttrValue::Bool(false)
        } else {
            AttrValue::Str(input.to_string())
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{}", s),
            AttrValue::Int(n) => write!(f, "{}", n),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            AttrValue::Str(s) => serializer.serialize_str(s),
            AttrValue::Int(n) => serializer.serialize_i64(*n),
            AttrValue::Float(x) => serializer.serialize_f64(*x),
            AttrValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

struct AttrValueVisitor;

impl<'de> Visitor<'de> for AttrValueVisitor {
    type Value = AttrValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string, integer, float or boolean")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<AttrValue, E> {
        Ok(AttrValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<AttrValue, E> {
        Ok(AttrValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<AttrValue, E> {
        i64::try_from(v)
            .map(AttrValue::Int)
            .map_err(|_| E::custom(format!("integer attribute {} is out of range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<AttrValue, E> {
        Ok(AttrValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<AttrValue, E> {
        Ok(AttrValue::Str(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<AttrValue, E> {
        Ok(AttrValue::Str(v))
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(AttrValueVisitor)
    }
}

/// An insertion-ordered attribute map.
///
/// Backed by a plain `Vec` so iteration order matches the order keys were
/// first written, which is what `%attrs` rendering relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs(Vec<(String, AttrValue)>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Replacing keeps the key's original position.
    pub fn insert(&mut self, key: String, value: AttrValue) {
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, AttrValue)> for Attrs {
    fn from_iter<T: IntoIterator<Item = (String, AttrValue)>>(iter: T) -> Self {
        let mut attrs = Attrs::new();
        for (key, value) in iter {
            attrs.insert(key, value);
        }
        attrs
    }
}

impl Serialize for Attrs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct AttrsVisitor;

impl<'de> Visitor<'de> for AttrsVisitor {
    type Value = Attrs;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object of scalar attribute values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Attrs, A::Error> {
        let mut attrs = Attrs::new();
        while let Some((key, value)) = map.next_entry::<String, AttrValue>()? {
            attrs.insert(key, value);
        }
        Ok(attrs)
    }
}

impl<'de> Deserialize<'de> for Attrs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(AttrsVisitor)
    }
}

/// One record: free text, an ordered tag set and ordered attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub text: String,
    pub tags: Vec<String>,
    pub attrs: Attrs,
}

impl Entry {
    /// Build an entry, dropping duplicate tags (first occurrence wins).
    pub fn new(text: String, tags: impl IntoIterator<Item = String>, attrs: Attrs) -> Self {
        Self {
            text,
            tags: dedup_preserving_order(tags),
            attrs,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.text)?;
        seq.serialize_element(&self.tags)?;
        seq.serialize_element(&self.attrs)?;
        seq.end()
    }
}

struct EntryVisitor;

impl<'de> Visitor<'de> for EntryVisitor {
    type Value = Entry;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a [text, tags, attributes] triple")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Entry, A::Error> {
        let text: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let tags: Vec<String> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let attrs: Attrs = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;
        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(4, &self));
        }
        Ok(Entry::new(text, tags, attrs))
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_seq(EntryVisitor)
    }
}

/// The whole persisted unit for one database.
///
/// Indices into `entries` are positional: deleting index 2 makes the former
/// index 3 the new index 2. They are not stable identifiers across mutations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The allowed-tag vocabulary (insertion-ordered set). Only consulted
    /// while `enforce_tags` is on; existing entries are never re-validated.
    pub tags: Vec<String>,
    pub enforce_tags: bool,
    pub backups_enabled: bool,
    #[serde(rename = "data")]
    pub entries: Vec<Entry>,
    pub version: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document at the current format version.
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            enforce_tags: false,
            backups_enabled: false,
            entries: Vec::new(),
            version: FORMAT_VERSION.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add tags to the vocabulary. Duplicates are silently ignored.
    pub fn add_tags(&mut self, tags: impl IntoIterator<Item = String>) {
        for tag in tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }

    /// Remove tags from the vocabulary. Tags not present are silently ignored.
    pub fn remove_tags(&mut self, tags: &[String]) {
        self.tags.retain(|t| !tags.contains(t));
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    /// Append an entry.
    ///
    /// With enforcement on, every supplied tag is checked against the
    /// vocabulary before anything is mutated: either the whole entry is
    /// appended or none of it is.
    pub fn set_entry(
        &mut self,
        text: String,
        tags: Vec<String>,
        attrs: Attrs,
    ) -> Result<()> {
        self.check_enforcement(&tags)?;
        self.entries.push(Entry::new(text, tags, attrs));
        Ok(())
    }

    /// Remove the entry at `index`. Negative indices count from the end
    /// (`-1` is the last entry). Returns the removed entry.
    pub fn unset_entry(&mut self, index: i64) -> Result<Entry> {
        let at = self.resolve_index(index)?;
        Ok(self.entries.remove(at))
    }

    /// Replace only the supplied fields of the entry at `index`; fields left
    /// as `None` keep their previous value. Newly supplied tags go through
    /// the same enforcement check as [`Document::set_entry`].
    pub fn edit_entry(
        &mut self,
        index: i64,
        text: Option<String>,
        tags: Option<Vec<String>>,
        attrs: Option<Attrs>,
    ) -> Result<()> {
        let at = self.resolve_index(index)?;
        if let Some(new_tags) = &tags {
            self.check_enforcement(new_tags)?;
        }
        let entry = &mut self.entries[at];
        if let Some(new_text) = text {
            entry.text = new_text;
        }
        if let Some(new_tags) = tags {
            entry.tags = dedup_preserving_order(new_tags);
        }
        if let Some(new_attrs) = attrs {
            entry.attrs = new_attrs;
        }
        Ok(())
    }

    /// The entry at `index`, with negative-index semantics.
    pub fn entry_at(&self, index: i64) -> Result<&Entry> {
        let at = self.resolve_index(index)?;
        Ok(&self.entries[at])
    }

    /// Every index whose entry's tag set is a superset of `filter`, in
    /// ascending entry order. An empty filter matches everything.
    pub fn query(&self, filter: &[String]) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| filter.iter().all(|tag| entry.has_tag(tag)))
            .map(|(i, _)| i)
            .collect()
    }

    /// The first index whose text equals `text` (or contains it, with
    /// `substring_match`), optionally comparing case-insensitively.
    pub fn find_first(
        &self,
        text: &str,
        substring_match: bool,
        case_insensitive: bool,
    ) -> Result<usize> {
        let needle = if case_insensitive {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        for (i, entry) in self.entries.iter().enumerate() {
            let haystack = if case_insensitive {
                entry.text.to_lowercase()
            } else {
                entry.text.clone()
            };
            let hit = if substring_match {
                haystack.contains(&needle)
            } else {
                haystack == needle
            };
            if hit {
                return Ok(i);
            }
        }
        Err(TagdbError::NoMatch(text.to_string()))
    }

    /// The serialized size of the document, as stored on disk.
    pub fn byte_size(&self) -> Result<usize> {
        Ok(serde_json::to_string(self)?.len())
    }

    pub(crate) fn resolve_index(&self, index: i64) -> Result<usize> {
        let len = self.entries.len() as i64;
        let resolved = if index < 0 { len + index } else { index };
        if resolved < 0 || resolved >= len {
            return Err(TagdbError::IndexOutOfRange(index));
        }
        Ok(resolved as usize)
    }

    fn check_enforcement(&self, tags: &[String]) -> Result<()> {
        if !self.enforce_tags {
            return Ok(());
        }
        let mut unknown = Vec::new();
        for tag in tags {
            if !self.tags.contains(tag) && !unknown.contains(tag) {
                unknown.push(tag.clone());
            }
        }
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(TagdbError::TagsNotAllowed(unknown))
        }
    }
}

fn dedup_preserving_order(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out = Vec::new();
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // --- AttrValue coercion ---

    #[test]
    fn test_parse_integer_first() {
        assert_eq!(AttrValue::parse("42"), AttrValue::Int(42));
        assert_eq!(AttrValue::parse("-7"), AttrValue::Int(-7));
        assert_eq!(AttrValue::parse("0"), AttrValue::Int(0));
    }

    #[test]
    fn test_parse_float_second() {
        assert_eq!(AttrValue::parse("3.14"), AttrValue::Float(3.14));
        assert_eq!(AttrValue::parse("1e3"), AttrValue::Float(1000.0));
        assert_eq!(AttrValue::parse("-0.5"), AttrValue::Float(-0.5));
    }

    #[test]
    fn test_parse_boolean_third() {
        assert_eq!(AttrValue::parse("true"), AttrValue::Bool(true));
        assert_eq!(AttrValue::parse("False"), AttrValue::Bool(false));
        assert_eq!(AttrValue::parse("TRUE"), AttrValue::Bool(true));
    }

    #[test]
    fn test_parse_string_last() {
        assert_eq!(AttrValue::parse("hello"), AttrValue::Str("hello".into()));
        assert_eq!(AttrValue::parse("12abc"), AttrValue::Str("12abc".into()));
        assert_eq!(AttrValue::parse(""), AttrValue::Str("".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(AttrValue::Int(42).to_string(), "42");
        assert_eq!(AttrValue::Float(3.5).to_string(), "3.5");
        assert_eq!(AttrValue::Bool(true).to_string(), "true");
        assert_eq!(AttrValue::Str("x y".into()).to_string(), "x y");
    }

    // --- Attrs ordering ---

    #[test]
    fn test_attrs_preserve_insertion_order() {
        let mut attrs = Attrs::new();
        attrs.insert("z".into(), AttrValue::Int(1));
        attrs.insert("a".into(), AttrValue::Int(2));
        attrs.insert("m".into(), AttrValue::Int(3));

        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_attrs_overwrite_keeps_position() {
        let mut attrs = Attrs::new();
        attrs.insert("a".into(), AttrValue::Int(1));
        attrs.insert("b".into(), AttrValue::Int(2));
        attrs.insert("a".into(), AttrValue::Str("new".into()));

        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(attrs.get("a"), Some(&AttrValue::Str("new".into())));
        assert_eq!(attrs.len(), 2);
    }

    // --- Entry ---

    #[test]
    fn test_entry_dedups_tags_first_wins() {
        let entry = Entry::new("x".into(), tags(&["a", "b", "a", "c", "b"]), Attrs::new());
        assert_eq!(entry.tags, tags(&["a", "b", "c"]));
    }

    // --- Document mutation ---

    #[test]
    fn test_set_then_retrieve_equals_appended() {
        let mut doc = Document::new();
        let attrs: Attrs = [("k".to_string(), AttrValue::Int(1))].into_iter().collect();
        doc.set_entry("hello".into(), tags(&["a"]), attrs.clone()).unwrap();

        let entry = doc.entry_at(0).unwrap();
        assert_eq!(entry.text, "hello");
        assert_eq!(entry.tags, tags(&["a"]));
        assert_eq!(entry.attrs, attrs);
    }

    #[test]
    fn test_set_rejects_unknown_tags_atomically() {
        let mut doc = Document::new();
        doc.add_tags(tags(&["a", "b"]));
        doc.enforce_tags = true;

        let err = doc
            .set_entry("x".into(), tags(&["a", "c", "d", "c"]), Attrs::new())
            .unwrap_err();
        match err {
            TagdbError::TagsNotAllowed(unknown) => assert_eq!(unknown, tags(&["c", "d"])),
            other => panic!("expected TagsNotAllowed, got {:?}", other),
        }
        assert!(doc.is_empty());
    }

    #[test]
    fn test_set_allows_any_tag_without_enforcement() {
        let mut doc = Document::new();
        doc.set_entry("x".into(), tags(&["whatever"]), Attrs::new()).unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_unset_negative_index_removes_last_repeatedly() {
        let mut doc = Document::new();
        for text in ["one", "two", "three"] {
            doc.set_entry(text.into(), Vec::new(), Attrs::new()).unwrap();
        }

        let removed = doc.unset_entry(-1).unwrap();
        assert_eq!(removed.text, "three");
        let removed = doc.unset_entry(-1).unwrap();
        assert_eq!(removed.text, "two");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.entry_at(0).unwrap().text, "one");
    }

    #[test]
    fn test_unset_shifts_positional_indices() {
        let mut doc = Document::new();
        for text in ["a", "b", "c"] {
            doc.set_entry(text.into(), Vec::new(), Attrs::new()).unwrap();
        }
        doc.unset_entry(1).unwrap();
        assert_eq!(doc.entry_at(1).unwrap().text, "c");
    }

    #[test]
    fn test_unset_out_of_range_reports_requested_index() {
        let mut doc = Document::new();
        doc.set_entry("only".into(), Vec::new(), Attrs::new()).unwrap();

        match doc.unset_entry(5).unwrap_err() {
            TagdbError::IndexOutOfRange(i) => assert_eq!(i, 5),
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
        match doc.unset_entry(-2).unwrap_err() {
            TagdbError::IndexOutOfRange(i) => assert_eq!(i, -2),
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_edit_only_text_keeps_tags_and_attrs() {
        let mut doc = Document::new();
        let attrs: Attrs = [("k".to_string(), AttrValue::Bool(true))].into_iter().collect();
        doc.set_entry("old".into(), tags(&["t"]), attrs.clone()).unwrap();

        doc.edit_entry(0, Some("new".into()), None, None).unwrap();

        let entry = doc.entry_at(0).unwrap();
        assert_eq!(entry.text, "new");
        assert_eq!(entry.tags, tags(&["t"]));
        assert_eq!(entry.attrs, attrs);
    }

    #[test]
    fn test_edit_only_tags_keeps_text_and_attrs() {
        let mut doc = Document::new();
        let attrs: Attrs = [("k".to_string(), AttrValue::Int(9))].into_iter().collect();
        doc.set_entry("text".into(), tags(&["old"]), attrs.clone()).unwrap();

        doc.edit_entry(0, None, Some(tags(&["new1", "new2"])), None).unwrap();

        let entry = doc.entry_at(0).unwrap();
        assert_eq!(entry.text, "text");
        assert_eq!(entry.tags, tags(&["new1", "new2"]));
        assert_eq!(entry.attrs, attrs);
    }

    #[test]
    fn test_edit_enforces_tags_like_set() {
        let mut doc = Document::new();
        doc.add_tags(tags(&["a"]));
        doc.set_entry("x".into(), tags(&["a"]), Attrs::new()).unwrap();
        doc.enforce_tags = true;

        let err = doc.edit_entry(0, None, Some(tags(&["bad"])), None).unwrap_err();
        assert!(matches!(err, TagdbError::TagsNotAllowed(_)));
        // Entry untouched
        assert_eq!(doc.entry_at(0).unwrap().tags, tags(&["a"]));
    }

    #[test]
    fn test_edit_out_of_range() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.edit_entry(0, Some("x".into()), None, None),
            Err(TagdbError::IndexOutOfRange(0))
        ));
    }

    // --- Queries ---

    #[test]
    fn test_query_empty_filter_matches_all_ascending() {
        let mut doc = Document::new();
        for text in ["a", "b", "c"] {
            doc.set_entry(text.into(), Vec::new(), Attrs::new()).unwrap();
        }
        assert_eq!(doc.query(&[]), vec![0, 1, 2]);
    }

    #[test]
    fn test_query_filters_by_subset() {
        let mut doc = Document::new();
        doc.set_entry("0".into(), tags(&["x"]), Attrs::new()).unwrap();
        doc.set_entry("1".into(), tags(&["x", "y"]), Attrs::new()).unwrap();
        doc.set_entry("2".into(), tags(&["y"]), Attrs::new()).unwrap();

        assert_eq!(doc.query(&tags(&["x"])), vec![0, 1]);
        assert_eq!(doc.query(&tags(&["x", "y"])), vec![1]);
        assert_eq!(doc.query(&tags(&["z"])), Vec::<usize>::new());
    }

    #[test]
    fn test_find_first_exact_and_substring() {
        let mut doc = Document::new();
        doc.set_entry("Hello World".into(), Vec::new(), Attrs::new()).unwrap();
        doc.set_entry("hello".into(), Vec::new(), Attrs::new()).unwrap();

        assert_eq!(doc.find_first("hello", false, false).unwrap(), 1);
        assert_eq!(doc.find_first("World", true, false).unwrap(), 0);
        assert_eq!(doc.find_first("HELLO", false, true).unwrap(), 0);
        assert!(matches!(
            doc.find_first("absent", false, false),
            Err(TagdbError::NoMatch(_))
        ));
    }

    // --- Vocabulary ---

    #[test]
    fn test_vocabulary_ops() {
        let mut doc = Document::new();
        doc.add_tags(tags(&["a", "b", "a"]));
        assert_eq!(doc.tags, tags(&["a", "b"]));

        doc.remove_tags(&tags(&["b", "missing"]));
        assert_eq!(doc.tags, tags(&["a"]));

        doc.clear_tags();
        assert!(doc.tags.is_empty());
    }

    // --- Serialization ---

    #[test]
    fn test_entry_wire_shape() {
        let attrs: Attrs = [("k".to_string(), AttrValue::Int(1))].into_iter().collect();
        let entry = Entry::new("text".into(), tags(&["a"]), attrs);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"["text",["a"],{"k":1}]"#);
    }

    #[test]
    fn test_document_roundtrip_preserves_everything() {
        let mut doc = Document::new();
        doc.add_tags(tags(&["a", "b"]));
        doc.enforce_tags = true;
        doc.backups_enabled = true;
        let attrs: Attrs = [
            ("zulu".to_string(), AttrValue::Str("v".into())),
            ("alpha".to_string(), AttrValue::Float(1.5)),
            ("ok".to_string(), AttrValue::Bool(false)),
        ]
        .into_iter()
        .collect();
        doc.set_entry("text".into(), tags(&["b", "a"]), attrs).unwrap();

        let json = serde_json::to_string(&doc).unwrap();
        let loaded: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, doc);

        // Attribute order survives the trip
        let keys: Vec<&str> = loaded.entries[0].attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zulu", "alpha", "ok"]);
    }

    #[test]
    fn test_missing_required_key_fails() {
        let result: std::result::Result<Document, _> =
            serde_json::from_str(r#"{"tags": [], "enforce_tags": false}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_nested_attribute_value_fails() {
        let result: std::result::Result<Document, _> = serde_json::from_str(
            r#"{"tags":[],"enforce_tags":false,"backups_enabled":false,
                "data":[["x",[],{"k":{"nested":1}}]],"version":"0.1.0"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_entry_shape_fails() {
        let two: std::result::Result<Document, _> = serde_json::from_str(
            r#"{"tags":[],"enforce_tags":false,"backups_enabled":false,
                "data":[["x",[]]],"version":"0.1.0"}"#,
        );
        assert!(two.is_err());

        let four: std::result::Result<Document, _> = serde_json::from_str(
            r#"{"tags":[],"enforce_tags":false,"backups_enabled":false,
                "data":[["x",[],{},"extra"]],"version":"0.1.0"}"#,
        );
        assert!(four.is_err());
    }

    #[test]
    fn test_duplicate_attr_keys_last_wins_in_place() {
        let entry: Entry = serde_json::from_str(r#"["x",[],{"a":1,"b":2,"a":3}]"#).unwrap();
        let pairs: Vec<(&str, &AttrValue)> = entry.attrs.iter().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(entry.attrs.get("a"), Some(&AttrValue::Int(3)));
    }
}
