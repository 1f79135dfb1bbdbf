//! Type-tag tables for the parameter grammar.
//!
//! A [`Dialect`] maps each tag byte to the rule used to decode its payload.
//! The stock Photon table is [`Dialect::photon`]; games that ship a modified
//! serializer get their own table instead of a copy of the decoder.

use serde::{Deserialize, Serialize};

use super::layout;

/// How the payload following a type tag is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    Nil,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    /// `u16` length followed by raw bytes.
    String,
    /// One byte, `0` or `1`.
    Boolean,
    /// `u32` length followed by signed bytes.
    ByteArray,
    /// `u16` length, element tag, then untagged elements.
    Array,
    /// One ignored byte, `u8` length, raw bytes.
    ShortString,
    /// `u16` length, one ignored byte, then `i16` elements.
    Int16Array,
}

/// Mapping from tag byte to [`ValueRule`], plus the nesting limit for arrays.
///
/// # Examples
/// ```
/// use photon_core::{Dialect, ValueRule};
///
/// let dialect = Dialect::photon().with_rule(64, ValueRule::Int32);
/// assert_eq!(dialect.rule(64), Some(ValueRule::Int32));
/// assert_eq!(Dialect::photon().rule(64), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    rules: [Option<ValueRule>; 256],
    max_depth: usize,
}

/// The stock Photon dialect.
pub static PHOTON: Dialect = Dialect::photon();

impl Dialect {
    /// A dialect that knows no tags.
    pub const fn empty() -> Self {
        Self {
            rules: [None; 256],
            max_depth: layout::DEFAULT_MAX_DEPTH,
        }
    }

    /// The generic Photon tag table.
    pub const fn photon() -> Self {
        Self::empty()
            .with_rule(layout::TAG_NIL, ValueRule::Nil)
            .with_rule(layout::TAG_NIL_ZERO, ValueRule::Nil)
            .with_rule(layout::TAG_INT8, ValueRule::Int8)
            .with_rule(layout::TAG_FLOAT32, ValueRule::Float32)
            .with_rule(layout::TAG_INT32, ValueRule::Int32)
            .with_rule(layout::TAG_INT16, ValueRule::Int16)
            .with_rule(layout::TAG_INT16_LEGACY, ValueRule::Int16)
            .with_rule(layout::TAG_INT64, ValueRule::Int64)
            .with_rule(layout::TAG_STRING, ValueRule::String)
            .with_rule(layout::TAG_BOOLEAN, ValueRule::Boolean)
            .with_rule(layout::TAG_BYTE_ARRAY, ValueRule::ByteArray)
            .with_rule(layout::TAG_ARRAY, ValueRule::Array)
    }

    /// The reduced table used by Albion Online's early protocol revision.
    ///
    /// Strings carry a one-byte length after a padding byte, and tag 121 is
    /// a flat array of `i16` values.
    pub const fn albion() -> Self {
        Self::empty()
            .with_rule(layout::TAG_INT32, ValueRule::Int32)
            .with_rule(layout::TAG_INT16, ValueRule::Int16)
            .with_rule(layout::TAG_INT64, ValueRule::Int64)
            .with_rule(layout::TAG_STRING, ValueRule::ShortString)
            .with_rule(layout::TAG_BOOLEAN, ValueRule::Boolean)
            .with_rule(layout::TAG_ARRAY, ValueRule::Int16Array)
    }

    pub const fn with_rule(mut self, tag: u8, rule: ValueRule) -> Self {
        self.rules[tag as usize] = Some(rule);
        self
    }

    pub const fn without_rule(mut self, tag: u8) -> Self {
        self.rules[tag as usize] = None;
        self
    }

    /// Limit how many arrays may be nested inside each other.
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn rule(&self, tag: u8) -> Option<ValueRule> {
        self.rules[tag as usize]
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::photon()
    }
}

/// Named dialects selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Photon,
    Albion,
}

impl DialectKind {
    pub fn dialect(self) -> Dialect {
        match self {
            DialectKind::Photon => Dialect::photon(),
            DialectKind::Albion => Dialect::albion(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DialectKind::Photon => "photon",
            DialectKind::Albion => "albion",
        }
    }
}
