// crates/setup-validate/src/value.rs
// ============================================================================
// Module: Field Values
// Description: Borrowed views of entity fields and the rules attached to them.
// Purpose: Let entities describe their fields without runtime reflection.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Entities implement [`Validate`] by listing their fields as [`Field`]
//! entries: a name, a rule string, and a borrowed [`FieldValue`]. Nested
//! entities appear as [`FieldValue::Struct`], which the walker always enters.
//! An entity may also report whether it is enabled so conditional rules can
//! consult it without knowing its concrete type.

use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// SECTION: Validate Trait
// ============================================================================

/// Capability implemented by every entity the engine can walk.
pub trait Validate {
    /// Describes the entity's fields and their rule directives.
    fn field_rules(&self) -> Vec<Field<'_>>;

    /// Reports whether the entity is enabled.
    ///
    /// Entities without an enabled notion return `None`; conditional rules
    /// then treat the entity as always active.
    fn is_enabled(&self) -> Option<bool> {
        None
    }
}

// ============================================================================
// SECTION: Field
// ============================================================================

/// One described field of an entity.
pub struct Field<'a> {
    /// Field name used in error paths.
    pub name: &'static str,
    /// Rule string (see [`crate::parse_rules`]).
    pub rules: &'static str,
    /// Borrowed field value.
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    /// Creates a described field.
    #[must_use]
    pub const fn new(name: &'static str, rules: &'static str, value: FieldValue<'a>) -> Self {
        Self {
            name,
            rules,
            value,
        }
    }
}

// ============================================================================
// SECTION: Field Value
// ============================================================================

/// Borrowed, type-erased view of a field value.
pub enum FieldValue<'a> {
    /// Optional value that is not set.
    Absent,
    /// Boolean flag.
    Bool(bool),
    /// Integer (unsigned values saturate at `i64::MAX`).
    Int(i64),
    /// Text value.
    Str(&'a str),
    /// Nested entity, always walked.
    Struct(&'a dyn Validate),
    /// Ordered container.
    Seq(Vec<FieldValue<'a>>),
    /// Keyed container, in key order.
    Map(Vec<(String, FieldValue<'a>)>),
}

impl<'a> FieldValue<'a> {
    /// Wraps a nested entity.
    #[must_use]
    pub fn nested(value: &'a dyn Validate) -> Self {
        Self::Struct(value)
    }

    /// Builds a sequence view by mapping each element.
    pub fn seq<T, F>(items: &'a [T], mut view: F) -> Self
    where
        F: FnMut(&'a T) -> FieldValue<'a>,
    {
        Self::Seq(items.iter().map(&mut view).collect())
    }

    /// Builds a keyed view by mapping each entry.
    pub fn map<T, F>(entries: &'a BTreeMap<String, T>, mut view: F) -> Self
    where
        F: FnMut(&'a T) -> FieldValue<'a>,
    {
        Self::Map(entries.iter().map(|(key, value)| (key.clone(), view(value))).collect())
    }

    /// Returns true when the value counts as "not provided".
    ///
    /// Blank text, zero integers, absent options and empty containers are
    /// empty; booleans and nested entities never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Bool(_) | Self::Struct(_) => false,
            Self::Int(value) => *value == 0,
            Self::Str(text) => text.trim().is_empty(),
            Self::Seq(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
        }
    }

    /// Returns the text value, if any.
    #[must_use]
    pub const fn as_str(&self) -> Option<&'a str> {
        match self {
            Self::Str(text) => Some(*text),
            _ => None,
        }
    }

    /// Returns the numeric measure used by bound rules.
    ///
    /// Integers measure themselves, text its character count and containers
    /// their length.
    #[must_use]
    pub fn measure(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Str(text) => Some(saturate(text.chars().count())),
            Self::Seq(items) => Some(saturate(items.len())),
            Self::Map(entries) => Some(saturate(entries.len())),
            Self::Absent | Self::Bool(_) | Self::Struct(_) => None,
        }
    }

    /// Returns a short label for the value kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::Struct(_) => "struct",
            Self::Seq(_) => "seq",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Self::Str(value) => f.debug_tuple("Str").field(value).finish(),
            Self::Struct(_) => f.write_str("Struct(..)"),
            Self::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
        }
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        Self::Str(value.as_str())
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u16> for FieldValue<'_> {
    fn from(value: u16) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for FieldValue<'_> {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for FieldValue<'_> {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl<'a, T> From<Option<T>> for FieldValue<'a>
where
    T: Into<FieldValue<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Converts a length into a signed measure.
fn saturate(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
