//! Record predicates.

use crate::types::Record;
use std::fmt;

/// Decides whether a record is the target of a lookup, update or delete.
///
/// `Predicate::none()` is the "no predicate" sentinel: it never matches.
pub struct Predicate<'a> {
    test: Option<Box<dyn Fn(&Record) -> bool + 'a>>,
}

impl<'a> Predicate<'a> {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&Record) -> bool + 'a,
    {
        Self {
            test: Some(Box::new(test)),
        }
    }

    pub fn none() -> Self {
        Self { test: None }
    }

    /// Matches records whose field `key` equals `value`.
    pub fn field_eq(key: impl Into<String>, value: impl Into<Record>) -> Self {
        let key = key.into();
        let value = value.into();
        Self::new(move |record| record.get(&key) == Some(&value))
    }

    /// Matches records structurally equal to `target`.
    pub fn equals(target: Record) -> Self {
        Self::new(move |record| *record == target)
    }

    /// Matches records holding `value` in any of their fields (or elements, for arrays).
    pub fn has_value(value: Record) -> Self {
        Self::new(move |record| match record {
            Record::Object(map) => map.values().any(|v| *v == value),
            Record::Array(items) => items.iter().any(|v| *v == value),
            _ => false,
        })
    }

    pub fn is_none(&self) -> bool {
        self.test.is_none()
    }

    pub(crate) fn matches(&self, record: &Record) -> bool {
        self.test.as_ref().is_some_and(|test| test(record))
    }
}

impl fmt::Debug for Predicate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.test.is_some() {
            f.write_str("Predicate(<fn>)")
        } else {
            f.write_str("Predicate(none)")
        }
    }
}
