//! Boolean filter expressions over document metadata fields.

use std::collections::BTreeMap;

/// Filter predicate evaluated against a document's metadata fields.
///
/// Supports equality and set-membership, composable with and/or. Missing
/// fields never match.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Field equals the given value.
    Eq {
        /// Field name.
        field: String,
        /// Expected value.
        value: String,
    },
    /// Field value is one of the given values.
    In {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<String>,
    },
    /// All sub-filters match.
    All(Vec<FieldFilter>),
    /// At least one sub-filter matches.
    Any(Vec<FieldFilter>),
}

impl FieldFilter {
    /// Equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        FieldFilter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Set-membership filter.
    pub fn is_in(field: impl Into<String>, values: impl IntoIterator<Item = String>) -> Self {
        FieldFilter::In {
            field: field.into(),
            values: values.into_iter().collect(),
        }
    }

    /// Conjunction of filters.
    pub fn all(filters: impl IntoIterator<Item = FieldFilter>) -> Self {
        FieldFilter::All(filters.into_iter().collect())
    }

    /// Disjunction of filters.
    pub fn any(filters: impl IntoIterator<Item = FieldFilter>) -> Self {
        FieldFilter::Any(filters.into_iter().collect())
    }

    /// Evaluate the filter against a field map.
    pub fn matches(&self, fields: &BTreeMap<String, String>) -> bool {
        match self {
            FieldFilter::Eq { field, value } => {
                fields.get(field).is_some_and(|actual| actual == value)
            }
            FieldFilter::In { field, values } => fields
                .get(field)
                .is_some_and(|actual| values.iter().any(|value| value == actual)),
            FieldFilter::All(filters) => filters.iter().all(|filter| filter.matches(fields)),
            FieldFilter::Any(filters) => filters.iter().any(|filter| filter.matches(fields)),
        }
    }
}
