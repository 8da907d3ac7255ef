//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid percent-scheduled formula name.
    #[error("invalid pct_scheduled formula: {value}")]
    InvalidFormula { value: String },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// Identifier of an item in the task-tracking store.
    ///
    /// Work sessions, schedulables and persisted task-work blocks are all
    /// items; a block's owner is referenced by the owner item's ID.
    ItemId, "item ID"
);

define_string_id!(
    /// Identifier of a project (namespace) in the task-tracking store.
    ProjectId, "project ID"
);

/// Reference handed back by the store once a block has been materialized.
pub type ExternalRef = ItemId;

/// Which arithmetic is used for a schedulable's scheduled fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PctScheduledFormula {
    /// `checked + planned / required`, the formula the scheduler has always used.
    #[default]
    Historical,
    /// `(checked + planned) / required`.
    Proportional,
}

impl PctScheduledFormula {
    /// String representation used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Proportional => "proportional",
        }
    }
}

impl fmt::Display for PctScheduledFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PctScheduledFormula {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "historical" => Ok(Self::Historical),
            "proportional" => Ok(Self::Proportional),
            _ => Err(ValidationError::InvalidFormula {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_rejects_empty() {
        assert!(ItemId::new("").is_err());
        assert!(ItemId::new("item-1").is_ok());
    }

    #[test]
    fn project_id_rejects_empty() {
        let err = ProjectId::new("").unwrap_err();
        assert_eq!(err.to_string(), "project ID cannot be empty");
    }

    #[test]
    fn item_id_serde_rejects_empty() {
        let result: Result<ItemId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());

        let parsed: ItemId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(parsed.as_str(), "abc");
    }

    #[test]
    fn formula_from_str() {
        assert_eq!(
            "historical".parse::<PctScheduledFormula>().unwrap(),
            PctScheduledFormula::Historical
        );
        assert_eq!(
            "proportional".parse::<PctScheduledFormula>().unwrap(),
            PctScheduledFormula::Proportional
        );
        assert!("linear".parse::<PctScheduledFormula>().is_err());
    }

    #[test]
    fn formula_defaults_to_historical() {
        assert_eq!(
            PctScheduledFormula::default(),
            PctScheduledFormula::Historical
        );
        let json = serde_json::to_string(&PctScheduledFormula::Proportional).unwrap();
        assert_eq!(json, "\"proportional\"");
    }
}
