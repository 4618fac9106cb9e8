//! Data store trait and related types.
//!
//! The registration system persists three logical record types (events,
//! registrations, users) in a key-value/document backend. Each record is a
//! flat JSON object ([`Item`]) addressed by the value of its table's key
//! attribute.
//!
//! # Design
//!
//! The [`DataStore`] trait exposes exactly the primitive shapes the services
//! need:
//!
//! - `put` with an optional [`PutCondition`] (conditional insert)
//! - `get` by key
//! - `update` applying an atomic [`Increment`] to a numeric attribute
//! - `scan` narrowed by an equality [`Filter`]
//! - `delete` by key
//!
//! # Implementations
//!
//! - `PostgresDataStore` (in `eventreg-postgres`): JSONB rows in `PostgreSQL`
//! - `InMemoryDataStore` (in `eventreg-testing`): `HashMap` tables for tests
//!   and single-process deployments

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// A stored record: a flat JSON object keyed by attribute name.
pub type Item = serde_json::Map<String, Value>;

/// Boxed future returned by [`DataStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// The three logical tables of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    /// Events created by organizers.
    Events,
    /// Attendee registrations for events.
    Registrations,
    /// Locally managed user accounts.
    Users,
}

impl Table {
    /// All logical tables.
    pub const ALL: [Self; 3] = [Self::Events, Self::Registrations, Self::Users];

    /// Name of the attribute holding each item's primary key.
    #[must_use]
    pub const fn key_attribute(self) -> &'static str {
        match self {
            Self::Events => "EventID",
            Self::Registrations => "RegistrationID",
            Self::Users => "Username",
        }
    }

    /// Extract the primary key from an item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the key attribute is missing
    /// or is not a non-empty string.
    pub fn key_of(self, item: &Item) -> Result<String, StoreError> {
        match item.get(self.key_attribute()) {
            Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
            _ => Err(StoreError::Serialization(format!(
                "{self} item is missing string attribute {}",
                self.key_attribute()
            ))),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Events => write!(f, "events"),
            Self::Registrations => write!(f, "registrations"),
            Self::Users => write!(f, "users"),
        }
    }
}

/// Physical names of the logical tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNames {
    /// Physical name of the events table.
    pub events: String,
    /// Physical name of the registrations table.
    pub registrations: String,
    /// Physical name of the users table.
    pub users: String,
}

impl TableNames {
    /// Physical name for a logical table.
    #[must_use]
    pub fn name(&self, table: Table) -> &str {
        match table {
            Table::Events => &self.events,
            Table::Registrations => &self.registrations,
            Table::Users => &self.users,
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            events: "EventSystem-Events".to_string(),
            registrations: "EventSystem-Registrations".to_string(),
            users: "EventSystem-Users".to_string(),
        }
    }
}

/// Precondition for a `put`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PutCondition {
    /// Unconditional write; replaces any item with the same key.
    #[default]
    Always,
    /// Fail if an item with the same key already exists.
    KeyNotExists,
    /// Fail if an item with the same key exists, or if another item in the
    /// table has equal values for every listed attribute.
    UniqueAttributes(Vec<String>),
}

/// Conjunction of attribute equality conditions used by `scan`.
///
/// An empty filter matches every item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every item.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Add an equality condition.
    #[must_use]
    pub fn equals(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((attribute.into(), value.into()));
        self
    }

    /// The equality conditions in insertion order.
    #[must_use]
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether `item` satisfies every condition.
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        self.conditions
            .iter()
            .all(|(attribute, value)| item.get(attribute) == Some(value))
    }

    /// The filter as a JSON object, suitable for containment queries.
    #[must_use]
    pub fn to_object(&self) -> Item {
        self.conditions.iter().cloned().collect()
    }
}

/// Atomic add on a numeric attribute.
///
/// When `ceiling_attribute` is set, the update only succeeds if the new value
/// does not exceed the item's value for that attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    /// Attribute to modify. A missing attribute counts as zero.
    pub attribute: String,
    /// Amount to add (may be negative).
    pub delta: i64,
    /// Attribute bounding the new value from above.
    pub ceiling_attribute: Option<String>,
}

impl Increment {
    /// Unbounded increment.
    #[must_use]
    pub fn new(attribute: impl Into<String>, delta: i64) -> Self {
        Self {
            attribute: attribute.into(),
            delta,
            ceiling_attribute: None,
        }
    }

    /// Bound the result by another attribute of the same item.
    #[must_use]
    pub fn with_ceiling(mut self, attribute: impl Into<String>) -> Self {
        self.ceiling_attribute = Some(attribute.into());
        self
    }

    /// Apply the increment to an item in place and return the new value.
    ///
    /// Backends that hold the item under a lock use this to implement
    /// `update`. The item is untouched when an error is returned.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Serialization`] if an attribute is present but not an integer
    /// - [`StoreError::ConditionFailed`] if the ceiling would be exceeded or
    ///   the ceiling attribute is missing
    pub fn apply_to(&self, item: &mut Item) -> Result<i64, StoreError> {
        let current = match item.get(&self.attribute) {
            None | Some(Value::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                StoreError::Serialization(format!("attribute {} is not an integer", self.attribute))
            })?,
        };
        let next = current.checked_add(self.delta).ok_or_else(|| {
            StoreError::ConditionFailed(format!("attribute {} would overflow", self.attribute))
        })?;

        if let Some(ceiling_attribute) = &self.ceiling_attribute {
            let ceiling = item
                .get(ceiling_attribute)
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    StoreError::ConditionFailed(format!("ceiling attribute {ceiling_attribute} is missing"))
                })?;
            if next > ceiling {
                return Err(StoreError::ConditionFailed(format!(
                    "{} would exceed {ceiling_attribute} ({next} > {ceiling})",
                    self.attribute
                )));
            }
        }

        item.insert(self.attribute.clone(), Value::from(next));
        Ok(next)
    }
}

/// Errors that can occur during data store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend unreachable or misconfigured.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A put or update precondition was not met.
    #[error("Condition failed: {0}")]
    ConditionFailed(String),

    /// The addressed item does not exist.
    #[error("Item not found in {table}: {key}")]
    ItemNotFound {
        /// Table that was addressed.
        table: Table,
        /// Key that was not found.
        key: String,
    },

    /// Item could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Key-value/document store abstraction.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; services share a single instance
/// behind an `Arc<dyn DataStore>`.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the trait can be used as a trait object.
///
/// # Atomicity
///
/// - A conditional `put` must check and write as one atomic step.
/// - `update` must be an atomic add, never a read followed by a full write.
pub trait DataStore: Send + Sync {
    /// Write an item, subject to `condition`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ConditionFailed`] if the condition is violated
    /// - [`StoreError::Unavailable`] if the backend cannot be reached
    fn put(&self, table: Table, item: Item, condition: PutCondition) -> StoreFuture<'_, ()>;

    /// Fetch an item by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend cannot be reached.
    fn get<'a>(&'a self, table: Table, key: &'a str) -> StoreFuture<'a, Option<Item>>;

    /// Atomically apply `increment` to the item with `key`; returns the new value.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ItemNotFound`] if no item has the key
    /// - [`StoreError::ConditionFailed`] if the ceiling would be exceeded
    fn update<'a>(&'a self, table: Table, key: &'a str, increment: Increment) -> StoreFuture<'a, i64>;

    /// Return every item matching `filter`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend cannot be reached.
    fn scan(&self, table: Table, filter: Filter) -> StoreFuture<'_, Vec<Item>>;

    /// Delete an item by key; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend cannot be reached.
    fn delete<'a>(&'a self, table: Table, key: &'a str) -> StoreFuture<'a, bool>;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => Item::new(),
        }
    }

    #[test]
    fn filter_matches_all_conditions() {
        let registration = item(json!({"EventID": "e1", "AttendeeID": "a1", "Status": "CONFIRMED"}));

        assert!(Filter::new().matches(&registration));
        assert!(Filter::new().equals("EventID", "e1").matches(&registration));
        assert!(Filter::new().equals("EventID", "e1").equals("AttendeeID", "a1").matches(&registration));
        assert!(!Filter::new().equals("EventID", "e1").equals("AttendeeID", "a2").matches(&registration));
        assert!(!Filter::new().equals("TicketID", "T").matches(&registration));
    }

    #[test]
    fn filter_to_object_round_trips_conditions() {
        let filter = Filter::new().equals("EventID", "e1").equals("AttendeeID", "a1");
        let object = filter.to_object();
        assert_eq!(object.len(), 2);
        assert_eq!(object.get("AttendeeID"), Some(&json!("a1")));
    }

    #[test]
    fn increment_treats_missing_attribute_as_zero() {
        let mut event = item(json!({"EventID": "e1"}));
        let value = Increment::new("CurrentAttendees", 1).apply_to(&mut event).unwrap();
        assert_eq!(value, 1);
        assert_eq!(event.get("CurrentAttendees"), Some(&json!(1)));
    }

    #[test]
    fn increment_respects_ceiling() {
        let mut event = item(json!({"EventID": "e1", "CurrentAttendees": 1, "MaxAttendees": 2}));
        let increment = Increment::new("CurrentAttendees", 1).with_ceiling("MaxAttendees");

        assert_eq!(increment.apply_to(&mut event).unwrap(), 2);
        let err = increment.apply_to(&mut event).unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed(_)));
        assert_eq!(event.get("CurrentAttendees"), Some(&json!(2)));
    }

    #[test]
    fn increment_rejects_non_numeric_attribute() {
        let mut event = item(json!({"CurrentAttendees": "many"}));
        let err = Increment::new("CurrentAttendees", 1).apply_to(&mut event).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn key_of_requires_string_key() {
        let good = item(json!({"EventID": "e1"}));
        let bad = item(json!({"EventID": 7}));
        assert_eq!(Table::Events.key_of(&good).unwrap(), "e1");
        assert!(Table::Events.key_of(&bad).is_err());
        assert!(Table::Registrations.key_of(&good).is_err());
    }

    #[test]
    fn default_table_names() {
        let names = TableNames::default();
        assert_eq!(names.name(Table::Events), "EventSystem-Events");
        assert_eq!(names.name(Table::Registrations), "EventSystem-Registrations");
        assert_eq!(names.name(Table::Users), "EventSystem-Users");
    }
}
