//! In-memory data store
//!
//! [`InMemoryDataStore`] keeps each logical table in a `HashMap` behind a
//! single async mutex, so conditional writes and increments are atomic with
//! respect to every other operation. It backs the test suites and the
//! single-process `memory` deployment mode.

use eventreg_core::data_store::{
    DataStore, Filter, Increment, Item, PutCondition, StoreError, StoreFuture, Table,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

type Tables = HashMap<Table, HashMap<String, Item>>;

/// `HashMap`-backed [`DataStore`].
///
/// Cloning shares the underlying tables.
///
/// # Example
///
/// ```
/// use eventreg_core::data_store::{DataStore, Item, PutCondition, Table};
/// use eventreg_testing::InMemoryDataStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryDataStore::new();
/// let mut item = Item::new();
/// item.insert("EventID".into(), "event_1".into());
/// store.put(Table::Events, item, PutCondition::KeyNotExists).await?;
///
/// assert!(store.get(Table::Events, "event_1").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryDataStore {
    tables: Arc<Mutex<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryDataStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage: while set, every operation fails with
    /// [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of items in a table.
    pub async fn len(&self, table: Table) -> usize {
        self.tables.lock().await.get(&table).map_or(0, HashMap::len)
    }

    /// Whether a table holds no items.
    pub async fn is_empty(&self, table: Table) -> bool {
        self.len(table).await == 0
    }

    /// Insert an item bypassing every condition.
    ///
    /// Lets tests seed states the services never produce, such as two
    /// registrations sharing a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the item has no key.
    pub async fn seed(&self, table: Table, item: Item) -> Result<(), StoreError> {
        let key = table.key_of(&item)?;
        self.tables
            .lock()
            .await
            .entry(table)
            .or_default()
            .insert(key, item);
        Ok(())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

fn unique_conflict(rows: &HashMap<String, Item>, item: &Item, attributes: &[String]) -> bool {
    rows.values().any(|existing| {
        attributes
            .iter()
            .all(|attribute| existing.get(attribute) == item.get(attribute))
    })
}

impl DataStore for InMemoryDataStore {
    fn put(&self, table: Table, item: Item, condition: PutCondition) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.check_available()?;
            let key = table.key_of(&item)?;
            // Give concurrent callers a chance to interleave before the write.
            tokio::task::yield_now().await;

            let mut tables = self.tables.lock().await;
            let rows = tables.entry(table).or_default();
            match &condition {
                PutCondition::Always => {}
                PutCondition::KeyNotExists => {
                    if rows.contains_key(&key) {
                        return Err(StoreError::ConditionFailed(format!("{table} key {key} exists")));
                    }
                }
                PutCondition::UniqueAttributes(attributes) => {
                    if rows.contains_key(&key) {
                        return Err(StoreError::ConditionFailed(format!("{table} key {key} exists")));
                    }
                    if unique_conflict(rows, &item, attributes) {
                        return Err(StoreError::ConditionFailed(format!(
                            "{table} already holds an item with the same {}",
                            attributes.join(", ")
                        )));
                    }
                }
            }
            rows.insert(key, item);
            Ok(())
        })
    }

    fn get<'a>(&'a self, table: Table, key: &'a str) -> StoreFuture<'a, Option<Item>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.lock().await;
            Ok(tables.get(&table).and_then(|rows| rows.get(key)).cloned())
        })
    }

    fn update<'a>(&'a self, table: Table, key: &'a str, increment: Increment) -> StoreFuture<'a, i64> {
        Box::pin(async move {
            self.check_available()?;
            tokio::task::yield_now().await;

            let mut tables = self.tables.lock().await;
            let item = tables
                .get_mut(&table)
                .and_then(|rows| rows.get_mut(key))
                .ok_or_else(|| StoreError::ItemNotFound {
                    table,
                    key: key.to_string(),
                })?;
            let value = increment.apply_to(item)?;
            tracing::trace!(%table, key, attribute = %increment.attribute, value, "Incremented attribute");
            Ok(value)
        })
    }

    fn scan(&self, table: Table, filter: Filter) -> StoreFuture<'_, Vec<Item>> {
        Box::pin(async move {
            self.check_available()?;
            let tables = self.tables.lock().await;
            Ok(tables
                .get(&table)
                .map(|rows| rows.values().filter(|item| filter.matches(item)).cloned().collect())
                .unwrap_or_default())
        })
    }

    fn delete<'a>(&'a self, table: Table, key: &'a str) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            self.check_available()?;
            let mut tables = self.tables.lock().await;
            Ok(tables
                .get_mut(&table)
                .is_some_and(|rows| rows.remove(key).is_some()))
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::{Value, json};

    fn item(value: Value) -> Item {
        match value {
            Value::Object(map) => map,
            _ => Item::new(),
        }
    }

    #[tokio::test]
    async fn key_not_exists_rejects_second_write() {
        let store = InMemoryDataStore::new();
        let event = item(json!({"EventID": "e1", "Title": "A"}));

        store.put(Table::Events, event.clone(), PutCondition::KeyNotExists).await.unwrap();
        let err = store.put(Table::Events, event, PutCondition::KeyNotExists).await.unwrap_err();

        assert!(matches!(err, StoreError::ConditionFailed(_)));
        assert_eq!(store.len(Table::Events).await, 1);
    }

    #[tokio::test]
    async fn unique_attributes_reject_same_pair() {
        let store = InMemoryDataStore::new();
        let unique = PutCondition::UniqueAttributes(vec!["EventID".into(), "AttendeeID".into()]);

        store
            .put(
                Table::Registrations,
                item(json!({"RegistrationID": "r1", "EventID": "e1", "AttendeeID": "a1"})),
                unique.clone(),
            )
            .await
            .unwrap();
        let err = store
            .put(
                Table::Registrations,
                item(json!({"RegistrationID": "r2", "EventID": "e1", "AttendeeID": "a1"})),
                unique.clone(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed(_)));

        store
            .put(
                Table::Registrations,
                item(json!({"RegistrationID": "r3", "EventID": "e1", "AttendeeID": "a2"})),
                unique,
            )
            .await
            .unwrap();
        assert_eq!(store.len(Table::Registrations).await, 2);
    }

    #[tokio::test]
    async fn update_missing_item_is_not_found() {
        let store = InMemoryDataStore::new();
        let err = store
            .update(Table::Events, "missing", Increment::new("CurrentAttendees", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ItemNotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let store = InMemoryDataStore::new();
        store
            .seed(Table::Events, item(json!({"EventID": "e1", "CurrentAttendees": 0})))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update(Table::Events, "e1", Increment::new("CurrentAttendees", 1))
                        .await
                })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let event = store.get(Table::Events, "e1").await.unwrap().unwrap();
        assert_eq!(event.get("CurrentAttendees"), Some(&json!(50)));
    }

    #[tokio::test]
    async fn scan_and_delete() {
        let store = InMemoryDataStore::new();
        for (id, event) in [("r1", "e1"), ("r2", "e1"), ("r3", "e2")] {
            store
                .seed(Table::Registrations, item(json!({"RegistrationID": id, "EventID": event})))
                .await
                .unwrap();
        }

        let e1 = store
            .scan(Table::Registrations, Filter::new().equals("EventID", "e1"))
            .await
            .unwrap();
        assert_eq!(e1.len(), 2);
        assert_eq!(store.scan(Table::Registrations, Filter::new()).await.unwrap().len(), 3);

        assert!(store.delete(Table::Registrations, "r1").await.unwrap());
        assert!(!store.delete(Table::Registrations, "r1").await.unwrap());
        assert!(store.scan(Table::Events, Filter::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn outage_fails_every_operation() {
        let store = InMemoryDataStore::new();
        store.set_unavailable(true);

        let err = store.get(Table::Events, "e1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        let err = store.scan(Table::Events, Filter::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        store.set_unavailable(false);
        assert!(store.get(Table::Events, "e1").await.unwrap().is_none());
    }
}
