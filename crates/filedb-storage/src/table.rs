//! The in-memory record table.
//!
//! [`RecordTable`] is an insertion-ordered `Vec` of records that owns
//! identifier allocation. It does no locking of its own; the stores wrap it
//! in an `RwLock`.

use filedb_core::{Record, RecordId};

use crate::error::StorageError;

/// Ordered collection of records, unique by identifier.
///
/// Deleting shifts later records down; there are no tombstones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    records: Vec<Record>,
    /// Largest identifier handed out by this table, so deleting the tail
    /// record does not recycle its id.
    high_water: Option<RecordId>,
}

impl RecordTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from decoded records.
    ///
    /// Identifiers are not validated here; a corrupted `id` surfaces as
    /// [`StorageError::InvalidIdentifierType`] from the operation that
    /// trips over it.
    pub fn from_records(records: Vec<Record>) -> Self {
        let high_water = records.last().and_then(|r| r.id().ok());
        RecordTable {
            records,
            high_water,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a copy of every record, in table order.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.clone()
    }

    /// Computes the identifier the next create will receive.
    ///
    /// "Last record's id + 1", or 1 for an empty table, raised to stay above
    /// anything this table already handed out.
    pub fn next_id(&self) -> Result<RecordId, StorageError> {
        let last = match self.records.last() {
            Some(record) => Some(record.id().map_err(|cause| {
                StorageError::InvalidIdentifierType {
                    position: self.records.len() - 1,
                    cause,
                }
            })?),
            None => None,
        };

        match last.max(self.high_water) {
            Some(last) => last
                .next()
                .ok_or(StorageError::IdentifierOverflow { last }),
            None => Ok(RecordId::FIRST),
        }
    }

    /// Stamps the next identifier onto `data` and appends it.
    pub fn create(&mut self, mut data: Record) -> Result<Record, StorageError> {
        let id = self.next_id()?;
        data.stamp_id(id);
        self.records.push(data.clone());
        self.high_water = Some(id);
        Ok(data)
    }

    pub fn read(&self, id: RecordId) -> Result<&Record, StorageError> {
        let position = self.position(id)?;
        Ok(&self.records[position])
    }

    /// Replaces the record in place; nothing changes if `id` is absent.
    pub fn update(&mut self, id: RecordId, data: Record) -> Result<Record, StorageError> {
        let position = self.position(id)?;
        let data = data.with_id(id);
        self.records[position] = data.clone();
        Ok(data)
    }

    pub fn delete(&mut self, id: RecordId) -> Result<Record, StorageError> {
        let position = self.position(id)?;
        Ok(self.records.remove(position))
    }

    /// Linear scan for `id`.
    ///
    /// A record with an invalid identifier met before the match aborts the
    /// scan with [`StorageError::InvalidIdentifierType`].
    fn position(&self, id: RecordId) -> Result<usize, StorageError> {
        for (position, record) in self.records.iter().enumerate() {
            let found = record
                .id()
                .map_err(|cause| StorageError::InvalidIdentifierType { position, cause })?;
            if found == id {
                return Ok(position);
            }
        }
        Err(StorageError::RecordNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        Record::try_from(value).unwrap()
    }

    fn ids(table: &RecordTable) -> Vec<u32> {
        table.records().iter().map(|r| r.id().unwrap().0).collect()
    }

    #[test]
    fn first_create_gets_id_one() {
        let mut table = RecordTable::new();
        let created = table.create(record(json!({"name": "Bob"}))).unwrap();
        assert_eq!(Value::from(created), json!({"name": "Bob", "id": 1}));
        assert_eq!(
            Value::from(table.read(RecordId(1)).unwrap().clone()),
            json!({"id": 1, "name": "Bob"})
        );
    }

    #[test]
    fn create_overwrites_supplied_id() {
        let mut table = RecordTable::new();
        let created = table.create(record(json!({"id": 99, "x": 1}))).unwrap();
        assert_eq!(created.id().unwrap(), RecordId(1));
    }

    #[test]
    fn next_id_follows_last_loaded_record() {
        let table = RecordTable::from_records(vec![
            record(json!({"id": 4})),
            record(json!({"id": 10})),
        ]);
        assert_eq!(table.next_id().unwrap(), RecordId(11));
    }

    #[test]
    fn deleted_tail_id_is_not_reused() {
        let mut table = RecordTable::new();
        for _ in 0..3 {
            table.create(Record::new()).unwrap();
        }
        table.delete(RecordId(3)).unwrap();
        let created = table.create(Record::new()).unwrap();
        assert_eq!(created.id().unwrap(), RecordId(4));
        assert_eq!(ids(&table), vec![1, 2, 4]);
    }

    #[test]
    fn create_fails_on_corrupt_last_id() {
        let mut table = RecordTable::from_records(vec![record(json!({"id": "one"}))]);
        let err = table.create(Record::new()).unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidIdentifierType { position: 0, .. }
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn create_fails_on_overflow() {
        let mut table = RecordTable::from_records(vec![record(json!({"id": u32::MAX}))]);
        assert!(matches!(
            table.create(Record::new()),
            Err(StorageError::IdentifierOverflow { .. })
        ));
    }

    #[test]
    fn read_missing_is_not_found() {
        let mut table = RecordTable::new();
        table.create(Record::new()).unwrap();
        assert!(matches!(
            table.read(RecordId(2)),
            Err(StorageError::RecordNotFound(RecordId(2)))
        ));
    }

    #[test]
    fn read_stops_at_corrupt_record_before_match() {
        let table = RecordTable::from_records(vec![
            record(json!({"id": 1})),
            record(json!({"id": true})),
            record(json!({"id": 3})),
        ]);
        assert!(table.read(RecordId(1)).is_ok());
        assert!(matches!(
            table.read(RecordId(3)),
            Err(StorageError::InvalidIdentifierType { position: 1, .. })
        ));
    }

    #[test]
    fn update_replaces_and_restamps() {
        let mut table = RecordTable::new();
        table
            .create(record(json!({"name": "Bob", "age": 40})))
            .unwrap();
        let updated = table
            .update(RecordId(1), record(json!({"name": "Robert"})))
            .unwrap();
        assert_eq!(Value::from(updated), json!({"name": "Robert", "id": 1}));
        assert_eq!(
            Value::from(table.read(RecordId(1)).unwrap().clone()),
            json!({"id": 1, "name": "Robert"})
        );
    }

    #[test]
    fn update_missing_leaves_table_untouched() {
        let mut table = RecordTable::new();
        table.create(record(json!({"name": "Bob"}))).unwrap();
        let before = table.clone();
        assert!(matches!(
            table.update(RecordId(5), record(json!({"name": "X"}))),
            Err(StorageError::RecordNotFound(RecordId(5)))
        ));
        assert_eq!(table, before);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut table = RecordTable::new();
        assert!(matches!(
            table.delete(RecordId(1)),
            Err(StorageError::RecordNotFound(RecordId(1)))
        ));
    }

    proptest! {
        #[test]
        fn nth_create_gets_id_n(n in 1usize..64) {
            let mut table = RecordTable::new();
            for i in 1..=n {
                let created = table.create(Record::new()).unwrap();
                prop_assert_eq!(created.id().unwrap(), RecordId(i as u32));
            }
        }

        #[test]
        fn delete_preserves_order_of_survivors(
            n in 1u32..32,
            victims in proptest::collection::vec(1u32..32, 0..16),
        ) {
            let mut table = RecordTable::new();
            for i in 1..=n {
                table.create(record(json!({ "n": i }))).unwrap();
            }

            let mut expected: Vec<u32> = (1..=n).collect();
            for victim in victims {
                let result = table.delete(RecordId(victim));
                if let Some(pos) = expected.iter().position(|&id| id == victim) {
                    prop_assert!(result.is_ok());
                    expected.remove(pos);
                } else {
                    let is_not_found = matches!(result, Err(StorageError::RecordNotFound(_)));
                    prop_assert!(is_not_found);
                }
            }

            prop_assert_eq!(ids(&table), expected.clone());
            for id in expected {
                let r = table.read(RecordId(id)).unwrap();
                prop_assert_eq!(r.get("n"), Some(&json!(id)));
            }
        }
    }
}
