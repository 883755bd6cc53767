use uuid::Uuid;

use crate::events::types::Change;
use crate::record::model::Record;

/// The client's in-memory mirror of one table's current rows: an
/// insertion-ordered, id-unique sequence, populated once by a full fetch and
/// kept current by applying change events.
#[derive(Debug, Clone)]
pub struct LiveCollection<R> {
    records: Vec<R>,
}

impl<R: Record> LiveCollection<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Adopt a full fetch result, keeping the fetch's ordering. Duplicate
    /// ids keep the first occurrence so the id-unique invariant holds even
    /// against a misbehaving read.
    pub fn from_fetch(rows: Vec<R>) -> Self {
        let mut collection = Self::new();
        for row in rows {
            if !collection.contains(row.id()) {
                collection.records.push(row);
            }
        }
        collection
    }

    /// Apply one change event, returning the collection to its next state.
    ///
    /// Inserts land at the head: change events carry no ordering key, and
    /// arrival order approximates recency against a `created_at`-descending
    /// fetch. An insert for an id already present (the fetch racing the
    /// change feed) replaces the existing entry in place instead of
    /// duplicating it. Updates and deletes for absent ids are no-ops.
    pub fn apply(&mut self, change: Change<R>) {
        match change {
            Change::Inserted(record) => match self.position(record.id()) {
                Some(i) => self.records[i] = record,
                None => self.records.insert(0, record),
            },
            Change::Updated(record) => {
                if let Some(i) = self.position(record.id()) {
                    self.records[i] = record;
                }
            }
            Change::Deleted(id) => {
                self.records.retain(|r| r.id() != id);
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&R> {
        self.position(id).map(|i| &self.records[i])
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.position(id).is_some()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }
}

impl<R: Record> Default for LiveCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::domain::{Equipment, EquipmentStatus};
    use chrono::Utc;

    fn item(name: &str) -> Equipment {
        Equipment {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name: name.to_string(),
            status: EquipmentStatus::Available,
            content: String::new(),
            image_url: None,
        }
    }

    fn ids<R: Record>(c: &LiveCollection<R>) -> Vec<Uuid> {
        c.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn insert_prepends_to_head() {
        let a = item("a");
        let b = item("b");
        let mut coll = LiveCollection::from_fetch(vec![a.clone(), b.clone()]);

        let c = item("c");
        coll.apply(Change::Inserted(c.clone()));

        assert_eq!(ids(&coll), vec![c.id, a.id, b.id]);
    }

    #[test]
    fn update_replaces_in_place() {
        let a = item("a");
        let b = item("b");
        let mut coll = LiveCollection::from_fetch(vec![a.clone(), b.clone()]);

        let mut b2 = b.clone();
        b2.name = "b2".to_string();
        coll.apply(Change::Updated(b2));

        assert_eq!(ids(&coll), vec![a.id, b.id]);
        assert_eq!(coll.records()[1].name, "b2");
        assert_eq!(coll.records()[0].name, "a");
    }

    #[test]
    fn update_for_absent_id_is_noop() {
        let a = item("a");
        let mut coll = LiveCollection::from_fetch(vec![a.clone()]);

        coll.apply(Change::Updated(item("ghost")));

        assert_eq!(ids(&coll), vec![a.id]);
        assert_eq!(coll.records()[0].name, "a");
    }

    #[test]
    fn delete_removes_matching_entry() {
        let a = item("a");
        let b = item("b");
        let mut coll = LiveCollection::from_fetch(vec![a.clone(), b.clone()]);

        coll.apply(Change::Deleted(a.id));

        assert_eq!(ids(&coll), vec![b.id]);
    }

    #[test]
    fn delete_for_absent_id_is_noop() {
        let a = item("a");
        let mut coll = LiveCollection::from_fetch(vec![a.clone()]);

        coll.apply(Change::Deleted(Uuid::new_v4()));

        assert_eq!(ids(&coll), vec![a.id]);
    }

    #[test]
    fn insert_for_existing_id_replaces_without_duplicating() {
        let a = item("a");
        let b = item("b");
        let mut coll = LiveCollection::from_fetch(vec![a.clone(), b.clone()]);

        // The fetch and the change feed both delivered `b`.
        let mut b2 = b.clone();
        b2.name = "b-from-event".to_string();
        coll.apply(Change::Inserted(b2));

        assert_eq!(ids(&coll), vec![a.id, b.id]);
        assert_eq!(coll.records()[1].name, "b-from-event");
    }

    #[test]
    fn no_duplicate_ids_after_any_sequence() {
        let a = item("a");
        let b = item("b");
        let mut coll = LiveCollection::from_fetch(vec![a.clone(), b.clone()]);

        coll.apply(Change::Inserted(item("c")));
        coll.apply(Change::Inserted(a.clone()));
        coll.apply(Change::Updated(b.clone()));
        coll.apply(Change::Deleted(b.id));
        coll.apply(Change::Inserted(a.clone()));

        let mut seen = ids(&coll);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), coll.len());
    }

    #[test]
    fn fetch_duplicates_keep_first_occurrence() {
        let a = item("a");
        let mut a_again = a.clone();
        a_again.name = "a-later".to_string();

        let coll = LiveCollection::from_fetch(vec![a.clone(), a_again]);

        assert_eq!(coll.len(), 1);
        assert_eq!(coll.records()[0].name, "a");
    }

    #[test]
    fn empty_collection_accessors() {
        let coll: LiveCollection<Equipment> = LiveCollection::new();
        assert!(coll.is_empty());
        assert_eq!(coll.len(), 0);
        assert!(coll.get(Uuid::new_v4()).is_none());
    }
}
