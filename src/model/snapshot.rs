//! Saved scene states
//!
//! A snapshot records, per creator, which cell each on-plate term was in and
//! enough to rebuild it, plus the variable values. Terms in flight are not
//! recorded.

use serde::{Deserialize, Serialize};

use super::term::TermOptions;
use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub cell: usize,
    pub options: TermOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermCreatorSnapshot {
    pub entries: Vec<SnapshotEntry>,
}

/// One snapshot per creator, in scene creator order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub creators: Vec<TermCreatorSnapshot>,
    pub variable_values: Vec<i64>,
}

impl SceneSnapshot {
    pub fn number_of_terms(&self) -> usize {
        self.creators.iter().map(|c| c.entries.len()).sum()
    }
}

/// Fixed number of save slots with one selected
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshots {
    slots: Vec<Option<SceneSnapshot>>,
    selected: Option<usize>,
}

impl Snapshots {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
            selected: None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> ModelResult<Option<&SceneSnapshot>> {
        self.check(index)?;
        Ok(self.slots[index].as_ref())
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: usize) -> ModelResult<()> {
        self.check(index)?;
        self.selected = Some(index);
        Ok(())
    }

    /// Store into the first empty slot (or replace the selected one if all are
    /// full) and select it. Returns the slot used.
    pub fn save(&mut self, snapshot: SceneSnapshot) -> Option<usize> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .or(self.selected)?;
        self.slots[index] = Some(snapshot);
        self.selected = Some(index);
        Some(index)
    }

    /// Replace a specific slot
    pub fn save_at(&mut self, index: usize, snapshot: SceneSnapshot) -> ModelResult<()> {
        self.check(index)?;
        self.slots[index] = Some(snapshot);
        self.selected = Some(index);
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> ModelResult<Option<SceneSnapshot>> {
        self.check(index)?;
        if self.selected == Some(index) {
            self.selected = None;
        }
        Ok(self.slots[index].take())
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.selected = None;
    }

    fn check(&self, index: usize) -> ModelResult<()> {
        if index < self.slots.len() {
            Ok(())
        } else {
            Err(ModelError::InvalidSnapshotSlot {
                index,
                slots: self.slots.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(values: &[i64]) -> SceneSnapshot {
        SceneSnapshot {
            creators: vec![TermCreatorSnapshot::default()],
            variable_values: values.to_vec(),
        }
    }

    #[test]
    fn test_save_fills_then_replaces_selected() {
        let mut s = Snapshots::new(2);
        assert_eq!(s.save(snapshot(&[1])), Some(0));
        assert_eq!(s.save(snapshot(&[2])), Some(1));
        s.select(0).unwrap();
        assert_eq!(s.save(snapshot(&[3])), Some(0));
        assert_eq!(s.get(0).unwrap().unwrap().variable_values, vec![3]);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut s = Snapshots::new(2);
        s.save(snapshot(&[1]));
        s.save_at(1, snapshot(&[2])).unwrap();
        assert_eq!(s.delete(1).unwrap().unwrap().variable_values, vec![2]);
        assert_eq!(s.selected(), None);
        assert_eq!(s.save(snapshot(&[3])), Some(1));
        s.clear();
        assert!(s.get(0).unwrap().is_none());
        assert!(s.get(1).unwrap().is_none());
    }

    #[test]
    fn test_slot_bounds() {
        let mut s = Snapshots::new(5);
        assert_eq!(
            s.delete(5),
            Err(ModelError::InvalidSnapshotSlot { index: 5, slots: 5 })
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let snap = snapshot(&[4, -2]);
        let json = serde_json::to_string(&snap).unwrap();
        let back: SceneSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
