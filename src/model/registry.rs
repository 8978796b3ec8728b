//! Serialization registry for the blackboard
//!
//! Every persisted field is registered once, under a stable string key, as a
//! tagged slot: either a single [`Cell`] or a channel list. `read`/`write`
//! dispatch on the tag, never on runtime type inspection.

use crate::cell::{Cell, CellList, ResizePolicy};
use crate::error::{AlignmentError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Persistence behavior of a single-cell registry entry
pub(crate) trait ScalarField {
    fn store(&self) -> Result<Value>;
    fn load(&self, key: &str, value: &Value) -> Result<()>;
}

/// Persistence and resize behavior of a channel-list registry entry
pub(crate) trait SequenceField {
    fn store(&self) -> Result<Value>;
    fn load(&self, key: &str, value: &Value) -> Result<()>;
    fn resize(&self, count: usize);
}

impl<T> ScalarField for Cell<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
{
    fn store(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.get())?)
    }

    fn load(&self, key: &str, value: &Value) -> Result<()> {
        let parsed: T =
            serde_json::from_value(value.clone()).map_err(|source| AlignmentError::FieldDecode {
                key: key.to_string(),
                source,
            })?;
        self.set(parsed);
        Ok(())
    }
}

struct SequenceSlot<T> {
    list: CellList<T>,
    policy: ResizePolicy,
}

impl<T> SequenceField for SequenceSlot<T>
where
    T: Clone + PartialEq + Default + Serialize + DeserializeOwned + 'static,
{
    fn store(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.list.values())?)
    }

    /// Set each existing index and append cells for indices beyond the
    /// current length. The list never shrinks during a load.
    fn load(&self, key: &str, value: &Value) -> Result<()> {
        let parsed: Vec<T> =
            serde_json::from_value(value.clone()).map_err(|source| AlignmentError::FieldDecode {
                key: key.to_string(),
                source,
            })?;
        for (index, item) in parsed.into_iter().enumerate() {
            match self.list.get(index) {
                Some(cell) => cell.set(item),
                None => self.list.push(item),
            }
        }
        Ok(())
    }

    fn resize(&self, count: usize) {
        self.list.resize(count, self.policy);
    }
}

/// Tagged registry entry: a scalar cell or an ordered channel list
pub(crate) enum Slot {
    Scalar(Box<dyn ScalarField>),
    Sequence(Box<dyn SequenceField>),
}

/// Ordered map from persistent field name to slot, built once at blackboard
/// construction.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Vec<(&'static str, Slot)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar<T>(&mut self, key: &'static str, cell: &Cell<T>)
    where
        T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
    {
        debug_assert!(
            self.find(key).is_none(),
            "field {key:?} registered twice"
        );
        self.entries.push((key, Slot::Scalar(Box::new(cell.clone()))));
    }

    pub fn sequence<T>(&mut self, key: &'static str, list: &CellList<T>, policy: ResizePolicy)
    where
        T: Clone + PartialEq + Default + Serialize + DeserializeOwned + 'static,
    {
        debug_assert!(
            self.find(key).is_none(),
            "field {key:?} registered twice"
        );
        self.entries.push((
            key,
            Slot::Sequence(Box::new(SequenceSlot {
                list: list.clone(),
                policy,
            })),
        ));
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &Slot)> {
        self.entries.iter().map(|(key, slot)| (*key, slot))
    }

    pub fn find(&self, key: &str) -> Option<&Slot> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, slot)| slot)
    }
}
