use fxhash::FxBuildHasher;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::AsmErrorKind;

type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Where a label was defined and the instruction address it names.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LabelEntry {
    pub line: usize,
    pub address: u16,
}

/// Symbol table of label -> address, in definition order.
///
/// Owned by a single assembly run; filled completely by the first pass before the
/// second pass reads from it.
#[derive(Clone, Default, Debug)]
pub struct LabelTable {
    labels: FxMap<String, LabelEntry>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `address`. Fails if the name is already bound.
    pub fn define(&mut self, name: &str, line: usize, address: u16) -> Result<(), AsmErrorKind> {
        match self.labels.entry(name.to_string()) {
            Entry::Occupied(_) => Err(AsmErrorKind::DuplicateLabel(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(LabelEntry { line, address });
                Ok(())
            }
        }
    }

    pub fn address(&self, name: &str) -> Option<u16> {
        self.labels.get(name).map(|entry| entry.address)
    }

    pub fn get(&self, name: &str) -> Option<&LabelEntry> {
        self.labels.get(name)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelEntry)> {
        self.labels.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}
