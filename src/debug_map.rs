use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::air::AsmLine;
use crate::error::ImageError;
use crate::symbol::{LabelEntry, LabelTable};

/// Correlation data written next to a program image by `basm --debug`.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct DebugMap {
    labels: indexmap::IndexMap<String, LabelEntry>,
    /// Sorted by address; addresses are unique
    instructions: Vec<AsmLine>,
    source: String,
    source_path: String,
}

/// Extension appended to the image path to locate its debug map.
pub const DEBUG_EXTENSION: &str = "dbg";

impl DebugMap {
    pub(crate) fn new(
        labels: LabelTable,
        instructions: Vec<AsmLine>,
        source: String,
        source_path: String,
    ) -> Self {
        let labels = labels
            .iter()
            .map(|(name, entry)| (name.to_string(), *entry))
            .collect();
        DebugMap {
            labels,
            instructions,
            source,
            source_path,
        }
    }

    /// Where the debug map for the image at `image` lives: `foo.bin` -> `foo.bin.dbg`.
    pub fn path_for(image: &Path) -> PathBuf {
        let mut path = image.as_os_str().to_owned();
        path.push(".");
        path.push(DEBUG_EXTENSION);
        PathBuf::from(path)
    }

    pub fn from_json(json: &str) -> Result<Self, ImageError> {
        let mut map: DebugMap = serde_json::from_str(json)?;
        map.instructions.sort_by_key(|instr| instr.address);
        Ok(map)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("debug map contains only serializable data")
    }

    /// Source line of the instruction at `pc`, if there is one.
    pub fn line_for(&self, pc: u16) -> Option<usize> {
        self.instructions
            .binary_search_by_key(&pc, |instr| instr.address)
            .ok()
            .map(|index| self.instructions[index].line)
    }

    pub fn label_address(&self, name: &str) -> Option<u16> {
        self.labels.get(name).map(|entry| entry.address)
    }

    /// Every label bound to `address`, in definition order.
    pub fn labels_at(&self, address: u16) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(move |(_, entry)| entry.address == address)
            .map(|(name, _)| name.as_str())
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn source_lines(&self) -> impl Iterator<Item = &str> {
        self.source.lines()
    }

    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }
}
