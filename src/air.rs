use serde::{Deserialize, Serialize};

use crate::debug_map::DebugMap;
use crate::image::Image;
use crate::symbol::LabelTable;

/// Source line an instruction was assembled from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct AsmLine {
    /// 1-based line number
    pub line: usize,
    pub address: u16,
}

/// Assembler output: the program image plus everything needed to build a debug map.
#[derive(Debug)]
pub struct Air {
    image: Image,
    /// One entry per word of `image`, in address order
    lines: Vec<AsmLine>,
    labels: LabelTable,
}

impl Air {
    pub(crate) fn new(image: Image, lines: Vec<AsmLine>, labels: LabelTable) -> Self {
        debug_assert_eq!(image.len(), lines.len());
        Air {
            image,
            lines,
            labels,
        }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn into_image(self) -> Image {
        self.image
    }

    pub fn lines(&self) -> &[AsmLine] {
        &self.lines
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.image.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    /// Build the debug map for this program, embedding the source it was assembled from.
    pub fn debug_map(&self, source: &str, source_path: &str) -> DebugMap {
        DebugMap::new(
            self.labels.clone(),
            self.lines.clone(),
            source.to_string(),
            source_path.to_string(),
        )
    }
}
