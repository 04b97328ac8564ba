use crate::error::ImageError;
use crate::isa::ADDRESS_SPACE;

/// Maximum number of words in a program.
pub const MAX_WORDS: usize = ADDRESS_SPACE as usize;

/// Assembled program: one word per instruction address.
///
/// Stored on disk as big-endian words with no header.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Image {
    words: Vec<u16>,
}

impl Image {
    /// Caller must ensure `words.len() <= MAX_WORDS`. See [`Image::try_from_words`].
    pub(crate) fn from_words(words: Vec<u16>) -> Self {
        debug_assert!(words.len() <= MAX_WORDS);
        Image { words }
    }

    pub fn try_from_words(words: Vec<u16>) -> Result<Self, ImageError> {
        if words.len() > MAX_WORDS {
            return Err(ImageError::TooLong(words.len()));
        }
        Ok(Image { words })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() % 2 != 0 {
            return Err(ImageError::Unaligned(bytes.len()));
        }
        let words = bytes
            .chunks_exact(2)
            .map(|word| u16::from_be_bytes([word[0], word[1]]))
            .collect();
        Self::try_from_words(words)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|word| word.to_be_bytes()).collect()
    }

    /// Word at `address`. Addresses past the end of the program read as `nop`.
    pub fn fetch(&self, address: u16) -> u16 {
        self.words.get(address as usize).copied().unwrap_or(0)
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
