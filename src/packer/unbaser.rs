use std::collections::HashMap;

use super::UnpackError;

const ALPHABET_62: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHABET_95: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Converts packer placeholder words back into symbol table indices
#[derive(Debug)]
pub struct Unbaser {
    radix: usize,
    dictionary: Option<HashMap<char, usize>>,
}

impl Unbaser {
    /// # Errors
    /// Errors when the radix is neither `2..=62` nor `95`
    pub fn new(radix: usize) -> Result<Self, UnpackError> {
        let alphabet = match radix {
            2..=36 => None,
            37..=62 => Some(&ALPHABET_62[..radix]),
            95 => Some(ALPHABET_95),
            _ => return Err(UnpackError::UnsupportedRadix(radix)),
        };

        let dictionary = alphabet.map(|a| a.chars().enumerate().map(|(i, c)| (c, i)).collect());

        Ok(Self { radix, dictionary })
    }

    /// Decodes a single word, returning `None` if it is not a valid number in this base
    pub fn unbase(&self, word: &str) -> Option<usize> {
        let Some(dictionary) = &self.dictionary else {
            #[allow(clippy::cast_possible_truncation)]
            return usize::from_str_radix(word, self.radix as u32).ok();
        };

        word.chars().try_fold(0usize, |acc, c| {
            let digit = dictionary.get(&c)?;
            acc.checked_mul(self.radix)?.checked_add(*digit)
        })
    }
}
