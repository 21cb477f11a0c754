use crate::binary_xml::FastDataInput;
use crate::{AbxError, Result};
use std::rc::Rc;

/// Append-only table of strings registered while decoding one stream.
///
/// A string is registered the first time it appears (signalled by a negative
/// index) and is referenced by its registration position afterwards. Every
/// reference hands out the same allocation.
#[derive(Debug, Default, Clone)]
pub struct InternedStrings {
    entries: Vec<Rc<[u8]>>,
}

impl InternedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an interned string reference, registering a new entry when the
    /// index is negative.
    pub fn read_interned_utf(&mut self, input: &mut FastDataInput<'_>) -> Result<Rc<[u8]>> {
        let index = input.read_signed_short()?;
        if index < 0 {
            let string: Rc<[u8]> = Rc::from(input.read_utf()?);
            self.entries.push(Rc::clone(&string));
            Ok(string)
        } else {
            self.entry(index as usize)
                .ok_or_else(|| AbxError::InternTableIndexOutOfRange {
                    index: index as u16,
                    len: self.entries.len(),
                })
        }
    }

    /// Shared handle to the entry registered at `index`.
    pub fn entry(&self, index: usize) -> Option<Rc<[u8]>> {
        self.entries.get(index).cloned()
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.entries.get(index).map(|entry| &**entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.iter().map(|entry| &**entry)
    }
}
