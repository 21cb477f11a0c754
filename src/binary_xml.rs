use crate::tree::{ElementNode, TextKind, TextSection};
use crate::{ATTRIBUTE, END_DOCUMENT, END_TAG, START_DOCUMENT, START_TAG};
use crate::{AbxError, PROTOCOL_MAGIC_VERSION_0, Result};
use crate::{Attribute, DataType, DecodeWarning, Document, ElementId, InternedStrings};
use std::rc::Rc;

/// Smallest buffer that can hold the magic header plus one token.
const MIN_DOCUMENT_LEN: usize = PROTOCOL_MAGIC_VERSION_0.len() + 1;

/// Forward-only, bounds-checked reader over an in-memory ABX buffer
#[derive(Debug, Clone)]
pub struct FastDataInput<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> FastDataInput<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Read exactly `length` bytes. The position is left untouched on failure.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if length > remaining {
            return Err(AbxError::UnexpectedEndOfInput {
                offset: self.position,
                wanted: length,
                remaining,
            });
        }
        let bytes = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(bytes)
    }

    /// Read a fixed number of bytes into an array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    /// Read a 16-bit unsigned integer (big-endian)
    pub fn read_short(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Read a 16-bit signed integer (big-endian)
    pub fn read_signed_short(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    /// Read a length-prefixed string. A zero length consumes nothing further.
    pub fn read_utf(&mut self) -> Result<&'a [u8]> {
        let length = self.read_short()?;
        if length == 0 {
            return Ok(&[]);
        }
        self.read_bytes(length as usize)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_eof(&self) -> bool {
        self.remaining() == 0
    }
}

/// Knobs for [`AbxDecoder`].
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    strict_end_tags: bool,
    max_depth: Option<usize>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on an end tag that does not name the open element instead of
    /// recording a warning.
    pub fn strict_end_tags(mut self, strict: bool) -> Self {
        self.strict_end_tags = strict;
        self
    }

    /// Reject documents nesting elements deeper than `depth`.
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_end_tags
    }

    pub fn depth_limit(&self) -> Option<usize> {
        self.max_depth
    }
}

enum Step {
    Continue,
    RootClosed(ElementId),
}

/// Decodes an ABX buffer into a [`Document`].
///
/// Each decoder owns its cursor, interned string table and element stack;
/// nothing is shared between decodes.
pub struct AbxDecoder<'a> {
    input: FastDataInput<'a>,
    options: DecodeOptions,
    interned_strings: InternedStrings,
    nodes: Vec<ElementNode>,
    element_stack: Vec<ElementId>,
    prolog: Vec<TextSection>,
    warnings: Vec<DecodeWarning>,
    document_open: bool,
}

impl<'a> AbxDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, DecodeOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            input: FastDataInput::new(data),
            options,
            interned_strings: InternedStrings::new(),
            nodes: Vec::new(),
            element_stack: Vec::new(),
            prolog: Vec::new(),
            warnings: Vec::new(),
            document_open: false,
        }
    }

    /// Decode the whole buffer. Succeeds only once the root element closes.
    pub fn decode(mut self) -> Result<Document> {
        self.read_header()?;

        loop {
            let offset = self.input.position();
            let token = self.input.read_byte()?;
            if let Step::RootClosed(root) = self.process_token(token, offset)? {
                log::debug!(
                    "ABX document decoded: {} elements, {} interned strings, {} warnings",
                    self.nodes.len(),
                    self.interned_strings.len(),
                    self.warnings.len()
                );
                return Ok(Document::new(self.nodes, root, self.prolog, self.warnings));
            }
        }
    }

    fn read_header(&mut self) -> Result<()> {
        let data = self.input.data;
        if data.len() < MIN_DOCUMENT_LEN || data[..4] != PROTOCOL_MAGIC_VERSION_0 {
            return Err(AbxError::NotAbxFormat { len: data.len() });
        }
        self.input.read_array::<4>()?;
        log::debug!("ABX file found ({} bytes)", data.len());
        Ok(())
    }

    /// Process a single token from the binary stream
    fn process_token(&mut self, token: u8, offset: usize) -> Result<Step> {
        let command = token & 0x0F;
        let type_info = token & 0xF0;
        log::trace!(target: "abx.decoder", "token {command} type {type_info:#04X} at {offset}");

        match command {
            START_DOCUMENT => {
                if self.document_open {
                    log::warn!("Repeated START_DOCUMENT at offset {offset}");
                }
                self.document_open = true;
                Ok(Step::Continue)
            }

            END_DOCUMENT => {
                self.document_open = false;
                Ok(Step::Continue)
            }

            START_TAG => {
                let tag_name = self.interned_strings.read_interned_utf(&mut self.input)?;
                self.open_element(tag_name)?;
                Ok(Step::Continue)
            }

            END_TAG => {
                let current = self.current_element(command, offset)?;
                let tag_name = self.interned_strings.read_interned_utf(&mut self.input)?;
                self.check_end_tag(current, tag_name, offset)?;

                if self.element_stack.len() == 1 {
                    self.document_open = false;
                    return Ok(Step::RootClosed(current));
                }
                self.element_stack.pop();
                Ok(Step::Continue)
            }

            ATTRIBUTE => {
                let current = self.current_element(command, offset)?;
                let name = self.interned_strings.read_interned_utf(&mut self.input)?;
                let attribute = self.read_attribute_value(type_info)?;
                self.nodes[current.0].attributes.insert(name, attribute);
                Ok(Step::Continue)
            }

            _ => match TextKind::from_token(command) {
                Some(kind) => {
                    let content = self.input.read_utf()?.to_vec();
                    let section = TextSection::new(kind, content);
                    match self.element_stack.last() {
                        Some(current) => self.nodes[current.0].text_sections.push(section),
                        None => self.prolog.push(section),
                    }
                    Ok(Step::Continue)
                }
                None => {
                    log::error!("Unimplemented token {command} (type {type_info:#04X}) at {offset}");
                    Err(AbxError::UnimplementedToken {
                        token: command,
                        offset,
                    })
                }
            },
        }
    }

    fn open_element(&mut self, tag_name: Rc<[u8]>) -> Result<()> {
        if let Some(limit) = self.options.max_depth {
            if self.element_stack.len() >= limit {
                return Err(AbxError::DepthLimitExceeded { limit });
            }
        }

        let id = ElementId(self.nodes.len());
        let parent = self.element_stack.last().copied();
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        self.nodes.push(ElementNode::new(tag_name, parent));
        self.element_stack.push(id);
        Ok(())
    }

    fn current_element(&self, token: u8, offset: usize) -> Result<ElementId> {
        self.element_stack
            .last()
            .copied()
            .ok_or(AbxError::NoOpenElement { token, offset })
    }

    fn check_end_tag(&mut self, current: ElementId, tag_name: Rc<[u8]>, offset: usize) -> Result<()> {
        let expected = &self.nodes[current.0].tag;
        if **expected == *tag_name {
            return Ok(());
        }

        if self.options.strict_end_tags {
            return Err(AbxError::TagMismatch {
                expected: String::from_utf8_lossy(expected).into_owned(),
                found: String::from_utf8_lossy(&tag_name).into_owned(),
                offset,
            });
        }

        let warning = DecodeWarning::TagMismatch {
            expected: Rc::clone(expected),
            found: tag_name,
            offset,
        };
        log::warn!("{warning}");
        self.warnings.push(warning);
        Ok(())
    }

    /// Decode an attribute payload according to the token's type nibble
    fn read_attribute_value(&mut self, type_info: u8) -> Result<Attribute> {
        let data_type =
            DataType::from_bits(type_info).ok_or(AbxError::UnknownAttributeType(type_info))?;

        let value: Rc<[u8]> = match data_type {
            DataType::Null => Rc::from(&b"null"[..]),
            DataType::BooleanFalse => Rc::from(&b"false"[..]),
            DataType::BooleanTrue => Rc::from(&b"true"[..]),
            DataType::StringInterned => self.interned_strings.read_interned_utf(&mut self.input)?,
            _ => match data_type.wire_width() {
                Some(width) => Rc::from(self.input.read_bytes(width)?),
                None => Rc::from(self.input.read_utf()?),
            },
        };

        Ok(Attribute::new(data_type, value))
    }
}
