//! Decoded document model.
//!
//! Elements live in an arena owned by [`Document`] and refer to each other by
//! [`ElementId`]. [`Element`] is a cheap borrowed handle over that arena and
//! is the query surface handed to callers.

use crate::{
    CDSECT, COMMENT, DOCDECL, IGNORABLE_WHITESPACE, PROCESSING_INSTRUCTION, TEXT,
    TYPE_BOOLEAN_FALSE, TYPE_BOOLEAN_TRUE, TYPE_BYTES_BASE64, TYPE_BYTES_HEX, TYPE_DOUBLE,
    TYPE_FLOAT, TYPE_INT, TYPE_INT_HEX, TYPE_LONG, TYPE_LONG_HEX, TYPE_NULL, TYPE_STRING,
    TYPE_STRING_INTERNED,
};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Value kind of an attribute, taken from the high nibble of its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Null,
    String,
    StringInterned,
    BytesHex,
    BytesBase64,
    Int,
    IntHex,
    Long,
    LongHex,
    Float,
    Double,
    BooleanTrue,
    BooleanFalse,
}

impl DataType {
    /// Map the high nibble of a token byte to a data type.
    pub fn from_bits(bits: u8) -> Option<Self> {
        let data_type = match bits & 0xF0 {
            TYPE_NULL => Self::Null,
            TYPE_STRING => Self::String,
            TYPE_STRING_INTERNED => Self::StringInterned,
            TYPE_BYTES_HEX => Self::BytesHex,
            TYPE_BYTES_BASE64 => Self::BytesBase64,
            TYPE_INT => Self::Int,
            TYPE_INT_HEX => Self::IntHex,
            TYPE_LONG => Self::Long,
            TYPE_LONG_HEX => Self::LongHex,
            TYPE_FLOAT => Self::Float,
            TYPE_DOUBLE => Self::Double,
            TYPE_BOOLEAN_TRUE => Self::BooleanTrue,
            TYPE_BOOLEAN_FALSE => Self::BooleanFalse,
            _ => return None,
        };
        Some(data_type)
    }

    /// Number of payload bytes the stream carries for this type, when fixed.
    ///
    /// Literal types carry nothing on the wire; string-like types are
    /// length-prefixed and return `None`.
    pub fn wire_width(self) -> Option<usize> {
        match self {
            Self::Null | Self::BooleanTrue | Self::BooleanFalse => Some(0),
            Self::Int | Self::IntHex | Self::Float => Some(4),
            Self::Long | Self::LongHex | Self::Double => Some(8),
            Self::String | Self::StringInterned | Self::BytesHex | Self::BytesBase64 => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String => "string",
            Self::StringInterned => "string-interned",
            Self::BytesHex => "bytes-hex",
            Self::BytesBase64 => "bytes-base64",
            Self::Int => "int",
            Self::IntHex => "int-hex",
            Self::Long => "long",
            Self::LongHex => "long-hex",
            Self::Float => "float",
            Self::Double => "double",
            Self::BooleanTrue => "boolean-true",
            Self::BooleanFalse => "boolean-false",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a text-like token attached to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    Text,
    CData,
    ProcessingInstruction,
    Comment,
    DocDecl,
    IgnorableWhitespace,
}

impl TextKind {
    pub fn from_token(token: u8) -> Option<Self> {
        let kind = match token & 0x0F {
            TEXT => Self::Text,
            CDSECT => Self::CData,
            PROCESSING_INSTRUCTION => Self::ProcessingInstruction,
            COMMENT => Self::Comment,
            DOCDECL => Self::DocDecl,
            IGNORABLE_WHITESPACE => Self::IgnorableWhitespace,
            _ => return None,
        };
        Some(kind)
    }
}

/// A typed attribute value with its raw payload.
///
/// Numeric payloads are kept as their big-endian wire bytes and hex/base64
/// payloads as the bytes the stream carried; interpretation is up to the
/// caller. Interned values share their allocation with the rest of the
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    data_type: DataType,
    value: Rc<[u8]>,
}

impl Attribute {
    pub fn new(data_type: DataType, value: impl Into<Rc<[u8]>>) -> Self {
        Self {
            data_type,
            value: value.into(),
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The payload as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

/// Text, comment, CDATA and similar content captured on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSection {
    kind: TextKind,
    content: Vec<u8>,
}

impl TextSection {
    pub fn new(kind: TextKind, content: Vec<u8>) -> Self {
        Self { kind, content }
    }

    pub fn kind(&self) -> TextKind {
        self.kind
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Something suspicious the decoder recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// An end tag named a different element than the one it closed.
    TagMismatch {
        expected: Rc<[u8]>,
        found: Rc<[u8]>,
        offset: usize,
    },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagMismatch {
                expected,
                found,
                offset,
            } => write!(
                f,
                "mismatching tags at offset {offset}: <{}> closed by </{}>",
                String::from_utf8_lossy(expected),
                String::from_utf8_lossy(found)
            ),
        }
    }
}

/// Index of an element inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ElementNode {
    pub(crate) tag: Rc<[u8]>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) attributes: BTreeMap<Rc<[u8]>, Attribute>,
    pub(crate) text_sections: Vec<TextSection>,
    pub(crate) children: Vec<ElementId>,
}

impl ElementNode {
    pub(crate) fn new(tag: Rc<[u8]>, parent: Option<ElementId>) -> Self {
        Self {
            tag,
            parent,
            attributes: BTreeMap::new(),
            text_sections: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// A fully decoded ABX document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<ElementNode>,
    root: ElementId,
    prolog: Vec<TextSection>,
    warnings: Vec<DecodeWarning>,
}

impl Document {
    pub(crate) fn new(
        nodes: Vec<ElementNode>,
        root: ElementId,
        prolog: Vec<TextSection>,
        warnings: Vec<DecodeWarning>,
    ) -> Self {
        debug_assert!(root.0 < nodes.len());
        Self {
            nodes,
            root,
            prolog,
            warnings,
        }
    }

    pub fn root(&self) -> Element<'_> {
        Element {
            document: self,
            id: self.root,
        }
    }

    pub fn element(&self, id: ElementId) -> Option<Element<'_>> {
        (id.0 < self.nodes.len()).then_some(Element { document: self, id })
    }

    /// Number of elements in the document, root included.
    pub fn element_count(&self) -> usize {
        self.nodes.len()
    }

    /// Text sections that appeared before the root element opened.
    pub fn prolog(&self) -> &[TextSection] {
        &self.prolog
    }

    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }
}

/// Borrowed handle to one element of a [`Document`].
#[derive(Clone, Copy)]
pub struct Element<'a> {
    document: &'a Document,
    id: ElementId,
}

impl<'a> Element<'a> {
    fn node(&self) -> &'a ElementNode {
        &self.document.nodes[self.id.0]
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn tag_name(&self) -> &'a [u8] {
        &self.node().tag
    }

    pub fn tag_name_lossy(&self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.tag_name())
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        self.node().parent.map(|id| Element {
            document: self.document,
            id,
        })
    }

    /// Child at `index` in document order, or `None` when out of range.
    pub fn child_at(&self, index: usize) -> Option<Element<'a>> {
        self.node().children.get(index).map(|&id| Element {
            document: self.document,
            id,
        })
    }

    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }

    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + use<'a> {
        let document = self.document;
        self.node()
            .children
            .iter()
            .map(move |&id| Element { document, id })
    }

    /// First child whose tag name equals `tag`.
    pub fn find_child(&self, tag: impl AsRef<[u8]>) -> Option<Element<'a>> {
        let tag = tag.as_ref();
        self.children().find(|child| child.tag_name() == tag)
    }

    /// Attribute whose name equals `name` byte for byte.
    pub fn find_attribute(&self, name: impl AsRef<[u8]>) -> Option<&'a Attribute> {
        self.node().attributes.get(name.as_ref())
    }

    /// Attributes ordered by name.
    pub fn attributes(&self) -> impl Iterator<Item = (&'a [u8], &'a Attribute)> + use<'a> {
        self.node()
            .attributes
            .iter()
            .map(|(name, attribute)| (&**name, attribute))
    }

    pub fn attribute_count(&self) -> usize {
        self.node().attributes.len()
    }

    pub fn text_sections(&self) -> &'a [TextSection] {
        &self.node().text_sections
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("tag", &self.tag_name_lossy())
            .field("children", &self.child_count())
            .finish()
    }
}
