//! A library for decoding Android Binary XML (ABX) into a queryable tree.
//!
//! ABX is the compact binary serialization Android uses for system files such
//! as `/data/system/packages.xml`. This crate decodes a fully materialized
//! buffer into a [`Document`] whose elements can be walked and queried by tag
//! and attribute name. Every read is bounds-checked; malformed input produces
//! an [`AbxError`], never a panic.
//!
//! # Examples
//!
//! ```no_run
//! use abxtree::{AbxLoader, packages};
//!
//! let document = AbxLoader::load_file(packages::DEFAULT_PACKAGES_PATH).unwrap();
//! let root = document.root();
//! for package in root.children().filter(|c| c.tag_name() == b"package") {
//!     if let Some(path) = package.find_attribute("codePath") {
//!         println!("{}", path.as_str().unwrap_or("<binary>"));
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

mod binary_xml;
pub mod cli;
pub mod dump;
mod interned;
mod loader;
pub mod packages;
mod tree;

pub use binary_xml::{AbxDecoder, DecodeOptions, FastDataInput};
pub use interned::InternedStrings;
pub use loader::AbxLoader;
pub use tree::{
    Attribute, DataType, DecodeWarning, Document, Element, ElementId, TextKind, TextSection,
};

/// Error types for ABX decoding and the tools built on it
#[derive(Error, Debug)]
pub enum AbxError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Not an ABX document ({len} bytes, magic header missing or mismatched)")]
    NotAbxFormat { len: usize },
    #[error("Unexpected end of input at offset {offset}: wanted {wanted} bytes, {remaining} left")]
    UnexpectedEndOfInput {
        offset: usize,
        wanted: usize,
        remaining: usize,
    },
    #[error("Invalid interned string index {index} (table holds {len} entries)")]
    InternTableIndexOutOfRange { index: u16, len: usize },
    #[error("Unimplemented token {token} at offset {offset}")]
    UnimplementedToken { token: u8, offset: usize },
    #[error("Unknown attribute type: {0:#04X}")]
    UnknownAttributeType(u8),
    #[error("Token {token} at offset {offset} needs an open element")]
    NoOpenElement { token: u8, offset: usize },
    #[error("Mismatching end tag at offset {offset}: expected </{expected}>, found </{found}>")]
    TagMismatch {
        expected: String,
        found: String,
        offset: usize,
    },
    #[error("Element nesting exceeds the limit of {limit}")]
    DepthLimitExceeded { limit: usize },
    #[error("Unexpected root element <{found}>")]
    UnexpectedRoot { found: String },
    #[error("Invalid code path length: {len}")]
    InvalidCodePath { len: usize },
    #[error("{0}")]
    Cli(String),
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, AbxError>;

pub const PROTOCOL_MAGIC_VERSION_0: [u8; 4] = [0x41, 0x42, 0x58, 0x00];

// Command tokens
pub const START_DOCUMENT: u8 = 0;
pub const END_DOCUMENT: u8 = 1;
pub const START_TAG: u8 = 2;
pub const END_TAG: u8 = 3;
pub const TEXT: u8 = 4;
pub const CDSECT: u8 = 5;
pub const ENTITY_REF: u8 = 6;
pub const IGNORABLE_WHITESPACE: u8 = 7;
pub const PROCESSING_INSTRUCTION: u8 = 8;
pub const COMMENT: u8 = 9;
pub const DOCDECL: u8 = 10;
pub const ATTRIBUTE: u8 = 15;

// Type tokens
pub const TYPE_NULL: u8 = 1 << 4;
pub const TYPE_STRING: u8 = 2 << 4;
pub const TYPE_STRING_INTERNED: u8 = 3 << 4;
pub const TYPE_BYTES_HEX: u8 = 4 << 4;
pub const TYPE_BYTES_BASE64: u8 = 5 << 4;
pub const TYPE_INT: u8 = 6 << 4;
pub const TYPE_INT_HEX: u8 = 7 << 4;
pub const TYPE_LONG: u8 = 8 << 4;
pub const TYPE_LONG_HEX: u8 = 9 << 4;
pub const TYPE_FLOAT: u8 = 10 << 4;
pub const TYPE_DOUBLE: u8 = 11 << 4;
pub const TYPE_BOOLEAN_TRUE: u8 = 12 << 4;
pub const TYPE_BOOLEAN_FALSE: u8 = 13 << 4;

/// Decode a complete ABX buffer with default options.
pub fn decode(data: &[u8]) -> Result<Document> {
    AbxDecoder::new(data).decode()
}
