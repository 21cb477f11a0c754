#![allow(dead_code)]

use abxtree::{
    ATTRIBUTE, DataType, Document, Element, END_DOCUMENT, END_TAG, PROTOCOL_MAGIC_VERSION_0,
    START_DOCUMENT, START_TAG, TYPE_BOOLEAN_FALSE, TYPE_BOOLEAN_TRUE, TYPE_STRING,
    TYPE_STRING_INTERNED,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Token-level ABX writer mirroring what Android's serializer emits.
pub struct AbxWriter {
    out: Vec<u8>,
    interned: Vec<Vec<u8>>,
}

impl AbxWriter {
    pub fn new() -> Self {
        Self {
            out: PROTOCOL_MAGIC_VERSION_0.to_vec(),
            interned: Vec::new(),
        }
    }

    pub fn token(&mut self, token: u8) -> &mut Self {
        self.out.push(token);
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    pub fn utf(&mut self, value: &[u8]) -> &mut Self {
        self.out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.out.extend_from_slice(value);
        self
    }

    pub fn interned(&mut self, value: &[u8]) -> &mut Self {
        match self.interned.iter().position(|s| s == value) {
            Some(index) => {
                self.out.extend_from_slice(&(index as u16).to_be_bytes());
            }
            None => {
                self.out.extend_from_slice(&[0xFF, 0xFF]);
                self.utf(value);
                self.interned.push(value.to_vec());
            }
        }
        self
    }

    pub fn start_document(&mut self) -> &mut Self {
        self.token(START_DOCUMENT)
    }

    pub fn end_document(&mut self) -> &mut Self {
        self.token(END_DOCUMENT)
    }

    pub fn start_tag(&mut self, name: &str) -> &mut Self {
        self.token(START_TAG).interned(name.as_bytes())
    }

    pub fn end_tag(&mut self, name: &str) -> &mut Self {
        self.token(END_TAG).interned(name.as_bytes())
    }

    pub fn text(&mut self, token: u8, content: &str) -> &mut Self {
        self.token(token | TYPE_STRING).utf(content.as_bytes())
    }

    pub fn attribute_string(&mut self, name: &str, value: &str) -> &mut Self {
        self.token(ATTRIBUTE | TYPE_STRING)
            .interned(name.as_bytes())
            .utf(value.as_bytes())
    }

    pub fn attribute_interned(&mut self, name: &str, value: &str) -> &mut Self {
        self.token(ATTRIBUTE | TYPE_STRING_INTERNED)
            .interned(name.as_bytes())
            .interned(value.as_bytes())
    }

    /// Attribute whose payload follows the name verbatim (numbers, literals).
    pub fn attribute_fixed(&mut self, name: &str, type_bits: u8, payload: &[u8]) -> &mut Self {
        self.token(ATTRIBUTE | type_bits)
            .interned(name.as_bytes())
            .raw(payload)
    }

    /// Attribute whose payload is length-prefixed (strings, hex/base64 bytes).
    pub fn attribute_bytes(&mut self, name: &str, type_bits: u8, payload: &[u8]) -> &mut Self {
        self.token(ATTRIBUTE | type_bits)
            .interned(name.as_bytes())
            .utf(payload)
    }

    pub fn interned_count(&self) -> usize {
        self.interned.len()
    }

    pub fn finish(&self) -> Vec<u8> {
        self.out.clone()
    }
}

/// The `packages.xml` shape from the package manager, one app installed.
pub fn single_package_document() -> Vec<u8> {
    AbxWriter::new()
        .start_document()
        .start_tag("packages")
        .start_tag("package")
        .attribute_string("name", "com.example.app")
        .attribute_string("codePath", "/data/app/example")
        .end_tag("package")
        .end_tag("packages")
        .end_document()
        .finish()
}

/// Comparable view of an element: tag, sorted typed attributes, children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    pub tag: String,
    pub attributes: Vec<(String, DataType, Vec<u8>)>,
    pub children: Vec<Shape>,
}

pub fn shape_of(element: Element<'_>) -> Shape {
    Shape {
        tag: element.tag_name_lossy().into_owned(),
        attributes: element
            .attributes()
            .map(|(name, attribute)| {
                (
                    String::from_utf8_lossy(name).into_owned(),
                    attribute.data_type(),
                    attribute.value().to_vec(),
                )
            })
            .collect(),
        children: element.children().map(shape_of).collect(),
    }
}

pub fn document_shape(document: &Document) -> Shape {
    shape_of(document.root())
}

fn attribute_type(value: &[u8]) -> DataType {
    match value {
        b"true" => DataType::BooleanTrue,
        b"false" => DataType::BooleanFalse,
        _ => DataType::String,
    }
}

fn write_start(writer: &mut AbxWriter, start: &BytesStart<'_>) {
    writer.start_tag(&String::from_utf8_lossy(start.name().as_ref()));
    for attribute in start.attributes() {
        let attribute = attribute.expect("fixture attribute");
        let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        match attribute_type(&attribute.value) {
            DataType::BooleanTrue => writer.attribute_fixed(&name, TYPE_BOOLEAN_TRUE, &[]),
            DataType::BooleanFalse => writer.attribute_fixed(&name, TYPE_BOOLEAN_FALSE, &[]),
            _ => writer.attribute_bytes(&name, TYPE_STRING, &attribute.value),
        };
    }
}

/// Reference encoder: text XML fixture to ABX, interning every name.
pub fn encode_xml(xml: &str) -> Vec<u8> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut writer = AbxWriter::new();
    writer.start_document();

    loop {
        match reader.read_event().expect("fixture xml") {
            Event::Start(start) => write_start(&mut writer, &start),
            Event::Empty(start) => {
                write_start(&mut writer, &start);
                writer.end_tag(&String::from_utf8_lossy(start.name().as_ref()));
            }
            Event::End(end) => {
                writer.end_tag(&String::from_utf8_lossy(end.name().as_ref()));
            }
            Event::Text(text) => {
                writer.text(abxtree::TEXT, &String::from_utf8_lossy(&text));
            }
            Event::CData(cdata) => {
                writer.text(abxtree::CDSECT, &String::from_utf8_lossy(&cdata));
            }
            Event::Comment(comment) => {
                writer.text(abxtree::COMMENT, &String::from_utf8_lossy(&comment));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    writer.end_document();
    writer.finish()
}

/// Expected shape of a fixture, read independently with quick-xml.
pub fn xml_shape(xml: &str) -> Shape {
    fn open(start: &BytesStart<'_>) -> Shape {
        let mut attributes: Vec<_> = start
            .attributes()
            .map(|attribute| {
                let attribute = attribute.expect("fixture attribute");
                let value = attribute.value.to_vec();
                (
                    String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                    attribute_type(&value),
                    value,
                )
            })
            .collect();
        attributes.sort_by(|a, b| a.0.cmp(&b.0));
        Shape {
            tag: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
        }
    }

    fn close(stack: &mut Vec<Shape>, root: &mut Option<Shape>) {
        let done = stack.pop().expect("balanced fixture");
        match stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => *root = Some(done),
        }
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<Shape> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().expect("fixture xml") {
            Event::Start(start) => stack.push(open(&start)),
            Event::Empty(start) => {
                stack.push(open(&start));
                close(&mut stack, &mut root);
            }
            Event::End(_) => close(&mut stack, &mut root),
            Event::Eof => break,
            _ => {}
        }
    }

    root.expect("fixture has a root element")
}
