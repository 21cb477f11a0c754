//! Indented outline of a decoded document, for eyeballing device files.

use crate::{Attribute, DataType, Document, Element, TextKind, TextSection};
use std::io::{self, Write};

const INDENT: &str = "  ";

/// Write one line per element, attribute values inline, text sections below.
pub fn write_outline<W: Write>(document: &Document, mut output: W) -> io::Result<()> {
    for section in document.prolog() {
        writeln!(output, "{}", describe_text(section))?;
    }

    let mut pending: Vec<(Element<'_>, usize)> = vec![(document.root(), 0)];
    while let Some((element, depth)) = pending.pop() {
        let indent = INDENT.repeat(depth);
        write!(output, "{indent}{}", element.tag_name_lossy())?;
        for (name, attribute) in element.attributes() {
            write!(
                output,
                " {}={}",
                String::from_utf8_lossy(name),
                describe_value(attribute)
            )?;
        }
        writeln!(output)?;

        for section in element.text_sections() {
            writeln!(output, "{indent}{INDENT}{}", describe_text(section))?;
        }

        let children: Vec<_> = element.children().collect();
        pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }

    for warning in document.warnings() {
        writeln!(output, "! {warning}")?;
    }
    output.flush()
}

pub fn outline_string(document: &Document) -> String {
    let mut output = Vec::new();
    write_outline(document, &mut output).expect("writing to a Vec");
    String::from_utf8_lossy(&output).into_owned()
}

fn describe_value(attribute: &Attribute) -> String {
    match attribute.data_type() {
        DataType::String | DataType::StringInterned => {
            format!("{:?}", String::from_utf8_lossy(attribute.value()))
        }
        DataType::Null | DataType::BooleanTrue | DataType::BooleanFalse => {
            String::from_utf8_lossy(attribute.value()).into_owned()
        }
        other => format!("{other}:{}", hex::encode_upper(attribute.value())),
    }
}

fn describe_text(section: &TextSection) -> String {
    let label = match section.kind() {
        TextKind::Text => "#text",
        TextKind::CData => "#cdata",
        TextKind::ProcessingInstruction => "#pi",
        TextKind::Comment => "#comment",
        TextKind::DocDecl => "#doctype",
        TextKind::IgnorableWhitespace => "#whitespace",
    };
    format!("{label} {:?}", String::from_utf8_lossy(section.content()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_value() {
        let int = Attribute::new(DataType::Int, vec![0x00, 0x00, 0x01, 0x2C]);
        assert_eq!(describe_value(&int), "int:0000012C");

        let string = Attribute::new(DataType::String, b"/data/app".to_vec());
        assert_eq!(describe_value(&string), "\"/data/app\"");

        let flag = Attribute::new(DataType::BooleanTrue, b"true".to_vec());
        assert_eq!(describe_value(&flag), "true");
    }

    #[test]
    fn test_describe_text() {
        let comment = TextSection::new(TextKind::Comment, b" generated ".to_vec());
        assert_eq!(describe_text(&comment), "#comment \" generated \"");
    }
}
