//! VDEX document writer

use std::collections::BTreeMap;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{TaxonomyError, TaxonomyResult};
use crate::hierarchy::{HierarchyIndex, TranslationTable};
use crate::store::TermId;

pub const IMSVDEX_NAMESPACE: &str = "http://www.imsglobal.org/xsd/imsvdex_v1p0";

/// Fixed attributes of the `<vdex>` root element, in output order
pub const IMSVDEX_ATTRIBUTES: [(&str, &str); 6] = [
    ("xmlns", IMSVDEX_NAMESPACE),
    ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    (
        "xsi:schemaLocation",
        "http://www.imsglobal.org/xsd/imsvdex_v1p0 imsvdex_v1p0.xsd \
         http://www.imsglobal.org/xsd/imsmd_rootv1p2p1 imsmd_rootv1p2p1.xsd",
    ),
    ("orderSignificant", "false"),
    ("profileType", "hierarchicalTokenTerms"),
    ("language", "en"),
];

/// Language of the `vocabName` caption
const VOCAB_NAME_LANGUAGE: &str = "en";

/// Output settings of [`serialize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Encoding named in the XML declaration
    pub encoding: String,
    /// Spaces per nesting level
    pub indent: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            encoding: "utf-8".to_string(),
            indent: 2,
        }
    }
}

/// Serialize a taxonomy to a VDEX document.
///
/// Terms are written in ascending identifier order at every level and each
/// caption lists its languages in ascending order, so equal inputs always give
/// byte-identical output. The encoding is upper-cased in the declaration; the
/// returned text itself is UTF-8.
///
/// # Arguments
/// * `title` - Written as the English `vocabName`
/// * `vocabulary_identifier` - Written as `vocabIdentifier`
/// * `index` - Shape of the tree, see [`crate::hierarchy::build_path_index`]
/// * `table` - Per-term captions, see [`crate::hierarchy::make_translation_table`]
/// * `options` - Declaration encoding and indentation
pub fn serialize(
    title: &str,
    vocabulary_identifier: &str,
    index: &HierarchyIndex,
    table: &TranslationTable,
    options: &WriterOptions,
) -> TaxonomyResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', options.indent);
    let encoding = options.encoding.to_uppercase();

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some(encoding.as_str()), None)),
    )?;

    let mut root = BytesStart::new("vdex");
    for attribute in IMSVDEX_ATTRIBUTES {
        root.push_attribute(attribute);
    }
    write(&mut writer, Event::Start(root))?;

    write(&mut writer, Event::Start(BytesStart::new("vocabName")))?;
    write_langstring(&mut writer, VOCAB_NAME_LANGUAGE, title)?;
    write(&mut writer, Event::End(BytesEnd::new("vocabName")))?;
    write_text_element(&mut writer, "vocabIdentifier", vocabulary_identifier)?;

    for (identifier, children) in index.iter() {
        write_term(&mut writer, identifier, children, table)?;
    }

    write(&mut writer, Event::End(BytesEnd::new("vdex")))?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| TaxonomyError::Write(e.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

fn write_term(
    writer: &mut Writer<Vec<u8>>,
    identifier: TermId,
    children: &HierarchyIndex,
    table: &TranslationTable,
) -> TaxonomyResult<()> {
    write(writer, Event::Start(BytesStart::new("term")))?;
    write_text_element(writer, "termIdentifier", &identifier.to_string())?;

    write(writer, Event::Start(BytesStart::new("caption")))?;
    let no_captions = BTreeMap::new();
    for (language, label) in table.get(&identifier).unwrap_or(&no_captions) {
        write_langstring(writer, language, label)?;
    }
    write(writer, Event::End(BytesEnd::new("caption")))?;

    for (child, grandchildren) in children.iter() {
        write_term(writer, child, grandchildren, table)?;
    }

    write(writer, Event::End(BytesEnd::new("term")))
}

fn write_langstring(writer: &mut Writer<Vec<u8>>, language: &str, text: &str) -> TaxonomyResult<()> {
    let mut start = BytesStart::new("langstring");
    start.push_attribute(("language", language));
    write(writer, Event::Start(start))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new("langstring")))
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> TaxonomyResult<()> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> TaxonomyResult<()> {
    writer
        .write_event(event)
        .map_err(|e| TaxonomyError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdex::reader::parse;

    fn sample() -> (HierarchyIndex, TranslationTable) {
        let mut fruits = HierarchyIndex::new();
        fruits.insert(3, HierarchyIndex::new());
        let mut index = HierarchyIndex::new();
        index.insert(2, fruits).insert(1, HierarchyIndex::new());

        let mut table = TranslationTable::new();
        table.insert(
            1,
            BTreeMap::from([("en".to_string(), "Vegetables".to_string())]),
        );
        table.insert(
            2,
            BTreeMap::from([
                ("fr".to_string(), "Fruits".to_string()),
                ("en".to_string(), "Fruits".to_string()),
            ]),
        );
        table.insert(
            3,
            BTreeMap::from([("en".to_string(), "Apples & Pears".to_string())]),
        );
        (index, table)
    }

    #[test]
    fn test_declaration_and_header() {
        let (index, table) = sample();
        let xml = serialize("Food", "food", &index, &table, &WriterOptions::default()).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(
            r#"xmlns="http://www.imsglobal.org/xsd/imsvdex_v1p0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#
        ));
        assert!(xml.contains(r#"orderSignificant="false" profileType="hierarchicalTokenTerms" language="en">"#));
        assert!(xml.contains(r#"<langstring language="en">Food</langstring>"#));
        assert!(xml.contains("<vocabIdentifier>food</vocabIdentifier>"));
    }

    #[test]
    fn test_terms_are_ordered() {
        let (index, table) = sample();
        let xml = serialize("Food", "food", &index, &table, &WriterOptions::default()).unwrap();

        let first = xml.find("<termIdentifier>1</termIdentifier>").unwrap();
        let second = xml.find("<termIdentifier>2</termIdentifier>").unwrap();
        let third = xml.find("<termIdentifier>3</termIdentifier>").unwrap();
        assert!(first < second && second < third);

        let en = xml.find(r#"<langstring language="en">Fruits</langstring>"#).unwrap();
        let fr = xml.find(r#"<langstring language="fr">Fruits</langstring>"#).unwrap();
        assert!(en < fr);
    }

    #[test]
    fn test_text_is_escaped() {
        let (index, table) = sample();
        let xml = serialize("Fish & Chips", "food", &index, &table, &WriterOptions::default())
            .unwrap();
        assert!(xml.contains("Apples &amp; Pears"));
        assert!(xml.contains("Fish &amp; Chips"));
    }

    #[test]
    fn test_encoding_and_indent_options() {
        let options = WriterOptions {
            encoding: "iso-8859-1".to_string(),
            indent: 4,
        };
        let xml = serialize("Food", "food", &HierarchyIndex::new(), &TranslationTable::new(), &options)
            .unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="ISO-8859-1"?>"#));
        assert!(xml.contains("\n    <vocabName>"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let (index, table) = sample();
        let options = WriterOptions::default();
        let first = serialize("Food", "food", &index, &table, &options).unwrap();
        let second = serialize("Food", "food", &index, &table, &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reader_recovers_written_terms() {
        let (index, table) = sample();
        let xml = serialize("Food", "food", &index, &table, &WriterOptions::default()).unwrap();
        let vocabulary = parse(xml.as_bytes()).unwrap();

        assert_eq!(vocabulary.title.as_deref(), Some("Food"));
        assert_eq!(vocabulary.identifier.as_deref(), Some("food"));
        let en = &vocabulary.terms["en"];
        assert_eq!(en["/Vegetables"].identifier, 1);
        assert_eq!(en["/Fruits"].identifier, 2);
        assert_eq!(en["/Fruits/Apples & Pears"].identifier, 3);
        assert_eq!(en["/Fruits/Apples & Pears"].parent, Some(2));
        assert_eq!(vocabulary.terms["fr"]["/Fruits"].identifier, 2);
    }
}
