//! VDEX document reader
//!
//! Reading happens in two passes. The quick-xml event stream is first folded into a
//! light tree of `<term>` nodes (identifier, captions, nested terms). That tree is
//! then walked once per caption language to produce root-anchored paths:
//!
//! ```text
//! <term> 1  en:Food  fr:Nourriture          en /Food              -> (1, None)
//!   <term> 2  en:Fruits  fr:Fruits    =>    en /Food/Fruits       -> (2, Some(1))
//!                                           fr /Nourriture        -> (1, None)
//!                                           fr /Nourriture/Fruits -> (2, Some(1))
//! ```
//!
//! A walk in language L only follows captions tagged L. A caption whose language the
//! parent term lacks starts a new top-level path in its own language instead.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::error::{TaxonomyError, TaxonomyResult};
use crate::language::normalize_language;
use crate::path_tree::PATH_SEPARATOR;
use crate::store::{TermEntry, TermId};

/// Terms keyed by language, then by full path
pub type LanguageTerms = BTreeMap<String, BTreeMap<String, TermEntry>>;

/// Everything read from one VDEX document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedVocabulary {
    /// Text of the first `vocabName/langstring`
    pub title: Option<String>,
    /// Text of `vocabIdentifier`
    pub identifier: Option<String>,
    pub terms: LanguageTerms,
}

impl ImportedVocabulary {
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Number of `(language, path)` entries
    pub fn len(&self) -> usize {
        self.terms.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries as `(language, path, entry)`, ascending by language then path
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, TermEntry)> {
        self.terms.iter().flat_map(|(language, paths)| {
            paths
                .iter()
                .map(move |(path, entry)| (language.as_str(), path.as_str(), *entry))
        })
    }
}

/// Parse a VDEX document.
///
/// # Errors
/// - `TaxonomyError::Parse` if the input is not well-formed XML
/// - `TaxonomyError::Structural` if the root element is not `vdex`, a `<term>`
///   lacks its `<termIdentifier>`, an identifier is not an integer, or a caption
///   contains the path separator
///
/// Caption text is kept as written, surrounding whitespace included; the title,
/// `vocabIdentifier` and `termIdentifier` are trimmed.
///
/// # Example
///
/// ```
/// use vdex_taxonomy::vdex::parse;
///
/// let xml = r#"<vdex xmlns="http://www.imsglobal.org/xsd/imsvdex_v1p0">
///   <vocabIdentifier>food</vocabIdentifier>
///   <term>
///     <termIdentifier>1</termIdentifier>
///     <caption><langstring language="en">Fruits</langstring></caption>
///   </term>
/// </vdex>"#;
///
/// let vocabulary = parse(xml.as_bytes()).unwrap();
/// assert_eq!(vocabulary.identifier.as_deref(), Some("food"));
/// assert_eq!(vocabulary.terms["en"]["/Fruits"].identifier, 1);
/// ```
pub fn parse(xml: &[u8]) -> TaxonomyResult<ImportedVocabulary> {
    let document = std::str::from_utf8(xml)
        .map_err(|e| TaxonomyError::Parse(format!("Document is not valid UTF-8: {}", e)))?;
    let parsed = DocumentBuilder::read(document)?;

    let mut terms = LanguageTerms::new();
    for node in &parsed.terms {
        for (language, text) in &node.captions {
            let path = format!("{}{}", PATH_SEPARATOR, text);
            record(&mut terms, language, path.clone(), node.identifier, None);
            descend(&mut terms, node, language, &path);
        }
    }

    let vocabulary = ImportedVocabulary {
        title: parsed.title,
        identifier: parsed.identifier,
        terms,
    };
    debug!(
        "Read VDEX vocabulary {:?}: {} entries in {} language(s)",
        vocabulary.identifier,
        vocabulary.len(),
        vocabulary.terms.len()
    );
    Ok(vocabulary)
}

fn descend(terms: &mut LanguageTerms, node: &TermNode, language: &str, path: &str) {
    for child in &node.children {
        for (caption_language, text) in &child.captions {
            let child_path = if caption_language == language {
                format!("{}{}{}", path, PATH_SEPARATOR, text)
            } else if !node.has_caption_in(caption_language) {
                // the parent has no caption in this language, so nothing
                // else reaches it: start a new top-level path
                format!("{}{}", PATH_SEPARATOR, text)
            } else {
                continue;
            };
            record(
                terms,
                caption_language,
                child_path.clone(),
                child.identifier,
                Some(node.identifier),
            );
            descend(terms, child, caption_language, &child_path);
        }
    }
}

fn record(
    terms: &mut LanguageTerms,
    language: &str,
    path: String,
    identifier: TermId,
    parent: Option<TermId>,
) {
    let entry = TermEntry::new(identifier, parent);
    let previous = terms
        .entry(language.to_string())
        .or_default()
        .insert(path.clone(), entry);
    if let Some(previous) = previous.filter(|previous| *previous != entry) {
        debug!(
            "Path '{}' ({}) read twice, term {} replaces term {}",
            path, language, identifier, previous.identifier
        );
    }
}

#[derive(Debug)]
struct TermNode {
    identifier: TermId,
    /// `(language, caption text)` in document order
    captions: Vec<(String, String)>,
    children: Vec<TermNode>,
}

impl TermNode {
    fn has_caption_in(&self, language: &str) -> bool {
        self.captions.iter().any(|(l, _)| l == language)
    }
}

#[derive(Debug, Default)]
struct PartialTerm {
    identifier: Option<TermId>,
    captions: Vec<(String, String)>,
    children: Vec<TermNode>,
}

/// Element whose text content is being collected
#[derive(Debug, Clone, PartialEq)]
enum Capture {
    Title,
    VocabIdentifier,
    TermIdentifier,
    Caption(String),
}

#[derive(Debug, Default)]
struct DocumentBuilder {
    /// Local names of the currently open elements
    elements: Vec<String>,
    seen_root: bool,
    /// `language` attribute of `<vdex>`, used for langstrings without one
    document_language: Option<String>,
    title: Option<String>,
    identifier: Option<String>,
    open_terms: Vec<PartialTerm>,
    terms: Vec<TermNode>,
    capture: Option<Capture>,
    text: String,
}

impl DocumentBuilder {
    fn read(document: &str) -> TaxonomyResult<Self> {
        let mut reader = Reader::from_str(document);

        let mut builder = DocumentBuilder::default();
        loop {
            let event = reader.read_event().map_err(|e| {
                TaxonomyError::Parse(format!("{} at position {}", e, reader.buffer_position()))
            })?;
            match event {
                Event::Start(ref e) => builder.open(e)?,
                Event::Empty(ref e) => {
                    builder.open(e)?;
                    let name = local_name(e)?;
                    builder.close(&name)?;
                }
                Event::End(ref e) => {
                    let name = std::str::from_utf8(e.local_name().as_ref())
                        .map_err(|e| TaxonomyError::Parse(e.to_string()))?
                        .to_string();
                    builder.close(&name)?;
                }
                Event::Text(ref e) => {
                    if builder.capture.is_some() {
                        let text = e
                            .unescape()
                            .map_err(|e| TaxonomyError::Parse(e.to_string()))?;
                        builder.text.push_str(&text);
                    }
                }
                Event::CData(ref e) => {
                    if builder.capture.is_some() {
                        let text = std::str::from_utf8(&e[..])
                            .map_err(|e| TaxonomyError::Parse(e.to_string()))?;
                        builder.text.push_str(text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = builder.elements.last() {
            return Err(TaxonomyError::Parse(format!(
                "Unexpected end of document, <{}> is not closed",
                open
            )));
        }
        if !builder.seen_root {
            return Err(TaxonomyError::Parse("Document has no root element".to_string()));
        }
        Ok(builder)
    }

    fn parent(&self) -> Option<&str> {
        self.elements.iter().rev().nth(1).map(String::as_str)
    }

    fn grandparent(&self) -> Option<&str> {
        self.elements.iter().rev().nth(2).map(String::as_str)
    }

    fn open(&mut self, element: &BytesStart) -> TaxonomyResult<()> {
        let name = local_name(element)?;
        if self.elements.is_empty() {
            if self.seen_root {
                return Err(TaxonomyError::Parse(format!(
                    "Unexpected second root element <{}>",
                    name
                )));
            }
            if name != "vdex" {
                return Err(TaxonomyError::Structural(format!(
                    "Expected <vdex> root element, found <{}>",
                    name
                )));
            }
            self.seen_root = true;
            self.document_language = language_attribute(element)?;
        }
        self.elements.push(name.clone());

        let parent = self.parent().map(str::to_string);
        let grandparent = self.grandparent().map(str::to_string);
        let capture = match (name.as_str(), parent.as_deref(), grandparent.as_deref()) {
            ("term", Some("vdex" | "term"), _) => {
                self.open_terms.push(PartialTerm::default());
                None
            }
            ("termIdentifier", Some("term"), _) => Some(Capture::TermIdentifier),
            ("vocabIdentifier", Some("vdex"), _) => Some(Capture::VocabIdentifier),
            ("langstring", Some("vocabName"), Some("vdex")) if self.title.is_none() => {
                Some(Capture::Title)
            }
            ("langstring", Some("caption"), Some("term")) => {
                let language = match language_attribute(element)? {
                    Some(language) => language,
                    None => self.document_language.clone().ok_or_else(|| {
                        TaxonomyError::Structural(
                            "<langstring> without a language attribute".to_string(),
                        )
                    })?,
                };
                Some(Capture::Caption(language))
            }
            _ => None,
        };
        if capture.is_some() {
            self.capture = capture;
            self.text.clear();
        }
        Ok(())
    }

    fn close(&mut self, name: &str) -> TaxonomyResult<()> {
        let is_term = name == "term" && matches!(self.parent(), Some("vdex" | "term"));
        self.elements.pop();

        if is_term {
            return self.close_term();
        }

        let Some(capture) = self.capture.take() else {
            return Ok(());
        };
        let text = std::mem::take(&mut self.text);
        match capture {
            Capture::Title => self.title = Some(text.trim().to_string()),
            Capture::VocabIdentifier => self.identifier = Some(text.trim().to_string()),
            Capture::TermIdentifier => {
                let identifier = text.trim().parse::<TermId>().map_err(|_| {
                    TaxonomyError::Structural(format!("Invalid term identifier '{}'", text))
                })?;
                if let Some(term) = self.open_terms.last_mut() {
                    term.identifier = Some(identifier);
                }
            }
            Capture::Caption(language) => {
                if text.contains(PATH_SEPARATOR) {
                    return Err(TaxonomyError::Structural(format!(
                        "Caption '{}' ({}) contains the path separator '{}'",
                        text, language, PATH_SEPARATOR
                    )));
                }
                if let Some(term) = self.open_terms.last_mut() {
                    term.captions.push((language, text));
                }
            }
        }
        Ok(())
    }

    fn close_term(&mut self) -> TaxonomyResult<()> {
        let Some(term) = self.open_terms.pop() else {
            return Ok(());
        };
        let identifier = term.identifier.ok_or_else(|| {
            let captions: Vec<&str> = term.captions.iter().map(|(_, t)| t.as_str()).collect();
            TaxonomyError::Structural(format!(
                "<term> without <termIdentifier> (captions: {:?})",
                captions
            ))
        })?;
        let node = TermNode {
            identifier,
            captions: term.captions,
            children: term.children,
        };
        match self.open_terms.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.terms.push(node),
        }
        Ok(())
    }
}

fn local_name(element: &BytesStart) -> TaxonomyResult<String> {
    std::str::from_utf8(element.local_name().as_ref())
        .map(str::to_string)
        .map_err(|e| TaxonomyError::Parse(e.to_string()))
}

fn language_attribute(element: &BytesStart) -> TaxonomyResult<Option<String>> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| TaxonomyError::Parse(e.to_string()))?;
        if attribute.key.local_name().as_ref() == b"language" {
            let value = attribute
                .unescape_value()
                .map_err(|e| TaxonomyError::Parse(e.to_string()))?;
            return Ok(Some(normalize_language(&value)));
        }
    }
    Ok(None)
}
