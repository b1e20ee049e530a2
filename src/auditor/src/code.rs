//! Build code decoding
//!
//! A build code is the shareable form of a character build:
//!
//! 1. URL-safe base64 text (padding optional)
//! 2. Decoded bytes are a zlib stream (raw deflate is accepted too)
//! 3. Decompressed bytes are an XML document with `Build` and `Items` sections
//!
//! The XML is converted into an owned [`Element`] tree so a [`BuildDocument`]
//! can be held and read without borrowing the decoded text.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Base64 engine for build codes: URL-safe alphabet, emits padding, accepts either.
const CODE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors that can occur while decoding a build code
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Build code is empty")]
    Empty,

    #[error("Invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Failed to decompress build data: {0}")]
    Decompress(std::io::Error),

    #[error("Failed to compress build data: {0}")]
    Compress(std::io::Error),

    #[error("Build data is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Malformed build document: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// An owned XML element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    /// Text directly inside the element, before its first child element
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        Self {
            tag: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            text: node.text().map(str::to_string),
            children: node
                .children()
                .filter(|n| n.is_element())
                .map(Element::from_node)
                .collect(),
        }
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All direct children with the given tag, in document order
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

/// A decoded build. Read-only once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDocument {
    root: Element,
}

impl BuildDocument {
    /// Parse a build document from XML text
    pub fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        let doc = roxmltree::Document::parse(xml)?;
        Ok(Self {
            root: Element::from_node(doc.root_element()),
        })
    }

    /// The document's root element (`PathOfBuilding` in exported builds)
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// A top-level section such as `Items` or `Build`
    pub fn section(&self, tag: &str) -> Option<&Element> {
        self.root.child(tag)
    }
}

/// Returns true if the stream starts with a valid zlib header
fn has_zlib_header(bytes: &[u8]) -> bool {
    match bytes {
        [cmf, flg, ..] => cmf & 0x0F == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

/// Decode a build code to its XML text
pub fn decode_to_xml(code: &str) -> Result<String, DecodeError> {
    let cleaned: String = code.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(DecodeError::Empty);
    }

    let compressed = CODE_ENGINE.decode(cleaned.as_bytes())?;

    let xml = inflate(&compressed).map_err(DecodeError::Decompress)?;
    Ok(String::from_utf8(xml)?)
}

/// Decompress a zlib stream, retrying as raw deflate when zlib decoding fails
fn inflate(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    if has_zlib_header(compressed) {
        let mut out = Vec::new();
        match ZlibDecoder::new(compressed).read_to_end(&mut out) {
            Ok(_) => return Ok(out),
            Err(e) => tracing::debug!("zlib decode failed, retrying as raw deflate: {}", e),
        }
    }

    let mut out = Vec::new();
    DeflateDecoder::new(compressed).read_to_end(&mut out)?;
    Ok(out)
}

/// Decode a build code into a document, reporting why it failed
pub fn try_decode(code: &str) -> Result<BuildDocument, DecodeError> {
    let xml = decode_to_xml(code)?;
    BuildDocument::from_xml(&xml)
}

/// Decode a build code into a document.
///
/// Returns `None` for any malformed input (bad base64, corrupt stream,
/// invalid XML). Truncated codes pasted from chat are the common case.
pub fn decode(code: &str) -> Option<BuildDocument> {
    match try_decode(code) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::debug!("Build code rejected: {}", e);
            None
        }
    }
}

/// Encode XML text as a build code
pub fn encode(xml: &str) -> Result<String, DecodeError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(xml.as_bytes())
        .map_err(DecodeError::Compress)?;
    let compressed = encoder.finish().map_err(DecodeError::Compress)?;
    Ok(CODE_ENGINE.encode(compressed))
}
