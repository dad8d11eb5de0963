//! Metalink v4 documents listing several result files.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::{ProtocolError, Result};

const METALINK_NS: &str = "urn:ietf:params:xml:ns:metalink";

/// One file entry of a metalink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetalinkFile {
    /// File name as seen by the client.
    pub name: String,

    /// Where the file can be downloaded.
    pub url: String,

    pub description: Option<String>,

    /// Size in bytes, when known.
    pub size: Option<u64>,
}

impl MetalinkFile {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: None,
            size: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// A list of downloadable files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metalink {
    pub files: Vec<MetalinkFile>,
}

impl Metalink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, file: MetalinkFile) {
        self.files.push(file);
    }

    pub fn urls(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.url.as_str()).collect()
    }

    /// Encode as a metalink v4 XML document.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("metalink");
        root.push_attribute(("xmlns", METALINK_NS));
        writer.write_event(Event::Start(root))?;

        for file in &self.files {
            let mut start = BytesStart::new("file");
            start.push_attribute(("name", file.name.as_str()));
            writer.write_event(Event::Start(start))?;

            if let Some(description) = &file.description {
                write_text_element(&mut writer, "description", description)?;
            }
            if let Some(size) = file.size {
                write_text_element(&mut writer, "size", &size.to_string())?;
            }
            write_text_element(&mut writer, "url", &file.url)?;

            writer.write_event(Event::End(BytesEnd::new("file")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("metalink")))?;

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| ProtocolError::Xml(e.to_string()))
    }

    /// Decode a metalink v4 XML document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut metalink = Metalink::new();
        let mut current: Option<MetalinkFile> = None;
        let mut element = String::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    if name == "file" {
                        let file_name = match e.try_get_attribute("name")? {
                            Some(attr) => attr.unescape_value()?.to_string(),
                            None => {
                                return Err(ProtocolError::Xml(
                                    "file element without a name attribute".to_string(),
                                ))
                            }
                        };
                        current = Some(MetalinkFile::new(file_name, ""));
                    }
                    element = name;
                }
                Event::Text(t) => {
                    if let Some(file) = current.as_mut() {
                        let text = t.unescape()?.to_string();
                        match element.as_str() {
                            "url" => file.url = text,
                            "description" => file.description = Some(text),
                            "size" => file.size = text.parse().ok(),
                            _ => {}
                        }
                    }
                }
                Event::End(e) => {
                    if e.local_name().as_ref() == b"file" {
                        if let Some(file) = current.take() {
                            metalink.add_file(file);
                        }
                    }
                    element.clear();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(metalink)
    }
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
