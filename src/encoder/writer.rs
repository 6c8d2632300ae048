//! Eingerueckter XML-Writer fuer den Encoder.
//!
//! Start-Tags bleiben offen, bis das erste Kind oder das Ende kommt; so koennen Attribute
//! direkt nach `start` geschrieben werden und leere Elemente werden zu `<X/>`.

use std::io::Write;

use crate::{Error, Result};

fn io_err(e: std::io::Error) -> Error {
    Error::IoError(e.to_string())
}

#[inline]
fn w(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(s.as_bytes()).map_err(io_err)
}

/// XML-Escaping mit memchr3: grosse Bloecke ohne Escape-Zeichen in einem Stueck.
fn write_escaped_memchr3(
    w: &mut impl Write,
    s: &str,
    needle: [u8; 3],
    replacement: [&[u8]; 3],
) -> Result<()> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        match memchr::memchr3(needle[0], needle[1], needle[2], &bytes[start..]) {
            Some(offset) => {
                let pos = start + offset;
                if start < pos {
                    w.write_all(&bytes[start..pos]).map_err(io_err)?;
                }
                let rep = match bytes[pos] {
                    b if b == needle[0] => replacement[0],
                    b if b == needle[1] => replacement[1],
                    _ => replacement[2],
                };
                w.write_all(rep).map_err(io_err)?;
                start = pos + 1;
            }
            None => {
                w.write_all(&bytes[start..]).map_err(io_err)?;
                break;
            }
        }
    }
    Ok(())
}

/// `&`, `<` und `"` in Attributwerten; Tab, LF und CR als Zeichenreferenz, sonst macht
/// die Attributnormalisierung beim Lesen Leerzeichen daraus.
fn write_escaped_attr(w: &mut impl Write, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    if memchr::memchr3(b'\t', b'\n', b'\r', bytes).is_none() {
        return write_escaped_memchr3(w, s, [b'&', b'<', b'"'], [b"&amp;", b"&lt;", b"&quot;"]);
    }
    let mut start = 0;
    for (pos, &b) in bytes.iter().enumerate() {
        let rep: &[u8] = match b {
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'"' => b"&quot;",
            b'\t' => b"&#9;",
            b'\n' => b"&#10;",
            b'\r' => b"&#13;",
            _ => continue,
        };
        w.write_all(&bytes[start..pos]).map_err(io_err)?;
        w.write_all(rep).map_err(io_err)?;
        start = pos + 1;
    }
    w.write_all(&bytes[start..]).map_err(io_err)
}

struct ElemState {
    name: &'static str,
    has_child: bool,
}

pub(crate) struct PrettyXmlWriter<W: Write> {
    writer: W,
    element_stack: Vec<ElemState>,
    /// Start-Tag des obersten Stack-Elements ist noch nicht mit `>` abgeschlossen.
    tag_open: bool,
    indent: usize,
}

impl<W: Write> PrettyXmlWriter<W> {
    pub fn new(writer: W, indent: usize) -> Self {
        Self {
            writer,
            element_stack: Vec::new(),
            tag_open: false,
            indent,
        }
    }

    pub fn declaration(&mut self) -> Result<()> {
        w(&mut self.writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        if self.indent > 0 {
            w(&mut self.writer, "\n")?;
        }
        Ok(())
    }

    pub fn start(&mut self, name: &'static str) -> Result<()> {
        self.close_start_tag()?;
        if let Some(parent) = self.element_stack.last_mut() {
            parent.has_child = true;
            let depth = self.element_stack.len();
            self.write_indent(depth)?;
        }
        w(&mut self.writer, "<")?;
        w(&mut self.writer, name)?;
        self.element_stack.push(ElemState {
            name,
            has_child: false,
        });
        self.tag_open = true;
        Ok(())
    }

    /// Attribut am zuletzt geoeffneten Element.
    pub fn attr(&mut self, name: &str, value: &str) -> Result<()> {
        if !self.tag_open {
            return Err(Error::IoError(format!(
                "attribute '{name}' after the start tag was closed"
            )));
        }
        w(&mut self.writer, " ")?;
        w(&mut self.writer, name)?;
        w(&mut self.writer, "=\"")?;
        write_escaped_attr(&mut self.writer, value)?;
        w(&mut self.writer, "\"")
    }

    pub fn end(&mut self) -> Result<()> {
        let elem = self
            .element_stack
            .pop()
            .ok_or_else(|| Error::IoError("end without open element".into()))?;
        if self.tag_open {
            self.tag_open = false;
            return w(&mut self.writer, "/>");
        }
        if elem.has_child {
            let depth = self.element_stack.len();
            self.write_indent(depth)?;
        }
        w(&mut self.writer, "</")?;
        w(&mut self.writer, elem.name)?;
        w(&mut self.writer, ">")
    }

    pub fn finish(mut self) -> Result<W> {
        if let Some(open) = self.element_stack.last() {
            return Err(Error::IoError(format!("element '{}' not closed", open.name)));
        }
        if self.indent > 0 {
            w(&mut self.writer, "\n")?;
        }
        self.writer.flush().map_err(io_err)?;
        Ok(self.writer)
    }

    fn close_start_tag(&mut self) -> Result<()> {
        if self.tag_open {
            self.tag_open = false;
            w(&mut self.writer, ">")?;
        }
        Ok(())
    }

    fn write_indent(&mut self, depth: usize) -> Result<()> {
        if self.indent == 0 {
            return Ok(());
        }
        // Statischer Spaces-Buffer; tiefere Einrueckung wird in Stuecken geschrieben.
        const SPACES: &[u8; 128] = &[b' '; 128];
        w(&mut self.writer, "\n")?;
        let mut remaining = self.indent * depth;
        while remaining > 0 {
            let chunk = remaining.min(SPACES.len());
            self.writer.write_all(&SPACES[..chunk]).map_err(io_err)?;
            remaining -= chunk;
        }
        Ok(())
    }
}
