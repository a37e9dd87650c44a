//! Minimal indenting XML writer.

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

pub const NS_GMD: &str = "http://www.isotc211.org/2005/gmd";
pub const NS_GMI: &str = "http://www.isotc211.org/2005/gmi";
pub const NS_GMX: &str = "http://www.isotc211.org/2005/gmx";
pub const NS_GCO: &str = "http://www.isotc211.org/2005/gco";
pub const NS_GML: &str = "http://www.opengis.net/gml/3.2";
pub const NS_XLINK: &str = "http://www.w3.org/1999/xlink";
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub(crate) fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Not representable in XML 1.0.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            _ => out.push(c),
        }
    }
    out
}

/// Turns arbitrary text into something usable as a `gml:id` (an XML NCName).
pub(crate) fn sanitize_id(input: &str) -> String {
    let mut out: String = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}

pub(crate) struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    pub(crate) fn new() -> Self {
        let mut out = String::new();
        out.push_str(XML_DECLARATION);
        out.push('\n');
        XmlWriter { out, depth: 0 }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    fn start_tag(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.out.push('<');
        self.out.push_str(tag);
        for (name, value) in attrs {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            self.out.push_str(&xml_escape(value));
            self.out.push('"');
        }
    }

    pub(crate) fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_tag(tag, attrs);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    pub(crate) fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
    }

    /// Element with text content on a single line.
    pub(crate) fn leaf(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) {
        self.start_tag(tag, attrs);
        self.out.push('>');
        self.out.push_str(&xml_escape(text));
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
    }

    pub(crate) fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.start_tag(tag, attrs);
        self.out.push_str("/>\n");
    }

    /// `<tag><gco:CharacterString>text</gco:CharacterString></tag>`
    pub(crate) fn char_string(&mut self, tag: &str, text: &str) {
        self.open(tag, &[]);
        self.leaf("gco:CharacterString", &[], text);
        self.close(tag);
    }

    /// `<tag><code codeList=".." codeListValue="value">value</code></tag>`
    pub(crate) fn code(&mut self, tag: &str, code: &str, code_list: &str, value: &str) {
        self.open(tag, &[]);
        self.leaf(
            code,
            &[("codeList", code_list), ("codeListValue", value)],
            value,
        );
        self.close(tag);
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            xml_escape(r#"a < b & "c" > 'd'"#),
            "a &lt; b &amp; &quot;c&quot; &gt; &apos;d&apos;"
        );
        assert_eq!(xml_escape("bell\u{7}"), "bell");
    }

    #[test]
    fn ids_are_ncnames() {
        assert_eq!(sanitize_id("OSC_Theme_Sea Ice"), "OSC_Theme_Sea_Ice");
        assert_eq!(sanitize_id("3d-model"), "_3d-model");
    }

    #[test]
    fn nests_with_two_space_indent() {
        let mut w = XmlWriter::new();
        w.open("a", &[("k", "v&w")]);
        w.char_string("b", "x<y");
        w.empty("c", &[]);
        w.close("a");
        let out = w.finish();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a k=\"v&amp;w\">\n  <b>\n    <gco:CharacterString>x&lt;y</gco:CharacterString>\n  </b>\n  <c/>\n</a>\n"
        );
    }
}
