//! Source text ownership.
//!
//! A `SourceFile` owns the text of one compiled file and answers position
//! queries. The transform keeps it behind an `Arc` inside the source-file
//! AST node so rewriters can slice raw text (tagged templates) and resolve
//! diagnostic locations without threading a second handle around.

use crate::span::{LineColumn, LineMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SourceFile {
    file_name: String,
    text: Arc<str>,
    line_map: LineMap,
}

impl SourceFile {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> SourceFile {
        let text: String = text.into();
        let line_map = LineMap::build(&text);
        SourceFile {
            file_name: file_name.into(),
            text: Arc::from(text.into_boxed_str()),
            line_map,
        }
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Substring by byte range, clamped to the text.
    pub fn slice(&self, start: u32, end: u32) -> &str {
        let len = self.text.len();
        let start = (start as usize).min(len);
        let end = (end as usize).min(len).max(start);
        &self.text[start..end]
    }

    pub fn line_column(&self, offset: u32) -> LineColumn {
        self.line_map.line_column(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_is_clamped() {
        let sf = SourceFile::new("a.ts", "let x = 1;");
        assert_eq!(sf.slice(4, 5), "x");
        assert_eq!(sf.slice(8, 400), "1;");
    }
}
