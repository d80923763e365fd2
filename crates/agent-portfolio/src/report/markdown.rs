//! Fluent Markdown builder
//!
//! [`MarkdownBuilder`] assembles report documents piece by piece, with
//! conditional parts and tables rendered through `comfy-table`.
//!
//! ```
//! use agent_portfolio::report::MarkdownBuilder;
//!
//! let doc = MarkdownBuilder::new()
//!     .title("Investment Report: QQQI")
//!     .section("Key Risks")
//!     .bullet("Premium compression")
//!     .when(false, "never shown")
//!     .build();
//!
//! assert!(doc.starts_with("# Investment Report: QQQI"));
//! assert!(doc.contains("- Premium compression"));
//! ```

use comfy_table::{Table, presets};

#[derive(Debug, Clone, Default)]
pub struct MarkdownBuilder {
    parts: Vec<String>,
}

impl MarkdownBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add raw text
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.parts.push(content.into());
        self
    }

    /// Add text followed by a newline
    pub fn line(self, content: impl Into<String>) -> Self {
        let content = content.into();
        self.text(format!("{content}\n"))
    }

    pub fn blank_line(self) -> Self {
        self.text("\n")
    }

    /// Document title (h1)
    pub fn title(self, title: impl Into<String>) -> Self {
        self.text(format!("# {}\n", title.into()))
    }

    /// Section header (h2)
    pub fn section(self, title: impl Into<String>) -> Self {
        self.text(format!("\n## {}\n\n", title.into()))
    }

    /// Subsection header (h3)
    pub fn subsection(self, title: impl Into<String>) -> Self {
        self.text(format!("\n### {}\n\n", title.into()))
    }

    /// Paragraph; empty input adds nothing
    pub fn paragraph(self, content: impl Into<String>) -> Self {
        let content = content.into();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            self
        } else {
            self.text(format!("{trimmed}\n"))
        }
    }

    /// Add content conditionally
    pub fn when(self, condition: bool, content: impl Into<String>) -> Self {
        if condition { self.text(content) } else { self }
    }

    /// Apply `f` only when `condition` holds
    pub fn when_with(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition { f(self) } else { self }
    }

    pub fn bullet(self, content: impl Into<String>) -> Self {
        self.text(format!("- {}\n", content.into()))
    }

    pub fn bullets<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for item in items {
            self = self.bullet(item);
        }
        self
    }

    /// Bold key followed by a value
    pub fn field(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.text(format!("**{}**: {}\n", key.into(), value.into()))
    }

    pub fn horizontal_rule(self) -> Self {
        self.text("\n---\n\n")
    }

    /// Markdown table; skipped when there are no rows
    ///
    /// Cells are escaped so free text cannot add columns or rows.
    pub fn table<H, R, C>(self, header: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let mut table = Table::new();
        table
            .load_preset(presets::ASCII_MARKDOWN)
            .set_header(header.into_iter().map(|h| escape_cell(&h.into())).collect::<Vec<_>>());

        let mut row_count = 0;
        for row in rows {
            table.add_row(row.into_iter().map(|c| escape_cell(&c.into())).collect::<Vec<_>>());
            row_count += 1;
        }

        if row_count == 0 {
            return self;
        }
        self.text(format!("{table}\n"))
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn build(self) -> String {
        self.parts.join("")
    }
}

/// Make a value safe for a single Markdown table cell
fn escape_cell(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_and_bullets() {
        let doc = MarkdownBuilder::new()
            .title("Report")
            .section("Risks")
            .bullets(["one", "two"])
            .build();
        assert_eq!(doc, "# Report\n\n## Risks\n\n- one\n- two\n");
    }

    #[test]
    fn test_conditional_content() {
        let doc = MarkdownBuilder::new()
            .when(true, "yes ")
            .when(false, "no ")
            .when_with(true, |b| b.text("nested"))
            .build();
        assert_eq!(doc, "yes nested");
    }

    #[test]
    fn test_empty_paragraph_is_skipped() {
        let builder = MarkdownBuilder::new().paragraph("   ");
        assert!(builder.is_empty());
    }

    #[test]
    fn test_table_contains_cells() {
        let doc = MarkdownBuilder::new()
            .table(["Symbol", "Target"], [["QQQI", "25.0%"], ["SGOV", "15.0%"]])
            .build();
        assert!(doc.contains("Symbol"));
        assert!(doc.contains("QQQI"));
        assert!(doc.contains("15.0%"));
        assert!(doc.lines().all(|l| l.is_empty() || l.starts_with('|')));
    }

    #[test]
    fn test_empty_table_is_skipped() {
        let rows: Vec<Vec<String>> = Vec::new();
        let doc = MarkdownBuilder::new().table(["A"], rows).build();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_table_escapes_pipes_and_newlines() {
        let doc = MarkdownBuilder::new()
            .table(
                ["Source", "Rationale"],
                [["technical", "RSI 72 | overbought\nbut trend intact"]],
            )
            .build();

        let lines: Vec<&str> = doc.lines().filter(|l| !l.is_empty()).collect();
        // header, separator, one data row
        assert_eq!(lines.len(), 3, "{doc}");
        let columns = |line: &str| line.replace("\\|", "").matches('|').count();
        let header_columns = columns(lines[0]);
        assert!(lines.iter().all(|l| columns(l) == header_columns), "{doc}");
        assert!(lines[2].contains("RSI 72 \\| overbought but trend intact"));
    }
}
