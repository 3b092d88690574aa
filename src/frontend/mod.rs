use std::path::{Path, PathBuf};

use colored::Colorize;

use self::lexer::Span;

pub mod ast;
pub mod import;
pub mod lexer;
pub mod parser;

#[derive(Debug)]
pub struct SourceFile {
    pub contents: String,
    pub origin: SourceFileOrigin,
}

impl SourceFile {
    pub fn from_memory(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            origin: SourceFileOrigin::Memory,
        }
    }

    /// Reads the whole file into memory
    pub fn read(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            contents: std::fs::read_to_string(path)?,
            origin: SourceFileOrigin::File(path.to_path_buf()),
        })
    }

    pub fn value_of_span(&self, span: Span) -> &str {
        &self.contents[span.start..span.end]
    }

    /// 1-based line number of a byte position
    pub fn row_for_position(&self, position: usize) -> usize {
        self.contents[..position.min(self.contents.len())]
            .matches('\n')
            .count()
            + 1
    }

    /// 1-based column of a byte position
    pub fn column_for_position(&self, position: usize) -> usize {
        let position = position.min(self.contents.len());
        let line_start = self.contents[..position]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);

        position - line_start + 1
    }

    /// Renders the line containing the span with carets under the span
    pub fn highlight_span(&self, span: Span) -> String {
        let start = span.start.min(self.contents.len());
        let line_start = self.contents[..start]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = self.contents[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(self.contents.len());

        let line = &self.contents[line_start..line_end];
        let row = self.row_for_position(start).to_string();
        let gutter = " ".repeat(row.len());
        let underline = "^".repeat(span.end.clamp(start + 1, line_end.max(start + 1)) - start);

        format!(
            "{gutter} {}\n{} {} {line}\n{gutter} {} {}{}",
            "|".blue(),
            row.blue(),
            "|".blue(),
            "|".blue(),
            " ".repeat(start - line_start),
            underline.red().bold()
        )
    }
}

#[derive(Debug)]
pub enum SourceFileOrigin {
    Memory,
    File(PathBuf),
}

impl core::fmt::Display for SourceFileOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFileOrigin::Memory => f.write_str("<memory>"),
            SourceFileOrigin::File(path) => f.write_fmt(format_args!("{}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rows_and_columns_are_one_based() {
        let source = SourceFile::from_memory("var a : i32;\nvar b : u32;");

        assert_eq!(source.row_for_position(0), 1);
        assert_eq!(source.column_for_position(0), 1);
        assert_eq!(source.row_for_position(17), 2);
        assert_eq!(source.column_for_position(17), 5);
    }

    #[test]
    fn highlight_points_at_span() {
        let source = SourceFile::from_memory("var a : i32;\nvar $ : u32;");
        let rendered = strip_ansi_escapes::strip_str(source.highlight_span(Span::new(17, 18)));

        assert_eq!(rendered, "  |\n2 | var $ : u32;\n  |     ^");
    }
}
