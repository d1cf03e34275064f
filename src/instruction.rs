//! Dockerfile instruction parser
//!
//! Turns build-file text into an ordered list of [`Instruction`]s. Only the
//! instruction keyword, its raw argument text and its source lines are
//! extracted; arguments are never interpreted.

use crate::image::BaseImageReference;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default line-continuation character
pub const DEFAULT_ESCAPE: char = '\\';

/// Parser directives recognized in the file header
const KNOWN_DIRECTIVES: [&str; 3] = ["escape", "syntax", "check"];

/// Error while reading a Dockerfile
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One build directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Uppercased keyword (e.g., "RUN", "COPY")
    pub name: String,

    /// Raw argument text with leading whitespace removed
    pub value: String,

    /// Line the directive starts on (1-based)
    pub line: usize,
}

impl Instruction {
    /// Build an instruction from a single source line
    pub fn new(name: &str, value: &str, line: usize) -> Self {
        Self {
            name: name.to_uppercase(),
            value: value.to_string(),
            line,
        }
    }

    /// Check the keyword, case-insensitively
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A parsed Dockerfile: instructions in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dockerfile {
    instructions: Vec<Instruction>,
}

impl Dockerfile {
    /// Parse Dockerfile text
    pub fn parse(content: &str) -> Self {
        Parser::new(content).run()
    }

    /// Read and parse a Dockerfile from disk
    pub fn parse_file(path: &Path) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dockerfile = Self::parse(&content);
        debug!(
            "parsed {} instructions from {}",
            dockerfile.len(),
            path.display()
        );
        Ok(dockerfile)
    }

    /// All instructions in source order
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Iterate over instructions with the given keyword
    pub fn with_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Instruction> + 'a {
        self.instructions.iter().filter(move |i| i.is(name))
    }

    /// The last FROM instruction, i.e. the stage that ships
    pub fn final_from(&self) -> Option<&Instruction> {
        self.with_name("FROM").last()
    }

    /// Image reference of the final stage, if one is named
    pub fn base_image(&self) -> Option<BaseImageReference> {
        self.final_from()
            .and_then(|from| BaseImageReference::from_instruction_value(&from.value))
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl From<Vec<Instruction>> for Dockerfile {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }
}

/// A directive being assembled across continuation lines
struct Pending {
    start: usize,
    text: String,
}

struct Parser<'a> {
    content: &'a str,
    escape: char,
    instructions: Vec<Instruction>,
    pending: Option<Pending>,
}

impl<'a> Parser<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content,
            escape: DEFAULT_ESCAPE,
            instructions: Vec::new(),
            pending: None,
        }
    }

    fn run(mut self) -> Dockerfile {
        // Directives are only honored before anything else appears
        let mut in_header = true;
        let content = self.content;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            if self.pending.is_none() {
                if trimmed.is_empty() {
                    in_header = false;
                    continue;
                }
                if let Some(comment) = trimmed.strip_prefix('#') {
                    if in_header && !self.parse_directive(comment, line_no) {
                        in_header = false;
                    }
                    continue;
                }
                in_header = false;
            } else if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            self.push_line(raw, line_no);
        }

        if let Some(pending) = self.pending.take() {
            self.emit(pending);
        }

        Dockerfile::from(self.instructions)
    }

    /// Handle `# key=value`; returns false when the comment is not a directive.
    ///
    /// Unknown keys are plain comments and end the directive header.
    fn parse_directive(&mut self, comment: &str, line_no: usize) -> bool {
        let Some((key, value)) = comment.split_once('=') else {
            return false;
        };
        let key = key.trim();
        if !key.starts_with(|c: char| c.is_ascii_alphabetic())
            || key.contains(char::is_whitespace)
            || !KNOWN_DIRECTIVES
                .iter()
                .any(|known| key.eq_ignore_ascii_case(known))
        {
            return false;
        }
        if key.eq_ignore_ascii_case("escape") {
            match value.trim() {
                "\\" => self.escape = '\\',
                "`" => self.escape = '`',
                other => warn!(
                    "line {}: unsupported escape character {:?}, keeping {:?}",
                    line_no, other, self.escape
                ),
            }
        }
        true
    }

    fn push_line(&mut self, raw: &str, line_no: usize) {
        let body = raw.trim_end();
        let (text, continues) = match body.strip_suffix(self.escape) {
            Some(stripped) => (stripped, true),
            None => (raw, false),
        };

        let pending = self.pending.get_or_insert_with(|| Pending {
            start: line_no,
            text: String::new(),
        });
        pending.text.push_str(text);

        if !continues {
            if let Some(done) = self.pending.take() {
                self.emit(done);
            }
        }
    }

    fn emit(&mut self, pending: Pending) {
        let text = pending.text.trim_start();
        let (name, value) = match text.find(char::is_whitespace) {
            Some(pos) => (&text[..pos], text[pos..].trim_start()),
            None => (text, ""),
        };
        if name.is_empty() {
            return;
        }

        self.instructions.push(Instruction {
            name: name.to_uppercase(),
            value: value.to_string(),
            line: pending.start,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(dockerfile: &Dockerfile) -> Vec<&str> {
        dockerfile
            .instructions()
            .iter()
            .map(|i| i.name.as_str())
            .collect()
    }

    #[test]
    fn test_parse_simple() {
        let df = Dockerfile::parse("FROM alpine:3.18\nRUN echo hi\nUSER app\n");

        assert_eq!(names(&df), vec!["FROM", "RUN", "USER"]);
        assert_eq!(df.instructions()[0].value, "alpine:3.18");
        assert_eq!(df.instructions()[1].value, "echo hi");
        assert_eq!(df.instructions()[2].line, 3);
    }

    #[test]
    fn test_name_uppercased_value_kept() {
        let df = Dockerfile::parse("from   Alpine:Edge  ");
        let from = &df.instructions()[0];

        assert_eq!(from.name, "FROM");
        assert_eq!(from.value, "Alpine:Edge  ");
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let df = Dockerfile::parse("# a comment\n\nFROM ubuntu\n   # indented comment\n\nUSER root\n");

        assert_eq!(names(&df), vec!["FROM", "USER"]);
        assert_eq!(df.instructions()[0].line, 3);
        assert_eq!(df.instructions()[1].line, 6);
    }

    #[test]
    fn test_continuation_lines() {
        let content = "FROM debian\nRUN apt-get update && \\\n    apt-get install -y curl\nCOPY . /app\n";
        let df = Dockerfile::parse(content);
        let run = &df.instructions()[1];

        assert_eq!(run.name, "RUN");
        assert_eq!(run.value, "apt-get update &&     apt-get install -y curl");
        assert_eq!(run.line, 2);
        assert_eq!(df.instructions()[2].line, 4);
    }

    #[test]
    fn test_comment_inside_continuation() {
        let content = "RUN apt-get update \\\n# explain\n\n    && apt-get install -y vim\nUSER app";
        let df = Dockerfile::parse(content);

        assert_eq!(df.len(), 2);
        assert!(df.instructions()[0].value.contains("apt-get install"));
        assert_eq!(df.instructions()[1].line, 5);
    }

    #[test]
    fn test_escape_directive() {
        let content = "# escape=`\nFROM mcr.microsoft.com/windows\nRUN dir `\n    c:\\\nUSER app\n";
        let df = Dockerfile::parse(content);

        assert_eq!(names(&df), vec!["FROM", "RUN", "USER"]);
        assert_eq!(df.instructions()[1].value, "dir     c:\\");
        assert_eq!(df.instructions()[2].line, 5);
    }

    #[test]
    fn test_escape_directive_ignored_after_instruction() {
        let content = "FROM alpine\n# escape=`\nRUN echo a `\nUSER app\n";
        let df = Dockerfile::parse(content);

        assert_eq!(names(&df), vec!["FROM", "RUN", "USER"]);
    }

    #[test]
    fn test_unknown_directive_ends_header() {
        let content = "# foo=bar\n# escape=`\nRUN echo a `\nUSER app\n";
        let df = Dockerfile::parse(content);

        assert_eq!(names(&df), vec!["RUN", "USER"]);
        assert_eq!(df.instructions()[0].value, "echo a `");
        assert_eq!(df.instructions()[1].line, 4);
    }

    #[test]
    fn test_known_directives_keep_header_open() {
        let content = "# syntax=docker/dockerfile:1\n# check=skip=all\n# escape=`\nRUN echo a `\n  b\nUSER app\n";
        let df = Dockerfile::parse(content);

        assert_eq!(names(&df), vec!["RUN", "USER"]);
        assert_eq!(df.instructions()[0].value, "echo a   b");
        assert_eq!(df.instructions()[1].line, 6);
    }

    #[test]
    fn test_unterminated_continuation() {
        let df = Dockerfile::parse("RUN echo one \\");

        assert_eq!(df.len(), 1);
        assert_eq!(df.instructions()[0].value, "echo one ");
    }

    #[test]
    fn test_unknown_keyword_kept() {
        let df = Dockerfile::parse("FRM alpine\nbogus");

        assert_eq!(names(&df), vec!["FRM", "BOGUS"]);
        assert_eq!(df.instructions()[1].value, "");
    }

    #[test]
    fn test_crlf_line_endings() {
        let df = Dockerfile::parse("FROM alpine\r\nUSER app\r\n");

        assert_eq!(df.instructions()[0].value, "alpine");
        assert_eq!(df.instructions()[1].value, "app");
    }

    #[test]
    fn test_empty_input() {
        assert!(Dockerfile::parse("").is_empty());
        assert!(Dockerfile::parse("\n# only a comment\n").is_empty());
    }

    #[test]
    fn test_final_from_is_last_stage() {
        let df = Dockerfile::parse("FROM golang:1.22 AS build\nFROM alpine:3.19\n");

        assert_eq!(df.final_from().map(|i| i.line), Some(2));
        assert_eq!(df.base_image().map(|b| b.raw), Some("alpine:3.19".to_string()));
    }

    #[test]
    fn test_parse_file_missing() {
        let err = Dockerfile::parse_file(Path::new("/definitely/not/here/Dockerfile")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here/Dockerfile"));
    }
}
