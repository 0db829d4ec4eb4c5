//! Split raw DDL text into statements at top-level semicolons.

use std::iter::Peekable;
use std::str::Chars;

/// Lexical mode of the scanner. A `;` terminates a statement only in `Code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Comment that the text of a statement ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingComment {
    /// `-- ...` running to the end of the text.
    Line,
    /// `/* ...` never closed.
    OpenBlock,
}

/// One statement as it appeared in the source, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    pub text: String,
    /// Set when a terminator appended right after `text` would be commented out.
    pub trailing_comment: Option<TrailingComment>,
}

/// Character scanner that tracks quoting and comments.
pub struct Splitter<'a> {
    chars: Peekable<Chars<'a>>,
    current_char: Option<char>,
    mode: Mode,
    /// Mode in which the last non-whitespace character was scanned.
    last_mode: Mode,
    buffer: String,
    has_code: bool,
    statements: Vec<RawStatement>,
}

impl<'a> Splitter<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current_char = chars.next();
        Self {
            chars,
            current_char,
            mode: Mode::Code,
            last_mode: Mode::Code,
            buffer: String::new(),
            has_code: false,
            statements: Vec::new(),
        }
    }

    fn advance(&mut self) {
        self.current_char = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Push the current character and move on.
    fn take(&mut self) {
        if let Some(c) = self.current_char {
            if !c.is_whitespace() {
                self.last_mode = self.mode;
            }
            self.buffer.push(c);
        }
        self.advance();
    }

    fn finish_statement(&mut self) {
        let text = self.buffer.trim();
        // Statements made only of comments and whitespace are dropped.
        if self.has_code && !text.is_empty() {
            self.statements.push(RawStatement {
                text: text.to_string(),
                trailing_comment: match self.last_mode {
                    Mode::LineComment => Some(TrailingComment::Line),
                    Mode::BlockComment => Some(TrailingComment::OpenBlock),
                    _ => None,
                },
            });
        }
        self.buffer.clear();
        self.last_mode = Mode::Code;
        self.has_code = false;
    }

    fn scan_code(&mut self, c: char) {
        match c {
            ';' => {
                self.advance();
                self.finish_statement();
            }
            '\'' => {
                self.has_code = true;
                self.mode = Mode::SingleQuoted;
                self.take();
            }
            '"' => {
                self.has_code = true;
                self.mode = Mode::DoubleQuoted;
                self.take();
            }
            '-' if self.peek() == Some(&'-') => {
                self.mode = Mode::LineComment;
                self.take();
                self.take();
            }
            '/' if self.peek() == Some(&'*') => {
                self.mode = Mode::BlockComment;
                self.take();
                self.take();
            }
            c => {
                if !c.is_whitespace() {
                    self.has_code = true;
                }
                self.take();
            }
        }
    }

    fn scan_quoted(&mut self, quote: char) {
        if self.current_char == Some(quote) {
            if self.peek() == Some(&quote) {
                // Doubled quote stays inside the string.
                self.take();
                self.take();
            } else {
                self.take();
                self.mode = Mode::Code;
            }
        } else {
            self.take();
        }
    }

    fn scan_line_comment(&mut self, c: char) {
        self.take();
        if c == '\n' {
            self.mode = Mode::Code;
        }
    }

    fn scan_block_comment(&mut self, c: char) {
        if c == '*' && self.peek() == Some(&'/') {
            // A closed comment no longer swallows what follows it.
            self.mode = Mode::Code;
            self.take();
            self.take();
        } else {
            self.take();
        }
    }

    /// Consume the whole input and return its statements in source order.
    ///
    /// A trailing statement without a terminator is kept when it holds code.
    pub fn split(mut self) -> Vec<RawStatement> {
        while let Some(c) = self.current_char {
            match self.mode {
                Mode::Code => self.scan_code(c),
                Mode::SingleQuoted => self.scan_quoted('\''),
                Mode::DoubleQuoted => self.scan_quoted('"'),
                Mode::LineComment => self.scan_line_comment(c),
                Mode::BlockComment => self.scan_block_comment(c),
            }
        }
        self.finish_statement();
        self.statements
    }
}

/// Split `input` into statements.
pub fn split_statements(input: &str) -> Vec<RawStatement> {
    Splitter::new(input).split()
}
