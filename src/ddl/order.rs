//! Classify DDL statements and replay them in dependency order.

use super::lexer::{split_statements, RawStatement, TrailingComment};
use crate::error::{Result, SchemaError};
use std::path::{Path, PathBuf};

/// Statement class, ordered by replay priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatementKind {
    CreateTable,
    Other,
    AlterTable,
    CreateIndex,
}

impl StatementKind {
    pub fn priority(self) -> u8 {
        match self {
            Self::CreateTable => 0,
            Self::Other => 1,
            Self::AlterTable => 2,
            Self::CreateIndex => 3,
        }
    }
}

/// A statement tagged with its class and global position.
#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub sequence: usize,
    pub source: PathBuf,
    raw: RawStatement,
}

impl Statement {
    pub fn text(&self) -> &str {
        &self.raw.text
    }

    /// Statement text with a trailing `;` that no comment can swallow.
    pub fn terminated(&self) -> String {
        let text = self.raw.text.as_str();
        match self.raw.trailing_comment {
            Some(TrailingComment::Line) => return format!("{text}\n;"),
            Some(TrailingComment::OpenBlock) => return format!("{text} */;"),
            None => {}
        }
        if text.ends_with(';') {
            text.to_string()
        } else {
            format!("{text};")
        }
    }
}

/// Skip whitespace, `--` comments and `/* */` comments at the start of `text`.
fn skip_leading_trivia(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        if let Some(rest) = text.strip_prefix("--") {
            text = rest.find('\n').map_or("", |i| &rest[i + 1..]);
        } else if let Some(rest) = text.strip_prefix("/*") {
            text = rest.find("*/").map_or("", |i| &rest[i + 2..]);
        } else {
            return text;
        }
    }
}

/// Leading keywords of a statement, upper-cased.
fn leading_words(text: &str, limit: usize) -> Vec<String> {
    skip_leading_trivia(text)
        .split_whitespace()
        .take(limit)
        .map(|word| {
            word.chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
                .to_uppercase()
        })
        .collect()
}

/// Classify a statement by its first keywords, case-insensitively.
pub fn classify(text: &str) -> StatementKind {
    let words = leading_words(text, 5);
    let words: Vec<&str> = words.iter().map(String::as_str).collect();

    match words.as_slice() {
        ["CREATE", "TABLE", ..] => StatementKind::CreateTable,
        ["ALTER", "TABLE", ..] => StatementKind::AlterTable,
        ["CREATE", rest @ ..] if is_index_prefix(rest) => StatementKind::CreateIndex,
        _ => StatementKind::Other,
    }
}

/// Matches `[UNIQUE] [NULL_FILTERED | NULL FILTERED] INDEX`.
fn is_index_prefix(words: &[&str]) -> bool {
    let mut rest = words;
    if let ["UNIQUE", tail @ ..] = rest {
        rest = tail;
    }
    if let ["NULL_FILTERED", tail @ ..] | ["NULL", "FILTERED", tail @ ..] = rest {
        rest = tail;
    }
    matches!(rest, ["INDEX", ..])
}

/// Split and classify every file, numbering statements in file then text order.
pub fn collect_statements<P: AsRef<Path>, S: AsRef<str>>(files: &[(P, S)]) -> Vec<Statement> {
    let mut statements = Vec::new();
    for (path, content) in files {
        let path = path.as_ref();
        let raw = split_statements(content.as_ref());
        log::debug!("{}: {} statement(s)", path.display(), raw.len());
        for raw in raw {
            statements.push(Statement {
                kind: classify(&raw.text),
                sequence: statements.len(),
                source: path.to_path_buf(),
                raw,
            });
        }
    }
    statements
}

/// Produce one script where tables are created before they are altered or indexed.
///
/// Statements are stably sorted by class (`CREATE TABLE`, other, `ALTER TABLE`,
/// `CREATE INDEX`), keeping source order within a class, re-terminated with
/// `;` and joined by blank lines.
pub fn order_statements<P: AsRef<Path>, S: AsRef<str>>(files: &[(P, S)]) -> Result<String> {
    let mut statements = collect_statements(files);
    if statements.is_empty() {
        return Err(SchemaError::NoStatements);
    }

    statements.sort_by_key(|s| (s.kind.priority(), s.sequence));

    Ok(statements
        .iter()
        .map(Statement::terminated)
        .collect::<Vec<_>>()
        .join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("CREATE TABLE A (Id INT64)"), StatementKind::CreateTable);
        assert_eq!(classify("create   table a (id int64)"), StatementKind::CreateTable);
        assert_eq!(classify("ALTER TABLE A ADD COLUMN B INT64"), StatementKind::AlterTable);
        assert_eq!(classify("CREATE INDEX I ON A (B)"), StatementKind::CreateIndex);
        assert_eq!(classify("CREATE UNIQUE INDEX I ON A (B)"), StatementKind::CreateIndex);
        assert_eq!(
            classify("CREATE UNIQUE NULL_FILTERED INDEX I ON A (B)"),
            StatementKind::CreateIndex
        );
        assert_eq!(
            classify("CREATE NULL FILTERED INDEX I ON A (B)"),
            StatementKind::CreateIndex
        );
        assert_eq!(classify("CREATE VIEW V AS SELECT 1"), StatementKind::Other);
        assert_eq!(classify("DROP TABLE A"), StatementKind::Other);
    }

    #[test]
    fn test_classify_skips_leading_comments() {
        let text = "-- orders\n/* multi\nline */\n  ALTER TABLE Orders ADD FOREIGN KEY (C) REFERENCES Customers (Id)";
        assert_eq!(classify(text), StatementKind::AlterTable);
    }

    #[test]
    fn test_classify_tolerates_attached_punctuation() {
        assert_eq!(classify("CREATE TABLE Singers(Id INT64)"), StatementKind::CreateTable);
        assert_eq!(classify("CREATE INDEX(x)"), StatementKind::CreateIndex);
    }

    #[test]
    fn test_reverse_order_across_files() {
        let files = [
            ("index.sql", "CREATE INDEX OrdersByCustomer ON Orders (CustomerId);"),
            (
                "alter.sql",
                "ALTER TABLE Orders ADD FOREIGN KEY (CustomerId) REFERENCES Customers (Id);",
            ),
            (
                "create.sql",
                "CREATE TABLE Orders (Id INT64, CustomerId INT64) PRIMARY KEY (Id);",
            ),
        ];
        let ordered = order_statements(&files).unwrap();
        let create = ordered.find("CREATE TABLE").unwrap();
        let alter = ordered.find("ALTER TABLE").unwrap();
        let index = ordered.find("CREATE INDEX").unwrap();

        assert!(create < alter);
        assert!(alter < index);
    }

    #[test]
    fn test_stable_within_class() {
        let files = [
            ("a.sql", "ALTER TABLE T ADD COLUMN A INT64;\nCREATE TABLE U (Id INT64) PRIMARY KEY (Id);"),
            ("b.sql", "ALTER TABLE T ADD COLUMN B INT64;\nCREATE TABLE T (Id INT64) PRIMARY KEY (Id);"),
        ];
        let ordered = order_statements(&files).unwrap();
        let expected = [
            "CREATE TABLE U (Id INT64) PRIMARY KEY (Id);",
            "CREATE TABLE T (Id INT64) PRIMARY KEY (Id);",
            "ALTER TABLE T ADD COLUMN A INT64;",
            "ALTER TABLE T ADD COLUMN B INT64;",
        ]
        .join("\n\n");

        assert_eq!(ordered, expected);
    }

    #[test]
    fn test_other_statements_between_create_and_alter() {
        let files = [(
            "schema.sql",
            "CREATE INDEX I ON T (A);\nALTER TABLE T ADD COLUMN B INT64;\nCREATE VIEW V SQL SECURITY INVOKER AS SELECT 1;\nCREATE TABLE T (A INT64) PRIMARY KEY (A)",
        )];
        let statements = collect_statements(&files);
        let mut kinds: Vec<_> = statements.iter().map(|s| (s.kind, s.sequence)).collect();
        kinds.sort_by_key(|(kind, seq)| (kind.priority(), *seq));

        assert_eq!(
            kinds.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            vec![
                StatementKind::CreateTable,
                StatementKind::Other,
                StatementKind::AlterTable,
                StatementKind::CreateIndex,
            ]
        );
    }

    #[test]
    fn test_sequence_follows_file_order() {
        let files = [("a.sql", "SELECT 1; SELECT 2;"), ("b.sql", "SELECT 3;")];
        let statements = collect_statements(&files);

        assert_eq!(statements.len(), 3);
        assert_eq!(statements[2].sequence, 2);
        assert_eq!(statements[2].source, PathBuf::from("b.sql"));
        assert_eq!(statements[1].text(), "SELECT 2");
    }

    #[test]
    fn test_semicolon_inside_string_survives_ordering() {
        let files = [("data.sql", "INSERT INTO T (A) VALUES ('a;b');")];
        assert_eq!(
            order_statements(&files).unwrap(),
            "INSERT INTO T (A) VALUES ('a;b');"
        );
    }

    #[test]
    fn test_empty_files_do_not_fail_alone() {
        let files = [("empty.sql", ""), ("comments.sql", "-- todo\n"), ("t.sql", "CREATE TABLE T (A INT64) PRIMARY KEY (A)")];
        assert_eq!(
            order_statements(&files).unwrap(),
            "CREATE TABLE T (A INT64) PRIMARY KEY (A);"
        );
    }

    #[test]
    fn test_no_statements_fails() {
        let files = [("empty.sql", ""), ("comments.sql", "/* nothing */")];
        assert!(matches!(
            order_statements(&files),
            Err(SchemaError::NoStatements)
        ));
        let none: [(&str, &str); 0] = [];
        assert!(matches!(order_statements(&none), Err(SchemaError::NoStatements)));
    }

    #[test]
    fn test_terminator_after_line_comment() {
        let files = [("t.sql", "CREATE TABLE T (A INT64) PRIMARY KEY (A) -- done")];
        assert_eq!(
            order_statements(&files).unwrap(),
            "CREATE TABLE T (A INT64) PRIMARY KEY (A) -- done\n;"
        );
    }

    #[test]
    fn test_terminator_on_line_after_comment() {
        let files = [(
            "t.sql",
            "CREATE TABLE T (\n  A INT64\n) PRIMARY KEY (A) -- main table\n;\nCREATE INDEX I ON T (A);",
        )];
        assert_eq!(
            order_statements(&files).unwrap(),
            "CREATE TABLE T (\n  A INT64\n) PRIMARY KEY (A) -- main table\n;\n\nCREATE INDEX I ON T (A);"
        );
    }

    #[test]
    fn test_unclosed_block_comment_is_closed() {
        let files = [
            ("a.sql", "CREATE TABLE T (A INT64) PRIMARY KEY (A) /* trailing"),
            ("b.sql", "CREATE INDEX I ON T (A);"),
        ];
        assert_eq!(
            order_statements(&files).unwrap(),
            "CREATE TABLE T (A INT64) PRIMARY KEY (A) /* trailing */;\n\nCREATE INDEX I ON T (A);"
        );
    }
}
