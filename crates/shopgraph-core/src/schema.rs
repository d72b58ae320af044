//! Schema definition parsing.
//!
//! A schema definition is a list of Cypher statements terminated by `;`.
//! The splitter understands just enough Cypher lexing to leave delimiters
//! alone when they appear inside quoted literals or comments.

use crate::error::{CoreError, CoreResult};

/// Statement terminator.
pub const DELIMITER: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Split a schema definition into trimmed, non-empty statements.
///
/// Comments are dropped. The last statement does not need a terminator.
pub fn split_statements(text: &str) -> CoreResult<Vec<String>> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = State::Code;
    let mut line = 1usize;
    let mut opened_on = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }

        match state {
            State::Code => match c {
                DELIMITER => push_statement(&mut statements, &mut current),
                '\'' | '"' | '`' => {
                    state = State::Quoted(c);
                    opened_on = line;
                    current.push(c);
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                    opened_on = line;
                    // Keep tokens on either side of the comment apart.
                    current.push(' ');
                }
                _ => current.push(c),
            },
            State::Quoted(quote) => {
                current.push(c);
                if c == '\\' && quote != '`' {
                    if let Some(escaped) = chars.next() {
                        if escaped == '\n' {
                            line += 1;
                        }
                        current.push(escaped);
                    }
                } else if c == quote {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    current.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
        }
    }

    match state {
        State::Quoted(quote) => Err(CoreError::SchemaSyntax {
            message: format!("unterminated {quote} literal"),
            line: opened_on,
        }),
        State::BlockComment => Err(CoreError::SchemaSyntax {
            message: "unterminated block comment".to_string(),
            line: opened_on,
        }),
        State::Code | State::LineComment => {
            push_statement(&mut statements, &mut current);
            Ok(statements)
        }
    }
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_delimiter() {
        let input = "CREATE CONSTRAINT a IF NOT EXISTS FOR (c:Category) REQUIRE c.id IS UNIQUE;\n\
                     CREATE CONSTRAINT b IF NOT EXISTS FOR (p:Product) REQUIRE p.id IS UNIQUE;\n";
        let statements = split_statements(input).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE CONSTRAINT a"));
        assert!(statements[1].ends_with("IS UNIQUE"));
    }

    #[test]
    fn test_skips_empty_statements_and_whitespace() {
        let statements = split_statements(";;  \n ; RETURN 1 ;\n\n").unwrap();
        assert_eq!(statements, vec!["RETURN 1"]);
    }

    #[test]
    fn test_trailing_statement_without_terminator() {
        let statements = split_statements("RETURN 1; RETURN 2").unwrap();
        assert_eq!(statements, vec!["RETURN 1", "RETURN 2"]);
    }

    #[test]
    fn test_delimiter_inside_literals_is_kept() {
        let input = "MERGE (c:Category {id: 1}) SET c.name = 'a;b';\n\
                     MATCH (n) WHERE n.note = \"x;y\" RETURN n;\n\
                     MATCH (n:`odd;label`) RETURN n";
        let statements = split_statements(input).unwrap();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].ends_with("'a;b'"));
        assert!(statements[1].contains("\"x;y\""));
        assert!(statements[2].contains("`odd;label`"));
    }

    #[test]
    fn test_escaped_quote_does_not_close_literal() {
        let statements = split_statements(r"RETURN 'it\'s; fine'; RETURN 2").unwrap();
        assert_eq!(statements, vec![r"RETURN 'it\'s; fine'", "RETURN 2"]);
    }

    #[test]
    fn test_comments_are_dropped() {
        let input = "// constraints; for nodes\n\
                     CREATE INDEX x IF NOT EXISTS FOR (o:Order) ON (o.ts); /* cleanup; later */\n\
                     // only a comment;\n";
        let statements = split_statements(input).unwrap();
        assert_eq!(statements, vec!["CREATE INDEX x IF NOT EXISTS FOR (o:Order) ON (o.ts)"]);
    }

    #[test]
    fn test_comment_markers_inside_literals_are_text() {
        let statements = split_statements("RETURN 'http://example.com/*x*/'").unwrap();
        assert_eq!(statements, vec!["RETURN 'http://example.com/*x*/'"]);
    }

    #[test]
    fn test_unterminated_literal_is_an_error() {
        let err = split_statements("RETURN 1;\nRETURN 'oops;\nRETURN 2;").unwrap_err();
        match err {
            CoreError::SchemaSyntax { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_block_comment_is_an_error() {
        assert!(matches!(
            split_statements("RETURN 1; /* never closed"),
            Err(CoreError::SchemaSyntax { .. })
        ));
    }

    #[test]
    fn test_empty_definition() {
        assert!(split_statements("").unwrap().is_empty());
        assert!(split_statements("  // nothing here\n").unwrap().is_empty());
    }
}
