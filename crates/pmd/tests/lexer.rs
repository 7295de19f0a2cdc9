//! Integration tests for the template lexer.

use pmd::parser::{LexError, Position, TokenKind, tokenize};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source, 0)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn texts(source: &str) -> Vec<String> {
    tokenize(source, 0)
        .unwrap()
        .into_iter()
        .map(|t| t.text)
        .collect()
}

// =============================================================================
// Text and regions
// =============================================================================

#[test]
fn test_plain_text_is_one_token() {
    assert_eq!(kinds("Hello, world!"), vec![TokenKind::Text, TokenKind::Eof]);
}

#[test]
fn test_empty_source_is_only_eof() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
}

#[test]
fn test_variable_region() {
    assert_eq!(
        kinds("Hi {{ name }}!"),
        vec![
            TokenKind::Text,
            TokenKind::VarOpen,
            TokenKind::Ident,
            TokenKind::VarClose,
            TokenKind::Text,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_tag_region() {
    assert_eq!(
        texts("{% for k, v in items %}"),
        vec!["{%", "for", "k", ",", "v", "in", "items", "%}", ""]
    );
}

#[test]
fn test_comment_is_dropped() {
    assert_eq!(texts("a{# note #}b"), vec!["a", "b", ""]);
}

#[test]
fn test_comment_may_contain_delimiters() {
    assert_eq!(texts("{# {{ x }} {% if %} #}done"), vec!["done", ""]);
}

#[test]
fn test_single_brace_is_text() {
    assert_eq!(texts("{ not a tag }"), vec!["{ not a tag }", ""]);
}

#[test]
fn test_whitespace_inside_region_is_optional() {
    assert_eq!(texts("{{name}}"), texts("{{   name   }}"));
}

// =============================================================================
// Literals and operators
// =============================================================================

#[test]
fn test_double_quoted_string_unescapes() {
    let tokens = tokenize(r#"{{ "say \"hi\"\n" }}"#, 0).unwrap();
    assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[1].text, "say \"hi\"\n");
}

#[test]
fn test_single_quoted_string() {
    let tokens = tokenize("{% include 'parts/a.pmd' %}", 0).unwrap();
    assert_eq!(tokens[2].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[2].text, "parts/a.pmd");
}

#[test]
fn test_string_may_contain_close_delimiter() {
    assert_eq!(texts(r#"{{ "}}" }}"#), vec!["{{", "}}", "}}", ""]);
}

#[test]
fn test_numbers() {
    assert_eq!(texts("{{ -3 }}"), vec!["{{", "-3", "}}", ""]);
    assert_eq!(texts("{{ 0.25 }}"), vec!["{{", "0.25", "}}", ""]);
}

#[test]
fn test_operators() {
    assert_eq!(
        texts("{{ (a <= b) != (c > d) }}"),
        vec!["{{", "(", "a", "<=", "b", ")", "!=", "(", "c", ">", "d", ")", "}}", ""]
    );
}

#[test]
fn test_keywords_lex_as_identifiers() {
    let tokens = tokenize("{{ not a and b or c }}", 0).unwrap();
    assert!(tokens[1].is_word("not"));
    assert!(tokens[3].is_word("and"));
    assert!(tokens[5].is_word("or"));
}

// =============================================================================
// Positions
// =============================================================================

#[test]
fn test_positions_are_one_based() {
    let tokens = tokenize("ab\n  {{ x }}", 0).unwrap();
    assert_eq!(
        tokens[1].position,
        Position {
            line: 2,
            column: 3,
            offset: 5
        }
    );
    assert_eq!(tokens[2].position.column, 6);
}

#[test]
fn test_start_offset_keeps_source_positions() {
    let source = "@a: b\n\nHi {{ x }}";
    let tokens = tokenize(source, 7).unwrap();
    assert_eq!(tokens[0].text, "Hi ");
    assert_eq!(tokens[0].position.line, 3);
    assert_eq!(tokens[0].position.column, 1);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_unterminated_variable() {
    assert_eq!(
        tokenize("Hello {{ name", 0),
        Err(LexError::Unterminated {
            delimiter: "{{",
            position: Position {
                line: 1,
                column: 7,
                offset: 6
            }
        })
    );
}

#[test]
fn test_unterminated_tag() {
    let err = tokenize("{% if x", 0).unwrap_err();
    assert!(matches!(
        err,
        LexError::Unterminated {
            delimiter: "{%",
            ..
        }
    ));
}

#[test]
fn test_unterminated_comment() {
    let err = tokenize("text {# forever", 0).unwrap_err();
    assert!(matches!(
        err,
        LexError::Unterminated {
            delimiter: "{#",
            ..
        }
    ));
    assert_eq!(err.position().column, 6);
}

#[test]
fn test_unterminated_string() {
    let err = tokenize(r#"{{ "abc }}"#, 0).unwrap_err();
    assert_eq!(
        err,
        LexError::UnterminatedString {
            position: Position {
                line: 1,
                column: 4,
                offset: 3
            }
        }
    );
}

#[test]
fn test_string_cannot_span_lines() {
    let err = tokenize("{{ 'abc\ndef' }}", 0).unwrap_err();
    assert!(matches!(err, LexError::UnterminatedString { .. }));
}

#[test]
fn test_unexpected_character() {
    let err = tokenize("{{ a + b }}", 0).unwrap_err();
    assert!(matches!(
        err,
        LexError::UnexpectedCharacter { found: '+', .. }
    ));
    assert_eq!(err.position().column, 6);
}

#[test]
fn test_error_display() {
    let err = tokenize("x\n{{ a | b }}", 0).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"2:6: unexpected character '|'");
}
