//! Tokenization of Quokkafile source text using `nom`.
//!
//! Produces a stream of [`Spanned`] tokens from raw input for the parser to
//! consume. Whitespace, `//` comments and `#` comments are discarded between
//! tokens. Every token records the line and column it starts at.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace1, not_line_ending},
    combinator::value,
    multi::many0,
    sequence::preceded,
};
use quokka_common::error::{QuokkaError, Result};
use quokka_common::types::SourcePosition;

/// A token in the Quokkafile language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `step` keyword.
    Step,
    /// `after` keyword.
    After,
    /// An identifier (declaration keyword, step name, block key).
    Identifier(String),
    /// A double-quoted string literal.
    StringLiteral(String),
    /// An integer literal.
    Integer(i64),
    /// `{` opening brace.
    BraceOpen,
    /// `}` closing brace.
    BraceClose,
    /// `[` opening bracket.
    BracketOpen,
    /// `]` closing bracket.
    BracketClose,
    /// `=` assignment.
    Equals,
    /// `,` separator.
    Comma,
    /// `;` statement separator.
    Semicolon,
}

impl Token {
    /// Human-readable description used in syntax errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Step => "keyword `step`".into(),
            Self::After => "keyword `after`".into(),
            Self::Identifier(word) => format!("`{word}`"),
            Self::StringLiteral(_) => "string literal".into(),
            Self::Integer(n) => format!("integer `{n}`"),
            Self::BraceOpen => "`{`".into(),
            Self::BraceClose => "`}`".into(),
            Self::BracketOpen => "`[`".into(),
            Self::BracketClose => "`]`".into(),
            Self::Equals => "`=`".into(),
            Self::Comma => "`,`".into(),
            Self::Semicolon => "`;`".into(),
        }
    }
}

/// A token together with the position it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Where it starts.
    pub position: SourcePosition,
}

/// Maps byte offsets in the source to line/column positions.
#[derive(Debug)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Indexes `source`.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Position of the character starting at byte `offset`.
    ///
    /// Columns count characters, not bytes.
    #[must_use]
    pub fn position(&self, offset: usize) -> SourcePosition {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self.source[line_start..offset].chars().count() + 1;
        SourcePosition::new(line, column)
    }

    /// Position just past the last character.
    #[must_use]
    pub fn end(&self) -> SourcePosition {
        self.position(self.source.len())
    }
}

/// Skippable items: whitespace or line comments.
fn skip_trivia(input: &str) -> IResult<&str, ()> {
    let slash_comment = value((), preceded(tag("//"), not_line_ending));
    let hash_comment = value((), preceded(char('#'), not_line_ending));
    let ws = value((), multispace1);
    let (input, _) = many0(alt((ws, slash_comment, hash_comment))).parse(input)?;
    Ok((input, ()))
}

/// Parses a double-quoted string literal with basic escape support.
fn string_literal(input: &str) -> IResult<&str, Token> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = input.char_indices();
    loop {
        match chars.next() {
            Some((idx, '"')) => {
                let remaining = &input[idx + 1..];
                return Ok((remaining, Token::StringLiteral(result)));
            }
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => result.push('\n'),
                Some((_, 't')) => result.push('\t'),
                Some((_, '\\')) => result.push('\\'),
                Some((_, '"')) => result.push('"'),
                Some((_, c)) => {
                    result.push('\\');
                    result.push(c);
                }
                None => {
                    return Err(nom::Err::Failure(nom::error::Error::new(
                        input,
                        nom::error::ErrorKind::Char,
                    )));
                }
            },
            Some((_, c)) => result.push(c),
            None => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Char,
                )));
            }
        }
    }
}

/// Parses an integer literal (sequence of digits).
fn integer_literal(input: &str) -> IResult<&str, Token> {
    let (rest, digits) = digit1(input)?;
    let val: i64 = digits.parse().map_err(|_| {
        nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
    })?;
    Ok((rest, Token::Integer(val)))
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Parses an identifier or keyword.
fn identifier_or_keyword(input: &str) -> IResult<&str, Token> {
    let (input, first) = take_while1(is_ident_start)(input)?;
    let (input, rest) = take_while(is_ident_continue)(input)?;
    let word = format!("{first}{rest}");
    let token = match word.as_str() {
        "step" => Token::Step,
        "after" => Token::After,
        _ => Token::Identifier(word),
    };
    Ok((input, token))
}

/// Parses a symbol token.
fn symbol(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::BraceOpen, char('{')),
        value(Token::BraceClose, char('}')),
        value(Token::BracketOpen, char('[')),
        value(Token::BracketClose, char(']')),
        value(Token::Equals, char('=')),
        value(Token::Comma, char(',')),
        value(Token::Semicolon, char(';')),
    ))
    .parse(input)
}

/// Parses a single token (after trivia has been skipped).
fn single_token(input: &str) -> IResult<&str, Token> {
    alt((
        string_literal,
        symbol,
        integer_literal,
        identifier_or_keyword,
    ))
    .parse(input)
}

/// Describes why tokenization stopped at `remaining`.
fn lex_error(remaining: &str, position: SourcePosition) -> QuokkaError {
    let (expected, found) = match remaining.chars().next() {
        Some('"') => (
            "closing `\"` for string literal".to_string(),
            "end of input".to_string(),
        ),
        Some(c) if c.is_ascii_digit() => {
            let digits: String = remaining.chars().take_while(char::is_ascii_digit).collect();
            (
                "an integer that fits in 64 bits".to_string(),
                format!("`{digits}`"),
            )
        }
        Some(c) => ("a token".to_string(), format!("unexpected character {c:?}")),
        None => ("a token".to_string(), "end of input".to_string()),
    };
    QuokkaError::Syntax {
        position,
        expected,
        found,
    }
}

/// Tokenizes Quokkafile source into positioned tokens.
///
/// Whitespace and comments are discarded.
///
/// # Errors
///
/// Returns `QuokkaError::Syntax` positioned at the offending character; for
/// an unterminated string literal that is the opening quote.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let index = LineIndex::new(input);
    let mut tokens = Vec::new();
    let mut remaining = input;

    loop {
        let offset = input.len() - remaining.len();
        let (rest, ()) =
            skip_trivia(remaining).map_err(|_| lex_error(remaining, index.position(offset)))?;
        remaining = rest;

        if remaining.is_empty() {
            break;
        }

        let offset = input.len() - remaining.len();
        let position = index.position(offset);
        let (rest, token) = single_token(remaining).map_err(|_| lex_error(remaining, position))?;
        tokens.push(Spanned { token, position });
        remaining = rest;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input)
            .expect("should tokenize")
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn tokenize_keywords() {
        assert_eq!(
            kinds("step after base"),
            vec![Token::Step, Token::After, Token::Identifier("base".into())]
        );
    }

    #[test]
    fn tokenize_symbols() {
        assert_eq!(
            kinds("{ } [ ] = , ;"),
            vec![
                Token::BraceOpen,
                Token::BraceClose,
                Token::BracketOpen,
                Token::BracketClose,
                Token::Equals,
                Token::Comma,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn tokenize_string_with_escapes() {
        assert_eq!(
            kinds(r#""line\nnew\ttab\\slash\"quote""#),
            vec![Token::StringLiteral("line\nnew\ttab\\slash\"quote".into())]
        );
    }

    #[test]
    fn tokenize_integer() {
        assert_eq!(kinds("8080 443"), vec![Token::Integer(8080), Token::Integer(443)]);
    }

    #[test]
    fn tokenize_identifier_with_dots_and_dashes() {
        assert_eq!(
            kinds("org.label-schema.name"),
            vec![Token::Identifier("org.label-schema.name".into())]
        );
    }

    #[test]
    fn tokenize_skips_both_comment_styles() {
        let input = "base = \"alpine\" // trailing\n# full line\nrun = \"x\"";
        assert_eq!(
            kinds(input),
            vec![
                Token::Identifier("base".into()),
                Token::Equals,
                Token::StringLiteral("alpine".into()),
                Token::Identifier("run".into()),
                Token::Equals,
                Token::StringLiteral("x".into()),
            ]
        );
    }

    #[test]
    fn tokenize_empty_and_comment_only_input() {
        assert!(kinds("").is_empty());
        assert!(kinds("// just a comment\n# another one").is_empty());
    }

    #[test]
    fn tokens_carry_positions() {
        let tokens = tokenize("base = \"alpine\"\n  run = \"x\"").expect("should tokenize");
        let positions: Vec<_> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(
            positions,
            vec![
                SourcePosition::new(1, 1),
                SourcePosition::new(1, 6),
                SourcePosition::new(1, 8),
                SourcePosition::new(2, 3),
                SourcePosition::new(2, 7),
                SourcePosition::new(2, 9),
            ]
        );
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let tokens = tokenize("run = \"héllo\" ;").expect("should tokenize");
        assert_eq!(tokens[3].position, SourcePosition::new(1, 15));
    }

    #[test]
    fn unterminated_string_reports_opening_quote() {
        let err = tokenize("base = \"alpine\"\nrun = \"echo hi").unwrap_err();
        match err {
            QuokkaError::Syntax {
                position, expected, ..
            } => {
                assert_eq!(position, SourcePosition::new(2, 7));
                assert!(expected.contains("closing"), "got: {expected}");
            }
            other => panic!("expected syntax error, got {other}"),
        }
    }

    #[test]
    fn invalid_character_reports_its_position() {
        let err = tokenize("run = @x").unwrap_err();
        assert_eq!(err.position(), Some(SourcePosition::new(1, 7)));
        assert!(err.to_string().contains("'@'"), "got: {err}");
    }

    #[test]
    fn oversized_integer_is_rejected() {
        let err = tokenize("expose = 99999999999999999999").unwrap_err();
        assert_eq!(err.position(), Some(SourcePosition::new(1, 10)));
    }

    #[test]
    fn line_index_end_position() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.end(), SourcePosition::new(2, 3));
        assert_eq!(index.position(3), SourcePosition::new(2, 1));
    }
}
