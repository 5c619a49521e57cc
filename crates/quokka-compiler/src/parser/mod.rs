//! Quokkafile parser built on `nom`.
//!
//! Transforms raw specification text into an ordered AST through a lexing
//! phase and a recursive-descent parsing phase. Parsing stops at the first
//! error; no partial AST is ever returned.

pub mod ast;
pub mod lexer;

use std::io::Read;

use quokka_common::error::{QuokkaError, Result};
use quokka_common::types::SourcePosition;
use quokka_library::reference::SymbolicReference;

use self::ast::{
    BlockKeyword, Declaration, DeclarationKind, Entry, Keyword, Prerequisite, Specification, Value,
};
use self::lexer::{LineIndex, Spanned, Token};

/// The parsing stage: specification bytes in, AST out.
pub trait Parse: Send + Sync {
    /// Reads `input` to the end and parses it.
    ///
    /// # Errors
    ///
    /// Returns `QuokkaError::Input` if the stream cannot be read and
    /// `QuokkaError::Syntax` for malformed text.
    fn parse(&self, input: &mut dyn Read) -> Result<Specification>;
}

/// The default Quokkafile parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser;

impl Parser {
    /// Creates a parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Parse for Parser {
    fn parse(&self, input: &mut dyn Read) -> Result<Specification> {
        let mut bytes = Vec::new();
        let _ = input
            .read_to_end(&mut bytes)
            .map_err(|source| QuokkaError::Input { source })?;
        let text = decode_utf8(&bytes)?;
        parse_spec(text)
    }
}

/// Decodes specification bytes, reporting the first invalid byte's position.
fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        // The prefix up to `valid_up_to` is valid UTF-8 by definition.
        let prefix = std::str::from_utf8(valid).unwrap_or_default();
        QuokkaError::Syntax {
            position: LineIndex::new(prefix).end(),
            expected: "UTF-8 text".into(),
            found: format!("invalid byte 0x{:02x}", bytes[e.valid_up_to()]),
        }
    })
}

/// Cursor into a token stream for recursive-descent parsing.
struct TokenCursor<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    end: SourcePosition,
}

impl<'a> TokenCursor<'a> {
    const fn new(tokens: &'a [Spanned], end: SourcePosition) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
        }
    }

    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&'a Token> {
        self.peek().map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Position of the next token, or of end of input.
    fn here(&self) -> SourcePosition {
        self.peek().map_or(self.end, |s| s.position)
    }

    fn unexpected(&self, expected: &str, found: Option<&Spanned>) -> QuokkaError {
        match found {
            Some(spanned) => syntax_err(spanned.position, expected, spanned.token.describe()),
            None => syntax_err(self.end, expected, "end of input"),
        }
    }

    fn expect_token(&mut self, expected: &Token) -> Result<SourcePosition> {
        match self.advance() {
            Some(spanned) if &spanned.token == expected => Ok(spanned.position),
            other => Err(self.unexpected(&expected.describe(), other)),
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, SourcePosition)> {
        match self.advance() {
            Some(Spanned {
                token: Token::Identifier(s),
                position,
            }) => Ok((s.clone(), *position)),
            other => Err(self.unexpected("identifier", other)),
        }
    }

    fn expect_string(&mut self) -> Result<(String, SourcePosition)> {
        match self.advance() {
            Some(Spanned {
                token: Token::StringLiteral(s),
                position,
            }) => Ok((s.clone(), *position)),
            other => Err(self.unexpected("string literal", other)),
        }
    }

    const fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

fn syntax_err(
    position: SourcePosition,
    expected: impl Into<String>,
    found: impl Into<String>,
) -> QuokkaError {
    QuokkaError::Syntax {
        position,
        expected: expected.into(),
        found: found.into(),
    }
}

fn unclosed(open: SourcePosition, closer: &str) -> QuokkaError {
    syntax_err(
        open,
        format!("`{closer}` to close the group opened here"),
        "end of input",
    )
}

fn skip_separators(cursor: &mut TokenCursor<'_>) {
    while cursor.peek_token() == Some(&Token::Semicolon) {
        let _ = cursor.advance();
    }
}

fn skip_optional_comma(cursor: &mut TokenCursor<'_>) {
    if matches!(cursor.peek_token(), Some(Token::Comma | Token::Semicolon)) {
        let _ = cursor.advance();
    }
}

/// Parses Quokkafile source text.
///
/// # Errors
///
/// Returns `QuokkaError::Syntax` for the first malformed construct.
pub fn parse_spec(input: &str) -> Result<Specification> {
    tracing::info!(bytes = input.len(), "parsing specification");
    let tokens = lexer::tokenize(input)?;
    let mut cursor = TokenCursor::new(&tokens, LineIndex::new(input).end());
    let declarations = parse_statements(&mut cursor, None)?;
    tracing::debug!(declarations = declarations.len(), "parsed specification");
    Ok(Specification { declarations })
}

/// Parses statements until end of input (top level) or the closing brace of
/// the group opened at `group_open`.
fn parse_statements(
    cursor: &mut TokenCursor<'_>,
    group_open: Option<SourcePosition>,
) -> Result<Vec<Declaration>> {
    let mut declarations = Vec::new();
    loop {
        skip_separators(cursor);
        match (cursor.peek_token(), group_open) {
            (None, None) | (Some(Token::BraceClose), Some(_)) => break,
            (None, Some(open)) => return Err(unclosed(open, "}")),
            _ => declarations.push(parse_statement(cursor)?),
        }
    }
    Ok(declarations)
}

fn parse_statement(cursor: &mut TokenCursor<'_>) -> Result<Declaration> {
    let Some(next) = cursor.peek() else {
        return Err(cursor.unexpected("a declaration", None));
    };
    match &next.token {
        Token::Step => parse_step(cursor),
        Token::Identifier(word) => {
            let position = next.position;
            if word == "base" || word == "dep" {
                parse_reference(cursor, word == "base")
            } else if let Some(keyword) = BlockKeyword::from_word(word) {
                parse_block(cursor, keyword)
            } else if let Some(keyword) = Keyword::from_word(word) {
                let _ = cursor.advance();
                let _ = cursor.expect_token(&Token::Equals)?;
                let value = parse_value(cursor)?;
                Ok(Declaration {
                    position,
                    kind: DeclarationKind::Instruction { keyword, value },
                })
            } else {
                Err(syntax_err(
                    position,
                    "a declaration keyword",
                    format!("unknown keyword `{word}`"),
                ))
            }
        }
        _ => Err(cursor.unexpected("a declaration", Some(next))),
    }
}

fn parse_reference(cursor: &mut TokenCursor<'_>, is_base: bool) -> Result<Declaration> {
    let (_, position) = cursor.expect_identifier()?;
    let _ = cursor.expect_token(&Token::Equals)?;
    let (text, literal_at) = cursor.expect_string()?;
    let reference = SymbolicReference::parse(&text).map_err(|e| {
        syntax_err(
            literal_at,
            "a reference of the form name[:constraint]",
            format!("`{text}` ({})", e.reason),
        )
    })?;
    let kind = if is_base {
        DeclarationKind::Base(reference)
    } else {
        DeclarationKind::Dependency(reference)
    };
    Ok(Declaration { position, kind })
}

fn parse_block(cursor: &mut TokenCursor<'_>, keyword: BlockKeyword) -> Result<Declaration> {
    let (_, position) = cursor.expect_identifier()?;
    let open = cursor.expect_token(&Token::BraceOpen)?;
    let mut entries = Vec::new();

    while cursor.peek_token() != Some(&Token::BraceClose) {
        if cursor.at_end() {
            return Err(unclosed(open, "}"));
        }
        let (key, key_at) = match cursor.advance() {
            Some(Spanned {
                token: Token::Identifier(s) | Token::StringLiteral(s),
                position,
            }) => (s.clone(), *position),
            other => return Err(cursor.unexpected("entry key", other)),
        };
        let _ = cursor.expect_token(&Token::Equals)?;
        let (value, _) = cursor.expect_string()?;
        entries.push(Entry {
            position: key_at,
            key,
            value,
        });
        skip_optional_comma(cursor);
    }

    let _ = cursor.expect_token(&Token::BraceClose)?;
    Ok(Declaration {
        position,
        kind: DeclarationKind::Block { keyword, entries },
    })
}

fn parse_step(cursor: &mut TokenCursor<'_>) -> Result<Declaration> {
    let position = cursor.expect_token(&Token::Step)?;
    let (name, _) = cursor.expect_identifier()?;

    let mut after = Vec::new();
    if cursor.peek_token() == Some(&Token::After) {
        let _ = cursor.advance();
        loop {
            let (name, position) = cursor.expect_identifier()?;
            after.push(Prerequisite { position, name });
            if cursor.peek_token() == Some(&Token::Comma) {
                let _ = cursor.advance();
            } else {
                break;
            }
        }
    }

    let open = cursor.expect_token(&Token::BraceOpen)?;
    let body = parse_statements(cursor, Some(open))?;
    let _ = cursor.expect_token(&Token::BraceClose)?;
    Ok(Declaration {
        position,
        kind: DeclarationKind::Step { name, after, body },
    })
}

fn parse_value(cursor: &mut TokenCursor<'_>) -> Result<Value> {
    let here = cursor.here();
    match cursor.advance() {
        Some(Spanned {
            token: Token::StringLiteral(s),
            ..
        }) => Ok(Value::String(s.clone())),
        Some(Spanned {
            token: Token::Integer(n),
            ..
        }) => Ok(Value::Integer(*n)),
        Some(Spanned {
            token: Token::BracketOpen,
            ..
        }) => parse_string_list(cursor, here).map(Value::List),
        other => Err(cursor.unexpected("a string, integer, or list", other)),
    }
}

fn parse_string_list(cursor: &mut TokenCursor<'_>, open: SourcePosition) -> Result<Vec<String>> {
    let mut items = Vec::new();

    while cursor.peek_token() != Some(&Token::BracketClose) {
        if cursor.at_end() {
            return Err(unclosed(open, "]"));
        }
        items.push(cursor.expect_string()?.0);
        match cursor.peek_token() {
            Some(Token::Comma) => {
                let _ = cursor.advance();
            }
            Some(Token::BracketClose) => {}
            None => return Err(unclosed(open, "]")),
            Some(_) => {
                let found = cursor.peek();
                return Err(cursor.unexpected("`,` or `]`", found));
            }
        }
    }

    let _ = cursor.expect_token(&Token::BracketClose)?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_parts(err: QuokkaError) -> (SourcePosition, String, String) {
        match err {
            QuokkaError::Syntax {
                position,
                expected,
                found,
            } => (position, expected, found),
            other => panic!("expected syntax error, got {other}"),
        }
    }

    #[test]
    fn parse_empty_input() {
        let spec = parse_spec("").expect("should parse empty input");
        assert!(spec.declarations.is_empty());
    }

    #[test]
    fn parse_two_declarations_on_one_line() {
        let spec = parse_spec(r#"base="alpine" ; run="echo hi""#).expect("should parse");
        assert_eq!(spec.declarations.len(), 2);

        let base = &spec.declarations[0];
        assert_eq!(base.position, SourcePosition::new(1, 1));
        assert_eq!(
            base.kind,
            DeclarationKind::Base(SymbolicReference::new("alpine", None))
        );

        let run = &spec.declarations[1];
        assert_eq!(run.position, SourcePosition::new(1, 17));
        assert_eq!(
            run.kind,
            DeclarationKind::Instruction {
                keyword: Keyword::Run,
                value: Value::String("echo hi".into()),
            }
        );
    }

    #[test]
    fn parse_dependency_with_constraint() {
        let spec = parse_spec(r#"base = "alpine"
dep = "curl:8""#)
        .expect("should parse");
        assert_eq!(
            spec.declarations[1].reference(),
            Some(&SymbolicReference::new("curl", Some("8".into())))
        );
        assert_eq!(spec.declarations[1].keyword(), "dep");
    }

    #[test]
    fn parse_all_instruction_values() {
        let input = r#"
base = "debian:12"
run = ["make", "install",]
workdir = "/app"
copy = ["src", "/app/src"]
expose = 8080
user = "app"
cmd = ["./server", "--port", "8080"]
entrypoint = "/docker-entrypoint.sh"
"#;
        let spec = parse_spec(input).expect("should parse");
        let keywords: Vec<_> = spec.declarations.iter().map(Declaration::keyword).collect();
        assert_eq!(
            keywords,
            vec!["base", "run", "workdir", "copy", "expose", "user", "cmd", "entrypoint"]
        );
        assert_eq!(
            spec.declarations[1].kind,
            DeclarationKind::Instruction {
                keyword: Keyword::Run,
                value: Value::List(vec!["make".into(), "install".into()]),
            }
        );
        assert_eq!(
            spec.declarations[4].kind,
            DeclarationKind::Instruction {
                keyword: Keyword::Expose,
                value: Value::Integer(8080),
            }
        );
    }

    #[test]
    fn parse_env_and_label_blocks() {
        let input = r#"base = "alpine"
env {
    PATH = "/opt/bin",
    LANG = "C.UTF-8";
}
label { "org.opencontainers.image.title" = "demo" }"#;
        let spec = parse_spec(input).expect("should parse");
        match &spec.declarations[1].kind {
            DeclarationKind::Block { keyword, entries } => {
                assert_eq!(*keyword, BlockKeyword::Env);
                let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
                assert_eq!(keys, vec!["PATH", "LANG"]);
                assert_eq!(entries[0].position, SourcePosition::new(3, 5));
            }
            other => panic!("expected env block, got {other:?}"),
        }
        match &spec.declarations[2].kind {
            DeclarationKind::Block { keyword, entries } => {
                assert_eq!(*keyword, BlockKeyword::Label);
                assert_eq!(entries[0].key, "org.opencontainers.image.title");
            }
            other => panic!("expected label block, got {other:?}"),
        }
    }

    #[test]
    fn parse_step_group_with_prerequisites() {
        let input = r#"base = "alpine"
step build after fetch, configure {
    run = "make"
    run = "make test"
}"#;
        let spec = parse_spec(input).expect("should parse");
        let step = &spec.declarations[1];
        assert_eq!(step.position, SourcePosition::new(2, 1));
        match &step.kind {
            DeclarationKind::Step { name, after, body } => {
                assert_eq!(name, "build");
                let names: Vec<_> = after.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["fetch", "configure"]);
                assert_eq!(after[0].position, SourcePosition::new(2, 18));
                assert_eq!(body.len(), 2);
            }
            other => panic!("expected step, got {other:?}"),
        }
        assert_eq!(step.children().len(), 2);
    }

    #[test]
    fn parse_comments_ignored() {
        let input = r#"// header
base = "alpine" # the base
// run something
run = "true""#;
        let spec = parse_spec(input).expect("should parse with comments");
        assert_eq!(spec.declarations.len(), 2);
        assert_eq!(spec.declarations[1].position, SourcePosition::new(4, 1));
    }

    #[test]
    fn parse_error_unknown_keyword() {
        let (position, _, found) = syntax_parts(parse_spec("base = \"a\"\nbogus = \"x\"").unwrap_err());
        assert_eq!(position, SourcePosition::new(2, 1));
        assert!(found.contains("unknown keyword `bogus`"), "got: {found}");
    }

    #[test]
    fn parse_error_unterminated_literal_points_at_quote() {
        let (position, _, _) = syntax_parts(parse_spec("base = \"alpine").unwrap_err());
        assert_eq!(position, SourcePosition::new(1, 8));
    }

    #[test]
    fn parse_error_unclosed_step_points_at_brace() {
        let input = "base = \"alpine\"\nstep build {\n    run = \"make\"\n";
        let (position, expected, found) = syntax_parts(parse_spec(input).unwrap_err());
        assert_eq!(position, SourcePosition::new(2, 12));
        assert!(expected.contains('}'), "got: {expected}");
        assert_eq!(found, "end of input");
    }

    #[test]
    fn parse_error_unclosed_block_points_at_brace() {
        let (position, _, _) = syntax_parts(parse_spec("env {\n A = \"1\"").unwrap_err());
        assert_eq!(position, SourcePosition::new(1, 5));
    }

    #[test]
    fn parse_error_unclosed_list_points_at_bracket() {
        let (position, expected, _) = syntax_parts(parse_spec("run = [\"a\", \"b\"").unwrap_err());
        assert_eq!(position, SourcePosition::new(1, 7));
        assert!(expected.contains(']'), "got: {expected}");
    }

    #[test]
    fn parse_error_stray_closing_brace() {
        let (position, expected, found) = syntax_parts(parse_spec("base = \"a\" }").unwrap_err());
        assert_eq!(position, SourcePosition::new(1, 12));
        assert_eq!(expected, "a declaration");
        assert_eq!(found, "`}`");
    }

    #[test]
    fn parse_error_missing_equals() {
        let (_, expected, found) = syntax_parts(parse_spec("run \"x\"").unwrap_err());
        assert_eq!(expected, "`=`");
        assert_eq!(found, "string literal");
    }

    #[test]
    fn parse_error_malformed_reference() {
        let (position, expected, found) = syntax_parts(parse_spec("base = \"alpine:\"").unwrap_err());
        assert_eq!(position, SourcePosition::new(1, 8));
        assert!(expected.contains("name[:constraint]"), "got: {expected}");
        assert!(found.contains("constraint is empty"), "got: {found}");
    }

    #[test]
    fn parse_error_list_of_integers() {
        assert!(parse_spec("copy = [1, 2]").is_err());
    }

    #[test]
    fn parse_reads_from_stream() {
        let mut input: &[u8] = b"base = \"alpine\"\nrun = \"true\"\n";
        let spec = Parser::new().parse(&mut input).expect("should parse");
        assert_eq!(spec.declarations.len(), 2);
    }

    #[test]
    fn parse_rejects_invalid_utf8_with_position() {
        let mut input: &[u8] = b"base = \"alpine\"\nrun = \"\xff\"";
        let (position, expected, found) =
            syntax_parts(Parser::new().parse(&mut input).unwrap_err());
        assert_eq!(position, SourcePosition::new(2, 8));
        assert_eq!(expected, "UTF-8 text");
        assert_eq!(found, "invalid byte 0xff");
    }
}
