//! logos-based template tokenizer with an indentation pre-pass.
//!
//! Templates are line oriented. Each non-blank line is measured for leading
//! whitespace against a stack of open indentation widths, which yields explicit
//! [`TokenKind::Indent`] / [`TokenKind::Outdent`] tokens, and the rest of the
//! line is lexed with logos.
//!
//! Token priority in logos:
//! 1. Longest match wins (`input` is an `Ident`, not the keyword `in` + `put`)
//! 2. For equal length matches, `#[token]` literals beat `#[regex]` patterns,
//!    so `if` lexes as a keyword rather than an identifier.

use std::fmt;

use logos::Logos;

/// A tokenizer failure, reported with the 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error on line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Directive keywords (only meaningful after a leading `-`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    If,
    Unless,
    In,
    Collection,
    View,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Unless => "unless",
            Keyword::In => "in",
            Keyword::Collection => "collection",
            Keyword::View => "view",
        }
    }
}

/// Kind of a template token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Tag, attribute, style property, event or action name.
    Ident,
    /// Directive keyword.
    Keyword(Keyword),
    /// `@path.to.property`. The token text is the path without the `@`.
    Bound,
    /// Double-quoted string. The token text is the unescaped contents.
    Str,
    BracketOpen,
    BracketClose,
    Equals,
    Colon,
    Bang,
    /// Leading `-` introducing a directive.
    Dash,
    Newline,
    Indent,
    Outdent,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident => f.write_str("identifier"),
            TokenKind::Keyword(kw) => write!(f, "keyword `{}`", kw.as_str()),
            TokenKind::Bound => f.write_str("bound property"),
            TokenKind::Str => f.write_str("string literal"),
            TokenKind::BracketOpen => f.write_str("`[`"),
            TokenKind::BracketClose => f.write_str("`]`"),
            TokenKind::Equals => f.write_str("`=`"),
            TokenKind::Colon => f.write_str("`:`"),
            TokenKind::Bang => f.write_str("`!`"),
            TokenKind::Dash => f.write_str("`-`"),
            TokenKind::Newline => f.write_str("end of line"),
            TokenKind::Indent => f.write_str("indent"),
            TokenKind::Outdent => f.write_str("outdent"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// A token with its (processed) text and source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
        }
    }
}

/// Raw lexeme within a single line.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t]+")]
enum Lexeme {
    #[token("if")]
    If,

    #[token("unless")]
    Unless,

    #[token("in")]
    In,

    #[token("collection")]
    Collection,

    #[token("view")]
    View,

    #[regex(r"@[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*")]
    Bound,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token("=")]
    Equals,

    #[token(":")]
    Colon,

    #[token("!")]
    Bang,

    #[token("-")]
    Dash,
}

/// Tokenize template source.
///
/// The returned stream always ends with [`TokenKind::Eof`], preceded by one
/// `Outdent` for every indentation level still open at the end of input.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut levels: Vec<usize> = vec![0];
    let mut indent_char: Option<char> = None;
    let mut last_line = 0;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let content = raw.trim_end();
        let body = content.trim_start();
        if body.is_empty() {
            continue;
        }
        last_line = line;

        let indent = &content[..content.len() - body.len()];
        for ch in indent.chars() {
            match indent_char {
                None => indent_char = Some(ch),
                Some(expected) if expected != ch => {
                    return Err(SyntaxError::new(
                        line,
                        "indentation mixes tabs and spaces",
                    ));
                }
                Some(_) => {}
            }
        }

        let width = indent.chars().count();
        let current = levels.last().copied().unwrap_or(0);
        if width > current {
            levels.push(width);
            tokens.push(Token::new(TokenKind::Indent, "", line));
        } else {
            while width < levels.last().copied().unwrap_or(0) {
                levels.pop();
                tokens.push(Token::new(TokenKind::Outdent, "", line));
            }
            if width != levels.last().copied().unwrap_or(0) {
                return Err(SyntaxError::new(
                    line,
                    format!("inconsistent indentation (width {width} matches no enclosing block)"),
                ));
            }
        }

        lex_line(body, line, &mut tokens)?;
        tokens.push(Token::new(TokenKind::Newline, "", line));
    }

    for _ in 1..levels.len() {
        tokens.push(Token::new(TokenKind::Outdent, "", last_line));
    }
    tokens.push(Token::new(TokenKind::Eof, "", last_line));
    Ok(tokens)
}

/// Lex the content of one line (indentation already stripped).
fn lex_line(content: &str, line: usize, tokens: &mut Vec<Token>) -> Result<(), SyntaxError> {
    let lexer = Lexeme::lexer(content);
    for (result, span) in lexer.spanned() {
        let slice = &content[span];
        let lexeme = result.map_err(|_| {
            SyntaxError::new(line, format!("unexpected character sequence `{slice}`"))
        })?;
        let token = match lexeme {
            Lexeme::If => Token::new(TokenKind::Keyword(Keyword::If), slice, line),
            Lexeme::Unless => Token::new(TokenKind::Keyword(Keyword::Unless), slice, line),
            Lexeme::In => Token::new(TokenKind::Keyword(Keyword::In), slice, line),
            Lexeme::Collection => {
                Token::new(TokenKind::Keyword(Keyword::Collection), slice, line)
            }
            Lexeme::View => Token::new(TokenKind::Keyword(Keyword::View), slice, line),
            Lexeme::Bound => Token::new(TokenKind::Bound, &slice[1..], line),
            Lexeme::Str => Token::new(TokenKind::Str, unescape(&slice[1..slice.len() - 1]), line),
            Lexeme::Ident => Token::new(TokenKind::Ident, slice, line),
            Lexeme::BracketOpen => Token::new(TokenKind::BracketOpen, slice, line),
            Lexeme::BracketClose => Token::new(TokenKind::BracketClose, slice, line),
            Lexeme::Equals => Token::new(TokenKind::Equals, slice, line),
            Lexeme::Colon => Token::new(TokenKind::Colon, slice, line),
            Lexeme::Bang => Token::new(TokenKind::Bang, slice, line),
            Lexeme::Dash => Token::new(TokenKind::Dash, slice, line),
        };
        tokens.push(token);
    }
    Ok(())
}

/// Resolve `\"`, `\\`, `\n` and `\t`. Unknown escapes keep the escaped char.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn single_element() {
        assert_eq!(
            kinds("div"),
            vec![TokenKind::Ident, TokenKind::Newline, TokenKind::Eof]
        );
    }

    #[test]
    fn attributes_and_bindings() {
        let tokens = tokenize(r#"a[href=@url class="big" event:click=follow!]"#).unwrap();
        let pairs: Vec<(TokenKind, &str)> =
            tokens.iter().map(|t| (t.kind, t.text.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                (TokenKind::Ident, "a"),
                (TokenKind::BracketOpen, "["),
                (TokenKind::Ident, "href"),
                (TokenKind::Equals, "="),
                (TokenKind::Bound, "url"),
                (TokenKind::Ident, "class"),
                (TokenKind::Equals, "="),
                (TokenKind::Str, "big"),
                (TokenKind::Ident, "event"),
                (TokenKind::Colon, ":"),
                (TokenKind::Ident, "click"),
                (TokenKind::Equals, "="),
                (TokenKind::Ident, "follow"),
                (TokenKind::Bang, "!"),
                (TokenKind::BracketClose, "]"),
                (TokenKind::Newline, ""),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn keywords_only_match_whole_words() {
        let tokens = tokenize("- if @input").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::If));
        assert_eq!(tokens[2].kind, TokenKind::Bound);
        assert_eq!(tokens[2].text, "input");

        let tokens = tokenize("input").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
    }

    #[test]
    fn bound_paths_keep_dots() {
        let tokens = tokenize("p @author.name").unwrap();
        assert_eq!(tokens[1].text, "author.name");
    }

    #[test]
    fn string_escapes() {
        let tokens = tokenize(r#"p "say \"hi\"\n""#).unwrap();
        assert_eq!(tokens[1].text, "say \"hi\"\n");
    }

    #[test]
    fn indent_and_outdent() {
        let source = "div\n  p\n    span\n  p\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Outdent,
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Outdent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn closes_open_levels_at_eof() {
        let tokens = tokenize("div\n  ul\n    li").unwrap();
        let outdents = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Outdent)
            .count();
        assert_eq!(outdents, 2);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(kinds("div\n\n   \n  p"), kinds("div\n  p"));
    }

    #[test]
    fn inconsistent_indentation_reports_line() {
        let err = tokenize("div\n    p\n  span").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("inconsistent indentation"));
    }

    #[test]
    fn mixed_tabs_and_spaces() {
        let err = tokenize("div\n  p\n\tspan").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("tabs"));
    }

    #[test]
    fn unknown_character() {
        let err = tokenize("div\n  p %").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.to_string().starts_with("syntax error on line 2"));
    }
}
