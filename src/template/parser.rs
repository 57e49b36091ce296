//! Recursive descent template parser.
//!
//! Consumes the token stream from [`crate::template::tokenizer`] and builds a
//! [`Template`]. Every error carries the source line it was detected on.

use std::rc::Rc;

use super::ast::*;
use super::tokenizer::{tokenize, Keyword, SyntaxError, Token, TokenKind};

/// Errors from template parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },
    #[error("line {line}: attribute list is not closed with `]`")]
    UnclosedAttributes { line: usize },
    #[error("line {line}: `{directive}` requires an indented block")]
    MissingBlock { line: usize, directive: String },
    #[error("line {line}: unknown directive `{name}`")]
    UnknownDirective { line: usize, name: String },
    #[error("line {line}: template must have exactly one root element")]
    MultipleRoots { line: usize },
    #[error("line {line}: template root must be an element")]
    RootNotElement { line: usize },
    #[error("template is empty")]
    Empty,
}

impl ParseError {
    /// Source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Syntax(err) => Some(err.line),
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnclosedAttributes { line }
            | ParseError::MissingBlock { line, .. }
            | ParseError::UnknownDirective { line, .. }
            | ParseError::MultipleRoots { line }
            | ParseError::RootNotElement { line } => Some(*line),
            ParseError::Empty => None,
        }
    }
}

/// Parse template source into a [`Template`].
pub fn parse(source: &str) -> Result<Template, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, cursor: 0 };
    parser.parse_template()
}

/// Recursive descent parser state.
///
/// The token stream always ends with `Eof`, and the cursor never moves past
/// it, so `peek` is infallible.
struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.cursor.min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn unexpected(token: &Token, expected: impl Into<String>) -> ParseError {
        let found = match token.kind {
            TokenKind::Ident | TokenKind::Bound | TokenKind::Str | TokenKind::Keyword(_) => {
                format!("{} `{}`", token.kind, token.text)
            }
            _ => token.kind.to_string(),
        };
        ParseError::UnexpectedToken {
            line: token.line,
            expected: expected.into(),
            found,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(Self::unexpected(&token, kind.to_string()))
        }
    }

    /// Identifier position: keywords are accepted as plain names here, so an
    /// attribute may be called `in` or `view`.
    fn expect_name(&mut self) -> Result<Token, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Ident | TokenKind::Keyword(_) => Ok(token),
            _ => Err(Self::unexpected(&token, "identifier")),
        }
    }

    fn parse_template(&mut self) -> Result<Template, ParseError> {
        if self.at(TokenKind::Eof) {
            return Err(ParseError::Empty);
        }
        let line = self.peek().line;
        let mut nodes = self.parse_line()?;
        if !self.at(TokenKind::Eof) {
            return Err(ParseError::MultipleRoots {
                line: self.peek().line,
            });
        }
        match (nodes.pop(), nodes.is_empty()) {
            (Some(Node::Element(root)), true) => Ok(Template::new(root)),
            _ => Err(ParseError::RootNotElement { line }),
        }
    }

    /// Parse one logical line (plus its indented block, if any).
    ///
    /// Returns several nodes for a bare text line mixing literals and bindings.
    fn parse_line(&mut self) -> Result<Vec<Node>, ParseError> {
        match self.peek().kind {
            TokenKind::Dash => Ok(vec![self.parse_directive()?]),
            TokenKind::Ident => Ok(vec![Node::Element(self.parse_element()?)]),
            TokenKind::Str | TokenKind::Bound => {
                let parts = self.parse_text_parts();
                self.expect(TokenKind::Newline)?;
                if self.at(TokenKind::Indent) {
                    return Err(Self::unexpected(
                        self.peek(),
                        "a line at the enclosing indentation (text takes no block)",
                    ));
                }
                Ok(parts)
            }
            _ => Err(Self::unexpected(
                self.peek(),
                "an element, text or `-` directive",
            )),
        }
    }

    /// Parse `INDENT line+ OUTDENT` if an indented block follows.
    fn parse_children(&mut self) -> Result<Vec<Node>, ParseError> {
        if !self.at(TokenKind::Indent) {
            return Ok(Vec::new());
        }
        self.advance();
        let mut children = Vec::new();
        while !self.at(TokenKind::Outdent) && !self.at(TokenKind::Eof) {
            children.extend(self.parse_line()?);
        }
        if self.at(TokenKind::Outdent) {
            self.advance();
        }
        Ok(children)
    }

    fn parse_required_block(
        &mut self,
        directive: Keyword,
        line: usize,
    ) -> Result<Rc<[Node]>, ParseError> {
        if !self.at(TokenKind::Indent) {
            return Err(ParseError::MissingBlock {
                line,
                directive: directive.as_str().to_owned(),
            });
        }
        Ok(self.parse_children()?.into())
    }

    fn parse_element(&mut self) -> Result<Element, ParseError> {
        let tag = self.expect(TokenKind::Ident)?;
        let attributes = if self.at(TokenKind::BracketOpen) {
            self.parse_attributes()?
        } else {
            Vec::new()
        };
        let mut children = self.parse_text_parts();
        self.expect(TokenKind::Newline)?;
        children.extend(self.parse_children()?);
        Ok(Element {
            tag: tag.text,
            attributes,
            children,
            line: tag.line,
        })
    }

    fn parse_text_parts(&mut self) -> Vec<Node> {
        let mut parts = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Str => parts.push(Node::Text(Expr::Literal(self.advance().text))),
                TokenKind::Bound => {
                    parts.push(Node::Text(Expr::Bound(PropertyPath::parse(&self.advance().text))))
                }
                _ => return parts,
            }
        }
    }

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>, ParseError> {
        let open = self.expect(TokenKind::BracketOpen)?;
        let mut attributes = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::BracketClose => {
                    self.advance();
                    return Ok(attributes);
                }
                TokenKind::Newline | TokenKind::Eof => {
                    return Err(ParseError::UnclosedAttributes { line: open.line });
                }
                TokenKind::Ident | TokenKind::Keyword(_) => {
                    attributes.push(self.parse_attribute()?);
                }
                _ => return Err(Self::unexpected(self.peek(), "attribute name or `]`")),
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<Attribute, ParseError> {
        let name = self.expect_name()?;
        if !self.at(TokenKind::Colon) {
            self.expect(TokenKind::Equals)?;
            let value = self.parse_value()?;
            return Ok(Attribute::Property {
                name: name.text,
                value,
            });
        }

        self.advance();
        let qualified = self.expect_name()?;
        self.expect(TokenKind::Equals)?;
        match name.text.as_str() {
            "style" => Ok(Attribute::Style {
                property: qualified.text,
                value: self.parse_value()?,
            }),
            "event" => {
                let action = self.expect_name()?;
                let prevent_default = self.at(TokenKind::Bang);
                if prevent_default {
                    self.advance();
                }
                Ok(Attribute::Event {
                    event: qualified.text,
                    action: action.text,
                    prevent_default,
                })
            }
            _ => Err(Self::unexpected(&name, "`style:` or `event:` prefix")),
        }
    }

    /// `"literal"`, `@bound` or a bare identifier (also bound).
    fn parse_value(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Str => Ok(Expr::Literal(token.text)),
            TokenKind::Bound | TokenKind::Ident => Ok(Expr::Bound(PropertyPath::parse(&token.text))),
            _ => Err(Self::unexpected(&token, "string literal or property")),
        }
    }

    /// A directive's governing property: `@path` or a bare identifier.
    fn parse_path(&mut self) -> Result<PropertyPath, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Bound | TokenKind::Ident => Ok(PropertyPath::parse(&token.text)),
            _ => Err(Self::unexpected(&token, "property")),
        }
    }

    fn parse_directive(&mut self) -> Result<Node, ParseError> {
        let dash = self.expect(TokenKind::Dash)?;
        let line = dash.line;
        let keyword = self.advance();
        match keyword.kind {
            TokenKind::Keyword(kw @ (Keyword::If | Keyword::Unless)) => {
                let path = self.parse_path()?;
                self.expect(TokenKind::Newline)?;
                let body = self.parse_required_block(kw, line)?;
                let kind = if kw == Keyword::If {
                    ConditionKind::If
                } else {
                    ConditionKind::Unless
                };
                Ok(Node::Conditional { kind, path, body })
            }
            TokenKind::Keyword(kw @ (Keyword::In | Keyword::Collection)) => {
                let path = self.parse_path()?;
                self.expect(TokenKind::Newline)?;
                let body = self.parse_required_block(kw, line)?;
                let kind = if kw == Keyword::In {
                    IterationKind::In
                } else {
                    IterationKind::Collection
                };
                Ok(Node::Iteration { kind, path, body })
            }
            TokenKind::Keyword(Keyword::View) => {
                let node = match self.peek().kind {
                    TokenKind::Str => {
                        let name = self.advance().text;
                        let path = if self.at(TokenKind::Bound) {
                            Some(PropertyPath::parse(&self.advance().text))
                        } else {
                            None
                        };
                        Node::SubView { name, path }
                    }
                    TokenKind::Bound => {
                        let path = PropertyPath::parse(&self.advance().text);
                        Node::SubView {
                            name: path.last().to_owned(),
                            path: Some(path),
                        }
                    }
                    _ => return Err(Self::unexpected(self.peek(), "view name or property")),
                };
                self.expect(TokenKind::Newline)?;
                if self.at(TokenKind::Indent) {
                    return Err(Self::unexpected(
                        self.peek(),
                        "a line at the enclosing indentation (`view` takes no block)",
                    ));
                }
                Ok(node)
            }
            TokenKind::Ident => Err(ParseError::UnknownDirective {
                line,
                name: keyword.text,
            }),
            _ => Err(Self::unexpected(&keyword, "directive keyword")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root(source: &str) -> Element {
        parse(source).unwrap().root().clone()
    }

    #[test]
    fn bare_element() {
        let el = root("div");
        assert_eq!(el.tag, "div");
        assert!(el.attributes.is_empty());
        assert!(el.children.is_empty());
        assert_eq!(el.line, 1);
    }

    #[test]
    fn attribute_kinds() {
        let el = root(r#"a[href=@url title="Home" class=kind style:color=@tint event:click=go!]"#);
        assert_eq!(
            el.attributes,
            vec![
                Attribute::Property {
                    name: "href".into(),
                    value: Expr::bound("url"),
                },
                Attribute::Property {
                    name: "title".into(),
                    value: Expr::literal("Home"),
                },
                Attribute::Property {
                    name: "class".into(),
                    value: Expr::bound("kind"),
                },
                Attribute::Style {
                    property: "color".into(),
                    value: Expr::bound("tint"),
                },
                Attribute::Event {
                    event: "click".into(),
                    action: "go".into(),
                    prevent_default: true,
                },
            ]
        );
    }

    #[test]
    fn event_without_bang() {
        let el = root("button[event:click=save]");
        assert_eq!(
            el.attributes[0],
            Attribute::Event {
                event: "click".into(),
                action: "save".into(),
                prevent_default: false,
            }
        );
    }

    #[test]
    fn inline_text_parts() {
        let el = root(r#"p "Hello " @user.name "!""#);
        assert_eq!(
            el.children,
            vec![
                Node::Text(Expr::literal("Hello ")),
                Node::Text(Expr::bound("user.name")),
                Node::Text(Expr::literal("!")),
            ]
        );
    }

    #[test]
    fn text_lines_as_children() {
        let el = root("p\n  \"one\"\n  @two\n");
        assert_eq!(
            el.children,
            vec![
                Node::Text(Expr::literal("one")),
                Node::Text(Expr::bound("two")),
            ]
        );
    }

    #[test]
    fn nested_blocks() {
        let el = root("div\n  ul\n    li \"a\"\n    li \"b\"\n  p \"after\"\n");
        assert_eq!(el.children.len(), 2);
        match &el.children[0] {
            Node::Element(ul) => {
                assert_eq!(ul.tag, "ul");
                assert_eq!(ul.children.len(), 2);
            }
            other => panic!("expected ul, got {other:?}"),
        }
    }

    #[test]
    fn conditional_directives() {
        let el = root("div\n  - if @open\n    p\n  - unless open\n    p\n");
        match &el.children[0] {
            Node::Conditional { kind, path, body } => {
                assert_eq!(*kind, ConditionKind::If);
                assert_eq!(path.head(), "open");
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected conditional, got {other:?}"),
        }
        assert!(matches!(
            &el.children[1],
            Node::Conditional {
                kind: ConditionKind::Unless,
                ..
            }
        ));
    }

    #[test]
    fn iteration_directives() {
        let el = root("ul\n  - collection @items\n    li @name\n  - in @author\n    p @name\n");
        assert!(matches!(
            &el.children[0],
            Node::Iteration {
                kind: IterationKind::Collection,
                ..
            }
        ));
        assert!(matches!(
            &el.children[1],
            Node::Iteration {
                kind: IterationKind::In,
                ..
            }
        ));
    }

    #[test]
    fn view_directive_forms() {
        let el = root("div\n  - view \"footer\"\n  - view \"card\" @author\n  - view @comment\n");
        assert_eq!(
            el.children,
            vec![
                Node::SubView {
                    name: "footer".into(),
                    path: None,
                },
                Node::SubView {
                    name: "card".into(),
                    path: Some(PropertyPath::parse("author")),
                },
                Node::SubView {
                    name: "comment".into(),
                    path: Some(PropertyPath::parse("comment")),
                },
            ]
        );
    }

    #[test]
    fn empty_template() {
        assert_eq!(parse("\n  \n"), Err(ParseError::Empty));
    }

    #[test]
    fn multiple_roots() {
        assert_eq!(
            parse("div\np\n"),
            Err(ParseError::MultipleRoots { line: 2 })
        );
    }

    #[test]
    fn root_must_be_element() {
        assert_eq!(
            parse("\"hello\"\n"),
            Err(ParseError::RootNotElement { line: 1 })
        );
        assert!(matches!(
            parse("- if @x\n  p\n"),
            Err(ParseError::RootNotElement { line: 1 })
        ));
    }

    #[test]
    fn unclosed_attributes() {
        assert_eq!(
            parse("div\n  a[href=@url\n"),
            Err(ParseError::UnclosedAttributes { line: 2 })
        );
    }

    #[test]
    fn stray_closing_bracket() {
        let err = parse("div]\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { line: 1, .. }));
    }

    #[test]
    fn directive_without_block() {
        assert_eq!(
            parse("div\n  - if @x\n  p\n"),
            Err(ParseError::MissingBlock {
                line: 2,
                directive: "if".into(),
            })
        );
    }

    #[test]
    fn unknown_directive() {
        assert_eq!(
            parse("div\n  - each @items\n    p\n"),
            Err(ParseError::UnknownDirective {
                line: 2,
                name: "each".into(),
            })
        );
    }

    #[test]
    fn unknown_attribute_prefix() {
        let err = parse("div[data:x=@y]").unwrap_err();
        assert!(err.to_string().contains("`style:` or `event:`"));
    }

    #[test]
    fn syntax_errors_pass_through() {
        let err = parse("div\n    p\n  span\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn error_messages_name_the_line() {
        let err = parse("div\n  - if\n    p\n").unwrap_err();
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().starts_with("line 2:"));
    }
}
