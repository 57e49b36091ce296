//! Template front end: tokenizer, directive tree, parser.
//!
//! A template is parsed once into a [`Template`] and shared (read-only) by every
//! render of it.

pub mod ast;
pub mod parser;
pub mod tokenizer;

pub use ast::{
    Attribute, ConditionKind, Element, Expr, IterationKind, Node, PropertyPath, Template,
};
pub use parser::{parse, ParseError};
pub use tokenizer::{tokenize, Keyword, SyntaxError, Token, TokenKind};
