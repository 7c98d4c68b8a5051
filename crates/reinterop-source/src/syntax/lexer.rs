//! Lexer for `ExposeToCPP` bodies
//!
//! Built on logos. Only the managed-language subset that appears in interop
//! manifests is recognized; anything else is reported as an unexpected
//! character with its line and column.

use super::ast::Span;
use super::SyntaxError;
use logos::{FilterResult, Logos};

/// Tokens of the entry-body language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[token("/*", skip_block_comment)]
    BlockComment,

    // Keywords (must come before identifiers)
    #[token("new")]
    New,

    #[token("var")]
    Var,

    #[token("this")]
    This,

    #[token("null")]
    Null,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("typeof")]
    Typeof,

    #[token("default")]
    Default,

    #[token("return")]
    Return,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[regex(r"@?[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().trim_start_matches('@').to_string())]
    Identifier(String),

    #[regex(r"[0-9][0-9_]*([uU][lL]?|[lL][uU]?)?", |lex| lex.slice().to_string())]
    #[regex(r"0[xX][0-9a-fA-F_]+([uU][lL]?|[lL][uU]?)?", |lex| lex.slice().to_string())]
    IntegerLiteral(String),

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[fFdDmM]?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+[fFdDmM]?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9][0-9_]*[fFdDmM]", |lex| lex.slice().to_string())]
    RealLiteral(String),

    #[regex(r#""([^"\\\n]|\\.)*""#, unescape_string)]
    StringLiteral(String),

    #[regex(r"'([^'\\\n]|\\.)+'", unescape_char)]
    CharLiteral(char),

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token("?")]
    Question,

    #[token("=>")]
    Arrow,

    #[token("=")]
    Assign,

    #[token("+=")]
    PlusAssign,

    #[token("-=")]
    MinusAssign,

    #[token("==")]
    EqualEqual,

    #[token("!=")]
    NotEqual,

    #[token("<")]
    Less,

    #[token("<=")]
    LessEqual,

    #[token(">")]
    Greater,

    #[token(">=")]
    GreaterEqual,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("!")]
    Bang,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("++")]
    PlusPlus,

    #[token("--")]
    MinusMinus,
}

fn unescape(raw: &str) -> Option<String> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            other => other,
        };
        result.push(escaped);
    }
    Some(result)
}

fn unescape_string(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let slice = lex.slice();
    unescape(&slice[1..slice.len() - 1])
}

/// Skip to the end of a block comment; unterminated comments are an error
fn skip_block_comment(lex: &mut logos::Lexer<Token>) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(())
        }
    }
}

fn unescape_char(lex: &mut logos::Lexer<Token>) -> Option<char> {
    let slice = lex.slice();
    let text = unescape(&slice[1..slice.len() - 1])?;
    let mut chars = text.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some(c)
}

/// A token together with its location
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Tokenize an entry body, tracking line and column of every token
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, SyntaxError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1u32;
    let mut column = 1u32;
    let mut last_end = 0;

    while let Some(result) = lexer.next() {
        let range = lexer.span();

        for c in source[last_end..range.start].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        let span = Span::new(range.start, range.end, line, column);
        match result {
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) if source[range.start..].starts_with("/*") => {
                return Err(SyntaxError::new("unterminated block comment", line, column));
            }
            Err(()) => {
                let c = source[range.start..].chars().next().unwrap_or('\0');
                return Err(SyntaxError::new(format!("unexpected character '{}'", c), line, column));
            }
        }

        for c in source[range.start..range.end].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        last_end = range.end;
    }

    Ok(tokens)
}
