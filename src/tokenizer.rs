//! Pull tokenizer over a source string. The tokenizer is primed with the
//! first token on construction, so [`Tokenizer::peek`] is always valid until
//! [`Tokenizer::is_end`] reports the end of input. Individual tokens are
//! recognized with nom combinators.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{opt, recognize, value},
    sequence::pair,
};

use crate::Error;
use crate::ast::NumberType;

/// Non-alphabetic characters that may start a symbol. `+` and `-` are symbols
/// too, but only when not followed by a digit, so they are lexed separately.
const SYMBOL_START_CHARS: &str = "<=>*/#";

/// Additional non-alphanumeric characters allowed inside a symbol
const SYMBOL_CONTINUE_CHARS: &str = "<=>*/#?!-";

fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || SYMBOL_START_CHARS.contains(c)
}

fn is_symbol_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_CONTINUE_CHARS.contains(c)
}

/// Whitespace skipped between tokens
fn is_token_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(NumberType),
    Bool(bool),
    Symbol(String),
    Open,
    Close,
    Dot,
    Quote,
}

/// Parse an integer literal: an optional sign directly followed by decimal
/// digits. A sign with no digit after it backtracks to the symbol rule.
fn lex_number(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize(pair(opt(one_of("+-")), digit1)).parse(input)?;
    match text.parse::<NumberType>() {
        Ok(n) => Ok((rest, Token::Number(n))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        ))),
    }
}

/// A lone `+` or `-` is an ordinary symbol.
fn lex_sign_symbol(input: &str) -> IResult<&str, Token> {
    let (rest, sign) = one_of("+-").parse(input)?;
    Ok((rest, Token::Symbol(sign.to_string())))
}

/// Parse a maximal symbol run; `#t` and `#f` are reclassified as booleans.
fn lex_symbol(input: &str) -> IResult<&str, Token> {
    let (rest, name) = recognize(pair(
        satisfy(is_symbol_start),
        take_while(is_symbol_continue),
    ))
    .parse(input)?;
    let token = match name {
        "#t" => Token::Bool(true),
        "#f" => Token::Bool(false),
        _ => Token::Symbol(name.to_owned()),
    };
    Ok((rest, token))
}

fn lex_token(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Open, char('(')),
        value(Token::Close, char(')')),
        value(Token::Dot, char('.')),
        value(Token::Quote, char('\'')),
        lex_number,
        lex_sign_symbol,
        lex_symbol,
    ))
    .parse(input)
}

/// Render an unlexable position as a short diagnostic
fn lex_error_message(source: &str, rest: &str) -> String {
    let position = source.len().saturating_sub(rest.len());
    let snippet: String = rest.chars().take(10).collect();
    format!("invalid character sequence at position {position}: '{snippet}'")
}

/// Pull tokenizer: one token of lookahead, advanced on demand.
pub(crate) struct Tokenizer<'a> {
    source: &'a str,
    rest: &'a str,
    current: Option<Token>,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(source: &'a str) -> Result<Self, Error> {
        let mut tokenizer = Tokenizer {
            source,
            rest: source,
            current: None,
        };
        tokenizer.advance()?;
        Ok(tokenizer)
    }

    pub(crate) fn is_end(&self) -> bool {
        self.current.is_none()
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Move past the current token, lexing the next one.
    pub(crate) fn advance(&mut self) -> Result<(), Error> {
        self.rest = self.rest.trim_start_matches(is_token_space);
        if self.rest.is_empty() {
            self.current = None;
            return Ok(());
        }
        match lex_token(self.rest) {
            Ok((rest, token)) => {
                self.rest = rest;
                self.current = Some(token);
                Ok(())
            }
            Err(_) => Err(Error::SyntaxError(lex_error_message(
                self.source,
                self.rest,
            ))),
        }
    }

    /// Take the current token and advance past it.
    pub(crate) fn next_token(&mut self) -> Result<Option<Token>, Error> {
        let token = self.current.take();
        if token.is_some() {
            self.advance()?;
        }
        Ok(token)
    }
}
