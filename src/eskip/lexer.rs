use super::parser::{ParseError, ParseErrorKind, Position};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    Regexp(String),
    Number(f64),
    /// `<shunt>`, `<loopback>`, `<dynamic>`
    Special(String),
    Colon,
    Semicolon,
    Comma,
    LParen,
    RParen,
    And,
    Arrow,
    Star,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::Regexp(s) => write!(f, "regexp /{}/", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Special(s) => write!(f, "<{}>", s),
            Token::Colon => f.write_str("':'"),
            Token::Semicolon => f.write_str("';'"),
            Token::Comma => f.write_str("','"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::And => f.write_str("'&&'"),
            Token::Arrow => f.write_str("'->'"),
            Token::Star => f.write_str("'*'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub position: Position,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, kind: ParseErrorKind, position: Position) -> ParseError {
        ParseError {
            kind,
            position,
            route: None,
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek().copied() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() != Some(&'/') {
                        return;
                    }
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Spanned>, ParseError> {
        self.skip_trivia();
        let position = self.position();

        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let token = match c {
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            ',' => Token::Comma,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '*' => Token::Star,
            '&' => {
                if self.bump() != Some('&') {
                    return Err(self.error(ParseErrorKind::InvalidCharacter('&'), position));
                }
                Token::And
            }
            '-' => match self.chars.peek().copied() {
                Some('>') => {
                    self.bump();
                    Token::Arrow
                }
                Some(d) if d.is_ascii_digit() => self.number(c, position)?,
                _ => return Err(self.error(ParseErrorKind::InvalidCharacter('-'), position)),
            },
            '"' => Token::Str(self.quoted(position)?),
            '`' => Token::Str(self.raw(position)?),
            '/' => Token::Regexp(self.regexp(position)?),
            '<' => Token::Special(self.special(position)?),
            c if c.is_ascii_digit() => self.number(c, position)?,
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = String::from(c);
                while let Some(&c) = self.chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    ident.push(c);
                    self.bump();
                }
                Token::Ident(ident)
            }
            c => return Err(self.error(ParseErrorKind::InvalidCharacter(c), position)),
        };

        Ok(Some(Spanned { token, position }))
    }

    fn quoted(&mut self, start: Position) -> Result<String, ParseError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(c) => value.push(c),
                    None => break,
                },
                Some(c) => value.push(c),
                None => break,
            }
        }
        Err(self.error(ParseErrorKind::UnterminatedString, start))
    }

    fn raw(&mut self, start: Position) -> Result<String, ParseError> {
        let mut value = String::new();
        while let Some(c) = self.bump() {
            if c == '`' {
                return Ok(value);
            }
            value.push(c);
        }
        Err(self.error(ParseErrorKind::UnterminatedString, start))
    }

    fn regexp(&mut self, start: Position) -> Result<String, ParseError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('/') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('/') => value.push('/'),
                    Some(c) => {
                        value.push('\\');
                        value.push(c);
                    }
                    None => break,
                },
                Some('\n') | None => break,
                Some(c) => value.push(c),
            }
        }
        Err(self.error(ParseErrorKind::UnterminatedRegexp, start))
    }

    fn special(&mut self, start: Position) -> Result<String, ParseError> {
        let mut value = String::new();
        while let Some(c) = self.bump() {
            if c == '>' {
                return Ok(value);
            }
            if !c.is_ascii_alphabetic() {
                break;
            }
            value.push(c);
        }
        Err(self.error(ParseErrorKind::InvalidBackend(format!("<{}", value)), start))
    }

    fn number(&mut self, first: char, start: Position) -> Result<Token, ParseError> {
        let mut text = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if !(c.is_ascii_digit() || c == '.') {
                break;
            }
            text.push(c);
            self.bump();
        }
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(ParseErrorKind::InvalidNumber(text.clone()), start))
    }
}

/// Split a route source into tokens. Also returns the end-of-input position.
pub(crate) fn tokenize(source: &str) -> Result<(Vec<Spanned>, Position), ParseError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok((tokens, lexer.position()))
}
