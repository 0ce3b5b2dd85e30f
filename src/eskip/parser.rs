use super::filters::{substitute_mock, FilterRegistry};
use super::lexer::{tokenize, Spanned, Token};
use crate::route::{Arg, Backend, Filter, PathTemplate, Predicate, Route, ValueMatch};
use hyper::header::HeaderName;
use hyper::Method;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// 1-based line and column in the route source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: String },

    #[error("Unexpected end of input, expected {0}")]
    UnexpectedEof(&'static str),

    #[error("Invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("Unterminated string")]
    UnterminatedString,

    #[error("Unterminated regexp")]
    UnterminatedRegexp,

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Unknown predicate: {0}")]
    UnknownPredicate(String),

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Invalid arguments for {name}: {message}")]
    InvalidArguments { name: String, message: String },

    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),

    #[error("Invalid path template: {0}")]
    InvalidPath(String),

    #[error("Invalid backend: {0}")]
    InvalidBackend(String),
}

impl From<regex::Error> for ParseErrorKind {
    fn from(e: regex::Error) -> Self {
        ParseErrorKind::InvalidRegex(e.to_string())
    }
}

/// A syntax error in a route source, with its position and the id of the
/// route being parsed when known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Parse error at {position}{}: {kind}",
    .route.as_ref().map(|id| format!(" in route '{}'", id)).unwrap_or_default()
)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Position,
    pub route: Option<String>,
}

struct Call {
    name: String,
    args: Vec<Arg>,
    position: Position,
}

/// Recursive descent parser for route definitions.
pub struct RouteParser<'a> {
    tokens: Vec<Spanned>,
    pos: usize,
    end: Position,
    route: Option<String>,
    mocks: &'a HashSet<String>,
    registry: &'a FilterRegistry,
}

impl<'a> RouteParser<'a> {
    pub fn new(
        source: &str,
        mocks: &'a HashSet<String>,
        registry: &'a FilterRegistry,
    ) -> Result<Self, ParseError> {
        let (tokens, end) = tokenize(source)?;
        Ok(Self {
            tokens,
            pos: 0,
            end,
            route: None,
            mocks,
            registry,
        })
    }

    /// Parse every route in the source, in definition order.
    pub fn parse(mut self) -> Result<Vec<Route>, ParseError> {
        let mut routes = Vec::new();

        loop {
            while self.eat(&Token::Semicolon) {}
            if self.peek().is_none() {
                break;
            }

            let route = self.parse_route(routes.len())?;
            routes.push(route);

            if self.peek().is_some() && !self.eat(&Token::Semicolon) {
                return Err(self.unexpected("';'"));
            }
        }

        Ok(routes)
    }

    fn parse_route(&mut self, index: usize) -> Result<Route, ParseError> {
        let id = self.expect_ident("route id")?;
        self.route = Some(id.clone());
        self.expect(&Token::Colon, "':'")?;

        let mut predicates = Vec::new();
        if !self.eat(&Token::Star) {
            loop {
                let call = self.parse_call("predicate")?;
                let position = call.position;
                let predicate = build_predicate(call).map_err(|kind| self.error(kind, position))?;
                predicates.push(predicate);
                if !self.eat(&Token::And) {
                    break;
                }
            }
        }

        let mut filters = Vec::new();
        let backend = loop {
            self.expect(&Token::Arrow, "'->'")?;
            match self.peek().map(|s| &s.token) {
                Some(Token::Ident(_)) => {
                    let call = self.parse_call("filter")?;
                    let position = call.position;
                    let filter = self
                        .registry
                        .resolve(substitute_mock(&call.name, call.args, self.mocks))
                        .map_err(|kind| self.error(kind, position))?;
                    filters.push(filter);
                }
                _ => break self.parse_backend()?,
            }
        };

        self.route = None;

        Ok(Route {
            id,
            predicates,
            filters,
            backend,
            index,
        })
    }

    fn parse_call(&mut self, what: &'static str) -> Result<Call, ParseError> {
        let position = self.current_position();
        let name = self.expect_ident(what)?;
        self.expect(&Token::LParen, "'('")?;

        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                let arg = match self.next() {
                    Some(Token::Str(s)) => Arg::Str(s),
                    Some(Token::Regexp(s)) => Arg::Regexp(s),
                    Some(Token::Number(n)) => Arg::Number(n),
                    Some(_) => {
                        self.pos -= 1;
                        return Err(self.unexpected("argument"));
                    }
                    None => return Err(self.unexpected("argument")),
                };
                args.push(arg);

                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma, "',' or ')'")?;
            }
        }

        Ok(Call {
            name,
            args,
            position,
        })
    }

    fn parse_backend(&mut self) -> Result<Backend, ParseError> {
        let position = self.current_position();
        let backend = match self.next() {
            Some(Token::Str(address)) => {
                url::Url::parse(&address).map_err(|e| {
                    self.error(
                        ParseErrorKind::InvalidBackend(format!("{}: {}", address, e)),
                        position,
                    )
                })?;
                Backend::Network(address)
            }
            Some(Token::Special(name)) => match name.as_str() {
                "shunt" => Backend::Shunt,
                "loopback" => Backend::Loopback,
                "dynamic" => Backend::Dynamic,
                _ => {
                    return Err(self.error(
                        ParseErrorKind::InvalidBackend(format!("<{}>", name)),
                        position,
                    ))
                }
            },
            Some(_) => {
                self.pos -= 1;
                return Err(self.unexpected("filter or backend"));
            }
            None => return Err(self.unexpected("filter or backend")),
        };
        Ok(backend)
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek().map(|s| &s.token) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.peek().map(|s| &s.token) {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn current_position(&self) -> Position {
        self.peek().map(|s| s.position).unwrap_or(self.end)
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let kind = match self.peek() {
            Some(s) => ParseErrorKind::UnexpectedToken {
                expected,
                found: s.token.to_string(),
            },
            None => ParseErrorKind::UnexpectedEof(expected),
        };
        self.error(kind, self.current_position())
    }

    fn error(&self, kind: ParseErrorKind, position: Position) -> ParseError {
        ParseError {
            kind,
            position,
            route: self.route.clone(),
        }
    }
}

fn invalid_args(name: &str, message: impl Into<String>) -> ParseErrorKind {
    ParseErrorKind::InvalidArguments {
        name: name.to_string(),
        message: message.into(),
    }
}

fn check_arity(call: &Call, min: usize, max: usize) -> Result<(), ParseErrorKind> {
    let count = call.args.len();
    if count < min || count > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(invalid_args(
            &call.name,
            format!("expected {} arguments, got {}", expected, count),
        ));
    }
    Ok(())
}

fn string_arg<'c>(call: &'c Call, i: usize) -> Result<&'c str, ParseErrorKind> {
    match call.args.get(i) {
        Some(Arg::Str(s)) => Ok(s),
        _ => Err(invalid_args(
            &call.name,
            format!("argument {} must be a string", i + 1),
        )),
    }
}

fn value_arg(call: &Call, i: usize) -> Result<ValueMatch, ParseErrorKind> {
    match call.args.get(i) {
        Some(Arg::Str(s)) => Ok(ValueMatch::Exact(s.clone())),
        Some(Arg::Regexp(re)) => Ok(ValueMatch::Regexp(Regex::new(re)?)),
        _ => Err(invalid_args(
            &call.name,
            format!("argument {} must be a string or regexp", i + 1),
        )),
    }
}

fn pattern_arg(call: &Call, i: usize) -> Result<Regex, ParseErrorKind> {
    match call.args.get(i) {
        Some(Arg::Str(s)) | Some(Arg::Regexp(s)) => Ok(Regex::new(s)?),
        _ => Err(invalid_args(
            &call.name,
            format!("argument {} must be a regexp", i + 1),
        )),
    }
}

fn method_arg(call: &Call, i: usize) -> Result<Method, ParseErrorKind> {
    let raw = string_arg(call, i)?;
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| invalid_args(&call.name, format!("invalid method {:?}", raw)))
}

fn header_arg(call: &Call, i: usize) -> Result<(String, HeaderName), ParseErrorKind> {
    let name = string_arg(call, i)?;
    let key = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| invalid_args(&call.name, format!("invalid header name {:?}", name)))?;
    Ok((name.to_string(), key))
}

fn build_predicate(call: Call) -> Result<Predicate, ParseErrorKind> {
    match call.name.as_str() {
        "Method" => {
            check_arity(&call, 1, 1)?;
            Ok(Predicate::Method(method_arg(&call, 0)?))
        }
        "Methods" => {
            check_arity(&call, 1, usize::MAX)?;
            let methods = (0..call.args.len())
                .map(|i| method_arg(&call, i))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::Methods(methods))
        }
        "Path" => {
            check_arity(&call, 1, 1)?;
            let template = PathTemplate::parse(string_arg(&call, 0)?)
                .map_err(ParseErrorKind::InvalidPath)?;
            Ok(Predicate::Path(template))
        }
        "PathSubtree" => {
            check_arity(&call, 1, 1)?;
            let template = PathTemplate::subtree(string_arg(&call, 0)?)
                .map_err(ParseErrorKind::InvalidPath)?;
            Ok(Predicate::Path(template))
        }
        "Header" => {
            check_arity(&call, 1, 2)?;
            let (name, key) = header_arg(&call, 0)?;
            let value = match call.args.len() {
                2 => Some(string_arg(&call, 1)?.to_string()),
                _ => None,
            };
            Ok(Predicate::Header { name, key, value })
        }
        "HeaderRegexp" => {
            check_arity(&call, 2, 2)?;
            let (name, key) = header_arg(&call, 0)?;
            let pattern = pattern_arg(&call, 1)?;
            Ok(Predicate::HeaderRegexp { name, key, pattern })
        }
        "QueryParam" => {
            check_arity(&call, 1, 2)?;
            let name = string_arg(&call, 0)?.to_string();
            let value = match call.args.len() {
                2 => Some(value_arg(&call, 1)?),
                _ => None,
            };
            Ok(Predicate::QueryParam { name, value })
        }
        "Host" => {
            check_arity(&call, 1, 1)?;
            Ok(Predicate::Host(value_arg(&call, 0)?))
        }
        _ => Err(ParseErrorKind::UnknownPredicate(call.name)),
    }
}
