//! The program loader for LS-8.
//!
//! Listings hold one binary literal per line. Anything after a `#` is a comment, and lines
//! that are blank once comments are stripped don't occupy an address.

use nom_locate::LocatedSpan;
use thiserror::Error;

use self::lexer::lex_line;

pub mod lexer;

/// Source text annotated with its line and column.
pub type Span<'a> = LocatedSpan<&'a str>;

/// An error for the loader module of LS-8.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("malformed program at ({}:{}): {:?} is not a binary literal", .loc.0, .loc.1, .span)]
    MalformedProgram { loc: (usize, usize), span: String },
}

/// Type alias for Result<T, [LoadError]>.
pub type LoadResult<T> = Result<T, LoadError>;

/// Parses a program listing into the bytes to load at address 0 onwards.
///
/// This does not check that the bytes decode into valid instructions.
pub fn parse_program(source: &str) -> LoadResult<Vec<u8>> {
    let mut inp = Span::new(source);
    let mut program = vec![];
    while !inp.fragment().is_empty() {
        let (rest, byte) = lex_line(inp).map_err(|e| {
            let span = match e {
                nom::Err::Error(e) => e.input,
                nom::Err::Failure(e) => e.input,
                nom::Err::Incomplete(_) => inp,
            };
            LoadError::MalformedProgram {
                loc: (span.location_line() as usize, span.get_utf8_column()),
                span: span
                    .fragment()
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .trim_end()
                    .to_string(),
            }
        })?;
        if let Some(byte) = byte {
            program.push(byte);
        }
        inp = rest;
    }
    log::debug!("parsed {} bytes", program.len());
    Ok(program)
}
