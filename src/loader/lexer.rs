use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::char,
    combinator::{eof, map_res, opt, value},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use super::Span;

/// Lexes a base-2 literal that fits in a byte, e.g. `10000010` or `0b1`.
pub fn lex_byte(inp: Span) -> IResult<Span, u8> {
    map_res(
        preceded(
            opt(tag_no_case("0b")),
            take_while1(|c: char| c == '0' || c == '1'),
        ),
        |digits: Span| u8::from_str_radix(digits.fragment(), 2),
    )(inp)
}

/// Whitespace that may surround a literal on its line. Excludes `\n`, which ends the line.
fn is_line_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\x0b' | '\x0c')
}

/// Lexes the whitespace around a literal, stopping at the end of the line.
pub fn lex_line_space(inp: Span) -> IResult<Span, Span> {
    take_while(is_line_space)(inp)
}

/// Lexes a `#` comment up to, but not including, the end of the line.
pub fn lex_comment(inp: Span) -> IResult<Span, Span> {
    preceded(tag("#"), take_while(|c: char| c != '\n'))(inp)
}

/// Lexes a single line of a listing, line ending included.
///
/// Yields the byte on that line, or `None` for blank and comment-only lines.
pub fn lex_line(inp: Span) -> IResult<Span, Option<u8>> {
    terminated(
        delimited(lex_line_space, opt(lex_byte), lex_line_space),
        pair(opt(lex_comment), alt((value((), char('\n')), value((), eof)))),
    )(inp)
}
