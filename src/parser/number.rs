use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, digit1};
use nom::combinator::{map, opt, recognize};
use nom::sequence::{pair, preceded};
use nom::IResult;

/// A parsed PDF number, preserving whether the source text declared it as
/// an integer or a float (§3: "the variant discriminator is observable").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberToken {
    Integer(i64),
    Real(f64),
}

impl NumberToken {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumberToken::Integer(n) => Some(*n),
            NumberToken::Real(f) => Some(*f as i64),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            NumberToken::Integer(n) => *n as f64,
            NumberToken::Real(f) => *f,
        }
    }
}

fn signed_digits(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(opt(alt((char('+'), char('-')))), digit1))(input)
}

/// Parses a PDF numeric literal: optional sign, digits, optional decimal
/// point and fractional digits. A bare `.5` or `5.` is valid (some
/// writers emit both); a lone sign with no digits is not a number.
pub fn parse_number(input: &[u8]) -> IResult<&[u8], NumberToken> {
    alt((
        map(
            recognize(pair(
                opt(alt((char('+'), char('-')))),
                alt((
                    recognize(pair(digit1, opt(pair(char('.'), take_while1(|b: u8| b.is_ascii_digit()))))),
                    recognize(preceded(char('.'), digit1)),
                )),
            )),
            |bytes: &[u8]| {
                let text = std::str::from_utf8(bytes).unwrap_or("0");
                if text.contains('.') {
                    NumberToken::Real(text.parse().unwrap_or(0.0))
                } else {
                    match text.parse::<i64>() {
                        Ok(n) => NumberToken::Integer(n),
                        Err(_) => NumberToken::Real(text.parse().unwrap_or(0.0)),
                    }
                }
            },
        ),
        map(signed_digits, |bytes| {
            let text = std::str::from_utf8(bytes).unwrap_or("0");
            NumberToken::Integer(text.parse().unwrap_or(0))
        }),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integer() {
        let (_, tok) = parse_number(b"42 ").unwrap();
        assert_eq!(tok, NumberToken::Integer(42));
    }

    #[test]
    fn parses_negative_real() {
        let (_, tok) = parse_number(b"-3.14 ").unwrap();
        assert_eq!(tok, NumberToken::Real(-3.14));
    }

    #[test]
    fn parses_leading_dot_real() {
        let (_, tok) = parse_number(b".5 ").unwrap();
        assert_eq!(tok, NumberToken::Real(0.5));
    }
}
