// Shared lexical parsers for the expression, footer and link grammars

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, anychar, char, digit1, multispace0, none_of},
    combinator::{map, map_res, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Identifier: letter or underscore, then letters, digits or underscores
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Unsigned decimal number: `12`, `3.5`. Signs are handled as unary operators.
pub fn number_literal(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, String> {
    let forbidden = if quote == '"' { "\\\"" } else { "\\'" };
    delimited(
        char(quote),
        map(
            many0(alt((none_of(forbidden), preceded(char('\\'), anychar)))),
            |chars: Vec<char>| chars.into_iter().collect::<String>(),
        ),
        char(quote),
    )
}

/// Double-quoted string literal with backslash escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    quoted('"')(input)
}

/// Single-quoted column key, e.g. `'price'`
pub fn column_key(input: &str) -> IResult<&str, String> {
    quoted('\'')(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("cell + 1"), Ok((" + 1", "cell".to_string())));
        assert_eq!(identifier("_x9)"), Ok((")", "_x9".to_string())));
        assert!(identifier("9x").is_err());
    }

    #[test]
    fn test_number_literal() {
        assert_eq!(number_literal("12"), Ok(("", 12.0)));
        assert_eq!(number_literal("3.25)"), Ok((")", 3.25)));
        // A trailing dot is not part of the number
        assert_eq!(number_literal("7."), Ok((".", 7.0)));
        assert!(number_literal("-1").is_err());
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(
            string_literal(r#""say \"hi\"" rest"#),
            Ok((" rest", "say \"hi\"".to_string()))
        );
        assert!(string_literal(r#""unterminated"#).is_err());
    }

    #[test]
    fn test_column_key() {
        assert_eq!(column_key("'unit price' * 2"), Ok((" * 2", "unit price".to_string())));
        assert_eq!(column_key("''"), Ok(("", String::new())));
    }

    #[test]
    fn test_ws() {
        let mut p = ws(identifier);
        assert_eq!(p("  abc  def"), Ok(("def", "abc".to_string())));
    }
}
