// Link template parser: `base?key=value&key=column[N]`

use super::ast::{LinkParam, LinkTemplate, LinkValue};
use crate::error::TableError;
use crate::Result;
use nom::{
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res},
    sequence::delimited,
    IResult,
};

/// `column[N]` with a zero-based index
fn column_index(input: &str) -> IResult<&str, usize> {
    delimited(
        tag("column["),
        map_res(digit1, |s: &str| s.parse::<usize>()),
        char(']'),
    )(input)
}

/// Parse a link template. Column references must point inside the table.
pub fn parse_link(column: &str, template: &str, column_count: usize) -> Result<LinkTemplate> {
    let Some((base, query)) = template.split_once('?') else {
        return Ok(LinkTemplate {
            base: template.to_string(),
            query: None,
        });
    };

    let mut params = Vec::new();
    for part in query.split('&').filter(|p| !p.is_empty()) {
        let param = match part.split_once('=') {
            None => LinkParam {
                key: part.to_string(),
                value: LinkValue::Absent,
            },
            Some((key, raw)) => {
                let value = match all_consuming(column_index)(raw) {
                    Ok((_, idx)) if idx < column_count => LinkValue::Column(idx),
                    Ok((_, idx)) => {
                        return Err(TableError::invalid(
                            Some(column),
                            raw,
                            format!(
                                "link references column {} but the table has {} columns",
                                idx, column_count
                            ),
                        ))
                    }
                    Err(_) => LinkValue::Literal(raw.to_string()),
                };
                LinkParam {
                    key: key.to_string(),
                    value,
                }
            }
        };
        params.push(param);
    }

    Ok(LinkTemplate {
        base: base.to_string(),
        query: Some(params),
    })
}
