//! Quote-aware tokenizer for single lines of delimited text.
//!
//! A `"` toggles the quoted state and is dropped from the field text; the
//! delimiter only ends a field outside quotes. Doubled quotes are not an
//! escape. An unterminated quote swallows the rest of the line into the
//! current field. Parsing never fails.

pub const DEFAULT_DELIMITER: char = ',';

pub fn parse_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == delimiter && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Parses a header line, dropping empty tokens.
///
/// Trailing blank header cells therefore produce a header list shorter than
/// the data lines; callers map data positionally and ignore the overflow.
pub fn parse_header_line(line: &str, delimiter: char) -> Vec<String> {
    parse_line(line, delimiter)
        .into_iter()
        .filter(|field| !field.is_empty())
        .collect()
}

/// Lines of `text` that contain something other than whitespace.
pub fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quoted_field_keeps_embedded_delimiter() {
        assert_eq!(parse_line(r#"a,"b,c",d"#, ','), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn fields_are_trimmed_and_trailing_empty_preserved() {
        assert_eq!(parse_line(" a , b ,", ','), vec!["a", "b", ""]);
        assert_eq!(parse_line("", ','), vec![""]);
    }

    #[test]
    fn header_line_drops_empty_tokens() {
        assert_eq!(parse_header_line("id,name,,", ','), vec!["id", "name"]);
    }

    #[test]
    fn unterminated_quote_absorbs_remainder() {
        assert_eq!(parse_line(r#"a,"b,c,d"#, ','), vec!["a", "b,c,d"]);
    }

    #[test]
    fn doubled_quotes_toggle_twice() {
        assert_eq!(parse_line(r#""say ""hi""",x"#, ','), vec!["say hi", "x"]);
    }

    #[test]
    fn alternate_delimiter_is_honoured() {
        assert_eq!(parse_line("a;\"b;c\";d", ';'), vec!["a", "b;c", "d"]);
        assert_eq!(parse_line("a,b;c", ';'), vec!["a,b", "c"]);
    }

    #[test]
    fn content_lines_skips_blank_and_strips_carriage_returns() {
        let lines = content_lines("id,name\r\n\r\n1,Ann\r\n   \n").collect::<Vec<_>>();
        assert_eq!(lines, vec!["id,name", "1,Ann"]);
    }

    fn plain_field() -> impl Strategy<Value = String> {
        "[a-z0-9 ]{0,8}".prop_map(|s| s.trim().to_string())
    }

    proptest! {
        #[test]
        fn quoting_every_field_preserves_count_and_text(
            fields in proptest::collection::vec((plain_field(), any::<bool>()), 1..8)
        ) {
            let line = fields
                .iter()
                .map(|(field, embed)| {
                    if *embed {
                        format!("\"{field},{field}\"")
                    } else {
                        format!("\"{field}\"")
                    }
                })
                .collect::<Vec<_>>()
                .join(",");
            let parsed = parse_line(&line, ',');
            prop_assert_eq!(parsed.len(), fields.len());
            for (parsed_field, (field, embed)) in parsed.iter().zip(&fields) {
                let expected = if *embed { format!("{field},{field}") } else { field.clone() };
                prop_assert_eq!(parsed_field, &expected);
            }
        }
    }
}
