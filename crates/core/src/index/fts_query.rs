//! Translation of user search queries into FTS5 MATCH syntax.
//!
//! Users type a relaxed grammar: bare words, `"phrases"`, `-excluded`,
//! `a|b`, `prefix*` and `column:term`. Every bare word is quoted so that
//! punctuation inside it is never read as FTS5 syntax.

const KEYWORDS: [&str; 3] = ["AND", "OR", "NOT"];

/// Convert a user query into an FTS5 query string.
pub fn convert_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 8);
    let mut term = String::new();
    let mut in_quotes = false;

    for c in query.chars() {
        if c == '"' {
            if in_quotes {
                push_quoted(&mut out, &term);
                term.clear();
            } else {
                finalize(&mut out, &mut term);
            }
            in_quotes = !in_quotes;
            continue;
        }

        if in_quotes {
            term.push(c);
            continue;
        }

        match c {
            '^' | '*' if term.is_empty() => out.push(c),
            ':' => {
                out.push_str(&term);
                out.push(':');
                term.clear();
            }
            '-' if term.is_empty() => out.push_str(" NOT "),
            '|' => {
                finalize(&mut out, &mut term);
                out.push_str(" OR ");
            }
            '+' if term.is_empty() => {}
            c if c.is_whitespace() || c == '(' || c == ')' => {
                finalize(&mut out, &mut term);
                out.push(c);
            }
            c => term.push(c),
        }
    }

    // unterminated quote closes implicitly
    if in_quotes {
        push_quoted(&mut out, &term);
    } else {
        finalize(&mut out, &mut term);
    }

    out
}

/// Emit a pending unquoted term.
fn finalize(out: &mut String, term: &mut String) {
    if term.is_empty() {
        return;
    }

    if KEYWORDS.contains(&term.as_str()) {
        out.push_str(term);
    } else if let Some(prefix) = term.strip_suffix('*') {
        push_quoted(out, prefix);
        out.push('*');
    } else {
        push_quoted(out, term);
    }

    term.clear();
}

fn push_quoted(out: &mut String, term: &str) {
    if term.is_empty() {
        return;
    }
    // `""` inside an FTS5 string is an escaped quote
    if out.ends_with('"') {
        out.push(' ');
    }
    out.push('"');
    out.push_str(term);
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("hello", r#""hello""#)]
    #[case("hello world", r#""hello" "world""#)]
    #[case(r#""hello world""#, r#""hello world""#)]
    #[case("-hello", r#" NOT "hello""#)]
    #[case("hello*", r#""hello"*"#)]
    #[case("a|b", r#""a" OR "b""#)]
    #[case("col:term", r#"col:"term""#)]
    #[case("title:draft*", r#"title:"draft"*"#)]
    #[case("foo AND bar", r#""foo" AND "bar""#)]
    #[case("foo and bar", r#""foo" "and" "bar""#)]
    #[case("+must", r#""must""#)]
    #[case("^start", r#"^"start""#)]
    #[case("(a b)", r#"("a" "b")"#)]
    #[case("well-known", r#""well-known""#)]
    #[case(r#"say"hi there"#, r#""say" "hi there""#)]
    #[case(r#""a""b""#, r#""a" "b""#)]
    #[case(r#""a"b"#, r#""a" "b""#)]
    #[case(r#""unterminated phrase"#, r#""unterminated phrase""#)]
    #[case(r#""literal*""#, r#""literal*""#)]
    fn converts_user_queries(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(convert_query(input), expected);
    }
}
