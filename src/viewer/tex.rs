//! Math extraction from LaTeX source.
//!
//! Recognises exactly two delimiter pairs, inline `$...$` and block
//! `\[...\]`, scanning left to right. At each position the inline form is
//! tried first; an opening delimiter without a matching close is skipped.
//! Bodies are matched lazily (up to the first closing delimiter), may span
//! lines, and are trimmed. Empty bodies are dropped, which also means `$$`
//! display math yields nothing.

/// Every math expression in `source`, in order of appearance.
pub fn extract_math(source: &str) -> Vec<String> {
    let bytes = source.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' {
            let body_start = i + 1;
            if let Some(len) = source[body_start..].find('$') {
                push_trimmed(&mut found, &source[body_start..body_start + len]);
                i = body_start + len + 1;
                continue;
            }
        } else if bytes[i..].starts_with(b"\\[") {
            let body_start = i + 2;
            if let Some(len) = source[body_start..].find("\\]") {
                push_trimmed(&mut found, &source[body_start..body_start + len]);
                i = body_start + len + 2;
                continue;
            }
        }
        i += 1;
    }

    found
}

fn push_trimmed(found: &mut Vec<String>, body: &str) {
    let body = body.trim();
    if !body.is_empty() {
        found.push(body.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_and_block_in_order() {
        assert_eq!(
            extract_math(r"Intro $x^2$ then \[y=mx+b\] end."),
            vec!["x^2", "y=mx+b"]
        );
    }

    #[test]
    fn test_block_before_inline() {
        assert_eq!(
            extract_math(r"\[ E = mc^2 \] and $a+b$"),
            vec!["E = mc^2", "a+b"]
        );
    }

    #[test]
    fn test_spans_newlines() {
        let src = "\\[\n  \\int_0^1 f(x)\\,dx\n\\]\n";
        assert_eq!(extract_math(src), vec![r"\int_0^1 f(x)\,dx"]);
    }

    #[test]
    fn test_lazy_matching() {
        assert_eq!(extract_math("$a$ text $b$"), vec!["a", "b"]);
    }

    #[test]
    fn test_unclosed_delimiters_are_skipped() {
        assert_eq!(extract_math(r"costs $5 and \[ never closed"), Vec::<String>::new());
        assert_eq!(extract_math(r"\[ open $x$"), vec!["x"]);
    }

    #[test]
    fn test_empty_and_double_dollar() {
        assert_eq!(extract_math("$ $ and $$z$$"), Vec::<String>::new());
    }

    #[test]
    fn test_block_opening_first_wins() {
        assert_eq!(extract_math(r"\[ $q$ \]"), vec!["$q$"]);
    }

    #[test]
    fn test_non_ascii_text() {
        assert_eq!(extract_math("Größe $\\alpha$ ok"), vec!["\\alpha"]);
    }

    #[test]
    fn test_no_math() {
        assert!(extract_math(r"\section{Intro} plain text").is_empty());
    }
}
