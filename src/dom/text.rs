use regex::Regex;
use std::sync::OnceLock;

fn line_breaks() -> &'static Regex {
    static LINE_BREAKS: OnceLock<Regex> = OnceLock::new();
    LINE_BREAKS.get_or_init(|| Regex::new(r"\r\n|\r|\n").expect("static regex"))
}

/// Rendered text as users read it: each line break becomes a space, outer whitespace is trimmed.
pub fn normalize_text(raw: &str) -> String {
    line_breaks().replace_all(raw, " ").trim().to_string()
}

/// Quote a literal for use inside an XPath expression.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_split_over_lines_is_joined() {
        assert_eq!(
            normalize_text("  Онлайн пополнение\nбез комиссии \n"),
            "Онлайн пополнение без комиссии"
        );
        assert_eq!(normalize_text("a\r\nb"), "a b");
    }

    #[test]
    fn xpath_literal_quoting() {
        assert_eq!(xpath_literal("Рассрочка"), "'Рассрочка'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal("a'b\"c"),
            "concat('a', \"'\", 'b\"c')"
        );
    }
}
