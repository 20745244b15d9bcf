//! Response cleaning for generator outputs.
//!
//! Reduces a raw completion to candidate SQL text. Cleaning never decides
//! safety; the result still goes through every validation gate.

use std::sync::LazyLock;

use regex::Regex;

static EDGE_FENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^```(?:sql)?\s*|\s*```$").expect("valid fence pattern")
});

/// Extracts candidate SQL from a raw completion.
///
/// - The first fenced code block (```` ```sql ```` or bare ```` ``` ````) wins
///   when one is present.
/// - Otherwise leading and trailing fences are stripped.
/// - Typographic quotes become ASCII quotes and stray backticks are removed.
pub fn extract_candidate_sql(response: &str) -> String {
    let trimmed = response.trim();

    let body = extract_code_block(trimmed)
        .unwrap_or_else(|| EDGE_FENCE_PATTERN.replace_all(trimmed, "").into_owned());

    normalize_quotes(&body).replace('`', "").trim().to_string()
}

/// Returns the content of the first fenced block tagged `sql` or untagged.
fn extract_code_block(text: &str) -> Option<String> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find("```") {
        let fence_start = search_from + offset;
        let after_fence = fence_start + 3;
        let line_end = after_fence + text[after_fence..].find('\n')?;
        let lang = text[after_fence..line_end].trim();
        let content_start = line_end + 1;
        let content_end = content_start + text[content_start..].find("```")?;

        if lang.is_empty() || lang.eq_ignore_ascii_case("sql") {
            return Some(text[content_start..content_end].to_string());
        }

        search_from = content_end + 3;
    }

    None
}

fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_sql_is_unchanged() {
        assert_eq!(
            extract_candidate_sql("SELECT COUNT(*) FROM transactions;"),
            "SELECT COUNT(*) FROM transactions;"
        );
    }

    #[test]
    fn test_sql_fence_is_stripped() {
        let response = "```sql\nSELECT * FROM transactions WHERE ccy = 'EUR';\n```";
        assert_eq!(
            extract_candidate_sql(response),
            "SELECT * FROM transactions WHERE ccy = 'EUR';"
        );
    }

    #[test]
    fn test_generic_fence_is_stripped() {
        assert_eq!(
            extract_candidate_sql("```\nSELECT 1 FROM transactions\n```"),
            "SELECT 1 FROM transactions"
        );
    }

    #[test]
    fn test_fenced_block_inside_prose() {
        let response = "Here's the query:\n\n```sql\nSELECT id FROM transactions;\n```\n\nIt lists ids.";
        assert_eq!(extract_candidate_sql(response), "SELECT id FROM transactions;");
    }

    #[test]
    fn test_first_sql_block_wins() {
        let response = "```python\nprint('x')\n```\n```sql\nSELECT id FROM transactions;\n```\n```sql\nSELECT ts FROM transactions;\n```";
        assert_eq!(extract_candidate_sql(response), "SELECT id FROM transactions;");
    }

    #[test]
    fn test_single_line_fence() {
        assert_eq!(
            extract_candidate_sql("```sql SELECT id FROM transactions```"),
            "SELECT id FROM transactions"
        );
    }

    #[test]
    fn test_typographic_quotes_are_replaced() {
        assert_eq!(
            extract_candidate_sql("SELECT * FROM transactions WHERE counterparty = \u{2018}Acme Corp\u{2019}"),
            "SELECT * FROM transactions WHERE counterparty = 'Acme Corp'"
        );
        assert_eq!(
            extract_candidate_sql("SELECT \u{201C}ccy\u{201D} FROM transactions"),
            "SELECT \"ccy\" FROM transactions"
        );
    }

    #[test]
    fn test_stray_backticks_are_removed() {
        assert_eq!(
            extract_candidate_sql("SELECT `amount` FROM `transactions`"),
            "SELECT amount FROM transactions"
        );
    }

    #[test]
    fn test_prose_passes_through() {
        let response = "I don't understand that question.";
        assert_eq!(extract_candidate_sql(response), response);
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(extract_candidate_sql("   \n"), "");
    }
}
