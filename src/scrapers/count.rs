use regex::Regex;
use std::sync::LazyLock;

/// "Du finner 1 234 annonser" in the page description. Thousands are
/// separated by spaces, NBSP, or their entities.
#[allow(clippy::expect_used)]
static RESULT_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Du finner (\d(?:\d|\s|&nbsp;|&#160;)*)").expect("valid regex")
});

#[allow(clippy::expect_used)]
static UNIT_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:treff|boliger|leieobjekter)").expect("valid regex")
});

/// Total number of results reported by a search page, or 0 if the page
/// does not say.
pub fn extract_total_count(html: &str) -> u64 {
    if let Some(count) = RESULT_PHRASE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_grouped(m.as_str()))
    {
        return count;
    }

    UNIT_COUNT
        .captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn parse_grouped(text: &str) -> Option<u64> {
    let digits: String = text
        .replace("&nbsp;", "")
        .replace("&#160;", "")
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
