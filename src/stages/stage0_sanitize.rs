use std::sync::LazyLock;

use regex::Regex;

/// Strip markup tags, collapse whitespace runs to one space and trim the ends
pub fn sanitize(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
    static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let without_tags = TAG_RE.replace_all(text, "");
    SPACE_RE.replace_all(&without_tags, " ").trim().to_string()
}
