//! Wiki-link extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Matches `[[target]]`, `[[target|alias]]` and `[[target#heading]]`.
static WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|#]+)(?:#[^\[\]|]*)?(?:\|[^\[\]]*)?\]\]").expect("valid wiki-link regex")
});

/// Returns the link targets of every wiki link in `content`, in order,
/// without duplicates. Targets are trimmed; empty targets are skipped.
pub fn parse_wiki_links(content: &str) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for caps in WIKI_LINK.captures_iter(content) {
        let target = caps[1].trim();
        if target.is_empty() || targets.iter().any(|t| t == target) {
            continue;
        }
        targets.push(target.to_string());
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_aliased_links() {
        let links = parse_wiki_links("See [[alpha]] and [[beta|the beta note]].");
        assert_eq!(links, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_heading_links_and_duplicates() {
        let links = parse_wiki_links("[[alpha#intro]] then [[alpha]] and [[ gamma ]]");
        assert_eq!(links, vec!["alpha", "gamma"]);
    }

    #[test]
    fn test_no_links() {
        assert!(parse_wiki_links("plain [text] with [[]] nothing").is_empty());
    }
}
