//! robots.txt parsing and path evaluation.
//!
//! Only the `User-agent: *` block matters to us. Real-world robots files are
//! frequently malformed, so anything unparseable is skipped, never fatal:
//! a broken Disallow line simply contributes no rule, and absence of a
//! matching rule means the path is allowed.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Allow,
    Disallow,
}

/// Ordered Allow/Disallow prefix rules for the wildcard user agent.
///
/// Ephemeral: derived from the cached file on every check, never persisted.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<(Directive, String)>,
}

impl RuleSet {
    /// Parse a robots.txt body, keeping only rules from `User-agent: *`
    /// blocks. Lines without a colon or with an unknown directive are
    /// ignored.
    pub fn parse(content: &str) -> Self {
        let mut rules = Vec::new();
        // A block header can list several consecutive User-agent lines; the
        // block applies to us if any of them is `*`.
        let mut wildcard_block = false;
        let mut in_header = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !in_header {
                        wildcard_block = false;
                        in_header = true;
                    }
                    if value == "*" {
                        wildcard_block = true;
                    }
                }
                "allow" => {
                    in_header = false;
                    if wildcard_block && !value.is_empty() {
                        rules.push((Directive::Allow, value.to_string()));
                    }
                }
                "disallow" => {
                    in_header = false;
                    // An empty Disallow means "allow everything": no rule.
                    if wildcard_block && !value.is_empty() {
                        rules.push((Directive::Disallow, value.to_string()));
                    }
                }
                _ => {
                    in_header = false;
                }
            }
        }

        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate a URL path. Disallowed iff the longest matching Disallow
    /// prefix is strictly longer than every matching Allow prefix; on equal
    /// lengths Allow wins. No matching rule at all means allowed.
    pub fn is_allowed(&self, path: &str) -> bool {
        let path = if path.is_empty() { "/" } else { path };

        let mut longest_allow: Option<usize> = None;
        let mut longest_disallow: Option<usize> = None;

        for (directive, prefix) in &self.rules {
            if !path.starts_with(prefix.as_str()) {
                continue;
            }
            let slot = match directive {
                Directive::Allow => &mut longest_allow,
                Directive::Disallow => &mut longest_disallow,
            };
            if slot.map_or(true, |len| prefix.len() > len) {
                *slot = Some(prefix.len());
            }
        }

        match (longest_allow, longest_disallow) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(allow), Some(disallow)) => allow >= disallow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_block_only() {
        let rules = RuleSet::parse(
            "User-agent: pricebot\nDisallow: /\n\nUser-agent: *\nDisallow: /private/\n",
        );
        assert!(!rules.is_allowed("/private/listing"));
        assert!(rules.is_allowed("/products/42"));
    }

    #[test]
    fn test_stacked_user_agent_header() {
        let rules = RuleSet::parse("User-agent: pricebot\nUser-agent: *\nDisallow: /checkout/\n");
        assert!(!rules.is_allowed("/checkout/cart"));
    }

    #[test]
    fn test_longer_allow_overrides_disallow() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /shop/\nAllow: /shop/public/\n");
        assert!(!rules.is_allowed("/shop/internal"));
        assert!(rules.is_allowed("/shop/public/specials"));
    }

    #[test]
    fn test_equal_length_tie_favors_allow() {
        let rules = RuleSet::parse("User-agent: *\nDisallow: /a/\nAllow: /a/\n");
        assert!(rules.is_allowed("/a/page"));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let rules = RuleSet::parse(
            "User-agent: *\nDisallow /private/\nCrawl-delay: nonsense\nDisallow: /admin/\n",
        );
        // The colonless Disallow contributes no rule, so its paths stay open.
        assert!(rules.is_allowed("/private/listing"));
        assert!(!rules.is_allowed("/admin/panel"));
    }

    #[test]
    fn test_empty_disallow_and_comments() {
        let rules = RuleSet::parse("# site robots\nUser-agent: *\nDisallow:\n");
        assert!(rules.is_empty());
        assert!(rules.is_allowed("/anything"));
    }

    #[test]
    fn test_no_rules_defaults_to_allowed() {
        let rules = RuleSet::parse("");
        assert!(rules.is_allowed("/anywhere"));
        assert!(rules.is_allowed(""));
    }

    #[test]
    fn test_case_insensitive_directives() {
        let rules = RuleSet::parse("USER-AGENT: *\nDISALLOW: /secret/\n");
        assert!(!rules.is_allowed("/secret/page"));
    }
}
