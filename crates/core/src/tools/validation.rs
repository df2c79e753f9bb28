//! # Validation - Artifact Heuristics
//!
//! Deterministic checks applied to model output before it can reach the
//! final artifact: entry points must be real paths, recommendation names must
//! be bare lowercase tokens. Technology names are compared word by word.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Strings that read like instructions rather than paths
static INSTRUCTION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(check|open|look|run|see|review|find|inspect|if)\b")
        .expect("instruction prefix pattern is valid")
});

/// Extensions accepted as evidence that a string names a file
const KNOWN_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts", "json", "vue", "svelte", "astro",
    "html", "css", "scss", "sass", "less", "md", "mdx", "py", "rs", "go", "java", "kt", "rb",
    "php", "cs", "swift", "c", "h", "cpp", "hpp", "sql", "prisma", "graphql", "gql", "yaml",
    "yml", "toml", "sh", "env", "lock",
];

/// Whether `candidate` looks like a file path an agent can open
pub fn is_path_like(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.is_empty() || INSTRUCTION_PREFIX.is_match(candidate) {
        return false;
    }

    if candidate.contains('/') || candidate.contains('\\') {
        return true;
    }

    candidate
        .rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && KNOWN_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Trim, drop non-paths and duplicates, keep first-seen order
pub fn filter_entry_points<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|c| c.as_ref().trim().to_string())
        .filter(|c| is_path_like(c))
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

/// Lowercase, cut at the first `(`, join words with `-`.
///
/// `"Playwright MCP (for e2e)"` becomes `"playwright-mcp"`.
pub fn normalize_recommendation(name: &str) -> String {
    let lowered = name.to_lowercase();
    let head = match lowered.find('(') {
        Some(idx) => &lowered[..idx],
        None => lowered.as_str(),
    };
    head.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Normalize every name, drop empties and duplicates, keep first-seen order
pub fn normalize_recommendations<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|n| normalize_recommendation(n.as_ref()))
        .filter(|n| !n.is_empty())
        .filter(|n| seen.insert(n.clone()))
        .collect()
}

/// Trim guideline text, drop blanks and exact duplicates
pub fn clean_guidelines<I, S>(guidelines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    guidelines
        .into_iter()
        .map(|g| g.as_ref().trim().to_string())
        .filter(|g| !g.is_empty())
        .filter(|g| seen.insert(g.to_lowercase()))
        .collect()
}

/// Lowercase word tokens of a technology name. `"Next.js 14"` gives
/// `["next", "js", "14"]`.
pub fn technology_tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `text` names `technology` on word boundaries.
///
/// The technology's tokens must appear consecutively in `text`, or, joined
/// together, equal one token of `text` (so `"nextjs"` names `"Next.js"`).
/// `"MongoDB"` does not name `"Go"` and `"Preact"` does not name `"React"`.
pub fn names_technology(text: &str, technology: &str) -> bool {
    let needle = technology_tokens(technology);
    if needle.is_empty() {
        return false;
    }
    let haystack = technology_tokens(text);

    if haystack.windows(needle.len()).any(|window| window == needle.as_slice()) {
        return true;
    }
    let joined = needle.concat();
    haystack.iter().any(|token| *token == joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_accepted() {
        for path in [
            "src/app/page.tsx",
            "index.ts",
            "server.js",
            "apps\\web\\main.ts",
            "src/routes",
            "main.py",
        ] {
            assert!(is_path_like(path), "{path} should be a path");
        }
    }

    #[test]
    fn test_instructions_rejected() {
        for text in [
            "Check the src folder",
            "open package.json",
            "Look at src/index.ts",
            "run npm start",
            "See app/layout.tsx",
            "REVIEW src/",
            "find main.ts",
            "Inspect server.js",
            "if using docker, app/main.py",
            "",
            "   ",
            "the main module",
            ".env",
            "README",
        ] {
            assert!(!is_path_like(text), "{text:?} should be rejected");
        }
    }

    #[test]
    fn test_instruction_prefix_needs_word_boundary() {
        assert!(is_path_like("runtime/main.ts"));
        assert!(is_path_like("openapi.yaml"));
        assert!(is_path_like("finder.js"));
    }

    #[test]
    fn test_filter_entry_points_dedupes_in_order() {
        let filtered = filter_entry_points([
            " src/index.ts ",
            "Check the README",
            "src/index.ts",
            "app/page.tsx",
        ]);
        assert_eq!(filtered, vec!["src/index.ts", "app/page.tsx"]);
    }

    #[test]
    fn test_normalize_recommendation() {
        assert_eq!(normalize_recommendation("Playwright"), "playwright");
        assert_eq!(
            normalize_recommendation("Supabase (database access)"),
            "supabase"
        );
        assert_eq!(normalize_recommendation("  Chrome  DevTools "), "chrome-devtools");
        assert_eq!(normalize_recommendation("(none)"), "");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for name in ["Playwright (e2e)", "GitHub MCP", "stripe", " Next DevTools (beta) x"] {
            let once = normalize_recommendation(name);
            assert_eq!(normalize_recommendation(&once), once);
        }
    }

    #[test]
    fn test_normalize_recommendations_dedupes() {
        let names = normalize_recommendations([
            "Playwright",
            "playwright (browser tests)",
            "Supabase",
            "(optional)",
            "SUPABASE",
        ]);
        assert_eq!(names, vec!["playwright", "supabase"]);
        assert_eq!(normalize_recommendations(names.clone()), names);
    }

    #[test]
    fn test_clean_guidelines() {
        let cleaned = clean_guidelines(["  Run tests ", "", "run tests", "Use strict mode"]);
        assert_eq!(cleaned, vec!["Run tests", "Use strict mode"]);
    }

    #[test]
    fn test_technology_names_match_on_word_boundaries() {
        assert!(names_technology("next.js 14", "Next.js"));
        assert!(names_technology("nextjs", "Next.js"));
        assert!(names_technology("React Native 0.74", "react native"));
        assert!(names_technology("Supabase (Postgres)", "postgres"));
        assert!(!names_technology("MongoDB", "Go"));
        assert!(!names_technology("Preact", "React"));
        assert!(!names_technology("Vuetify", "Vue"));
        assert!(!names_technology("Next.js", "   "));
        assert_eq!(technology_tokens("C++ / C#"), vec!["c++", "c#"]);
    }
}
