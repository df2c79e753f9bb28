//! # Documentation Hints
//!
//! Static table of where to read up on common technologies. Used by the tech
//! researcher as a deterministic fallback when model output is unusable.

use std::collections::BTreeMap;

use super::validation::names_technology;

const DOC_HINTS: &[(&str, &[&str])] = &[
    (
        "Next.js",
        &[
            "https://nextjs.org/docs",
            "App Router: https://nextjs.org/docs/app",
            "Data fetching and caching: https://nextjs.org/docs/app/building-your-application/data-fetching",
        ],
    ),
    (
        "React",
        &[
            "https://react.dev/reference/react",
            "Rules of hooks: https://react.dev/reference/rules",
        ],
    ),
    (
        "Supabase",
        &[
            "https://supabase.com/docs",
            "Row Level Security: https://supabase.com/docs/guides/database/postgres/row-level-security",
        ],
    ),
    (
        "Prisma",
        &[
            "https://www.prisma.io/docs",
            "Schema reference: https://www.prisma.io/docs/orm/reference/prisma-schema-reference",
        ],
    ),
    (
        "Drizzle",
        &["https://orm.drizzle.team/docs/overview"],
    ),
    (
        "PostgreSQL",
        &["https://www.postgresql.org/docs/current/"],
    ),
    (
        "MongoDB",
        &["https://www.mongodb.com/docs/"],
    ),
    (
        "Vitest",
        &["https://vitest.dev/guide/"],
    ),
    (
        "Jest",
        &["https://jestjs.io/docs/getting-started"],
    ),
    (
        "Playwright",
        &[
            "https://playwright.dev/docs/intro",
            "Best practices: https://playwright.dev/docs/best-practices",
        ],
    ),
    (
        "Tailwind CSS",
        &["https://tailwindcss.com/docs"],
    ),
    (
        "Express",
        &["https://expressjs.com/en/guide/routing.html"],
    ),
    (
        "Vue",
        &["https://vuejs.org/guide/introduction.html"],
    ),
    (
        "Nuxt",
        &["https://nuxt.com/docs"],
    ),
    (
        "SvelteKit",
        &["https://svelte.dev/docs/kit"],
    ),
    (
        "Astro",
        &["https://docs.astro.build/"],
    ),
    (
        "Clerk",
        &["https://clerk.com/docs"],
    ),
    (
        "Stripe",
        &[
            "https://docs.stripe.com/",
            "Webhooks: https://docs.stripe.com/webhooks",
        ],
    ),
    (
        "Vercel",
        &["https://vercel.com/docs"],
    ),
    (
        "TypeScript",
        &["https://www.typescriptlang.org/docs/handbook/intro.html"],
    ),
];

/// Technology -> documentation hints, with tolerant lookup
#[derive(Debug, Clone)]
pub struct DocHintTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for DocHintTable {
    fn default() -> Self {
        Self::from_entries(
            DOC_HINTS
                .iter()
                .map(|(tech, hints)| (tech.to_string(), hints.iter().map(|h| h.to_string()).collect())),
        )
    }
}

impl DocHintTable {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Exact key, then case-insensitive key, then the longest key the query
    /// names on word boundaries, else a generic hint.
    pub fn documentation_hints(&self, technology: &str) -> Vec<String> {
        let technology = technology.trim();

        if let Some(hints) = self.entries.get(technology) {
            return hints.clone();
        }

        let query = technology.to_lowercase();
        if query.is_empty() {
            return generic_hint(technology);
        }

        if let Some((_, hints)) = self
            .entries
            .iter()
            .find(|(key, _)| key.to_lowercase() == query)
        {
            return hints.clone();
        }

        self.entries
            .iter()
            .filter(|(key, _)| names_technology(&query, key))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, hints)| hints.clone())
            .unwrap_or_else(|| generic_hint(technology))
    }
}

fn generic_hint(technology: &str) -> Vec<String> {
    let name = if technology.is_empty() {
        "this technology"
    } else {
        technology
    };
    vec![format!("Check the official {} documentation", name)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let table = DocHintTable::default();
        let hints = table.documentation_hints("Next.js");
        assert_eq!(hints[0], "https://nextjs.org/docs");
    }

    #[test]
    fn test_versioned_lowercase_query_matches_exact_key() {
        let table = DocHintTable::default();
        assert_eq!(
            table.documentation_hints("next.js 14"),
            table.documentation_hints("Next.js")
        );
        assert_eq!(
            table.documentation_hints("SUPABASE"),
            table.documentation_hints("Supabase")
        );
    }

    #[test]
    fn test_longest_partial_key_wins() {
        let table = DocHintTable::from_entries([
            ("React".to_string(), vec!["react".to_string()]),
            ("React Native".to_string(), vec!["native".to_string()]),
        ]);
        assert_eq!(table.documentation_hints("react native 0.74"), vec!["native"]);
        assert_eq!(table.documentation_hints("react 18"), vec!["react"]);
    }

    #[test]
    fn test_unknown_technology_gets_generic_hint() {
        let hints = DocHintTable::default().documentation_hints("Zig");
        assert_eq!(hints, vec!["Check the official Zig documentation"]);
        assert_eq!(
            DocHintTable::default().documentation_hints("Go"),
            vec!["Check the official Go documentation"]
        );
    }

    #[test]
    fn test_partial_match_respects_word_boundaries() {
        let table = DocHintTable::default();
        assert_eq!(
            table.documentation_hints("Preact"),
            vec!["Check the official Preact documentation"]
        );
        assert_eq!(
            table.documentation_hints("Vuetify"),
            vec!["Check the official Vuetify documentation"]
        );
        assert_eq!(
            table.documentation_hints("Vue 3"),
            table.documentation_hints("Vue")
        );
        assert_eq!(
            table.documentation_hints("nextjs"),
            table.documentation_hints("Next.js")
        );
    }
}
