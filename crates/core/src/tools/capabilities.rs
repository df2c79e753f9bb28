//! # Capability Resolver
//!
//! Maps a detected stack to the integration servers worth installing. Pure
//! lookup, no model calls. The tables are injected so tests and embedders can
//! swap them.

use crate::state::{CapabilityRecommendations, StackSummary};

/// End-to-end test tooling recommended for every project
pub const DEFAULT_E2E_CAPABILITY: &str = "playwright";

/// Database fact -> capability
const DATABASE_CAPABILITIES: &[(&str, &str)] = &[
    ("supabase", "supabase"),
    ("postgres", "postgres"),
    ("postgresql", "postgres"),
    ("neon", "neon"),
    ("planetscale", "planetscale"),
    ("mysql", "mysql"),
    ("mongodb", "mongodb"),
    ("mongo", "mongodb"),
    ("sqlite", "sqlite"),
    ("turso", "turso"),
    ("redis", "redis"),
    ("upstash", "upstash"),
    ("firebase", "firebase"),
    ("firestore", "firebase"),
    ("convex", "convex"),
];

/// Framework, auth, deployment, analytics and payment facts -> capability
const SERVICE_CAPABILITIES: &[(&str, &str)] = &[
    ("next.js", "next-devtools"),
    ("nextjs", "next-devtools"),
    ("nuxt", "nuxt"),
    ("svelte", "svelte"),
    ("sveltekit", "svelte"),
    ("clerk", "clerk"),
    ("auth0", "auth0"),
    ("supabase auth", "supabase"),
    ("firebase auth", "firebase"),
    ("vercel", "vercel"),
    ("netlify", "netlify"),
    ("cloudflare", "cloudflare"),
    ("cloudflare workers", "cloudflare"),
    ("aws", "aws"),
    ("docker", "docker"),
    ("fly.io", "flyio"),
    ("railway", "railway"),
    ("posthog", "posthog"),
    ("sentry", "sentry"),
    ("google analytics", "google-analytics"),
    ("mixpanel", "mixpanel"),
    ("stripe", "stripe"),
    ("lemon squeezy", "lemonsqueezy"),
    ("lemonsqueezy", "lemonsqueezy"),
    ("paddle", "paddle"),
];

/// Lookup tables used by [`CapabilityResolver`]
#[derive(Debug, Clone)]
pub struct CapabilityTables {
    pub default_e2e: String,
    pub database: Vec<(String, String)>,
    pub services: Vec<(String, String)>,
}

impl Default for CapabilityTables {
    fn default() -> Self {
        Self {
            default_e2e: DEFAULT_E2E_CAPABILITY.to_string(),
            database: owned(DATABASE_CAPABILITIES),
            services: owned(SERVICE_CAPABILITIES),
        }
    }
}

fn owned(table: &[(&str, &str)]) -> Vec<(String, String)> {
    table
        .iter()
        .map(|(key, name)| (key.to_string(), name.to_string()))
        .collect()
}

/// Deterministic stack -> capability mapping
#[derive(Debug, Clone, Default)]
pub struct CapabilityResolver {
    tables: CapabilityTables,
}

impl CapabilityResolver {
    pub fn new(tables: CapabilityTables) -> Self {
        Self { tables }
    }

    pub fn resolve(&self, stack: &StackSummary) -> CapabilityRecommendations {
        let mut recommendations = CapabilityRecommendations {
            e2e_testing: Some(self.tables.default_e2e.clone()),
            database: None,
            additional: Vec::new(),
        };

        if let Some(database) = stack.database.as_deref() {
            recommendations.database = lookup(&self.tables.database, database);
        }

        let service_facts = [
            &stack.framework,
            &stack.auth,
            &stack.deployment,
            &stack.analytics,
            &stack.payment,
        ];
        for fact in service_facts.into_iter().flatten() {
            if let Some(name) = lookup(&self.tables.services, fact) {
                let duplicate = recommendations.additional.contains(&name)
                    || recommendations.database.as_ref() == Some(&name)
                    || recommendations.e2e_testing.as_ref() == Some(&name);
                if !duplicate {
                    recommendations.additional.push(name);
                }
            }
        }

        recommendations
    }
}

/// Longest table key contained in the fact wins
fn lookup(table: &[(String, String)], fact: &str) -> Option<String> {
    let fact = fact.trim().to_lowercase();
    if fact.is_empty() {
        return None;
    }

    table
        .iter()
        .filter(|(key, _)| fact.contains(key.as_str()))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, name)| name.clone())
}
