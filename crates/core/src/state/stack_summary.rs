//! # Stack Summary
//!
//! Read-only facts about the detected stack, produced by the scanner
//! collaborator. Every agent prompt and every fallback is derived from this.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tools::validation::names_technology;

/// The subset of a package manifest the pipeline cares about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageManifest {
    pub name: Option<String>,
    /// `main` entry (e.g. "dist/index.js")
    pub main: Option<String>,
    /// ESM `module` entry
    pub module: Option<String>,
    /// Executables declared under `bin`
    pub bin: BTreeMap<String, String>,
    pub scripts: BTreeMap<String, String>,
    pub dependencies: Vec<String>,
}

/// Detected technology stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackSummary {
    pub project_name: Option<String>,
    pub language: Option<String>,
    /// npm, pnpm, yarn, bun
    pub package_manager: Option<String>,
    pub framework: Option<String>,
    pub database: Option<String>,
    pub orm: Option<String>,
    pub testing: Option<String>,
    pub auth: Option<String>,
    pub deployment: Option<String>,
    pub analytics: Option<String>,
    pub payment: Option<String>,
    pub styling: Option<String>,
    pub manifest: PackageManifest,
}

impl StackSummary {
    /// Labelled stack facts in a fixed order, skipping unknown ones
    pub fn facts(&self) -> Vec<(&'static str, &str)> {
        [
            ("Language", &self.language),
            ("Framework", &self.framework),
            ("Database", &self.database),
            ("ORM", &self.orm),
            ("Testing", &self.testing),
            ("Auth", &self.auth),
            ("Deployment", &self.deployment),
            ("Analytics", &self.analytics),
            ("Payment", &self.payment),
            ("Styling", &self.styling),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect()
    }

    /// Whether a technology name is already one of the detected facts.
    /// Either side may carry extra words (`"Next.js 14"` vs `"Next.js"`).
    pub fn mentions(&self, technology: &str) -> bool {
        self.facts().iter().any(|(_, value)| {
            names_technology(value, technology) || names_technology(technology, value)
        })
    }

    pub fn package_manager(&self) -> &str {
        self.package_manager
            .as_deref()
            .map(str::trim)
            .filter(|pm| !pm.is_empty())
            .unwrap_or("npm")
    }

    /// Shell command that runs a manifest script
    pub fn script_command(&self, script: &str) -> String {
        match self.package_manager() {
            "npm" => format!("npm run {script}"),
            pm => format!("{pm} {script}"),
        }
    }

    /// Generate a summary for agent prompts
    pub fn to_summary(&self) -> String {
        let mut summary = String::new();

        if let Some(name) = self.project_name.as_ref().or(self.manifest.name.as_ref()) {
            summary.push_str(&format!("Project: {}\n", name));
        }
        for (label, value) in self.facts() {
            summary.push_str(&format!("{}: {}\n", label, value));
        }
        summary.push_str(&format!("Package manager: {}\n", self.package_manager()));

        if !self.manifest.scripts.is_empty() {
            summary.push_str("Scripts:\n");
            for (name, script) in &self.manifest.scripts {
                summary.push_str(&format!("  {}: {}\n", name, script));
            }
        }

        if !self.manifest.dependencies.is_empty() {
            summary.push_str("Dependencies: ");
            summary.push_str(&self.manifest.dependencies.join(", "));
            summary.push('\n');
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_stack() -> StackSummary {
        StackSummary {
            framework: Some("Next.js".into()),
            database: Some("Supabase".into()),
            package_manager: Some("pnpm".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_deserialize_camel_case_with_missing_fields() {
        let stack: StackSummary = serde_json::from_str(
            r#"{"framework":"Next.js","packageManager":"pnpm","manifest":{"scripts":{"dev":"next dev"}}}"#,
        )
        .unwrap();
        assert_eq!(stack.framework.as_deref(), Some("Next.js"));
        assert_eq!(stack.manifest.scripts["dev"], "next dev");
        assert!(stack.database.is_none());
    }

    #[test]
    fn test_script_command_per_package_manager() {
        let mut stack = next_stack();
        assert_eq!(stack.script_command("test"), "pnpm test");
        stack.package_manager = None;
        assert_eq!(stack.script_command("test"), "npm run test");
    }

    #[test]
    fn test_mentions_is_case_insensitive() {
        let stack = next_stack();
        assert!(stack.mentions("next.js"));
        assert!(stack.mentions("Supabase"));
        assert!(!stack.mentions("Stripe"));
        assert!(!stack.mentions("  "));
        assert!(stack.mentions("Next.js 14"));
    }

    #[test]
    fn test_mentions_ignores_partial_words() {
        let stack = StackSummary {
            database: Some("MongoDB".into()),
            framework: Some("Preact".into()),
            ..Default::default()
        };
        assert!(!stack.mentions("Go"));
        assert!(!stack.mentions("React"));
        assert!(stack.mentions("mongodb"));
    }

    #[test]
    fn test_summary_generation() {
        let summary = next_stack().to_summary();
        assert!(summary.contains("Framework: Next.js"));
        assert!(summary.contains("Database: Supabase"));
        assert!(summary.contains("Package manager: pnpm"));
    }
}
