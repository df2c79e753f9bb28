//! # Repository Tools
//!
//! Read-only introspection of the analyzed repository for the context
//! enricher: list a directory, read a file, search text, read the manifest.
//! Every path is resolved inside a [`RepoSandbox`].

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};

use super::{parse_args, schema_of, truncate_chars, Tool, ToolResult, ToolSet};
use crate::error::{AgentError, AgentResult};

/// Characters returned by a single read
const MAX_READ_CHARS: usize = 12_000;
/// Matches returned by a single search
const MAX_SEARCH_MATCHES: usize = 40;
/// Files larger than this are skipped by search
const MAX_SEARCH_FILE_BYTES: u64 = 256 * 1024;

/// Manifests probed by `read_manifest`, in order
const MANIFESTS: &[&str] = &["package.json", "Cargo.toml", "pyproject.toml", "go.mod"];

/// Root that every tool path is resolved against
#[derive(Debug, Clone)]
pub struct RepoSandbox {
    root: PathBuf,
}

impl RepoSandbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a repository-relative path. Absolute paths and `..` are refused.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, String> {
        let relative = relative.trim();
        let candidate = Path::new(relative);

        for component in candidate.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(format!("Path '{}' escapes the repository", relative)),
            }
        }

        Ok(self.root.join(candidate))
    }

    fn relative_display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// All repository tools rooted at `root`. The root must be an existing
/// directory.
pub fn repo_tools(root: impl Into<PathBuf>) -> AgentResult<ToolSet> {
    let sandbox = RepoSandbox::new(root);
    if !sandbox.root().is_dir() {
        return Err(AgentError::tool(
            "repo_tools",
            format!("repository root {} is not a directory", sandbox.root().display()),
        ));
    }
    Ok(ToolSet::new()
        .with_tool(ListDirectoryTool::new(sandbox.clone()))
        .with_tool(ReadFileTool::new(sandbox.clone()))
        .with_tool(SearchTextTool::new(sandbox.clone()))
        .with_tool(ReadManifestTool::new(sandbox)))
}

/// Arguments for listing directory contents
#[derive(Deserialize, JsonSchema)]
pub struct ListDirArgs {
    /// Relative path to the directory (empty for the repository root)
    #[serde(default)]
    pub path: Option<String>,
}

pub struct ListDirectoryTool {
    sandbox: RepoSandbox,
}

impl ListDirectoryTool {
    pub fn new(sandbox: RepoSandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &'static str {
        "list_directory"
    }

    fn description(&self) -> &'static str {
        "List files and subdirectories of a repository directory."
    }

    fn parameters(&self) -> Value {
        schema_of::<ListDirArgs>()
    }

    async fn call(&self, args: Value) -> ToolResult {
        let args: ListDirArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(err) => return err,
        };
        let requested = args.path.unwrap_or_default();
        let dir_path = match self.sandbox.resolve(&requested) {
            Ok(path) => path,
            Err(e) => return ToolResult::error(e),
        };

        let mut entries = match tokio::fs::read_dir(&dir_path).await {
            Ok(entries) => entries,
            Err(e) => return ToolResult::error(format!("Failed to list '{}': {}", requested, e)),
        };

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            if name == ".git" || name == "node_modules" {
                continue;
            }
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => dirs.push(name),
                _ => files.push(name),
            }
        }
        files.sort();
        dirs.sort();

        ToolResult::success(json!({
            "path": if requested.is_empty() { ".".to_string() } else { requested },
            "files": files,
            "directories": dirs
        }))
    }
}

/// Arguments for reading a file
#[derive(Deserialize, JsonSchema)]
pub struct ReadFileArgs {
    /// Relative path to the file within the repository
    pub path: String,
}

pub struct ReadFileTool {
    sandbox: RepoSandbox,
    max_chars: usize,
}

impl ReadFileTool {
    pub fn new(sandbox: RepoSandbox) -> Self {
        Self {
            sandbox,
            max_chars: MAX_READ_CHARS,
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a repository file. Long files are truncated."
    }

    fn parameters(&self) -> Value {
        schema_of::<ReadFileArgs>()
    }

    async fn call(&self, args: Value) -> ToolResult {
        let args: ReadFileArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(err) => return err,
        };
        let full_path = match self.sandbox.resolve(&args.path) {
            Ok(path) => path,
            Err(e) => return ToolResult::error(e),
        };

        match tokio::fs::read_to_string(&full_path).await {
            Ok(content) => {
                let lines = content.lines().count();
                let (content, truncated) = truncate_chars(&content, self.max_chars);
                ToolResult::success(json!({
                    "path": args.path,
                    "content": content,
                    "lines": lines,
                    "truncated": truncated
                }))
            }
            Err(e) => ToolResult::error(format!("Failed to read '{}': {}", args.path, e)),
        }
    }
}

/// Arguments for text search
#[derive(Deserialize, JsonSchema)]
pub struct SearchTextArgs {
    /// Case-insensitive text to look for
    pub query: String,
    /// Optional glob on the relative path, e.g. "src/**/*.ts"
    #[serde(default)]
    pub glob: Option<String>,
}

pub struct SearchTextTool {
    sandbox: RepoSandbox,
    max_matches: usize,
}

impl SearchTextTool {
    pub fn new(sandbox: RepoSandbox) -> Self {
        Self {
            sandbox,
            max_matches: MAX_SEARCH_MATCHES,
        }
    }
}

#[async_trait]
impl Tool for SearchTextTool {
    fn name(&self) -> &'static str {
        "search_text"
    }

    fn description(&self) -> &'static str {
        "Search repository files for text (case-insensitive). Honors .gitignore."
    }

    fn parameters(&self) -> Value {
        schema_of::<SearchTextArgs>()
    }

    async fn call(&self, args: Value) -> ToolResult {
        let args: SearchTextArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(err) => return err,
        };
        if args.query.trim().is_empty() {
            return ToolResult::error("Search query must not be empty");
        }
        let pattern = match args.glob.as_deref().map(glob::Pattern::new).transpose() {
            Ok(pattern) => pattern,
            Err(e) => return ToolResult::error(format!("Invalid glob: {}", e)),
        };

        let sandbox = self.sandbox.clone();
        let query = args.query.clone();
        let max_matches = self.max_matches;
        let search = tokio::task::spawn_blocking(move || {
            search_files(&sandbox, &query, pattern.as_ref(), max_matches)
        })
        .await;

        match search {
            Ok((matches, truncated)) => ToolResult::success(json!({
                "query": args.query,
                "matches": matches,
                "truncated": truncated
            })),
            Err(e) => ToolResult::error(format!("Search failed: {}", e)),
        }
    }
}

fn search_files(
    sandbox: &RepoSandbox,
    query: &str,
    pattern: Option<&glob::Pattern>,
    max_matches: usize,
) -> (Vec<Value>, bool) {
    let needle = query.to_lowercase();
    let mut matches = Vec::new();

    let walker = ignore::WalkBuilder::new(sandbox.root())
        .hidden(true)
        .git_ignore(true)
        .build();

    for entry in walker.flatten() {
        let path = entry.path();
        if !entry.file_type().map_or(false, |ft| ft.is_file()) {
            continue;
        }
        let relative = sandbox.relative_display(path);
        if let Some(pattern) = pattern {
            if !pattern.matches(&relative) {
                continue;
            }
        }
        if entry.metadata().map_or(true, |m| m.len() > MAX_SEARCH_FILE_BYTES) {
            continue;
        }
        // Binary and non-UTF-8 files are skipped
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };

        for (idx, line) in content.lines().enumerate() {
            if line.to_lowercase().contains(&needle) {
                if matches.len() == max_matches {
                    return (matches, true);
                }
                let (text, _) = truncate_chars(line.trim(), 200);
                matches.push(json!({ "path": relative, "line": idx + 1, "text": text }));
            }
        }
    }

    (matches, false)
}

pub struct ReadManifestTool {
    sandbox: RepoSandbox,
}

impl ReadManifestTool {
    pub fn new(sandbox: RepoSandbox) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ReadManifestTool {
    fn name(&self) -> &'static str {
        "read_manifest"
    }

    fn description(&self) -> &'static str {
        "Read the project manifest (package.json, Cargo.toml, pyproject.toml or go.mod)."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, _args: Value) -> ToolResult {
        for manifest in MANIFESTS {
            let path = self.sandbox.root().join(manifest);
            let Ok(content) = tokio::fs::read_to_string(&path).await else {
                continue;
            };

            if *manifest == "package.json" {
                if let Ok(parsed) = serde_json::from_str::<Value>(&content) {
                    return ToolResult::success(json!({
                        "file": manifest,
                        "name": parsed.get("name"),
                        "main": parsed.get("main"),
                        "module": parsed.get("module"),
                        "bin": parsed.get("bin"),
                        "scripts": parsed.get("scripts"),
                        "dependencies": object_keys(parsed.get("dependencies")),
                        "devDependencies": object_keys(parsed.get("devDependencies")),
                    }));
                }
            }

            let (content, truncated) = truncate_chars(&content, MAX_READ_CHARS);
            return ToolResult::success(json!({
                "file": manifest,
                "content": content,
                "truncated": truncated
            }));
        }

        ToolResult::error("No manifest found at the repository root")
    }
}

fn object_keys(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_object)
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default()
}
