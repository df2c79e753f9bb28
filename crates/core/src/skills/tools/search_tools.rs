//! # Search Tools
//!
//! Web search (Tavily) and library documentation lookup (Context7) for the
//! tech researchers. Which of the two a run gets is decided once from the
//! available keys, see [`ResearchCapabilities::mode`].

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{parse_args, schema_of, truncate_chars, Tool, ToolResult, ToolSet};
use crate::state::ResearchMode;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
const CONTEXT7_API_URL: &str = "https://context7.com/api/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(15);
/// Characters of documentation returned per lookup
const MAX_DOC_CHARS: usize = 8_000;

/// Optional research credentials for a run
#[derive(Debug, Clone, Default)]
pub struct ResearchCapabilities {
    pub web_search_key: Option<String>,
    pub docs_lookup_key: Option<String>,
}

impl ResearchCapabilities {
    /// Reads `TAVILY_API_KEY` and `CONTEXT7_API_KEY`. Blank values count as absent.
    pub fn from_env() -> Self {
        Self {
            web_search_key: non_blank_env("TAVILY_API_KEY"),
            docs_lookup_key: non_blank_env("CONTEXT7_API_KEY"),
        }
    }

    pub fn mode(&self) -> ResearchMode {
        ResearchMode::from_flags(self.web_search_key.is_some(), self.docs_lookup_key.is_some())
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Tools for a researcher in `mode`. Knowledge-only runs get none.
pub fn research_tools(capabilities: &ResearchCapabilities, mode: ResearchMode) -> ToolSet {
    let mut tools = ToolSet::new();
    if mode.uses_web_search() {
        if let Some(key) = &capabilities.web_search_key {
            tools = tools.with_tool(WebSearchTool::new(key.clone()));
        }
    }
    if mode.uses_docs_lookup() {
        if let Some(key) = &capabilities.docs_lookup_key {
            tools = tools.with_tool(DocsLookupTool::new(key.clone()));
        }
    }
    tools
}

fn http_client() -> Result<reqwest::Client, ToolResult> {
    reqwest::Client::builder()
        .user_agent("devcontext/0.1")
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| ToolResult::error(format!("Failed to create HTTP client: {}", e)))
}

/// Arguments for web search
#[derive(Deserialize, JsonSchema)]
pub struct WebSearchArgs {
    /// Search query
    pub query: String,
    /// Maximum number of results (default: 5)
    pub max_results: Option<u32>,
}

pub struct WebSearchTool {
    api_key: String,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            endpoint: TAVILY_SEARCH_URL.to_string(),
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for current best practices. Returns titles, URLs and snippets."
    }

    fn parameters(&self) -> Value {
        schema_of::<WebSearchArgs>()
    }

    async fn call(&self, args: Value) -> ToolResult {
        let args: WebSearchArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(err) => return err,
        };
        if args.query.trim().is_empty() {
            return ToolResult::error("Search query must not be empty");
        }
        let max_results = args.max_results.unwrap_or(5).clamp(1, 10);

        let client = match http_client() {
            Ok(client) => client,
            Err(err) => return err,
        };
        let body = json!({
            "api_key": self.api_key,
            "query": args.query,
            "max_results": max_results,
            "search_depth": "basic",
        });

        match client.post(&self.endpoint).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(json) => {
                        let results: Vec<Value> = json
                            .get("results")
                            .and_then(|r| r.as_array())
                            .map(|arr| {
                                arr.iter()
                                    .take(max_results as usize)
                                    .map(|r| {
                                        json!({
                                            "title": r.get("title").and_then(|t| t.as_str()).unwrap_or(""),
                                            "url": r.get("url").and_then(|u| u.as_str()).unwrap_or(""),
                                            "snippet": r.get("content").and_then(|c| c.as_str()).unwrap_or("")
                                        })
                                    })
                                    .collect()
                            })
                            .unwrap_or_default();

                        ToolResult::success(json!({
                            "query": args.query,
                            "results": results
                        }))
                    }
                    Err(e) => ToolResult::error(format!("Failed to parse search response: {}", e)),
                }
            }
            Ok(response) => ToolResult::error(format!("Search API returned {}", response.status())),
            Err(e) => ToolResult::error(format!("Failed to query search API: {}", e)),
        }
    }
}

/// Arguments for documentation lookup
#[derive(Deserialize, JsonSchema)]
pub struct LookupDocsArgs {
    /// Library or framework name, e.g. "next.js"
    pub library: String,
    /// Optional focus, e.g. "routing" or "testing"
    pub topic: Option<String>,
}

pub struct DocsLookupTool {
    api_key: String,
    base_url: String,
}

impl DocsLookupTool {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: CONTEXT7_API_URL.to_string(),
        }
    }

    async fn resolve_library(
        &self,
        client: &reqwest::Client,
        library: &str,
    ) -> Result<Option<String>, String> {
        let url = format!("{}/search?query={}", self.base_url, urlencoding::encode(library));
        let response = client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| format!("Failed to query docs API: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("Docs API returned {}", response.status()));
        }
        let json: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse docs search response: {}", e))?;

        Ok(json
            .get("results")
            .and_then(|r| r.as_array())
            .and_then(|arr| arr.first())
            .and_then(|first| first.get("id"))
            .and_then(|id| id.as_str())
            .map(str::to_string))
    }
}

#[async_trait]
impl Tool for DocsLookupTool {
    fn name(&self) -> &'static str {
        "lookup_docs"
    }

    fn description(&self) -> &'static str {
        "Fetch up-to-date official documentation excerpts for a library."
    }

    fn parameters(&self) -> Value {
        schema_of::<LookupDocsArgs>()
    }

    async fn call(&self, args: Value) -> ToolResult {
        let args: LookupDocsArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(err) => return err,
        };
        if args.library.trim().is_empty() {
            return ToolResult::error("Library name must not be empty");
        }

        let client = match http_client() {
            Ok(client) => client,
            Err(err) => return err,
        };

        let library_id = match self.resolve_library(&client, &args.library).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                return ToolResult::error(format!("No documentation found for '{}'", args.library))
            }
            Err(e) => return ToolResult::error(e),
        };

        let mut url = format!(
            "{}{}?type=txt&tokens={}",
            self.base_url, library_id, MAX_DOC_CHARS
        );
        if let Some(topic) = args.topic.as_deref().filter(|t| !t.trim().is_empty()) {
            url.push_str(&format!("&topic={}", urlencoding::encode(topic)));
        }

        match client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(text) => {
                    let (content, truncated) = truncate_chars(&text, MAX_DOC_CHARS);
                    ToolResult::success(json!({
                        "library": args.library,
                        "libraryId": library_id,
                        "content": content,
                        "truncated": truncated
                    }))
                }
                Err(e) => ToolResult::error(format!("Failed to read documentation: {}", e)),
            },
            Ok(response) => ToolResult::error(format!("Docs API returned {}", response.status())),
            Err(e) => ToolResult::error(format!("Failed to fetch documentation: {}", e)),
        }
    }
}
