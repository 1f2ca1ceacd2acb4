//! SRA Gateway CLI - search, read and recommend AWS Security Reference
//! Architecture content from the command line or as an MCP server

mod mcp;

use clap::{Parser, Subcommand, ValueEnum};
use sragate::{
    Gateway, GatewayBuilder, ReadRequest, RecommendRequest, RecommendationResult, SearchRequest,
    SearchResult, TokenSource, TOOL_LLMTXT,
};
use std::collections::HashMap;
use std::io::{self, Write};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Output format for search and recommend
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Markdown list
    #[default]
    Md,
    /// JSON format
    Json,
}

/// SRA Gateway - AWS Security Reference Architecture search and reader
#[derive(Parser, Debug)]
#[command(name = "sragate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full help with examples (llmtxt)
    #[arg(long)]
    llmtxt: bool,

    /// GitHub token for code search and issue/PR reads
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    github_token: Option<String>,

    /// Ask for a GitHub token on stderr when none is configured
    #[arg(long, global = true)]
    prompt_token: bool,

    /// Custom User-Agent
    #[arg(long, global = true)]
    user_agent: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp,
    /// Search documentation and the SRA GitHub repositories
    Search {
        /// Search phrase
        phrase: String,

        /// Maximum number of results (1-50)
        #[arg(long, short, default_value_t = 10)]
        limit: usize,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,
    },
    /// Read a documentation page, GitHub file, issue or pull request
    Read {
        /// URL to read
        url: String,

        /// Maximum number of characters to return
        #[arg(long, default_value_t = 5000)]
        max_length: usize,

        /// Start at this character index
        #[arg(long, default_value_t = 0)]
        start_index: usize,
    },
    /// Get recommendations for one or more documentation pages
    Recommend {
        /// Page URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// Maximum number of results per page (1-50)
        #[arg(long, short, default_value_t = 10)]
        limit: usize,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Handle --llmtxt flag
    if cli.llmtxt {
        writeln_safe(TOOL_LLMTXT);
        std::process::exit(0);
    }

    init_logging();

    // stdin belongs to the protocol in MCP mode
    let prompt = cli.prompt_token && !matches!(cli.command, Some(Commands::Mcp));
    let token = resolve_token(cli.github_token, prompt);
    let gateway = build_gateway(token, cli.user_agent);

    match cli.command {
        Some(Commands::Mcp) => {
            mcp::run_server(gateway).await;
        }
        Some(Commands::Search {
            phrase,
            limit,
            output,
        }) => {
            let results = gateway
                .search(SearchRequest::new(phrase).limit(limit))
                .await
                .unwrap_or_else(|e| fail(e));
            match output {
                OutputFormat::Md => writeln_safe(&format_search_md(&results)),
                OutputFormat::Json => print_json(&results),
            }
        }
        Some(Commands::Read {
            url,
            max_length,
            start_index,
        }) => {
            let request = ReadRequest::new(url)
                .max_length(max_length)
                .start_index(start_index);
            let text = gateway.read(request).await.unwrap_or_else(|e| fail(e));
            writeln_safe(&text);
        }
        Some(Commands::Recommend {
            urls,
            limit,
            output,
        }) => {
            run_recommend(&gateway, urls, limit, output).await;
        }
        None => {
            eprintln!("Usage: sragate search <PHRASE>");
            eprintln!("   or: sragate read <URL>");
            eprintln!("   or: sragate recommend <URL>...");
            eprintln!("   or: sragate mcp");
            eprintln!("   or: sragate --help");
            std::process::exit(1);
        }
    }
}

/// Log to stderr; stdout carries command output and MCP frames
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn resolve_token(github_token: Option<String>, prompt: bool) -> TokenSource {
    let token = TokenSource::from_optional(github_token);
    if !prompt || token != TokenSource::Declined {
        return token;
    }

    eprint!("GitHub token (leave empty to continue without one): ");
    let _ = io::stderr().flush();
    let mut answer = String::new();
    match io::stdin().read_line(&mut answer) {
        Ok(0) | Err(_) => TokenSource::from_prompt(None),
        Ok(_) => TokenSource::from_prompt(Some(&answer)),
    }
}

fn build_gateway(token: TokenSource, user_agent: Option<String>) -> Gateway {
    match token {
        TokenSource::Declined => {
            warn!("No GitHub token configured; GitHub code search may be limited")
        }
        TokenSource::Cancelled => {
            warn!("GitHub token prompt cancelled; continuing without a token")
        }
        TokenSource::Provided(_) => {}
    }

    let mut builder = GatewayBuilder::new().github_token(token);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    builder.build()
}

async fn run_recommend(gateway: &Gateway, urls: Vec<String>, limit: usize, output: OutputFormat) {
    if let [url] = urls.as_slice() {
        let results = gateway
            .recommend(RecommendRequest::new(url.as_str()).limit(limit))
            .await
            .unwrap_or_else(|e| fail(e));
        match output {
            OutputFormat::Md => writeln_safe(&format_recommendations_md(&results)),
            OutputFormat::Json => print_json(&results),
        }
        return;
    }

    let by_url = gateway
        .recommend_many(&urls, limit)
        .await
        .unwrap_or_else(|e| fail(e));
    match output {
        OutputFormat::Md => writeln_safe(&format_batch_md(&urls, &by_url)),
        OutputFormat::Json => print_json(&by_url),
    }
}

/// Format search results as a numbered markdown list
fn format_search_md(results: &[SearchResult]) -> String {
    let mut output = String::new();
    for result in results {
        output.push_str(&format!("{}. [{}]({})\n", result.rank_order, result.title, result.url));
        if let Some(context) = result.context.as_deref().filter(|c| !c.is_empty()) {
            output.push_str(&format!("   {}\n", context));
        }
    }
    output
}

fn format_recommendations_md(results: &[RecommendationResult]) -> String {
    let mut output = String::new();
    for result in results {
        output.push_str(&format!("- [{}]({})", result.title, result.url));
        if let Some(context) = &result.context {
            output.push_str(&format!(" - {}", context));
        }
        output.push('\n');
    }
    output
}

/// One section per page, in the order the pages were given
fn format_batch_md(urls: &[String], by_url: &HashMap<String, Vec<RecommendationResult>>) -> String {
    let mut output = String::new();
    for url in urls {
        output.push_str(&format!("## {}\n\n", url));
        match by_url.get(url) {
            Some(results) if !results.is_empty() => {
                output.push_str(&format_recommendations_md(results));
            }
            _ => output.push_str("No recommendations\n"),
        }
        output.push('\n');
    }
    output
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing response: {}", e);
        std::process::exit(1);
    });
    writeln_safe(&json);
}

fn fail(err: sragate::GatewayError) -> ! {
    eprintln!("Error: {}", err);
    std::process::exit(1);
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_token_without_prompt() {
        assert_eq!(
            resolve_token(Some("abc".to_string()), true),
            TokenSource::Provided("abc".to_string())
        );
        assert_eq!(resolve_token(None, false), TokenSource::Declined);
    }

    #[test]
    fn test_prompt_token_flag() {
        let cli = Cli::parse_from(["sragate", "search", "kms", "--prompt-token"]);
        assert!(cli.prompt_token);
        let cli = Cli::parse_from(["sragate", "mcp"]);
        assert!(!cli.prompt_token);
    }

    #[test]
    fn test_cancelled_prompt_builds_tokenless_gateway() {
        let gateway = build_gateway(TokenSource::Cancelled, None);
        assert!(gateway.config().github_token.is_none());
    }

    #[test]
    fn test_format_search_md() {
        let results = vec![
            SearchResult {
                rank_order: 1,
                url: "https://docs.aws.amazon.com/a.html".to_string(),
                title: "Security Tooling".to_string(),
                context: Some("Delegated admin".to_string()),
            },
            SearchResult {
                rank_order: 3,
                url: "https://github.com/awslabs/sra-verify/pull/2".to_string(),
                title: "[PR] Add check - awslabs/sra-verify".to_string(),
                context: Some(String::new()),
            },
        ];

        let output = format_search_md(&results);

        assert_eq!(
            output,
            "1. [Security Tooling](https://docs.aws.amazon.com/a.html)\n   Delegated admin\n\
             3. [[PR] Add check - awslabs/sra-verify](https://github.com/awslabs/sra-verify/pull/2)\n"
        );
    }

    #[test]
    fn test_format_recommendations_md() {
        let results = vec![
            RecommendationResult {
                url: "u1".to_string(),
                title: "t1".to_string(),
                context: Some("New content".to_string()),
            },
            RecommendationResult {
                url: "u2".to_string(),
                title: "t2".to_string(),
                context: None,
            },
        ];

        assert_eq!(
            format_recommendations_md(&results),
            "- [t1](u1) - New content\n- [t2](u2)\n"
        );
    }

    #[test]
    fn test_format_batch_md_keeps_input_order() {
        let urls = vec!["b".to_string(), "a".to_string()];
        let mut by_url = HashMap::new();
        by_url.insert(
            "a".to_string(),
            vec![RecommendationResult {
                url: "u".to_string(),
                title: "t".to_string(),
                context: None,
            }],
        );
        by_url.insert("b".to_string(), Vec::new());

        let output = format_batch_md(&urls, &by_url);

        assert!(output.find("## b").unwrap() < output.find("## a").unwrap());
        assert!(output.contains("## b\n\nNo recommendations\n"));
        assert!(output.contains("## a\n\n- [t](u)\n"));
    }

    #[test]
    fn test_cli_parses_recommend_batch() {
        let cli = Cli::parse_from(["sragate", "recommend", "u1", "u2", "--limit", "3"]);
        match cli.command {
            Some(Commands::Recommend { urls, limit, .. }) => {
                assert_eq!(urls, vec!["u1", "u2"]);
                assert_eq!(limit, 3);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
