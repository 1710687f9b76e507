//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::BufReader;
use tracing::{debug, info};

use crate::agent::{
    AgentRunner, DocTool, LlmProvider, LlmSingleSelector, PromptSet, RequestSettings,
    RouterQueryEngine, ToolFactory, ToolRetriever, ToolSource, create_provider, predict_and_call,
};
use crate::cli::parser::{Cli, Commands, DEFAULT_DOCUMENT, DEFAULT_PAPERS};
use crate::cli::repl::{ReplExit, Session, run_repl};
use crate::config::RagConfig;
use crate::core::Document;
use crate::embedding::create_embedder;
use crate::error::{AgentError, CommandError, Result};
use crate::index::IndexCache;
use crate::query::Synthesizer;

/// Executes the CLI command.
///
/// Interactive commands write to stdout as they go and return an empty
/// string once the session ends.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    if let Commands::InitPrompts { dir } = &cli.command {
        return cmd_init_prompts(dir.as_deref());
    }

    let config = build_config(cli)?;

    // Create tokio runtime as sync/async bridge
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;

    rt.block_on(async {
        let mut stdout = std::io::stdout();
        match &cli.command {
            Commands::Router { file } => {
                let file = document_path(&config, file.as_deref());
                cmd_router(&config, &file, &mut stdout).await
            }
            Commands::ToolCall { file } => {
                let file = document_path(&config, file.as_deref());
                cmd_tool_call(&config, &file, &mut stdout).await
            }
            Commands::Agent { file, .. } => {
                let file = document_path(&config, file.as_deref());
                cmd_agent(&config, &file, &mut stdout).await
            }
            Commands::MultiDoc { papers, .. } => cmd_multi_doc(&config, papers, &mut stdout).await,
            Commands::Build { files } => cmd_build(&config, files).await,
            Commands::InitPrompts { .. } => Ok(String::new()),
        }
    })
}

/// Resolves configuration: CLI flags, then environment, then defaults.
fn build_config(cli: &Cli) -> Result<RagConfig> {
    let mut builder = RagConfig::builder();
    if let Some(dir) = &cli.storage_dir {
        builder = builder.storage_dir(dir);
    }
    if let Some(dir) = &cli.data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(dir) = &cli.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    if let Some(backend) = &cli.embedding_backend {
        builder = builder.embedding_backend(backend);
    }
    match &cli.command {
        Commands::Agent {
            max_iterations: Some(n),
            ..
        } => builder = builder.max_tool_iterations(*n),
        Commands::MultiDoc {
            top_k,
            max_iterations,
            ..
        } => {
            if let Some(k) = top_k {
                builder = builder.tool_top_k(*k);
            }
            if let Some(n) = max_iterations {
                builder = builder.max_tool_iterations(*n);
            }
        }
        Commands::Build { .. } => builder = builder.without_llm(),
        _ => {}
    }

    builder
        .from_env()
        .build()
        .map_err(|e| CommandError::ExecutionFailed(format!("Configuration error: {e}")).into())
}

/// Provider, prompts and tool factory shared by the query commands.
struct Components {
    provider: Arc<dyn LlmProvider>,
    prompts: Arc<PromptSet>,
    cache: IndexCache,
    factory: ToolFactory,
}

impl Components {
    fn new(config: &RagConfig) -> Result<Self> {
        let provider = create_provider(config)?;
        let embedder = create_embedder(config)?;
        let prompts = Arc::new(PromptSet::load(config.prompt_dir.as_deref()));
        let cache = IndexCache::new(config, embedder);
        let synthesizer = Synthesizer::new(Arc::clone(&provider), Arc::clone(&prompts), config);
        let factory = ToolFactory::new(cache.clone(), synthesizer, config.similarity_top_k);
        debug!(provider = provider.name(), storage = %cache.storage_dir().display(), "components ready");
        Ok(Self {
            provider,
            prompts,
            cache,
            factory,
        })
    }

    async fn doc_tools(&self, file: &Path) -> Result<(Arc<DocTool>, Arc<DocTool>)> {
        let document = Document::new(file);
        Ok(self.factory.doc_tools(&document, document.name()).await?)
    }
}

async fn repl<S: Session>(session: &mut S, out: &mut impl IoWrite) -> Result<String> {
    let stdin = BufReader::new(tokio::io::stdin());
    let interrupt = async {
        // No signal handler: never interrupt
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let exit = run_repl(session, stdin, out, interrupt).await?;
    if let ReplExit::Failed(message) = exit {
        debug!(%message, "session ended with error");
    }
    Ok(String::new())
}

// ==================== Sessions ====================

/// Routes every prompt to one tool.
struct RouterSession {
    engine: RouterQueryEngine,
}

#[async_trait]
impl Session for RouterSession {
    async fn respond(&mut self, prompt: &str) -> std::result::Result<String, AgentError> {
        let result = self.engine.query(prompt).await?;
        Ok(format!("{} \n", result.response.response))
    }
}

/// One function-calling request per prompt; prints source metadata.
struct ToolCallSession {
    provider: Arc<dyn LlmProvider>,
    settings: RequestSettings,
    tools: Vec<Arc<DocTool>>,
}

#[async_trait]
impl Session for ToolCallSession {
    async fn respond(&mut self, prompt: &str) -> std::result::Result<String, AgentError> {
        let output =
            predict_and_call(self.provider.as_ref(), &self.settings, &self.tools, prompt).await?;
        Ok(format_source_metadata(&output.source_nodes))
    }
}

/// Agent keeping its chat history across prompts.
struct AgentSession {
    runner: AgentRunner,
}

#[async_trait]
impl Session for AgentSession {
    async fn respond(&mut self, prompt: &str) -> std::result::Result<String, AgentError> {
        let response = self.runner.chat(prompt).await?;
        Ok(format!(
            "{}Summarizing the answer...\n {} \n",
            "-#-".repeat(10),
            response
        ))
    }
}

/// Stateless agent over retrieved tools.
struct MultiDocSession {
    runner: AgentRunner,
}

#[async_trait]
impl Session for MultiDocSession {
    async fn respond(&mut self, prompt: &str) -> std::result::Result<String, AgentError> {
        let response = self.runner.query(prompt).await?;
        Ok(format!("{response} \n"))
    }
}

/// One JSON object of node metadata per line.
fn format_source_metadata(nodes: &[crate::core::ScoredNode]) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}", serde_json::json!(node.node.metadata));
    }
    out
}

// ==================== Commands ====================

async fn cmd_router(config: &RagConfig, file: &Path, out: &mut impl IoWrite) -> Result<String> {
    let components = Components::new(config)?;
    let (vector, summary) = components.doc_tools(file).await?;

    let selector = LlmSingleSelector::new(
        Arc::clone(&components.provider),
        config.llm_model.clone(),
        components.prompts.selector.clone(),
    );
    let engine = RouterQueryEngine::new(Arc::new(selector), vec![summary, vector]);
    repl(&mut RouterSession { engine }, out).await
}

async fn cmd_tool_call(config: &RagConfig, file: &Path, out: &mut impl IoWrite) -> Result<String> {
    let components = Components::new(config)?;
    let (vector, summary) = components.doc_tools(file).await?;

    let mut session = ToolCallSession {
        provider: Arc::clone(&components.provider),
        settings: RequestSettings::from_config(config),
        tools: vec![vector, summary],
    };
    repl(&mut session, out).await
}

async fn cmd_agent(config: &RagConfig, file: &Path, out: &mut impl IoWrite) -> Result<String> {
    let components = Components::new(config)?;
    let (vector, summary) = components.doc_tools(file).await?;

    let runner = AgentRunner::new(
        Arc::clone(&components.provider),
        config,
        ToolSource::Static(vec![vector, summary]),
    );
    repl(&mut AgentSession { runner }, out).await
}

async fn cmd_multi_doc(
    config: &RagConfig,
    papers: &[String],
    out: &mut impl IoWrite,
) -> Result<String> {
    let components = Components::new(config)?;
    let paths = paper_paths(&config.data_dir, papers);

    let mut all_tools = Vec::with_capacity(paths.len() * 2);
    for path in &paths {
        writeln!(out, "Getting tools for paper: {}", path.display())?;
        out.flush()?;
        let (vector, summary) = components.doc_tools(path).await?;
        all_tools.push(vector);
        all_tools.push(summary);
    }

    let retriever = ToolRetriever::build(
        all_tools,
        Arc::clone(components.cache.embedder()),
        config.tool_top_k,
    )
    .await?;
    info!(tools = retriever.len(), top_k = config.tool_top_k, "tool retriever ready");

    let runner = AgentRunner::new(
        Arc::clone(&components.provider),
        config,
        ToolSource::Retriever(Arc::new(retriever)),
    )
    .with_system_prompt(components.prompts.multi_doc_agent.clone());
    repl(&mut MultiDocSession { runner }, out).await
}

async fn cmd_build(config: &RagConfig, files: &[PathBuf]) -> Result<String> {
    let embedder = create_embedder(config)?;
    let cache = IndexCache::new(config, embedder);

    let files = if files.is_empty() {
        pdfs_in(&config.data_dir)?
    } else {
        files.to_vec()
    };
    if files.is_empty() {
        return Err(CommandError::InvalidArgument(format!(
            "no PDF files found in {}",
            config.data_dir.display()
        ))
        .into());
    }

    let mut output = String::new();
    for file in &files {
        let document = Document::new(file);
        let (vector, _) = cache.load_document_indexes(&document).await?;
        let _ = writeln!(
            output,
            "{}: {} nodes ({})",
            document.name(),
            vector.nodes().len(),
            file.display()
        );
    }
    let _ = writeln!(output, "Indexed {} document(s)", files.len());
    Ok(output)
}

fn cmd_init_prompts(dir: Option<&Path>) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    if written.is_empty() {
        return Ok(format!(
            "All prompt templates already exist in: {}\n",
            target_dir.display()
        ));
    }

    let mut output = format!(
        "Wrote {} prompt template(s) to: {}\n",
        written.len(),
        target_dir.display()
    );
    for path in &written {
        let _ = writeln!(
            output,
            "  {}",
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
        );
    }
    output.push_str("\nEdit these files to customize synthesis, routing and agent prompts.\n");
    Ok(output)
}

/// Paper paths under `data_dir`, defaulting to the standard paper set.
fn paper_paths(data_dir: &Path, papers: &[String]) -> Vec<PathBuf> {
    if papers.is_empty() {
        DEFAULT_PAPERS.iter().map(|p| data_dir.join(p)).collect()
    } else {
        papers.iter().map(|p| data_dir.join(p)).collect()
    }
}

/// `--file` when given, otherwise the default paper in the data directory.
fn document_path(config: &RagConfig, file: Option<&Path>) -> PathBuf {
    file.map_or_else(|| config.data_dir.join(DEFAULT_DOCUMENT), Path::to_path_buf)
}

/// Every `.pdf` file directly under `dir`, sorted.
fn pdfs_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        CommandError::InvalidArgument(format!("cannot read {}: {e}", dir.display()))
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::core::{Node, PAGE_LABEL_KEY, ScoredNode};
    use tempfile::TempDir;

    #[test]
    fn test_paper_paths_default_set() {
        let paths = paper_paths(Path::new("data"), &[]);
        assert_eq!(paths.len(), 11);
        assert_eq!(paths[0], PathBuf::from("data/metagpt.pdf"));
        assert_eq!(paths[10], PathBuf::from("data/vr_mcl.pdf"));
    }

    #[test]
    fn test_document_path_follows_data_dir() {
        let config = RagConfig::builder()
            .api_key("sk-test")
            .data_dir("/srv/papers")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            document_path(&config, None),
            PathBuf::from("/srv/papers/metagpt.pdf")
        );
        assert_eq!(
            document_path(&config, Some(Path::new("other/longlora.pdf"))),
            PathBuf::from("other/longlora.pdf")
        );
    }

    #[test]
    fn test_paper_paths_explicit() {
        let paths = paper_paths(Path::new("papers"), &["selfrag.pdf".to_string()]);
        assert_eq!(paths, vec![PathBuf::from("papers/selfrag.pdf")]);
    }

    #[test]
    fn test_pdfs_in_sorted_and_filtered() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap_or_else(|_| unreachable!());
        }
        let files = pdfs_in(dir.path()).unwrap_or_else(|e| panic!("pdfs_in failed: {e}"));
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_format_source_metadata() {
        let nodes = vec![
            ScoredNode {
                node: Node::new("metagpt-p2-0", "a").with_metadata(PAGE_LABEL_KEY, "2"),
                score: Some(0.8),
            },
            ScoredNode {
                node: Node::new("metagpt-p3-1", "b").with_metadata(PAGE_LABEL_KEY, "3"),
                score: Some(0.7),
            },
        ];
        assert_eq!(
            format_source_metadata(&nodes),
            "{\"page_label\":\"2\"}\n{\"page_label\":\"3\"}"
        );
    }

    #[test]
    fn test_init_prompts_writes_once() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let first = cmd_init_prompts(Some(dir.path()))
            .unwrap_or_else(|e| panic!("init-prompts failed: {e}"));
        assert!(first.starts_with("Wrote 5 prompt template(s)"));
        assert!(first.contains("selector.md"));

        let second = cmd_init_prompts(Some(dir.path()))
            .unwrap_or_else(|e| panic!("init-prompts failed: {e}"));
        assert!(second.starts_with("All prompt templates already exist"));
    }
}
