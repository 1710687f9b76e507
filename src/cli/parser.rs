//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Papers loaded by `multi-doc` when none are named.
pub const DEFAULT_PAPERS: [&str; 11] = [
    "metagpt.pdf",
    "longlora.pdf",
    "loftq.pdf",
    "swebench.pdf",
    "selfrag.pdf",
    "zipformer.pdf",
    "values.pdf",
    "finetune_fair_diffusion.pdf",
    "knowledge_card.pdf",
    "metra.pdf",
    "vr_mcl.pdf",
];

/// Paper used by the single-document commands when `--file` is absent,
/// looked up in the data directory.
pub const DEFAULT_DOCUMENT: &str = "metagpt.pdf";

/// Agentic RAG over PDF papers.
///
/// Builds per-document vector and summary indexes, wraps them as tools,
/// and answers questions through an LLM router, a single function call,
/// or a function-calling agent.
#[derive(Parser, Debug)]
#[command(name = "agentic-rag")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Root directory for persisted indexes.
    ///
    /// Defaults to `./storage`.
    #[arg(short, long, global = true, env = "AGENTIC_RAG_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Directory holding the source PDFs.
    ///
    /// Defaults to `data`.
    #[arg(short, long, global = true, env = "AGENTIC_RAG_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory containing prompt template overrides.
    #[arg(long, global = true, env = "AGENTIC_RAG_PROMPT_DIR")]
    pub prompt_dir: Option<PathBuf>,

    /// Embedding backend: openai, fastembed, hash.
    #[arg(long, global = true, env = "AGENTIC_RAG_EMBEDDING_BACKEND")]
    pub embedding_backend: Option<String>,

    /// Enable verbose output (debug logging).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask questions through an LLM router over one paper.
    ///
    /// Each prompt is routed to either the summary tool or the vector tool.
    #[command(after_help = r#"Examples:
  agentic-rag router                          # <data-dir>/metagpt.pdf
  agentic-rag router --file data/selfrag.pdf  # another paper
"#)]
    Router {
        /// PDF to answer over. Defaults to `metagpt.pdf` in the data directory.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Let the model call a tool once per prompt and print the sources.
    ///
    /// Prints the metadata of every node the tool answered from.
    #[command(name = "tool-call")]
    #[command(after_help = r#"Examples:
  agentic-rag tool-call
  agentic-rag -v tool-call --file data/longlora.pdf   # show function calls
"#)]
    ToolCall {
        /// PDF to answer over. Defaults to `metagpt.pdf` in the data directory.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Chat with a function-calling agent over one paper.
    ///
    /// The agent keeps the conversation across prompts.
    #[command(after_help = r#"Examples:
  agentic-rag agent
  agentic-rag agent --max-iterations 5
"#)]
    Agent {
        /// PDF to answer over. Defaults to `metagpt.pdf` in the data directory.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Maximum tool-calling rounds per prompt.
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Query an agent over many papers, retrieving tools per prompt.
    #[command(name = "multi-doc")]
    #[command(after_help = r#"Examples:
  agentic-rag multi-doc                              # the 11 default papers
  agentic-rag multi-doc metagpt.pdf swebench.pdf -k 2
"#)]
    MultiDoc {
        /// Paper file names under the data directory.
        papers: Vec<String>,

        /// Tools retrieved per prompt.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Maximum tool-calling rounds per prompt.
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Build (or load) the indexes of papers without starting a session.
    #[command(after_help = r#"Examples:
  agentic-rag build                      # every PDF in the data directory
  agentic-rag build data/metagpt.pdf
"#)]
    Build {
        /// PDFs to index. Defaults to every PDF in the data directory.
        files: Vec<PathBuf>,
    },

    /// Write the default prompt templates to a directory.
    ///
    /// Existing files are left untouched.
    #[command(name = "init-prompts")]
    #[command(after_help = r#"Examples:
  agentic-rag init-prompts                     # ~/.config/agentic-rag/prompts/
  agentic-rag init-prompts --dir ./my-prompts
"#)]
    InitPrompts {
        /// Target directory for prompt templates.
        ///
        /// Defaults to `~/.config/agentic-rag/prompts/`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Whether the command talks to the LLM in a prompt loop.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        matches!(
            self.command,
            Commands::Router { .. }
                | Commands::ToolCall { .. }
                | Commands::Agent { .. }
                | Commands::MultiDoc { .. }
        )
    }
}
