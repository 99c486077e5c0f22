use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use nodeflow_collaborator::GeminiClient;
use nodeflow_config::WorkflowDef;
use nodeflow_runtime::{Runtime, RuntimeConfig};
use nodeflow_workflow::Workflow;

/// nodeflow - run AI node graphs from the command line
#[derive(Parser)]
#[command(name = "nodeflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Deadline in milliseconds for nodes without their own timeout
  #[arg(long, global = true)]
  timeout_ms: Option<u64>,

  /// Memory limit in bytes for each Code node
  #[arg(long, global = true)]
  code_memory_limit: Option<usize>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow or a single node
  Run {
    #[command(subcommand)]
    target: RunTarget,
  },
}

#[derive(Subcommand)]
enum RunTarget {
  /// Run an entire workflow
  Workflow {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Run a single node from a workflow in isolation
  Node {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// The node ID to execute
    #[arg(long)]
    node: String,

    /// Input text for the node (read from stdin when omitted)
    #[arg(long)]
    input: Option<String>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nodeflow=info,warn")),
    )
    .with_writer(io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();

  let config = RuntimeConfig {
    default_timeout_ms: cli.timeout_ms,
    code_memory_limit: cli.code_memory_limit,
  };

  match cli.command {
    Some(Commands::Run { target }) => match target {
      RunTarget::Workflow { workflow_file } => {
        run_workflow(workflow_file, config)?;
      }
      RunTarget::Node {
        workflow_file,
        node,
        input,
      } => {
        run_node(workflow_file, node, input, config)?;
      }
    },
    None => {
      println!("nodeflow - use --help to see available commands");
    }
  }

  Ok(())
}

fn run_workflow(workflow_file: PathBuf, config: RuntimeConfig) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_workflow_async(workflow_file, config).await })
}

async fn run_workflow_async(workflow_file: PathBuf, config: RuntimeConfig) -> Result<()> {
  let workflow = load_workflow(&workflow_file).await?;
  eprintln!(
    "Loaded workflow: {} ({} nodes, {} edges)",
    workflow.name,
    workflow.nodes().len(),
    workflow.edges().len()
  );

  let runtime = Runtime::new(workflow, Arc::new(collaborator()), config);

  // Ctrl-C cancels the run; nodes that already finished keep their state.
  let cancel = CancellationToken::new();
  let ctrl_c = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      ctrl_c.cancel();
    }
  });

  let result = runtime.run(cancel).await;

  let states: BTreeMap<_, _> = runtime.node_states().into_iter().collect();

  println!("{}", serde_json::to_string_pretty(&states)?);

  let report = result.context("workflow execution failed")?;
  eprintln!("Execution completed: {}", report.execution_id);
  eprintln!("Nodes executed: {}", report.executed.len());

  Ok(())
}

fn run_node(
  workflow_file: PathBuf,
  node_id: String,
  input: Option<String>,
  config: RuntimeConfig,
) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_node_async(workflow_file, node_id, input, config).await })
}

async fn run_node_async(
  workflow_file: PathBuf,
  node_id: String,
  input: Option<String>,
  config: RuntimeConfig,
) -> Result<()> {
  let workflow = load_workflow(&workflow_file).await?;

  let node = workflow
    .get_node(&node_id)
    .with_context(|| format!("node '{}' not found in workflow", node_id))?;
  eprintln!("Running node: {} (type: {})", node.display_name(), node.kind.name());

  let input = match input {
    Some(input) => input,
    None => read_input_from_stdin()?,
  };

  let runtime = Runtime::new(workflow, Arc::new(collaborator()), config);
  let invocation = runtime
    .invoke_node(&node_id, &input, CancellationToken::new())
    .await
    .context("node execution failed")?;

  eprintln!("Node execution completed");
  if let Some(tokens) = invocation.token_count {
    eprintln!("Tokens: {}", tokens);
  }
  for source in invocation.sources.iter().flatten() {
    eprintln!("Source: {} <{}>", source.title, source.uri);
  }

  match invocation.output {
    Some(output) => println!("{}", serde_json::to_string_pretty(&output)?),
    None => println!("null"),
  }

  Ok(())
}

fn collaborator() -> GeminiClient {
  let client = GeminiClient::from_env();
  if !client.is_configured() {
    eprintln!("Warning: no Gemini API key (GEMINI_API_KEY or API_KEY), AI nodes will fail");
  }
  client
}

async fn load_workflow(workflow_file: &Path) -> Result<Workflow> {
  let workflow_content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  parse_workflow(&workflow_content)
    .with_context(|| format!("failed to load workflow file: {}", workflow_file.display()))
}

fn parse_workflow(content: &str) -> Result<Workflow> {
  let workflow_def: WorkflowDef = serde_json::from_str(content).context("failed to parse workflow")?;
  Workflow::try_from(workflow_def).context("invalid workflow")
}

fn read_input_from_stdin() -> Result<String> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, run with empty input
    return Ok(String::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read input from stdin")?;

  Ok(input.trim_end_matches('\n').to_string())
}
