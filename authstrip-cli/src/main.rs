mod config;
mod explain;
mod verify;

use anyhow::Context;
use authstrip_core::adapters::FsSourceStore;
use authstrip_core::settings::RunSettings;
use authstrip_render::{render_summary_md, render_summary_text};
use authstrip_rules::PolicyMode;
use authstrip_types::summary::ToolInfo;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{CliOverrides, ConfigMerger};
use fs_err as fs;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "authstrip",
    version,
    about = "Rewrites a backend's authentication checks into a local single-user mode."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan a tree and rewrite recognized authentication constructs.
    Run(RunArgs),
    /// List the rules that a run would apply.
    ListRules(ListRulesArgs),
    /// Explain what a builtin rule matches and what it writes instead.
    Explain(ExplainArgs),
    /// Set KEY=VALUE entries in a dotenv-style file.
    EnvSet(EnvSetArgs),
}

#[derive(Debug, clap::Args)]
struct ConfigArgs {
    /// Root directory to scan (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Config file (default: <root>/authstrip.toml when present).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Access policy for rewritten call sites.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// User id that permissive replacements resolve to.
    #[arg(long)]
    user_id: Option<String>,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[command(flatten)]
    common: ConfigArgs,

    /// Report what would change without writing any file.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Print a unified diff of every changed file.
    #[arg(long, default_value_t = false)]
    diff: bool,

    /// Additional file extension to scan (repeatable).
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Additional directory name to skip (repeatable).
    #[arg(long)]
    exclude: Vec<String>,

    /// Summary format on stdout.
    #[arg(long, value_enum, default_value = "text")]
    format: SummaryFormat,

    /// Also write the JSON summary to this path.
    #[arg(long)]
    report: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct ListRulesArgs {
    #[command(flatten)]
    common: ConfigArgs,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Rule id to explain (e.g. "thread-access-check").
    rule: String,
}

#[derive(Debug, Parser)]
struct EnvSetArgs {
    /// Env file to update.
    #[arg(long)]
    file: Utf8PathBuf,

    /// Create the file if it does not exist.
    #[arg(long, default_value_t = false)]
    create: bool,

    /// Entries to set, as KEY=VALUE.
    #[arg(required = true, num_args = 1..)]
    pairs: Vec<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PolicyArg {
    Permissive,
    Enforcing,
}

impl From<PolicyArg> for PolicyMode {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Permissive => PolicyMode::Permissive,
            PolicyArg::Enforcing => PolicyMode::Enforcing,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SummaryFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn real_main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::ListRules(args) => cmd_list_rules(args),
        Command::Explain(args) => cmd_explain(args),
        Command::EnvSet(args) => cmd_env_set(args),
    }
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "authstrip".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}

fn merged_config(
    common: &ConfigArgs,
    extensions: &[String],
    exclude: &[String],
) -> anyhow::Result<config::MergedConfig> {
    let file_config = config::load_or_default(&common.root, common.config.as_deref())
        .context("load authstrip.toml config")?;
    let overrides = CliOverrides {
        policy: common.policy.map(PolicyMode::from),
        user_id: common.user_id.clone(),
        extensions: extensions.to_vec(),
        exclude: exclude.to_vec(),
    };
    ConfigMerger::new(file_config).merge(&overrides)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let merged = merged_config(&args.common, &args.extensions, &args.exclude)?;
    let registry = merged.registry()?;

    let settings = RunSettings {
        root: args.common.root.clone(),
        scan: merged.scan,
        dry_run: args.dry_run,
        collect_patch: args.diff,
    };
    debug!("run settings: {:?}", settings);

    let outcome = authstrip_core::run(&settings, &registry, &FsSourceStore, tool_info())?;

    if let Some(path) = &args.report {
        write_json(path, &outcome.summary)?;
        info!("wrote report to {}", path);
    }

    if args.diff && !outcome.patch.is_empty() {
        print!("{}", outcome.patch);
    }

    match args.format {
        SummaryFormat::Text => print!("{}", render_summary_text(&outcome.summary)),
        SummaryFormat::Markdown => print!("{}", render_summary_md(&outcome.summary)),
        SummaryFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome.summary)?)
        }
    }

    if let Some(check) = &merged.verify {
        match verify::verify_setting(&args.common.root, check) {
            Some(warning) => warn!("{}", warning),
            None => info!("{} contains `{}`", check.file, check.contains),
        }
    }
    Ok(())
}

fn cmd_list_rules(args: ListRulesArgs) -> anyhow::Result<()> {
    let merged = merged_config(&args.common, &[], &[])?;
    let registry = merged.registry()?;

    match args.format {
        OutputFormat::Text => print!("{}", explain::rule_list_text(&registry)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&explain::rule_list_json(&registry))?
        ),
    }
    Ok(())
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    print!("{}", explain::explain_rule(&args.rule)?);
    Ok(())
}

fn cmd_env_set(args: EnvSetArgs) -> anyhow::Result<()> {
    let updates = config::parse_env_pairs(&args.pairs)?;
    let merge = authstrip_edit::update_env_file(&args.file, &updates, args.create)
        .with_context(|| format!("update env file {}", args.file))?;

    for key in &merge.updated {
        println!("Updated {key}");
    }
    for key in &merge.added {
        println!("Added {key}");
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;
    }
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json).with_context(|| format!("write {}", path))?;
    Ok(())
}
