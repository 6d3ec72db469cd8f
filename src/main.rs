//! auto-pr - CLI entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use auto_pr::git::probe::{base_branch, ensure_repository};
use auto_pr::git::remote::detect_platform;
use auto_pr::git::status::snapshot;
use auto_pr::git::{
    ChangeSummary, GitCli, check_git_installed, compare, history, working_tree_summary,
};
use auto_pr::pr::gather_pr_context;

/// Analyze a git working copy and prepare pull request context.
#[derive(Parser, Debug)]
#[command(name = "auto-pr")]
#[command(about = "Analyze a git working copy and prepare pull request context")]
#[command(version)]
struct Cli {
    /// Path to the repository
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Timeout in seconds for each git query (overrides AUTO_PR_GIT_TIMEOUT)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show branch, remote, working tree state, and divergence
    Status,

    /// List recent commits with the files they touched
    Log {
        /// Number of commits to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Summarize staged and unstaged changes
    Changes {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compare the current branch with its base
    Compare {
        /// Base branch (defaults to the detected base)
        #[arg(long)]
        base: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print pull request context as JSON
    Context {
        /// Base branch (defaults to the detected base)
        #[arg(long)]
        base: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    check_git_installed().context("git is required")?;

    let mut git = GitCli::new(&cli.repo);
    if let Some(secs) = cli.timeout {
        git = git.with_timeout(Duration::from_secs(secs));
    }

    match cli.command {
        Command::Status => run_status(&git).await,
        Command::Log { limit } => run_log(&git, limit).await,
        Command::Changes { json } => run_changes(&git, json).await,
        Command::Compare { base, json } => run_compare(&git, base, json).await,
        Command::Context { base } => run_context(&git, base).await,
    }
}

async fn run_status(git: &GitCli) -> Result<()> {
    let snap = snapshot(git, git.repo_path())
        .await
        .context("Failed to read repository status")?;

    println!("Branch:  {}", snap.identity.current_branch);
    println!("Base:    {}", snap.identity.base_branch);
    match &snap.identity.remote_url {
        Some(url) => {
            println!("Remote:  {}", url);
            println!("Platform: {}", detect_platform(url));
        }
        None => println!("Remote:  (none configured)"),
    }

    println!();
    if snap.has_changes {
        println!("Staged:    {}", snap.files.staged.len());
        println!("Unstaged:  {}", snap.files.unstaged.len());
        println!("Untracked: {}", snap.files.untracked.len());
    } else {
        println!("Working tree clean");
    }

    if let Some(d) = snap.divergence {
        println!(
            "{} ahead, {} behind {}",
            d.ahead, d.behind, snap.identity.base_branch
        );
    }

    // History failures degrade to a message.
    match history(git, 5).await {
        Ok(commits) if !commits.is_empty() => {
            println!("\nRecent commits:");
            for commit in &commits {
                println!("  {} {}", commit.short_hash(), commit.message);
            }
        }
        Ok(_) => println!("\nNo commits yet"),
        Err(e) => {
            tracing::warn!("Failed to read history: {}", e);
            println!("\nNo commits found");
        }
    }

    Ok(())
}

async fn run_log(git: &GitCli, limit: usize) -> Result<()> {
    ensure_repository(git.repo_path())?;
    let commits = history(git, limit).await.context("Failed to read history")?;

    for commit in &commits {
        println!(
            "{} {} <{}> {}",
            commit.short_hash(),
            commit.author,
            commit.email,
            commit.timestamp.format("%Y-%m-%d %H:%M")
        );
        println!("    {}", commit.message);
        for file in &commit.files {
            println!("      {}", file);
        }
    }

    Ok(())
}

async fn run_changes(git: &GitCli, json: bool) -> Result<()> {
    ensure_repository(git.repo_path())?;
    let summary = working_tree_summary(git)
        .await
        .context("Failed to summarize working tree changes")?;

    print_summary(&summary, json)
}

async fn run_compare(git: &GitCli, base: Option<String>, json: bool) -> Result<()> {
    ensure_repository(git.repo_path())?;
    let base = match base {
        Some(b) => b,
        None => base_branch(git).await.context("Failed to detect base branch")?,
    };

    let summary = compare(git, &base)
        .await
        .with_context(|| format!("Failed to compare against {}", base))?;

    if !json {
        println!("Changes since {}:", base);
    }
    print_summary(&summary, json)
}

async fn run_context(git: &GitCli, base: Option<String>) -> Result<()> {
    let ctx = gather_pr_context(git, git.repo_path(), base.as_deref())
        .await
        .context("Failed to gather pull request context")?;

    if !ctx.has_changes() {
        eprintln!(
            "No changes between {} and {}",
            ctx.base_ref, ctx.identity.current_branch
        );
    }

    println!("{}", serde_json::to_string_pretty(&ctx)?);
    Ok(())
}

fn print_summary(summary: &ChangeSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    if summary.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    for file in &summary.files {
        let binary = if file.is_binary { " (binary)" } else { "" };
        println!(
            "  {:<10} {} +{} -{}{}",
            file.status.to_string(),
            file.path,
            file.additions,
            file.deletions,
            binary
        );
    }
    println!(
        "{} files changed, {} insertions(+), {} deletions(-)",
        summary.total_files, summary.additions, summary.deletions
    );

    Ok(())
}
