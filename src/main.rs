use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use vigil_core::{ReviewSession, VigilConfig};
use vigil_review::budget::HeuristicEstimator;
use vigil_review::github::{parse_pr_reference, GitHubClient};
use vigil_review::llm::LlmClient;
use vigil_review::pipeline::{PacingPolicy, ReviewPipeline};

use vigil_bot::server;

type BotPipeline = ReviewPipeline<GitHubClient, LlmClient, GitHubClient>;

#[derive(Parser)]
#[command(
    name = "vigil",
    version,
    about = "AI pull request review bot",
    long_about = "Vigil reviews GitHub pull requests with an LLM and posts the findings\n\
                   as diff-anchored review comments.\n\n\
                   Examples:\n  \
                     vigil serve                       Run the webhook server\n  \
                     vigil serve --port 9090           Run on a custom port\n  \
                     vigil review octocat/hello#42 --sha abc123\n                                       \
                     Review one PR without a webhook"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .vigil.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the GitHub webhook server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Review a single pull request without a webhook
    Review {
        /// PR reference in owner/repo#number form
        pr: String,

        /// Head commit SHA to anchor comments on
        #[arg(long)]
        sha: String,

        /// Skip the pacing delay between generation calls
        #[arg(long)]
        no_pacing: bool,
    },
}

fn build_pipeline(config: &VigilConfig, pacing: PacingPolicy) -> Result<BotPipeline> {
    let github = GitHubClient::new(&config.github).into_diagnostic()?;
    let llm = LlmClient::new(&config.llm).into_diagnostic()?;
    Ok(ReviewPipeline::new(
        github.clone(),
        llm,
        github,
        Box::new(HeuristicEstimator),
        pacing,
        config.review.prompt_token_limit,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => VigilConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = std::path::Path::new(".vigil.toml");
            if default_path.exists() {
                VigilConfig::from_file(default_path).into_diagnostic()?
            } else {
                VigilConfig::default()
            }
        }
    }
    .apply_env();

    match cli.command {
        Command::Serve { port, bind } => {
            let mut server_config = config.server.clone();
            if let Some(port) = port {
                server_config.port = port;
            }
            if let Some(bind) = bind {
                server_config.bind = bind;
            }

            let pacing =
                PacingPolicy::new(std::time::Duration::from_secs(config.review.pacing_secs));
            let pipeline = build_pipeline(&config, pacing)?;
            server::serve(&server_config, Arc::new(pipeline))
                .await
                .into_diagnostic()?;
        }
        Command::Review { pr, sha, no_pacing } => {
            let (owner, repo, pull_number) = parse_pr_reference(&pr).into_diagnostic()?;
            let session = ReviewSession {
                owner,
                repo,
                pull_number,
                commit_sha: sha,
            };

            let pacing = if no_pacing {
                PacingPolicy::none()
            } else {
                PacingPolicy::new(std::time::Duration::from_secs(config.review.pacing_secs))
            };
            let pipeline = build_pipeline(&config, pacing)?;
            let report = pipeline.run_session(&session).await.into_diagnostic()?;
            println!("{report}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::VigilError;

    #[test]
    fn vigil_errors_convert_to_cli_reports() {
        let result: std::result::Result<(), VigilError> =
            Err(VigilError::Config("missing GitHub token".into()));
        let report = result.into_diagnostic().unwrap_err();
        assert!(report.to_string().contains("missing GitHub token"));
    }

    #[test]
    fn build_pipeline_surfaces_config_errors() {
        let mut config = VigilConfig::default();
        config.github.token = Some("test-token".into());
        config.github.api_base = "not a uri".into();
        let err = build_pipeline(&config, PacingPolicy::none()).unwrap_err();
        assert!(err.to_string().contains("invalid GitHub API base"));
    }
}
