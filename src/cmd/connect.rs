use crate::cmd::Context;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::GitBranches;
use crate::progress::ProgressBar;
use crate::rest::{ContentSource, RawContent};
use crate::slug::{BranchLister, Slug};
use crate::yaml::{ProjectConfig, ToolConfig};
use std::path::Path;

/// Resolves `slug`, fetches its config (merged over the repository root's
/// if there is one) and checks that the files `tool` requires are in `dir`.
pub async fn connect_with(
    config: &Config,
    slug: &str,
    tool: &str,
    offline: bool,
    branches: &impl BranchLister,
    source: &impl ContentSource,
    dir: &Path,
) -> Result<ToolConfig> {
    let slug = Slug::resolve(slug, offline, branches)?;
    tracing::debug!("{} is {} in {}/{}", slug.slug, slug.branch, slug.org, slug.repo);
    let file = &config.config_file;
    let problem_file = format!("{}/{}", slug.problem.display(), file);

    let content = source
        .fetch(&slug.org, &slug.repo, &slug.branch, &problem_file)
        .await?;
    let local = parse(&content, file)?;
    if local.tool(tool).is_none() {
        return Err(not_for(tool));
    }

    let merged = match source.fetch(&slug.org, &slug.repo, &slug.branch, file).await {
        Ok(root) => ProjectConfig::merge(&local, &parse(&root, file)?),
        Err(e) => {
            tracing::debug!("no {} at the root of {}/{}: {}", file, slug.org, slug.repo, e);
            local
        }
    };

    let tool_config = merged.tool(tool).ok_or_else(|| not_for(tool))?;
    tool_config.check_required(dir)?;
    Ok(tool_config)
}

pub async fn connect(ctx: &Context, slug: &str, tool: &str, offline: bool) -> Result<ToolConfig> {
    let _progress = ProgressBar::start("Connecting");
    let branches = GitBranches {
        git: &ctx.git,
        config: &ctx.config,
    };
    let dir = std::env::current_dir()?;
    connect_with(
        &ctx.config,
        slug,
        tool,
        offline,
        &branches,
        &RawContent::new(&ctx.config),
        &dir,
    )
    .await
}

pub async fn run(ctx: &Context, slug: &str, tool: &str, offline: bool, exclude: bool) -> Result<()> {
    let tool_config = connect(ctx, slug, tool, offline).await?;
    if exclude {
        println!("{}", tool_config.exclude(&std::env::current_dir()?));
    } else {
        print!("{}", tool_config.to_yaml()?);
    }
    Ok(())
}

fn not_for(tool: &str) -> Error {
    Error::InvalidSlug(format!(
        "Invalid slug for {tool}. Did you mean something else?"
    ))
}

fn parse(content: &[u8], file: &str) -> Result<ProjectConfig> {
    ProjectConfig::parse(content).map_err(|e| {
        tracing::debug!("{}: {}", file, e);
        Error::Submission(format!(
            "Could not read {file}. Did you mean to submit something else?"
        ))
    })
}
