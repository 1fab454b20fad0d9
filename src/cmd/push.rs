use crate::cmd::{Context, auth, connect};
use crate::error::Result;
use crate::git::check_dependencies;
use colored::Colorize;

/// Everything up to the point where files would be staged and pushed.
pub async fn run(ctx: &Context, slug: &str, tool: &str, org: Option<&str>, offline: bool) -> Result<()> {
    check_dependencies(&ctx.git)?;
    let tool_config = connect::connect(ctx, slug, tool, offline).await?;
    let org = match org {
        Some(org) => org.to_owned(),
        None => slug.split('/').next().unwrap_or_default().to_owned(),
    };
    let identity = auth::authenticate(ctx, &org).await?;
    auth::print(&identity);
    println!("Ready to push {} to {}", slug.cyan(), identity.remote.bold());
    tracing::debug!("{} config: {:?}", tool, tool_config);
    Ok(())
}
