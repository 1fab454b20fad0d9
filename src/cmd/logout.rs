use crate::auth::credential::{CredentialCache, GitCredentialCache};
use crate::cmd::Context;
use crate::error::Result;

/// Drops whatever push50's credential cache holds.
pub fn run(ctx: &Context) -> Result<()> {
    GitCredentialCache::new(&ctx.git, &ctx.config).erase()?;
    println!("Logged out.");
    Ok(())
}
