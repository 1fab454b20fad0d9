use crate::auth::credential::GitCredentialCache;
use crate::auth::https::HttpsAuthenticator;
use crate::auth::prompt::TerminalPrompter;
use crate::auth::ssh::SshAuthenticator;
use crate::auth::Identity;
use crate::cmd::Context;
use crate::error::Result;
use crate::progress::ProgressBar;
use crate::rest::UserApi;
use colored::Colorize;
use std::future::Future;

/// SSH if the host knows one of the user's keys, HTTPS otherwise.
pub async fn authenticate(ctx: &Context, org: &str) -> Result<Identity> {
    let ssh = {
        let _progress = ProgressBar::start("Authenticating");
        SshAuthenticator::new(&ctx.config).try_authenticate(org)
    };
    let https = HttpsAuthenticator::new(
        &ctx.config,
        GitCredentialCache::new(&ctx.git, &ctx.config),
        TerminalPrompter::new(),
        UserApi::new(&ctx.config),
    );
    prefer_ssh(ssh, https.authenticate(org)).await
}

/// `https` is only polled when SSH gave nothing.
pub async fn prefer_ssh(
    ssh: Option<Identity>,
    https: impl Future<Output = Result<Identity>>,
) -> Result<Identity> {
    match ssh {
        Some(identity) => Ok(identity),
        None => https.await,
    }
}

pub fn print(identity: &Identity) {
    let method = if identity.password.is_some() { "https" } else { "ssh" };
    println!("{} {}", identity.name.cyan(), format!("({method})").magenta());
    println!("  email:  {}", identity.email);
    println!("  remote: {}", identity.remote);
}

pub async fn run(ctx: &Context, org: &str) -> Result<()> {
    let identity = authenticate(ctx, org).await?;
    print(&identity);
    Ok(())
}
