use crate::auth::credential::CredentialCache;
use crate::auth::prompt::Prompter;
use crate::auth::{Credential, Identity};
use crate::config::Config;
use crate::error::Result;
use crate::interrupt;
use crate::rest::UserEndpoint;

/// Username/password (or token) authentication over HTTPS.
///
/// A credential comes from the cache or from the user, is checked against
/// the API and only then approved into the cache. If anything fails on the
/// way the cache is cleared, so it never holds a credential that wasn't
/// validated.
pub struct HttpsAuthenticator<'a, C, P, A> {
    config: &'a Config,
    cache: C,
    prompter: P,
    api: A,
}

impl<'a, C, P, A> HttpsAuthenticator<'a, C, P, A>
where
    C: CredentialCache,
    P: Prompter,
    A: UserEndpoint,
{
    pub fn new(config: &'a Config, cache: C, prompter: P, api: A) -> Self {
        Self {
            config,
            cache,
            prompter,
            api,
        }
    }

    pub async fn authenticate(&self, org: &str) -> Result<Identity> {
        self.cache.prepare()?;
        let _attempt = interrupt::https_attempt();
        match self.attempt(org).await {
            Ok(identity) => Ok(identity),
            Err(e) => {
                tracing::info!("https authentication failed, clearing cached credential");
                forget(&self.cache);
                Err(e)
            }
        }
    }

    async fn attempt(&self, org: &str) -> Result<Identity> {
        let credential = match self.cache.fill()? {
            Some(credential) => {
                tracing::info!("using cached credential for {}", credential.username);
                credential
            }
            None => Credential {
                username: self
                    .prompter
                    .username(&format!("Username for {}: ", self.config.host))?,
                password: self
                    .prompter
                    .password(&format!("Personal access token for {}: ", self.config.host))?,
            },
        };

        let response = self.api.current_user(&credential).await?;
        // the API's spelling, which also covers logins by email address
        let credential = Credential {
            username: response.login()?,
            ..credential
        };

        self.cache.approve(&credential, org)?;
        Ok(Identity::https(
            &credential.username,
            &credential.password,
            org,
            self.config,
        ))
    }
}

/// Best-effort removal of the cached credential and the keychain entry.
pub fn forget(cache: &impl CredentialCache) {
    if let Err(e) = cache.erase() {
        tracing::debug!("erasing credential cache: {}", e);
    }
    if let Err(e) = cache.erase_keychain() {
        tracing::debug!("erasing keychain entry: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::rest::UserResponse;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeCache {
        cached: Option<Credential>,
        fail_approve: bool,
        fail_erase: bool,
        calls: RefCell<Vec<String>>,
        approved: RefCell<Vec<Credential>>,
    }

    impl CredentialCache for &FakeCache {
        fn prepare(&self) -> Result<()> {
            self.calls.borrow_mut().push("prepare".to_owned());
            Ok(())
        }

        fn fill(&self) -> Result<Option<Credential>> {
            self.calls.borrow_mut().push("fill".to_owned());
            Ok(self.cached.clone())
        }

        fn approve(&self, credential: &Credential, org: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("approve {org}"));
            if self.fail_approve {
                return Err(Error::Authentication("cache broke".to_owned()));
            }
            self.approved.borrow_mut().push(credential.clone());
            Ok(())
        }

        fn erase(&self) -> Result<()> {
            self.calls.borrow_mut().push("erase".to_owned());
            if self.fail_erase {
                return Err(Error::Authentication("no daemon".to_owned()));
            }
            Ok(())
        }

        fn erase_keychain(&self) -> Result<()> {
            self.calls.borrow_mut().push("erase_keychain".to_owned());
            Err(Error::Authentication("no keychain helper".to_owned()))
        }
    }

    struct FakePrompter {
        username: &'static str,
        interrupt: bool,
        asked: RefCell<usize>,
        during_attempt: RefCell<Vec<bool>>,
    }

    impl FakePrompter {
        fn new(username: &'static str) -> Self {
            Self {
                username,
                interrupt: false,
                asked: RefCell::new(0),
                during_attempt: RefCell::new(Vec::new()),
            }
        }
    }

    impl Prompter for &FakePrompter {
        fn username(&self, _prompt: &str) -> Result<String> {
            *self.asked.borrow_mut() += 1;
            self.during_attempt
                .borrow_mut()
                .push(interrupt::https_in_progress());
            Ok(self.username.to_owned())
        }

        fn password(&self, _prompt: &str) -> Result<String> {
            *self.asked.borrow_mut() += 1;
            if self.interrupt {
                return Err(Error::Interrupted);
            }
            Ok("typed-token".to_owned())
        }
    }

    struct FakeApi {
        response: UserResponse,
        seen: RefCell<Vec<Credential>>,
    }

    impl FakeApi {
        fn new(status: u16, otp_required: bool, body: &str) -> Self {
            Self {
                response: UserResponse {
                    status,
                    otp_required,
                    body: body.to_owned(),
                    ..Default::default()
                },
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl UserEndpoint for &FakeApi {
        async fn current_user(&self, credential: &Credential) -> Result<UserResponse> {
            self.seen.borrow_mut().push(credential.clone());
            Ok(self.response.clone())
        }
    }

    fn cached(username: &str, password: &str) -> Option<Credential> {
        Some(Credential {
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }

    fn calls(cache: &FakeCache) -> Vec<String> {
        cache.calls.borrow().clone()
    }

    #[async_std::test]
    async fn cached_credential_skips_prompt() {
        let config = Config::new();
        let cache = FakeCache {
            cached: cached("octo", "ghp_cached"),
            ..Default::default()
        };
        let prompter = FakePrompter::new("unused");
        let api = FakeApi::new(200, false, r#"{"login":"octo"}"#);

        let id = HttpsAuthenticator::new(&config, &cache, &prompter, &api)
            .authenticate("me50")
            .await
            .unwrap();

        assert_eq!(id.name, "octo");
        assert_eq!(id.password.as_deref(), Some("ghp_cached"));
        assert_eq!(id.remote, "https://octo@github.com/me50/octo");
        assert_eq!(*prompter.asked.borrow(), 0);
        assert_eq!(calls(&cache), vec!["prepare", "fill", "approve me50"]);
    }

    #[async_std::test]
    async fn prompted_username_is_canonicalised_before_caching() {
        let config = Config::new();
        let cache = FakeCache::default();
        let prompter = FakePrompter::new("Octo@Example.com");
        let api = FakeApi::new(200, false, r#"{"login":"octo"}"#);

        let id = HttpsAuthenticator::new(&config, &cache, &prompter, &api)
            .authenticate("me50")
            .await
            .unwrap();

        assert_eq!(id.name, "octo");
        assert_eq!(id.email, "octo@users.noreply.github.com");
        assert_eq!(api.seen.borrow()[0].username, "Octo@Example.com");
        assert_eq!(
            *cache.approved.borrow(),
            vec![Credential {
                username: "octo".to_owned(),
                password: "typed-token".to_owned()
            }]
        );
        assert_eq!(*prompter.asked.borrow(), 2);
    }

    #[async_std::test]
    async fn rejected_credential_is_erased() {
        let config = Config::new();
        let cache = FakeCache {
            cached: cached("octo", "stale"),
            ..Default::default()
        };
        let prompter = FakePrompter::new("octo");
        let api = FakeApi::new(401, false, r#"{"message":"Bad credentials"}"#);

        let err = HttpsAuthenticator::new(&config, &cache, &prompter, &api)
            .authenticate("me50")
            .await
            .unwrap_err();

        assert!(
            matches!(err, Error::Authentication(ref m) if m == "Invalid username and/or password.")
        );
        assert_eq!(calls(&cache), vec!["prepare", "fill", "erase", "erase_keychain"]);
        assert!(cache.approved.borrow().is_empty());
    }

    #[async_std::test]
    async fn two_factor_short_circuits() {
        let config = Config::new();
        let cache = FakeCache::default();
        let prompter = FakePrompter::new("octo");
        let api = FakeApi::new(401, true, "");

        let err = HttpsAuthenticator::new(&config, &cache, &prompter, &api)
            .authenticate("me50")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(ref m) if m.contains("two-factor")));
        assert!(calls(&cache).contains(&"erase".to_owned()));
    }

    #[async_std::test]
    async fn approve_failure_erases_and_keeps_original_error() {
        let config = Config::new();
        let cache = FakeCache {
            fail_approve: true,
            fail_erase: true,
            ..Default::default()
        };
        let prompter = FakePrompter::new("octo");
        let api = FakeApi::new(200, false, r#"{"login":"octo"}"#);

        let err = HttpsAuthenticator::new(&config, &cache, &prompter, &api)
            .authenticate("me50")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(ref m) if m == "cache broke"));
        assert_eq!(
            calls(&cache),
            vec!["prepare", "fill", "approve me50", "erase", "erase_keychain"]
        );
    }

    #[async_std::test]
    async fn interrupt_during_password_entry_erases() {
        let config = Config::new();
        let cache = FakeCache::default();
        let prompter = FakePrompter {
            interrupt: true,
            ..FakePrompter::new("octo")
        };
        let api = FakeApi::new(200, false, r#"{"login":"octo"}"#);

        let err = HttpsAuthenticator::new(&config, &cache, &prompter, &api)
            .authenticate("me50")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Interrupted));
        assert!(api.seen.borrow().is_empty());
        assert_eq!(calls(&cache), vec!["prepare", "fill", "erase", "erase_keychain"]);
        assert_eq!(*prompter.during_attempt.borrow(), vec![true]);
    }
}
