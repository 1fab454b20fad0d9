use crate::auth::Credential;
use crate::config::Config;
use crate::error::{Error, Result, TransportError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

/// Raw file contents of a hosted repository.
#[allow(async_fn_in_trait)]
pub trait ContentSource {
    async fn fetch(&self, org: &str, repo: &str, branch: &str, path: &str) -> Result<Vec<u8>>;
}

/// Unauthenticated `GET {protocol}://{host}/{org}/{repo}/raw/{branch}/{path}`.
pub struct RawContent {
    base: String,
}

impl RawContent {
    pub fn new(config: &Config) -> Self {
        Self {
            base: format!("{}://{}", config.protocol, config.host),
        }
    }

    pub fn url(&self, org: &str, repo: &str, branch: &str, path: &str) -> String {
        format!("{}/{}/{}/raw/{}/{}", self.base, org, repo, branch, path)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let mut res = surf::get(url).await?;
        if !res.status().is_success() {
            return Err(TransportError::Status(res.status().into()));
        }
        Ok(res.body_bytes().await?)
    }
}

impl ContentSource for RawContent {
    async fn fetch(&self, org: &str, repo: &str, branch: &str, path: &str) -> Result<Vec<u8>> {
        let url = self.url(org, repo, branch, path);
        tracing::debug!("GET {}", url);
        self.get(&url).await.map_err(|e| {
            tracing::debug!("{}: {}", url, e);
            Error::Submission("Invalid slug. Did you mean to submit something else?".to_owned())
        })
    }
}

/// What the hosting API said about a set of credentials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserResponse {
    pub status: u16,
    pub otp_required: bool,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Deserialize)]
struct User {
    login: String,
}

impl UserResponse {
    /// Canonical login if the credentials were accepted.
    pub fn login(&self) -> Result<String> {
        // checked before the status: the API answers 401 with this header set
        if self.otp_required {
            return Err(Error::Authentication(
                "Looks like you have two-factor authentication enabled! \
                 Please generate a personal access token and use it as your password. \
                 See https://help.github.com/articles/creating-a-personal-access-token-for-the-command-line for more info."
                    .to_owned(),
            ));
        }
        if !(200..300).contains(&self.status) {
            tracing::debug!("{:?}", self.headers);
            tracing::debug!("{}", self.body);
            let msg = if self.status == 401 {
                "Invalid username and/or password."
            } else {
                "Could not authenticate user."
            };
            return Err(Error::Authentication(msg.to_owned()));
        }
        let user: User = serde_json::from_str(&self.body).map_err(|e| {
            tracing::debug!("unexpected user body: {}", e);
            Error::Authentication("Could not authenticate user.".to_owned())
        })?;
        Ok(user.login)
    }
}

/// The hosting API's "who am I" endpoint.
#[allow(async_fn_in_trait)]
pub trait UserEndpoint {
    async fn current_user(&self, credential: &Credential) -> Result<UserResponse>;
}

pub struct UserApi {
    url: String,
    otp_header: String,
}

impl UserApi {
    pub fn new(config: &Config) -> Self {
        Self {
            url: format!("{}/user", config.api_url.trim_end_matches('/')),
            otp_header: config.otp_header.to_ascii_lowercase(),
        }
    }

    fn is_otp_header(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        name == self.otp_header || (name.starts_with("x-") && name.ends_with("-otp"))
    }
}

fn user_body(url: &str, body: surf::Result<String>) -> Result<String> {
    body.map_err(|e| {
        tracing::debug!("reading body of {}: {}", url, e);
        Error::Authentication("Could not authenticate user.".to_owned())
    })
}

impl UserEndpoint for UserApi {
    async fn current_user(&self, credential: &Credential) -> Result<UserResponse> {
        let token = STANDARD.encode(format!("{}:{}", credential.username, credential.password));
        tracing::debug!("GET {}", self.url);
        let mut res = surf::get(&self.url)
            .header("Authorization", format!("Basic {token}"))
            .await
            .map_err(|e| {
                tracing::debug!("{}: {}", self.url, e);
                Error::Authentication("Could not authenticate user.".to_owned())
            })?;
        let headers: Vec<(String, String)> = res
            .iter()
            .map(|(name, values)| (name.as_str().to_owned(), values.as_str().to_owned()))
            .collect();
        let otp_required = headers.iter().any(|(name, _)| self.is_otp_header(name));
        let body = user_body(&self.url, res.body_string().await)?;
        Ok(UserResponse {
            status: res.status().into(),
            otp_required,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, otp_required: bool, body: &str) -> UserResponse {
        UserResponse {
            status,
            otp_required,
            body: body.to_owned(),
            ..Default::default()
        }
    }

    fn auth_message(r: Result<String>) -> String {
        match r {
            Err(Error::Authentication(msg)) => msg,
            other => panic!("expected Authentication error, got {other:?}"),
        }
    }

    #[test]
    fn raw_url_layout() {
        let raw = RawContent::new(&Config::new());
        assert_eq!(
            raw.url("cs50", "problems", "2024/fall", "hello/.cs50.yaml"),
            "https://github.com/cs50/problems/raw/2024/fall/hello/.cs50.yaml"
        );
    }

    #[test]
    fn user_endpoint_url() {
        let conf = Config {
            api_url: "https://ghe.example/api/v3/".to_owned(),
            ..Config::new()
        };
        assert_eq!(UserApi::new(&conf).url, "https://ghe.example/api/v3/user");
    }

    #[test]
    fn otp_header_names() {
        let api = UserApi::new(&Config::new());
        assert!(api.is_otp_header("X-GitHub-OTP"));
        assert!(api.is_otp_header("x-github-otp"));
        assert!(api.is_otp_header("X-Gitea-OTP"));
        assert!(!api.is_otp_header("X-RateLimit-Limit"));
    }

    #[test]
    fn login_is_canonicalised_from_body() {
        let r = response(200, false, r#"{"login": "Octocat", "id": 1}"#);
        assert_eq!(r.login().unwrap(), "Octocat");
    }

    #[test]
    fn two_factor_wins_over_status() {
        for status in [200, 401, 500] {
            let msg = auth_message(response(status, true, "").login());
            assert!(msg.contains("two-factor"), "{msg}");
        }
    }

    #[test]
    fn rejected_credentials() {
        assert_eq!(
            auth_message(response(401, false, "").login()),
            "Invalid username and/or password."
        );
        assert_eq!(
            auth_message(response(403, false, "").login()),
            "Could not authenticate user."
        );
    }

    #[test]
    fn malformed_body_is_an_authentication_failure() {
        assert_eq!(
            auth_message(response(200, false, "<html>").login()),
            "Could not authenticate user."
        );
    }

    #[test]
    fn unreadable_body_is_an_authentication_failure() {
        let failed = Err(surf::Error::from_str(
            surf::StatusCode::InternalServerError,
            "connection reset",
        ));
        assert_eq!(
            auth_message(user_body("https://api.github.com/user", failed)),
            "Could not authenticate user."
        );
        assert_eq!(
            user_body("https://api.github.com/user", Ok("{}".to_owned())).unwrap(),
            "{}"
        );
    }
}
