use std::path::Path;

use reqwest::Url;

use crate::error::CoreError;

/// HTTP basic-auth credentials for the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Credentials {
    pub(super) user: String,
    pub(super) pass: String,
}

impl Credentials {
    /// Read a Bitcoin Core `.cookie` file (`username:password` on the first
    /// line).
    fn from_cookie_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!(
                "failed to read rpc cookie file {}: {e}",
                path.display()
            ))
        })?;
        let line = content
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or_else(|| {
                CoreError::Config(format!("rpc cookie file {} is empty", path.display()))
            })?;

        match line.split_once(':') {
            Some((user, pass)) if !user.is_empty() && !pass.is_empty() => Ok(Self {
                user: user.to_owned(),
                pass: pass.to_owned(),
            }),
            _ => Err(CoreError::Config(format!(
                "rpc cookie file {} must contain non-empty `username:password`",
                path.display()
            ))),
        }
    }
}

/// Pick credentials in precedence order: explicit user + pass, then the
/// cookie file, then none. A lone user or pass is a configuration error.
pub(super) fn resolve_auth(
    user: Option<&str>,
    pass: Option<&str>,
    cookie_file: Option<&Path>,
) -> Result<Option<Credentials>, CoreError> {
    match (user, pass, cookie_file) {
        (Some(user), Some(pass), _) => Ok(Some(Credentials {
            user: user.to_owned(),
            pass: pass.to_owned(),
        })),
        (Some(_), None, _) | (None, Some(_), _) => Err(CoreError::Config(
            "both rpc user and rpc pass must be set together".to_owned(),
        )),
        (None, None, Some(path)) => Credentials::from_cookie_file(path).map(Some),
        (None, None, None) => Ok(None),
    }
}

/// Validate the node endpoint. Only plain HTTP(S) JSON-RPC is supported.
pub(super) fn parse_connection(connection: &str) -> Result<Url, CoreError> {
    let parsed = Url::parse(connection).map_err(|e| {
        CoreError::Config(format!(
            "invalid connection `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(CoreError::Config(format!(
            "unsupported connection scheme `{other}`; expected http or https"
        ))),
    }
}
