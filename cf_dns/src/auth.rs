use curl::easy::List;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Error;

/// Which of the two authentication schemes of the provider to use
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AuthMode {
    /// Account email along with the global API key
    LegacyKey,
    /// Scoped API token
    Token,
}

/// The secrets read from the credential file, immutable once loaded.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    LegacyKey { email: String, key: String },
    Token(String),
}

// Never print the secrets themselves
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Credentials::LegacyKey { email, .. } => {
                write!(f, "LegacyKey {{ email: {:?}, key: <redacted> }}", email)
            }
            Credentials::Token(_) => write!(f, "Token(<redacted>)"),
        }
    }
}

impl Credentials {
    /// Read the credentials of `provider` from the JSON file at `path`.
    /// The file holds an object keyed by provider name, e.g.
    /// `{"cloudflare": {"email": "...", "key": "..."}}` or `{"cloudflare": {"token": "..."}}`.
    pub fn load(path: &Path, provider: &str, mode: AuthMode) -> Result<Credentials, Error> {
        let file = File::open(path).map_err(|source| Error::CredentialFile {
            path: path.to_path_buf(),
            source,
        })?;
        let providers: Map<String, Value> = serde_json::from_reader(BufReader::new(file))?;
        Credentials::from_providers(&providers, provider, mode)
    }

    pub(crate) fn from_providers(
        providers: &Map<String, Value>,
        provider: &str,
        mode: AuthMode,
    ) -> Result<Credentials, Error> {
        let section = providers
            .get(provider)
            .ok_or_else(|| Error::MissingCredential(provider.into()))?;
        let field = |name: &str| -> Result<String, Error> {
            section
                .get(name)
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or_else(|| Error::MissingCredential(format!("{}.{}", provider, name)))
        };

        match mode {
            AuthMode::LegacyKey => Ok(Credentials::LegacyKey {
                email: field("email")?,
                key: field("key")?,
            }),
            AuthMode::Token => Ok(Credentials::Token(field("token")?)),
        }
    }
}

/// Header set sent along every request to the provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeaders(Vec<(String, String)>);

impl AuthHeaders {
    pub fn new(credentials: &Credentials) -> AuthHeaders {
        let mut headers = match credentials {
            Credentials::LegacyKey { email, key } => vec![
                ("X-Auth-Email".to_string(), email.clone()),
                ("X-Auth-Key".to_string(), key.clone()),
            ],
            Credentials::Token(token) => {
                vec![("Authorization".to_string(), format!("Bearer {}", token))]
            }
        };
        headers.push(("Content-Type".into(), "application/json".into()));
        AuthHeaders(headers)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Convert into the "Name: value" list curl expects
    pub fn to_list(&self) -> Result<List, curl::Error> {
        let mut list = List::new();
        for (name, value) in self.iter() {
            list.append(&format!("{}: {}", name, value))?;
        }
        Ok(list)
    }
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(name, _)| name))
            .finish()
    }
}
