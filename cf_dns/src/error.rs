use serde_derive::*;
use std::fmt::{self, Debug, Display, Formatter};
use std::path::PathBuf;

/// Returned when the provider answers with an HTTP error code. The body is kept as-is so that the
/// provider diagnostic can be extracted from it.
pub struct APIError {
    pub url: String,
    pub body: Vec<u8>,
    pub status_code: u32,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize, Debug)]
struct ErrorEntry {
    code: i64,
    message: String,
    #[serde(default)]
    error_chain: Vec<ErrorEntry>,
}

impl APIError {
    /// The provider's explanation for the failure, when the body carries one.
    /// A 400 means the credentials are malformed, and the first entry of the error chain says
    /// which header is at fault. A 403 means well-formed but wrong credentials.
    pub fn diagnostic(&self) -> Option<String> {
        let body: ErrorBody = serde_json::from_slice(&self.body).ok()?;
        let first = body.errors.first()?;
        match self.status_code {
            400 => Some(match first.error_chain.first() {
                Some(cause) => format!(
                    "({}) {}, ({}) {}",
                    first.code, first.message, cause.code, cause.message
                ),
                None => format!("({}) {}", first.code, first.message),
            }),
            403 => Some(format!("({}) {}", first.code, first.message)),
            _ => None,
        }
    }
}

impl Display for APIError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.diagnostic() {
            Some(msg) => write!(f, "{}", msg),
            None => write!(f, "HTTP {} for url: {}", self.status_code, self.url),
        }
    }
}

impl Debug for APIError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let body_str = String::from_utf8_lossy(&self.body);
        let body = if body_str.chars().count() > 150 {
            let head: String = body_str.chars().take(100).collect();
            let tail: String = {
                let mut tail: Vec<char> = body_str.chars().rev().take(50).collect();
                tail.reverse();
                tail.into_iter().collect()
            };
            format!("{}...OUTPUT TRUNCATED...{}", head, tail)
        } else {
            body_str.into_owned()
        };
        write!(
            f,
            "API Error(url = '{}', status_code = '{}', body = '{}')",
            self.url, self.status_code, &body
        )
    }
}

/// The various errors that may stop the report, ranging from a bad credential file to HTTP
/// failures and records the translator cannot make sense of.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Network error or invalid query
    #[error("HTTP query error: {0}")]
    CurlError(#[from] curl::Error),
    /// JSON parsing error
    #[error("parsing error: {0}")]
    SerdeError(#[from] serde_json::Error),
    /// Writing the report failed
    #[error("{0}")]
    IoError(#[from] std::io::Error),
    /// The remote endpoint returned a HTTP error code
    #[error("{0}")]
    ApiError(APIError),
    /// The provider answered 2xx but flagged the request as unsuccessful
    #[error("{0}")]
    Unsuccessful(String),
    /// The credential file couldn't be opened
    #[error("{}: {}", .path.display(), .source)]
    CredentialFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The credential file lacks what the selected authentication mode needs
    #[error("missing credential '{0}' in the credential file")]
    MissingCredential(String),
    /// The domain isn't part of the account
    #[error("no zone named '{0}' found in this account")]
    NoZone(String),
    /// A record lacks a field the translator needs, or carries one of the wrong type
    #[error("malformed record {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
    /// The report file couldn't be created or written
    #[error("{}: {}", .path.display(), .source)]
    ReportFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// No directory to write the report to
    #[error("unable to determine the home directory")]
    NoHomeDir,
}
