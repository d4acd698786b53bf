use crate::auth::AuthHeaders;
use crate::error::{APIError, Error};
use curl::easy::Easy;
use log::debug;

/// Holds a (key, value) tuple appended to the query string of a request
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QueryParam<'a>(pub &'a str, pub &'a str);

/// Base URL of the provider API along with the headers every request carries.
#[derive(Clone, Debug)]
pub struct Endpoint {
    pub base_url: String,
    pub headers: AuthHeaders,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, headers: AuthHeaders) -> Endpoint {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Endpoint { base_url, headers }
    }
}

/// Generate a GET query using curl easy interface.
/// This will request `api_endpoint` below the base url, with `params` url-encoded in the query
/// string and the authentication headers of `endpoint`.
pub fn make_query(
    endpoint: &Endpoint,
    api_endpoint: &str,
    params: &[QueryParam],
) -> Result<(Easy, String), curl::Error> {
    let mut easy = Easy::new();

    let mut url = format!("{}{}", endpoint.base_url, api_endpoint);
    if !params.is_empty() {
        // the params.len()*25 is just a very rough heuristic
        let mut query = String::with_capacity(params.len() * 25);
        for p in params {
            let entry = format!(
                "{}={}&",
                easy.url_encode(p.0.as_bytes()),
                easy.url_encode(p.1.as_bytes())
            );
            query.push_str(&entry);
        }
        // delete the last '&'
        query.pop();
        url.push('?');
        url.push_str(&query);
    }
    easy.url(&url)?;
    easy.get(true)?;
    easy.http_headers(endpoint.headers.to_list()?)?;
    Ok((easy, url))
}

/// Generate and execute a GET query to `api_endpoint`, then hand the body to `parse`.
/// Any status outside of 2xx/3xx is returned as an `Error::ApiError` holding the raw body.
pub fn execute_query<T, F, I: Into<Error>>(
    endpoint: &Endpoint,
    api_endpoint: &str,
    params: &[QueryParam],
    parse: F,
) -> Result<T, Error>
where
    F: Fn(&[u8]) -> Result<T, I>,
{
    let (mut req, url) = make_query(endpoint, api_endpoint, params)?;
    debug!("GET {}", url);

    let mut buf = Vec::new();
    {
        let mut transfer = req.transfer();
        transfer.write_function(|data| {
            buf.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    let res_code = req.response_code()?;
    debug!("Response Status: {} ({} bytes)", res_code, buf.len());
    if res_code < 200 || res_code >= 400 {
        return Err(Error::ApiError(APIError {
            url,
            status_code: res_code,
            body: buf,
        }));
    }

    parse(&buf).map_err(Into::into)
}

/// Return the json object parsed as a Rust object of type T
pub fn parse_json<T>(data: &[u8]) -> Result<T, serde_json::Error>
where
    for<'de> T: serde::Deserialize<'de>,
{
    serde_json::from_slice(data)
}
