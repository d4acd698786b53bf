use log::debug;
use serde::Deserializer;
use serde_derive::*;
use serde_json::Value;

use crate::error::Error;
use crate::net::*;

/// Page size requested when following pages of records
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Envelope wrapping every answer of the provider API.
#[derive(Deserialize, Debug)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<Message>,
    pub result: Option<T>,
    pub result_info: Option<ResultInfo>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Message {
    pub code: i64,
    pub message: String,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ResultInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning `success: false` into an error
    pub fn into_result(self) -> Result<Option<T>, Error> {
        if !self.success {
            let messages: Vec<String> = self
                .errors
                .iter()
                .map(|e| format!("({}) {}", e.code, e.message))
                .collect();
            return Err(Error::Unsuccessful(if messages.is_empty() {
                "the API reported an unsuccessful request".into()
            } else {
                messages.join(", ")
            }));
        }
        Ok(self.result)
    }
}

/// A DNS zone, as known by the provider.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// The record types cf-dns.sh knows how to manage
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum DNSType {
    A,
    AAAA,
    CNAME,
    MX,
    TXT,
}

impl DNSType {
    /// Case-insensitive lookup, `None` for any type the companion script doesn't handle
    pub fn from_name(name: &str) -> Option<DNSType> {
        [
            DNSType::A,
            DNSType::AAAA,
            DNSType::CNAME,
            DNSType::MX,
            DNSType::TXT,
        ]
        .iter()
        .copied()
        .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DNSType::A => "A",
            DNSType::AAAA => "AAAA",
            DNSType::CNAME => "CNAME",
            DNSType::MX => "MX",
            DNSType::TXT => "TXT",
        }
    }
}

// Some zones answer with `"zone_name": null`, or leave it out altogether.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = <Option<String> as serde::Deserialize>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// A DNS entry, as returned by the record listing endpoint.
/// The type is kept verbatim, as the provider spelled it.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    #[serde(rename = "zone_name", default, deserialize_with = "null_as_empty")]
    pub domain: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub priority: Option<u16>,
    pub proxiable: bool,
    pub proxied: bool,
    pub ttl: u32,
    #[serde(default)]
    pub comment: Option<String>,
    pub modified_on: String,
}

impl Record {
    /// Decode the `index`-th (1-based) raw record of `zone`.
    /// Records lacking `zone_name` inherit the name of the zone they were listed from.
    pub fn from_value(index: usize, raw: &Value, zone: &str) -> Result<Record, Error> {
        let mut record: Record =
            serde_json::from_value(raw.clone()).map_err(|e| Error::MalformedRecord {
                index,
                reason: e.to_string(),
            })?;
        if record.domain.is_empty() {
            record.domain = zone.to_string();
        }
        Ok(record)
    }

    pub fn dns_type(&self) -> Option<DNSType> {
        DNSType::from_name(&self.record_type)
    }

    /// The comment, or the empty string when the API returned null
    pub fn comment(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }
}

/// How many pages of records to request
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Paging {
    /// A single request, leaving the page size to the provider
    Single,
    /// Follow `result_info.total_pages` until every page was fetched
    All { per_page: u32 },
}

/// Resolve `domain` into the zone holding it. When several zones share the name, the first one
/// wins.
pub fn resolve_zone(endpoint: &Endpoint, domain: &str) -> Result<Zone, Error> {
    let envelope: Envelope<Vec<Zone>> =
        execute_query(endpoint, "/zones", &[QueryParam("name", domain)], parse_json)?;
    let zones = envelope.into_result()?.unwrap_or_default();
    debug!("{} zone(s) named {}", zones.len(), domain);
    zones
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoZone(domain.into()))
}

/// Return the records of `zone` as raw JSON objects, in the order the API listed them.
pub fn list_records(endpoint: &Endpoint, zone: &Zone, paging: Paging) -> Result<Vec<Value>, Error> {
    let url = format!("/zones/{}/dns_records", zone.id);
    let records = match paging {
        Paging::Single => {
            let envelope: Envelope<Vec<Value>> = execute_query(endpoint, &url, &[], parse_json)?;
            envelope.into_result()?.unwrap_or_default()
        }
        Paging::All { per_page } => {
            let per_page = per_page.to_string();
            let mut records = Vec::new();
            let mut page: u32 = 1;
            loop {
                let page_str = page.to_string();
                let params = [QueryParam("page", &page_str), QueryParam("per_page", &per_page)];
                let envelope: Envelope<Vec<Value>> =
                    execute_query(endpoint, &url, &params, parse_json)?;
                let total_pages = envelope.result_info.map_or(1, |info| info.total_pages);
                let batch = envelope.into_result()?.unwrap_or_default();
                debug!("page {}/{}: {} record(s)", page, total_pages, batch.len());
                let exhausted = batch.is_empty() || page >= total_pages;
                records.extend(batch);
                if exhausted {
                    break;
                }
                page += 1;
            }
            records
        }
    };
    debug!("{} record(s) in zone {}", records.len(), zone.name);
    Ok(records)
}
