//! Translation of provider records into a readable report, along with the cf-dns.sh invocations
//! that would recreate or delete each of them.

use chrono::NaiveDateTime;
use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter, Write as _};
use std::io;

use crate::api::{DNSType, Record};
use crate::error::Error;

/// The record management script the emitted command lines are meant for
pub const COMPANION_SCRIPT: &str = "cf-dns.sh";

/// How the zone name is removed from a record name before it is handed to cf-dns.sh
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NameStrip {
    /// Strip `.<domain>` only when the name ends with it
    Suffix,
    /// Strip the first occurrence of `.<domain>`, wherever it is in the name
    FirstOccurrence,
}

/// Whether, and how, the record as returned by the API is dumped in the report
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RawJson {
    Omit,
    Compact,
    Pretty,
}

/// What to do with a record the translator cannot make sense of
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OnMalformed {
    Abort,
    Skip,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RenderOptions {
    pub raw: RawJson,
    pub strip: NameStrip,
    pub on_malformed: OnMalformed,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            raw: RawJson::Omit,
            strip: NameStrip::Suffix,
            on_malformed: OnMalformed::Abort,
        }
    }
}

/// Line closing the block of every record cf-dns.sh can handle
pub fn separator() -> String {
    "* ".repeat(50)
}

/// Remove the zone part of `name`, e.g. `dkim._domainkey.example.com` in zone `example.com`
/// gives `dkim._domainkey`. The apex itself (`example.com`) is left untouched, as it doesn't
/// contain `.example.com`.
pub fn normalize_name<'a>(name: &'a str, domain: &str, strip: NameStrip) -> Cow<'a, str> {
    let zone_suffix = format!(".{}", domain);
    match strip {
        NameStrip::Suffix => match name.strip_suffix(zone_suffix.as_str()) {
            Some(local) => Cow::Borrowed(local),
            None => Cow::Borrowed(name),
        },
        NameStrip::FirstOccurrence => match name.find(&zone_suffix) {
            Some(pos) => Cow::Owned(format!(
                "{}{}",
                &name[..pos],
                &name[pos + zone_suffix.len()..]
            )),
            None => Cow::Borrowed(name),
        },
    }
}

/// Wrap `value` in single quotes so the shell passes it as one word
pub fn quote(value: &str) -> String {
    format!("'{}'", value)
}

/// The two cf-dns.sh invocations of a record
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Commands {
    /// Creates the record, or updates it when it already exists
    pub upsert: String,
    pub delete: String,
}

/// Build the cf-dns.sh command lines for `record`, the `index`-th of the zone.
/// Returns `None` for record types the script doesn't handle.
pub fn commands(record: &Record, index: usize, strip: NameStrip) -> Result<Option<Commands>, Error> {
    let dns_type = match record.dns_type() {
        Some(t) => t,
        None => return Ok(None),
    };

    let name = normalize_name(&record.name, &record.domain, strip);
    let content = if dns_type == DNSType::TXT {
        Cow::Owned(quote(&record.content))
    } else {
        Cow::Borrowed(record.content.as_str())
    };
    let target = format!(
        "./{} -d {} -t {} -n {} -c {}",
        COMPANION_SCRIPT, record.domain, record.record_type, name, content
    );

    let mut upsert = target.clone();
    if dns_type == DNSType::MX {
        let priority = record.priority.ok_or_else(|| Error::MalformedRecord {
            index,
            reason: "missing field `priority` on a MX record".into(),
        })?;
        let _ = write!(upsert, " -p {}", priority);
    }
    if record.proxiable {
        upsert.push_str(if record.proxied { " -x Y" } else { " -x N" });
    }
    let _ = write!(upsert, " -l {}", record.ttl);
    if !record.comment().is_empty() {
        let _ = write!(upsert, " -C {}", quote(record.comment()));
    }
    upsert.push_str(" [-k] [-S] [-A]");

    let delete = format!("{} -Z [-a] [-k] [-S]", target);

    Ok(Some(Commands { upsert, delete }))
}

fn capitalized(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}

/// The fixed-field description of `record`
pub fn summary(record: &Record) -> String {
    let mut out = format!(
        "Domain: {}\nType: {}\nName: {}\nContent: {}\n",
        record.domain, record.record_type, record.name, record.content
    );
    if let Some(priority) = record.priority {
        let _ = writeln!(out, "Priority: {}", priority);
    }
    let _ = write!(
        out,
        "Proxiable: {}\nProxied: {}\nTTL: {}\nComment: {}\nModified: {}\n",
        capitalized(record.proxiable),
        capitalized(record.proxied),
        record.ttl,
        record.comment(),
        record.modified_on
    );
    out
}

// `{"a": 1, "b": [1, 2]}` rather than serde_json's tighter `{"a":1,"b":[1,2]}`
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Serialize a raw record with its keys sorted, `None` when raw output is off
pub fn raw_json(raw: &Value, style: RawJson) -> Result<Option<String>, Error> {
    let sorted = sort_keys(raw);
    let dump = match style {
        RawJson::Omit => return Ok(None),
        RawJson::Pretty => serde_json::to_string_pretty(&sorted)?,
        RawJson::Compact => {
            let mut buf = Vec::new();
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
            sorted.serialize(&mut ser)?;
            String::from_utf8_lossy(&buf).into_owned()
        }
    };
    Ok(Some(dump))
}

/// Render the block of the `index`-th record out of `total`. `zone` stands in for the record
/// domain when the API left it out.
pub fn render_record(
    index: usize,
    total: usize,
    raw: &Value,
    zone: &str,
    options: &RenderOptions,
) -> Result<String, Error> {
    let record = Record::from_value(index, raw, zone)?;

    let mut block = format!("Record: {}/{}\n\n", index, total);
    if let Some(dump) = raw_json(raw, options.raw)? {
        block.push_str(&dump);
        block.push_str("\n\n");
    }
    block.push_str(&summary(&record));

    match commands(&record, index, options.strip)? {
        Some(cmds) => {
            let _ = write!(
                block,
                "{}\n{}\n\n{}\n",
                cmds.upsert,
                cmds.delete,
                separator()
            );
        }
        None => {
            let _ = write!(
                block,
                "* * * Type '{}' records are not handled by the script: {} * * *\n\n",
                record.record_type, COMPANION_SCRIPT
            );
        }
    }
    Ok(block)
}

/// Every rendered block of a zone, in the order the API returned the records.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Report {
    pub generated: NaiveDateTime,
    pub blocks: Vec<String>,
    /// Ordinals of the malformed records left out
    pub skipped: Vec<usize>,
}

impl Report {
    pub fn header(&self) -> String {
        format!(
            "Generated on {} at {}\n\n",
            self.generated.format("%d/%m/%Y"),
            self.generated.format("%H:%M:%S")
        )
    }

    /// The report without its generation header
    pub fn body(&self) -> String {
        self.blocks.concat()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.header())?;
        for block in &self.blocks {
            f.write_str(block)?;
        }
        Ok(())
    }
}

/// Render `records`, listed from `zone`, into a report stamped with `generated`.
pub fn render_report(
    records: &[Value],
    zone: &str,
    generated: NaiveDateTime,
    options: &RenderOptions,
) -> Result<Report, Error> {
    let total = records.len();
    let mut report = Report {
        generated,
        blocks: Vec::with_capacity(total),
        skipped: Vec::new(),
    };

    for (i, raw) in records.iter().enumerate() {
        let index = i + 1;
        match render_record(index, total, raw, zone, options) {
            Ok(block) => report.blocks.push(block),
            Err(e @ Error::MalformedRecord { .. }) if options.on_malformed == OnMalformed::Skip => {
                warn!("skipping {}", e);
                report.skipped.push(index);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}
