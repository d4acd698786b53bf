use chrono::Local;
use clap::{App, Arg, ArgMatches};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process;

use cf_dns::auth::{AuthHeaders, AuthMode, Credentials};
use cf_dns::error::Error;
use cf_dns::net::Endpoint;
use cf_dns::output::{deliver, Sink};
use cf_dns::render::{render_report, NameStrip, OnMalformed, RawJson, RenderOptions};
use cf_dns::*;

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("get_dns")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Get all DNS records for a given domain (-d/--domain)")
        .arg(
            Arg::with_name("domain")
                .short("d")
                .long("domain")
                .takes_value(true)
                .required(true)
                .help("the domain to target"),
        )
        .arg(
            Arg::with_name("key")
                .short("k")
                .long("key")
                .help("use legacy API key to authenticate"),
        )
        .arg(
            Arg::with_name("pretty")
                .short("p")
                .long("pretty")
                .help("pretty-print raw JSON data in output (requires -r/--raw)"),
        )
        .arg(
            Arg::with_name("raw")
                .short("r")
                .long("raw")
                .help("include raw JSON data in output"),
        )
        .arg(
            Arg::with_name("screen")
                .short("s")
                .long("screen")
                .help("send output to screen"),
        )
        .arg(
            Arg::with_name("auth file")
                .short("f")
                .long("auth-file")
                .takes_value(true)
                .default_value("auth.json")
                .help("JSON file holding the credentials"),
        )
        .arg(
            Arg::with_name("output dir")
                .short("o")
                .long("output-dir")
                .takes_value(true)
                .conflicts_with("screen")
                .help("directory the report file is written to (default: home directory)"),
        )
        .arg(
            Arg::with_name("api url")
                .long("api-url")
                .takes_value(true)
                .env("CF_API_URL")
                .default_value(API_URL)
                .help("base URL of the Cloudflare API"),
        )
        .arg(
            Arg::with_name("strip mode")
                .long("strip-mode")
                .takes_value(true)
                .possible_values(&["suffix", "substring"])
                .default_value("suffix")
                .help("how the domain is removed from record names in commands"),
        )
        .arg(
            Arg::with_name("skip malformed")
                .long("skip-malformed")
                .help("leave malformed records out of the report instead of aborting"),
        )
        .arg(
            Arg::with_name("all pages")
                .long("all-pages")
                .help("follow every page of records instead of only the first one"),
        )
}

fn render_options(matches: &ArgMatches) -> RenderOptions {
    RenderOptions {
        raw: match (matches.is_present("raw"), matches.is_present("pretty")) {
            (false, _) => RawJson::Omit,
            (true, false) => RawJson::Compact,
            (true, true) => RawJson::Pretty,
        },
        strip: match matches.value_of("strip mode") {
            Some("substring") => NameStrip::FirstOccurrence,
            _ => NameStrip::Suffix,
        },
        on_malformed: if matches.is_present("skip malformed") {
            OnMalformed::Skip
        } else {
            OnMalformed::Abort
        },
    }
}

fn sink(matches: &ArgMatches) -> Result<Sink, Error> {
    if matches.is_present("screen") {
        return Ok(Sink::Screen);
    }
    let dir = match matches.value_of("output dir") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir().ok_or(Error::NoHomeDir)?,
    };
    Ok(Sink::File(dir))
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    // clap enforces both of these
    let domain = matches.value_of("domain").unwrap_or_default();
    let auth_file = Path::new(matches.value_of("auth file").unwrap_or("auth.json"));
    let mode = if matches.is_present("key") {
        AuthMode::LegacyKey
    } else {
        AuthMode::Token
    };

    let credentials = Credentials::load(auth_file, PROVIDER, mode)?;
    debug!("loaded {:?} from {}", credentials, auth_file.display());
    let endpoint = Endpoint::new(
        matches.value_of("api url").unwrap_or(API_URL),
        AuthHeaders::new(&credentials),
    );
    let sink = sink(matches)?;

    let zone = resolve_zone(&endpoint, domain)?;
    info!("zone {} has id {}", zone.name, zone.id);

    let paging = if matches.is_present("all pages") {
        Paging::All {
            per_page: DEFAULT_PAGE_SIZE,
        }
    } else {
        Paging::Single
    };
    let records = list_records(&endpoint, &zone, paging)?;

    let now = Local::now().naive_local();
    let report = render_report(&records, &zone.name, now, &render_options(matches))?;
    if !report.skipped.is_empty() {
        info!("{} malformed record(s) left out", report.skipped.len());
    }

    if let Some(path) = deliver(&report, domain, &sink, now)? {
        println!("Output written to {}", path.display());
    }
    Ok(())
}

fn main() {
    // RUST_LOG controls verbosity, logs go to stderr
    env_logger::init();

    let matches = app().get_matches();
    if let Err(e) = run(&matches) {
        eprintln!("* * * ERROR: {} * * *", e);
        process::exit(1);
    }
}
