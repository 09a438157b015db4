use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use dns_stub::{LookupConfig, LookupSession, SharedCache, UdpTransport};
use dns_types::hosts::Hosts;
use dns_types::protocol::types::{
    DomainName, QueryType, RecordClass, RecordType, ResourceRecord,
};

fn print_section(heading: &str, rrs: &[ResourceRecord]) {
    if rrs.is_empty() {
        return;
    }

    println!("\n;; {heading}");
    for rr in rrs {
        println!("{rr}");
    }
}

// the doc comments for this struct turn into the CLI help text
#[derive(Parser)]
/// DNS stub lookup utility: resolve a name by asking a recursive
/// server, following CNAME / DNAME redirections, and applying a
/// search path and hosts file like the system resolver would.
struct Args {
    /// Domain name to resolve.  A name without a trailing dot is
    /// combined with the search path
    #[clap(value_parser)]
    domain: DomainName,

    /// Query type to resolve
    #[clap(default_value_t = QueryType::Record(RecordType::A), value_parser)]
    qtype: QueryType,

    /// Recursive server to query
    #[clap(short, long, value_parser, default_value = "127.0.0.1")]
    server: IpAddr,

    /// Port to query the server on
    #[clap(short, long, value_parser, default_value_t = 53)]
    port: u16,

    /// Search-path suffix for unqualified names, can be specified
    /// more than once
    #[clap(long, value_parser)]
    search: Vec<DomainName>,

    /// Number of labels an unqualified name needs to be tried as
    /// absolute before the search path
    #[clap(long, value_parser, default_value_t = dns_stub::lookup::DEFAULT_NDOTS)]
    ndots: usize,

    /// Path to a hosts file to consult before querying, can be
    /// specified more than once
    #[clap(short = 'a', long, value_parser)]
    hosts_file: Vec<PathBuf>,

    /// Resolve without consulting a cache
    #[clap(long, action(clap::ArgAction::SetTrue))]
    no_cache: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut hosts = Hosts::new();
    for path in &args.hosts_file {
        match std::fs::read_to_string(path) {
            Ok(data) => match Hosts::deserialise(&data) {
                Ok(parsed) => hosts.merge(parsed),
                Err(error) => {
                    eprintln!("could not parse hosts file {}: {error}", path.display());
                    process::exit(1);
                }
            },
            Err(error) => {
                eprintln!("could not read hosts file {}: {error}", path.display());
                process::exit(1);
            }
        }
    }

    let transport = UdpTransport::new(SocketAddr::new(args.server, args.port));
    let mut session = LookupSession::new(
        Arc::new(transport),
        LookupConfig {
            ndots: args.ndots,
            search_path: args.search,
            ..LookupConfig::default()
        },
    );
    if !args.no_cache {
        session.add_cache(SharedCache::new(RecordClass::IN));
    }
    if !hosts.is_empty() {
        session.set_hosts(Arc::new(hosts));
    }

    println!(";; QUESTION");
    println!("{}\tIN\t{}", args.domain, args.qtype);

    match session
        .lookup(&args.domain, args.qtype, RecordClass::IN)
        .await
    {
        Ok(result) => {
            if !result.aliases.is_empty() {
                println!("\n;; ALIASES");
                for alias in &result.aliases {
                    println!("{alias}");
                }
            }
            print_section("ANSWER", &result.records);
        }
        Err(err) => {
            println!("\n;; ANSWER");
            println!("; {err}");
            process::exit(1);
        }
    }
}
