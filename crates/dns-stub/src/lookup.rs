//! The lookup session: the high-level "resolve this name" API.
//!
//! A session expands unqualified names through the search path,
//! answers address queries from the hosts file when it can, consults
//! the per-class cache, sends everything else to the transport, and
//! chases CNAME/DNAME redirections up to a hop limit.  A single
//! session is meant to live for the whole program and be shared
//! between tasks: `lookup` takes `&self` and the only mutable state
//! is behind the cache's own lock and an atomic counter.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::Instrument;

use dns_types::hosts::Hosts;
use dns_types::protocol::registry::{self, TypeRegistry};
use dns_types::protocol::rrset::section_rrsets;
use dns_types::protocol::types::*;

use crate::cache::{CacheResponse, Credibility, SharedCache};
use crate::transport::{Transport, TransportError};

/// Default hop cap for CNAME and DNAME chains.
pub const DEFAULT_MAX_REDIRECTS: usize = 16;

/// Default label-count threshold below which an unqualified name is
/// tried against the search path before being tried as-is.
pub const DEFAULT_NDOTS: usize = 1;

/// Behavioural knobs for a session.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// How many CNAME/DNAME redirections to follow before giving up.
    pub max_redirects: usize,

    /// Unqualified names with more labels than this are tried as
    /// absolute names first, before the search path; others after it.
    pub ndots: usize,

    /// Suffixes appended to unqualified names, in order.  Relative
    /// suffixes are completed against the root when applied.
    pub search_path: Vec<DomainName>,

    /// Rotate the starting index of cache-served RRsets on each read,
    /// to spread load over equivalent records.
    pub cycle_results: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            ndots: DEFAULT_NDOTS,
            search_path: Vec::new(),
            cycle_results: false,
        }
    }
}

/// What a successful lookup produced: the records answering the
/// query, and the chain of names that redirected to the final one (in
/// the order they were encountered).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LookupResult {
    pub records: Vec<ResourceRecord>,
    pub aliases: Vec<DomainName>,
}

/// A shared, long-lived lookup engine bound to one transport.
pub struct LookupSession {
    transport: Arc<dyn Transport>,
    caches: HashMap<RecordClass, SharedCache>,
    hosts: Option<Arc<Hosts>>,
    registry: Arc<TypeRegistry>,
    config: LookupConfig,
    cycle_counter: AtomicUsize,
}

impl LookupSession {
    /// A session with no caches and no hosts file.  The type registry
    /// is snapshotted here: later changes to the process-wide
    /// registry do not affect this session.
    pub fn new(transport: Arc<dyn Transport>, config: LookupConfig) -> Self {
        Self {
            transport,
            caches: HashMap::new(),
            hosts: None,
            registry: registry::current(),
            config,
            cycle_counter: AtomicUsize::new(0),
        }
    }

    /// Attach a cache.  At most one cache per class: a second cache
    /// for the same class replaces the first.  Queries in a class
    /// without a cache go straight to the transport.
    pub fn add_cache(&mut self, cache: SharedCache) {
        self.caches.insert(cache.rclass(), cache);
    }

    /// Attach a hosts file, answering A/AAAA queries without any
    /// network traffic.
    pub fn set_hosts(&mut self, hosts: Arc<Hosts>) {
        self.hosts = Some(hosts);
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Resolve a name: search-path expansion, hosts file, cache, and
    /// finally the transport, following redirections as needed.
    ///
    /// # Errors
    ///
    /// See `LookupError`.  `NoSuchDomain` and `NoSuchRRset` are only
    /// returned once every search-path candidate has failed that way;
    /// any other error aborts the lookup at once.
    pub async fn lookup(
        &self,
        name: &DomainName,
        qtype: QueryType,
        rclass: RecordClass,
    ) -> Result<LookupResult, LookupError> {
        let candidates = self.expand_name(name);

        if let Some(result) = self.hosts_probe(&candidates, qtype, rclass) {
            tracing::debug!(%name, "answered from hosts file");
            return Ok(result);
        }

        let mut recovered_error = None;
        for candidate in candidates {
            let outcome = self
                .resolve_candidate(&candidate, qtype, rclass)
                .instrument(tracing::error_span!("resolve_candidate", name = %candidate))
                .await;
            match outcome {
                Err(error @ (LookupError::NoSuchDomain | LookupError::NoSuchRRset)) => {
                    tracing::debug!(name = %candidate, %error, "candidate failed, trying next");
                    recovered_error = Some(error);
                }
                other => return other,
            }
        }

        Err(recovered_error.unwrap_or(LookupError::NoSuchDomain))
    }

    /// The absolute names to try for a query name, in order.
    ///
    /// An absolute name is tried alone.  An unqualified name is
    /// combined with every suffix of the search path, trying the
    /// plain name (completed with the root) first if it has more than
    /// `ndots` labels and last otherwise.  Combinations that would
    /// not fit in a name are skipped.
    fn expand_name(&self, name: &DomainName) -> Vec<DomainName> {
        if name.is_absolute() {
            return vec![name.clone()];
        }

        let mut candidates = Vec::with_capacity(self.config.search_path.len() + 1);
        let absolute = name.to_absolute();

        if name.labels.len() > self.config.ndots {
            candidates.extend(absolute.clone());
        }
        for suffix in &self.config.search_path {
            if let Some(combined) = name.make_subdomain_of(suffix) {
                if combined.is_absolute() {
                    candidates.push(combined);
                } else if let Some(completed) = combined.to_absolute() {
                    candidates.push(completed);
                }
            }
        }
        if name.labels.len() <= self.config.ndots {
            candidates.extend(absolute);
        }

        candidates
    }

    /// Answer an address query from the hosts file, if possible.
    fn hosts_probe(
        &self,
        candidates: &[DomainName],
        qtype: QueryType,
        rclass: RecordClass,
    ) -> Option<LookupResult> {
        let hosts = self.hosts.as_ref()?;
        if rclass != RecordClass::IN {
            return None;
        }
        let QueryType::Record(rtype @ (RecordType::A | RecordType::AAAA)) = qtype else {
            return None;
        };

        for candidate in candidates {
            if let Some(address) = hosts.address_for(candidate, rtype) {
                let rtype_with_data = match address {
                    IpAddr::V4(address) => RecordTypeWithData::A { address },
                    IpAddr::V6(address) => RecordTypeWithData::AAAA { address },
                };
                return Some(LookupResult {
                    records: vec![ResourceRecord {
                        name: candidate.clone(),
                        rtype_with_data,
                        rclass,
                        // only valid for this one lookup
                        ttl: 0,
                    }],
                    aliases: Vec::new(),
                });
            }
        }

        None
    }

    /// Resolve one fully-qualified candidate, chasing redirections.
    async fn resolve_candidate(
        &self,
        name: &DomainName,
        qtype: QueryType,
        rclass: RecordClass,
    ) -> Result<LookupResult, LookupError> {
        let mut state = RedirectState::new(name.clone(), self.config.max_redirects);

        loop {
            // cache probe
            if let (Some(cache), QueryType::Record(rtype)) = (self.caches.get(&rclass), qtype) {
                match cache.lookup(&state.current, rtype, Credibility::NonAuthAnswer) {
                    CacheResponse::Found { chain, rrs } => {
                        for link in &chain {
                            state.follow_cname(link)?;
                        }
                        let records = self.maybe_cycle(rrs);
                        return Ok(state.into_result(records));
                    }
                    CacheResponse::NxDomain => return Err(LookupError::NoSuchDomain),
                    CacheResponse::NxRrset => return Err(LookupError::NoSuchRRset),
                    CacheResponse::Partial { chain } => {
                        // the chain's tail is not cached: follow it,
                        // then go to the network for the rest
                        for link in &chain {
                            state.follow_cname(link)?;
                        }
                    }
                    CacheResponse::Dname { rr } => {
                        state.follow_dname(&rr)?;
                        continue;
                    }
                    CacheResponse::Unknown => (),
                }
            }

            // transport
            let question = Question {
                name: state.current.clone(),
                qtype,
                qclass: QueryClass::Record(rclass),
            };
            let mut query = Message::from_question(rand::random(), question);
            query.header.recursion_desired = true;

            let response = self
                .transport
                .send(&query)
                .await
                .map_err(LookupError::Transport)?;

            validate_response(&response)?;

            if let Some(cache) = self.caches.get(&rclass) {
                cache.ingest(&response);
            }

            // walk the answer section in order, following
            // redirections and collecting records for the final name
            let mut records = Vec::new();
            let mut redirected = false;
            for rr in &response.answers {
                if rr.rclass != rclass {
                    continue;
                }

                if rr.name == state.current && rr.rtype_with_data.matches(qtype) {
                    records.push(rr.clone());
                } else if records.is_empty() {
                    match &rr.rtype_with_data {
                        RecordTypeWithData::CNAME { .. } if rr.name == state.current => {
                            state.follow_cname(rr)?;
                            redirected = true;
                        }
                        RecordTypeWithData::DNAME { .. }
                            if state.current.is_subdomain_of(&rr.name)
                                && state.current != rr.name =>
                        {
                            state.follow_dname(rr)?;
                            redirected = true;
                        }
                        _ => (),
                    }
                }
            }

            if !records.is_empty() {
                return Ok(state.into_result(records));
            }
            if redirected {
                tracing::debug!(next = %state.current, hops = %state.hops, "following redirection");
                continue;
            }

            // nothing in the answer section helps: the rcode decides
            // the outcome.  NOERROR with an empty answer means the
            // name exists but has no data of this type.
            return Err(match response.header.rcode {
                Rcode::NoError | Rcode::NXRRset => LookupError::NoSuchRRset,
                Rcode::NameError => LookupError::NoSuchDomain,
                Rcode::ServerFailure => LookupError::ServerFailed,
                rcode => LookupError::Rcode { rcode },
            });
        }
    }

    /// Rotate a cache-served RRset's starting index, if configured.
    /// The counter is shared across all queries of the session.
    fn maybe_cycle(&self, mut rrs: Vec<ResourceRecord>) -> Vec<ResourceRecord> {
        if self.config.cycle_results && rrs.len() > 1 {
            let n = self.cycle_counter.fetch_add(1, Ordering::Relaxed) % rrs.len();
            rrs.rotate_left(n);
        }
        rrs
    }
}

/// Redirection-chasing state, threaded through each step of a
/// candidate's resolution.
struct RedirectState {
    current: DomainName,
    aliases: Vec<DomainName>,
    hops: usize,
    limit: usize,
}

impl RedirectState {
    fn new(name: DomainName, limit: usize) -> Self {
        Self {
            current: name,
            aliases: Vec::new(),
            hops: 0,
            limit,
        }
    }

    fn follow_cname(&mut self, rr: &ResourceRecord) -> Result<(), LookupError> {
        let RecordTypeWithData::CNAME { cname } = &rr.rtype_with_data else {
            return Err(LookupError::InvalidZoneData {
                name: rr.name.clone(),
            });
        };

        self.hop()?;
        self.aliases
            .push(std::mem::replace(&mut self.current, cname.clone()));
        Ok(())
    }

    fn follow_dname(&mut self, rr: &ResourceRecord) -> Result<(), LookupError> {
        let RecordTypeWithData::DNAME { target } = &rr.rtype_with_data else {
            return Err(LookupError::InvalidZoneData {
                name: rr.name.clone(),
            });
        };

        // a rewrite that does not apply, or does not fit in a name,
        // is broken zone data
        let Some(rewritten) = self.current.replace_suffix(&rr.name, target) else {
            return Err(LookupError::InvalidZoneData {
                name: rr.name.clone(),
            });
        };

        self.hop()?;
        self.aliases
            .push(std::mem::replace(&mut self.current, rewritten));
        Ok(())
    }

    fn hop(&mut self) -> Result<(), LookupError> {
        self.hops += 1;
        if self.hops > self.limit {
            Err(LookupError::RedirectOverflow { limit: self.limit })
        } else {
            Ok(())
        }
    }

    fn into_result(self, records: Vec<ResourceRecord>) -> LookupResult {
        LookupResult {
            records,
            aliases: self.aliases,
        }
    }
}

/// Reject responses carrying protocol violations the session must not
/// act on: a name with more than one CNAME record is broken zone
/// data.
fn validate_response(response: &Message) -> Result<(), LookupError> {
    for rrset in section_rrsets(&response.answers) {
        if rrset.rtype == RecordType::CNAME && rrset.records.len() > 1 {
            return Err(LookupError::InvalidZoneData { name: rrset.name });
        }
    }
    Ok(())
}

/// An error that can occur when trying to resolve a name.
#[derive(Debug)]
pub enum LookupError {
    /// The name does not exist, in any search-path combination.
    NoSuchDomain,

    /// The name exists, but has no data of the queried type, in any
    /// search-path combination.
    NoSuchRRset,

    /// The server reported an internal failure.
    ServerFailed,

    /// A CNAME/DNAME chain exceeded the redirection limit.
    RedirectOverflow { limit: usize },

    /// A response contained data no valid zone can contain.
    InvalidZoneData { name: DomainName },

    /// The server answered with an rcode the session has no better
    /// mapping for.
    Rcode { rcode: Rcode },

    /// The transport could not deliver the query or a response.
    Transport(TransportError),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LookupError::NoSuchDomain => write!(f, "no such domain"),
            LookupError::NoSuchRRset => write!(f, "no records of the queried type"),
            LookupError::ServerFailed => write!(f, "server failure"),
            LookupError::RedirectOverflow { limit } => {
                write!(f, "more than {limit} redirections")
            }
            LookupError::InvalidZoneData { name } => {
                write!(f, "invalid zone data at '{name}'")
            }
            LookupError::Rcode { rcode } => write!(f, "query failed with rcode '{rcode}'"),
            LookupError::Transport(error) => write!(f, "transport failure: {error}"),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LookupError::Transport(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;

    use async_trait::async_trait;
    use dns_types::protocol::types::test_util::*;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// A reply template: `send` fills in the id and question from the
    /// query so the response always matches.
    #[derive(Debug, Clone)]
    struct Reply {
        rcode: Rcode,
        is_authoritative: bool,
        answers: Vec<ResourceRecord>,
        authority: Vec<ResourceRecord>,
    }

    impl Reply {
        fn answer(answers: Vec<ResourceRecord>) -> Self {
            Self {
                rcode: Rcode::NoError,
                is_authoritative: false,
                answers,
                authority: Vec::new(),
            }
        }

        fn nxdomain() -> Self {
            Self {
                rcode: Rcode::NameError,
                is_authoritative: true,
                answers: Vec::new(),
                authority: vec![soa_record("example.com.", 300)],
            }
        }
    }

    struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        repeat: Option<Reply>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                repeat: None,
                calls: AtomicUsize::new(0),
            }
        }

        /// Serve this reply whenever the scripted queue runs dry.
        fn repeating(reply: Reply) -> Self {
            Self {
                replies: Mutex::new(VecDeque::new()),
                repeat: Some(reply),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, query: &Message) -> Result<Message, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .or_else(|| self.repeat.clone())
                .expect("scripted transport ran out of replies");

            let mut response = query.make_response();
            response.header.rcode = reply.rcode;
            response.header.is_authoritative = reply.is_authoritative;
            response.answers = reply.answers;
            response.authority = reply.authority;
            Ok(response)
        }
    }

    fn session_with_cache(transport: Arc<ScriptedTransport>) -> LookupSession {
        let mut session = LookupSession::new(transport, LookupConfig::default());
        session.add_cache(SharedCache::new(RecordClass::IN));
        session
    }

    fn a_query(name: &str) -> (DomainName, QueryType, RecordClass) {
        (
            domain(name),
            QueryType::Record(RecordType::A),
            RecordClass::IN,
        )
    }

    #[tokio::test]
    async fn simple_a_query_fills_cache() {
        let rr = a_record("example.com.", Ipv4Addr::new(192, 0, 2, 1));
        let transport = Arc::new(ScriptedTransport::new(vec![Reply::answer(vec![rr.clone()])]));
        let session = session_with_cache(transport.clone());

        let (name, qtype, rclass) = a_query("example.com.");
        let result = session.lookup(&name, qtype, rclass).await.unwrap();

        assert_eq!(vec![rr.clone()], result.records);
        assert!(result.aliases.is_empty());
        assert_eq!(1, transport.calls());

        // a second lookup is served from the cache
        let cached = session.lookup(&name, qtype, rclass).await.unwrap();
        assert_eq!(1, transport.calls());
        assert_eq!(1, cached.records.len());
        assert_eq!(rr.name, cached.records[0].name);
        assert_eq!(rr.rtype_with_data, cached.records[0].rtype_with_data);
        assert!(cached.records[0].ttl <= 300 && cached.records[0].ttl > 0);
    }

    #[tokio::test]
    async fn cname_chain_accumulates_aliases() {
        let cname = cname_record("www.example.com.", "alias.example.com.");
        let a = a_record("alias.example.com.", Ipv4Addr::new(192, 0, 2, 2));
        let transport = Arc::new(ScriptedTransport::new(vec![
            Reply::answer(vec![cname]),
            Reply::answer(vec![a.clone()]),
        ]));
        let session = session_with_cache(transport.clone());

        let (name, qtype, rclass) = a_query("www.example.com.");
        let result = session.lookup(&name, qtype, rclass).await.unwrap();

        assert_eq!(vec![a], result.records);
        assert_eq!(vec![domain("www.example.com.")], result.aliases);
        assert_eq!(2, transport.calls());
    }

    #[tokio::test]
    async fn cname_chain_within_one_response() {
        let cname1 = cname_record("www.example.com.", "alias.example.com.");
        let cname2 = cname_record("alias.example.com.", "real.example.com.");
        let a = a_record("real.example.com.", Ipv4Addr::new(192, 0, 2, 2));
        let transport = Arc::new(ScriptedTransport::new(vec![Reply::answer(vec![
            cname1,
            cname2,
            a.clone(),
        ])]));
        let session = session_with_cache(transport.clone());

        let (name, qtype, rclass) = a_query("www.example.com.");
        let result = session.lookup(&name, qtype, rclass).await.unwrap();

        assert_eq!(vec![a], result.records);
        assert_eq!(
            vec![domain("www.example.com."), domain("alias.example.com.")],
            result.aliases
        );
        assert_eq!(1, transport.calls());
    }

    #[tokio::test]
    async fn dname_rewrites_query_name() {
        let dname = dname_record("old.example.", "new.example.");
        let a = a_record("x.new.example.", Ipv4Addr::new(192, 0, 2, 3));
        let transport = Arc::new(ScriptedTransport::new(vec![Reply::answer(vec![
            dname,
            a.clone(),
        ])]));
        let session = session_with_cache(transport.clone());

        let (name, qtype, rclass) = a_query("x.old.example.");
        let result = session.lookup(&name, qtype, rclass).await.unwrap();

        assert_eq!(vec![a], result.records);
        assert_eq!(vec![domain("x.old.example.")], result.aliases);
        assert_eq!(1, transport.calls());
    }

    #[tokio::test]
    async fn search_path_recovers_from_nxdomain() {
        let rr = a_record("host.", Ipv4Addr::new(192, 0, 2, 4));
        let transport = Arc::new(ScriptedTransport::new(vec![
            // first candidate: host.corp.example. (one label is not
            // more than ndots, so the search path goes first)
            Reply::nxdomain(),
            Reply::answer(vec![rr.clone()]),
        ]));
        let mut session = LookupSession::new(
            transport.clone(),
            LookupConfig {
                search_path: vec![domain("corp.example.")],
                ..LookupConfig::default()
            },
        );
        session.add_cache(SharedCache::new(RecordClass::IN));

        let result = session
            .lookup(
                &DomainName::from_dotted_string("host").unwrap(),
                QueryType::Record(RecordType::A),
                RecordClass::IN,
            )
            .await
            .unwrap();

        assert_eq!(vec![rr], result.records);
        assert_eq!(2, transport.calls());
    }

    #[tokio::test]
    async fn search_path_exhaustion_is_nxdomain() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Reply::nxdomain(),
            Reply::nxdomain(),
        ]));
        let mut session = LookupSession::new(
            transport.clone(),
            LookupConfig {
                search_path: vec![domain("corp.example.")],
                ..LookupConfig::default()
            },
        );
        session.add_cache(SharedCache::new(RecordClass::IN));

        let result = session
            .lookup(
                &DomainName::from_dotted_string("host").unwrap(),
                QueryType::Record(RecordType::A),
                RecordClass::IN,
            )
            .await;

        assert!(matches!(result, Err(LookupError::NoSuchDomain)));
        assert_eq!(2, transport.calls());
    }

    #[tokio::test]
    async fn server_failure_is_not_recovered() {
        let transport = Arc::new(ScriptedTransport::new(vec![Reply {
            rcode: Rcode::ServerFailure,
            is_authoritative: false,
            answers: Vec::new(),
            authority: Vec::new(),
        }]));
        let mut session = LookupSession::new(
            transport.clone(),
            LookupConfig {
                search_path: vec![domain("corp.example.")],
                ..LookupConfig::default()
            },
        );
        session.add_cache(SharedCache::new(RecordClass::IN));

        let result = session
            .lookup(
                &DomainName::from_dotted_string("host").unwrap(),
                QueryType::Record(RecordType::A),
                RecordClass::IN,
            )
            .await;

        assert!(matches!(result, Err(LookupError::ServerFailed)));
        assert_eq!(1, transport.calls());
    }

    #[tokio::test]
    async fn empty_noerror_is_nxrrset() {
        let transport = Arc::new(ScriptedTransport::new(vec![Reply::answer(Vec::new())]));
        let session = session_with_cache(transport.clone());

        let (name, qtype, rclass) = a_query("www.example.com.");
        let result = session.lookup(&name, qtype, rclass).await;

        assert!(matches!(result, Err(LookupError::NoSuchRRset)));
    }

    #[tokio::test]
    async fn answer_records_win_over_error_rcode() {
        let rr = a_record("www.example.com.", Ipv4Addr::new(192, 0, 2, 9));
        let transport = Arc::new(ScriptedTransport::new(vec![Reply {
            rcode: Rcode::NameError,
            is_authoritative: false,
            answers: vec![rr.clone()],
            authority: Vec::new(),
        }]));
        let session = session_with_cache(transport.clone());

        let (name, qtype, rclass) = a_query("www.example.com.");
        let result = session.lookup(&name, qtype, rclass).await.unwrap();

        assert_eq!(vec![rr], result.records);
    }

    #[tokio::test]
    async fn cname_loop_overflows() {
        let transport = Arc::new(ScriptedTransport::repeating(Reply::answer(vec![
            cname_record("a.example.com.", "b.example.com."),
            cname_record("b.example.com.", "a.example.com."),
        ])));
        let session = session_with_cache(transport.clone());

        let (name, qtype, rclass) = a_query("a.example.com.");
        let result = session.lookup(&name, qtype, rclass).await;

        assert!(matches!(
            result,
            Err(LookupError::RedirectOverflow { limit: 16 })
        ));
        // the redirect budget also bounds the number of queries
        assert!(transport.calls() <= 17);
    }

    #[tokio::test]
    async fn multiple_cnames_for_one_name_is_invalid() {
        let transport = Arc::new(ScriptedTransport::new(vec![Reply::answer(vec![
            cname_record("www.example.com.", "a.example.com."),
            cname_record("www.example.com.", "b.example.com."),
        ])]));
        let session = session_with_cache(transport.clone());

        let (name, qtype, rclass) = a_query("www.example.com.");
        let result = session.lookup(&name, qtype, rclass).await;

        assert!(matches!(result, Err(LookupError::InvalidZoneData { .. })));
    }

    #[tokio::test]
    async fn hosts_file_short_circuits() {
        let mut hosts = Hosts::new();
        hosts
            .v4
            .insert(domain("localhost."), Ipv4Addr::new(10, 0, 0, 1));

        let transport = Arc::new(ScriptedTransport::new(Vec::new()));
        let mut session = LookupSession::new(transport.clone(), LookupConfig::default());
        session.set_hosts(Arc::new(hosts));

        let (name, qtype, rclass) = a_query("localhost.");
        let result = session.lookup(&name, qtype, rclass).await.unwrap();

        assert_eq!(1, result.records.len());
        assert_eq!(0, result.records[0].ttl);
        assert_eq!(
            RecordTypeWithData::A {
                address: Ipv4Addr::new(10, 0, 0, 1)
            },
            result.records[0].rtype_with_data
        );
        assert!(result.aliases.is_empty());
        assert_eq!(0, transport.calls());
    }

    #[tokio::test]
    async fn hosts_file_does_not_answer_other_types() {
        let mut hosts = Hosts::new();
        hosts
            .v4
            .insert(domain("localhost."), Ipv4Addr::new(10, 0, 0, 1));

        let transport = Arc::new(ScriptedTransport::new(vec![Reply::answer(Vec::new())]));
        let mut session = LookupSession::new(transport.clone(), LookupConfig::default());
        session.set_hosts(Arc::new(hosts));

        let result = session
            .lookup(
                &domain("localhost."),
                QueryType::Record(RecordType::MX),
                RecordClass::IN,
            )
            .await;

        assert!(matches!(result, Err(LookupError::NoSuchRRset)));
        assert_eq!(1, transport.calls());
    }

    #[tokio::test]
    async fn negative_cache_answers_without_transport() {
        let transport = Arc::new(ScriptedTransport::new(vec![Reply::nxdomain()]));
        let session = session_with_cache(transport.clone());

        let (name, qtype, rclass) = a_query("gone.example.com.");
        assert!(matches!(
            session.lookup(&name, qtype, rclass).await,
            Err(LookupError::NoSuchDomain)
        ));
        assert_eq!(1, transport.calls());

        // the NXDOMAIN is negatively cached: no second query
        assert!(matches!(
            session.lookup(&name, qtype, rclass).await,
            Err(LookupError::NoSuchDomain)
        ));
        assert_eq!(1, transport.calls());
    }

    #[tokio::test]
    async fn cycling_rotates_cached_rrsets() {
        let rr1 = a_record("example.com.", Ipv4Addr::new(192, 0, 2, 1));
        let rr2 = a_record("example.com.", Ipv4Addr::new(192, 0, 2, 2));
        let transport = Arc::new(ScriptedTransport::new(vec![Reply::answer(vec![
            rr1.clone(),
            rr2.clone(),
        ])]));
        let mut session = LookupSession::new(
            transport.clone(),
            LookupConfig {
                cycle_results: true,
                ..LookupConfig::default()
            },
        );
        session.add_cache(SharedCache::new(RecordClass::IN));

        let (name, qtype, rclass) = a_query("example.com.");
        // fill the cache
        session.lookup(&name, qtype, rclass).await.unwrap();

        let first = session.lookup(&name, qtype, rclass).await.unwrap();
        let second = session.lookup(&name, qtype, rclass).await.unwrap();

        assert_eq!(1, transport.calls());
        assert_ne!(first.records, second.records);
        assert_eq!(
            {
                let mut rrs = first.records.clone();
                rrs.sort();
                rrs
            },
            {
                let mut rrs = second.records.clone();
                rrs.sort();
                rrs
            }
        );
    }

    #[test]
    fn expand_name_absolute_is_alone() {
        let session = LookupSession::new(
            Arc::new(ScriptedTransport::new(Vec::new())),
            LookupConfig {
                search_path: vec![domain("corp.example.")],
                ..LookupConfig::default()
            },
        );

        assert_eq!(
            vec![domain("www.example.com.")],
            session.expand_name(&domain("www.example.com."))
        );
    }

    #[test]
    fn expand_name_prefers_search_path_below_ndots() {
        let session = LookupSession::new(
            Arc::new(ScriptedTransport::new(Vec::new())),
            LookupConfig {
                search_path: vec![domain("a.example."), domain("b.example.")],
                ..LookupConfig::default()
            },
        );

        assert_eq!(
            vec![
                domain("host.a.example."),
                domain("host.b.example."),
                domain("host."),
            ],
            session.expand_name(&DomainName::from_dotted_string("host").unwrap())
        );
    }

    #[test]
    fn expand_name_prefers_absolute_above_ndots() {
        let session = LookupSession::new(
            Arc::new(ScriptedTransport::new(Vec::new())),
            LookupConfig {
                search_path: vec![domain("a.example."), domain("b.example.")],
                ..LookupConfig::default()
            },
        );

        assert_eq!(
            vec![
                domain("www.host."),
                domain("www.host.a.example."),
                domain("www.host.b.example."),
            ],
            session.expand_name(&DomainName::from_dotted_string("www.host").unwrap())
        );
    }

    #[test]
    fn expand_name_skips_overlong_combinations() {
        let mut long_label = "x".repeat(60);
        long_label.push('.');
        let long_suffix = domain(&long_label.repeat(4));

        let session = LookupSession::new(
            Arc::new(ScriptedTransport::new(Vec::new())),
            LookupConfig {
                search_path: vec![long_suffix, domain("a.example.")],
                ..LookupConfig::default()
            },
        );

        // the 244-octet suffix cannot take a 21-octet prefix
        let name = DomainName::from_dotted_string("a-name-of-some-length").unwrap();
        assert_eq!(
            vec![domain("a-name-of-some-length.a.example."), domain("a-name-of-some-length.")],
            session.expand_name(&name)
        );
    }
}
