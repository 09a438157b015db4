//! The resolver cache: positive and negative answers from previous
//! responses, ranked by how much the source of each datum is to be
//! believed.

use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dns_types::protocol::rrset::section_rrsets;
use dns_types::protocol::types::*;

/// How long positive entries may live, whatever their TTL claims.
pub const DEFAULT_MAX_TTL: Duration = Duration::from_secs(604_800);

/// How long negative entries may live, whatever the SOA claims (RFC
/// 2308 section 5 suggests up to three hours).
pub const DEFAULT_MAX_NEGATIVE_TTL: Duration = Duration::from_secs(10_800);

/// How many in-cache CNAME links a single lookup will follow.
const MAX_CHAIN_LEN: usize = 16;

const MUTEX_POISON_MESSAGE: &str =
    "[INTERNAL ERROR] cache mutex poisoned, cannot recover from this - aborting";

/// How much the source of a cached datum is to be believed.  A datum
/// can only be displaced by one of equal or greater credibility, and
/// a read only sees data at or above its minimum.
///
/// The variants are ordered least-credible-first, so `<=` on this
/// type is the ranking.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Credibility {
    /// Preconfigured hints.
    Hint,

    /// The additional section of a non-authoritative response.
    Additional,

    /// The answer section of a non-authoritative response.
    NonAuthAnswer,

    /// The authority section of a non-authoritative response.
    NonAuthAuthority,

    /// The additional section of an authoritative response.
    AuthAdditional,

    /// The authority section of an authoritative response.
    AuthAuthority,

    /// The answer section of an authoritative response.
    AuthAnswer,
}

impl Credibility {
    fn for_section(section: Section, is_authoritative: bool) -> Self {
        match (section, is_authoritative) {
            (Section::Answer, true) => Credibility::AuthAnswer,
            (Section::Answer, false) => Credibility::NonAuthAnswer,
            (Section::Authority, true) => Credibility::AuthAuthority,
            (Section::Authority, false) => Credibility::NonAuthAuthority,
            (Section::Additional, true) => Credibility::AuthAdditional,
            (Section::Additional, false) => Credibility::Additional,
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum Section {
    Answer,
    Authority,
    Additional,
}

/// The result of a cache lookup.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CacheResponse {
    /// The cache knows nothing useful about this (name, type).
    Unknown,

    /// The name is known not to exist, for any type.
    NxDomain,

    /// The name exists but is known to have no data of this type.
    NxRrset,

    /// The queried RRset, along with the CNAME records followed
    /// in-cache to reach it (empty for a direct hit).  TTLs are the
    /// time remaining, not the original values.
    Found {
        chain: Vec<ResourceRecord>,
        rrs: Vec<ResourceRecord>,
    },

    /// A non-empty CNAME chain was followed but its tail is not in
    /// the cache (or the chain hit the follow limit): the caller
    /// should continue from the last target.
    Partial { chain: Vec<ResourceRecord> },

    /// No direct data, but a cached DNAME covers the name: the caller
    /// should rewrite the name under the DNAME's target and retry.
    Dname { rr: ResourceRecord },
}

/// A convenience wrapper around a `Cache` which lets it be shared
/// between threads.
///
/// Invoking `clone` on a `SharedCache` gives a new instance which
/// refers to the same underlying `Cache` object.
#[derive(Debug, Clone)]
pub struct SharedCache {
    rclass: RecordClass,
    cache: Arc<Mutex<Cache>>,
}

impl SharedCache {
    /// Make a new, empty, shared cache for one record class.
    pub fn new(rclass: RecordClass) -> Self {
        SharedCache {
            rclass,
            cache: Arc::new(Mutex::new(Cache::new(rclass))),
        }
    }

    /// Create a new cache with the given desired size.
    pub fn with_desired_size(rclass: RecordClass, desired_size: usize) -> Self {
        SharedCache {
            rclass,
            cache: Arc::new(Mutex::new(Cache::with_desired_size(rclass, desired_size))),
        }
    }

    /// The record class this cache holds data for.
    pub fn rclass(&self) -> RecordClass {
        self.rclass
    }

    /// Look up a (name, type), accepting only entries at or above the
    /// given credibility.
    ///
    /// # Panics
    ///
    /// If the mutex has been poisoned.
    pub fn lookup(
        &self,
        name: &DomainName,
        rtype: RecordType,
        min_credibility: Credibility,
    ) -> CacheResponse {
        self.cache
            .lock()
            .expect(MUTEX_POISON_MESSAGE)
            .lookup(name, rtype, min_credibility)
    }

    /// Feed a whole response message into the cache: all three record
    /// sections, plus any negative result it conveys.
    ///
    /// # Panics
    ///
    /// If the mutex has been poisoned.
    pub fn ingest(&self, message: &Message) {
        self.cache.lock().expect(MUTEX_POISON_MESSAGE).ingest(message);
    }

    /// Atomically clears expired entries and, if the cache has grown
    /// beyond its desired size, prunes entries to get down to size.
    ///
    /// Returns `(has overflowed?, current size, num expired, num pruned)`.
    ///
    /// # Panics
    ///
    /// If the mutex has been poisoned.
    pub fn prune(&self) -> (bool, usize, usize, usize) {
        self.cache.lock().expect(MUTEX_POISON_MESSAGE).prune()
    }
}

impl Default for SharedCache {
    fn default() -> Self {
        Self::new(RecordClass::IN)
    }
}

/// Caching for RRsets and negative results.
///
/// You probably want to use `SharedCache` instead.
#[derive(Debug, Clone)]
pub struct Cache {
    rclass: RecordClass,
    max_ttl: Duration,
    max_negative_ttl: Duration,

    /// Cached entries, per owner name.
    partitions: HashMap<DomainName, Partition>,

    /// Priority queue of names ordered by access times.
    ///
    /// When the cache is full and there are no expired entries to
    /// prune, names will instead be pruned in LRU order.
    ///
    /// INVARIANT: the keys in here are exactly the keys in `partitions`.
    access_priority: PriorityQueue<DomainName, Reverse<Instant>>,

    /// Priority queue of names ordered by expiry time.
    ///
    /// When the cache is pruned, expired entries are removed first.
    ///
    /// INVARIANT: the keys in here are exactly the keys in `partitions`.
    expiry_priority: PriorityQueue<DomainName, Reverse<Instant>>,

    /// The number of entries in the cache, across all names.
    ///
    /// INVARIANT: this is the sum of the `size` fields of the `partitions`.
    current_size: usize,

    /// The desired maximum number of entries in the cache.
    desired_size: usize,
}

/// The cached data for one owner name.
#[derive(Debug, Clone)]
struct Partition {
    /// The time this name was last read at.
    last_read: Instant,

    /// When the next entry expires.
    ///
    /// INVARIANT: this is the minimum expiry among the entries and
    /// the nxdomain marker.
    next_expiry: Instant,

    /// How many entries there are, counting the nxdomain marker.
    ///
    /// INVARIANT: this is `entries.len() + (nxdomain ? 1 : 0)`.
    size: usize,

    /// Name-wide negative marker: the name does not exist at all.
    ///
    /// INVARIANT: while this is live, `entries` is empty - a name
    /// cannot both not-exist and have data.
    nxdomain: Option<NegativeEntry>,

    /// Positive RRsets and per-type negative markers.
    entries: HashMap<RecordType, Entry>,
}

#[derive(Debug, Clone)]
enum Entry {
    /// An RRset: the rdatas live here, the owner name is the
    /// partition key.
    Positive {
        rdatas: Vec<RecordTypeWithData>,
        credibility: Credibility,
        expires: Instant,
    },

    /// The name exists, but has no data of this type.
    Negative(NegativeEntry),
}

impl Entry {
    fn credibility(&self) -> Credibility {
        match self {
            Entry::Positive { credibility, .. } => *credibility,
            Entry::Negative(marker) => marker.credibility,
        }
    }

    fn expires(&self) -> Instant {
        match self {
            Entry::Positive { expires, .. } => *expires,
            Entry::Negative(marker) => marker.expires,
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct NegativeEntry {
    credibility: Credibility,
    expires: Instant,
}

impl Cache {
    /// Create a new cache with a default desired size.
    pub fn new(rclass: RecordClass) -> Self {
        Self::with_desired_size(rclass, 512)
    }

    /// Create a new cache with the given desired size.
    ///
    /// The `prune` method will remove expired entries, and also
    /// enough entries (in least-recently-used order) to get down to
    /// this size.
    pub fn with_desired_size(rclass: RecordClass, desired_size: usize) -> Self {
        Self {
            rclass,
            max_ttl: DEFAULT_MAX_TTL,
            max_negative_ttl: DEFAULT_MAX_NEGATIVE_TTL,
            partitions: HashMap::with_capacity(desired_size / 2),
            access_priority: PriorityQueue::with_capacity(desired_size),
            expiry_priority: PriorityQueue::with_capacity(desired_size),
            current_size: 0,
            desired_size,
        }
    }

    /// Look up a (name, type), following in-cache CNAME chains, and
    /// accepting only entries at or above the given credibility.
    ///
    /// Expired entries along the way are evicted rather than
    /// returned.
    pub fn lookup(
        &mut self,
        name: &DomainName,
        rtype: RecordType,
        min_credibility: Credibility,
    ) -> CacheResponse {
        let now = Instant::now();
        let mut current = name.clone();
        let mut chain = Vec::new();

        loop {
            let outcome = self.lookup_direct(&current, rtype, min_credibility, now);

            match outcome {
                DirectOutcome::NxDomain => {
                    return if chain.is_empty() {
                        tracing::trace!(name = %current, "cache HIT (nxdomain)");
                        CacheResponse::NxDomain
                    } else {
                        CacheResponse::Partial { chain }
                    };
                }
                DirectOutcome::NxRrset => {
                    return if chain.is_empty() {
                        tracing::trace!(name = %current, %rtype, "cache HIT (nxrrset)");
                        CacheResponse::NxRrset
                    } else {
                        CacheResponse::Partial { chain }
                    };
                }
                DirectOutcome::Answer(rrs) => {
                    tracing::trace!(name = %current, %rtype, "cache HIT");
                    return CacheResponse::Found { chain, rrs };
                }
                DirectOutcome::Cname(rr) => {
                    if chain.len() >= MAX_CHAIN_LEN {
                        return CacheResponse::Partial { chain };
                    }
                    let RecordTypeWithData::CNAME { cname } = &rr.rtype_with_data else {
                        unreachable!();
                    };
                    current = cname.clone();
                    chain.push(rr);
                }
                DirectOutcome::Miss => {
                    // no direct data: does a cached DNAME cover the
                    // name?
                    if let Some(rr) = self.lookup_covering_dname(&current, min_credibility, now) {
                        tracing::trace!(name = %current, "cache HIT (dname)");
                        return CacheResponse::Dname { rr };
                    }

                    tracing::trace!(name = %current, %rtype, "cache MISS");
                    return if chain.is_empty() {
                        CacheResponse::Unknown
                    } else {
                        CacheResponse::Partial { chain }
                    };
                }
            }
        }
    }

    /// Feed a whole response message into the cache.
    pub fn ingest(&mut self, message: &Message) {
        let now = Instant::now();
        let aa = message.header.is_authoritative;

        let sections = [
            (Section::Answer, &message.answers),
            (Section::Authority, &message.authority),
            (Section::Additional, &message.additional),
        ];

        for (section, records) in sections {
            let credibility = Credibility::for_section(section, aa);
            for rrset in section_rrsets(records) {
                if rrset.rclass != self.rclass || rrset.ttl == 0 {
                    continue;
                }

                if !rrset.records.is_empty() {
                    let rdatas = rrset
                        .records
                        .iter()
                        .map(|rr| rr.rtype_with_data.clone())
                        .collect();
                    self.insert_entry(&rrset.name, rrset.rtype, rdatas, rrset.ttl, credibility, now);
                }
                if !rrset.signatures.is_empty() {
                    let rdatas = rrset
                        .signatures
                        .iter()
                        .map(|rr| rr.rtype_with_data.clone())
                        .collect();
                    let ttl = rrset
                        .signatures
                        .iter()
                        .map(|rr| rr.ttl)
                        .min()
                        .unwrap_or(rrset.ttl);
                    self.insert_entry(
                        &rrset.name,
                        RecordType::RRSIG,
                        rdatas,
                        ttl,
                        credibility,
                        now,
                    );
                }
            }
        }

        self.ingest_negative(message, now);
    }

    /// Clear expired entries and, if the cache has grown beyond its
    /// desired size, prune names to get down to size.
    ///
    /// Returns `(has overflowed?, current size, num expired, num pruned)`.
    pub fn prune(&mut self) -> (bool, usize, usize, usize) {
        let has_overflowed = self.current_size > self.desired_size;
        let num_expired = self.remove_expired();
        let mut num_pruned = 0;

        while self.current_size > self.desired_size {
            num_pruned += self.remove_least_recently_used();
        }

        (has_overflowed, self.current_size, num_expired, num_pruned)
    }

    /// Look up exactly (name, type) with no chain following.  Expired
    /// data is evicted, not returned.
    fn lookup_direct(
        &mut self,
        name: &DomainName,
        rtype: RecordType,
        min_credibility: Credibility,
        now: Instant,
    ) -> DirectOutcome {
        let Some(partition) = self.partitions.get_mut(name) else {
            return DirectOutcome::Miss;
        };

        partition.last_read = now;
        self.access_priority
            .change_priority(name, Reverse(partition.last_read));

        if let Some(marker) = partition.nxdomain {
            if marker.expires <= now {
                partition.nxdomain = None;
                partition.size -= 1;
                self.current_size -= 1;
            } else if marker.credibility >= min_credibility {
                return DirectOutcome::NxDomain;
            }
        }

        for key in [rtype, RecordType::CNAME] {
            // look before acting, so the expired-entry eviction does
            // not fight the borrow of the probed entry
            let probe = match partition.entries.get(&key) {
                None => Probe::Absent,
                Some(entry) if entry.expires() <= now => Probe::Expired,
                Some(entry) if entry.credibility() < min_credibility => Probe::Absent,
                Some(Entry::Positive { rdatas, expires, .. }) => {
                    Probe::Positive(rdatas.clone(), *expires)
                }
                Some(Entry::Negative(_)) => Probe::Negative,
            };

            match probe {
                Probe::Expired => {
                    partition.entries.remove(&key);
                    partition.size -= 1;
                    self.current_size -= 1;
                }
                Probe::Positive(rdatas, expires) => {
                    let ttl = remaining_ttl(expires, now);
                    if key == rtype {
                        let rrs = rdatas
                            .into_iter()
                            .map(|rdata| ResourceRecord {
                                name: name.clone(),
                                rtype_with_data: rdata,
                                rclass: self.rclass,
                                ttl,
                            })
                            .collect();
                        return DirectOutcome::Answer(rrs);
                    }

                    // a CNAME chain only helps if there is exactly
                    // one link to follow
                    if rdatas.len() == 1 {
                        return DirectOutcome::Cname(ResourceRecord {
                            name: name.clone(),
                            rtype_with_data: rdatas[0].clone(),
                            rclass: self.rclass,
                            ttl,
                        });
                    }
                }
                Probe::Negative => {
                    if key == rtype {
                        return DirectOutcome::NxRrset;
                    }
                }
                Probe::Absent => (),
            }

            if rtype == RecordType::CNAME {
                break;
            }
        }

        DirectOutcome::Miss
    }

    /// Find a live DNAME entry at a strict ancestor of the name.
    fn lookup_covering_dname(
        &self,
        name: &DomainName,
        min_credibility: Credibility,
        now: Instant,
    ) -> Option<ResourceRecord> {
        for i in 1..name.labels.len() {
            let Some(ancestor) = DomainName::from_labels(name.labels[i..].to_vec()) else {
                continue;
            };
            let Some(partition) = self.partitions.get(&ancestor) else {
                continue;
            };
            if let Some(Entry::Positive { rdatas, credibility, expires }) =
                partition.entries.get(&RecordType::DNAME)
            {
                if *expires > now && *credibility >= min_credibility && rdatas.len() == 1 {
                    return Some(ResourceRecord {
                        name: ancestor,
                        rtype_with_data: rdatas[0].clone(),
                        rclass: self.rclass,
                        ttl: remaining_ttl(*expires, now),
                    });
                }
            }
        }

        None
    }

    /// Insert a positive RRset, subject to the credibility rules.
    fn insert_entry(
        &mut self,
        name: &DomainName,
        rtype: RecordType,
        rdatas: Vec<RecordTypeWithData>,
        ttl: u32,
        credibility: Credibility,
        now: Instant,
    ) {
        let expires = now + Duration::from_secs(u64::from(ttl)).min(self.max_ttl);

        if let Some(partition) = self.partitions.get_mut(name) {
            // a live name-wide negative gives way only to
            // equal-or-better data
            if let Some(marker) = partition.nxdomain {
                if marker.expires > now && marker.credibility > credibility {
                    return;
                }
                partition.nxdomain = None;
                partition.size -= 1;
                self.current_size -= 1;
            }
        }

        let entry = match self.existing_entry(name, rtype, now) {
            Some((existing_credibility, existing_expires)) => {
                if existing_credibility > credibility {
                    return;
                }
                Entry::Positive {
                    rdatas,
                    credibility,
                    expires: if existing_credibility == credibility {
                        existing_expires.min(expires)
                    } else {
                        expires
                    },
                }
            }
            None => Entry::Positive {
                rdatas,
                credibility,
                expires,
            },
        };

        self.put_entry(name, rtype, entry, now);
    }

    /// Insert a name-wide negative marker, displacing any positives
    /// of no-better credibility.
    fn insert_nxdomain(
        &mut self,
        name: &DomainName,
        credibility: Credibility,
        ttl: u32,
        now: Instant,
    ) {
        let expires = now + Duration::from_secs(u64::from(ttl)).min(self.max_negative_ttl);

        if let Some(partition) = self.partitions.get_mut(name) {
            let best_positive = partition
                .entries
                .values()
                .filter(|entry| entry.expires() > now)
                .map(Entry::credibility)
                .max();
            if let Some(best) = best_positive {
                if best > credibility {
                    return;
                }
            }
            if let Some(marker) = partition.nxdomain {
                if marker.expires > now && marker.credibility > credibility {
                    return;
                }
            }

            self.current_size -= partition.size;
            partition.entries.clear();
            partition.nxdomain = Some(NegativeEntry {
                credibility,
                expires,
            });
            partition.size = 1;
            partition.last_read = now;
            partition.next_expiry = expires;
            self.current_size += 1;
            self.access_priority
                .change_priority(name, Reverse(partition.last_read));
            self.expiry_priority
                .change_priority(name, Reverse(partition.next_expiry));
        } else {
            let partition = Partition {
                last_read: now,
                next_expiry: expires,
                size: 1,
                nxdomain: Some(NegativeEntry {
                    credibility,
                    expires,
                }),
                entries: HashMap::new(),
            };
            self.access_priority
                .push(name.clone(), Reverse(partition.last_read));
            self.expiry_priority
                .push(name.clone(), Reverse(partition.next_expiry));
            self.partitions.insert(name.clone(), partition);
            self.current_size += 1;
        }
    }

    /// Insert a per-type negative marker, subject to the credibility
    /// rules.
    fn insert_nxrrset(
        &mut self,
        name: &DomainName,
        rtype: RecordType,
        credibility: Credibility,
        ttl: u32,
        now: Instant,
    ) {
        let expires = now + Duration::from_secs(u64::from(ttl)).min(self.max_negative_ttl);

        if let Some(partition) = self.partitions.get(name) {
            if let Some(marker) = partition.nxdomain {
                if marker.expires > now {
                    // name-wide negative already covers this
                    return;
                }
            }
        }

        if let Some((existing_credibility, _)) = self.existing_entry(name, rtype, now) {
            if existing_credibility > credibility {
                return;
            }
        }

        self.put_entry(
            name,
            rtype,
            Entry::Negative(NegativeEntry {
                credibility,
                expires,
            }),
            now,
        );
    }

    /// The credibility and expiry of the live entry at (name, type),
    /// if there is one.
    fn existing_entry(
        &self,
        name: &DomainName,
        rtype: RecordType,
        now: Instant,
    ) -> Option<(Credibility, Instant)> {
        let partition = self.partitions.get(name)?;
        let entry = partition.entries.get(&rtype)?;
        if entry.expires() > now {
            Some((entry.credibility(), entry.expires()))
        } else {
            None
        }
    }

    /// Store an entry, maintaining the partition bookkeeping and the
    /// priority queues.
    fn put_entry(&mut self, name: &DomainName, rtype: RecordType, entry: Entry, now: Instant) {
        if let Some(partition) = self.partitions.get_mut(name) {
            if partition.entries.insert(rtype, entry).is_none() {
                partition.size += 1;
                self.current_size += 1;
            }
            partition.last_read = now;
            partition.next_expiry = partition_next_expiry(partition);
            self.access_priority
                .change_priority(name, Reverse(partition.last_read));
            self.expiry_priority
                .change_priority(name, Reverse(partition.next_expiry));
        } else {
            let next_expiry = entry.expires();
            let mut entries = HashMap::new();
            entries.insert(rtype, entry);
            let partition = Partition {
                last_read: now,
                next_expiry,
                size: 1,
                nxdomain: None,
                entries,
            };
            self.access_priority
                .push(name.clone(), Reverse(partition.last_read));
            self.expiry_priority
                .push(name.clone(), Reverse(partition.next_expiry));
            self.partitions.insert(name.clone(), partition);
            self.current_size += 1;
        }
    }

    /// Create negative entries from an NXDOMAIN or NODATA response,
    /// with the TTL taken from the SOA in the authority section (the
    /// smaller of its MINIMUM field and its own TTL, RFC 2308 section
    /// 3).  A response with no usable SOA caches nothing negative.
    fn ingest_negative(&mut self, message: &Message, now: Instant) {
        let Some(question) = message.questions.first() else {
            return;
        };
        if question.qclass != QueryClass::Record(self.rclass) {
            return;
        }
        if !message.answers.is_empty() {
            return;
        }

        let negative_ttl = message.authority.iter().find_map(|rr| {
            if let RecordTypeWithData::SOA { minimum, .. } = &rr.rtype_with_data {
                if question.name.is_subdomain_of(&rr.name) {
                    Some((*minimum).min(rr.ttl))
                } else {
                    None
                }
            } else {
                None
            }
        });
        let Some(negative_ttl) = negative_ttl else {
            return;
        };
        if negative_ttl == 0 {
            return;
        }

        let credibility = if message.header.is_authoritative {
            Credibility::AuthAuthority
        } else {
            Credibility::NonAuthAuthority
        };

        match message.header.rcode {
            Rcode::NameError => {
                tracing::trace!(name = %question.name, ttl = %negative_ttl, "caching nxdomain");
                self.insert_nxdomain(&question.name, credibility, negative_ttl, now);
            }
            Rcode::NoError | Rcode::NXRRset => {
                if let QueryType::Record(rtype) = question.qtype {
                    tracing::trace!(name = %question.name, %rtype, ttl = %negative_ttl, "caching nxrrset");
                    self.insert_nxrrset(&question.name, rtype, credibility, negative_ttl, now);
                }
            }
            _ => (),
        }
    }

    /// Delete all expired entries.
    ///
    /// Returns the number of entries deleted.
    fn remove_expired(&mut self) -> usize {
        let mut pruned = 0;

        loop {
            let before = pruned;
            pruned += self.remove_expired_step();
            if before == pruned {
                break;
            }
        }

        pruned
    }

    /// Helper for `remove_expired`: looks at the next-to-expire name
    /// and cleans up expired entries from it.  This may delete more
    /// than one entry, and may even delete the whole name.
    ///
    /// Returns the number of entries removed.
    fn remove_expired_step(&mut self) -> usize {
        if let Some((name, Reverse(expiry))) = self.expiry_priority.pop() {
            let now = Instant::now();

            if expiry > now {
                self.expiry_priority.push(name, Reverse(expiry));
                return 0;
            }

            if let Some(partition) = self.partitions.get_mut(&name) {
                let mut pruned = 0;

                if let Some(marker) = partition.nxdomain {
                    if marker.expires <= now {
                        partition.nxdomain = None;
                        pruned += 1;
                    }
                }

                let before = partition.entries.len();
                partition.entries.retain(|_, entry| entry.expires() > now);
                pruned += before - partition.entries.len();

                partition.size -= pruned;
                self.current_size -= pruned;

                if partition.size == 0 {
                    self.partitions.remove(&name);
                    self.access_priority.remove(&name);
                } else {
                    partition.next_expiry = partition_next_expiry(partition);
                    let next_expiry = partition.next_expiry;
                    self.expiry_priority.push(name, Reverse(next_expiry));
                }

                pruned
            } else {
                self.access_priority.remove(&name);
                0
            }
        } else {
            0
        }
    }

    /// Helper for `prune`: deletes all entries associated with the
    /// least recently used name.
    ///
    /// Returns the number of entries removed.
    fn remove_least_recently_used(&mut self) -> usize {
        if let Some((name, _)) = self.access_priority.pop() {
            self.expiry_priority.remove(&name);

            if let Some(partition) = self.partitions.remove(&name) {
                let pruned = partition.size;
                self.current_size -= pruned;
                pruned
            } else {
                0
            }
        } else {
            0
        }
    }
}

enum DirectOutcome {
    Answer(Vec<ResourceRecord>),
    Cname(ResourceRecord),
    NxDomain,
    NxRrset,
    Miss,
}

enum Probe {
    Positive(Vec<RecordTypeWithData>, Instant),
    Negative,
    Expired,
    Absent,
}

/// The minimum expiry over a partition's entries and negative marker.
/// Only meaningful for non-empty partitions.
fn partition_next_expiry(partition: &Partition) -> Instant {
    let mut next = partition.nxdomain.map(|marker| marker.expires);
    for entry in partition.entries.values() {
        next = Some(match next {
            Some(t) => t.min(entry.expires()),
            None => entry.expires(),
        });
    }
    next.unwrap_or_else(Instant::now)
}

fn remaining_ttl(expires: Instant, now: Instant) -> u32 {
    expires
        .saturating_duration_since(now)
        .as_secs()
        .try_into()
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use dns_types::protocol::types::test_util::*;
    use std::net::Ipv4Addr;

    use super::test_util::*;
    use super::*;

    fn answer_message(question_name: &str, answers: Vec<ResourceRecord>) -> Message {
        let mut message = Message::from_question(
            1234,
            Question {
                name: domain(question_name),
                qtype: QueryType::Record(RecordType::A),
                qclass: QueryClass::Record(RecordClass::IN),
            },
        )
        .make_response();
        message.answers = answers;
        message
    }

    fn nxdomain_message(question_name: &str, soa_minimum: u32) -> Message {
        let mut message = answer_message(question_name, Vec::new());
        message.header.rcode = Rcode::NameError;
        message.authority.push(soa_record("example.com.", soa_minimum));
        message
    }

    fn nodata_message(question_name: &str, soa_minimum: u32) -> Message {
        let mut message = answer_message(question_name, Vec::new());
        message.authority.push(soa_record("example.com.", soa_minimum));
        message
    }

    #[test]
    fn cache_put_can_get() {
        let mut cache = Cache::new(RecordClass::IN);
        let rr = a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1));
        cache.ingest(&answer_message("www.example.com.", vec![rr.clone()]));

        if let CacheResponse::Found { chain, rrs } = cache.lookup(
            &rr.name,
            RecordType::A,
            Credibility::NonAuthAnswer,
        ) {
            assert!(chain.is_empty());
            assert_cache_response(&rr, &rrs);
        } else {
            panic!("expected a hit");
        }
    }

    #[test]
    fn cache_unknown_for_absent_data() {
        let mut cache = Cache::new(RecordClass::IN);

        assert_eq!(
            CacheResponse::Unknown,
            cache.lookup(
                &domain("www.example.com."),
                RecordType::A,
                Credibility::NonAuthAnswer,
            )
        );
    }

    #[test]
    fn cache_ignores_other_classes() {
        let mut cache = Cache::new(RecordClass::CH);
        let rr = a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1));
        cache.ingest(&answer_message("www.example.com.", vec![rr.clone()]));

        assert_eq!(
            CacheResponse::Unknown,
            cache.lookup(&rr.name, RecordType::A, Credibility::NonAuthAnswer)
        );
    }

    #[test]
    fn cache_does_not_cache_zero_ttl() {
        let mut cache = Cache::new(RecordClass::IN);
        let mut rr = a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1));
        rr.ttl = 0;
        cache.ingest(&answer_message("www.example.com.", vec![rr.clone()]));

        assert_eq!(
            CacheResponse::Unknown,
            cache.lookup(&rr.name, RecordType::A, Credibility::NonAuthAnswer)
        );
    }

    #[test]
    fn cache_respects_minimum_credibility() {
        let mut cache = Cache::new(RecordClass::IN);
        let rr = a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1));
        // non-authoritative response: NonAuthAnswer credibility
        cache.ingest(&answer_message("www.example.com.", vec![rr.clone()]));

        assert!(matches!(
            cache.lookup(&rr.name, RecordType::A, Credibility::NonAuthAnswer),
            CacheResponse::Found { .. }
        ));
        assert_eq!(
            CacheResponse::Unknown,
            cache.lookup(&rr.name, RecordType::A, Credibility::AuthAnswer)
        );
    }

    #[test]
    fn cache_credibility_is_nondecreasing() {
        let mut cache = Cache::new(RecordClass::IN);
        let auth_rr = a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1));
        let nonauth_rr = a_record("www.example.com.", Ipv4Addr::new(8, 8, 8, 8));

        let mut auth_message = answer_message("www.example.com.", vec![auth_rr.clone()]);
        auth_message.header.is_authoritative = true;
        cache.ingest(&auth_message);

        // a later, less-credible answer must not displace it
        cache.ingest(&answer_message("www.example.com.", vec![nonauth_rr]));

        if let CacheResponse::Found { rrs, .. } =
            cache.lookup(&auth_rr.name, RecordType::A, Credibility::NonAuthAnswer)
        {
            assert_cache_response(&auth_rr, &rrs);
        } else {
            panic!("expected a hit");
        }
    }

    #[test]
    fn cache_equal_credibility_last_writer_wins() {
        let mut cache = Cache::new(RecordClass::IN);
        let rr1 = a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1));
        let rr2 = a_record("www.example.com.", Ipv4Addr::new(2, 2, 2, 2));

        cache.ingest(&answer_message("www.example.com.", vec![rr1]));
        cache.ingest(&answer_message("www.example.com.", vec![rr2.clone()]));

        if let CacheResponse::Found { rrs, .. } =
            cache.lookup(&rr2.name, RecordType::A, Credibility::NonAuthAnswer)
        {
            assert_cache_response(&rr2, &rrs);
        } else {
            panic!("expected a hit");
        }
    }

    #[test]
    fn cache_follows_cname_chains() {
        let mut cache = Cache::new(RecordClass::IN);
        let cname1 = cname_record("www.example.com.", "alias.example.com.");
        let cname2 = cname_record("alias.example.com.", "real.example.com.");
        let a = a_record("real.example.com.", Ipv4Addr::new(1, 1, 1, 1));

        cache.ingest(&answer_message(
            "www.example.com.",
            vec![cname1.clone(), cname2.clone(), a.clone()],
        ));

        if let CacheResponse::Found { chain, rrs } = cache.lookup(
            &domain("www.example.com."),
            RecordType::A,
            Credibility::NonAuthAnswer,
        ) {
            assert_eq!(2, chain.len());
            assert_eq!(cname1.name, chain[0].name);
            assert_eq!(cname2.name, chain[1].name);
            assert_cache_response(&a, &rrs);
        } else {
            panic!("expected a hit");
        }
    }

    #[test]
    fn cache_partial_for_incomplete_chain() {
        let mut cache = Cache::new(RecordClass::IN);
        let cname = cname_record("www.example.com.", "alias.example.com.");

        cache.ingest(&answer_message("www.example.com.", vec![cname.clone()]));

        if let CacheResponse::Partial { chain } = cache.lookup(
            &domain("www.example.com."),
            RecordType::A,
            Credibility::NonAuthAnswer,
        ) {
            assert_eq!(1, chain.len());
            assert_eq!(cname.name, chain[0].name);
        } else {
            panic!("expected a partial chain");
        }
    }

    #[test]
    fn cache_dname_covers_subdomains() {
        let mut cache = Cache::new(RecordClass::IN);
        let dname = dname_record("old.example.", "new.example.");
        cache.ingest(&answer_message("old.example.", vec![dname.clone()]));

        if let CacheResponse::Dname { rr } = cache.lookup(
            &domain("x.old.example."),
            RecordType::A,
            Credibility::NonAuthAnswer,
        ) {
            assert_eq!(dname.name, rr.name);
            assert_eq!(dname.rtype_with_data, rr.rtype_with_data);
        } else {
            panic!("expected a dname");
        }

        // but not the owner itself
        assert_eq!(
            CacheResponse::Unknown,
            cache.lookup(
                &domain("old.example."),
                RecordType::A,
                Credibility::NonAuthAnswer,
            )
        );
    }

    #[test]
    fn cache_negative_nxdomain() {
        let mut cache = Cache::new(RecordClass::IN);
        cache.ingest(&nxdomain_message("gone.example.com.", 300));

        assert_eq!(
            CacheResponse::NxDomain,
            cache.lookup(
                &domain("gone.example.com."),
                RecordType::A,
                Credibility::NonAuthAnswer,
            )
        );
        // nxdomain is name-wide
        assert_eq!(
            CacheResponse::NxDomain,
            cache.lookup(
                &domain("gone.example.com."),
                RecordType::MX,
                Credibility::NonAuthAnswer,
            )
        );
    }

    #[test]
    fn cache_negative_nxrrset_is_per_type() {
        let mut cache = Cache::new(RecordClass::IN);
        cache.ingest(&nodata_message("www.example.com.", 300));

        assert_eq!(
            CacheResponse::NxRrset,
            cache.lookup(
                &domain("www.example.com."),
                RecordType::A,
                Credibility::NonAuthAnswer,
            )
        );
        assert_eq!(
            CacheResponse::Unknown,
            cache.lookup(
                &domain("www.example.com."),
                RecordType::MX,
                Credibility::NonAuthAnswer,
            )
        );
    }

    #[test]
    fn cache_negative_needs_soa() {
        let mut cache = Cache::new(RecordClass::IN);
        let mut message = answer_message("gone.example.com.", Vec::new());
        message.header.rcode = Rcode::NameError;
        cache.ingest(&message);

        assert_eq!(
            CacheResponse::Unknown,
            cache.lookup(
                &domain("gone.example.com."),
                RecordType::A,
                Credibility::NonAuthAnswer,
            )
        );
    }

    #[test]
    fn cache_nxdomain_displaces_positives() {
        let mut cache = Cache::new(RecordClass::IN);
        let rr = a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1));
        cache.ingest(&answer_message("www.example.com.", vec![rr.clone()]));

        let mut nx = nxdomain_message("www.example.com.", 300);
        nx.header.is_authoritative = true;
        cache.ingest(&nx);

        assert_eq!(
            CacheResponse::NxDomain,
            cache.lookup(&rr.name, RecordType::A, Credibility::NonAuthAnswer)
        );
    }

    #[test]
    fn cache_positives_displace_nxdomain() {
        let mut cache = Cache::new(RecordClass::IN);
        cache.ingest(&nxdomain_message("www.example.com.", 300));

        let rr = a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1));
        let mut message = answer_message("www.example.com.", vec![rr.clone()]);
        message.header.is_authoritative = true;
        cache.ingest(&message);

        assert!(matches!(
            cache.lookup(&rr.name, RecordType::A, Credibility::NonAuthAnswer),
            CacheResponse::Found { .. }
        ));
    }

    #[test]
    fn cache_negative_ttl_uses_soa_minimum() {
        let mut cache = Cache::new(RecordClass::IN);
        // SOA TTL 300, MINIMUM 0: negative TTL min(0, 300) = 0, so
        // nothing is cached
        cache.ingest(&nxdomain_message("gone.example.com.", 0));

        assert_eq!(
            CacheResponse::Unknown,
            cache.lookup(
                &domain("gone.example.com."),
                RecordType::A,
                Credibility::NonAuthAnswer,
            )
        );
    }

    #[test]
    fn cache_expired_entries_are_not_returned() {
        let mut cache = Cache::new(RecordClass::IN);
        let name = domain("www.example.com.");
        let now = Instant::now();

        // a TTL of zero expires immediately
        cache.insert_entry(
            &name,
            RecordType::A,
            vec![RecordTypeWithData::A {
                address: Ipv4Addr::new(1, 1, 1, 1),
            }],
            0,
            Credibility::AuthAnswer,
            now,
        );

        assert_eq!(
            CacheResponse::Unknown,
            cache.lookup(&name, RecordType::A, Credibility::NonAuthAnswer)
        );
        // the read lazily evicted it
        assert_eq!(0, cache.current_size);
    }

    #[test]
    fn cache_prune_removes_expired() {
        let mut cache = Cache::new(RecordClass::IN);
        let now = Instant::now();

        for i in 0..10 {
            let name = domain(&format!("host-{i}.example.com."));
            cache.insert_entry(
                &name,
                RecordType::A,
                vec![RecordTypeWithData::A {
                    address: Ipv4Addr::new(1, 1, 1, 1),
                }],
                if i % 2 == 0 { 0 } else { 300 },
                Credibility::AuthAnswer,
                now,
            );
        }

        let (overflow, current_size, expired, pruned) = cache.prune();
        assert!(!overflow);
        assert_eq!(5, expired);
        assert_eq!(0, pruned);
        assert_eq!(5, current_size);
        assert_invariants(&cache);
    }

    #[test]
    fn cache_put_then_prune_maintains_invariants() {
        let mut cache = Cache::with_desired_size(RecordClass::IN, 25);

        for i in 0..100 {
            let rr = a_record(&format!("host-{i}.example.com."), Ipv4Addr::new(1, 1, 1, 1));
            cache.ingest(&answer_message(&rr.name.to_dotted_string(), vec![rr.clone()]));
        }

        let (overflow, current_size, expired, pruned) = cache.prune();
        assert!(overflow);
        assert_eq!(0, expired);
        assert!(pruned >= 75);
        assert!(cache.current_size <= 25);
        assert_eq!(cache.current_size, current_size);
        assert_invariants(&cache);
    }

    #[test]
    fn cache_put_maintains_invariants() {
        let mut cache = Cache::new(RecordClass::IN);

        for _ in 0..100 {
            let mut rr = arbitrary_resourcerecord();
            rr.rclass = RecordClass::IN;
            rr.ttl = 300;
            let name = rr.name.to_dotted_string();
            cache.ingest(&answer_message(&name, vec![rr]));
        }

        assert_invariants(&cache);
    }

    fn assert_invariants(cache: &Cache) {
        assert_eq!(
            cache.current_size,
            cache.partitions.values().map(|p| p.size).sum::<usize>()
        );

        assert_eq!(cache.partitions.len(), cache.access_priority.len());
        assert_eq!(cache.partitions.len(), cache.expiry_priority.len());

        for (name, partition) in &cache.partitions {
            assert_eq!(
                partition.size,
                partition.entries.len() + usize::from(partition.nxdomain.is_some()),
                "bad size for {name}",
            );
            assert!(partition.size > 0, "empty partition for {name}");
            if partition.nxdomain.is_some() {
                assert!(
                    partition.entries.is_empty(),
                    "nxdomain alongside positives for {name}",
                );
            }
            assert_eq!(
                partition.next_expiry,
                partition_next_expiry(partition),
                "bad next_expiry for {name}",
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
pub mod test_util {
    use super::*;

    /// Assert that the cache response has exactly one element and
    /// that it matches the original (all fields equal except TTL,
    /// where the original is >=).
    pub fn assert_cache_response(original: &ResourceRecord, response: &[ResourceRecord]) {
        assert_eq!(1, response.len());
        let cached = response[0].clone();

        assert_eq!(original.name, cached.name);
        assert_eq!(original.rtype_with_data, cached.rtype_with_data);
        assert_eq!(original.rclass, cached.rclass);
        assert!(original.ttl >= cached.ttl);
    }
}
