use bytes::Bytes;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Maximum encoded length of a domain name.  The number of labels
/// plus sum of the lengths of the labels.
pub const DOMAINNAME_MAX_LEN: usize = 255;

/// Maximum length of a single label in a domain name.
pub const LABEL_MAX_LEN: usize = 63;

/// Octet mask for the QR flag being set (response).
pub const HEADER_MASK_QR: u8 = 0b1000_0000;

/// Octet mask for the opcode field.
pub const HEADER_MASK_OPCODE: u8 = 0b0111_1000;

/// Offset for the opcode field.
pub const HEADER_OFFSET_OPCODE: usize = 3;

/// Octet mask for the AA flag being set (authoritative)
pub const HEADER_MASK_AA: u8 = 0b0000_0100;

/// Octet mask for the TC flag being set (truncated)
pub const HEADER_MASK_TC: u8 = 0b0000_0010;

/// Octet mask for the RD flag being set (desired)
pub const HEADER_MASK_RD: u8 = 0b0000_0001;

/// Octet mask for the RA flag being set (available)
pub const HEADER_MASK_RA: u8 = 0b1000_0000;

/// Octet mask for the AD flag being set (authentic data)
pub const HEADER_MASK_AD: u8 = 0b0010_0000;

/// Octet mask for the CD flag being set (checking disabled)
pub const HEADER_MASK_CD: u8 = 0b0001_0000;

/// Octet mask for the rcode field.
pub const HEADER_MASK_RCODE: u8 = 0b0000_1111;

/// Offset for the rcode field.
pub const HEADER_OFFSET_RCODE: usize = 0;

/// Basic DNS message format, used for both queries and responses.
///
/// ```text
///     +---------------------+
///     |        Header       |
///     +---------------------+
///     |       Question      | the question for the name server
///     +---------------------+
///     |        Answer       | RRs answering the question
///     +---------------------+
///     |      Authority      | RRs pointing toward an authority
///     +---------------------+
///     |      Additional     | RRs holding additional information
///     +---------------------+
/// ```
///
/// See section 4.1 of RFC 1035.
///
/// If the additional section of a message holds an OPT pseudo-record
/// (RFC 6891), it is lifted out into the `edns` field during
/// deserialisation and written back during serialisation: it never
/// appears as a normal record.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
    pub edns: Option<Edns>,
}

impl Message {
    pub fn make_response(&self) -> Self {
        Self {
            header: Header {
                id: self.header.id,
                is_response: true,
                opcode: self.header.opcode,
                is_authoritative: false,
                is_truncated: false,
                recursion_desired: self.header.recursion_desired,
                recursion_available: true,
                authentic_data: false,
                checking_disabled: false,
                rcode: Rcode::NoError,
            },
            questions: self.questions.clone(),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            edns: None,
        }
    }

    pub fn from_question(id: u16, question: Question) -> Self {
        Self {
            header: Header {
                id,
                is_response: false,
                opcode: Opcode::Standard,
                is_authoritative: false,
                is_truncated: false,
                recursion_desired: false,
                recursion_available: false,
                authentic_data: false,
                checking_disabled: false,
                rcode: Rcode::NoError,
            },
            questions: vec![question],
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            edns: None,
        }
    }
}

/// Common header type for all messages.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      ID                       |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |QR|   Opcode  |AA|TC|RD|RA| Z|AD|CD|   RCODE   |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    QDCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    ANCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    NSCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                    ARCOUNT                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.1 of RFC 1035, with the AD and CD bits carved out
/// of the Z field by RFC 4035.  The Z bit proper is always written as
/// zero and ignored on read.
///
/// The QDCOUNT, ANCOUNT, NSCOUNT, and ARCOUNT fields are omitted from this
/// type, as they are only used during serialisation and deserialisation and can
/// be inferred from the other `Message` fields.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Header {
    /// A 16 bit identifier assigned by the program that generates any
    /// kind of query.  This identifier is copied the corresponding
    /// reply and can be used by the requester to match up replies to
    /// outstanding queries.
    pub id: u16,

    /// A one bit field that specifies whether this message is a query
    /// (0), or a response (1).
    pub is_response: bool,

    /// A four bit field that specifies kind of query in this message.
    /// This value is set by the originator of a query and copied into
    /// the response.
    pub opcode: Opcode,

    /// Authoritative Answer - this bit is valid in responses, and
    /// specifies that the responding name server is an authority for
    /// the domain name in question section.
    pub is_authoritative: bool,

    /// Truncation - specifies that this message was truncated due to
    /// length greater than that permitted on the transmission
    /// channel.
    pub is_truncated: bool,

    /// Recursion Desired - this bit may be set in a query and is
    /// copied into the response.  If RD is set, it directs the name
    /// server to pursue the query recursively.  Recursive query
    /// support is optional.
    pub recursion_desired: bool,

    /// Recursion Available - this be is set or cleared in a response,
    /// and denotes whether recursive query support is available in
    /// the name server.
    pub recursion_available: bool,

    /// Authentic Data - in a response, indicates that all the data
    /// included in the answer and authority sections has been
    /// validated by the server (RFC 4035 section 3.2.3).
    pub authentic_data: bool,

    /// Checking Disabled - in a query, indicates that the client
    /// accepts non-validated data (RFC 4035 section 3.2.2).
    pub checking_disabled: bool,

    /// Response code - the low 4 bits of this field live in the
    /// header proper; the presence of an OPT record extends it to 12
    /// bits (RFC 6891 section 6.1.3).
    pub rcode: Rcode,
}

/// The EDNS data carried by a message's OPT pseudo-record, minus the
/// extended RCODE bits (which are folded into `Header.rcode`).
///
/// See section 6 of RFC 6891.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Edns {
    /// The requestor's maximum UDP payload size.
    pub payload_size: u16,

    /// EDNS version.  Only version 0 is defined.
    pub version: u8,

    /// The DO bit: the requestor understands DNSSEC records.
    pub dnssec_ok: bool,

    /// Uninterpreted options.
    pub options: Vec<EdnsOption>,
}

impl Edns {
    pub fn new() -> Self {
        Self {
            payload_size: 1232,
            version: 0,
            dnssec_ok: false,
            options: Vec::new(),
        }
    }
}

impl Default for Edns {
    fn default() -> Self {
        Self::new()
    }
}

/// A single EDNS option: an option code and uninterpreted octets.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Bytes,
}

/// The question section has a list of questions (usually 1 but
/// possibly more) being asked.  This is the structure for a single
/// question.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                                               |
///     /                     QNAME                     /
///     /                                               /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     QTYPE                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     QCLASS                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.2 of RFC 1035.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Question {
    pub name: DomainName,
    pub qtype: QueryType,
    pub qclass: QueryClass,
}

impl Question {
    pub fn is_unknown(&self) -> bool {
        self.qtype.is_unknown() || self.qclass.is_unknown()
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name.to_dotted_string(),
            self.qclass,
            self.qtype
        )
    }
}

/// The answer, authority, and additional sections are all the same
/// format: a variable number of resource records.  This is the
/// structure for a single resource record.
///
/// ```text
///                                     1  1  1  1  1  1
///       0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                                               |
///     /                                               /
///     /                      NAME                     /
///     |                                               |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TYPE                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     CLASS                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TTL                      |
///     |                                               |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                   RDLENGTH                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
///     /                     RDATA                     /
///     /                                               /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// See section 4.1.3 of RFC 1035.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ResourceRecord {
    /// a domain name to which this resource record pertains.
    pub name: DomainName,

    /// A combination of the RTYPE and RDATA fields
    pub rtype_with_data: RecordTypeWithData,

    /// two octets which specify the class of the data in the RDATA
    /// field.
    pub rclass: RecordClass,

    /// a 32 bit unsigned integer that specifies the time interval (in
    /// seconds) that the resource record may be cached before it
    /// should be discarded.  Zero values are interpreted to mean that
    /// the RR can only be used for the transaction in progress, and
    /// should not be cached.
    pub ttl: u32,
}

impl ResourceRecord {
    pub fn is_unknown(&self) -> bool {
        self.rtype_with_data.is_unknown() || self.rclass.is_unknown()
    }

    pub fn matches(&self, question: &Question) -> bool {
        self.rtype_with_data.matches(question.qtype) && self.rclass.matches(question.qclass)
    }
}

/// The shared RDATA layout of the SIG and RRSIG record types.
///
/// See section 3.1 of RFC 4034.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Signature {
    /// The type of the RRset covered by this signature.
    pub type_covered: RecordType,

    /// The cryptographic algorithm used to create the signature.
    pub algorithm: u8,

    /// The number of labels in the original owner name, not counting
    /// the root label or a leading wildcard label.
    pub labels: u8,

    /// The TTL of the covered RRset as it appears in the
    /// authoritative zone.
    pub original_ttl: u32,

    /// End of the validity period, as seconds since the POSIX epoch.
    pub expiration: u32,

    /// Start of the validity period, as seconds since the POSIX
    /// epoch.
    pub inception: u32,

    /// Identifies which key of the signer produced this signature.
    pub key_tag: u16,

    /// The owner of the DNSKEY which validates this signature.
    pub signer: DomainName,

    /// The signature octets.
    pub signature: Bytes,
}

/// A single SVCB / HTTPS service parameter: a numeric key and
/// uninterpreted value octets.
///
/// See section 2.2 of RFC 9460.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SvcParam {
    pub key: u16,
    pub value: Bytes,
}

/// A record type with its associated, deserialised, data.
///
/// The original RFC 1035 types get the full wire diagrams; later
/// types just name their defining RFC.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RecordTypeWithData {
    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    ADDRESS                    |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Where `ADDRESS` is a 32 bit Internet address.
    A { address: Ipv4Addr },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                   NSDNAME                     /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Where `NSDNAME` is a domain name which specifies a host which
    /// should be authoritative for the specified class and domain.
    NS { nsdname: DomainName },

    /// Obsolete mail destination type, kept for completeness.
    MD { madname: DomainName },

    /// Obsolete mail forwarder type, kept for completeness.
    MF { madname: DomainName },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                     CNAME                     /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Where `CNAME` is a domain name which specifies the canonical
    /// or primary name for the owner.  The owner name is an alias.
    CNAME { cname: DomainName },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                     MNAME                     /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                     RNAME                     /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    SERIAL                     |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    REFRESH                    |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                     RETRY                     |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    EXPIRE                     |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    MINIMUM                    |
    ///     |                                               |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Where `MNAME` is the primary name server for the zone, `RNAME`
    /// the responsible mailbox, and `MINIMUM` the minimum TTL to be
    /// exported with any RR from this zone - also the negative-cache
    /// TTL bound (RFC 2308).
    SOA {
        mname: DomainName,
        rname: DomainName,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                   MADNAME                     /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Where `MADNAME` is a domain name which specifies a host which
    /// has the specified mailbox.
    MB { madname: DomainName },

    /// Mail group member: one domain name.
    MG { mgmname: DomainName },

    /// Mail rename: one domain name.
    MR { newname: DomainName },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                  <anything>                   /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Anything at all may be in the RDATA field so long as it is
    /// 65535 octets or less.
    NULL { octets: Bytes },

    /// This application does not interpret `WKS` records.
    WKS { octets: Bytes },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                   PTRDNAME                    /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Where `PTRDNAME` is a domain name which points to some
    /// location in the domain name space.
    PTR { ptrdname: DomainName },

    /// Host information: two character-strings naming the CPU and
    /// operating system.
    HINFO { cpu: Bytes, os: Bytes },

    /// Mailbox information: the responsible mailbox and the
    /// error-receiving mailbox.
    MINFO {
        rmailbx: DomainName,
        emailbx: DomainName,
    },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                  PREFERENCE                   |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     /                   EXCHANGE                    /
    ///     /                                               /
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Where `PREFERENCE` is a 16 bit integer which specifies the
    /// preference given to this RR among others at the same owner.
    /// Lower values are preferred.
    ///
    /// Where `EXCHANGE` is a domain name which specifies a host
    /// willing to act as a mail exchange for the owner name.
    MX {
        preference: u16,
        exchange: DomainName,
    },

    /// One or more character-strings.
    TXT { strings: Vec<Bytes> },

    /// Responsible person: a mailbox and a domain name at which TXT
    /// records can be found (RFC 1183).
    RP { mbox: DomainName, txt: DomainName },

    /// AFS database location (RFC 1183).
    AFSDB { subtype: u16, hostname: DomainName },

    /// Route through: like MX but for the experimental routing types
    /// (RFC 1183).
    RT {
        preference: u16,
        intermediate: DomainName,
    },

    /// Predecessor of RRSIG with the same layout (RFC 2535).
    SIG { signature: Signature },

    /// X.400 mapping information (RFC 2163).
    PX {
        preference: u16,
        map822: DomainName,
        mapx400: DomainName,
    },

    /// ```text
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    ///     |                    ADDRESS                    |
    ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
    /// ```
    ///
    /// Where `ADDRESS` is a 128 bit Internet address.
    AAAA { address: Ipv6Addr },

    /// Service location: priority, weight, port, and the target host
    /// (RFC 2782).
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    },

    /// Naming-authority pointer (RFC 3403).  `flags`, `services`, and
    /// `regexp` are character-strings.
    NAPTR {
        order: u16,
        preference: u16,
        flags: Bytes,
        services: Bytes,
        regexp: Bytes,
        replacement: DomainName,
    },

    /// Key exchanger (RFC 2230).
    KX {
        preference: u16,
        exchanger: DomainName,
    },

    /// A certificate, e.g. a PKIX or OpenPGP certificate (RFC 4398).
    CERT {
        certificate_type: u16,
        key_tag: u16,
        algorithm: u8,
        certificate: Bytes,
    },

    /// Like CNAME, but redirects an entire subtree of the namespace
    /// under the owner to the same subtree under the target
    /// (RFC 6672).
    DNAME { target: DomainName },

    /// Delegation signer: identifies a DNSKEY of a delegated zone
    /// (RFC 4034 section 5).
    DS {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Bytes,
    },

    /// SSH public-key fingerprint (RFC 4255).
    SSHFP {
        algorithm: u8,
        fingerprint_type: u8,
        fingerprint: Bytes,
    },

    /// Signature over an RRset (RFC 4034 section 3).
    RRSIG { signature: Signature },

    /// Authenticated denial of existence: the next owner name in
    /// canonical zone order, and the types present at this owner
    /// (RFC 4034 section 4).
    NSEC {
        next: DomainName,
        types: Vec<RecordType>,
    },

    /// A public key for DNSSEC validation (RFC 4034 section 2).
    DNSKEY {
        flags: u16,
        protocol: u8,
        algorithm: u8,
        public_key: Bytes,
    },

    /// DHCP client identifier (RFC 4701).
    DHCID { octets: Bytes },

    /// Hashed authenticated denial of existence (RFC 5155 section 3).
    NSEC3 {
        algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: Bytes,
        next_hashed: Bytes,
        types: Vec<RecordType>,
    },

    /// The NSEC3 hash parameters of a zone (RFC 5155 section 4).
    NSEC3PARAM {
        algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: Bytes,
    },

    /// TLS certificate association (RFC 6698).
    TLSA {
        usage: u8,
        selector: u8,
        matching_type: u8,
        certificate_data: Bytes,
    },

    /// S/MIME certificate association, same layout as TLSA
    /// (RFC 8162).
    SMIMEA {
        usage: u8,
        selector: u8,
        matching_type: u8,
        certificate_data: Bytes,
    },

    /// A DS published by the child zone (RFC 7344).
    CDS {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Bytes,
    },

    /// A DNSKEY published by the child zone (RFC 7344).
    CDNSKEY {
        flags: u16,
        protocol: u8,
        algorithm: u8,
        public_key: Bytes,
    },

    /// An OpenPGP transferable public key (RFC 7929).
    OPENPGPKEY { octets: Bytes },

    /// General-purpose service binding (RFC 9460).  A priority of
    /// zero means alias mode, where the parameters must be empty.
    SVCB {
        priority: u16,
        target: DomainName,
        params: Vec<SvcParam>,
    },

    /// Service binding specialised for HTTPS origins (RFC 9460).
    HTTPS {
        priority: u16,
        target: DomainName,
        params: Vec<SvcParam>,
    },

    /// Certification authority authorization (RFC 8659).
    CAA { flags: u8, tag: Bytes, value: Bytes },

    /// Any other record.
    Unknown {
        tag: RecordTypeUnknown,
        octets: Bytes,
    },
}

impl RecordTypeWithData {
    pub fn is_unknown(&self) -> bool {
        self.rtype().is_unknown()
    }

    pub fn matches(&self, qtype: QueryType) -> bool {
        self.rtype().matches(qtype)
    }

    pub fn rtype(&self) -> RecordType {
        match self {
            RecordTypeWithData::A { .. } => RecordType::A,
            RecordTypeWithData::NS { .. } => RecordType::NS,
            RecordTypeWithData::MD { .. } => RecordType::MD,
            RecordTypeWithData::MF { .. } => RecordType::MF,
            RecordTypeWithData::CNAME { .. } => RecordType::CNAME,
            RecordTypeWithData::SOA { .. } => RecordType::SOA,
            RecordTypeWithData::MB { .. } => RecordType::MB,
            RecordTypeWithData::MG { .. } => RecordType::MG,
            RecordTypeWithData::MR { .. } => RecordType::MR,
            RecordTypeWithData::NULL { .. } => RecordType::NULL,
            RecordTypeWithData::WKS { .. } => RecordType::WKS,
            RecordTypeWithData::PTR { .. } => RecordType::PTR,
            RecordTypeWithData::HINFO { .. } => RecordType::HINFO,
            RecordTypeWithData::MINFO { .. } => RecordType::MINFO,
            RecordTypeWithData::MX { .. } => RecordType::MX,
            RecordTypeWithData::TXT { .. } => RecordType::TXT,
            RecordTypeWithData::RP { .. } => RecordType::RP,
            RecordTypeWithData::AFSDB { .. } => RecordType::AFSDB,
            RecordTypeWithData::RT { .. } => RecordType::RT,
            RecordTypeWithData::SIG { .. } => RecordType::SIG,
            RecordTypeWithData::PX { .. } => RecordType::PX,
            RecordTypeWithData::AAAA { .. } => RecordType::AAAA,
            RecordTypeWithData::SRV { .. } => RecordType::SRV,
            RecordTypeWithData::NAPTR { .. } => RecordType::NAPTR,
            RecordTypeWithData::KX { .. } => RecordType::KX,
            RecordTypeWithData::CERT { .. } => RecordType::CERT,
            RecordTypeWithData::DNAME { .. } => RecordType::DNAME,
            RecordTypeWithData::DS { .. } => RecordType::DS,
            RecordTypeWithData::SSHFP { .. } => RecordType::SSHFP,
            RecordTypeWithData::RRSIG { .. } => RecordType::RRSIG,
            RecordTypeWithData::NSEC { .. } => RecordType::NSEC,
            RecordTypeWithData::DNSKEY { .. } => RecordType::DNSKEY,
            RecordTypeWithData::DHCID { .. } => RecordType::DHCID,
            RecordTypeWithData::NSEC3 { .. } => RecordType::NSEC3,
            RecordTypeWithData::NSEC3PARAM { .. } => RecordType::NSEC3PARAM,
            RecordTypeWithData::TLSA { .. } => RecordType::TLSA,
            RecordTypeWithData::SMIMEA { .. } => RecordType::SMIMEA,
            RecordTypeWithData::CDS { .. } => RecordType::CDS,
            RecordTypeWithData::CDNSKEY { .. } => RecordType::CDNSKEY,
            RecordTypeWithData::OPENPGPKEY { .. } => RecordType::OPENPGPKEY,
            RecordTypeWithData::SVCB { .. } => RecordType::SVCB,
            RecordTypeWithData::HTTPS { .. } => RecordType::HTTPS,
            RecordTypeWithData::CAA { .. } => RecordType::CAA,
            RecordTypeWithData::Unknown { tag, .. } => RecordType::Unknown(*tag),
        }
    }
}

/// What sort of query this is.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Opcode {
    Standard,
    Inverse,
    Status,
    Reserved(OpcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Opcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct OpcodeReserved(u8);

impl Opcode {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Opcode::Reserved(_))
    }
}

impl From<u8> for Opcode {
    fn from(octet: u8) -> Self {
        match octet & 0b0000_1111 {
            0 => Opcode::Standard,
            1 => Opcode::Inverse,
            2 => Opcode::Status,
            other => Opcode::Reserved(OpcodeReserved(other)),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(value: Opcode) -> Self {
        match value {
            Opcode::Standard => 0,
            Opcode::Inverse => 1,
            Opcode::Status => 2,
            Opcode::Reserved(OpcodeReserved(octet)) => octet,
        }
    }
}

/// What sort of response this is.
///
/// The rcode is nominally a 4 bit field, but an OPT record widens it
/// to 12 bits, so conversions go through `u16`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Rcode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    YXDomain,
    YXRRset,
    NXRRset,
    NotAuth,
    NotZone,
    BadVersion,
    Reserved(RcodeReserved),
}

/// A struct with a private constructor, to ensure invalid `Rcode`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RcodeReserved(u16);

impl Rcode {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Rcode::Reserved(_))
    }

    /// Whether this rcode needs an OPT record to be expressed on the
    /// wire.
    pub fn is_extended(&self) -> bool {
        u16::from(*self) > 0b1111
    }
}

impl fmt::Display for Rcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rcode::NoError => write!(f, "no-error"),
            Rcode::FormatError => write!(f, "format-error"),
            Rcode::ServerFailure => write!(f, "server-failure"),
            Rcode::NameError => write!(f, "name-error"),
            Rcode::NotImplemented => write!(f, "not-implemented"),
            Rcode::Refused => write!(f, "refused"),
            Rcode::YXDomain => write!(f, "yx-domain"),
            Rcode::YXRRset => write!(f, "yx-rrset"),
            Rcode::NXRRset => write!(f, "nx-rrset"),
            Rcode::NotAuth => write!(f, "not-auth"),
            Rcode::NotZone => write!(f, "not-zone"),
            Rcode::BadVersion => write!(f, "bad-version"),
            Rcode::Reserved(_) => write!(f, "reserved"),
        }
    }
}

impl From<u16> for Rcode {
    fn from(value: u16) -> Self {
        match value & 0b0000_1111_1111_1111 {
            0 => Rcode::NoError,
            1 => Rcode::FormatError,
            2 => Rcode::ServerFailure,
            3 => Rcode::NameError,
            4 => Rcode::NotImplemented,
            5 => Rcode::Refused,
            6 => Rcode::YXDomain,
            7 => Rcode::YXRRset,
            8 => Rcode::NXRRset,
            9 => Rcode::NotAuth,
            10 => Rcode::NotZone,
            16 => Rcode::BadVersion,
            other => Rcode::Reserved(RcodeReserved(other)),
        }
    }
}

impl From<Rcode> for u16 {
    fn from(value: Rcode) -> Self {
        match value {
            Rcode::NoError => 0,
            Rcode::FormatError => 1,
            Rcode::ServerFailure => 2,
            Rcode::NameError => 3,
            Rcode::NotImplemented => 4,
            Rcode::Refused => 5,
            Rcode::YXDomain => 6,
            Rcode::YXRRset => 7,
            Rcode::NXRRset => 8,
            Rcode::NotAuth => 9,
            Rcode::NotZone => 10,
            Rcode::BadVersion => 16,
            Rcode::Reserved(RcodeReserved(value)) => value,
        }
    }
}

/// A domain name is a sequence of labels, where each label is a
/// length octet followed by that number of octets.
///
/// A label must be 63 octets or shorter.  A name must be 255 octets
/// or shorter in total, including both length and label octets.
///
/// A name is *absolute* if its final label is the empty root label,
/// and *relative* otherwise.  Names parsed from the wire are always
/// absolute; relative names arise from presentation text and are
/// completed against a search path before use.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DomainName {
    pub labels: Vec<Label>,
    // INVARIANT: len == len(labels) + sum(map(len, labels))
    pub len: usize,
}

impl DomainName {
    pub fn root_domain() -> Self {
        DomainName {
            labels: vec![Label::new()],
            len: 1,
        }
    }

    pub fn is_root(&self) -> bool {
        self.len == 1 && self.labels[0].is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        self.labels[self.labels.len() - 1].is_empty()
    }

    /// Whether the first label is `*`.
    pub fn is_wildcard(&self) -> bool {
        self.labels[0].octets().as_ref() == b"*"
    }

    pub fn is_subdomain_of(&self, other: &DomainName) -> bool {
        self.labels.ends_with(&other.labels)
    }

    /// Append the root label if this name is relative.
    pub fn to_absolute(&self) -> Option<Self> {
        if self.is_absolute() {
            Some(self.clone())
        } else {
            let mut labels = self.labels.clone();
            labels.push(Label::new());
            Self::from_labels(labels)
        }
    }

    /// Concatenate this name with a suffix, returning `None` if the
    /// combined name would be over 255 octets.
    pub fn make_subdomain_of(&self, origin: &Self) -> Option<Self> {
        let mut labels = self.labels.clone();
        if self.is_absolute() {
            labels.pop();
        }
        labels.append(&mut origin.labels.clone());
        DomainName::from_labels(labels)
    }

    /// Rewrite the `owner` suffix of this name to `target`, as a
    /// DNAME record directs (RFC 6672 section 2.2).  `None` if this
    /// name is not a strict subdomain of `owner` or the rewritten
    /// name would be over 255 octets.
    pub fn replace_suffix(&self, owner: &Self, target: &Self) -> Option<Self> {
        if self.labels.len() <= owner.labels.len() || !self.is_subdomain_of(owner) {
            return None;
        }

        let keep = self.labels.len() - owner.labels.len();
        let mut labels = Vec::with_capacity(keep + target.labels.len());
        labels.extend(self.labels[..keep].iter().cloned());
        labels.extend(target.labels.iter().cloned());
        Self::from_labels(labels)
    }

    /// The dotted-string form: labels joined with `.`, so an
    /// absolute name ends with a dot (the empty root label) and a
    /// relative one does not.  The root alone is `.`.
    pub fn to_dotted_string(&self) -> String {
        if self.is_root() {
            return ".".to_string();
        }

        let mut out = String::with_capacity(self.len);
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.extend(label.octets().iter().map(|&octet| octet as char));
        }

        out
    }

    pub fn from_relative_dotted_string(origin: &Self, s: &str) -> Option<Self> {
        if s.is_empty() {
            Some(origin.clone())
        } else if s.ends_with('.') {
            Self::from_dotted_string(s)
        } else {
            Self::from_dotted_string(s).and_then(|name| name.make_subdomain_of(origin))
        }
    }

    /// Parse a dotted string.  A trailing dot stands for the empty
    /// root label and makes the name absolute; an empty label
    /// anywhere else (including an empty input) is malformed.
    pub fn from_dotted_string(s: &str) -> Option<Self> {
        if s == "." {
            return Some(Self::root_domain());
        }

        let (body, absolute) = match s.strip_suffix('.') {
            Some(stripped) => (stripped, true),
            None => (s, false),
        };

        let mut labels = Vec::new();
        for part in body.split('.') {
            if part.is_empty() {
                return None;
            }
            labels.push(Label::try_from(part.as_bytes()).ok()?);
        }
        if absolute {
            labels.push(Label::new());
        }

        Self::from_labels(labels)
    }

    pub fn from_labels(labels: Vec<Label>) -> Option<Self> {
        let Some((last, rest)) = labels.split_last() else {
            return None;
        };

        // the empty root label can only come last
        if rest.iter().any(Label::is_empty) {
            return None;
        }

        let len = labels.len()
            + usize::from(last.len())
            + rest.iter().map(|l| usize::from(l.len())).sum::<usize>();
        if len > DOMAINNAME_MAX_LEN {
            return None;
        }

        Some(Self { labels, len })
    }
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainName({})", self.to_dotted_string())
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_dotted_string())
    }
}

impl FromStr for DomainName {
    type Err = DomainNameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DomainName::from_dotted_string(s).ok_or_else(|| DomainNameParseError { input: s.into() })
    }
}

/// The string rejected when converting a `&str` into a `DomainName`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct DomainNameParseError {
    pub input: String,
}

impl fmt::Display for DomainNameParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' is not a well-formed domain name", self.input)
    }
}

impl std::error::Error for DomainNameParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// A label is just a sequence of octets, which are compared as
/// case-insensitive ASCII.  A label can be no longer than 63 octets.
///
/// Labels are lowercased on construction, so comparison of the
/// stored form is case-insensitive comparison of the original, and
/// the stored form is already canonical.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Label {
    /// Private to this crate so constructing an invalid `Label` is
    /// impossible.
    pub(crate) octets: Bytes,
}

impl Label {
    /// Create a new, empty, label.
    pub fn new() -> Self {
        Self {
            octets: Bytes::new(),
        }
    }

    #[allow(clippy::missing_panics_doc)]
    pub fn len(&self) -> u8 {
        // safe as the `TryFrom` ensures a label is <= 63 bytes
        self.octets.len().try_into().unwrap()
    }

    pub fn is_empty(&self) -> bool {
        self.octets.is_empty()
    }

    pub fn octets(&self) -> &Bytes {
        &self.octets
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<&[u8]> for Label {
    type Error = LabelTryFromOctetsError;

    fn try_from(mixed_case_octets: &[u8]) -> Result<Self, Self::Error> {
        if mixed_case_octets.len() > LABEL_MAX_LEN {
            return Err(LabelTryFromOctetsError::TooLong);
        }

        Ok(Self {
            octets: Bytes::copy_from_slice(&mixed_case_octets.to_ascii_lowercase()),
        })
    }
}

/// Errors that can arise when converting a `[u8]` into a `Label`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LabelTryFromOctetsError {
    TooLong,
}

/// Query types are a superset of record types.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum QueryType {
    Record(RecordType),
    AXFR,
    MAILB,
    MAILA,
    Wildcard,
}

impl QueryType {
    pub fn is_unknown(&self) -> bool {
        match self {
            QueryType::Record(rtype) => rtype.is_unknown(),
            _ => false,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryType::Record(rtype) => rtype.fmt(f),
            QueryType::AXFR => write!(f, "AXFR"),
            QueryType::MAILA => write!(f, "MAILA"),
            QueryType::MAILB => write!(f, "MAILB"),
            QueryType::Wildcard => write!(f, "ANY"),
        }
    }
}

impl FromStr for QueryType {
    type Err = RecordTypeFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AXFR" => Ok(QueryType::AXFR),
            "MAILA" => Ok(QueryType::MAILA),
            "MAILB" => Ok(QueryType::MAILB),
            "ANY" => Ok(QueryType::Wildcard),
            _ => RecordType::from_str(s).map(QueryType::Record),
        }
    }
}

impl From<u16> for QueryType {
    fn from(value: u16) -> Self {
        match value {
            252 => QueryType::AXFR,
            253 => QueryType::MAILB,
            254 => QueryType::MAILA,
            255 => QueryType::Wildcard,
            _ => QueryType::Record(RecordType::from(value)),
        }
    }
}

impl From<QueryType> for u16 {
    fn from(value: QueryType) -> Self {
        match value {
            QueryType::AXFR => 252,
            QueryType::MAILB => 253,
            QueryType::MAILA => 254,
            QueryType::Wildcard => 255,
            QueryType::Record(rtype) => rtype.into(),
        }
    }
}

/// Query classes are a superset of record classes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum QueryClass {
    Record(RecordClass),
    Wildcard,
}

impl QueryClass {
    pub fn is_unknown(&self) -> bool {
        match self {
            QueryClass::Record(rclass) => rclass.is_unknown(),
            QueryClass::Wildcard => false,
        }
    }
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryClass::Record(rclass) => rclass.fmt(f),
            QueryClass::Wildcard => write!(f, "ANY"),
        }
    }
}

impl FromStr for QueryClass {
    type Err = RecordClassFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANY" => Ok(QueryClass::Wildcard),
            _ => RecordClass::from_str(s).map(QueryClass::Record),
        }
    }
}

impl From<u16> for QueryClass {
    fn from(value: u16) -> Self {
        match value {
            255 => QueryClass::Wildcard,
            _ => QueryClass::Record(RecordClass::from(value)),
        }
    }
}

impl From<QueryClass> for u16 {
    fn from(value: QueryClass) -> Self {
        match value {
            QueryClass::Wildcard => 255,
            QueryClass::Record(rclass) => rclass.into(),
        }
    }
}

/// Record types are used by resource records and by queries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RecordType {
    A,
    NS,
    MD,
    MF,
    CNAME,
    SOA,
    MB,
    MG,
    MR,
    NULL,
    WKS,
    PTR,
    HINFO,
    MINFO,
    MX,
    TXT,
    RP,
    AFSDB,
    RT,
    SIG,
    PX,
    AAAA,
    SRV,
    NAPTR,
    KX,
    CERT,
    DNAME,
    OPT,
    DS,
    SSHFP,
    RRSIG,
    NSEC,
    DNSKEY,
    DHCID,
    NSEC3,
    NSEC3PARAM,
    TLSA,
    SMIMEA,
    CDS,
    CDNSKEY,
    OPENPGPKEY,
    SVCB,
    HTTPS,
    CAA,
    Unknown(RecordTypeUnknown),
}

/// A struct with a private constructor, to ensure invalid `RecordType`s
/// cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RecordTypeUnknown(u16);

impl RecordType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, RecordType::Unknown(_))
    }

    pub fn matches(&self, qtype: QueryType) -> bool {
        match qtype {
            QueryType::Wildcard => true,
            QueryType::Record(rtype) => rtype == *self,
            _ => false,
        }
    }

    /// Whether domain names embedded in the RDATA of this type may be
    /// compressed when serialised.  Only the original RFC 1035 types
    /// qualify: RFC 3597 section 4 forbids compression for everything
    /// defined later.
    pub fn compresses_rdata(&self) -> bool {
        matches!(
            self,
            RecordType::NS
                | RecordType::MD
                | RecordType::MF
                | RecordType::CNAME
                | RecordType::SOA
                | RecordType::MB
                | RecordType::MG
                | RecordType::MR
                | RecordType::PTR
                | RecordType::MINFO
                | RecordType::MX
        )
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::NS => write!(f, "NS"),
            RecordType::MD => write!(f, "MD"),
            RecordType::MF => write!(f, "MF"),
            RecordType::CNAME => write!(f, "CNAME"),
            RecordType::SOA => write!(f, "SOA"),
            RecordType::MB => write!(f, "MB"),
            RecordType::MG => write!(f, "MG"),
            RecordType::MR => write!(f, "MR"),
            RecordType::NULL => write!(f, "NULL"),
            RecordType::WKS => write!(f, "WKS"),
            RecordType::PTR => write!(f, "PTR"),
            RecordType::HINFO => write!(f, "HINFO"),
            RecordType::MINFO => write!(f, "MINFO"),
            RecordType::MX => write!(f, "MX"),
            RecordType::TXT => write!(f, "TXT"),
            RecordType::RP => write!(f, "RP"),
            RecordType::AFSDB => write!(f, "AFSDB"),
            RecordType::RT => write!(f, "RT"),
            RecordType::SIG => write!(f, "SIG"),
            RecordType::PX => write!(f, "PX"),
            RecordType::AAAA => write!(f, "AAAA"),
            RecordType::SRV => write!(f, "SRV"),
            RecordType::NAPTR => write!(f, "NAPTR"),
            RecordType::KX => write!(f, "KX"),
            RecordType::CERT => write!(f, "CERT"),
            RecordType::DNAME => write!(f, "DNAME"),
            RecordType::OPT => write!(f, "OPT"),
            RecordType::DS => write!(f, "DS"),
            RecordType::SSHFP => write!(f, "SSHFP"),
            RecordType::RRSIG => write!(f, "RRSIG"),
            RecordType::NSEC => write!(f, "NSEC"),
            RecordType::DNSKEY => write!(f, "DNSKEY"),
            RecordType::DHCID => write!(f, "DHCID"),
            RecordType::NSEC3 => write!(f, "NSEC3"),
            RecordType::NSEC3PARAM => write!(f, "NSEC3PARAM"),
            RecordType::TLSA => write!(f, "TLSA"),
            RecordType::SMIMEA => write!(f, "SMIMEA"),
            RecordType::CDS => write!(f, "CDS"),
            RecordType::CDNSKEY => write!(f, "CDNSKEY"),
            RecordType::OPENPGPKEY => write!(f, "OPENPGPKEY"),
            RecordType::SVCB => write!(f, "SVCB"),
            RecordType::HTTPS => write!(f, "HTTPS"),
            RecordType::CAA => write!(f, "CAA"),
            RecordType::Unknown(RecordTypeUnknown(n)) => write!(f, "TYPE{n}"),
        }
    }
}

impl FromStr for RecordType {
    type Err = RecordTypeFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(RecordType::A),
            "NS" => Ok(RecordType::NS),
            "MD" => Ok(RecordType::MD),
            "MF" => Ok(RecordType::MF),
            "CNAME" => Ok(RecordType::CNAME),
            "SOA" => Ok(RecordType::SOA),
            "MB" => Ok(RecordType::MB),
            "MG" => Ok(RecordType::MG),
            "MR" => Ok(RecordType::MR),
            "NULL" => Ok(RecordType::NULL),
            "WKS" => Ok(RecordType::WKS),
            "PTR" => Ok(RecordType::PTR),
            "HINFO" => Ok(RecordType::HINFO),
            "MINFO" => Ok(RecordType::MINFO),
            "MX" => Ok(RecordType::MX),
            "TXT" => Ok(RecordType::TXT),
            "RP" => Ok(RecordType::RP),
            "AFSDB" => Ok(RecordType::AFSDB),
            "RT" => Ok(RecordType::RT),
            "SIG" => Ok(RecordType::SIG),
            "PX" => Ok(RecordType::PX),
            "AAAA" => Ok(RecordType::AAAA),
            "SRV" => Ok(RecordType::SRV),
            "NAPTR" => Ok(RecordType::NAPTR),
            "KX" => Ok(RecordType::KX),
            "CERT" => Ok(RecordType::CERT),
            "DNAME" => Ok(RecordType::DNAME),
            "OPT" => Ok(RecordType::OPT),
            "DS" => Ok(RecordType::DS),
            "SSHFP" => Ok(RecordType::SSHFP),
            "RRSIG" => Ok(RecordType::RRSIG),
            "NSEC" => Ok(RecordType::NSEC),
            "DNSKEY" => Ok(RecordType::DNSKEY),
            "DHCID" => Ok(RecordType::DHCID),
            "NSEC3" => Ok(RecordType::NSEC3),
            "NSEC3PARAM" => Ok(RecordType::NSEC3PARAM),
            "TLSA" => Ok(RecordType::TLSA),
            "SMIMEA" => Ok(RecordType::SMIMEA),
            "CDS" => Ok(RecordType::CDS),
            "CDNSKEY" => Ok(RecordType::CDNSKEY),
            "OPENPGPKEY" => Ok(RecordType::OPENPGPKEY),
            "SVCB" => Ok(RecordType::SVCB),
            "HTTPS" => Ok(RecordType::HTTPS),
            "CAA" => Ok(RecordType::CAA),
            _ => {
                if let Some(type_str) = s.strip_prefix("TYPE") {
                    if let Ok(type_num) = u16::from_str(type_str) {
                        Ok(RecordType::from(type_num))
                    } else {
                        Err(RecordTypeFromStr::BadType)
                    }
                } else {
                    Err(RecordTypeFromStr::NoParse)
                }
            }
        }
    }
}

/// Errors that can arise when converting a `&str` into a `RecordType`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordTypeFromStr {
    BadType,
    NoParse,
}

impl fmt::Display for RecordTypeFromStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordTypeFromStr::BadType => write!(f, "TYPE<num> number must be a u16"),
            RecordTypeFromStr::NoParse => write!(f, "could not parse string to type"),
        }
    }
}

impl std::error::Error for RecordTypeFromStr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::NS,
            3 => RecordType::MD,
            4 => RecordType::MF,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            7 => RecordType::MB,
            8 => RecordType::MG,
            9 => RecordType::MR,
            10 => RecordType::NULL,
            11 => RecordType::WKS,
            12 => RecordType::PTR,
            13 => RecordType::HINFO,
            14 => RecordType::MINFO,
            15 => RecordType::MX,
            16 => RecordType::TXT,
            17 => RecordType::RP,
            18 => RecordType::AFSDB,
            21 => RecordType::RT,
            24 => RecordType::SIG,
            26 => RecordType::PX,
            28 => RecordType::AAAA,
            33 => RecordType::SRV,
            35 => RecordType::NAPTR,
            36 => RecordType::KX,
            37 => RecordType::CERT,
            39 => RecordType::DNAME,
            41 => RecordType::OPT,
            43 => RecordType::DS,
            44 => RecordType::SSHFP,
            46 => RecordType::RRSIG,
            47 => RecordType::NSEC,
            48 => RecordType::DNSKEY,
            49 => RecordType::DHCID,
            50 => RecordType::NSEC3,
            51 => RecordType::NSEC3PARAM,
            52 => RecordType::TLSA,
            53 => RecordType::SMIMEA,
            59 => RecordType::CDS,
            60 => RecordType::CDNSKEY,
            61 => RecordType::OPENPGPKEY,
            64 => RecordType::SVCB,
            65 => RecordType::HTTPS,
            257 => RecordType::CAA,
            _ => RecordType::Unknown(RecordTypeUnknown(value)),
        }
    }
}

impl From<RecordType> for u16 {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::MD => 3,
            RecordType::MF => 4,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::MB => 7,
            RecordType::MG => 8,
            RecordType::MR => 9,
            RecordType::NULL => 10,
            RecordType::WKS => 11,
            RecordType::PTR => 12,
            RecordType::HINFO => 13,
            RecordType::MINFO => 14,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::RP => 17,
            RecordType::AFSDB => 18,
            RecordType::RT => 21,
            RecordType::SIG => 24,
            RecordType::PX => 26,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::NAPTR => 35,
            RecordType::KX => 36,
            RecordType::CERT => 37,
            RecordType::DNAME => 39,
            RecordType::OPT => 41,
            RecordType::DS => 43,
            RecordType::SSHFP => 44,
            RecordType::RRSIG => 46,
            RecordType::NSEC => 47,
            RecordType::DNSKEY => 48,
            RecordType::DHCID => 49,
            RecordType::NSEC3 => 50,
            RecordType::NSEC3PARAM => 51,
            RecordType::TLSA => 52,
            RecordType::SMIMEA => 53,
            RecordType::CDS => 59,
            RecordType::CDNSKEY => 60,
            RecordType::OPENPGPKEY => 61,
            RecordType::SVCB => 64,
            RecordType::HTTPS => 65,
            RecordType::CAA => 257,
            RecordType::Unknown(RecordTypeUnknown(value)) => value,
        }
    }
}

/// Record classes are used by resource records and by queries.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RecordClass {
    IN,
    CH,
    HS,
    Unknown(RecordClassUnknown),
}

/// A struct with a private constructor, to ensure invalid
/// `RecordClass`es cannot be created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RecordClassUnknown(u16);

impl RecordClass {
    pub fn is_unknown(&self) -> bool {
        matches!(self, RecordClass::Unknown(_))
    }

    pub fn matches(&self, qclass: QueryClass) -> bool {
        match qclass {
            QueryClass::Wildcard => true,
            QueryClass::Record(rclass) => rclass == *self,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordClass::IN => write!(f, "IN"),
            RecordClass::CH => write!(f, "CH"),
            RecordClass::HS => write!(f, "HS"),
            RecordClass::Unknown(RecordClassUnknown(n)) => write!(f, "CLASS{n}"),
        }
    }
}

impl FromStr for RecordClass {
    type Err = RecordClassFromStr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(RecordClass::IN),
            "CH" => Ok(RecordClass::CH),
            "HS" => Ok(RecordClass::HS),
            _ => {
                if let Some(class_str) = s.strip_prefix("CLASS") {
                    if let Ok(class_num) = u16::from_str(class_str) {
                        Ok(RecordClass::from(class_num))
                    } else {
                        Err(RecordClassFromStr::BadClass)
                    }
                } else {
                    Err(RecordClassFromStr::NoParse)
                }
            }
        }
    }
}

/// Errors that can arise when converting a `&str` into a `RecordClass`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordClassFromStr {
    BadClass,
    NoParse,
}

impl fmt::Display for RecordClassFromStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordClassFromStr::BadClass => write!(f, "CLASS<num> number must be a u16"),
            RecordClassFromStr::NoParse => write!(f, "could not parse string to class"),
        }
    }
}

impl std::error::Error for RecordClassFromStr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<u16> for RecordClass {
    fn from(value: u16) -> Self {
        match value {
            1 => RecordClass::IN,
            3 => RecordClass::CH,
            4 => RecordClass::HS,
            _ => RecordClass::Unknown(RecordClassUnknown(value)),
        }
    }
}

impl From<RecordClass> for u16 {
    fn from(value: RecordClass) -> Self {
        match value {
            RecordClass::IN => 1,
            RecordClass::CH => 3,
            RecordClass::HS => 4,
            RecordClass::Unknown(RecordClassUnknown(value)) => value,
        }
    }
}

#[cfg(any(feature = "test-util", test))]
mod arbitrary_impls {
    use super::*;
    use arbitrary::{Arbitrary, Unstructured};
    use bytes::{BufMut, BytesMut};

    impl<'a> Arbitrary<'a> for Message {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            let mut header = Header::arbitrary(u)?;
            // only the 4-bit rcode space round-trips without an OPT
            header.rcode = Rcode::from(u16::from(u.arbitrary::<u8>()? & 0b1111));

            let mut questions = Vec::new();
            let mut answers = Vec::new();
            let mut authority = Vec::new();
            let mut additional = Vec::new();
            for _ in 0..u.int_in_range(0..=3)? {
                questions.push(u.arbitrary()?);
            }
            for _ in 0..u.int_in_range(0..=3)? {
                answers.push(u.arbitrary()?);
            }
            for _ in 0..u.int_in_range(0..=3)? {
                authority.push(u.arbitrary()?);
            }
            for _ in 0..u.int_in_range(0..=3)? {
                additional.push(u.arbitrary()?);
            }

            Ok(Self {
                header,
                questions,
                answers,
                authority,
                additional,
                edns: u.arbitrary()?,
            })
        }
    }

    impl<'a> Arbitrary<'a> for Header {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(Self {
                id: u.arbitrary()?,
                is_response: u.arbitrary()?,
                opcode: Opcode::from(u.arbitrary::<u8>()?),
                is_authoritative: u.arbitrary()?,
                is_truncated: u.arbitrary()?,
                recursion_desired: u.arbitrary()?,
                recursion_available: u.arbitrary()?,
                authentic_data: u.arbitrary()?,
                checking_disabled: u.arbitrary()?,
                rcode: Rcode::from(u16::from(u.arbitrary::<u8>()? & 0b1111)),
            })
        }
    }

    impl<'a> Arbitrary<'a> for Edns {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            let mut options = Vec::new();
            for _ in 0..u.int_in_range(0..=2)? {
                let len = u.int_in_range(0..=16)?;
                options.push(EdnsOption {
                    code: u.arbitrary()?,
                    data: Bytes::copy_from_slice(u.bytes(len)?),
                });
            }
            Ok(Self {
                payload_size: u.arbitrary()?,
                version: u.arbitrary()?,
                dnssec_ok: u.arbitrary()?,
                options,
            })
        }
    }

    impl<'a> Arbitrary<'a> for Question {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(Self {
                name: u.arbitrary()?,
                qtype: u.arbitrary()?,
                qclass: u.arbitrary()?,
            })
        }
    }

    impl<'a> Arbitrary<'a> for ResourceRecord {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(Self {
                name: u.arbitrary()?,
                rtype_with_data: u.arbitrary()?,
                rclass: u.arbitrary()?,
                ttl: u.arbitrary()?,
            })
        }
    }

    impl<'a> Arbitrary<'a> for Signature {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            let len = u.int_in_range(0..=64)?;
            Ok(Self {
                type_covered: u.arbitrary()?,
                algorithm: u.arbitrary()?,
                labels: u.arbitrary()?,
                original_ttl: u.arbitrary()?,
                expiration: u.arbitrary()?,
                inception: u.arbitrary()?,
                key_tag: u.arbitrary()?,
                signer: u.arbitrary()?,
                signature: Bytes::copy_from_slice(u.bytes(len)?),
            })
        }
    }

    /// Type lists as they come out of an NSEC-style bitmap: sorted by
    /// code and duplicate-free.
    fn arbitrary_type_bitmap(u: &mut Unstructured<'_>) -> arbitrary::Result<Vec<RecordType>> {
        let mut codes = Vec::new();
        for _ in 0..u.int_in_range(0..=8)? {
            codes.push(u.arbitrary::<u16>()?);
        }
        codes.sort_unstable();
        codes.dedup();
        Ok(codes.into_iter().map(RecordType::from).collect())
    }

    impl<'a> Arbitrary<'a> for RecordTypeWithData {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            let len = u.int_in_range(0..=64)?;
            let octets = Bytes::copy_from_slice(u.bytes(len)?);

            let rtype_with_data = match u.arbitrary::<RecordType>()? {
                RecordType::A => RecordTypeWithData::A {
                    address: u.arbitrary()?,
                },
                RecordType::NS => RecordTypeWithData::NS {
                    nsdname: u.arbitrary()?,
                },
                RecordType::MD => RecordTypeWithData::MD {
                    madname: u.arbitrary()?,
                },
                RecordType::MF => RecordTypeWithData::MF {
                    madname: u.arbitrary()?,
                },
                RecordType::CNAME => RecordTypeWithData::CNAME {
                    cname: u.arbitrary()?,
                },
                RecordType::SOA => RecordTypeWithData::SOA {
                    mname: u.arbitrary()?,
                    rname: u.arbitrary()?,
                    serial: u.arbitrary()?,
                    refresh: u.arbitrary()?,
                    retry: u.arbitrary()?,
                    expire: u.arbitrary()?,
                    minimum: u.arbitrary()?,
                },
                RecordType::MB => RecordTypeWithData::MB {
                    madname: u.arbitrary()?,
                },
                RecordType::MG => RecordTypeWithData::MG {
                    mgmname: u.arbitrary()?,
                },
                RecordType::MR => RecordTypeWithData::MR {
                    newname: u.arbitrary()?,
                },
                RecordType::NULL => RecordTypeWithData::NULL { octets },
                RecordType::WKS => RecordTypeWithData::WKS { octets },
                RecordType::PTR => RecordTypeWithData::PTR {
                    ptrdname: u.arbitrary()?,
                },
                RecordType::HINFO => {
                    let cpu_len = u.int_in_range(0..=16)?;
                    let os_len = u.int_in_range(0..=16)?;
                    RecordTypeWithData::HINFO {
                        cpu: Bytes::copy_from_slice(u.bytes(cpu_len)?),
                        os: Bytes::copy_from_slice(u.bytes(os_len)?),
                    }
                }
                RecordType::MINFO => RecordTypeWithData::MINFO {
                    rmailbx: u.arbitrary()?,
                    emailbx: u.arbitrary()?,
                },
                RecordType::MX => RecordTypeWithData::MX {
                    preference: u.arbitrary()?,
                    exchange: u.arbitrary()?,
                },
                RecordType::TXT => {
                    let mut strings = Vec::new();
                    for _ in 0..u.int_in_range(0..=3)? {
                        let len = u.int_in_range(0..=32)?;
                        strings.push(Bytes::copy_from_slice(u.bytes(len)?));
                    }
                    RecordTypeWithData::TXT { strings }
                }
                RecordType::RP => RecordTypeWithData::RP {
                    mbox: u.arbitrary()?,
                    txt: u.arbitrary()?,
                },
                RecordType::AFSDB => RecordTypeWithData::AFSDB {
                    subtype: u.arbitrary()?,
                    hostname: u.arbitrary()?,
                },
                RecordType::RT => RecordTypeWithData::RT {
                    preference: u.arbitrary()?,
                    intermediate: u.arbitrary()?,
                },
                RecordType::SIG => RecordTypeWithData::SIG {
                    signature: u.arbitrary()?,
                },
                RecordType::PX => RecordTypeWithData::PX {
                    preference: u.arbitrary()?,
                    map822: u.arbitrary()?,
                    mapx400: u.arbitrary()?,
                },
                RecordType::AAAA => RecordTypeWithData::AAAA {
                    address: u.arbitrary()?,
                },
                RecordType::SRV => RecordTypeWithData::SRV {
                    priority: u.arbitrary()?,
                    weight: u.arbitrary()?,
                    port: u.arbitrary()?,
                    target: u.arbitrary()?,
                },
                RecordType::NAPTR => {
                    let flags_len = u.int_in_range(0..=4)?;
                    let services_len = u.int_in_range(0..=8)?;
                    let regexp_len = u.int_in_range(0..=8)?;
                    RecordTypeWithData::NAPTR {
                        order: u.arbitrary()?,
                        preference: u.arbitrary()?,
                        flags: Bytes::copy_from_slice(u.bytes(flags_len)?),
                        services: Bytes::copy_from_slice(u.bytes(services_len)?),
                        regexp: Bytes::copy_from_slice(u.bytes(regexp_len)?),
                        replacement: u.arbitrary()?,
                    }
                }
                RecordType::KX => RecordTypeWithData::KX {
                    preference: u.arbitrary()?,
                    exchanger: u.arbitrary()?,
                },
                RecordType::CERT => RecordTypeWithData::CERT {
                    certificate_type: u.arbitrary()?,
                    key_tag: u.arbitrary()?,
                    algorithm: u.arbitrary()?,
                    certificate: octets,
                },
                RecordType::DNAME => RecordTypeWithData::DNAME {
                    target: u.arbitrary()?,
                },
                // OPT never appears as section data
                RecordType::OPT => RecordTypeWithData::NULL { octets },
                RecordType::DS => RecordTypeWithData::DS {
                    key_tag: u.arbitrary()?,
                    algorithm: u.arbitrary()?,
                    digest_type: u.arbitrary()?,
                    digest: octets,
                },
                RecordType::SSHFP => RecordTypeWithData::SSHFP {
                    algorithm: u.arbitrary()?,
                    fingerprint_type: u.arbitrary()?,
                    fingerprint: octets,
                },
                RecordType::RRSIG => RecordTypeWithData::RRSIG {
                    signature: u.arbitrary()?,
                },
                RecordType::NSEC => RecordTypeWithData::NSEC {
                    next: u.arbitrary()?,
                    types: arbitrary_type_bitmap(u)?,
                },
                RecordType::DNSKEY => RecordTypeWithData::DNSKEY {
                    flags: u.arbitrary()?,
                    protocol: u.arbitrary()?,
                    algorithm: u.arbitrary()?,
                    public_key: octets,
                },
                RecordType::DHCID => RecordTypeWithData::DHCID { octets },
                RecordType::NSEC3 => {
                    let salt_len = u.int_in_range(0..=8)?;
                    let hash_len = u.int_in_range(1..=20)?;
                    RecordTypeWithData::NSEC3 {
                        algorithm: u.arbitrary()?,
                        flags: u.arbitrary()?,
                        iterations: u.arbitrary()?,
                        salt: Bytes::copy_from_slice(u.bytes(salt_len)?),
                        next_hashed: Bytes::copy_from_slice(u.bytes(hash_len)?),
                        types: arbitrary_type_bitmap(u)?,
                    }
                }
                RecordType::NSEC3PARAM => {
                    let salt_len = u.int_in_range(0..=8)?;
                    RecordTypeWithData::NSEC3PARAM {
                        algorithm: u.arbitrary()?,
                        flags: u.arbitrary()?,
                        iterations: u.arbitrary()?,
                        salt: Bytes::copy_from_slice(u.bytes(salt_len)?),
                    }
                }
                RecordType::TLSA => RecordTypeWithData::TLSA {
                    usage: u.arbitrary()?,
                    selector: u.arbitrary()?,
                    matching_type: u.arbitrary()?,
                    certificate_data: octets,
                },
                RecordType::SMIMEA => RecordTypeWithData::SMIMEA {
                    usage: u.arbitrary()?,
                    selector: u.arbitrary()?,
                    matching_type: u.arbitrary()?,
                    certificate_data: octets,
                },
                RecordType::CDS => RecordTypeWithData::CDS {
                    key_tag: u.arbitrary()?,
                    algorithm: u.arbitrary()?,
                    digest_type: u.arbitrary()?,
                    digest: octets,
                },
                RecordType::CDNSKEY => RecordTypeWithData::CDNSKEY {
                    flags: u.arbitrary()?,
                    protocol: u.arbitrary()?,
                    algorithm: u.arbitrary()?,
                    public_key: octets,
                },
                RecordType::OPENPGPKEY => RecordTypeWithData::OPENPGPKEY { octets },
                RecordType::SVCB => RecordTypeWithData::SVCB {
                    priority: u.arbitrary()?,
                    target: u.arbitrary()?,
                    params: arbitrary_svc_params(u)?,
                },
                RecordType::HTTPS => RecordTypeWithData::HTTPS {
                    priority: u.arbitrary()?,
                    target: u.arbitrary()?,
                    params: arbitrary_svc_params(u)?,
                },
                RecordType::CAA => {
                    let tag_len = u.int_in_range(1..=8)?;
                    RecordTypeWithData::CAA {
                        flags: u.arbitrary()?,
                        tag: Bytes::copy_from_slice(u.bytes(tag_len)?),
                        value: octets,
                    }
                }
                RecordType::Unknown(tag) => RecordTypeWithData::Unknown { tag, octets },
            };
            Ok(rtype_with_data)
        }
    }

    fn arbitrary_svc_params(u: &mut Unstructured<'_>) -> arbitrary::Result<Vec<SvcParam>> {
        let mut params = Vec::new();
        for _ in 0..u.int_in_range(0..=3)? {
            let len = u.int_in_range(0..=16)?;
            params.push(SvcParam {
                key: u.arbitrary()?,
                value: Bytes::copy_from_slice(u.bytes(len)?),
            });
        }
        Ok(params)
    }

    impl<'a> Arbitrary<'a> for DomainName {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            let num_labels = u.int_in_range::<usize>(0..=10)?;
            let mut labels = Vec::new();
            for _ in 0..num_labels {
                labels.push(u.arbitrary()?);
            }
            labels.push(Label::new());
            Ok(DomainName::from_labels(labels).unwrap())
        }
    }

    impl<'a> Arbitrary<'a> for Label {
        // only generates non-empty labels
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Label> {
            let label_len = u.int_in_range::<u8>(1..=20)?;
            let mut octets = BytesMut::with_capacity(label_len.into());
            let bs = u.bytes(label_len.into())?;
            for b in bs {
                let ascii_byte = if b.is_ascii() { *b } else { *b % 128 };
                octets.put_u8(
                    if ascii_byte == b'.'
                        || ascii_byte == b'*'
                        || ascii_byte == b'@'
                        || ascii_byte == b'#'
                        || ascii_byte == b'"'
                        || ascii_byte == b'\\'
                        || (ascii_byte as char).is_whitespace()
                        || (ascii_byte as char).is_control()
                    {
                        b'x'
                    } else {
                        ascii_byte.to_ascii_lowercase()
                    },
                );
            }
            Ok(Self {
                octets: octets.freeze(),
            })
        }
    }

    impl<'a> Arbitrary<'a> for Opcode {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(Self::from(u.arbitrary::<u8>()?))
        }
    }

    impl<'a> Arbitrary<'a> for Rcode {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(Self::from(u.arbitrary::<u16>()?))
        }
    }

    impl<'a> Arbitrary<'a> for QueryType {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(Self::from(u.arbitrary::<u16>()?))
        }
    }

    impl<'a> Arbitrary<'a> for QueryClass {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(Self::from(u.arbitrary::<u16>()?))
        }
    }

    impl<'a> Arbitrary<'a> for RecordType {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(Self::from(u.arbitrary::<u16>()?))
        }
    }

    impl<'a> Arbitrary<'a> for RecordClass {
        fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(Self::from(u.arbitrary::<u16>()?))
        }
    }
}


#[cfg(any(feature = "test-util", test))]
#[allow(clippy::missing_panics_doc)]
pub mod test_util {
    use super::*;

    use arbitrary::{Arbitrary, Unstructured};
    use bytes::{BufMut, BytesMut};
    use rand::Rng;

    pub fn arbitrary_resourcerecord() -> ResourceRecord {
        let mut rng = rand::thread_rng();
        for size in [128, 256, 512, 1024, 2048, 4096] {
            let mut buf = BytesMut::with_capacity(size);
            for _ in 0..size {
                buf.put_u8(rng.gen());
            }

            if let Ok(rr) = ResourceRecord::arbitrary(&mut Unstructured::new(&buf.freeze())) {
                return rr;
            }
        }

        panic!("could not generate arbitrary value!");
    }

    pub fn arbitrary_message() -> Message {
        let mut rng = rand::thread_rng();
        for size in [512, 1024, 2048, 4096, 8192, 16384] {
            let mut buf = BytesMut::with_capacity(size);
            for _ in 0..size {
                buf.put_u8(rng.gen());
            }

            if let Ok(message) = Message::arbitrary(&mut Unstructured::new(&buf.freeze())) {
                return message;
            }
        }

        panic!("could not generate arbitrary value!");
    }

    pub fn domain(name: &str) -> DomainName {
        DomainName::from_dotted_string(name).unwrap()
    }

    pub fn a_record(name: &str, address: Ipv4Addr) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype_with_data: RecordTypeWithData::A { address },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn aaaa_record(name: &str, address: Ipv6Addr) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype_with_data: RecordTypeWithData::AAAA { address },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn cname_record(name: &str, target_name: &str) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype_with_data: RecordTypeWithData::CNAME {
                cname: domain(target_name),
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn dname_record(name: &str, target_name: &str) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype_with_data: RecordTypeWithData::DNAME {
                target: domain(target_name),
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn ns_record(superdomain_name: &str, nameserver_name: &str) -> ResourceRecord {
        ResourceRecord {
            name: domain(superdomain_name),
            rtype_with_data: RecordTypeWithData::NS {
                nsdname: domain(nameserver_name),
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn soa_record(name: &str, minimum: u32) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype_with_data: RecordTypeWithData::SOA {
                mname: domain("mname.example.com."),
                rname: domain("rname.example.com."),
                serial: 1,
                refresh: 30,
                retry: 30,
                expire: 30,
                minimum,
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }

    pub fn unknown_record(name: &str, octets: &[u8]) -> ResourceRecord {
        ResourceRecord {
            name: domain(name),
            rtype_with_data: RecordTypeWithData::Unknown {
                tag: match RecordType::from(100) {
                    RecordType::Unknown(tag) => tag,
                    _ => unreachable!(),
                },
                octets: Bytes::copy_from_slice(octets),
            },
            rclass: RecordClass::IN,
            ttl: 300,
        }
    }
}
