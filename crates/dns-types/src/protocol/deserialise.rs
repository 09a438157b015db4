//! Deserialisation of DNS messages from the network.  See the `types`
//! module for details of the format.

use bytes::Bytes;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::protocol::registry::TypeRegistry;
use crate::protocol::types::*;

impl Message {
    /// Parse a message, dispatching RDATA through the process-wide
    /// type registry.
    ///
    /// # Errors
    ///
    /// If the message cannot be parsed.
    pub fn from_octets(octets: &[u8]) -> Result<Self, Error> {
        Self::from_octets_with(octets, &crate::protocol::registry::current())
    }

    /// Parse a message with an explicit type registry.
    ///
    /// # Errors
    ///
    /// If the message cannot be parsed.
    pub fn from_octets_with(octets: &[u8], registry: &TypeRegistry) -> Result<Self, Error> {
        Self::deserialise(&mut ConsumableBuffer::new(octets), registry)
    }

    /// # Errors
    ///
    /// If the message cannot be parsed.
    pub fn deserialise(
        buffer: &mut ConsumableBuffer,
        registry: &TypeRegistry,
    ) -> Result<Self, Error> {
        let wire_header = WireHeader::deserialise(buffer)?;
        let id = wire_header.header.id;
        let mut questions = Vec::with_capacity(wire_header.qdcount.into());
        let mut answers = Vec::with_capacity(wire_header.ancount.into());
        let mut authority = Vec::with_capacity(wire_header.nscount.into());
        let mut additional = Vec::with_capacity(wire_header.arcount.into());
        let mut edns = None;

        for _ in 0..wire_header.qdcount {
            questions.push(Question::deserialise(id, buffer)?);
        }
        for _ in 0..wire_header.ancount {
            answers.push(ResourceRecord::deserialise(id, buffer, registry)?);
        }
        for _ in 0..wire_header.nscount {
            authority.push(ResourceRecord::deserialise(id, buffer, registry)?);
        }

        // the OPT pseudo-record is lifted out of the additional
        // section: it carries message-level data, not resource data.
        let mut header = wire_header.header;
        for _ in 0..wire_header.arcount {
            match AdditionalEntry::deserialise(id, buffer, registry)? {
                AdditionalEntry::Record(rr) => additional.push(rr),
                AdditionalEntry::Opt {
                    edns: e,
                    extended_rcode_bits,
                } => {
                    if edns.is_some() {
                        return Err(Error::DuplicateOpt(id));
                    }
                    let low = u16::from(header.rcode) & 0b1111;
                    header.rcode =
                        Rcode::from((u16::from(extended_rcode_bits) << 4) | low);
                    edns = Some(e);
                }
            }
        }

        Ok(Self {
            header,
            questions,
            answers,
            authority,
            additional,
            edns,
        })
    }
}

impl WireHeader {
    /// # Errors
    ///
    /// If the header is too short.
    pub fn deserialise(buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let id = buffer.next_u16().ok_or(Error::CompletelyBusted)?;
        let flags1 = buffer.next_u8().ok_or(Error::HeaderTooShort(id))?;
        let flags2 = buffer.next_u8().ok_or(Error::HeaderTooShort(id))?;
        let qdcount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let ancount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let nscount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;
        let arcount = buffer.next_u16().ok_or(Error::HeaderTooShort(id))?;

        Ok(Self {
            header: Header {
                id,
                is_response: flags1 & HEADER_MASK_QR != 0,
                opcode: Opcode::from((flags1 & HEADER_MASK_OPCODE) >> HEADER_OFFSET_OPCODE),
                is_authoritative: flags1 & HEADER_MASK_AA != 0,
                is_truncated: flags1 & HEADER_MASK_TC != 0,
                recursion_desired: flags1 & HEADER_MASK_RD != 0,
                recursion_available: flags2 & HEADER_MASK_RA != 0,
                authentic_data: flags2 & HEADER_MASK_AD != 0,
                checking_disabled: flags2 & HEADER_MASK_CD != 0,
                rcode: Rcode::from(u16::from(
                    (flags2 & HEADER_MASK_RCODE) >> HEADER_OFFSET_RCODE,
                )),
            },
            qdcount,
            ancount,
            nscount,
            arcount,
        })
    }
}

/// The header as it appears on the wire: the parsed flags plus the
/// four section counts, which are only needed while (de)serialising.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WireHeader {
    pub header: Header,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl Question {
    /// # Errors
    ///
    /// If the question cannot be parsed.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let name = DomainName::deserialise(id, buffer)?;
        let qtype = QueryType::deserialise(id, buffer)?;
        let qclass = QueryClass::deserialise(id, buffer)?;

        Ok(Self {
            name,
            qtype,
            qclass,
        })
    }
}

/// An entry in the additional section: either a normal record or the
/// OPT pseudo-record.
enum AdditionalEntry {
    Record(ResourceRecord),
    Opt { edns: Edns, extended_rcode_bits: u8 },
}

impl AdditionalEntry {
    fn deserialise(
        id: u16,
        buffer: &mut ConsumableBuffer,
        registry: &TypeRegistry,
    ) -> Result<Self, Error> {
        let name = DomainName::deserialise(id, buffer)?;
        let rtype = RecordType::deserialise(id, buffer)?;

        if rtype == RecordType::OPT {
            if !name.is_root() {
                return Err(Error::OptRecordInvalid(id));
            }

            let payload_size = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;
            let ttl = buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?;
            let extended_rcode_bits = (ttl >> 24) as u8;
            let version = (ttl >> 16) as u8;
            let dnssec_ok = ttl & 0x8000 != 0;

            let rdlength = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;
            let old_end = buffer
                .push_limit(rdlength as usize)
                .ok_or(Error::ResourceRecordTooShort(id))?;

            let mut options = Vec::new();
            while buffer.remaining() > 0 {
                let code = buffer.next_u16().ok_or(Error::OptRecordInvalid(id))?;
                let len = buffer.next_u16().ok_or(Error::OptRecordInvalid(id))?;
                let data = buffer
                    .take(len as usize)
                    .ok_or(Error::OptRecordInvalid(id))?;
                options.push(EdnsOption {
                    code,
                    data: Bytes::copy_from_slice(data),
                });
            }

            buffer.pop_limit(old_end);

            Ok(Self::Opt {
                edns: Edns {
                    payload_size,
                    version,
                    dnssec_ok,
                    options,
                },
                extended_rcode_bits,
            })
        } else {
            ResourceRecord::deserialise_after_type(id, name, rtype, buffer, registry)
                .map(Self::Record)
        }
    }
}

impl ResourceRecord {
    /// # Errors
    ///
    /// If the record cannot be parsed.
    pub fn deserialise(
        id: u16,
        buffer: &mut ConsumableBuffer,
        registry: &TypeRegistry,
    ) -> Result<Self, Error> {
        let name = DomainName::deserialise(id, buffer)?;
        let rtype = RecordType::deserialise(id, buffer)?;
        Self::deserialise_after_type(id, name, rtype, buffer, registry)
    }

    fn deserialise_after_type(
        id: u16,
        name: DomainName,
        rtype: RecordType,
        buffer: &mut ConsumableBuffer,
        registry: &TypeRegistry,
    ) -> Result<Self, Error> {
        // OPT only makes sense at the message level
        if rtype == RecordType::OPT {
            return Err(Error::OptRecordInvalid(id));
        }

        let rclass = RecordClass::deserialise(id, buffer)?;
        let ttl = buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?;
        let rdlength = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;

        let rtype_with_data = if let Some(codec) = registry.codec(u16::from(rtype)) {
            let octets = buffer
                .take(rdlength as usize)
                .ok_or(Error::ResourceRecordTooShort(id))?;
            codec
                .parse_wire(u16::from(rtype), octets)
                .map_err(|_| Error::ResourceRecordInvalid(id))?
        } else {
            RecordTypeWithData::deserialise(id, rtype, buffer, rdlength as usize)?
        };

        Ok(Self {
            name,
            rtype_with_data,
            rclass,
            ttl,
        })
    }
}

impl RecordTypeWithData {
    /// Parse RDATA for a record of the given type.  The buffer is
    /// restricted to the declared RDATA length while parsing, so a
    /// malformed record cannot read into the rest of the message, and
    /// a parse which does not consume exactly the declared length is
    /// an error.
    ///
    /// # Errors
    ///
    /// If the RDATA cannot be parsed.
    #[allow(clippy::missing_panics_doc)]
    pub fn deserialise(
        id: u16,
        rtype: RecordType,
        buffer: &mut ConsumableBuffer,
        rdlength: usize,
    ) -> Result<Self, Error> {
        let old_end = buffer
            .push_limit(rdlength)
            .ok_or(Error::ResourceRecordTooShort(id))?;

        let rdata_start = buffer.position();

        let rtype_with_data = match rtype {
            RecordType::A => RecordTypeWithData::A {
                address: Ipv4Addr::from(
                    buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                ),
            },
            RecordType::NS => RecordTypeWithData::NS {
                nsdname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::MD => RecordTypeWithData::MD {
                madname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::MF => RecordTypeWithData::MF {
                madname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::CNAME => RecordTypeWithData::CNAME {
                cname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::SOA => RecordTypeWithData::SOA {
                mname: DomainName::deserialise(id, buffer)?,
                rname: DomainName::deserialise(id, buffer)?,
                serial: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                refresh: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                retry: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                expire: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
                minimum: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
            },
            RecordType::MB => RecordTypeWithData::MB {
                madname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::MG => RecordTypeWithData::MG {
                mgmname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::MR => RecordTypeWithData::MR {
                newname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::NULL => RecordTypeWithData::NULL {
                octets: take_rest(id, buffer)?,
            },
            RecordType::WKS => RecordTypeWithData::WKS {
                octets: take_rest(id, buffer)?,
            },
            RecordType::PTR => RecordTypeWithData::PTR {
                ptrdname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::HINFO => RecordTypeWithData::HINFO {
                cpu: take_counted_string(id, buffer)?,
                os: take_counted_string(id, buffer)?,
            },
            RecordType::MINFO => RecordTypeWithData::MINFO {
                rmailbx: DomainName::deserialise(id, buffer)?,
                emailbx: DomainName::deserialise(id, buffer)?,
            },
            RecordType::MX => RecordTypeWithData::MX {
                preference: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                exchange: DomainName::deserialise(id, buffer)?,
            },
            RecordType::TXT => {
                let mut strings = Vec::new();
                while buffer.remaining() > 0 {
                    strings.push(take_counted_string(id, buffer)?);
                }
                RecordTypeWithData::TXT { strings }
            }
            RecordType::RP => RecordTypeWithData::RP {
                mbox: DomainName::deserialise(id, buffer)?,
                txt: DomainName::deserialise(id, buffer)?,
            },
            RecordType::AFSDB => RecordTypeWithData::AFSDB {
                subtype: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                hostname: DomainName::deserialise(id, buffer)?,
            },
            RecordType::RT => RecordTypeWithData::RT {
                preference: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                intermediate: DomainName::deserialise(id, buffer)?,
            },
            RecordType::SIG => RecordTypeWithData::SIG {
                signature: Signature::deserialise(id, buffer)?,
            },
            RecordType::PX => RecordTypeWithData::PX {
                preference: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                map822: DomainName::deserialise(id, buffer)?,
                mapx400: DomainName::deserialise(id, buffer)?,
            },
            RecordType::AAAA => {
                let octets = buffer
                    .take(16)
                    .ok_or(Error::ResourceRecordTooShort(id))?;
                // safe because `take` returned exactly 16 octets
                let array: [u8; 16] = octets.try_into().unwrap();
                RecordTypeWithData::AAAA {
                    address: Ipv6Addr::from(array),
                }
            }
            RecordType::SRV => RecordTypeWithData::SRV {
                priority: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                weight: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                port: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                target: DomainName::deserialise(id, buffer)?,
            },
            RecordType::NAPTR => RecordTypeWithData::NAPTR {
                order: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                preference: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                flags: take_counted_string(id, buffer)?,
                services: take_counted_string(id, buffer)?,
                regexp: take_counted_string(id, buffer)?,
                replacement: DomainName::deserialise(id, buffer)?,
            },
            RecordType::KX => RecordTypeWithData::KX {
                preference: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                exchanger: DomainName::deserialise(id, buffer)?,
            },
            RecordType::CERT => RecordTypeWithData::CERT {
                certificate_type: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                key_tag: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                certificate: take_rest(id, buffer)?,
            },
            RecordType::DNAME => RecordTypeWithData::DNAME {
                target: DomainName::deserialise(id, buffer)?,
            },
            RecordType::OPT => return Err(Error::OptRecordInvalid(id)),
            RecordType::DS => RecordTypeWithData::DS {
                key_tag: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                digest_type: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                digest: take_rest(id, buffer)?,
            },
            RecordType::SSHFP => RecordTypeWithData::SSHFP {
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                fingerprint_type: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                fingerprint: take_rest(id, buffer)?,
            },
            RecordType::RRSIG => RecordTypeWithData::RRSIG {
                signature: Signature::deserialise(id, buffer)?,
            },
            RecordType::NSEC => RecordTypeWithData::NSEC {
                next: DomainName::deserialise(id, buffer)?,
                types: take_type_bitmap(id, buffer)?,
            },
            RecordType::DNSKEY => RecordTypeWithData::DNSKEY {
                flags: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                protocol: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                public_key: take_rest(id, buffer)?,
            },
            RecordType::DHCID => RecordTypeWithData::DHCID {
                octets: take_rest(id, buffer)?,
            },
            RecordType::NSEC3 => RecordTypeWithData::NSEC3 {
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                flags: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                iterations: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                salt: take_counted_string(id, buffer)?,
                next_hashed: take_counted_string(id, buffer)?,
                types: take_type_bitmap(id, buffer)?,
            },
            RecordType::NSEC3PARAM => RecordTypeWithData::NSEC3PARAM {
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                flags: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                iterations: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                salt: take_counted_string(id, buffer)?,
            },
            RecordType::TLSA => RecordTypeWithData::TLSA {
                usage: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                selector: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                matching_type: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                certificate_data: take_rest(id, buffer)?,
            },
            RecordType::SMIMEA => RecordTypeWithData::SMIMEA {
                usage: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                selector: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                matching_type: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                certificate_data: take_rest(id, buffer)?,
            },
            RecordType::CDS => RecordTypeWithData::CDS {
                key_tag: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                digest_type: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                digest: take_rest(id, buffer)?,
            },
            RecordType::CDNSKEY => RecordTypeWithData::CDNSKEY {
                flags: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                protocol: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                public_key: take_rest(id, buffer)?,
            },
            RecordType::OPENPGPKEY => RecordTypeWithData::OPENPGPKEY {
                octets: take_rest(id, buffer)?,
            },
            RecordType::SVCB => RecordTypeWithData::SVCB {
                priority: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                target: DomainName::deserialise(id, buffer)?,
                params: take_svc_params(id, buffer)?,
            },
            RecordType::HTTPS => RecordTypeWithData::HTTPS {
                priority: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
                target: DomainName::deserialise(id, buffer)?,
                params: take_svc_params(id, buffer)?,
            },
            RecordType::CAA => RecordTypeWithData::CAA {
                flags: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
                tag: take_counted_string(id, buffer)?,
                value: take_rest(id, buffer)?,
            },
            RecordType::Unknown(tag) => RecordTypeWithData::Unknown {
                tag,
                octets: take_rest(id, buffer)?,
            },
        };

        let rdata_stop = buffer.position();
        buffer.pop_limit(old_end);

        if rdata_stop == rdata_start + rdlength {
            Ok(rtype_with_data)
        } else {
            Err(Error::ResourceRecordInvalid(id))
        }
    }
}

impl Signature {
    fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        Ok(Self {
            type_covered: RecordType::from(
                buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
            ),
            algorithm: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
            labels: buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?,
            original_ttl: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
            expiration: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
            inception: buffer.next_u32().ok_or(Error::ResourceRecordTooShort(id))?,
            key_tag: buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?,
            signer: DomainName::deserialise(id, buffer)?,
            signature: take_rest(id, buffer)?,
        })
    }
}

/// Take all remaining restricted octets as a `Bytes`.
fn take_rest(id: u16, buffer: &mut ConsumableBuffer) -> Result<Bytes, Error> {
    let len = buffer.remaining();
    let octets = buffer
        .take(len)
        .ok_or(Error::ResourceRecordTooShort(id))?;
    Ok(Bytes::copy_from_slice(octets))
}

/// Take a length-prefixed character-string.
fn take_counted_string(id: u16, buffer: &mut ConsumableBuffer) -> Result<Bytes, Error> {
    let octets = buffer
        .next_counted_string()
        .ok_or(Error::ResourceRecordTooShort(id))?;
    Ok(Bytes::copy_from_slice(octets))
}

/// Take an NSEC-style type bitmap: a sequence of (window, length,
/// bitmap) blocks covering the whole of the remaining RDATA.
///
/// See section 4.1.2 of RFC 4034.
fn take_type_bitmap(id: u16, buffer: &mut ConsumableBuffer) -> Result<Vec<RecordType>, Error> {
    let mut types = Vec::new();
    while buffer.remaining() > 0 {
        let window = buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?;
        let len = buffer.next_u8().ok_or(Error::ResourceRecordTooShort(id))?;
        if len == 0 || len > 32 {
            return Err(Error::ResourceRecordInvalid(id));
        }
        let bitmap = buffer
            .take(len as usize)
            .ok_or(Error::ResourceRecordTooShort(id))?;
        for (i, octet) in bitmap.iter().enumerate() {
            for bit in 0..8 {
                if octet & (0b1000_0000 >> bit) != 0 {
                    let code = (u16::from(window) << 8) | ((i as u16) << 3) | bit;
                    types.push(RecordType::from(code));
                }
            }
        }
    }
    Ok(types)
}

/// Take SVCB-style service parameters covering the remaining RDATA.
fn take_svc_params(id: u16, buffer: &mut ConsumableBuffer) -> Result<Vec<SvcParam>, Error> {
    let mut params = Vec::new();
    while buffer.remaining() > 0 {
        let key = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;
        let len = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;
        let value = buffer
            .take(len as usize)
            .ok_or(Error::ResourceRecordTooShort(id))?;
        params.push(SvcParam {
            key,
            value: Bytes::copy_from_slice(value),
        });
    }
    Ok(params)
}

impl DomainName {
    /// # Errors
    ///
    /// If the domain cannot be parsed.
    #[allow(clippy::missing_panics_doc)]
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let mut labels = Vec::<Label>::with_capacity(5);
        let mut len = 0;
        let start = buffer.position();

        'outer: loop {
            let size = buffer.next_u8().ok_or(Error::DomainTooShort(id))?;

            if usize::from(size) <= LABEL_MAX_LEN {
                len += 1;

                if size == 0 {
                    labels.push(Label::new());
                    break 'outer;
                }

                if let Some(os) = buffer.take(size as usize) {
                    // safe because of the bounds check above
                    let label = Label::try_from(os).unwrap();
                    len += usize::from(size);
                    labels.push(label);
                } else {
                    return Err(Error::DomainTooShort(id));
                }

                if len > DOMAINNAME_MAX_LEN {
                    break 'outer;
                }
            } else if size >= 192 {
                // this requires re-parsing the pointed-to domain -
                // not great but works for now.
                let hi = size & 0b0011_1111;
                let lo = buffer.next_u8().ok_or(Error::DomainTooShort(id))?;
                let ptr = usize::from(u16::from_be_bytes([hi, lo]));

                // pointer must be to an earlier record (not merely a
                // different one: an earlier one: RFC 1035 section
                // 4.1.4) - this also rules out pointer loops
                if ptr >= start {
                    return Err(Error::DomainPointerInvalid(id));
                }

                let mut other = DomainName::deserialise(id, &mut buffer.at_offset(ptr))?;
                len += other.len;
                labels.append(&mut other.labels);
                break 'outer;
            } else {
                return Err(Error::DomainLabelInvalid(id));
            }
        }

        if len <= DOMAINNAME_MAX_LEN {
            Ok(DomainName { labels, len })
        } else {
            Err(Error::DomainTooLong(id))
        }
    }
}

impl QueryType {
    /// # Errors
    ///
    /// If the query type is too short.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let value = buffer.next_u16().ok_or(Error::QuestionTooShort(id))?;
        Ok(Self::from(value))
    }
}

impl QueryClass {
    /// # Errors
    ///
    /// If the query class is too short.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let value = buffer.next_u16().ok_or(Error::QuestionTooShort(id))?;
        Ok(Self::from(value))
    }
}

impl RecordType {
    /// # Errors
    ///
    /// If the record type is too short.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let value = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;
        Ok(Self::from(value))
    }
}

impl RecordClass {
    /// # Errors
    ///
    /// If the record class is too short.
    pub fn deserialise(id: u16, buffer: &mut ConsumableBuffer) -> Result<Self, Error> {
        let value = buffer.next_u16().ok_or(Error::ResourceRecordTooShort(id))?;
        Ok(Self::from(value))
    }
}

/// Errors encountered when parsing a datagram.  In all the errors
/// which have a `u16` parameter, that is the ID from the header - so
/// that an error response can be sent.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// The datagram is not even 2 octets long, so it doesn't even
    /// contain a valid ID.  An error cannot even be sent back to the
    /// client in this case as, without an ID, it cannot be linked
    /// with the correct query.
    CompletelyBusted,

    /// The header is missing one or more required fields.
    HeaderTooShort(u16),

    /// A question ends with an incomplete field.
    QuestionTooShort(u16),

    /// A resource record ends with an incomplete field.
    ResourceRecordTooShort(u16),

    /// A resource record is the wrong format.
    ResourceRecordInvalid(u16),

    /// An OPT pseudo-record is malformed, misplaced, or owned by a
    /// non-root name.
    OptRecordInvalid(u16),

    /// A message has more than one OPT pseudo-record.
    DuplicateOpt(u16),

    /// A domain is incomplete.
    DomainTooShort(u16),

    /// A domain is over 255 octets in size.
    DomainTooLong(u16),

    /// A domain pointer points to or after the current record.
    DomainPointerInvalid(u16),

    /// A domain label is longer than 63 octets, but not a pointer.
    DomainLabelInvalid(u16),
}

impl Error {
    pub fn id(self) -> Option<u16> {
        match self {
            Error::CompletelyBusted => None,
            Error::HeaderTooShort(id)
            | Error::QuestionTooShort(id)
            | Error::ResourceRecordTooShort(id)
            | Error::ResourceRecordInvalid(id)
            | Error::OptRecordInvalid(id)
            | Error::DuplicateOpt(id)
            | Error::DomainTooShort(id)
            | Error::DomainTooLong(id)
            | Error::DomainPointerInvalid(id)
            | Error::DomainLabelInvalid(id) => Some(id),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::CompletelyBusted => write!(f, "datagram too short to contain an ID"),
            Error::HeaderTooShort(_) => write!(f, "header too short"),
            Error::QuestionTooShort(_) => write!(f, "question too short"),
            Error::ResourceRecordTooShort(_) => write!(f, "resource record too short"),
            Error::ResourceRecordInvalid(_) => write!(f, "resource record invalid"),
            Error::OptRecordInvalid(_) => write!(f, "OPT record invalid"),
            Error::DuplicateOpt(_) => write!(f, "more than one OPT record"),
            Error::DomainTooShort(_) => write!(f, "domain name too short"),
            Error::DomainTooLong(_) => write!(f, "domain name too long"),
            Error::DomainPointerInvalid(_) => write!(f, "domain name pointer invalid"),
            Error::DomainLabelInvalid(_) => write!(f, "domain name label invalid"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// A buffer which will be consumed by the parsing process.
///
/// The readable region can be temporarily shortened with
/// `push_limit`, so that parsing a length-delimited inner structure
/// (like RDATA) cannot read past its declared end.
pub struct ConsumableBuffer<'a> {
    octets: &'a [u8],
    position: usize,
    end: usize,
}

impl<'a> ConsumableBuffer<'a> {
    pub fn new(octets: &'a [u8]) -> Self {
        Self {
            octets,
            position: 0,
            end: octets.len(),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// How many octets remain readable before the current limit.
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.position)
    }

    /// Shorten the readable region to the next `len` octets,
    /// returning the old end for `pop_limit`.  `None` if there are
    /// fewer than `len` octets left.
    pub fn push_limit(&mut self, len: usize) -> Option<usize> {
        if self.position + len > self.end {
            return None;
        }
        let old_end = self.end;
        self.end = self.position + len;
        Some(old_end)
    }

    /// Restore the readable region saved by `push_limit`.
    pub fn pop_limit(&mut self, old_end: usize) {
        self.end = old_end;
    }

    pub fn next_u8(&mut self) -> Option<u8> {
        if self.end > self.position {
            let a = self.octets[self.position];
            self.position += 1;
            Some(a)
        } else {
            None
        }
    }

    pub fn next_u16(&mut self) -> Option<u16> {
        if self.end > self.position + 1 {
            let a = self.octets[self.position];
            let b = self.octets[self.position + 1];
            self.position += 2;
            Some(u16::from_be_bytes([a, b]))
        } else {
            None
        }
    }

    pub fn next_u32(&mut self) -> Option<u32> {
        if self.end > self.position + 3 {
            let a = self.octets[self.position];
            let b = self.octets[self.position + 1];
            let c = self.octets[self.position + 2];
            let d = self.octets[self.position + 3];
            self.position += 4;
            Some(u32::from_be_bytes([a, b, c, d]))
        } else {
            None
        }
    }

    pub fn take(&mut self, size: usize) -> Option<&'a [u8]> {
        if self.end >= self.position + size {
            let slice = &self.octets[self.position..self.position + size];
            self.position += size;
            Some(slice)
        } else {
            None
        }
    }

    /// Take a length-prefixed character-string (RFC 1035 section
    /// 3.3).
    pub fn next_counted_string(&mut self) -> Option<&'a [u8]> {
        let len = self.next_u8()?;
        self.take(len as usize)
    }

    /// A fresh view of the same octets at the given position, with no
    /// limit.  Used to chase compression pointers, which always point
    /// at earlier parts of the message.
    pub fn at_offset(&self, position: usize) -> ConsumableBuffer<'a> {
        Self {
            octets: self.octets,
            position,
            end: self.octets.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::registry;
    use crate::protocol::types::test_util::*;

    #[test]
    fn deserialise_counts_must_match() {
        let mut message = Message::from_question(
            1234,
            Question {
                name: domain("www.example.com."),
                qtype: QueryType::Record(RecordType::A),
                qclass: QueryClass::Record(RecordClass::IN),
            },
        );
        message.answers.push(a_record(
            "www.example.com.",
            std::net::Ipv4Addr::new(1, 1, 1, 1),
        ));
        let mut octets = message.to_octets().unwrap();
        // claim two answers when only one is present
        octets[7] = 2;

        assert!(Message::from_octets(&octets).is_err());
    }

    #[test]
    fn deserialise_rejects_label_too_long() {
        // length octet of 64 is neither a valid label length nor a
        // pointer
        let octets = [64, b'a'];
        assert_eq!(
            Err(Error::DomainLabelInvalid(0)),
            DomainName::deserialise(0, &mut ConsumableBuffer::new(&octets))
        );
    }

    #[test]
    fn deserialise_rejects_truncated_name() {
        let octets = [3, b'w', b'w'];
        assert_eq!(
            Err(Error::DomainTooShort(0)),
            DomainName::deserialise(0, &mut ConsumableBuffer::new(&octets))
        );
    }

    #[test]
    fn deserialise_rejects_forward_pointer() {
        // a pointer at offset 0 to offset 12 is a forward pointer
        let octets = [0b1100_0000, 12, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            Err(Error::DomainPointerInvalid(0)),
            DomainName::deserialise(0, &mut ConsumableBuffer::new(&octets))
        );
    }

    #[test]
    fn deserialise_rejects_self_pointer() {
        let octets = [0b1100_0000, 0];
        assert_eq!(
            Err(Error::DomainPointerInvalid(0)),
            DomainName::deserialise(0, &mut ConsumableBuffer::new(&octets))
        );
    }

    #[test]
    fn deserialise_expands_backward_pointer() {
        #[rustfmt::skip]
        let octets = [
            3, b'w', b'w', b'w',
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e',
            3, b'c', b'o', b'm',
            0,
            // "mx" + pointer to "example.com."
            2, b'm', b'x',
            0b1100_0000, 4,
        ];

        let mut buffer = ConsumableBuffer::new(&octets);
        assert_eq!(
            Ok(domain("www.example.com.")),
            DomainName::deserialise(0, &mut buffer)
        );
        assert_eq!(
            Ok(domain("mx.example.com.")),
            DomainName::deserialise(0, &mut buffer)
        );
    }

    #[test]
    fn deserialise_rdata_cannot_read_past_rdlength() {
        // an A record whose rdlength claims 2 octets but whose
        // address needs 4: the record afterwards must not be
        // consumed as address octets
        #[rustfmt::skip]
        let octets = [
            0, // root name
            0, 1, // type A
            0, 1, // class IN
            0, 0, 0, 30, // ttl
            0, 2, // rdlength
            1, 2, 3, 4, // 2 octets of rdata, 2 of the next record
        ];

        let registry = registry::current();
        assert!(
            ResourceRecord::deserialise(0, &mut ConsumableBuffer::new(&octets), &registry).is_err()
        );
    }

    #[test]
    fn deserialise_rdata_must_consume_rdlength() {
        // a CNAME whose rdlength is larger than the encoded name
        #[rustfmt::skip]
        let octets = [
            0, // root name
            0, 5, // type CNAME
            0, 1, // class IN
            0, 0, 0, 30, // ttl
            0, 3, // rdlength: one more than the name needs
            1, b'x', 0,
        ];

        let registry = registry::current();
        assert_eq!(
            Err(Error::ResourceRecordInvalid(0)),
            ResourceRecord::deserialise(0, &mut ConsumableBuffer::new(&octets), &registry)
        );
    }

    #[test]
    fn deserialise_lifts_opt_out_of_additional() {
        let mut message = Message::from_question(
            1234,
            Question {
                name: domain("www.example.com."),
                qtype: QueryType::Record(RecordType::A),
                qclass: QueryClass::Record(RecordClass::IN),
            },
        );
        message.edns = Some(Edns {
            payload_size: 4096,
            version: 0,
            dnssec_ok: true,
            options: Vec::new(),
        });

        let octets = message.to_octets().unwrap();
        let parsed = Message::from_octets(&octets).unwrap();

        assert_eq!(message.edns, parsed.edns);
        assert!(parsed.additional.is_empty());
    }

    #[test]
    fn deserialise_folds_extended_rcode() {
        let mut message = Message::from_question(
            1234,
            Question {
                name: domain("www.example.com."),
                qtype: QueryType::Record(RecordType::A),
                qclass: QueryClass::Record(RecordClass::IN),
            },
        );
        message.header.rcode = Rcode::BadVersion;
        message.edns = Some(Edns::new());

        let octets = message.to_octets().unwrap();
        let parsed = Message::from_octets(&octets).unwrap();

        assert_eq!(Rcode::BadVersion, parsed.header.rcode);
    }

    #[test]
    fn deserialise_rejects_duplicate_opt() {
        let mut message = Message::from_question(
            1234,
            Question {
                name: domain("www.example.com."),
                qtype: QueryType::Record(RecordType::A),
                qclass: QueryClass::Record(RecordClass::IN),
            },
        );
        message.edns = Some(Edns::new());

        let mut octets = message.to_octets().unwrap();
        // serialise the OPT a second time by appending a copy of the
        // last 11 octets and bumping ARCOUNT
        let opt = octets[octets.len() - 11..].to_vec();
        octets.extend_from_slice(&opt);
        octets[11] = 2;

        assert_eq!(Err(Error::DuplicateOpt(1234)), Message::from_octets(&octets));
    }
}
