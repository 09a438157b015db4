//! Serialisation of DNS messages to the wire format.  See the `types`
//! module for details of the format.

use bytes::{BufMut, BytesMut};
use std::collections::HashMap;

use crate::protocol::types::*;

/// Largest offset expressible in a 14-bit compression pointer.
const POINTER_MAX_OFFSET: usize = 0b0011_1111_1111_1111;

impl Message {
    /// # Errors
    ///
    /// If the message is invalid (the `Message` type permits more
    /// states than strictly allowed).
    pub fn to_octets(&self) -> Result<BytesMut, Error> {
        let mut buffer = WritableBuffer::default();
        self.serialise(&mut buffer)?;
        Ok(buffer.octets)
    }

    /// Serialise a message.  The buffer is the compression context:
    /// it is scoped to this one message and pointers cannot leak
    /// between messages.
    ///
    /// # Errors
    ///
    /// If the message is invalid (the `Message` type permits more
    /// states than strictly allowed).
    pub fn serialise(&self, buffer: &mut WritableBuffer) -> Result<(), Error> {
        let qdcount = usize_to_u16(self.questions.len())?;
        let ancount = usize_to_u16(self.answers.len())?;
        let nscount = usize_to_u16(self.authority.len())?;
        let arcount = usize_to_u16(self.additional.len() + usize::from(self.edns.is_some()))?;

        if self.header.rcode.is_extended() && self.edns.is_none() {
            return Err(Error::ExtendedRcodeWithoutEdns {
                rcode: self.header.rcode,
            });
        }

        self.header.serialise(buffer);
        buffer.write_u16(qdcount);
        buffer.write_u16(ancount);
        buffer.write_u16(nscount);
        buffer.write_u16(arcount);

        for question in &self.questions {
            question.serialise(buffer);
        }
        for rr in &self.answers {
            rr.serialise(buffer, true)?;
        }
        for rr in &self.authority {
            rr.serialise(buffer, true)?;
        }
        for rr in &self.additional {
            rr.serialise(buffer, true)?;
        }
        if let Some(edns) = &self.edns {
            edns.serialise(self.header.rcode, buffer)?;
        }

        Ok(())
    }
}

impl Header {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        // octet 1
        let flag_qr = if self.is_response { HEADER_MASK_QR } else { 0 };
        let field_opcode = HEADER_MASK_OPCODE & (u8::from(self.opcode) << HEADER_OFFSET_OPCODE);
        let flag_aa = if self.is_authoritative {
            HEADER_MASK_AA
        } else {
            0
        };
        let flag_tc = if self.is_truncated { HEADER_MASK_TC } else { 0 };
        let flag_rd = if self.recursion_desired {
            HEADER_MASK_RD
        } else {
            0
        };
        // octet 2
        let flag_ra = if self.recursion_available {
            HEADER_MASK_RA
        } else {
            0
        };
        let flag_ad = if self.authentic_data {
            HEADER_MASK_AD
        } else {
            0
        };
        let flag_cd = if self.checking_disabled {
            HEADER_MASK_CD
        } else {
            0
        };
        // only the low 4 bits live in the header; the rest go in the
        // OPT record
        let field_rcode =
            HEADER_MASK_RCODE & (((u16::from(self.rcode) & 0b1111) as u8) << HEADER_OFFSET_RCODE);

        buffer.write_u16(self.id);
        buffer.write_u8(flag_qr | field_opcode | flag_aa | flag_tc | flag_rd);
        buffer.write_u8(flag_ra | flag_ad | flag_cd | field_rcode);
    }
}

impl Edns {
    /// Serialise the OPT pseudo-record, taking the extended RCODE
    /// bits from the given (possibly 12-bit) rcode.
    ///
    /// # Errors
    ///
    /// If an option is too long.
    fn serialise(&self, rcode: Rcode, buffer: &mut WritableBuffer) -> Result<(), Error> {
        let extended_rcode_bits = (u16::from(rcode) >> 4) as u8;
        let ttl = (u32::from(extended_rcode_bits) << 24)
            | (u32::from(self.version) << 16)
            | if self.dnssec_ok { 0x8000 } else { 0 };

        let mut rdlength = 0;
        for option in &self.options {
            rdlength += 4 + option.data.len();
        }

        buffer.write_u8(0); // root owner name
        buffer.write_u16(RecordType::OPT.into());
        buffer.write_u16(self.payload_size);
        buffer.write_u32(ttl);
        buffer.write_u16(usize_to_u16(rdlength)?);
        for option in &self.options {
            buffer.write_u16(option.code);
            buffer.write_u16(usize_to_u16(option.data.len())?);
            buffer.write_octets(&option.data);
        }

        Ok(())
    }
}

impl Question {
    pub fn serialise(&self, buffer: &mut WritableBuffer) {
        self.name.serialise(buffer, true);
        self.qtype.serialise(buffer);
        self.qclass.serialise(buffer);
    }
}

impl ResourceRecord {
    /// Serialise a resource record.  If `compress` is false the
    /// record is written in canonical form: no compression anywhere,
    /// as DNSSEC signing requires.  If it is true, the owner name is
    /// compressed, and names inside the RDATA are compressed only for
    /// the RFC 1035 core types (RFC 3597 forbids compressing the
    /// rest).
    ///
    /// # Errors
    ///
    /// If the RDATA is too long.
    pub fn serialise(&self, buffer: &mut WritableBuffer, compress: bool) -> Result<(), Error> {
        self.name.serialise(buffer, compress);
        self.rtype_with_data.rtype().serialise(buffer);
        self.rclass.serialise(buffer);
        buffer.write_u32(self.ttl);

        // filled in below
        let rdlength_index = buffer.index();
        buffer.write_u16(0);

        self.rtype_with_data.serialise(buffer, compress)?;

        // -2 so we don't also include the 2 octets for the rdlength
        let rdlength = usize_to_u16(buffer.index() - rdlength_index - 2)?;
        let [hi, lo] = rdlength.to_be_bytes();
        buffer.octets[rdlength_index] = hi;
        buffer.octets[rdlength_index + 1] = lo;

        Ok(())
    }
}

impl RecordTypeWithData {
    /// Serialise just the RDATA.
    ///
    /// # Errors
    ///
    /// If a counted string is too long.
    pub fn serialise(&self, buffer: &mut WritableBuffer, compress: bool) -> Result<(), Error> {
        let compress = compress && self.rtype().compresses_rdata();

        match self {
            RecordTypeWithData::A { address } => buffer.write_octets(&address.octets()),
            RecordTypeWithData::NS { nsdname } => nsdname.serialise(buffer, compress),
            RecordTypeWithData::MD { madname } => madname.serialise(buffer, compress),
            RecordTypeWithData::MF { madname } => madname.serialise(buffer, compress),
            RecordTypeWithData::CNAME { cname } => cname.serialise(buffer, compress),
            RecordTypeWithData::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                mname.serialise(buffer, compress);
                rname.serialise(buffer, compress);
                buffer.write_u32(*serial);
                buffer.write_u32(*refresh);
                buffer.write_u32(*retry);
                buffer.write_u32(*expire);
                buffer.write_u32(*minimum);
            }
            RecordTypeWithData::MB { madname } => madname.serialise(buffer, compress),
            RecordTypeWithData::MG { mgmname } => mgmname.serialise(buffer, compress),
            RecordTypeWithData::MR { newname } => newname.serialise(buffer, compress),
            RecordTypeWithData::NULL { octets } => buffer.write_octets(octets),
            RecordTypeWithData::WKS { octets } => buffer.write_octets(octets),
            RecordTypeWithData::PTR { ptrdname } => ptrdname.serialise(buffer, compress),
            RecordTypeWithData::HINFO { cpu, os } => {
                buffer.write_counted_string(cpu)?;
                buffer.write_counted_string(os)?;
            }
            RecordTypeWithData::MINFO { rmailbx, emailbx } => {
                rmailbx.serialise(buffer, compress);
                emailbx.serialise(buffer, compress);
            }
            RecordTypeWithData::MX {
                preference,
                exchange,
            } => {
                buffer.write_u16(*preference);
                exchange.serialise(buffer, compress);
            }
            RecordTypeWithData::TXT { strings } => {
                for string in strings {
                    buffer.write_counted_string(string)?;
                }
            }
            RecordTypeWithData::RP { mbox, txt } => {
                mbox.serialise(buffer, false);
                txt.serialise(buffer, false);
            }
            RecordTypeWithData::AFSDB { subtype, hostname } => {
                buffer.write_u16(*subtype);
                hostname.serialise(buffer, false);
            }
            RecordTypeWithData::RT {
                preference,
                intermediate,
            } => {
                buffer.write_u16(*preference);
                intermediate.serialise(buffer, false);
            }
            RecordTypeWithData::SIG { signature } => signature.serialise(buffer),
            RecordTypeWithData::PX {
                preference,
                map822,
                mapx400,
            } => {
                buffer.write_u16(*preference);
                map822.serialise(buffer, false);
                mapx400.serialise(buffer, false);
            }
            RecordTypeWithData::AAAA { address } => buffer.write_octets(&address.octets()),
            RecordTypeWithData::SRV {
                priority,
                weight,
                port,
                target,
            } => {
                buffer.write_u16(*priority);
                buffer.write_u16(*weight);
                buffer.write_u16(*port);
                target.serialise(buffer, false);
            }
            RecordTypeWithData::NAPTR {
                order,
                preference,
                flags,
                services,
                regexp,
                replacement,
            } => {
                buffer.write_u16(*order);
                buffer.write_u16(*preference);
                buffer.write_counted_string(flags)?;
                buffer.write_counted_string(services)?;
                buffer.write_counted_string(regexp)?;
                replacement.serialise(buffer, false);
            }
            RecordTypeWithData::KX {
                preference,
                exchanger,
            } => {
                buffer.write_u16(*preference);
                exchanger.serialise(buffer, false);
            }
            RecordTypeWithData::CERT {
                certificate_type,
                key_tag,
                algorithm,
                certificate,
            } => {
                buffer.write_u16(*certificate_type);
                buffer.write_u16(*key_tag);
                buffer.write_u8(*algorithm);
                buffer.write_octets(certificate);
            }
            RecordTypeWithData::DNAME { target } => target.serialise(buffer, false),
            RecordTypeWithData::DS {
                key_tag,
                algorithm,
                digest_type,
                digest,
            }
            | RecordTypeWithData::CDS {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => {
                buffer.write_u16(*key_tag);
                buffer.write_u8(*algorithm);
                buffer.write_u8(*digest_type);
                buffer.write_octets(digest);
            }
            RecordTypeWithData::SSHFP {
                algorithm,
                fingerprint_type,
                fingerprint,
            } => {
                buffer.write_u8(*algorithm);
                buffer.write_u8(*fingerprint_type);
                buffer.write_octets(fingerprint);
            }
            RecordTypeWithData::RRSIG { signature } => signature.serialise(buffer),
            RecordTypeWithData::NSEC { next, types } => {
                next.serialise(buffer, false);
                write_type_bitmap(buffer, types);
            }
            RecordTypeWithData::DNSKEY {
                flags,
                protocol,
                algorithm,
                public_key,
            }
            | RecordTypeWithData::CDNSKEY {
                flags,
                protocol,
                algorithm,
                public_key,
            } => {
                buffer.write_u16(*flags);
                buffer.write_u8(*protocol);
                buffer.write_u8(*algorithm);
                buffer.write_octets(public_key);
            }
            RecordTypeWithData::DHCID { octets } => buffer.write_octets(octets),
            RecordTypeWithData::NSEC3 {
                algorithm,
                flags,
                iterations,
                salt,
                next_hashed,
                types,
            } => {
                buffer.write_u8(*algorithm);
                buffer.write_u8(*flags);
                buffer.write_u16(*iterations);
                buffer.write_counted_string(salt)?;
                buffer.write_counted_string(next_hashed)?;
                write_type_bitmap(buffer, types);
            }
            RecordTypeWithData::NSEC3PARAM {
                algorithm,
                flags,
                iterations,
                salt,
            } => {
                buffer.write_u8(*algorithm);
                buffer.write_u8(*flags);
                buffer.write_u16(*iterations);
                buffer.write_counted_string(salt)?;
            }
            RecordTypeWithData::TLSA {
                usage,
                selector,
                matching_type,
                certificate_data,
            }
            | RecordTypeWithData::SMIMEA {
                usage,
                selector,
                matching_type,
                certificate_data,
            } => {
                buffer.write_u8(*usage);
                buffer.write_u8(*selector);
                buffer.write_u8(*matching_type);
                buffer.write_octets(certificate_data);
            }
            RecordTypeWithData::OPENPGPKEY { octets } => buffer.write_octets(octets),
            RecordTypeWithData::SVCB {
                priority,
                target,
                params,
            }
            | RecordTypeWithData::HTTPS {
                priority,
                target,
                params,
            } => {
                buffer.write_u16(*priority);
                target.serialise(buffer, false);
                for param in params {
                    buffer.write_u16(param.key);
                    buffer.write_u16(usize_to_u16(param.value.len())?);
                    buffer.write_octets(&param.value);
                }
            }
            RecordTypeWithData::CAA { flags, tag, value } => {
                buffer.write_u8(*flags);
                buffer.write_counted_string(tag)?;
                buffer.write_octets(value);
            }
            RecordTypeWithData::Unknown { octets, .. } => buffer.write_octets(octets),
        };

        Ok(())
    }
}

impl Signature {
    fn serialise(&self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.type_covered.into());
        buffer.write_u8(self.algorithm);
        buffer.write_u8(self.labels);
        buffer.write_u32(self.original_ttl);
        buffer.write_u32(self.expiration);
        buffer.write_u32(self.inception);
        buffer.write_u16(self.key_tag);
        self.signer.serialise(buffer, false);
        buffer.write_octets(&self.signature);
    }
}

/// Write an NSEC-style type bitmap.  Types are grouped into 256-wide
/// windows, each of which gets a (window, length, bitmap) block.
///
/// See section 4.1.2 of RFC 4034.
fn write_type_bitmap(buffer: &mut WritableBuffer, types: &[RecordType]) {
    let mut codes = types.iter().map(|t| u16::from(*t)).collect::<Vec<u16>>();
    codes.sort_unstable();
    codes.dedup();

    let mut i = 0;
    while i < codes.len() {
        let window = (codes[i] >> 8) as u8;
        let mut bitmap = [0u8; 32];
        let mut max_octet = 0;
        while i < codes.len() && (codes[i] >> 8) as u8 == window {
            let low = codes[i] & 0xff;
            let octet = (low >> 3) as usize;
            bitmap[octet] |= 0b1000_0000 >> (low & 0b111);
            max_octet = octet;
            i += 1;
        }

        buffer.write_u8(window);
        buffer.write_u8((max_octet + 1) as u8);
        buffer.write_octets(&bitmap[..=max_octet]);
    }
}

impl DomainName {
    /// Serialise a domain name, suffix by suffix: a suffix which has
    /// already been written to this message is emitted as a pointer
    /// to it (if compression is allowed), and any other suffix is
    /// written literally and remembered for later names to point at.
    pub fn serialise(&self, buffer: &mut WritableBuffer, compress: bool) {
        for i in 0..self.labels.len() {
            let label = &self.labels[i];
            if label.is_empty() {
                buffer.write_u8(0);
                return;
            }

            if compress {
                if let Some(ptr) = buffer.name_pointer(&self.labels[i..]) {
                    buffer.write_u16(ptr);
                    return;
                }
            }

            buffer.memoise_name(&self.labels[i..]);
            buffer.write_u8(label.len());
            buffer.write_octets(&label.octets);
        }
    }
}

impl QueryType {
    pub fn serialise(self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.into());
    }
}

impl QueryClass {
    pub fn serialise(self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.into());
    }
}

impl RecordType {
    pub fn serialise(self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.into());
    }
}

impl RecordClass {
    pub fn serialise(self, buffer: &mut WritableBuffer) {
        buffer.write_u16(self.into());
    }
}

/// Errors encountered when serialising a message.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// A counter does not fit in the desired width.
    CounterTooLarge { counter: usize, bits: u32 },

    /// The rcode needs more than 4 bits but there is no OPT record to
    /// carry the upper bits.
    ExtendedRcodeWithoutEdns { rcode: Rcode },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::CounterTooLarge { counter, bits } => {
                write!(f, "'{counter}' cannot be converted to a u{bits}")
            }
            Error::ExtendedRcodeWithoutEdns { rcode } => {
                write!(f, "rcode '{rcode}' needs an OPT record")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// A buffer which can be written to, for serialisation purposes.
///
/// This doubles as the name-compression context: it remembers the
/// offset of every name suffix written so far.  Since a fresh buffer
/// is used per message, offsets cannot leak from one message into
/// another.
pub struct WritableBuffer {
    pub octets: BytesMut,
    name_pointers: HashMap<Vec<Label>, u16>,
}

impl Default for WritableBuffer {
    fn default() -> Self {
        Self {
            octets: BytesMut::with_capacity(512),
            name_pointers: HashMap::new(),
        }
    }
}

impl WritableBuffer {
    pub fn index(&self) -> usize {
        self.octets.len()
    }

    /// Remember the current offset as the location of this name
    /// suffix, if it's pointable-at: a pointer has only 14 bits for
    /// the offset.
    pub fn memoise_name(&mut self, labels: &[Label]) {
        let index = self.index();
        if index <= POINTER_MAX_OFFSET && !self.name_pointers.contains_key(labels) {
            let [hi, lo] = (index as u16).to_be_bytes();
            self.name_pointers
                .insert(labels.to_vec(), u16::from_be_bytes([hi | 0b1100_0000, lo]));
        }
    }

    pub fn name_pointer(&self, labels: &[Label]) -> Option<u16> {
        self.name_pointers.get(labels).copied()
    }

    pub fn write_u8(&mut self, octet: u8) {
        self.octets.put_u8(octet);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_octets(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_octets(&value.to_be_bytes());
    }

    pub fn write_octets(&mut self, octets: &[u8]) {
        self.octets.put_slice(octets);
    }

    /// Write a length-prefixed character-string (RFC 1035 section
    /// 3.3).
    ///
    /// # Errors
    ///
    /// If the string is over 255 octets.
    pub fn write_counted_string(&mut self, octets: &[u8]) -> Result<(), Error> {
        let len = u8::try_from(octets.len()).map_err(|_| Error::CounterTooLarge {
            counter: octets.len(),
            bits: 8,
        })?;
        self.write_u8(len);
        self.write_octets(octets);
        Ok(())
    }
}

/// Helper function to convert a `usize` into a `u16` (or return an error).
///
/// # Errors
///
/// If the value cannot be converted.
fn usize_to_u16(counter: usize) -> Result<u16, Error> {
    if let Ok(t) = u16::try_from(counter) {
        Ok(t)
    } else {
        Err(Error::CounterTooLarge {
            counter,
            bits: u16::BITS,
        })
    }
}
