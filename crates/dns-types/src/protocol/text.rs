//! Presentation-format round-trip for RDATA: the textual form of each
//! record type, emitted as whitespace-separated fields and parsed
//! back from them.  This is the format needed to display and re-read
//! records, not a full zone-file grammar.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use std::fmt;

use crate::protocol::deserialise::ConsumableBuffer;
use crate::protocol::types::*;

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name.to_dotted_string(),
            self.ttl,
            self.rclass,
            self.rtype_with_data.rtype(),
            self.rtype_with_data.serialise_text(),
        )
    }
}

impl RecordTypeWithData {
    /// The presentation form of the RDATA, without the owner name,
    /// TTL, class, or type fields.
    ///
    /// Types this library does not interpret come out in the generic
    /// `\# <length> <hex>` form of RFC 3597.
    pub fn serialise_text(&self) -> String {
        let fields: Vec<String> = match self {
            RecordTypeWithData::A { address } => vec![address.to_string()],
            RecordTypeWithData::NS { nsdname } => vec![nsdname.to_dotted_string()],
            RecordTypeWithData::MD { madname } => vec![madname.to_dotted_string()],
            RecordTypeWithData::MF { madname } => vec![madname.to_dotted_string()],
            RecordTypeWithData::CNAME { cname } => vec![cname.to_dotted_string()],
            RecordTypeWithData::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => vec![
                mname.to_dotted_string(),
                rname.to_dotted_string(),
                serial.to_string(),
                refresh.to_string(),
                retry.to_string(),
                expire.to_string(),
                minimum.to_string(),
            ],
            RecordTypeWithData::MB { madname } => vec![madname.to_dotted_string()],
            RecordTypeWithData::MG { mgmname } => vec![mgmname.to_dotted_string()],
            RecordTypeWithData::MR { newname } => vec![newname.to_dotted_string()],
            RecordTypeWithData::NULL { octets } | RecordTypeWithData::WKS { octets } => {
                return serialise_generic(octets);
            }
            RecordTypeWithData::PTR { ptrdname } => vec![ptrdname.to_dotted_string()],
            RecordTypeWithData::HINFO { cpu, os } => {
                vec![serialise_character_string(cpu), serialise_character_string(os)]
            }
            RecordTypeWithData::MINFO { rmailbx, emailbx } => {
                vec![rmailbx.to_dotted_string(), emailbx.to_dotted_string()]
            }
            RecordTypeWithData::MX {
                preference,
                exchange,
            } => vec![preference.to_string(), exchange.to_dotted_string()],
            RecordTypeWithData::TXT { strings } => {
                strings.iter().map(serialise_character_string).collect()
            }
            RecordTypeWithData::RP { mbox, txt } => {
                vec![mbox.to_dotted_string(), txt.to_dotted_string()]
            }
            RecordTypeWithData::AFSDB { subtype, hostname } => {
                vec![subtype.to_string(), hostname.to_dotted_string()]
            }
            RecordTypeWithData::RT {
                preference,
                intermediate,
            } => vec![preference.to_string(), intermediate.to_dotted_string()],
            RecordTypeWithData::SIG { signature }
            | RecordTypeWithData::RRSIG { signature } => vec![
                signature.type_covered.to_string(),
                signature.algorithm.to_string(),
                signature.labels.to_string(),
                signature.original_ttl.to_string(),
                signature.expiration.to_string(),
                signature.inception.to_string(),
                signature.key_tag.to_string(),
                signature.signer.to_dotted_string(),
                BASE64.encode(&signature.signature),
            ],
            RecordTypeWithData::PX {
                preference,
                map822,
                mapx400,
            } => vec![
                preference.to_string(),
                map822.to_dotted_string(),
                mapx400.to_dotted_string(),
            ],
            RecordTypeWithData::AAAA { address } => vec![address.to_string()],
            RecordTypeWithData::SRV {
                priority,
                weight,
                port,
                target,
            } => vec![
                priority.to_string(),
                weight.to_string(),
                port.to_string(),
                target.to_dotted_string(),
            ],
            RecordTypeWithData::NAPTR {
                order,
                preference,
                flags,
                services,
                regexp,
                replacement,
            } => vec![
                order.to_string(),
                preference.to_string(),
                serialise_character_string(flags),
                serialise_character_string(services),
                serialise_character_string(regexp),
                replacement.to_dotted_string(),
            ],
            RecordTypeWithData::KX {
                preference,
                exchanger,
            } => vec![preference.to_string(), exchanger.to_dotted_string()],
            RecordTypeWithData::CERT {
                certificate_type,
                key_tag,
                algorithm,
                certificate,
            } => vec![
                certificate_type.to_string(),
                key_tag.to_string(),
                algorithm.to_string(),
                BASE64.encode(certificate),
            ],
            RecordTypeWithData::DNAME { target } => vec![target.to_dotted_string()],
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
            } => vec![
                key_tag.to_string(),
                algorithm.to_string(),
                digest_type.to_string(),
                hex::encode(digest),
            ],
            RecordTypeWithData::SSHFP {
                algorithm,
                fingerprint_type,
                fingerprint,
            } => vec![
                algorithm.to_string(),
                fingerprint_type.to_string(),
                hex::encode(fingerprint),
            ],
            RecordTypeWithData::NSEC { next, types } => {
                let mut fields = vec![next.to_dotted_string()];
                fields.extend(types.iter().map(ToString::to_string));
                fields
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
            } => vec![
                flags.to_string(),
                protocol.to_string(),
                algorithm.to_string(),
                BASE64.encode(public_key),
            ],
            RecordTypeWithData::DHCID { octets } => vec![BASE64.encode(octets)],
            RecordTypeWithData::NSEC3 {
                algorithm,
                flags,
                iterations,
                salt,
                next_hashed,
                types,
            } => {
                let mut fields = vec![
                    algorithm.to_string(),
                    flags.to_string(),
                    iterations.to_string(),
                    serialise_salt(salt),
                    base32::encode(base32::Alphabet::Rfc4648Hex { padding: false }, next_hashed),
                ];
                fields.extend(types.iter().map(ToString::to_string));
                fields
            }
            RecordTypeWithData::NSEC3PARAM {
                algorithm,
                flags,
                iterations,
                salt,
            } => vec![
                algorithm.to_string(),
                flags.to_string(),
                iterations.to_string(),
                serialise_salt(salt),
            ],
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
            } => vec![
                usage.to_string(),
                selector.to_string(),
                matching_type.to_string(),
                hex::encode(certificate_data),
            ],
            RecordTypeWithData::OPENPGPKEY { octets } => vec![BASE64.encode(octets)],
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
                let mut fields = vec![priority.to_string(), target.to_dotted_string()];
                for param in params {
                    if param.value.is_empty() {
                        fields.push(format!("key{}", param.key));
                    } else {
                        fields.push(format!("key{}={}", param.key, hex::encode(&param.value)));
                    }
                }
                fields
            }
            RecordTypeWithData::CAA { flags, tag, value } => vec![
                flags.to_string(),
                String::from_utf8_lossy(tag).into_owned(),
                serialise_character_string(value),
            ],
            RecordTypeWithData::Unknown { octets, .. } => return serialise_generic(octets),
        };

        fields.join(" ")
    }

    /// Parse RDATA for a record of the given type from
    /// whitespace-separated tokens, with embedded domain names
    /// completed relative to `origin`.
    ///
    /// The generic `\# <length> <hex>` form of RFC 3597 is accepted
    /// for any type.
    ///
    /// # Errors
    ///
    /// If the tokens do not match the type's fields.
    pub fn deserialise_text(
        rtype: RecordType,
        tokens: &[&str],
        origin: &DomainName,
    ) -> Result<Self, Error> {
        if tokens.first() == Some(&r"\#") {
            return deserialise_generic(rtype, &tokens[1..]);
        }

        let mut t = Tokens::new(tokens);

        let rtype_with_data = match rtype {
            RecordType::A => RecordTypeWithData::A {
                address: parse_token(t.next()?)?,
            },
            RecordType::NS => RecordTypeWithData::NS {
                nsdname: parse_name(t.next()?, origin)?,
            },
            RecordType::MD => RecordTypeWithData::MD {
                madname: parse_name(t.next()?, origin)?,
            },
            RecordType::MF => RecordTypeWithData::MF {
                madname: parse_name(t.next()?, origin)?,
            },
            RecordType::CNAME => RecordTypeWithData::CNAME {
                cname: parse_name(t.next()?, origin)?,
            },
            RecordType::SOA => RecordTypeWithData::SOA {
                mname: parse_name(t.next()?, origin)?,
                rname: parse_name(t.next()?, origin)?,
                serial: parse_token(t.next()?)?,
                refresh: parse_token(t.next()?)?,
                retry: parse_token(t.next()?)?,
                expire: parse_token(t.next()?)?,
                minimum: parse_token(t.next()?)?,
            },
            RecordType::MB => RecordTypeWithData::MB {
                madname: parse_name(t.next()?, origin)?,
            },
            RecordType::MG => RecordTypeWithData::MG {
                mgmname: parse_name(t.next()?, origin)?,
            },
            RecordType::MR => RecordTypeWithData::MR {
                newname: parse_name(t.next()?, origin)?,
            },
            RecordType::PTR => RecordTypeWithData::PTR {
                ptrdname: parse_name(t.next()?, origin)?,
            },
            RecordType::HINFO => RecordTypeWithData::HINFO {
                cpu: parse_character_string(t.next()?)?,
                os: parse_character_string(t.next()?)?,
            },
            RecordType::MINFO => RecordTypeWithData::MINFO {
                rmailbx: parse_name(t.next()?, origin)?,
                emailbx: parse_name(t.next()?, origin)?,
            },
            RecordType::MX => RecordTypeWithData::MX {
                preference: parse_token(t.next()?)?,
                exchange: parse_name(t.next()?, origin)?,
            },
            RecordType::TXT => {
                let mut strings = Vec::new();
                while !t.finished() {
                    strings.push(parse_character_string(t.next()?)?);
                }
                RecordTypeWithData::TXT { strings }
            }
            RecordType::RP => RecordTypeWithData::RP {
                mbox: parse_name(t.next()?, origin)?,
                txt: parse_name(t.next()?, origin)?,
            },
            RecordType::AFSDB => RecordTypeWithData::AFSDB {
                subtype: parse_token(t.next()?)?,
                hostname: parse_name(t.next()?, origin)?,
            },
            RecordType::RT => RecordTypeWithData::RT {
                preference: parse_token(t.next()?)?,
                intermediate: parse_name(t.next()?, origin)?,
            },
            RecordType::SIG => RecordTypeWithData::SIG {
                signature: parse_signature(&mut t, origin)?,
            },
            RecordType::RRSIG => RecordTypeWithData::RRSIG {
                signature: parse_signature(&mut t, origin)?,
            },
            RecordType::PX => RecordTypeWithData::PX {
                preference: parse_token(t.next()?)?,
                map822: parse_name(t.next()?, origin)?,
                mapx400: parse_name(t.next()?, origin)?,
            },
            RecordType::AAAA => RecordTypeWithData::AAAA {
                address: parse_token(t.next()?)?,
            },
            RecordType::SRV => RecordTypeWithData::SRV {
                priority: parse_token(t.next()?)?,
                weight: parse_token(t.next()?)?,
                port: parse_token(t.next()?)?,
                target: parse_name(t.next()?, origin)?,
            },
            RecordType::NAPTR => RecordTypeWithData::NAPTR {
                order: parse_token(t.next()?)?,
                preference: parse_token(t.next()?)?,
                flags: parse_character_string(t.next()?)?,
                services: parse_character_string(t.next()?)?,
                regexp: parse_character_string(t.next()?)?,
                replacement: parse_name(t.next()?, origin)?,
            },
            RecordType::KX => RecordTypeWithData::KX {
                preference: parse_token(t.next()?)?,
                exchanger: parse_name(t.next()?, origin)?,
            },
            RecordType::CERT => RecordTypeWithData::CERT {
                certificate_type: parse_token(t.next()?)?,
                key_tag: parse_token(t.next()?)?,
                algorithm: parse_token(t.next()?)?,
                certificate: parse_base64(&t.rest_joined())?,
            },
            RecordType::DNAME => RecordTypeWithData::DNAME {
                target: parse_name(t.next()?, origin)?,
            },
            RecordType::DS => {
                let (key_tag, algorithm, digest_type, digest) = parse_ds_fields(&mut t)?;
                RecordTypeWithData::DS {
                    key_tag,
                    algorithm,
                    digest_type,
                    digest,
                }
            }
            RecordType::CDS => {
                let (key_tag, algorithm, digest_type, digest) = parse_ds_fields(&mut t)?;
                RecordTypeWithData::CDS {
                    key_tag,
                    algorithm,
                    digest_type,
                    digest,
                }
            }
            RecordType::SSHFP => RecordTypeWithData::SSHFP {
                algorithm: parse_token(t.next()?)?,
                fingerprint_type: parse_token(t.next()?)?,
                fingerprint: parse_hex(&t.rest_joined())?,
            },
            RecordType::NSEC => RecordTypeWithData::NSEC {
                next: parse_name(t.next()?, origin)?,
                types: parse_type_list(&mut t)?,
            },
            RecordType::DNSKEY => {
                let (flags, protocol, algorithm, public_key) = parse_dnskey_fields(&mut t)?;
                RecordTypeWithData::DNSKEY {
                    flags,
                    protocol,
                    algorithm,
                    public_key,
                }
            }
            RecordType::CDNSKEY => {
                let (flags, protocol, algorithm, public_key) = parse_dnskey_fields(&mut t)?;
                RecordTypeWithData::CDNSKEY {
                    flags,
                    protocol,
                    algorithm,
                    public_key,
                }
            }
            RecordType::DHCID => RecordTypeWithData::DHCID {
                octets: parse_base64(&t.rest_joined())?,
            },
            RecordType::NSEC3 => RecordTypeWithData::NSEC3 {
                algorithm: parse_token(t.next()?)?,
                flags: parse_token(t.next()?)?,
                iterations: parse_token(t.next()?)?,
                salt: parse_salt(t.next()?)?,
                next_hashed: parse_base32(t.next()?)?,
                types: parse_type_list(&mut t)?,
            },
            RecordType::NSEC3PARAM => RecordTypeWithData::NSEC3PARAM {
                algorithm: parse_token(t.next()?)?,
                flags: parse_token(t.next()?)?,
                iterations: parse_token(t.next()?)?,
                salt: parse_salt(t.next()?)?,
            },
            RecordType::TLSA => {
                let (usage, selector, matching_type, certificate_data) =
                    parse_tlsa_fields(&mut t)?;
                RecordTypeWithData::TLSA {
                    usage,
                    selector,
                    matching_type,
                    certificate_data,
                }
            }
            RecordType::SMIMEA => {
                let (usage, selector, matching_type, certificate_data) =
                    parse_tlsa_fields(&mut t)?;
                RecordTypeWithData::SMIMEA {
                    usage,
                    selector,
                    matching_type,
                    certificate_data,
                }
            }
            RecordType::OPENPGPKEY => RecordTypeWithData::OPENPGPKEY {
                octets: parse_base64(&t.rest_joined())?,
            },
            RecordType::SVCB => {
                let (priority, target, params) = parse_svcb_fields(&mut t, origin)?;
                RecordTypeWithData::SVCB {
                    priority,
                    target,
                    params,
                }
            }
            RecordType::HTTPS => {
                let (priority, target, params) = parse_svcb_fields(&mut t, origin)?;
                RecordTypeWithData::HTTPS {
                    priority,
                    target,
                    params,
                }
            }
            RecordType::CAA => RecordTypeWithData::CAA {
                flags: parse_token(t.next()?)?,
                tag: Bytes::copy_from_slice(t.next()?.as_bytes()),
                value: parse_character_string(t.next()?)?,
            },
            // NULL, WKS, OPT, and unknown types only have the generic
            // form
            RecordType::NULL
            | RecordType::WKS
            | RecordType::OPT
            | RecordType::Unknown(_) => return Err(Error::GenericFormRequired { rtype }),
        };

        t.finish()?;
        Ok(rtype_with_data)
    }
}

/// Split an RDATA string into presentation tokens: whitespace
/// separates fields, but a quoted field is one token (with its quotes
/// kept, so character-string parsing can tell the two apart).
///
/// # Errors
///
/// If a quoted field is not terminated.
pub fn tokenise(s: &str) -> Result<Vec<String>, Error> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in s.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == '"' {
            current.push(c);
            in_quotes = !in_quotes;
        } else if c.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }

    if in_quotes || escaped {
        return Err(Error::UnterminatedString);
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

/// A cursor over the RDATA tokens.
struct Tokens<'a> {
    tokens: &'a [&'a str],
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(tokens: &'a [&'a str]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn next(&mut self) -> Result<&'a str, Error> {
        if self.position < self.tokens.len() {
            self.position += 1;
            Ok(self.tokens[self.position - 1])
        } else {
            Err(Error::TooFewTokens)
        }
    }

    fn finished(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// The remaining tokens joined together, for fields like
    /// signatures which may be split across several tokens.  Empty if
    /// there are none, which decodes to an empty payload.
    fn rest_joined(&mut self) -> String {
        let joined = self.tokens[self.position..].concat();
        self.position = self.tokens.len();
        joined
    }

    fn finish(&self) -> Result<(), Error> {
        if self.finished() {
            Ok(())
        } else {
            Err(Error::TrailingTokens {
                token: self.tokens[self.position].to_string(),
            })
        }
    }
}

fn parse_token<T: std::str::FromStr>(token: &str) -> Result<T, Error> {
    token.parse().map_err(|_| Error::BadToken {
        token: token.to_string(),
    })
}

fn parse_name(token: &str, origin: &DomainName) -> Result<DomainName, Error> {
    DomainName::from_relative_dotted_string(origin, token).ok_or_else(|| Error::BadName {
        token: token.to_string(),
    })
}

fn parse_hex(s: &str) -> Result<Bytes, Error> {
    hex::decode(s)
        .map(Bytes::from)
        .map_err(|_| Error::BadEncoding {
            token: s.to_string(),
        })
}

fn parse_base64(s: &str) -> Result<Bytes, Error> {
    BASE64
        .decode(s)
        .map(Bytes::from)
        .map_err(|_| Error::BadEncoding {
            token: s.to_string(),
        })
}

fn parse_base32(token: &str) -> Result<Bytes, Error> {
    base32::decode(
        base32::Alphabet::Rfc4648Hex { padding: false },
        &token.to_ascii_uppercase(),
    )
    .map(Bytes::from)
    .ok_or_else(|| Error::BadEncoding {
        token: token.to_string(),
    })
}

/// An NSEC3 salt: hex octets, or `-` for an empty salt.
fn parse_salt(token: &str) -> Result<Bytes, Error> {
    if token == "-" {
        Ok(Bytes::new())
    } else {
        parse_hex(token)
    }
}

fn serialise_salt(salt: &Bytes) -> String {
    if salt.is_empty() {
        "-".to_string()
    } else {
        hex::encode(salt)
    }
}

fn parse_signature(t: &mut Tokens<'_>, origin: &DomainName) -> Result<Signature, Error> {
    Ok(Signature {
        type_covered: parse_token(t.next()?)?,
        algorithm: parse_token(t.next()?)?,
        labels: parse_token(t.next()?)?,
        original_ttl: parse_token(t.next()?)?,
        expiration: parse_token(t.next()?)?,
        inception: parse_token(t.next()?)?,
        key_tag: parse_token(t.next()?)?,
        signer: parse_name(t.next()?, origin)?,
        signature: parse_base64(&t.rest_joined())?,
    })
}

fn parse_ds_fields(t: &mut Tokens<'_>) -> Result<(u16, u8, u8, Bytes), Error> {
    Ok((
        parse_token(t.next()?)?,
        parse_token(t.next()?)?,
        parse_token(t.next()?)?,
        parse_hex(&t.rest_joined())?,
    ))
}

fn parse_dnskey_fields(t: &mut Tokens<'_>) -> Result<(u16, u8, u8, Bytes), Error> {
    Ok((
        parse_token(t.next()?)?,
        parse_token(t.next()?)?,
        parse_token(t.next()?)?,
        parse_base64(&t.rest_joined())?,
    ))
}

fn parse_tlsa_fields(t: &mut Tokens<'_>) -> Result<(u8, u8, u8, Bytes), Error> {
    Ok((
        parse_token(t.next()?)?,
        parse_token(t.next()?)?,
        parse_token(t.next()?)?,
        parse_hex(&t.rest_joined())?,
    ))
}

fn parse_type_list(t: &mut Tokens<'_>) -> Result<Vec<RecordType>, Error> {
    let mut types = Vec::new();
    while !t.finished() {
        types.push(parse_token(t.next()?)?);
    }
    Ok(types)
}

fn parse_svcb_fields(
    t: &mut Tokens<'_>,
    origin: &DomainName,
) -> Result<(u16, DomainName, Vec<SvcParam>), Error> {
    let priority = parse_token(t.next()?)?;
    let target = parse_name(t.next()?, origin)?;

    let mut params = Vec::new();
    while !t.finished() {
        let token = t.next()?;
        let Some(rest) = token.strip_prefix("key") else {
            return Err(Error::BadToken {
                token: token.to_string(),
            });
        };

        if let Some((key, value)) = rest.split_once('=') {
            params.push(SvcParam {
                key: parse_token(key)?,
                value: parse_hex(value)?,
            });
        } else {
            params.push(SvcParam {
                key: parse_token(rest)?,
                value: Bytes::new(),
            });
        }
    }

    Ok((priority, target, params))
}

/// The generic RDATA form of RFC 3597: `\# <length> <hex>`.
fn serialise_generic(octets: &Bytes) -> String {
    if octets.is_empty() {
        r"\# 0".to_string()
    } else {
        format!(r"\# {} {}", octets.len(), hex::encode(octets))
    }
}

/// Parse the generic form, then reparse the octets as wire-format
/// RDATA of the given type so known types still come out structured.
fn deserialise_generic(rtype: RecordType, tokens: &[&str]) -> Result<RecordTypeWithData, Error> {
    let mut t = Tokens::new(tokens);
    let length: usize = parse_token(t.next()?)?;
    let octets = parse_hex(&t.rest_joined())?;

    if octets.len() != length {
        return Err(Error::BadRdataLength {
            expected: length,
            actual: octets.len(),
        });
    }

    if rtype == RecordType::OPT {
        return Err(Error::GenericFormRequired { rtype });
    }

    RecordTypeWithData::deserialise(0, rtype, &mut ConsumableBuffer::new(&octets), octets.len())
        .map_err(|_| Error::BadRdata)
}

/// Quote a character-string, escaping quotes and backslashes, and
/// rendering non-printable octets as `\DDD`.
fn serialise_character_string(octets: &Bytes) -> String {
    let mut out = String::with_capacity(octets.len() + 2);
    out.push('"');
    for &octet in octets.iter() {
        match octet {
            b'"' | b'\\' => {
                out.push('\\');
                out.push(octet as char);
            }
            32..=126 => out.push(octet as char),
            _ => {
                out.push('\\');
                out.push_str(&format!("{octet:03}"));
            }
        }
    }
    out.push('"');
    out
}

/// Parse a character-string token: quoted or a bare word, with `\c`
/// and `\DDD` escapes.
fn parse_character_string(token: &str) -> Result<Bytes, Error> {
    let inner = if let Some(stripped) = token.strip_prefix('"') {
        stripped.strip_suffix('"').ok_or(Error::UnterminatedString)?
    } else {
        token
    };

    let mut octets = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let next = chars.next().ok_or_else(|| Error::BadCharacterString {
                token: token.to_string(),
            })?;
            if next.is_ascii_digit() {
                let d2 = chars.next();
                let d3 = chars.next();
                match (d2, d3) {
                    (Some(d2), Some(d3)) if d2.is_ascii_digit() && d3.is_ascii_digit() => {
                        let value = (next.to_digit(10).unwrap() * 100)
                            + (d2.to_digit(10).unwrap() * 10)
                            + d3.to_digit(10).unwrap();
                        let octet = u8::try_from(value).map_err(|_| Error::BadCharacterString {
                            token: token.to_string(),
                        })?;
                        octets.push(octet);
                    }
                    _ => {
                        return Err(Error::BadCharacterString {
                            token: token.to_string(),
                        })
                    }
                }
            } else if next.is_ascii() {
                octets.push(next as u8);
            } else {
                return Err(Error::BadCharacterString {
                    token: token.to_string(),
                });
            }
        } else if c.is_ascii() {
            octets.push(c as u8);
        } else {
            return Err(Error::BadCharacterString {
                token: token.to_string(),
            });
        }
    }

    if octets.len() > 255 {
        return Err(Error::BadCharacterString {
            token: token.to_string(),
        });
    }

    Ok(Bytes::from(octets))
}

/// Errors encountered when parsing the presentation format.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// The RDATA has fewer fields than the type requires.
    TooFewTokens,

    /// The RDATA has fields left over after all of the type's fields.
    TrailingTokens { token: String },

    /// A field could not be parsed as the value the type requires.
    BadToken { token: String },

    /// A field could not be parsed as a domain name.
    BadName { token: String },

    /// A base16/base32/base64 field has characters outside its
    /// alphabet, or bad padding.
    BadEncoding { token: String },

    /// A character-string has a malformed escape, is over 255 octets,
    /// or has non-ASCII characters.
    BadCharacterString { token: String },

    /// A quoted field was not closed.
    UnterminatedString,

    /// The length of a generic `\#` field does not match its octets.
    BadRdataLength { expected: usize, actual: usize },

    /// Generic RDATA octets could not be parsed as the record type.
    BadRdata,

    /// This type has no field-by-field presentation form: only the
    /// generic `\# <length> <hex>` form can express it.
    GenericFormRequired { rtype: RecordType },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::TooFewTokens => write!(f, "too few fields"),
            Error::TrailingTokens { token } => write!(f, "unexpected trailing field '{token}'"),
            Error::BadToken { token } => write!(f, "could not parse field '{token}'"),
            Error::BadName { token } => write!(f, "could not parse name '{token}'"),
            Error::BadEncoding { token } => write!(f, "could not decode field '{token}'"),
            Error::BadCharacterString { token } => {
                write!(f, "could not parse character-string '{token}'")
            }
            Error::UnterminatedString => write!(f, "unterminated quoted string"),
            Error::BadRdataLength { expected, actual } => {
                write!(f, "expected {expected} octets of RDATA, got {actual}")
            }
            Error::BadRdata => write!(f, "could not parse generic RDATA octets"),
            Error::GenericFormRequired { rtype } => {
                write!(f, "record type {rtype} needs the generic \\# form")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::test_util::*;
    use std::net::Ipv4Addr;

    fn roundtrip(rtype_with_data: &RecordTypeWithData) {
        let text = rtype_with_data.serialise_text();
        let tokens = tokenise(&text).unwrap();
        let token_refs = tokens.iter().map(String::as_str).collect::<Vec<&str>>();
        let parsed = RecordTypeWithData::deserialise_text(
            rtype_with_data.rtype(),
            &token_refs,
            &DomainName::root_domain(),
        );

        assert_eq!(Ok(rtype_with_data.clone()), parsed, "text was: {text}");
    }

    #[test]
    fn roundtrip_address_types() {
        roundtrip(&RecordTypeWithData::A {
            address: Ipv4Addr::new(192, 0, 2, 1),
        });
        roundtrip(&RecordTypeWithData::AAAA {
            address: "2001:db8::1".parse().unwrap(),
        });
    }

    #[test]
    fn roundtrip_single_name_types() {
        roundtrip(&RecordTypeWithData::CNAME {
            cname: domain("alias.example.com."),
        });
        roundtrip(&RecordTypeWithData::DNAME {
            target: domain("new.example.com."),
        });
        roundtrip(&RecordTypeWithData::PTR {
            ptrdname: domain("host.example.com."),
        });
    }

    #[test]
    fn roundtrip_compound_types() {
        roundtrip(&RecordTypeWithData::SOA {
            mname: domain("ns.example.com."),
            rname: domain("hostmaster.example.com."),
            serial: 20240101,
            refresh: 7200,
            retry: 600,
            expire: 2419200,
            minimum: 300,
        });
        roundtrip(&RecordTypeWithData::MX {
            preference: 10,
            exchange: domain("mail.example.com."),
        });
        roundtrip(&RecordTypeWithData::SRV {
            priority: 0,
            weight: 5,
            port: 443,
            target: domain("sip.example.com."),
        });
        roundtrip(&RecordTypeWithData::NAPTR {
            order: 100,
            preference: 50,
            flags: Bytes::from_static(b"s"),
            services: Bytes::from_static(b"SIP+D2T"),
            regexp: Bytes::new(),
            replacement: domain("_sip._tcp.example.com."),
        });
    }

    #[test]
    fn roundtrip_character_string_types() {
        roundtrip(&RecordTypeWithData::TXT {
            strings: vec![
                Bytes::from_static(b"v=spf1 -all"),
                Bytes::from_static(b"a \"quoted\" word"),
            ],
        });
        roundtrip(&RecordTypeWithData::TXT { strings: vec![] });
        roundtrip(&RecordTypeWithData::HINFO {
            cpu: Bytes::from_static(b"PDP-11/70"),
            os: Bytes::from_static(b"UNIX"),
        });
    }

    #[test]
    fn roundtrip_character_string_escapes() {
        roundtrip(&RecordTypeWithData::TXT {
            strings: vec![Bytes::from_static(&[0, 1, b'\\', b'"', 200, 255])],
        });
    }

    #[test]
    fn roundtrip_dnssec_types() {
        roundtrip(&RecordTypeWithData::DS {
            key_tag: 60485,
            algorithm: 5,
            digest_type: 1,
            digest: Bytes::from_static(&[0x2b, 0xb1, 0x83, 0xaf]),
        });
        roundtrip(&RecordTypeWithData::DNSKEY {
            flags: 256,
            protocol: 3,
            algorithm: 8,
            public_key: Bytes::from_static(b"\x03\x01\x00\x01\xa8"),
        });
        roundtrip(&RecordTypeWithData::RRSIG {
            signature: Signature {
                type_covered: RecordType::A,
                algorithm: 8,
                labels: 3,
                original_ttl: 3600,
                expiration: 1_712_000_000,
                inception: 1_710_000_000,
                key_tag: 2642,
                signer: domain("example.com."),
                signature: Bytes::from_static(b"\xa0\x90\x12\x00\x30"),
            },
        });
        roundtrip(&RecordTypeWithData::NSEC {
            next: domain("host.example.com."),
            types: vec![RecordType::A, RecordType::MX, RecordType::RRSIG],
        });
        roundtrip(&RecordTypeWithData::NSEC3 {
            algorithm: 1,
            flags: 1,
            iterations: 12,
            salt: Bytes::from_static(&[0xaa, 0xbb, 0xcc, 0xdd]),
            next_hashed: Bytes::from_static(&[
                0x2b, 0xb1, 0x83, 0xaf, 0x5f, 0x22, 0x58, 0x81, 0x79, 0xa5,
            ]),
            types: vec![RecordType::A, RecordType::RRSIG],
        });
        roundtrip(&RecordTypeWithData::NSEC3PARAM {
            algorithm: 1,
            flags: 0,
            iterations: 12,
            salt: Bytes::new(),
        });
        roundtrip(&RecordTypeWithData::TLSA {
            usage: 3,
            selector: 1,
            matching_type: 1,
            certificate_data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        });
    }

    #[test]
    fn roundtrip_svcb() {
        roundtrip(&RecordTypeWithData::HTTPS {
            priority: 1,
            target: DomainName::root_domain(),
            params: vec![
                SvcParam {
                    key: 1,
                    value: Bytes::from_static(&[2, b'h', b'2']),
                },
                SvcParam {
                    key: 5,
                    value: Bytes::new(),
                },
            ],
        });
    }

    #[test]
    fn roundtrip_generic_form() {
        roundtrip(&unknown_record("x.example.com.", &[1, 2, 3]).rtype_with_data);
        roundtrip(&RecordTypeWithData::NULL {
            octets: Bytes::new(),
        });
    }

    #[test]
    fn generic_form_parses_known_types() {
        // 192.0.2.1 as generic RDATA
        let parsed = RecordTypeWithData::deserialise_text(
            RecordType::A,
            &[r"\#", "4", "c0000201"],
            &DomainName::root_domain(),
        );

        assert_eq!(
            Ok(RecordTypeWithData::A {
                address: Ipv4Addr::new(192, 0, 2, 1)
            }),
            parsed
        );
    }

    #[test]
    fn generic_form_length_must_match() {
        let parsed = RecordTypeWithData::deserialise_text(
            RecordType::A,
            &[r"\#", "3", "c0000201"],
            &DomainName::root_domain(),
        );

        assert_eq!(
            Err(Error::BadRdataLength {
                expected: 3,
                actual: 4
            }),
            parsed
        );
    }

    #[test]
    fn base64_rejects_non_alphabet() {
        assert!(matches!(
            parse_base64("not!base64"),
            Err(Error::BadEncoding { .. })
        ));
    }

    #[test]
    fn hex_rejects_non_alphabet() {
        assert!(matches!(
            parse_hex("zz"),
            Err(Error::BadEncoding { .. })
        ));
    }

    #[test]
    fn names_parse_relative_to_origin() {
        let origin = domain("example.com.");
        let parsed =
            RecordTypeWithData::deserialise_text(RecordType::CNAME, &["www"], &origin);

        assert_eq!(
            Ok(RecordTypeWithData::CNAME {
                cname: domain("www.example.com.")
            }),
            parsed
        );
    }
}
