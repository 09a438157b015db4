//! The record-type registry: numeric type code to mnemonic and codec.
//!
//! The built-in catalog covers the types this library interprets.
//! The registry adds a mutable overlay on top of it: new codes can be
//! given mnemonics and codecs (and built-in codes can have their
//! codecs replaced) at startup, before sessions are created.
//!
//! A process-wide default registry is initialised on first access and
//! never torn down.  Consumers which need a stable view (such as a
//! long-running lookup session) should take an `Arc` snapshot with
//! [`current`] at construction time: replacing the process-wide
//! registry later does not change snapshots already taken.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, RwLock};

use crate::protocol::types::{DomainName, RecordType, RecordTypeWithData};

/// A replacement codec for one record type code.
///
/// `parse_wire` gets the raw RDATA octets with compression pointers
/// unexpanded: types outside the original RFC 1035 set never contain
/// compressed names (RFC 3597 section 4), so a flat slice is enough.
pub trait RdataCodec: Send + Sync {
    /// Parse RDATA from its wire form.
    ///
    /// # Errors
    ///
    /// If the octets are not valid for this type.
    fn parse_wire(&self, code: u16, octets: &[u8]) -> Result<RecordTypeWithData, CodecError>;

    /// Parse RDATA from presentation-format tokens.
    ///
    /// # Errors
    ///
    /// If the tokens are not valid for this type.
    fn parse_text(
        &self,
        code: u16,
        tokens: &[&str],
        origin: &DomainName,
    ) -> Result<RecordTypeWithData, CodecError>;

    /// The presentation form, if this codec can render the given
    /// data.
    fn emit_text(&self, rtype_with_data: &RecordTypeWithData) -> Option<String>;
}

/// An error from a registered codec.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct CodecError {
    pub message: String,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// The registry: the built-in catalog plus an overlay of runtime
/// registrations.
///
/// Reads are lock-free once constructed; mutation happens on an owned
/// or exclusive registry before [`install`]ing it, so configuration
/// is expected to finish before concurrent use starts.
#[derive(Default)]
pub struct TypeRegistry {
    mnemonics: HashMap<u16, String>,
    codes: HashMap<String, u16>,
    codecs: HashMap<u16, Arc<dyn RdataCodec>>,
}

impl TypeRegistry {
    /// A registry with only the built-in catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a mnemonic (and optionally a codec) to a type code.
    ///
    /// # Errors
    ///
    /// If the mnemonic is already bound to a different code, either
    /// by the built-in catalog or by an earlier registration: a
    /// mnemonic identifies exactly one numeric code.
    pub fn register(
        &mut self,
        code: u16,
        mnemonic: &str,
        codec: Option<Arc<dyn RdataCodec>>,
    ) -> Result<(), RegistryError> {
        if let Some(bound) = self.code(mnemonic) {
            if bound != code {
                return Err(RegistryError::MnemonicBound {
                    mnemonic: mnemonic.to_string(),
                    code: bound,
                });
            }
        }

        self.mnemonics.insert(code, mnemonic.to_string());
        self.codes.insert(mnemonic.to_string(), code);
        if let Some(codec) = codec {
            self.codecs.insert(code, codec);
        }

        Ok(())
    }

    /// The mnemonic for a code: a registered one, a built-in one, or
    /// the `TYPEn` fallback of RFC 3597.
    pub fn mnemonic(&self, code: u16) -> String {
        if let Some(mnemonic) = self.mnemonics.get(&code) {
            mnemonic.clone()
        } else {
            RecordType::from(code).to_string()
        }
    }

    /// The code a mnemonic is bound to, if any.  `TYPEn` forms always
    /// resolve.
    pub fn code(&self, mnemonic: &str) -> Option<u16> {
        if let Some(code) = self.codes.get(mnemonic) {
            return Some(*code);
        }

        match RecordType::from_str(mnemonic) {
            // covers the whole built-in catalog and the TYPEn
            // fallback form
            Ok(rtype) => Some(u16::from(rtype)),
            Err(_) => None,
        }
    }

    /// The registered codec for a code, if any.  Codes without one
    /// use the built-in catalog.
    pub fn codec(&self, code: u16) -> Option<&Arc<dyn RdataCodec>> {
        self.codecs.get(&code)
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("mnemonics", &self.mnemonics)
            .field("codecs", &self.codecs.keys().collect::<Vec<&u16>>())
            .finish()
    }
}

static REGISTRY: OnceLock<RwLock<Arc<TypeRegistry>>> = OnceLock::new();

fn global() -> &'static RwLock<Arc<TypeRegistry>> {
    REGISTRY.get_or_init(|| RwLock::new(Arc::new(TypeRegistry::new())))
}

/// A snapshot of the process-wide registry.
///
/// # Panics
///
/// If the registry lock has been poisoned.
pub fn current() -> Arc<TypeRegistry> {
    global()
        .read()
        .expect("[INTERNAL ERROR] type registry lock poisoned")
        .clone()
}

/// Replace the process-wide registry.  Snapshots taken with
/// [`current`] before this call keep the registry they saw.
///
/// # Panics
///
/// If the registry lock has been poisoned.
pub fn install(registry: TypeRegistry) {
    *global()
        .write()
        .expect("[INTERNAL ERROR] type registry lock poisoned") = Arc::new(registry);
}

/// Errors that can arise when registering a record type.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum RegistryError {
    /// The mnemonic is already bound to a different code.
    MnemonicBound { mnemonic: String, code: u16 },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegistryError::MnemonicBound { mnemonic, code } => {
                write!(f, "mnemonic '{mnemonic}' is already bound to type {code}")
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    struct StashCodec;

    impl RdataCodec for StashCodec {
        fn parse_wire(&self, code: u16, octets: &[u8]) -> Result<RecordTypeWithData, CodecError> {
            match RecordType::from(code) {
                RecordType::Unknown(tag) => Ok(RecordTypeWithData::Unknown {
                    tag,
                    octets: Bytes::copy_from_slice(octets),
                }),
                _ => Err(CodecError::new("only for unknown codes")),
            }
        }

        fn parse_text(
            &self,
            code: u16,
            tokens: &[&str],
            _origin: &DomainName,
        ) -> Result<RecordTypeWithData, CodecError> {
            match (RecordType::from(code), tokens) {
                (RecordType::Unknown(tag), [token]) => Ok(RecordTypeWithData::Unknown {
                    tag,
                    octets: hex::decode(token)
                        .map(Bytes::from)
                        .map_err(|_| CodecError::new("bad hex"))?,
                }),
                _ => Err(CodecError::new("expected one hex token")),
            }
        }

        fn emit_text(&self, rtype_with_data: &RecordTypeWithData) -> Option<String> {
            match rtype_with_data {
                RecordTypeWithData::Unknown { octets, .. } => Some(hex::encode(octets)),
                _ => None,
            }
        }
    }

    #[test]
    fn builtin_mnemonics_resolve() {
        let registry = TypeRegistry::new();

        assert_eq!("A", registry.mnemonic(1));
        assert_eq!("TYPE9999", registry.mnemonic(9999));
        assert_eq!(Some(1), registry.code("A"));
        assert_eq!(Some(9999), registry.code("TYPE9999"));
        assert_eq!(None, registry.code("NO-SUCH-TYPE"));
    }

    #[test]
    fn register_binds_mnemonic() {
        let mut registry = TypeRegistry::new();
        registry
            .register(65280, "EXAMPLE", Some(Arc::new(StashCodec)))
            .unwrap();

        assert_eq!("EXAMPLE", registry.mnemonic(65280));
        assert_eq!(Some(65280), registry.code("EXAMPLE"));
        assert!(registry.codec(65280).is_some());
        assert!(registry.codec(65281).is_none());
    }

    #[test]
    fn register_rejects_rebinding_mnemonic() {
        let mut registry = TypeRegistry::new();

        assert_eq!(
            Err(RegistryError::MnemonicBound {
                mnemonic: "A".to_string(),
                code: 1,
            }),
            registry.register(65280, "A", None)
        );

        registry.register(65280, "EXAMPLE", None).unwrap();
        assert_eq!(
            Err(RegistryError::MnemonicBound {
                mnemonic: "EXAMPLE".to_string(),
                code: 65280,
            }),
            registry.register(65281, "EXAMPLE", None)
        );
    }

    #[test]
    fn registered_codec_parses_wire() {
        use crate::protocol::types::test_util::*;

        let mut registry = TypeRegistry::new();
        registry
            .register(65280, "EXAMPLE", Some(Arc::new(StashCodec)))
            .unwrap();

        let rr = crate::protocol::types::ResourceRecord {
            name: domain("x.example.com."),
            rtype_with_data: RecordTypeWithData::Unknown {
                tag: match RecordType::from(65280) {
                    RecordType::Unknown(tag) => tag,
                    _ => unreachable!(),
                },
                octets: Bytes::from_static(&[1, 2, 3]),
            },
            rclass: crate::protocol::types::RecordClass::IN,
            ttl: 300,
        };

        let mut message = crate::protocol::types::Message::from_question(
            1234,
            crate::protocol::types::Question {
                name: domain("x.example.com."),
                qtype: crate::protocol::types::QueryType::Record(RecordType::from(65280)),
                qclass: crate::protocol::types::QueryClass::Record(
                    crate::protocol::types::RecordClass::IN,
                ),
            },
        );
        message.answers.push(rr.clone());

        let octets = message.to_octets().unwrap();
        let parsed =
            crate::protocol::types::Message::from_octets_with(&octets, &registry).unwrap();

        assert_eq!(vec![rr], parsed.answers);
    }
}
