//! Grouping the records of a message section into RRsets.

use crate::protocol::types::*;

/// All the records of one section sharing (name, type, class), with
/// any covering RRSIG records attached.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RRset {
    pub name: DomainName,
    pub rtype: RecordType,
    pub rclass: RecordClass,

    /// The TTL of the set: the minimum TTL among its members.
    pub ttl: u32,

    /// INVARIANT: non-empty unless this is a signature-only set.
    pub records: Vec<ResourceRecord>,

    /// RRSIG (or SIG) records whose type-covered field matches
    /// `rtype`.
    pub signatures: Vec<ResourceRecord>,
}

impl RRset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.signatures.is_empty()
    }
}

/// Group a section's records into RRsets, in first-appearance order.
///
/// An RRSIG attaches to the set of the type it covers at its owner
/// name; an RRSIG covering a type with no records in the section gets
/// a signature-only set.
pub fn section_rrsets(section: &[ResourceRecord]) -> Vec<RRset> {
    let mut rrsets = Vec::<RRset>::new();

    for rr in section {
        let (rtype, covers) = match &rr.rtype_with_data {
            RecordTypeWithData::RRSIG { signature } | RecordTypeWithData::SIG { signature } => {
                (signature.type_covered, true)
            }
            other => (other.rtype(), false),
        };

        if let Some(rrset) = rrsets
            .iter_mut()
            .find(|s| s.rtype == rtype && s.rclass == rr.rclass && s.name == rr.name)
        {
            if covers {
                rrset.signatures.push(rr.clone());
            } else {
                rrset.ttl = rrset.ttl.min(rr.ttl);
                rrset.records.push(rr.clone());
            }
        } else {
            let (records, signatures) = if covers {
                (Vec::new(), vec![rr.clone()])
            } else {
                (vec![rr.clone()], Vec::new())
            };
            rrsets.push(RRset {
                name: rr.name.clone(),
                rtype,
                rclass: rr.rclass,
                ttl: rr.ttl,
                records,
                signatures,
            });
        }
    }

    rrsets
}
