use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::protocol::types::*;

/// A static host-to-address table, as read from a hosts file.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Hosts {
    pub v4: HashMap<DomainName, Ipv4Addr>,
    pub v6: HashMap<DomainName, Ipv6Addr>,
}

impl Hosts {
    pub fn new() -> Self {
        Self {
            v4: HashMap::new(),
            v6: HashMap::new(),
        }
    }

    /// The address this table holds for a name, if the query is for
    /// an address type it can answer.
    pub fn address_for(&self, name: &DomainName, rtype: RecordType) -> Option<IpAddr> {
        match rtype {
            RecordType::A => self.v4.get(name).copied().map(IpAddr::V4),
            RecordType::AAAA => self.v6.get(name).copied().map(IpAddr::V6),
            _ => None,
        }
    }

    /// Merge another hosts file into this one.  If the same name has
    /// records in both files, the new file will win.
    pub fn merge(&mut self, other: Hosts) {
        for (name, address) in other.v4 {
            self.v4.insert(name, address);
        }
        for (name, address) in other.v6 {
            self.v6.insert(name, address);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::test_util::*;

    #[test]
    fn address_for_checks_type() {
        let mut hosts = Hosts::new();
        hosts
            .v4
            .insert(domain("localhost."), Ipv4Addr::new(127, 0, 0, 1));

        assert_eq!(
            Some(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            hosts.address_for(&domain("localhost."), RecordType::A)
        );
        assert_eq!(
            None,
            hosts.address_for(&domain("localhost."), RecordType::AAAA)
        );
        assert_eq!(
            None,
            hosts.address_for(&domain("localhost."), RecordType::MX)
        );
    }

    #[test]
    fn merge_prefers_new_file() {
        let mut hosts = Hosts::new();
        hosts
            .v4
            .insert(domain("host.example.com."), Ipv4Addr::new(1, 1, 1, 1));

        let mut other = Hosts::new();
        other
            .v4
            .insert(domain("host.example.com."), Ipv4Addr::new(2, 2, 2, 2));
        hosts.merge(other);

        assert_eq!(
            Some(IpAddr::V4(Ipv4Addr::new(2, 2, 2, 2))),
            hosts.address_for(&domain("host.example.com."), RecordType::A)
        );
    }
}
