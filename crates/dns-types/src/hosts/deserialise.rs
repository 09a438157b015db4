use std::net::IpAddr;
use std::str::FromStr;

use crate::hosts::types::*;
use crate::protocol::types::*;

impl Hosts {
    /// Parse a string of hosts data
    ///
    /// # Errors
    ///
    /// If the string cannot be parsed.
    pub fn deserialise(data: &str) -> Result<Self, Error> {
        let mut hosts = Self::new();
        for line in data.lines() {
            if let Some((address, names)) = parse_line(line)? {
                for name in names {
                    match address {
                        IpAddr::V4(ip) => {
                            hosts.v4.insert(name, ip);
                        }
                        IpAddr::V6(ip) => {
                            hosts.v6.insert(name, ip);
                        }
                    }
                }
            }
        }
        Ok(hosts)
    }
}

/// Parse one line: an address field followed by the names it serves.
///
/// Yields nothing for blank lines, comment-only lines, lines with an
/// address but no names, and interface-scoped addresses
/// (`fe80::1%eth0`), which a resolver cannot hand out.
///
/// # Errors
///
/// If the line cannot be parsed.
fn parse_line(line: &str) -> Result<Option<(IpAddr, Vec<DomainName>)>, Error> {
    let data = line.split('#').next().unwrap_or_default();
    if !data.is_ascii() {
        return Err(Error::ExpectedAscii);
    }

    let mut fields = data.split_whitespace();
    let Some(address_field) = fields.next() else {
        return Ok(None);
    };
    if address_field.contains('%') {
        return Ok(None);
    }

    let address = IpAddr::from_str(address_field).map_err(|_| Error::CouldNotParseAddress {
        address: address_field.into(),
    })?;

    let origin = DomainName::root_domain();
    let mut names = Vec::new();
    for field in fields {
        match DomainName::from_relative_dotted_string(&origin, field) {
            Some(name) => names.push(name),
            None => {
                return Err(Error::CouldNotParseName {
                    name: field.into(),
                })
            }
        }
    }

    if names.is_empty() {
        Ok(None)
    } else {
        Ok(Some((address, names)))
    }
}

/// An error that can occur reading a hosts file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    ExpectedAscii,
    CouldNotParseAddress { address: String },
    CouldNotParseName { name: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ExpectedAscii => write!(f, "hosts data must be ASCII"),
            Error::CouldNotParseAddress { address } => {
                write!(f, "'{address}' is not an IP address")
            }
            Error::CouldNotParseName { name } => write!(f, "'{name}' is not a host name"),
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
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;
    use crate::protocol::types::test_util::*;

    #[test]
    fn parses_all() {
        let hosts_data = "# hark, a comment!\n\
                          1.2.3.4 one two three four\n\
                          0.0.0.0 blocked\n
                          \n\
                          127.0.0.1 localhost.\n\
                          ::1 localhost";

        let hosts = Hosts::deserialise(hosts_data).unwrap();

        let expected_v4 = &[
            ("one.", Ipv4Addr::new(1, 2, 3, 4)),
            ("two.", Ipv4Addr::new(1, 2, 3, 4)),
            ("three.", Ipv4Addr::new(1, 2, 3, 4)),
            ("four.", Ipv4Addr::new(1, 2, 3, 4)),
            ("blocked.", Ipv4Addr::new(0, 0, 0, 0)),
            ("localhost.", Ipv4Addr::new(127, 0, 0, 1)),
        ];

        for (name, addr) in expected_v4 {
            assert_eq!(
                Some(IpAddr::V4(*addr)),
                hosts.address_for(&domain(name), RecordType::A),
                "bad result for {name}",
            );
        }

        assert_eq!(
            Some(IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))),
            hosts.address_for(&domain("localhost."), RecordType::AAAA)
        );
    }

    #[test]
    fn parse_line_ignores_iface_address() {
        assert_eq!(Ok(None), parse_line("fe80::1%lo0 localhost"));
    }

    #[test]
    fn parse_line_ignores_comments_and_blanks() {
        assert_eq!(Ok(None), parse_line(""));
        assert_eq!(Ok(None), parse_line("   "));
        assert_eq!(Ok(None), parse_line("# 1.2.3.4 commented-out"));
    }

    #[test]
    fn parse_line_parses_ipv4_with_names() {
        assert_eq!(
            Ok(Some((
                IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)),
                vec![domain("foo."), domain("bar.")],
            ))),
            parse_line("1.2.3.4 foo bar")
        );
    }

    #[test]
    fn parse_line_parses_ipv4_without_names() {
        assert_eq!(Ok(None), parse_line("1.2.3.4"));
    }

    #[test]
    fn parse_line_parses_ipv6_with_names() {
        assert_eq!(
            Ok(Some((
                IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 1, 2, 3)),
                vec![domain("foo."), domain("bar.")],
            ))),
            parse_line("::1:2:3 foo bar")
        );
    }

    #[test]
    fn parse_line_parses_ipv6_without_names() {
        assert_eq!(Ok(None), parse_line("::1"));
    }

    #[test]
    fn parse_line_rejects_bad_address() {
        assert_eq!(
            Err(Error::CouldNotParseAddress {
                address: "512.0.0.1".into()
            }),
            parse_line("512.0.0.1 localhost")
        );
    }
}
