//! The transport contract: send one query message, get one response
//! message.  The provided implementation speaks plain DNS over UDP
//! with TCP fallback; anything fancier (server selection, DoT/DoH,
//! retry policies) can be supplied by implementing [`Transport`].

use async_trait::async_trait;
use bytes::BytesMut;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

use dns_types::protocol::types::*;
use dns_types::protocol::{deserialise, serialise};

/// Send one query and await its response.  The transport owns
/// per-query deadlines and network error handling: the caller treats
/// any failure as terminal for the query.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, query: &Message) -> Result<Message, TransportError>;
}

/// A transport speaking DNS over UDP to one upstream server, falling
/// back to TCP when the request is too large for a datagram or the
/// response comes back truncated.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    address: SocketAddr,
    timeout: Duration,
}

impl UdpTransport {
    /// A transport with the default 5s per-attempt timeout.
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(address: SocketAddr, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    async fn query_udp(&self, serialised: &[u8]) -> Result<Message, TransportError> {
        match timeout(self.timeout, self.query_udp_notimeout(serialised)).await {
            Ok(res) => res,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    async fn query_udp_notimeout(&self, serialised: &[u8]) -> Result<Message, TransportError> {
        let local: SocketAddr = if self.address.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };

        let sock = UdpSocket::bind(local).await?;
        sock.connect(self.address).await?;
        sock.send(serialised).await?;

        let mut buf = vec![0u8; 4096];
        let len = sock.recv(&mut buf).await?;

        Message::from_octets(&buf[..len]).map_err(TransportError::Deserialise)
    }

    async fn query_tcp(&self, serialised: &[u8]) -> Result<Message, TransportError> {
        match timeout(self.timeout, self.query_tcp_notimeout(serialised)).await {
            Ok(res) => res,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    async fn query_tcp_notimeout(&self, serialised: &[u8]) -> Result<Message, TransportError> {
        let mut stream = TcpStream::connect(self.address).await?;
        send_tcp_bytes(&mut stream, serialised).await?;
        let bytes = read_tcp_bytes(&mut stream).await?;

        Message::from_octets(bytes.as_ref()).map_err(TransportError::Deserialise)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, query: &Message) -> Result<Message, TransportError> {
        let serialised = query.to_octets().map_err(TransportError::Serialise)?;

        tracing::trace!(?query, address = %self.address, "sending query upstream");

        if serialised.len() <= 512 {
            match self.query_udp(&serialised).await {
                Ok(response) => {
                    if !response_matches_request(query, &response) {
                        return Err(TransportError::ResponseMismatch);
                    }
                    if !response.header.is_truncated {
                        return Ok(response);
                    }
                    tracing::trace!("response truncated, retrying over TCP");
                }
                Err(error) => {
                    tracing::trace!(%error, "UDP failed, retrying over TCP");
                }
            }
        }

        let response = self.query_tcp(&serialised).await?;
        if response_matches_request(query, &response) {
            Ok(response)
        } else {
            Err(TransportError::ResponseMismatch)
        }
    }
}

/// Write a serialised message to a TCP channel.  A DNS TCP message is
/// slightly different to a DNS UDP message: it has a big-endian u16
/// prefix giving the total length of the message.
async fn send_tcp_bytes(stream: &mut TcpStream, bytes: &[u8]) -> Result<(), TransportError> {
    let len = u16::try_from(bytes.len()).map_err(|_| TransportError::RequestTooLong {
        length: bytes.len(),
    })?;

    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(bytes).await?;

    Ok(())
}

/// Read a DNS message from a TCP stream: the length prefix, then that
/// many octets.
async fn read_tcp_bytes(stream: &mut TcpStream) -> Result<BytesMut, TransportError> {
    let size = stream.read_u16().await?;
    let expected = size as usize;
    let mut bytes = BytesMut::with_capacity(expected);

    while bytes.len() < expected {
        let read = stream.read_buf(&mut bytes).await?;
        if read == 0 && bytes.len() < expected {
            return Err(TransportError::ResponseTooShort {
                expected,
                actual: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

/// Very basic validation that a response matches a query:
///
/// - Check the ID, opcode, and questions match.
///
/// - Check it is a response.
///
/// The rcode is deliberately not checked: mapping error rcodes to
/// outcomes is the caller's job, not the transport's.
pub fn response_matches_request(request: &Message, response: &Message) -> bool {
    if request.header.id != response.header.id {
        return false;
    }
    if !response.header.is_response {
        return false;
    }
    if request.header.opcode != response.header.opcode {
        return false;
    }
    if request.questions != response.questions {
        return false;
    }

    true
}

/// An error that can occur while exchanging messages with an upstream
/// server.
#[derive(Debug)]
pub enum TransportError {
    /// The query could not be serialised.
    Serialise(serialise::Error),

    /// The response could not be parsed.
    Deserialise(deserialise::Error),

    /// A socket operation failed.
    Io(io::Error),

    /// No response arrived within the deadline.
    Timeout,

    /// The request does not fit in a TCP message.
    RequestTooLong { length: usize },

    /// The TCP stream ended before the announced message length.
    ResponseTooShort { expected: usize, actual: usize },

    /// A response arrived but does not correspond to the query.
    ResponseMismatch,
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io(error)
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TransportError::Serialise(error) => write!(f, "could not serialise query: {error}"),
            TransportError::Deserialise(error) => {
                write!(f, "could not deserialise response: {error}")
            }
            TransportError::Io(error) => write!(f, "network error: {error}"),
            TransportError::Timeout => write!(f, "timed out"),
            TransportError::RequestTooLong { length } => {
                write!(f, "request of {length} octets does not fit in a TCP message")
            }
            TransportError::ResponseTooShort { expected, actual } => {
                write!(f, "response ended after {actual} of {expected} octets")
            }
            TransportError::ResponseMismatch => write!(f, "response does not match request"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Serialise(error) => Some(error),
            TransportError::Deserialise(error) => Some(error),
            TransportError::Io(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;

    #[test]
    fn response_matches_request_accepts() {
        let (request, response) = matching_response();

        assert!(response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_checks_id() {
        let (request, mut response) = matching_response();
        response.header.id += 1;

        assert!(!response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_checks_qr() {
        let (request, mut response) = matching_response();
        response.header.is_response = false;

        assert!(!response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_checks_opcode() {
        let (request, mut response) = matching_response();
        response.header.opcode = Opcode::Status;

        assert!(!response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_checks_question() {
        use dns_types::protocol::types::test_util::*;

        let (request, mut response) = matching_response();
        response.questions[0].name = domain("other.example.com.");

        assert!(!response_matches_request(&request, &response));
    }

    #[test]
    fn response_matches_request_does_not_check_rcode() {
        let (request, mut response) = matching_response();
        response.header.rcode = Rcode::ServerFailure;

        assert!(response_matches_request(&request, &response));
    }
}

#[cfg(test)]
pub mod test_util {
    use dns_types::protocol::types::test_util::*;
    use std::net::Ipv4Addr;

    use super::*;

    pub fn matching_response() -> (Message, Message) {
        let request = Message::from_question(
            1234,
            Question {
                name: domain("www.example.com."),
                qtype: QueryType::Record(RecordType::A),
                qclass: QueryClass::Record(RecordClass::IN),
            },
        );

        let mut response = request.make_response();
        response
            .answers
            .push(a_record("www.example.com.", Ipv4Addr::new(1, 1, 1, 1)));

        (request, response)
    }
}
