// # UDP SOA Serial Query
//
// This crate provides the side-channel serial lookup used to validate cached
// zone snapshots. It sends one SOA question over UDP straight to the zone's
// authoritative server and reads the serial from the first SOA answer.
//
// ## Behavior
//
// - One datagram out, one datagram back, no retries
// - The whole exchange (resolve, send, receive) is bounded by one timeout
// - Responses with a foreign id, an error rcode or no SOA answer are errors
// - Every failure maps to `Error::Authoritative`; the validator downgrades it
//   to a cache miss, so nothing here is ever fatal
//
// ## Configuration
//
// ```json
// { "port": 53, "timeout_ms": 5000 }
// ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RData, RecordType};
use serde::{Deserialize, Serialize};
use tokio::net::UdpSocket;
use tracing::debug;
use zonesync_core::traits::SerialQuery;
use zonesync_core::{Error, Result};

/// Largest UDP DNS payload accepted
const MAX_DATAGRAM: usize = 4096;

/// SOA query configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaQueryConfig {
    /// Port the authoritative servers listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout for one full exchange (in milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SoaQueryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::config("SOA query port must be > 0"));
        }
        if self.timeout_ms == 0 {
            return Err(Error::config("SOA query timeout_ms must be > 0"));
        }
        Ok(())
    }
}

impl Default for SoaQueryConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_port() -> u16 {
    53
}

fn default_timeout_ms() -> u64 {
    5000
}

/// [`SerialQuery`] over plain UDP
#[derive(Debug)]
pub struct UdpSerialQuery {
    port: u16,
    timeout: Duration,
    next_id: AtomicU16,
}

impl UdpSerialQuery {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            port,
            timeout,
            next_id: AtomicU16::new(1),
        }
    }

    /// Create a query client from validated configuration
    pub fn from_config(config: &SoaQueryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.port, Duration::from_millis(config.timeout_ms)))
    }

    async fn exchange(&self, zone: &str, server: &str) -> Result<u32> {
        let host = server.trim_end_matches('.');
        let addr = tokio::net::lookup_host((host, self.port))
            .await?
            .next()
            .ok_or_else(|| Error::authoritative(format!("no address for {host}")))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let query = build_soa_query(zone, id)?;

        let socket = UdpSocket::bind(unspecified_for(addr)).await?;
        socket.connect(addr).await?;
        socket.send(&query).await?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        let len = socket.recv(&mut buf).await?;
        parse_soa_serial(&buf[..len], id)
    }
}

impl Default for UdpSerialQuery {
    fn default() -> Self {
        Self::new(default_port(), Duration::from_millis(default_timeout_ms()))
    }
}

#[async_trait]
impl SerialQuery for UdpSerialQuery {
    async fn query_serial(&self, zone: &str, server: &str) -> Result<u32> {
        debug!("Querying SOA of {} at {}:{}", zone, server, self.port);

        match tokio::time::timeout(self.timeout, self.exchange(zone, server)).await {
            Ok(Ok(serial)) => Ok(serial),
            Ok(Err(Error::Authoritative(msg))) => Err(Error::Authoritative(msg)),
            Ok(Err(e)) => Err(Error::authoritative(format!("{server}: {e}"))),
            Err(_) => Err(Error::authoritative(format!(
                "{server}: no answer within {:?}",
                self.timeout
            ))),
        }
    }
}

fn unspecified_for(addr: SocketAddr) -> SocketAddr {
    match addr {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}

/// Encode an SOA question for `zone`
pub fn build_soa_query(zone: &str, id: u16) -> Result<Vec<u8>> {
    let fqdn = format!("{}.", zone.trim_end_matches('.'));
    let name = Name::from_ascii(&fqdn)
        .map_err(|e| Error::authoritative(format!("invalid zone name {zone}: {e}")))?;

    let mut message = Message::new();
    message
        .set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(name, RecordType::SOA));

    message
        .to_vec()
        .map_err(|e| Error::authoritative(format!("cannot encode SOA query: {e}")))
}

/// Serial of the first SOA answer in a response to query `expected_id`
pub fn parse_soa_serial(bytes: &[u8], expected_id: u16) -> Result<u32> {
    let message = Message::from_vec(bytes)
        .map_err(|e| Error::authoritative(format!("malformed answer: {e}")))?;

    if message.id() != expected_id {
        return Err(Error::authoritative(format!(
            "answer id {} does not match query id {}",
            message.id(),
            expected_id
        )));
    }
    if message.response_code() != ResponseCode::NoError {
        return Err(Error::authoritative(format!(
            "server answered {}",
            message.response_code()
        )));
    }

    message
        .answers()
        .iter()
        .find_map(|record| match record.data() {
            Some(RData::SOA(soa)) => Some(soa.serial()),
            _ => None,
        })
        .ok_or_else(|| Error::authoritative("no SOA in answer"))
}
