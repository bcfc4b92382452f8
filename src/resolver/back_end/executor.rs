use crate::resolver::back_end::address::Address;
use crate::shared::dns;
use rand::Rng;
use std::io::{Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, TcpStream, UdpSocket};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// A successfully classified reply: a parsed message the engine can walk.
#[derive(Debug)]
pub struct Reply {
    pub message: dns::Message,
}

/// Everything that can go wrong executing one query, already classified per
/// §4.4's rules. `TooManyQueries` is the one variant that terminates the
/// whole resolution rather than being fed back to the selection policy.
#[derive(Debug)]
pub enum ExecErr {
    Socket(std::io::Error),
    Timeout,
    Truncated,
    FormError,
    InvalidAnswer(String),
    TooManyQueries,
}

/// The testability seam the engine is generic over, exactly as
/// [`crate::shared::net::DnsHandler`] decouples request handling from the
/// concrete socket type. Production code uses [`UdpTcpExecutor`]; tests
/// script replies with [`FixtureExecutor`].
pub trait QueryExecutor {
    fn query(
        &self,
        address: Address,
        qname: &dns::Name,
        qtype: dns::RecordType,
        timeout_us: u64,
        tcp: bool,
    ) -> Result<Reply, ExecErr>;
}

/// Source addresses to bind from, one per address family, and the
/// incrementing port counters used to pick a "random" ephemeral source port.
pub struct UdpTcpExecutor {
    ip4_src: Ipv4Addr,
    ip6_src: Ipv6Addr,
    ip4_port: AtomicU32,
    ip6_port: AtomicU32,
    max_queries: u64,
    queries_issued: AtomicU32,
    edns_buffer_size: u16,
}

const PORT_RANGE_START: u32 = 1024;
const PORT_RANGE_END: u32 = 65535;

impl UdpTcpExecutor {
    pub fn new(ip4_src: Ipv4Addr, ip6_src: Ipv6Addr, max_queries: u64) -> Self {
        Self::with_edns_buffer_size(ip4_src, ip6_src, max_queries, dns::EDNS_BUFFER_SIZE)
    }

    pub fn with_edns_buffer_size(ip4_src: Ipv4Addr, ip6_src: Ipv6Addr, max_queries: u64, edns_buffer_size: u16) -> Self {
        let mut rng = rand::thread_rng();
        UdpTcpExecutor {
            ip4_src,
            ip6_src,
            ip4_port: AtomicU32::new(rng.gen_range(PORT_RANGE_START..PORT_RANGE_END)),
            ip6_port: AtomicU32::new(rng.gen_range(PORT_RANGE_START..PORT_RANGE_END)),
            max_queries,
            queries_issued: AtomicU32::new(0),
            edns_buffer_size,
        }
    }

    /// Deliberate weak source-port randomization: the per-address-family
    /// counter advances modulo `[1024, 65535)` on every bind, rather than
    /// drawing a fresh random port each time.
    fn next_port(&self, family: &AtomicU32) -> u16 {
        let prev = family.fetch_add(1, Ordering::Relaxed);
        let range = PORT_RANGE_END - PORT_RANGE_START;
        (PORT_RANGE_START + prev % range) as u16
    }

    fn local_addr(&self, remote: IpAddr) -> std::net::SocketAddr {
        match remote {
            IpAddr::V4(_) => (IpAddr::V4(self.ip4_src), self.next_port(&self.ip4_port)).into(),
            IpAddr::V6(_) => (IpAddr::V6(self.ip6_src), self.next_port(&self.ip6_port)).into(),
        }
    }

    /// Builds the outgoing query, advertising EDNS with the configured
    /// buffer size and DNSSEC OK unset, per §4.4.
    fn build_request(&self, qname: &dns::Name, qtype: dns::RecordType) -> dns::Message {
        let mut header = dns::Header::default();
        header.questions_count = 1;
        header.recursion_desired = false;
        header.additionals_count = 1;
        dns::Message {
            header,
            questions: vec![dns::Question {
                node: qname.clone(),
                record_type: qtype,
                class: dns::Class::IN,
            }],
            answers: vec![],
            authorities: vec![],
            additionals: vec![dns::Record::Opt {
                node: dns::Name::from_string(".").unwrap(),
                udp_payload_size: self.edns_buffer_size,
                extended_rcode: 0,
                version: 0,
                do_bit: false,
                data_len: 0,
            }],
        }
    }

    fn send_udp(&self, address: Address, bytes: &[u8], timeout: Duration) -> Result<Vec<u8>, ExecErr> {
        let local = self.local_addr(address.ip());
        let socket = UdpSocket::bind(local).map_err(ExecErr::Socket)?;
        socket.set_read_timeout(Some(timeout)).map_err(ExecErr::Socket)?;
        socket.set_write_timeout(Some(timeout)).map_err(ExecErr::Socket)?;
        socket
            .send_to(bytes, (address.ip(), address.port()))
            .map_err(ExecErr::Socket)?;

        let mut buf = [0u8; dns::MAX_UDP_LEN_BYTES];
        let n = match socket.recv(&mut buf) {
            Ok(n) => n,
            Err(err) if matches!(err.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {
                return Err(ExecErr::Timeout)
            }
            Err(err) => return Err(ExecErr::Socket(err)),
        };
        Ok(buf[..n].to_vec())
    }

    fn send_tcp(&self, address: Address, bytes: &[u8], timeout: Duration) -> Result<Vec<u8>, ExecErr> {
        let local = self.local_addr(address.ip());
        let stream = TcpStream::connect_timeout(&(address.ip(), address.port()).into(), timeout)
            .map_err(to_timeout_or_socket)?;
        stream.set_read_timeout(Some(timeout)).map_err(ExecErr::Socket)?;
        stream.set_write_timeout(Some(timeout)).map_err(ExecErr::Socket)?;
        let _ = local; // the teacher's tcp_server binds ephemeral ports too; client side has no bind hook on connect_timeout

        let mut stream = stream;
        let len = bytes.len() as u16;
        stream.write_all(&len.to_be_bytes()).map_err(to_timeout_or_socket)?;
        stream.write_all(bytes).map_err(to_timeout_or_socket)?;

        let mut len_buf = [0u8; 2];
        stream.read_exact(&mut len_buf).map_err(to_timeout_or_socket)?;
        let resp_len = u16::from_be_bytes(len_buf) as usize;
        let mut resp_buf = vec![0u8; resp_len];
        stream.read_exact(&mut resp_buf).map_err(to_timeout_or_socket)?;
        Ok(resp_buf)
    }
}

fn to_timeout_or_socket(err: std::io::Error) -> ExecErr {
    match err.kind() {
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => ExecErr::Timeout,
        _ => ExecErr::Socket(err),
    }
}

impl QueryExecutor for UdpTcpExecutor {
    fn query(
        &self,
        address: Address,
        qname: &dns::Name,
        qtype: dns::RecordType,
        timeout_us: u64,
        tcp: bool,
    ) -> Result<Reply, ExecErr> {
        let issued = self.queries_issued.fetch_add(1, Ordering::Relaxed) as u64 + 1;
        if issued > self.max_queries {
            return Err(ExecErr::TooManyQueries);
        }

        let request = self.build_request(qname, qtype);
        let request_bytes = request.encode_to_bytes().expect("internally built request always encodes");
        let timeout = Duration::from_micros(timeout_us);

        let resp_bytes = if tcp {
            self.send_tcp(address, &request_bytes, timeout)?
        } else {
            self.send_udp(address, &request_bytes, timeout)?
        };

        let message = match dns::Message::decode_from_bytes(&resp_bytes) {
            Ok(m) => m,
            Err(err) => return Err(ExecErr::InvalidAnswer(format!("{:?}", err))),
        };

        if message.header.id != request.header.id {
            return Err(ExecErr::InvalidAnswer("transaction id mismatch".to_string()));
        }
        if !message.header.query_resp {
            return Err(ExecErr::InvalidAnswer("qr bit not set".to_string()));
        }
        if matches!(message.header.resp_code, dns::RespCode::FormErr) {
            return Err(ExecErr::FormError);
        }
        if message.header.truncated {
            return Err(ExecErr::Truncated);
        }

        Ok(Reply { message })
    }
}

#[cfg(test)]
pub mod fixture {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A canned reply, or an instruction to never answer (to drive the
    /// timeout-backoff property test deterministically).
    pub enum Scripted {
        Reply(dns::Message),
        NeverReplies,
    }

    #[derive(Hash, PartialEq, Eq, Clone)]
    struct Key {
        address: Address,
        qname: dns::Name,
        qtype_num: u16,
    }

    /// An in-memory script of canned replies keyed by (server address, qname,
    /// qtype), so the end-to-end scenarios of §8 run without a live network.
    /// Enforces the same `max_queries` ceiling as [`UdpTcpExecutor`] so a
    /// scenario with an unscripted or never-replying leg terminates with
    /// `TooManyQueries` instead of looping forever.
    pub struct FixtureExecutor {
        script: Mutex<HashMap<Key, dns::Message>>,
        never_replies: Mutex<std::collections::HashSet<Key>>,
        pub queries_issued: std::sync::atomic::AtomicU32,
        max_queries: u64,
    }

    impl Default for FixtureExecutor {
        fn default() -> Self {
            FixtureExecutor {
                script: Mutex::new(HashMap::new()),
                never_replies: Mutex::new(std::collections::HashSet::new()),
                queries_issued: std::sync::atomic::AtomicU32::new(0),
                max_queries: 100,
            }
        }
    }

    impl FixtureExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_max_queries(max_queries: u64) -> Self {
            FixtureExecutor { max_queries, ..Self::default() }
        }

        pub fn script(&self, address: Address, qname: &dns::Name, qtype: dns::RecordType, reply: Scripted) {
            let key = Key { address, qname: qname.clone(), qtype_num: qtype.to_num() };
            match reply {
                Scripted::Reply(msg) => {
                    self.script.lock().unwrap().insert(key, msg);
                }
                Scripted::NeverReplies => {
                    self.never_replies.lock().unwrap().insert(key);
                }
            }
        }
    }

    impl QueryExecutor for FixtureExecutor {
        fn query(
            &self,
            address: Address,
            qname: &dns::Name,
            qtype: dns::RecordType,
            _timeout_us: u64,
            _tcp: bool,
        ) -> Result<Reply, ExecErr> {
            let issued = self.queries_issued.fetch_add(1, Ordering::Relaxed) as u64 + 1;
            if issued > self.max_queries {
                return Err(ExecErr::TooManyQueries);
            }
            let key = Key { address, qname: qname.clone(), qtype_num: qtype.to_num() };
            if self.never_replies.lock().unwrap().contains(&key) {
                return Err(ExecErr::Timeout);
            }
            match self.script.lock().unwrap().get(&key) {
                Some(message) => Ok(Reply { message: message.clone() }),
                None => Err(ExecErr::Timeout),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn ceiling_trips_after_max_queries() {
            let executor = FixtureExecutor::with_max_queries(3);
            let qname = dns::Name::from_string("example.com.").unwrap();
            let address = Address::new(std::net::IpAddr::from([192, 0, 2, 1]), 53);
            for _ in 0..3 {
                assert!(matches!(
                    executor.query(address, &qname, dns::RecordType::A, 0, false),
                    Err(ExecErr::Timeout)
                ));
            }
            assert!(matches!(
                executor.query(address, &qname, dns::RecordType::A, 0, false),
                Err(ExecErr::TooManyQueries)
            ));
        }
    }
}
