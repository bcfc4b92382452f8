use std::net::IpAddr;

/// An endpoint of a dns conversation: an IP address plus a port. A distinguished
/// sentinel value, [`Address::unspecified`], stands in for "nameserver whose
/// address is not yet known" wherever the cache has a name but no glue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    ip: IpAddr,
    port: u16,
}

impl Address {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Address { ip, port }
    }

    /// The `NO_ADDRESS` sentinel: `0.0.0.0:0`.
    pub fn unspecified() -> Self {
        Address {
            ip: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            port: 0,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        *self == Self::unspecified()
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the same address with the port forced to 53, the well-known
    /// dns port. Used right before a query is sent to an authoritative server.
    pub fn with_dns_port(&self) -> Self {
        Address { ip: self.ip, port: 53 }
    }
}

impl From<IpAddr> for Address {
    fn from(ip: IpAddr) -> Self {
        Address { ip, port: 0 }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unspecified() {
            write!(f, "NO_ADDRESS")
        } else {
            write!(f, "{}:{}", self.ip, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_is_no_address() {
        assert!(Address::unspecified().is_unspecified());
        let a: Address = "198.41.0.4".parse::<IpAddr>().unwrap().into();
        assert!(!a.is_unspecified());
    }
}
