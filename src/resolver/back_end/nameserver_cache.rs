use crate::resolver::back_end::address::Address;
use crate::shared::dns::Name;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Process-wide, shared-across-resolutions memo of zonecut -> nameserver-name
/// and nameserver-name -> address relationships. Unlike the teacher's
/// [`super::cache`]-style record cache this grows monotonically: entries are
/// never removed or expired, since stale reads are always safe here (a nameserver
/// that answered once for a zone keeps answering for it; we just keep learning
/// more addresses over time).
#[derive(Default)]
pub struct NameserverCache {
    ns_by_zone: Mutex<HashMap<Name, HashSet<Name>>>,
    addr_by_ns: Mutex<HashMap<Name, HashSet<Address>>>,
}

impl NameserverCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name` into `ns_by_zone[zone]`; if `address` isn't `NO_ADDRESS`,
    /// also inserts it into `addr_by_ns[name]`.
    pub fn save(&self, zone: &Name, name: &Name, address: Address) {
        self.ns_by_zone
            .lock()
            .unwrap()
            .entry(zone.clone())
            .or_default()
            .insert(name.clone());

        if !address.is_unspecified() {
            self.addr_by_ns
                .lock()
                .unwrap()
                .entry(name.clone())
                .or_default()
                .insert(address);
        }
    }

    /// Returns `(name, address)` pairs for every nameserver known for `zone`.
    /// A nameserver with no known address is still returned, paired with
    /// `Address::unspecified()`. Order is unspecified.
    pub fn lookup(&self, zone: &Name) -> Vec<(Name, Address)> {
        let ns_by_zone = self.ns_by_zone.lock().unwrap();
        let addr_by_ns = self.addr_by_ns.lock().unwrap();

        let names = match ns_by_zone.get(zone) {
            None => return vec![],
            Some(names) => names,
        };

        let mut servers = Vec::new();
        for name in names {
            match addr_by_ns.get(name) {
                None => servers.push((name.clone(), Address::unspecified())),
                Some(addrs) if addrs.is_empty() => servers.push((name.clone(), Address::unspecified())),
                Some(addrs) => servers.extend(addrs.iter().map(|a| (name.clone(), *a))),
            }
        }
        servers
    }

    /// True iff at least one address is known for `name`.
    pub fn is_resolved(&self, name: &Name) -> bool {
        self.addr_by_ns
            .lock()
            .unwrap()
            .get(name)
            .map(|addrs| !addrs.is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Name {
        Name::from_string(s).unwrap()
    }

    #[test]
    fn save_then_lookup_contains_pair() {
        let cache = NameserverCache::new();
        let addr = Address::from("198.41.0.4".parse::<std::net::IpAddr>().unwrap());
        cache.save(&n("."), &n("a.root-servers.net."), addr);
        let servers = cache.lookup(&n("."));
        assert!(servers.contains(&(n("a.root-servers.net."), addr)));
    }

    #[test]
    fn unresolved_name_returned_with_no_address() {
        let cache = NameserverCache::new();
        cache.save(&n("com."), &n("a.gtld-servers.net."), Address::unspecified());
        let servers = cache.lookup(&n("com."));
        assert_eq!(servers, vec![(n("a.gtld-servers.net."), Address::unspecified())]);
        assert!(!cache.is_resolved(&n("a.gtld-servers.net.")));
    }

    #[test]
    fn lookup_of_absent_zone_is_empty() {
        let cache = NameserverCache::new();
        assert!(cache.lookup(&n("example.com.")).is_empty());
    }

    #[test]
    fn accumulation_is_monotonic() {
        let cache = NameserverCache::new();
        let a1 = Address::from("198.41.0.4".parse::<std::net::IpAddr>().unwrap());
        let a2 = Address::from("199.9.14.201".parse::<std::net::IpAddr>().unwrap());
        cache.save(&n("."), &n("a.root-servers.net."), a1);
        let first = cache.lookup(&n("."));
        cache.save(&n("."), &n("b.root-servers.net."), a2);
        let second = cache.lookup(&n("."));
        assert!(second.len() > first.len());
        for pair in &first {
            assert!(second.contains(pair));
        }
    }
}
