use crate::resolver::back_end::address::Address;
use crate::resolver::back_end::errors::ErrorKind;
use crate::resolver::back_end::nameserver_cache::NameserverCache;
use crate::resolver::back_end::server_state::ServerStateStore;
use crate::shared::dns::Name;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

const EPSILON: f64 = 0.5;

/// Per-(name, address) bookkeeping scoped to a single resolution. Reset
/// whenever a fresh [`Selection`] is created, since these flags only make
/// sense relative to the servers tried for the current top-level query.
#[derive(Debug, Default, Clone, Copy)]
struct LocalServerState {
    errors: u32,
    no_a: bool,
    no_aaaa: bool,
}

impl LocalServerState {
    fn cannot_resolve_name(&self) -> bool {
        self.no_a && self.no_aaaa
    }
}

/// A prepared single-query descriptor returned by [`Selection::get_transport`].
#[derive(Debug, Clone)]
pub struct Transport {
    pub name: Name,
    pub address: Address,
    pub tcp: bool,
    pub timeout_us: u64,
}

#[derive(Debug)]
pub enum SelectionErr {
    SelectionExhausted,
}

/// Created fresh per invocation of the resolution engine, scoped to one
/// zonecut. Owns the local, this-resolution-only error/failure bookkeeping;
/// reads the process-wide [`NameserverCache`] and [`ServerStateStore`].
pub struct Selection<'a> {
    zonecut: Name,
    cache: &'a NameserverCache,
    server_state: &'a ServerStateStore,
    local_state: HashMap<(Name, Address), LocalServerState>,
    do_tcp: bool,
}

impl<'a> Selection<'a> {
    pub fn new(zonecut: Name, cache: &'a NameserverCache, server_state: &'a ServerStateStore) -> Self {
        Selection {
            zonecut,
            cache,
            server_state,
            local_state: HashMap::new(),
            do_tcp: false,
        }
    }

    /// Chooses the next server to query, following the epsilon-greedy policy
    /// of §4.3: explore uniformly at random with probability `ε`, otherwise
    /// exploit the server with fewest errors, tie-broken by lowest timeout.
    pub fn get_transport(&mut self) -> Result<Transport, SelectionErr> {
        let mut servers = self.cache.lookup(&self.zonecut);
        servers.retain(|(name, addr)| {
            !self
                .local_state
                .get(&(name.clone(), *addr))
                .map(LocalServerState::cannot_resolve_name)
                .unwrap_or(false)
        });
        if servers.is_empty() {
            return Err(SelectionErr::SelectionExhausted);
        }

        let (with_address, _without_address): (Vec<_>, Vec<_>) =
            servers.iter().cloned().partition(|(_, addr)| !addr.is_unspecified());

        let u: f64 = rand::thread_rng().gen_range(0.0..1.0);

        if u > EPSILON && !with_address.is_empty() {
            let ordered = self.exploit_order(with_address);
            let (name, address) = ordered.into_iter().next().unwrap();
            let timeout_us = self.server_state.timeout_for(address);
            return Ok(Transport { name, address, tcp: self.do_tcp, timeout_us });
        }

        let (name, address) = servers.choose(&mut rand::thread_rng()).unwrap().clone();
        let timeout_us = self.server_state.timeout_for(address);
        Ok(Transport { name, address, tcp: self.do_tcp, timeout_us })
    }

    /// Shuffle to break ties, then two stable sorts: by timeout, then by
    /// errors (the later sort wins ties, making errors the primary key).
    fn exploit_order(&self, with_address: Vec<(Name, Address)>) -> Vec<(Name, Address)> {
        let mut ordered = with_address;
        ordered.shuffle(&mut rand::thread_rng());
        ordered.sort_by_key(|(_, addr)| self.server_state.timeout_for(*addr));
        ordered.sort_by_key(|(name, addr)| self.errors_for(name, addr));
        ordered
    }

    fn errors_for(&self, name: &Name, addr: &Address) -> u32 {
        self.local_state.get(&(name.clone(), *addr)).map(|s| s.errors).unwrap_or(0)
    }

    pub fn on_success(&mut self, _transport: &Transport) {
        // Reserved for future success-rate tracking; no-op in this core.
    }

    pub fn on_timeout(&mut self, transport: &Transport) {
        self.server_state.packet_lost(transport.address);
    }

    pub fn on_rtt(&mut self, transport: &Transport, elapsed_us: u64) {
        self.server_state.update(transport.address, elapsed_us);
    }

    pub fn on_error(&mut self, transport: &Transport, kind: ErrorKind) {
        let entry = self
            .local_state
            .entry((transport.name.clone(), transport.address))
            .or_default();
        match kind {
            ErrorKind::Timeout => {}
            ErrorKind::Truncated => self.do_tcp = true,
            ErrorKind::CantResolveA => entry.no_a = true,
            ErrorKind::CantResolveAaaa => entry.no_aaaa = true,
            ErrorKind::FormError | ErrorKind::InvalidAnswer | ErrorKind::Socket | ErrorKind::Other => {
                entry.errors += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Name {
        Name::from_string(s).unwrap()
    }

    fn addr(s: &str) -> Address {
        Address::from(s.parse::<std::net::IpAddr>().unwrap())
    }

    #[test]
    fn exhausted_when_no_servers() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let mut sel = Selection::new(n("example.com."), &cache, &states);
        assert!(matches!(sel.get_transport(), Err(SelectionErr::SelectionExhausted)));
    }

    #[test]
    fn never_returns_cannot_resolve_name_server() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        cache.save(&n("."), &n("ns1."), Address::unspecified());
        let mut sel = Selection::new(n("."), &cache, &states);
        let t = sel.get_transport().unwrap();
        sel.on_error(&t, ErrorKind::CantResolveA);
        sel.on_error(&t, ErrorKind::CantResolveAaaa);
        assert!(matches!(sel.get_transport(), Err(SelectionErr::SelectionExhausted)));
    }

    #[test]
    fn exploit_branch_prefers_fewest_errors_then_lowest_timeout() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let good = addr("198.41.0.4");
        let bad = addr("199.9.14.201");

        let mut sel = Selection::new(n("."), &cache, &states);
        let bad_transport = Transport { name: n("bad."), address: bad, tcp: false, timeout_us: 0 };
        sel.on_error(&bad_transport, ErrorKind::FormError);

        let servers = vec![(n("good."), good), (n("bad."), bad)];
        let ordered = sel.exploit_order(servers);
        assert_eq!(ordered[0], (n("good."), good));
    }

    #[test]
    fn exploit_order_ties_broken_by_timeout() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let fast = addr("198.41.0.4");
        let slow = addr("199.9.14.201");
        states.update(fast, 10_000);
        states.update(slow, 10_000);
        states.packet_lost(slow);

        let sel = Selection::new(n("."), &cache, &states);
        let servers = vec![(n("slow."), slow), (n("fast."), fast)];
        let ordered = sel.exploit_order(servers);
        assert_eq!(ordered[0], (n("fast."), fast));
    }
}
