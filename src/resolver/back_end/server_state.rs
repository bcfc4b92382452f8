use crate::resolver::back_end::address::Address;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

pub const MIN_TIMEOUT: u64 = 50_000;
pub const DEFAULT_TIMEOUT: u64 = 200_000;
pub const MAX_TIMEOUT: u64 = 12_000_000;

/// Per-address state, shared process-wide across all in-flight resolutions.
/// Tracks an RTT estimate and a derived timeout using a time-decaying EWMA,
/// so samples age out even across long-lived, bursty query patterns.
#[derive(Debug, Clone, Copy)]
pub struct GlobalServerState {
    rtt_estimate: f64,
    rtt_variance: f64,
    timeout: u64,
    backed_off: bool,
    last_update: Instant,
}

impl Default for GlobalServerState {
    fn default() -> Self {
        GlobalServerState {
            rtt_estimate: 0.0,
            rtt_variance: 0.0,
            timeout: DEFAULT_TIMEOUT,
            backed_off: false,
            last_update: Instant::now(),
        }
    }
}

impl GlobalServerState {
    fn update(&mut self, new_rtt_us: u64) {
        let new_rtt = new_rtt_us as f64;
        if self.rtt_estimate == 0.0 {
            self.rtt_estimate = new_rtt;
            self.last_update = Instant::now();
            return;
        }

        let now = Instant::now();
        let delta_t = now.saturating_duration_since(self.last_update).as_secs_f64();
        let f = (-delta_t).exp() / 2.0;

        let old = self.rtt_estimate;
        self.rtt_estimate = (old * f + new_rtt * (1.0 - f)).round();
        let delta = old - self.rtt_estimate;
        self.rtt_variance = (1.0 - f) * (self.rtt_variance + f * f * delta * delta);
        self.last_update = now;

        let candidate = self.rtt_estimate + 4.0 * self.rtt_variance;
        self.timeout = clamp(candidate as u64, MIN_TIMEOUT, MAX_TIMEOUT);
    }

    fn packet_lost(&mut self) {
        self.backed_off = true;
        self.timeout = (self.timeout.saturating_mul(2)).min(MAX_TIMEOUT);
    }
}

fn clamp(v: u64, min: u64, max: u64) -> u64 {
    v.max(min).min(max)
}

/// Process-wide store of [`GlobalServerState`], keyed by [`Address`]. Shared
/// across all concurrent resolutions via a single mutex, exactly as the
/// teacher guards its record cache's backing map.
#[derive(Default)]
pub struct ServerStateStore {
    states: Mutex<HashMap<Address, GlobalServerState>>,
}

impl ServerStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, address: Address, new_rtt_us: u64) {
        self.states
            .lock()
            .unwrap()
            .entry(address)
            .or_default()
            .update(new_rtt_us);
    }

    pub fn packet_lost(&self, address: Address) {
        self.states
            .lock()
            .unwrap()
            .entry(address)
            .or_default()
            .packet_lost();
    }

    pub fn timeout_for(&self, address: Address) -> u64 {
        self.states
            .lock()
            .unwrap()
            .get(&address)
            .map(|s| s.timeout)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_sets_rtt_exactly() {
        let store = ServerStateStore::new();
        let addr = Address::unspecified();
        store.update(addr, 75_000);
        assert_eq!(store.timeout_for(addr), DEFAULT_TIMEOUT);
    }

    #[test]
    fn timeout_stays_within_bounds() {
        let store = ServerStateStore::new();
        let addr = Address::unspecified();
        for rtt in [1, 50_000, 1_000_000, 50_000_000] {
            store.update(addr, rtt);
            let t = store.timeout_for(addr);
            assert!(t >= MIN_TIMEOUT && t <= MAX_TIMEOUT);
        }
    }

    #[test]
    fn packet_lost_at_least_doubles_timeout() {
        let store = ServerStateStore::new();
        let addr = Address::unspecified();
        let before = store.timeout_for(addr);
        store.packet_lost(addr);
        let after = store.timeout_for(addr);
        assert!(after >= before * 2 || after == MAX_TIMEOUT);
    }

    #[test]
    fn unknown_address_uses_default_timeout() {
        let store = ServerStateStore::new();
        assert_eq!(store.timeout_for(Address::unspecified()), DEFAULT_TIMEOUT);
    }
}
