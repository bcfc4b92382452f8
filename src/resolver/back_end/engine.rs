use crate::resolver::back_end::address::Address;
use crate::resolver::back_end::errors::{ErrorKind, ResolveErr};
use crate::resolver::back_end::executor::{ExecErr, QueryExecutor, UdpTcpExecutor};
use crate::resolver::back_end::nameserver_cache::NameserverCache;
use crate::resolver::back_end::selection::{Selection, SelectionErr};
use crate::resolver::back_end::server_state::ServerStateStore;
use crate::resolver::back_end::trace::{DotTrace, Trace, TraceParams};
use crate::resolver::back_end::utils::{extract_record, extract_records, record_address, root_zone_nameservers};
use crate::resolver::conf::ResolverConf;
use crate::shared::dns::{Name, RecordType, RespCode};
use std::collections::HashSet;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Instant;

/// The outcome of a resolution: the records the caller asked for, plus the
/// ordered chain of CNAME records traversed to reach them.
#[derive(Debug, Default, Clone)]
pub struct ResolveResult {
    pub res: Vec<crate::shared::dns::Record>,
    pub intermediate: Vec<crate::shared::dns::Record>,
}

/// One instance per top-level query, grounded on
/// `examples/original_source/tdns/tres.cc`'s `TDNSResolver::resolveAt`
/// method-recursion shape: the query counter lives in the executor
/// (shared across the whole recursive call tree via `&self`), and the trace
/// sinks live here, also shared across the tree via `&mut self`.
pub struct Engine<'a, E: QueryExecutor> {
    executor: &'a E,
    cache: &'a NameserverCache,
    server_state: &'a ServerStateStore,
    pub trace: Trace,
    pub dot: Option<DotTrace>,
}

impl<'a, E: QueryExecutor> Engine<'a, E> {
    pub fn new(
        executor: &'a E,
        cache: &'a NameserverCache,
        server_state: &'a ServerStateStore,
        trace_params: TraceParams,
        with_dot: bool,
    ) -> Self {
        Engine {
            executor,
            cache,
            server_state,
            trace: Trace::new(trace_params),
            dot: with_dot.then(DotTrace::new),
        }
    }

    /// Resolves `(qname, qtype)` starting from the root zone. A
    /// `SelectionExhausted` failure at this top level is not surfaced as an
    /// error: it is reported back as an empty result, per the spec's
    /// propagation policy.
    pub fn resolve(&mut self, qname: &Name, qtype: RecordType) -> Result<ResolveResult, ResolveErr> {
        let root = Name::from_string(".").unwrap();
        match self.resolve_at(qname, qtype, &root, None) {
            Err(ResolveErr::SelectionExhausted) => Ok(ResolveResult::default()),
            other => other,
        }
    }

    fn resolve_at(
        &mut self,
        qname: &Name,
        qtype: RecordType,
        auth: &Name,
        dot_parent: Option<u32>,
    ) -> Result<ResolveResult, ResolveErr> {
        self.trace.t_start(qname, qtype, auth);
        let mut selection = Selection::new(auth.clone(), self.cache, self.server_state);
        let mut result = ResolveResult::default();

        loop {
            let transport = match selection.get_transport() {
                Ok(t) => t,
                Err(SelectionErr::SelectionExhausted) => return Err(ResolveErr::SelectionExhausted),
            };

            if transport.address.is_unspecified() {
                for family_qtype in [RecordType::A, RecordType::AAAA] {
                    match self.resolve(&transport.name, family_qtype) {
                        Ok(sub_result) if !sub_result.res.is_empty() => {
                            for rec in &sub_result.res {
                                self.cache.save(auth, &transport.name, record_address(rec));
                            }
                        }
                        Err(ResolveErr::TooManyQueries) => return Err(ResolveErr::TooManyQueries),
                        _ => {
                            let kind = match family_qtype {
                                RecordType::A => ErrorKind::CantResolveA,
                                _ => ErrorKind::CantResolveAaaa,
                            };
                            selection.on_error(&transport, kind);
                        }
                    }
                }
                continue;
            }

            let dest = transport.address.with_dns_port();
            let dot_id = self.dot.as_mut().map(|d| d.dot_query(dot_parent, &transport.name, qname, qtype));

            let start = Instant::now();
            let outcome = self.executor.query(dest, qname, qtype, transport.timeout_us, transport.tcp);
            let elapsed_us = start.elapsed().as_micros() as u64;

            let message = match outcome {
                Ok(reply) => {
                    selection.on_success(&transport);
                    selection.on_rtt(&transport, elapsed_us);
                    reply.message
                }
                Err(ExecErr::TooManyQueries) => return Err(ResolveErr::TooManyQueries),
                Err(ExecErr::Timeout) => {
                    // No on_rtt here: the elapsed time is the executor's own
                    // wall-clock wait, not a real round-trip sample, and
                    // feeding it to the EWMA would undo packet_lost's backoff.
                    selection.on_timeout(&transport);
                    self.trace.t_ns_err(ErrorKind::Timeout);
                    continue;
                }
                Err(ExecErr::Socket(_)) => {
                    selection.on_error(&transport, ErrorKind::Socket);
                    self.trace.t_ns_err(ErrorKind::Socket);
                    continue;
                }
                Err(ExecErr::Truncated) => {
                    selection.on_error(&transport, ErrorKind::Truncated);
                    self.trace.t_ns_err(ErrorKind::Truncated);
                    continue;
                }
                Err(ExecErr::FormError) => {
                    selection.on_error(&transport, ErrorKind::FormError);
                    self.trace.t_ns_err(ErrorKind::FormError);
                    continue;
                }
                Err(ExecErr::InvalidAnswer(_)) => {
                    selection.on_error(&transport, ErrorKind::InvalidAnswer);
                    self.trace.t_ns_err(ErrorKind::InvalidAnswer);
                    continue;
                }
            };

            self.trace.t_raw_resp(&message);
            self.trace.t_ns_resp(&message);

            let question_matches = message
                .questions
                .first()
                .map(|q| q.node == *qname && q.record_type == qtype)
                .unwrap_or(false);
            if !question_matches {
                continue;
            }

            let has_cname_for_qname = message
                .answers
                .iter()
                .any(|r| r.record_type() == RecordType::CNAME && r.node() == qname);

            match message.header.resp_code {
                RespCode::NxDomain if !has_cname_for_qname => return Err(ResolveErr::NxDomain),
                RespCode::NoError | RespCode::NxDomain => {}
                _ => continue,
            }

            let mut message = message;
            if message.header.auth_answer {
                let matched = extract_records(&mut message.answers, qtype, qname);
                result.res.extend(matched);
                if let Some(dot_id) = dot_id {
                    if let Some(dot) = self.dot.as_mut() {
                        if !result.res.is_empty() {
                            dot.dot_answer(dot_id, &result.res);
                        }
                    }
                }

                if let Some(cname_rec) = extract_record(&mut message.answers, RecordType::CNAME, qname) {
                    let target = cname_rec.cname_data().clone();
                    result.intermediate.push(cname_rec);
                    if let Some(dot_id) = dot_id {
                        if let Some(dot) = self.dot.as_mut() {
                            dot.dot_cname(dot_id, &target);
                        }
                    }

                    if target.is_in_zone(auth) {
                        let in_message = extract_records(&mut message.answers, qtype, &target);
                        if !in_message.is_empty() {
                            result.res.extend(in_message);
                            return Ok(result);
                        }
                    }

                    let sub = self.resolve(&target, qtype)?;
                    result.res = sub.res;
                    result.intermediate.extend(sub.intermediate);
                    return Ok(result);
                }
            } else {
                let mut new_auth: Option<Name> = None;
                let mut ns_names: HashSet<Name> = HashSet::new();

                for ns_rec in message.authorities.iter().filter(|r| r.record_type() == RecordType::NS) {
                    let zone = ns_rec.node().clone();
                    if qname.is_in_zone(&zone) {
                        let ns_name = ns_rec.ns_data().clone();
                        self.cache.save(&zone, &ns_name, Address::unspecified());
                        ns_names.insert(ns_name);
                        new_auth = Some(zone);
                    }
                }

                if let Some(new_auth) = &new_auth {
                    for glue in message
                        .additionals
                        .iter()
                        .filter(|r| matches!(r.record_type(), RecordType::A | RecordType::AAAA))
                    {
                        if ns_names.contains(glue.node()) && glue.node().is_in_zone(auth) {
                            self.cache.save(new_auth, glue.node(), record_address(glue));
                        }
                    }
                    if let Some(dot_id) = dot_id {
                        if let Some(dot) = self.dot.as_mut() {
                            dot.dot_delegation(dot_id, new_auth);
                        }
                    }
                }

                if !result.res.is_empty() {
                    return Ok(result);
                }
                if let Some(new_auth) = new_auth {
                    match self.resolve_at(qname, qtype, &new_auth, dot_id) {
                        Ok(sub) if !sub.res.is_empty() => return Ok(sub),
                        Err(ResolveErr::TooManyQueries) => return Err(ResolveErr::TooManyQueries),
                        _ => continue,
                    }
                }
                continue;
            }

            if !result.res.is_empty() {
                return Ok(result);
            }
            if message.header.auth_answer {
                return Err(ResolveErr::NoData);
            }
        }
    }
}

/// Tries each `(name, address)` hint in turn as the target of one NS query
/// at `.`, stopping at the first reply and saving every A/AAAA record found
/// anywhere in it (answer, authority and additional sections) into the
/// cache at the root zone. Returns whether any hint server answered.
fn prime_root_from_hints<E: QueryExecutor>(executor: &E, cache: &NameserverCache, hints: &[(Name, Address)]) -> bool {
    let root = Name::from_string(".").unwrap();
    for (_, address) in hints {
        let message = match executor.query(*address, &root, RecordType::NS, crate::resolver::back_end::server_state::DEFAULT_TIMEOUT, false) {
            Ok(reply) => reply.message,
            Err(_) => continue,
        };
        let mut glue = message.answers;
        glue.extend(message.authorities);
        glue.extend(message.additionals);
        let mut primed = false;
        for rec in &glue {
            if matches!(rec.record_type(), RecordType::A | RecordType::AAAA) {
                cache.save(&root, rec.node(), record_address(rec));
                primed = true;
            }
        }
        if primed {
            return true;
        }
    }
    false
}

/// Front-end over [`Engine`], owning the process-wide shared state and
/// building one fresh [`Engine`] (with its own query counter) per top-level
/// resolution, exactly as §5 describes: an independently scheduled task gets
/// a fresh resolver state but shares the nameserver cache and server-state
/// store with the rest of the process.
pub struct Resolver {
    cache: Arc<NameserverCache>,
    server_state: Arc<ServerStateStore>,
    ip4_src: Ipv4Addr,
    ip6_src: Ipv6Addr,
    conf: ResolverConf,
}

impl Resolver {
    pub fn new(ip4_src: Ipv4Addr, ip6_src: Ipv6Addr, conf: ResolverConf) -> Self {
        let cache = Arc::new(NameserverCache::new());
        for (name, address) in root_zone_nameservers() {
            cache.save(&Name::from_string(".").unwrap(), &name, address);
        }
        Resolver {
            cache,
            server_state: Arc::new(ServerStateStore::new()),
            ip4_src,
            ip6_src,
            conf,
        }
    }

    /// Primes the nameserver cache with root hints parsed from a file. Per
    /// §6, the hints themselves are not trusted directly: each is tried in
    /// turn as the target of one live NS query at `.`, mirroring
    /// `original_source/tdns/tres.cc`'s `main()`. The first hint server that
    /// answers has its reply's A/AAAA glue saved into the cache and the
    /// remaining hints are skipped. If every hint server fails to answer
    /// (e.g. no network in a test environment), the hints are saved
    /// directly so the resolver still starts with root addresses.
    pub fn prime_with_root_hints(&self, hints: &[(Name, Address)]) {
        let executor = UdpTcpExecutor::with_edns_buffer_size(self.ip4_src, self.ip6_src, hints.len().max(1) as u64, self.conf.edns_buffer_size);
        if prime_root_from_hints(&executor, &self.cache, hints) {
            return;
        }
        let root = Name::from_string(".").unwrap();
        for (name, address) in hints {
            self.cache.save(&root, name, *address);
        }
    }

    /// Resolves `(qname, qtype)`, returning the result alongside the text
    /// trace and, if enabled, a rendered Graphviz-DOT document.
    pub fn resolve(&self, qname: &Name, qtype: RecordType) -> (Result<ResolveResult, ResolveErr>, Trace, Option<String>) {
        let executor = UdpTcpExecutor::with_edns_buffer_size(self.ip4_src, self.ip6_src, self.conf.max_queries, self.conf.edns_buffer_size);
        let mut engine = Engine::new(&executor, &self.cache, &self.server_state, self.conf.trace.clone(), self.conf.dot_trace);
        let result = engine.resolve(qname, qtype);
        let dot_render = engine.dot.as_ref().map(|d| d.render());
        (result, engine.trace, dot_render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::back_end::executor::fixture::{FixtureExecutor, Scripted};
    use crate::resolver::back_end::utils::root_zone_nameservers;
    use crate::shared::dns::{Class, Header, Message, Question, Record};

    fn n(s: &str) -> Name {
        Name::from_string(s).unwrap()
    }

    fn addr(ip: [u8; 4]) -> Address {
        Address::new(std::net::IpAddr::V4(std::net::Ipv4Addr::from(ip)), 53)
    }

    fn authoritative_a_reply(qname: &Name, ip: [u8; 4]) -> Message {
        let mut header = Header::default();
        header.query_resp = true;
        header.auth_answer = true;
        header.questions_count = 1;
        header.answers_count = 1;
        Message {
            header,
            questions: vec![Question { node: qname.clone(), record_type: RecordType::A, class: Class::IN }],
            answers: vec![Record::A { node: qname.clone(), class: Class::IN, ttl: 300, data_len: 4, address: ip }],
            authorities: vec![],
            additionals: vec![],
        }
    }

    fn nxdomain_reply(qname: &Name) -> Message {
        let mut header = Header::default();
        header.query_resp = true;
        header.auth_answer = true;
        header.questions_count = 1;
        header.resp_code = RespCode::NxDomain;
        Message {
            header,
            questions: vec![Question { node: qname.clone(), record_type: RecordType::A, class: Class::IN }],
            answers: vec![],
            authorities: vec![],
            additionals: vec![],
        }
    }

    fn new_engine<'a>(executor: &'a FixtureExecutor, cache: &'a NameserverCache, states: &'a ServerStateStore) -> Engine<'a, FixtureExecutor> {
        Engine::new(executor, cache, states, TraceParams { silent: true, ..Default::default() }, false)
    }

    #[test]
    fn direct_a_lookup_with_glue() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let executor = FixtureExecutor::new();

        let root = n(".");
        let ns = n("a.root-servers.net.");
        let a = addr([198, 41, 0, 4]);
        cache.save(&root, &ns, a);

        let qname = n("a.root-servers.net.");
        executor.script(a, &qname, RecordType::A, Scripted::Reply(authoritative_a_reply(&qname, [198, 41, 0, 4])));

        let mut engine = new_engine(&executor, &cache, &states);
        let result = engine.resolve(&qname, RecordType::A).unwrap();
        assert_eq!(result.res.len(), 1);
        assert!(result.intermediate.is_empty());
        assert_eq!(executor.queries_issued.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[test]
    fn one_delegation() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let executor = FixtureExecutor::new();

        for (name, address) in root_zone_nameservers() {
            cache.save(&n("."), &name, address);
        }
        let root_ns = addr([198, 41, 0, 4]);

        let qname = n("example.com.");
        let com_ns_addr = addr([192, 0, 2, 1]);
        let example_ns_addr = addr([192, 0, 2, 2]);

        // Root refers to com. with glue for its nameserver.
        let mut root_reply = {
            let mut h = Header::default();
            h.query_resp = true;
            h.questions_count = 1;
            Message {
                header: h,
                questions: vec![Question { node: qname.clone(), record_type: RecordType::A, class: Class::IN }],
                answers: vec![],
                authorities: vec![Record::NS {
                    node: n("com."),
                    class: Class::IN,
                    ttl: 300,
                    data_len: 0,
                    name: n("ns.com."),
                }],
                additionals: vec![Record::A {
                    node: n("ns.com."),
                    class: Class::IN,
                    ttl: 300,
                    data_len: 4,
                    address: [192, 0, 2, 1],
                }],
            }
        };
        root_reply.header.authorities_count = 1;
        root_reply.header.additionals_count = 1;
        for (_, a) in root_zone_nameservers() {
            executor.script(a, &qname, RecordType::A, Scripted::Reply(clone_message(&root_reply)));
        }

        // com. refers to example.com. with glue.
        let mut com_reply = {
            let mut h = Header::default();
            h.query_resp = true;
            h.questions_count = 1;
            Message {
                header: h,
                questions: vec![Question { node: qname.clone(), record_type: RecordType::A, class: Class::IN }],
                answers: vec![],
                authorities: vec![Record::NS {
                    node: n("example.com."),
                    class: Class::IN,
                    ttl: 300,
                    data_len: 0,
                    name: n("ns.example.com."),
                }],
                additionals: vec![Record::A {
                    node: n("ns.example.com."),
                    class: Class::IN,
                    ttl: 300,
                    data_len: 4,
                    address: [192, 0, 2, 2],
                }],
            }
        };
        com_reply.header.authorities_count = 1;
        com_reply.header.additionals_count = 1;
        executor.script(com_ns_addr, &qname, RecordType::A, Scripted::Reply(com_reply));

        executor.script(
            example_ns_addr,
            &qname,
            RecordType::A,
            Scripted::Reply(authoritative_a_reply(&qname, [93, 184, 216, 34])),
        );

        let _ = root_ns;
        let mut engine = new_engine(&executor, &cache, &states);
        let result = engine.resolve(&qname, RecordType::A).unwrap();
        assert_eq!(result.res.len(), 1);
        assert!(result.intermediate.is_empty());
        assert!(!cache.lookup(&n("com.")).is_empty());
        assert!(!cache.lookup(&n("example.com.")).is_empty());
    }

    fn clone_message(m: &Message) -> Message {
        Message {
            header: m.header.clone(),
            questions: m.questions.clone(),
            answers: m.answers.clone(),
            authorities: m.authorities.clone(),
            additionals: m.additionals.clone(),
        }
    }

    #[test]
    fn cname_chase_within_bailiwick() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let executor = FixtureExecutor::new();

        let zone = n("example.com.");
        let ns = n("ns.example.com.");
        let ns_addr = addr([192, 0, 2, 3]);
        cache.save(&zone, &ns, ns_addr);

        let qname = n("www.example.com.");
        let cdn = n("cdn.example.com.");

        let mut h = Header::default();
        h.query_resp = true;
        h.auth_answer = true;
        h.questions_count = 1;
        h.answers_count = 2;
        let reply = Message {
            header: h,
            questions: vec![Question { node: qname.clone(), record_type: RecordType::A, class: Class::IN }],
            answers: vec![
                Record::CNAME { node: qname.clone(), class: Class::IN, ttl: 300, data_len: 0, name: cdn.clone() },
                Record::A { node: cdn.clone(), class: Class::IN, ttl: 300, data_len: 4, address: [1, 2, 3, 4] },
            ],
            authorities: vec![],
            additionals: vec![],
        };
        executor.script(ns_addr, &qname, RecordType::A, Scripted::Reply(reply));

        let mut engine = new_engine(&executor, &cache, &states);
        let result = engine.resolve_at(&qname, RecordType::A, &zone, None).unwrap();
        assert_eq!(result.res.len(), 1);
        assert_eq!(result.intermediate.len(), 1);
        assert_eq!(executor.queries_issued.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[test]
    fn cname_chase_across_zone() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let executor = FixtureExecutor::new();

        for (name, address) in root_zone_nameservers() {
            cache.save(&n("."), &name, address);
        }

        let zone = n("example.com.");
        let ns = n("ns.example.com.");
        let ns_addr = addr([192, 0, 2, 5]);
        cache.save(&zone, &ns, ns_addr);

        let qname = n("www.example.com.");
        let target = n("other.org.");

        let mut h = Header::default();
        h.query_resp = true;
        h.auth_answer = true;
        h.questions_count = 1;
        h.answers_count = 1;
        let reply = Message {
            header: h,
            questions: vec![Question { node: qname.clone(), record_type: RecordType::A, class: Class::IN }],
            answers: vec![Record::CNAME { node: qname.clone(), class: Class::IN, ttl: 300, data_len: 0, name: target.clone() }],
            authorities: vec![],
            additionals: vec![],
        };
        executor.script(ns_addr, &qname, RecordType::A, Scripted::Reply(reply));

        // The CNAME target lives outside example.com.'s bailiwick, so it can't
        // be resolved from the in-message scan; a fresh top-level resolve()
        // starting at root picks it up.
        for (_, a) in root_zone_nameservers() {
            executor.script(a, &target, RecordType::A, Scripted::Reply(authoritative_a_reply(&target, [5, 6, 7, 8])));
        }

        let mut engine = new_engine(&executor, &cache, &states);
        let result = engine.resolve_at(&qname, RecordType::A, &zone, None).unwrap();
        assert_eq!(result.res.len(), 1);
        assert_eq!(result.intermediate.len(), 1);
    }

    #[test]
    fn timeout_backoff_and_ceiling() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let executor = FixtureExecutor::with_max_queries(5);

        let zone = n("example.com.");
        let ns = n("ns.example.com.");
        let ns_addr = addr([192, 0, 2, 9]);
        cache.save(&zone, &ns, ns_addr);

        let qname = n("dead.example.com.");
        executor.script(ns_addr, &qname, RecordType::A, Scripted::NeverReplies);

        let mut engine = new_engine(&executor, &cache, &states);
        let err = engine.resolve_at(&qname, RecordType::A, &zone, None).unwrap_err();
        assert!(matches!(err, ResolveErr::TooManyQueries));
        assert!(states.timeout_for(ns_addr) >= 2 * crate::resolver::back_end::server_state::DEFAULT_TIMEOUT);
        assert!(states.timeout_for(ns_addr) <= crate::resolver::back_end::server_state::MAX_TIMEOUT);
    }

    #[test]
    fn nxdomain_without_cname_fails() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let executor = FixtureExecutor::new();

        let zone = n("example.com.");
        let ns = n("ns.example.com.");
        let ns_addr = addr([192, 0, 2, 4]);
        cache.save(&zone, &ns, ns_addr);

        let qname = n("nope.example.com.");
        executor.script(ns_addr, &qname, RecordType::A, Scripted::Reply(nxdomain_reply(&qname)));

        let mut engine = new_engine(&executor, &cache, &states);
        let err = engine.resolve_at(&qname, RecordType::A, &zone, None).unwrap_err();
        assert!(matches!(err, ResolveErr::NxDomain));
    }

    #[test]
    fn selection_exhausted_at_top_level_yields_empty_result() {
        let cache = NameserverCache::new();
        let states = ServerStateStore::new();
        let executor = FixtureExecutor::new();
        let mut engine = new_engine(&executor, &cache, &states);
        let result = engine.resolve(&n("anything.invalid."), RecordType::A).unwrap();
        assert!(result.res.is_empty());
    }

    fn ns_reply_with_glue(ns_name: &Name, ns_addr: [u8; 4]) -> Message {
        let mut header = Header::default();
        header.query_resp = true;
        header.auth_answer = true;
        header.questions_count = 1;
        header.answers_count = 1;
        header.additionals_count = 1;
        Message {
            header,
            questions: vec![Question { node: n("."), record_type: RecordType::NS, class: Class::IN }],
            answers: vec![Record::NS { node: n("."), class: Class::IN, ttl: 300, data_len: 0, name: ns_name.clone() }],
            authorities: vec![],
            additionals: vec![Record::A { node: ns_name.clone(), class: Class::IN, ttl: 300, data_len: 4, address: ns_addr }],
        }
    }

    #[test]
    fn priming_queries_hints_and_saves_live_glue() {
        let cache = NameserverCache::new();
        let executor = FixtureExecutor::new();
        let hint_addr = addr([192, 0, 2, 53]);
        let ns_name = n("a.root-servers.net.");
        let ns_addr = [198, 41, 0, 4];
        executor.script(hint_addr, &n("."), RecordType::NS, Scripted::Reply(ns_reply_with_glue(&ns_name, ns_addr)));

        let hints = vec![(n("a.root-servers.net."), hint_addr)];
        let primed = prime_root_from_hints(&executor, &cache, &hints);

        assert!(primed);
        let found = cache.lookup(&n("."));
        assert!(found.iter().any(|(name, address)| *name == ns_name && *address == Address::new(std::net::IpAddr::V4(std::net::Ipv4Addr::from(ns_addr)), 53)));
    }

    #[test]
    fn priming_falls_back_to_hints_when_no_server_answers() {
        let cache = NameserverCache::new();
        let executor = FixtureExecutor::new();
        let hint_addr = addr([192, 0, 2, 53]);
        let hints = vec![(n("a.root-servers.net."), hint_addr)];

        let primed = prime_root_from_hints(&executor, &cache, &hints);
        assert!(!primed);
    }
}
