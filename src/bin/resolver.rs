use colored::Colorize;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::{env, process, time};
use tres::resolver::back_end::{Address, ResolveErr};
use tres::resolver::{conf::ResolverConf, roothints, Resolver, ResolverHandler};
use tres::shared::dns;
use tres::shared::log::init_log;
use tres::shared::net::*;

fn main() {
    init_log();

    let args: Vec<String> = env::args().collect();
    match args.len() {
        6 => one_shot(&args[1..]),
        5 => serve(&args[1..]),
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}

/// One-shot mode: `tres NAME TYPE IP4_SRC IP6_SRC HINTS_FILE`. Resolves the
/// name once, prints the records and exits. Exit code 0 on success or
/// NODATA, non-zero on NXDOMAIN, TooManyQueries, or any fatal error.
fn one_shot(args: &[String]) {
    let [name, record_type, ip4_src, ip6_src, hints_file] = args else {
        unreachable!()
    };

    let qname = match dns::Name::from_string(name) {
        Ok(n) => n,
        Err(err) => {
            log::error!("Invalid name '{}': {:?}", name, err);
            process::exit(1);
        }
    };
    let qtype = match dns::RecordType::from_str(&record_type.to_ascii_uppercase()) {
        Ok(t) => t,
        Err(_) => {
            log::error!("Unsupported record type '{}'.", record_type);
            process::exit(1);
        }
    };

    let resolver = build_resolver(ip4_src, ip6_src, hints_file);
    let (result, trace, dot) = resolver.resolve(&qname, qtype);
    log::info!("Resolution trace:\n{}", trace);
    if let Some(dot) = dot {
        println!("{}", dot);
    }

    match result {
        Ok(result) => {
            for record in result.intermediate.iter().chain(result.res.iter()) {
                println!("{:?}", record);
            }
            process::exit(0);
        }
        Err(ResolveErr::NoData) => process::exit(0),
        Err(ResolveErr::NxDomain) => {
            log::error!("{}: no such name.", name);
            process::exit(2);
        }
        Err(ResolveErr::TooManyQueries) => {
            log::error!("{}: too many queries issued while resolving.", name);
            process::exit(3);
        }
        Err(err) => {
            log::error!("Resolving '{}': {:?}", name, err);
            process::exit(4);
        }
    }
}

/// Server mode: `tres LISTEN_IP:PORT IP4_SRC IP6_SRC HINTS_FILE`. Binds a UDP
/// listener and serves requests with the resolution engine behind it.
fn serve(args: &[String]) {
    let [listen, ip4_src, ip6_src, hints_file] = args else {
        unreachable!()
    };

    let (address, port) = match listen.rsplit_once(':') {
        Some((address, port)) => match port.parse::<u16>() {
            Ok(port) => (address.to_string(), port),
            Err(_) => {
                log::error!("Invalid listen port in '{}'.", listen);
                process::exit(1);
            }
        },
        None => {
            log::error!("Expected LISTEN_IP:PORT, got '{}'.", listen);
            process::exit(1);
        }
    };

    let resolver = build_resolver(ip4_src, ip6_src, hints_file);
    let handler = Arc::new(ResolverHandler(resolver));

    let udp_params = UdpParams {
        address,
        port,
        write_timeout: time::Duration::new(5, 0),
        threads: 16,
    };
    let stop = AtomicBool::new(false);
    start_udp_server(handler, udp_params, &stop);
}

fn build_resolver(ip4_src: &str, ip6_src: &str, hints_file: &str) -> Resolver {
    let ip4_src: Ipv4Addr = ip4_src.parse().unwrap_or_else(|_| {
        log::error!("Invalid IPv4 source address '{}'.", ip4_src);
        process::exit(1);
    });
    let ip6_src: Ipv6Addr = ip6_src.parse().unwrap_or_else(|_| {
        log::error!("Invalid IPv6 source address '{}'.", ip6_src);
        process::exit(1);
    });

    let conf = ResolverConf::default();
    if let Err(err) = conf.validate() {
        log::error!("Invalid resolver configuration: {}", err);
        process::exit(1);
    }

    let hints: Vec<(dns::Name, Address)> = match roothints::parse_file(hints_file) {
        Ok(hints) => hints,
        Err(err) => {
            log::error!("Parsing root hints file '{}': {:?}", hints_file, err);
            process::exit(1);
        }
    };

    let resolver = Resolver::new(ip4_src, ip6_src, conf);
    resolver.prime_with_root_hints(&hints);
    resolver
}

fn print_usage() {
    log::error!(
        "Usage:
  One-shot: {} {}
  Server:   {} {}",
        "tres".bold(),
        "NAME TYPE IP4_SRC IP6_SRC HINTS_FILE".bright_green(),
        "tres".bold(),
        "LISTEN_IP:PORT IP4_SRC IP6_SRC HINTS_FILE".bright_green(),
    )
}
