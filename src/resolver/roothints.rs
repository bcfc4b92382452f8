use crate::resolver::back_end::address::Address;
use crate::shared::dns::Name;
use std::fs;
use std::io;
use std::net::IpAddr;

/// Parses the root-hints text format of §6: comment lines starting with `;`,
/// otherwise whitespace-separated `name [ttl] IN type address` tokens (the TTL
/// is optional, matching the real named.root format). NS lines are skipped;
/// only `A`/`AAAA` glue lines are collected into `(name, address)` pairs.
/// Grounded on `nameserver/zones/tokens.rs`'s buffered-line-loop-skipping-
/// comments style, simplified since this grammar has no multiline records,
/// directives or quoting to handle.
pub fn parse_file(path: &str) -> Result<Vec<(Name, Address)>, RootHintsErr> {
    let contents = fs::read_to_string(path).map_err(RootHintsErr::Io)?;
    parse_str(&contents)
}

fn parse_str(contents: &str) -> Result<Vec<(Name, Address)>, RootHintsErr> {
    let mut hints = vec![];
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (name, class, kind, address) = match tokens.as_slice() {
            [name, class, kind, address] => (*name, *class, *kind, *address),
            [name, _ttl, class, kind, address] => (*name, *class, *kind, *address),
            _ => return Err(RootHintsErr::Malformed(line_no + 1, line.to_string())),
        };
        if !class.eq_ignore_ascii_case("IN") {
            return Err(RootHintsErr::Malformed(line_no + 1, line.to_string()));
        }
        if kind.eq_ignore_ascii_case("NS") {
            continue;
        }
        if !kind.eq_ignore_ascii_case("A") && !kind.eq_ignore_ascii_case("AAAA") {
            return Err(RootHintsErr::Malformed(line_no + 1, line.to_string()));
        }

        let name = Name::from_string(&name.to_ascii_lowercase()).map_err(|err| RootHintsErr::Name(line_no + 1, err))?;
        let ip: IpAddr = address
            .parse()
            .map_err(|_| RootHintsErr::Malformed(line_no + 1, line.to_string()))?;
        hints.push((name, Address::new(ip, 53)));
    }
    Ok(hints)
}

#[derive(Debug)]
pub enum RootHintsErr {
    Io(io::Error),
    Malformed(usize, String),
    Name(usize, crate::shared::dns::NameErr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_and_a_aaaa_lines() {
        let text = "\
; this is a comment
.                        3600000      IN      NS      A.ROOT-SERVERS.NET.
A.ROOT-SERVERS.NET.      3600000      IN      A       198.41.0.4
A.ROOT-SERVERS.NET.      3600000      IN      AAAA    2001:503:ba3e::2:30
";
        let parsed = parse_str(text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, Name::from_string("a.root-servers.net.").unwrap());
    }

    #[test]
    fn rejects_malformed_line() {
        assert!(parse_str("not enough tokens").is_err());
    }
}
