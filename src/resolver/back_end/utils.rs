use crate::resolver::back_end::address::Address;
use crate::shared::dns::{Name, Record, RecordType};

/// The 13 root nameservers, used to prime the nameserver cache when no
/// root-hints file is supplied (tests, and the `roothints` module's own
/// fallback).
pub const ROOT_SERVERS: [(&str, [u8; 4]); 13] = [
    ("a.root-servers.net.", [198, 41, 0, 4]),
    ("b.root-servers.net.", [199, 9, 14, 201]),
    ("c.root-servers.net.", [192, 33, 4, 12]),
    ("d.root-servers.net.", [199, 7, 91, 13]),
    ("e.root-servers.net.", [192, 203, 230, 10]),
    ("f.root-servers.net.", [192, 5, 5, 241]),
    ("g.root-servers.net.", [192, 112, 36, 4]),
    ("h.root-servers.net.", [198, 97, 190, 53]),
    ("i.root-servers.net.", [192, 36, 148, 17]),
    ("j.root-servers.net.", [192, 58, 128, 30]),
    ("k.root-servers.net.", [193, 0, 14, 129]),
    ("l.root-servers.net.", [199, 7, 83, 42]),
    ("m.root-servers.net.", [202, 12, 27, 33]),
];

/// Returns `(name, address)` pairs for the root nameservers, ready to be
/// primed into a [`crate::resolver::back_end::NameserverCache`] at `.`.
pub fn root_zone_nameservers() -> Vec<(Name, Address)> {
    ROOT_SERVERS
        .iter()
        .map(|(name, ip)| {
            let addr = Address::new(std::net::IpAddr::V4(std::net::Ipv4Addr::from(*ip)), 53);
            (Name::from_string(name).unwrap(), addr)
        })
        .collect()
}

/// Extract and return all records of the given type and node from the
/// passed vector. The records are removed from the vector, not cloned.
pub fn extract_records(records: &mut Vec<Record>, kind: RecordType, node: &Name) -> Vec<Record> {
    let mut searched_records = vec![];
    let mut start_from = 0;
    loop {
        if start_from >= records.len() {
            return searched_records;
        }

        let record_index = records[start_from..]
            .iter()
            .enumerate()
            .filter(|(_, rec)| rec.node() == node)
            .find(|(_, rec)| rec.record_type() == kind)
            .map(|(i, _)| i + start_from);

        match record_index {
            None => return searched_records,
            Some(i) => {
                let record = records.swap_remove(i);
                searched_records.push(record);
                start_from = i;
            }
        }
    }
}

/// Extract and return the first record of the given type and node from the
/// passed vector. The record is removed from the vector, not cloned.
pub fn extract_record(records: &mut Vec<Record>, kind: RecordType, node: &Name) -> Option<Record> {
    let record_index = records
        .iter()
        .enumerate()
        .filter(|(_, rec)| rec.node() == node)
        .find(|(_, rec)| rec.record_type() == kind)
        .map(|(i, _)| i)?;

    Some(records.swap_remove(record_index))
}

/// Address of an A or AAAA record, regardless of family.
pub fn record_address(record: &Record) -> Address {
    match record.record_type() {
        RecordType::A => Address::new(std::net::IpAddr::V4(std::net::Ipv4Addr::from(*record.a_data())), 53),
        RecordType::AAAA => Address::new(std::net::IpAddr::V6(std::net::Ipv6Addr::from(*record.aaaa_data())), 53),
        other => panic!("record_address called on unsupported type {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::dns::Class;

    #[test]
    fn root_zone_has_thirteen_servers() {
        assert_eq!(root_zone_nameservers().len(), 13);
    }

    #[test]
    fn extract_records_removes_matches_only() {
        let node = Name::from_string("example.com.").unwrap();
        let other = Name::from_string("other.com.").unwrap();
        let mut records = vec![
            Record::A { node: node.clone(), class: Class::IN, ttl: 1, data_len: 4, address: [1, 2, 3, 4] },
            Record::A { node: other, class: Class::IN, ttl: 1, data_len: 4, address: [5, 6, 7, 8] },
        ];
        let extracted = extract_records(&mut records, RecordType::A, &node);
        assert_eq!(extracted.len(), 1);
        assert_eq!(records.len(), 1);
    }
}
