use crate::resolver::back_end::trace::TraceParams;
use serde::{Deserialize, Serialize};

/// Resolver-wide tunables, following the teacher's `Conf`-struct-plus-
/// `validate` style (`serde`-deserializable, validated once on construction)
/// but extended with the resolution engine's own parameters: the explore
/// probability, the RTT/timeout bounds, the per-resolution query ceiling and
/// the EDNS buffer size advertised by the wire executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConf {
    pub max_queries: u64,
    pub edns_buffer_size: u16,
    #[serde(skip, default)]
    pub trace: TraceParams,
    pub dot_trace: bool,
}

impl Default for ResolverConf {
    fn default() -> Self {
        ResolverConf {
            max_queries: 100,
            edns_buffer_size: crate::shared::dns::EDNS_BUFFER_SIZE,
            trace: TraceParams::default(),
            dot_trace: false,
        }
    }
}

impl ResolverConf {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_queries == 0 {
            return Err("invalid 'max_queries' resolver param: cannot be 0".to_string());
        }
        if self.edns_buffer_size == 0 {
            return Err("invalid 'edns_buffer_size' resolver param: cannot be 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_conf_is_valid() {
        assert!(ResolverConf::default().validate().is_ok());
    }

    #[test]
    fn zero_max_queries_is_rejected() {
        let mut conf = ResolverConf::default();
        conf.max_queries = 0;
        assert!(conf.validate().is_err());
    }
}
