pub mod address;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod nameserver_cache;
pub mod selection;
pub mod server_state;
pub mod trace;
pub mod utils;

pub use address::*;
pub use engine::*;
pub use errors::*;
pub use executor::{ExecErr, QueryExecutor, Reply, UdpTcpExecutor};
pub use nameserver_cache::*;
pub use selection::*;
pub use server_state::*;
pub use trace::*;
