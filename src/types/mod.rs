//! Core type definitions shared by the expander, scheduler, and store.

mod mode;
mod outcome;
mod port;
mod target;

pub use mode::ScanMode;
pub use outcome::ScanOutcome;
pub use port::{expand_ports, PortError, PortList, PortRange};
pub use target::{expand_hosts, HostList, TargetError, TargetSpec};
