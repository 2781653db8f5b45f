//! Host specification expansion.
//!
//! Each line of a host specification is one of:
//! - a hostname or bare IP address, copied through unchanged
//! - an IPv4 CIDR block (192.168.1.0/24), flattened to its usable addresses

use ipnetwork::{IpNetwork, Ipv4Network};
use std::net::Ipv4Addr;

/// Ordered list of hosts to probe. No uniqueness is enforced.
pub type HostList = Vec<String>;

/// Error type for host specification parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("line {line}: unrecognized host format {text:?}")]
    InvalidFormat { line: usize, text: String },
    #[error("line {line}: invalid CIDR notation {text:?}: {reason}")]
    InvalidCidr {
        line: usize,
        text: String,
        reason: String,
    },
    #[error("line {line}: only IPv4 CIDR blocks can be expanded, got {text:?}")]
    UnsupportedCidr { line: usize, text: String },
}

/// A single parsed line of a host specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A hostname or IP address, kept as written.
    Host(String),
    /// An IPv4 network range.
    Cidr(Ipv4Network),
}

impl TargetSpec {
    /// Parse one host specification line. `line` is 1-based and only used
    /// for error reporting.
    pub fn parse(text: &str, line: usize) -> Result<Self, TargetError> {
        match text.matches('/').count() {
            0 => Ok(Self::Host(text.to_string())),
            1 => {
                let network: IpNetwork =
                    text.parse().map_err(|e: ipnetwork::IpNetworkError| {
                        TargetError::InvalidCidr {
                            line,
                            text: text.to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                match network {
                    IpNetwork::V4(net) => Ok(Self::Cidr(net)),
                    IpNetwork::V6(_) => Err(TargetError::UnsupportedCidr {
                        line,
                        text: text.to_string(),
                    }),
                }
            }
            _ => Err(TargetError::InvalidFormat {
                line,
                text: text.to_string(),
            }),
        }
    }

    /// Number of hosts this specification expands to.
    pub fn host_count(&self) -> u64 {
        match self {
            Self::Host(_) => 1,
            Self::Cidr(net) => {
                let (first, last) = usable_bounds(net);
                (last + 1).saturating_sub(first)
            }
        }
    }

    /// Append the expanded hosts to `hosts`.
    pub fn expand_into(&self, hosts: &mut HostList) {
        match self {
            Self::Host(host) => hosts.push(host.clone()),
            Self::Cidr(net) => {
                let (first, last) = usable_bounds(net);
                hosts.extend(
                    (first..=last)
                        .map(|ip| Ipv4Addr::from(ip as u32).to_string()),
                );
            }
        }
    }
}

/// First and last usable address of a block as `u64`, so that blocks with
/// no usable addresses give `first > last` instead of wrapping.
fn usable_bounds(net: &Ipv4Network) -> (u64, u64) {
    let network = u64::from(u32::from(net.network()));
    let broadcast = u64::from(u32::from(net.broadcast()));
    (network + 1, broadcast.saturating_sub(1))
}

/// Expand host specification lines into a flat host list.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. CIDR blocks
/// never include their network or broadcast address, so a block with `N`
/// host bits contributes `max(2^N - 2, 0)` addresses in ascending order.
pub fn expand_hosts<'a, I>(lines: I) -> Result<HostList, TargetError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hosts = HostList::new();
    for (idx, raw) in lines.into_iter().enumerate() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        TargetSpec::parse(text, idx + 1)?.expand_into(&mut hosts);
    }
    Ok(hosts)
}
