//! Port specification expansion.
//!
//! Each line of a port specification is either a single port ("443") or an
//! inclusive range ("8000-8010"). Ranges are flattened so that every port is
//! listed explicitly.

use std::fmt;
use std::str::FromStr;

/// Ordered list of ports to probe.
pub type PortList = Vec<u16>;

/// Error type for port specification parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("invalid port number: {0:?}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("unrecognized port format {0:?}")]
    TooManySeparators(String),
    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<PortError>,
    },
}

/// An inclusive range of ports. A single port is a range of length one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    /// Create a new port range. Reversed bounds are rejected rather than
    /// swapped.
    pub fn new(start: u16, end: u16) -> Result<Self, PortError> {
        if start > end {
            Err(PortError::InvalidRange(start, end))
        } else {
            Ok(Self { start, end })
        }
    }

    /// Create a range containing a single port.
    pub const fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// Get the number of ports in this range.
    pub const fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// A valid range always holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over all ports in this range, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

fn parse_port(text: &str) -> Result<u16, PortError> {
    text.trim()
        .parse()
        .map_err(|_| PortError::InvalidFormat(text.to_string()))
}

impl FromStr for PortRange {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('-') {
            None => Ok(Self::single(parse_port(s)?)),
            Some((_, end)) if end.contains('-') => {
                Err(PortError::TooManySeparators(s.to_string()))
            }
            Some((start, end)) => Self::new(parse_port(start)?, parse_port(end)?),
        }
    }
}

/// Expand port specification lines into a flat port list.
///
/// Lines are trimmed; blank lines and `#` comments are skipped. Ports keep
/// the order they appear in; no sorting or deduplication happens here.
pub fn expand_ports<'a, I>(lines: I) -> Result<PortList, PortError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ports = PortList::new();
    for (idx, raw) in lines.into_iter().enumerate() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let range: PortRange = text.parse().map_err(|e| PortError::Line {
            line: idx + 1,
            source: Box::new(e),
        })?;
        ports.extend(range.iter());
    }
    Ok(ports)
}
