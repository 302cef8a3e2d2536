//! Parser for the host list file consumed by the driver context at startup.
//!
//! Format: one host per line, space-separated: `address threads memory listen-port`.

use crate::error::{Result, ShoalError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub address: String,
    pub threads: usize,
    pub memory: u64,
    pub listen_port: u16,
}

/// Parse the contents of a host file into an ordered list of hosts.
///
/// Blank lines are skipped. A malformed line is reported as a parse error;
/// the whole file is rejected rather than silently dropping a host, since a
/// short host list would silently change the cluster's resource capacity.
pub fn parse(contents: &str) -> Result<Vec<HostInfo>> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Result<HostInfo> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.as_slice() {
        [address, threads, memory, listen_port] => Ok(HostInfo {
            address: address.to_string(),
            threads: threads
                .parse()
                .map_err(|_| ShoalError::ParseError(format!("invalid thread count: {threads}")))?,
            memory: memory
                .parse()
                .map_err(|_| ShoalError::ParseError(format!("invalid memory value: {memory}")))?,
            listen_port: listen_port.parse().map_err(|_| {
                ShoalError::ParseError(format!("invalid listen port: {listen_port}"))
            })?,
        }),
        _ => Err(ShoalError::ParseError(format!(
            "expected 'address threads memory listen-port', got: {line}"
        ))),
    }
}

pub fn read_file(path: &str) -> Result<Vec<HostInfo>> {
    let contents = std::fs::read_to_string(path)?;
    parse(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_file() {
        let hosts = parse("h1 2 4096 7000\nh2 4 8192 7001\n").unwrap();
        assert_eq!(
            hosts,
            vec![
                HostInfo {
                    address: "h1".into(),
                    threads: 2,
                    memory: 4096,
                    listen_port: 7000
                },
                HostInfo {
                    address: "h2".into(),
                    threads: 4,
                    memory: 8192,
                    listen_port: 7001
                },
            ]
        );
    }

    #[test]
    fn skips_blank_lines() {
        let hosts = parse("h1 1 1 1\n\n\nh2 1 1 2\n").unwrap();
        assert_eq!(hosts.len(), 2);
    }

    #[test]
    fn rejects_malformed_line() {
        assert!(parse("h1 1 1").is_err());
        assert!(parse("h1 x 1 1").is_err());
    }
}
