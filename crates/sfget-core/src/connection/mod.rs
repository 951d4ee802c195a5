//! Connection utilities: host parsing and the SFTP connector.
//!
//! Hosts are accepted in the usual SSH spellings:
//! - `name` or `IP` (port taken from configuration, 22 by default)
//! - `name:PORT` or `IP:PORT`
//! - `[IPv6]` or `[IPv6]:PORT`

mod sftp;

use std::net::{IpAddr, SocketAddr};

use crate::error::{Error, Result};

pub use sftp::{SftpConnector, SftpRemote};

/// Split a host string into host and optional port.
///
/// # Examples
///
/// ```
/// use sfget_core::connection::parse_host;
///
/// let (host, port) = parse_host("example.com:2222").unwrap();
/// assert_eq!(host, "example.com");
/// assert_eq!(port, Some(2222));
///
/// let (host, port) = parse_host("[::1]").unwrap();
/// assert_eq!(host, "::1");
/// assert_eq!(port, None);
/// ```
///
/// # Errors
///
/// Returns an error if the host string cannot be parsed.
pub fn parse_host(host: &str) -> Result<(String, Option<u16>)> {
    let host = host.trim();

    if host.is_empty() {
        return Err(Error::InvalidInput("host must not be empty".to_string()));
    }

    if let Ok(addr) = host.parse::<SocketAddr>() {
        return Ok((addr.ip().to_string(), Some(addr.port())));
    }

    if host.starts_with('[') && host.ends_with(']') {
        let ip = parse_ip(&host[1..host.len() - 1], host)?;
        return Ok((ip.to_string(), None));
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok((ip.to_string(), None));
    }

    if let Some((name, port_part)) = host.rsplit_once(':') {
        if name.contains(':') {
            return Err(invalid_host(host));
        }
        let port = parse_port(port_part)?;
        return Ok((parse_name(name, host)?, Some(port)));
    }

    Ok((parse_name(host, host)?, None))
}

fn parse_ip(ip_str: &str, original: &str) -> Result<IpAddr> {
    ip_str.parse().map_err(|_| invalid_host(original))
}

fn parse_port(port_part: &str) -> Result<u16> {
    match port_part.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(Error::InvalidInput(format!(
            "Invalid port '{port_part}'. Port must be a number between 1 and 65535"
        ))),
    }
}

fn parse_name(name: &str, original: &str) -> Result<String> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');

    if valid {
        Ok(name.to_string())
    } else {
        Err(invalid_host(original))
    }
}

fn invalid_host(host: &str) -> Error {
    Error::InvalidInput(format!(
        "Invalid host format '{host}'. Use HOST or HOST:PORT (e.g., files.example.com or 192.168.1.10:2222)"
    ))
}
