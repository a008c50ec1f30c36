// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-publisher.
//
// gelf-publisher is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-publisher is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-publisher.  If
// not, see <http://www.gnu.org/licenses/>.

//! Describing where messages go as a single string.
//!
//! An [`Endpoint`] is parsed from one of:
//!
//! - `udp://host:port`, or just `host:port`
//! - `tcp://host:port`
//! - `tls://host:port` (TCP with TLS)
//! - `http://[user:password@]host[:port][/path]` or `https://...`
//!
//! A missing host means [`DEFAULT_HOST`] & a missing port the protocol's customary one.
//! [`from_env`] reads an endpoint from the environment, `GELF_ADDRESS` by default.
//!
//! # Examples
//!
//! ```rust
//! use gelf_publisher::config::Endpoint;
//! let endpoint: Endpoint = "tcp://graylog.example.com".parse().unwrap();
//! assert_eq!(endpoint.to_string(), "tcp://graylog.example.com:12201");
//! ```

use crate::{
    error::{Error, Result},
    transport::{
        http::HttpTransport, tcp::TcpTransport, tls::SslOptions, udp::UdpTransport, Transport,
        DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SSL_PORT,
    },
};

use std::{env, str::FromStr};

/// Environment variable consulted by [`from_env`] when none is named
pub const ADDRESS_VAR: &str = "GELF_ADDRESS";

/// A collector & the means of reaching it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Udp { host: String, port: u16 },
    Tcp { host: String, port: u16, tls: bool },
    /// Kept as the original text & handed to [`HttpTransport::from_url`]
    Http { url: String },
}

impl Endpoint {
    /// Instantiate the [`Transport`] this endpoint describes, with its default encoder
    pub fn build(&self) -> Result<Box<dyn Transport + Send + Sync>> {
        let transport: Box<dyn Transport + Send + Sync> = match self {
            Endpoint::Udp { host, port } => Box::new(UdpTransport::new((host.as_str(), *port))?),
            Endpoint::Tcp { host, port, tls } => {
                let transpo = TcpTransport::new(host.as_str(), *port)?;
                Box::new(match (*tls, transpo.is_tls()) {
                    (true, false) => transpo.with_ssl(&SslOptions::default())?,
                    (false, true) => transpo.without_ssl(),
                    _ => transpo,
                })
            }
            Endpoint::Http { url } => Box::new(HttpTransport::from_url(url)?),
        };
        Ok(transport)
    }
}

/// Split `host:port`, either part of which may be missing; IPv6 hosts are bracketed
fn host_port(s: &str, default_port: u16) -> Result<(String, u16)> {
    let (host, port) = match s.rfind(':') {
        Some(i) if !s[i..].contains(']') => (&s[..i], Some(&s[i + 1..])),
        _ => (s, None),
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = if host.is_empty() { DEFAULT_HOST } else { host };
    let port = match port {
        Some(port) if !port.is_empty() => port
            .parse()
            .map_err(|_| Error::configuration(format!("bad port in {:?}", s)))?,
        _ => default_port,
    };
    Ok((host.to_string(), port))
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once("://") {
            Some(("udp", rest)) => {
                let (host, port) = host_port(rest, DEFAULT_PORT)?;
                Ok(Endpoint::Udp { host, port })
            }
            Some(("tcp", rest)) => {
                let (host, port) = host_port(rest, DEFAULT_PORT)?;
                Ok(Endpoint::Tcp {
                    host,
                    port,
                    tls: false,
                })
            }
            Some(("tls", rest)) => {
                let (host, port) = host_port(rest, DEFAULT_SSL_PORT)?;
                Ok(Endpoint::Tcp {
                    host,
                    port,
                    tls: true,
                })
            }
            Some(("http", _)) | Some(("https", _)) => Ok(Endpoint::Http { url: s.to_string() }),
            Some((scheme, _)) => Err(Error::configuration(format!(
                "unknown scheme {:?} in endpoint {:?}",
                scheme, s
            ))),
            None => {
                let (host, port) = host_port(s, DEFAULT_PORT)?;
                Ok(Endpoint::Udp { host, port })
            }
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        fn host(host: &str) -> String {
            if host.contains(':') {
                format!("[{}]", host)
            } else {
                host.to_string()
            }
        }
        match self {
            Endpoint::Udp { host: h, port } => write!(f, "udp://{}:{}", host(h), port),
            Endpoint::Tcp {
                host: h,
                port,
                tls,
            } => write!(
                f,
                "{}://{}:{}",
                if *tls { "tls" } else { "tcp" },
                host(h),
                port
            ),
            Endpoint::Http { url } => write!(f, "{}", url),
        }
    }
}

/// Read an [`Endpoint`] from the environment variable `name` ([`ADDRESS_VAR`] if `None`).
/// An unset or empty variable yields `Ok(None)`.
pub fn from_env(name: Option<&str>) -> Result<Option<Endpoint>> {
    let name = name.unwrap_or(ADDRESS_VAR);
    match env::var(name) {
        // The environment variable exists, but is empty
        Ok(ref v) if v.trim().is_empty() => Ok(None),
        // The environment variable does not exist
        Err(env::VarError::NotPresent) => Ok(None),
        // The environment variable isn't unicode
        Err(err) => Err(Error::configuration(format!("{}: {}", name, err))),
        Ok(v) => Ok(Some(v.parse()?)),
    }
}
