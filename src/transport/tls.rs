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

//! TLS options for the stream transports.
//!
//! [`SslOptions`] is turned into a [rustls] [`ClientConfig`] when a TCP or HTTP transport is
//! told to use TLS; the actual handshake happens lazily, the first time the transport writes.

use crate::error::{Error, Result};

use rustls::{
    client::{
        danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
        WebPkiServerVerifier,
    },
    crypto::{ring, CryptoProvider},
    pki_types::{CertificateDer, ServerName, UnixTime},
    CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tracing::debug;

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

/// How a stream transport should negotiate TLS with the collector
#[derive(Clone, Debug)]
pub struct SslOptions {
    verify_peer: bool,
    allow_self_signed: bool,
    ca_file: Option<PathBuf>,
    ciphers: Vec<String>,
}

impl std::default::Default for SslOptions {
    fn default() -> Self {
        SslOptions {
            verify_peer: true,
            allow_self_signed: false,
            ca_file: None,
            ciphers: Vec::new(),
        }
    }
}

impl SslOptions {
    pub fn new() -> SslOptions {
        SslOptions::default()
    }
    /// Whether to validate the collector's certificate at all (default true)
    pub fn with_verify_peer(mut self, verify_peer: bool) -> Self {
        self.verify_peer = verify_peer;
        self
    }
    /// Accept a certificate whose issuer can't be found in the trust store (default false)
    pub fn with_allow_self_signed(mut self, allow_self_signed: bool) -> Self {
        self.allow_self_signed = allow_self_signed;
        self
    }
    /// Trust the PEM-encoded certificates in `ca_file` instead of the platform's roots
    pub fn with_ca_file(mut self, ca_file: impl AsRef<Path>) -> Self {
        self.ca_file = Some(ca_file.as_ref().to_path_buf());
        self
    }
    /// Restrict negotiation to the named cipher suites (e.g. "TLS13_AES_256_GCM_SHA384")
    pub fn with_ciphers<I, S>(mut self, ciphers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ciphers = ciphers.into_iter().map(Into::into).collect();
        self
    }
    pub fn verify_peer(&self) -> bool {
        self.verify_peer
    }
    pub fn allow_self_signed(&self) -> bool {
        self.allow_self_signed
    }
    pub fn ca_file(&self) -> Option<&Path> {
        self.ca_file.as_deref()
    }
    pub fn ciphers(&self) -> &[String] {
        &self.ciphers
    }

    /// Build the [rustls] client configuration these options describe
    pub fn client_config(&self) -> Result<Arc<ClientConfig>> {
        let provider = Arc::new(self.crypto_provider()?);

        let mut root_store = RootCertStore::empty();
        let (added, ignored) = root_store.add_parsable_certificates(self.root_certs()?);
        debug!("Loaded {} trust anchors ({} ignored)", added, ignored);

        let inner = if self.verify_peer {
            Some(
                WebPkiServerVerifier::builder_with_provider(Arc::new(root_store), provider.clone())
                    .build()
                    .map_err(|err| Error::configuration(format!("TLS trust store: {}", err)))?,
            )
        } else {
            None
        };

        let config = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|err| Error::configuration(format!("TLS protocol versions: {}", err)))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(PeerVerifier {
                inner,
                allow_self_signed: self.allow_self_signed,
                provider,
            }))
            .with_no_client_auth();

        Ok(Arc::new(config))
    }

    fn crypto_provider(&self) -> Result<CryptoProvider> {
        let mut provider = ring::default_provider();
        if self.ciphers.is_empty() {
            return Ok(provider);
        }
        if let Some(unknown) = self
            .ciphers
            .iter()
            .find(|name| !provider.cipher_suites.iter().any(|s| suite_name(s) == **name))
        {
            return Err(Error::configuration(format!(
                "unknown or unsupported cipher suite {}",
                unknown
            )));
        }
        provider
            .cipher_suites
            .retain(|suite| self.ciphers.iter().any(|name| suite_name(suite) == *name));
        Ok(provider)
    }

    fn root_certs(&self) -> Result<Vec<CertificateDer<'static>>> {
        match &self.ca_file {
            Some(path) => {
                let file = File::open(path).map_err(|err| {
                    Error::configuration(format!("can't open CA file {:?}: {}", path, err))
                })?;
                rustls_pemfile::certs(&mut BufReader::new(file))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|err| {
                        Error::configuration(format!("can't read CA file {:?}: {}", path, err))
                    })
            }
            None => {
                let result = rustls_native_certs::load_native_certs();
                if !result.errors.is_empty() {
                    debug!("Errors loading native certificates: {:?}", result.errors);
                }
                Ok(result.certs)
            }
        }
    }
}

fn suite_name(suite: &rustls::SupportedCipherSuite) -> String {
    format!("{:?}", suite.suite())
}

/// Certificate verification per [`SslOptions`]. Handshake signatures are always checked; only
/// chain validation is relaxed.
#[derive(Debug)]
struct PeerVerifier {
    // None if the peer isn't to be verified at all
    inner: Option<Arc<WebPkiServerVerifier>>,
    allow_self_signed: bool,
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for PeerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let inner = match &self.inner {
            Some(inner) => inner,
            None => return Ok(ServerCertVerified::assertion()),
        };
        match inner.verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer))
                if self.allow_self_signed =>
            {
                Ok(ServerCertVerified::assertion())
            }
            result => result,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = SslOptions::new();
        assert!(opts.verify_peer());
        assert!(!opts.allow_self_signed());
        assert!(opts.ca_file().is_none());
        assert!(opts.ciphers().is_empty());
    }

    #[test]
    fn cipher_selection() {
        let err = SslOptions::new()
            .with_verify_peer(false)
            .with_ciphers(["TLS_NULL_WITH_NULL_NULL_AND_SOME"])
            .client_config()
            .unwrap_err();
        assert!(err.is_configuration());

        let opts = SslOptions::new()
            .with_verify_peer(false)
            .with_ciphers(["TLS13_AES_256_GCM_SHA384"]);
        let provider = opts.crypto_provider().unwrap();
        assert_eq!(provider.cipher_suites.len(), 1);
        assert!(opts.client_config().is_ok());
    }

    #[test]
    fn missing_ca_file() {
        let err = SslOptions::new()
            .with_ca_file("/no/such/dir/ca.pem")
            .client_config()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn unverified() {
        // No trust anchors needed when the peer isn't verified
        let opts = SslOptions::new()
            .with_verify_peer(false)
            .with_ca_file("/dev/null");
        assert!(opts.client_config().is_ok());
    }
}
