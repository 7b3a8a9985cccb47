use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::str::FromStr as _;
use std::sync::{Arc, LazyLock};

use deadpool_postgres::tokio_postgres::Config;
use deadpool_postgres::tokio_postgres::config::SslMode;
use regex::Regex;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_native_certs::load_native_certs;
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{info, warn};

use crate::postgres::PostgresError::{
    BadConnectionString, CannotLoadRoots, CannotOpenCert, CannotParseCert, CannotUseClientKey,
    InvalidPrivateKey, UnknownSslMode,
};
use crate::postgres::{PgSslCerts, PostgresResult};

/// Matches `sslmode=verify-ca` / `sslmode=verify-full` in both URL and key/value connection strings.
static SSL_MODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<before>(^|\?|&| )sslmode=)(?P<mode>verify-(ca|full))(?P<after>$|&| )")
        .expect("valid sslmode regex")
});

/// `tokio-postgres` does not know `verify-ca` / `verify-full`, so they are tracked here
/// and replaced with `require` in the connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslModeOverride {
    /// The mode was understood by `tokio-postgres` as-is
    Unmodified(SslMode),
    /// `sslmode=verify-ca`
    VerifyCa,
    /// `sslmode=verify-full`
    VerifyFull,
}

/// Parse a connection string, replacing `verify-ca` / `verify-full` with `require`.
pub fn parse_conn_str(conn_str: &str) -> PostgresResult<(Config, SslModeOverride)> {
    let mut mode = SslModeOverride::Unmodified(SslMode::Disable);

    let pg_cfg = if let Some(captures) = SSL_MODE_RE.captures(conn_str) {
        mode = if &captures["mode"] == "verify-ca" {
            SslModeOverride::VerifyCa
        } else {
            SslModeOverride::VerifyFull
        };
        let conn_str = SSL_MODE_RE.replace(conn_str, "${before}require${after}");
        Config::from_str(conn_str.as_ref())
    } else {
        Config::from_str(conn_str)
    };
    let pg_cfg = pg_cfg.map_err(|e| BadConnectionString(e, conn_str.to_string()))?;
    if let SslModeOverride::Unmodified(_) = mode {
        mode = SslModeOverride::Unmodified(pg_cfg.get_ssl_mode());
    }
    Ok((pg_cfg, mode))
}

/// Accepts any server certificate while still checking handshake signatures.
#[derive(Debug)]
struct NoCertificateVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

fn cert_reader(file: &PathBuf) -> PostgresResult<BufReader<File>> {
    Ok(BufReader::new(
        File::open(file).map_err(|e| CannotOpenCert(e, file.clone()))?,
    ))
}

fn read_certs(file: &PathBuf) -> PostgresResult<Vec<CertificateDer<'static>>> {
    rustls_pemfile::certs(&mut cert_reader(file)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CannotParseCert(e, file.clone()))
}

/// Build a TLS connector honoring the libpq `sslmode` semantics.
pub fn make_connector(
    pg_certs: &PgSslCerts,
    ssl_mode: SslModeOverride,
) -> PostgresResult<MakeRustlsConnect> {
    let verify_ca = match ssl_mode {
        SslModeOverride::Unmodified(mode) => match mode {
            SslMode::Disable | SslMode::Prefer => false,
            // With a root CA file, sslmode=require behaves like verify-ca,
            // see https://postgresql.org/docs/current/libpq-ssl.html#LIBQ-SSL-CERTIFICATES
            SslMode::Require => pg_certs.ssl_root_cert.is_some(),
            _ => return Err(UnknownSslMode(mode)),
        },
        SslModeOverride::VerifyCa | SslModeOverride::VerifyFull => true,
    };

    let mut roots = RootCertStore::empty();

    if let Some(file) = &pg_certs.ssl_root_cert {
        for cert in read_certs(file)? {
            roots.add(cert)?;
        }
        info!("Using {} as a root certificate", file.display());
    }

    if verify_ca || pg_certs.ssl_root_cert.is_some() || pg_certs.ssl_cert.is_some() {
        let native = load_native_certs();
        if native.certs.is_empty() && !native.errors.is_empty() {
            return Err(CannotLoadRoots(native.errors));
        }
        let (added, ignored) = roots.add_parsable_certificates(native.certs);
        if ignored > 0 {
            warn!("Ignored {ignored} unparsable platform root certificates ({added} loaded)");
        }
    }

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots);

    let mut config = if let (Some(cert), Some(key)) = (&pg_certs.ssl_cert, &pg_certs.ssl_key) {
        let private_key = rustls_pemfile::private_key(&mut cert_reader(key)?)
            .map_err(|e| CannotParseCert(e, key.clone()))?
            .ok_or_else(|| InvalidPrivateKey(key.clone()))?;
        builder
            .with_client_auth_cert(read_certs(cert)?, private_key)
            .map_err(|e| CannotUseClientKey(e, cert.clone(), key.clone()))?
    } else {
        if pg_certs.ssl_cert.is_some() || pg_certs.ssl_key.is_some() {
            warn!(
                "SSL client certificate and key files must both be set to use a client certificate with Postgres. Only one of them was set."
            );
        }
        builder.with_no_client_auth()
    };

    if !verify_ca {
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(NoCertificateVerification(provider)));
    }

    Ok(MakeRustlsConnect::new(config))
}
