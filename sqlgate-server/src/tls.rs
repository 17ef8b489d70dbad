//! Server-side TLS setup from PEM files.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

/// Build a TLS acceptor from a certificate chain and private key.
/// Any failure here is a startup-time fatality.
pub(crate) fn acceptor(cert_path: &Path, key_path: &Path) -> io::Result<TlsAcceptor> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|err| io::Error::other(format!("bad certificate/key pair: {err}")))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> io::Result<Vec<CertificateDer<'static>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs: Vec<_> = rustls_pemfile::certs(&mut reader).collect::<Result<_, _>>()?;
    if certs.is_empty() {
        return Err(io::Error::other(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> io::Result<PrivateKeyDer<'static>> {
    let mut reader = BufReader::new(File::open(path)?);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| io::Error::other(format!("no private key found in {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("sqlgate-tls-{}-{name}", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn valid_pair_builds_an_acceptor() {
        acceptor(&fixture("server.crt"), &fixture("server.key")).unwrap();
    }

    #[test]
    fn missing_files_are_an_error() {
        let err = acceptor(Path::new("/nonexistent.crt"), Path::new("/nonexistent.key"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn garbage_pem_is_rejected() {
        let path = scratch_file("garbage.crt", b"this is not a certificate\n");
        let err = acceptor(&path, &fixture("server.key")).err().unwrap();
        assert!(err.to_string().contains("no certificates found"));
    }

    #[test]
    fn empty_pem_is_rejected() {
        let path = scratch_file("empty.crt", b"");
        let err = acceptor(&path, &fixture("server.key")).err().unwrap();
        assert!(err.to_string().contains("no certificates found"));
    }

    #[test]
    fn certificate_in_place_of_key_is_rejected() {
        let err = acceptor(&fixture("server.crt"), &fixture("server.crt")).err().unwrap();
        assert!(err.to_string().contains("no private key found"));
    }

    #[test]
    fn mismatched_key_is_rejected() {
        let err = acceptor(&fixture("server.crt"), &fixture("other.key")).err().unwrap();
        assert!(err.to_string().contains("bad certificate/key pair"));
    }
}
