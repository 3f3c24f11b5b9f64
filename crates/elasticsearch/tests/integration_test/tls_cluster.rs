//! A TLS endpoint with a self-signed certificate that answers the ping.
//!
//! Served with blocking rustls on its own thread; every connection gets one
//! canned `200` and is closed.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;

const INFO: &str = r#"{"name":"fake-tls-node","tagline":"You Know, for Search"}"#;

/// Start the endpoint and return its `https://` base URL.
pub fn spawn_self_signed() -> String {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let params =
        rcgen::CertificateParams::new(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    let cert = params.self_signed(&key_pair).unwrap();

    let server_cert = rustls::pki_types::CertificateDer::from(cert.der().to_vec());
    let server_key = rustls::pki_types::PrivateKeyDer::try_from(key_pair.serialize_der()).unwrap();
    let config = Arc::new(
        rustls::ServerConfig::builder_with_provider(
            rustls::crypto::ring::default_provider().into(),
        )
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![server_cert], server_key)
        .unwrap(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for tcp in listener.incoming() {
            let Ok(tcp) = tcp else { continue };
            let Ok(conn) = rustls::ServerConnection::new(config.clone()) else {
                continue;
            };
            // A client that rejects the certificate fails the handshake here.
            let mut stream = rustls::StreamOwned::new(conn, tcp);
            if read_head(&mut stream).is_none() {
                continue;
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{INFO}",
                INFO.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
            stream.conn.send_close_notify();
            let _ = stream.flush();
        }
    });

    format!("https://{addr}")
}

/// Read up to the end of the request head. Bodies are not expected.
fn read_head(stream: &mut impl Read) -> Option<Vec<u8>> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    Some(head)
}
