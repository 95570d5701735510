//! In-process news server for integration tests
//!
//! Accepts AUTHINFO USER/PASS, POST, ARTICLE and QUIT. Posted articles are
//! kept in memory keyed by their Message-ID header and served back
//! dot-stuffed, so an upload followed by a download round-trips through a
//! real TCP socket.

#![allow(dead_code)]

use nntp_sla::{NntpSession, ServerConfig};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};
use tokio::net::{TcpListener, TcpStream};

pub const USER: &str = "probe";
pub const PASS: &str = "secret";

/// Articles posted so far, by message-id
#[derive(Clone, Default)]
pub struct Store(Arc<Mutex<HashMap<String, Vec<u8>>>>);

impl Store {
    pub fn get(&self, message_id: &str) -> Option<Vec<u8>> {
        self.0.lock().unwrap().get(message_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn remove(&self, message_id: &str) {
        self.0.lock().unwrap().remove(message_id);
    }

    fn insert(&self, message_id: String, article: Vec<u8>) {
        self.0.lock().unwrap().insert(message_id, article);
    }
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub store: Store,
}

/// Route library logs to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl MockServer {
    pub async fn start() -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Store::default();

        let shared = store.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, shared.clone()));
            }
        });

        Self { addr, store }
    }

    pub fn config(&self) -> ServerConfig {
        ServerConfig::new("127.0.0.1", self.addr.port(), false, USER, PASS).with_name("mock")
    }

    pub fn session(&self) -> NntpSession {
        NntpSession::new(Arc::new(self.config()))
    }

    pub fn session_with_password(&self, password: &str) -> NntpSession {
        let config = ServerConfig::new("127.0.0.1", self.addr.port(), false, USER, password);
        NntpSession::new(Arc::new(config))
    }
}

async fn serve(stream: TcpStream, store: Store) {
    let (read, mut write) = stream.into_split();
    let mut read = BufReader::new(read);
    if write.write_all(b"200 mock news server ready\r\n").await.is_err() {
        return;
    }

    let mut raw = Vec::new();
    loop {
        raw.clear();
        match read.read_until(b'\n', &mut raw).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let line = String::from_utf8_lossy(&raw);
        let command = line.trim_end();

        let reply: Vec<u8> = if command.starts_with("authinfo user ") {
            b"381 password required\r\n".to_vec()
        } else if let Some(pass) = command.strip_prefix("authinfo pass ") {
            if pass == PASS {
                b"281 authentication accepted\r\n".to_vec()
            } else {
                b"481 authentication rejected\r\n".to_vec()
            }
        } else if command == "POST" {
            if write.write_all(b"340 send article\r\n").await.is_err() {
                return;
            }
            let Some(article) = receive_article(&mut read).await else {
                return;
            };
            match message_id(&article) {
                Some(id) => {
                    store.insert(id, article);
                    b"240 article posted\r\n".to_vec()
                }
                None => b"441 missing Message-ID\r\n".to_vec(),
            }
        } else if let Some(id) = command
            .strip_prefix("article <")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            match store.get(id) {
                Some(article) => {
                    let mut out = format!("201 0 <{id}> article\r\n").into_bytes();
                    out.extend_from_slice(&dot_stuff(&article));
                    out.extend_from_slice(b".\r\n");
                    out
                }
                None => b"430 no such article\r\n".to_vec(),
            }
        } else if command == "QUIT" {
            let _ = write.write_all(b"205 bye\r\n").await;
            return;
        } else {
            b"500 unknown command\r\n".to_vec()
        };

        if write.write_all(&reply).await.is_err() {
            return;
        }
    }
}

/// Read a posted article up to its terminating dot line
async fn receive_article<R>(read: &mut R) -> Option<Vec<u8>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut article = Vec::new();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if read.read_until(b'\n', &mut raw).await.ok()? == 0 {
            return None;
        }
        if raw == b".\r\n" {
            return Some(article);
        }
        let line = if raw.starts_with(b"..") { &raw[1..] } else { &raw[..] };
        article.extend_from_slice(line);
    }
}

fn message_id(article: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(article);
    let headers = text.split("\r\n\r\n").next()?;
    headers.lines().find_map(|line| {
        line.strip_prefix("Message-ID: <")
            .and_then(|rest| rest.strip_suffix('>'))
            .map(str::to_string)
    })
}

fn dot_stuff(article: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(article.len() + 16);
    for line in article.split_inclusive(|&b| b == b'\n') {
        if line.starts_with(b".") {
            out.push(b'.');
        }
        out.extend_from_slice(line);
    }
    out
}

/// Connected session over an in-memory pipe, with `replies` already queued
/// after the welcome line
pub async fn scripted(replies: &[u8]) -> (NntpSession, DuplexStream) {
    let (client, mut server) = duplex(1 << 20);
    server.write_all(b"200 scripted server\r\n").await.unwrap();
    server.write_all(replies).await.unwrap();

    let config = ServerConfig::plain("scripted", USER, PASS);
    let mut session = NntpSession::new(Arc::new(config));
    session.init_with(client).await.unwrap();
    (session, server)
}

/// Payload with every byte value, including the ones yEnc must escape
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}
