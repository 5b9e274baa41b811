//! Shared test fixtures: unique temp directories and a minimal single-thread
//! HTTP stub for exercising streamed downloads against localhost.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use uuid::Uuid;

pub fn temp_root() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ptd-launcher-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp test directory");
    dir
}

pub struct HttpStub {
    pub body: Vec<u8>,
    pub status: u16,
    /// Bytes written per flush.
    pub chunk_size: usize,
    /// Pause between chunks, to let tests overlap a second request.
    pub chunk_delay: Duration,
    /// Requests to answer before the listener shuts down.
    pub hits: usize,
}

impl Default for HttpStub {
    fn default() -> Self {
        Self {
            body: Vec::new(),
            status: 200,
            chunk_size: 8 * 1024,
            chunk_delay: Duration::ZERO,
            hits: 1,
        }
    }
}

impl HttpStub {
    pub fn with_body(body: Vec<u8>) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    /// Bind to an ephemeral localhost port, serve `hits` requests on a
    /// background thread, and return the base URL.
    pub fn spawn(self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind http stub");
        let addr = listener.local_addr().expect("stub local addr");

        thread::spawn(move || {
            for _ in 0..self.hits {
                let Ok((mut stream, _)) = listener.accept() else {
                    break;
                };
                // Drain the request head; the stub answers every path alike.
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);

                if self.status != 200 {
                    let _ = write!(
                        stream,
                        "HTTP/1.1 {} Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        self.status
                    );
                    continue;
                }

                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    self.body.len()
                );
                if stream.write_all(header.as_bytes()).is_err() {
                    continue;
                }
                for chunk in self.body.chunks(self.chunk_size.max(1)) {
                    if stream.write_all(chunk).is_err() {
                        break;
                    }
                    let _ = stream.flush();
                    if !self.chunk_delay.is_zero() {
                        thread::sleep(self.chunk_delay);
                    }
                }
            }
        });

        format!("http://{}", addr)
    }
}
