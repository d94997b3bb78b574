//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of paths (playlists and segments). Each path can be set
//! to fail with 500 a number of times before it succeeds; every request is
//! counted so tests can assert how much traffic a run produced.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct Resource {
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Respond 500 this many times before serving the body.
    pub failures: usize,
}

impl Resource {
    pub fn playlist(text: &str) -> Self {
        Self {
            content_type: "application/vnd.apple.mpegurl",
            body: text.as_bytes().to_vec(),
            failures: 0,
        }
    }

    pub fn segment(body: &[u8]) -> Self {
        Self {
            content_type: "video/mp2t",
            body: body.to_vec(),
            failures: 0,
        }
    }

    pub fn failing(mut self, times: usize) -> Self {
        self.failures = times;
        self
    }
}

pub struct MediaServer {
    pub base: String,
    requests: Arc<AtomicUsize>,
    per_path: Arc<Mutex<HashMap<String, usize>>>,
}

impl MediaServer {
    /// Full URL for `path` (no leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn requests_for(&self, path: &str) -> usize {
        let key = format!("/{}", path);
        self.per_path.lock().unwrap().get(&key).copied().unwrap_or(0)
    }
}

/// Start serving `resources` (keys are paths without the leading slash) on a
/// background thread. The server runs until the process exits.
pub fn start(resources: Vec<(&str, Resource)>) -> MediaServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let table: HashMap<String, Resource> = resources
        .into_iter()
        .map(|(p, r)| (format!("/{}", p), r))
        .collect();
    let table = Arc::new(Mutex::new(table));
    let requests = Arc::new(AtomicUsize::new(0));
    let per_path = Arc::new(Mutex::new(HashMap::new()));

    {
        let requests = Arc::clone(&requests);
        let per_path = Arc::clone(&per_path);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let table = Arc::clone(&table);
                let requests = Arc::clone(&requests);
                let per_path = Arc::clone(&per_path);
                thread::spawn(move || handle(stream, &table, &requests, &per_path));
            }
        });
    }

    MediaServer {
        base: format!("http://127.0.0.1:{}/", port),
        requests,
        per_path,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    table: &Mutex<HashMap<String, Resource>>,
    requests: &AtomicUsize,
    per_path: &Mutex<HashMap<String, usize>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("/").split('?').next().unwrap_or("/").to_string();

    requests.fetch_add(1, Ordering::SeqCst);
    *per_path.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

    let found = {
        let mut t = table.lock().unwrap();
        match t.get_mut(&path) {
            Some(r) if r.failures > 0 => {
                r.failures -= 1;
                Err(500)
            }
            Some(r) => Ok(r.clone()),
            None => Err(404),
        }
    };

    let resource = match found {
        Ok(r) => r,
        Err(code) => {
            let reason = if code == 500 { "Internal Server Error" } else { "Not Found" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                code, reason
            );
            let _ = stream.write_all(response.as_bytes());
            return;
        }
    };

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        resource.content_type,
        resource.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    if !method.eq_ignore_ascii_case("HEAD") {
        let _ = stream.write_all(&resource.body);
    }
}
