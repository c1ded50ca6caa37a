// tests/common/mod.rs
//
// A tiny blocking HTTP server for exercising the real client stack.
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

pub struct Reply {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl Reply {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), content_type: "application/json" }
    }

    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), content_type: "text/html; charset=utf-8" }
    }
}

pub struct StubServer {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// `handler(path_and_query, request_index)` answers each request.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, usize) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let Some(path) = read_request(&stream) else { continue };
                let n = {
                    let mut log = seen.lock().unwrap();
                    log.push(path.clone());
                    log.len() - 1
                };
                let reply = handler(&path, n);
                respond(stream, reply);
            }
        });

        Self { base, requests }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn read_request(stream: &TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let path = line.split_whitespace().nth(1)?.to_string();
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).ok()? == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }
    Some(path)
}

fn respond(mut stream: TcpStream, reply: Reply) {
    let head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.content_type,
        reply.body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(reply.body.as_bytes());
    let _ = stream.flush();
}
