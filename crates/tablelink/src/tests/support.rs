//! Fake server and recording screens for behavioural tests.
//!
//! The fake server accepts a single client, records every request line, and
//! answers requests with scripted replies. Tests can also push unsolicited
//! lines or drop the connection at any point.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tablelink_config::ServerEndpoint;

use crate::codec::Message;
use crate::handler::{ScreenHandler, TagPrefixes};

const WAIT_LIMIT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Default)]
struct ServerState {
    requests: Mutex<Vec<String>>,
    replies: Mutex<HashMap<String, Vec<String>>>,
    client: Mutex<Option<TcpStream>>,
}

/// Single-client line server bound to an ephemeral TCP port.
pub(in crate::tests) struct FakeServer {
    address: SocketAddr,
    state: Arc<ServerState>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeServer {
    /// Binds the listener and starts serving in the background.
    pub fn spawn() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake server")?;
        let address = listener.local_addr().context("local addr")?;
        let state = Arc::new(ServerState::default());
        let thread_state = Arc::clone(&state);
        let handle = thread::spawn(move || {
            if let Err(error) = serve(&listener, &thread_state) {
                eprintln!("fake server stopped: {error:#}");
            }
        });
        Ok(Self {
            address,
            state,
            handle: Some(handle),
        })
    }

    /// Endpoint clients should connect to.
    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint::tcp(self.address.ip().to_string(), self.address.port())
    }

    /// Answers every request equal to `request` with `lines`.
    pub fn reply_to(&self, request: &str, lines: &[&str]) {
        let mut replies = self.state.replies.lock().expect("replies lock");
        replies.insert(
            request.to_owned(),
            lines.iter().map(|line| (*line).to_owned()).collect(),
        );
    }

    /// Writes `line` to the connected client.
    pub fn push(&self, line: &str) -> Result<()> {
        let mut stream = self.connected_client()?;
        stream
            .write_all(format!("{line}\n").as_bytes())
            .context("push line")?;
        stream.flush().context("flush push")
    }

    /// Closes the connection from the server side.
    pub fn disconnect(&self) -> Result<()> {
        let stream = self.connected_client()?;
        stream.shutdown(Shutdown::Both).context("shutdown client")
    }

    /// Request lines received so far, terminators removed.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    /// Waits until at least `count` requests have arrived.
    pub fn wait_for_requests(&self, count: usize) -> Vec<String> {
        poll_until(|| {
            let requests = self.requests();
            (requests.len() >= count).then_some(requests)
        })
        .unwrap_or_else(|| self.requests())
    }

    fn connected_client(&self) -> Result<TcpStream> {
        poll_until(|| {
            self.state
                .client
                .lock()
                .expect("client lock")
                .as_ref()
                .and_then(|stream| stream.try_clone().ok())
        })
        .ok_or_else(|| anyhow!("no client connected to the fake server"))
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        let client = self.state.client.lock().expect("client lock").take();
        match client {
            Some(stream) => {
                let _ = stream.shutdown(Shutdown::Both);
            }
            // Unblock `accept` when no client ever arrived.
            None => {
                if let Ok(stream) = TcpStream::connect(self.address) {
                    let _ = stream.shutdown(Shutdown::Both);
                }
            }
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(listener: &TcpListener, state: &ServerState) -> Result<()> {
    let (stream, _) = listener.accept().context("accept client")?;
    let mut writer = stream.try_clone().context("clone writer")?;
    *state.client.lock().expect("client lock") =
        Some(stream.try_clone().context("clone control")?);

    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        state
            .requests
            .lock()
            .expect("requests lock")
            .push(line.clone());
        let replies = state
            .replies
            .lock()
            .expect("replies lock")
            .get(&line)
            .cloned()
            .unwrap_or_default();
        for reply in replies {
            if writer.write_all(format!("{reply}\n").as_bytes()).is_err() {
                return Ok(());
            }
        }
        let _ = writer.flush();
    }
    Ok(())
}

/// Polls `check` until it yields a value or the wait limit elapses.
pub(in crate::tests) fn poll_until<T>(mut check: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + WAIT_LIMIT;
    loop {
        if let Some(value) = check() {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Screen handler that records the wire form of each delivered message.
pub(in crate::tests) struct RecordingScreen {
    prefixes: TagPrefixes,
    received: Mutex<Vec<String>>,
    threads: Mutex<Vec<thread::ThreadId>>,
}

impl RecordingScreen {
    pub fn new(prefixes: TagPrefixes) -> Arc<Self> {
        Arc::new(Self {
            prefixes,
            received: Mutex::new(Vec::new()),
            threads: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().expect("received lock").clone()
    }

    pub fn threads(&self) -> Vec<thread::ThreadId> {
        self.threads.lock().expect("threads lock").clone()
    }
}

impl ScreenHandler for RecordingScreen {
    fn matches(&self, tag: &str) -> bool {
        self.prefixes.matches(tag)
    }

    fn handle(&self, message: Message) {
        self.threads
            .lock()
            .expect("threads lock")
            .push(thread::current().id());
        self.received
            .lock()
            .expect("received lock")
            .push(message.to_line());
    }
}
