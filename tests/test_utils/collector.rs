//! Loopback TCP collector standing in for the ingestion endpoint.
//!
//! Every accepted connection is read line by line on its own thread and each
//! line is forwarded, in arrival order, over an `mpsc` channel.

use std::{
    io::{BufRead, BufReader},
    net::{SocketAddr, TcpListener},
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

pub struct Collector {
    pub addr: SocketAddr,
    lines: mpsc::Receiver<String>,
}

impl Collector {
    /// Bind an ephemeral port and start accepting.
    pub fn start() -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
        Self::serve(listener)
    }

    /// Accept connections on an existing listener.
    pub fn serve(listener: TcpListener) -> Self {
        let addr = listener.local_addr().expect("listener has address");
        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    break;
                };
                let tx = tx.clone();
                thread::spawn(move || {
                    for line in BufReader::new(stream).lines() {
                        let Ok(line) = line else {
                            break;
                        };
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        Self { addr, lines }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Wait for the next line.
    pub fn recv(&self) -> String {
        self.lines
            .recv_timeout(Duration::from_secs(5))
            .expect("line received by collector")
    }

    /// Wait for exactly `count` lines.
    pub fn recv_n(&self, count: usize) -> Vec<String> {
        (0..count).map(|_| self.recv()).collect()
    }

    /// Assert nothing further arrives within `window`.
    pub fn assert_quiet(&self, window: Duration) {
        if let Ok(line) = self.lines.recv_timeout(window) {
            panic!("unexpected line received: {line:?}");
        }
    }

    /// Drain lines for `window`, failing if `forbidden` is among them.
    pub fn assert_never_receives(&self, forbidden: &str, window: Duration) {
        let deadline = Instant::now() + window;
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            match self.lines.recv_timeout(left) {
                Ok(line) => assert_ne!(line, forbidden, "line delivered after close"),
                Err(_) => return,
            }
        }
    }
}
