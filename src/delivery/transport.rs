//! Transport primitives for the delivery worker.

use std::{
    fmt,
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

use crate::error::ConnectionError;

/// Writable stream produced by a [`Transport`].
pub trait OutboundStream: Write + Send {
    /// Release the stream. Errors are ignored.
    fn close(&mut self) {}
}

/// Opens outbound streams to the ingestion endpoint.
///
/// The delivery worker owns its transport and is the only caller of
/// [`Transport::open`].
pub trait Transport: fmt::Display + Send + 'static {
    type Stream: OutboundStream;

    /// Establish a fresh stream ready for low-latency writes.
    fn open(&self) -> Result<Self::Stream, ConnectionError>;
}

/// TCP transport configuration.
#[derive(Clone, Debug)]
pub struct TcpTransport {
    /// Hostname or IP address to connect to.
    pub host: String,
    /// TCP port number.
    pub port: u16,
    /// Optional TLS configuration.
    pub tls: Option<TlsOptions>,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
}

impl TcpTransport {
    /// Plain TCP transport to `host:port` using the default timeouts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            tls: None,
            connect_timeout: super::config::DEFAULT_CONNECT_TIMEOUT,
            write_timeout: super::config::DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_tls(mut self, tls: TlsOptions) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    fn socket_addrs(&self) -> Result<Vec<SocketAddr>, ConnectionError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|iter| iter.collect())
            .map_err(|source| ConnectionError::Resolve {
                host: self.host.clone(),
                port: self.port,
                source,
            })
    }

    fn connect_tcp(&self) -> Result<TcpStream, ConnectionError> {
        let mut last_err = None;
        for addr in self.socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }
        Err(ConnectionError::Connect {
            host: self.host.clone(),
            port: self.port,
            source: last_err.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "no addresses resolved")
            }),
        })
    }
}

impl fmt::Display for TcpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls.is_some() { "tls" } else { "tcp" };
        write!(f, "{scheme}://{}:{}", self.host, self.port)
    }
}

impl Transport for TcpTransport {
    type Stream = ActiveConnection;

    fn open(&self) -> Result<ActiveConnection, ConnectionError> {
        let stream = self.connect_tcp()?;
        stream.set_nodelay(true).map_err(ConnectionError::Socket)?;
        stream
            .set_write_timeout(Some(self.write_timeout))
            .map_err(ConnectionError::Socket)?;
        let Some(tls) = &self.tls else {
            return Ok(ActiveConnection::PlainTcp(stream));
        };
        stream
            .set_read_timeout(Some(self.connect_timeout))
            .map_err(ConnectionError::Socket)?;
        let handshake = tls.connector().and_then(|connector| {
            connector
                .connect(&tls.domain, stream)
                .map_err(io::Error::other)
        });
        let stream = handshake.map_err(|source| ConnectionError::Tls {
            domain: tls.domain.clone(),
            source,
        })?;
        stream
            .get_ref()
            .set_read_timeout(None)
            .map_err(ConnectionError::Socket)?;
        Ok(ActiveConnection::Tls(Box::new(stream)))
    }
}

/// TLS connection options.
#[derive(Clone, Debug)]
pub struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    fn connector(&self) -> io::Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }
}

/// Active socket connection state.
pub enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Write for ActiveConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.write(buf),
            ActiveConnection::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.flush(),
            ActiveConnection::Tls(stream) => stream.flush(),
        }
    }
}

impl OutboundStream for ActiveConnection {
    fn close(&mut self) {
        match self {
            ActiveConnection::PlainTcp(stream) => {
                let _ = stream.shutdown(Shutdown::Both);
            }
            ActiveConnection::Tls(stream) => {
                let _ = stream.shutdown();
                let _ = stream.get_ref().shutdown(Shutdown::Both);
            }
        }
    }
}
