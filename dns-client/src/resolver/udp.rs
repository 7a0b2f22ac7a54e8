use super::{NullResolver, Resolver};
use crate::{ResolveError, Result};
use dns_message::{Request, Response};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;
use tracing::{debug, instrument, trace, warn};

/// The largest payload a single datagram can carry.
const MAX_DATAGRAM: usize = 65535;

/// Sends the request in one datagram. A truncated response is handed to the
/// fallback resolver, and whatever that returns is the result.
pub struct UdpResolver {
    server: SocketAddr,
    timeout: Duration,
    fallback: Box<dyn Resolver>,
}

impl UdpResolver {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        Self {
            server,
            timeout,
            fallback: Box::new(NullResolver),
        }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn Resolver>) -> Self {
        self.fallback = fallback;
        self
    }

    fn bind(&self) -> io::Result<UdpSocket> {
        let local: SocketAddr = match self.server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_read_timeout(Some(self.timeout))?;
        socket.set_write_timeout(Some(self.timeout))?;
        socket.connect(self.server)?;
        Ok(socket)
    }

    /// Blocks for the first datagram, then takes any others already queued.
    fn receive(&self, socket: &UdpSocket) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let mut received = Vec::new();

        let len = socket
            .recv(&mut buf)
            .map_err(|e| ResolveError::from_io(e, self.timeout))?;
        received.extend_from_slice(&buf[..len]);

        socket.set_nonblocking(true)?;
        loop {
            match socket.recv(&mut buf) {
                Ok(len) => {
                    trace!("Received a further {} bytes", len);
                    received.extend_from_slice(&buf[..len]);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(ResolveError::Transport(e)),
            }
        }

        Ok(received)
    }
}

impl Resolver for UdpResolver {
    #[instrument(skip(self, request), fields(id = request.id(), server = %self.server))]
    fn resolve(&self, request: &Request) -> Result<Response> {
        let payload = request.to_bytes()?;
        let socket = self.bind()?;

        debug!("Sending {} bytes over UDP", payload.len());
        socket
            .send(&payload)
            .map_err(|e| ResolveError::from_io(e, self.timeout))?;

        let received = self.receive(&socket)?;
        debug!("Received {} bytes over UDP", received.len());

        let response = Response::from_bytes(&received)?;
        if response.is_truncated() {
            warn!("Response {} was truncated, retrying with fallback", response.id());
            return self.fallback.resolve(request);
        }

        Ok(response)
    }
}
