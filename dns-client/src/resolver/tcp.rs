use super::Resolver;
use crate::{ResolveError, Result};
use bytes::{Buf, BufMut, BytesMut};
use dns_message::{MessageError, Request, Response};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tracing::{debug, instrument};

/// Sends the request over a fresh TCP connection, each message preceded by
/// its length as a big-endian u16.
#[derive(Debug, Clone)]
pub struct TcpResolver {
    server: SocketAddr,
    timeout: Duration,
}

impl TcpResolver {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    fn connect(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect_timeout(&self.server, self.timeout)
            .map_err(|e| ResolveError::from_io(e, self.timeout))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

impl Resolver for TcpResolver {
    #[instrument(skip(self, request), fields(id = request.id(), server = %self.server))]
    fn resolve(&self, request: &Request) -> Result<Response> {
        let payload = request.to_bytes()?;
        let len = u16::try_from(payload.len()).map_err(|_| {
            MessageError::Format(format!("request of {} bytes is too long", payload.len()))
        })?;

        let mut frame = BytesMut::with_capacity(2 + payload.len());
        frame.put_u16(len);
        frame.put_slice(&payload);

        let mut stream = self.connect()?;

        debug!("Sending {} bytes over TCP", payload.len());
        stream
            .write_all(&frame)
            .map_err(|e| ResolveError::from_io(e, self.timeout))?;

        let mut prefix = [0u8; 2];
        stream
            .read_exact(&mut prefix)
            .map_err(|e| ResolveError::from_io(e, self.timeout))?;
        let len = (&prefix[..]).get_u16() as usize;

        let mut buf = vec![0u8; len];
        stream
            .read_exact(&mut buf)
            .map_err(|e| ResolveError::from_io(e, self.timeout))?;
        debug!("Received {} bytes over TCP", len);

        Ok(Response::from_bytes(&buf)?)
    }
}
