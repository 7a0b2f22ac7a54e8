//! The ways a [`Request`] can be carried to a server.
//!
//! Every exchange opens its own socket and closes it before returning.

mod null;
mod tcp;
mod udp;

pub use null::NullResolver;
pub use tcp::TcpResolver;
pub use udp::UdpResolver;

use crate::Result;
use dns_message::{Request, Response};

/// Sends one request and waits for its response.
///
/// Implementations only report what came back. Checking the response
/// against the request is left to [`crate::Client`].
pub trait Resolver: Send + Sync {
    fn resolve(&self, request: &Request) -> Result<Response>;
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn resolve(&self, request: &Request) -> Result<Response> {
        (**self).resolve(request)
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! One-shot loopback servers. Each answers a single request on its own
    //! thread and then exits.

    use dns_message::{DomainName, RData, Request, ResourceRecordBuilder, ResponseBuilder};
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, UdpSocket};
    use std::thread;

    pub fn udp<F>(respond: F) -> SocketAddr
    where
        F: FnOnce(Request) -> Vec<u8> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();
        thread::spawn(move || {
            let mut buf = [0u8; 512];
            let (len, peer) = socket.recv_from(&mut buf).unwrap();
            let request = Request::from_bytes(&buf[..len]).unwrap();
            socket.send_to(&respond(request), peer).unwrap();
        });
        addr
    }

    /// `respond` returns the raw bytes to write back, length prefix
    /// included, see [`framed`].
    pub fn tcp<F>(respond: F) -> SocketAddr
    where
        F: FnOnce(Request) -> Vec<u8> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut len = [0u8; 2];
            stream.read_exact(&mut len).unwrap();
            let mut buf = vec![0u8; u16::from_be_bytes(len) as usize];
            stream.read_exact(&mut buf).unwrap();
            let request = Request::from_bytes(&buf).unwrap();
            stream.write_all(&respond(request)).unwrap();
        });
        addr
    }

    pub fn framed(message: &[u8]) -> Vec<u8> {
        let mut buf = (message.len() as u16).to_be_bytes().to_vec();
        buf.extend_from_slice(message);
        buf
    }

    /// A reply to `request` carrying a single A record for its question.
    pub fn answer(request: &Request, addr: &str) -> Vec<u8> {
        let name: DomainName = request.questions[0].q_name.clone();
        ResponseBuilder::reply_to(request)
            .ra(true)
            .answer(
                ResourceRecordBuilder::new(name, RData::Address(addr.parse().unwrap()))
                    .ttl(300)
                    .build(),
            )
            .build()
            .to_bytes()
            .unwrap()
    }
}
