use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 53;

/// Applied to connecting, sending and receiving alike.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(7);

/// How requests reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// UDP, retrying over TCP when the response comes back truncated.
    #[default]
    Udp,

    /// UDP alone. A truncated response is a query failure.
    UdpOnly,

    Tcp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server: SocketAddr,
    pub timeout: Duration,
    pub transport: Transport,
}

impl ClientConfig {
    pub fn new(server: IpAddr) -> Self {
        Self {
            server: SocketAddr::new(server, DEFAULT_PORT),
            timeout: DEFAULT_TIMEOUT,
            transport: Transport::default(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.server.set_port(port);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }
}

impl From<SocketAddr> for ClientConfig {
    fn from(server: SocketAddr) -> Self {
        ClientConfig::new(server.ip()).port(server.port())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)));
        assert_eq!(config.server, "8.8.8.8:53".parse().unwrap());
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.transport, Transport::Udp);
    }

    #[test]
    fn test_setters() {
        let config = ClientConfig::new("::1".parse().unwrap())
            .port(5353)
            .timeout(Duration::from_millis(250))
            .transport(Transport::Tcp);
        assert_eq!(config.server, "[::1]:5353".parse().unwrap());
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.transport, Transport::Tcp);

        let from_addr = ClientConfig::from("127.0.0.1:1053".parse::<SocketAddr>().unwrap());
        assert_eq!(from_addr.server.port(), 1053);
        assert_eq!(from_addr.timeout, DEFAULT_TIMEOUT);
    }
}
