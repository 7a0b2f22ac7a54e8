use crate::resolver::{Resolver, TcpResolver, UdpResolver};
use crate::{ClientConfig, ResolveError, Result, Transport};
use dns_message::{DomainName, Question, RCode, RData, Request, Response, Type};
use std::net::IpAddr;
use tracing::{debug, instrument};

/// Asks one server one question at a time.
///
/// Every call sends a fresh request with its own random id, so a `Client`
/// can be shared between threads.
pub struct Client {
    resolver: Box<dyn Resolver>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let ClientConfig {
            server,
            timeout,
            transport,
        } = config;

        let resolver: Box<dyn Resolver> = match transport {
            Transport::Udp => Box::new(
                UdpResolver::new(server, timeout)
                    .with_fallback(Box::new(TcpResolver::new(server, timeout))),
            ),
            Transport::UdpOnly => Box::new(UdpResolver::new(server, timeout)),
            Transport::Tcp => Box::new(TcpResolver::new(server, timeout)),
        };

        Self { resolver }
    }

    pub fn with_resolver<R: Resolver + 'static>(resolver: R) -> Self {
        Self {
            resolver: Box::new(resolver),
        }
    }

    /// Sends a recursive query for `name` and returns the whole response.
    ///
    /// Fails when the response answers a different id, or carries any
    /// response code but `NOERROR`.
    #[instrument(skip(self, name), fields(name = %name))]
    pub fn resolve(&self, name: &DomainName, r_type: Type) -> Result<Response> {
        let request = Request::new(Question::new(name.clone(), r_type));
        let response = self.resolver.resolve(&request)?;

        if response.id() != request.id() {
            return Err(ResolveError::MismatchedId {
                expected: request.id(),
                actual: response.id(),
            });
        }

        if response.rcode() != RCode::NoError {
            let reason = format!("server answered {}", response.rcode());
            return Err(ResolveError::query(reason, Some(response)));
        }

        debug!("{}", response);

        Ok(response)
    }

    /// The addresses of `name`. Only A and AAAA may be asked for.
    pub fn lookup(&self, name: &DomainName, r_type: Type) -> Result<Vec<IpAddr>> {
        if !matches!(r_type, Type::A | Type::AAAA) {
            return Err(ResolveError::UnsupportedType);
        }

        let response = self.resolve(name, r_type)?;
        let addresses: Vec<IpAddr> = response
            .answers_of(r_type)
            .filter_map(|a| a.address())
            .collect();

        if addresses.is_empty() {
            return Err(ResolveError::query("no matching records", Some(response)));
        }

        Ok(addresses)
    }

    /// The name the PTR record for `addr` points at.
    pub fn reverse(&self, addr: IpAddr) -> Result<DomainName> {
        let response = self.resolve(&DomainName::reverse_lookup(addr), Type::PTR)?;
        let target = response.answers.iter().find_map(|a| match &a.data {
            RData::Pointer(name) => Some(name.clone()),
            _ => None,
        });

        match target {
            Some(name) => Ok(name),
            None => Err(ResolveError::query("no matching records", Some(response))),
        }
    }

    /// The mail exchangers for `name` as `(preference, exchange)`, most
    /// preferred first.
    pub fn mail_exchangers(&self, name: &DomainName) -> Result<Vec<(u16, DomainName)>> {
        let response = self.resolve(name, Type::MX)?;
        let mut exchangers: Vec<(u16, DomainName)> = response
            .answers
            .iter()
            .filter_map(|a| match &a.data {
                RData::MailExchange {
                    preference,
                    exchange,
                } => Some((*preference, exchange.clone())),
                _ => None,
            })
            .collect();

        if exchangers.is_empty() {
            return Err(ResolveError::query("no matching records", Some(response)));
        }

        exchangers.sort_by_key(|(preference, _)| *preference);
        Ok(exchangers)
    }
}
