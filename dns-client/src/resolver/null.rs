use super::Resolver;
use crate::{ResolveError, Result};
use dns_message::{Request, Response};
use tracing::debug;

/// Fails every request. This is the fallback of a [`super::UdpResolver`]
/// that has nowhere to retry a truncated response.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl Resolver for NullResolver {
    fn resolve(&self, request: &Request) -> Result<Response> {
        debug!("No resolver available for request {}", request.id());
        Err(ResolveError::query("no resolver available", None))
    }
}
