//! Identity check.
//!
//! Only the credential's scheme is inspected: the token must read
//! `Bearer <credential>`. A bare `Bearer ` prefix with nothing after it is
//! rejected, so a prefix match alone does not admit a request. Signature
//! verification belongs to the backends.

use crate::pipeline::admission::{Decision, Policy, RequestAttributes};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, Default)]
pub struct BearerScheme;

impl Policy for BearerScheme {
    fn name(&self) -> &'static str {
        "bearer_scheme"
    }

    fn evaluate(&self, attrs: &RequestAttributes<'_>) -> Decision {
        let has_credential = attrs
            .token
            .and_then(|token| token.strip_prefix(BEARER_PREFIX))
            .is_some_and(|credential| !credential.trim().is_empty());

        Decision::from_bool(has_credential)
    }
}
