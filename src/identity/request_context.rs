/// Per-request binding of a bearer token to an internal account.
/// Produced once by `require_identity` and read by handlers as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    /// Subject claim of the verified token.
    pub auth0_id: String,
    /// Internal id of the account bound to that subject.
    pub user_id: String,
}

/// Subject of a verified token that has not been resolved to an account yet.
/// Used by routes that run before an account exists (provisioning).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSubject(pub String);
