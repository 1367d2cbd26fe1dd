//! Bearer-token identity for forkful: token verification, mapping an external
//! identity onto an internal account, and first-time account provisioning.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod provider;
mod request_context;
mod middleware;
mod provisioning;

pub use principal::{decode_subject, Claims};
pub use provider::{JwksVerifier, SharedSecretVerifier, TokenError, TokenVerifier, normalize_issuer};
pub use request_context::{IdentityContext, VerifiedSubject};
pub use middleware::{authenticate, bearer_token, require_identity, require_token, resolve_identity, verified_subject};
pub use provisioning::{current_user, provision_account, update_profile, NewAccount, ProfileUpdate, ProvisionOutcome};
