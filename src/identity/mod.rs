//! Identity, session state and the auth lifecycle built on top of them.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod authorizer;
mod bootstrap;

pub use principal::Identity;
pub use session::{CredentialPair, Session, SharedSession};
pub use provider::{AuthApi, ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, LOGIN_PATH, REGISTER_PATH, CHANGE_PASSWORD_PATH};
pub use authorizer::{Role, Route, Navigation, permitted_routes, is_permitted, landing_route, resolve_navigation};
pub use bootstrap::{AuthPhase, BootstrapOutcome, Bootstrapper, ME_PATH};
