//! Client core: session gate, route authorization, the certificate upload
//! wizard, and the verification task abstraction.

pub mod router;
pub mod session;
pub mod verify;
pub mod wizard;

pub use router::{authorize, role_home, Decision, Route, RouteAccess};
pub use session::{
    IdentityProvider, MockIdentityProvider, SessionError, SessionManager, SessionStorage,
    SESSION_KEY,
};
pub use verify::{
    process_submission, CancelToken, ProcessError, SimulatedVerifier, VerificationBackend,
};
pub use wizard::{validate_file, Step, UploadOutcome, Wizard, WizardError, STEP_COUNT};
