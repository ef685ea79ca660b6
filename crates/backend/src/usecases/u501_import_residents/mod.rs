pub mod directory;
pub mod executor;
pub mod parser;
pub mod session;
pub mod session_store;
pub mod template;
pub mod validator;

pub use executor::ImportExecutor;
pub use session::ImportSession;
pub use session_store::SessionStore;
