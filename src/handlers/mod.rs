//! Default scheme handlers.
//!
//! # Data Flow
//! ```text
//! SchemeKind
//!     Resource          → resource.rs  ResourceSchemeHandler (FileResolver)
//!     AssemblyResource  → resource.rs  BundleSchemeHandler   (BundleResolver)
//!     LocalRequest      → request.rs   RequestSchemeHandler  (RouteDispatcher)
//!     ExternalRequest   → external.rs  ExternalRequestHandler (ProxyClient)
//!     ExternalBrowser   → no handler (navigation policy)
//!     Command           → no handler (navigation policy)
//!
//! provider.rs binds the factory for each kind to the registry.
//! ```

pub mod external;
pub mod provider;
pub mod request;
pub mod resource;

pub use external::ExternalRequestHandler;
pub use provider::{HandlerContext, HandlerProvider};
pub use request::RequestSchemeHandler;
pub use resource::{BundleSchemeHandler, ResourceSchemeHandler};
