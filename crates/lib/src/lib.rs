//! pbforge-lib: build custom PocketBase binaries with plugins compiled in.
//!
//! A [`BuildRequest`] names a target platform and the Go modules to link.
//! A [`Builder`] validates it, prepares a workspace, generates the Go
//! sources, runs the toolchain and hands the binary back either as an
//! [`ArtifactStream`] or written to a destination path.

pub mod artifact;
pub mod builder;
pub mod error;
pub mod inject;
pub mod module;
pub mod platform;
pub mod request;
pub mod toolchain;
pub mod util;
pub mod workspace;

pub use artifact::{ArtifactStream, BuildOutput};
pub use builder::{Builder, BuilderOptions};
pub use error::BuildError;
pub use module::ModuleRef;
pub use platform::{Arch, Os, Platform};
pub use request::BuildRequest;
pub use toolchain::{GoToolchain, OutputSink, OutputStream};
