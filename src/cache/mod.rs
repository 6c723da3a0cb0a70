//! Dependency download and caching
//!
//! Artifacts are content-addressed by their declared checksum. A cached copy
//! is only trusted when its sidecar record describes the requested
//! dependency, and fresh downloads are verified before they are recorded.
//!
//! # Lookup Order
//!
//! | Tier | Location | Written by |
//! |------|----------|------------|
//! | Buildpack | `<buildpack>/dependencies/<hash>/` | buildpack packager |
//! | Download | `<download dir>/<hash>/` | earlier fetch in this build |
//! | Network | mapped, mirrored or original URI | this fetch |

pub mod artifact;
pub mod http;
pub mod mirror;
pub mod record;

pub use artifact::{Artifact, ArtifactSource, DependencyCache};
pub use http::{DownloadRequest, Fetcher, HttpClientTimeouts, RequestModifier};
pub use mirror::{redact_uri, UriResolver};
pub use record::{read_record, write_record};
