//! Three-tier dependency artifact cache
//!
//! Lookup order for a dependency with a checksum:
//! 1. the buildpack-provided cache (`<buildpack>/dependencies`)
//! 2. the download cache filled earlier in the same build
//! 3. a fresh download, verified before it is recorded
//!
//! A dependency without a checksum can never be verified, so it skips both
//! cache tiers and is downloaded every time.

use crate::cache::http::{Fetcher, HttpClientTimeouts, RequestModifier};
use crate::cache::mirror::{file_name, redact_uri, UriResolver};
use crate::cache::record::{artifact_path, read_record, write_record};
use crate::context::BuildContext;
use crate::dependency::DependencyMetadata;
use crate::error::{PakError, PakResult};
use crate::logger::Logger;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where an artifact was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    BuildpackCache,
    DownloadCache,
    Downloaded,
}

/// A dependency artifact on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    source: ArtifactSource,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> ArtifactSource {
        self.source
    }

    /// Open the artifact for reading
    pub fn open(&self) -> PakResult<File> {
        File::open(&self.path)
            .map_err(|e| PakError::io(format!("opening {}", self.path.display()), e))
    }
}

/// Resolves dependencies to verified local files
pub struct DependencyCache {
    cache_path: PathBuf,
    download_path: PathBuf,
    uris: UriResolver,
    fetcher: Fetcher,
    logger: Logger,
}

impl DependencyCache {
    /// Create a cache with timeouts from the environment and no mirrors
    pub fn new(
        cache_path: impl Into<PathBuf>,
        download_path: impl Into<PathBuf>,
        user_agent: &str,
        logger: Logger,
    ) -> PakResult<Self> {
        Ok(Self {
            cache_path: cache_path.into(),
            download_path: download_path.into(),
            uris: UriResolver::default(),
            fetcher: Fetcher::new(HttpClientTimeouts::from_env()?, user_agent),
            logger,
        })
    }

    /// Cache for a build: buildpack `dependencies/` directory, a download
    /// directory under the system temp dir, mirrors and mappings from the
    /// platform bindings and environment
    pub fn from_context(context: &BuildContext, logger: Logger) -> PakResult<Self> {
        let download_path = std::env::temp_dir().join("layerpak-downloads");
        Ok(Self::new(
            context.buildpack_path.join("dependencies"),
            download_path,
            &context.descriptor.user_agent(),
            logger,
        )?
        .with_uri_resolver(UriResolver::from_bindings(&context.bindings)))
    }

    pub fn with_uri_resolver(mut self, uris: UriResolver) -> Self {
        self.uris = uris;
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn download_path(&self) -> &Path {
        &self.download_path
    }

    /// Local artifact for `dependency`, downloading only on a cache miss
    pub fn artifact(
        &self,
        dependency: &DependencyMetadata,
        modifiers: &[RequestModifier],
    ) -> PakResult<Artifact> {
        let uri = self.uris.resolve(dependency, &self.logger)?;
        let name = file_name(&uri)?;

        let Some(checksum) = &dependency.checksum else {
            self.logger
                .warning("Dependency has no checksum. Skipping cache.");
            self.log_download(&uri);
            fs::create_dir_all(&self.download_path).map_err(|e| {
                PakError::io(format!("creating {}", self.download_path.display()), e)
            })?;
            let path = self.download_path.join(&name);
            self.download(&uri, &self.download_path, &path, modifiers)?;
            return Ok(Artifact {
                path,
                source: ArtifactSource::Downloaded,
            });
        };
        let hash = checksum.hash();

        if let Some(path) = self.lookup(&self.cache_path, hash, &name, dependency)? {
            self.logger.body(format!(
                "{} from buildpack",
                self.logger.green("Reusing cached download")
            ));
            return Ok(Artifact {
                path,
                source: ArtifactSource::BuildpackCache,
            });
        }

        if let Some(path) = self.lookup(&self.download_path, hash, &name, dependency)? {
            self.logger.body(format!(
                "{} from previous build",
                self.logger.green("Reusing cached download")
            ));
            return Ok(Artifact {
                path,
                source: ArtifactSource::DownloadCache,
            });
        }

        self.log_download(&uri);
        let dir = self.download_path.join(hash);
        fs::create_dir_all(&dir)
            .map_err(|e| PakError::io(format!("creating {}", dir.display()), e))?;
        let path = dir.join(&name);
        let temp = self.download_temp(&uri, &dir, modifiers)?;

        self.logger.body("Verifying checksum");
        let actual = match checksum.compute_file(&temp) {
            Ok(actual) => actual,
            Err(e) => {
                let _ = fs::remove_file(&temp);
                return Err(e);
            }
        };
        if actual != *checksum {
            let _ = fs::remove_file(&temp);
            return Err(PakError::ChecksumMismatch {
                uri: redact_uri(&uri),
                expected: checksum.to_string(),
                actual: actual.to_string(),
            });
        }

        fs::rename(&temp, &path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            PakError::io(format!("moving download to {}", path.display()), e)
        })?;
        write_record(&self.download_path, hash, dependency)?;

        Ok(Artifact {
            path,
            source: ArtifactSource::Downloaded,
        })
    }

    /// Artifact path in `root` if its record describes `dependency`
    fn lookup(
        &self,
        root: &Path,
        hash: &str,
        name: &str,
        dependency: &DependencyMetadata,
    ) -> PakResult<Option<PathBuf>> {
        let Some(record) = read_record(root, hash)? else {
            self.logger.debug(format!(
                "No cache record for {} in {}",
                dependency.label(),
                root.display()
            ));
            return Ok(None);
        };
        if !record.equivalent(dependency) {
            self.logger.debug(format!(
                "Cache record in {} describes a different dependency",
                root.display()
            ));
            return Ok(None);
        }

        let path = artifact_path(root, hash, name);
        if !path.is_file() {
            self.logger
                .debug(format!("Cache record without artifact: {}", path.display()));
            return Ok(None);
        }
        Ok(Some(path))
    }

    fn download(
        &self,
        uri: &str,
        dir: &Path,
        destination: &Path,
        modifiers: &[RequestModifier],
    ) -> PakResult<()> {
        let temp = self.download_temp(uri, dir, modifiers)?;
        fs::rename(&temp, destination).map_err(|e| {
            let _ = fs::remove_file(&temp);
            PakError::io(format!("moving download to {}", destination.display()), e)
        })
    }

    /// Fetch into a uniquely named file in `dir`, removed again on failure
    fn download_temp(
        &self,
        uri: &str,
        dir: &Path,
        modifiers: &[RequestModifier],
    ) -> PakResult<PathBuf> {
        let temp = dir.join(format!(".download-{}.tmp", Uuid::new_v4()));
        if let Err(e) = self.fetcher.fetch(uri, &temp, modifiers) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        Ok(temp)
    }

    fn log_download(&self, uri: &str) {
        self.logger.body(format!(
            "{} from {}",
            self.logger.yellow("Downloading"),
            redact_uri(uri)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::http::tests::serve_once;
    use crate::cache::record::record_path;
    use crate::dependency::metadata::tests::dependency;
    use crate::dependency::Checksum;
    use crate::logger::Capture;
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use url::Url;

    const FOO_SHA256: &str = "2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae";

    struct Fixture {
        _temp: TempDir,
        source: PathBuf,
        cache: DependencyCache,
        capture: Capture,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source").join("tool.tgz");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "foo").unwrap();

        let capture = Capture::new();
        let cache = DependencyCache {
            cache_path: temp.path().join("buildpack-cache"),
            download_path: temp.path().join("downloads"),
            uris: UriResolver::default(),
            fetcher: Fetcher::new(HttpClientTimeouts::default(), "test/1.0.0"),
            logger: capture.logger(),
        };

        Fixture {
            _temp: temp,
            source,
            cache,
            capture,
        }
    }

    fn tool(source: &Path, checksum: Option<&str>) -> DependencyMetadata {
        let mut dep = dependency("tool", "1.0.0", &[]);
        dep.uri = Url::from_file_path(source).unwrap().to_string();
        dep.checksum = checksum.map(|c| c.parse::<Checksum>().unwrap());
        dep
    }

    #[test]
    fn downloads_verifies_and_records() {
        let f = fixture();
        let dep = tool(&f.source, Some(FOO_SHA256));

        let artifact = f.cache.artifact(&dep, &[]).unwrap();

        assert_eq!(artifact.source(), ArtifactSource::Downloaded);
        assert_eq!(
            artifact.path(),
            f.cache.download_path.join(FOO_SHA256).join("tool.tgz")
        );
        assert_eq!(fs::read_to_string(artifact.path()).unwrap(), "foo");
        assert!(record_path(&f.cache.download_path, FOO_SHA256).exists());
    }

    #[test]
    fn second_call_hits_download_cache() {
        let f = fixture();
        let dep = tool(&f.source, Some(FOO_SHA256));

        f.cache.artifact(&dep, &[]).unwrap();
        fs::remove_file(&f.source).unwrap();

        let again = f.cache.artifact(&dep, &[]).unwrap();
        assert_eq!(again.source(), ArtifactSource::DownloadCache);
        assert_eq!(fs::read_to_string(again.path()).unwrap(), "foo");
    }

    #[test]
    fn buildpack_cache_wins() {
        let f = fixture();
        let dep = tool(&f.source, Some(FOO_SHA256));

        let dir = f.cache.cache_path.join(FOO_SHA256);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("tool.tgz"), "foo").unwrap();
        write_record(&f.cache.cache_path, FOO_SHA256, &dep).unwrap();
        fs::remove_file(&f.source).unwrap();

        let artifact = f.cache.artifact(&dep, &[]).unwrap();
        assert_eq!(artifact.source(), ArtifactSource::BuildpackCache);
        assert_eq!(artifact.path(), dir.join("tool.tgz"));
        assert!(f.capture.contents().contains("from buildpack"));
    }

    #[test]
    fn stale_record_is_a_miss() {
        let f = fixture();
        let dep = tool(&f.source, Some(FOO_SHA256));

        let dir = f.cache.cache_path.join(FOO_SHA256);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("tool.tgz"), "foo").unwrap();
        let mut other = dep.clone();
        other.version = "0.9.0".to_string();
        write_record(&f.cache.cache_path, FOO_SHA256, &other).unwrap();

        let artifact = f.cache.artifact(&dep, &[]).unwrap();
        assert_eq!(artifact.source(), ArtifactSource::Downloaded);
    }

    #[test]
    fn cache_misses_show_in_debug_output() {
        let mut f = fixture();
        f.cache.logger = f.capture.logger().with_debug(true);
        let dep = tool(&f.source, Some(FOO_SHA256));

        let dir = f.cache.cache_path.join(FOO_SHA256);
        fs::create_dir_all(&dir).unwrap();
        let mut other = dep.clone();
        other.version = "0.9.0".to_string();
        write_record(&f.cache.cache_path, FOO_SHA256, &other).unwrap();

        f.cache.artifact(&dep, &[]).unwrap();

        let output = f.capture.contents();
        assert!(output.contains("describes a different dependency"));
        assert!(output.contains("No cache record for"));
    }

    #[test]
    fn cache_misses_hidden_without_debug() {
        let f = fixture();
        let dep = tool(&f.source, Some(FOO_SHA256));
        f.cache.artifact(&dep, &[]).unwrap();
        assert!(!f.capture.contents().contains("No cache record"));
    }

    #[test]
    fn checksum_mismatch_is_fatal_and_unrecorded() {
        let f = fixture();
        let wrong = "0000000000000000000000000000000000000000000000000000000000000000";
        let dep = tool(&f.source, Some(wrong));

        let err = f.cache.artifact(&dep, &[]).unwrap_err();

        assert!(err.is_integrity_error());
        assert!(!record_path(&f.cache.download_path, wrong).exists());
        let leftovers = fs::read_dir(f.cache.download_path.join(wrong)).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn missing_checksum_always_downloads() {
        let f = fixture();
        let dep = tool(&f.source, None);

        let first = f.cache.artifact(&dep, &[]).unwrap();
        assert_eq!(first.path(), f.cache.download_path.join("tool.tgz"));
        assert!(f.capture.contents().contains("Skipping cache"));

        fs::write(&f.source, "bar").unwrap();
        let second = f.cache.artifact(&dep, &[]).unwrap();
        assert_eq!(second.source(), ArtifactSource::Downloaded);
        assert_eq!(fs::read_to_string(second.path()).unwrap(), "bar");
    }

    #[test]
    fn missing_source_is_download_error() {
        let f = fixture();
        let dep = tool(&f.source.with_file_name("absent.tgz"), Some(FOO_SHA256));
        let err = f.cache.artifact(&dep, &[]).unwrap_err();
        assert!(matches!(err, PakError::Download { .. }));
    }

    #[test]
    fn mirror_is_the_request_target() {
        let (base, head) = serve_once("200 OK", b"foo");
        let mut f = fixture();
        f.cache.uris = UriResolver::new(
            BTreeMap::new(),
            BTreeMap::from([("default".to_string(), format!("{}/base", base))]),
        );
        let mut dep = dependency("tool", "1.0.0", &[]);
        dep.uri = "https://downloads.example.com/tools/tool.tgz".to_string();
        dep.checksum = Some(FOO_SHA256.parse().unwrap());

        let artifact = f.cache.artifact(&dep, &[]).unwrap();

        let head = head.recv().unwrap();
        assert!(head.starts_with("GET /base/tools/tool.tgz HTTP/1.1"));
        assert_eq!(artifact.path().file_name().unwrap(), "tool.tgz");
    }

    #[test]
    fn credentials_never_logged() {
        let (base, _head) = serve_once("200 OK", b"foo");
        let f = fixture();
        let mut dep = dependency("tool", "1.0.0", &[]);
        dep.uri = format!("{}/tool.tgz", base.replace("http://", "http://user:hunter2@"));
        dep.checksum = Some(FOO_SHA256.parse().unwrap());

        let _ = f.cache.artifact(&dep, &[]);
        assert!(f.capture.contents().contains("Downloading"));
        assert!(!f.capture.contents().contains("hunter2"));
    }
}
