//! Integration tests for layerpak

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const FOO_SHA256: &str = "2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae";

    fn layerpak() -> Command {
        let mut cmd = cargo_bin_cmd!("layerpak");
        for var in [
            "CNB_BUILDPACK_DIR",
            "CNB_LAYERS_DIR",
            "CNB_PLATFORM_DIR",
            "CNB_STACK_ID",
            "SERVICE_BINDING_ROOT",
            "CNB_BINDINGS",
            "BP_ARCH",
            "BP_DEPENDENCY_MIRROR",
            "BP_DEBUG",
            "BP_LOG_LEVEL",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Buildpack directory whose `jre` dependency points at a local file
    fn buildpack(temp: &Path) -> PathBuf {
        let source = temp.join("source").join("jre-11.0.2.tgz");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "foo").unwrap();

        let root = temp.join("buildpack");
        fs::create_dir_all(&root).unwrap();
        fs::write(
            root.join("buildpack.toml"),
            format!(
                r#"api = "0.7"

[buildpack]
id = "example/jre"
name = "Example JRE"
version = "1.2.3"

[[metadata.configurations]]
name = "BP_JVM_VERSION"
default = "11"
description = "the Java version"
build = true

[[metadata.dependencies]]
id = "jre"
name = "JRE"
version = "11.0.1"
uri = "file://{source}"
checksum = "sha256:{sha}"
stacks = ["io.buildpacks.stacks.jammy"]

[[metadata.dependencies]]
id = "jre"
name = "JRE"
version = "11.0.2"
uri = "file://{source}"
checksum = "sha256:{sha}"
stacks = ["io.buildpacks.stacks.jammy"]
purl = "pkg:generic/jre@11.0.2"
"#,
                source = source.display(),
                sha = FOO_SHA256
            ),
        )
        .unwrap();
        root
    }

    #[test]
    fn help_displays() {
        layerpak()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Dependency resolution, artifact caching and layer reuse",
            ))
            .stdout(predicate::str::contains("update-dependency"));
    }

    #[test]
    fn version_displays() {
        layerpak()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("layerpak"));
    }

    #[test]
    fn resolve_picks_highest_version() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());

        layerpak()
            .arg("--buildpack")
            .arg(&root)
            .args(["--stack", "io.buildpacks.stacks.jammy"])
            .args(["resolve", "jre", "-c", "11.*", "--format", "plain"])
            .assert()
            .success()
            .stdout("11.0.2\n");
    }

    #[test]
    fn resolve_json() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());

        let output = layerpak()
            .env("CNB_BUILDPACK_DIR", &root)
            .args(["resolve", "jre", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value["version"], "11.0.2");
        assert_eq!(value["purl"], "pkg:generic/jre@11.0.2");
    }

    #[test]
    fn resolve_unknown_stack_fails() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());

        layerpak()
            .arg("--buildpack")
            .arg(&root)
            .args(["--stack", "io.buildpacks.stacks.bionic"])
            .args(["resolve", "jre"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no valid dependencies for jre"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn invalid_constraint_fails() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());

        layerpak()
            .arg("--buildpack")
            .arg(&root)
            .args(["resolve", "jre", "-c", "not-a-valid-range!!"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid version constraint"));
    }

    #[test]
    fn missing_descriptor_fails() {
        let temp = TempDir::new().unwrap();

        layerpak()
            .arg("--buildpack")
            .arg(temp.path())
            .args(["resolve", "jre"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("buildpack.toml"));
    }

    #[test]
    fn config_lists_parameters() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());

        layerpak()
            .arg("--buildpack")
            .arg(&root)
            .env("BP_JVM_VERSION", "17")
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("Build Configuration:"))
            .stdout(predicate::str::contains("$BP_JVM_VERSION  17  the Java version"));
    }

    #[test]
    fn fetch_prints_cached_path() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());
        let downloads = temp.path().join("downloads");

        layerpak()
            .arg("--buildpack")
            .arg(&root)
            .args(["fetch", "jre", "--download-dir"])
            .arg(&downloads)
            .assert()
            .success()
            .stdout(predicate::str::contains(FOO_SHA256))
            .stdout(predicate::str::ends_with("jre-11.0.2.tgz\n"));

        assert!(downloads.join(format!("{}.toml", FOO_SHA256)).is_file());
    }

    #[test]
    fn fetch_debug_output_names_cache_misses() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());

        layerpak()
            .arg("--buildpack")
            .arg(&root)
            .env("BP_DEBUG", "true")
            .args(["fetch", "jre", "-c", "11.0.1", "--download-dir"])
            .arg(temp.path().join("downloads"))
            .assert()
            .success()
            .stderr(predicate::str::contains("Resolved jre 11.0.1 to 11.0.1"))
            .stderr(predicate::str::contains("No cache record for"));
    }

    #[test]
    fn contribute_writes_layer_and_reuses_it() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());
        let layers = temp.path().join("layers");

        let contribute = || {
            let mut cmd = layerpak();
            cmd.arg("--buildpack")
                .arg(&root)
                .arg("--layers")
                .arg(&layers)
                .arg("--platform")
                .arg(temp.path().join("platform"))
                .args(["contribute", "jre", "--cache", "--launch", "--download-dir"])
                .arg(temp.path().join("downloads"));
            cmd
        };

        contribute()
            .assert()
            .success()
            .stdout(predicate::str::contains("Example JRE"))
            .stdout(predicate::str::contains("Contributing"));

        let record = fs::read_to_string(layers.join("jre.toml")).unwrap();
        assert!(record.contains("[types]"));
        assert!(record.contains("launch = true"));
        assert!(record.contains("version = \"11.0.2\""));
        assert_eq!(
            fs::read_to_string(layers.join("jre").join("jre-11.0.2.tgz")).unwrap(),
            "foo"
        );
        assert!(layers.join("jre.sbom.syft.json").is_file());

        contribute()
            .assert()
            .success()
            .stdout(predicate::str::contains("Reusing"));
    }

    #[test]
    fn update_dependency_rewrites_file() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());

        layerpak()
            .arg("--buildpack")
            .arg(&root)
            .args([
                "update-dependency",
                "--id",
                "jre",
                "--version-constraint",
                "11.0.2",
                "--new-version",
                "11.0.3",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Updated 1 entry"));

        let content = fs::read_to_string(root.join("buildpack.toml")).unwrap();
        assert!(content.contains("version = \"11.0.1\""));
        assert!(content.contains("version = \"11.0.3\""));
        assert!(content.contains("pkg:generic/jre@11.0.3"));
    }

    #[test]
    fn update_dependency_without_match_fails() {
        let temp = TempDir::new().unwrap();
        let root = buildpack(temp.path());

        layerpak()
            .arg("--buildpack")
            .arg(&root)
            .args(["update-dependency", "--id", "jdk", "--new-version", "1.0.0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No dependency jdk"));
    }
}
