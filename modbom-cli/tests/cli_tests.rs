//! Integration tests for the `modbom` binary.
//!
//! Runs the compiled binary against temporary buildpack directories. The
//! scanner tool is a small shell script delivered through buildpack.toml.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

fn modbom() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_modbom"));
    cmd.env_remove("BP_DISABLE_SBOM")
        .env_remove("RUST_LOG")
        .env_remove("MODBOM_BOM_DISABLE_SBOM");
    cmd
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be JSON ({e}): {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

#[test]
fn test_detect_reports_node_modules_requirement() {
    let app = TempDir::new().expect("should create temp dir");

    let output = modbom()
        .args(["detect", "--output", "json", "--working-dir"])
        .arg(app.path())
        .output()
        .expect("should run modbom");

    assert!(output.status.success());
    let report = stdout_json(&output);
    let names: Vec<&str> = report["requires"]
        .as_array()
        .expect("requires should be an array")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert_eq!(names, vec!["node", "node_modules"]);
}

#[test]
fn test_missing_config_file_exits_with_config_code() {
    let dir = TempDir::new().expect("should create temp dir");

    let output = modbom()
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .args(["detect", "--working-dir"])
        .arg(dir.path())
        .output()
        .expect("should run modbom");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration error"));
}

#[test]
fn test_invalid_disable_switch_exits_with_config_code() {
    let dir = TempDir::new().expect("should create temp dir");

    let output = modbom()
        .env("BP_DISABLE_SBOM", "maybe")
        .args(["detect", "--working-dir"])
        .arg(dir.path())
        .output()
        .expect("should run modbom");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bom.disable_sbom"));
}

#[cfg(unix)]
mod build {
    use super::*;

    const SCANNER: &str = r#"#!/bin/sh
cat > "$2" <<'EOF'
{"bomFormat":"CycloneDX","components":[
  {"name":"leftpad","version":"0.0.1","purl":"pkg:npm/leftpad@0.0.1",
   "licenses":[{"license":{"id":"BSD-3-Clause"}}]}
]}
EOF
"#;

    struct Buildpack {
        _root: TempDir,
        app: PathBuf,
        layers: PathBuf,
        cnb: PathBuf,
        platform: PathBuf,
    }

    impl Buildpack {
        fn new(scanner: &str, sha256: Option<&str>) -> Self {
            let root = TempDir::new().expect("should create temp dir");
            let app = root.path().join("app");
            let layers = root.path().join("layers");
            let cnb = root.path().join("cnb");
            let platform = root.path().join("platform");
            for dir in [&app, &layers, &cnb, &platform] {
                fs::create_dir_all(dir).expect("should create dir");
            }

            fs::write(cnb.join("cyclonedx-bom"), scanner).expect("should write scanner");
            let digest = hex::encode(Sha256::digest(scanner.as_bytes()));
            let manifest = format!(
                r#"
[[metadata.dependencies]]
id = "cyclonedx-node-module"
name = "CycloneDX Node.js Module"
version = "3.0.7"
uri = "cyclonedx-bom"
sha256 = "{}"
stacks = ["*"]
licenses = ["Apache-2.0"]
"#,
                sha256.unwrap_or(&digest)
            );
            fs::write(cnb.join("buildpack.toml"), manifest).expect("should write manifest");

            fs::write(
                app.join("package-lock.json"),
                r#"{"name":"app","lockfileVersion":1,
                    "dependencies":{"leftpad":{"version":"0.0.1","integrity":"sha256-YWJjZGU="}}}"#,
            )
            .expect("should write lockfile");

            Self {
                _root: root,
                app,
                layers,
                cnb,
                platform,
            }
        }

        fn build(&self) -> Command {
            let mut cmd = modbom();
            cmd.args(["build", "--output", "json", "--stack", "io.buildpacks.stacks.bionic"])
                .arg("--working-dir")
                .arg(&self.app)
                .arg("--layers-dir")
                .arg(&self.layers)
                .arg("--cnb-dir")
                .arg(&self.cnb)
                .arg("--platform-dir")
                .arg(&self.platform);
            cmd
        }
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("should read {}: {e}", path.display()))
    }

    #[test]
    fn test_build_installs_tool_and_writes_boms() {
        let bp = Buildpack::new(SCANNER, None);

        let output = bp.build().output().expect("should run modbom");
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let report = stdout_json(&output);
        assert_eq!(report["decision"], "rebuild");
        assert_eq!(report["build_bom"].as_array().map(Vec::len), Some(2));
        assert_eq!(report["launch_bom"][0]["name"], "leftpad");
        assert_eq!(report["launch_bom"][0]["checksum"]["algorithm"], "SHA-256");
        assert_eq!(report["launch_bom"][0]["checksum"]["hash"], "6162636465");

        assert!(
            bp.layers
                .join("cyclonedx-node-module")
                .join("bin")
                .join("cyclonedx-bom")
                .is_file()
        );
        let layer_toml = read(&bp.layers.join("cyclonedx-node-module.toml"));
        assert!(layer_toml.contains("cache-fingerprint"));
        assert!(read(&bp.layers.join("launch.toml")).contains("leftpad"));
        assert!(read(&bp.layers.join("build.toml")).contains("CycloneDX Node.js Module"));
        assert!(!bp.app.join("bom.json").exists(), "scan output is removed");
    }

    #[test]
    fn test_second_build_reuses_layer() {
        let bp = Buildpack::new(SCANNER, None);

        let first = bp.build().output().expect("should run modbom");
        assert!(first.status.success());

        let second = bp.build().output().expect("should run modbom");
        assert!(second.status.success());
        let report = stdout_json(&second);
        assert_eq!(report["decision"], "reuse");
        assert_eq!(report["launch_bom"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_disabled_sbom_writes_empty_boms() {
        let bp = Buildpack::new(SCANNER, None);

        let output = bp
            .build()
            .env("BP_DISABLE_SBOM", "true")
            .output()
            .expect("should run modbom");
        assert!(output.status.success());

        let report = stdout_json(&output);
        assert!(report["build_bom"].as_array().expect("array").is_empty());
        assert!(report["launch_bom"].as_array().expect("array").is_empty());
        assert!(!read(&bp.layers.join("launch.toml")).contains("leftpad"));
    }

    #[test]
    fn test_failing_scanner_exits_with_scan_code() {
        let bp = Buildpack::new("#!/bin/sh\necho 'scanner exploded' >&2\nexit 3\n", None);

        let output = bp.build().output().expect("should run modbom");
        assert_eq!(output.status.code(), Some(3));
        assert!(String::from_utf8_lossy(&output.stderr).contains("exit status: 3"));
    }

    #[test]
    fn test_unsupported_algorithm_exits_with_data_code() {
        let scanner = r#"#!/bin/sh
echo '{"components":[{"name":"leftpad","version":"0.0.1","hashes":[{"alg":"randomAlgorithm","content":"x"}]}]}' > "$2"
"#;
        let bp = Buildpack::new(scanner, None);

        let output = bp.build().output().expect("should run modbom");
        assert_eq!(output.status.code(), Some(4));
        assert!(String::from_utf8_lossy(&output.stderr).contains("randomAlgorithm is not valid"));
        assert!(!bp.app.join("bom.json").exists());
    }

    #[test]
    fn test_checksum_mismatch_fails_install() {
        let bp = Buildpack::new(SCANNER, Some(&"0".repeat(64)));

        let output = bp.build().output().expect("should run modbom");
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("checksum mismatch"));
    }
}
