//! Integration tests for prebuild

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Command isolated from the user's config file and cache base
    fn prebuild(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("prebuild");
        cmd.env("PREBUILD_CONFIG", temp.path().join("config.toml"))
            .env("PREBUILD_CACHE_BASE", temp.path().join("cache"));
        cmd
    }

    fn ports(temp: &TempDir) -> PathBuf {
        let ports = temp.path().join("ports");
        fs::create_dir_all(ports.join("zlib")).unwrap();
        fs::write(ports.join("zlib/portfile.cmake"), "vcpkg_from_github()").unwrap();
        fs::write(ports.join("zlib/vcpkg.json"), r#"{"name": "zlib"}"#).unwrap();
        ports
    }

    fn key_output(temp: &TempDir, ports: &Path) -> String {
        let output = prebuild(temp)
            .args(["key", "--ports-dir"])
            .arg(ports)
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        prebuild(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("provision"))
            .stdout(predicate::str::contains("status"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        prebuild(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("prebuild"));
    }

    #[test]
    fn key_prints_digest_and_version() {
        let temp = TempDir::new().unwrap();
        let ports = ports(&temp);
        prebuild(&temp)
            .args(["key", "--ports-dir"])
            .arg(&ports)
            .assert()
            .success()
            .stdout(predicate::str::is_match(r"^[0-9a-f]{8}_1\n$").unwrap());
    }

    #[test]
    fn key_depends_on_content_not_location() {
        let temp = TempDir::new().unwrap();
        let ports = ports(&temp);
        let copy = temp.path().join("elsewhere/ports");
        fs::create_dir_all(copy.join("zlib")).unwrap();
        for name in ["portfile.cmake", "vcpkg.json"] {
            fs::copy(ports.join("zlib").join(name), copy.join("zlib").join(name)).unwrap();
        }
        assert_eq!(key_output(&temp, &ports), key_output(&temp, &copy));

        fs::write(copy.join("zlib/vcpkg.json"), r#"{"name": "zlib", "version": "2"}"#).unwrap();
        assert_ne!(key_output(&temp, &ports), key_output(&temp, &copy));
    }

    #[test]
    fn key_fails_without_ports_dir() {
        let temp = TempDir::new().unwrap();
        prebuild(&temp)
            .args(["key", "--ports-dir"])
            .arg(temp.path().join("missing"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("Missing artifact"));
    }

    #[test]
    fn status_reports_missing_tag_without_writing() {
        let temp = TempDir::new().unwrap();
        let ports = ports(&temp);
        prebuild(&temp)
            .args(["status", "--json", "--ports-dir"])
            .arg(&ports)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"stale\": true"))
            .stdout(predicate::str::contains("tag_missing"));
        assert!(!temp.path().join("cache").exists());
    }

    #[test]
    fn status_text_output() {
        let temp = TempDir::new().unwrap();
        let ports = ports(&temp);
        prebuild(&temp)
            .args(["status", "--ports-dir"])
            .arg(&ports)
            .assert()
            .success()
            .stdout(predicate::str::contains("Stored tag: (none)"))
            .stdout(predicate::str::contains("no tag file"));
    }

    /// Package-manager stand-in that records its arguments and working directory
    #[cfg(target_os = "linux")]
    fn stub_package_manager(root: &Path) {
        use std::os::unix::fs::PermissionsExt;

        fs::create_dir_all(root).unwrap();
        let exe = root.join("vcpkg");
        fs::write(&exe, "#!/bin/sh\necho \"$@\" >> invocations.txt\n").unwrap();
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn provision_with_toolchain_root_installs_and_tags() {
        let temp = TempDir::new().unwrap();
        let ports = ports(&temp);
        let root = temp.path().join("vcpkg");
        let build = temp.path().join("build");
        stub_package_manager(&root);

        prebuild(&temp)
            .args(["provision", "--build-root"])
            .arg(&build)
            .arg("--toolchain-root")
            .arg(&root)
            .arg("--ports-dir")
            .arg(&ports)
            .assert()
            .success()
            .stdout(predicate::str::contains("explicit toolchain root"));

        let invocations = fs::read_to_string(root.join("invocations.txt")).unwrap();
        assert_eq!(
            invocations,
            format!(
                "--vcpkg-root {} install --triplet x64-linux hifi-client-deps\n",
                root.display()
            )
        );
        assert!(!root.join("ports").exists());

        let config = fs::read_to_string(build.join("vcpkg.cmake")).unwrap();
        assert!(config.contains("scripts/buildsystems/vcpkg.cmake"));
        assert!(config.contains("CMAKE_TOOLCHAIN_FILE_UNCACHED"));

        let key = key_output(&temp, &ports);
        assert_eq!(fs::read_to_string(root.join(".id")).unwrap(), key.trim_end());
        assert!(!temp.path().join("vcpkg.lock").exists());
    }

    #[test]
    fn provision_with_toolchain_root_fails_without_package_manager() {
        let temp = TempDir::new().unwrap();
        let ports = ports(&temp);
        let root = temp.path().join("empty-checkout");
        fs::create_dir_all(&root).unwrap();

        prebuild(&temp)
            .args(["provision", "--build-root"])
            .arg(temp.path().join("build"))
            .arg("--toolchain-root")
            .arg(&root)
            .arg("--ports-dir")
            .arg(&ports)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
        assert!(!root.join(".id").exists());
    }

    #[test]
    fn provision_requires_build_root() {
        let temp = TempDir::new().unwrap();
        prebuild(&temp)
            .arg("provision")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--build-root"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        let ports = ports(&temp);
        fs::write(temp.path().join("config.toml"), "[cache]\nlock_poll_secs = \"soon\"\n").unwrap();
        prebuild(&temp)
            .args(["key", "--ports-dir"])
            .arg(&ports)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
