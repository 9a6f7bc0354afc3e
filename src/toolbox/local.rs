//! Toolbox backed by the real network, filesystem and process table

use crate::catalog::ArchiveKind;
use crate::error::{PrebuildError, PrebuildResult};
use crate::toolbox::{CommandOutput, CommandSpec, Toolbox, STRIPPED_ENV_VARS};
use crate::ui::{url_label, DownloadProgress, UiContext};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tar::Archive;
use tracing::{debug, info};
use zip::ZipArchive;

/// Blocking toolbox: ureq downloads, tar/zip extraction, std processes
pub struct LocalToolbox {
    ui: UiContext,
}

impl LocalToolbox {
    pub fn new(ui: UiContext) -> Self {
        Self { ui }
    }
}

impl Toolbox for LocalToolbox {
    fn fetch(&self, url: &str, dest: &Path) -> PrebuildResult<()> {
        info!("Fetching {}", url);
        let response = ureq::get(url)
            .call()
            .map_err(|e| PrebuildError::network(url, e))?;

        let total = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let progress = DownloadProgress::new(&self.ui, url_label(url), total);

        let mut reader = response.into_body().into_reader();
        let mut file = File::create(dest)
            .map_err(|e| PrebuildError::io(format!("creating {}", dest.display()), e))?;

        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|e| PrebuildError::network(url, e))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])
                .map_err(|e| PrebuildError::io(format!("writing {}", dest.display()), e))?;
            progress.advance(n as u64);
        }
        file.flush()
            .map_err(|e| PrebuildError::io(format!("flushing {}", dest.display()), e))?;
        progress.finish();
        Ok(())
    }

    fn extract(&self, archive: &Path, kind: ArchiveKind, dest: &Path) -> PrebuildResult<()> {
        debug!("Extracting {} into {}", archive.display(), dest.display());
        fs::create_dir_all(dest)
            .map_err(|e| PrebuildError::io(format!("creating {}", dest.display()), e))?;
        let file = File::open(archive)
            .map_err(|e| PrebuildError::io(format!("opening archive {}", archive.display()), e))?;

        match kind {
            ArchiveKind::TarGz => {
                let mut tar = Archive::new(GzDecoder::new(file));
                tar.unpack(dest).map_err(|e| {
                    PrebuildError::io(format!("extracting archive into {}", dest.display()), e)
                })?;
            }
            ArchiveKind::Zip => {
                let mut zip = ZipArchive::new(file).map_err(|e| {
                    PrebuildError::Internal(format!(
                        "reading zip archive {}: {}",
                        archive.display(),
                        e
                    ))
                })?;
                zip.extract(dest).map_err(|e| {
                    PrebuildError::Internal(format!(
                        "extracting zip archive into {}: {}",
                        dest.display(),
                        e
                    ))
                })?;
            }
        }
        Ok(())
    }

    fn run(&self, command: &CommandSpec) -> PrebuildResult<CommandOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for var in STRIPPED_ENV_VARS {
            cmd.env_remove(var);
        }
        if let Some(ref cwd) = command.cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd.output().map_err(|e| PrebuildError::ToolLaunch {
            command: command.to_string(),
            source: e,
        })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn toolbox() -> LocalToolbox {
        LocalToolbox::new(UiContext::non_interactive())
    }

    #[test]
    fn extracts_tar_gz() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("pkg.tgz");

        {
            let file = File::create(&archive_path).unwrap();
            let encoder = GzEncoder::new(file, Compression::default());
            let mut builder = tar::Builder::new(encoder);
            let content = b"libtbb";
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "lib/release/libtbb.so", &content[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let dest = dir.path().join("out");
        toolbox()
            .extract(&archive_path, ArchiveKind::TarGz, &dest)
            .unwrap();
        assert_eq!(
            fs::read(dest.join("lib/release/libtbb.so")).unwrap(),
            b"libtbb"
        );
    }

    #[test]
    fn extracts_zip() {
        let dir = TempDir::new().unwrap();
        let archive_path = dir.path().join("pkg.zip");

        {
            let file = File::create(&archive_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("lib/libnvtt.so", zip::write::FileOptions::default())
                .unwrap();
            zip.write_all(b"nvtt").unwrap();
            zip.finish().unwrap();
        }

        let dest = dir.path().join("out");
        toolbox()
            .extract(&archive_path, ArchiveKind::Zip, &dest)
            .unwrap();
        assert_eq!(fs::read(dest.join("lib/libnvtt.so")).unwrap(), b"nvtt");
    }

    #[cfg(unix)]
    #[test]
    fn run_captures_output_and_exit_code() {
        let cmd = CommandSpec::new("sh").arg("-c").arg("echo out; echo err >&2; exit 3");
        let output = toolbox().run(&cmd).unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn run_strips_package_manager_env() {
        std::env::set_var("VCPKG_ROOT", "/somewhere/else");
        std::env::set_var("USE_CCACHE", "1");

        let output = toolbox().run(&CommandSpec::new("env")).unwrap();

        std::env::remove_var("VCPKG_ROOT");
        std::env::remove_var("USE_CCACHE");

        assert!(output.success());
        for var in STRIPPED_ENV_VARS {
            let prefix = format!("{var}=");
            assert!(!output.stdout.lines().any(|l| l.starts_with(&prefix)));
        }
    }

    #[test]
    fn run_missing_program_is_launch_error() {
        let cmd = CommandSpec::new("/definitely/not/a/real/tool");
        let err = toolbox().run(&cmd).unwrap_err();
        assert!(matches!(err, PrebuildError::ToolLaunch { .. }));
    }
}
