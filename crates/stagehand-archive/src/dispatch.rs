//! Strategy selection for archives in the archives directory.
//!
//! Two backends sit behind [`Plan`]: the in-process zip reader and an
//! external tool invocation. Format checks happen before anything on disk
//! is touched.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use stagehand_fs::{Workspace, clear_dir};
use stagehand_platform::{Command, CommandRunner, ShellExecutor};
use tracing::info;

use crate::error::{Error, Result};
use crate::format::ArchiveFormat;
use crate::layout::StagingLayout;
use crate::package::{Package, Toolset};
use crate::unzip::ZipExtractor;

/// Outcome of [`ExtractionDispatcher::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Entry names written by the in-process zip reader.
    Entries(Vec<String>),
    /// The external command that did the work.
    External(Command),
}

impl Extracted {
    pub fn entries(&self) -> Option<&[String]> {
        match self {
            Self::Entries(entries) => Some(entries),
            Self::External(_) => None,
        }
    }
}

/// Which backend unpacks an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Native,
    Tool(Command),
}

#[derive(Clone, Copy, Debug)]
pub struct ExtractionDispatcher<'a> {
    layout: &'a StagingLayout,
    tools: &'a Toolset,
}

impl<'a> ExtractionDispatcher<'a> {
    pub fn new(layout: &'a StagingLayout, tools: &'a Toolset) -> Self {
        Self { layout, tools }
    }

    /// Whether the 7-Zip tool is already in `stage/bin`.
    pub fn sevenzip_resident(&self) -> bool {
        self.tools.sevenzip.path_in(self.layout).is_file()
    }

    /// Pick the backend for `format` without running anything.
    ///
    /// `out` is passed to tools that take an output directory. Commands
    /// always run from the stage root.
    pub fn plan(
        &self,
        format: ArchiveFormat,
        archive: &Path,
        out: &Path,
        sevenzip_resident: bool,
    ) -> Plan {
        let sevenzip = || Command::new(self.tools.sevenzip.path_in(self.layout)).arg("x");

        let command = match format {
            ArchiveFormat::Tar(_) => Command::new(self.tools.tar.path_in(self.layout))
                .arg("-xf")
                .arg(archive),
            ArchiveFormat::SevenZip => sevenzip().arg("-t7z").joined_arg("-o", out).arg(archive),
            ArchiveFormat::SelfExtracting => sevenzip()
                .args(["-t7z", "-sfx"])
                .joined_arg("-o", out)
                .arg(archive),
            ArchiveFormat::Zip if sevenzip_resident => {
                sevenzip().joined_arg("-o", out).arg(archive)
            }
            ArchiveFormat::Zip => return Plan::Native,
        };

        Plan::Tool(command.current_dir(self.layout.stage()))
    }

    /// Unpack `package` from the archives directory into its target.
    ///
    /// A target below the stage root is replaced as a whole. Tools that
    /// take an output directory unpack into a sibling `.<name>.partial`
    /// directory first, so a failed run leaves the previous contents in
    /// place.
    ///
    /// `package.regex` only filters zip entries, but it is compiled for
    /// every format: a malformed pattern fails before anything is created.
    pub fn extract<R: CommandRunner>(
        &self,
        package: &Package,
        shell: &mut ShellExecutor<R>,
    ) -> Result<Extracted> {
        let file_name = package.file_name()?;
        let archive = self.layout.archive_path(&file_name);
        if !archive.is_file() {
            return Err(Error::MissingArchive { archive });
        }

        let format = ArchiveFormat::classify(&file_name)
            .ok_or_else(|| Error::UnsupportedFormat { file: file_name.clone() })?;
        let pattern = package.pattern()?;
        let target = self.layout.target_path(package.target.as_deref())?;

        let stage = self.layout.stage();
        fs::create_dir_all(stage).map_err(Error::io(stage))?;
        let in_place = target == stage;

        info!(archive = %file_name, target = %target.display(), ?format, "extracting");

        let out = if in_place {
            target.clone()
        } else {
            partial_path(&target)
        };

        match self.plan(format, &archive, &out, self.sevenzip_resident()) {
            Plan::Native => {
                if !in_place {
                    clear_dir(&target)?;
                }
                let entries =
                    ZipExtractor::new(self.layout).extract_from(&archive, pattern.as_ref())?;
                Ok(Extracted::Entries(entries))
            }
            Plan::Tool(command) if in_place || !format.honors_output_dir() => {
                if !in_place {
                    clear_dir(&target)?;
                }
                run_tool(shell, &command, &archive, &target)?;
                Ok(Extracted::External(command))
            }
            Plan::Tool(command) => {
                let workspace = Workspace::new(&out, &target)?;
                run_tool(shell, &command, &archive, &target)?;
                workspace.commit()?;
                Ok(Extracted::External(command))
            }
        }
    }
}

fn run_tool<R: CommandRunner>(
    shell: &mut ShellExecutor<R>,
    command: &Command,
    archive: &Path,
    target: &Path,
) -> Result<()> {
    shell
        .run(command)
        .map(drop)
        .map_err(|source| Error::ExternalTool {
            archive: archive.to_path_buf(),
            target: target.to_path_buf(),
            source,
        })
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(target.file_name().unwrap_or_default());
    name.push(".partial");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use stagehand_platform::{Captured, CommandEnv};
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::format::Compression;
    use crate::package::Utility;

    /// Pretends to be the extraction tools: writes `payload.txt` into the
    /// `-o` directory, or the working directory when there is none.
    #[derive(Default)]
    struct FakeTool {
        calls: Vec<Command>,
        code: i32,
    }

    impl CommandRunner for FakeTool {
        fn run(
            &mut self,
            command: &Command,
            _env: &CommandEnv,
        ) -> stagehand_platform::Result<Captured> {
            self.calls.push(command.clone());

            let out = command
                .get_args()
                .iter()
                .find_map(|arg| arg.to_str()?.strip_prefix("-o").map(PathBuf::from))
                .or_else(|| command.get_current_dir().map(Path::to_path_buf))
                .unwrap();
            fs::create_dir_all(&out).unwrap();
            fs::write(out.join("payload.txt"), "new").unwrap();

            Ok(Captured {
                code: Some(self.code),
                ..Captured::default()
            })
        }
    }

    struct Fixture {
        _root: tempfile::TempDir,
        layout: StagingLayout,
        tools: Toolset,
    }

    impl Fixture {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let layout =
                StagingLayout::new(root.path().join("archives"), root.path().join("stage"));
            fs::create_dir_all(layout.archives()).unwrap();
            Self {
                _root: root,
                layout,
                tools: Toolset {
                    tar: Utility::new("https://example.org/bsdtar.zip", "bsdtar"),
                    sevenzip: Utility::new("https://example.org/7za920.zip", "7za"),
                },
            }
        }

        fn dispatcher(&self) -> ExtractionDispatcher<'_> {
            ExtractionDispatcher::new(&self.layout, &self.tools)
        }

        fn shell(&self, code: i32) -> ShellExecutor<FakeTool> {
            ShellExecutor::with_runner(
                self.layout.bin(),
                CommandEnv::new(),
                FakeTool {
                    code,
                    ..FakeTool::default()
                },
            )
        }

        fn archive(&self, name: &str) -> PathBuf {
            let path = self.layout.archive_path(name);
            fs::write(&path, b"opaque").unwrap();
            path
        }

        fn install_sevenzip(&self) {
            fs::create_dir_all(self.layout.bin()).unwrap();
            fs::write(self.tools.sevenzip.path_in(&self.layout), "").unwrap();
        }
    }

    fn args(command: &Command) -> Vec<String> {
        command
            .get_args()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_plan_commands_per_format() {
        let fx = Fixture::new();
        let dispatcher = fx.dispatcher();
        let archive = Path::new("/a/x");
        let out = Path::new("/o");

        let Plan::Tool(tar) =
            dispatcher.plan(ArchiveFormat::Tar(Compression::Lzma), archive, out, true)
        else {
            panic!("tar must use the external tool");
        };
        assert_eq!(tar.get_program(), fx.layout.bin().join("bsdtar"));
        assert_eq!(args(&tar), ["-xf", "/a/x"]);
        assert_eq!(tar.get_current_dir(), Some(fx.layout.stage()));

        let Plan::Tool(sfx) = dispatcher.plan(ArchiveFormat::SelfExtracting, archive, out, false)
        else {
            panic!("sfx must use the external tool");
        };
        assert_eq!(sfx.get_program(), fx.layout.bin().join("7za"));
        assert_eq!(args(&sfx), ["x", "-t7z", "-sfx", "-o/o", "/a/x"]);

        assert_eq!(
            dispatcher.plan(ArchiveFormat::Zip, archive, out, false),
            Plan::Native
        );
        let Plan::Tool(zip) = dispatcher.plan(ArchiveFormat::Zip, archive, out, true) else {
            panic!("resident 7-Zip must handle zip");
        };
        assert_eq!(args(&zip), ["x", "-o/o", "/a/x"]);
    }

    #[test]
    fn test_unsupported_format_touches_nothing() {
        let fx = Fixture::new();
        fx.archive("foo.rar");
        let mut shell = fx.shell(0);

        let err = fx
            .dispatcher()
            .extract(&Package::new("https://example.org/foo.rar").with_target("foo"), &mut shell)
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedFormat { ref file } if file == "foo.rar"));
        assert!(!fx.layout.stage().exists());
        assert!(shell.runner().calls.is_empty());
    }

    #[test]
    fn test_missing_archive_creates_nothing() {
        let fx = Fixture::new();
        let mut shell = fx.shell(0);

        let err = fx
            .dispatcher()
            .extract(&Package::new("https://example.org/ruby.7z").with_target("ruby"), &mut shell)
            .unwrap_err();

        assert!(matches!(err, Error::MissingArchive { .. }));
        assert!(!fx.layout.stage().exists());
    }

    #[test]
    fn test_seven_zip_replaces_previous_target() {
        let fx = Fixture::new();
        let archive = fx.archive("ruby-1.9.3.7z");
        let target = fx.layout.stage().join("ruby");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.txt"), "old").unwrap();
        let mut shell = fx.shell(0);

        let result = fx
            .dispatcher()
            .extract(
                &Package::new("https://example.org/ruby-1.9.3.7z").with_target("ruby"),
                &mut shell,
            )
            .unwrap();

        let Extracted::External(command) = result else {
            panic!("7z archives use the external tool");
        };
        let partial = fx.layout.stage().join(".ruby.partial");
        assert_eq!(
            args(&command),
            [
                "x".to_owned(),
                "-t7z".to_owned(),
                format!("-o{}", partial.display()),
                archive.display().to_string(),
            ]
        );
        assert!(!target.join("stale.txt").exists());
        assert_eq!(fs::read_to_string(target.join("payload.txt")).unwrap(), "new");
        assert!(!partial.exists());
    }

    #[test]
    fn test_failed_tool_keeps_previous_target() {
        let fx = Fixture::new();
        fx.archive("devkit-sfx.exe");
        let target = fx.layout.stage().join("devkit");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.txt"), "old").unwrap();
        let mut shell = fx.shell(2);

        let err = fx
            .dispatcher()
            .extract(
                &Package::new("https://example.org/devkit-sfx.exe").with_target("devkit"),
                &mut shell,
            )
            .unwrap_err();

        assert!(matches!(err, Error::ExternalTool { .. }));
        assert!(target.join("stale.txt").exists());
        assert!(!target.join("payload.txt").exists());
        assert!(!fx.layout.stage().join(".devkit.partial").exists());
    }

    #[test]
    fn test_no_target_extracts_into_stage_root() {
        let fx = Fixture::new();
        fx.archive("gems.7z");
        fs::create_dir_all(fx.layout.stage()).unwrap();
        fs::write(fx.layout.stage().join("keep.txt"), "").unwrap();
        let mut shell = fx.shell(0);

        fx.dispatcher()
            .extract(&Package::new("https://example.org/gems.7z"), &mut shell)
            .unwrap();

        assert!(fx.layout.stage().join("keep.txt").exists());
        assert!(fx.layout.stage().join("payload.txt").exists());
    }

    #[test]
    fn test_tar_runs_in_stage_root_after_clearing_target() {
        let fx = Fixture::new();
        let archive = fx.archive("zlib-1.2.7.tar.gz");
        let target = fx.layout.stage().join("zlib");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.txt"), "old").unwrap();
        let mut shell = fx.shell(0);

        let result = fx
            .dispatcher()
            .extract(
                &Package::new("https://example.org/zlib-1.2.7.tar.gz").with_target("zlib"),
                &mut shell,
            )
            .unwrap();

        let Extracted::External(command) = result else {
            panic!("tarballs use the external tool");
        };
        assert_eq!(command.get_current_dir(), Some(fx.layout.stage()));
        assert_eq!(args(&command), ["-xf".to_owned(), archive.display().to_string()]);
        assert!(!target.exists());
        assert!(fx.layout.stage().join("payload.txt").exists());
    }

    #[test]
    fn test_zip_without_sevenzip_uses_native_reader() {
        let fx = Fixture::new();
        let path = fx.layout.archive_path("tools.zip");
        let mut writer = zip::ZipWriter::new(fs::File::create(&path).unwrap());
        writer.start_file("patch.exe", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"MZ").unwrap();
        writer.finish().unwrap();
        let mut shell = fx.shell(0);

        let result = fx
            .dispatcher()
            .extract(&Package::new("https://example.org/tools.zip"), &mut shell)
            .unwrap();

        assert_eq!(result.entries(), Some(&["patch.exe".to_owned()][..]));
        assert!(fx.layout.bin().join("patch.exe").is_file());
        assert!(shell.runner().calls.is_empty());
    }

    #[test]
    fn test_zip_with_resident_sevenzip_uses_tool() {
        let fx = Fixture::new();
        fx.archive("tools.zip");
        fx.install_sevenzip();
        let mut shell = fx.shell(0);

        let result = fx
            .dispatcher()
            .extract(
                &Package::new("https://example.org/tools.zip").with_target("tools"),
                &mut shell,
            )
            .unwrap();

        assert!(matches!(result, Extracted::External(_)));
        assert_eq!(shell.runner().calls.len(), 1);
        assert!(fx.layout.stage().join("tools/payload.txt").is_file());
    }

    #[test]
    fn test_invalid_target_is_rejected_before_mutation() {
        let fx = Fixture::new();
        fx.archive("ruby.7z");
        let mut shell = fx.shell(0);

        let err = fx
            .dispatcher()
            .extract(&Package::new("ruby.7z").with_target("../ruby"), &mut shell)
            .unwrap_err();

        assert!(matches!(err, Error::InvalidTarget { .. }));
        assert!(!fx.layout.stage().exists());
    }

    #[test]
    fn test_bin_target_keeps_helper_tools() {
        let fx = Fixture::new();
        fx.archive("extras.7z");
        fx.install_sevenzip();
        let mut shell = fx.shell(0);

        let err = fx
            .dispatcher()
            .extract(&Package::new("extras.7z").with_target("bin"), &mut shell)
            .unwrap_err();

        assert!(matches!(err, Error::ReservedTarget { .. }));
        assert!(fx.tools.sevenzip.path_in(&fx.layout).is_file());
        assert!(shell.runner().calls.is_empty());
    }

    #[test]
    fn test_bad_pattern_fails_for_tool_formats_too() {
        let fx = Fixture::new();
        fx.archive("ruby.7z");
        let mut shell = fx.shell(0);

        let err = fx
            .dispatcher()
            .extract(
                &Package::new("ruby.7z").with_target("ruby").with_regex("("),
                &mut shell,
            )
            .unwrap_err();

        assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "("));
        assert!(!fx.layout.stage().exists());
        assert!(shell.runner().calls.is_empty());
    }
}
