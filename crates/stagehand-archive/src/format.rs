/// Archive kinds the installer knows how to unpack. Anything else is
/// rejected rather than guessed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar(Compression),
    SevenZip,
    /// Self-extracting 7-Zip executable (`…sfx.exe`).
    SelfExtracting,
    Zip,
}

/// Compression wrapped around a tar stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    /// Unix `compress`, `.tar.Z`.
    Compress,
    Gzip,
    Bzip2,
    Lzma,
}

const TAR_SUFFIXES: [(&str, Compression); 6] = [
    (".tar.Z", Compression::Compress),
    (".tar.z", Compression::Compress),
    (".tar.gz", Compression::Gzip),
    (".tar.bz2", Compression::Bzip2),
    (".tar.lzma", Compression::Lzma),
    (".tgz", Compression::Gzip),
];

/// `name` ends with `suffix` and has at least one character in front of it.
fn has_suffix(name: &str, suffix: &str) -> bool {
    name.len() > suffix.len() && name.ends_with(suffix)
}

impl ArchiveFormat {
    /// Classify an archive by its file name.
    ///
    /// Rules are tried in a fixed order: tar family, `.7z`, `sfx.exe`,
    /// `.zip`. There is no bare `.gz`/`.bz2` rule, so `foo.tar.gz` can only
    /// ever be a tarball.
    pub fn classify(file_name: &str) -> Option<Self> {
        if let Some((_, codec)) = TAR_SUFFIXES
            .iter()
            .find(|(suffix, _)| has_suffix(file_name, suffix))
        {
            return Some(Self::Tar(*codec));
        }
        if has_suffix(file_name, ".7z") {
            return Some(Self::SevenZip);
        }
        if has_suffix(file_name, "sfx.exe") {
            return Some(Self::SelfExtracting);
        }
        if has_suffix(file_name, ".zip") {
            return Some(Self::Zip);
        }
        None
    }

    /// Whether the extracting tool takes an explicit output directory.
    /// The tar tool always unpacks into its working directory.
    pub fn honors_output_dir(self) -> bool {
        !matches!(self, Self::Tar(_))
    }
}
