use std::path::{Component, Path, PathBuf};

/// Use the platform's separator convention for a path read from SFZ text
///
/// SFZ files authored on Windows routinely use backslashes in `sample=`.
/// On Windows they are kept; everywhere else they become forward slashes.
///
/// ```
/// use presetbridge_sfz::path_utils::normalize_path;
///
/// #[cfg(not(windows))]
/// assert_eq!(normalize_path("samples\\piano\\C4.wav"), "samples/piano/C4.wav");
/// ```
pub fn normalize_path(path: &str) -> String {
    if cfg!(windows) {
        path.to_string()
    } else {
        path.replace('\\', "/")
    }
}

/// Combine a `default_path` with a sample path
///
/// An absolute sample path is used as-is; a relative one is appended to the
/// default path. A missing trailing separator on the default path is tolerated.
///
/// ```
/// use presetbridge_sfz::path_utils::combine_sample_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     combine_sample_path("samples/piano", "C4.wav"),
///     PathBuf::from("samples/piano/C4.wav")
/// );
/// ```
pub fn combine_sample_path(default_path: &str, sample_path: &str) -> PathBuf {
    let sample_path = normalize_path(sample_path);
    if Path::new(&sample_path).is_absolute() {
        return PathBuf::from(sample_path);
    }

    let mut combined = normalize_path(default_path);
    if !combined.is_empty() && !combined.ends_with('/') && !combined.ends_with('\\') {
        combined.push('/');
    }
    combined.push_str(&sample_path);
    PathBuf::from(combined)
}

/// Resolve a sample path the way an SFZ player would
///
/// 1. An absolute sample path is returned unchanged.
/// 2. A relative one is joined onto `default_path`, if any.
/// 3. If still relative, it is joined onto the SFZ file's directory, if known.
///
/// The result is only absolute when `sfz_file_path` is (or the sample path
/// already was); checking the file exists is the path resolver's job.
pub fn resolve_absolute_path(
    sample_path: &str,
    default_path: Option<&str>,
    sfz_file_path: Option<&Path>,
) -> PathBuf {
    let path = match default_path {
        Some(default_path) => combine_sample_path(default_path, sample_path),
        None => PathBuf::from(normalize_path(sample_path)),
    };
    if path.is_absolute() {
        return path;
    }

    match sfz_file_path.and_then(Path::parent) {
        Some(sfz_dir) => sfz_dir.join(path),
        None => path,
    }
}

/// Express `target` relative to the directory `base`
///
/// Both paths should be absolute. `.` and `..` components are resolved
/// lexically first, then shared leading components are dropped and every
/// remaining component of `base` becomes a `..`. Returns `None` when the
/// paths share no root (different drives on Windows) or when a relative
/// `base` climbs above its own start. The result always uses forward
/// slashes, as preset files expect.
///
/// ```
/// use presetbridge_sfz::path_utils::relative_path;
/// use std::path::Path;
///
/// let rel = relative_path(Path::new("/lib/presets"), Path::new("/lib/samples/C4.wav"));
/// assert_eq!(rel.as_deref(), Some("../samples/C4.wav"));
///
/// let rel = relative_path(Path::new("/lib/work/../presets"), Path::new("/lib/work/C4.wav"));
/// assert_eq!(rel.as_deref(), Some("../work/C4.wav"));
/// ```
pub fn relative_path(base: &Path, target: &Path) -> Option<String> {
    let base = resolve_dots(base);
    let target = resolve_dots(target);

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let rooted =
        |c: Option<&Component>| matches!(c, Some(Component::RootDir | Component::Prefix(_)));
    if common == 0 && (rooted(base.first()) || rooted(target.first())) {
        return None;
    }
    // a leftover `..` in base names a directory we cannot climb back into
    if base[common..].contains(&Component::ParentDir) {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in &base[common..] {
        parts.push("..".to_string());
    }
    for component in &target[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    Some(parts.join("/"))
}

/// Drop `.` and fold `..` into the preceding component. `..` at a root stays
/// at the root; leading `..` of a relative path are kept.
fn resolve_dots(path: &Path) -> Vec<Component<'_>> {
    let mut resolved: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match resolved.last() {
                Some(Component::Normal(_)) => {
                    resolved.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => resolved.push(component),
            },
            other => resolved.push(other),
        }
    }
    resolved
}

/// Clean a user-supplied sample directory name for use inside a preset:
/// forward slashes only, no leading or trailing separator.
///
/// ```
/// use presetbridge_sfz::path_utils::normalize_directory_name;
///
/// assert_eq!(normalize_directory_name("\\Strings\\Violin\\"), "Strings/Violin");
/// ```
pub fn normalize_directory_name(name: &str) -> String {
    let name = name.replace('\\', "/");
    let name = name.strip_prefix('/').unwrap_or(&name);
    name.strip_suffix('/').unwrap_or(name).to_string()
}
