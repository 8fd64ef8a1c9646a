//! Finding sample files on disk and rewriting the paths stored in the tree.
//!
//! Both passes work on a copy of the tree and only replace the original once
//! every path has been handled.

use std::env;
use std::path::{Path, PathBuf};

use presetbridge_sfz::path_utils::{normalize_directory_name, normalize_path, relative_path};

use crate::error::{Error, Result};
use crate::model::Instrument;

/// Name of the shared sample folder next to an instrument.
pub const SAMPLES_DIR: &str = "Samples";

/// How [`rewrite_paths`] expresses sample locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMode {
    /// Relative to this directory (usually the output preset's folder).
    RelativeTo(PathBuf),
    /// `<dir>/<file name>`, for libraries that will be reorganized.
    Directory(String),
}

/// Resolve every stored path to an existing absolute file.
///
/// Candidates, first match wins:
/// 1. the path itself, relative to the working directory
/// 2. `<search_root>/<set_name>/<path>`
/// 3. `<search_root>/Samples/<path>`
pub fn locate_samples(
    instrument: &mut Instrument,
    search_root: &Path,
    set_name: &str,
) -> Result<()> {
    let cwd = env::current_dir().map_err(|e| Error::io(".", e))?;
    let search_root = cwd.join(search_root);

    let mut working = instrument.clone();
    working.try_for_each_node_mut(|props| {
        let Some(path) = props.path.as_deref() else {
            return Ok(());
        };
        match find_sample(path, &cwd, &search_root, set_name) {
            Some(found) => {
                let found = found.to_string_lossy().into_owned();
                if found != path {
                    log::info!("Sample file path changed to {}", found);
                }
                props.path = Some(found);
                Ok(())
            }
            None => {
                log::error!("Could not find sample file {}", path);
                Err(Error::SampleNotFound {
                    path: path.to_string(),
                })
            }
        }
    })?;

    *instrument = working;
    Ok(())
}

fn find_sample(path: &str, cwd: &Path, search_root: &Path, set_name: &str) -> Option<PathBuf> {
    let relative = PathBuf::from(normalize_path(path));
    [
        cwd.join(&relative),
        search_root.join(set_name).join(&relative),
        search_root.join(SAMPLES_DIR).join(&relative),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

/// Rewrite every stored path according to `mode`. Paths must already point at
/// existing files (see [`locate_samples`]).
pub fn rewrite_paths(instrument: &mut Instrument, mode: &PathMode) -> Result<()> {
    let cwd = env::current_dir().map_err(|e| Error::io(".", e))?;

    let mut working = instrument.clone();
    working.try_for_each_node_mut(|props| {
        let Some(path) = props.path.as_deref() else {
            return Ok(());
        };
        let file = cwd.join(path);
        if !file.is_file() {
            log::error!("Sample file {} no longer exists", file.display());
            return Err(Error::SampleMissing { path: file });
        }

        let rewritten = match mode {
            PathMode::RelativeTo(base) => {
                let base = cwd.join(base);
                relative_path(&base, &file).unwrap_or_else(|| {
                    log::warn!(
                        "{} has no path relative to {}, keeping it absolute",
                        file.display(),
                        base.display()
                    );
                    file.to_string_lossy().into_owned()
                })
            }
            PathMode::Directory(dir) => {
                let file_name = file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let dir = normalize_directory_name(dir);
                if dir.is_empty() {
                    file_name
                } else {
                    format!("{}/{}", dir, file_name)
                }
            }
        };

        log::info!("Sample file path changed to {}", rewritten);
        props.path = Some(rewritten);
        Ok(())
    })?;

    *instrument = working;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Group, Properties, Region};
    use std::fs;

    fn with_paths(paths: &[&str]) -> Instrument {
        let mut instrument = Instrument::new();
        instrument.groups.push(Group {
            props: Properties::default(),
            regions: paths
                .iter()
                .map(|p| Region {
                    props: Properties {
                        path: Some(p.to_string()),
                        ..Default::default()
                    },
                })
                .collect(),
        });
        instrument
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"RIFF").unwrap();
    }

    fn region_path(instrument: &Instrument, index: usize) -> &str {
        instrument.groups[0].regions[index].props.path.as_deref().unwrap()
    }

    #[test]
    fn test_locate_search_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("Strings/violin.wav"));
        touch(&root.join("Samples/cello.wav"));
        // present in both: the set folder wins
        touch(&root.join("Strings/both.wav"));
        touch(&root.join("Samples/both.wav"));
        let absolute = root.join("abs.wav");
        touch(&absolute);

        let absolute = absolute.to_str().unwrap();
        let mut instrument = with_paths(&["violin.wav", "cello.wav", "both.wav", absolute]);
        locate_samples(&mut instrument, root, "Strings").unwrap();

        assert_eq!(Path::new(region_path(&instrument, 0)), root.join("Strings/violin.wav"));
        assert_eq!(Path::new(region_path(&instrument, 1)), root.join("Samples/cello.wav"));
        assert_eq!(Path::new(region_path(&instrument, 2)), root.join("Strings/both.wav"));
        assert_eq!(Path::new(region_path(&instrument, 3)), absolute);
    }

    #[test]
    fn test_locate_failure_leaves_tree_untouched() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Samples/found.wav"));

        let mut instrument = with_paths(&["found.wav", "missing.wav"]);
        let original = instrument.clone();
        let err = locate_samples(&mut instrument, dir.path(), "Set").unwrap_err();

        assert!(matches!(err, Error::SampleNotFound { ref path } if path == "missing.wav"));
        assert_eq!(instrument, original);
    }

    #[test]
    fn test_locate_checks_group_and_global_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut instrument = Instrument::new();
        instrument.global.path = Some("global.wav".to_string());
        assert!(locate_samples(&mut instrument, dir.path(), "Set").is_err());
    }

    #[test]
    fn test_rewrite_relative() {
        let dir = tempfile::tempdir().unwrap();
        let sample = dir.path().join("Samples/Piano/C4.wav");
        touch(&sample);

        let mut instrument = with_paths(&[sample.to_str().unwrap()]);
        let presets = dir.path().join("Presets");
        rewrite_paths(&mut instrument, &PathMode::RelativeTo(presets)).unwrap();
        assert_eq!(region_path(&instrument, 0), "../Samples/Piano/C4.wav");

        let mut instrument = with_paths(&[sample.to_str().unwrap()]);
        rewrite_paths(&mut instrument, &PathMode::RelativeTo(dir.path().to_path_buf())).unwrap();
        assert_eq!(region_path(&instrument, 0), "Samples/Piano/C4.wav");
    }

    #[test]
    fn test_rewrite_relative_to_base_with_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        let sample = dir.path().join("work/lib/C4.wav");
        touch(&sample);

        let mut instrument = with_paths(&[sample.to_str().unwrap()]);
        let presets = dir.path().join("work").join("..").join("presets");
        rewrite_paths(&mut instrument, &PathMode::RelativeTo(presets.clone())).unwrap();

        let rewritten = region_path(&instrument, 0);
        assert_eq!(rewritten, "../work/lib/C4.wav");
        fs::create_dir_all(&presets).unwrap();
        assert!(presets.join(rewritten).is_file());
    }

    #[test]
    fn test_rewrite_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sample = dir.path().join("deep/nested/C4.wav");
        touch(&sample);

        let mut instrument = with_paths(&[sample.to_str().unwrap()]);
        let mode = PathMode::Directory("/Samples/Piano/".to_string());
        rewrite_paths(&mut instrument, &mode).unwrap();
        assert_eq!(region_path(&instrument, 0), "Samples/Piano/C4.wav");
    }

    #[test]
    fn test_rewrite_fails_when_file_vanished() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone.wav");
        let mut instrument = with_paths(&[gone.to_str().unwrap()]);
        let mode = PathMode::Directory("x".to_string());
        let err = rewrite_paths(&mut instrument, &mode).unwrap_err();
        assert!(matches!(err, Error::SampleMissing { .. }));
        assert_eq!(region_path(&instrument, 0), gone.to_str().unwrap());
    }
}
