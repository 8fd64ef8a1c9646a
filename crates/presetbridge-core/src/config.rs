//! Conversion settings
//!
//! Settings are stored in TOML format, either in a file passed with `--config`
//! or at the default location:
//! - Linux: `~/.config/presetbridge/config.toml`
//! - macOS: `~/Library/Application Support/presetbridge/config.toml`
//! - Windows: `%APPDATA%\presetbridge\config.toml`
//!
//! Command line flags override whatever the file says.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::materialize::{MaterializeMode, SUPPORTED_BIT_DEPTHS};
use crate::paths::PathMode;

/// What happens to the sample files of a converted instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleHandling {
    /// Leave files where they are and only rewrite paths
    #[default]
    Reference,
    /// Copy files into the output sample folder
    Copy,
    /// Render trims and loop crossfades into new files
    Bake,
}

impl SampleHandling {
    pub fn materialize_mode(self) -> Option<MaterializeMode> {
        match self {
            SampleHandling::Reference => None,
            SampleHandling::Copy => Some(MaterializeMode::Copy),
            SampleHandling::Bake => Some(MaterializeMode::Bake),
        }
    }
}

/// How referenced (not materialized) sample paths are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    /// Relative to the output file
    #[default]
    Relative,
    /// `<sample set name>/<file name>`
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Sample folder name; defaults to the input file stem
    pub sample_set_name: Option<String>,
    pub samples: SampleHandling,
    /// 16, 24 or 32; anything else keeps the source depth
    pub bit_depth: Option<u16>,
    pub path_style: PathStyle,
    /// Attach the default effects and knob panel to EXS imports
    pub generic_ui: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            sample_set_name: None,
            samples: SampleHandling::Reference,
            bit_depth: None,
            path_style: PathStyle::Relative,
            generic_ui: true,
        }
    }
}

impl ConvertConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the file at the default location, or defaults if there is none.
    pub fn load_or_default() -> Result<Self> {
        match Self::config_path() {
            Ok(path) if path.exists() => {
                log::debug!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "presetbridge")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// The bit depth override, if it is one the writer supports.
    pub fn effective_bit_depth(&self) -> Option<u16> {
        match self.bit_depth {
            Some(bits) if SUPPORTED_BIT_DEPTHS.contains(&bits) => Some(bits),
            Some(bits) => {
                log::warn!(
                    "Bit depth {} is not supported (use 16, 24 or 32), keeping source bit depth",
                    bits
                );
                None
            }
            None => None,
        }
    }

    /// Sample set name, falling back to `fallback` (usually the input stem).
    pub fn set_name(&self, fallback: &str) -> String {
        self.sample_set_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Path mode for referenced samples written next to `output_dir`.
    pub fn path_mode(&self, output_dir: &Path, set_name: &str) -> PathMode {
        match self.path_style {
            PathStyle::Relative => PathMode::RelativeTo(output_dir.to_path_buf()),
            PathStyle::Directory => PathMode::Directory(set_name.to_string()),
        }
    }

    /// Write a commented default configuration file.
    pub fn create_default_config_file(path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = r#"# presetbridge configuration file

# Name of the sample folder; defaults to the input file name
# sample_set_name = "Grand Piano"

# "reference" keeps sample files in place, "copy" copies them next to the
# output, "bake" renders trims and loop crossfades into new files
samples = "reference"

# Output bit depth for baked files (16, 24 or 32)
# bit_depth = 24

# "relative" or "directory" (<sample_set_name>/<file>) for referenced samples
path_style = "relative"

# Add the default effects and knob panel to EXS conversions
generic_ui = true
"#;

        fs::write(path, content).map_err(|e| Error::io(path, e))?;
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ConvertConfig::from_toml_str("").unwrap();
        assert_eq!(config, ConvertConfig::default());
        assert!(config.generic_ui);
    }

    #[test]
    fn test_parse_settings() {
        let config = ConvertConfig::from_toml_str(
            "sample_set_name = \"Piano\"\nsamples = \"bake\"\nbit_depth = 24\n\
             path_style = \"directory\"\ngeneric_ui = false",
        )
        .unwrap();
        assert_eq!(config.set_name("fallback"), "Piano");
        assert_eq!(config.samples.materialize_mode(), Some(MaterializeMode::Bake));
        assert_eq!(config.effective_bit_depth(), Some(24));
        assert_eq!(
            config.path_mode(Path::new("/out"), "Piano"),
            PathMode::Directory("Piano".to_string())
        );
        assert!(!config.generic_ui);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ConvertConfig::from_toml_str("samples = \"shred\"").is_err());

        let config = ConvertConfig {
            bit_depth: Some(20),
            ..Default::default()
        };
        assert_eq!(config.effective_bit_depth(), None);
    }

    #[test]
    fn test_default_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/presetbridge.toml");
        ConvertConfig::create_default_config_file(&path).unwrap();
        let config = ConvertConfig::load(&path).unwrap();
        assert_eq!(config, ConvertConfig::default());
    }
}
