//! The `convert` and `inspect` commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use presetbridge_core::{
    ConvertConfig, ExsInstrument, MaterializeOptions, PresetConverter, SampleHandling,
};
use presetbridge_sfz::parse_sfz_file;

use crate::ConvertArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Sfz,
    /// Decoded EXS zone/group/sample lists as JSON
    ExsJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    DecentSampler,
    Sfz,
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match extension(path).as_str() {
            "sfz" => Ok(InputFormat::Sfz),
            "json" => Ok(InputFormat::ExsJson),
            other => bail!("Unsupported input format '{}' (expected .sfz or .json)", other),
        }
    }
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match extension(path).as_str() {
            "dspreset" | "xml" => Ok(OutputFormat::DecentSampler),
            "sfz" => Ok(OutputFormat::Sfz),
            other => bail!(
                "Unsupported output format '{}' (expected .dspreset, .xml or .sfz)",
                other
            ),
        }
    }
}

/// Build the effective configuration: config file, then command line flags.
pub fn resolve_config(args: &ConvertArgs) -> Result<ConvertConfig> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConvertConfig::load_or_default().context("Failed to load default config")?,
    };

    if let Some(name) = &args.sample_dir {
        config.sample_set_name = Some(name.clone());
        config.path_style = presetbridge_core::PathStyle::Directory;
    }
    if args.copy_samples {
        config.samples = SampleHandling::Copy;
    }
    if args.bake_samples {
        config.samples = SampleHandling::Bake;
    }
    if let Some(bits) = args.bit_depth {
        config.bit_depth = Some(bits);
    }
    if args.no_generic_ui {
        config.generic_ui = false;
    }
    Ok(config)
}

fn import(converter: &mut PresetConverter, input: &Path, config: &ConvertConfig) -> Result<()> {
    match InputFormat::from_path(input)? {
        InputFormat::Sfz => {
            let sfz = parse_sfz_file(input)
                .with_context(|| format!("Failed to parse {}", input.display()))?;
            converter.import_sfz(&sfz);
        }
        InputFormat::ExsJson => {
            let json = fs::read_to_string(input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let exs = ExsInstrument::from_json(&json)
                .with_context(|| format!("Failed to decode {}", input.display()))?;
            converter.import_exs(&exs, config.generic_ui);
        }
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    Ok(cwd.join(path))
}

pub fn convert(args: ConvertArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let input = absolute(&args.input)?;
    let output = absolute(&args.output)?;

    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }
    let output_format = OutputFormat::from_path(&output)?;

    log::info!("Input:  {}", input.display());
    log::info!("Output: {}", output.display());

    let mut converter = PresetConverter::new();
    import(&mut converter, &input, &config)?;
    log::info!("Imported {}", converter.instrument().info());

    let input_dir = input.parent().unwrap_or(Path::new("."));
    let output_dir = output.parent().unwrap_or(Path::new(".")).to_path_buf();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let set_name = config.set_name(&stem);

    converter
        .locate_samples(input_dir, &set_name)
        .context("Failed to locate sample files")?;
    converter
        .convert_millisecond_crossfades()
        .context("Failed to convert crossfade lengths")?;

    match config.samples.materialize_mode() {
        Some(mode) => {
            let options = MaterializeOptions {
                output_root: output_dir.clone(),
                set_name: set_name.clone(),
                mode,
                bit_depth: config.effective_bit_depth(),
            };
            let report = converter
                .materialize(&options)
                .context("Failed to write sample files")?;
            log::info!("Wrote {} sample files", report.files.len());
        }
        None => {
            let mode = config.path_mode(&output_dir, &set_name);
            converter
                .rewrite_paths(&mode)
                .context("Failed to rewrite sample paths")?;
        }
    }

    let text = match output_format {
        OutputFormat::DecentSampler => converter.to_xml().context("Failed to render preset")?,
        OutputFormat::Sfz => converter.to_sfz(),
    };
    if !output_dir.as_os_str().is_empty() {
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    }
    fs::write(&output, text).with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!("Conversion complete");
    Ok(())
}

/// Print a summary of an input file without converting it.
pub fn inspect(input: &Path, as_sfz: bool) -> Result<()> {
    let mut converter = PresetConverter::new();
    import(&mut converter, input, &ConvertConfig::default())?;

    let instrument = converter.instrument();
    println!("{}: {}", input.display(), instrument.info());
    for (index, group) in instrument.groups.iter().enumerate() {
        let name = group.props.name.as_deref().unwrap_or("(unnamed)");
        println!("  group {}: {} ({} regions)", index, name, group.regions.len());
    }
    if as_sfz {
        println!();
        print!("{}", converter.to_sfz());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &Path, output: &Path) -> ConvertArgs {
        ConvertArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            sample_dir: None,
            config: None,
            copy_samples: false,
            bake_samples: false,
            bit_depth: None,
            no_generic_ui: false,
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(InputFormat::from_path(Path::new("a.SFZ")).unwrap(), InputFormat::Sfz);
        assert_eq!(InputFormat::from_path(Path::new("a.json")).unwrap(), InputFormat::ExsJson);
        assert!(InputFormat::from_path(Path::new("a.exs")).is_err());
        assert_eq!(
            OutputFormat::from_path(Path::new("a.dspreset")).unwrap(),
            OutputFormat::DecentSampler
        );
        assert!(OutputFormat::from_path(Path::new("a.txt")).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "samples = \"copy\"\nbit_depth = 16\n").unwrap();

        let mut args = args(Path::new("in.sfz"), Path::new("out.dspreset"));
        args.config = Some(config_path);
        args.bake_samples = true;
        args.sample_dir = Some("Strings".to_string());

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.samples, SampleHandling::Bake);
        assert_eq!(config.bit_depth, Some(16));
        assert_eq!(config.set_name("in"), "Strings");
        assert_eq!(config.path_style, presetbridge_core::PathStyle::Directory);
    }

    #[test]
    fn test_convert_sfz_to_dspreset() {
        let dir = tempfile::tempdir().unwrap();
        let library = dir.path().join("library");
        fs::create_dir_all(&library).unwrap();
        fs::write(library.join("C4.wav"), b"RIFF").unwrap();
        let input = library.join("piano.sfz");
        fs::write(&input, "<group> ampeg_release=0.3\n<region> sample=C4.wav key=60\n").unwrap();
        let output = dir.path().join("presets/piano.dspreset");

        let mut args = args(&input, &output);
        fs::write(dir.path().join("empty.toml"), "").unwrap();
        args.config = Some(dir.path().join("empty.toml"));
        convert(args).unwrap();

        let preset = fs::read_to_string(&output).unwrap();
        assert!(preset.contains(r#"path="../library/C4.wav""#));
        assert!(preset.contains(r#"release="0.3""#));
    }

    #[test]
    fn test_missing_sample_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("kit.sfz");
        fs::write(&input, "<region> sample=missing.wav\n").unwrap();
        let output = dir.path().join("kit.dspreset");

        let mut args = args(&input, &output);
        fs::write(dir.path().join("empty.toml"), "").unwrap();
        args.config = Some(dir.path().join("empty.toml"));

        assert!(convert(args).is_err());
        assert!(!output.exists());
    }
}
