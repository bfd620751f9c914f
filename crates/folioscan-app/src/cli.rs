// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line flags and how they override the config file.

use std::path::PathBuf;

use clap::Parser;
use folioscan_core::config::ScanConfig;
use folioscan_core::error::Result;

/// Scan a book from the online reader into a black-and-white PDF.
#[derive(Debug, Parser)]
#[command(name = "folioscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Reader URL of the book, e.g. https://weread.qq.com/web/reader/<id>
    #[arg(value_name = "URL")]
    pub url: String,

    /// TOML config file; flags below override its values
    #[arg(short, long, value_name = "FILE", env = "FOLIOSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the PDF is written to
    #[arg(short, long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,

    /// Binarization level, 0-255; brighter pixels turn white
    #[arg(short, long, value_name = "N")]
    pub threshold: Option<u8>,

    /// Pick the binarization level per page from its histogram
    #[arg(long, conflicts_with = "threshold")]
    pub otsu: bool,

    /// PDF image quality, 0-100 (100 is lossless)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub quality: Option<u8>,

    /// Reader font size level, 1 (smallest) to 7 (largest)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=7))]
    pub font_size: Option<u8>,

    /// Log in by scanning a QR code before the scan starts
    #[arg(long)]
    pub login: bool,

    /// Keep staged captures and write a manifest next to them
    #[arg(long)]
    pub debug: bool,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Attach to a browser already running with this remote-debugging port
    #[arg(long, value_name = "PORT")]
    pub debug_port: Option<u16>,

    /// Open the PDF when done
    #[arg(long)]
    pub open: bool,
}

impl Cli {
    /// Load the config file (or defaults) and apply flag overrides.
    pub fn resolve_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)?,
            None => ScanConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut ScanConfig) {
        if let Some(dir) = &self.save_dir {
            config.save_dir = dir.clone();
        }
        if let Some(threshold) = self.threshold {
            config.binary_threshold = threshold;
            config.otsu = false;
        }
        if self.otsu {
            config.otsu = true;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(level) = self.font_size {
            config.font_size_index = level;
        }
        if self.login {
            config.require_login = true;
        }
        if self.debug {
            config.keep_staging = true;
        }
        if self.headful {
            config.browser.headless = false;
        }
        if let Some(port) = self.debug_port {
            config.browser.debug_port = Some(port);
        }
        if self.open {
            config.open_output = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const URL: &str = "https://weread.qq.com/web/reader/abc";

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_url_uses_defaults() {
        let cli = Cli::try_parse_from(["folioscan", URL]).expect("parse");
        let config = cli.resolve_config().expect("config");
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "folioscan",
            URL,
            "--save-dir",
            "/tmp/books",
            "--threshold",
            "180",
            "--quality",
            "85",
            "--font-size",
            "4",
            "--login",
            "--debug",
            "--headful",
            "--debug-port",
            "9222",
            "--open",
        ])
        .expect("parse");
        let config = cli.resolve_config().expect("config");

        assert_eq!(config.save_dir, PathBuf::from("/tmp/books"));
        assert_eq!(config.binary_threshold, 180);
        assert_eq!(config.quality, 85);
        assert_eq!(config.font_size_index, 4);
        assert!(config.require_login);
        assert!(config.keep_staging);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.debug_port, Some(9222));
        assert!(config.open_output);
    }

    #[test]
    fn out_of_range_values_are_rejected_by_clap() {
        assert!(Cli::try_parse_from(["folioscan", URL, "--quality", "101"]).is_err());
        assert!(Cli::try_parse_from(["folioscan", URL, "--font-size", "0"]).is_err());
        assert!(Cli::try_parse_from(["folioscan", URL, "--threshold", "300"]).is_err());
    }

    #[test]
    fn otsu_conflicts_with_threshold() {
        assert!(Cli::try_parse_from(["folioscan", URL, "--otsu", "--threshold", "100"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("folioscan.toml");
        std::fs::write(&path, "quality = 70\nbinary_threshold = 150\n").expect("write");

        let cli = Cli::try_parse_from([
            "folioscan",
            URL,
            "--config",
            path.to_str().expect("utf8 path"),
            "--quality",
            "90",
        ])
        .expect("parse");
        let config = cli.resolve_config().expect("config");

        assert_eq!(config.quality, 90);
        assert_eq!(config.binary_threshold, 150);
    }
}
