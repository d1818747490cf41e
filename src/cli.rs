use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use review_scrap::{HarvestConfig, DEFAULT_COUNTRY, DEFAULT_OUTPUT, DEFAULT_PAGES};

pub const ANDROID_SUFFIX: &str = "android";
pub const IOS_SUFFIX: &str = "ios";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IosFormat {
    Xml,
    Json,
}

/// Scrape app reviews from the Play Store and the App Store into CSV files.
#[derive(Parser, Debug)]
#[command(name = "review-scrap")]
#[command(author, version, about)]
pub struct Args {
    /// The number of pages you want to scrape
    #[arg(short, long, default_value_t = DEFAULT_PAGES as u32, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// The output file where you want to dump results, suffixed per platform
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// The Google Play Store App ID of the app you want to scrape reviews
    #[arg(long, value_name = "PACKAGE_ID")]
    pub android: Option<String>,

    /// The App Store App ID of the app you want to scrape reviews
    #[arg(long, value_name = "APP_ID")]
    pub ios: Option<String>,

    /// The country code where App Store reviews will be scraped (XML feed only)
    #[arg(short, long, default_value = DEFAULT_COUNTRY)]
    pub country: String,

    /// Which App Store feed to read
    #[arg(long, value_enum, default_value_t = IosFormat::Xml)]
    pub ios_format: IosFormat,

    /// Maximum page requests in flight (1 fetches one page at a time)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub prefetch: u8,

    /// Request timeout in seconds
    #[arg(long, default_value_t = review_scrap::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn android_id(&self) -> Option<&str> {
        non_empty(self.android.as_deref())
    }

    pub fn ios_id(&self) -> Option<&str> {
        non_empty(self.ios.as_deref())
    }

    pub fn harvest_config(&self, suffix: &str) -> HarvestConfig {
        HarvestConfig::new(platform_output_path(&self.output, suffix), self.pages as usize)
            .with_prefetch(self.prefetch as usize)
    }

    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn non_empty(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| !id.is_empty())
}

/// `output.csv` + `android` -> `output_android.csv`.
pub fn platform_output_path(base: &Path, suffix: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    base.with_file_name(name)
}
