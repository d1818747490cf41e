use std::time::Duration;

use chrono::Local;
use clap::Parser;
use review_scrap::{
    info_time, AppStoreJson, AppStoreXml, Error, Harvester, HttpFetcher, PlayStore, Result,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, IosFormat, ANDROID_SUFFIX, IOS_SUFFIX};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over -v/-q.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (android, ios) = (args.android_id(), args.ios_id());
    if android.is_none() && ios.is_none() {
        return Err(Error::Config(
            "nothing to scrape, pass --android and/or --ios".into(),
        ));
    }

    let start_time = Local::now();
    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(args.timeout))?;

    if let Some(id) = android {
        info_time!("Starting scraping for Android ({id})");
        let config = args.harvest_config(ANDROID_SUFFIX);
        Harvester::new(PlayStore::new()?, fetcher.clone())
            .harvest(id, &config)
            .await?;
    }

    if let Some(id) = ios {
        info_time!("Starting scraping for iOS ({id})");
        let config = args.harvest_config(IOS_SUFFIX);
        match args.ios_format {
            IosFormat::Xml => {
                Harvester::new(AppStoreXml::new(&args.country), fetcher.clone())
                    .harvest(id, &config)
                    .await?;
            }
            IosFormat::Json => {
                Harvester::new(AppStoreJson::new(), fetcher.clone())
                    .harvest(id, &config)
                    .await?;
            }
        }
    }

    info_time!(start_time, "Full program time:");
    Ok(())
}
