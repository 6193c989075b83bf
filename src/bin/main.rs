use clap::Parser;
use color_eyre::Result;
use gallpost::app::App;
use gallpost::config::Config;
use gallpost::utils::{get_config_dir, initialize_panic_handler};
use std::path::PathBuf;
use std::{env, fs};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
/// Post text, images and videos to gallery boards through a browser session.
struct Args {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Gallery list to load on startup, one gallery name per line.
    #[arg(short = 'g', long)]
    destinations: Option<PathBuf>,
    /// Run the browser without a window.
    #[arg(long)]
    headless: bool,
    /// Development mode
    #[arg(short, long)]
    dev: bool,
}

impl Args {
    fn config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config {
            Ok(path.clone())
        } else {
            Self::default_config_path()
        }
    }
    fn default_config_path() -> Result<PathBuf> {
        let config_dir = get_config_dir()?;
        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("gallpost.config.toml"))
    }
}

fn init_logger() {
    let mut builder = env_logger::Builder::from_default_env();
    if env::var("RUST_LOG").is_err() {
        builder.filter_level(log::LevelFilter::Off);
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config_path()?;
    let mut config: Config = if config_path.exists() {
        toml::from_str(&fs::read_to_string(&config_path)?)?
    } else {
        Config::default()
    };
    config.set_default_keybindings();
    config.browser.headless |= args.headless;
    config.dev |= args.dev;

    init_logger();

    initialize_panic_handler()?;

    App::new(config)
        .with_destinations(args.destinations)
        .run()
        .await
}
