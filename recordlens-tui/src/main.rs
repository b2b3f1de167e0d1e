//! Terminal viewer for huge record collections.

mod app;
mod sink;
mod ui;

use std::fs::File;

use simplelog::{Config, LevelFilter, WriteLogger};

use crate::app::App;

#[tokio::main]
async fn main() {
    let log_file = File::create("recordlens-tui.log").expect("Failed to create log file");
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .expect("Failed to initialize logger");

    let base_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("RECORDLENS_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:5839".to_string());

    if let Err(e) = App::new(base_url).run().await {
        eprintln!("Error: {e}");
    }
}
