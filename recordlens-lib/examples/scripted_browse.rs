//! Browsing demo against an in-memory source with artificial latency.
//!
//! Run with: cargo run --example scripted_browse

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use recordlens_lib::cache::page_bounds;
use recordlens_lib::error::{
    ImageFetchError, LoadError, MetadataFetchError, PageFetchError,
};
use recordlens_lib::model::{CollectionSummary, ImageData, Record, RecordMetadata};
use recordlens_lib::scrollbar::ThumbMetrics;
use recordlens_lib::sink::{
    ImagePanel, MetadataPanel, RenderSink, StatusLevel, WindowSnapshot,
};
use recordlens_lib::source::RecordSource;
use recordlens_lib::{ViewerConfig, ViewerSession};
use tokio::time::{Duration, sleep};

struct DemoSource {
    total: usize,
}

#[async_trait]
impl RecordSource for DemoSource {
    async fn load_collection(&self, _path: &str) -> Result<CollectionSummary, LoadError> {
        sleep(Duration::from_millis(80)).await;
        Ok(CollectionSummary::new(self.total, 12)
            .with_columns(vec!["uuid".to_string(), "filepath".to_string()]))
    }

    async fn fetch_record_page(&self, page: usize) -> Result<Vec<Record>, PageFetchError> {
        sleep(Duration::from_millis(30)).await;
        Ok(page_bounds(page)
            .filter(|index| *index < self.total)
            .map(|index| {
                Record::new(
                    format!("{index:08x}-demo"),
                    format!("/data/part-{:04}", index / 500),
                )
                .with_field("index", index)
            })
            .collect())
    }

    async fn fetch_image(&self, key: &str, _location: &str) -> Result<ImageData, ImageFetchError> {
        sleep(Duration::from_millis(50)).await;
        Ok(ImageData::new(STANDARD.encode(format!("image bytes for {key}")), 42.5))
    }

    async fn fetch_metadata(
        &self,
        key: &str,
        location: &str,
    ) -> Result<RecordMetadata, MetadataFetchError> {
        sleep(Duration::from_millis(50)).await;
        Ok(RecordMetadata::default()
            .with_field("uuid", key)
            .with_field("filepath", location)
            .with_field("width", 640)
            .with_field("height", 480))
    }
}

struct StdoutSink {
    last_window: Mutex<Option<WindowSnapshot>>,
}

impl RenderSink for StdoutSink {
    fn render_visible_window(&self, window: WindowSnapshot) {
        if window.is_empty() {
            println!("window: (empty collection)");
        } else if !window.has_data() {
            println!("window {}..={}: loading...", window.start, window.end().expect("non-empty"));
        } else {
            println!(
                "window {}..={} of {}:",
                window.start,
                window.end().expect("non-empty"),
                window.total_records
            );
            for (index, slot) in window.entries() {
                let marker = match (slot, &window.selected_key) {
                    (Some(record), Some(selected)) if record.key() == selected => " *",
                    _ => "",
                };
                match slot {
                    Some(record) => println!("  {index:>6}  {}{marker}", record.key()),
                    None => println!("  {index:>6}  ..."),
                }
            }
        }
        *self.last_window.lock().expect("sink lock") = Some(window);
    }

    fn render_scroll_thumb(&self, thumb: ThumbMetrics) {
        println!("thumb: top {:.1}px, height {:.1}px", thumb.top_px, thumb.height_px);
    }

    fn render_image_panel(&self, panel: ImagePanel) {
        match panel {
            ImagePanel::Loading => println!("image: loading..."),
            ImagePanel::Ready { record, image } => println!(
                "image: {} ({} encoded bytes, {:.1} ms)",
                record.key(),
                image.encoded_len(),
                image.fetch_time_ms
            ),
            ImagePanel::Failed(err) => println!("image: {err}"),
        }
    }

    fn render_metadata_panel(&self, panel: MetadataPanel) {
        match panel {
            MetadataPanel::Loading => println!("metadata: loading..."),
            MetadataPanel::Ready(metadata) => {
                println!("metadata:");
                for (field, value) in metadata.iter() {
                    println!("  {field}: {value}");
                }
            }
            MetadataPanel::Failed(err) => println!("metadata: {err}"),
        }
    }

    fn show_status(&self, level: StatusLevel, message: &str) {
        println!("[{level:?}] {message}");
    }

    fn render_stats(&self, summary: &CollectionSummary) {
        println!(
            "stats: {} records across {} locations",
            summary.formatted_total(),
            summary.formatted_locations()
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let source = Arc::new(DemoSource { total: 2000 });
    let sink = Arc::new(StdoutSink {
        last_window: Mutex::new(None),
    });

    let session = ViewerSession::load(
        source,
        sink.clone(),
        ViewerConfig::default(),
        "/demo/records.parquet",
    )
    .await?;

    println!("\n-- wheel down one notch --");
    session.handle_wheel(1.0).await;

    println!("\n-- jump near the middle --");
    session.scroll_to_index(995).await;

    println!("\n-- click three quarters down the track --");
    session.handle_track_click(150.0).await;

    println!("\n-- select the first visible record --");
    let record = sink
        .last_window
        .lock()
        .expect("sink lock")
        .as_ref()
        .and_then(|window| window.slots[0].clone())
        .expect("window should be loaded");
    session.select_record(record).await;

    Ok(())
}
