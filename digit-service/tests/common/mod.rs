#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine};
use digit_service::classifier::{DigitClassifier, MockClassifier};
use digit_service::config::{
    DigitConfig, FrontendConfig, LimitsConfig, ModelConfig, ObservabilityConfig,
};
use digit_service::startup::Application;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use service_core::config::Config as CoreConfig;
use std::io::Cursor;
use std::sync::Arc;

pub const MAX_REQUEST_BYTES: usize = 256 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 1024;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

/// Configuration for a test instance on a random port.
pub fn test_config() -> DigitConfig {
    DigitConfig {
        common: CoreConfig { port: 0 },
        model: ModelConfig {
            path: "target/test-models/unused.mpk".to_string(),
        },
        limits: LimitsConfig {
            max_request_bytes: MAX_REQUEST_BYTES,
            max_image_dimension: MAX_IMAGE_DIMENSION,
            reject_blank_images: true,
        },
        frontend: FrontendConfig {
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string(),
        },
        observability: ObservabilityConfig {
            log_level: "info".to_string(),
            otlp_endpoint: None,
        },
    }
}

impl TestApp {
    /// Spawn with a mock that always answers 7.
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(MockClassifier::new(7, 0.9))).await
    }

    pub async fn spawn_with(classifier: Arc<dyn DigitClassifier>) -> Self {
        let app = Application::build_with_classifier(test_config(), classifier)
            .await
            .expect("Failed to build test application");
        Self::start(app).await
    }

    pub async fn spawn_from_config(config: DigitConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        Self::start(app).await
    }

    async fn start(app: Application) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_predict(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/predict", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// A "7" in black ink on a white canvas, the way the browser page draws it.
pub fn drawn_seven(size: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));
    let stroke = (size / 14).max(1);
    let (left, right, top, bottom) = (size / 4, size * 3 / 4, size / 5, size * 4 / 5);

    for x in left..right {
        for dy in 0..stroke {
            img.put_pixel(x, top + dy, Rgba([0, 0, 0, 255]));
        }
    }
    // Diagonal from the top-right corner down to the bottom centre.
    for y in top..bottom {
        let t = (y - top) as f32 / (bottom - top) as f32;
        let x = right as f32 - t * (right - size / 2) as f32;
        for dx in 0..stroke {
            let px = (x as u32 + dx).min(size - 1);
            img.put_pixel(px, y, Rgba([0, 0, 0, 255]));
        }
    }
    img
}

pub fn blank_canvas(size: u32) -> RgbaImage {
    RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]))
}

pub fn png_base64(img: RgbaImage) -> String {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG");
    STANDARD.encode(out.into_inner())
}

pub fn data_url(img: RgbaImage) -> String {
    format!("data:image/png;base64,{}", png_base64(img))
}
