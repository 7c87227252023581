// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use anpr_detect_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    version,
    vision::YoloOnnxDetector,
};
use clap::Parser;
use std::{env, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = NodeConfig::parse();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        let filter = if config.debug {
            "anpr_detect_node=debug,tower_http=debug,info"
        } else {
            "info"
        };
        env::set_var("RUST_LOG", filter);
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting {}...\n", version::get_version_string());
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    config.validate().context("Invalid configuration")?;

    println!("🧠 Loading detection model...");
    let detector = YoloOnnxDetector::new(&config.model_path, config.intra_threads)
        .context("Failed to load detection model")?;
    println!("✅ Detection model loaded");

    let params = config.predict_params();
    info!(
        "Inference settings: input {}px, confidence {}, iou {}, max {} boxes, quantized {}",
        params.image_size,
        params.confidence_threshold,
        params.iou_threshold,
        params.max_detections,
        params.quantized
    );

    let state = AppState::new(Arc::new(detector), params);

    println!("🌐 Serving on http://{}:{}", config.host, config.port);
    start_server(&config, state).await?;

    println!("👋 Detection node stopped");
    Ok(())
}
