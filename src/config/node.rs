// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process configuration
//!
//! Every flag can also be supplied through its `DETECT_*` environment
//! variable, and `main` loads a `.env` file before parsing.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::vision::detection::detector::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_INPUT_SIZE, DEFAULT_IOU_THRESHOLD,
    DEFAULT_MAX_DETECTIONS,
};
use crate::vision::PredictParams;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL_PATH: &str = "assets/anpr2_yolov9_int8.onnx";
pub const DEFAULT_INTRA_THREADS: usize = 4;

/// ANPR plate detection node
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "anpr-detect-node")]
#[command(version)]
#[command(about = "HTTP licence plate detection service", long_about = None)]
pub struct NodeConfig {
    /// Address to bind
    #[arg(long, env = "DETECT_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind
    #[arg(long, env = "DETECT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Path to the ONNX detection model
    #[arg(long, env = "DETECT_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Letterbox edge in pixels
    #[arg(long, env = "DETECT_INPUT_SIZE", default_value_t = DEFAULT_INPUT_SIZE)]
    pub input_size: u32,

    /// Minimum confidence for a detection
    #[arg(long, env = "DETECT_CONFIDENCE", default_value_t = DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence: f32,

    /// NMS IoU threshold
    #[arg(long, env = "DETECT_IOU_THRESHOLD", default_value_t = DEFAULT_IOU_THRESHOLD)]
    pub iou_threshold: f32,

    /// Maximum boxes per image
    #[arg(long, env = "DETECT_MAX_DETECTIONS", default_value_t = DEFAULT_MAX_DETECTIONS)]
    pub max_detections: usize,

    /// Feed raw 8-bit pixels when the model accepts them
    #[arg(long, env = "DETECT_QUANTIZED", default_value_t = true, action = ArgAction::Set)]
    pub quantized: bool,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "DETECT_INTRA_THREADS", default_value_t = DEFAULT_INTRA_THREADS)]
    pub intra_threads: usize,

    /// Verbose logging and per-request tracing
    #[arg(long, env = "DETECT_DEBUG", default_value_t = true, action = ArgAction::Set)]
    pub debug: bool,

    /// Maximum request body in bytes (unlimited when unset)
    #[arg(long, env = "DETECT_BODY_LIMIT")]
    pub body_limit: Option<usize>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            input_size: DEFAULT_INPUT_SIZE,
            confidence: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            quantized: true,
            intra_threads: DEFAULT_INTRA_THREADS,
            debug: true,
            body_limit: None,
        }
    }
}

impl NodeConfig {
    /// Socket address to bind
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid listen host: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Inference settings applied to every request
    pub fn predict_params(&self) -> PredictParams {
        PredictParams {
            image_size: self.input_size,
            confidence_threshold: self.confidence,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
            quantized: self.quantized,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            bail!("confidence must be within [0, 1], got {}", self.confidence);
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            bail!(
                "iou_threshold must be within [0, 1], got {}",
                self.iou_threshold
            );
        }
        if self.input_size == 0 {
            bail!("input_size must be greater than zero");
        }
        if self.max_detections == 0 {
            bail!("max_detections must be greater than zero");
        }
        self.listen_addr()?;
        Ok(())
    }
}
