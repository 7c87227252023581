// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime backed YOLO plate detector
//!
//! Loads an int8-quantized YOLO export and runs it on CPU. Both QDQ exports
//! (float input, integer kernels) and fully quantized exports with a `u8`
//! input tensor are supported.

use anyhow::{Context, Result};
use image::RgbImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{Value, ValueType};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::detector::{DetectionResult, Detector, PredictParams};
use super::postprocess::postprocess;
use super::preprocessing::letterbox;

/// YOLO detector running on ONNX Runtime
///
/// The session sits behind a mutex, so concurrent callers are served one at
/// a time.
#[derive(Clone)]
pub struct YoloOnnxDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Model output name
    output_name: String,
    /// Whether the model takes raw `u8` pixels
    integer_input: bool,
    /// Model identifier (file stem)
    name: String,
}

impl std::fmt::Debug for YoloOnnxDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloOnnxDetector")
            .field("name", &self.name)
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("integer_input", &self.integer_input)
            .finish_non_exhaustive()
    }
}

impl YoloOnnxDetector {
    /// Load the detection model from an ONNX file
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    pub fn new<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        info!("Loading detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads.max(1))
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .unwrap_or_else(|| "output0".to_string());

        let integer_input = session
            .inputs
            .first()
            .map(|input| {
                matches!(
                    input.input_type,
                    ValueType::Tensor {
                        ty: TensorElementType::Uint8,
                        ..
                    }
                )
            })
            .unwrap_or(false);

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input type: {:?}", input.input_type);
        }

        let name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "detector".to_string());

        info!(
            "✅ Detection model {} loaded (input: {}, output: {}, u8 input: {})",
            name, input_name, output_name, integer_input
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
            integer_input,
            name,
        })
    }

    /// Whether the loaded model consumes raw `u8` pixels
    pub fn has_integer_input(&self) -> bool {
        self.integer_input
    }
}

/// Lock the session, recovering it if a previous holder panicked
///
/// A session carries no state between runs, so a poisoned lock is reused.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(|poisoned| {
        warn!("Detection session lock was poisoned by a panic, recovering");
        session.clear_poison();
        PoisonError::into_inner(poisoned)
    })
}

impl Detector for YoloOnnxDetector {
    fn predict(&self, image: &RgbImage, params: &PredictParams) -> Result<Vec<DetectionResult>> {
        let started = Instant::now();
        let lb = letterbox(image, params.image_size);

        let mut session = lock_session(&self.session);

        let outputs = if params.quantized && self.integer_input {
            let input_value =
                Value::from_array(lb.to_u8_tensor()).context("Failed to create input tensor")?;
            session.run(ort::inputs![&self.input_name => input_value])
        } else {
            let input_value =
                Value::from_array(lb.to_tensor()).context("Failed to create input tensor")?;
            session.run(ort::inputs![&self.input_name => input_value])
        }
        .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context(format!("Failed to extract output tensor {}", self.output_name))?;

        debug!("Detection output shape: {:?}", output_tensor.shape());

        let result = postprocess(output_tensor.view(), &lb, params)?;

        debug!(
            "Detected {} boxes in {}ms",
            result.len(),
            started.elapsed().as_millis()
        );

        Ok(vec![result])
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
