// src/inference.rs
//
// Neural-network steering: ONNX Runtime session plus the follower that
// wraps it behind the same contract as the hand-coded pipeline.

use crate::follower::SteeringSource;
use crate::preprocessing::preprocess;
use crate::steering::{RawSteering, SteeringDecision, SteeringStabilizer};
use crate::types::{Config, Frame, ModelConfig};
use anyhow::{Context, Result};
use ndarray::Array4;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use tracing::{debug, info};

/// Anything that maps a preprocessed NHWC image to raw model outputs.
pub trait SteeringModel {
    fn predict(&mut self, input: &[f32]) -> Result<Vec<f32>>;
}

pub struct InferenceEngine {
    session: Session,
    input_name: String,
    input_width: usize,
    input_height: usize,
}

impl InferenceEngine {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        info!("Initializing inference engine");
        info!("Model path: {}", config.path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.num_threads)?
            .commit_from_file(&config.path)
            .context("Failed to load model")?;

        info!("✓ Inference engine initialized successfully");

        Ok(Self {
            session,
            input_name: config.input_name.clone(),
            input_width: config.input_width,
            input_height: config.input_height,
        })
    }
}

impl SteeringModel for InferenceEngine {
    fn predict(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        debug!("Running inference");

        let array = Array4::from_shape_vec(
            (1, self.input_height, self.input_width, 3),
            input.to_vec(),
        )
        .context("Failed to shape input tensor")?;
        let tensor = Tensor::from_array(array)?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .context("Inference failed")?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract output tensor")?;

        Ok(data.to_vec())
    }
}

/// The network regresses the servo angle directly; round half up.
pub fn angle_from_output(output: &[f32]) -> Result<i32> {
    let value = output
        .first()
        .copied()
        .context("Model returned an empty output tensor")?;
    Ok((value + 0.5).floor() as i32)
}

pub struct ModelLaneFollower<M: SteeringModel = InferenceEngine> {
    model: M,
    stabilizer: SteeringStabilizer,
    input_width: usize,
    input_height: usize,
    max_deviation: i32,
}

impl ModelLaneFollower<InferenceEngine> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let engine = InferenceEngine::new(&config.model)?;
        Ok(Self::with_model(engine, config))
    }
}

impl<M: SteeringModel> ModelLaneFollower<M> {
    pub fn with_model(model: M, config: &Config) -> Self {
        Self {
            model,
            stabilizer: SteeringStabilizer::new(&config.steering),
            input_width: config.model.input_width,
            input_height: config.model.input_height,
            max_deviation: config.model.max_deviation,
        }
    }
}

impl<M: SteeringModel> SteeringSource for ModelLaneFollower<M> {
    fn name(&self) -> &'static str {
        "model"
    }

    fn steer(&mut self, frame: &Frame) -> Result<SteeringDecision> {
        let input = preprocess(frame, self.input_width, self.input_height)?;
        let output = self.model.predict(&input)?;
        let raw = angle_from_output(&output)?;

        let angle = self.stabilizer.stabilize_with_bound(raw, self.max_deviation);
        debug!("Model angle {}° -> steering {}°", raw, angle);

        Ok(SteeringDecision {
            raw: RawSteering::Angle(raw),
            angle,
            lanes_used: 0,
        })
    }

    fn current_angle(&self) -> i32 {
        self.stabilizer.current()
    }

    fn reset(&mut self) {
        self.stabilizer.reset();
    }
}
