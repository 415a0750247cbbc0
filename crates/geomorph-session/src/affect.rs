//! Affect sampling.
//!
//! Every sampling period the runtime asks a [`FrameSource`] for a camera frame
//! and sends it to the evaluator's affect model. No frame means no sample. A
//! failed prediction still yields a label, picked at random from the
//! configured fallback list, so downstream requests always carry an emotion.

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::backend::TutorBackend;
use crate::model::EmotionRequest;

/// Supplies base64-encoded camera frames.
#[async_trait]
pub trait FrameSource: Send + Sync + 'static {
    /// Captures one frame, or `None` if no camera is available.
    async fn capture(&self) -> Option<String>;
}

/// A source with no camera; sampling never runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

#[async_trait]
impl FrameSource for NoCamera {
    async fn capture(&self) -> Option<String> {
        None
    }
}

/// A source that always returns the same frame.
#[derive(Debug, Clone)]
pub struct StaticFrame(pub String);

#[async_trait]
impl FrameSource for StaticFrame {
    async fn capture(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Picks a pseudo-random label from `labels`, ignoring blank entries.
#[must_use]
pub fn fallback_label(labels: &[String]) -> Option<String> {
    let usable: Vec<&String> = labels.iter().filter(|l| !l.trim().is_empty()).collect();
    usable.choose(&mut rand::rng()).map(|l| (*l).clone())
}

/// Takes one affect sample.
///
/// Returns `None` when the frame source has nothing to offer.
pub async fn sample(
    backend: &dyn TutorBackend,
    frames: &dyn FrameSource,
    session_id: &str,
    fallback: &[String],
) -> Option<String> {
    let Some(image_base64) = frames.capture().await else {
        debug!("No frame available, skipping affect sample");
        return None;
    };

    let request = EmotionRequest {
        session_id: session_id.to_string(),
        image_base64,
    };
    match backend.predict_emotion(&request).await {
        Ok(prediction) => Some(prediction.emotion),
        Err(e) => {
            let label = fallback_label(fallback);
            debug!(error = %e, fallback = ?label, "Affect prediction failed, using fallback label");
            label
        }
    }
}
