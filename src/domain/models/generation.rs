use serde::{Deserialize, Serialize};

use super::{EncodedImage, Prompt};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_NUM_PREDICT: u32 = 2048;

/// Sampling parameters forwarded to the backend with every generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub num_predict: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            num_predict: DEFAULT_NUM_PREDICT,
        }
    }
}

/// What a backend client needs to produce text: the prompt and an optional image.
///
/// The model identifier is not part of the request; each client carries the
/// one fixed at startup.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    prompt: Prompt,
    image: Option<EncodedImage>,
    options: SamplingOptions,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<Prompt>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            options: SamplingOptions::default(),
        }
    }

    pub fn with_image(mut self, image: Option<EncodedImage>) -> Self {
        self.image = image;
        self
    }

    pub fn with_options(mut self, options: SamplingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    pub fn options(&self) -> SamplingOptions {
        self.options
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}
