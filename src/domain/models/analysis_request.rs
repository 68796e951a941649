use super::{EncodedImage, PriceBar};

/// One `/analyze` call, discarded once the response is sent.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    question: String,
    bars: Option<Vec<PriceBar>>,
    image: Option<EncodedImage>,
    stream: bool,
}

impl AnalysisRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            bars: None,
            image: None,
            stream: false,
        }
    }

    pub fn with_bars(mut self, bars: Vec<PriceBar>) -> Self {
        self.bars = Some(bars);
        self
    }

    pub fn with_image(mut self, image: EncodedImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn bars(&self) -> Option<&[PriceBar]> {
        self.bars.as_deref()
    }

    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    pub fn is_stream(&self) -> bool {
        self.stream
    }
}
