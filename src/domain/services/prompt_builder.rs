use crate::domain::{Prompt, PriceBar};

pub const DEFAULT_MAX_BARS: usize = 20;

const PREAMBLE: &str = "You are a market-structure assistant. Provide concise analysis and possible price actions with reasons. Be explicit about uncertainty and list at least 2 possible scenarios with triggers.";

const TABLE_HEADER: &str = "time\topen\thigh\tlow\tclose\tvol";

const IMAGE_MARKER: [&str; 2] = [
    "CHART_IMAGE: (image included)",
    "Please analyze the visible price action on the chart. Use the numeric data if present.",
];

/// Two short exemplars. Changing them changes model behaviour, not the prompt layout.
const FEW_SHOT: &str = "
Example 1:
Data: 3-bar bullish engulfing on 15m, higher lows, volume increasing.
Interpretation: Short-term bullish continuation; set stop below recent low and target initial resistance.

Example 2:
Data: Double top on 1H with bearish divergence on RSI.
Interpretation: Expect a pullback, possible trend reversal; look for confirmation candle below neckline.
";

const MISSING: &str = "?";

/// Assembles the analysis prompt from a question, recent bars and an image flag.
///
/// Pure and deterministic: the same inputs always give a byte-identical prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    max_bars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            max_bars: DEFAULT_MAX_BARS,
        }
    }

    pub fn with_max_bars(mut self, max_bars: usize) -> Self {
        // Always render at least the latest bar
        self.max_bars = max_bars.max(1);
        self
    }

    pub fn max_bars(&self) -> usize {
        self.max_bars
    }

    pub fn build(&self, question: &str, bars: Option<&[PriceBar]>, image_present: bool) -> Prompt {
        let mut lines: Vec<String> = vec![
            PREAMBLE.to_string(),
            String::new(),
            "USER QUESTION:".to_string(),
            question.to_string(),
            String::new(),
        ];

        if let Some(bars) = bars.filter(|b| !b.is_empty()) {
            lines.push("RECENT PRICE DATA (most recent last):".to_string());
            lines.push(self.price_table(bars));
            lines.push(String::new());
        }

        if image_present {
            lines.extend(IMAGE_MARKER.iter().map(|l| l.to_string()));
        }

        lines.extend([
            String::new(),
            "FEW-SHOT EXAMPLES:".to_string(),
            FEW_SHOT.to_string(),
            String::new(),
            "Answer:".to_string(),
        ]);

        Prompt::new(lines.join("\n"))
    }

    /// Tab-separated table of the most recent `max_bars` bars, oldest first.
    pub fn price_table(&self, bars: &[PriceBar]) -> String {
        let start = bars.len().saturating_sub(self.max_bars);

        let mut rows = Vec::with_capacity(bars.len() - start + 1);
        rows.push(TABLE_HEADER.to_string());
        for bar in &bars[start..] {
            rows.push(format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                bar.timestamp.as_deref().unwrap_or(MISSING),
                cell(bar.open),
                cell(bar.high),
                cell(bar.low),
                cell(bar.close),
                bar.volume.map(|v| v.to_string()).unwrap_or_default(),
            ));
        }
        rows.join("\n")
    }
}

fn cell(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING.to_string())
}
