use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::application::BackendClient;
use crate::domain::GenerationRequest;

/// Prefix of the terminal fragment written when a stream cannot be completed.
pub const ERROR_MARKER: &str = "\n[ERROR]\n";

/// Outbound fragment sequence. Infallible: failures arrive as a final marker fragment.
pub type RelayStream = Pin<Box<dyn Stream<Item = String> + Send>>;

pub fn error_fragment(message: impl std::fmt::Display) -> String {
    format!("{ERROR_MARKER}{message}")
}

/// Bridges a backend fragment stream to the caller.
///
/// Fragments are forwarded as soon as they arrive. If the stream breaks, the
/// relay makes one whole-response `generate` call and forwards its result as
/// the final fragment; if that fails too, it ends with an error marker. The
/// caller always sees the stream terminate.
#[derive(Clone)]
pub struct StreamingRelay {
    client: Arc<dyn BackendClient>,
}

impl StreamingRelay {
    pub fn new(client: Arc<dyn BackendClient>) -> Self {
        Self { client }
    }

    pub fn relay(&self, request: GenerationRequest) -> RelayStream {
        let client = Arc::clone(&self.client);

        Box::pin(stream! {
            let mut fragments = client.generate_stream(&request);
            let mut forwarded = 0usize;
            let mut failure = None;

            while let Some(next) = fragments.next().await {
                match next {
                    Ok(fragment) => {
                        forwarded += 1;
                        yield fragment;
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            // Release the backend connection or process before falling back
            drop(fragments);

            match failure {
                None => debug!("Relayed {} fragments from {}", forwarded, client.method()),
                Some(e) => {
                    warn!(
                        "Stream from {} failed after {} fragments: {}. Falling back to a whole response.",
                        client.method(),
                        forwarded,
                        e
                    );
                    match client.generate(&request).await {
                        Ok(text) => {
                            yield text;
                        }
                        Err(fallback) => {
                            warn!("Fallback generation failed: {}", fallback);
                            yield error_fragment(&fallback);
                        }
                    }
                }
            }
        })
    }
}
