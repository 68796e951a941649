pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use cli::Commands;

pub use application::{
    error_fragment, AnalyzeChartUseCase, BackendClient, ChatUseCase, FragmentStream,
    ManageModelsUseCase, RelayStream, StreamingRelay, ERROR_MARKER,
};

pub use connector::{
    app, serve, ApiError, BackendKind, Container, ContainerConfig, FormFields, MockBackend,
    OllamaCliClient, OllamaHttpClient, Router, ServeHandle, DEFAULT_BASE_URL, DEFAULT_MODEL,
    DEFAULT_PROGRAM, NO_RESPONSE_SENTINEL,
};

pub use domain::{
    AnalysisRequest, BackendMethod, DomainError, EncodedImage, GenerationRequest, HealthReport,
    HealthStatus, PriceBar, Prompt, PromptBuilder, SamplingOptions, DEFAULT_MAX_BARS,
};
