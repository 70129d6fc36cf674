//! Classification layer: keyword matching, a model-backed adapter with
//! keyword fallback, mode dispatch, and the report operations built on them.

pub mod adapter;
pub mod dispatch;
pub mod keyword;
pub mod labels;
pub mod report;
pub mod service;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxService;

pub use adapter::{DEFAULT_ACCEPT_THRESHOLD, DEFAULT_CHUNK_SIZE, ModelClassifier};
pub use dispatch::{Dispatcher, Mode, UnknownMode};
pub use report::{Report, ReportError, ReportKind};
pub use service::{BackendError, ClassificationService, ScoredLabel};
