//! Cross-module tests for the retrieval pipeline.

mod advisor_flow;
mod support;
