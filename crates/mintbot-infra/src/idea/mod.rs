//! Idea sources: DexScreener trend seeds and an OpenAI-compatible enhancer.

pub mod openai;
pub mod trends;

pub use openai::OpenAiEnhancer;
pub use trends::DexScreenerTrends;
