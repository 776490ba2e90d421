//! Built-in extraction strategies.
//!
//! | Strategy | Tier | Reads |
//! |----------|------|-------|
//! | [`TextLayerStrategy`] | Free | embedded PDF text |
//! | [`OcrStrategy`] | Low | rasterised pages via tesseract |
//! | [`AiNativeStrategy`] | High | best available text via a [`LanguageModel`](crate::traits::ai::LanguageModel) |

pub mod ai_native;
pub mod ocr;
pub mod patterns;
pub mod prompts;
pub mod text_layer;

pub use ai_native::AiNativeStrategy;
pub use ocr::OcrStrategy;
pub use patterns::PatternExtractor;
pub use text_layer::TextLayerStrategy;
