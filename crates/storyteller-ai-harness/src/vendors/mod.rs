/// Gemini Generative Language API integration.
pub mod gemini;
