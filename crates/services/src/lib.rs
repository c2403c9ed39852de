pub mod ai;
pub mod dao;
pub mod storage;

pub use ai::analyzer::ConversationAnalyzer;
pub use ai::labeler::SpeakerLabeler;
pub use ai::pipeline::AnalysisPipeline;
pub use dao::*;
