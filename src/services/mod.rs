pub mod agent_call;
pub mod forbidden_phrases;
pub mod hitl;
pub mod json_recovery;
pub mod lyric_loop;
pub mod producer_stage;
pub mod template_stage;
pub mod workflow;

pub use forbidden_phrases::ForbiddenPhrases;
pub use hitl::{HitlPipeline, SessionView};
pub use json_recovery::{parse_json_like, parse_producer_output, parse_review_verdict};
pub use lyric_loop::{LoopOutcome, LoopRequest, RevisionSeed, WriterReviewerLoop};
pub use producer_stage::ProducerStage;
pub use template_stage::{HeuristicScorer, TemplateAssessment, TemplateScorer, TemplateStage};
pub use workflow::LyricWorkflow;
