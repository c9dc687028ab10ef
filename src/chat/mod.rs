//! The conversation layer: state tracking, prompts, and the
//! orchestrator that threads chat turns through the LLM and
//! dispatches calendar side effects.

mod directive;
mod orchestrator;
pub mod prompt;
mod state;
mod transcript;

pub use directive::{Directive, extract_directive};
pub use orchestrator::{Orchestrator, TurnReply};
pub use state::{Action, ConversationState, StateUpdate};
pub use transcript::{DisplayHistory, Transcript};
