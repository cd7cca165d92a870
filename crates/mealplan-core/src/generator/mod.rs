//! Plan generator interface.
//!
//! The generator is an untrusted, non-deterministic source of candidate
//! plans (normally an LLM behind a CLI). Everything it returns is checked by
//! [`crate::validate`] before use.
//!
//! ```text
//! GenerationRequest --prompt::build_prompt--> text
//!        |                                      |
//!        v                                      v
//!  &dyn PlanGenerator ----generate()----> CommandGenerator (subprocess)
//!        |                                      |
//!        v                                      v
//!  GeneratorResponse <---parse::parse_response--- stdout
//! ```

pub mod command;
pub mod parse;
pub mod prompt;
pub mod trait_def;
pub mod types;

pub use command::CommandGenerator;
pub use parse::parse_response;
pub use prompt::build_prompt;
pub use trait_def::PlanGenerator;
pub use types::{CandidateMeal, GenerationRequest, GeneratorError, GeneratorResponse};
