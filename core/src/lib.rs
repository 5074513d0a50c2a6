pub mod check_ins;
pub mod completion;
pub mod error;
pub mod intake;
pub mod plans;
pub mod prompts;
