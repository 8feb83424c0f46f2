pub mod command;
pub mod traits;

pub use command::CommandGenerator;
pub use traits::{SummaryGenerator, TranscriptGenerator};
