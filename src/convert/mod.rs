pub mod launcher;
pub mod machine;
pub mod progress;
pub mod render;
pub mod resolver;

pub use machine::{ConversionState, ConversionSummary, ConversionViewModel, Recovery};
pub use render::{Renderer, TerminalRenderer};
pub use resolver::NavigationQuery;
