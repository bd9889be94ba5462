mod debounce;
mod generation;

pub use debounce::DebounceController;
pub use generation::{Generation, GenerationCounter};
