pub mod formualizer;

pub use formualizer::FormualizerAdapter;
