pub mod accuracy;

pub use accuracy::MultiClassAccuracy;
