use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;

/// Setup parameters for `MultiClassAccuracy`.
///
/// Fields:
/// - `axis`  — which tensor axis holds the packed classifier dimension;
///             negative values count from the end (−1 is the feature axis)
/// - `top_k` — rank threshold validated against num_classes at setup.
///             Scoring itself is top-1; the parameter exists so a config
///             asking for more classes than exist fails early.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccuracyParams {
    #[serde(default = "default_axis")]
    pub axis: isize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Setup parameters for `MultiClassifierSoftmaxLoss`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SoftmaxLossParams {
    #[serde(default = "default_axis")]
    pub axis: isize,
}

fn default_axis() -> isize { 1 }
fn default_top_k() -> usize { 1 }

impl Default for AccuracyParams {
    fn default() -> Self {
        AccuracyParams { axis: default_axis(), top_k: default_top_k() }
    }
}

impl Default for SoftmaxLossParams {
    fn default() -> Self {
        SoftmaxLossParams { axis: default_axis() }
    }
}

fn write_json<T: Serialize>(value: &T, path: &str) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

fn read_json<T: DeserializeOwned>(path: &str) -> std::io::Result<T> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

impl AccuracyParams {
    /// Serializes the parameters to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        write_json(self, path)
    }

    /// Deserializes parameters from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> std::io::Result<AccuracyParams> {
        read_json(path)
    }
}

impl SoftmaxLossParams {
    /// Serializes the parameters to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        write_json(self, path)
    }

    /// Deserializes parameters from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> std::io::Result<SoftmaxLossParams> {
        read_json(path)
    }
}
