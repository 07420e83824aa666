use crate::common::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: Model,
    pub runtime: Runtime,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = json5::from_str(&fs::read_to_string(path)?)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub img_size: NonZeroUsize,
    pub style_dim: NonZeroUsize,
    pub latent_dim: NonZeroUsize,
    pub num_domains: NonZeroUsize,
    pub max_conv_dim: NonZeroUsize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runtime {
    #[serde(with = "tch_serde::serde_device")]
    pub device: Device,
}
