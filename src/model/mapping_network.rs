use super::misc;
use crate::common::*;
use nn::Module;

const HIDDEN_DIM: i64 = 512;

#[derive(Debug, Clone)]
pub struct MappingNetworkInit {
    pub latent_dim: i64,
    pub style_dim: i64,
    pub num_domains: i64,
}

impl Default for MappingNetworkInit {
    fn default() -> Self {
        Self {
            latent_dim: 16,
            style_dim: 64,
            num_domains: 2,
        }
    }
}

impl MappingNetworkInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>) -> Result<MappingNetwork> {
        let path = path.borrow();
        let Self {
            latent_dim,
            style_dim,
            num_domains,
        } = self;
        ensure!(
            latent_dim > 0 && style_dim > 0,
            "latent_dim and style_dim must be positive"
        );
        ensure!(num_domains > 0, "num_domains must be positive");

        // the first linear has no activation of its own
        let shared = (1..=3).fold(
            nn::seq().add(nn::linear(
                path / "shared_0",
                latent_dim,
                HIDDEN_DIM,
                Default::default(),
            )),
            |seq, index| {
                seq.add(nn::linear(
                    path / format!("shared_{}", index),
                    HIDDEN_DIM,
                    HIDDEN_DIM,
                    Default::default(),
                ))
                .add_fn(|xs| xs.relu())
            },
        );

        let heads: Vec<nn::Sequential> = (0..num_domains)
            .map(|head_index| {
                let head_path = path / format!("head_{}", head_index);
                let seq = (0..3).fold(nn::seq(), |seq, index| {
                    seq.add(nn::linear(
                        &head_path / format!("linear_{}", index),
                        HIDDEN_DIM,
                        HIDDEN_DIM,
                        Default::default(),
                    ))
                    .add_fn(|xs| xs.relu())
                });
                seq.add(nn::linear(
                    &head_path / "out",
                    HIDDEN_DIM,
                    style_dim,
                    Default::default(),
                ))
            })
            .collect();

        Ok(MappingNetwork {
            shared,
            heads,
            latent_dim,
            num_domains,
        })
    }
}

/// Maps a latent code to a style code for a given domain: a shared
/// fully-connected trunk followed by per-domain fully-connected heads.
#[derive(Debug)]
pub struct MappingNetwork {
    shared: nn::Sequential,
    heads: Vec<nn::Sequential>,
    latent_dim: i64,
    num_domains: i64,
}

impl MappingNetwork {
    /// Returns a `(batch, style_dim)` tensor of style codes.
    pub fn forward(&self, latent: &Tensor, domains: &Tensor) -> Result<Tensor> {
        let (_batch, latent_dim) = latent.size2()?;
        ensure!(
            latent_dim == self.latent_dim,
            "expect latent dimension {}, but get {}",
            self.latent_dim,
            latent_dim
        );

        let shared = self.shared.forward(latent);
        let outputs: Vec<Tensor> = self
            .heads
            .iter()
            .map(|head| head.forward(&shared))
            .collect();
        let stacked = Tensor::stack(&outputs, 1);
        misc::select_domain(&stacked, domains, self.num_domains)
    }
}
