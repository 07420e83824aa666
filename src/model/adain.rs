use super::norm::{InstanceNorm, InstanceNormInit};
use crate::common::*;
use nn::Module;

#[derive(Debug, Clone)]
pub struct AdaptiveInstanceNormInit {
    pub style_dim: i64,
    pub num_features: i64,
}

impl AdaptiveInstanceNormInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>) -> Result<AdaptiveInstanceNorm> {
        let path = path.borrow();
        let Self {
            style_dim,
            num_features,
        } = self;
        ensure!(
            style_dim > 0 && num_features > 0,
            "style_dim and num_features must be positive"
        );

        let norm = InstanceNormInit {
            affine: false,
            ..Default::default()
        }
        .build(path / "norm", num_features);
        let fc = nn::linear(
            path / "fc",
            style_dim,
            num_features * 2,
            Default::default(),
        );

        Ok(AdaptiveInstanceNorm {
            norm,
            fc,
            style_dim,
            num_features,
        })
    }
}

/// Instance norm whose scale and shift come from a style code instead of
/// learned affine parameters.
#[derive(Debug)]
pub struct AdaptiveInstanceNorm {
    norm: InstanceNorm,
    fc: nn::Linear,
    style_dim: i64,
    num_features: i64,
}

impl AdaptiveInstanceNorm {
    pub fn forward(&self, xs: &Tensor, style: &Tensor) -> Result<Tensor> {
        let (batch_size, channels, _height, _width) = xs.size4()?;
        ensure!(
            channels == self.num_features,
            "expect {} channels, but get {}",
            self.num_features,
            channels
        );
        let (style_batch, style_dim) = style.size2()?;
        ensure!(
            style_dim == self.style_dim,
            "expect style dimension {}, but get {}",
            self.style_dim,
            style_dim
        );
        ensure!(
            style_batch == batch_size,
            "batch sizes differ: input {} vs. style {}",
            batch_size,
            style_batch
        );

        let params = self
            .fc
            .forward(style)
            .view([batch_size, self.num_features * 2, 1, 1]);
        let chunks = params.chunk(2, 1);
        let (gamma, beta) = (&chunks[0], &chunks[1]);

        Ok((gamma + 1.0) * self.norm.forward(xs) + beta)
    }
}
