use super::{
    adain::{AdaptiveInstanceNorm, AdaptiveInstanceNormInit},
    misc,
};
use crate::common::*;
use nn::Module;

#[derive(Debug, Clone)]
pub struct AdaResBlockInit {
    pub dim_in: i64,
    pub dim_out: i64,
    pub style_dim: i64,
    pub upsample: bool,
}

impl AdaResBlockInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>) -> Result<AdaResBlock> {
        let path = path.borrow();
        let Self {
            dim_in,
            dim_out,
            style_dim,
            upsample,
        } = self;
        ensure!(
            dim_in > 0 && dim_out > 0,
            "channel widths must be positive"
        );

        let conv_config = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };
        let conv1 = nn::conv2d(path / "conv1", dim_in, dim_out, 3, conv_config);
        let conv2 = nn::conv2d(path / "conv2", dim_out, dim_out, 3, conv_config);

        let norm1 = AdaptiveInstanceNormInit {
            style_dim,
            num_features: dim_in,
        }
        .build(path / "norm1")?;
        let norm2 = AdaptiveInstanceNormInit {
            style_dim,
            num_features: dim_out,
        }
        .build(path / "norm2")?;

        let skip_conv = (dim_in != dim_out).then(|| {
            nn::conv2d(
                path / "skip",
                dim_in,
                dim_out,
                1,
                nn::ConvConfig {
                    bias: false,
                    ..Default::default()
                },
            )
        });

        Ok(AdaResBlock {
            conv1,
            conv2,
            norm1,
            norm2,
            skip_conv,
            upsample,
        })
    }
}

/// Residual block conditioned on a style code through adaptive instance
/// normalization, with optional 2x nearest-neighbor upsampling. Mirrors
/// [`ResBlock`](super::ResBlock) with downsampling swapped for upsampling.
#[derive(Debug)]
pub struct AdaResBlock {
    conv1: nn::Conv2D,
    conv2: nn::Conv2D,
    norm1: AdaptiveInstanceNorm,
    norm2: AdaptiveInstanceNorm,
    skip_conv: Option<nn::Conv2D>,
    upsample: bool,
}

impl AdaResBlock {
    fn shortcut(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = if self.upsample {
            misc::upsample_nearest_2(xs)?
        } else {
            xs.shallow_clone()
        };
        let xs = match &self.skip_conv {
            Some(conv) => conv.forward(&xs),
            None => xs,
        };
        Ok(xs)
    }

    fn residual(&self, xs: &Tensor, style: &Tensor) -> Result<Tensor> {
        let xs = self.norm1.forward(xs, style)?;
        let xs = misc::leaky_relu(&xs);
        let xs = if self.upsample {
            misc::upsample_nearest_2(&xs)?
        } else {
            xs
        };
        let xs = self.conv1.forward(&xs);
        let xs = self.norm2.forward(&xs, style)?;
        let xs = misc::leaky_relu(&xs);
        Ok(self.conv2.forward(&xs))
    }

    pub fn forward(&self, xs: &Tensor, style: &Tensor) -> Result<Tensor> {
        let residual = self.residual(xs, style)?;
        let shortcut = self.shortcut(xs)?;
        Ok(misc::merge_residual(&residual, &shortcut))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ada_res_block_upsamples() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let block = AdaResBlockInit {
            dim_in: 16,
            dim_out: 8,
            style_dim: 64,
            upsample: true,
        }
        .build(&root)?;

        let input = Tensor::rand(&[2, 16, 8, 8], FLOAT_CPU);
        let style = Tensor::rand(&[2, 64], FLOAT_CPU);
        let output = block.forward(&input, &style)?;
        ensure!(output.size() == vec![2, 8, 16, 16], "incorrect output shape");

        Ok(())
    }

    #[test]
    fn ada_res_block_rejects_mismatched_style() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let block = AdaResBlockInit {
            dim_in: 8,
            dim_out: 8,
            style_dim: 64,
            upsample: false,
        }
        .build(&root)?;

        let input = Tensor::rand(&[2, 8, 8, 8], FLOAT_CPU);
        let style = Tensor::rand(&[2, 16], FLOAT_CPU);
        ensure!(
            block.forward(&input, &style).is_err(),
            "expect style dimension error"
        );

        Ok(())
    }
}
