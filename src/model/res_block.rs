use super::{
    misc,
    norm::{InstanceNorm, InstanceNormInit},
};
use crate::common::*;
use nn::Module;

#[derive(Debug, Clone)]
pub struct ResBlockInit {
    pub dim_in: i64,
    pub dim_out: i64,
    pub downsample: bool,
    pub normalize: bool,
}

impl ResBlockInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>) -> Result<ResBlock> {
        let path = path.borrow();
        let Self {
            dim_in,
            dim_out,
            downsample,
            normalize,
        } = self;
        ensure!(
            dim_in > 0 && dim_out > 0,
            "channel widths must be positive"
        );

        let conv_config = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };
        let conv1 = nn::conv2d(path / "conv1", dim_in, dim_in, 3, conv_config);
        let conv2 = nn::conv2d(path / "conv2", dim_in, dim_out, 3, conv_config);

        let norms = normalize.then(|| {
            let norm1 = InstanceNormInit::default().build(path / "norm1", dim_in);
            let norm2 = InstanceNormInit::default().build(path / "norm2", dim_in);
            (norm1, norm2)
        });

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

        Ok(ResBlock {
            conv1,
            conv2,
            norms,
            skip_conv,
            downsample,
        })
    }
}

/// Residual block with optional instance normalization and optional 2x
/// downsampling. The shortcut applies a bias-free 1x1 conv whenever the
/// channel widths differ.
#[derive(Debug)]
pub struct ResBlock {
    conv1: nn::Conv2D,
    conv2: nn::Conv2D,
    norms: Option<(InstanceNorm, InstanceNorm)>,
    skip_conv: Option<nn::Conv2D>,
    downsample: bool,
}

impl ResBlock {
    fn shortcut(&self, xs: &Tensor) -> Tensor {
        let xs = match &self.skip_conv {
            Some(conv) => conv.forward(xs),
            None => xs.shallow_clone(),
        };
        if self.downsample {
            misc::avg_pool_2(&xs)
        } else {
            xs
        }
    }

    fn residual(&self, xs: &Tensor) -> Tensor {
        let norms = self.norms.as_ref();

        let xs = match norms {
            Some((norm1, _)) => norm1.forward(xs),
            None => xs.shallow_clone(),
        };
        let xs = misc::leaky_relu(&xs);
        let xs = self.conv1.forward(&xs);
        let xs = if self.downsample {
            misc::avg_pool_2(&xs)
        } else {
            xs
        };
        let xs = match norms {
            Some((_, norm2)) => norm2.forward(&xs),
            None => xs,
        };
        let xs = misc::leaky_relu(&xs);
        self.conv2.forward(&xs)
    }
}

impl nn::Module for ResBlock {
    fn forward(&self, xs: &Tensor) -> Tensor {
        misc::merge_residual(&self.residual(xs), &self.shortcut(xs))
    }
}
