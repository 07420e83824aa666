use super::{
    misc,
    res_block::{ResBlock, ResBlockInit},
};
use crate::common::*;
use nn::Module;

#[derive(Debug, Clone)]
pub struct FeaturePyramidInit {
    pub img_size: i64,
    pub max_conv_dim: i64,
}

impl FeaturePyramidInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>) -> Result<FeaturePyramid> {
        let path = path.borrow();
        let Self {
            img_size,
            max_conv_dim,
        } = self;
        ensure!(max_conv_dim > 0, "max_conv_dim must be positive");

        let depth = misc::log2_exact(img_size)?;
        ensure!(
            depth >= 3,
            "image size must be at least 8, but get {}",
            img_size
        );
        let mut dim_in = (1 << 14) / img_size;
        ensure!(dim_in > 0, "image size {} is too large", img_size);

        let conv_in = nn::conv2d(
            path / "conv_in",
            3,
            dim_in,
            3,
            nn::ConvConfig {
                padding: 1,
                ..Default::default()
            },
        );

        let blocks: Vec<ResBlock> = (0..depth - 2)
            .map(|index| -> Result<ResBlock> {
                let dim_out = i64::min(dim_in * 2, max_conv_dim);
                let block = ResBlockInit {
                    dim_in,
                    dim_out,
                    downsample: true,
                    normalize: false,
                }
                .build(path / format!("block_{}", index))?;
                dim_in = dim_out;
                Ok(block)
            })
            .try_collect()?;

        // the blocks leave a 4x4 spatial extent; this conv collapses it to 1x1
        let conv_out = nn::conv2d(path / "conv_out", dim_in, dim_in, 4, Default::default());

        Ok(FeaturePyramid {
            conv_in,
            blocks,
            conv_out,
            img_size,
            out_channels: dim_in,
        })
    }
}

/// Downsampling trunk used by both the discriminator and the style encoder:
/// an input conv followed by width-doubling residual blocks down to a single
/// spatial position.
#[derive(Debug)]
pub struct FeaturePyramid {
    conv_in: nn::Conv2D,
    blocks: Vec<ResBlock>,
    conv_out: nn::Conv2D,
    img_size: i64,
    out_channels: i64,
}

impl FeaturePyramid {
    pub fn out_channels(&self) -> i64 {
        self.out_channels
    }

    /// Returns a `(batch, out_channels, 1, 1)` feature.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let (_batch, channels, height, width) = xs.size4()?;
        ensure!(
            channels == 3,
            "expect 3 input channels, but get {}",
            channels
        );
        ensure!(
            height == self.img_size && width == self.img_size,
            "expect {0}x{0} input, but get {1}x{2}",
            self.img_size,
            height,
            width
        );

        let xs = self.conv_in.forward(xs);
        let xs = self.blocks.iter().fold(xs, |xs, block| block.forward(&xs));
        let xs = misc::leaky_relu(&xs);
        let xs = self.conv_out.forward(&xs);
        Ok(misc::leaky_relu(&xs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pyramid_collapses_spatial_extent() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let pyramid = FeaturePyramidInit {
            img_size: 128,
            max_conv_dim: 512,
        }
        .build(&root)?;
        ensure!(pyramid.out_channels() == 512, "incorrect bottleneck width");

        let input = Tensor::rand(&[2, 3, 128, 128], FLOAT_CPU);
        let output = pyramid.forward(&input)?;
        ensure!(output.size() == vec![2, 512, 1, 1], "incorrect output shape");

        Ok(())
    }

    #[test]
    fn pyramid_rejects_wrong_image_size() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let pyramid = FeaturePyramidInit {
            img_size: 64,
            max_conv_dim: 512,
        }
        .build(&root)?;

        let input = Tensor::rand(&[1, 3, 32, 32], FLOAT_CPU);
        ensure!(
            pyramid.forward(&input).is_err(),
            "expect image size error"
        );

        Ok(())
    }
}
