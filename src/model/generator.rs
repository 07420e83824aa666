use super::{
    ada_res_block::{AdaResBlock, AdaResBlockInit},
    misc,
    norm::{InstanceNorm, InstanceNormInit},
    res_block::{ResBlock, ResBlockInit},
};
use crate::common::*;
use nn::Module;

/// Channel widths `(dim_in, dim_out)` of each encoder stage: the
/// downsampling stages first, then the two bottleneck stages. The decoder
/// runs the same plan reversed with the widths swapped, so the overall
/// width sequence is a palindrome around the bottleneck.
pub fn encoder_plan(img_size: i64, max_conv_dim: i64) -> Result<Vec<(i64, i64)>> {
    let depth = misc::log2_exact(img_size)?;
    ensure!(
        depth >= 4,
        "image size must be at least 16, but get {}",
        img_size
    );
    let mut dim_in = (1 << 14) / img_size;
    ensure!(dim_in > 0, "image size {} is too large", img_size);

    let mut plan = Vec::new();
    for _ in 0..depth - 4 {
        let dim_out = i64::min(dim_in * 2, max_conv_dim);
        plan.push((dim_in, dim_out));
        dim_in = dim_out;
    }
    for _ in 0..2 {
        plan.push((dim_in, dim_in));
    }
    Ok(plan)
}

#[derive(Debug, Clone)]
pub struct GeneratorInit {
    pub img_size: i64,
    pub style_dim: i64,
    pub max_conv_dim: i64,
}

impl Default for GeneratorInit {
    fn default() -> Self {
        Self {
            img_size: 256,
            style_dim: 64,
            max_conv_dim: 512,
        }
    }
}

impl GeneratorInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>) -> Result<Generator> {
        let path = path.borrow();
        let Self {
            img_size,
            style_dim,
            max_conv_dim,
        } = self;
        ensure!(style_dim > 0, "style_dim must be positive");

        let plan = encoder_plan(img_size, max_conv_dim)?;
        let num_down = plan.len() - 2;
        let stem_dim = plan[0].0;

        let conv_in = nn::conv2d(
            path / "conv_in",
            3,
            stem_dim,
            3,
            nn::ConvConfig {
                padding: 1,
                ..Default::default()
            },
        );

        let encoder: Vec<ResBlock> = plan
            .iter()
            .enumerate()
            .map(|(index, &(dim_in, dim_out))| {
                ResBlockInit {
                    dim_in,
                    dim_out,
                    downsample: index < num_down,
                    normalize: true,
                }
                .build(path / format!("encoder_{}", index))
            })
            .try_collect()?;

        // built front-to-back in encoder order, run back-to-front
        let mut decoder: Vec<AdaResBlock> = Vec::new();
        for (index, &(dim_in, dim_out)) in plan.iter().enumerate() {
            let block = AdaResBlockInit {
                dim_in: dim_out,
                dim_out: dim_in,
                style_dim,
                upsample: index < num_down,
            }
            .build(path / format!("decoder_{}", index))?;
            decoder.insert(0, block);
        }

        let out_norm = InstanceNormInit::default().build(path / "out_norm", stem_dim);
        let conv_out = nn::conv2d(path / "conv_out", stem_dim, 3, 1, Default::default());

        Ok(Generator {
            conv_in,
            encoder,
            decoder,
            out_norm,
            conv_out,
            img_size,
        })
    }
}

/// Translates a source image under a style code. The encoder downsamples
/// through normalized residual blocks; the decoder mirrors it with
/// style-conditioned upsampling blocks, so every residual addition is
/// shape-compatible without skip connections.
#[derive(Debug)]
pub struct Generator {
    conv_in: nn::Conv2D,
    encoder: Vec<ResBlock>,
    decoder: Vec<AdaResBlock>,
    out_norm: InstanceNorm,
    conv_out: nn::Conv2D,
    img_size: i64,
}

impl Generator {
    /// Returns a `(batch, 3, img_size, img_size)` translated image.
    pub fn forward(&self, xs: &Tensor, style: &Tensor) -> Result<Tensor> {
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
        let xs = self.encoder.iter().fold(xs, |xs, block| block.forward(&xs));
        let xs = self
            .decoder
            .iter()
            .try_fold(xs, |xs, block| block.forward(&xs, style))?;
        let xs = self.out_norm.forward(&xs);
        let xs = misc::leaky_relu(&xs);
        Ok(self.conv_out.forward(&xs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_plan_mirrors_across_the_pyramid() -> Result<()> {
        let plan_256 = encoder_plan(256, 512)?;
        ensure!(
            plan_256
                == vec![
                    (64, 128),
                    (128, 256),
                    (256, 512),
                    (512, 512),
                    (512, 512),
                    (512, 512)
                ],
            "incorrect channel plan for 256"
        );

        let plan_128 = encoder_plan(128, 512)?;
        ensure!(
            plan_128
                == vec![
                    (128, 256),
                    (256, 512),
                    (512, 512),
                    (512, 512),
                    (512, 512)
                ],
            "incorrect channel plan for 128"
        );

        // the mirrored decoder consumes each stage's output width and emits
        // its input width; adjacent stages must chain in both directions
        for plan in [plan_256, plan_128] {
            for (&(_, prev_out), &(next_in, _)) in plan.iter().tuple_windows() {
                ensure!(prev_out == next_in, "encoder stages do not chain");
            }
            for (&(prev_in, _), &(_, next_out)) in plan.iter().rev().tuple_windows() {
                ensure!(prev_in == next_out, "decoder stages do not chain");
            }
        }

        Ok(())
    }

    #[test]
    fn generator_preserves_image_shape() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let generator = GeneratorInit {
            img_size: 64,
            style_dim: 64,
            max_conv_dim: 256,
        }
        .build(&root)?;

        let input = Tensor::rand(&[2, 3, 64, 64], FLOAT_CPU);
        let style = Tensor::rand(&[2, 64], FLOAT_CPU);
        let output = generator.forward(&input, &style)?;
        ensure!(output.size() == vec![2, 3, 64, 64], "incorrect output shape");

        Ok(())
    }

    #[test]
    fn generator_full_size_output_shape() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let generator = GeneratorInit::default().build(&root)?;

        let input = Tensor::rand(&[1, 3, 256, 256], FLOAT_CPU);
        let style = Tensor::rand(&[1, 64], FLOAT_CPU);
        let output = generator.forward(&input, &style)?;
        ensure!(
            output.size() == vec![1, 3, 256, 256],
            "incorrect output shape"
        );

        Ok(())
    }

    #[test]
    fn generator_rejects_mismatched_style() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let generator = GeneratorInit {
            img_size: 32,
            style_dim: 64,
            max_conv_dim: 128,
        }
        .build(&root)?;

        let input = Tensor::rand(&[1, 3, 32, 32], FLOAT_CPU);
        let style = Tensor::rand(&[1, 16], FLOAT_CPU);
        ensure!(
            generator.forward(&input, &style).is_err(),
            "expect style dimension error"
        );

        Ok(())
    }
}
