use super::{
    misc,
    pyramid::{FeaturePyramid, FeaturePyramidInit},
};
use crate::common::*;
use nn::Module;

#[derive(Debug, Clone)]
pub struct StyleEncoderInit {
    pub img_size: i64,
    pub style_dim: i64,
    pub num_domains: i64,
    pub max_conv_dim: i64,
}

impl Default for StyleEncoderInit {
    fn default() -> Self {
        Self {
            img_size: 256,
            style_dim: 64,
            num_domains: 2,
            max_conv_dim: 512,
        }
    }
}

impl StyleEncoderInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>) -> Result<StyleEncoder> {
        let path = path.borrow();
        let Self {
            img_size,
            style_dim,
            num_domains,
            max_conv_dim,
        } = self;
        ensure!(style_dim > 0, "style_dim must be positive");
        ensure!(num_domains > 0, "num_domains must be positive");

        let pyramid = FeaturePyramidInit {
            img_size,
            max_conv_dim,
        }
        .build(path / "shared")?;
        let heads: Vec<nn::Linear> = (0..num_domains)
            .map(|index| {
                nn::linear(
                    path / format!("head_{}", index),
                    pyramid.out_channels(),
                    style_dim,
                    Default::default(),
                )
            })
            .collect();

        Ok(StyleEncoder {
            pyramid,
            heads,
            num_domains,
        })
    }
}

/// Extracts a style code from a reference image for a given domain. All
/// per-domain heads consume the shared flattened pyramid feature; the head
/// matching each batch element's domain index is returned.
#[derive(Debug)]
pub struct StyleEncoder {
    pyramid: FeaturePyramid,
    heads: Vec<nn::Linear>,
    num_domains: i64,
}

impl StyleEncoder {
    /// Returns a `(batch, style_dim)` tensor of style codes.
    pub fn forward(&self, xs: &Tensor, domains: &Tensor) -> Result<Tensor> {
        let shared = self
            .pyramid
            .forward(xs)?
            .view([-1, self.pyramid.out_channels()]);
        let outputs: Vec<Tensor> = self
            .heads
            .iter()
            .map(|head| head.forward(&shared))
            .collect();
        let stacked = Tensor::stack(&outputs, 1);
        misc::select_domain(&stacked, domains, self.num_domains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_encoder_outputs_style_codes() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let encoder = StyleEncoderInit::default().build(&root)?;

        let input = Tensor::rand(&[1, 3, 256, 256], FLOAT_CPU);
        let domains = Tensor::of_slice(&[0i64]);
        let output = encoder.forward(&input, &domains)?;
        ensure!(output.size() == vec![1, 64], "incorrect output shape");

        Ok(())
    }

    #[test]
    fn style_encoder_gathers_matching_head() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let encoder = StyleEncoderInit {
            img_size: 32,
            style_dim: 8,
            num_domains: 2,
            max_conv_dim: 64,
        }
        .build(&root)?;

        // identical images, so each row depends on the domain index only
        let image = Tensor::rand(&[1, 3, 32, 32], FLOAT_CPU);
        let input = Tensor::cat(&[&image, &image], 0);

        let forward = encoder.forward(&input, &Tensor::of_slice(&[0i64, 1]))?;
        let reverse = encoder.forward(&input, &Tensor::of_slice(&[1i64, 0]))?;

        ensure!(
            forward.get(0).allclose(&reverse.get(1), 1e-6, 1e-6, false)
                && forward.get(1).allclose(&reverse.get(0), 1e-6, 1e-6, false),
            "gather does not match the requested domain"
        );

        Ok(())
    }
}
