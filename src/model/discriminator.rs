use super::{
    misc,
    pyramid::{FeaturePyramid, FeaturePyramidInit},
};
use crate::common::*;
use nn::Module;

#[derive(Debug, Clone)]
pub struct DiscriminatorInit {
    pub img_size: i64,
    pub num_domains: i64,
    pub max_conv_dim: i64,
}

impl Default for DiscriminatorInit {
    fn default() -> Self {
        Self {
            img_size: 256,
            num_domains: 2,
            max_conv_dim: 512,
        }
    }
}

impl DiscriminatorInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>) -> Result<Discriminator> {
        let path = path.borrow();
        let Self {
            img_size,
            num_domains,
            max_conv_dim,
        } = self;
        ensure!(num_domains > 0, "num_domains must be positive");

        let pyramid = FeaturePyramidInit {
            img_size,
            max_conv_dim,
        }
        .build(path / "shared")?;
        let head = nn::conv2d(
            path / "head",
            pyramid.out_channels(),
            num_domains,
            1,
            Default::default(),
        );

        Ok(Discriminator {
            pyramid,
            head,
            num_domains,
        })
    }
}

/// Multi-domain real/fake critic. Logits are computed for every domain and
/// the one matching each batch element's domain index is returned.
#[derive(Debug)]
pub struct Discriminator {
    pyramid: FeaturePyramid,
    head: nn::Conv2D,
    num_domains: i64,
}

impl Discriminator {
    /// Returns a `(batch,)` tensor of real/fake logits.
    pub fn forward(&self, xs: &Tensor, domains: &Tensor) -> Result<Tensor> {
        let features = self.pyramid.forward(xs)?;
        let logits = self.head.forward(&features).view([-1, self.num_domains]);
        misc::select_domain(&logits, domains, self.num_domains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminator_outputs_one_logit_per_example() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let discriminator = DiscriminatorInit::default().build(&root)?;

        let input = Tensor::rand(&[1, 3, 256, 256], FLOAT_CPU);
        let domains = Tensor::of_slice(&[0i64]);
        let output = discriminator.forward(&input, &domains)?;
        ensure!(output.size() == vec![1], "incorrect output shape");

        Ok(())
    }

    #[test]
    fn discriminator_rejects_out_of_range_domain() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let discriminator = DiscriminatorInit {
            img_size: 32,
            num_domains: 2,
            max_conv_dim: 128,
        }
        .build(&root)?;

        let input = Tensor::rand(&[1, 3, 32, 32], FLOAT_CPU);
        let domains = Tensor::of_slice(&[2i64]);
        ensure!(
            discriminator.forward(&input, &domains).is_err(),
            "expect out-of-range error"
        );

        Ok(())
    }
}
