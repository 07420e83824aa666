use crate::common::*;

#[derive(Debug, Clone, Copy)]
pub struct InstanceNormInit {
    pub affine: bool,
    pub eps: f64,
    pub momentum: f64,
    pub cudnn_enabled: bool,
}

impl Default for InstanceNormInit {
    fn default() -> Self {
        Self {
            affine: true,
            eps: 1e-5,
            momentum: 0.1,
            cudnn_enabled: true,
        }
    }
}

impl InstanceNormInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>, num_features: i64) -> InstanceNorm {
        let path = path.borrow();
        let Self {
            affine,
            eps,
            momentum,
            cudnn_enabled,
        } = self;

        let (ws, bs) = if affine {
            let ws = path.var("weight", &[num_features], nn::Init::Const(1.0));
            let bs = path.var("bias", &[num_features], nn::Init::Const(0.0));
            (Some(ws), Some(bs))
        } else {
            (None, None)
        };

        InstanceNorm {
            ws,
            bs,
            eps,
            momentum,
            cudnn_enabled,
        }
    }
}

/// Instance normalization over `(batch, channels, height, width)` input.
///
/// No running statistics are tracked; per-sample statistics are used in both
/// training and evaluation.
#[derive(Debug)]
pub struct InstanceNorm {
    ws: Option<Tensor>,
    bs: Option<Tensor>,
    eps: f64,
    momentum: f64,
    cudnn_enabled: bool,
}

impl nn::Module for InstanceNorm {
    fn forward(&self, xs: &Tensor) -> Tensor {
        xs.instance_norm(
            self.ws.as_ref(),
            self.bs.as_ref(),
            None,
            None,
            true,
            self.momentum,
            self.eps,
            self.cudnn_enabled,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nn::Module;

    #[test]
    fn instance_norm_normalizes() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let norm = InstanceNormInit::default().build(&root, 4);
        let input = Tensor::randn(&[2, 4, 32, 32], FLOAT_CPU) * 3.0 + 7.0;
        let output = norm.forward(&input);

        ensure!(output.size() == input.size(), "incorrect output shape");
        assert_abs_diff_eq!(f64::from(&output.mean(Kind::Float)), 0.0, epsilon = 0.01);
        assert_abs_diff_eq!(f64::from(&output.var(false)), 1.0, epsilon = 0.05);

        Ok(())
    }
}
