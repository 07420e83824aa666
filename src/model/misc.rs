use crate::common::*;
use std::f64::consts::SQRT_2;

pub const LEAKY_SLOPE: f64 = 0.2;

/// Leaky ReLU with the slope shared by all of the networks.
pub fn leaky_relu(xs: &Tensor) -> Tensor {
    xs.maximum(&(xs * LEAKY_SLOPE))
}

/// Adds the residual and shortcut branches while keeping unit variance.
pub fn merge_residual(residual: &Tensor, shortcut: &Tensor) -> Tensor {
    (residual + shortcut) / SQRT_2
}

/// Halves both spatial dimensions by 2x average pooling.
pub fn avg_pool_2(xs: &Tensor) -> Tensor {
    xs.avg_pool2d(&[2, 2], &[2, 2], &[0, 0], false, true, None::<i64>)
}

/// Doubles both spatial dimensions by nearest-neighbor interpolation.
pub fn upsample_nearest_2(xs: &Tensor) -> Result<Tensor> {
    let (_b, _c, height, width) = xs.size4()?;
    Ok(xs.upsample_nearest2d(&[height * 2, width * 2], None, None))
}

pub fn log2_exact(value: i64) -> Result<u32> {
    ensure!(
        value > 0 && (value & (value - 1)) == 0,
        "expect a power of two, but get {}",
        value
    );
    Ok(value.trailing_zeros())
}

/// Picks the per-domain output for each batch element.
///
/// `xs` is a stacked per-domain output of shape `(batch, num_domains)` or
/// `(batch, num_domains, dim)`; `domains` is an int64 tensor of shape
/// `(batch,)` whose entries must lie in `[0, num_domains)`.
pub fn select_domain(xs: &Tensor, domains: &Tensor, num_domains: i64) -> Result<Tensor> {
    ensure!(
        domains.kind() == Kind::Int64,
        "domain indexes must be int64, but get {:?}",
        domains.kind()
    );
    let batch_size = domains.size1()?;
    ensure!(batch_size > 0, "domain index tensor must not be empty");

    let min = i64::from(domains.min());
    let max = i64::from(domains.max());
    ensure!(
        min >= 0 && max < num_domains,
        "domain index out of range: expect [0, {}), but get {}..={}",
        num_domains,
        min,
        max
    );

    let output = match xs.dim() {
        2 => {
            let (bsize, stacked) = xs.size2()?;
            ensure!(
                bsize == batch_size && stacked == num_domains,
                "expect shape [{}, {}], but get {:?}",
                batch_size,
                num_domains,
                xs.size()
            );
            xs.gather(1, &domains.view([batch_size, 1]), false)
                .view([batch_size])
        }
        3 => {
            let (bsize, stacked, dim) = xs.size3()?;
            ensure!(
                bsize == batch_size && stacked == num_domains,
                "expect shape [{}, {}, {}], but get {:?}",
                batch_size,
                num_domains,
                dim,
                xs.size()
            );
            let index = domains
                .view([batch_size, 1, 1])
                .expand(&[batch_size, 1, dim], false);
            xs.gather(1, &index, false).view([batch_size, dim])
        }
        dim => bail!("expect a 2 or 3 dimensional tensor, but get {} dims", dim),
    };

    Ok(output)
}
