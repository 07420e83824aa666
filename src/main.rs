use anyhow::Result;
use stargan2::{
    common::*,
    config::{self, Config},
    model::{DiscriminatorInit, GeneratorInit, MappingNetworkInit, StyleEncoderInit},
};
use std::env;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

#[derive(Debug, Clone, StructOpt)]
/// Builds every StarGAN v2 network and prints output shapes for a synthetic
/// input.
pub struct Args {
    #[structopt(long, default_value = "config.json5")]
    pub config: PathBuf,
}

fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    // parse config
    let Args { config } = Args::from_args();
    let Config {
        model:
            config::Model {
                img_size,
                style_dim,
                latent_dim,
                num_domains,
                max_conv_dim,
            },
        runtime: config::Runtime { device },
    } = Config::load(&config)?;

    let img_size = img_size.get() as i64;
    let style_dim = style_dim.get() as i64;
    let latent_dim = latent_dim.get() as i64;
    let num_domains = num_domains.get() as i64;
    let max_conv_dim = max_conv_dim.get() as i64;

    let vs = nn::VarStore::new(device);
    let root = vs.root();

    let generator = GeneratorInit {
        img_size,
        style_dim,
        max_conv_dim,
    }
    .build(&root / "generator")?;

    let mapping = MappingNetworkInit {
        latent_dim,
        style_dim,
        num_domains,
    }
    .build(&root / "mapping_network")?;

    let style_encoder = StyleEncoderInit {
        img_size,
        style_dim,
        num_domains,
        max_conv_dim,
    }
    .build(&root / "style_encoder")?;

    let discriminator = DiscriminatorInit {
        img_size,
        num_domains,
        max_conv_dim,
    }
    .build(&root / "discriminator")?;

    let image = Tensor::randn(&[1, 3, img_size, img_size], (Kind::Float, device));
    let latent = Tensor::randn(&[1, latent_dim], (Kind::Float, device));
    let domain = Tensor::zeros(&[1], (Kind::Int64, device));

    let style = mapping.forward(&latent, &domain)?;
    info!("mapping network output shape: {:?}", style.size());

    let translated = generator.forward(&image, &style)?;
    info!("generator output shape: {:?}", translated.size());

    let encoded = style_encoder.forward(&image, &domain)?;
    info!("style encoder output shape: {:?}", encoded.size());

    let logit = discriminator.forward(&image, &domain)?;
    info!("discriminator output shape: {:?}", logit.size());

    Ok(())
}
