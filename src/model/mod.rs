mod ada_res_block;
mod adain;
mod discriminator;
mod generator;
mod mapping_network;
mod misc;
mod norm;
mod pyramid;
mod res_block;
mod style_encoder;

pub use ada_res_block::*;
pub use adain::*;
pub use discriminator::*;
pub use generator::*;
pub use mapping_network::*;
pub use misc::*;
pub use norm::*;
pub use pyramid::*;
pub use res_block::*;
pub use style_encoder::*;
