pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use itertools::Itertools;
pub use serde::{Deserialize, Serialize};
pub use std::{
    borrow::Borrow,
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};
pub use tch::{kind::FLOAT_CPU, nn, Device, Kind, Tensor};
