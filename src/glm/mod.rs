//! GLM fitting: score equations, line search, and optimizers

mod init;
mod line_search;
mod linalg;
mod optimize;
mod score;

pub use optimize::{fit, FitControl, FitMethod, FitResult, FitStatus};
pub use score::{fisher_information, score};
