mod load;
mod resolve;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use resolve::{Credentials, RunConfig, resolve};
pub use schema::*;
