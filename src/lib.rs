pub mod augment;
pub mod config;
pub mod resolver;

pub use augment::{augment, augment_files, clean_country, AugmentReport, ISO2_COLUMN};
pub use config::Config;
pub use resolver::{CountryResolver, TableResolver};
