#![forbid(unsafe_code)]

//! Concrete test generation: ATC generation, symbolic execution, solving and
//! rewriting wired together behind one driver.

mod config;
mod driver;
mod error;
mod tester;

pub use config::{CONFIG_FILE, Config, GenerationConfig, find_config, resolve_config};
pub use driver::{Generated, default_calls, load_spec, run};
pub use error::{ConfigError, DriverError, TesterError};
pub use tester::{Ctc, DEFAULT_PIN_RETRIES, Seeds, Tester};
