#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use log::info;
use testgen_ast::{LocalScopes, Program, Spec};
use testgen_atc::AtcGenerator;
use testgen_see::{FunctionRegistry, ValueEnv};
use testgen_solver::SolverBridge;

use crate::{Config, Ctc, DriverError, Seeds, Tester};

/// Both programs produced for one call sequence.
#[derive(Clone, Debug)]
pub struct Generated {
    pub atc: Program,
    pub ctc: Ctc,
}

/// Reads a JSON-serialized specification tree.
pub fn load_spec(path: &Path) -> Result<Spec, DriverError> {
    let raw = fs::read_to_string(path).map_err(|e| DriverError::Spec {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| DriverError::Spec {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Every API block name, in declaration order.
pub fn default_calls(spec: &Spec) -> Vec<String> {
    spec.blocks.iter().map(|b| b.name.clone()).collect()
}

/// Generates the ATC for `calls` and concretizes it against `registry`.
/// Local symbol tables come from each block's call parameters.
pub fn run<S: AsRef<str>>(
    spec: &Spec,
    calls: &[S],
    registry: &dyn FunctionRegistry,
    config: &Config,
) -> Result<Generated, DriverError> {
    let scopes = LocalScopes::from_call_params(spec.blocks.iter().map(|b| &b.call));
    let atc = AtcGenerator::new(spec, &scopes)
        .with_suffix_scheme(config.generation.suffix)
        .generate(calls)?;

    let solver = SolverBridge::from_config(&config.solver)?;
    info!("driver: solving with the {} backend", solver.backend_name());
    let mut tester = Tester::new(registry, solver).with_pin_retries(config.generation.pin_retries);
    let ctc = tester.generate_ctc(atc.clone(), &Seeds::new(), ValueEnv::new())?;

    Ok(Generated { atc, ctc })
}
