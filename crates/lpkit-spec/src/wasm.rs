//! WASM bindings for lpkit
//!
//! Problems and results cross the boundary as JSON text, in the same shape
//! the CLI reads and prints.

use lpkit_solver::{Solver, VERSION};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::builder::ModelBuilder;
use crate::error::SpecError;
use crate::lp_format::write_lp;
use crate::orchestrator::Request;
use crate::output::Output;
use crate::spec::{Options, ProblemSpec};

fn to_js(e: SpecError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Solve a problem given as JSON. `options` may be empty.
#[wasm_bindgen]
pub fn solve(lp: &str, options: &str) -> Result<String, JsValue> {
    let output = run(lp, options, None, |_| Ok(()))?;
    output.to_json(false).map_err(to_js)
}

/// Solve an LP in rounds of `each` pivots, passing every intermediate result
/// to `callback` as a plain object.
#[wasm_bindgen(js_name = solveIncremental)]
pub fn solve_incremental(
    lp: &str,
    options: &str,
    each: usize,
    callback: &js_sys::Function,
) -> Result<String, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let output = run(lp, options, Some(each), |round| {
        let value = round.serialize(&serializer).map_err(JsValue::from)?;
        callback.call1(&JsValue::NULL, &value).map(drop).map_err(HostError)
    })?;
    output.to_json(false).map_err(to_js)
}

/// A thrown JS value, or a build error on its way to becoming one.
struct HostError(JsValue);

impl From<SpecError> for HostError {
    fn from(e: SpecError) -> Self {
        HostError(to_js(e))
    }
}

impl From<JsValue> for HostError {
    fn from(value: JsValue) -> Self {
        HostError(value)
    }
}

fn run(
    lp: &str,
    options: &str,
    increment: Option<usize>,
    on_round: impl FnMut(&Output) -> Result<(), HostError>,
) -> Result<Output, JsValue> {
    let spec = ProblemSpec::parse(lp).map_err(to_js)?;
    let options = if options.trim().is_empty() {
        Options::default()
    } else {
        Options::parse(options).map_err(to_js)?
    };
    let request = Request {
        options,
        kind: None,
        increment,
    };

    let start = js_sys::Date::now();
    let output = request
        .run_with(&Solver::new(), &spec, on_round)
        .map_err(|HostError(value)| value)?;
    Ok(output.with_time((js_sys::Date::now() - start) / 1000.0))
}

/// CPLEX LP text for a problem given as JSON.
#[wasm_bindgen]
pub fn write(lp: &str) -> Result<String, JsValue> {
    let spec = ProblemSpec::parse(lp).map_err(to_js)?;
    let problem = ModelBuilder::build(&spec).map_err(to_js)?;
    Ok(write_lp(&problem))
}

#[wasm_bindgen]
pub fn version() -> String {
    VERSION.to_string()
}
