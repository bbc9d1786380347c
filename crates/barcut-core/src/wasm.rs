//! WASM bindings for barcut
//!
//! JavaScript-friendly entry points for browser front ends. Inputs and
//! outputs cross the boundary as plain objects via `serde-wasm-bindgen`.

use wasm_bindgen::prelude::*;

use crate::catalog::{Catalog, CatalogInput};
use crate::config::OptimizerConfig;
use crate::optimizer::PlanOptimizer;
use crate::pattern::generate_patterns_bounded;

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Optimize a catalog `{ stock_lengths, demand: [{ code, length, qty }] }`
/// and return the cutting plan. `options` may be `undefined`.
#[wasm_bindgen]
pub fn optimize(catalog: JsValue, options: JsValue) -> Result<JsValue, JsValue> {
    let input: CatalogInput = serde_wasm_bindgen::from_value(catalog).map_err(to_js)?;
    let mut config: OptimizerConfig = if options.is_undefined() || options.is_null() {
        OptimizerConfig::default()
    } else {
        serde_wasm_bindgen::from_value(options).map_err(to_js)?
    };
    // wasm32-unknown-unknown has no std clock; the node budget bounds the search
    config.time_limit = None;

    let catalog = Catalog::from_input(&input).map_err(to_js)?;
    let plan = PlanOptimizer::new(config).optimize(&catalog).map_err(to_js)?;
    serde_wasm_bindgen::to_value(&plan).map_err(to_js)
}

/// List the cutting patterns of one stock length.
#[wasm_bindgen]
pub fn patterns(stock_length: u32, demand_lengths: &[u32]) -> Result<JsValue, JsValue> {
    if stock_length == 0 || demand_lengths.contains(&0) {
        return Err(JsValue::from_str("lengths must be positive"));
    }
    let lengths: Vec<u64> = demand_lengths.iter().map(|&l| l as u64).collect();
    let limit = OptimizerConfig::default().max_patterns;
    let patterns = generate_patterns_bounded(stock_length as u64, &lengths, limit).map_err(to_js)?;
    serde_wasm_bindgen::to_value(&patterns).map_err(to_js)
}
