//! Ready-made scenes, one per screen of the simulation
//!
//! Toolbox positions are left to the host; call
//! `Scene::initialize_default_toolbox_positions` when there is no layout.

use crate::config::SceneConfig;
use crate::error::ModelResult;
use crate::model::{Scene, TermKind, Variable, VariableId};

/// Range of every variable's picker
pub const VARIABLE_RANGE: (i64, i64) = (-10, 10);

fn variable(symbol: &str, value: i64) -> Variable {
    Variable::new(symbol, value, VARIABLE_RANGE.0, VARIABLE_RANGE.1)
}

fn locking() -> SceneConfig {
    SceneConfig {
        locked: Some(false),
        combine_like_terms: false,
        ..SceneConfig::default()
    }
}

/// Pictures of objects with hidden weights, plus constants. Separate cells, lock.
pub fn basics() -> ModelResult<Scene> {
    Scene::new(
        locking(),
        vec![variable("sphere", 2), variable("square", 3)],
        &[
            TermKind::Object(VariableId(0)),
            TermKind::Object(VariableId(1)),
            TermKind::Constant,
        ],
    )
}

/// Constants only. Separate cells, lock.
pub fn numbers() -> ModelResult<Scene> {
    Scene::new(locking(), vec![], &[TermKind::Constant])
}

/// `x` and constants. Separate cells, lock.
pub fn variables() -> ModelResult<Scene> {
    Scene::new(
        locking(),
        vec![variable("x", 1)],
        &[TermKind::Variable(VariableId(0)), TermKind::Constant],
    )
}

/// `x` and constants with like terms combined and universal operations. No lock.
pub fn operations() -> ModelResult<Scene> {
    Scene::new(
        SceneConfig::combining(),
        vec![variable("x", 1)],
        &[TermKind::Variable(VariableId(0)), TermKind::Constant],
    )
}

/// Every preset by name
pub fn by_name(name: &str) -> Option<ModelResult<Scene>> {
    match name {
        "basics" => Some(basics()),
        "numbers" => Some(numbers()),
        "variables" => Some(variables()),
        "operations" => Some(operations()),
        _ => None,
    }
}
