//! Terms: the value-bearing pieces placed on the scale
//!
//! A term's value never changes after creation. "Changing" a term means
//! disposing it and creating a new one from the result of `plus`, `minus`,
//! `times`, `divide` or `apply_operation`.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::fraction::Fraction;
use super::operation::{Operand, Operator, UniversalOperation};
use super::term_creator::CreatorId;
use super::variable::{Variable, VariableId};
use crate::Bounds;
use crate::error::{ModelError, ModelResult};

/// Unique term identifier. Never reused, so a missing id means disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermId(pub u32);

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    pub fn of(value: Fraction) -> Self {
        match value.signum() {
            1 => Sign::Positive,
            -1 => Sign::Negative,
            _ => Sign::Zero,
        }
    }

    pub fn as_fraction(self) -> Fraction {
        match self {
            Sign::Positive => Fraction::ONE,
            Sign::Negative => -Fraction::ONE,
            Sign::Zero => Fraction::ZERO,
        }
    }
}

/// What a term creator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermKind {
    Constant,
    Variable(VariableId),
    Object(VariableId),
}

impl TermKind {
    /// Unit value with the given sign (1, x or one object)
    pub fn unit_value(&self, sign: Sign) -> TermValue {
        self.value_with(sign.as_fraction())
    }

    /// Transient zero value used when a like-terms cell is empty
    pub fn zero_value(&self) -> TermValue {
        self.value_with(Fraction::ZERO)
    }

    fn value_with(&self, significant: Fraction) -> TermValue {
        match *self {
            TermKind::Constant => TermValue::Constant { value: significant },
            TermKind::Variable(variable) => TermValue::Variable {
                coefficient: significant,
                variable,
            },
            TermKind::Object(variable) => TermValue::Object {
                count: significant,
                variable,
            },
        }
    }
}

/// Closed set of term variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermValue {
    Constant {
        value: Fraction,
    },
    Variable {
        coefficient: Fraction,
        variable: VariableId,
    },
    /// A picture of an object whose weight is a hidden variable
    Object {
        count: Fraction,
        variable: VariableId,
    },
}

impl TermValue {
    pub fn kind(&self) -> TermKind {
        match *self {
            TermValue::Constant { .. } => TermKind::Constant,
            TermValue::Variable { variable, .. } => TermKind::Variable(variable),
            TermValue::Object { variable, .. } => TermKind::Object(variable),
        }
    }

    /// Constant value, coefficient or object count
    pub fn significant_value(&self) -> Fraction {
        match *self {
            TermValue::Constant { value } => value,
            TermValue::Variable { coefficient, .. } => coefficient,
            TermValue::Object { count, .. } => count,
        }
    }

    pub fn sign(&self) -> Sign {
        Sign::of(self.significant_value())
    }

    fn with_significant_value(&self, significant: Fraction) -> TermValue {
        self.kind().value_with(significant)
    }

    pub fn negated(&self) -> TermValue {
        self.with_significant_value(-self.significant_value())
    }

    /// Constants are all alike; variable and object terms are alike per variable
    pub fn is_like(&self, other: &TermValue) -> bool {
        self.kind() == other.kind()
    }

    pub fn is_equivalent(&self, other: &TermValue) -> bool {
        self.is_like(other) && self.significant_value() == other.significant_value()
    }

    pub fn is_inverse(&self, other: &TermValue) -> bool {
        self.is_like(other) && (self.significant_value() + other.significant_value()).is_zero()
    }

    pub fn weight(&self, variables: &[Variable]) -> Fraction {
        match *self {
            TermValue::Constant { value } => value,
            TermValue::Variable {
                coefficient,
                variable,
            }
            | TermValue::Object {
                count: coefficient,
                variable,
            } => {
                let value = variables
                    .get(variable.0)
                    .map(Variable::value_fraction)
                    .unwrap_or(Fraction::ZERO);
                coefficient * value
            }
        }
    }

    pub fn exceeds(&self, max_integer: i64) -> bool {
        self.significant_value().exceeds(max_integer)
    }

    /// Sum of two like terms. Object terms have no arithmetic.
    pub fn plus(&self, other: &TermValue) -> Option<TermValue> {
        if !self.is_like(other) || matches!(self, TermValue::Object { .. }) {
            return None;
        }
        Some(self.with_significant_value(self.significant_value() + other.significant_value()))
    }

    pub fn minus(&self, other: &TermValue) -> Option<TermValue> {
        self.plus(&other.negated())
    }

    pub fn times(&self, factor: Fraction) -> Option<TermValue> {
        match self {
            TermValue::Object { .. } => None,
            _ => Some(self.with_significant_value(self.significant_value() * factor)),
        }
    }

    /// `None` for a zero divisor
    pub fn divide(&self, divisor: Fraction) -> Option<TermValue> {
        match self {
            TermValue::Object { .. } => None,
            _ => self
                .significant_value()
                .checked_div(divisor)
                .map(|v| self.with_significant_value(v)),
        }
    }

    /// New value after the operation, or `None` if it does not apply here
    pub fn apply_operation(&self, operation: &UniversalOperation) -> Option<TermValue> {
        match (self, operation.operator, operation.operand) {
            (TermValue::Object { .. }, _, _) => None,
            (_, Operator::Plus, operand) => self.plus(&operand_value(operand)),
            (_, Operator::Minus, operand) => self.minus(&operand_value(operand)),
            (_, Operator::Times, Operand::Constant(factor)) => self.times(factor),
            (_, Operator::Divide, Operand::Constant(divisor)) => self.divide(divisor),
            // Only constants scale a term
            (_, Operator::Times | Operator::Divide, Operand::Variable { .. }) => None,
        }
    }
}

fn operand_value(operand: Operand) -> TermValue {
    match operand {
        Operand::Constant(value) => TermValue::Constant { value },
        Operand::Variable {
            coefficient,
            variable,
        } => TermValue::Variable {
            coefficient,
            variable,
        },
    }
}

impl fmt::Display for TermValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermValue::Constant { value } => write!(f, "{value}"),
            TermValue::Variable {
                coefficient,
                variable,
            } => write!(f, "{coefficient}{variable}"),
            TermValue::Object { count, variable } => write!(f, "{count}[{variable}]"),
        }
    }
}

/// Everything needed to rebuild an equivalent term
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermOptions {
    pub value: TermValue,
    pub diameter: f32,
}

/// In-flight motion toward a destination
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub destination: Vec2,
    pub speed: f32,
}

/// Result of advancing a term's motion by one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStatus {
    Idle,
    Moving,
    Arrived,
}

/// A term instance
#[derive(Debug, Clone)]
pub struct Term {
    pub id: TermId,
    pub creator: CreatorId,
    value: TermValue,
    pub diameter: f32,
    pub position: Vec2,
    pub drag_bounds: Bounds,
    pub toolbox_position: Vec2,
    pub dragging: bool,
    pub on_plate: bool,
    pub shadow_visible: bool,
    pub halo_visible: bool,
    pub pickable: bool,
    motion: Option<Motion>,
}

impl Term {
    pub fn new(id: TermId, creator: CreatorId, options: TermOptions, position: Vec2) -> Self {
        Self {
            id,
            creator,
            value: options.value,
            diameter: options.diameter,
            position,
            drag_bounds: Bounds::EVERYTHING,
            toolbox_position: position,
            dragging: false,
            on_plate: false,
            shadow_visible: false,
            halo_visible: false,
            pickable: true,
            motion: None,
        }
    }

    #[inline]
    pub fn value(&self) -> &TermValue {
        &self.value
    }

    pub fn sign(&self) -> Sign {
        self.value.sign()
    }

    pub fn weight(&self, variables: &[Variable]) -> Fraction {
        self.value.weight(variables)
    }

    pub fn is_like_term(&self, other: &Term) -> bool {
        self.value.is_like(&other.value)
    }

    pub fn is_equivalent_term(&self, other: &Term) -> bool {
        self.value.is_equivalent(&other.value)
    }

    pub fn is_inverse_term(&self, other: &Term) -> bool {
        self.value.is_inverse(&other.value)
    }

    pub fn copy_options(&self) -> TermOptions {
        TermOptions {
            value: self.value,
            diameter: self.diameter,
        }
    }

    pub fn inverse_options(&self) -> TermOptions {
        TermOptions {
            value: self.value.negated(),
            diameter: self.diameter,
        }
    }

    /// Snap to a position, cancelling any motion
    pub fn move_to(&mut self, position: Vec2) {
        self.motion = None;
        self.position = position;
    }

    /// Start moving toward `destination`. `pickable` applies until arrival.
    pub fn animate_to(&mut self, destination: Vec2, speed: f32, pickable: bool) {
        self.pickable = pickable;
        self.motion = Some(Motion { destination, speed });
    }

    pub fn halt_animation(&mut self) {
        if self.motion.take().is_some() {
            self.pickable = true;
        }
    }

    pub fn is_animating(&self) -> bool {
        self.motion.is_some()
    }

    pub fn destination(&self) -> Option<Vec2> {
        self.motion.map(|m| m.destination)
    }

    /// Advance motion by `dt` seconds
    pub fn advance(&mut self, dt: f32) -> MotionStatus {
        let Some(motion) = self.motion else {
            return MotionStatus::Idle;
        };
        let to_go = motion.destination - self.position;
        let step = motion.speed * dt;
        if to_go.length() <= step {
            self.position = motion.destination;
            self.motion = None;
            self.pickable = true;
            MotionStatus::Arrived
        } else {
            self.position += to_go.normalize_or_zero() * step;
            MotionStatus::Moving
        }
    }
}

/// Owner of every live term, keyed by id (stable iteration order)
#[derive(Debug, Clone, Default)]
pub struct TermPool {
    terms: BTreeMap<TermId, Term>,
    next_id: u32,
}

impl TermPool {
    pub fn new() -> Self {
        Self {
            terms: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocate an id and store the term built for it
    pub fn insert_with(&mut self, build: impl FnOnce(TermId) -> Term) -> TermId {
        let id = TermId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.terms.insert(id, build(id));
        id
    }

    pub fn get(&self, id: TermId) -> Option<&Term> {
        self.terms.get(&id)
    }

    pub fn get_mut(&mut self, id: TermId) -> Option<&mut Term> {
        self.terms.get_mut(&id)
    }

    /// Like `get`, but distinguishes disposed ids from ids never issued
    pub fn try_get(&self, id: TermId) -> ModelResult<&Term> {
        self.terms.get(&id).ok_or_else(|| self.missing(id))
    }

    pub fn try_get_mut(&mut self, id: TermId) -> ModelResult<&mut Term> {
        let missing = self.missing(id);
        self.terms.get_mut(&id).ok_or(missing)
    }

    fn missing(&self, id: TermId) -> ModelError {
        if id.0 > 0 && id.0 < self.next_id {
            ModelError::TermDisposed(id)
        } else {
            ModelError::UnknownTerm(id)
        }
    }

    pub fn is_disposed(&self, id: TermId) -> bool {
        !self.terms.contains_key(&id)
    }

    pub(crate) fn remove(&mut self, id: TermId) -> Option<Term> {
        self.terms.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.values()
    }

    pub fn ids(&self) -> Vec<TermId> {
        self.terms.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(v: i64) -> TermValue {
        TermValue::Constant {
            value: Fraction::from(v),
        }
    }

    fn x(c: i64) -> TermValue {
        TermValue::Variable {
            coefficient: Fraction::from(c),
            variable: VariableId(0),
        }
    }

    #[test]
    fn test_likeness() {
        let y = TermValue::Variable {
            coefficient: Fraction::ONE,
            variable: VariableId(1),
        };
        assert!(constant(3).is_like(&constant(-7)));
        assert!(x(2).is_like(&x(-5)));
        assert!(!x(2).is_like(&y));
        assert!(!x(2).is_like(&constant(2)));

        let sphere = TermValue::Object {
            count: Fraction::ONE,
            variable: VariableId(0),
        };
        assert!(!sphere.is_like(&x(1)));
    }

    #[test]
    fn test_equivalent_and_inverse() {
        assert!(x(3).is_equivalent(&x(3)));
        assert!(!x(3).is_equivalent(&x(-3)));
        assert!(x(3).is_inverse(&x(-3)));
        assert!(!constant(3).is_inverse(&x(-3)));
    }

    #[test]
    fn test_weight_uses_variable_value() {
        let vars = vec![Variable::new("x", 4, -10, 10)];
        assert_eq!(x(-2).weight(&vars), Fraction::from(-8));
        assert_eq!(constant(5).weight(&vars), Fraction::from(5));
        let object = TermValue::Object {
            count: Fraction::from(2),
            variable: VariableId(0),
        };
        assert_eq!(object.weight(&vars), Fraction::from(8));
    }

    #[test]
    fn test_apply_operation_dispatch() {
        let plus_three = UniversalOperation::constant(Operator::Plus, 3);
        assert_eq!(constant(2).apply_operation(&plus_three), Some(constant(5)));
        assert_eq!(x(2).apply_operation(&plus_three), None);

        let minus_x = UniversalOperation::variable(Operator::Minus, 1, VariableId(0));
        assert_eq!(x(2).apply_operation(&minus_x), Some(x(1)));
        assert_eq!(constant(2).apply_operation(&minus_x), None);

        let times_two = UniversalOperation::constant(Operator::Times, 2);
        assert_eq!(x(-3).apply_operation(&times_two), Some(x(-6)));

        let div_two = UniversalOperation::constant(Operator::Divide, 2);
        assert_eq!(
            constant(3).apply_operation(&div_two),
            Some(TermValue::Constant {
                value: Fraction::new(3, 2)
            })
        );
    }

    #[test]
    fn test_divide_by_zero_is_not_applicable() {
        let div_zero = UniversalOperation::constant(Operator::Divide, 0);
        assert_eq!(constant(3).apply_operation(&div_zero), None);
        assert_eq!(x(3).apply_operation(&div_zero), None);
    }

    #[test]
    fn test_objects_have_no_arithmetic() {
        let object = TermValue::Object {
            count: Fraction::ONE,
            variable: VariableId(0),
        };
        assert_eq!(object.plus(&object), None);
        let op = UniversalOperation::constant(Operator::Times, 2);
        assert_eq!(object.apply_operation(&op), None);
    }

    #[test]
    fn test_motion_arrives_and_restores_pickable() {
        let options = TermOptions {
            value: constant(1),
            diameter: 10.0,
        };
        let mut term = Term::new(TermId(1), CreatorId(0), options, Vec2::ZERO);
        term.animate_to(Vec2::new(100.0, 0.0), 400.0, false);
        assert!(!term.pickable);
        assert_eq!(term.advance(0.1), MotionStatus::Moving);
        assert!((term.position.x - 40.0).abs() < 1e-4);
        assert_eq!(term.advance(0.5), MotionStatus::Arrived);
        assert_eq!(term.position, Vec2::new(100.0, 0.0));
        assert!(term.pickable);
        assert_eq!(term.advance(0.1), MotionStatus::Idle);
    }

    #[test]
    fn test_pool_reports_disposed_ids() {
        let mut pool = TermPool::new();
        let options = TermOptions {
            value: constant(1),
            diameter: 10.0,
        };
        let id = pool.insert_with(|id| Term::new(id, CreatorId(0), options, Vec2::ZERO));
        assert!(pool.try_get(id).is_ok());
        pool.remove(id);
        assert!(pool.is_disposed(id));
        assert_eq!(pool.try_get(id).unwrap_err(), ModelError::TermDisposed(id));
        assert_eq!(
            pool.try_get(TermId(99)).unwrap_err(),
            ModelError::UnknownTerm(TermId(99))
        );
    }
}
