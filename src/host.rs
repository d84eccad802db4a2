//! # Host Binding Surface
//!
//! The narrow, fallible interface a scripting-host binding calls. Bindings
//! marshal incoming host objects into [`Value`]s (or, for operator right-hand
//! sides, resolve them into an [`Operand`]) and route them through the
//! checked constructors, setters, and operators defined here. Everything the
//! host can observe goes through this module; the typed core in
//! [`crate::vector`] stays infallible.
//!
//! Numeric coercion is capability based: anything that widens to `f64`
//! through [`num_traits::ToPrimitive`] counts as numeric. Today that means
//! [`Value::Int`] and [`Value::Float`]; strings, sequences, mappings, and
//! opaque host objects are rejected with errors naming the host-level type.

use std::collections::BTreeMap;
use std::fmt;

use num_traits::ToPrimitive;

use crate::vector::{Vector, VectorState};
use crate::{Result, VectorError};

/// A loosely typed value handed over by the host binding
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Host integer
    Int(i64),
    /// Host floating-point number
    Float(f64),
    /// Host string
    Str(String),
    /// Host sequence, already drained into a list
    List(Vec<Value>),
    /// Host mapping with string keys
    Map(BTreeMap<String, Value>),
    /// Any other host object; carries the host-level type name for error
    /// messages
    Opaque(&'static str),
}

impl Value {
    /// Host-level type name, as it should appear in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
            Value::Opaque(name) => name,
        }
    }

    /// Numeric coercion: integers and floats widen to `f64`, nothing else.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => i.to_f64(),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Caller-facing name of the value being validated, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The optional triple passed to the constructor
    ConstructorArg,
    /// The `cart` attribute
    CartesianComponent,
    /// The `sph` attribute
    SphericalComponent,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::ConstructorArg => "Vector constructor first argument",
            Field::CartesianComponent => "Vector cartesian component",
            Field::SphericalComponent => "Vector spherical component",
        };
        f.write_str(name)
    }
}

/// Validates a host value as a triple of numerics
///
/// The value must be a sequence of exactly three numeric elements. Errors
/// identify the field, the failing index, and the offending host type; the
/// caller's stored state is never touched on failure.
pub fn expect_triple(value: &Value, field: Field) -> Result<[f64; 3]> {
    let items = match value {
        Value::List(items) => items,
        other => {
            return Err(VectorError::NotASequence {
                field,
                type_name: other.type_name().to_string(),
            })
        }
    };
    if items.len() != 3 {
        return Err(VectorError::WrongLength {
            field,
            got: items.len(),
        });
    }
    let mut out = [0.0; 3];
    for (i, item) in items.iter().enumerate() {
        out[i] = item.as_f64().ok_or_else(|| VectorError::BadElement {
            field,
            index: i,
            type_name: item.type_name().to_string(),
        })?;
    }
    Ok(out)
}

fn expect_scalar(value: &Value, component: &'static str) -> Result<f64> {
    value.as_f64().ok_or_else(|| VectorError::NotNumeric {
        component,
        type_name: value.type_name().to_string(),
    })
}

/// Right-hand operand of a binary operator, resolved by the binding before
/// dispatch
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// A numeric operand, already widened to `f64`
    Scalar(f64),
    /// Another vector
    Vector(&'a Vector),
    /// Anything else; carries the host-level type name
    Opaque(&'static str),
}

impl Operand<'_> {
    fn type_name(&self) -> &str {
        match self {
            Operand::Scalar(_) => "float",
            Operand::Vector(_) => "Vector",
            Operand::Opaque(name) => name,
        }
    }
}

impl<'a> From<&'a Vector> for Operand<'a> {
    fn from(v: &'a Vector) -> Self {
        Operand::Vector(v)
    }
}

impl<'a> From<f64> for Operand<'a> {
    fn from(v: f64) -> Self {
        Operand::Scalar(v)
    }
}

impl Vector {
    /// Checked constructor taking the host's optional positional argument
    ///
    /// With no argument the vector is the origin with a fully stale
    /// spherical cache; otherwise the argument must validate as a numeric
    /// triple.
    pub fn from_value(value: Option<&Value>) -> Result<Vector> {
        match value {
            None => Ok(Vector::default()),
            Some(v) => {
                let [x, y, z] = expect_triple(v, Field::ConstructorArg)?;
                Ok(Vector::new(x, y, z))
            }
        }
    }

    /// Checked whole-triple Cartesian setter
    ///
    /// On success replaces the triple atomically and invalidates the
    /// spherical cache; on failure the vector is left unchanged.
    pub fn set_cart_value(&mut self, value: &Value) -> Result<()> {
        let [x, y, z] = expect_triple(value, Field::CartesianComponent)?;
        self.set_cart(x, y, z);
        Ok(())
    }

    /// Checked whole-triple spherical setter
    ///
    /// On failure the spherical cache is left fully stale and the Cartesian
    /// triple untouched; the next spherical read rebuilds from Cartesian.
    pub fn set_sph_value(&mut self, value: &Value) -> Result<()> {
        match expect_triple(value, Field::SphericalComponent) {
            Ok([r, lat, lon]) => {
                self.set_sph(r, lat, lon);
                Ok(())
            }
            Err(e) => {
                self.invalidate_sph();
                Err(e)
            }
        }
    }

    /// Checked Cartesian X setter.
    pub fn set_x_value(&mut self, value: &Value) -> Result<()> {
        self.set_x(expect_scalar(value, "x")?);
        Ok(())
    }

    /// Checked Cartesian Y setter.
    pub fn set_y_value(&mut self, value: &Value) -> Result<()> {
        self.set_y(expect_scalar(value, "y")?);
        Ok(())
    }

    /// Checked Cartesian Z setter.
    pub fn set_z_value(&mut self, value: &Value) -> Result<()> {
        self.set_z(expect_scalar(value, "z")?);
        Ok(())
    }

    /// Checked radius setter
    ///
    /// All three spherical fields materialize before the value is checked,
    /// so a failed set leaves the cache warm and the stored values
    /// unchanged.
    pub fn set_r_value(&mut self, value: &Value) -> Result<()> {
        self.sph();
        self.set_r(expect_scalar(value, "r")?);
        Ok(())
    }

    /// Checked latitude setter; materializes like [`Vector::set_r_value`].
    pub fn set_lat_value(&mut self, value: &Value) -> Result<()> {
        self.sph();
        self.set_lat(expect_scalar(value, "lat")?);
        Ok(())
    }

    /// Checked longitude setter; materializes like [`Vector::set_r_value`].
    pub fn set_lon_value(&mut self, value: &Value) -> Result<()> {
        self.sph();
        self.set_lon(expect_scalar(value, "lon")?);
        Ok(())
    }

    /// `+` operator: the right-hand operand must be another vector.
    pub fn checked_add(&self, rhs: Operand<'_>) -> Result<Vector> {
        match rhs {
            Operand::Vector(other) => Ok(self + other),
            other => Err(VectorError::UnsupportedOperand {
                op: "+",
                type_name: other.type_name().to_string(),
            }),
        }
    }

    /// `-` operator: the right-hand operand must be another vector.
    pub fn checked_sub(&self, rhs: Operand<'_>) -> Result<Vector> {
        match rhs {
            Operand::Vector(other) => Ok(self - other),
            other => Err(VectorError::UnsupportedOperand {
                op: "-",
                type_name: other.type_name().to_string(),
            }),
        }
    }

    /// `*` operator: scalar operands multiply componentwise, vector
    /// operands take the cross product.
    pub fn checked_mul(&self, rhs: Operand<'_>) -> Result<Vector> {
        match rhs {
            Operand::Scalar(k) => Ok(self * k),
            Operand::Vector(other) => Ok(self.cross(other)),
            other => Err(VectorError::UnsupportedOperand {
                op: "*",
                type_name: other.type_name().to_string(),
            }),
        }
    }

    /// `dot` method: the operand must be another vector.
    pub fn checked_dot(&self, rhs: Operand<'_>) -> Result<f64> {
        match rhs {
            Operand::Vector(other) => Ok(self.dot(other)),
            other => Err(VectorError::BadDotOperand {
                type_name: other.type_name().to_string(),
            }),
        }
    }

    /// Snapshots raw stored state as a host mapping
    ///
    /// Stale spherical fields cross the host boundary as NaN, the host-side
    /// sentinel for "not yet derived"; [`Vector::set_state_value`] maps
    /// them back to stale.
    pub fn get_state_value(&self) -> Value {
        let state = self.get_state();
        let mut map = BTreeMap::new();
        map.insert(
            "cart".to_string(),
            Value::List(state.cart.iter().map(|&c| Value::Float(c)).collect()),
        );
        map.insert(
            "sph".to_string(),
            Value::List(
                state
                    .sph
                    .iter()
                    .map(|s| Value::Float(s.unwrap_or(f64::NAN)))
                    .collect(),
            ),
        );
        Value::Map(map)
    }

    /// Restores raw stored state from a host mapping
    ///
    /// Requires a mapping carrying both `"cart"` and `"sph"`; a missing key
    /// is an error naming that key. This is the trusted round-trip path:
    /// triples restore verbatim with no validation or invalidation.
    pub fn set_state_value(&mut self, value: &Value) -> Result<()> {
        let map = match value {
            Value::Map(map) => map,
            other => {
                return Err(VectorError::StateNotAMapping {
                    type_name: other.type_name().to_string(),
                })
            }
        };
        let cart = state_triple(map, "cart")?;
        let sph = state_triple(map, "sph")?;
        self.set_state(&VectorState {
            cart,
            sph: [
                stale_from_sentinel(sph[0]),
                stale_from_sentinel(sph[1]),
                stale_from_sentinel(sph[2]),
            ],
        });
        Ok(())
    }
}

// Trusted restore path: only key presence is checked, elements coerce
// blindly with NaN standing in for anything non-numeric.
fn state_triple(map: &BTreeMap<String, Value>, key: &'static str) -> Result<[f64; 3]> {
    let value = map.get(key).ok_or(VectorError::MissingStateKey(key))?;
    let mut out = [f64::NAN; 3];
    if let Value::List(items) = value {
        for (slot, item) in out.iter_mut().zip(items) {
            if let Some(v) = item.as_f64() {
                *slot = v;
            }
        }
    }
    Ok(out)
}

fn stale_from_sentinel(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}
