//! Typed view of a decoded problem specification.
//!
//! Decoding walks the JSON tree by hand so that a missing or mistyped field
//! is reported with its name and its path, e.g. `$.subjectTo[2].bnds.type`.

use std::time::Duration;

use lpkit_solver::{BoundType, Direction, MessageLevel, SolveConfig};
use serde_json::{Map, Value};

use crate::codec;
use crate::error::SpecError;

/// A `{name, coef}` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub name: String,
    pub coef: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub direction: Direction,
    pub vars: Vec<Term>,
}

/// `{type, lb, ub}`. Components the type does not use are ignored later.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub bound_type: BoundType,
    pub lb: f64,
    pub ub: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub vars: Vec<Term>,
    pub bnds: Bounds,
}

/// An entry of the optional `bounds` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBound {
    pub name: String,
    pub bnds: Bounds,
}

/// Solve options carried by the input or supplied by the host.
///
/// `None` means "use the default". Negative numeric values are read as
/// absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub mip_gap: Option<f64>,
    /// Seconds
    pub time_limit: Option<f64>,
    pub msg_level: Option<MessageLevel>,
    pub presolve: Option<bool>,
    pub iteration_limit: Option<usize>,
    /// Report row activities in the output
    pub rows: Option<bool>,
}

impl Options {
    /// Fields set in `overrides` win over fields set here.
    pub fn merged(&self, overrides: &Options) -> Options {
        Options {
            mip_gap: overrides.mip_gap.or(self.mip_gap),
            time_limit: overrides.time_limit.or(self.time_limit),
            msg_level: overrides.msg_level.or(self.msg_level),
            presolve: overrides.presolve.or(self.presolve),
            iteration_limit: overrides.iteration_limit.or(self.iteration_limit),
            rows: overrides.rows.or(self.rows),
        }
    }

    pub fn solve_config(&self) -> SolveConfig {
        let mut config = SolveConfig::default();
        if let Some(level) = self.msg_level {
            config = config.with_msg_level(level);
        }
        if let Some(limit) = self.time_limit.and_then(|s| Duration::try_from_secs_f64(s).ok()) {
            config = config.with_time_limit(limit);
        }
        if let Some(limit) = self.iteration_limit {
            config = config.with_iteration_limit(limit);
        }
        if let Some(presolve) = self.presolve {
            config = config.with_presolve(presolve);
        }
        if let Some(gap) = self.mip_gap {
            config = config.with_mip_gap(gap);
        }
        config
    }

    pub fn rows(&self) -> bool {
        self.rows.unwrap_or(false)
    }

    /// Decode a standalone options object, as passed next to a spec.
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let value = codec::decode(text)?;
        Options::from_node(&Node::root(&value))
    }

    fn from_node(node: &Node) -> Result<Self, SpecError> {
        let obj = node.object()?;
        let non_negative = |key: &str| -> Result<Option<f64>, SpecError> {
            let value = node.optional(obj, key).map(|n| n.number()).transpose()?;
            Ok(value.filter(|x| *x >= 0.0))
        };
        let msg_level = match node.optional(obj, "msglev") {
            Some(n) => Some(
                MessageLevel::from_code(n.integer()?)
                    .ok_or_else(|| n.invalid("a message level 0-4"))?,
            ),
            None => None,
        };
        let iteration_limit = match node.optional(obj, "itlim") {
            Some(n) => usize::try_from(n.integer()?).ok(),
            None => None,
        };
        Ok(Options {
            mip_gap: non_negative("mipgap")?,
            time_limit: non_negative("tmlim")?,
            msg_level,
            presolve: node.optional(obj, "presol").map(|n| n.flag()).transpose()?,
            iteration_limit,
            rows: node.optional(obj, "rows").map(|n| n.flag()).transpose()?,
        })
    }
}

/// A complete problem specification.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSpec {
    pub name: String,
    pub objective: Objective,
    pub subject_to: Vec<Constraint>,
    pub bounds: Vec<ColumnBound>,
    pub generals: Vec<String>,
    pub binaries: Vec<String>,
    pub options: Options,
}

impl ProblemSpec {
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let value = codec::decode(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, SpecError> {
        let root = Node::root(value);
        let obj = root.object()?;

        let name = match root.optional(obj, "name") {
            Some(n) => n.string()?.to_string(),
            None => String::new(),
        };

        let objective = root.require(obj, "objective")?;
        let objective = {
            let o = objective.object()?;
            let direction = objective.require(o, "direction")?;
            Objective {
                direction: Direction::from_code(direction.integer()?)
                    .ok_or_else(|| direction.invalid("1 (minimize) or 2 (maximize)"))?,
                vars: terms(&objective.require(o, "vars")?)?,
            }
        };

        let subject_to = root
            .require(obj, "subjectTo")?
            .items()?
            .map(|c| -> Result<Constraint, SpecError> {
                let o = c.object()?;
                Ok(Constraint {
                    name: c.require(o, "name")?.string()?.to_string(),
                    vars: terms(&c.require(o, "vars")?)?,
                    bnds: bounds_of(&c.require(o, "bnds")?)?,
                })
            })
            .collect::<Result<Vec<_>, SpecError>>()?;

        let bounds = match root.optional(obj, "bounds") {
            Some(section) => section
                .items()?
                .map(|b| -> Result<ColumnBound, SpecError> {
                    let o = b.object()?;
                    Ok(ColumnBound {
                        name: b.require(o, "name")?.string()?.to_string(),
                        bnds: bounds_of(&b)?,
                    })
                })
                .collect::<Result<Vec<_>, SpecError>>()?,
            None => Vec::new(),
        };

        let names = |key: &str| -> Result<Vec<String>, SpecError> {
            match root.optional(obj, key) {
                Some(section) => section
                    .items()?
                    .map(|n| n.string().map(str::to_string))
                    .collect(),
                None => Ok(Vec::new()),
            }
        };

        let options = match root.optional(obj, "options") {
            Some(n) => Options::from_node(&n)?,
            None => Options::default(),
        };

        Ok(ProblemSpec {
            name,
            objective,
            subject_to,
            bounds,
            generals: names("generals")?,
            binaries: names("binaries")?,
            options,
        })
    }
}

fn terms(node: &Node) -> Result<Vec<Term>, SpecError> {
    node.items()?
        .map(|t| -> Result<Term, SpecError> {
            let o = t.object()?;
            Ok(Term {
                name: t.require(o, "name")?.string()?.to_string(),
                coef: t.require(o, "coef")?.number()?,
            })
        })
        .collect()
}

/// `lb`/`ub` default to 0 when absent; `type` is required.
fn bounds_of(node: &Node) -> Result<Bounds, SpecError> {
    let o = node.object()?;
    let ty = node.require(o, "type")?;
    let bound_type = BoundType::from_code(ty.integer()?).ok_or_else(|| ty.invalid("a bound type 1-5"))?;
    let side = |key: &str| -> Result<f64, SpecError> {
        Ok(node.optional(o, key).map(|n| n.number()).transpose()?.unwrap_or(0.0))
    };
    Ok(Bounds {
        bound_type,
        lb: side("lb")?,
        ub: side("ub")?,
    })
}

/// A value together with where it sits in the input.
struct Node<'a> {
    value: &'a Value,
    field: String,
    path: String,
}

impl<'a> Node<'a> {
    fn root(value: &'a Value) -> Self {
        Node {
            value,
            field: "$".to_string(),
            path: "$".to_string(),
        }
    }

    fn invalid(&self, expected: &'static str) -> SpecError {
        SpecError::malformed(&self.field, &self.path, expected)
    }

    fn child(&self, key: &str, value: &'a Value) -> Node<'a> {
        Node {
            value,
            field: key.to_string(),
            path: format!("{}.{}", self.path, key),
        }
    }

    /// `null` counts as absent.
    fn optional(&self, obj: &'a Map<String, Value>, key: &str) -> Option<Node<'a>> {
        obj.get(key)
            .filter(|v| !v.is_null())
            .map(|v| self.child(key, v))
    }

    fn require(&self, obj: &'a Map<String, Value>, key: &str) -> Result<Node<'a>, SpecError> {
        self.optional(obj, key)
            .ok_or_else(|| SpecError::malformed(key, &self.path, "a value"))
    }

    fn object(&self) -> Result<&'a Map<String, Value>, SpecError> {
        self.value.as_object().ok_or_else(|| self.invalid("an object"))
    }

    fn items(&self) -> Result<impl Iterator<Item = Node<'a>> + '_, SpecError> {
        let items = self.value.as_array().ok_or_else(|| self.invalid("an array"))?;
        Ok(items.iter().enumerate().map(move |(i, value)| Node {
            value,
            field: self.field.clone(),
            path: format!("{}[{}]", self.path, i),
        }))
    }

    fn string(&self) -> Result<&'a str, SpecError> {
        self.value.as_str().ok_or_else(|| self.invalid("a string"))
    }

    fn number(&self) -> Result<f64, SpecError> {
        codec::to_f64(self.value).ok_or_else(|| self.invalid("a number"))
    }

    /// Integral floats such as `2.0` count as integers.
    fn integer(&self) -> Result<i64, SpecError> {
        if let Some(n) = self.value.as_i64() {
            return Ok(n);
        }
        self.value
            .as_f64()
            .filter(|x| x.fract() == 0.0 && *x >= i64::MIN as f64 && *x < i64::MAX as f64)
            .map(|x| x as i64)
            .ok_or_else(|| self.invalid("an integer"))
    }

    /// Booleans, or numbers read as truthy when non-zero.
    fn flag(&self) -> Result<bool, SpecError> {
        match self.value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|x| x != 0.0)),
            _ => Err(self.invalid("a boolean")),
        }
    }
}
