//! Result serialization.

use std::collections::HashMap;
use std::fmt;

use lpkit_solver::{Problem, Solution, Status};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec;
use crate::error::SpecError;

/// Name-to-number map that keeps insertion order on the wire.
///
/// A repeated name overwrites the earlier value in place, so every key is
/// written once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values(Vec<(String, f64)>);

impl Values {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for Values {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut entries: Vec<(String, f64)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (name, value) in iter {
            match index.get(&name) {
                Some(&k) => entries[k].1 = value,
                None => {
                    index.insert(name.clone(), entries.len());
                    entries.push((name, value));
                }
            }
        }
        Values(entries)
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, &codec::clamp(*value))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Values {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValuesVisitor;

        impl<'de> Visitor<'de> for ValuesVisitor {
            type Value = Values;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Values, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, f64>()? {
                    entries.push((name, codec::widen(value)));
                }
                Ok(entries.into_iter().collect())
            }
        }

        deserializer.deserialize_map(ValuesVisitor)
    }
}

fn serialize_number<S: Serializer>(x: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(codec::clamp(*x))
}

fn deserialize_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    f64::deserialize(deserializer).map(codec::widen)
}

/// The output object of a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(serialize_with = "serialize_number", deserialize_with = "deserialize_number")]
    pub z: f64,
    pub glpk_version: String,
    pub status: Status,
    /// Primal value per column, in column index order
    pub vars: Values,
    /// Dual value per row (LP only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dual: Option<Values>,
    /// Row activity, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Values>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Wall-clock seconds, measured by the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

impl Output {
    /// Read back `solution` against the columns and rows of `problem`.
    ///
    /// Every column appears in `vars`, including ones only referenced by
    /// constraints. A missing value reads as 0.
    pub fn new(problem: &Problem, solution: &Solution, version: &str, with_rows: bool) -> Self {
        let value_at = |values: &[f64], k: usize| values.get(k).copied().unwrap_or(0.0);

        let vars: Values = problem
            .columns()
            .iter()
            .enumerate()
            .map(|(j, c)| (c.name.clone(), value_at(&solution.values, j)))
            .collect();

        let dual: Option<Values> = solution.duals.as_ref().map(|duals| {
            problem
                .rows()
                .iter()
                .enumerate()
                .map(|(i, r)| (r.name.clone(), value_at(duals, i)))
                .collect()
        });

        let rows: Option<Values> = with_rows.then(|| {
            problem
                .rows()
                .iter()
                .map(|r| (r.name.clone(), r.activity(&solution.values)))
                .collect()
        });

        Output {
            z: solution.objective_value,
            glpk_version: version.to_string(),
            status: solution.status,
            vars,
            dual,
            rows,
            name: Some(problem.name.clone()),
            time: None,
        }
    }

    pub fn with_time(mut self, seconds: f64) -> Self {
        self.time = Some(seconds);
        self
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, SpecError> {
        codec::encode(self, pretty)
    }

    pub fn from_json(text: &str) -> Result<Self, SpecError> {
        serde_json::from_str(text).map_err(|e| SpecError::Parse {
            message: e.to_string(),
            line: e.line(),
            column: e.column(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpkit_solver::{BoundType, Direction};

    fn problem() -> Problem {
        let mut p = Problem::new("demo", Direction::Maximize);
        p.add_column("x");
        p.add_column("aux");
        p.add_row("cap", [(1, 1.0), (2, 2.0)], BoundType::Upper, 0.0, 4.0)
            .unwrap();
        p
    }

    fn solution() -> Solution {
        Solution {
            status: Status::Optimal,
            objective_value: 12.0,
            values: vec![4.0, 0.25],
            duals: Some(vec![3.0]),
            iterations: 1,
        }
    }

    #[test]
    fn test_every_column_is_reported() {
        let output = Output::new(&problem(), &solution(), "1.0", true);
        assert_eq!(output.vars.len(), 2);
        assert_eq!(output.vars.get("aux"), Some(0.25));
        assert_eq!(output.dual.as_ref().unwrap().get("cap"), Some(3.0));
        assert_eq!(output.rows.as_ref().unwrap().get("cap"), Some(4.5));
        assert_eq!(output.name.as_deref(), Some("demo"));
    }

    #[test]
    fn test_key_order() {
        let output = Output::new(&problem(), &solution(), "1.0", false);
        let text = output.to_json(false).unwrap();
        assert!(text.starts_with(r#"{"z":12.0,"glpk_version":"1.0","status":5,"vars":{"x":4.0,"aux":0.25}"#), "{text}");
        assert!(!text.contains("\"rows\""));
        assert!(!text.contains("\"time\""));
    }

    #[test]
    fn test_round_trip() {
        let mut s = solution();
        s.objective_value = 0.1 + 0.2;
        s.duals = None;
        let output = Output::new(&problem(), &s, "1.0", false).with_time(0.5);
        let back = Output::from_json(&output.to_json(true).unwrap()).unwrap();
        assert_eq!(back, output);
        assert_eq!(back.z.to_bits(), output.z.to_bits());
        let names: Vec<_> = back.vars.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["x", "aux"]);
    }

    #[test]
    fn test_infinite_values_are_clamped() {
        let mut s = solution();
        s.values[0] = f64::INFINITY;
        let output = Output::new(&problem(), &s, "1.0", false);
        let text = output.to_json(false).unwrap();
        assert!(text.contains("1.7976931348623157e+308"), "{text}");
        let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["vars"]["x"].as_f64(), Some(f64::MAX));
        let back = Output::from_json(&text).unwrap();
        assert_eq!(back.vars.get("x"), Some(f64::INFINITY));
    }

    #[test]
    fn test_repeated_row_names_keep_last_value() {
        let mut p = problem();
        p.add_row("cap", [(1, 1.0)], BoundType::Upper, 0.0, 9.0).unwrap();
        p.add_row("other", [(2, 1.0)], BoundType::Upper, 0.0, 1.0).unwrap();
        let mut s = solution();
        s.duals = Some(vec![3.0, 0.5, 0.0]);

        let output = Output::new(&p, &s, "1.0", true);
        let dual = output.dual.as_ref().unwrap();
        assert_eq!(dual.len(), 2);
        assert_eq!(dual.get("cap"), Some(0.5));
        assert_eq!(output.rows.as_ref().unwrap().get("cap"), Some(4.0));

        let text = output.to_json(false).unwrap();
        assert!(text.contains(r#""dual":{"cap":0.5,"other":0.0}"#), "{text}");
    }
}
