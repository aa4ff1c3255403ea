//! CPLEX LP text output for a built [`Problem`].

use lpkit_solver::{BoundType, Column, ColumnKind, Direction, Problem, SparseVector};

const LINE_WIDTH: usize = 72;

/// Render `problem` in CPLEX LP format.
///
/// Names that the format cannot carry are replaced by `x_<j>` for columns
/// and `r_<i>` for rows. Ranged rows are written with an auxiliary
/// `~r_<i>` variable bounded in the `Bounds` section.
pub fn write_lp(problem: &Problem) -> String {
    let columns: Vec<String> = problem
        .columns()
        .iter()
        .enumerate()
        .map(|(j, c)| lp_name(&c.name).unwrap_or_else(|| format!("x_{}", j + 1)))
        .collect();

    let mut out = LpWriter::default();
    out.line(&format!("\\* Problem: {} *\\", problem.name));
    out.blank();

    out.line(match problem.direction {
        Direction::Minimize => "Minimize",
        Direction::Maximize => "Maximize",
    });
    out.begin(" obj:");
    let objective: Vec<(usize, f64)> = problem
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.objective != 0.0)
        .map(|(j, c)| (j + 1, c.objective))
        .collect();
    out.expression(&objective, &columns);
    out.end();
    out.blank();

    let mut ranges = Vec::new();
    if problem.num_rows() > 0 {
        out.line("Subject To");
        for (i, row) in problem.rows().iter().enumerate() {
            let name = lp_name(&row.name).unwrap_or_else(|| format!("r_{}", i + 1));
            out.begin(&format!(" {name}:"));
            out.expression(&nonzeros(&row.coefficients), &columns);
            match row.bound_type {
                BoundType::Free => out.term(">= -inf"),
                BoundType::Lower => out.term(&format!(">= {}", number(row.lower))),
                BoundType::Upper => out.term(&format!("<= {}", number(row.upper))),
                BoundType::Fixed => out.term(&format!("= {}", number(row.lower))),
                BoundType::Double => {
                    let range = format!("~r_{}", i + 1);
                    out.term(&format!("- {range}"));
                    out.term(&format!("= {}", number(row.lower)));
                    ranges.push((range, row.upper - row.lower));
                }
            }
            out.end();
        }
        out.blank();
    }

    let mut bounds: Vec<String> = problem
        .columns()
        .iter()
        .zip(&columns)
        .filter_map(|(c, name)| column_bound(c, name))
        .collect();
    bounds.extend(ranges.iter().map(|(range, width)| format!(" 0 <= {range} <= {}", number(*width))));
    if !bounds.is_empty() {
        out.line("Bounds");
        for bound in &bounds {
            out.line(bound);
        }
        out.blank();
    }

    for (title, kind) in [("Generals", ColumnKind::Integer), ("Binaries", ColumnKind::Binary)] {
        let names: Vec<&String> = problem
            .columns()
            .iter()
            .zip(&columns)
            .filter(|(c, _)| c.kind == kind)
            .map(|(_, name)| name)
            .collect();
        if !names.is_empty() {
            out.line(title);
            for name in names {
                out.line(&format!(" {name}"));
            }
            out.blank();
        }
    }

    out.line("End");
    out.finish()
}

fn nonzeros(v: &SparseVector) -> Vec<(usize, f64)> {
    v.iter().filter(|(_, a)| *a != 0.0).collect()
}

fn column_bound(column: &Column, name: &str) -> Option<String> {
    let (lower, upper) = (column.lower(), column.upper());
    match column.bound_type() {
        BoundType::Free => Some(format!(" {name} free")),
        BoundType::Lower if lower == 0.0 => None,
        BoundType::Lower => Some(format!(" {name} >= {}", number(lower))),
        BoundType::Upper => Some(format!(" -inf <= {name} <= {}", number(upper))),
        BoundType::Double if column.kind == ColumnKind::Binary && lower == 0.0 && upper == 1.0 => None,
        BoundType::Double => Some(format!(" {} <= {name} <= {}", number(lower), number(upper))),
        BoundType::Fixed => Some(format!(" {name} = {}", number(lower))),
    }
}

/// `name` if it is a legal LP identifier.
fn lp_name(name: &str) -> Option<String> {
    const EXTRA: &str = "!\"#$%&()/,.;?@_`'{}|~";
    let first = name.chars().next()?;
    let legal = name.chars().all(|c| c.is_ascii_alphanumeric() || EXTRA.contains(c));
    if !legal || first.is_ascii_digit() || first == '.' || name.len() > 255 {
        return None;
    }
    Some(name.to_string())
}

fn number(x: f64) -> String {
    if x == f64::INFINITY {
        "+inf".to_string()
    } else if x == f64::NEG_INFINITY {
        "-inf".to_string()
    } else if x != 0.0 && (x.abs() >= 1e15 || x.abs() < 1e-6) {
        format!("{x:e}")
    } else {
        format!("{x}")
    }
}

/// Accumulates output, wrapping long expressions like the LP readers expect.
#[derive(Default)]
struct LpWriter {
    out: String,
    current: String,
}

impl LpWriter {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn begin(&mut self, head: &str) {
        self.current = head.to_string();
    }

    fn term(&mut self, term: &str) {
        if self.current.len() + 1 + term.len() > LINE_WIDTH {
            let full = std::mem::take(&mut self.current);
            self.line(&full);
        }
        self.current.push(' ');
        self.current.push_str(term);
    }

    /// `+ 3 x - y ...`, or `0 <first column>` when empty.
    fn expression(&mut self, terms: &[(usize, f64)], columns: &[String]) {
        if terms.is_empty() {
            match columns.first() {
                Some(name) => self.term(&format!("0 {name}")),
                None => self.term("0"),
            }
            return;
        }
        for &(j, a) in terms {
            let name = &columns[j - 1];
            let sign = if a < 0.0 { '-' } else { '+' };
            let term = if a.abs() == 1.0 {
                format!("{sign} {name}")
            } else {
                format!("{sign} {} {name}", number(a.abs()))
            };
            self.term(&term);
        }
    }

    fn end(&mut self) {
        let full = std::mem::take(&mut self.current);
        self.line(&full);
    }

    fn finish(self) -> String {
        self.out
    }
}
