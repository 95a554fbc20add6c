#![deny(warnings)]

//! Bounded integer linear programming for the shop planner.
//!
//! The planner assembles a [`Model`] per call as plain data: variables with
//! upper bounds and objective coefficients, plus `<=` / `>=` constraint rows.
//! [`solve`] maximizes the objective over non-negative integer assignments. The LP relaxation is solved with a two-phase dense-tableau
//! simplex (Bland's rule), and integrality is recovered by depth-first
//! branch-and-bound with incumbent pruning. Both layers draw from a shared
//! iteration/node budget so a runaway search surfaces as
//! [`SolveError::LimitReached`] instead of stalling the caller.

use thiserror::Error;
use tracing::debug;

const EPS: f64 = 1e-9;
const INT_TOL: f64 = 1e-6;
const PHASE1_TOL: f64 = 1e-6;

/// Constraint direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rel {
    /// Left-hand side must not exceed the right-hand side.
    Le,
    /// Left-hand side must reach at least the right-hand side.
    Ge,
}

/// A non-negative integer decision variable.
#[derive(Clone, Copy, Debug)]
pub struct Variable {
    /// Objective coefficient (the problem is always a maximization).
    pub objective: f64,
    /// Inclusive upper bound; `f64::INFINITY` leaves the variable uncapped.
    pub upper: f64,
}

/// One linear constraint row: `sum(coeff * var) rel rhs`.
#[derive(Clone, Debug)]
pub struct Constraint {
    /// Sparse terms as (variable index, coefficient) pairs.
    pub terms: Vec<(usize, f64)>,
    /// Constraint direction.
    pub rel: Rel,
    /// Right-hand side.
    pub rhs: f64,
}

/// An integer maximization problem, assembled fresh per planning call.
#[derive(Clone, Debug, Default)]
pub struct Model {
    /// Decision variables in insertion order.
    pub vars: Vec<Variable>,
    /// Constraint rows in insertion order.
    pub constraints: Vec<Constraint>,
}

impl Model {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable and return its index.
    pub fn add_var(&mut self, objective: f64, upper: f64) -> usize {
        self.vars.push(Variable { objective, upper });
        self.vars.len() - 1
    }

    /// Add a constraint row.
    pub fn add_constraint(&mut self, terms: Vec<(usize, f64)>, rel: Rel, rhs: f64) {
        self.constraints.push(Constraint { terms, rel, rhs });
    }

    /// Objective value of an integer assignment.
    pub fn objective_value(&self, values: &[u64]) -> f64 {
        self.vars
            .iter()
            .zip(values)
            .map(|(v, &x)| v.objective * x as f64)
            .sum()
    }

    /// Whether an assignment satisfies every constraint row and variable
    /// bound, within a relative tolerance.
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        for (j, var) in self.vars.iter().enumerate() {
            let x = values[j];
            if x < -tol || x > var.upper + tol * (1.0 + var.upper.abs()) {
                return false;
            }
        }
        for c in &self.constraints {
            let lhs: f64 = c.terms.iter().map(|&(j, a)| a * values[j]).sum();
            let slack = tol * (1.0 + c.rhs.abs());
            let ok = match c.rel {
                Rel::Le => lhs <= c.rhs + slack,
                Rel::Ge => lhs >= c.rhs - slack,
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

/// Search budget shared by the simplex iterations and branch-and-bound nodes
/// of one [`solve`] call.
#[derive(Clone, Copy, Debug)]
pub struct SolveLimits {
    /// Total simplex pivots across all relaxations.
    pub max_simplex_iters: usize,
    /// Total branch-and-bound nodes.
    pub max_nodes: usize,
}

impl Default for SolveLimits {
    fn default() -> Self {
        Self {
            max_simplex_iters: 20_000,
            max_nodes: 4_096,
        }
    }
}

/// Terminal solver outcomes that carry no assignment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    /// No assignment satisfies every constraint simultaneously.
    #[error("no feasible assignment satisfies every constraint")]
    Infeasible,
    /// The objective can grow without bound.
    #[error("objective is unbounded above")]
    Unbounded,
    /// The iteration/node budget ran out before an optimum was proven.
    #[error("solver budget exhausted before a proven optimum")]
    LimitReached,
}

/// An optimal integer assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// Value per variable, in variable order.
    pub values: Vec<u64>,
    /// Objective value of `values`.
    pub objective: f64,
}

enum LpError {
    Infeasible,
    Unbounded,
    LimitReached,
}

struct Tableau {
    rows: Vec<Vec<f64>>,
    zrow: Vec<f64>,
    basis: Vec<usize>,
    width: usize,
    art_start: usize,
}

impl Tableau {
    fn rhs_of(&self, r: usize) -> f64 {
        self.rows[r][self.width]
    }

    fn pivot(&mut self, r: usize, j: usize) {
        let p = self.rows[r][j];
        for v in self.rows[r].iter_mut() {
            *v /= p;
        }
        let pivot_row = self.rows[r].clone();
        for (i, row) in self.rows.iter_mut().enumerate() {
            if i == r {
                continue;
            }
            let f = row[j];
            if f.abs() > EPS {
                for (v, pv) in row.iter_mut().zip(&pivot_row) {
                    *v -= f * pv;
                }
            }
        }
        let f = self.zrow[j];
        if f.abs() > EPS {
            for (v, pv) in self.zrow.iter_mut().zip(&pivot_row) {
                *v -= f * pv;
            }
        }
        self.basis[r] = j;
    }

    /// Bland's rule pivoting until no entering column improves the objective.
    /// Columns at or past `ban_from` may not enter the basis.
    fn optimize(&mut self, ban_from: usize, iters: &mut usize) -> Result<(), LpError> {
        loop {
            let entering = (0..ban_from).find(|&j| self.zrow[j] > EPS);
            let Some(j) = entering else {
                return Ok(());
            };
            if *iters == 0 {
                return Err(LpError::LimitReached);
            }
            *iters -= 1;

            let mut leaving: Option<(f64, usize)> = None;
            for r in 0..self.rows.len() {
                let a = self.rows[r][j];
                if a > EPS {
                    let ratio = self.rhs_of(r) / a;
                    let better = match leaving {
                        None => true,
                        Some((best, best_r)) => {
                            ratio < best - EPS
                                || (ratio < best + EPS && self.basis[r] < self.basis[best_r])
                        }
                    };
                    if better {
                        leaving = Some((ratio, r));
                    }
                }
            }
            let Some((_, r)) = leaving else {
                return Err(LpError::Unbounded);
            };
            self.pivot(r, j);
        }
    }
}

/// Solve the LP relaxation of `model` with per-variable bounds `[lo, hi]`.
fn solve_relaxation(
    model: &Model,
    lo: &[f64],
    hi: &[f64],
    iters: &mut usize,
) -> Result<Vec<f64>, LpError> {
    let n = model.vars.len();

    // Gather rows: model constraints plus active variable-bound rows, each
    // normalized to a non-negative right-hand side.
    let mut rows: Vec<(Vec<f64>, Rel, f64)> = Vec::new();
    for c in &model.constraints {
        let mut coeffs = vec![0.0; n];
        for &(j, a) in &c.terms {
            coeffs[j] += a;
        }
        rows.push((coeffs, c.rel, c.rhs));
    }
    for j in 0..n {
        if lo[j] > EPS {
            let mut coeffs = vec![0.0; n];
            coeffs[j] = 1.0;
            rows.push((coeffs, Rel::Ge, lo[j]));
        }
        if hi[j].is_finite() {
            let mut coeffs = vec![0.0; n];
            coeffs[j] = 1.0;
            rows.push((coeffs, Rel::Le, hi[j]));
        }
    }
    for row in rows.iter_mut() {
        if row.2 < 0.0 {
            for a in row.0.iter_mut() {
                *a = -*a;
            }
            row.2 = -row.2;
            row.1 = match row.1 {
                Rel::Le => Rel::Ge,
                Rel::Ge => Rel::Le,
            };
        }
    }

    let m = rows.len();
    let n_art = rows.iter().filter(|r| r.1 == Rel::Ge).count();
    let art_start = n + m;
    let width = n + m + n_art;

    let mut tab = Tableau {
        rows: Vec::with_capacity(m),
        zrow: vec![0.0; width + 1],
        basis: Vec::with_capacity(m),
        width,
        art_start,
    };

    let mut next_art = art_start;
    for (i, (coeffs, rel, rhs)) in rows.iter().enumerate() {
        let mut row = vec![0.0; width + 1];
        row[..n].copy_from_slice(coeffs);
        row[width] = *rhs;
        match rel {
            Rel::Le => {
                row[n + i] = 1.0;
                tab.basis.push(n + i);
            }
            Rel::Ge => {
                row[n + i] = -1.0;
                row[next_art] = 1.0;
                tab.basis.push(next_art);
                next_art += 1;
            }
        }
        tab.rows.push(row);
    }

    // Phase 1: drive artificial variables to zero.
    if n_art > 0 {
        for j in art_start..width {
            tab.zrow[j] = -1.0;
        }
        for r in 0..m {
            if tab.basis[r] >= art_start {
                let row = tab.rows[r].clone();
                for (v, rv) in tab.zrow.iter_mut().zip(&row) {
                    *v += rv;
                }
            }
        }
        match tab.optimize(width, iters) {
            Ok(()) => {}
            // The phase-1 objective is bounded above by zero, so an
            // "unbounded" report can only be a numerical artifact.
            Err(LpError::Unbounded) => return Err(LpError::Infeasible),
            Err(e) => return Err(e),
        }
        if tab.zrow[width] > PHASE1_TOL {
            return Err(LpError::Infeasible);
        }
        // Pivot any leftover basic artificial onto a structural column.
        // A row with no such column is redundant and can keep its artificial
        // at zero: entering columns have a zero coefficient there.
        for r in 0..m {
            if tab.basis[r] >= art_start {
                if let Some(j) = (0..art_start).find(|&j| tab.rows[r][j].abs() > EPS) {
                    tab.pivot(r, j);
                }
            }
        }
    }

    // Phase 2: the true objective, artificial columns banned from entering.
    for v in tab.zrow.iter_mut() {
        *v = 0.0;
    }
    for (j, var) in model.vars.iter().enumerate() {
        tab.zrow[j] = var.objective;
    }
    for r in 0..m {
        let b = tab.basis[r];
        let f = tab.zrow[b];
        if f.abs() > EPS {
            let row = tab.rows[r].clone();
            for (v, rv) in tab.zrow.iter_mut().zip(&row) {
                *v -= f * rv;
            }
        }
    }
    tab.optimize(tab.art_start, iters)?;

    let mut x = vec![0.0; n];
    for r in 0..m {
        let b = tab.basis[r];
        if b < n {
            x[b] = tab.rhs_of(r).max(0.0);
        }
    }
    Ok(x)
}

/// Maximize the model's objective over non-negative integer assignments.
///
/// Returns the optimal assignment, [`SolveError::Infeasible`] /
/// [`SolveError::Unbounded`] for degenerate programs, or
/// [`SolveError::LimitReached`] when the budget runs out first.
pub fn solve(model: &Model, limits: &SolveLimits) -> Result<Solution, SolveError> {
    let n = model.vars.len();
    if n == 0 {
        for c in &model.constraints {
            let ok = match c.rel {
                Rel::Le => 0.0 <= c.rhs + EPS,
                Rel::Ge => 0.0 >= c.rhs - EPS,
            };
            if !ok {
                return Err(SolveError::Infeasible);
            }
        }
        return Ok(Solution {
            values: vec![],
            objective: 0.0,
        });
    }

    let mut iters = limits.max_simplex_iters;
    let mut nodes = 0usize;
    let mut incumbent: Option<Solution> = None;

    let root_lo = vec![0.0; n];
    let root_hi: Vec<f64> = model.vars.iter().map(|v| v.upper).collect();
    let mut stack: Vec<(Vec<f64>, Vec<f64>)> = vec![(root_lo, root_hi)];

    while let Some((lo, hi)) = stack.pop() {
        if nodes >= limits.max_nodes {
            return Err(SolveError::LimitReached);
        }
        nodes += 1;

        if lo.iter().zip(&hi).any(|(l, h)| *l > *h + EPS) {
            continue;
        }

        let x = match solve_relaxation(model, &lo, &hi, &mut iters) {
            Ok(x) => x,
            Err(LpError::Infeasible) => continue,
            Err(LpError::Unbounded) => return Err(SolveError::Unbounded),
            Err(LpError::LimitReached) => return Err(SolveError::LimitReached),
        };

        let bound: f64 = model
            .vars
            .iter()
            .zip(&x)
            .map(|(v, &xj)| v.objective * xj)
            .sum();
        // Integral objective coefficients mean any strictly better incumbent
        // improves by at least one, so a relative slack only absorbs LP noise.
        if let Some(best) = &incumbent {
            if bound <= best.objective + 1e-6 * (1.0 + best.objective.abs()) {
                continue;
            }
        }

        // Branch on the most fractional variable, if any.
        let mut branch: Option<(usize, f64)> = None;
        let mut worst_frac = INT_TOL;
        for (j, &v) in x.iter().enumerate() {
            let frac = (v - v.round()).abs();
            if frac > worst_frac {
                worst_frac = frac;
                branch = Some((j, v));
            }
        }

        match branch {
            None => {
                let values: Vec<u64> = x.iter().map(|v| v.round().max(0.0) as u64).collect();
                let as_f: Vec<f64> = values.iter().map(|&v| v as f64).collect();
                if model.is_satisfied(&as_f, INT_TOL) {
                    let objective = model.objective_value(&values);
                    let improves = incumbent
                        .as_ref()
                        .map_or(true, |best| objective > best.objective + EPS);
                    if improves {
                        incumbent = Some(Solution { values, objective });
                    }
                }
            }
            Some((j, v)) => {
                let mut up_lo = lo.clone();
                up_lo[j] = v.ceil();
                let mut down_hi = hi.clone();
                down_hi[j] = v.floor();
                stack.push((up_lo, hi));
                stack.push((lo, down_hi));
            }
        }
    }

    debug!(nodes, iters_left = iters, "branch and bound finished");
    incumbent.ok_or(SolveError::Infeasible)
}
