//! Natural cubic spline over a [`RadialGrid`].
//!
//! The solver samples interpolated coefficients at Runge-Kutta midpoints and
//! integrates squared solutions over the whole mesh, so the spline stores
//! per-interval polynomial coefficients: evaluation inside an interval is a
//! Horner step and the definite integral is analytic.

use crate::grid::RadialGrid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    #[error("spline values length {actual} does not match grid point count {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("spline value at index {index} must be finite, got {value}")]
    NonFiniteValue { index: usize, value: f64 },
}

/// Piecewise cubic `y(x) = a + b*dx + c*dx^2 + d*dx^3` on each grid interval,
/// with natural boundary conditions (vanishing second derivative at both
/// ends). `a` is the tabulated value itself, so knot evaluation is exact.
#[derive(Debug, Clone)]
pub struct CubicSpline<'a> {
    grid: &'a RadialGrid,
    values: Vec<f64>,
    coeff_b: Vec<f64>,
    coeff_c: Vec<f64>,
    coeff_d: Vec<f64>,
}

impl<'a> CubicSpline<'a> {
    pub fn new(grid: &'a RadialGrid, values: &[f64]) -> Result<Self, SplineError> {
        let mut spline = Self {
            grid,
            values: Vec::new(),
            coeff_b: Vec::new(),
            coeff_c: Vec::new(),
            coeff_d: Vec::new(),
        };
        spline.reinterpolate(values)?;
        Ok(spline)
    }

    /// Refit new tabulated values on the same grid, reusing storage. The
    /// refinement driver calls this once per pass with the updated forcing
    /// term.
    pub fn reinterpolate(&mut self, values: &[f64]) -> Result<(), SplineError> {
        let n = self.grid.point_count();
        if values.len() != n {
            return Err(SplineError::LengthMismatch {
                expected: n,
                actual: values.len(),
            });
        }
        for (index, value) in values.iter().copied().enumerate() {
            if !value.is_finite() {
                return Err(SplineError::NonFiniteValue { index, value });
            }
        }

        self.values.clear();
        self.values.extend_from_slice(values);

        let x = self.grid.points();
        let y = &self.values;

        // Tridiagonal sweep for the knot second derivatives, natural ends.
        let mut m = vec![0.0_f64; n];
        let mut u = vec![0.0_f64; n];
        for i in 1..n - 1 {
            let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
            let p = sig * m[i - 1] + 2.0;
            m[i] = (sig - 1.0) / p;
            u[i] = (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
            u[i] = (6.0 * u[i] / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
        }
        m[n - 1] = 0.0;
        for k in (0..n - 2).rev() {
            m[k + 1] = m[k + 1] * m[k + 2] + u[k + 1];
        }

        self.coeff_b.clear();
        self.coeff_c.clear();
        self.coeff_d.clear();
        for i in 0..n - 1 {
            let h = x[i + 1] - x[i];
            self.coeff_b
                .push((y[i + 1] - y[i]) / h - h * (2.0 * m[i] + m[i + 1]) / 6.0);
            self.coeff_c.push(m[i] / 2.0);
            self.coeff_d.push((m[i + 1] - m[i]) / (6.0 * h));
        }

        Ok(())
    }

    pub fn grid(&self) -> &RadialGrid {
        self.grid
    }

    /// Exact tabulated value at knot `index`.
    pub fn value_at(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Evaluate inside interval `index` at `dx = frac * h(index)` from the
    /// left knot, `frac` in [0, 1].
    pub fn value_at_offset(&self, index: usize, frac: f64) -> f64 {
        let dx = frac * self.grid.interval_length(index);
        self.values[index]
            + dx * (self.coeff_b[index] + dx * (self.coeff_c[index] + dx * self.coeff_d[index]))
    }

    /// Definite integral of the interpolant over the whole grid domain.
    pub fn definite_integral(&self) -> f64 {
        let mut total = 0.0;
        for i in 0..self.grid.point_count() - 1 {
            let h = self.grid.interval_length(i);
            total += h
                * (self.values[i]
                    + h * (self.coeff_b[i] / 2.0
                        + h * (self.coeff_c[i] / 3.0 + h * self.coeff_d[i] / 4.0)));
        }
        total
    }
}
