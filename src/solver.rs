//! The ODE solver seam used by the Model-Exchange wrapper.
//!
//! The wrapper hands the solver a callable view of the model and a mutable
//! state vector; the solver advances the states from `t` to at most
//! `t_next` and reports the time it actually reached. Anything satisfying
//! this narrow contract can be plugged in; [`Euler`] is the fixed-step
//! reference implementation.

use crate::Error;

/// The right-hand side of the ODE: `dx = f(x, t)`.
///
/// Must be callable arbitrarily many times within one
/// [`OdeSolver::integrate`] call, including repeated evaluations at the same
/// time instant.
pub trait OdeSystem {
    fn eval(&mut self, x: &[f64], dx: &mut [f64], t: f64) -> Result<(), Error>;
}

pub trait OdeSolver {
    /// Advance `x` from `t` towards `t_next` and return the time actually
    /// reached, with `t <= t_reached <= t_next`.
    fn integrate(
        &mut self,
        system: &mut dyn OdeSystem,
        x: &mut [f64],
        t: f64,
        t_next: f64,
    ) -> Result<f64, Error>;
}

/// Fixed-step forward Euler.
#[derive(Debug)]
pub struct Euler {
    step_size: f64,
    dx: Vec<f64>,
}

impl Euler {
    /// Create a solver with the given fixed step. The final sub-step of each
    /// segment is shortened to land exactly on the requested end time.
    pub fn new(step_size: f64) -> Self {
        assert!(step_size > 0.0, "Euler step size must be positive");
        Self {
            step_size,
            dx: Vec::new(),
        }
    }
}

impl OdeSolver for Euler {
    fn integrate(
        &mut self,
        system: &mut dyn OdeSystem,
        x: &mut [f64],
        t: f64,
        t_next: f64,
    ) -> Result<f64, Error> {
        if x.is_empty() {
            return Ok(t_next);
        }
        self.dx.resize(x.len(), 0.0);

        // The sub-step count is snapped to the nearest integer when the
        // segment is an (almost) exact multiple of the step, so rounding in
        // the segment bounds cannot produce a spurious extra micro-step.
        let ratio = (t_next - t) / self.step_size;
        let steps = if (ratio - ratio.round()).abs() < 1e-9 {
            ratio.round() as usize
        } else {
            ratio.ceil() as usize
        }
        .max(1);

        for i in 0..steps {
            let t_i = t + i as f64 * self.step_size;
            let h = if i + 1 == steps {
                t_next - t_i
            } else {
                self.step_size
            };
            system.eval(x, &mut self.dx, t_i)?;
            for (xi, dxi) in x.iter_mut().zip(&self.dx) {
                *xi += h * *dxi;
            }
        }
        Ok(t_next)
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    /// dx = 1, so x(t) = x(0) + t.
    struct UnitSlope {
        evals: usize,
    }

    impl OdeSystem for UnitSlope {
        fn eval(&mut self, _x: &[f64], dx: &mut [f64], _t: f64) -> Result<(), Error> {
            self.evals += 1;
            dx[0] = 1.0;
            Ok(())
        }
    }

    #[test]
    fn test_euler_unit_slope() {
        let mut solver = Euler::new(1e-3);
        let mut system = UnitSlope { evals: 0 };
        let mut x = [0.0];
        let reached = solver.integrate(&mut system, &mut x, 0.0, 0.01).unwrap();
        assert_eq!(reached, 0.01);
        assert_approx_eq!(x[0], 0.01, 1e-12);
        assert!(system.evals >= 10);
    }

    #[test]
    fn test_euler_partial_final_step() {
        // 0.0025 is 2.5 solver steps; the final step must shrink
        let mut solver = Euler::new(1e-3);
        let mut system = UnitSlope { evals: 0 };
        let mut x = [0.0];
        let reached = solver.integrate(&mut system, &mut x, 0.0, 0.0025).unwrap();
        assert_eq!(reached, 0.0025);
        assert_approx_eq!(x[0], 0.0025, 1e-12);
        assert_eq!(system.evals, 3);
    }

    #[test]
    fn test_euler_stateless_model() {
        struct NoStates;
        impl OdeSystem for NoStates {
            fn eval(&mut self, _x: &[f64], _dx: &mut [f64], _t: f64) -> Result<(), Error> {
                panic!("must not be evaluated for an empty state vector");
            }
        }
        let mut solver = Euler::new(1e-3);
        let mut x: [f64; 0] = [];
        let reached = solver.integrate(&mut NoStates, &mut x, 0.0, 1.0).unwrap();
        assert_eq!(reached, 1.0);
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        // dx = -x with x(0) = 1; forward Euler with h = 1e-3 stays within
        // first-order error of exp(-t)
        struct Decay;
        impl OdeSystem for Decay {
            fn eval(&mut self, x: &[f64], dx: &mut [f64], _t: f64) -> Result<(), Error> {
                dx[0] = -x[0];
                Ok(())
            }
        }
        let mut solver = Euler::new(1e-3);
        let mut x = [1.0];
        solver.integrate(&mut Decay, &mut x, 0.0, 1.0).unwrap();
        assert_approx_eq!(x[0], (-1.0f64).exp(), 1e-3);
    }
}
