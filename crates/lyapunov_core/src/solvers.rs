use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// Classic fixed-step Runge-Kutta 4th order integrator.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let two = T::one() + T::one();
        let half = T::one() / two;
        let sixth = T::one() / (two + two + two);
        let t0 = *t;
        let n = state.len();

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..n {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..n {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..n {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y += dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..n {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

#[cfg(test)]
mod tests {
    use super::RK4;
    use crate::traits::{DynamicalSystem, Steppable};

    struct Decay {
        rate: f64,
    }

    impl DynamicalSystem<f64> for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * x[0];
        }
    }

    #[test]
    fn rk4_matches_exponential_decay() {
        let system = Decay { rate: 0.5 };
        let mut solver = RK4::new(1);
        let mut state = [2.0];
        let mut t = 0.0;
        for _ in 0..100 {
            solver.step(&system, &mut t, &mut state, 0.02);
        }
        let expected = 2.0 * (-0.5f64 * 2.0).exp();
        assert!((state[0] - expected).abs() < 1e-9);
        assert!((t - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rk4_runs_on_f32() {
        struct Constant;
        impl DynamicalSystem<f32> for Constant {
            fn dimension(&self) -> usize {
                1
            }
            fn apply(&self, _t: f32, _x: &[f32], out: &mut [f32]) {
                out[0] = 1.0;
            }
        }
        let mut solver = RK4::<f32>::new(1);
        let mut state = [0.0f32];
        let mut t = 0.0f32;
        solver.step(&Constant, &mut t, &mut state, 0.5);
        assert!((state[0] - 0.5).abs() < 1e-6);
    }
}
