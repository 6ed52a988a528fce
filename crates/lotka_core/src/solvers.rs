use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let two = T::one() + T::one();
        let half = T::one() / two;
        let sixth = T::one() / (two + two + two);

        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

// Dormand-Prince 5(4) tableau.
const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
    ],
];

/// 5th order weights; the propagated solution.
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

/// Difference between the 4th and 5th order weights, including the FSAL stage.
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

/// Coefficients of the quartic continuous extension (Shampine). Row j multiplies
/// stage j, column c multiplies theta^(c+1).
const P: [[f64; 4]; 7] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

/// Dormand-Prince 5(4) embedded pair with first-same-as-last stage reuse.
///
/// Usage per step: [`prime`](Self::prime) once at the initial point, then
/// [`attempt`](Self::attempt) until [`error_norm`](Self::error_norm) is at most 1,
/// then [`accept`](Self::accept). The accepted stages back a [`DenseSegment`].
pub struct DormandPrince45 {
    k: [Vec<f64>; 7],
    stage: Vec<f64>,
    y_new: Vec<f64>,
}

impl DormandPrince45 {
    /// Order of the propagated solution.
    pub const ORDER: usize = 5;
    /// Order of the embedded error estimator.
    pub const ERROR_ORDER: usize = 4;

    pub fn new(dim: usize) -> Self {
        Self {
            k: std::array::from_fn(|_| vec![0.0; dim]),
            stage: vec![0.0; dim],
            y_new: vec![0.0; dim],
        }
    }

    /// Evaluates f(t, y) into the first stage.
    pub fn prime(&mut self, system: &impl DynamicalSystem<f64>, t: f64, y: &[f64]) {
        system.apply(t, y, &mut self.k[0]);
    }

    /// Derivative at the current step start.
    pub fn derivative(&self) -> &[f64] {
        &self.k[0]
    }

    /// Computes a trial step of size `h` from `(t, y)`.
    ///
    /// The trial solution is available through [`solution`](Self::solution) and the
    /// derivative there is stored as the last stage. Six RHS evaluations.
    pub fn attempt(&mut self, system: &impl DynamicalSystem<f64>, t: f64, y: &[f64], h: f64) {
        let dim = y.len();
        for s in 1..6 {
            for i in 0..dim {
                let mut acc = 0.0;
                for j in 0..s {
                    acc += A[s][j] * self.k[j][i];
                }
                self.stage[i] = y[i] + h * acc;
            }
            system.apply(t + C[s] * h, &self.stage, &mut self.k[s]);
        }

        for i in 0..dim {
            let mut acc = 0.0;
            for j in 0..6 {
                acc += B[j] * self.k[j][i];
            }
            self.y_new[i] = y[i] + h * acc;
        }
        system.apply(t + h, &self.y_new, &mut self.k[6]);
    }

    /// Trial solution of the last [`attempt`](Self::attempt).
    pub fn solution(&self) -> &[f64] {
        &self.y_new
    }

    /// RMS norm of the local error estimate, scaled by
    /// `atol + rtol * max(|y|, |y_new|)` componentwise.
    pub fn error_norm(&self, y: &[f64], h: f64, rtol: f64, atol: f64) -> f64 {
        let dim = y.len();
        if dim == 0 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..dim {
            let mut err = 0.0;
            for j in 0..7 {
                err += E[j] * self.k[j][i];
            }
            let scale = atol + y[i].abs().max(self.y_new[i].abs()) * rtol;
            let ratio = h * err / scale;
            sum += ratio * ratio;
        }
        (sum / dim as f64).sqrt()
    }

    /// Continuous extension over the last attempted step `[t, t + h]`.
    pub fn dense_segment(&self, t: f64, y: &[f64], h: f64) -> DenseSegment {
        let dim = y.len();
        let mut q = vec![[0.0; 4]; dim];
        for (i, row) in q.iter_mut().enumerate() {
            for (c, coeff) in row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for j in 0..7 {
                    acc += self.k[j][i] * P[j][c];
                }
                *coeff = acc;
            }
        }
        DenseSegment {
            t_start: t,
            h,
            y_start: y.to_vec(),
            q,
        }
    }

    /// Moves the trial end point derivative into the first stage (FSAL).
    pub fn accept(&mut self) {
        self.k.swap(0, 6);
    }
}

impl Steppable<f64> for DormandPrince45 {
    /// Takes one uncontrolled step of size `dt`.
    fn step(
        &mut self,
        system: &impl DynamicalSystem<f64>,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) {
        // The state may have been edited between steps, so the first stage is
        // always re-evaluated.
        self.prime(system, *t, state);
        self.attempt(system, *t, state, dt);
        state.copy_from_slice(&self.y_new);
        self.accept();
        *t += dt;
    }
}

/// Quartic interpolant of one accepted Dormand-Prince step.
///
/// y(t_start + theta h) = y_start + h * sum_c q[c] theta^(c+1), theta in [0, 1].
#[derive(Debug, Clone)]
pub struct DenseSegment {
    t_start: f64,
    h: f64,
    y_start: Vec<f64>,
    q: Vec<[f64; 4]>,
}

impl DenseSegment {
    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    pub fn t_end(&self) -> f64 {
        self.t_start + self.h
    }

    /// Writes the interpolated state at `t` into `out`.
    pub fn evaluate(&self, t: f64, out: &mut [f64]) {
        let theta = (t - self.t_start) / self.h;
        let powers = [theta, theta * theta, theta.powi(3), theta.powi(4)];
        for (i, value) in out.iter_mut().enumerate() {
            let row = &self.q[i];
            let mut acc = 0.0;
            for c in 0..4 {
                acc += row[c] * powers[c];
            }
            *value = self.y_start[i] + self.h * acc;
        }
    }
}

/// Step size controller for embedded pairs.
#[derive(Debug, Clone, Copy)]
pub struct StepSizeController {
    /// Safety factor applied to the optimal step.
    pub safety: f64,
    /// Smallest allowed shrink factor.
    pub min_factor: f64,
    /// Largest allowed growth factor.
    pub max_factor: f64,
    /// -1 / (error_order + 1)
    pub exponent: f64,
}

impl Default for StepSizeController {
    fn default() -> Self {
        Self::for_error_order(DormandPrince45::ERROR_ORDER)
    }
}

impl StepSizeController {
    pub fn for_error_order(order: usize) -> Self {
        Self {
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 10.0,
            exponent: -1.0 / (order as f64 + 1.0),
        }
    }

    /// Growth factor after an accepted step with `error_norm < 1`.
    /// Growth is suppressed if the same step was rejected before.
    pub fn accepted_factor(&self, error_norm: f64, after_rejection: bool) -> f64 {
        let factor = if error_norm == 0.0 {
            self.max_factor
        } else {
            self.max_factor.min(self.safety * error_norm.powf(self.exponent))
        };
        if after_rejection {
            factor.min(1.0)
        } else {
            factor
        }
    }

    /// Shrink factor after a rejected step.
    pub fn rejected_factor(&self, error_norm: f64) -> f64 {
        self.min_factor.max(self.safety * error_norm.powf(self.exponent))
    }
}
