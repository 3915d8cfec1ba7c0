//! Batch Ornstein-Uhlenbeck parameter estimation.
//!
//! Fits the discrete model `x_{t+Δ} = a·x_t + b + ε` by ordinary least
//! squares over a uniformly-sampled mid series, then converts to the
//! continuous-time `(κ, θ, σ)` triple in closed form. Single pass over the
//! input, no allocation.

/// Continuous-time Ornstein-Uhlenbeck parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OuParams {
    /// Mean-reversion rate.
    pub kappa: f64,
    /// Long-run mean.
    pub theta: f64,
    /// Volatility.
    pub sigma: f64,
}

impl OuParams {
    /// Whether both `kappa` and `sigma` are finite and usable by a
    /// downstream quoter. A degenerate fit (`a <= 0` or `|1-a| < eps`)
    /// surfaces as non-finite `kappa`/`sigma`, and callers must fall back
    /// to the heuristic quoter rather than propagate NaNs.
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.kappa.is_finite() && self.sigma.is_finite()
    }
}

const DEGENERATE: OuParams = OuParams {
    kappa: f64::NAN,
    theta: f64::NAN,
    sigma: f64::NAN,
};

/// Fit OU parameters from a mid series `x[0..n]` sampled at uniform `dt`
/// seconds. Requires `n >= 3`; callers must not invoke this with fewer
/// samples — the fit is undefined below that.
///
/// Residual variance uses divisor `n-2` where `n = x.len() - 1` paired
/// observations, matching the regression's degrees of freedom (one lost to
/// the slope, one to the intercept).
pub fn fit_ou(x: &[f64], dt: f64) -> OuParams {
    debug_assert!(x.len() >= 3, "fit_ou requires at least 3 samples");
    let n = x.len() - 1;
    let nf = n as f64;

    let mut sx = 0.0;
    let mut sy = 0.0;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for t in 0..n {
        let xt = x[t];
        let yt = x[t + 1];
        sx += xt;
        sy += yt;
        sxx += xt * xt;
        sxy += xt * yt;
    }
    let denom = nf * sxx - sx * sx;
    let a = (nf * sxy - sx * sy) / denom;
    let b = (sy - a * sx) / nf;

    if a <= 0.0 || (1.0 - a).abs() < f64::EPSILON {
        return DEGENERATE;
    }

    let mut sse = 0.0;
    for t in 0..n {
        let r = x[t + 1] - (a * x[t] + b);
        sse += r * r;
    }
    let var_eps = sse / (nf - 2.0);

    let kappa = -a.ln() / dt;
    let theta = b / (1.0 - a);
    let sigma = (var_eps * (2.0 * kappa) / (1.0 - (-2.0 * kappa * dt).exp())).sqrt();

    OuParams { kappa, theta, sigma }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    #[test]
    fn recovers_reasonable_parameters_from_simulated_ou() {
        let (kappa, theta, sigma, dt) = (1.2, 100.0, 2.0, 0.01);
        let mut rng = StdRng::seed_from_u64(0x243F6A8885A308D3);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let n = 1000;
        let mut x = vec![0.0; n];
        x[0] = theta;
        for t in 0..n - 1 {
            x[t + 1] = x[t] + kappa * (theta - x[t]) * dt + sigma * dt.sqrt() * normal.sample(&mut rng);
        }
        let est = fit_ou(&x, dt);
        assert!(est.is_usable());
        assert!(est.kappa > 0.0 && est.kappa < 10.0, "kappa={}", est.kappa);
        assert!(est.sigma > 0.0 && est.sigma < 10.0, "sigma={}", est.sigma);
        assert!((est.theta - theta).abs() < 25.0, "theta={}", est.theta);
    }

    #[test]
    fn constant_series_is_degenerate() {
        // a constant series drives `a` toward 1 and the fit must not yield
        // a misleadingly "valid" result.
        let x = vec![50.0; 10];
        let est = fit_ou(&x, 0.01);
        assert!(!est.is_usable());
    }
}
