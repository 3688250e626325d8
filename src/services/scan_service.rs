use rand::Rng;

/// Decides whether a simulated scan passes identity verification.
#[cfg_attr(test, mockall::automock)]
pub trait ScanVerifier: Send + Sync {
    fn verify(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct RandomScanVerifier {
    success_probability: f64,
}

impl RandomScanVerifier {
    pub fn new(success_probability: f64) -> Self {
        Self {
            success_probability: if success_probability.is_finite() {
                success_probability.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

impl ScanVerifier for RandomScanVerifier {
    fn verify(&self) -> bool {
        rand::thread_rng().gen_bool(self.success_probability)
    }
}
