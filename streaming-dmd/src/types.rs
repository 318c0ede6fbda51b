use faer::Mat;

/// Error types for DMD operations.
#[derive(Debug, thiserror::Error)]
pub enum DmdError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no snapshot pairs have been processed yet")]
    EmptyState,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("SVD computation failed: {0}")]
    SvdFailed(String),

    #[error("eigendecomposition failed: {0}")]
    EigenFailed(String),

    #[error("linear solve failed: {0}")]
    SolveFailed(String),
}

/// How the batch algorithm picks its truncation rank from the singular
/// values of `X`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RankSelection {
    /// Keep singular values above `tol * σ_max` (numerical rank).
    Tolerance(f64),
    /// Smallest rank capturing at least this fraction of Σσ².
    Energy(f64),
    /// Explicit rank, clamped to the number of singular values.
    Fixed(usize),
}

/// Configuration for batch DMD.
#[derive(Debug, Clone)]
pub struct DmdConfig {
    /// Truncation rule for the SVD of `X`.
    pub rank: RankSelection,
    /// Exact modes `Φ = Y V Σ⁻¹ W` when true, projected modes `Φ = U W` otherwise.
    pub exact: bool,
}

impl Default for DmdConfig {
    fn default() -> Self {
        Self {
            rank: RankSelection::Tolerance(1e-10),
            exact: true,
        }
    }
}

/// Complex number type (re, im).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct C64 {
    pub re: f64,
    pub im: f64,
}

impl C64 {
    /// Create a new complex number.
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Magnitude |z| = sqrt(re² + im²).
    pub fn norm(&self) -> f64 {
        (self.re * self.re + self.im * self.im).sqrt()
    }

    /// Squared magnitude re² + im².
    pub fn norm_sqr(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// Phase angle atan2(im, re).
    pub fn arg(&self) -> f64 {
        self.im.atan2(self.re)
    }

    /// Complex conjugate (re, -im).
    pub fn conj(&self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    /// Raise to a real power: (r e^{iθ})^p = r^p e^{ipθ}.
    pub fn powf(&self, p: f64) -> Self {
        let r = self.norm();
        let theta = self.arg();
        let rp = r.powf(p);
        Self {
            re: rp * (p * theta).cos(),
            im: rp * (p * theta).sin(),
        }
    }

    /// The zero complex number (0 + 0i).
    pub fn zero() -> Self {
        Self { re: 0.0, im: 0.0 }
    }
}

impl std::ops::Add for C64 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl std::ops::AddAssign for C64 {
    fn add_assign(&mut self, rhs: Self) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl std::ops::Sub for C64 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl std::ops::Mul for C64 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}

impl std::ops::Div for C64 {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        let denom = rhs.norm_sqr();
        Self {
            re: (self.re * rhs.re + self.im * rhs.im) / denom,
            im: (self.im * rhs.re - self.re * rhs.im) / denom,
        }
    }
}

/// Modes and eigenvalues produced by either the batch or the streaming
/// algorithm.
#[derive(Debug, Clone)]
pub struct DmdResult {
    /// DMD modes Φ (n_states × rank), `modes[i][j]` is mode j at state i.
    pub modes: Vec<Vec<C64>>,
    /// Eigenvalues λ (rank), discrete-time.
    pub eigenvalues: Vec<C64>,
    /// Number of modes.
    pub rank: usize,
    /// Reduced operator the eigenvalues were taken from (rank × rank).
    pub a_tilde: Mat<f64>,
    /// Dimension of each snapshot.
    pub n_states: usize,
}

impl DmdResult {
    /// Result with no modes, for all-zero input.
    pub(crate) fn empty(n_states: usize) -> Self {
        Self {
            modes: vec![Vec::new(); n_states],
            eigenvalues: Vec::new(),
            rank: 0,
            a_tilde: Mat::<f64>::zeros(0, 0),
            n_states,
        }
    }

    /// Get mode column j.
    pub fn mode(&self, j: usize) -> Vec<C64> {
        (0..self.n_states).map(|i| self.modes[i][j]).collect()
    }

    /// Euclidean norm of mode column j.
    pub fn mode_norm(&self, j: usize) -> f64 {
        (0..self.n_states)
            .map(|i| self.modes[i][j].norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    /// Number of state variables.
    pub fn n_vars(&self) -> usize {
        self.n_states
    }
}

/// Information about a single DMD mode.
#[derive(Debug, Clone)]
pub struct ModeInfo {
    /// Mode index.
    pub index: usize,
    /// Complex eigenvalue.
    pub eigenvalue: C64,
    /// Eigenvalue magnitude |λ|.
    pub magnitude: f64,
    /// Eigenvalue phase angle (radians).
    pub phase: f64,
    /// Oscillation frequency |arg λ| / (2π dt).
    pub frequency: f64,
    /// Growth rate (log|λ|/dt).
    pub growth_rate: f64,
    /// Stability classification.
    pub stability: Stability,
    /// ‖φ‖·|λ| scaled so the strongest mode is 1.
    pub power: f64,
}

/// Stability classification of a mode or system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    Decaying,
    Neutral,
    Growing,
}

impl std::fmt::Display for Stability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stability::Decaying => write!(f, "decaying"),
            Stability::Neutral => write!(f, "neutral"),
            Stability::Growing => write!(f, "growing"),
        }
    }
}

/// Result of stability analysis.
#[derive(Debug, Clone)]
pub struct StabilityResult {
    /// Whether all modes are decaying or neutral.
    pub is_stable: bool,
    /// Whether any mode is exactly neutral (within tolerance).
    pub is_marginal: bool,
    /// Maximum eigenvalue magnitude.
    pub spectral_radius: f64,
    /// Per-mode stability classification.
    pub mode_stability: Vec<Stability>,
}

/// Side-by-side comparison of two eigenvalue sets.
#[derive(Debug, Clone)]
pub struct SpectrumComparison {
    /// First spectrum, canonically sorted.
    pub left: Vec<C64>,
    /// Second spectrum, canonically sorted.
    pub right: Vec<C64>,
    /// Largest |λᵢ - μᵢ| over the sorted pairs (infinite on count mismatch).
    pub max_difference: f64,
    /// Counts match and every pair is within tolerance.
    pub all_close: bool,
}
