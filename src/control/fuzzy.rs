//! Sugeno fuzzy controller for the heater/cooler mixing ratio.
//!
//! Two inputs are fuzzified with triangular membership functions:
//!
//! ```text
//!  error  (setpoint − temperature, °C)    VeryCold  Cold  Normal  Hot  VeryHot
//!  Δerror (°C / s)                        Decreasing   Stable   Increasing
//! ```
//!
//! Every (error, Δerror) term pair maps to one crisp output singleton.  Rule
//! strength is the fuzzy AND (`min`) of the two degrees, and the crisp
//! output is the strength-weighted average of the fired singletons.
//!
//! The output is the heater share in percent, the cooler taking the rest:
//! 0 means "all cool" (heater 0 %, cooler 100 %), 100 means "all heat".

use log::debug;

/// Triangular membership degree of `x` in the term (a, b, c).
///
/// Zero at or beyond the feet, one exactly at the peak `b`.
pub fn membership(x: f32, a: f32, b: f32, c: f32) -> f32 {
    if x <= a || x >= c {
        0.0
    } else if x < b {
        (x - a) / (b - a)
    } else {
        (c - x) / (c - b)
    }
}

/// Breakpoints of one triangular term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl Triangle {
    pub const fn new(a: f32, b: f32, c: f32) -> Self {
        Self { a, b, c }
    }

    pub fn degree(&self, x: f32) -> f32 {
        membership(x, self.a, self.b, self.c)
    }
}

// ---------------------------------------------------------------------------
// Linguistic terms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorTerm {
    VeryCold = 0,
    Cold = 1,
    Normal = 2,
    Hot = 3,
    VeryHot = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeltaTerm {
    Decreasing = 0,
    Stable = 1,
    Increasing = 2,
}

/// The nine output singletons, named by heating demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputLevel {
    VeryHigh,
    High,
    FairlyHigh,
    MediumHigh,
    Medium,
    MediumLow,
    Low,
    VeryLow,
    Minimum,
}

impl OutputLevel {
    /// Crisp ratio (percent) of this singleton.
    pub const fn percent(self) -> f32 {
        match self {
            Self::VeryHigh => 0.0,
            Self::High => 10.0,
            Self::FairlyHigh => 25.0,
            Self::MediumHigh => 35.0,
            Self::Medium => 50.0,
            Self::MediumLow => 65.0,
            Self::Low => 75.0,
            Self::VeryLow => 90.0,
            Self::Minimum => 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Linguistic variables
// ---------------------------------------------------------------------------

/// A named set of triangular terms over one input.
pub struct LinguisticVariable<T: Copy + 'static, const N: usize> {
    pub name: &'static str,
    pub terms: [(T, Triangle); N],
}

impl<T: Copy + 'static, const N: usize> LinguisticVariable<T, N> {
    /// Degree of `value` in every term.  Terms overlap, so several entries
    /// may be nonzero at once.
    pub fn classify(&self, value: f32) -> [(T, f32); N] {
        self.terms.map(|(term, tri)| (term, tri.degree(value)))
    }
}

/// Free-function form of [`LinguisticVariable::classify`].
pub fn classify<T: Copy + 'static, const N: usize>(
    value: f32,
    variable: &LinguisticVariable<T, N>,
) -> [(T, f32); N] {
    variable.classify(value)
}

/// Temperature error.  The ±100 feet stand in for an unbounded shoulder.
pub const ERROR: LinguisticVariable<ErrorTerm, 5> = LinguisticVariable {
    name: "error",
    terms: [
        (ErrorTerm::VeryCold, Triangle::new(-100.0, -10.0, -5.0)),
        (ErrorTerm::Cold, Triangle::new(-10.0, -5.0, 0.0)),
        (ErrorTerm::Normal, Triangle::new(-5.0, 0.0, 5.0)),
        (ErrorTerm::Hot, Triangle::new(0.0, 5.0, 10.0)),
        (ErrorTerm::VeryHot, Triangle::new(5.0, 10.0, 100.0)),
    ],
};

/// Rate of change of the temperature error.
pub const DELTA_ERROR: LinguisticVariable<DeltaTerm, 3> = LinguisticVariable {
    name: "delta_error",
    terms: [
        (DeltaTerm::Decreasing, Triangle::new(-100.0, -5.0, 0.0)),
        (DeltaTerm::Stable, Triangle::new(-2.0, 0.0, 2.0)),
        (DeltaTerm::Increasing, Triangle::new(0.0, 5.0, 100.0)),
    ],
};

// ---------------------------------------------------------------------------
// Rule base
// ---------------------------------------------------------------------------

/// Rule table indexed `[ErrorTerm as usize][DeltaTerm as usize]`.
pub const RULES: [[OutputLevel; 3]; 5] = {
    use OutputLevel::*;
    [
        // Decreasing  Stable      Increasing
        [VeryHigh, VeryHigh, High],         // VeryCold
        [High, FairlyHigh, MediumHigh],     // Cold
        [MediumHigh, Medium, MediumLow],    // Normal
        [MediumLow, Low, VeryLow],          // Hot
        [VeryLow, Minimum, Minimum],        // VeryHot
    ]
};

/// Output singleton for one rule.
pub const fn rule(error: ErrorTerm, delta: DeltaTerm) -> OutputLevel {
    RULES[error as usize][delta as usize]
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

/// Result of one inference pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inference {
    /// Crisp output ratio (percent).
    pub output: f32,
    /// Sum of rule strengths.  Zero means no rule fired.
    pub total_weight: f32,
    /// Number of rules with nonzero strength.
    pub fired: u8,
}

impl Inference {
    pub fn no_rule_fired(&self) -> bool {
        self.total_weight == 0.0
    }
}

/// Full inference pass, keeping the rule-activation bookkeeping.
///
/// When no rule fires the output is 0.  That value lands on the
/// "all cool" end of the scale (heater closed, cooler fully open), not
/// "off"; callers get it unaltered.
pub fn evaluate(error: f32, delta_error: f32) -> Inference {
    let error_degrees = ERROR.classify(error);
    let delta_degrees = DELTA_ERROR.classify(delta_error);

    let mut numerator = 0.0_f32;
    let mut denominator = 0.0_f32;
    let mut fired = 0_u8;

    for (e_term, e_deg) in error_degrees {
        if e_deg == 0.0 {
            continue;
        }
        for (d_term, d_deg) in delta_degrees {
            if d_deg == 0.0 {
                continue;
            }
            let weight = e_deg.min(d_deg);
            numerator += weight * rule(e_term, d_term).percent();
            denominator += weight;
            fired += 1;
        }
    }

    if denominator == 0.0 {
        debug!("fuzzy: no rule fired for error={error:.2} delta={delta_error:.2}");
        return Inference {
            output: 0.0,
            total_weight: 0.0,
            fired: 0,
        };
    }

    Inference {
        // Rounding in the weighted sum can overshoot the singleton span.
        output: (numerator / denominator).clamp(0.0, 100.0),
        total_weight: denominator,
        fired,
    }
}

/// Crisp heater/cooler ratio (percent) for the given error and its rate.
pub fn infer(error: f32, delta_error: f32) -> f32 {
    evaluate(error, delta_error).output
}
