//! Subjective opinions (mass functions) over the frame {skill, ¬skill}
//!
//! An [`Opinion`] assigns mass to "supports", "refutes" and "uncertain" and
//! always sums to 1. Construction rescales any triple that does not.

use serde::Serialize;

/// Sum tolerance before an input triple is rescaled
pub const SUM_TOLERANCE: f64 = 1e-3;

/// A (supports, refutes, uncertain) mass triple summing to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Opinion {
    supports: f64,
    refutes: f64,
    uncertain: f64,
}

impl Opinion {
    /// Build an opinion, rescaling proportionally if the triple does not
    /// sum to 1 within [`SUM_TOLERANCE`]
    ///
    /// A triple with a non-positive or non-finite sum cannot be rescaled and
    /// becomes the vacuous opinion.
    pub fn new(supports: f64, refutes: f64, uncertain: f64) -> Self {
        let total = supports + refutes + uncertain;
        if !total.is_finite() || total <= 0.0 {
            return Self::vacuous();
        }
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Self {
                supports: supports / total,
                refutes: refutes / total,
                uncertain: uncertain / total,
            };
        }
        Self {
            supports,
            refutes,
            uncertain,
        }
    }

    /// Total ignorance: (0, 0, 1)
    pub fn vacuous() -> Self {
        Self {
            supports: 0.0,
            refutes: 0.0,
            uncertain: 1.0,
        }
    }

    /// Opinion carried by an edge of weight `w`: (w, 0, 1 - w)
    pub fn from_weight(w: f64) -> Self {
        Self::new(w, 0.0, 1.0 - w)
    }

    pub fn supports(&self) -> f64 {
        self.supports
    }

    pub fn refutes(&self) -> f64 {
        self.refutes
    }

    pub fn uncertain(&self) -> f64 {
        self.uncertain
    }

    /// Lower bound on "supports"
    pub fn belief(&self) -> f64 {
        self.supports
    }

    /// Upper bound on "supports"
    pub fn plausibility(&self) -> f64 {
        self.supports + self.uncertain
    }

    /// Trust discounting: `source` relays `target`'s opinion
    ///
    /// A source with zero belief yields the vacuous opinion.
    pub fn discount(source: &Opinion, target: &Opinion) -> Opinion {
        let b = source.supports;
        Opinion::new(
            b * target.supports,
            b * target.refutes,
            (1.0 - b) + b * target.uncertain,
        )
    }

    /// Yager combination: conflicting mass is moved to uncertainty
    pub fn combine(m1: &Opinion, m2: &Opinion) -> Opinion {
        let supports =
            m1.supports * m2.supports + m1.supports * m2.uncertain + m1.uncertain * m2.supports;
        let refutes =
            m1.refutes * m2.refutes + m1.refutes * m2.uncertain + m1.uncertain * m2.refutes;
        let conflict = m1.supports * m2.refutes + m1.refutes * m2.supports;
        Opinion::new(supports, refutes, m1.uncertain * m2.uncertain + conflict)
    }

    /// Scale the supporting mass by `factor`, moving the remainder to
    /// uncertainty
    pub fn penalize_support(&self, factor: f64) -> Opinion {
        let supports = self.supports * factor;
        Opinion::new(supports, self.refutes, 1.0 - (supports + self.refutes))
    }

    pub fn total(&self) -> f64 {
        self.supports + self.refutes + self.uncertain
    }
}

impl Default for Opinion {
    fn default() -> Self {
        Self::vacuous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn sample_triples() -> Vec<(f64, f64, f64)> {
        vec![
            (0.8, 0.0, 0.8),
            (0.2, 0.3, 0.5),
            (3.0, 1.0, 0.0),
            (0.0, 0.0, 0.0),
            (1e-9, 0.0, 0.0),
            (0.5, 0.5, 0.5),
            (0.0, 7.0, 1.0),
        ]
    }

    #[test]
    fn test_construction_always_sums_to_one() {
        for (s, r, u) in sample_triples() {
            let m = Opinion::new(s, r, u);
            assert!((m.total() - 1.0).abs() <= SUM_TOLERANCE, "{s} {r} {u} -> {m:?}");
        }
    }

    #[test]
    fn test_construction_rescales_proportionally() {
        let m = Opinion::new(0.8, 0.0, 0.8);
        assert!(approx(m.supports(), 0.5));
        assert!(approx(m.uncertain(), 0.5));
    }

    #[test]
    fn test_within_tolerance_is_kept() {
        let m = Opinion::new(0.3, 0.2, 0.5004);
        assert_eq!(m.uncertain(), 0.5004);
    }

    #[test]
    fn test_degenerate_triple_is_vacuous() {
        assert_eq!(Opinion::new(0.0, 0.0, 0.0), Opinion::vacuous());
        assert_eq!(Opinion::new(f64::NAN, 0.1, 0.2), Opinion::vacuous());
    }

    #[test]
    fn test_discount_by_zero_source_is_vacuous() {
        let source = Opinion::new(0.0, 0.3, 0.7);
        for (s, r, u) in sample_triples() {
            let target = Opinion::new(s, r, u);
            let out = Opinion::discount(&source, &target);
            assert!(approx(out.supports(), 0.0));
            assert!(approx(out.refutes(), 0.0));
            assert!(approx(out.uncertain(), 1.0));
        }
    }

    #[test]
    fn test_discount_formula() {
        let source = Opinion::new(0.5, 0.0, 0.5);
        let target = Opinion::new(0.6, 0.2, 0.2);
        let out = Opinion::discount(&source, &target);
        assert!(approx(out.supports(), 0.3));
        assert!(approx(out.refutes(), 0.1));
        assert!(approx(out.uncertain(), 0.6));
    }

    #[test]
    fn test_combine_is_commutative_and_normalized() {
        let triples = sample_triples();
        for &(a1, a2, a3) in &triples {
            for &(b1, b2, b3) in &triples {
                let a = Opinion::new(a1, a2, a3);
                let b = Opinion::new(b1, b2, b3);
                let ab = Opinion::combine(&a, &b);
                let ba = Opinion::combine(&b, &a);
                assert!(approx(ab.supports(), ba.supports()));
                assert!(approx(ab.refutes(), ba.refutes()));
                assert!(approx(ab.uncertain(), ba.uncertain()));
                assert!((ab.total() - 1.0).abs() <= SUM_TOLERANCE);
            }
        }
    }

    #[test]
    fn test_combine_moves_conflict_to_uncertainty() {
        let m1 = Opinion::new(0.9, 0.0, 0.1);
        let m2 = Opinion::new(0.0, 0.9, 0.1);
        let fused = Opinion::combine(&m1, &m2);
        // conflict 0.81 plus 0.01 joint ignorance
        assert!(approx(fused.supports(), 0.09));
        assert!(approx(fused.refutes(), 0.09));
        assert!(approx(fused.uncertain(), 0.82));
    }

    #[test]
    fn test_combine_with_vacuous_is_identity() {
        let m = Opinion::new(0.4, 0.1, 0.5);
        let fused = Opinion::combine(&m, &Opinion::vacuous());
        assert!(approx(fused.supports(), 0.4));
        assert!(approx(fused.refutes(), 0.1));
        assert!(approx(fused.uncertain(), 0.5));
    }

    #[test]
    fn test_penalize_support() {
        let m = Opinion::new(0.6, 0.1, 0.3).penalize_support(0.5);
        assert!(approx(m.supports(), 0.3));
        assert!(approx(m.uncertain(), 0.6));
        assert!(approx(m.belief(), 0.3));
        assert!(approx(m.plausibility(), 0.9));
    }
}
