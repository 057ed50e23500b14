//! Similarity matchers: score how likely a record and a candidate are the
//! same physical object.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{build, PluginArgs, PluginRegistry};
use crate::catalog::{CatalogView, Layer2Object, Record};
use crate::error::ConfigurationError;

/// Scores a record against a reference candidate. Scores lie in `[0, 1]`.
pub trait Matcher: fmt::Debug + Send + Sync {
    fn score(&self, record: &Record, candidate: &Layer2Object) -> f64;
}

/// Typed matcher tree, built once from configuration and then evaluated.
#[derive(Debug, Clone)]
pub enum MatcherSpec {
    /// 1.0 when the closest pair of stored positions lies within the
    /// radius, else 0.0.
    Circle { radius_arcsec: f64 },
    /// Edit-distance similarity of the closest pair of designations.
    /// Case matters unless `ignore_case` is set.
    Levenshtein { max_distance: f64, ignore_case: bool },
    /// 1.0 when the velocities differ by at most the variance, else 0.0.
    VelocityClose { velocity_variance: f64 },
    /// Fixed score.
    Constant(f64),
    /// Product of both scores.
    And(Box<MatcherSpec>, Box<MatcherSpec>),
    /// 1.0 when either side has no designation, else the inner score.
    IgnoreNoName(Box<MatcherSpec>),
    /// 1.0 when either side has no redshift, else the inner score.
    IgnoreNoRedshift(Box<MatcherSpec>),
    /// A user-registered matcher.
    Custom(Arc<dyn Matcher>),
}

impl MatcherSpec {
    /// Build from a configuration tree with the built-in registry.
    pub fn from_config(config: &Value) -> Result<Self, ConfigurationError> {
        build(config, &default_matcher_registry())
    }

    pub fn and(left: MatcherSpec, right: MatcherSpec) -> Self {
        MatcherSpec::And(Box::new(left), Box::new(right))
    }

    pub fn ignore_no_name(inner: MatcherSpec) -> Self {
        MatcherSpec::IgnoreNoName(Box::new(inner))
    }

    pub fn ignore_no_redshift(inner: MatcherSpec) -> Self {
        MatcherSpec::IgnoreNoRedshift(Box::new(inner))
    }
}

impl Matcher for MatcherSpec {
    fn score(&self, record: &Record, candidate: &Layer2Object) -> f64 {
        match self {
            MatcherSpec::Circle { radius_arcsec } => {
                let closest = record
                    .positions()
                    .iter()
                    .filter_map(|p| candidate.closest_separation_arcsec(p))
                    .min_by(f64::total_cmp);
                match closest {
                    Some(separation) if separation <= *radius_arcsec => 1.0,
                    _ => 0.0,
                }
            }
            MatcherSpec::Levenshtein {
                max_distance,
                ignore_case,
            } => {
                let fold = |design: String| {
                    if *ignore_case {
                        design.to_lowercase()
                    } else {
                        design
                    }
                };
                let ours: Vec<String> =
                    record.designations().into_iter().map(|d| fold(d.design)).collect();
                let theirs: Vec<String> =
                    candidate.designations().into_iter().map(|d| fold(d.design)).collect();
                let closest = ours
                    .iter()
                    .flat_map(|a| theirs.iter().map(move |b| levenshtein_distance(a, b)))
                    .min();
                match closest {
                    Some(distance) => similarity(distance as f64, *max_distance),
                    None => 0.0,
                }
            }
            MatcherSpec::VelocityClose { velocity_variance } => {
                match (record.redshift(), candidate.redshift()) {
                    (Some(a), Some(b)) if (a.cz - b.cz).abs() <= *velocity_variance => 1.0,
                    _ => 0.0,
                }
            }
            MatcherSpec::Constant(value) => *value,
            MatcherSpec::And(left, right) => {
                left.score(record, candidate) * right.score(record, candidate)
            }
            MatcherSpec::IgnoreNoName(inner) => {
                if record.designations().is_empty() || candidate.designations().is_empty() {
                    1.0
                } else {
                    inner.score(record, candidate)
                }
            }
            MatcherSpec::IgnoreNoRedshift(inner) => {
                if record.redshift().is_none() || candidate.redshift().is_none() {
                    1.0
                } else {
                    inner.score(record, candidate)
                }
            }
            MatcherSpec::Custom(matcher) => matcher.score(record, candidate),
        }
    }
}

/// Registry of the built-in matchers.
///
/// | type                 | arguments                                |
/// |----------------------|------------------------------------------|
/// | `circle`             | `radius_arcsec`                          |
/// | `levenshtein`        | `max_distance`, `ignore_case` (optional) |
/// | `velocity_close`     | `velocity_variance`                      |
/// | `constant`           | `value`                                  |
/// | `and`                | `matcher1`, `matcher2`                   |
/// | `ignore_no_name`     | `matcher`                                |
/// | `ignore_no_redshift` | `matcher`                                |
pub fn default_matcher_registry() -> PluginRegistry<MatcherSpec> {
    PluginRegistry::new("matcher")
        .with("circle", |args| {
            let radius_arcsec = non_negative(args, "radius_arcsec")?;
            Ok(MatcherSpec::Circle { radius_arcsec })
        })
        .with("levenshtein", |args| {
            let max_distance = non_negative(args, "max_distance")?;
            let ignore_case = args.bool_or("ignore_case", false)?;
            Ok(MatcherSpec::Levenshtein {
                max_distance,
                ignore_case,
            })
        })
        .with("velocity_close", |args| {
            let velocity_variance = non_negative(args, "velocity_variance")?;
            Ok(MatcherSpec::VelocityClose { velocity_variance })
        })
        .with("constant", |args| {
            let value = args.f64("value")?;
            if !(0.0..=1.0).contains(&value) {
                return Err(args.invalid("value", "score must lie in [0, 1]"));
            }
            Ok(MatcherSpec::Constant(value))
        })
        .with("and", |args| {
            let left = args.plugin("matcher1")?;
            let right = args.plugin("matcher2")?;
            Ok(MatcherSpec::and(left, right))
        })
        .with("ignore_no_name", |args| {
            Ok(MatcherSpec::ignore_no_name(args.plugin("matcher")?))
        })
        .with("ignore_no_redshift", |args| {
            Ok(MatcherSpec::ignore_no_redshift(args.plugin("matcher")?))
        })
}

fn non_negative(
    args: &mut PluginArgs<MatcherSpec>,
    name: &str,
) -> Result<f64, ConfigurationError> {
    let value = args.f64(name)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(args.invalid(name, "must be a non-negative number"))
    }
}

/// `max(0, 1 - distance / max_distance)`; a zero `max_distance` accepts
/// only identical strings.
fn similarity(distance: f64, max_distance: f64) -> f64 {
    if max_distance <= 0.0 {
        if distance == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        (1.0 - distance / max_distance).max(0.0)
    }
}

/// Minimum number of single-character insertions, deletions and
/// substitutions turning `a` into `b`.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rolling rows of the edit matrix.
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogObject, DesignationObject, IcrsObject, RedshiftObject};
    use serde_json::json;

    fn record(objects: Vec<CatalogObject>) -> Record {
        Record::new("r", objects)
    }

    fn candidate(objects: Vec<CatalogObject>) -> Layer2Object {
        Layer2Object::new(1, objects)
    }

    fn icrs(ra: f64, dec: f64) -> CatalogObject {
        CatalogObject::Icrs(IcrsObject::new(ra, dec, 0.001, 0.001).unwrap())
    }

    fn name(design: &str) -> CatalogObject {
        CatalogObject::Designation(DesignationObject::new(design).unwrap())
    }

    fn cz(value: f64) -> CatalogObject {
        CatalogObject::Redshift(RedshiftObject::new(value, None).unwrap())
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("M33", "M33"), 0);
        assert_eq!(levenshtein_distance("NGC 224", "NGC224"), 1);
    }

    #[test]
    fn test_circle() {
        let matcher = MatcherSpec::Circle { radius_arcsec: 10.0 };
        // 5 arcsec apart in declination.
        let near = candidate(vec![icrs(10.0, 20.0 + 5.0 / 3600.0)]);
        let far = candidate(vec![icrs(10.0, 20.0 + 15.0 / 3600.0)]);
        let r = record(vec![icrs(10.0, 20.0)]);

        assert_eq!(matcher.score(&r, &near), 1.0);
        assert_eq!(matcher.score(&r, &far), 0.0);
        assert_eq!(matcher.score(&record(vec![]), &near), 0.0);
    }

    #[test]
    fn test_levenshtein_score() {
        let matcher = MatcherSpec::Levenshtein {
            max_distance: 4.0,
            ignore_case: false,
        };
        let r = record(vec![name("NGC 224")]);

        assert_eq!(matcher.score(&r, &candidate(vec![name("NGC 224")])), 1.0);
        assert_eq!(matcher.score(&r, &candidate(vec![name("NGC224")])), 0.75);
        assert_eq!(matcher.score(&r, &candidate(vec![name("ngc 224")])), 0.25);
        assert_eq!(matcher.score(&r, &candidate(vec![name("Andromeda")])), 0.0);
        assert_eq!(matcher.score(&r, &candidate(vec![])), 0.0);
    }

    #[test]
    fn test_levenshtein_case_is_significant_by_default() {
        let strict = MatcherSpec::from_config(&json!({"type": "levenshtein", "max_distance": 3}))
            .unwrap();
        let score = strict.score(&record(vec![name("M33")]), &candidate(vec![name("m33")]));
        assert!((score - 2.0 / 3.0).abs() < 1e-12);

        let folded = MatcherSpec::from_config(
            &json!({"type": "levenshtein", "max_distance": 3, "ignore_case": true}),
        )
        .unwrap();
        assert_eq!(folded.score(&record(vec![name("M33")]), &candidate(vec![name("m33")])), 1.0);
    }

    #[test]
    fn test_levenshtein_uses_closest_designation() {
        let matcher = MatcherSpec::Levenshtein {
            max_distance: 3.0,
            ignore_case: false,
        };
        // The majority name is M33; the record uses the alias.
        let known = candidate(vec![name("M33"), name("M33"), name("Triangulum")]);
        assert_eq!(matcher.score(&record(vec![name("Triangulum")]), &known), 1.0);
        assert_eq!(matcher.score(&record(vec![name("M33")]), &known), 1.0);
    }

    #[test]
    fn test_circle_across_ra_wrap() {
        let matcher = MatcherSpec::Circle { radius_arcsec: 10.0 };
        // Mean RA of these two is 180, yet both lie next to RA 0.
        let straddling = candidate(vec![icrs(359.9999, 0.0), icrs(0.0001, 0.0)]);
        assert_eq!(matcher.score(&record(vec![icrs(0.0, 0.0)]), &straddling), 1.0);
        assert_eq!(matcher.score(&record(vec![icrs(180.0, 0.0)]), &straddling), 0.0);
    }

    #[test]
    fn test_velocity_close() {
        let matcher = MatcherSpec::VelocityClose {
            velocity_variance: 50.0,
        };
        let r = record(vec![cz(1000.0)]);
        assert_eq!(matcher.score(&r, &candidate(vec![cz(1040.0)])), 1.0);
        assert_eq!(matcher.score(&r, &candidate(vec![cz(1100.0)])), 0.0);
    }

    #[test]
    fn test_and_multiplies() {
        let matcher = MatcherSpec::from_config(&json!({
            "type": "and",
            "matcher1": {"type": "constant", "value": 0.5},
            "matcher2": {"type": "constant", "value": 0.4}
        }))
        .unwrap();

        let score = matcher.score(&record(vec![]), &candidate(vec![]));
        assert!((score - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_ignore_no_name_when_either_side_missing() {
        let matcher = MatcherSpec::ignore_no_name(MatcherSpec::Levenshtein {
            max_distance: 0.0,
            ignore_case: false,
        });
        let named = record(vec![name("M33")]);
        let unnamed = candidate(vec![icrs(1.0, 1.0)]);

        assert_eq!(matcher.score(&named, &unnamed), 1.0);
        assert_eq!(matcher.score(&record(vec![]), &candidate(vec![name("M31")])), 1.0);
        assert_eq!(matcher.score(&named, &candidate(vec![name("M31")])), 0.0);
    }

    #[test]
    fn test_ignore_no_redshift() {
        let matcher = MatcherSpec::ignore_no_redshift(MatcherSpec::VelocityClose {
            velocity_variance: 10.0,
        });
        assert_eq!(matcher.score(&record(vec![cz(100.0)]), &candidate(vec![])), 1.0);
        assert_eq!(
            matcher.score(&record(vec![cz(100.0)]), &candidate(vec![cz(500.0)])),
            0.0
        );
    }

    #[test]
    fn test_registry_rejects_bad_arguments() {
        let err = MatcherSpec::from_config(&json!({"type": "circle", "radius_arcsec": -1}))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidArgument { .. }));

        let err = MatcherSpec::from_config(&json!({"type": "levenshtein"})).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingArgument {
                plugin: "levenshtein".to_string(),
                argument: "max_distance".to_string()
            }
        );

        let err = MatcherSpec::from_config(&json!({"type": "fuzzy"})).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownPluginType { .. }));
    }

    #[derive(Debug)]
    struct AlwaysHalf;

    impl Matcher for AlwaysHalf {
        fn score(&self, _: &Record, _: &Layer2Object) -> f64 {
            0.5
        }
    }

    #[test]
    fn test_custom_matcher_registration() {
        let registry = default_matcher_registry()
            .with("half", |_| Ok(MatcherSpec::Custom(Arc::new(AlwaysHalf))));
        let matcher = build(
            &json!({"type": "and", "matcher1": {"type": "half"}, "matcher2": {"type": "half"}}),
            &registry,
        )
        .unwrap();
        assert_eq!(matcher.score(&record(vec![]), &candidate(vec![])), 0.25);
    }
}
