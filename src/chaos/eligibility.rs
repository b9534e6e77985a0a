//! Eligibility filter
//!
//! Decides from a deployment's annotations and the run policy whether the
//! deployment is a candidate for fault injection.

use std::collections::BTreeMap;

use super::types::*;

/// Annotation values that count as "not set"
const FALSY_VALUES: [&str; 5] = ["", "false", "0", "no", "off"];

/// Returns true when `key` is present and its value is not false-like.
///
/// Values are compared after trimming and lower-casing, so `" False "` is
/// falsy and `"yes"`, `"true"` or `"1"` are truthy.
pub fn annotation_is_truthy(annotations: &BTreeMap<String, String>, key: &str) -> bool {
    annotations
        .get(key)
        .map(|value| {
            let value = value.trim().to_ascii_lowercase();
            !FALSY_VALUES.contains(&value.as_str())
        })
        .unwrap_or(false)
}

/// Evaluate a workload against the policy. The first matching rule wins.
pub fn evaluate(workload: &Workload, policy: &FaultInjectionPolicy) -> EligibilityDecision {
    if policy.include_by_default && policy.ignores_namespace(&workload.namespace) {
        return EligibilityDecision::IgnoredNamespace;
    }

    if annotation_is_truthy(&workload.annotations, OPT_OUT_ANNOTATION) {
        return EligibilityDecision::OptedOut;
    }

    if !policy.include_by_default
        && !annotation_is_truthy(&workload.annotations, OPT_IN_ANNOTATION)
    {
        return EligibilityDecision::NotOptedIn;
    }

    EligibilityDecision::Eligible
}

pub fn is_eligible(workload: &Workload, policy: &FaultInjectionPolicy) -> bool {
    evaluate(workload, policy).is_eligible()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_ns() -> Workload {
        Workload::new("web", "default")
    }

    #[test]
    fn test_truthiness() {
        let mut annotations = BTreeMap::new();
        assert!(!annotation_is_truthy(&annotations, OPT_IN_ANNOTATION));

        for value in ["", "false", "FALSE", " 0 ", "no", "Off"] {
            annotations.insert(OPT_IN_ANNOTATION.to_string(), value.to_string());
            assert!(
                !annotation_is_truthy(&annotations, OPT_IN_ANNOTATION),
                "{:?} should be falsy",
                value
            );
        }

        for value in ["true", "True", "1", "yes", "enabled"] {
            annotations.insert(OPT_IN_ANNOTATION.to_string(), value.to_string());
            assert!(
                annotation_is_truthy(&annotations, OPT_IN_ANNOTATION),
                "{:?} should be truthy",
                value
            );
        }
    }

    #[test]
    fn test_ignored_namespace_excluded_even_when_opted_in() {
        let workload = Workload::new("coredns", "kube-system")
            .with_annotation(OPT_IN_ANNOTATION, "true");
        let policy = FaultInjectionPolicy::new(true, ["kube-system"]);

        assert_eq!(
            evaluate(&workload, &policy),
            EligibilityDecision::IgnoredNamespace
        );
    }

    #[test]
    fn test_no_annotations_without_default_inclusion() {
        let policy = FaultInjectionPolicy::new(false, Vec::<String>::new());
        assert_eq!(
            evaluate(&default_ns(), &policy),
            EligibilityDecision::NotOptedIn
        );
    }

    #[test]
    fn test_no_annotations_with_default_inclusion() {
        let policy = FaultInjectionPolicy::new(true, ["kube-system"]);
        assert!(is_eligible(&default_ns(), &policy));
    }

    #[test]
    fn test_opt_in_without_default_inclusion() {
        let workload = default_ns().with_annotation(OPT_IN_ANNOTATION, "true");
        let policy = FaultInjectionPolicy::default();
        assert!(is_eligible(&workload, &policy));
    }

    #[test]
    fn test_falsy_opt_in_is_not_an_opt_in() {
        let workload = default_ns().with_annotation(OPT_IN_ANNOTATION, "false");
        let policy = FaultInjectionPolicy::default();
        assert_eq!(evaluate(&workload, &policy), EligibilityDecision::NotOptedIn);
    }

    #[test]
    fn test_opt_out_wins_over_opt_in() {
        let workload = default_ns()
            .with_annotation(OPT_IN_ANNOTATION, "true")
            .with_annotation(OPT_OUT_ANNOTATION, "true");

        for include_by_default in [true, false] {
            let policy = FaultInjectionPolicy::new(include_by_default, Vec::<String>::new());
            assert_eq!(evaluate(&workload, &policy), EligibilityDecision::OptedOut);
        }
    }

    #[test]
    fn test_ignore_list_has_no_effect_without_default_inclusion() {
        let workload = Workload::new("metrics", "monitoring")
            .with_annotation(OPT_IN_ANNOTATION, "true");
        let policy = FaultInjectionPolicy::new(false, ["monitoring"]);
        assert!(is_eligible(&workload, &policy));
    }

    fn annotation_value() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            Just(Some("false".to_string())),
            Just(Some("0".to_string())),
            Just(Some("true".to_string())),
            Just(Some("1".to_string())),
            "[a-zA-Z0-9 ]{0,8}".prop_map(Some),
        ]
    }

    fn workload_strategy() -> impl Strategy<Value = Workload> {
        (
            prop_oneof![
                Just("default".to_string()),
                Just("kube-system".to_string()),
                "[a-z]{1,10}"
            ],
            annotation_value(),
            annotation_value(),
        )
            .prop_map(|(namespace, opt_in, opt_out)| {
                let mut workload = Workload::new("w", namespace);
                if let Some(v) = opt_in {
                    workload = workload.with_annotation(OPT_IN_ANNOTATION, v);
                }
                if let Some(v) = opt_out {
                    workload = workload.with_annotation(OPT_OUT_ANNOTATION, v);
                }
                workload
            })
    }

    proptest! {
        /// Ignored namespaces are never targeted when deployments are included by default.
        #[test]
        fn ignored_namespace_never_eligible(workload in workload_strategy()) {
            let policy = FaultInjectionPolicy::new(true, [workload.namespace.clone()]);
            prop_assert!(!is_eligible(&workload, &policy));
        }

        /// A truthy opt-out excludes regardless of opt-in or default inclusion.
        #[test]
        fn opt_out_always_excludes(
            workload in workload_strategy(),
            include_by_default in any::<bool>(),
        ) {
            let workload = workload.with_annotation(OPT_OUT_ANNOTATION, "true");
            let policy = FaultInjectionPolicy::new(include_by_default, Vec::<String>::new());
            prop_assert!(!is_eligible(&workload, &policy));
        }

        /// Without default inclusion, eligibility is exactly "opted in and not opted out".
        #[test]
        fn explicit_opt_in_required(
            workload in workload_strategy(),
            ignore_own_namespace in any::<bool>(),
        ) {
            let ignored = if ignore_own_namespace {
                vec![workload.namespace.clone()]
            } else {
                Vec::new()
            };
            let policy = FaultInjectionPolicy::new(false, ignored);
            let expected = annotation_is_truthy(&workload.annotations, OPT_IN_ANNOTATION)
                && !annotation_is_truthy(&workload.annotations, OPT_OUT_ANNOTATION);
            prop_assert_eq!(is_eligible(&workload, &policy), expected);
        }

        /// Evaluation holds no hidden state.
        #[test]
        fn evaluation_is_repeatable(
            workload in workload_strategy(),
            include_by_default in any::<bool>(),
        ) {
            let policy = FaultInjectionPolicy::new(include_by_default, ["kube-system"]);
            prop_assert_eq!(evaluate(&workload, &policy), evaluate(&workload, &policy));
        }
    }
}
