//! Built-in workloads.
//!
//! A small suite that exercises the harness end to end. The `microbench`
//! binary runs it; projects can call [`run_workloads`] on their own
//! [`Bench`] as well.

use crate::bench::Bench;
use crate::error::{BenchError, Result};
use crate::result::Measurement;
use std::collections::HashMap;

/// A named workload with its default iteration count.
pub struct Workload {
    pub group: &'static str,
    pub name: &'static str,
    pub iterations: u64,
    measure: fn(&Bench, u64) -> Result<Measurement>,
}

impl Workload {
    /// `group/name`, the string glob patterns are matched against.
    pub fn id(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }
}

/// All built-in workloads, in report order.
pub static WORKLOADS: &[Workload] = &[
    Workload {
        group: "baseline",
        name: "noop",
        iterations: 1_000_000,
        measure: noop,
    },
    Workload {
        group: "strings",
        name: "push_str",
        iterations: 100_000,
        measure: push_str,
    },
    Workload {
        group: "strings",
        name: "collect",
        iterations: 100_000,
        measure: collect_string,
    },
    Workload {
        group: "strings",
        name: "join",
        iterations: 100_000,
        measure: join_string,
    },
    Workload {
        group: "collections",
        name: "vec_push",
        iterations: 100_000,
        measure: vec_push,
    },
    Workload {
        group: "collections",
        name: "vec_with_capacity",
        iterations: 100_000,
        measure: vec_with_capacity,
    },
    Workload {
        group: "collections",
        name: "hashmap_insert",
        iterations: 10_000,
        measure: hashmap_insert,
    },
    Workload {
        group: "sorting",
        name: "sort_unstable",
        iterations: 1_000,
        measure: sort_unstable,
    },
    Workload {
        group: "sorting",
        name: "sort_stable",
        iterations: 1_000,
        measure: sort_stable,
    },
];

const WORD: (&str, usize) = ("abc", 64);

fn noop(bench: &Bench, iterations: u64) -> Result<Measurement> {
    bench.measure(iterations, || ())
}

fn push_str(bench: &Bench, iterations: u64) -> Result<Measurement> {
    bench.measure_with(iterations, &WORD, |(s, n)| {
        let mut out = String::new();
        for _ in 0..*n {
            out.push_str(s);
        }
        out
    })
}

fn collect_string(bench: &Bench, iterations: u64) -> Result<Measurement> {
    bench.measure_with(iterations, &WORD, |(s, n)| {
        std::iter::repeat(*s).take(*n).collect::<String>()
    })
}

fn join_string(bench: &Bench, iterations: u64) -> Result<Measurement> {
    bench.measure_with(iterations, &WORD, |(s, n)| vec![*s; *n].join(""))
}

fn vec_push(bench: &Bench, iterations: u64) -> Result<Measurement> {
    bench.measure_with(iterations, &256u32, |n| {
        let mut v = Vec::new();
        for i in 0..*n {
            v.push(i);
        }
        v
    })
}

fn vec_with_capacity(bench: &Bench, iterations: u64) -> Result<Measurement> {
    bench.measure_with(iterations, &256u32, |n| {
        let mut v = Vec::with_capacity(*n as usize);
        for i in 0..*n {
            v.push(i);
        }
        v
    })
}

fn hashmap_insert(bench: &Bench, iterations: u64) -> Result<Measurement> {
    bench.measure_with(iterations, &64u32, |n| {
        let mut map = HashMap::new();
        for i in 0..*n {
            map.insert(i, i * 2);
        }
        map
    })
}

/// Deterministic pseudo-random input so runs are comparable.
fn shuffled(len: usize) -> Vec<u32> {
    let mut state: u32 = 0x9e37_79b9;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            state
        })
        .collect()
}

fn sort_unstable(bench: &Bench, iterations: u64) -> Result<Measurement> {
    let input = shuffled(1024);
    bench.measure_with(iterations, &input, |data| {
        let mut v = data.clone();
        v.sort_unstable();
        v
    })
}

fn sort_stable(bench: &Bench, iterations: u64) -> Result<Measurement> {
    let input = shuffled(1024);
    bench.measure_with(iterations, &input, |data| {
        let mut v = data.clone();
        v.sort();
        v
    })
}

/// Workloads whose `group/name` matches `pattern` (all when `None`).
pub fn list_workloads(pattern: Option<&str>) -> Vec<&'static Workload> {
    WORKLOADS
        .iter()
        .filter(|w| pattern.map_or(true, |p| matches_glob(&w.id(), p)))
        .collect()
}

/// Run the matching workloads, grouped, with iteration counts multiplied by
/// `scale`. Returns the number of workloads run.
///
/// A zero `scale`, or one that overflows any selected iteration count, fails
/// with [`BenchError::InvalidArgument`] before anything is printed or run.
pub fn run_workloads(bench: &mut Bench, pattern: Option<&str>, scale: u64) -> Result<usize> {
    if scale == 0 {
        return Err(BenchError::invalid_argument("scale", "must be greater than zero"));
    }

    let selected = list_workloads(pattern)
        .into_iter()
        .map(|w| {
            w.iterations
                .checked_mul(scale)
                .map(|iterations| (w, iterations))
                .ok_or_else(|| {
                    BenchError::invalid_argument(
                        "scale",
                        format!("{} x {scale} iterations overflows for {}", w.iterations, w.id()),
                    )
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut current_group: Option<&str> = None;
    for (workload, iterations) in &selected {
        if current_group != Some(workload.group) {
            bench.begin_group(workload.group);
            current_group = Some(workload.group);
        }
        let result = (workload.measure)(bench, *iterations)?;
        bench.report(workload.name, &result);
    }

    Ok(selected.len())
}

/// Simple glob matching supporting `*`. Patterns without a wildcard match as
/// substrings. Case-insensitive.
fn matches_glob(text: &str, pattern: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();

    if !pattern.contains('*') {
        return text.contains(&pattern);
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let mut remaining = text.as_str();

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            // First part must be at the start
            match remaining.strip_prefix(part) {
                Some(rest) => remaining = rest,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            // Last part must be at the end
            if !remaining.ends_with(part) {
                return false;
            }
        } else {
            match remaining.find(part) {
                Some(pos) => remaining = &remaining[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrate::OverheadProfile;
    use crate::config::BenchConfig;
    use crate::testing::{FixedProbe, SharedBuffer};
    use crate::report::StreamReporter;

    fn quiet_bench() -> (Bench, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let profile = OverheadProfile::new(0.0, 0.0).unwrap();
        let mut bench = Bench::with_profile(BenchConfig::new(), profile)
            .unwrap()
            .memory_probe(Box::new(FixedProbe(1.0)));
        bench.reporters(vec![Box::new(StreamReporter::new(Box::new(buffer.clone())))]);
        (bench, buffer)
    }

    #[test]
    fn glob_matches_substring() {
        assert!(matches_glob("strings/push_str", "push"));
        assert!(!matches_glob("strings/push_str", "sort"));
    }

    #[test]
    fn glob_matches_wildcard() {
        assert!(matches_glob("strings/push_str", "strings*str"));
        assert!(matches_glob("strings/push_str", "*push*"));
        assert!(matches_glob("strings/push_str", "strings/*"));
        assert!(matches_glob("strings/push_str", "*_str"));
        assert!(!matches_glob("strings/push_str", "sorting*"));
    }

    #[test]
    fn glob_is_case_insensitive() {
        assert!(matches_glob("Strings/Join", "strings/join"));
        assert!(matches_glob("strings/join", "STRINGS*"));
    }

    #[test]
    fn should_have_unique_workload_ids() {
        let mut ids: Vec<_> = WORKLOADS.iter().map(Workload::id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), WORKLOADS.len());
    }

    #[test]
    fn should_list_workloads_matching_pattern() {
        let sorting = list_workloads(Some("sorting/*"));
        assert_eq!(sorting.len(), 2);
        assert!(sorting.iter().all(|w| w.group == "sorting"));
        assert_eq!(list_workloads(None).len(), WORKLOADS.len());
    }

    #[test]
    fn should_run_selected_workloads_under_one_group_header() {
        let (mut bench, buffer) = quiet_bench();

        let ran = run_workloads(&mut bench, Some("collections/vec*"), 1).unwrap();
        assert_eq!(ran, 2);

        let text = buffer.contents();
        assert_eq!(text.matches("collections").count(), 1);
        assert!(text.contains("vec_push"));
        assert!(text.contains("vec_with_capacity"));
        assert!(text.contains("100,000 iterations"));
    }

    #[test]
    fn should_reject_zero_scale_before_printing() {
        let (mut bench, buffer) = quiet_bench();
        let err = run_workloads(&mut bench, Some("strings/*"), 0).unwrap_err();
        assert!(matches!(err, BenchError::InvalidArgument { parameter: "scale", .. }));
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn should_reject_scale_that_overflows_iterations() {
        let (mut bench, buffer) = quiet_bench();
        let err = run_workloads(&mut bench, Some("baseline/*"), u64::MAX).unwrap_err();
        match err {
            BenchError::InvalidArgument { parameter, reason } => {
                assert_eq!(parameter, "scale");
                assert!(reason.contains("overflows"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn should_run_nothing_when_pattern_matches_nothing() {
        let (mut bench, buffer) = quiet_bench();
        assert_eq!(run_workloads(&mut bench, Some("nope"), 1).unwrap(), 0);
        assert!(buffer.contents().is_empty());
    }
}
