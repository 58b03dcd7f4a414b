use serde::{Deserialize, Serialize};

/// Execution knobs for [`crate::compute_column_with_options`].
///
/// Missing fields deserialize to their defaults, so partial JSON configs are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeOptions {
    /// Evaluate row tasks on the worker pool when available.
    pub parallel: bool,
    /// Rows handled by one task (and one scratch register file).
    pub rows_per_task: usize,
    /// Tables shorter than this are evaluated on the calling thread.
    pub min_parallel_rows: usize,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            rows_per_task: 16_384,
            min_parallel_rows: 65_536,
        }
    }
}

fn parse_usize(raw: &str) -> Option<usize> {
    raw.trim().replace('_', "").parse::<usize>().ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ComputeOptions {
    /// Defaults overridden by `FORMULA_COMPUTE_PARALLEL`, `FORMULA_COMPUTE_ROWS_PER_TASK` and
    /// `FORMULA_COMPUTE_MIN_PARALLEL_ROWS`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let usize_var = |name: &str| var(name).as_deref().and_then(parse_usize);
        Self {
            parallel: var("FORMULA_COMPUTE_PARALLEL")
                .as_deref()
                .and_then(parse_bool)
                .unwrap_or(defaults.parallel),
            // Zero rows per task is ignored; a zero threshold always allows parallel runs.
            rows_per_task: usize_var("FORMULA_COMPUTE_ROWS_PER_TASK")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.rows_per_task),
            min_parallel_rows: usize_var("FORMULA_COMPUTE_MIN_PARALLEL_ROWS")
                .unwrap_or(defaults.min_parallel_rows),
        }
    }

    pub fn serial() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts: ComputeOptions = serde_json::from_str(r#"{"rows_per_task": 128}"#).unwrap();
        assert_eq!(
            opts,
            ComputeOptions {
                rows_per_task: 128,
                ..ComputeOptions::default()
            }
        );
    }

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn environment_overrides_defaults() {
        let opts = ComputeOptions::from_vars(vars(&[
            ("FORMULA_COMPUTE_PARALLEL", "off"),
            ("FORMULA_COMPUTE_ROWS_PER_TASK", "4_096"),
            ("FORMULA_COMPUTE_MIN_PARALLEL_ROWS", "0"),
        ]));
        assert_eq!(
            opts,
            ComputeOptions {
                parallel: false,
                rows_per_task: 4_096,
                min_parallel_rows: 0,
            }
        );
    }

    #[test]
    fn unusable_environment_values_fall_back_to_defaults() {
        let opts = ComputeOptions::from_vars(vars(&[
            ("FORMULA_COMPUTE_PARALLEL", "maybe"),
            ("FORMULA_COMPUTE_ROWS_PER_TASK", "0"),
            ("FORMULA_COMPUTE_MIN_PARALLEL_ROWS", "-5"),
        ]));
        assert_eq!(opts, ComputeOptions::default());
        assert_eq!(ComputeOptions::from_vars(vars(&[])), ComputeOptions::default());
    }

    #[test]
    fn round_trips_through_json() {
        let opts = ComputeOptions::serial();
        let json = serde_json::to_string(&opts).unwrap();
        assert_eq!(
            serde_json::from_str::<ComputeOptions>(&json).unwrap(),
            opts
        );
    }
}
