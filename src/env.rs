use std::str::FromStr;

/// Default number of instructions `continue` runs before giving up.
pub const DEFAULT_STEP_LIMIT: u64 = 100_000;
/// Default number of source lines shown on each side of the current line.
pub const DEFAULT_CONTEXT_LINES: usize = 8;

/// Settings read once from the process environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Env {
    pub step_limit: u64,
    pub context_lines: usize,
}

impl Default for Env {
    fn default() -> Self {
        Env {
            step_limit: DEFAULT_STEP_LIMIT,
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

impl Env {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset or malformed values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        Env {
            step_limit: var_or("BDBG_STEP_LIMIT", &lookup, default.step_limit),
            context_lines: var_or("BDBG_CONTEXT_LINES", &lookup, default.context_lines),
        }
    }
}

fn var_or<T, F>(name: &str, lookup: &F, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        assert_eq!(Env::from_lookup(|_| None), Env::default());
    }

    #[test]
    fn reads_overrides() {
        let env = Env::from_lookup(|name| match name {
            "BDBG_STEP_LIMIT" => Some("25".into()),
            "BDBG_CONTEXT_LINES" => Some(" 3 ".into()),
            _ => None,
        });
        assert_eq!(env.step_limit, 25);
        assert_eq!(env.context_lines, 3);
    }

    #[test]
    fn ignores_garbage() {
        let env = Env::from_lookup(|_| Some("lots".into()));
        assert_eq!(env, Env::default());
    }
}
