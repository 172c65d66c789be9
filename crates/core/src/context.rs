//! The explicit context threaded through codec and prompt calls.

use crate::options::{AppOption, OptionSet, ENV_PREFIX};
use crate::warn::{WarningKind, Warnings};

/// Environment variable that, set to a non-zero integer, suppresses
/// advisory warnings.
pub const DISABLE_WARNINGS_VAR: &str = "RECFORM_DISABLE_WARNINGS";

/// Enabled options plus the advisory warning channel.
///
/// Single-threaded by construction: option scopes and recorded warnings use
/// interior mutability without locking.
#[derive(Debug, Default)]
pub struct Context {
    options: OptionSet,
    warnings: Warnings,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `RECFORM_*` variables from the process environment, once.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let vars: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(k, _)| k.to_ascii_uppercase().starts_with(ENV_PREFIX))
            .collect();
        let suppress = vars
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(DISABLE_WARNINGS_VAR))
            .and_then(|(_, v)| v.trim().parse::<i64>().ok())
            .is_some_and(|v| v != 0);

        let ctx = Context {
            options: OptionSet::from_vars(vars),
            warnings: Warnings::new(),
        };
        ctx.warnings.suppress(suppress);
        ctx
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn is_enabled(&self, opt: AppOption) -> bool {
        self.options.is_enabled(opt)
    }

    pub fn warn(&self, kind: WarningKind, message: impl Into<String>) {
        self.warnings.warn(kind, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn disable_warnings_variable() {
        let ctx = Context::from_vars(vars(&[("RECFORM_DISABLE_WARNINGS", "1")]));
        assert!(ctx.warnings().is_suppressed());
        ctx.warn(WarningKind::MissingKey, "dropped");
        assert!(ctx.warnings().is_empty());

        let ctx = Context::from_vars(vars(&[("RECFORM_DISABLE_WARNINGS", "0")]));
        assert!(!ctx.warnings().is_suppressed());
    }

    #[test]
    fn option_variables_enable_options() {
        let ctx = Context::from_vars(vars(&[("recform_convert_unknown_enum_to_none", "")]));
        assert!(ctx.is_enabled(AppOption::ConvertUnknownEnumToNone));
        assert!(!ctx.is_enabled(AppOption::LiveDatetime));
    }
}
