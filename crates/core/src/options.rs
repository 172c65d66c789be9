//! Named boolean feature flags with scoped enablement.
//!
//! An option is enabled for as long as at least one scope that enabled it is
//! still open. Scopes are RAII guards ([`OptionScope`]); each one has its own
//! identity, so closing an inner scope never disables an option an outer
//! scope still holds. Environment variables named `RECFORM_<OPTION>` enable
//! an option through a scope that is never closed.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Prefix of environment variables that enable options.
pub const ENV_PREFIX: &str = "RECFORM_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AppOption {
    /// Prompt for timestamps with a single live-previewed field.
    LiveDatetime,
    /// Load unknown enum members as null instead of failing.
    ConvertUnknownEnumToNone,
}

impl AppOption {
    pub const ALL: [AppOption; 2] = [AppOption::LiveDatetime, AppOption::ConvertUnknownEnumToNone];

    pub fn name(self) -> &'static str {
        match self {
            AppOption::LiveDatetime => "LIVE_DATETIME",
            AppOption::ConvertUnknownEnumToNone => "CONVERT_UNKNOWN_ENUM_TO_NONE",
        }
    }

    /// Case-insensitive lookup. `DATETIME_LIVE` is accepted as an alias.
    pub fn from_name(name: &str) -> Option<AppOption> {
        match name.to_ascii_uppercase().as_str() {
            "LIVE_DATETIME" | "DATETIME_LIVE" => Some(AppOption::LiveDatetime),
            "CONVERT_UNKNOWN_ENUM_TO_NONE" => Some(AppOption::ConvertUnknownEnumToNone),
            _ => None,
        }
    }

    pub fn valid_names() -> String {
        AppOption::ALL
            .iter()
            .map(|o| o.name().to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for AppOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppOption::from_name(s).ok_or_else(|| Error::UnknownOption {
            name: s.to_string(),
            valid: AppOption::valid_names(),
        })
    }
}

impl fmt::Display for AppOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of enabled options, keyed by the scopes holding them.
#[derive(Debug, Default)]
pub struct OptionSet {
    enabled: RefCell<BTreeMap<AppOption, BTreeSet<u64>>>,
    next_scope: Cell<u64>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable, permanently, every option named by a `RECFORM_<OPTION>` key.
    /// Keys that do not name an option are ignored.
    pub fn from_vars<K: AsRef<str>, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self {
        let set = OptionSet::new();
        let permanent: Vec<AppOption> = vars
            .into_iter()
            .filter_map(|(key, _)| {
                let key = key.as_ref();
                let prefix = key.get(..ENV_PREFIX.len())?;
                if !prefix.eq_ignore_ascii_case(ENV_PREFIX) {
                    return None;
                }
                AppOption::from_name(&key[ENV_PREFIX.len()..])
            })
            .collect();
        if !permanent.is_empty() {
            tracing::debug!(options = ?permanent, "options enabled from environment");
            set.enable_permanently(&permanent);
        }
        set
    }

    pub fn is_enabled(&self, opt: AppOption) -> bool {
        self.enabled.borrow().contains_key(&opt)
    }

    /// Enable `opts` until the returned guard is dropped.
    pub fn enable(&self, opts: &[AppOption]) -> OptionScope<'_> {
        let id = self.open_scope(opts);
        OptionScope { set: self, id }
    }

    /// Like [`enable`](Self::enable), with options given by name. Nothing is
    /// enabled if any name is unknown.
    pub fn enable_named<S: AsRef<str>>(&self, names: &[S]) -> Result<OptionScope<'_>, Error> {
        let opts = names
            .iter()
            .map(|n| n.as_ref().parse::<AppOption>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.enable(&opts))
    }

    /// Enable `opts` through a scope that is never closed.
    pub fn enable_permanently(&self, opts: &[AppOption]) {
        self.open_scope(opts);
    }

    fn open_scope(&self, opts: &[AppOption]) -> u64 {
        let id = self.next_scope.get();
        self.next_scope.set(id + 1);
        let mut enabled = self.enabled.borrow_mut();
        for opt in opts {
            enabled.entry(*opt).or_default().insert(id);
        }
        id
    }

    fn close_scope(&self, id: u64) {
        let mut enabled = self.enabled.borrow_mut();
        enabled.retain(|_, scopes| {
            scopes.remove(&id);
            !scopes.is_empty()
        });
    }
}

/// Guard returned by [`OptionSet::enable`]; closes its scope on drop.
#[must_use = "options are disabled again as soon as the scope is dropped"]
#[derive(Debug)]
pub struct OptionScope<'a> {
    set: &'a OptionSet,
    id: u64,
}

impl Drop for OptionScope<'_> {
    fn drop(&mut self) {
        self.set.close_scope(self.id);
    }
}
