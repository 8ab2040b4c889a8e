use super::Value;
use std::collections::BTreeMap;

/// A named set of values. Ordered so that example output is stable.
pub type Scope = BTreeMap<String, Value>;

static EMPTY_SCOPE: Scope = BTreeMap::new();

/// The scopes an expression is evaluated against.
///
/// Bare identifiers resolve `problem` → `computed` → `user_state`; `$name`
/// resolves `user_state` → `computed`. `input` is the value under validation
/// at a checkpoint, if any.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub problem: &'a Scope,
    pub computed: &'a Scope,
    pub user_state: &'a Scope,
    pub input: Option<&'a Value>,
}

impl Default for EvalContext<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> EvalContext<'a> {
    pub fn empty() -> Self {
        Self {
            problem: &EMPTY_SCOPE,
            computed: &EMPTY_SCOPE,
            user_state: &EMPTY_SCOPE,
            input: None,
        }
    }

    pub fn with_problem(problem: &'a Scope) -> Self {
        Self {
            problem,
            ..Self::empty()
        }
    }

    pub fn computed(mut self, computed: &'a Scope) -> Self {
        self.computed = computed;
        self
    }

    pub fn user_state(mut self, user_state: &'a Scope) -> Self {
        self.user_state = user_state;
        self
    }

    pub fn input(mut self, input: &'a Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        if name == "input" {
            if let Some(input) = self.input {
                return Some(input);
            }
        }
        self.problem
            .get(name)
            .or_else(|| self.computed.get(name))
            .or_else(|| self.user_state.get(name))
    }

    pub fn lookup_state(&self, name: &str) -> Option<&'a Value> {
        self.user_state
            .get(name)
            .or_else(|| self.computed.get(name))
    }
}
