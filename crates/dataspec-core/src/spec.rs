//! The shared spec handle and the settings every spec carries.
//!
//! A [`Spec`] is an immutable, cheaply clonable descriptor. Builders such as
//! [`Type`](crate::Type) or [`DictSpec`](crate::DictSpec) produce one through
//! [`SpecBuilder::build`]; from then on it can be checked against any number
//! of values concurrently and embedded in other specs.
//!
//! Equality and hashing are structural. User callbacks (canonicalizers,
//! constraint predicates, default producers) compare by identity, so two
//! specs built from clones of the same callback are equal while two specs
//! built from separately written closures are not.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use crate::constraint::{self, Constraint};
use crate::dict::DictRule;
use crate::errors::{CanonicalizeError, CheckResult, InvalidValue, SchemaError};
use crate::specs::Rule;
use crate::value::{Kind, Value};

/// Predicate over a value.
pub type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;
/// Canonicalizer run after structural and constraint checks.
pub type CanonicalizeFn = dyn Fn(Value) -> Result<Value, CanonicalizeError> + Send + Sync;
/// Producer of a fresh default value.
pub type ProducerFn = dyn Fn() -> Value + Send + Sync;

/// A user callback compared and hashed by identity.
pub struct Callback<F: ?Sized>(Arc<F>);

impl<F: ?Sized> Callback<F> {
    pub fn get(&self) -> &F {
        &self.0
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl Callback<PredicateFn> {
    pub(crate) fn predicate(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        let f: Arc<PredicateFn> = Arc::new(f);
        Callback(f)
    }
}

impl Callback<CanonicalizeFn> {
    pub(crate) fn canonicalizer(
        f: impl Fn(Value) -> Result<Value, CanonicalizeError> + Send + Sync + 'static,
    ) -> Self {
        let f: Arc<CanonicalizeFn> = Arc::new(f);
        Callback(f)
    }
}

impl Callback<ProducerFn> {
    pub(crate) fn producer(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        let f: Arc<ProducerFn> = Arc::new(f);
        Callback(f)
    }
}

impl<F: ?Sized> From<Arc<F>> for Callback<F> {
    fn from(f: Arc<F>) -> Self {
        Callback(f)
    }
}

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Callback(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> PartialEq for Callback<F> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<F: ?Sized> Eq for Callback<F> {}

impl<F: ?Sized> Hash for Callback<F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:#x})", self.addr())
    }
}

/// Default value of an optional spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DefaultValue {
    Value(Value),
    /// Called every time a default is needed.
    Producer(Callback<ProducerFn>),
}

impl DefaultValue {
    pub fn producer(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        DefaultValue::Producer(Callback::producer(f))
    }

    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Producer(f) => (f.get())(),
        }
    }
}

/// Decides whether an input counts as "not provided".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Unset {
    /// Falsy, but numbers and booleans always count as provided.
    Empty,
    /// Any falsy value.
    Falsy,
    Custom(Callback<PredicateFn>),
}

impl Unset {
    pub fn custom(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Unset::Custom(Callback::predicate(f))
    }

    pub fn is_unset(&self, value: &Value) -> bool {
        match self {
            Unset::Empty => {
                !value.is_truthy() && !Kind::Number.matches(value) && !Kind::Bool.matches(value)
            }
            Unset::Falsy => !value.is_truthy(),
            Unset::Custom(f) => (f.get())(value),
        }
    }
}

/// Optional overrides for the common settings of a spec.
///
/// Anything left `None` falls back to the default of the spec kind.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub optional: Option<bool>,
    pub default: Option<DefaultValue>,
    pub unset: Option<Unset>,
    pub constraints: Vec<Constraint>,
}

impl Options {
    pub(crate) fn resolve(self, default: DefaultValue, unset: Unset) -> Common {
        Common {
            optional: self.optional.unwrap_or(false),
            default: self.default.unwrap_or(default),
            unset: self.unset.unwrap_or(unset),
            constraints: self.constraints,
        }
    }
}

impl From<&Common> for Options {
    fn from(common: &Common) -> Self {
        Self {
            optional: Some(common.optional),
            default: Some(common.default.clone()),
            unset: Some(common.unset.clone()),
            constraints: common.constraints.clone(),
        }
    }
}

/// Settings shared by every spec kind, after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Common {
    pub(crate) optional: bool,
    pub(crate) default: DefaultValue,
    pub(crate) unset: Unset,
    pub(crate) constraints: Vec<Constraint>,
}

/// Fluent setters for the common settings, shared by every builder.
pub trait SpecBuilder: Sized {
    #[doc(hidden)]
    fn options_mut(&mut self) -> &mut Options;

    /// Validate the builder and produce the spec.
    fn build(self) -> Result<Spec, SchemaError>;

    fn optional(mut self, optional: bool) -> Self {
        self.options_mut().optional = Some(optional);
        self
    }

    fn default(mut self, value: impl Into<Value>) -> Self {
        self.options_mut().default = Some(DefaultValue::Value(value.into()));
        self
    }

    fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.options_mut().default = Some(DefaultValue::producer(producer));
        self
    }

    fn unset(mut self, unset: Unset) -> Self {
        self.options_mut().unset = Some(unset);
        self
    }

    fn constraint<F>(mut self, test: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.options_mut()
            .constraints
            .push(Constraint::new(test, message));
        self
    }

    fn constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.options_mut().constraints.extend(constraints);
        self
    }
}

struct SpecInner {
    common: Common,
    rule: Rule,
    hash: OnceLock<u64>,
}

/// An immutable, shareable value descriptor.
#[derive(Clone)]
pub struct Spec {
    inner: Arc<SpecInner>,
}

impl Spec {
    /// Final step of every builder: normalize, then validate the default.
    pub(crate) fn assemble(rule: Rule, common: Common) -> Result<Spec, SchemaError> {
        let (rule, common) = rule.normalize(common);
        let spec = Spec {
            inner: Arc::new(SpecInner {
                common,
                rule,
                hash: OnceLock::new(),
            }),
        };
        if spec.is_optional() {
            trace!(spec = %spec.type_name(), "validating default");
            spec.check_present(&spec.default_value())?;
        }
        Ok(spec)
    }

    /// Check `value` and return its canonical form.
    ///
    /// Unset input on an optional spec is replaced by the default first.
    /// Then the structural check, the constraints and the canonicalizer run
    /// in that order.
    pub fn check_value(&self, value: &Value) -> CheckResult {
        let common = &self.inner.common;
        if common.optional && common.unset.is_unset(value) {
            let default = self.default_value();
            debug!(spec = %self.type_name(), default = %default, "substituting default");
            return self.check_present(&default);
        }
        self.check_present(value)
    }

    fn check_present(&self, value: &Value) -> CheckResult {
        let checked = self.inner.rule.check(value)?;
        self.check_constraints(&checked)?;
        self.inner.rule.canonicalize(checked)
    }

    /// Evaluate the constraints alone.
    ///
    /// Skipped for unset input on an optional spec.
    pub fn check_constraints(&self, value: &Value) -> Result<(), InvalidValue> {
        let common = &self.inner.common;
        if common.optional && common.unset.is_unset(value) {
            return Ok(());
        }
        constraint::check_all(&common.constraints, value)
    }

    /// Human-readable description of the accepted values.
    pub fn type_name(&self) -> String {
        self.inner.rule.type_name()
    }

    /// Whether an unset value is replaced by the default.
    pub fn is_optional(&self) -> bool {
        self.inner.common.optional
    }

    /// A fresh default value.
    pub fn default_value(&self) -> Value {
        self.inner.common.default.produce()
    }

    /// How an input is judged to be unset.
    pub fn unset_policy(&self) -> &Unset {
        &self.inner.common.unset
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.inner.common.constraints
    }

    /// Derive a spec with some common settings overridden.
    ///
    /// The original is untouched. The derived spec is normalized and its
    /// default validated like a freshly built one.
    pub fn copy(&self, configure: impl FnOnce(&mut Options)) -> Result<Spec, SchemaError> {
        let mut options = Options::from(&self.inner.common);
        configure(&mut options);
        let common = &self.inner.common;
        Spec::assemble(
            self.inner.rule.clone(),
            options.resolve(common.default.clone(), common.unset.clone()),
        )
    }

    /// Derive a spec with extra constraints appended.
    pub fn add_constraints(
        &self,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<Spec, SchemaError> {
        self.copy(|options| options.constraints.extend(constraints))
    }

    pub(crate) fn as_dict(&self) -> Option<&DictRule> {
        match &self.inner.rule {
            Rule::Dict(rule) => Some(rule),
            _ => None,
        }
    }
}

impl PartialEq for Spec {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.common == other.inner.common && self.inner.rule == other.inner.rule)
    }
}

impl Eq for Spec {}

impl Hash for Spec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let cached = *self.inner.hash.get_or_init(|| {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            self.inner.common.hash(&mut hasher);
            self.inner.rule.hash(&mut hasher);
            hasher.finish()
        });
        state.write_u64(cached);
    }
}

impl fmt::Debug for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spec")
            .field("type_name", &self.type_name())
            .field("optional", &self.inner.common.optional)
            .field("default", &self.inner.common.default)
            .field("constraints", &self.inner.common.constraints.len())
            .finish()
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}
