//! Fixture registry: named factories injected into tests on demand.
//!
//! The registry is assembled once with [`FixtureRegistryBuilder`], frozen by
//! [`FixtureRegistryBuilder::build`] and shared as `Arc<FixtureRegistry>`.
//! Each test resolves only the names it declares, against its own page
//! handle, so two tests never share a fixture value.
//!
//! ```ignore
//! let registry = FixtureRegistryBuilder::new()
//!     .page("calculator_page", BasicCalculatorPage::new)
//!     .build()?;
//! let fixtures = registry.resolve(&["calculator_page"], &ctx)?;
//! let calc = fixtures.get::<BasicCalculatorPage>("calculator_page")?;
//! ```

use crate::assertion::Expect;
use crate::page::PageHandle;
use crate::result::{VitrineError, VitrineResult};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// What a factory receives: the test's page handle and expectation facility
#[derive(Debug, Clone)]
pub struct FixtureContext {
    page: PageHandle,
    expect: Expect,
}

impl FixtureContext {
    /// Create a context for one test
    #[must_use]
    pub const fn new(page: PageHandle, expect: Expect) -> Self {
        Self { page, expect }
    }

    /// Page handle of the test
    #[must_use]
    pub const fn page(&self) -> &PageHandle {
        &self.page
    }

    /// Expectation facility of the test
    #[must_use]
    pub const fn expect(&self) -> &Expect {
        &self.expect
    }
}

type AnyFixture = Box<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&FixtureContext) -> VitrineResult<AnyFixture> + Send + Sync>;

struct FixtureEntry {
    factory: Factory,
    type_name: &'static str,
}

/// Registered fixture, as listed by the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureInfo {
    /// Registration name
    pub name: String,
    /// Rust type the factory produces
    pub type_name: &'static str,
}

/// Builder for a [`FixtureRegistry`]
#[derive(Default)]
pub struct FixtureRegistryBuilder {
    entries: BTreeMap<String, FixtureEntry>,
    duplicates: Vec<String>,
}

impl fmt::Debug for FixtureRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureRegistryBuilder")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FixtureRegistryBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fallible factory
    #[must_use]
    pub fn register<T, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&FixtureContext) -> VitrineResult<T> + Send + Sync + 'static,
    {
        let name = name.into();
        let entry = FixtureEntry {
            factory: Arc::new(move |ctx: &FixtureContext| {
                factory(ctx).map(|value| Box::new(value) as AnyFixture)
            }),
            type_name: std::any::type_name::<T>(),
        };
        if self.entries.insert(name.clone(), entry).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    /// Register a page object constructor `(PageHandle, Expect) -> T`
    #[must_use]
    pub fn page<T, F>(self, name: impl Into<String>, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(PageHandle, Expect) -> T + Send + Sync + 'static,
    {
        self.register(name, move |ctx: &FixtureContext| {
            Ok(constructor(ctx.page().clone(), ctx.expect().clone()))
        })
    }

    /// Freeze the registry
    pub fn build(self) -> VitrineResult<Arc<FixtureRegistry>> {
        if !self.duplicates.is_empty() {
            return Err(VitrineError::config(format!(
                "fixture names registered more than once: {}",
                self.duplicates.join(", ")
            )));
        }
        Ok(Arc::new(FixtureRegistry {
            entries: self.entries,
        }))
    }
}

/// Immutable map from fixture name to factory
pub struct FixtureRegistry {
    entries: BTreeMap<String, FixtureEntry>,
}

impl fmt::Debug for FixtureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureRegistry")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FixtureRegistry {
    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Whether a name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of fixtures
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names and produced types
    #[must_use]
    pub fn describe(&self) -> Vec<FixtureInfo> {
        self.entries
            .iter()
            .map(|(name, entry)| FixtureInfo {
                name: name.clone(),
                type_name: entry.type_name,
            })
            .collect()
    }

    /// Run the factories of the requested names, and only those.
    ///
    /// Unknown names and factory failures become [`VitrineError::Setup`].
    pub fn resolve<S: AsRef<str>>(
        &self,
        names: &[S],
        ctx: &FixtureContext,
    ) -> VitrineResult<Fixtures> {
        let mut values = HashMap::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if values.contains_key(name) {
                continue;
            }
            let entry = self.entries.get(name).ok_or_else(|| {
                VitrineError::setup(name, "no fixture registered under this name")
            })?;
            tracing::debug!(fixture = name, page = %ctx.page().id(), "resolving fixture");
            let value = (entry.factory)(ctx).map_err(|err| match err {
                setup @ VitrineError::Setup { .. } => setup,
                other => VitrineError::setup(name, other.to_string()),
            })?;
            values.insert(name.to_string(), value);
        }
        Ok(Fixtures { values })
    }
}

/// Fixture values resolved for one test
#[derive(Default)]
pub struct Fixtures {
    values: HashMap<String, AnyFixture>,
}

impl fmt::Debug for Fixtures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixtures")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Fixtures {
    /// Borrow a resolved fixture by name and type
    pub fn get<T: 'static>(&self, name: &str) -> VitrineResult<&T> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| VitrineError::setup(name, "fixture was not requested by this test"))?;
        value.downcast_ref::<T>().ok_or_else(|| {
            VitrineError::setup(
                name,
                format!("fixture is not a {}", std::any::type_name::<T>()),
            )
        })
    }

    /// Number of resolved fixtures
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct CounterPage {
        page_id: uuid::Uuid,
        serial: usize,
    }

    fn ctx() -> FixtureContext {
        FixtureContext::new(PageHandle::new(Arc::new(MockDriver::new())), Expect::new())
    }

    fn counting_registry(calls: Arc<AtomicUsize>) -> Arc<FixtureRegistry> {
        FixtureRegistryBuilder::new()
            .register("counter_page", move |ctx: &FixtureContext| {
                let serial = calls.fetch_add(1, Ordering::SeqCst);
                Ok(CounterPage {
                    page_id: ctx.page().id(),
                    serial,
                })
            })
            .register("broken_page", |_ctx: &FixtureContext| -> VitrineResult<CounterPage> {
                Err(VitrineError::driver("context crashed"))
            })
            .build()
            .unwrap()
    }

    mod registration_tests {
        use super::*;

        #[test]
        fn test_names_are_sorted() {
            let registry = counting_registry(Arc::default());
            assert_eq!(registry.names(), vec!["broken_page", "counter_page"]);
            assert!(registry.contains("counter_page"));
            assert_eq!(registry.len(), 2);
        }

        #[test]
        fn test_duplicate_names_rejected() {
            let err = FixtureRegistryBuilder::new()
                .page("calc", |_, _| 1_u8)
                .page("calc", |_, _| 2_u8)
                .build()
                .unwrap_err();
            assert!(matches!(err, VitrineError::Config { .. }));
        }

        #[test]
        fn test_describe_reports_type() {
            let registry = FixtureRegistryBuilder::new()
                .page("n", |_, _| 1_u32)
                .build()
                .unwrap();
            assert_eq!(registry.describe()[0].type_name, "u32");
        }
    }

    mod resolution_tests {
        use super::*;

        #[test]
        fn test_zero_requested_runs_no_factory() {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = counting_registry(Arc::clone(&calls));
            let fixtures = registry.resolve::<&str>(&[], &ctx()).unwrap();
            assert!(fixtures.is_empty());
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }

        #[test]
        fn test_only_requested_factories_run() {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = counting_registry(Arc::clone(&calls));
            let fixtures = registry.resolve(&["counter_page"], &ctx()).unwrap();
            assert_eq!(fixtures.len(), 1);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn test_repeated_name_resolves_once() {
            let calls = Arc::new(AtomicUsize::new(0));
            let registry = counting_registry(Arc::clone(&calls));
            registry
                .resolve(&["counter_page", "counter_page"], &ctx())
                .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn test_distinct_instances_per_test() {
            let registry = counting_registry(Arc::default());
            let (a, b) = (ctx(), ctx());
            let first = registry.resolve(&["counter_page"], &a).unwrap();
            let second = registry.resolve(&["counter_page"], &b).unwrap();
            let first = first.get::<CounterPage>("counter_page").unwrap();
            let second = second.get::<CounterPage>("counter_page").unwrap();
            assert_ne!(first.serial, second.serial);
            assert_ne!(first.page_id, second.page_id);
            assert_eq!(first.page_id, a.page().id());
        }

        #[test]
        fn test_unknown_name_is_setup_error() {
            let registry = counting_registry(Arc::default());
            let err = registry.resolve(&["missing_page"], &ctx()).unwrap_err();
            assert!(err.is_setup());
            assert!(err.to_string().contains("missing_page"));
        }

        #[test]
        fn test_factory_error_is_setup_error() {
            let registry = counting_registry(Arc::default());
            let err = registry.resolve(&["broken_page"], &ctx()).unwrap_err();
            match err {
                VitrineError::Setup { fixture, message } => {
                    assert_eq!(fixture, "broken_page");
                    assert!(message.contains("context crashed"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_get_wrong_type_or_unrequested() {
            let registry = counting_registry(Arc::default());
            let fixtures = registry.resolve(&["counter_page"], &ctx()).unwrap();
            assert!(fixtures.get::<String>("counter_page").unwrap_err().is_setup());
            assert!(fixtures.get::<CounterPage>("broken_page").unwrap_err().is_setup());
        }
    }
}
