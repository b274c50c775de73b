//! Callable formula functions

pub mod logical;
pub mod math;
pub mod text;

use crate::error::{FormulaError, FormulaResult};
use crate::types::{FunctionCatalog, FunctionSignature};
use ahash::AHashMap;
use fieldrules_core::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Function implementation signature
///
/// Hosts may register closures; they receive the already evaluated
/// arguments in call order.
pub type FunctionImpl = Arc<dyn Fn(&[Value]) -> FormulaResult<Value> + Send + Sync>;

/// Plain function pointer used by the built-in functions
pub type NativeFn = fn(&[Value]) -> FormulaResult<Value>;

/// Standard registry (lazily initialized, immutable)
static STANDARD_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Get the process-wide standard registry
pub fn standard_registry() -> &'static FunctionRegistry {
    STANDARD_REGISTRY.get_or_init(FunctionRegistry::standard)
}

/// Function registry
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionImpl>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the thirteen standard functions
    pub fn standard() -> Self {
        let mut registry = Self::new();

        let builtins: [(&str, NativeFn); 13] = [
            // Math
            ("abs", math::fn_abs),
            ("min", math::fn_min),
            ("max", math::fn_max),
            ("round", math::fn_round),
            ("sum", math::fn_sum),
            ("pow", math::fn_pow),
            // Text
            ("upper", text::fn_upper),
            ("lower", text::fn_lower),
            ("strip", text::fn_strip),
            ("concat", text::fn_concat),
            // Logical
            ("if_else", logical::fn_if_else),
            ("is_empty", logical::fn_is_empty),
            ("coalesce", logical::fn_coalesce),
        ];

        for (name, implementation) in builtins {
            match FunctionCatalog::STANDARD.get(name) {
                Some(sig) => registry.register_native(*sig, implementation),
                None => registry.register(name, implementation),
            }
        }

        registry
    }

    /// Look up a function by its exact name
    pub fn get(&self, name: &str) -> Option<&FunctionImpl> {
        self.functions.get(name)
    }

    /// Check if a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Register a function, replacing any previous one with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, implementation: F)
    where
        F: Fn(&[Value]) -> FormulaResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(implementation));
    }

    /// Register a built-in function whose arity is checked before the call
    pub fn register_native(&mut self, sig: FunctionSignature, implementation: NativeFn) {
        self.register(sig.name, move |args: &[Value]| {
            if !sig.accepts(args.len()) {
                return Err(FormulaError::argument(format!(
                    "expects {}, got {}",
                    sig.arity_description(),
                    args.len()
                )));
            }
            implementation(args)
        });
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

// === Argument helpers shared by the built-ins ===

/// Numbers to aggregate: either the arguments themselves or the items of a
/// single list argument
fn spread(args: &[Value]) -> &[Value] {
    match args {
        [Value::List(items)] => items,
        _ => args,
    }
}

fn expect_text<'v>(func: &str, value: &'v Value) -> FormulaResult<&'v str> {
    value.as_str().ok_or_else(|| {
        FormulaError::argument(format!(
            "{}() requires text, got {}",
            func,
            value.type_name()
        ))
    })
}

fn number_required(func: &str, value: &Value) -> FormulaError {
    FormulaError::argument(format!(
        "{}() requires a number, got {}",
        func,
        value.type_name()
    ))
}

fn expect_number(func: &str, value: &Value) -> FormulaResult<()> {
    if value.is_number() {
        Ok(())
    } else {
        Err(number_required(func, value))
    }
}

/// Positional argument; arity is normally checked at registration
fn nth<'v>(func: &str, args: &'v [Value], index: usize) -> FormulaResult<&'v Value> {
    args.get(index).ok_or_else(|| {
        FormulaError::argument(format!("{}() missing argument {}", func, index + 1))
    })
}
