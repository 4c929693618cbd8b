use std::collections::HashMap;
use std::f64::consts::{E, PI};

/// Result of a builtin; the error is a human readable domain description.
pub type FnResult = Result<f64, String>;

#[derive(Debug, Clone, Copy)]
pub enum Callable {
    Unary(fn(f64) -> FnResult),
    Binary(fn(f64, f64) -> FnResult),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Unary(_) => 1,
            Callable::Binary(_) => 2,
        }
    }

    /// Applies the function. `args` must have exactly [`Callable::arity`] elements.
    pub fn call(&self, args: &[f64]) -> FnResult {
        match (self, args) {
            (Callable::Unary(f), [x]) => f(*x),
            (Callable::Binary(f), [x, y]) => f(*x, *y),
            _ => Err(format!("expected {} argument(s)", self.arity())),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Binding {
    Constant(f64),
    /// One callable per supported arity.
    Function(Vec<Callable>),
}

/// Names visible to an expression. Never changes while an expression is
/// being evaluated; the builder methods return a new table.
#[derive(Debug, Clone)]
pub struct Environment {
    bindings: HashMap<String, Binding>,
}

impl Environment {
    pub fn empty() -> Self {
        Environment {
            bindings: HashMap::new(),
        }
    }

    /// Binds a constant, replacing any previous binding of `name`.
    pub fn with_constant(mut self, name: &str, value: f64) -> Self {
        self.bindings.insert(name.to_lowercase(), Binding::Constant(value));
        self
    }

    /// Adds an overload. An existing overload of the same arity, or a
    /// constant of the same name, is replaced.
    pub fn with_function(mut self, name: &str, callable: Callable) -> Self {
        let binding = self
            .bindings
            .entry(name.to_lowercase())
            .or_insert_with(|| Binding::Function(Vec::new()));

        match binding {
            Binding::Function(overloads) => {
                overloads.retain(|c| c.arity() != callable.arity());
                overloads.push(callable);
                overloads.sort_by_key(|c| c.arity());
            }
            Binding::Constant(_) => *binding = Binding::Function(vec![callable]),
        }
        self
    }

    pub fn with_unary(self, name: &str, f: fn(f64) -> FnResult) -> Self {
        self.with_function(name, Callable::Unary(f))
    }

    pub fn with_binary(self, name: &str, f: fn(f64, f64) -> FnResult) -> Self {
        self.with_function(name, Callable::Binary(f))
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::empty()
            .with_constant("pi", PI)
            .with_constant("e", E)
            .with_unary("sqrt", sqrt)
            .with_unary("sin", |x| Ok(x.to_radians().sin()))
            .with_unary("cos", |x| Ok(x.to_radians().cos()))
            .with_unary("tan", |x| Ok(x.to_radians().tan()))
            .with_unary("asin", asin)
            .with_unary("acos", acos)
            .with_unary("atan", |x| Ok(x.atan().to_degrees()))
            .with_unary("log", log10)
            .with_binary("log", log_base)
            .with_unary("ln", ln)
            .with_unary("exp", |x| Ok(x.exp()))
            .with_unary("abs", |x| Ok(x.abs()))
            .with_unary("floor", |x| Ok(x.floor()))
            .with_unary("ceil", |x| Ok(x.ceil()))
            .with_unary("round", |x| Ok(x.round()))
            .with_unary("factorial", factorial)
            .with_unary("fact", factorial)
    }
}

fn sqrt(x: f64) -> FnResult {
    if x < 0.0 {
        return Err("non-negative numbers".to_string());
    }
    Ok(x.sqrt())
}

fn asin(x: f64) -> FnResult {
    if !(-1.0..=1.0).contains(&x) {
        return Err("[-1, 1]".to_string());
    }
    Ok(x.asin().to_degrees())
}

fn acos(x: f64) -> FnResult {
    if !(-1.0..=1.0).contains(&x) {
        return Err("[-1, 1]".to_string());
    }
    Ok(x.acos().to_degrees())
}

fn log10(x: f64) -> FnResult {
    if x <= 0.0 {
        return Err("positive numbers".to_string());
    }
    Ok(x.log10())
}

fn log_base(x: f64, base: f64) -> FnResult {
    if x <= 0.0 {
        return Err("positive numbers".to_string());
    }
    if base <= 0.0 || base == 1.0 {
        return Err("base must be positive and not 1".to_string());
    }
    Ok(x.ln() / base.ln())
}

fn ln(x: f64) -> FnResult {
    if x <= 0.0 {
        return Err("positive numbers".to_string());
    }
    Ok(x.ln())
}

fn factorial(n: f64) -> FnResult {
    if n < 0.0 {
        return Err("not defined for negative numbers".to_string());
    }
    if n.fract() != 0.0 {
        return Err("requires an integer argument".to_string());
    }

    let mut result: f64 = 1.0;
    let mut i: f64 = 2.0;
    while i <= n && result.is_finite() {
        result *= i;
        i += 1.0;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(env: &Environment, name: &str, args: &[f64]) -> FnResult {
        match env.get(name) {
            Some(Binding::Function(overloads)) => overloads
                .iter()
                .find(|c| c.arity() == args.len())
                .map(|c| c.call(args))
                .unwrap_or_else(|| Err("no overload".to_string())),
            other => panic!("{} is not a function: {:?}", name, other),
        }
    }

    fn approx(actual: FnResult, expected: f64) {
        let actual = actual.unwrap();
        assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
    }

    #[test]
    fn trig_takes_degrees() {
        let env = Environment::default();
        approx(call(&env, "sin", &[30.0]), 0.5);
        approx(call(&env, "sin", &[90.0]), 1.0);
        approx(call(&env, "cos", &[60.0]), 0.5);
        approx(call(&env, "tan", &[45.0]), 1.0);
        approx(call(&env, "asin", &[1.0]), 90.0);
        approx(call(&env, "atan", &[1.0]), 45.0);
    }

    #[test]
    fn logarithms() {
        let env = Environment::default();
        approx(call(&env, "log", &[100.0]), 2.0);
        approx(call(&env, "log", &[8.0, 2.0]), 3.0);
        approx(call(&env, "log", &[1.0, 10.0]), 0.0);
        approx(call(&env, "ln", &[E * E]), 2.0);
        assert!(call(&env, "log", &[-5.0, 10.0]).is_err());
        assert!(call(&env, "log", &[10.0, 0.0]).is_err());
        assert!(call(&env, "log", &[10.0, 1.0]).is_err());
        assert!(call(&env, "ln", &[0.0]).is_err());
    }

    #[test]
    fn factorial_domain() {
        let env = Environment::default();
        approx(call(&env, "factorial", &[0.0]), 1.0);
        approx(call(&env, "fact", &[5.0]), 120.0);
        approx(call(&env, "factorial", &[10.0]), 3628800.0);
        assert!(call(&env, "factorial", &[-5.0]).is_err());
        assert!(call(&env, "factorial", &[5.5]).is_err());
        assert_eq!(call(&env, "factorial", &[171.0]), Ok(f64::INFINITY));
        // stops multiplying once the product overflows
        assert_eq!(call(&env, "fact", &[1e12]), Ok(f64::INFINITY));
    }

    #[test]
    fn log_keeps_both_overloads_sorted() {
        let env = Environment::default();
        match env.get("log") {
            Some(Binding::Function(overloads)) => {
                let arities: Vec<usize> = overloads.iter().map(Callable::arity).collect();
                assert_eq!(arities, vec![1, 2]);
            }
            other => panic!("unexpected binding {:?}", other),
        }
    }

    #[test]
    fn builders_replace_bindings() {
        let env = Environment::empty()
            .with_constant("X", 1.0)
            .with_unary("x", |v| Ok(v * 2.0))
            .with_unary("x", |v| Ok(v * 3.0));
        assert!(env.contains("X"));
        approx(call(&env, "x", &[2.0]), 6.0);

        let env = env.with_constant("x", 5.0);
        assert!(matches!(env.get("x"), Some(Binding::Constant(v)) if *v == 5.0));
    }
}
