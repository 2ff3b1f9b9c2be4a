use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope record.  Closures keep their defining scope alive
/// through this handle after the creating block or call has finished.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: its own bindings plus a link to the enclosing scope.
///
/// The enclosing link is fixed at construction and never reassigned.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// The root (global) scope.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Convenience for `Rc::new(RefCell::new(Environment::with_enclosing(..)))`.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Binds `name` in this scope, overwriting any binding of the same name.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Walks exactly `distance` enclosing links.  `None` only if the chain is
    /// shorter than the resolver promised.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef = Rc::clone(current.borrow().enclosing.as_ref()?);
            current = next;
        }

        Some(current)
    }

    /// Reads `name` from the scope `distance` hops out, without any search.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
        debug!("get_at distance={} name={}", distance, name);

        let scope: EnvRef = Self::ancestor(env, distance)?;
        let value: Option<Value> = scope.borrow().values.get(name).cloned();

        value
    }

    /// Writes `name` into the scope `distance` hops out.  Returns `false` if
    /// that scope does not exist.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
        debug!("assign_at distance={} name={}", distance, name);

        match Self::ancestor(env, distance) {
            Some(scope) => {
                scope.borrow_mut().define(name, value);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod environment_tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn get_delegates_to_enclosing_scope() {
        let global: EnvRef = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));

        let inner: EnvRef = Environment::child_of(&global);

        assert_eq!(inner.borrow().get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_updates_the_declaring_scope() {
        let global: EnvRef = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Nil);
        let inner: EnvRef = Environment::child_of(&global);

        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Bool(true))
            .unwrap();

        assert_eq!(global.borrow().get(&ident("a")).unwrap(), Value::Bool(true));
        assert!(inner.borrow().values.is_empty());
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let global: EnvRef = Rc::new(RefCell::new(Environment::new()));

        let err = global.borrow().get(&ident("missing")).unwrap_err();
        assert_eq!(err.message(), "Undefined variable 'missing'.");

        let err = global
            .borrow_mut()
            .assign(&ident("missing"), Value::Nil)
            .unwrap_err();
        assert_eq!(err.message(), "Undefined variable 'missing'.");
    }

    #[test]
    fn get_at_does_not_search_by_name() {
        let global: EnvRef = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("x", Value::Number(1.0));
        let middle: EnvRef = Environment::child_of(&global);
        middle.borrow_mut().define("x", Value::Number(2.0));
        let inner: EnvRef = Environment::child_of(&middle);

        assert_eq!(Environment::get_at(&inner, 1, "x"), Some(Value::Number(2.0)));
        assert_eq!(Environment::get_at(&inner, 2, "x"), Some(Value::Number(1.0)));
        assert_eq!(Environment::get_at(&inner, 0, "x"), None);
        assert_eq!(Environment::get_at(&inner, 3, "x"), None);

        assert!(Environment::assign_at(&inner, 2, "x", Value::Nil));
        assert_eq!(Environment::get_at(&inner, 2, "x"), Some(Value::Nil));
        assert_eq!(Environment::get_at(&inner, 1, "x"), Some(Value::Number(2.0)));
    }
}
