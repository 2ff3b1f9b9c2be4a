//! Callables: native functions and user functions (closures and methods).

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::Instance;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear in callee position of a call expression.
pub trait Callable {
    /// Exact number of arguments required.
    fn arity(&self) -> usize;

    /// Invoke with already-evaluated arguments.  `paren` is the call's closing
    /// parenthesis, used to attribute errors.
    fn call(&self, interpreter: &mut Interpreter<'_>, paren: &Token, arguments: Vec<Value>)
        -> Result<Value>;
}

/// A function implemented by the host.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter<'_>,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|msg| LoxError::runtime(paren, msg))
    }
}

/// A user function: its declaration plus the scope it closes over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Function {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A copy of this method whose closure is a fresh scope binding `this`
    /// to `instance`.  Every call creates a new scope, never shared.
    pub fn bind(&self, instance: Rc<Instance>) -> Function {
        let scope: EnvRef = Environment::child_of(&self.closure);
        scope
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: scope,
            is_initializer: self.is_initializer,
        }
    }

    fn bound_this(&self, paren: &Token) -> Result<Value> {
        Environment::get_at(&self.closure, 0, "this")
            .ok_or_else(|| LoxError::runtime(paren, "Initializer is not bound to an instance."))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter<'_>,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        // The call scope hangs off the closure, not off the caller's scope.
        let scope: EnvRef = Environment::child_of(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            scope.borrow_mut().define(&param.lexeme, argument);
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, scope)?;

        if self.is_initializer {
            return self.bound_this(paren);
        }

        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        })
    }
}
