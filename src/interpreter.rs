//! Tree‑walking evaluator.
//!
//! Every `execute`/`evaluate` step receives the active scope explicitly, so a
//! block or call simply passes its own child scope down and the caller's scope
//! is back in effect as soon as the step returns, on every exit path.
//! Statement execution yields a [`Flow`]; a `return` travels up as
//! `Flow::Return` until a call boundary turns it into the call's result.
//! Runtime errors travel as `Err(LoxError::Runtime { .. })`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::callable::{Function, NativeFunction};
use crate::class::Class;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Control‑flow outcome of executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<'w> {
    globals: EnvRef,
    /// Distances from every run so far.  Entries are never evicted, so a
    /// long REPL session grows this map by one entry per resolved local.
    locals: Locals,
    out: &'w mut dyn Write,
}

fn clock(_args: &[Value]) -> std::result::Result<Value, String> {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}

impl<'w> Interpreter<'w> {
    /// Creates an interpreter printing to `out`, with natives such as `clock`
    /// defined in the global scope.
    pub fn new(out: &'w mut dyn Write) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Native(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            })),
        );

        Self {
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Runs a resolved program.  Output written before a runtime error stays
    /// written.  `locals` is merged into what earlier runs recorded, so
    /// functions defined by previous inputs keep working.
    pub fn interpret(&mut self, statements: &[Stmt], locals: Locals) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        self.locals.extend(locals);

        let globals: EnvRef = Rc::clone(&self.globals);

        for stmt in statements {
            // A top-level `return` is rejected by the resolver.
            self.execute(stmt, &globals)?;
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Evaluates a bare expression in the global scope.
    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value> {
        let globals: EnvRef = Rc::clone(&self.globals);

        self.evaluate(expr, &globals)
    }

    /// Executes `statements` in `scope`, stopping at the first `return`.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt], scope: EnvRef) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt, &scope)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn execute(&mut self, stmt: &Stmt, env: &EnvRef) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr, env)?;
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr, env)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                env.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                return self.execute_block(statements, Environment::child_of(env));
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition, env)?.is_truthy() {
                    return self.execute(then_branch, env);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch, env);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition, env)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body, env)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = Function::new(Rc::clone(declaration), Rc::clone(env), false);
                env.borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr, env)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.declare_class(name, superclass.as_ref(), methods, env)?,
        }

        Ok(Flow::Normal)
    }

    fn declare_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        env: &EnvRef,
    ) -> Result<()> {
        debug!("Declaring class '{}'", name.lexeme);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr, env)? {
                Value::Class(class) => Some(class),
                _ => {
                    let at: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };
                    return Err(LoxError::runtime(at, "Superclass must be a class."));
                }
            },
            None => None,
        };

        env.borrow_mut().define(&name.lexeme, Value::Nil);

        // Methods close over a scope holding `super` when there is one.
        let method_scope: EnvRef = match &superclass {
            Some(class) => {
                let scope: EnvRef = Environment::child_of(env);
                scope
                    .borrow_mut()
                    .define("super", Value::Class(Rc::clone(class)));
                scope
            }
            None => Rc::clone(env),
        };

        let table: HashMap<String, Rc<Function>> = methods
            .iter()
            .map(|method| {
                let is_initializer: bool = method.name.lexeme == "init";
                let function = Function::new(Rc::clone(method), Rc::clone(&method_scope), is_initializer);
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = Class::new(name.lexeme.clone(), superclass, table);

        env.borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr, env: &EnvRef) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner, env),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right, env)?;
                evaluate_unary(operator, right)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left, env)?;
                let right: Value = self.evaluate(right, env)?;
                evaluate_binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left, env)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right, env)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name, env),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value, env)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        if !Environment::assign_at(env, distance, &name.lexeme, value.clone()) {
                            return Err(undefined_variable(name));
                        }
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee, env)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument, env)?);
                }

                let callable = callee.as_callable().ok_or_else(|| {
                    LoxError::runtime(paren, "Can only call functions and classes.")
                })?;

                if values.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            values.len()
                        ),
                    ));
                }

                callable.call(self, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object, env)? {
                Value::Instance(instance) => instance.get(name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object, env)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value, env)?;
                instance.set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword, env),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method, env),
        }
    }

    /// `super.method`: look up from the superclass captured where the running
    /// method was declared, bind to the `this` one scope closer.
    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token,
        method: &Token,
        env: &EnvRef,
    ) -> Result<Value> {
        let distance: usize = *self
            .locals
            .get(&id)
            .ok_or_else(|| LoxError::runtime(keyword, "Can't use 'super' outside of a class."))?;

        let Some(Value::Class(superclass)) = Environment::get_at(env, distance, "super") else {
            return Err(undefined_variable(keyword));
        };

        let this_distance: usize = distance.saturating_sub(1);
        let Some(Value::Instance(instance)) = Environment::get_at(env, this_distance, "this")
        else {
            return Err(LoxError::runtime(keyword, "Can't use 'this' outside of a class."));
        };

        let found: Rc<Function> = superclass.find_method(&method.lexeme).ok_or_else(|| {
            LoxError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )
        })?;

        Ok(Value::Function(Rc::new(found.bind(instance))))
    }

    fn look_up_variable(&self, id: ExprId, name: &Token, env: &EnvRef) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(env, distance, &name.lexeme)
                .ok_or_else(|| undefined_variable(name)),
            None => self.globals.borrow().get(name),
        }
    }
}

fn undefined_variable(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

fn number_operand(operator: &Token, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
    }
}

fn evaluate_unary(operator: &Token, right: Value) -> Result<Value> {
    match operator.token_type {
        TokenType::MINUS => Ok(Value::Number(-number_operand(operator, &right)?)),
        TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
        _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
    }
}

fn evaluate_binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    debug!("Binary {} on {} and {}", operator.lexeme, left, right);

    match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            _ => Err(LoxError::runtime(
                operator,
                "Operands must be two numbers or two strings.",
            )),
        },

        TokenType::MINUS => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a - b))
        }

        TokenType::STAR => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a * b))
        }

        // IEEE semantics: dividing by zero yields an infinity or NaN.
        TokenType::SLASH => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Number(a / b))
        }

        TokenType::GREATER => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a > b))
        }

        TokenType::GREATER_EQUAL => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a >= b))
        }

        TokenType::LESS => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a < b))
        }

        TokenType::LESS_EQUAL => {
            let (a, b) = number_operands(operator, &left, &right)?;
            Ok(Value::Bool(a <= b))
        }

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

        _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
    }
}
