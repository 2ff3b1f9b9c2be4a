//! Rox: scanner, parser, resolver and tree‑walking interpreter for a small
//! class‑based scripting language.

pub mod ast;
pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use log::info;

use crate::error::RunError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;

/// Runs `source` through every stage on `interpreter`.
///
/// Lexical, parse and resolution errors are gathered together and stop the
/// program before anything executes.  A runtime error stops it mid‑way;
/// output printed before that point remains.
pub fn run(source: &str, interpreter: &mut Interpreter<'_>) -> Result<(), RunError> {
    let (tokens, mut errors) = scanner::scan_tokens(source);

    let (statements, parse_errors) = Parser::new(&tokens).parse();
    errors.extend(parse_errors);

    if !errors.is_empty() {
        info!("Stopping after parse with {} error(s)", errors.len());
        return Err(RunError::Static(errors));
    }

    let (locals, resolve_errors) = Resolver::new().resolve(&statements);

    if !resolve_errors.is_empty() {
        info!("Stopping after resolve with {} error(s)", resolve_errors.len());
        return Err(RunError::Static(resolve_errors));
    }

    interpreter
        .interpret(&statements, locals)
        .map_err(RunError::Runtime)
}
