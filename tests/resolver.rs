#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, ExprId, Stmt};
    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::resolver::{Locals, Resolver};
    use rox::scanner::scan_tokens;

    fn resolve(source: &str) -> (Vec<Stmt>, Locals, Vec<LoxError>) {
        let (tokens, lex_errors) = scan_tokens(source);
        assert!(lex_errors.is_empty());

        let (statements, parse_errors) = Parser::new(&tokens).parse();
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);

        let (locals, errors) = Resolver::new().resolve(&statements);
        (statements, locals, errors)
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(LoxError::message).collect()
    }

    /// Ids of every `Variable` expression named `name` inside print statements,
    /// in source order.
    fn printed_variable_ids(statements: &[Stmt], name: &str, out: &mut Vec<ExprId>) {
        for stmt in statements {
            match stmt {
                Stmt::Print(Expr::Variable { id, name: token }) if token.lexeme == name => {
                    out.push(*id)
                }
                Stmt::Block(inner) => printed_variable_ids(inner, name, out),
                Stmt::Function(declaration) => printed_variable_ids(&declaration.body, name, out),
                _ => {}
            }
        }
    }

    #[test]
    fn test_distance_counts_enclosing_blocks() {
        let (statements, locals, errors) = resolve(
            "{ var a = 1; print a; { print a; { { print a; } } } }",
        );
        assert!(errors.is_empty());

        let mut ids = Vec::new();
        printed_variable_ids(&statements, "a", &mut ids);

        let distances: Vec<Option<usize>> = ids.iter().map(|id| locals.get(id).copied()).collect();
        assert_eq!(distances, vec![Some(0), Some(1), Some(3)]);
    }

    #[test]
    fn test_globals_are_left_out_of_the_map() {
        let (statements, locals, errors) = resolve("var g = 1; print g; { print g; }");
        assert!(errors.is_empty());

        let mut ids = Vec::new();
        printed_variable_ids(&statements, "g", &mut ids);

        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| !locals.contains_key(id)));
    }

    #[test]
    fn test_shadowing_picks_the_innermost_declaration() {
        let (statements, locals, errors) =
            resolve("fun f(a) { print a; { var a = 2; print a; } }");
        assert!(errors.is_empty());

        let mut ids = Vec::new();
        printed_variable_ids(&statements, "a", &mut ids);

        assert_eq!(locals.get(&ids[0]), Some(&0));
        assert_eq!(locals.get(&ids[1]), Some(&0));
    }

    #[test]
    fn test_reading_local_in_own_initializer() {
        let (_, _, errors) = resolve("var a = 1; { var a = a + 1; print a; }");

        assert_eq!(
            messages(&errors),
            vec!["Can't read local variable in its own initializer."]
        );
        assert_eq!(errors[0].location(), " at 'a'");
    }

    #[test]
    fn test_global_self_reference_is_allowed() {
        let (_, _, errors) = resolve("var a = 1; var a = a;");

        assert!(errors.is_empty());
    }

    #[test]
    fn test_duplicate_local_declaration() {
        let (_, _, errors) = resolve("fun f() { var x; var x; } { var y; { var y; } }");

        assert_eq!(
            messages(&errors),
            vec!["Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_return_rules() {
        let (_, _, errors) = resolve(
            "return 1;\n\
             class A { init() { return; } other() { return 2; } }\n\
             class B { init() { return 3; } }",
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Can't return from top-level code.",
                "Can't return a value from an initializer.",
            ]
        );
        assert_eq!(errors[0].line(), 1);
        assert_eq!(errors[1].line(), 3);
    }

    #[test]
    fn test_this_and_super_outside_valid_context() {
        let (_, _, errors) = resolve(
            "print this;\n\
             fun f() { super.g(); }\n\
             class A { m() { super.m(); } }",
        );

        assert_eq!(
            messages(&errors),
            vec![
                "Can't use 'this' outside of a class.",
                "Can't use 'super' outside of a class.",
                "Can't use 'super' in a class with no superclass.",
            ]
        );
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        let (_, _, errors) = resolve("class A < A {}");

        assert_eq!(messages(&errors), vec!["A class can't inherit from itself."]);
    }

    #[test]
    fn test_all_errors_are_collected_in_one_pass() {
        let (_, _, errors) = resolve("return; print this; { var q = q; }");

        assert_eq!(errors.len(), 3);
    }
}
