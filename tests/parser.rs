#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::scanner::scan_tokens;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let (tokens, lex_errors) = scan_tokens(source);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);

        Parser::new(&tokens).parse()
    }

    fn parse_ok(source: &str) -> Vec<String> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);

        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn expression(source: &str) -> String {
        let (tokens, _) = scan_tokens(source);
        let expr: Expr = Parser::new(&tokens)
            .parse_expression()
            .expect("expression should parse");

        AstPrinter::print(&expr)
    }

    #[test]
    fn test_precedence_groups_factor_under_term() {
        assert_eq!(expression("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(expression("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
        assert_eq!(expression("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
        assert_eq!(expression("-a < b == !c"), "(== (< (- a) b) (! c))");
    }

    #[test]
    fn test_logical_and_binds_tighter_than_or() {
        assert_eq!(expression("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(expression("a = b = 1"), "(= a (= b 1.0))");
        assert_eq!(expression("a.b.c = 2"), "(= (. (. a b) c) 2.0)");
    }

    #[test]
    fn test_call_and_property_chain() {
        assert_eq!(expression("f(1)(2).x(y)"), "(call (. (call (call f 1.0) 2.0) x) y)");
        assert_eq!(expression("super.greet()"), "(call (super greet))");
    }

    #[test]
    fn test_for_is_desugared_into_while() {
        let printed = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");

        assert_eq!(
            printed,
            vec!["{ (var i 0.0) (while (< i 3.0) { (print i) (; (= i (+ i 1.0))) }) }"]
        );
    }

    #[test]
    fn test_for_without_clauses_loops_on_true() {
        let printed = parse_ok("for (;;) print 1;");

        assert_eq!(printed, vec!["(while true (print 1.0))"]);
    }

    #[test]
    fn test_class_with_superclass_and_methods() {
        let printed = parse_ok("class B < A { init(x) { this.x = x; } get() { return this.x; } }");

        assert_eq!(
            printed,
            vec![
                "(class B < A init (x) { (; (= (. this x) x)) } get () { (return (. this x)) })"
            ]
        );
    }

    #[test]
    fn test_invalid_assignment_target_does_not_stop_parsing() {
        let (statements, errors) = parse("1 + 2 = 3; print 4;");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Invalid assignment target.");
        assert_eq!(errors[0].location(), " at '='");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_recovers_at_statement_boundaries_and_collects_errors() {
        let source = "var = 1;\nprint 2;\nprint (3;\nvar ok = 4;";
        let (statements, errors) = parse(source);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line(), 1);
        assert_eq!(errors[0].message(), "Expect variable name.");
        assert_eq!(errors[1].line(), 3);
        assert_eq!(errors[1].message(), "Expect ')' after expression.");

        let printed: Vec<String> = statements.iter().map(AstPrinter::print_stmt).collect();
        assert_eq!(printed, vec!["(print 2.0)", "(var ok 4.0)"]);
    }

    #[test]
    fn test_error_at_end_of_input() {
        let (_, errors) = parse("print 1");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location(), " at end");
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error at end: Expect ';' after value."
        );
    }

    #[test]
    fn test_too_many_arguments_is_reported_but_not_fatal() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));
        let (statements, errors) = parse(&source);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Can't have more than 255 arguments.");
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_empty_token_slice_parses_to_nothing() {
        let (statements, errors) = Parser::new(&[]).parse();

        assert!(statements.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_expression_must_span_the_whole_input() {
        let (tokens, _) = scan_tokens("1 + 2 3");
        let errors = Parser::new(&tokens)
            .parse_expression()
            .expect_err("trailing token should be rejected");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Expect end of expression.");
        assert_eq!(errors[0].location(), " at '3'");
    }
}
