#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let (tokens, errors) = scan_tokens(source);

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_keywords_and_operators() {
        assert_token_sequence(
            "class B < A { init() { return this != nil; } } // trailing",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "B"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "A"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::IDENTIFIER, "init"),
                (TokenType::LEFT_PAREN, "("),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::RETURN, "return"),
                (TokenType::THIS, "this"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::NIL, "nil"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_literals_carry_values_and_lines() {
        let (tokens, errors) = scan_tokens("12.5\n\"two\nlines\" x");

        assert!(errors.is_empty());
        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 12.5));
        assert_eq!(tokens[0].line, 1);
        assert!(matches!(&tokens[1].token_type, TokenType::STRING(s) if s == "two\nlines"));
        assert_eq!(tokens[2].lexeme, "x");
        assert_eq!(tokens[2].line, 3);
        assert_eq!(tokens[3].token_type, TokenType::EOF);
    }

    #[test]
    fn test_token_display() {
        let (tokens, _) = scan_tokens("42 \"hi\" and");

        assert_eq!(tokens[0].to_string(), "NUMBER 42 42.0");
        assert_eq!(tokens[1].to_string(), "STRING \"hi\" hi");
        assert_eq!(tokens[2].to_string(), "AND and null");
        assert_eq!(tokens[3].to_string(), "EOF  null");
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source).collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.message().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        assert_eq!(
            results[5].as_ref().map(|t| t.token_type.clone()).ok(),
            Some(TokenType::EOF)
        );
    }

    #[test]
    fn test_unterminated_string_is_reported() {
        let (tokens, errors) = scan_tokens("\"open");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
    }

    #[test]
    fn test_non_ascii_outside_strings_is_one_error() {
        let (tokens, errors) = scan_tokens("é \"ok é\"");

        assert_eq!(errors.len(), 1);
        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "ok é"));
    }
}
