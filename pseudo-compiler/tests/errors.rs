use pseudo_compiler::{compile_to_ir, CompileError, ResolutionErrorKind};

// ── Lexical errors ───────────────────────────────────────────────────────

#[test]
fn unrecognized_character() {
    let result = compile_to_ir("OUTPUT \"hi\" $");
    match result {
        Err(CompileError::Lexical(e)) => {
            assert_eq!(e.line, 1);
            assert_eq!(e.column, 13);
            assert_eq!(e.lexeme, "$");
        }
        other => panic!("Expected lexical error, got: {:?}", other),
    }
}

#[test]
fn integer_literal_out_of_range() {
    let result = compile_to_ir("DECLARE x : INT\nx <- 99999999999");
    assert!(
        matches!(result, Err(CompileError::Lexical(ref e)) if e.line == 2),
        "got {:?}",
        result
    );
}

#[test]
fn unknown_string_escape() {
    let result = compile_to_ir("OUTPUT \"bad \\q\"");
    assert!(matches!(result, Err(CompileError::Lexical(_))));
}

// ── Parse errors ─────────────────────────────────────────────────────────

#[test]
fn missing_assignment_arrow() {
    match compile_to_ir("DECLARE x : INT\nx 5") {
        Err(CompileError::Parse { line, col, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(col, 3);
        }
        other => panic!("Expected parse error, got: {:?}", other),
    }
}

#[test]
fn unterminated_while_names_closer_and_opening_line() {
    let source = "OUTPUT \"start\"\nWHILE TRUE DO\n    OUTPUT \"x\"\n";
    match compile_to_ir(source) {
        Err(CompileError::Parse { message, .. }) => {
            assert!(message.contains("ENDWHILE"), "message: {}", message);
            assert!(message.contains("line 2"), "message: {}", message);
        }
        other => panic!("Expected parse error, got: {:?}", other),
    }
}

#[test]
fn unterminated_if() {
    let source = "IF TRUE THEN\nOUTPUT \"a\"\nELSE\nOUTPUT \"b\"\n";
    match compile_to_ir(source) {
        Err(CompileError::Parse { message, .. }) => assert!(message.contains("ENDIF")),
        other => panic!("Expected parse error, got: {:?}", other),
    }
}

#[test]
fn repeat_without_until() {
    let result = compile_to_ir("REPEAT\nOUTPUT \"a\"\n");
    assert!(matches!(result, Err(CompileError::Parse { .. })));
}

#[test]
fn two_statements_on_one_line() {
    let result = compile_to_ir("OUTPUT \"a\" OUTPUT \"b\"");
    assert!(matches!(result, Err(CompileError::Parse { line: 1, .. })));
}

#[test]
fn parse_error_carries_line_context() {
    match compile_to_ir("DECLARE x : INT\nx <- (1 + 2\n") {
        Err(CompileError::Parse { context, .. }) => assert_eq!(context, "x <- (1 + 2"),
        other => panic!("Expected parse error, got: {:?}", other),
    }
}

#[test]
fn deeply_nested_parentheses_are_rejected() {
    let source = format!("DECLARE x : INT\nx <- {}1", "(".repeat(10_000));
    match compile_to_ir(&source) {
        Err(CompileError::Parse { line, message, .. }) => {
            assert_eq!(line, 2);
            assert!(message.contains("Nesting too deep"), "message: {}", message);
        }
        other => panic!("Expected parse error, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn long_negation_chain_is_rejected() {
    let source = format!("DECLARE x : INT\nx <- {}1", "-".repeat(200_000));
    let result = compile_to_ir(&source);
    assert!(matches!(result, Err(CompileError::Parse { .. })));
}

#[test]
fn deeply_nested_blocks_are_rejected() {
    let source = format!(
        "{}{}",
        "IF TRUE THEN\n".repeat(2_000),
        "ENDIF\n".repeat(2_000)
    );
    let result = compile_to_ir(&source);
    assert!(matches!(result, Err(CompileError::Parse { .. })));
}

#[test]
fn nested_call_arguments_are_bounded() {
    let source = format!("CALL {}0{}", "getchar(".repeat(5_000), ")".repeat(5_000));
    let result = compile_to_ir(&source);
    assert!(matches!(result, Err(CompileError::Parse { .. })));
}

#[test]
fn moderate_nesting_still_compiles() {
    let source = format!(
        "DECLARE x : INT\nx <- {}1{}\n{}x <- 2\n{}",
        "(".repeat(40),
        ")".repeat(40),
        "WHILE FALSE DO\n".repeat(40),
        "ENDWHILE\n".repeat(40)
    );
    let module = compile_to_ir(&source).unwrap();
    module.verify().unwrap();
}

// ── Resolution errors ────────────────────────────────────────────────────

#[test]
fn undefined_variable() {
    let result = compile_to_ir("x <- 1");
    assert_resolution_error(result, ResolutionErrorKind::UndefinedVariable);
}

#[test]
fn undefined_variable_in_expression() {
    let result = compile_to_ir("DECLARE x : INT\nx <- y + 1");
    assert_resolution_error(result, ResolutionErrorKind::UndefinedVariable);
}

#[test]
fn variable_redefinition() {
    let source = "DECLARE x : INT\nDECLARE x : REAL";
    assert_resolution_error(compile_to_ir(source), ResolutionErrorKind::VariableRedefinition);
}

#[test]
fn redefinition_inside_loop_body_clashes_with_outer() {
    let source = "DECLARE i : INT\nWHILE FALSE DO\n    DECLARE i : INT\nENDWHILE";
    assert_resolution_error(compile_to_ir(source), ResolutionErrorKind::VariableRedefinition);
}

#[test]
fn redefinition_names_the_first_declaration() {
    let source = "DECLARE x : INT\nIF TRUE THEN\n    DECLARE x : REAL\nENDIF";
    match compile_to_ir(source) {
        Err(CompileError::Resolution { kind, line, message, .. }) => {
            assert_eq!(kind, ResolutionErrorKind::VariableRedefinition);
            assert_eq!(line, 3);
            assert!(
                message.contains("previously declared at 1:1"),
                "message: {}",
                message
            );
        }
        other => panic!("Expected resolution error, got: {:?}", other),
    }
}

#[test]
fn intrinsic_name_cannot_be_redeclared_as_variable() {
    let source = "DECLARE printfd_fmt : INT";
    let result = compile_to_ir(source);
    if let Err(CompileError::Resolution { ref message, .. }) = result {
        assert!(message.contains("reserved by the runtime"), "message: {}", message);
    }
    assert_resolution_error(result, ResolutionErrorKind::VariableRedefinition);
}

#[test]
fn undefined_function() {
    let result = compile_to_ir("CALL foo()");
    assert_resolution_error(result, ResolutionErrorKind::UndefinedFunction);
}

#[test]
fn main_is_not_callable() {
    let result = compile_to_ir("CALL main()");
    assert_resolution_error(result, ResolutionErrorKind::UndefinedFunction);
}

#[test]
fn too_many_arguments() {
    let result = compile_to_ir("CALL puts(\"a\", \"b\")");
    assert_resolution_error(result, ResolutionErrorKind::ArgumentCountMismatch);
}

#[test]
fn too_few_arguments() {
    let result = compile_to_ir("CALL puts()");
    assert_resolution_error(result, ResolutionErrorKind::ArgumentCountMismatch);
}

#[test]
fn variadic_call_still_needs_fixed_arguments() {
    let result = compile_to_ir("CALL printf()");
    assert_resolution_error(result, ResolutionErrorKind::ArgumentCountMismatch);
}

#[test]
fn custom_type_declaration_binds_nothing() {
    let source = "DECLARE p : Point\np <- 1";
    assert_resolution_error(compile_to_ir(source), ResolutionErrorKind::UndefinedVariable);
}

// ── Type errors ──────────────────────────────────────────────────────────

#[test]
fn assign_real_to_int() {
    match compile_to_ir("DECLARE x : INT\nx <- 1.5") {
        Err(CompileError::Type { line, col, .. }) => {
            assert_eq!((line, col), (2, 1));
        }
        other => panic!("Expected type error, got: {:?}", other),
    }
}

#[test]
fn assign_int_to_bool() {
    let result = compile_to_ir("DECLARE b : BOOL\nb <- 1");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn mixed_int_and_real_arithmetic() {
    match compile_to_ir("DECLARE r : REAL\nr <- 1 + 2.0") {
        Err(CompileError::Type { line, col, .. }) => assert_eq!((line, col), (2, 8)),
        other => panic!("Expected type error, got: {:?}", other),
    }
}

#[test]
fn real_on_the_left_of_int() {
    let result = compile_to_ir("DECLARE r : REAL\nr <- 2.0 * 3");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn arithmetic_on_strings() {
    let result = compile_to_ir("OUTPUT \"a\" + \"b\"");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn non_boolean_if_condition() {
    let result = compile_to_ir("IF 1 THEN\nOUTPUT \"a\"\nENDIF");
    assert!(matches!(result, Err(CompileError::Type { line: 1, col: 1, .. })));
}

#[test]
fn non_boolean_while_condition() {
    let result = compile_to_ir("WHILE 1.0 DO\nENDWHILE");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn non_boolean_repeat_condition() {
    let result = compile_to_ir("REPEAT\nUNTIL 0");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn output_of_a_number() {
    let result = compile_to_ir("OUTPUT 5");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn printf_d_of_real() {
    let result = compile_to_ir("PrintfD 1.0");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn printf_f_of_int() {
    let result = compile_to_ir("PrintfF 1");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn negating_a_boolean() {
    let result = compile_to_ir("PrintfD -TRUE");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn not_of_an_integer() {
    let result = compile_to_ir("PrintfD !1");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

#[test]
fn input_into_real() {
    let result = compile_to_ir("DECLARE r : REAL\nINPUT r");
    assert!(matches!(result, Err(CompileError::Type { line: 2, .. })));
}

#[test]
fn string_argument_where_int_expected() {
    let result = compile_to_ir("CALL puts(1)");
    assert!(matches!(result, Err(CompileError::Type { .. })));
}

// ── Error location accuracy ─────────────────────────────────────────────

#[test]
fn error_location_multiline() {
    let source = "DECLARE x : INT\nx <- 1\nCALL not_a_func(1, 2)\n";
    match compile_to_ir(source) {
        Err(CompileError::Resolution { line, col, .. }) => {
            assert_eq!(line, 3, "Error should be on line 3, got {}", line);
            assert_eq!(col, 6, "Error should point at the callee, got {}", col);
        }
        other => panic!("Expected resolution error, got: {:?}", other),
    }
}

#[test]
fn resolution_error_display() {
    let err = compile_to_ir("\n  y <- 2").unwrap_err();
    let text = err.to_string();
    assert!(
        text.starts_with("ResolutionError:UndefinedVariable (2:3) - "),
        "got: {}",
        text
    );
}

// ── Helper ───────────────────────────────────────────────────────────────

fn assert_resolution_error(
    result: Result<pseudo_compiler::ir::Module, CompileError>,
    expected: ResolutionErrorKind,
) {
    match result {
        Ok(_) => panic!("Expected {:?} error, but compilation succeeded", expected),
        Err(CompileError::Resolution { kind, .. }) => {
            assert_eq!(kind, expected);
        }
        Err(other) => panic!("Expected {:?} resolution error, got: {:?}", expected, other),
    }
}
