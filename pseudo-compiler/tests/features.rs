use pseudo_compiler::ir::ast::{StatementKind, VariableType};
use pseudo_compiler::{compile_to_ir, compile_to_llvm, parse, tokenize};

fn llvm(source: &str) -> String {
    compile_to_llvm(source).unwrap_or_else(|e| panic!("compilation failed: {}", e))
}

// ── Module skeleton ──────────────────────────────────────────────────────

#[test]
fn empty_program_returns_zero() {
    let ir = llvm("");
    assert!(ir.contains("define i32 @main() {"));
    assert!(ir.contains("entry:\n  ret i32 0\n}"), "{}", ir);
}

#[test]
fn runtime_is_always_declared() {
    let ir = llvm("");
    assert!(ir.contains("declare i32 @puts(i8*)"));
    assert!(ir.contains("declare i32 @printf(i8*, ...)"));
    assert!(ir.contains("declare i32 @getchar()"));
    assert!(ir.contains(
        "@printfd_fmt = private unnamed_addr constant [9 x i8] c\"Int: %d\\0A\\00\""
    ));
    assert!(ir.contains(
        "@printff_fmt = private unnamed_addr constant [10 x i8] c\"Real: %f\\0A\\00\""
    ));
}

#[test]
fn declarations_come_before_definitions() {
    let ir = llvm("OUTPUT \"x\"");
    let declare = ir.find("declare i32 @puts").unwrap();
    let define = ir.find("define i32 @main").unwrap();
    assert!(declare < define);
}

// ── Declarations ─────────────────────────────────────────────────────────

#[test]
fn declare_each_builtin_type() {
    let ir = llvm("DECLARE i : INT\nDECLARE r : REAL\nDECLARE b : BOOL");
    assert!(ir.contains("@i = global i32 0"));
    assert!(ir.contains("@r = global double 0x0000000000000000"));
    assert!(ir.contains("@b = global i1 false"));
}

#[test]
fn custom_type_declaration_is_parsed_but_emits_nothing() {
    let program = parse("DECLARE p : Point").unwrap();
    assert_eq!(
        program.statements[0].kind,
        StatementKind::Declare {
            name: "p".to_string(),
            ty: VariableType::Custom("Point".to_string()),
        }
    );
    let module = compile_to_ir("DECLARE p : Point").unwrap();
    assert!(module.get_global("p").is_none());
}

#[test]
fn variable_named_like_a_function_gets_suffix() {
    let ir = llvm("DECLARE puts : INT\nputs <- 3");
    assert!(ir.contains("@puts.1 = global i32 0"), "{}", ir);
    assert!(ir.contains("store i32 3, i32* @puts.1"));
}

#[test]
fn declaration_inside_loop_is_visible_after_it() {
    let source = "REPEAT\n    DECLARE n : INT\nUNTIL TRUE\nn <- 4";
    let ir = llvm(source);
    assert!(ir.contains("store i32 4, i32* @n"));
}

#[test]
fn outer_declaration_resolves_inside_if_arm() {
    let source = "DECLARE a : INT\nIF TRUE THEN\n    a <- 1\nENDIF";
    let ir = llvm(source);
    assert!(ir.contains("store i32 1, i32* @a"));
}

// ── Assignment and INPUT ─────────────────────────────────────────────────

#[test]
fn declare_assign_then_print() {
    let ir = llvm("DECLARE a : INT\na <- 5\nPrintfD a");
    assert!(ir.contains("store i32 5, i32* @a"));
    assert!(ir.contains("%t0 = load i32, i32* @a"));
    assert!(ir.contains("@printf(i8* %t1, i32 %t0)"));
}

#[test]
fn assign_constant() {
    let ir = llvm("DECLARE x : INT\nx <- 5");
    assert!(ir.contains("store i32 5, i32* @x"));
}

#[test]
fn assign_from_variable_loads_it() {
    let ir = llvm("DECLARE a : INT\nDECLARE b : INT\nb <- a");
    assert!(ir.contains("%t0 = load i32, i32* @a"));
    assert!(ir.contains("store i32 %t0, i32* @b"));
}

#[test]
fn assign_comparison_to_bool() {
    let ir = llvm("DECLARE b : BOOL\nb <- 1 < 2");
    assert!(ir.contains("%t0 = icmp slt i32 1, 2"));
    assert!(ir.contains("store i1 %t0, i1* @b"));
}

#[test]
fn real_literal_is_exact_hex() {
    let ir = llvm("DECLARE r : REAL\nr <- 1.5");
    assert!(ir.contains("store double 0x3FF8000000000000, double* @r"));
}

#[test]
fn input_reads_one_character() {
    let ir = llvm("DECLARE c : INT\nINPUT c");
    assert!(ir.contains("%t0 = call i32 @getchar()"));
    assert!(ir.contains("store i32 %t0, i32* @c"));
}

// ── Output and debug prints ──────────────────────────────────────────────

#[test]
fn output_string_literal() {
    let ir = llvm("OUTPUT \"hi\"");
    assert!(ir.contains("@.str.0 = private unnamed_addr constant [3 x i8] c\"hi\\00\""));
    assert!(ir.contains("%t0 = bitcast [3 x i8]* @.str.0 to i8*"));
    assert!(ir.contains("%t1 = call i32 @puts(i8* %t0)"));
}

#[test]
fn string_escapes_are_encoded() {
    let ir = llvm("OUTPUT \"a\\tb \\\"q\\\"\"");
    assert!(ir.contains("c\"a\\09b \\22q\\22\\00\""), "{}", ir);
}

#[test]
fn printf_d_uses_int_format() {
    let ir = llvm("PrintfD 42");
    assert!(ir.contains("%t0 = bitcast [9 x i8]* @printfd_fmt to i8*"));
    assert!(ir.contains("%t1 = call i32 (i8*, ...) @printf(i8* %t0, i32 42)"));
}

#[test]
fn printf_d_widens_booleans() {
    let ir = llvm("PrintfD TRUE");
    assert!(ir.contains("%t0 = zext i1 true to i32"));
    assert!(ir.contains("@printf(i8* %t1, i32 %t0)"), "{}", ir);
}

#[test]
fn printf_f_uses_real_format() {
    let ir = llvm("PrintfF 2.0");
    assert!(ir.contains("bitcast [10 x i8]* @printff_fmt to i8*"));
    assert!(ir.contains("double 0x4000000000000000)"));
}

// ── Calls ────────────────────────────────────────────────────────────────

#[test]
fn call_statement_with_variadic_arguments() {
    let ir = llvm("DECLARE n : INT\nn <- 7\nCALL printf(\"n=%d\\n\", n, n > 3)");
    // Arguments are evaluated left to right before any coercion.
    assert!(ir.contains("%t0 = load i32, i32* @n"), "{}", ir);
    assert!(ir.contains("%t1 = load i32, i32* @n"));
    assert!(ir.contains("%t2 = icmp sgt i32 %t1, 3"));
    assert!(ir.contains("%t3 = bitcast [6 x i8]* @.str.0 to i8*"));
    assert!(ir.contains("%t4 = zext i1 %t2 to i32"));
    assert!(ir.contains("%t5 = call i32 (i8*, ...) @printf(i8* %t3, i32 %t0, i32 %t4)"));
}

#[test]
fn call_in_expression_uses_result() {
    let ir = llvm("DECLARE c : INT\nc <- getchar() + 1");
    assert!(ir.contains("%t0 = call i32 @getchar()"));
    assert!(ir.contains("%t1 = add i32 %t0, 1"));
}

// ── Lexing details ───────────────────────────────────────────────────────

#[test]
fn comments_and_blank_lines_are_ignored() {
    let ir = llvm("// header\n\nDECLARE x : INT // trailing\n\nx <- 1\n");
    assert!(ir.contains("store i32 1, i32* @x"));
}

#[test]
fn assignment_arrow_wins_over_less_than() {
    let tokens = tokenize("a<-1").unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1].token.to_string(), "<-");
}

#[test]
fn crlf_line_endings() {
    let ir = llvm("DECLARE x : INT\r\nx <- 2\r\n");
    assert!(ir.contains("store i32 2, i32* @x"));
}

#[test]
fn token_positions_are_one_based() {
    let tokens = tokenize("OUTPUT \"a\"\n  PrintfD 1").unwrap();
    let printf = &tokens[3];
    assert_eq!(printf.token.to_string(), "PrintfD");
    assert_eq!((printf.pos.line, printf.pos.column), (2, 3));
}
