use super::*;
use crate::lexer::Lexer;
use crate::types::{AddressSpace, ScalarKind};

fn parse(source: &str) -> TranslationUnit {
    let (tokens, lex_diags) = Lexer::new(source).tokenize();
    assert!(lex_diags.is_empty(), "lex errors: {:?}", lex_diags);
    Parser::new(tokens).parse_unit().unwrap()
}

fn parse_err(source: &str) -> Vec<Diagnostic> {
    let (tokens, _) = Lexer::new(source).tokenize();
    match Parser::new(tokens).parse_unit() {
        Ok(_) => vec![],
        Err(diags) => diags,
    }
}

fn only_function(unit: &TranslationUnit) -> &FunctionDecl {
    unit.functions().next().expect("a function")
}

#[test]
fn test_kernel_with_pointer_and_scalar() {
    let unit = parse("kernel void k(global int* a, uint i) { a[i] = 0; }");
    let k = only_function(&unit);
    assert!(k.is_kernel);
    assert_eq!(k.name.node, "k");
    assert_eq!(k.params.len(), 2);
    let a = unit.var(k.params[0].var);
    assert_eq!(a.name.node, "a");
    assert_eq!(a.ty.pointer_space(), Some(AddressSpace::Global));
    assert_eq!(unit.type_name(&a.ty), "int*");
    let i = unit.var(k.params[1].var);
    assert_eq!(i.ty, Ty::Scalar(ScalarKind::UInt));
    assert_eq!(unit.kernels().count(), 1);
}

#[test]
fn test_param_span_ends_after_declarator() {
    let source = "__kernel void k(__global float *out, int n) {}";
    let unit = parse(source);
    let k = only_function(&unit);
    let span = k.params[0].span;
    assert_eq!(&source[span.range()], "__global float *out");
}

#[test]
fn test_unsigned_spellings() {
    let unit = parse("void f(unsigned int a, unsigned b, unsigned char c, long int d) {}");
    let f = only_function(&unit);
    let tys: Vec<Ty> = f.params.iter().map(|p| unit.var(p.var).ty.clone()).collect();
    assert_eq!(
        tys,
        vec![
            Ty::Scalar(ScalarKind::UInt),
            Ty::Scalar(ScalarKind::UInt),
            Ty::Scalar(ScalarKind::UChar),
            Ty::Scalar(ScalarKind::Long),
        ]
    );
}

#[test]
fn test_array_param_decays_to_pointer() {
    let unit = parse("kernel void k(constant float table[]) {}");
    let k = only_function(&unit);
    let ty = &unit.var(k.params[0].var).ty;
    assert_eq!(ty.pointer_space(), Some(AddressSpace::Constant));
}

#[test]
fn test_local_array_with_define_length() {
    let unit = parse("#define N 8\nkernel void k() { int buf[N * 2]; uint j = 1; buf[j] = 1; }");
    assert_eq!(unit.defines.len(), 1);
    assert_eq!(unit.defines[0].value, 8);
    let buf = unit
        .vars
        .iter()
        .find(|v| v.name.node == "buf")
        .expect("buf");
    assert_eq!(buf.ty.known_array_len(), Some(16));
}

#[test]
fn test_struct_and_typedef() {
    let unit = parse(
        "typedef struct { float x; float y; } Point;\nstruct S { int a; };\nkernel void k(global Point* p, global struct S* s) {}",
    );
    assert_eq!(unit.records.len(), 2);
    assert_eq!(unit.records[0].display_name(), "Point");
    assert_eq!(unit.records[1].display_name(), "struct S");
    let k = unit.kernels().next().unwrap();
    assert_eq!(unit.type_name(&unit.var(k.params[0].var).ty), "Point*");
    assert_eq!(unit.type_name(&unit.var(k.params[1].var).ty), "struct S*");
}

#[test]
fn test_image_access_qualifier() {
    let unit = parse("kernel void k(read_only image2d_t src, __write_only image2d_t dst, sampler_t s) {}");
    let k = only_function(&unit);
    assert_eq!(k.params[0].access, Some(AccessQualifier::ReadOnly));
    assert_eq!(k.params[1].access, Some(AccessQualifier::WriteOnly));
    assert_eq!(k.params[2].access, None);
    assert!(unit.var(k.params[2].var).ty.is_sampler());
}

#[test]
fn test_precedence() {
    let unit = parse("void f(int a, int b, int c) { a = b + c * 2; }");
    let f = only_function(&unit);
    let body = f.body.as_ref().unwrap();
    let Stmt::Expr(e) = &body.stmts[0].node else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign { rhs, .. } = &unit.exprs.get(*e).kind else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { op, .. } = &unit.exprs.get(*rhs).kind else {
        panic!("expected binary op");
    };
    assert_eq!(*op, BinOp::Add);
}

#[test]
fn test_expression_spans() {
    let source = "void f(global int* p, int i) { *(p + i) = p[i + 1]; }";
    let unit = parse(source);
    let f = only_function(&unit);
    let Stmt::Expr(e) = &f.body.as_ref().unwrap().stmts[0].node else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign { lhs, rhs, .. } = &unit.exprs.get(*e).kind else {
        panic!("expected assignment");
    };
    assert_eq!(&source[unit.exprs.get(*lhs).span.range()], "*(p + i)");
    assert_eq!(&source[unit.exprs.get(*rhs).span.range()], "p[i + 1]");
}

#[test]
fn test_cast_and_sizeof() {
    let unit = parse("void f(float x) { int a = (int)x; ulong s = sizeof(float4); float4 v = (float4)(1.0f, 2.0f, 3.0f, 4.0f); }");
    let casts = (0..unit.exprs.len() as u32)
        .filter(|i| matches!(unit.exprs.get(ExprId(*i)).kind, ExprKind::Cast { .. }))
        .count();
    assert_eq!(casts, 2);
    assert!((0..unit.exprs.len() as u32)
        .any(|i| matches!(unit.exprs.get(ExprId(i)).kind, ExprKind::SizeofType(_))));
}

#[test]
fn test_control_flow() {
    let unit = parse(
        "void f(int n) { for (int i = 0; i < n; i++) { if (i) continue; else break; } while (n) n--; do { n++; } while (n < 3); switch (n) { case 1: break; default: break; } }",
    );
    let f = only_function(&unit);
    assert_eq!(f.body.as_ref().unwrap().stmts.len(), 4);
}

#[test]
fn test_directives_are_items() {
    let unit = parse("#pragma OPENCL EXTENSION cl_khr_fp64 : enable\nkernel void k() {}");
    assert!(matches!(&unit.items[0], Item::Directive(d) if d.node.starts_with("pragma")));
    assert!(unit.defines.is_empty());
}

#[test]
fn test_attributes_are_skipped() {
    let unit = parse("__kernel __attribute__((reqd_work_group_size(64, 1, 1))) void k(global int* a) {}");
    assert_eq!(unit.kernels().count(), 1);
}

#[test]
fn test_prototype_is_not_a_kernel_definition() {
    let unit = parse("kernel void k(global int* a);");
    assert_eq!(unit.functions().count(), 1);
    assert_eq!(unit.kernels().count(), 0);
}

#[test]
fn test_missing_semicolon_is_error() {
    let diags = parse_err("void f() { int a = 1 }");
    assert!(!diags.is_empty());
    assert!(diags[0].message.contains("expected ';'"));
}

#[test]
fn test_non_constant_array_size_is_error() {
    let diags = parse_err("void f(int n) { int a[n]; }");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("integer constant"));
}

#[test]
fn test_unknown_type_is_error() {
    let diags = parse_err("kernel void k(mystery_t x) {}");
    assert!(!diags.is_empty());
}
