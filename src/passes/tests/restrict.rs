use crate::diagnostic::{DiagnosticKind, Severity};

use super::restrict;

#[test]
fn test_clean_kernel_has_no_violations() {
    let diags = restrict(
        "kernel void k(global int* a, constant float* c, local int* l, uint n, read_only image2d_t img, sampler_t s) {\n    a[0] = 1;\n}",
    );
    assert!(diags.is_empty(), "{:?}", diags);
}

#[test]
fn test_struct_by_value_parameter() {
    let diags = restrict("typedef struct { int x; } S;\nkernel void k(S s) {\n}");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::RestrictionViolation);
    assert_eq!(diags[0].severity, Severity::Error);
    assert!(diags[0].message.contains("'s'"));
}

#[test]
fn test_struct_parameter_of_helper_is_allowed() {
    let diags = restrict("struct S { int x; };\nint get(struct S s) { return s.x; }");
    assert!(diags.is_empty());
}

#[test]
fn test_image3d_parameter() {
    let diags = restrict("kernel void k(read_only image3d_t img) {\n}");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("image3d_t"));
}

#[test]
fn test_read_write_image() {
    let diags = restrict("kernel void k(read_write image2d_t img) {\n}");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("read_write"));
}

#[test]
fn test_private_and_double_pointers() {
    let diags = restrict("kernel void k(int* p) {\n}");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("global, constant or local"));

    let diags = restrict("kernel void k(global int** p) {\n}");
    assert!(diags
        .iter()
        .any(|d| d.message.contains("pointer to a pointer")));
}

#[test]
fn test_reserved_prefix() {
    let diags = restrict("kernel void k(global int* _wcl_a) {\n    int _wcl_tmp = 0;\n}");
    assert_eq!(diags.len(), 2);
    assert!(diags
        .iter()
        .all(|d| d.message.contains("reserved prefix '_wcl'")));
    // reported in source order
    assert!(diags[0].span.unwrap().start < diags[1].span.unwrap().start);
}

#[test]
fn test_unsupported_builtin_is_error() {
    let diags = restrict("kernel void k(global int* a) {\n    prefetch(a, 1);\n}");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Error);
    assert!(diags[0].message.contains("'prefetch'"));
}

#[test]
fn test_pointer_writing_builtin_is_warning() {
    let diags = restrict(
        "kernel void k(global float* a) {\n    float4 v = vload4(0, a);\n    vstore4(v, 1, a);\n}",
    );
    assert_eq!(diags.len(), 2);
    assert!(diags.iter().all(|d| d.severity == Severity::Warning));
}

#[test]
fn test_all_violations_are_collected() {
    let diags = restrict(
        "typedef struct { int x; } S;\nkernel void k(S s, int* p, read_only image3d_t img) {\n}",
    );
    assert_eq!(diags.len(), 3);
}

#[test]
fn test_pointer_parameter_cannot_move() {
    for body in ["a += 100;", "a++;", "--a;", "a = a + 7;", "(a) -= 1;"] {
        let source = format!("kernel void k(global int* a) {{\n    {}\n    *a = 1;\n}}", body);
        let diags = restrict(&source);
        assert_eq!(diags.len(), 1, "{}: {:?}", body, diags);
        assert_eq!(diags[0].kind, DiagnosticKind::RestrictionViolation);
        assert!(diags[0].message.contains("'a' cannot be modified"), "{}", body);
    }
}

#[test]
fn test_pointer_parameter_address_cannot_be_taken() {
    let diags = restrict("kernel void k(global int* a) {\n    &a;\n}");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("taken by address"));
}

#[test]
fn test_pointee_and_other_variables_may_change() {
    let diags = restrict(
        "kernel void k(global int* a, int n) {\n    a[0] += 1;\n    *a = 2;\n    n++;\n    a[1] = *(&a[0]);\n}\nvoid h(global int* p) {\n    p++;\n}",
    );
    assert!(diags.is_empty(), "{:?}", diags);
}

#[test]
fn test_include_is_rejected() {
    let diags = restrict("#include \"evil.cl\"\nkernel void k() {\n}");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("'#include'"));
    assert_eq!(diags[0].span.unwrap().start, 0);
}

#[test]
fn test_macros_must_be_integer_constants() {
    let diags = restrict(
        "#define X(p) p[100]\nkernel void k(global int* a, global int* b) {\n    b[0] = X(a);\n}",
    );
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("function-like macro 'X'"));

    let diags = restrict("#define GET a[100]\n#define EMPTY\nkernel void k() {\n}");
    assert_eq!(diags.len(), 2);
    assert!(diags[0].message.contains("'GET' must expand to an integer constant"));
    assert!(diags[1].message.contains("'EMPTY'"));

    let diags = restrict("#define N 8\n#define M (0x10u)\nkernel void k() {\n}");
    assert!(diags.is_empty(), "{:?}", diags);
}

#[test]
fn test_macro_redefinition() {
    let diags = restrict("#define N 4\n#undef N\n#define N 100\nkernel void k() {\n}");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("'N' is redefined"));

    let diags = restrict("#define N 4\n#define N 4\nkernel void k() {\n}");
    assert!(diags.is_empty());
}

#[test]
fn test_conditional_and_unknown_directives() {
    let diags = restrict("#ifdef FAST\n#endif\n#embed \"x\"\nkernel void k() {\n}");
    assert_eq!(diags.len(), 3);
    assert!(diags[0].message.contains("'#ifdef'"));
    assert!(diags[1].message.contains("'#endif'"));
    assert!(diags[2].message.contains("'#embed'"));
}

#[test]
fn test_directive_inside_function_body() {
    let diags = restrict("kernel void k(global int* a) {\n#include \"x.cl\"\n    a[0] = 1;\n}");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("'#include'"));
}

#[test]
fn test_extension_pragmas() {
    let diags = restrict(
        "#pragma OPENCL EXTENSION cl_khr_initialize_memory : enable\n#pragma OPENCL FP_CONTRACT ON\n#pragma unroll\nkernel void k() {\n}",
    );
    assert!(diags.is_empty(), "{:?}", diags);

    let diags = restrict(
        "#pragma OPENCL EXTENSION cl_khr_fp64 : enable\n#pragma OPENCL EXTENSION all : disable\n#pragma OPENCL EXTENSION cl_khr_fp16 : maybe\nkernel void k() {\n}",
    );
    assert_eq!(diags.len(), 3);
    assert!(diags[0].message.contains("'cl_khr_fp64'"));
    assert!(diags[1].message.contains("cannot be disabled"));
    assert!(diags[2].message.contains("malformed"));
}

#[test]
fn test_kernel_prototype_and_kernel_call() {
    let diags = restrict(
        "kernel void j(global int* a);\nkernel void j(global int* a) {\n    a[0] = 1;\n}\nkernel void k(global int* b) {\n    j(b);\n}",
    );
    assert_eq!(diags.len(), 2, "{:?}", diags);
    assert!(diags[0].message.contains("declaration of kernel 'j' without a body"));
    assert!(diags[1].message.contains("kernel 'j' cannot be called"));
}
