use crate::config::{FrontEndOptions, ValidatorConfig};
use crate::diagnostic::{DiagnosticKind, Severity};
use crate::*;

#[test]
fn test_pointer_kernel_is_accepted_and_rewritten() {
    let program = validate("kernel void k(global int* a, uint i) { a[i] = 0; }");
    assert_eq!(program.status(), ProgramStatus::Accepted);
    let output = program.validated_source().unwrap();
    assert!(output.starts_with("/* WebCL Validator JSON header\n"));
    assert!(output.ends_with(
        "*/\nkernel void k(global int* a, ulong _wcl_a_size, uint i) { a[i % _wcl_a_size] = 0; }"
    ));
}

#[test]
fn test_struct_parameter_is_illegal() {
    let program = validate("typedef struct { int x; } S;\nkernel void k(S s) { }");
    assert_eq!(program.status(), ProgramStatus::Illegal);
    assert_eq!(program.diagnostic_count(), 1);
    assert_eq!(
        program.diagnostic_at(0).unwrap().kind,
        DiagnosticKind::RestrictionViolation
    );
    assert!(program.validated_source().is_none());
    assert!(program.header().is_none());
    assert_eq!(program.kernel_count(), 0);
}

#[test]
fn test_zero_kernels_keep_the_source() {
    let source = "int twice(int x) { return x * 2; }\n";
    let program = validate(source);
    assert_eq!(program.status(), ProgramStatus::Accepted);
    let header = program.header().unwrap();
    assert!(header.contains("\"kernels\" :\n    {\n    }\n"));
    assert_eq!(
        program.validated_source().unwrap(),
        format!("{}{}", header, source)
    );
}

#[test]
fn test_front_end_errors_stop_the_pipeline() {
    let program = validate("kernel void k(global int* a) { a[0] = y; }");
    assert_eq!(program.status(), ProgramStatus::Illegal);
    assert!(program
        .diagnostics()
        .iter()
        .all(|d| d.kind == DiagnosticKind::FrontEnd));

    let program = validate("kernel void k(global int* a) { a[0] = 1 }");
    assert_eq!(program.status(), ProgramStatus::Illegal);
}

#[test]
fn test_unresolvable_bound_is_illegal() {
    let program = validate("kernel void k(global int* a) { global int* q = a; q[1] = 0; }");
    assert_eq!(program.status(), ProgramStatus::Illegal);
    assert_eq!(
        program.diagnostic_at(0).unwrap().kind,
        DiagnosticKind::UnresolvableBound
    );
    assert!(program.validated_source().is_none());
}

#[test]
fn test_warnings_are_accepted() {
    let program = validate("kernel void k(global int* a) { a[0]; }");
    assert_eq!(program.status(), ProgramStatus::AcceptedWithWarnings);
    assert_eq!(program.diagnostic_at(0).unwrap().severity, Severity::Warning);
    assert!(program.validated_source().is_some());
}

#[test]
fn test_front_end_options() {
    let source = "kernel void k(global int* a) { a[0]; }";
    let config = ValidatorConfig::webcl();

    let werror = FrontEndOptions::from_args(&["-Werror"]);
    let program = validate_with_options(source, &config, &werror);
    assert_eq!(program.status(), ProgramStatus::Illegal);

    let quiet = FrontEndOptions::from_args(&["-w"]);
    let program = validate_with_options(source, &config, &quiet);
    assert_eq!(program.status(), ProgramStatus::Accepted);

    let unknown = FrontEndOptions::from_args(&["-cl-fast-relaxed-math"]);
    let program = validate_with_options("kernel void k() { }", &config, &unknown);
    assert_eq!(program.status(), ProgramStatus::AcceptedWithWarnings);
    assert!(program.diagnostic_at(0).unwrap().message.contains("-cl-fast-relaxed-math"));
}

#[test]
fn test_custom_prefix_and_size_type() {
    let config = ValidatorConfig {
        variable_prefix: "_sbx".to_string(),
        size_parameter_type: "uint".to_string(),
        ..ValidatorConfig::webcl()
    };
    let program = validate_with_options(
        "kernel void k(global int* a, int i) { a[i] = 0; }",
        &config,
        &FrontEndOptions::default(),
    );
    let output = program.validated_source().unwrap();
    assert!(output.contains("global int* a, uint _sbx_a_size, int i"));
    assert!(output.contains("a[(uint)(i) % _sbx_a_size]"));
}

#[test]
fn test_validation_is_deterministic() {
    let source = "kernel void k(global float* p, int i) { *(p + i) = p[i + 1]; }\nkernel void j(global int* q) { q[0] = 1; }";
    let first = validate(source);
    let second = validate(source);
    assert_eq!(first.validated_source(), second.validated_source());
    assert_eq!(first.diagnostics(), second.diagnostics());
}
