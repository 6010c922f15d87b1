use wclv::config::{FrontEndOptions, ValidatorConfig};
use wclv::diagnostic::DiagnosticKind;
use wclv::{validate, validate_with_options, ProgramStatus};

/// The JSON between the header comment markers.
fn header_json(program: &wclv::Program) -> serde_json::Value {
    let header = program.header().expect("accepted program has a header");
    let start = header.find('\n').unwrap() + 1;
    let end = header.rfind("*/").unwrap();
    serde_json::from_str(&header[start..end]).expect("header body is JSON")
}

#[test]
fn pointer_parameter_gets_size_parameter_and_clamp() {
    let program = validate("kernel void k(global int* a, uint i) { a[i] = 0; }");
    assert_eq!(program.status(), ProgramStatus::Accepted);

    let json = header_json(&program);
    assert_eq!(json["version"], "1.0");
    let a = &json["kernels"]["k"]["a"];
    assert_eq!(a["index"], 0);
    assert_eq!(a["type"], "int*");
    assert_eq!(a["address-space"], "global");
    assert_eq!(a["size-parameter"], "_wcl_a_size");
    assert_eq!(json["kernels"]["k"]["_wcl_a_size"]["index"], 1);
    assert_eq!(json["kernels"]["k"]["i"]["index"], 2);

    let source = program.validated_source().unwrap();
    assert!(source.contains("a[i % _wcl_a_size] = 0;"));
}

#[test]
fn signed_index_is_converted_before_clamping() {
    let program = validate("kernel void k(global int* a, int i) { a[i] = 0; }");
    let source = program.validated_source().unwrap();
    assert!(source.contains("a[(ulong)(i) % _wcl_a_size] = 0;"));
}

#[test]
fn struct_by_value_parameter_is_illegal() {
    let program = validate("struct S { int x; };\nkernel void k(struct S s) { }");
    assert_eq!(program.status(), ProgramStatus::Illegal);
    let violations: Vec<_> = program
        .diagnostics()
        .iter()
        .filter(|d| d.kind == DiagnosticKind::RestrictionViolation)
        .collect();
    assert_eq!(violations.len(), 1);
    assert!(program.validated_source().is_none());
}

#[test]
fn fixed_array_is_clamped_by_its_length() {
    let program = validate(
        "kernel void k(global int* out, uint j) {\n    int buf[8];\n    buf[j] = 1;\n    out[j] = buf[j];\n}",
    );
    assert_eq!(program.status(), ProgramStatus::Accepted);
    let source = program.validated_source().unwrap();
    assert!(source.contains("buf[j % 8] = 1;"));
    assert!(source.contains("out[j % _wcl_out_size] = buf[j % 8];"));
}

#[test]
fn zero_kernels_yield_empty_kernel_object() {
    let source = "constant int table[2] = { 1, 2 };\nint pick(uint i) { return table[i]; }\n";
    let program = validate(source);
    assert_eq!(program.status(), ProgramStatus::Accepted);
    let json = header_json(&program);
    assert!(json["kernels"].as_object().unwrap().is_empty());
    let output = program.validated_source().unwrap();
    let header = program.header().unwrap();
    assert!(output.starts_with(header));
    assert!(output.ends_with("int pick(uint i) { return table[i % 2]; }\n"));
}

#[test]
fn header_lists_kernels_and_parameters_in_source_order() {
    let program = validate(
        "kernel void zeta(global float* x, float s) { x[0] = s; }\nkernel void alpha(local int* tmp, constant int* lut) { tmp[0] = lut[0]; }",
    );
    let json = header_json(&program);
    let kernels: Vec<&String> = json["kernels"].as_object().unwrap().keys().collect();
    assert_eq!(kernels, ["zeta", "alpha"]);
    let params: Vec<&String> = json["kernels"]["alpha"].as_object().unwrap().keys().collect();
    assert_eq!(params, ["tmp", "_wcl_tmp_size", "lut", "_wcl_lut_size"]);
    assert_eq!(json["kernels"]["alpha"]["lut"]["address-space"], "constant");
    assert_eq!(json["kernels"]["alpha"]["tmp"]["address-space"], "local");
}

#[test]
fn same_input_gives_same_output() {
    let source = "kernel void k(global int* a, global int* b, int n) {\n    for (int i = 0; i < n; i++) {\n        a[b[i]] += *(b + i);\n    }\n}";
    let config = ValidatorConfig::webcl();
    let options = FrontEndOptions::from_args(&["-cl-std=CL1.2"]);
    let first = validate_with_options(source, &config, &options);
    let second = validate_with_options(source, &config, &options);
    assert_eq!(first.status(), second.status());
    assert_eq!(first.diagnostics(), second.diagnostics());
    assert_eq!(first.validated_source(), second.validated_source());
}

#[test]
fn moved_pointer_parameters_are_illegal() {
    for body in ["a += 100; a[0] = 1;", "a++; *a = 1;", "a = a + 7; *a = 1;"] {
        let program = validate(&format!("kernel void k(global int* a) {{ {} }}", body));
        assert_eq!(program.status(), ProgramStatus::Illegal, "{}", body);
        assert!(program.validated_source().is_none());
    }
}

#[test]
fn unchecked_preprocessor_input_is_illegal() {
    let sources = [
        "#define X(p) p[100]\nkernel void k(global int* a, global int* b) { b[0] = X(a); }",
        "#include \"evil.cl\"\nkernel void k(global int* a) { a[0] = 1; }",
        "#pragma OPENCL EXTENSION cl_khr_fp64 : enable\nkernel void k(global double* a) { a[0] = 1.0; }",
    ];
    for source in sources {
        let program = validate(source);
        assert_eq!(program.status(), ProgramStatus::Illegal, "{}", source);
        assert!(program
            .diagnostics()
            .iter()
            .any(|d| d.kind == DiagnosticKind::RestrictionViolation));
    }
}

#[test]
fn configured_extension_may_be_enabled() {
    let config = ValidatorConfig {
        extensions: vec!["cl_khr_fp64".to_string()],
        ..ValidatorConfig::webcl()
    };
    let program = validate_with_options(
        "#pragma OPENCL EXTENSION cl_khr_fp64 : enable\nkernel void k(global double* a) { a[0] = 1.0; }",
        &config,
        &FrontEndOptions::default(),
    );
    assert_eq!(program.status(), ProgramStatus::Accepted);
}

#[test]
fn kernel_prototypes_and_calls_are_illegal() {
    let program = validate(
        "kernel void j(global int* a);\nkernel void k(global int* b) { j(b); }\nkernel void j(global int* a) { a[0] = 1; }",
    );
    assert_eq!(program.status(), ProgramStatus::Illegal);
    let violations = program
        .diagnostics()
        .iter()
        .filter(|d| d.kind == DiagnosticKind::RestrictionViolation)
        .count();
    assert_eq!(violations, 2);
}

#[test]
fn signed_size_type_is_rejected() {
    let config = ValidatorConfig {
        size_parameter_type: "int".to_string(),
        ..ValidatorConfig::webcl()
    };
    let program = validate_with_options(
        "kernel void k(global int* a, int i) { a[i] = 0; }",
        &config,
        &FrontEndOptions::default(),
    );
    assert_eq!(program.status(), ProgramStatus::Illegal);
    assert!(program.diagnostics()[0]
        .message
        .contains("size_parameter_type 'int'"));
}
