//! The JSON header prepended to validated sources.
//!
//! The header is a C comment whose body is a JSON object describing the
//! parameter list of every kernel, so a host can bind arguments (including
//! the synthesized size parameters) by index.

use crate::config::ValidatorConfig;
use crate::passes::{KernelDescriptor, KernelParameter, ParameterKind};

pub const HEADER_VERSION: &str = "1.0";

/// Render the header comment. The text ends with a newline.
pub fn emit_header(kernels: &[KernelDescriptor], config: &ValidatorConfig) -> String {
    let mut w = HeaderWriter {
        out: String::new(),
        indentation: &config.indentation,
        level: 0,
    };
    w.out.push_str("/* ");
    w.out.push_str(&config.header_title);
    w.out.push('\n');
    w.open();
    w.entries(|w| {
        w.string_entry("version", HEADER_VERSION);
        w.separator();
        w.key("kernels");
        w.open();
        w.entries(|w| {
            for (i, kernel) in kernels.iter().enumerate() {
                if i > 0 {
                    w.separator();
                }
                w.kernel(kernel);
            }
        });
        w.close();
    });
    w.close();
    w.out.push_str("*/\n");
    w.out
}

struct HeaderWriter<'c> {
    out: String,
    indentation: &'c str,
    level: usize,
}

impl HeaderWriter<'_> {
    fn indent(&mut self) {
        for _ in 0..self.level {
            self.out.push_str(self.indentation);
        }
    }

    /// `{` on its own line, one level deeper for the entries.
    fn open(&mut self) {
        self.indent();
        self.out.push_str("{\n");
    }

    fn close(&mut self) {
        self.indent();
        self.out.push_str("}\n");
    }

    /// Write the entries of an object one level deeper; the last entry
    /// gets its line break here.
    fn entries(&mut self, body: impl FnOnce(&mut Self)) {
        self.level += 1;
        let before = self.out.len();
        body(self);
        if self.out.len() > before && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.level -= 1;
    }

    fn separator(&mut self) {
        // nested objects end with "}\n"; the comma goes after the brace
        if self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out.push_str(",\n");
    }

    fn key(&mut self, key: &str) {
        self.indent();
        self.out.push_str(&quote(key));
        self.out.push_str(" :\n");
    }

    fn string_entry(&mut self, key: &str, value: &str) {
        self.indent();
        self.out.push_str(&format!("{} : {}", quote(key), quote(value)));
    }

    fn number_entry(&mut self, key: &str, value: usize) {
        self.indent();
        self.out.push_str(&format!("{} : {}", quote(key), value));
    }

    fn kernel(&mut self, kernel: &KernelDescriptor) {
        self.key(&kernel.name);
        self.open();
        self.entries(|w| {
            for (i, param) in kernel.parameters.iter().enumerate() {
                if i > 0 {
                    w.separator();
                }
                w.parameter(param);
            }
        });
        self.close();
    }

    fn parameter(&mut self, param: &KernelParameter) {
        self.key(&param.name);
        self.open();
        self.entries(|w| {
            w.number_entry("index", param.index);
            w.separator();
            w.string_entry("type", &param.type_name);
            match &param.kind {
                ParameterKind::Image { access } => {
                    w.separator();
                    w.string_entry("access", access.as_str());
                }
                ParameterKind::Pointer {
                    address_space,
                    size_parameter,
                } => {
                    w.separator();
                    w.string_entry("address-space", address_space.as_str());
                    w.separator();
                    w.string_entry("size-parameter", size_parameter);
                }
                ParameterKind::Sampler
                | ParameterKind::Primitive
                | ParameterKind::SizeCompanion { .. } => {}
            }
        });
        self.close();
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::ImageAccess;
    use crate::types::AddressSpace;

    fn body(header: &str) -> &str {
        let start = header.find('\n').unwrap() + 1;
        let end = header.rfind("*/").unwrap();
        &header[start..end]
    }

    fn pointer_kernel() -> KernelDescriptor {
        KernelDescriptor {
            name: "k".to_string(),
            parameters: vec![
                KernelParameter {
                    name: "a".to_string(),
                    index: 0,
                    type_name: "int*".to_string(),
                    kind: ParameterKind::Pointer {
                        address_space: AddressSpace::Global,
                        size_parameter: "_wcl_a_size".to_string(),
                    },
                },
                KernelParameter {
                    name: "_wcl_a_size".to_string(),
                    index: 1,
                    type_name: "ulong".to_string(),
                    kind: ParameterKind::SizeCompanion {
                        owner: "a".to_string(),
                    },
                },
                KernelParameter {
                    name: "i".to_string(),
                    index: 2,
                    type_name: "uint".to_string(),
                    kind: ParameterKind::Primitive,
                },
            ],
        }
    }

    #[test]
    fn test_empty_kernel_set() {
        let header = emit_header(&[], &ValidatorConfig::webcl());
        assert_eq!(
            header,
            "/* WebCL Validator JSON header\n{\n    \"version\" : \"1.0\",\n    \"kernels\" :\n    {\n    }\n}\n*/\n"
        );
    }

    #[test]
    fn test_pointer_parameter_layout() {
        let header = emit_header(&[pointer_kernel()], &ValidatorConfig::webcl());
        let expected = r#"/* WebCL Validator JSON header
{
    "version" : "1.0",
    "kernels" :
    {
        "k" :
        {
            "a" :
            {
                "index" : 0,
                "type" : "int*",
                "address-space" : "global",
                "size-parameter" : "_wcl_a_size"
            },
            "_wcl_a_size" :
            {
                "index" : 1,
                "type" : "ulong"
            },
            "i" :
            {
                "index" : 2,
                "type" : "uint"
            }
        }
    }
}
*/
"#;
        assert_eq!(header, expected);
    }

    #[test]
    fn test_body_is_json_in_declaration_order() {
        let image = KernelDescriptor {
            name: "blur".to_string(),
            parameters: vec![KernelParameter {
                name: "dst".to_string(),
                index: 0,
                type_name: "image2d_t".to_string(),
                kind: ParameterKind::Image {
                    access: ImageAccess::WriteOnly,
                },
            }],
        };
        let empty = KernelDescriptor {
            name: "noop".to_string(),
            parameters: vec![],
        };
        let header = emit_header(&[pointer_kernel(), image, empty], &ValidatorConfig::webcl());
        let json: serde_json::Value = serde_json::from_str(body(&header)).unwrap();
        let kernels = json["kernels"].as_object().unwrap();
        let names: Vec<&String> = kernels.keys().collect();
        assert_eq!(names, ["k", "blur", "noop"]);
        let params: Vec<&String> = kernels["k"].as_object().unwrap().keys().collect();
        assert_eq!(params, ["a", "_wcl_a_size", "i"]);
        assert_eq!(kernels["blur"]["dst"]["access"], "write_only");
        assert!(kernels["noop"].as_object().unwrap().is_empty());
    }
}
