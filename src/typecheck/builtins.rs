//! Knowledge about OpenCL C builtin functions.

use crate::types::{ScalarKind, Ty};

/// Builtins that have no safe equivalent in the sandbox.
const UNSUPPORTED: &[&str] = &[
    "async_work_group_copy",
    "async_work_group_strided_copy",
    "wait_group_events",
    "prefetch",
];

/// Builtins with an output pointer argument.
const POINTER_WRITERS: &[&str] = &["fract", "frexp", "lgamma_r", "modf", "remquo", "sincos"];

/// Builtins whose result has the type of their first argument.
const GENTYPE_FUNCTIONS: &[&str] = &[
    "abs", "acos", "acosh", "asin", "asinh", "atan", "atan2", "atanh", "cbrt", "ceil", "clamp",
    "copysign", "cos", "cosh", "cross", "degrees", "erf", "erfc", "exp", "exp10", "exp2", "expm1",
    "fabs", "fdim", "floor", "fma", "fmax", "fmin", "fmod", "hypot", "ldexp", "lgamma", "log",
    "log10", "log1p", "log2", "logb", "mad", "mad24", "max", "min", "mix", "mul24", "nextafter",
    "normalize", "pow", "pown", "powr", "radians", "rint", "rootn", "round", "rsqrt", "select",
    "sign", "sin", "sinh", "sinpi", "smoothstep", "sqrt", "step", "tan", "tanh", "tgamma",
    "trunc", "rotate", "clz", "popcount", "hadd", "rhadd", "add_sat", "sub_sat", "mul_hi",
    "fast_normalize", "fract", "frexp", "lgamma_r", "modf", "remquo", "sincos", "remainder",
    "bitselect", "cospi", "tanpi", "acospi", "asinpi", "atanpi", "atan2pi",
];

pub fn is_unsupported(name: &str) -> bool {
    UNSUPPORTED.contains(&name)
}

/// Whether a builtin reads or writes memory through a pointer argument.
pub fn accesses_through_pointer(name: &str) -> bool {
    POINTER_WRITERS.contains(&name)
        || name.starts_with("vload")
        || name.starts_with("vstore")
        || name.starts_with("atomic_")
        || name.starts_with("atom_")
}

/// `write_imagef`, `write_imagei`, `write_imageui`, `write_imageh`.
pub fn is_image_write(name: &str) -> bool {
    name.starts_with("write_image")
}

/// Return type of a known builtin, given the argument types.
pub(crate) fn return_type(name: &str, args: &[Ty]) -> Option<Ty> {
    let first = args.first();
    match name {
        "get_global_id" | "get_local_id" | "get_group_id" | "get_global_size"
        | "get_local_size" | "get_num_groups" | "get_global_offset" => {
            return Some(Ty::Scalar(ScalarKind::ULong))
        }
        "get_work_dim" => return Some(Ty::Scalar(ScalarKind::UInt)),
        "barrier" | "mem_fence" | "read_mem_fence" | "write_mem_fence" | "printf" => {
            return Some(Ty::Void)
        }
        "read_imagef" => return Some(Ty::Vector(ScalarKind::Float, 4)),
        "read_imagei" => return Some(Ty::Vector(ScalarKind::Int, 4)),
        "read_imageui" => return Some(Ty::Vector(ScalarKind::UInt, 4)),
        "read_imageh" => return Some(Ty::Vector(ScalarKind::Half, 4)),
        "get_image_width" | "get_image_height" | "get_image_depth"
        | "get_image_channel_data_type" | "get_image_channel_order" => return Some(Ty::int()),
        "get_image_dim" => return Some(Ty::Vector(ScalarKind::Int, 2)),
        "any" | "all" | "isnan" | "isinf" | "isfinite" | "signbit" | "isequal"
        | "isnotequal" | "isgreater" | "isless" => return Some(Ty::int()),
        "dot" | "length" | "distance" | "fast_length" | "fast_distance" => {
            return match first {
                Some(Ty::Vector(kind, _)) => Some(Ty::Scalar(*kind)),
                Some(ty @ Ty::Scalar(_)) => Some(ty.clone()),
                _ => Some(Ty::Unknown),
            }
        }
        _ => {}
    }

    if is_image_write(name) || name.starts_with("vstore") {
        return Some(Ty::Void);
    }
    if name.starts_with("vload") {
        return Some(vload_type(name, args));
    }
    if name.starts_with("atomic_") || name.starts_with("atom_") {
        return Some(
            first
                .and_then(|t| t.element_type())
                .unwrap_or(Ty::Unknown),
        );
    }
    if let Some(rest) = name.strip_prefix("convert_") {
        let target = rest.split('_').next().unwrap_or(rest);
        return Ty::from_builtin_name(target);
    }
    if let Some(target) = name.strip_prefix("as_") {
        return Ty::from_builtin_name(target);
    }

    let base = name
        .strip_prefix("native_")
        .or_else(|| name.strip_prefix("half_"))
        .unwrap_or(name);
    if GENTYPE_FUNCTIONS.contains(&base) {
        return Some(match first {
            Some(ty) if ty.is_arithmetic() => ty.clone(),
            _ => Ty::Unknown,
        });
    }
    None
}

/// `vloadN(offset, p)` yields an N-vector of `p`'s element type;
/// `vload_half[N]` yields floats.
fn vload_type(name: &str, args: &[Ty]) -> Ty {
    if let Some(width) = name.strip_prefix("vload_half") {
        return match width.parse::<u8>() {
            Ok(n) => Ty::Vector(ScalarKind::Float, n),
            Err(_) => Ty::Scalar(ScalarKind::Float),
        };
    }
    let width = name.trim_start_matches("vload").parse::<u8>().ok();
    let elem = args.get(1).and_then(|t| t.element_type());
    match (width, elem) {
        (Some(n), Some(Ty::Scalar(kind))) => Ty::Vector(kind, n),
        _ => Ty::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddressSpace;

    #[test]
    fn test_classification() {
        assert!(is_unsupported("async_work_group_copy"));
        assert!(!is_unsupported("barrier"));
        assert!(accesses_through_pointer("vstore4"));
        assert!(accesses_through_pointer("atomic_add"));
        assert!(accesses_through_pointer("sincos"));
        assert!(!accesses_through_pointer("sin"));
        assert!(is_image_write("write_imagef"));
    }

    #[test]
    fn test_return_types() {
        assert_eq!(
            return_type("get_global_id", &[Ty::int()]),
            Some(Ty::Scalar(ScalarKind::ULong))
        );
        let f4 = Ty::Vector(ScalarKind::Float, 4);
        assert_eq!(return_type("sqrt", &[f4.clone()]), Some(f4.clone()));
        assert_eq!(
            return_type("dot", &[f4.clone(), f4.clone()]),
            Some(Ty::Scalar(ScalarKind::Float))
        );
        assert_eq!(
            return_type("convert_int4_sat", &[f4.clone()]),
            Some(Ty::Vector(ScalarKind::Int, 4))
        );
        assert_eq!(return_type("native_sin", &[Ty::Scalar(ScalarKind::Float)]), Some(Ty::Scalar(ScalarKind::Float)));
        assert_eq!(return_type("my_helper", &[]), None);
    }

    #[test]
    fn test_vload_element_type() {
        let p = Ty::Pointer {
            pointee: Box::new(Ty::Scalar(ScalarKind::Float)),
            space: AddressSpace::Global,
        };
        assert_eq!(
            return_type("vload4", &[Ty::Scalar(ScalarKind::ULong), p]),
            Some(f4())
        );
    }

    fn f4() -> Ty {
        Ty::Vector(ScalarKind::Float, 4)
    }
}
