use serde::Serialize;

use crate::ast::RecordDef;

/// OpenCL C scalar types, in increasing conversion rank within each family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarKind {
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Half,
    Float,
    Double,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::UChar => "uchar",
            ScalarKind::Short => "short",
            ScalarKind::UShort => "ushort",
            ScalarKind::Int => "int",
            ScalarKind::UInt => "uint",
            ScalarKind::Long => "long",
            ScalarKind::ULong => "ulong",
            ScalarKind::Half => "half",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<ScalarKind> {
        match name {
            "bool" => Some(ScalarKind::Bool),
            "char" => Some(ScalarKind::Char),
            "uchar" => Some(ScalarKind::UChar),
            "short" => Some(ScalarKind::Short),
            "ushort" => Some(ScalarKind::UShort),
            "int" => Some(ScalarKind::Int),
            "uint" => Some(ScalarKind::UInt),
            "long" => Some(ScalarKind::Long),
            "ulong" => Some(ScalarKind::ULong),
            "half" => Some(ScalarKind::Half),
            "float" => Some(ScalarKind::Float),
            "double" => Some(ScalarKind::Double),
            // builtin typedefs, reduced to their canonical types
            "size_t" | "uintptr_t" => Some(ScalarKind::ULong),
            "ptrdiff_t" | "intptr_t" => Some(ScalarKind::Long),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarKind::Half | ScalarKind::Float | ScalarKind::Double)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            ScalarKind::Bool
                | ScalarKind::UChar
                | ScalarKind::UShort
                | ScalarKind::UInt
                | ScalarKind::ULong
        )
    }

    /// Integer conversion rank (signed and unsigned variants share a rank).
    fn rank(&self) -> u8 {
        match self {
            ScalarKind::Bool => 0,
            ScalarKind::Char | ScalarKind::UChar => 1,
            ScalarKind::Short | ScalarKind::UShort => 2,
            ScalarKind::Int | ScalarKind::UInt => 3,
            ScalarKind::Long | ScalarKind::ULong => 4,
            ScalarKind::Half => 5,
            ScalarKind::Float => 6,
            ScalarKind::Double => 7,
        }
    }

    /// The unsigned counterpart of a signed integer kind.
    pub fn to_unsigned(self) -> ScalarKind {
        match self {
            ScalarKind::Char => ScalarKind::UChar,
            ScalarKind::Short => ScalarKind::UShort,
            ScalarKind::Int => ScalarKind::UInt,
            ScalarKind::Long => ScalarKind::ULong,
            other => other,
        }
    }

    /// Integer promotion: everything narrower than `int` becomes `int`.
    pub fn promote(self) -> ScalarKind {
        if self.is_integer() && self.rank() < ScalarKind::Int.rank() {
            ScalarKind::Int
        } else {
            self
        }
    }

    /// Usual arithmetic conversions.
    pub fn common(self, other: ScalarKind) -> ScalarKind {
        if self.is_float() || other.is_float() {
            return if self.rank() >= other.rank() { self } else { other };
        }
        let (a, b) = (self.promote(), other.promote());
        if a == b {
            return a;
        }
        if a.is_unsigned() == b.is_unsigned() {
            return if a.rank() >= b.rank() { a } else { b };
        }
        let (unsigned, signed) = if a.is_unsigned() { (a, b) } else { (b, a) };
        if unsigned.rank() >= signed.rank() {
            unsigned
        } else {
            signed
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressSpace {
    Global,
    Constant,
    Local,
    Private,
}

impl AddressSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressSpace::Global => "global",
            AddressSpace::Constant => "constant",
            AddressSpace::Local => "local",
            AddressSpace::Private => "private",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageDim {
    Image1d,
    Image1dBuffer,
    Image1dArray,
    Image2d,
    Image2dArray,
    Image3d,
}

impl ImageDim {
    pub fn name(&self) -> &'static str {
        match self {
            ImageDim::Image1d => "image1d_t",
            ImageDim::Image1dBuffer => "image1d_buffer_t",
            ImageDim::Image1dArray => "image1d_array_t",
            ImageDim::Image2d => "image2d_t",
            ImageDim::Image2dArray => "image2d_array_t",
            ImageDim::Image3d => "image3d_t",
        }
    }

    fn from_name(name: &str) -> Option<ImageDim> {
        match name {
            "image1d_t" => Some(ImageDim::Image1d),
            "image1d_buffer_t" => Some(ImageDim::Image1dBuffer),
            "image1d_array_t" => Some(ImageDim::Image1dArray),
            "image2d_t" => Some(ImageDim::Image2d),
            "image2d_array_t" => Some(ImageDim::Image2dArray),
            "image3d_t" => Some(ImageDim::Image3d),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Struct,
    Union,
}

impl RecordKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RecordKind::Struct => "struct",
            RecordKind::Union => "union",
        }
    }
}

/// Semantic types of the OpenCL C subset (distinct from source spellings).
///
/// Typedefs are resolved at parse time and cv-qualifiers are not tracked, so
/// two equal `Ty` values always denote the same canonical type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Void,
    Scalar(ScalarKind),
    /// Vector of 2, 3, 4, 8 or 16 scalars.
    Vector(ScalarKind, u8),
    Pointer {
        pointee: Box<Ty>,
        space: AddressSpace,
    },
    /// Fixed-length array; `None` for `T x[]`.
    Array {
        elem: Box<Ty>,
        len: Option<u64>,
    },
    /// Index into `TranslationUnit::records`.
    Record {
        kind: RecordKind,
        id: usize,
    },
    Image(ImageDim),
    Sampler,
    Event,
    /// Result of an unknown builtin, or of an erroneous expression.
    Unknown,
}

impl Ty {
    pub fn int() -> Ty {
        Ty::Scalar(ScalarKind::Int)
    }

    /// Resolve a builtin type name such as `int`, `float4`, `size_t` or `image2d_t`.
    pub fn from_builtin_name(name: &str) -> Option<Ty> {
        if name == "void" {
            return Some(Ty::Void);
        }
        if name == "sampler_t" {
            return Some(Ty::Sampler);
        }
        if name == "event_t" {
            return Some(Ty::Event);
        }
        if let Some(dim) = ImageDim::from_name(name) {
            return Some(Ty::Image(dim));
        }
        if let Some(kind) = ScalarKind::from_name(name) {
            return Some(Ty::Scalar(kind));
        }
        let split = name.find(|c: char| c.is_ascii_digit())?;
        let (base, width) = name.split_at(split);
        let kind = ScalarKind::from_name(base)?;
        if kind == ScalarKind::Bool || base.ends_with("_t") {
            return None;
        }
        match width.parse::<u8>() {
            Ok(n @ (2 | 3 | 4 | 8 | 16)) => Some(Ty::Vector(kind, n)),
            _ => None,
        }
    }

    /// Whether this is a structure or union type.
    pub fn is_structure(&self) -> bool {
        matches!(self, Ty::Record { .. })
    }

    /// Element count of a fixed-length array or vector.
    pub fn known_array_len(&self) -> Option<u64> {
        match self {
            Ty::Array { len, .. } => *len,
            Ty::Vector(_, n) => Some(u64::from(*n)),
            _ => None,
        }
    }

    /// Address space of a pointer type.
    pub fn pointer_space(&self) -> Option<AddressSpace> {
        match self {
            Ty::Pointer { space, .. } => Some(*space),
            _ => None,
        }
    }

    /// Dimensionality of an image type.
    pub fn image_dim(&self) -> Option<ImageDim> {
        match self {
            Ty::Image(dim) => Some(*dim),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Ty::Pointer { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Ty::Image(_))
    }

    pub fn is_sampler(&self) -> bool {
        matches!(self, Ty::Sampler)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Ty::Scalar(k) if k.is_integer())
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(self, Ty::Scalar(k) if k.is_integer() && k.is_unsigned())
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Ty::Scalar(_) | Ty::Vector(..))
    }

    /// Type of `x[i]` for arrays, pointers and vectors.
    pub fn element_type(&self) -> Option<Ty> {
        match self {
            Ty::Array { elem, .. } => Some((**elem).clone()),
            Ty::Pointer { pointee, .. } => Some((**pointee).clone()),
            Ty::Vector(kind, _) => Some(Ty::Scalar(*kind)),
            _ => None,
        }
    }

    /// Array-to-pointer decay; other types are unchanged.
    pub fn decay(&self, space: AddressSpace) -> Ty {
        match self {
            Ty::Array { elem, .. } => Ty::Pointer {
                pointee: elem.clone(),
                space,
            },
            other => other.clone(),
        }
    }

    /// Result type of a binary arithmetic operator.
    pub fn arithmetic_result(lhs: &Ty, rhs: &Ty) -> Ty {
        match (lhs, rhs) {
            (Ty::Vector(..), _) => lhs.clone(),
            (_, Ty::Vector(..)) => rhs.clone(),
            (Ty::Scalar(a), Ty::Scalar(b)) => Ty::Scalar(a.common(*b)),
            _ => Ty::Unknown,
        }
    }

    /// Canonical spelling: typedefs reduced, address spaces dropped,
    /// `unsigned int` spelled `uint`, pointers spelled `int*`.
    pub fn canonical_name(&self, records: &[RecordDef]) -> String {
        match self {
            Ty::Void => "void".to_string(),
            Ty::Scalar(kind) => kind.name().to_string(),
            Ty::Vector(kind, n) => format!("{}{}", kind.name(), n),
            Ty::Pointer { pointee, .. } => format!("{}*", pointee.canonical_name(records)),
            Ty::Array { elem, len } => match len {
                Some(n) => format!("{}[{}]", elem.canonical_name(records), n),
                None => format!("{}[]", elem.canonical_name(records)),
            },
            Ty::Record { kind, id } => match records.get(*id) {
                Some(def) => def.display_name(),
                None => format!("{} (anonymous)", kind.keyword()),
            },
            Ty::Image(dim) => dim.name().to_string(),
            Ty::Sampler => "sampler_t".to_string(),
            Ty::Event => "event_t".to_string(),
            Ty::Unknown => "<unknown>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert_eq!(Ty::from_builtin_name("uint"), Some(Ty::Scalar(ScalarKind::UInt)));
        assert_eq!(Ty::from_builtin_name("size_t"), Some(Ty::Scalar(ScalarKind::ULong)));
        assert_eq!(
            Ty::from_builtin_name("float4"),
            Some(Ty::Vector(ScalarKind::Float, 4))
        );
        assert_eq!(Ty::from_builtin_name("int5"), None);
        assert_eq!(Ty::from_builtin_name("size_t2"), None);
        assert_eq!(
            Ty::from_builtin_name("image3d_t"),
            Some(Ty::Image(ImageDim::Image3d))
        );
        assert_eq!(Ty::from_builtin_name("foo"), None);
    }

    #[test]
    fn test_queries() {
        let arr = Ty::Array {
            elem: Box::new(Ty::int()),
            len: Some(8),
        };
        assert_eq!(arr.known_array_len(), Some(8));
        assert_eq!(Ty::Vector(ScalarKind::Float, 4).known_array_len(), Some(4));
        let ptr = Ty::Pointer {
            pointee: Box::new(Ty::int()),
            space: AddressSpace::Global,
        };
        assert_eq!(ptr.pointer_space(), Some(AddressSpace::Global));
        assert_eq!(ptr.known_array_len(), None);
        assert!(Ty::Record {
            kind: RecordKind::Struct,
            id: 0
        }
        .is_structure());
    }

    #[test]
    fn test_canonical_pointer_drops_address_space() {
        let ptr = Ty::Pointer {
            pointee: Box::new(Ty::Scalar(ScalarKind::UInt)),
            space: AddressSpace::Constant,
        };
        assert_eq!(ptr.canonical_name(&[]), "uint*");
    }

    #[test]
    fn test_usual_arithmetic_conversions() {
        use ScalarKind::*;
        assert_eq!(Char.common(Short), Int);
        assert_eq!(Int.common(UInt), UInt);
        assert_eq!(Long.common(UInt), Long);
        assert_eq!(ULong.common(Int), ULong);
        assert_eq!(Int.common(Float), Float);
        assert_eq!(Double.common(Float), Double);
    }
}
