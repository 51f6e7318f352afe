use super::types::{FloatKind, IntKind, Type};

#[test]
fn test_builtin_lookup() {
    assert_eq!(Type::builtin("i32"), Some(Type::Int(IntKind::I32)));
    assert_eq!(Type::builtin("f64"), Some(Type::Float(FloatKind::F64)));
    assert_eq!(Type::builtin("Point"), None);
}

#[test]
fn test_canonical_strips_aliases() {
    let alias = Type::Alias {
        name: "Size".to_string(),
        target: Box::new(Type::Alias {
            name: "Inner".to_string(),
            target: Box::new(Type::Int(IntKind::U64)),
        }),
    };

    assert_eq!(alias.canonical(), &Type::Int(IntKind::U64));
    assert!(alias.is_integer());
    assert!(alias.same_as(&Type::Int(IntKind::U64)));
    assert_eq!(alias.to_string(), "Size");
}

#[test]
fn test_classification() {
    assert!(Type::ComptimeInt.is_integer());
    assert!(Type::Float(FloatKind::F32).is_number());
    assert!(!Type::Bool.is_number());
    assert!(Type::void_pointer().is_pointer());
    assert!(Type::Int(IntKind::I8).may_negate());
    assert!(!Type::Int(IntKind::U8).may_negate());
    assert!(!Type::String.may_negate());
}

#[test]
fn test_int_wrap() {
    assert_eq!(IntKind::U8.wrap(256), 0);
    assert_eq!(IntKind::U8.wrap(-1), 255);
    assert_eq!(IntKind::I8.wrap(128), -128);
    assert_eq!(IntKind::I32.wrap(5), 5);
    assert_eq!(IntKind::I64.wrap(i64::MAX as i128 + 1), i64::MIN as i128);
    assert_eq!(IntKind::U64.wrap(-1), u64::MAX as i128);
}

#[test]
fn test_int_ranges() {
    assert!(IntKind::I8.contains(-128));
    assert!(!IntKind::I8.contains(128));
    assert!(IntKind::U16.contains(65535));
    assert!(!IntKind::U16.contains(-1));
}

#[test]
fn test_promotion() {
    let i32_ = Type::Int(IntKind::I32);
    let u64_ = Type::Int(IntKind::U64);
    let f32_ = Type::Float(FloatKind::F32);

    assert_eq!(Type::promote(&Type::ComptimeInt, &Type::ComptimeInt), Some(Type::ComptimeInt));
    assert_eq!(Type::promote(&Type::ComptimeInt, &i32_), Some(i32_.clone()));
    assert_eq!(Type::promote(&i32_, &u64_), Some(u64_.clone()));
    assert_eq!(
        Type::promote(&Type::Int(IntKind::I32), &Type::Int(IntKind::U32)),
        Some(Type::Int(IntKind::U32))
    );
    assert_eq!(Type::promote(&i32_, &f32_), Some(f32_.clone()));
    assert_eq!(
        Type::promote(&Type::ComptimeFloat, &i32_),
        Some(Type::Float(FloatKind::F64))
    );
    assert_eq!(Type::promote(&Type::Bool, &i32_), None);
}

#[test]
fn test_display_names() {
    assert_eq!(Type::pointer_to(Type::Int(IntKind::U8)).to_string(), "u8*");
    assert_eq!(Type::Array(Box::new(Type::Bool), 4).to_string(), "bool[4]");
    assert_eq!(Type::VarArray(Box::new(Type::String)).to_string(), "string[]");
}
