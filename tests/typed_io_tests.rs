//! Typed reads and writes through archive handles.

mod common;

use sciarchive::{
    Archive, Bool, Complex64, ComplexOp, Dimensions, Error, Hyperslab, NativeKind, OpenMode,
};

macro_rules! round_trip {
    ($ar:expr, $name:expr, $ty:ty, [$($v:expr),+ $(,)?]) => {{
        let values: Vec<$ty> = vec![$($v),+];
        let array = format!("/kinds/{}/array", $name);
        let scalar = format!("/kinds/{}/scalar", $name);

        $ar.write_array(&array, &values).unwrap();
        $ar.write_scalar(&scalar, values[0]).unwrap();

        assert_eq!($ar.read_array::<$ty>(&array).unwrap(), values);
        assert_eq!($ar.read_scalar::<$ty>(&scalar).unwrap(), values[0]);
        assert!($ar.is_datatype::<$ty>(&array).unwrap());
        assert_eq!($ar.extent(&array).unwrap(), Dimensions::d1(values.len()));
        assert!($ar.is_scalar(&scalar));
    }};
}

#[test]
fn test_every_native_kind_round_trips() {
    let (_dir, path) = common::scratch("kinds.dat");
    {
        let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
        round_trip!(ar, "bool", Bool, [Bool::TRUE, Bool::FALSE, Bool::TRUE]);
        round_trip!(ar, "u8", u8, [0, 1, u8::MAX]);
        round_trip!(ar, "i8", i8, [i8::MIN, -1, i8::MAX]);
        round_trip!(ar, "u16", u16, [0, 300, u16::MAX]);
        round_trip!(ar, "i16", i16, [i16::MIN, 0, i16::MAX]);
        round_trip!(ar, "u32", u32, [0, 70_000, u32::MAX]);
        round_trip!(ar, "i32", i32, [i32::MIN, -5, i32::MAX]);
        round_trip!(ar, "u64", u64, [0, 1 << 40, u64::MAX]);
        round_trip!(ar, "i64", i64, [i64::MIN, -7, i64::MAX]);
        round_trip!(ar, "f32", f32, [f32::MIN_POSITIVE, -0.0, 1.5e30]);
        round_trip!(ar, "f64", f64, [f64::EPSILON, -2.5, f64::MAX]);
        round_trip!(ar, "c64", Complex64, [Complex64::new(1.0, -2.0), Complex64::new(0.5, 0.25)]);
        round_trip!(
            ar,
            "cop",
            ComplexOp,
            [ComplexOp::new(1.0, 2.0, 3.0, 4.0), ComplexOp::outer(Complex64::new(1.0, 1.0), Complex64::new(2.0, -1.0))]
        );
        ar.write_str("/kinds/text/value", "Ising, L=16").unwrap();
    }

    // bit-exact after a trip through the file
    let ar = Archive::open(&path, OpenMode::READ).unwrap();
    let f = ar.read_array::<f64>("/kinds/f64/array").unwrap();
    assert_eq!(f[0].to_bits(), f64::EPSILON.to_bits());
    let z = ar.read_array::<f32>("/kinds/f32/array").unwrap();
    assert_eq!(z[1].to_bits(), (-0.0f32).to_bits());
    assert_eq!(ar.read_array::<u64>("/kinds/u64/array").unwrap()[2], u64::MAX);
    assert_eq!(ar.read_string("/kinds/text/value").unwrap(), "Ising, L=16");
    assert!(ar.is_string("/kinds/text/value"));
    assert_eq!(ar.list_children("/kinds").unwrap().len(), NativeKind::ALL.len());
}

#[test]
fn test_nan_payload_preserved() {
    let (_dir, path) = common::scratch("nan.dat");
    let nan = f64::from_bits(0x7ff8_0000_dead_beef);
    {
        let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
        ar.write_scalar("/nan", nan).unwrap();
    }
    let ar = Archive::open(&path, OpenMode::READ).unwrap();
    assert_eq!(ar.read_scalar::<f64>("/nan").unwrap().to_bits(), nan.to_bits());
}

#[test]
fn test_hyperslab_write_is_idempotent() {
    let (_dir, path) = common::scratch("slab.dat");
    let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
    let shape = Dimensions::d2(4, 5);
    let slab = Hyperslab::new(&[1, 2], &[2, 3]);
    let block = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];

    ar.write("/m", &block, &shape, Some(&slab)).unwrap();
    let once = ar.read_array::<f64>("/m").unwrap();
    ar.write("/m", &block, &shape, Some(&slab)).unwrap();
    let twice = ar.read_array::<f64>("/m").unwrap();
    assert_eq!(once, twice);

    let mut region = [0.0f64; 6];
    ar.read("/m", &mut region, Some(&slab)).unwrap();
    assert_eq!(region, block);
    assert_eq!(once.iter().filter(|&&v| v == 0.0).count(), 20 - 6);
}

#[test]
fn test_chunked_fill_matches_whole_write() {
    let (_dir, path) = common::scratch("chunks.dat");
    let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
    let shape = Dimensions::d1(10);
    let data: Vec<i64> = (0..10).collect();

    for start in (0..10).step_by(4) {
        let len = (10 - start).min(4);
        let slab = Hyperslab::new(&[start], &[len]);
        ar.write("/chunked", &data[start..start + len], &shape, Some(&slab)).unwrap();
    }
    ar.write("/whole", &data, &shape, None).unwrap();

    assert_eq!(
        ar.read_array::<i64>("/chunked").unwrap(),
        ar.read_array::<i64>("/whole").unwrap()
    );
}

#[test]
fn test_range_errors() {
    let (_dir, path) = common::scratch("range.dat");
    let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
    let shape = Dimensions::d1(4);

    let past_end = Hyperslab::new(&[3], &[2]);
    assert!(matches!(ar.write("/v", &[1u8, 2], &shape, Some(&past_end)), Err(Error::Range(_))));

    let wrong_rank = Hyperslab::new(&[0, 0], &[1, 1]);
    assert!(matches!(ar.write("/v", &[1u8], &shape, Some(&wrong_rank)), Err(Error::Range(_))));

    assert!(matches!(ar.write("/v", &[1u8, 2, 3], &shape, None), Err(Error::Range(_))));
    assert!(!ar.is_data("/v"));

    ar.write("/v", &[1u8, 2, 3, 4], &shape, None).unwrap();
    let mut out = [0u8; 2];
    assert!(matches!(ar.read("/v", &mut out, Some(&past_end)), Err(Error::Range(_))));
}

#[test]
fn test_oversized_shape_keeps_archive_intact() {
    let (_dir, path) = common::scratch("oversized.dat");
    {
        let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
        ar.write_array("/keep", &[1.0f64, 2.0]).unwrap();

        let huge = Dimensions::from_slice(&[1 << 33, 1 << 33]);
        let corner = Hyperslab::new(&[0, 0], &[1, 1]);
        assert!(matches!(ar.write("/x", &[1.0f64], &huge, Some(&corner)), Err(Error::Range(_))));

        let wrapping = Dimensions::from_slice(&[1 << 32, 1 << 32]);
        assert!(matches!(ar.write::<f64>("/x", &[], &wrapping, None), Err(Error::Range(_))));
        assert!(!ar.is_data("/x"));
    }

    let ar = Archive::open(&path, OpenMode::READ).unwrap();
    assert_eq!(ar.read_array::<f64>("/keep").unwrap(), vec![1.0, 2.0]);
    assert!(!ar.is_data("/x"));
}

#[test]
fn test_null_datasets() {
    let (_dir, path) = common::scratch("null.dat");
    {
        let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
        ar.write::<i32>("/empty", &[], &Dimensions::from_slice(&[0, 5]), None).unwrap();
        ar.write_array("/full", &[1i32]).unwrap();
    }
    let ar = Archive::open(&path, OpenMode::READ).unwrap();
    assert!(ar.is_null("/empty"));
    assert!(!ar.is_null("/full"));
    assert_eq!(ar.extent("/empty").unwrap(), Dimensions::from_slice(&[0, 5]));
    assert!(ar.read_array::<i32>("/empty").unwrap().is_empty());
}

#[test]
fn test_no_conversion_on_read() {
    let (_dir, path) = common::scratch("kinds-mismatch.dat");
    let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
    ar.write_array("/v", &[1i32, 2]).unwrap();
    assert!(matches!(ar.read_array::<i64>("/v"), Err(Error::TypeMismatch { .. })));
    assert!(matches!(ar.read_array::<f64>("/missing"), Err(Error::NotFound(_))));
}

#[test]
fn test_attributes() {
    let (_dir, path) = common::scratch("attrs.dat");
    {
        let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
        ar.write_array("/results/bins", &[1i32, 2, 3, 4]).unwrap();
        ar.write_array("/results/bins/@units", b"eV".as_slice()).unwrap();
        ar.write_scalar("/results/@seed", 42u64).unwrap();

        assert!(ar.is_attribute("/results/bins/@units"));
        assert!(!ar.is_data("/results/bins/@units"));
        assert!(ar.is_scalar("/results/@seed"));
    }

    let ar = Archive::open(&path, OpenMode::READ).unwrap();
    assert_eq!(ar.list_attributes("/results").unwrap(), vec!["seed".to_string()]);
    assert_eq!(ar.list_attributes("/results/bins").unwrap(), vec!["units".to_string()]);
    assert_eq!(ar.read_array::<u8>("/results/bins/@units").unwrap(), b"eV".to_vec());
    assert_eq!(ar.read_scalar::<u64>("/results/@seed").unwrap(), 42);
    assert_eq!(ar.list_children("/results").unwrap(), vec!["bins".to_string()]);
}

#[test]
fn test_read_only_handle() {
    let (_dir, path) = common::scratch("readonly.dat");
    Archive::open(&path, OpenMode::WRITE).unwrap().write_scalar("/x", 1u8).unwrap();

    let ar = Archive::open(&path, OpenMode::READ).unwrap();
    assert!(!ar.is_writable());
    assert!(matches!(ar.write_scalar("/y", 1u8), Err(Error::ReadOnly(_))));
    assert!(matches!(ar.create_group("/g"), Err(Error::ReadOnly(_))));
    assert!(matches!(ar.delete_data("/x"), Err(Error::ReadOnly(_))));
    assert!(matches!(ar.flush(), Err(Error::ReadOnly(_))));
    assert_eq!(ar.read_scalar::<u8>("/x").unwrap(), 1);
}

#[test]
fn test_compressed_archive() {
    let (_dir, path) = common::scratch("packed.dat");
    let data = vec![0.25f64; 10_000];
    {
        let ar = Archive::open(&path, "c".parse::<OpenMode>().unwrap()).unwrap();
        assert!(ar.is_compressed());
        ar.write_array("/big", &data).unwrap();
    }
    assert!(std::fs::metadata(&path).unwrap().len() < 80_000 / 4);

    let ar = Archive::open(&path, OpenMode::READ).unwrap();
    assert_eq!(ar.read_array::<f64>("/big").unwrap(), data);

    // reopen uncompressed and rewrite: the reader follows the header either way
    {
        let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
        ar.write_scalar("/extra", 1u8).unwrap();
    }
    let ar2 = Archive::open(&path, OpenMode::READ).unwrap();
    assert!(ar.shares_resource_with(&ar2));
    drop((ar, ar2));
    let ar = Archive::open(&path, OpenMode::READ).unwrap();
    assert_eq!(ar.read_scalar::<u8>("/extra").unwrap(), 1);
    assert!(std::fs::metadata(&path).unwrap().len() > 80_000);
}

#[test]
fn test_deletes() {
    let (_dir, path) = common::scratch("deletes.dat");
    let ar = Archive::open(&path, OpenMode::WRITE).unwrap();
    ar.write_scalar("/g/x", 1u8).unwrap();
    ar.write_scalar("/g/@a", 1u8).unwrap();

    assert!(matches!(ar.delete_attribute("/g/@missing"), Err(Error::NotFound(_))));
    ar.delete_attribute("/g/@a").unwrap();
    ar.delete_data("/g/x").unwrap();
    assert!(matches!(ar.delete_data("/g/x"), Err(Error::NotFound(_))));
    assert!(matches!(ar.delete_data("/"), Err(Error::InvalidPath(_))));
    ar.delete_group("/g").unwrap();
    assert!(ar.list_children("/").unwrap().is_empty());
}
