#![cfg(feature = "serde")]

use dtguard_core::dtype::{BOOL, FLOAT32, UINT64};
use dtguard_core::{Device, Dtype, Shape};

#[test]
fn test_dtype_serializes_as_name() {
    assert_eq!(serde_json::to_string(&FLOAT32).unwrap(), "\"Float32\"");
    let back: Dtype = serde_json::from_str("\"UInt64\"").unwrap();
    assert_eq!(back, UINT64);
    assert!(serde_json::from_str::<Dtype>("\"Complex64\"").is_err());
}

#[test]
fn test_device_serializes_as_display_string() {
    assert_eq!(serde_json::to_string(&Device::Cuda(3)).unwrap(), "\"CUDA:3\"");
    let back: Device = serde_json::from_str("\"cpu:0\"").unwrap();
    assert_eq!(back, Device::Cpu);
    assert!(serde_json::from_str::<Device>("\"TPU:0\"").is_err());
}

#[test]
fn test_shape_serializes_as_sequence() {
    let shape = Shape::new(&[2, 0, 7]);
    assert_eq!(serde_json::to_string(&shape).unwrap(), "[2,0,7]");
    let back: Shape = serde_json::from_str("[]").unwrap();
    assert!(back.is_scalar());
}

#[test]
fn test_tensor_metadata_record() {
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
    struct Meta {
        dtype: Dtype,
        device: Device,
        shape: Shape,
    }

    let meta = Meta {
        dtype: BOOL,
        device: Device::Sycl(1),
        shape: Shape::new(&[4, 4]),
    };
    let json = serde_json::to_string(&meta).unwrap();
    assert_eq!(json, r#"{"dtype":"Bool","device":"SYCL:1","shape":[4,4]}"#);
    assert_eq!(serde_json::from_str::<Meta>(&json).unwrap(), meta);
}
