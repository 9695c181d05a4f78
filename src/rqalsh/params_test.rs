// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tests for RQALSH parameter derivation and the persisted blob.

#[cfg(test)]
mod tests {
    use crate::error::FarError;
    use crate::rqalsh::params::{validate, RqalshParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn derive_sample() -> RqalshParams {
        let mut rng = StdRng::seed_from_u64(3);
        RqalshParams::derive(1000, 8, 4096, 100, 0.49, 2.0, &mut rng).unwrap()
    }

    #[test]
    fn test_derivation_for_known_knobs() {
        let p = derive_sample();

        // w = sqrt(8 ln 2 / 3) for c = 2.
        assert!((p.w - 1.359556).abs() < 1e-3, "w = {}", p.w);
        assert!((p.p1 - 0.24821).abs() < 1e-3, "p1 = {}", p.p1);
        assert!((p.p2 - 0.08713).abs() < 1e-3, "p2 = {}", p.p2);
        assert!(p.p1 > p.p2);

        // beta = 100 / 1000.
        assert!((p.beta - 0.1).abs() < 1e-6);
        assert!(p.alpha > p.p2 && p.alpha < p.p1);

        assert!(p.m >= 1);
        assert!(p.l >= 1 && p.l <= p.m);
        assert_eq!((p.alpha * p.m as f32).ceil() as usize, p.l);
        assert_eq!(p.proj.len(), p.m * 8);
    }

    #[test]
    fn test_projection_reproducible_with_seed() {
        let mut a = StdRng::seed_from_u64(17);
        let mut b = StdRng::seed_from_u64(17);
        let pa = RqalshParams::derive(100, 4, 4096, 10, 0.49, 2.0, &mut a).unwrap();
        let pb = RqalshParams::derive(100, 4, 4096, 10, 0.49, 2.0, &mut b).unwrap();
        assert_eq!(pa.proj, pb.proj);
    }

    #[test]
    fn test_blob_round_trip() {
        let dir = tempdir().unwrap();
        let p = derive_sample();
        p.write(dir.path()).unwrap();

        let q = RqalshParams::read(dir.path()).unwrap();
        assert_eq!(q.n, p.n);
        assert_eq!(q.dim, p.dim);
        assert_eq!(q.page_size, p.page_size);
        assert_eq!(q.m, p.m);
        assert_eq!(q.l, p.l);
        assert_eq!(q.ratio, p.ratio);
        assert_eq!(q.w, p.w);
        assert_eq!(q.alpha, p.alpha);
        assert_eq!(q.proj, p.proj);
    }

    #[test]
    fn test_write_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let p = derive_sample();
        p.write(dir.path()).unwrap();

        match p.write(dir.path()) {
            Err(FarError::IndexExists { .. }) => {}
            other => panic!("expected IndexExists, got {:?}", other),
        }
    }

    #[test]
    fn test_read_detects_corruption() {
        let dir = tempdir().unwrap();
        let p = derive_sample();
        p.write(dir.path()).unwrap();

        // Flip one byte in the middle of the projection matrix.
        let path = dir.path().join("para");
        let mut blob = std::fs::read(&path).unwrap();
        let mid = blob.len() / 2;
        blob[mid] ^= 0xFF;
        std::fs::write(&path, blob).unwrap();

        match RqalshParams::read(dir.path()) {
            Err(FarError::CorruptedIndex { reason, .. }) => {
                assert!(reason.contains("CRC32"), "reason: {}", reason);
            }
            other => panic!("expected CorruptedIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_ranges() {
        assert!(validate(10, 4, 4096, 1, 0.49, 2.0).is_ok());
        assert!(validate(0, 4, 4096, 1, 0.49, 2.0).is_err());
        assert!(validate(10, 0, 4096, 1, 0.49, 2.0).is_err());
        assert!(validate(10, 4, 0, 1, 0.49, 2.0).is_err());
        assert!(validate(10, 4, 4096, 0, 0.49, 2.0).is_err());
        assert!(validate(10, 4, 4096, 1, 0.0, 2.0).is_err());
        assert!(validate(10, 4, 4096, 1, 1.0, 2.0).is_err());
        assert!(validate(10, 4, 4096, 1, 0.49, 1.0).is_err());
    }
}
