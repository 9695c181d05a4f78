// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tests for ground-truth files and recall scoring.

#[cfg(test)]
mod tests {
    use crate::topk::MaxKList;
    use crate::truth::{generate, read, recall, MAXK};
    use crate::vectors::VectorSet;
    use tempfile::tempdir;

    fn grid_data(n: usize) -> VectorSet {
        let mut set = VectorSet::new(2);
        for i in 0..n {
            set.push(&[i as f32, 0.0]);
        }
        set
    }

    #[test]
    fn test_generate_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truth.txt");

        let data = grid_data(50);
        let mut queries = VectorSet::new(2);
        queries.push(&[0.0, 0.0]);
        queries.push(&[49.0, 0.0]);

        generate(&data, &queries, &path).unwrap();
        let rows = read(&path, 2).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), MAXK);

        // Query at x=0: furthest is x=49, then descending.
        assert_eq!(rows[0][0].id, 49);
        assert!((rows[0][0].key - 49.0).abs() < 1e-4);
        for i in 1..MAXK {
            assert!(rows[0][i - 1].key >= rows[0][i].key);
        }

        // Query at x=49: furthest is x=0.
        assert_eq!(rows[1][0].id, 0);
        assert!((rows[1][0].key - 49.0).abs() < 1e-4);
    }

    #[test]
    fn test_read_rejects_wrong_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truth.txt");

        let data = grid_data(30);
        let mut queries = VectorSet::new(2);
        queries.push(&[0.0, 0.0]);
        generate(&data, &queries, &path).unwrap();

        assert!(read(&path, 7).is_err());
    }

    #[test]
    fn test_recall_exact_results() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truth.txt");

        let data = grid_data(40);
        let mut queries = VectorSet::new(2);
        queries.push(&[0.0, 0.0]);
        generate(&data, &queries, &path).unwrap();
        let rows = read(&path, 1).unwrap();

        // A list holding the exact distances scores 100 at every k.
        for k in [1usize, 2, 5, 10] {
            let mut list = MaxKList::new(k);
            for pair in rows[0].iter().take(k) {
                list.insert(pair.key, pair.id);
            }
            assert_eq!(recall(k, &rows[0], &list), 100.0);
        }
    }

    #[test]
    fn test_recall_partial_results() {
        let truth: Vec<crate::topk::Pair> = (0..MAXK)
            .map(|i| crate::topk::Pair {
                key: (MAXK - i) as f32 * 10.0,
                id: i as u32,
            })
            .collect();

        // Two of the top-4 distances reached, two fell short.
        let mut list = MaxKList::new(4);
        list.insert(100.0, 0);
        list.insert(90.0, 1);
        list.insert(10.0, 8);
        list.insert(5.0, 9);

        assert_eq!(recall(4, &truth, &list), 50.0);
    }

    #[test]
    fn test_recall_empty_list() {
        let truth: Vec<crate::topk::Pair> = (0..MAXK)
            .map(|i| crate::topk::Pair {
                key: (MAXK - i) as f32,
                id: i as u32,
            })
            .collect();

        let list = MaxKList::new(5);
        assert_eq!(recall(5, &truth, &list), 0.0);
    }
}
