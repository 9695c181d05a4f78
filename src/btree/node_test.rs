// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Tests for B+-tree node layout and serialisation.

#[cfg(test)]
mod tests {
    use crate::btree::node::{IndexNode, LeafNode, Node};
    use crate::error::FarError;

    const BLOCK: usize = 4096;

    #[test]
    fn test_index_capacity() {
        // (4096 - 13) / 8 = 510 entries.
        assert_eq!(IndexNode::capacity_for(BLOCK), 510);
    }

    #[test]
    fn test_leaf_capacities() {
        // One key slot per 4096 bytes; (4096 - 13 - 8) / 4 = 1018 ids.
        assert_eq!(LeafNode::key_capacity_for(BLOCK), 1);
        assert_eq!(LeafNode::id_capacity_for(BLOCK), 1018);

        assert_eq!(LeafNode::key_capacity_for(8192), 2);
        assert_eq!(LeafNode::id_capacity_for(8192), 2041);
    }

    #[test]
    fn test_capacity_floor_enforced() {
        match IndexNode::new(1, 128) {
            Err(FarError::CapacityTooSmall { capacity, minimum, .. }) => {
                assert!(capacity < minimum);
            }
            other => panic!("expected CapacityTooSmall, got {:?}", other),
        }
        assert!(LeafNode::new(256).is_err());
    }

    #[test]
    fn test_index_node_round_trip() {
        let mut node = IndexNode::new(2, BLOCK).unwrap();
        node.set_left_sibling(Some(9));
        node.set_right_sibling(None);
        for i in 0..5 {
            node.push_entry(i as f32 * 1.5, 100 + i);
        }

        let mut buf = vec![0u8; BLOCK];
        node.write_to(&mut buf);

        let read = IndexNode::from_bytes(&buf).unwrap();
        assert_eq!(read.level(), 2);
        assert_eq!(read.num_entries(), 5);
        assert_eq!(read.left_sibling(), Some(9));
        assert_eq!(read.right_sibling(), None);
        for i in 0..5 {
            assert_eq!(read.key(i), i as f32 * 1.5);
            assert_eq!(read.son(i), 100 + i as u32);
        }
    }

    #[test]
    fn test_leaf_node_round_trip() {
        let mut leaf = LeafNode::new(BLOCK).unwrap();
        leaf.set_right_sibling(Some(3));
        for i in 0..200u32 {
            leaf.push_entry(i, i as f32 * 0.25);
        }

        let mut buf = vec![0u8; BLOCK];
        leaf.write_to(&mut buf);

        let read = LeafNode::from_bytes(&buf).unwrap();
        assert_eq!(read.num_entries(), 200);
        assert_eq!(read.num_keys(), 1);
        assert_eq!(read.get_key(0), 0.0);
        assert_eq!(read.left_sibling(), None);
        assert_eq!(read.right_sibling(), Some(3));
        for i in 0..200 {
            assert_eq!(read.entry_id(i), i as u32);
        }
    }

    #[test]
    fn test_leaf_key_downsampling() {
        // With an 8192-byte block the leaf fits 2041 ids and two key slots:
        // slot 0 for ids [0, 1024), slot 1 for ids [1024, 2041).
        let mut leaf = LeafNode::new(8192).unwrap();
        for i in 0..2000u32 {
            leaf.push_entry(i, i as f32);
        }

        assert_eq!(leaf.num_keys(), 2);
        assert_eq!(leaf.get_key(0), 0.0);
        assert_eq!(leaf.get_key(1), 1024.0);
        assert_eq!(leaf.segment_len(0), LeafNode::increment());
        assert_eq!(leaf.segment_len(1), 2000 - 1024);
    }

    #[test]
    fn test_node_dispatch_on_level() {
        let mut buf = vec![0u8; BLOCK];

        let leaf = LeafNode::new(BLOCK).unwrap();
        leaf.write_to(&mut buf);
        assert!(matches!(Node::from_bytes(&buf).unwrap(), Node::Leaf(_)));

        let mut index = IndexNode::new(1, BLOCK).unwrap();
        index.push_entry(0.0, 1);
        index.write_to(&mut buf);
        assert!(matches!(Node::from_bytes(&buf).unwrap(), Node::Index(_)));
    }

    #[test]
    fn test_find_position_by_key() {
        let mut node = IndexNode::new(1, BLOCK).unwrap();
        for (i, key) in [1.0f32, 3.0, 5.0, 7.0].iter().enumerate() {
            node.push_entry(*key, i as u32);
        }

        assert_eq!(node.find_position_by_key(0.5), None);
        assert_eq!(node.find_position_by_key(1.0), Some(0));
        assert_eq!(node.find_position_by_key(4.2), Some(1));
        assert_eq!(node.find_position_by_key(7.0), Some(3));
        assert_eq!(node.find_position_by_key(99.0), Some(3));

        let mut leaf = LeafNode::new(8192).unwrap();
        for i in 0..2000u32 {
            leaf.push_entry(i, i as f32);
        }
        assert_eq!(leaf.find_position_by_key(-1.0), None);
        assert_eq!(leaf.find_position_by_key(10.0), Some(0));
        assert_eq!(leaf.find_position_by_key(1500.0), Some(1));
    }
}
