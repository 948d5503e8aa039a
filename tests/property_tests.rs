//! Property-based tests for fingerprinting determinism and grouping
//! invariants.

use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

use treedupe::duplicates::{group_files, resolve, FingerprintGroup};
use treedupe::scanner::{hasher, DirectoryScanner, FileEntity, Hasher};

proptest! {
    #[test]
    fn hash_is_deterministic(content in prop::collection::vec(any::<u8>(), 0..4096)) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        fs::write(&path, &content).unwrap();

        let hasher = Hasher::new();
        let first = hasher.hash_file(&path).unwrap();
        let second = hasher.hash_file(&path).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn tree_fingerprint_is_stable_across_scans(
        names in prop::collection::btree_set("[a-z]{1,8}", 1..6),
        payload in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        for name in &names {
            fs::write(sub.join(format!("{}.bin", name)), &payload).unwrap();
        }

        let fingerprint = || {
            let mut scanner = DirectoryScanner::new(Hasher::new());
            scanner.scan(dir.path(), 0).unwrap();
            scanner.fingerprint_of(&sub).unwrap().to_string()
        };

        prop_assert_eq!(fingerprint(), fingerprint());
    }

    #[test]
    fn grouping_keeps_only_real_duplicates(
        contents in prop::collection::vec(0u8..4, 2..20)
    ) {
        // Map each small label to a distinct payload; repeated labels are
        // genuine duplicates.
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for (i, label) in contents.iter().enumerate() {
            let path = dir.path().join(format!("f{}.bin", i));
            fs::write(&path, vec![*label; 16]).unwrap();
            let metadata = fs::metadata(&path).unwrap();
            files.push(FileEntity::new(
                path,
                metadata.len(),
                metadata.modified().unwrap(),
                0,
            ));
        }

        let result = group_files(files, &Hasher::new(), None);

        prop_assert!(result.errors.is_empty());
        for group in &result.groups {
            // Every group has at least two members sharing a fingerprint.
            prop_assert!(group.members.len() >= 2);
            for member in &group.members {
                prop_assert_eq!(member.fingerprint(), Some(group.fingerprint.as_str()));
            }
        }

        // Member counts across groups equal the duplicated labels.
        let mut counts = [0usize; 4];
        for label in &contents {
            counts[*label as usize] += 1;
        }
        let expected_duplicates: usize = counts.iter().filter(|&&c| c >= 2).sum();
        let grouped: usize = result.groups.iter().map(|g| g.members.len()).sum();
        prop_assert_eq!(grouped, expected_duplicates);
    }

    #[test]
    fn resolution_partitions_every_group(
        sizes in prop::collection::vec(1u64..10_000, 2..8)
    ) {
        let members: Vec<FileEntity> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                FileEntity::new(
                    std::path::PathBuf::from(format!("/data/f{}.bin", i)),
                    size,
                    std::time::SystemTime::UNIX_EPOCH,
                    i % 3,
                )
            })
            .collect();
        let total: u64 = sizes.iter().sum();
        let group = FingerprintGroup {
            fingerprint: "fp".to_string(),
            members,
        };

        let result = resolve(vec![group], Vec::new(), Vec::new());

        prop_assert_eq!(result.file_groups.len(), 1);
        let resolved = &result.file_groups[0];
        // keep + remove together cover the whole membership, disjointly.
        prop_assert_eq!(resolved.remove.len() + 1, sizes.len());
        prop_assert!(!resolved.remove.iter().any(|f| f.path == resolved.keep.path));
        prop_assert_eq!(resolved.total_size, total);
        prop_assert_eq!(resolved.reclaimable(), total - resolved.keep.size);
    }

    #[test]
    fn sentinel_fingerprints_are_valid_hex(path in "[a-z/]{1,40}") {
        let sentinel = hasher::sentinel_fingerprint(std::path::Path::new(&path));

        prop_assert_eq!(sentinel.len(), 64);
        prop_assert!(sentinel.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
