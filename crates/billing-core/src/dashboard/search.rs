//! Receipt search over a loaded batch.

use std::collections::HashSet;

use super::effective::effective_lines;
use crate::types::{Page, PageRequest, ReceiptRecord};

/// Whether one receipt matches an already lowercased needle.
///
/// Matches on receipt number, creator email, creator name, or the name of
/// any effective line (so a bundle receipt matches the bundle name, not the
/// products inside it).
fn matches(record: &ReceiptRecord, needle: &str, bundle_name: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |s: &str| s.to_lowercase().contains(needle);

    hit(&record.receipt.receipt_number)
        || record
            .creator
            .as_ref()
            .is_some_and(|c| hit(&c.email) || hit(&c.user_name))
        || effective_lines(record, bundle_name)
            .iter()
            .any(|line| hit(&line.product_name))
}

/// Case-insensitive receipt search, newest first and paginated.
///
/// Each receipt appears at most once even if several fields match or the
/// batch contains it twice.
pub fn search_receipts(
    records: &[ReceiptRecord],
    query: &str,
    page: PageRequest,
    bundle_name: &str,
) -> Page<ReceiptRecord> {
    let needle = query.trim().to_lowercase();
    let mut seen = HashSet::new();

    let mut hits: Vec<&ReceiptRecord> = records
        .iter()
        .filter(|r| r.receipt.is_active())
        .filter(|r| matches(r, &needle, bundle_name))
        .filter(|r| seen.insert(r.receipt.receipt_id.as_str()))
        .collect();

    hits.sort_by(|a, b| {
        b.receipt
            .created_at
            .cmp(&a.receipt.created_at)
            .then_with(|| b.receipt.receipt_number.cmp(&a.receipt.receipt_number))
    });

    Page::from_vec(hits, page).map(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::test_support::{bundle_receipt, item, standard_receipt, with_creator};

    fn batch() -> Vec<ReceiptRecord> {
        vec![
            standard_receipt("IN-01092025-AAAA0001", "2025-09-01T10:00:00Z", vec![item("a", "Massage Oil", 1, false, 1_000, 1_000)]),
            with_creator(
                standard_receipt("IN-02092025-BBBB0002", "2025-09-02T10:00:00Z", vec![item("b", "Towel", 1, false, 500, 500)]),
                "manager@example.com",
                "Alice",
            ),
            bundle_receipt(
                "IN-03092025-CCCC0003",
                "2025-09-03T10:00:00Z",
                50_000,
                vec![item("a", "Massage Oil", 2, false, 1_000, 1_000)],
            ),
        ]
    }

    fn numbers(page: &Page<ReceiptRecord>) -> Vec<&str> {
        page.items.iter().map(|r| r.receipt.receipt_number.as_str()).collect()
    }

    #[test]
    fn test_search_by_product_is_case_insensitive() {
        let page = search_receipts(&batch(), "massage", PageRequest::default(), "Full Package");
        // the bundle receipt matches on its bundle name only
        assert_eq!(numbers(&page), vec!["IN-01092025-AAAA0001"]);

        let page = search_receipts(&batch(), "FULL pack", PageRequest::default(), "Full Package");
        assert_eq!(numbers(&page), vec!["IN-03092025-CCCC0003"]);
    }

    #[test]
    fn test_search_by_creator_and_number() {
        let page = search_receipts(&batch(), "MANAGER@", PageRequest::default(), "Full Package");
        assert_eq!(numbers(&page), vec!["IN-02092025-BBBB0002"]);

        let page = search_receipts(&batch(), "alice", PageRequest::default(), "Full Package");
        assert_eq!(page.total, 1);

        let page = search_receipts(&batch(), "cccc0003", PageRequest::default(), "Full Package");
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_search_newest_first_deduplicated_and_paged() {
        let mut records = batch();
        records.push(records[0].clone());

        let page = search_receipts(&records, "", PageRequest::new(1, 2), "Full Package");
        assert_eq!(page.total, 3);
        assert_eq!(numbers(&page), vec!["IN-03092025-CCCC0003", "IN-02092025-BBBB0002"]);
        assert!(page.has_next);

        let page = search_receipts(&records, "", PageRequest::new(2, 2), "Full Package");
        assert_eq!(numbers(&page), vec!["IN-01092025-AAAA0001"]);
    }
}
