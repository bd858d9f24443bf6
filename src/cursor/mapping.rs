//! Row number → record number translation

/// Maps 1-based cursor rows to 1-based record numbers.
///
/// `Identity` covers unfiltered cursors; `Filtered` holds the ascending
/// record numbers a prescan selected. Built once and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordNumberMapping {
    Identity,
    Filtered(Vec<usize>),
}

impl RecordNumberMapping {
    /// Row count given the source's total record count
    pub fn row_count(&self, total_records: usize) -> usize {
        match self {
            RecordNumberMapping::Identity => total_records,
            RecordNumberMapping::Filtered(records) => records.len(),
        }
    }

    /// Record number for `row`; `None` outside `1..=row_count`
    pub fn record_number(&self, row: usize, total_records: usize) -> Option<usize> {
        if row < 1 {
            return None;
        }
        match self {
            RecordNumberMapping::Identity => (row <= total_records).then_some(row),
            RecordNumberMapping::Filtered(records) => records.get(row - 1).copied(),
        }
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self, RecordNumberMapping::Filtered(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let mapping = RecordNumberMapping::Identity;
        assert_eq!(mapping.row_count(5), 5);
        assert_eq!(mapping.record_number(1, 5), Some(1));
        assert_eq!(mapping.record_number(5, 5), Some(5));
        assert_eq!(mapping.record_number(6, 5), None);
        assert_eq!(mapping.record_number(0, 5), None);
    }

    #[test]
    fn test_filtered() {
        let mapping = RecordNumberMapping::Filtered(vec![2, 4, 5]);
        assert_eq!(mapping.row_count(100), 3);
        assert_eq!(mapping.record_number(1, 100), Some(2));
        assert_eq!(mapping.record_number(3, 100), Some(5));
        assert_eq!(mapping.record_number(4, 100), None);
        assert!(mapping.is_filtered());
    }
}
