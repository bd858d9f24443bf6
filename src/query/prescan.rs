use crate::cursor::ScrollableCursor;
use crate::storage::ShapeSource;
use std::ops::{Deref, DerefMut};

/// Exclusive borrow of a cursor for the length of a scan.
///
/// Rewinds the cursor to before the first row when dropped, whether the
/// scan finished or bailed out with an error.
pub struct PrescanScope<'a, S: ShapeSource> {
    cursor: &'a mut ScrollableCursor<S>,
}

impl<'a, S: ShapeSource> PrescanScope<'a, S> {
    pub fn new(cursor: &'a mut ScrollableCursor<S>) -> Self {
        cursor.before_first();
        Self { cursor }
    }
}

impl<S: ShapeSource> Deref for PrescanScope<'_, S> {
    type Target = ScrollableCursor<S>;

    fn deref(&self) -> &Self::Target {
        self.cursor
    }
}

impl<S: ShapeSource> DerefMut for PrescanScope<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.cursor
    }
}

impl<S: ShapeSource> Drop for PrescanScope<'_, S> {
    fn drop(&mut self) {
        self.cursor.before_first();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{shape_type, MemoryShapeSource, RawShape};
    use crate::types::AttributeRow;

    #[test]
    fn test_scope_rewinds_on_drop() {
        let source = MemoryShapeSource::new("pts", shape_type::POINT, Vec::new())
            .with_record(RawShape::point(0.0, 0.0), AttributeRow::new())
            .with_record(RawShape::point(1.0, 1.0), AttributeRow::new());
        let mut cursor = ScrollableCursor::new(source);
        {
            let mut scope = PrescanScope::new(&mut cursor);
            assert!(scope.last().unwrap());
            assert_eq!(scope.row(), 2);
        }
        assert!(cursor.is_before_first());
    }

    #[test]
    fn test_scope_rewinds_on_early_return() {
        fn stop_at_first(cursor: &mut ScrollableCursor<MemoryShapeSource>) -> crate::Result<()> {
            let mut scope = PrescanScope::new(cursor);
            scope.next()?;
            Err(crate::ShapeError::InvalidData("stop".into()))
        }

        let source = MemoryShapeSource::new("pts", shape_type::POINT, Vec::new())
            .with_record(RawShape::point(0.0, 0.0), AttributeRow::new());
        let mut cursor = ScrollableCursor::new(source);
        assert!(stop_at_first(&mut cursor).is_err());
        assert!(cursor.is_before_first());
    }
}
