//! Row mapping: rows and cursors into records

use std::marker::PhantomData;

use crate::{Cursor, Record, Result, RowSource};

/// Scan one row into a freshly defaulted `R`
///
/// Every tagged field, the primary key included, receives one column in
/// declaration order; the row decides how values are converted.
pub fn scan<R, S>(row: &S) -> Result<R>
where
    R: Record,
    S: RowSource + ?Sized,
{
    let mut record = R::default();
    {
        let mut targets = record.scan_targets();
        debug_assert_eq!(
            targets.len(),
            R::FIELDS.iter().filter(|f| f.is_tagged()).count(),
            "scan targets of {} disagree with its tagged fields",
            R::record_name(),
        );
        row.scan_into(&mut targets)?;
    }
    Ok(record)
}

/// Map every remaining row of `cursor` into an `R`
pub fn iterate<R, C>(cursor: &mut C) -> Records<'_, R, C>
where
    R: Record,
    C: Cursor + ?Sized,
{
    Records {
        cursor,
        done: false,
        _record: PhantomData,
    }
}

/// Single-pass iterator returned by [`iterate`]
///
/// Yields one `Ok` per row. A scan failure, or the cursor's own terminal error
/// reported after the last row, is yielded once and ends the iteration.
pub struct Records<'c, R, C: ?Sized> {
    cursor: &'c mut C,
    done: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R, C> Iterator for Records<'_, R, C>
where
    R: Record,
    C: Cursor + ?Sized,
{
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.cursor.advance() {
            let record = scan::<R, C>(&*self.cursor);
            if record.is_err() {
                self.done = true;
            }
            return Some(record);
        }

        self.done = true;
        self.cursor.take_error().map(Err)
    }
}
