use crate::defs::CsvRecord;

// Object style note:
// A run loads every store once, threads the rows through pure selection
// functions, and saves once at the end. Implementations should not cache
// rows between calls; `load` always reflects what is on disk.

pub trait RowStore<R: CsvRecord> {
    type Error;

    /// Read all rows, failing if any required column is absent.
    fn load(&self) -> Result<Vec<R>, Self::Error>;

    /// Replace the stored rows with `rows`, writing `R::COLUMNS` in order.
    fn save(&self, rows: &[R]) -> Result<(), Self::Error>;
}
