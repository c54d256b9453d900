/// Execute `function` on all of `items`, in parallel if the `"auto-threads"` feature is enabled.
///
/// The outputs are in the same order as the items either way.
pub(crate) fn maybe_parallelize<T: Sync, U: Send>(
    items: &[T],
    work_function: impl Fn(&T) -> U + Send + Sync,
) -> Vec<U> {
    #[cfg(not(feature = "auto-threads"))]
    {
        items.iter().map(work_function).collect()
    }

    #[cfg(feature = "auto-threads")]
    {
        use rayon::prelude::{IntoParallelRefIterator as _, ParallelIterator as _};

        items.par_iter().map(work_function).collect()
    }
}
