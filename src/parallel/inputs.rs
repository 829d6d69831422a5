//! Zipping several input sequences into argument tuples
//!
//! Zipping stops at the shortest sequence, like [`Iterator::zip`].

use crate::error::{Error, Result};

/// One or more input sequences that can be zipped into per-call arguments
///
/// Implemented for tuples of up to six [`IntoIterator`]s, where each call
/// receives a tuple, and for `Vec<I>`, where each call receives a `Vec` and
/// the number of sequences is only known at runtime.
pub trait Inputs {
    /// Iterator over per-call arguments
    type Iter: Iterator;

    /// Start zipping
    ///
    /// # Errors
    /// `InvalidArgument` if there are no input sequences.
    fn into_args(self) -> Result<Self::Iter>;
}

/// Zip of a fixed number of iterators, yielding tuples
#[derive(Debug, Clone)]
pub struct ZipTuple<T> {
    iters: T,
}

macro_rules! impl_inputs_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoIterator),+> Inputs for ($($name,)+) {
            type Iter = ZipTuple<($($name::IntoIter,)+)>;

            #[allow(non_snake_case)]
            fn into_args(self) -> Result<Self::Iter> {
                let ($($name,)+) = self;
                Ok(ZipTuple {
                    iters: ($($name.into_iter(),)+),
                })
            }
        }

        impl<$($name: Iterator),+> Iterator for ZipTuple<($($name,)+)> {
            type Item = ($($name::Item,)+);

            #[allow(non_snake_case)]
            fn next(&mut self) -> Option<Self::Item> {
                let ($($name,)+) = &mut self.iters;
                Some(($($name.next()?,)+))
            }
        }
    };
}

impl_inputs_for_tuple!(A);
impl_inputs_for_tuple!(A, B);
impl_inputs_for_tuple!(A, B, C);
impl_inputs_for_tuple!(A, B, C, D);
impl_inputs_for_tuple!(A, B, C, D, E);
impl_inputs_for_tuple!(A, B, C, D, E, F);

/// Zip of a runtime-sized list of iterators, yielding `Vec`s
#[derive(Debug, Clone)]
pub struct ZipAll<I> {
    iters: Vec<I>,
}

impl<I: IntoIterator> Inputs for Vec<I> {
    type Iter = ZipAll<I::IntoIter>;

    fn into_args(self) -> Result<Self::Iter> {
        if self.is_empty() {
            return Err(Error::invalid_argument(
                "at least one input sequence is required",
            ));
        }
        Ok(ZipAll {
            iters: self.into_iter().map(IntoIterator::into_iter).collect(),
        })
    }
}

impl<I: Iterator> Iterator for ZipAll<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iters.iter_mut().map(Iterator::next).collect()
    }
}
