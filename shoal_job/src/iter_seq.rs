//! `IteratorSeq`: a finite, restartable, lazy ordered sequence of elements,
//! either arithmetic-progression-backed (`Range`) or materialized in a
//! `Vec` (`Vector`). Size and element-at-index for the range variant are
//! both constant-time, computed from the progression's start/end/step
//! rather than by stepping through it.

use std::ops::{Add, Div, Mul, Rem, Sub};

/// Element types usable as the backing type of a `Range`-variant `IteratorSeq`.
pub trait Numeric:
    Copy
    + PartialEq
    + PartialOrd
    + std::fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Rem<Output = Self>
{
    fn zero() -> Self;
    fn from_i64(n: i64) -> Self;
    fn to_i64(self) -> i64;
}

macro_rules! impl_numeric_int {
    ($t:ty) => {
        impl Numeric for $t {
            fn zero() -> Self {
                0
            }
            fn from_i64(n: i64) -> Self {
                n as $t
            }
            fn to_i64(self) -> i64 {
                self as i64
            }
        }
    };
}
impl_numeric_int!(i32);
impl_numeric_int!(i64);
impl_numeric_int!(u32);
impl_numeric_int!(u64);
impl_numeric_int!(usize);

impl Numeric for f64 {
    fn zero() -> Self {
        0.0
    }
    fn from_i64(n: i64) -> Self {
        n as f64
    }
    fn to_i64(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IteratorSeq<T> {
    Range {
        start: T,
        end: T,
        step: T,
        inclusive: bool,
    },
    Vector(Vec<T>),
}

impl<T: Numeric> IteratorSeq<T> {
    /// Inclusive range `[start, end]` stepping by `step`.
    pub fn range(start: T, end: T, step: T) -> Self {
        Self::range_with(start, end, step, true)
    }

    pub fn range_with(start: T, end: T, step: T, inclusive: bool) -> Self {
        IteratorSeq::Range {
            start,
            end,
            step,
            inclusive,
        }
    }

    pub fn vector(values: Vec<T>) -> Self {
        IteratorSeq::Vector(values)
    }

    /// Size of a range with `start == end` is 1 if inclusive, else 0;
    /// otherwise `floor((end - start) / step) + 1`, minus one when exclusive
    /// and the last step lands exactly on `end`.
    pub fn size(&self) -> usize {
        match self {
            IteratorSeq::Vector(v) => v.len(),
            IteratorSeq::Range {
                start,
                end,
                step,
                inclusive,
            } => {
                if start == end {
                    if *inclusive {
                        1
                    } else {
                        0
                    }
                } else {
                    assert!(*step != T::zero(), "step must be non-zero when start != end");
                    let diff = (*end - *start).to_i64();
                    let step_i = step.to_i64();
                    let mut count = 1 + diff / step_i;
                    if diff % step_i == 0 && !*inclusive {
                        count -= 1;
                    }
                    count as usize
                }
            }
        }
    }

    /// Element at index `i`, `0 <= i < size()`.
    pub fn at(&self, index: usize) -> T {
        match self {
            IteratorSeq::Vector(v) => v[index],
            IteratorSeq::Range { start, step, .. } => {
                *start + T::from_i64(step.to_i64() * index as i64)
            }
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        match self {
            IteratorSeq::Vector(v) => v.clone(),
            IteratorSeq::Range { .. } => (0..self.size()).map(|i| self.at(i)).collect(),
        }
    }

    /// Left-fold with an associative combining function `g`: size 0 returns
    /// `[]`, size 1 returns `[first]`, otherwise folds in index order as
    /// `((g(a0, a1), a2), ...)`.
    pub fn fold_left<F: Fn(T, T) -> T>(&self, g: F) -> Vec<T> {
        let n = self.size();
        if n == 0 {
            return vec![];
        }
        if n == 1 {
            return vec![self.at(0)];
        }
        let mut acc = self.at(0);
        for i in 1..n {
            acc = g(acc, self.at(i));
        }
        vec![acc]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_size_inclusive_and_exclusive() {
        assert_eq!(IteratorSeq::range(1i64, 1, 1).size(), 1);
        assert_eq!(IteratorSeq::range_with(1i64, 1, 1, false).size(), 0);
        assert_eq!(IteratorSeq::range(1i64, 10, 1).size(), 10);
        assert_eq!(IteratorSeq::range_with(1i64, 10, 1, false).size(), 9);
        assert_eq!(IteratorSeq::range(1i64, 9, 2).size(), 5); // 1,3,5,7,9
        assert_eq!(IteratorSeq::range_with(1i64, 9, 2, false).size(), 4); // last step lands exactly on end
    }

    #[test]
    fn range_at_matches_arithmetic_progression() {
        let seq = IteratorSeq::range(1i64, 100, 1);
        assert_eq!(seq.to_vec(), (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn vector_backed_seq() {
        let seq = IteratorSeq::vector(vec![10i64, 20, 30]);
        assert_eq!(seq.size(), 3);
        assert_eq!(seq.at(1), 20);
        assert_eq!(seq.to_vec(), vec![10, 20, 30]);
    }

    #[test]
    fn fold_left_sizes_zero_one_many() {
        let empty: IteratorSeq<i64> = IteratorSeq::vector(vec![]);
        assert_eq!(empty.fold_left(|a, b| a + b), Vec::<i64>::new());

        let one = IteratorSeq::vector(vec![7i64]);
        assert_eq!(one.fold_left(|a, b| a + b), vec![7]);

        let many = IteratorSeq::range(1i64, 100, 1);
        assert_eq!(many.fold_left(|a, b| a + b), vec![5050]);
    }

    #[test]
    #[should_panic]
    fn zero_step_panics() {
        IteratorSeq::range(1i64, 10, 0).size();
    }
}
