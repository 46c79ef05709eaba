//! Fixed-capacity sample history and the running aggregates built on it.
//!
//! Everything here lives inline (no heap) and costs O(1) per input, so a
//! filter stage can own as many of these as it needs.

use num_traits::PrimInt;

/// Circular store of the `N` most recent values.
///
/// The write cursor always points at the oldest value, which is the one the
/// next [`push`](RingBuffer::push) overwrites.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    samples: [T; N],
    write: usize,
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    const NON_EMPTY: () = assert!(N > 0, "ring buffer capacity must be non-zero");

    /// Buffer with every slot holding `value`.
    pub fn with_value(value: T) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            samples: [value; N],
            write: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn push(&mut self, value: T) {
        self.samples[self.write] = value;
        self.write += 1;
        if self.write == N {
            self.write = 0;
        }
    }

    /// The value the next push evicts.
    pub fn oldest(&self) -> T {
        self.samples[self.write]
    }

    /// Value written `n` pushes before the most recent one (`n = 0` is the
    /// newest). Offsets past the capacity wrap around.
    pub fn nth_oldest(&self, n: usize) -> T {
        let back = n % N + 1;
        let index = if self.write < back {
            self.write + N - back
        } else {
            self.write - back
        };
        self.samples[index]
    }

    pub fn newest(&self) -> T {
        self.nth_oldest(0)
    }

    /// Fill every slot with `value`. The cursor stays where it is.
    pub fn reset(&mut self, value: T) {
        self.samples.fill(value);
    }

    /// All `N` stored values from newest to oldest.
    pub fn iter_newest_first(&self) -> NewestFirst<'_, T, N> {
        NewestFirst {
            buffer: self,
            offset: 0,
        }
    }
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    pub fn new() -> Self {
        Self::with_value(T::default())
    }
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Backward walk over a [`RingBuffer`], see [`RingBuffer::iter_newest_first`].
#[derive(Debug, Clone)]
pub struct NewestFirst<'a, T, const N: usize> {
    buffer: &'a RingBuffer<T, N>,
    offset: usize,
}

impl<T: Copy, const N: usize> Iterator for NewestFirst<'_, T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.offset >= N {
            return None;
        }
        let value = self.buffer.nth_oldest(self.offset);
        self.offset += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = N - self.offset;
        (remaining, Some(remaining))
    }
}

impl<T: Copy, const N: usize> ExactSizeIterator for NewestFirst<'_, T, N> {}

/// Sum of the last `N` inputs.
///
/// `T` must be wide enough to hold `N * max(input)`; nothing checks this at
/// runtime.
#[derive(Debug, Clone)]
pub struct RunningSum<T, const N: usize> {
    buffer: RingBuffer<T, N>,
    sum: T,
}

impl<T: PrimInt, const N: usize> RunningSum<T, N> {
    pub fn new() -> Self {
        Self {
            buffer: RingBuffer::with_value(T::zero()),
            sum: T::zero(),
        }
    }

    pub fn input(&mut self, value: T) {
        let oldest = self.buffer.oldest();
        self.buffer.push(value);
        // `sum` still contains `oldest`, so adding first cannot underflow.
        self.sum = self.sum + value - oldest;
    }

    pub fn last_output(&self) -> T {
        self.sum
    }

    pub fn last_input(&self) -> T {
        self.buffer.newest()
    }

    pub fn reset(&mut self, value: T) {
        self.buffer.reset(value);
        self.sum = (0..N).fold(T::zero(), |acc, _| acc + value);
    }

    pub fn buffer(&self) -> &RingBuffer<T, N> {
        &self.buffer
    }
}

impl<T: PrimInt, const N: usize> Default for RunningSum<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncating mean of the last `N` inputs.
#[derive(Debug, Clone)]
pub struct RunningAverage<T, const N: usize> {
    sum: RunningSum<T, N>,
    average: T,
}

impl<T: PrimInt, const N: usize> RunningAverage<T, N> {
    pub fn new() -> Self {
        Self {
            sum: RunningSum::new(),
            average: T::zero(),
        }
    }

    pub fn input(&mut self, value: T) {
        self.sum.input(value);
        self.average = self.sum.last_output() / Self::window();
    }

    pub fn last_output(&self) -> T {
        self.average
    }

    pub fn last_input(&self) -> T {
        self.sum.last_input()
    }

    pub fn reset(&mut self, value: T) {
        self.sum.reset(value);
        self.average = value;
    }

    pub fn running_sum(&self) -> &RunningSum<T, N> {
        &self.sum
    }

    // Window lengths are small constants; a type too narrow to count them
    // could not hold their sum either.
    fn window() -> T {
        T::from(N).unwrap_or_else(T::max_value)
    }
}

impl<T: PrimInt, const N: usize> Default for RunningAverage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_and_nth_oldest_track_pushes() {
        let mut buf: RingBuffer<u32, 4> = RingBuffer::new();
        for v in 1..=6 {
            buf.push(v);
        }
        assert_eq!(buf.newest(), 6);
        assert_eq!(buf.nth_oldest(0), 6);
        assert_eq!(buf.nth_oldest(1), 5);
        assert_eq!(buf.nth_oldest(3), 3);
    }

    #[test]
    fn oldest_is_the_value_about_to_be_evicted() {
        let mut buf: RingBuffer<i32, 3> = RingBuffer::new();
        buf.push(10);
        buf.push(20);
        buf.push(30);
        assert_eq!(buf.oldest(), 10);
        buf.push(40);
        assert_eq!(buf.oldest(), 20);
        assert_eq!(buf.nth_oldest(2), 20);
    }

    #[test]
    fn nth_oldest_wraps_past_capacity() {
        let mut buf: RingBuffer<u8, 5> = RingBuffer::new();
        for v in 0..12 {
            buf.push(v);
            assert_eq!(buf.nth_oldest(0), v);
            assert_eq!(buf.nth_oldest(5), v);
        }
        assert_eq!(buf.nth_oldest(4), 7);
    }

    #[test]
    fn reset_fills_every_slot() {
        let mut buf: RingBuffer<u32, 4> = RingBuffer::new();
        buf.push(9);
        buf.reset(3);
        assert!(buf.iter_newest_first().all(|v| v == 3));
        assert_eq!(buf.capacity(), 4);
    }

    #[test]
    fn newest_first_walks_backwards_through_history() {
        let mut buf: RingBuffer<u32, 4> = RingBuffer::new();
        for v in 1..=6 {
            buf.push(v);
        }
        let walked: Vec<u32> = buf.iter_newest_first().collect();
        assert_eq!(walked, vec![6, 5, 4, 3]);
        assert_eq!(buf.iter_newest_first().len(), 4);
    }

    #[test]
    fn newest_first_sees_zero_fill_before_warm_up() {
        let mut buf: RingBuffer<u32, 4> = RingBuffer::new();
        buf.push(7);
        let walked: Vec<u32> = buf.iter_newest_first().collect();
        assert_eq!(walked, vec![7, 0, 0, 0]);
    }

    #[test]
    fn running_sum_forgets_values_outside_the_window() {
        let mut a: RunningSum<u32, 6> = RunningSum::new();
        let mut b: RunningSum<u32, 6> = RunningSum::new();
        for v in [900, 13, 400, 77, 1023, 5, 250] {
            a.input(v);
        }
        let tail = [3, 1, 4, 1, 5, 9];
        for v in tail {
            a.input(v);
            b.input(v);
        }
        assert_eq!(a.last_output(), tail.iter().sum::<u32>());
        assert_eq!(a.last_output(), b.last_output());
        assert_eq!(a.last_input(), 9);
    }

    #[test]
    fn running_sum_reset_scales_by_window() {
        let mut sum: RunningSum<u32, 30> = RunningSum::new();
        sum.reset(4);
        assert_eq!(sum.last_output(), 120);
        sum.input(10);
        assert_eq!(sum.last_output(), 126);
    }

    #[test]
    fn running_average_truncates() {
        let mut avg: RunningAverage<u32, 8> = RunningAverage::new();
        let mut fed = Vec::new();
        for v in [100, 101, 97, 103, 99, 98, 102, 104, 250, 7] {
            avg.input(v);
            fed.push(v);
            assert_eq!(avg.last_output(), avg.running_sum().last_output() / 8);
        }
        let window: u32 = fed[fed.len() - 8..].iter().sum();
        assert_eq!(avg.last_output(), window / 8);
        assert_eq!(avg.last_input(), 7);
    }

    #[test]
    fn running_average_reset_primes_output() {
        let mut avg: RunningAverage<u64, 8> = RunningAverage::new();
        avg.reset(100);
        assert_eq!(avg.last_output(), 100);
        avg.input(100);
        assert_eq!(avg.last_output(), 100);
        avg.input(180);
        assert_eq!(avg.last_output(), 110);
    }
}
