//! Bresenham's line algorithm, as an iterator over the integer
//! coordinates of an 8-connected line.  The iterator stops right
//! after yielding the end point; callers that need a bound use
//! `take`.

/// The pixels between two endpoints, both included.
#[derive(Clone, Debug)]
pub struct Line {
    current: (i64, i64),
    end: (i64, i64),
    delta: (i64, i64),
    step: (i64, i64),
    error: i64,
    done: bool,
}

impl Line {
    /// A line from `start` to `end`.
    pub fn new(start: (i64, i64), end: (i64, i64)) -> Line {
        let delta = ((end.0 - start.0).abs(), (end.1 - start.1).abs());
        let step = (
            if start.0 < end.0 { 1 } else { -1 },
            if start.1 < end.1 { 1 } else { -1 },
        );
        Line {
            current: start,
            end,
            delta,
            step,
            error: delta.0 - delta.1,
            done: false,
        }
    }
}

impl Iterator for Line {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<(i64, i64)> {
        if self.done {
            return None;
        }
        let point = self.current;
        if point == self.end {
            self.done = true;
            return Some(point);
        }
        let e2 = 2 * self.error;
        if e2 > -self.delta.1 {
            self.error -= self.delta.1;
            self.current.0 += self.step.0;
        }
        if e2 < self.delta.0 {
            self.error += self.delta.0;
            self.current.1 += self.step.1;
        }
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let left = (self.end.0 - self.current.0)
            .abs()
            .max((self.end.1 - self.current.1).abs()) as usize
            + 1;
        (left, Some(left))
    }
}
