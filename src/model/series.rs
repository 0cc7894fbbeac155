use super::candle::Candle;

/// Candles ordered by `open_time`, one per `open_time`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    candles: Vec<Candle>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by `open_time` and drop repeated `open_time`s, keeping the first.
    pub fn from_candles(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.open_time);
        candles.dedup_by_key(|c| c.open_time);
        Self { candles }
    }

    /// Drop every candle opening after `end`.
    pub fn truncate_after(&mut self, end: i64) {
        let keep = self.candles.partition_point(|c| c.open_time <= end);
        self.candles.truncate(keep);
    }

    /// True when each candle closes exactly one millisecond before the next opens.
    pub fn is_contiguous(&self) -> bool {
        self.candles
            .windows(2)
            .all(|w| w[0].close_time + 1 == w[1].open_time)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn into_inner(self) -> Vec<Candle> {
        self.candles
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

impl IntoIterator for Series {
    type Item = Candle;
    type IntoIter = std::vec::IntoIter<Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.into_iter()
    }
}
